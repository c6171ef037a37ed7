use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::composer::ComposedMessage;
use crate::email::EmailError;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmailMessage {
    pub to: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub cc: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub bcc: Vec<String>,
    pub from: String,
    pub subject: String,
    pub body: EmailBody,
    pub reply_to: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub attachments: Vec<PathBuf>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub headers: Vec<(String, String)>,
}

// Managed by the message itself, never by caller supplied headers.
const RESERVED_HEADERS: &[&str] = &[
    "from",
    "to",
    "cc",
    "bcc",
    "subject",
    "reply-to",
    "date",
    "message-id",
    "mime-version",
    "content-type",
    "content-transfer-encoding",
];

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum EmailBody {
    Text(String),
    Html(String),
    Both { text: String, html: String },
}

impl EmailBody {
    /// Builds the body from composed parts, `None` when neither part is present.
    pub fn from_parts(text: Option<String>, html: Option<String>) -> Option<Self> {
        match (text, html) {
            (Some(text), Some(html)) => Some(EmailBody::Both { text, html }),
            (Some(text), None) => Some(EmailBody::Text(text)),
            (None, Some(html)) => Some(EmailBody::Html(html)),
            (None, None) => None,
        }
    }

    pub fn text(&self) -> Option<&str> {
        match self {
            EmailBody::Text(text) | EmailBody::Both { text, .. } => Some(text),
            EmailBody::Html(_) => None,
        }
    }

    pub fn html(&self) -> Option<&str> {
        match self {
            EmailBody::Html(html) | EmailBody::Both { html, .. } => Some(html),
            EmailBody::Text(_) => None,
        }
    }
}

/// What a provider reports back after accepting a message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeliveryReceipt {
    pub provider: String,
    pub message_id: Option<String>,
}

impl DeliveryReceipt {
    pub fn new(provider: impl Into<String>, message_id: Option<String>) -> Self {
        Self {
            provider: provider.into(),
            message_id,
        }
    }
}

impl EmailMessage {
    pub fn new(to: impl Into<String>, from: impl Into<String>, subject: impl Into<String>) -> Self {
        Self {
            to: vec![to.into()],
            cc: Vec::new(),
            bcc: Vec::new(),
            from: from.into(),
            subject: subject.into(),
            body: EmailBody::Text(String::new()),
            reply_to: None,
            attachments: Vec::new(),
            headers: Vec::new(),
        }
    }

    /// Wraps a composed message for delivery.
    pub fn from_composed(
        composed: ComposedMessage,
        to: impl Into<String>,
        from: impl Into<String>,
    ) -> Result<Self, EmailError> {
        let body = EmailBody::from_parts(composed.text, composed.html)
            .ok_or_else(|| EmailError::ProviderError("Message has no content".to_string()))?;

        Ok(Self::new(to, from, composed.subject).with_body(body))
    }

    pub fn with_body(mut self, body: EmailBody) -> Self {
        self.body = body;
        self
    }

    pub fn with_text(self, text: impl Into<String>) -> Self {
        self.with_body(EmailBody::Text(text.into()))
    }

    pub fn with_html(self, html: impl Into<String>) -> Self {
        self.with_body(EmailBody::Html(html.into()))
    }

    pub fn with_both(self, text: impl Into<String>, html: impl Into<String>) -> Self {
        self.with_body(EmailBody::Both {
            text: text.into(),
            html: html.into(),
        })
    }

    pub fn with_cc(mut self, cc: impl IntoIterator<Item = String>) -> Self {
        self.cc.extend(cc);
        self
    }

    pub fn with_bcc(mut self, bcc: impl IntoIterator<Item = String>) -> Self {
        self.bcc.extend(bcc);
        self
    }

    pub fn with_reply_to(mut self, reply_to: impl Into<String>) -> Self {
        self.reply_to = Some(reply_to.into());
        self
    }

    pub fn with_attachments(mut self, paths: impl IntoIterator<Item = PathBuf>) -> Self {
        self.attachments.extend(paths);
        self
    }

    pub fn with_headers(mut self, headers: impl IntoIterator<Item = (String, String)>) -> Self {
        self.headers.extend(headers);
        self
    }

    /// Whether the message needs more than a plain text/html body to be delivered.
    pub fn has_extras(&self) -> bool {
        !self.attachments.is_empty() || !self.headers.is_empty()
    }

    /// Rejects addresses and headers that cannot possibly be delivered.
    pub fn validate(&self) -> Result<(), EmailError> {
        if self.to.is_empty() {
            return Err(EmailError::InvalidEmail("no recipients".to_string()));
        }

        let addresses = self
            .to
            .iter()
            .chain(&self.cc)
            .chain(&self.bcc)
            .chain(self.reply_to.iter());

        for address in addresses {
            if !looks_like_address(address) {
                return Err(EmailError::InvalidEmail(address.clone()));
            }
        }

        if !looks_like_address(&self.from) {
            return Err(EmailError::InvalidEmail(self.from.clone()));
        }

        for (name, value) in &self.headers {
            validate_header(name, value)?;
        }

        Ok(())
    }

    pub fn recipient_count(&self) -> usize {
        self.to.len() + self.cc.len() + self.bcc.len()
    }
}

fn validate_header(name: &str, value: &str) -> Result<(), EmailError> {
    let valid_name = !name.is_empty() && name.bytes().all(|b| b.is_ascii_graphic() && b != b':');
    if !valid_name {
        return Err(EmailError::InvalidHeader(name.to_string()));
    }

    if RESERVED_HEADERS.contains(&name.to_ascii_lowercase().as_str()) {
        return Err(EmailError::InvalidHeader(format!(
            "{} is set from the message itself",
            name
        )));
    }

    if value.contains(['\r', '\n']) {
        return Err(EmailError::InvalidHeader(format!(
            "{} has a line break in its value",
            name
        )));
    }

    Ok(())
}

// Accepts both bare addresses and "Name <addr>" mailboxes.
fn looks_like_address(value: &str) -> bool {
    let address = match (value.rfind('<'), value.rfind('>')) {
        (Some(start), Some(end)) if start < end => &value[start + 1..end],
        _ => value,
    };
    let address = address.trim();

    match address.split_once('@') {
        Some((local, domain)) => {
            !local.is_empty() && !domain.is_empty() && !address.contains(char::is_whitespace)
        }
        None => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_body_from_parts() {
        assert_eq!(
            EmailBody::from_parts(Some("t".to_string()), None),
            Some(EmailBody::Text("t".to_string()))
        );
        assert_eq!(
            EmailBody::from_parts(None, Some("h".to_string())),
            Some(EmailBody::Html("h".to_string()))
        );
        assert!(matches!(
            EmailBody::from_parts(Some("t".to_string()), Some("h".to_string())),
            Some(EmailBody::Both { .. })
        ));
        assert_eq!(EmailBody::from_parts(None, None), None);
    }

    #[test]
    fn test_from_composed() {
        let composed = ComposedMessage {
            subject: "Hi".to_string(),
            text: Some("text".to_string()),
            html: None,
        };
        let message =
            EmailMessage::from_composed(composed, "to@example.com", "from@example.com").unwrap();

        assert_eq!(message.to, vec!["to@example.com"]);
        assert_eq!(message.subject, "Hi");
        assert_eq!(message.body.text(), Some("text"));
        assert_eq!(message.body.html(), None);
    }

    #[test]
    fn test_validate_accepts_mailboxes() {
        let message = EmailMessage::new("user@example.com", "App <noreply@example.com>", "Hi")
            .with_cc(vec!["Copy <cc@example.com>".to_string()])
            .with_reply_to("support@example.com");
        assert!(message.validate().is_ok());
        assert_eq!(message.recipient_count(), 2);
    }

    #[test]
    fn test_validate_rejects_bad_addresses() {
        let message = EmailMessage::new("not-an-address", "noreply@example.com", "Hi");
        assert!(matches!(
            message.validate(),
            Err(EmailError::InvalidEmail(address)) if address == "not-an-address"
        ));

        let message = EmailMessage::new("user@example.com", "noreply@example.com", "Hi")
            .with_bcc(vec!["a b@example.com".to_string()]);
        assert!(message.validate().is_err());
    }

    #[test]
    fn test_validate_accepts_custom_headers() {
        let message = EmailMessage::new("user@example.com", "noreply@example.com", "Hi")
            .with_headers(vec![
                ("X-Campaign".to_string(), "spring".to_string()),
                ("List-Unsubscribe".to_string(), "<mailto:off@example.com>".to_string()),
            ]);
        assert!(message.validate().is_ok());
        assert!(message.has_extras());
    }

    #[test]
    fn test_validate_rejects_bad_headers() {
        let cases = [
            ("", "value"),
            ("X Bad", "value"),
            ("X-Colon:", "value"),
            ("Subject", "override"),
            ("x-injected", "one\r\nBcc: evil@example.com"),
        ];

        for (name, value) in cases {
            let message = EmailMessage::new("user@example.com", "noreply@example.com", "Hi")
                .with_headers(vec![(name.to_string(), value.to_string())]);
            assert!(
                matches!(message.validate(), Err(EmailError::InvalidHeader(_))),
                "header {:?} should be rejected",
                name
            );
        }
    }

    #[test]
    fn test_plain_message_has_no_extras() {
        let message = EmailMessage::new("user@example.com", "noreply@example.com", "Hi");
        assert!(!message.has_extras());

        let message = message.with_attachments(vec![PathBuf::from("report.pdf")]);
        assert!(message.has_extras());
    }
}
