use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;

use crate::composer::ComposeError;
use crate::templating::TemplateRef;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PartKind {
    Text,
    Html,
}

impl PartKind {
    pub fn sibling(self) -> Self {
        match self {
            PartKind::Text => PartKind::Html,
            PartKind::Html => PartKind::Text,
        }
    }
}

impl fmt::Display for PartKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PartKind::Text => f.write_str("text"),
            PartKind::Html => f.write_str("html"),
        }
    }
}

/// Everything needed to compose one email. Built through [`MessageConfig::builder`].
#[derive(Debug, Clone)]
pub struct MessageConfig {
    recipient: String,
    subject: String,
    cc: Vec<String>,
    bcc: Vec<String>,
    from_address: Option<String>,
    reply_to: Option<String>,
    text_body: Option<String>,
    html_body: Option<String>,
    text_template: Option<TemplateRef>,
    html_template: Option<TemplateRef>,
    attachments: Vec<PathBuf>,
    headers: Vec<(String, String)>,
    context: liquid::Object,
}

impl MessageConfig {
    pub fn builder(recipient: impl Into<String>, subject: impl Into<String>) -> MessageConfigBuilder {
        MessageConfigBuilder::new(recipient, subject)
    }

    pub fn recipient(&self) -> &str {
        &self.recipient
    }

    pub fn subject(&self) -> &str {
        &self.subject
    }

    pub fn cc(&self) -> &[String] {
        &self.cc
    }

    pub fn bcc(&self) -> &[String] {
        &self.bcc
    }

    pub fn from_address(&self) -> Option<&str> {
        self.from_address.as_deref()
    }

    pub fn reply_to(&self) -> Option<&str> {
        self.reply_to.as_deref()
    }

    /// Raw text body, `None` when unset or empty.
    pub fn text_body(&self) -> Option<&str> {
        self.text_body.as_deref().filter(|body| !body.is_empty())
    }

    /// Raw HTML body, `None` when unset or empty.
    pub fn html_body(&self) -> Option<&str> {
        self.html_body.as_deref().filter(|body| !body.is_empty())
    }

    pub fn text_template(&self) -> Option<&TemplateRef> {
        self.text_template.as_ref().filter(|t| !t.is_empty())
    }

    pub fn html_template(&self) -> Option<&TemplateRef> {
        self.html_template.as_ref().filter(|t| !t.is_empty())
    }

    pub fn body(&self, kind: PartKind) -> Option<&str> {
        match kind {
            PartKind::Text => self.text_body(),
            PartKind::Html => self.html_body(),
        }
    }

    pub fn template(&self, kind: PartKind) -> Option<&TemplateRef> {
        match kind {
            PartKind::Text => self.text_template(),
            PartKind::Html => self.html_template(),
        }
    }

    /// Files attached to the delivered message, in order.
    pub fn attachments(&self) -> &[PathBuf] {
        &self.attachments
    }

    pub fn headers(&self) -> &[(String, String)] {
        &self.headers
    }

    pub fn context(&self) -> &liquid::Object {
        &self.context
    }
}

#[derive(Debug, Clone)]
pub struct MessageConfigBuilder {
    config: MessageConfig,
}

impl MessageConfigBuilder {
    pub fn new(recipient: impl Into<String>, subject: impl Into<String>) -> Self {
        Self {
            config: MessageConfig {
                recipient: recipient.into(),
                subject: subject.into(),
                cc: Vec::new(),
                bcc: Vec::new(),
                from_address: None,
                reply_to: None,
                text_body: None,
                html_body: None,
                text_template: None,
                html_template: None,
                attachments: Vec::new(),
                headers: Vec::new(),
                context: liquid::Object::new(),
            },
        }
    }

    pub fn text_body(mut self, body: impl Into<String>) -> Self {
        self.config.text_body = Some(body.into());
        self
    }

    pub fn html_body(mut self, body: impl Into<String>) -> Self {
        self.config.html_body = Some(body.into());
        self
    }

    pub fn text_template(mut self, template: impl Into<TemplateRef>) -> Self {
        self.config.text_template = Some(template.into());
        self
    }

    pub fn html_template(mut self, template: impl Into<TemplateRef>) -> Self {
        self.config.html_template = Some(template.into());
        self
    }

    pub fn cc(mut self, address: impl Into<String>) -> Self {
        self.config.cc.push(address.into());
        self
    }

    pub fn bcc(mut self, address: impl Into<String>) -> Self {
        self.config.bcc.push(address.into());
        self
    }

    pub fn from_address(mut self, address: impl Into<String>) -> Self {
        self.config.from_address = Some(address.into());
        self
    }

    pub fn reply_to(mut self, address: impl Into<String>) -> Self {
        self.config.reply_to = Some(address.into());
        self
    }

    pub fn attachment(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.attachments.push(path.into());
        self
    }

    /// Adds an extra header to the delivered message.
    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.config.headers.push((name.into(), value.into()));
        self
    }

    /// Adds a string variable to every template rendered for this message.
    pub fn context(self, key: impl Into<String>, value: impl Into<String>) -> Self {
        let value: String = value.into();
        self.context_value(key, liquid::model::Value::Scalar(value.into()))
    }

    pub fn context_value(mut self, key: impl Into<String>, value: liquid::model::Value) -> Self {
        let key: String = key.into();
        self.config.context.insert(key.into(), value);
        self
    }

    pub fn build(mut self) -> Result<MessageConfig, ComposeError> {
        let recipient = self.config.recipient.trim();
        if recipient.is_empty() {
            return Err(ComposeError::MissingRecipient);
        }
        self.config.recipient = recipient.to_string();

        self.config.cc.retain(|address| !address.trim().is_empty());
        self.config.bcc.retain(|address| !address.trim().is_empty());

        Ok(self.config)
    }
}

/// Which parts the caller asks for at send time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SendIntent {
    pub want_text: bool,
    pub want_html: bool,
}

impl SendIntent {
    pub fn new(want_text: bool, want_html: bool) -> Self {
        Self {
            want_text,
            want_html,
        }
    }

    pub fn text_only() -> Self {
        Self::new(true, false)
    }

    pub fn html_only() -> Self {
        Self::new(false, true)
    }

    /// Wants a kind only when the message carries a template or a body for it.
    pub fn from_sources(config: &MessageConfig) -> Self {
        Self::new(
            config.text_template().is_some() || config.text_body().is_some(),
            config.html_template().is_some() || config.html_body().is_some(),
        )
    }

    pub fn wants(&self, kind: PartKind) -> bool {
        match kind {
            PartKind::Text => self.want_text,
            PartKind::Html => self.want_html,
        }
    }
}

impl Default for SendIntent {
    fn default() -> Self {
        Self::new(true, true)
    }
}

/// The resolved parts of a message. At least one of `text` and `html` is set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComposedMessage {
    pub subject: String,
    pub text: Option<String>,
    pub html: Option<String>,
}

impl ComposedMessage {
    pub fn part(&self, kind: PartKind) -> Option<&str> {
        match kind {
            PartKind::Text => self.text.as_deref(),
            PartKind::Html => self.html.as_deref(),
        }
    }
}
