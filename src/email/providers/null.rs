use crate::email::{
    DeliveryReceipt, EmailBody, EmailError, EmailMessage, EmailProvider, attachment,
};
use async_trait::async_trait;
use std::sync::atomic::{AtomicU64, Ordering};
use tracing::info;

const PREVIEW_CHARS: usize = 200;

pub struct NullProvider {
    sent: AtomicU64,
}

impl NullProvider {
    pub fn new() -> Self {
        Self {
            sent: AtomicU64::new(0),
        }
    }

    pub fn sent_count(&self) -> u64 {
        self.sent.load(Ordering::Relaxed)
    }
}

impl Default for NullProvider {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl EmailProvider for NullProvider {
    async fn send_email(&self, message: EmailMessage) -> Result<DeliveryReceipt, EmailError> {
        message.validate()?;

        // Missing or unreadable attachments fail here too.
        let attachments = attachment::load_all(&message.attachments).await?;

        let recipients = message.to.join(", ");

        let preview_source = match &message.body {
            EmailBody::Text(text) => text,
            EmailBody::Html(html) => html,
            EmailBody::Both { text, .. } => text,
        };
        let body_preview = preview_source
            .chars()
            .take(PREVIEW_CHARS)
            .collect::<String>();
        let truncated = preview_source.chars().count() > PREVIEW_CHARS;

        info!(
            "NULL EMAIL PROVIDER - Would send email:\n\
             From: {}\n\
             To: {}\n\
             Cc: {}\n\
             Reply-To: {}\n\
             Subject: {}\n\
             Attachments: {}\n\
             Body (first {} chars): {}{}",
            message.from,
            recipients,
            if message.cc.is_empty() {
                "(none)".to_string()
            } else {
                message.cc.join(", ")
            },
            message.reply_to.as_deref().unwrap_or("(none)"),
            message.subject,
            attachments.len(),
            PREVIEW_CHARS,
            body_preview,
            if truncated { "..." } else { "" }
        );

        let full_body = match &message.body {
            EmailBody::Text(text) => format!("Text:\n{}", text),
            EmailBody::Html(html) => format!("HTML:\n{}", html),
            EmailBody::Both { text, html } => format!("Text:\n{}\n\nHTML:\n{}", text, html),
        };

        let headers = message
            .headers
            .iter()
            .map(|(name, value)| format!("{}: {}", name, value))
            .collect::<Vec<_>>();
        let attached = attachments
            .iter()
            .map(|a| format!("{} ({}, {} bytes)", a.filename, a.content_type, a.data.len()))
            .collect::<Vec<_>>();

        tracing::debug!(
            "NULL EMAIL PROVIDER - Full email message:\n\
             From: {}\n\
             To: {:?}\n\
             Bcc: {:?}\n\
             Subject: {}\n\
             Headers: {:?}\n\
             Attachments: {:?}\n\
             Body:\n{}",
            message.from,
            message.to,
            message.bcc,
            message.subject,
            headers,
            attached,
            full_body
        );

        let sequence = self.sent.fetch_add(1, Ordering::Relaxed) + 1;
        Ok(DeliveryReceipt::new(
            self.name(),
            Some(format!("null-{}", sequence)),
        ))
    }

    fn name(&self) -> &str {
        "Null Email Provider (Logging Only)"
    }
}
