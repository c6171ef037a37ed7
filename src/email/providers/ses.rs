use async_trait::async_trait;
use aws_config::BehaviorVersion;
use aws_sdk_sesv2::{
    Client,
    config::{Credentials, Region},
    primitives::Blob,
    types::{Body, Content, Destination, EmailContent, Message, RawMessage},
};
use tracing::{debug, error};

use crate::email::{
    DeliveryReceipt, EmailBody, EmailError, EmailMessage, EmailProvider, SesConfig, attachment,
    mime,
};

pub struct SesProvider {
    client: Client,
}

impl SesProvider {
    pub async fn new(config: &SesConfig) -> Result<Self, EmailError> {
        let mut aws_config_builder = aws_config::defaults(BehaviorVersion::latest());

        // Region falls back to the environment when not configured
        if let Some(region) = &config.region {
            aws_config_builder = aws_config_builder.region(Region::new(region.clone()));
        }

        match (&config.access_key_id, &config.secret_access_key) {
            (Some(access_key), Some(secret_key)) => {
                let credentials =
                    Credentials::new(access_key, secret_key, None, None, "mailcraft-ses-provider");
                aws_config_builder = aws_config_builder.credentials_provider(credentials);
            }
            (None, None) => {}
            _ => {
                return Err(EmailError::ConfigError(
                    "SES access_key_id and secret_access_key must be set together".to_string(),
                ));
            }
        }

        let aws_config = aws_config_builder.load().await;
        let client = Client::new(&aws_config);

        Ok(Self { client })
    }
}

fn simple_content(message: &EmailMessage) -> Result<EmailContent, EmailError> {
    let body = match &message.body {
        EmailBody::Text(text) => Body::builder().text(utf8_content(text)?),
        EmailBody::Html(html) => Body::builder().html(utf8_content(html)?),
        EmailBody::Both { text, html } => Body::builder()
            .text(utf8_content(text)?)
            .html(utf8_content(html)?),
    }
    .build();

    let subject = utf8_content(&message.subject)?;
    let email_message = Message::builder().subject(subject).body(body).build();

    Ok(EmailContent::builder().simple(email_message).build())
}

// Attachments and custom headers only travel in a raw MIME message.
async fn raw_content(message: &EmailMessage) -> Result<EmailContent, EmailError> {
    let attachments = attachment::load_all(&message.attachments).await?;
    let data = mime::build_raw_message(message, &attachments)?;

    debug!(
        "Sending raw SES message ({} bytes, {} attachments, {} headers)",
        data.len(),
        attachments.len(),
        message.headers.len()
    );

    let raw = RawMessage::builder()
        .data(Blob::new(data))
        .build()
        .map_err(|e| EmailError::ProviderError(e.to_string()))?;

    Ok(EmailContent::builder().raw(raw).build())
}

fn utf8_content(data: &str) -> Result<Content, EmailError> {
    Content::builder()
        .data(data)
        .charset("UTF-8")
        .build()
        .map_err(|e| EmailError::ProviderError(e.to_string()))
}

#[async_trait]
impl EmailProvider for SesProvider {
    async fn send_email(&self, message: EmailMessage) -> Result<DeliveryReceipt, EmailError> {
        message.validate()?;

        debug!(
            "Sending email via SES to: {:?} ({} recipients)",
            message.to,
            message.recipient_count()
        );

        let mut destination = Destination::builder().set_to_addresses(Some(message.to.clone()));
        if !message.cc.is_empty() {
            destination = destination.set_cc_addresses(Some(message.cc.clone()));
        }
        if !message.bcc.is_empty() {
            destination = destination.set_bcc_addresses(Some(message.bcc.clone()));
        }
        let destination = destination.build();

        let content = if message.has_extras() {
            raw_content(&message).await?
        } else {
            simple_content(&message)?
        };

        let mut send_email_builder = self
            .client
            .send_email()
            .from_email_address(&message.from)
            .destination(destination)
            .content(content);

        if let Some(reply_to) = &message.reply_to {
            send_email_builder = send_email_builder.reply_to_addresses(reply_to);
        }

        match send_email_builder.send().await {
            Ok(output) => {
                debug!(
                    "Email sent successfully. Message ID: {:?}",
                    output.message_id()
                );
                Ok(DeliveryReceipt::new(
                    self.name(),
                    output.message_id().map(str::to_string),
                ))
            }
            Err(e) => {
                error!("Failed to send email via SES: {}", e);
                Err(EmailError::AwsError(e.to_string()))
            }
        }
    }

    fn name(&self) -> &str {
        "Amazon SES"
    }
}
