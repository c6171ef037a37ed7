use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::{
    Config,
    composer::{ComposeError, ComposedMessage, Composer, MessageConfig, SendIntent},
    convert::{BodyConverter, MarkdownConverter},
    email::{DeliveryReceipt, DynEmailProvider, EmailError, EmailMessage, create_provider},
    templating::{DefaultTemplates, TemplateEngine, TemplateRenderer},
};

#[derive(Debug, Error)]
pub enum MailerError {
    #[error(transparent)]
    Compose(#[from] ComposeError),

    #[error(transparent)]
    Email(#[from] EmailError),
}

/// Sender defaults and template globals shared by every message.
#[derive(Debug, Clone)]
pub struct MailerSettings {
    pub from: String,
    pub reply_to: Option<String>,
    pub defaults: DefaultTemplates,
    pub globals: liquid::Object,
}

impl MailerSettings {
    pub fn new(from: impl Into<String>) -> Self {
        Self {
            from: from.into(),
            reply_to: None,
            defaults: DefaultTemplates::default(),
            globals: liquid::Object::new(),
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self {
            from: config.email.format_from(),
            reply_to: config.email.reply_to.clone(),
            defaults: config.templates.default_templates(),
            globals: config.template_globals(),
        }
    }
}

pub struct Mailer {
    provider: DynEmailProvider,
    renderer: Arc<dyn TemplateRenderer>,
    converter: Arc<dyn BodyConverter>,
    settings: MailerSettings,
}

impl Mailer {
    pub fn new(
        provider: DynEmailProvider,
        renderer: Arc<dyn TemplateRenderer>,
        converter: Arc<dyn BodyConverter>,
        settings: MailerSettings,
    ) -> Self {
        Self {
            provider,
            renderer,
            converter,
            settings,
        }
    }

    pub async fn from_config(config: &Config) -> Result<Self, MailerError> {
        if !config.templates.directory.is_dir() {
            warn!(
                "Template directory {:?} does not exist, only built-in templates are available",
                config.templates.directory
            );
        }

        let provider = create_provider(&config.email.provider).await?;
        let renderer = Arc::new(TemplateEngine::new(config.templates.directory.clone()));
        let converter = Arc::new(MarkdownConverter::with_width(config.conversion.text_width));

        info!(
            "Mailer ready using {} with templates from {:?}",
            provider.name(),
            config.templates.directory
        );

        Ok(Self::new(
            provider,
            renderer,
            converter,
            MailerSettings::from_config(config),
        ))
    }

    pub fn provider_name(&self) -> &str {
        self.provider.name()
    }

    pub fn settings(&self) -> &MailerSettings {
        &self.settings
    }

    /// Resolves the parts of a message without delivering it.
    pub fn compose(
        &self,
        config: &MessageConfig,
        intent: SendIntent,
    ) -> Result<ComposedMessage, MailerError> {
        let composed = Composer::new(
            &self.settings.defaults,
            self.renderer.as_ref(),
            self.converter.as_ref(),
        )
        .with_globals(self.settings.globals.clone())
        .compose(config, intent)?;

        Ok(composed)
    }

    pub async fn send(
        &self,
        config: &MessageConfig,
        intent: SendIntent,
    ) -> Result<DeliveryReceipt, MailerError> {
        let composed = self.compose(config, intent)?;
        let message = self.build_message(config, composed)?;

        debug!(
            "Handing message for {} to {}",
            config.recipient(),
            self.provider.name()
        );

        let receipt = self.provider.send_email(message).await?;

        info!(
            "Delivered \"{}\" to {} via {} (message id: {})",
            config.subject(),
            config.recipient(),
            receipt.provider,
            receipt.message_id.as_deref().unwrap_or("-")
        );

        Ok(receipt)
    }

    /// Like [`Mailer::send`], but a message with nothing to send yields `Ok(None)`.
    pub async fn send_quietly(
        &self,
        config: &MessageConfig,
        intent: SendIntent,
    ) -> Result<Option<DeliveryReceipt>, MailerError> {
        match self.send(config, intent).await {
            Ok(receipt) => Ok(Some(receipt)),
            Err(MailerError::Compose(ComposeError::NothingToSend)) => {
                debug!("Nothing to send to {}, skipping", config.recipient());
                Ok(None)
            }
            Err(e) => Err(e),
        }
    }

    fn build_message(
        &self,
        config: &MessageConfig,
        composed: ComposedMessage,
    ) -> Result<EmailMessage, EmailError> {
        let from = config.from_address().unwrap_or(&self.settings.from);

        let mut message = EmailMessage::from_composed(composed, config.recipient(), from)?
            .with_cc(config.cc().iter().cloned())
            .with_bcc(config.bcc().iter().cloned())
            .with_attachments(config.attachments().iter().cloned())
            .with_headers(config.headers().iter().cloned());

        if let Some(reply_to) = config.reply_to().or(self.settings.reply_to.as_deref()) {
            message = message.with_reply_to(reply_to);
        }

        Ok(message)
    }
}
