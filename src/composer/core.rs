use liquid::model::Value;
use tracing::debug;

use crate::composer::{ComposeError, ComposedMessage, MessageConfig, PartKind, SendIntent};
use crate::convert::BodyConverter;
use crate::templating::{DefaultTemplates, TemplateRef, TemplateRenderer};

/// Where the content of one part comes from.
#[derive(Debug)]
enum PartSource<'c> {
    /// Custom template, rendered with the part's own raw body (if any).
    Template(&'c TemplateRef),
    /// Raw body rendered through the default template.
    Body(&'c str),
    /// Converted from the sibling's raw body, rendered through the default template.
    Converted(String),
}

/// Resolves a [`MessageConfig`] into rendered parts.
pub struct Composer<'a> {
    defaults: &'a DefaultTemplates,
    renderer: &'a dyn TemplateRenderer,
    converter: &'a dyn BodyConverter,
    globals: liquid::Object,
}

impl<'a> Composer<'a> {
    pub fn new(
        defaults: &'a DefaultTemplates,
        renderer: &'a dyn TemplateRenderer,
        converter: &'a dyn BodyConverter,
    ) -> Self {
        Self {
            defaults,
            renderer,
            converter,
            globals: liquid::Object::new(),
        }
    }

    /// Variables available to every template, below the message's own context.
    pub fn with_globals(mut self, globals: liquid::Object) -> Self {
        self.globals = globals;
        self
    }

    pub fn compose(
        &self,
        config: &MessageConfig,
        intent: SendIntent,
    ) -> Result<ComposedMessage, ComposeError> {
        // A custom template is a request for its part on its own.
        let want_text = intent.wants(PartKind::Text) || config.text_template().is_some();
        let want_html = intent.wants(PartKind::Html) || config.html_template().is_some();

        if !want_text && !want_html {
            return Err(ComposeError::NothingToSend);
        }

        if want_text && want_html {
            check_template_exclusivity(config)?;
        }

        // Select every source before rendering anything, so validation
        // errors never depend on collaborator output.
        let text_source = if want_text {
            Some(self.select_source(config, PartKind::Text)?)
        } else {
            None
        };
        let html_source = if want_html {
            Some(self.select_source(config, PartKind::Html)?)
        } else {
            None
        };

        let text = match text_source {
            Some(source) => self.render_part(config, PartKind::Text, source)?,
            None => None,
        };
        let html = match html_source {
            Some(source) => self.render_part(config, PartKind::Html, source)?,
            None => None,
        };

        if text.is_none() && html.is_none() {
            debug!("Both parts resolved to empty content");
            return Err(ComposeError::NothingToSend);
        }

        Ok(ComposedMessage {
            subject: config.subject().to_string(),
            text,
            html,
        })
    }

    fn select_source<'c>(
        &self,
        config: &'c MessageConfig,
        kind: PartKind,
    ) -> Result<PartSource<'c>, ComposeError> {
        if let Some(template) = config.template(kind) {
            debug!("Rendering {} part with custom template {}", kind, template);
            return Ok(PartSource::Template(template));
        }

        if let Some(body) = config.body(kind) {
            debug!("Rendering {} part from its body", kind);
            return Ok(PartSource::Body(body));
        }

        let sibling = kind.sibling();
        match config.body(sibling) {
            Some(raw) => {
                debug!("Converting {} body to {}", sibling, kind);
                let converted = match kind {
                    PartKind::Text => self.converter.html_to_text(raw),
                    PartKind::Html => self.converter.text_to_html(raw),
                };
                Ok(PartSource::Converted(converted))
            }
            None => Err(ComposeError::MissingBodyForDefaultTemplate),
        }
    }

    fn render_part(
        &self,
        config: &MessageConfig,
        kind: PartKind,
        source: PartSource<'_>,
    ) -> Result<Option<String>, ComposeError> {
        let (template, body) = match &source {
            PartSource::Template(template) => (*template, config.body(kind).unwrap_or_default()),
            PartSource::Body(body) => (self.default_template(kind), *body),
            PartSource::Converted(converted) => (self.default_template(kind), converted.as_str()),
        };

        let context = self.build_context(config, body);
        let rendered = self.renderer.render_template(template, &context)?;

        if rendered.is_empty() {
            debug!("Template {} rendered an empty {} part, dropping it", template, kind);
            return Ok(None);
        }

        Ok(Some(rendered))
    }

    fn default_template(&self, kind: PartKind) -> &TemplateRef {
        match kind {
            PartKind::Text => &self.defaults.text,
            PartKind::Html => &self.defaults.html,
        }
    }

    fn build_context(&self, config: &MessageConfig, body: &str) -> liquid::Object {
        let mut context = self.globals.clone();

        context.insert("subject".into(), scalar(config.subject()));
        context.insert("recipient".into(), scalar(config.recipient()));
        context.insert(
            "text_body".into(),
            scalar(config.text_body().unwrap_or_default()),
        );
        context.insert(
            "html_body".into(),
            scalar(config.html_body().unwrap_or_default()),
        );

        for (key, value) in config.context().iter() {
            context.insert(key.clone(), value.clone());
        }

        context.insert("body".into(), scalar(body));
        context
    }
}

/// A single custom template may not be paired with a conversion for the other part.
fn check_template_exclusivity(config: &MessageConfig) -> Result<(), ComposeError> {
    let uncovered = match (config.text_template(), config.html_template()) {
        (Some(_), None) => PartKind::Html,
        (None, Some(_)) => PartKind::Text,
        _ => return Ok(()),
    };

    if config.body(uncovered).is_none() {
        debug!(
            "Custom template given only for {} with no {} body",
            uncovered.sibling(),
            uncovered
        );
        return Err(ComposeError::AmbiguousTemplateIntent);
    }

    Ok(())
}

fn scalar(value: &str) -> Value {
    Value::Scalar(value.to_string().into())
}

/// Composes `config` with a throwaway [`Composer`].
pub fn compose(
    config: &MessageConfig,
    intent: SendIntent,
    defaults: &DefaultTemplates,
    renderer: &dyn TemplateRenderer,
    converter: &dyn BodyConverter,
) -> Result<ComposedMessage, ComposeError> {
    Composer::new(defaults, renderer, converter).compose(config, intent)
}
