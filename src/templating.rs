use serde::{Deserialize, Serialize};
use std::{
    collections::HashMap,
    fmt,
    path::PathBuf,
    sync::{Arc, RwLock},
    time::SystemTime,
};
use thiserror::Error;
use tracing::{debug, info};

pub const DEFAULT_TEXT_TEMPLATE: &str = "email/base_text_email.liquid";
pub const DEFAULT_HTML_TEMPLATE: &str = "email/base_html_email.liquid";

// Both defaults pass their body through untouched unless the template
// directory ships its own version.
const BUILTIN_TEXT_SOURCE: &str = "{{ body }}";
const BUILTIN_HTML_SOURCE: &str = "{{ body }}";

#[derive(Debug, Error)]
pub enum TemplateError {
    #[error("Template not found: {0}")]
    NotFound(String),

    #[error("Failed to render template {name}: {message}")]
    Render { name: String, message: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Name of a template, relative to the template directory.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TemplateRef(String);

impl TemplateRef {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.trim().is_empty()
    }
}

impl fmt::Display for TemplateRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for TemplateRef {
    fn from(name: &str) -> Self {
        Self::new(name)
    }
}

impl From<String> for TemplateRef {
    fn from(name: String) -> Self {
        Self(name)
    }
}

/// The pair of templates used for a part when no custom template is given.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DefaultTemplates {
    pub text: TemplateRef,
    pub html: TemplateRef,
}

impl DefaultTemplates {
    pub fn new(text: impl Into<TemplateRef>, html: impl Into<TemplateRef>) -> Self {
        Self {
            text: text.into(),
            html: html.into(),
        }
    }
}

impl Default for DefaultTemplates {
    fn default() -> Self {
        Self::new(DEFAULT_TEXT_TEMPLATE, DEFAULT_HTML_TEMPLATE)
    }
}

pub trait TemplateRenderer: Send + Sync {
    fn render_template(
        &self,
        template: &TemplateRef,
        context: &liquid::Object,
    ) -> Result<String, TemplateError>;
}

pub struct TemplateEngine {
    template_dir: PathBuf,
    builtins: HashMap<String, String>,
    cache: Arc<RwLock<HashMap<String, CachedTemplate>>>,
}

struct CachedTemplate {
    content: String,
    modified: SystemTime,
}

impl TemplateEngine {
    pub fn new(template_dir: PathBuf) -> Self {
        let mut builtins = HashMap::new();
        builtins.insert(
            DEFAULT_TEXT_TEMPLATE.to_string(),
            BUILTIN_TEXT_SOURCE.to_string(),
        );
        builtins.insert(
            DEFAULT_HTML_TEMPLATE.to_string(),
            BUILTIN_HTML_SOURCE.to_string(),
        );

        Self {
            template_dir,
            builtins,
            cache: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    /// Registers a template that is used when the directory has no file of that name.
    pub fn with_builtin(mut self, name: impl Into<String>, source: impl Into<String>) -> Self {
        self.builtins.insert(name.into(), source.into());
        self
    }

    fn load_template(&self, name: &str) -> Result<String, TemplateError> {
        let template_path = self.template_dir.join(name);

        let metadata = match std::fs::metadata(&template_path) {
            Ok(metadata) if metadata.is_file() => metadata,
            Ok(_) => return self.load_builtin(name),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return self.load_builtin(name),
            Err(e) => return Err(TemplateError::Io(e)),
        };

        let modified = metadata.modified()?;

        if let Ok(cache) = self.cache.read()
            && let Some(cached) = cache.get(name)
            && cached.modified >= modified
        {
            debug!("Using cached template for {}", name);
            return Ok(cached.content.clone());
        }

        info!("Loading template: {}", name);

        let content = std::fs::read_to_string(&template_path)?;

        if let Ok(mut cache) = self.cache.write() {
            cache.insert(
                name.to_string(),
                CachedTemplate {
                    content: content.clone(),
                    modified,
                },
            );
        }

        Ok(content)
    }

    fn load_builtin(&self, name: &str) -> Result<String, TemplateError> {
        match self.builtins.get(name) {
            Some(source) => {
                debug!("Using built-in template for {}", name);
                Ok(source.clone())
            }
            None => Err(TemplateError::NotFound(name.to_string())),
        }
    }

    pub fn render_source(
        &self,
        name: &str,
        source: &str,
        globals: &liquid::Object,
    ) -> Result<String, TemplateError> {
        let render_error = |e: liquid::Error| TemplateError::Render {
            name: name.to_string(),
            message: e.to_string(),
        };

        let parser = liquid::ParserBuilder::with_stdlib()
            .build()
            .map_err(render_error)?;

        let template = parser.parse(source).map_err(render_error)?;

        template.render(globals).map_err(render_error)
    }
}

impl TemplateRenderer for TemplateEngine {
    fn render_template(
        &self,
        template: &TemplateRef,
        context: &liquid::Object,
    ) -> Result<String, TemplateError> {
        let source = self.load_template(template.as_str())?;
        self.render_source(template.as_str(), &source, context)
    }
}
