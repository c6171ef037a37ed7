use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

pub mod composer;
pub mod convert;
pub mod email;
pub mod mailer;
pub mod templating;

#[cfg(test)]
mod templating_tests;

pub use composer::{ComposeError, ComposedMessage, Composer, MessageConfig, SendIntent, compose};
pub use mailer::{Mailer, MailerError, MailerSettings};

use email::EmailConfig;
use templating::{DEFAULT_HTML_TEMPLATE, DEFAULT_TEXT_TEMPLATE, DefaultTemplates};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("TOML parsing error: {0}")]
    TomlError(#[from] toml_edit::de::Error),
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub app: AppConfig,
    #[serde(default)]
    pub templates: TemplateConfig,
    #[serde(default)]
    pub site: SiteConfig,
    #[serde(default)]
    pub conversion: ConversionConfig,
    #[serde(default)]
    pub email: EmailConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct AppConfig {
    pub name: String,
    pub log_level: String,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TemplateConfig {
    pub directory: PathBuf,
    #[serde(default = "default_text_template")]
    pub default_text: String,
    #[serde(default = "default_html_template")]
    pub default_html: String,
}

/// Exposed to every template as `site_name` and `domain`.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct SiteConfig {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub domain: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ConversionConfig {
    pub text_width: usize,
}

fn default_text_template() -> String {
    DEFAULT_TEXT_TEMPLATE.to_string()
}

fn default_html_template() -> String {
    DEFAULT_HTML_TEMPLATE.to_string()
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            name: "Mailcraft".to_string(),
            log_level: "info".to_string(),
        }
    }
}

impl Default for TemplateConfig {
    fn default() -> Self {
        Self {
            directory: PathBuf::from("templates"),
            default_text: default_text_template(),
            default_html: default_html_template(),
        }
    }
}

impl Default for ConversionConfig {
    fn default() -> Self {
        Self {
            text_width: convert::DEFAULT_TEXT_WIDTH,
        }
    }
}

impl TemplateConfig {
    pub fn default_templates(&self) -> DefaultTemplates {
        DefaultTemplates::new(self.default_text.as_str(), self.default_html.as_str())
    }
}

impl Config {
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        Ok(toml_edit::de::from_str::<Config>(content)?)
    }

    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml(&content)
    }

    pub fn template_globals(&self) -> liquid::Object {
        let site_name = self.site.name.clone().unwrap_or_else(|| self.app.name.clone());
        let domain = self.site.domain.clone().unwrap_or_default();

        liquid::object!({
            "site_name": site_name,
            "domain": domain,
        })
    }
}
