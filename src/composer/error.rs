use thiserror::Error;

use crate::templating::TemplateError;

#[derive(Debug, Error)]
pub enum ComposeError {
    #[error("Recipient is required")]
    MissingRecipient,

    #[error("Ambiguous template intent: a custom template was given for only one part but both parts were requested")]
    AmbiguousTemplateIntent,

    #[error("Missing body for default template")]
    MissingBodyForDefaultTemplate,

    #[error("Nothing to send")]
    NothingToSend,

    #[error(transparent)]
    Template(#[from] TemplateError),
}

impl ComposeError {
    /// True for errors caused by the message inputs rather than a collaborator.
    pub fn is_validation(&self) -> bool {
        !matches!(self, ComposeError::Template(_))
    }
}
