use std::path::{Path, PathBuf};
use tracing::debug;

use crate::email::EmailError;

/// A file read from disk, ready to be embedded in a message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attachment {
    pub filename: String,
    pub content_type: String,
    pub data: Vec<u8>,
}

impl Attachment {
    pub async fn load(path: &Path) -> Result<Self, EmailError> {
        let filename = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .ok_or_else(|| EmailError::InvalidAttachment(path.display().to_string()))?;

        let data = tokio::fs::read(path).await?;
        let content_type = mime_guess::from_path(path)
            .first_or_octet_stream()
            .to_string();

        debug!(
            "Loaded attachment {} ({}, {} bytes)",
            filename,
            content_type,
            data.len()
        );

        Ok(Self {
            filename,
            content_type,
            data,
        })
    }
}

pub async fn load_all(paths: &[PathBuf]) -> Result<Vec<Attachment>, EmailError> {
    let mut attachments = Vec::with_capacity(paths.len());
    for path in paths {
        attachments.push(Attachment::load(path).await?);
    }
    Ok(attachments)
}
