//! Document sources: where raw text comes from before it is chunked.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tracing::{debug, error};

use crate::document::Document;
use crate::error::{RagError, Result};

/// Loads the documents a conversation is grounded in.
///
/// Implementations report failures as
/// [`RagError::SourceUnavailable`](crate::RagError::SourceUnavailable).
#[async_trait]
pub trait DocumentSource: Send + Sync {
    /// Load every document this source provides.
    async fn load(&self) -> Result<Vec<Document>>;

    /// A short name used in logs and error context.
    fn name(&self) -> &str;
}

/// A source over documents that are already in memory.
#[derive(Debug, Clone, Default)]
pub struct StaticSource {
    documents: Vec<Document>,
}

impl StaticSource {
    /// Wrap the given documents.
    pub fn new(documents: Vec<Document>) -> Self {
        Self { documents }
    }
}

#[async_trait]
impl DocumentSource for StaticSource {
    async fn load(&self) -> Result<Vec<Document>> {
        Ok(self.documents.clone())
    }

    fn name(&self) -> &str {
        "static"
    }
}

/// A source that reads one UTF-8 text file as a single document.
///
/// The document id is the file stem and its `source` metadata is the path.
#[derive(Debug, Clone)]
pub struct FileSource {
    path: PathBuf,
}

impl FileSource {
    /// Read from the given path.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// The file this source reads.
    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl DocumentSource for FileSource {
    async fn load(&self) -> Result<Vec<Document>> {
        let text = tokio::fs::read_to_string(&self.path).await.map_err(|e| {
            error!(path = %self.path.display(), error = %e, "failed to read document");
            RagError::SourceUnavailable {
                source_name: self.path.display().to_string(),
                message: e.to_string(),
            }
        })?;

        let id = self
            .path
            .file_stem()
            .map(|stem| stem.to_string_lossy().into_owned())
            .unwrap_or_else(|| "document".to_string());
        let source = self.path.display().to_string();
        debug!(path = %source, chars = text.chars().count(), "loaded document");

        Ok(vec![
            Document::new(text)
                .with_id(id)
                .with_metadata("source", source.clone())
                .with_source_uri(source),
        ])
    }

    fn name(&self) -> &str {
        "file"
    }
}
