//! Reference template loading
//!
//! The structural template and the writing standard are plain Markdown files
//! read from a directory on every request, so edits apply without a restart.

use std::path::{Path, PathBuf};
use tracing::debug;

use crate::constants::templates::{REQUIREMENTS_TEMPLATE, WRITING_GUIDELINES};
use crate::types::{PrdError, Result};

/// The two fixed reference texts embedded into every prompt
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReferenceTexts {
    /// Structural template of the requirements document
    pub template: String,
    /// Writing standard the document must follow
    pub guidelines: String,
}

#[derive(Debug, Clone)]
pub struct TemplateStore {
    dir: PathBuf,
}

impl TemplateStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub async fn load(&self) -> Result<ReferenceTexts> {
        Ok(ReferenceTexts {
            template: self.read(REQUIREMENTS_TEMPLATE).await?,
            guidelines: self.read(WRITING_GUIDELINES).await?,
        })
    }

    async fn read(&self, name: &str) -> Result<String> {
        let path = self.dir.join(name);
        debug!("Reading reference template: {}", path.display());
        tokio::fs::read_to_string(&path)
            .await
            .map_err(|e| PrdError::template(name, format!("{}: {}", path.display(), e)))
    }
}
