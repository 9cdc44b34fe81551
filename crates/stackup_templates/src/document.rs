//! Template documents on disk.

use std::fs;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::error::{TemplateError, TemplateResult};

/// A template file loaded into memory.
///
/// The document keeps no state beyond the path and raw text; it is read,
/// rendered, written back to the same path and dropped.
#[derive(Debug, Clone)]
pub struct TemplateDocument {
    path: PathBuf,
    raw: String,
}

impl TemplateDocument {
    /// Read the whole file at `path` as UTF-8 text.
    pub fn load(path: impl AsRef<Path>) -> TemplateResult<Self> {
        let path = path.as_ref().to_path_buf();
        let raw = fs::read_to_string(&path).map_err(|source| TemplateError::Read {
            path: path.clone(),
            source,
        })?;
        Ok(Self { path, raw })
    }

    /// Create a document from text that is not on disk yet.
    pub fn from_text(path: impl Into<PathBuf>, raw: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            raw: raw.into(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn raw(&self) -> &str {
        &self.raw
    }

    /// Overwrite the document's file with `rendered`, truncating prior content.
    pub fn persist(&self, rendered: &str) -> TemplateResult<PathBuf> {
        fs::write(&self.path, rendered).map_err(|source| TemplateError::Write {
            path: self.path.clone(),
            source,
        })?;
        debug!("Wrote {} bytes to {:?}", rendered.len(), self.path);
        Ok(self.path.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_load_missing_file() {
        let temp = tempdir().unwrap();
        let err = TemplateDocument::load(temp.path().join("missing.yml")).unwrap_err();
        assert!(matches!(err, TemplateError::Read { .. }));
        assert!(err.path().unwrap().ends_with("missing.yml"));
    }

    #[test]
    fn test_persist_truncates() {
        let temp = tempdir().unwrap();
        let path = temp.path().join("compose.yml");
        fs::write(&path, "a much longer original body\n").unwrap();

        let document = TemplateDocument::load(&path).unwrap();
        document.persist("short").unwrap();

        assert_eq!(fs::read_to_string(&path).unwrap(), "short");
    }

    #[test]
    fn test_persist_into_missing_directory() {
        let temp = tempdir().unwrap();
        let document = TemplateDocument::from_text(temp.path().join("nope/compose.yml"), "x");
        let err = document.persist("x").unwrap_err();
        assert!(matches!(err, TemplateError::Write { .. }));
    }
}
