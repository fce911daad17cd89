//! Error types for registry reads.

use std::path::{Path, PathBuf};
use thiserror::Error;

/// Result type for registry operations.
pub type RegistryResult<T> = Result<T, RegistryError>;

/// Failure while reading the registry checkout.
///
/// Missing optional files and unresolved member links are not errors; they
/// surface as `None` from the accessors that encounter them.
#[derive(Debug, Error)]
pub enum RegistryError {
    /// A header block did not follow the `key: value` format.
    #[error("malformed header block in {} at line {line}: {message}", path.display())]
    Format {
        path: PathBuf,
        line: usize,
        message: String,
    },

    /// Content was not valid UTF-8 (or contained NUL bytes).
    #[error("invalid text in {}: {detail}", path.display())]
    Encoding { path: PathBuf, detail: String },

    /// A mandatory filesystem read failed.
    #[error("failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl RegistryError {
    pub(crate) fn io(path: impl AsRef<Path>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.as_ref().to_path_buf(),
            source,
        }
    }

    pub(crate) fn format(path: impl AsRef<Path>, line: usize, message: impl Into<String>) -> Self {
        Self::Format {
            path: path.as_ref().to_path_buf(),
            line,
            message: message.into(),
        }
    }

    pub(crate) fn encoding(path: impl AsRef<Path>, detail: impl Into<String>) -> Self {
        Self::Encoding {
            path: path.as_ref().to_path_buf(),
            detail: detail.into(),
        }
    }

    /// Path of the file the error refers to.
    pub fn path(&self) -> &Path {
        match self {
            Self::Format { path, .. } | Self::Encoding { path, .. } | Self::Io { path, .. } => path,
        }
    }

    /// Check if this is a data-format problem rather than an IO failure.
    pub fn is_data_error(&self) -> bool {
        matches!(self, Self::Format { .. } | Self::Encoding { .. })
    }
}
