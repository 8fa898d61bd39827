//! Credential error types.

use std::path::PathBuf;

use thiserror::Error;

/// Errors that can occur while loading credentials.
#[derive(Debug, Error)]
pub enum CredentialError {
    /// The cookie file does not exist.
    #[error("Cookie file not found: {}", .0.display())]
    NotFound(PathBuf),

    /// The cookie file exists but could not be read.
    #[error("Failed to read cookie file {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The cookie file is not a JSON array of cookie records.
    #[error("Malformed cookie file {}: {source}", path.display())]
    Malformed {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    /// The cookie file holds no cookies.
    #[error("Cookie file {} contains no cookies", .0.display())]
    Empty(PathBuf),
}

impl CredentialError {
    /// Check if the credential store is absent rather than unusable.
    pub fn is_missing(&self) -> bool {
        matches!(self, Self::NotFound(_))
    }

    /// Path of the credential store involved.
    pub fn path(&self) -> &PathBuf {
        match self {
            Self::NotFound(path) | Self::Empty(path) => path,
            Self::Io { path, .. } | Self::Malformed { path, .. } => path,
        }
    }
}
