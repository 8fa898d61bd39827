//! Credential source abstraction.
//!
//! The monitor only needs "give me the current cookie bundle". The concrete
//! file-backed implementation reads a browser cookie export in JSON form.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tracing::debug;

use super::error::CredentialError;
use super::types::CredentialBundle;

#[async_trait]
pub trait CredentialSource: Send + Sync {
    /// Load the current credential bundle.
    async fn load(&self) -> Result<CredentialBundle, CredentialError>;
}

/// Cookie export stored as a JSON array of `{name, value, domain}` records.
#[derive(Debug, Clone)]
pub struct JsonFileCredentialSource {
    path: PathBuf,
}

impl JsonFileCredentialSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl CredentialSource for JsonFileCredentialSource {
    async fn load(&self) -> Result<CredentialBundle, CredentialError> {
        let contents = match tokio::fs::read_to_string(&self.path).await {
            Ok(contents) => contents,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                return Err(CredentialError::NotFound(self.path.clone()));
            }
            Err(source) => {
                return Err(CredentialError::Io {
                    path: self.path.clone(),
                    source,
                });
            }
        };

        let bundle: CredentialBundle =
            serde_json::from_str(&contents).map_err(|source| CredentialError::Malformed {
                path: self.path.clone(),
                source,
            })?;

        if bundle.is_empty() {
            return Err(CredentialError::Empty(self.path.clone()));
        }

        debug!(
            path = %self.path.display(),
            cookies = bundle.len(),
            "Loaded credential bundle"
        );
        Ok(bundle)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::io::Write;

    fn write_temp(contents: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        file
    }

    #[tokio::test]
    async fn test_load_valid_file() {
        let file = write_temp(
            r#"[{"name":"MoodleSession","value":"abc","domain":".example.org"},
                {"name":"MOODLEID1_","value":"def","domain":".example.org"}]"#,
        );
        let source = JsonFileCredentialSource::new(file.path());

        let bundle = source.load().await.unwrap();
        assert_eq!(bundle.len(), 2);
        assert_eq!(bundle.cookies()[0].name, "MoodleSession");
        assert_eq!(bundle.cookies()[1].value, "def");
    }

    #[tokio::test]
    async fn test_load_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let source = JsonFileCredentialSource::new(dir.path().join("cookies.json"));

        let err = source.load().await.unwrap_err();
        assert!(err.is_missing());
        assert!(matches!(err, CredentialError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_load_malformed_file() {
        let file = write_temp(r#"{"name": "not-an-array"}"#);
        let source = JsonFileCredentialSource::new(file.path());

        let err = source.load().await.unwrap_err();
        assert!(matches!(err, CredentialError::Malformed { .. }));
        assert!(!err.is_missing());
    }

    #[tokio::test]
    async fn test_load_record_without_value_is_malformed() {
        let file = write_temp(r#"[{"name": "MoodleSession", "domain": ".example.org"}]"#);
        let source = JsonFileCredentialSource::new(file.path());

        let err = source.load().await.unwrap_err();
        assert!(matches!(err, CredentialError::Malformed { .. }));
    }

    #[tokio::test]
    async fn test_load_record_without_domain_is_malformed() {
        let file = write_temp(r#"[{"name": "MoodleSession", "value": "abc"}]"#);
        let source = JsonFileCredentialSource::new(file.path());

        let err = source.load().await.unwrap_err();
        assert!(matches!(err, CredentialError::Malformed { .. }));
    }

    #[tokio::test]
    async fn test_load_empty_array() {
        let file = write_temp("[]");
        let source = JsonFileCredentialSource::new(file.path());

        let err = source.load().await.unwrap_err();
        assert!(matches!(err, CredentialError::Empty(_)));
        assert_eq!(err.path(), &file.path().to_path_buf());
    }

    #[tokio::test]
    async fn test_load_directory_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let source = JsonFileCredentialSource::new(dir.path());

        let err = source.load().await.unwrap_err();
        assert!(matches!(err, CredentialError::Io { .. }));
    }
}
