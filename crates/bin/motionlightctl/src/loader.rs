//! Rules document loading.

use std::path::{Path, PathBuf};

use motionlight_domain::definition::ConfigDocument;

/// Failures reading or parsing a rules document.
#[derive(Debug, thiserror::Error)]
pub enum LoadError {
    /// The file could not be read.
    #[error("failed to read rules document {}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    /// The file is not a well-formed rules document.
    #[error("failed to parse rules document {}", .path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },
}

/// Read and parse the YAML rules document at `path`.
///
/// # Errors
///
/// Returns [`LoadError::Io`] when the file cannot be read and
/// [`LoadError::Parse`] when it does not match the document schema.
pub fn load_document(path: &Path) -> Result<ConfigDocument, LoadError> {
    let content = std::fs::read_to_string(path).map_err(|source| LoadError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let document = parse_document(&content).map_err(|source| LoadError::Parse {
        path: path.to_path_buf(),
        source,
    })?;
    tracing::debug!(
        path = %path.display(),
        light_configs = document.light_configs.len(),
        templates = document.templates.light_config_rules.len(),
        "rules document loaded"
    );
    Ok(document)
}

fn parse_document(content: &str) -> Result<ConfigDocument, serde_yaml::Error> {
    serde_yaml::from_str(content)
}
