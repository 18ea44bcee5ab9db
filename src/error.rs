use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Errors raised while loading scenes, walking hierarchies and writing reports.
#[derive(Debug, Error)]
pub enum SceneError {
    #[error("malformed document: {reason}")]
    MalformedDocument { reason: String },
    #[error("record '{id}' could not be parsed: {source}")]
    RecordParse {
        id: String,
        #[source]
        source: serde_yaml::Error,
    },
    #[error("reference to '{0}' does not resolve to any record in this document")]
    DanglingReference(String),
    #[error("the null reference (fileID 0) cannot be resolved")]
    InvalidReference,
    #[error("record '{id}' is a {found}, expected {expected}")]
    UnexpectedKind {
        id: String,
        expected: &'static str,
        found: String,
    },
    #[error("record '{id}' has no {field}")]
    MissingField { id: String, field: &'static str },
    #[error("record '{0}' is its own ancestor")]
    CyclicReference(String),
    #[error("{}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("invalid Unity project path: {}", .0.display())]
    InvalidProject(PathBuf),
    #[error("config {}: {source}", .path.display())]
    Config {
        path: PathBuf,
        #[source]
        source: ConfigError,
    },
    #[error("{}: {source}", .path.display())]
    MalformedMetadata {
        path: PathBuf,
        #[source]
        source: MetaError,
    },
}

/// Problems with the contents of a `.scenetree.toml` file.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error(transparent)]
    Read(#[from] io::Error),
    #[error(transparent)]
    Toml(#[from] toml::de::Error),
    #[error("scene_extensions must not be empty")]
    NoSceneExtensions,
    #[error("extension '{0}' must be non-empty and have no leading dot")]
    BadExtension(String),
    #[error("exclude pattern: {0}")]
    Exclude(#[from] globset::Error),
}

/// Why a script `.meta` file yields no GUID.
#[derive(Debug, Error)]
pub enum MetaError {
    #[error(transparent)]
    Yaml(#[from] serde_yaml::Error),
    #[error("no guid field")]
    MissingGuid,
}

impl SceneError {
    pub fn malformed(reason: impl Into<String>) -> Self {
        SceneError::MalformedDocument {
            reason: reason.into(),
        }
    }

    pub fn io(path: impl Into<PathBuf>, source: io::Error) -> Self {
        SceneError::Io {
            path: path.into(),
            source,
        }
    }

    /// True for failures that only invalidate the document (or metadata file)
    /// being processed. Everything else stops the run.
    pub fn is_isolated(&self) -> bool {
        !matches!(
            self,
            SceneError::Io { .. } | SceneError::InvalidProject(_) | SceneError::Config { .. }
        )
    }
}

pub type Result<T> = std::result::Result<T, SceneError>;
