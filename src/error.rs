//! Error types for Glacier
//!
//! All modules use `GlacierResult<T>` as their return type.

use std::path::{Path, PathBuf};
use thiserror::Error;

/// Result type alias for Glacier operations
pub type GlacierResult<T> = Result<T, GlacierError>;

/// All errors that can occur in Glacier
#[derive(Error, Debug)]
pub enum GlacierError {
    // Manifest errors
    #[error("Manifest not found: {}", .0.display())]
    ResourceNotFound(PathBuf),

    #[error("Failed to read manifest {}: {source}", path.display())]
    ResourceReadFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Malformed manifest {}: {reason}", path.display())]
    MalformedDocument { path: PathBuf, reason: String },

    #[error("Manifest file is empty: {}", .0.display())]
    EmptyManifest(PathBuf),

    #[error("Manifest evaluation failed for {}: {reason}", path.display())]
    EvaluationFailed { path: PathBuf, reason: String },

    // Value errors
    #[error("Cannot modify frozen {kind}")]
    MutationOnFrozenValue { kind: &'static str },

    // Configuration errors
    #[error("Invalid configuration at {}: {reason}", path.display())]
    ConfigInvalid { path: PathBuf, reason: String },

    #[error("Failed to create config directory {}: {source}", path.display())]
    ConfigDirCreate {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // IO errors
    #[error("IO error: {context}")]
    Io {
        context: String,
        #[source]
        source: std::io::Error,
    },

    // Serialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error("TOML serialize error: {0}")]
    TomlSerialize(#[from] toml::ser::Error),

    // General errors
    #[error("{0}")]
    User(String),
}

impl GlacierError {
    /// Create an IO error with context
    pub fn io(context: impl Into<String>, source: std::io::Error) -> Self {
        Self::Io {
            context: context.into(),
            source,
        }
    }

    /// Classify a failed manifest read.
    ///
    /// `NotFound` becomes [`GlacierError::ResourceNotFound`], anything else
    /// [`GlacierError::ResourceReadFailed`].
    pub fn read_failed(path: &Path, source: std::io::Error) -> Self {
        if source.kind() == std::io::ErrorKind::NotFound {
            Self::ResourceNotFound(path.to_path_buf())
        } else {
            Self::ResourceReadFailed {
                path: path.to_path_buf(),
                source,
            }
        }
    }

    /// Create a frozen-value mutation error
    pub fn frozen(kind: &'static str) -> Self {
        Self::MutationOnFrozenValue { kind }
    }

    /// Check if the error means the manifest does not exist
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::ResourceNotFound(_))
    }

    /// Get actionable hint for the error
    pub fn hint(&self) -> Option<&'static str> {
        match self {
            Self::ResourceNotFound(_) => Some("Check the path; it is used exactly as given"),
            Self::EmptyManifest(_) => Some("Script manifests must assign at least one global"),
            Self::MutationOnFrozenValue { .. } => {
                Some("Cached manifests are read-only; load with --no-cache for a mutable copy")
            }
            Self::ConfigInvalid { .. } => Some("Run: glacier config init --force"),
            _ => None,
        }
    }
}
