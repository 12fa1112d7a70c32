//! Error types for document construction and case directory operations.

use std::path::PathBuf;

/// Failure while constructing a dictionary document.
#[derive(Debug, thiserror::Error)]
pub enum BuildError {
    /// Upstream configuration cannot be resolved yet (e.g. no solver selected).
    #[error("configuration not ready: {0}")]
    ConfigNotReady(String),

    /// No construction rule matches the configured value.
    #[error("no {field} rule for '{value}' (boundary '{boundary}')")]
    UnresolvedRule {
        field: String,
        boundary: String,
        value: String,
    },

    #[error("missing configuration value at {0}")]
    MissingValue(String),

    #[error("invalid configuration value at {path}: '{value}'")]
    InvalidValue { path: String, value: String },

    /// Exporting auxiliary data into the case failed.
    #[error(transparent)]
    Case(#[from] CaseError),
}

/// Failure while manipulating the case directory.
#[derive(Debug, thiserror::Error)]
pub enum CaseError {
    #[error("case root is not set up (call setup_new_case or setup_for_project first)")]
    Uninitialized,

    #[error("{op} {}: {source}", path.display())]
    FileSystem {
        op: &'static str,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The directory is missing one of the polyMesh component files.
    #[error("not a polyMesh directory: {}", path.display())]
    NotAMesh { path: PathBuf },

    /// Single-region treatment requested for a case that has region meshes.
    #[error("{} is a multi-region case; region names are required", path.display())]
    RegionsRequired { path: PathBuf },

    #[error("background file task failed: {0}")]
    Background(String),
}

impl CaseError {
    pub fn fs(op: &'static str, path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        CaseError::FileSystem {
            op,
            path: path.into(),
            source,
        }
    }
}

/// Attach operation and path context to a `std::io::Result`.
pub trait IoResultExt<T> {
    fn fs_context(self, op: &'static str, path: impl Into<PathBuf>) -> Result<T, CaseError>;
}

impl<T> IoResultExt<T> for std::io::Result<T> {
    fn fs_context(self, op: &'static str, path: impl Into<PathBuf>) -> Result<T, CaseError> {
        self.map_err(|source| CaseError::fs(op, path, source))
    }
}
