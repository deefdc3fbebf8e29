use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

/// Error type returned by computed-field resolution functions.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

#[derive(Error, Debug)]
pub enum FolioError {
    #[error("Content root not found: {}", .0.display())]
    ContentRootNotFound(PathBuf),

    #[error("Malformed front matter in {path}: {reason}")]
    MalformedHeader { path: String, reason: String },

    #[error("Failed to read {path}: {source}")]
    FileRead {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Required field '{0}' is missing")]
    MissingField(String),

    #[error("Field '{field}' expected {expected}, got {actual}")]
    FieldType {
        field: String,
        expected: String,
        actual: String,
    },

    #[error("Computed field '{field}' failed: {source}")]
    ComputedField {
        field: String,
        #[source]
        source: BoxError,
    },

    #[error("Document type '{0}' is already registered")]
    DuplicateType(String),

    #[error("Invalid schema for '{type_name}': {reason}")]
    InvalidSchema { type_name: String, reason: String },

    #[error("Invalid file path pattern '{pattern}': {reason}")]
    InvalidPattern { pattern: String, reason: String },

    #[error("Unknown document type: {0}")]
    UnknownType(String),

    #[error("Config error: {0}")]
    Config(String),

    #[error("{0}")]
    Build(BuildFailures),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Watch error: {0}")]
    Watch(#[from] notify::Error),

    #[error("Thread pool error: {0}")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),
}

impl FolioError {
    /// True for errors that belong to a single content file rather than to
    /// the schema or the environment.
    pub fn is_per_file(&self) -> bool {
        matches!(
            self,
            FolioError::MalformedHeader { .. }
                | FolioError::FileRead { .. }
                | FolioError::MissingField(_)
                | FolioError::FieldType { .. }
                | FolioError::ComputedField { .. }
        )
    }
}

/// A content file that could not be turned into a document.
#[derive(Debug)]
pub struct FileFailure {
    pub type_name: String,
    pub path: String,
    pub error: FolioError,
}

impl fmt::Display for FileFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}: {}", self.type_name, self.path, self.error)
    }
}

/// Every per-file failure recorded during a build pass.
#[derive(Debug, Default)]
pub struct BuildFailures(pub Vec<FileFailure>);

impl BuildFailures {
    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, FileFailure> {
        self.0.iter()
    }
}

impl fmt::Display for BuildFailures {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Build failed with {} error(s):", self.0.len())?;
        for failure in &self.0 {
            write!(f, "\n  - {failure}")?;
        }
        Ok(())
    }
}

pub type Result<T> = std::result::Result<T, FolioError>;
