use std::{fmt, io};

use regex::Error as RegexError;
use serde::{Deserialize, Serialize};
use serde_json::Error as JsonError;
use thiserror::Error;

/// Pipeline-fatal errors. Recoverable conditions (bad dates, failed validators, broken links)
/// never surface here; they are reported through diagnostics instead.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Error)]
pub enum DossierError {
    #[error("Configuration error: {0}")]
    Config(String),
    #[error("Custom error: {0}")]
    Custom(String),
    #[error("Duplicate node id in corpus: {0}")]
    DuplicateNode(String),
    #[error("Corpus is empty; nothing to index")]
    EmptyCorpus,
    #[error("File System error: {0}")]
    Io(String),
    #[error("Item Not Found: {0}")]
    NotFound(String),
    #[error("You do not have permission to access this resource")]
    PermissionDenied,
    #[error("(De)Serialization error: {0}")]
    Serialization(String),
}

impl DossierError {
    /// Process exit code used by the CLI when this error aborts a run.
    pub fn exit_code(&self) -> i32 {
        match self {
            DossierError::EmptyCorpus | DossierError::DuplicateNode(_) => 2,
            DossierError::Config(_) => 3,
            DossierError::Io(_) | DossierError::NotFound(_) | DossierError::PermissionDenied => 4,
            DossierError::Serialization(_) => 5,
            DossierError::Custom(_) => 1,
        }
    }
}

impl From<toml::de::Error> for DossierError {
    fn from(src: toml::de::Error) -> DossierError {
        DossierError::Config(format!("Toml deserialization error: {src}"))
    }
}

impl From<toml::ser::Error> for DossierError {
    fn from(src: toml::ser::Error) -> DossierError {
        DossierError::Serialization(format!("Toml serialization error: {src}"))
    }
}

impl From<JsonError> for DossierError {
    fn from(src: JsonError) -> DossierError {
        DossierError::Serialization(format!("JSON (de)serialization error: {src}"))
    }
}

impl From<io::Error> for DossierError {
    fn from(x: io::Error) -> Self {
        match x.kind() {
            io::ErrorKind::NotFound => DossierError::NotFound(format!("{x}")),
            io::ErrorKind::PermissionDenied => DossierError::PermissionDenied,
            _ => DossierError::Io(format!("IOError: {}", x.kind())),
        }
    }
}

impl From<walkdir::Error> for DossierError {
    fn from(x: walkdir::Error) -> Self {
        match x.into_io_error() {
            Some(io_error) => DossierError::from(io_error),
            None => DossierError::Io("directory walk failed (symlink loop)".to_string()),
        }
    }
}

impl From<fmt::Error> for DossierError {
    fn from(x: fmt::Error) -> Self {
        DossierError::Custom(format!("{x}"))
    }
}

impl From<RegexError> for DossierError {
    fn from(x: RegexError) -> Self {
        DossierError::Config(format!("Regex parse failed: {x}"))
    }
}
