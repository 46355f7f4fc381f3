//! Application-level errors (wraps domain errors)

use thiserror::Error;

use crate::domain::{DomainError, ObjectKind};

/// Application errors wrap domain errors and add application-level context.
#[derive(Error, Debug)]
pub enum ApplicationError {
    #[error("{0}")]
    Domain(#[from] DomainError),

    #[error("parser already registered for {kind} tag {tag}")]
    DuplicateParser { kind: String, tag: String },

    #[error("config error: {message}")]
    Config { message: String },
}

impl ApplicationError {
    pub fn duplicate_parser(kind: Option<ObjectKind>, tag: &str) -> Self {
        Self::DuplicateParser {
            kind: kind.map_or_else(|| "generic".to_string(), |k| k.to_string()),
            tag: tag.to_string(),
        }
    }
}

/// Result type for application layer operations.
pub type ApplicationResult<T> = Result<T, ApplicationError>;

/// Per-item failure surfaced to the caller of a load.
///
/// These never abort the batch: the offending file or object is skipped and
/// loading continues.
#[derive(Error, Debug)]
pub enum LoadError {
    #[error("cannot read source {uri}")]
    SourceRead {
        uri: String,
        #[source]
        source: std::io::Error,
    },

    #[error("{uri}: bad source metadata for {key}: {source}")]
    SourceDate {
        uri: String,
        key: String,
        #[source]
        source: DomainError,
    },
}
