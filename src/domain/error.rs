//! Domain-level errors (no external dependencies)

use thiserror::Error;

/// Domain errors represent violations of the line format or data model.
/// These are independent of I/O concerns.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DomainError {
    #[error("invalid token - does not contain a colon: {0}")]
    TokenWithoutColon(String),

    #[error("invalid token - starts with a colon: {0}")]
    TokenStartsWithColon(String),

    #[error("unknown object kind: {0}")]
    UnknownKind(String),

    #[error("invalid source date '{value}': expected YYYY-MM or YYYY-MM-DD")]
    InvalidSourceDate { value: String },
}
