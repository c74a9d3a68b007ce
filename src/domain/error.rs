//! Domain-level errors (no external dependencies)

use thiserror::Error;

/// Domain errors represent structural violations in trees, maps and documents.
/// These are independent of infrastructure concerns.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DomainError {
    /// A situation node without a usable name was reached during a merge.
    #[error("invalid node: situation without a name below prefix '{prefix}'")]
    InvalidNode { prefix: String },

    #[error("key not found: {0}")]
    KeyNotFound(String),

    #[error("parse error at line {line}: {message}")]
    Parse { line: usize, message: String },

    #[error("missing required field '{field}' in {node} node")]
    MissingField { node: String, field: String },
}

/// Result type for domain operations.
pub type DomainResult<T> = Result<T, DomainError>;
