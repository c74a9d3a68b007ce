//! Application-level errors (wraps domain errors)

use std::path::PathBuf;
use thiserror::Error;

use crate::domain::DomainError;

/// Application errors wrap domain errors and add application-level context.
#[derive(Error, Debug)]
pub enum ApplicationError {
    #[error(transparent)]
    Domain(#[from] DomainError),

    #[error("failed to load experiment: {id}")]
    Experiment {
        id: String,
        #[source]
        source: Box<ApplicationError>,
    },

    #[error("failed to apply definitions in {}", .path.display())]
    Document {
        path: PathBuf,
        #[source]
        source: Box<ApplicationError>,
    },

    #[error("missing {node} node in {context}")]
    MissingNode { node: String, context: String },

    #[error("missing value '{key}' in {node} node")]
    MissingValue { key: String, node: String },

    #[error("input not found: {0}")]
    InputNotFound(PathBuf),

    #[error("config error: {message}")]
    Config { message: String },

    #[error("operation failed: {context}")]
    OperationFailed {
        context: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },
}

impl ApplicationError {
    /// True when the error stems from malformed or inconsistent definitions
    /// rather than from I/O or configuration.
    pub fn is_data_error(&self) -> bool {
        match self {
            Self::Domain(_) | Self::MissingNode { .. } | Self::MissingValue { .. } => true,
            Self::Experiment { source, .. } | Self::Document { source, .. } => {
                source.is_data_error()
            }
            Self::InputNotFound(_) | Self::Config { .. } | Self::OperationFailed { .. } => false,
        }
    }

    /// Innermost application error, unwrapping experiment and document context.
    pub fn root_cause(&self) -> &ApplicationError {
        match self {
            Self::Experiment { source, .. } | Self::Document { source, .. } => source.root_cause(),
            other => other,
        }
    }
}

/// Result type for application layer operations.
pub type ApplicationResult<T> = Result<T, ApplicationError>;
