use serde::{Deserialize, Serialize};

use crate::validator::{ErrorKind, ValidationError};

/// Error body returned to callers: `{error, kind, path}`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorPayload {
    /// Human-readable message
    pub error: String,
    pub kind: ErrorKind,
    pub path: String,
}

impl From<&ValidationError> for ErrorPayload {
    fn from(err: &ValidationError) -> Self {
        Self {
            error: err.message.clone(),
            kind: err.kind,
            path: err.path.clone(),
        }
    }
}

impl From<ValidationError> for ErrorPayload {
    fn from(err: ValidationError) -> Self {
        Self::from(&err)
    }
}
