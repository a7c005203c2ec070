//! Validator error types

use serde::{Deserialize, Serialize};
use std::fmt;

/// Category of a validation failure
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ErrorKind {
    /// No measures and no dimensions
    EmptyQuery,
    /// Identifier is not `Cube.field`, or not in the catalog
    InvalidIdentifier,
    InvalidGranularity,
    InvalidDateRange,
    InvalidOperator,
    /// Number of filter values does not fit the operator
    ArityMismatch,
    /// Filter value is not a scalar, or not usable with its operator
    InvalidFilterValue,
    /// Order names a member the query does not select, or a bad direction
    UnknownOrderField,
    InvalidPagination,
    /// Wrong JSON shape or a configured structural limit exceeded
    MalformedQuery,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

/// A terminal validation failure at a specific field path
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("{}{}", .message, at_path(.path))]
pub struct ValidationError {
    pub kind: ErrorKind,
    /// Location of the offending field, e.g. `timeDimensions[0].granularity`;
    /// empty for the query as a whole
    pub path: String,
    pub message: String,
}

fn at_path(path: &str) -> String {
    if path.is_empty() {
        String::new()
    } else {
        format!(" (at '{}')", path)
    }
}

impl ValidationError {
    pub(crate) fn new(kind: ErrorKind, path: impl fmt::Display, message: impl Into<String>) -> Self {
        Self {
            kind,
            path: path.to_string(),
            message: message.into(),
        }
    }
}
