//! Qualified member identifiers (`Cube.field`)

use serde::{Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

/// A reference to a cube member of the exact form `CubeName.fieldName`.
///
/// Both segments are non-empty and neither contains a `.`. Case is kept
/// exactly as written.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct QualifiedIdentifier {
    raw: String,
    dot: usize,
}

/// Error when a string does not follow the `Cube.field` grammar
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("invalid identifier '{input}', expected 'Cube.field'")]
pub struct ParseIdentifierError {
    pub input: String,
}

impl QualifiedIdentifier {
    pub fn parse(s: &str) -> Result<Self, ParseIdentifierError> {
        let err = || ParseIdentifierError { input: s.to_string() };

        let dot = s.find('.').ok_or_else(err)?;
        let (cube, field) = (&s[..dot], &s[dot + 1..]);
        if cube.is_empty() || field.is_empty() || field.contains('.') {
            return Err(err());
        }

        Ok(Self { raw: s.to_string(), dot })
    }

    /// The cube segment (before the dot)
    pub fn cube(&self) -> &str {
        &self.raw[..self.dot]
    }

    /// The member segment (after the dot)
    pub fn field(&self) -> &str {
        &self.raw[self.dot + 1..]
    }

    pub fn as_str(&self) -> &str {
        &self.raw
    }
}

impl FromStr for QualifiedIdentifier {
    type Err = ParseIdentifierError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for QualifiedIdentifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}

impl AsRef<str> for QualifiedIdentifier {
    fn as_ref(&self) -> &str {
        &self.raw
    }
}

impl Serialize for QualifiedIdentifier {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.raw)
    }
}
