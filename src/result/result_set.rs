use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Number, Value};
use std::collections::BTreeMap;
use tracing::trace;

use crate::catalog::Catalog;
use crate::query::{QualifiedIdentifier, Query};

/// A single cell value
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Scalar {
    Null,
    Bool(bool),
    Number(Number),
    String(String),
}

impl Scalar {
    pub fn from_json(value: &Value) -> Option<Self> {
        match value {
            Value::Null => Some(Scalar::Null),
            Value::Bool(b) => Some(Scalar::Bool(*b)),
            Value::Number(n) => Some(Scalar::Number(n.clone())),
            Value::String(s) => Some(Scalar::String(s.clone())),
            Value::Array(_) | Value::Object(_) => None,
        }
    }
}

/// One result row keyed by member identifier, in the engine's column order
pub type Row = IndexMap<String, Scalar>;

/// Display metadata for a result column
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldAnnotation {
    pub title: String,
    #[serde(rename = "type")]
    pub kind: String,
}

/// Rows produced by one successful execution of a query
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QueryResult {
    rows: Vec<Row>,
    #[serde(default)]
    annotation: BTreeMap<String, FieldAnnotation>,
    request_id: String,
    #[serde(default)]
    slow_query: bool,
}

impl QueryResult {
    /// Decode a result as returned by an execution engine
    pub fn from_json(value: Value) -> Result<Self, serde_json::Error> {
        serde_json::from_value(value)
    }

    pub fn rows(&self) -> &[Row] {
        &self.rows
    }

    pub fn annotation(&self) -> &BTreeMap<String, FieldAnnotation> {
        &self.annotation
    }

    pub fn request_id(&self) -> &str {
        &self.request_id
    }

    pub fn slow_query(&self) -> bool {
        self.slow_query
    }
}

/// Errors building a result for a query
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ResultError {
    #[error("row {row}: '{member}' is not selected by the query")]
    UndeclaredMember { row: usize, member: String },
    #[error("row {row}: value of '{member}' is not a scalar")]
    NonScalar { row: usize, member: String },
}

/// Assembles a [`QueryResult`] for a validated query.
///
/// Rows may only carry members the query selects. Annotations cover every
/// selected member, taking title and type from the catalog when one is
/// given.
#[derive(Debug)]
pub struct ResultBuilder<'q> {
    query: &'q Query,
    catalog: Option<&'q Catalog>,
    rows: Vec<Row>,
    request_id: Option<String>,
    slow_query: bool,
}

impl<'q> ResultBuilder<'q> {
    pub fn new(query: &'q Query) -> Self {
        Self {
            query,
            catalog: None,
            rows: Vec::new(),
            request_id: None,
            slow_query: false,
        }
    }

    pub fn catalog(mut self, catalog: &'q Catalog) -> Self {
        self.catalog = Some(catalog);
        self
    }

    /// Defaults to a random UUID
    pub fn request_id(mut self, request_id: impl Into<String>) -> Self {
        self.request_id = Some(request_id.into());
        self
    }

    pub fn slow_query(mut self, slow: bool) -> Self {
        self.slow_query = slow;
        self
    }

    pub fn push_row(&mut self, raw: &Map<String, Value>) -> Result<(), ResultError> {
        let index = self.rows.len();
        let mut row = Row::new();
        for (member, value) in raw {
            if !self.query.declares(member) {
                return Err(ResultError::UndeclaredMember {
                    row: index,
                    member: member.clone(),
                });
            }
            let scalar = Scalar::from_json(value).ok_or_else(|| ResultError::NonScalar {
                row: index,
                member: member.clone(),
            })?;
            row.insert(member.clone(), scalar);
        }
        self.rows.push(row);
        Ok(())
    }

    pub fn build(self) -> QueryResult {
        let annotation = self
            .query
            .selected_members()
            .into_iter()
            .map(|member| (member.to_string(), self.annotate(member)))
            .collect();
        let request_id = self
            .request_id
            .unwrap_or_else(|| uuid::Uuid::new_v4().to_string());
        trace!(request_id = %request_id, rows = self.rows.len(), "built query result");

        QueryResult {
            rows: self.rows,
            annotation,
            request_id,
            slow_query: self.slow_query,
        }
    }

    fn annotate(&self, member: &QualifiedIdentifier) -> FieldAnnotation {
        if let Some((title, kind)) = self.catalog.and_then(|c| c.describe(member)) {
            return FieldAnnotation { title, kind };
        }

        let kind = if self.query.measures().contains(member) {
            "number"
        } else if self.query.time_dimensions().iter().any(|t| t.dimension() == member) {
            "time"
        } else {
            "string"
        };
        FieldAnnotation {
            title: member.field().to_string(),
            kind: kind.to_string(),
        }
    }
}
