//! cubeq - Validate and normalize semantic-layer cube queries
//!
//! This library provides:
//! - Canonical query types (measures, dimensions, time dimensions, filter trees)
//! - Query validation and normalization from loosely-typed JSON
//! - An optional cube catalog for unknown-identifier checks and `/meta` listings
//! - Result-set and error-payload types for the execution boundary
//!
//! # Architecture
//!
//! **Noun modules** (data structures):
//! - `query/` - canonical query types (Query, TimeDimension, FilterNode, ...)
//! - `catalog/` - cube definitions (Catalog, Cube, Member)
//! - `result/` - execution output (QueryResult, ErrorPayload)
//! - `context` - opaque security context passthrough
//!
//! **Verb modules** (transformations):
//! - `parser/` - YAML/JSON → Catalog, ValidatorConfig, raw query
//! - `validator/` - raw query → Query
//!
//! Executing a query is the job of an external engine; this crate stops at
//! the canonical query and the shape of what comes back.
//!
//! # Example
//!
//! ```
//! use cubeq::{validate, ErrorKind};
//! use serde_json::json;
//!
//! let query = validate(&json!({
//!     "measures": ["Employees.count"],
//!     "timeDimensions": [{"dimension": "Employees.hiredAt", "dateRange": "last 7 days"}]
//! }))
//! .unwrap();
//! assert_eq!(query.measures()[0].cube(), "Employees");
//!
//! let err = validate(&json!({"measures": []})).unwrap_err();
//! assert_eq!(err.kind, ErrorKind::EmptyQuery);
//! ```

pub mod catalog;
pub mod config;
pub mod context;
pub mod error;
pub mod parser;
pub mod query;
pub mod result;
pub mod validator;

// Re-export commonly used types
pub use catalog::{Catalog, CatalogMeta, Cube, DimensionType, MeasureType};
pub use config::ValidatorConfig;
pub use context::{SecurityContext, ValidatedRequest};
pub use error::ParseError;
pub use query::{
    DateRange, FilterNode, Granularity, Operator, OrderDirection, QualifiedIdentifier, Query,
    RelativeRange, TimeDimension,
};
pub use result::{ErrorPayload, QueryResult, ResultBuilder};
pub use validator::{validate, validate_with, ErrorKind, ValidationError, Validator};
