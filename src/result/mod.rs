//! Result types (nouns)
//!
//! - `QueryResult` - rows returned by an execution engine, with annotations
//! - `ErrorPayload` - caller-facing shape of a validation failure

mod payload;
mod result_set;

pub use payload::ErrorPayload;
pub use result_set::{FieldAnnotation, QueryResult, ResultBuilder, ResultError, Row, Scalar};
