//! Query validator (verb module)
//!
//! Raw JSON query document → canonical [`Query`](crate::query::Query).
//!
//! Rules run in a fixed order so the first failure reported is stable:
//! identifiers, non-empty selection, time dimensions, filters, order,
//! pagination. Validation is pure and never touches the security context.

mod error;
mod path;
mod validate;

pub use error::{ErrorKind, ValidationError};
pub use validate::{validate, validate_with, Validator};
