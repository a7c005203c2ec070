//! Query types (nouns)
//!
//! The canonical, fully typed form of an analytic query. Values of these
//! types are only produced by the validator.

mod canonical;
mod filter;
mod identifier;
mod time;

pub use canonical::{OrderDirection, Query};
pub use filter::{
    Arity, CompoundFilter, FilterNode, Junction, LeafFilter, Literal, Operator, ParseOperatorError,
};
pub use identifier::{ParseIdentifierError, QualifiedIdentifier};
pub use time::{
    DateBound, DateRange, Granularity, ParseGranularityError, RelativeRange, RelativeUnit,
    TimeDimension,
};
