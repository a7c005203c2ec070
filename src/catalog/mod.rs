//! Cube catalog (nouns)
//!
//! Describes which cubes exist and which measures and dimensions they
//! expose. A catalog is optional: without one the validator only checks
//! identifier grammar.

mod cube;

pub use cube::{Catalog, CatalogMeta, Cube, CubeMeta, DimensionType, Member, MeasureType};
