//! The canonical query

use serde::ser::SerializeMap;
use serde::{Serialize, Serializer};
use std::fmt;

use super::filter::FilterNode;
use super::identifier::QualifiedIdentifier;
use super::time::TimeDimension;

/// Sort direction of an ordered member
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OrderDirection {
    Asc,
    Desc,
}

impl OrderDirection {
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "asc" => Some(OrderDirection::Asc),
            "desc" => Some(OrderDirection::Desc),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            OrderDirection::Asc => "asc",
            OrderDirection::Desc => "desc",
        }
    }
}

impl fmt::Display for OrderDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for OrderDirection {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

/// A validated, normalized analytic query.
///
/// Only the validator builds one, and it cannot be changed afterwards.
/// Serializes to the same JSON shape it was parsed from, so validating the
/// serialized form yields an equal query.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Query {
    pub(crate) measures: Vec<QualifiedIdentifier>,
    pub(crate) dimensions: Vec<QualifiedIdentifier>,
    pub(crate) time_dimensions: Vec<TimeDimension>,
    pub(crate) filters: Vec<FilterNode>,
    #[serde(serialize_with = "serialize_order")]
    pub(crate) order: Vec<(QualifiedIdentifier, OrderDirection)>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(crate) limit: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(crate) offset: Option<u64>,
}

#[allow(clippy::ptr_arg)]
fn serialize_order<S: Serializer>(
    order: &Vec<(QualifiedIdentifier, OrderDirection)>,
    serializer: S,
) -> Result<S::Ok, S::Error> {
    let mut map = serializer.serialize_map(Some(order.len()))?;
    for (member, direction) in order {
        map.serialize_entry(member, direction)?;
    }
    map.end()
}

impl Query {
    pub fn measures(&self) -> &[QualifiedIdentifier] {
        &self.measures
    }

    pub fn dimensions(&self) -> &[QualifiedIdentifier] {
        &self.dimensions
    }

    pub fn time_dimensions(&self) -> &[TimeDimension] {
        &self.time_dimensions
    }

    pub fn filters(&self) -> &[FilterNode] {
        &self.filters
    }

    /// Ordered members, highest precedence first
    pub fn order(&self) -> &[(QualifiedIdentifier, OrderDirection)] {
        &self.order
    }

    pub fn limit(&self) -> Option<u64> {
        self.limit
    }

    pub fn offset(&self) -> Option<u64> {
        self.offset
    }

    /// Whether `member` is selected as a measure, dimension or time dimension
    pub fn declares(&self, member: &str) -> bool {
        self.measures.iter().any(|m| m.as_str() == member)
            || self.dimensions.iter().any(|d| d.as_str() == member)
            || self.time_dimensions.iter().any(|t| t.dimension.as_str() == member)
    }

    /// Selected members in output column order: dimensions, time dimensions, measures
    pub fn selected_members(&self) -> Vec<&QualifiedIdentifier> {
        let mut out: Vec<&QualifiedIdentifier> = Vec::new();
        let candidates = self
            .dimensions
            .iter()
            .chain(self.time_dimensions.iter().map(|t| &t.dimension))
            .chain(self.measures.iter());
        for member in candidates {
            if !out.contains(&member) {
                out.push(member);
            }
        }
        out
    }

    /// Canonical JSON form of the query
    pub fn to_json(&self) -> serde_json::Value {
        // Every field serializes to plain JSON, so this cannot fail
        serde_json::to_value(self).unwrap_or(serde_json::Value::Null)
    }
}
