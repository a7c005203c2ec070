//! Filter tree types
//!
//! A filter is either a leaf condition on a single member or a compound
//! AND/OR node over child filters. The tree is built bottom-up by the
//! validator, so it is acyclic and always ends in leaves.

use serde::ser::SerializeMap;
use serde::{Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

use super::identifier::QualifiedIdentifier;

/// Filter operators understood by the query contract
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operator {
    Equals,
    NotEquals,
    Contains,
    NotContains,
    StartsWith,
    EndsWith,
    Gt,
    Gte,
    Lt,
    Lte,
    In,
    NotIn,
    Like,
    ILike,
    Regex,
    BeforeDate,
    AfterDate,
    Between,
    Set,
    NotSet,
    IsEmpty,
    IsNotEmpty,
}

/// Number of values an operator takes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Arity {
    None,
    Exactly(usize),
    AtLeast(usize),
}

impl Arity {
    pub fn accepts(&self, count: usize) -> bool {
        match *self {
            Arity::None => count == 0,
            Arity::Exactly(n) => count == n,
            Arity::AtLeast(n) => count >= n,
        }
    }
}

impl fmt::Display for Arity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Arity::None => write!(f, "no values"),
            Arity::Exactly(1) => write!(f, "exactly 1 value"),
            Arity::Exactly(n) => write!(f, "exactly {} values", n),
            Arity::AtLeast(1) => write!(f, "at least 1 value"),
            Arity::AtLeast(n) => write!(f, "at least {} values", n),
        }
    }
}

impl Operator {
    pub const ALL: [Operator; 22] = [
        Operator::Equals,
        Operator::NotEquals,
        Operator::Contains,
        Operator::NotContains,
        Operator::StartsWith,
        Operator::EndsWith,
        Operator::Gt,
        Operator::Gte,
        Operator::Lt,
        Operator::Lte,
        Operator::In,
        Operator::NotIn,
        Operator::Like,
        Operator::ILike,
        Operator::Regex,
        Operator::BeforeDate,
        Operator::AfterDate,
        Operator::Between,
        Operator::Set,
        Operator::NotSet,
        Operator::IsEmpty,
        Operator::IsNotEmpty,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Operator::Equals => "equals",
            Operator::NotEquals => "notEquals",
            Operator::Contains => "contains",
            Operator::NotContains => "notContains",
            Operator::StartsWith => "startsWith",
            Operator::EndsWith => "endsWith",
            Operator::Gt => "gt",
            Operator::Gte => "gte",
            Operator::Lt => "lt",
            Operator::Lte => "lte",
            Operator::In => "in",
            Operator::NotIn => "notIn",
            Operator::Like => "like",
            Operator::ILike => "ilike",
            Operator::Regex => "regex",
            Operator::BeforeDate => "beforeDate",
            Operator::AfterDate => "afterDate",
            Operator::Between => "between",
            Operator::Set => "set",
            Operator::NotSet => "notSet",
            Operator::IsEmpty => "isEmpty",
            Operator::IsNotEmpty => "isNotEmpty",
        }
    }

    /// How many values the operator requires.
    ///
    /// Multi-value equality-style operators match if any value matches.
    pub fn arity(&self) -> Arity {
        match self {
            Operator::Between => Arity::Exactly(2),
            Operator::Set | Operator::NotSet | Operator::IsEmpty | Operator::IsNotEmpty => {
                Arity::None
            }
            _ => Arity::AtLeast(1),
        }
    }

    /// Operators whose values must be ISO-8601 dates
    pub fn takes_dates(&self) -> bool {
        matches!(self, Operator::BeforeDate | Operator::AfterDate)
    }
}

/// Error when an operator name is not recognized
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("unknown operator '{0}'")]
pub struct ParseOperatorError(pub String);

impl FromStr for Operator {
    type Err = ParseOperatorError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Operator::ALL
            .iter()
            .copied()
            .find(|op| op.as_str() == s)
            .ok_or_else(|| ParseOperatorError(s.to_string()))
    }
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for Operator {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

/// A scalar filter value
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Literal {
    Bool(bool),
    Number(serde_json::Number),
    String(String),
}

impl Literal {
    pub fn from_json(value: &serde_json::Value) -> Option<Self> {
        match value {
            serde_json::Value::Bool(b) => Some(Literal::Bool(*b)),
            serde_json::Value::Number(n) => Some(Literal::Number(n.clone())),
            serde_json::Value::String(s) => Some(Literal::String(s.clone())),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Literal::String(s) => Some(s),
            _ => None,
        }
    }
}

/// Condition on a single member
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LeafFilter {
    pub(crate) member: QualifiedIdentifier,
    pub(crate) operator: Operator,
    pub(crate) values: Vec<Literal>,
}

impl LeafFilter {
    pub fn member(&self) -> &QualifiedIdentifier {
        &self.member
    }

    pub fn operator(&self) -> Operator {
        self.operator
    }

    pub fn values(&self) -> &[Literal] {
        &self.values
    }
}

/// Boolean connective of a compound filter
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Junction {
    And,
    Or,
}

impl Junction {
    /// The JSON key that introduces this connective
    pub fn key(&self) -> &'static str {
        match self {
            Junction::And => "and",
            Junction::Or => "or",
        }
    }
}

/// AND/OR over a non-empty list of child filters
#[derive(Debug, Clone, PartialEq)]
pub struct CompoundFilter {
    pub(crate) kind: Junction,
    pub(crate) children: Vec<FilterNode>,
}

impl CompoundFilter {
    pub fn kind(&self) -> Junction {
        self.kind
    }

    pub fn children(&self) -> &[FilterNode] {
        &self.children
    }
}

impl Serialize for CompoundFilter {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(1))?;
        map.serialize_entry(self.kind.key(), &self.children)?;
        map.end()
    }
}

/// A node of the filter tree
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum FilterNode {
    Leaf(LeafFilter),
    Compound(CompoundFilter),
}

impl FilterNode {
    /// Depth of the tree rooted here; a leaf has depth 1
    pub fn depth(&self) -> usize {
        match self {
            FilterNode::Leaf(_) => 1,
            FilterNode::Compound(c) => 1 + c.children.iter().map(FilterNode::depth).max().unwrap_or(0),
        }
    }

    /// All leaves in document order
    pub fn leaves(&self) -> Vec<&LeafFilter> {
        let mut out = Vec::new();
        self.collect_leaves(&mut out);
        out
    }

    fn collect_leaves<'a>(&'a self, out: &mut Vec<&'a LeafFilter>) {
        match self {
            FilterNode::Leaf(leaf) => out.push(leaf),
            FilterNode::Compound(c) => {
                for child in &c.children {
                    child.collect_leaves(out);
                }
            }
        }
    }
}
