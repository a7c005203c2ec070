//! Security context passthrough

use serde::{Deserialize, Serialize};

use crate::query::Query;

/// Caller-defined per-request value (tenant, user, claims, ...) that the
/// execution layer uses to scope data access.
///
/// Opaque here: it is carried alongside the query exactly as received.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SecurityContext(serde_json::Value);

impl SecurityContext {
    pub fn new(value: serde_json::Value) -> Self {
        Self(value)
    }

    pub fn as_value(&self) -> &serde_json::Value {
        &self.0
    }

    pub fn into_value(self) -> serde_json::Value {
        self.0
    }
}

impl From<serde_json::Value> for SecurityContext {
    fn from(value: serde_json::Value) -> Self {
        Self(value)
    }
}

/// A validated query together with the context it must run under
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidatedRequest {
    query: Query,
    security_context: SecurityContext,
}

impl ValidatedRequest {
    pub(crate) fn new(query: Query, security_context: SecurityContext) -> Self {
        Self {
            query,
            security_context,
        }
    }

    pub fn query(&self) -> &Query {
        &self.query
    }

    pub fn security_context(&self) -> &SecurityContext {
        &self.security_context
    }

    pub fn into_parts(self) -> (Query, SecurityContext) {
        (self.query, self.security_context)
    }
}
