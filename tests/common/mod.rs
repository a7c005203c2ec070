//! Shared test utilities for integration tests

#![allow(dead_code)]

use cubeq::{parser, Catalog, ErrorKind, Query, ValidationError, Validator};
use serde_json::Value;

/// Load the cube catalog fixture from tests/test_data
pub fn load_catalog(name: &str) -> Catalog {
    let path = format!("tests/test_data/{}", name);
    Catalog::from_file(&path).unwrap_or_else(|e| panic!("Failed to load catalog {}: {}", name, e))
}

/// Load a raw query document from tests/test_data
pub fn load_query(name: &str) -> Value {
    let path = format!("tests/test_data/{}", name);
    parser::parse_query_file(&path)
        .unwrap_or_else(|e| panic!("Failed to load query {}: {}", name, e))
}

/// Validator backed by the employees catalog
pub fn catalog_validator() -> Validator {
    Validator::default().with_catalog(load_catalog("employees.yaml"))
}

/// Serialize a query and validate the result again
pub fn revalidate(query: &Query) -> Query {
    let json = serde_json::to_string(query).expect("query serializes");
    let raw: Value = serde_json::from_str(&json).expect("serialized query parses");
    cubeq::validate(&raw).unwrap_or_else(|e| panic!("canonical query failed to validate: {}", e))
}

/// Assert a validation failure of the given kind at the given path
pub fn assert_rejected(result: Result<Query, ValidationError>, kind: ErrorKind, path: &str) {
    match result {
        Ok(query) => panic!("expected {:?} at '{}', got {:?}", kind, path, query),
        Err(err) => {
            assert_eq!(err.kind, kind, "unexpected kind: {}", err);
            assert_eq!(err.path, path, "unexpected path: {}", err);
        }
    }
}
