//! Integration tests for catalog-backed validation
//!
//! With a catalog attached, identifiers must name real cube members on top
//! of following the `Cube.field` grammar.

mod common;

use common::{assert_rejected, catalog_validator, load_catalog, load_query};
use cubeq::{ErrorKind, ResultBuilder};
use serde_json::json;

#[test]
fn test_fixture_validates_against_catalog() {
    let validator = catalog_validator();
    let query = validator.validate(&load_query("nested_filters.json")).unwrap();
    assert_eq!(query.measures().len(), 2);

    let query = validator.validate(&load_query("dashboard.yaml")).unwrap();
    assert_eq!(query.dimensions()[0].as_str(), "Departments.name");
}

#[test]
fn test_unknown_measure_and_dimension() {
    let validator = catalog_validator();

    assert_rejected(
        validator.validate(&json!({"measures": ["Employees.count", "Employees.median"]})),
        ErrorKind::InvalidIdentifier,
        "measures[1]",
    );
    // A dimension is not a measure
    assert_rejected(
        validator.validate(&json!({"measures": ["Employees.salary"]})),
        ErrorKind::InvalidIdentifier,
        "measures[0]",
    );
    assert_rejected(
        validator.validate(&json!({"dimensions": ["Offices.city"]})),
        ErrorKind::InvalidIdentifier,
        "dimensions[0]",
    );
}

#[test]
fn test_time_dimension_must_have_time_type() {
    let validator = catalog_validator();
    assert_rejected(
        validator.validate(&json!({
            "measures": ["Employees.count"],
            "timeDimensions": [{"dimension": "Employees.salary", "granularity": "day"}]
        })),
        ErrorKind::InvalidIdentifier,
        "timeDimensions[0].dimension",
    );
}

#[test]
fn test_filter_members_may_be_measures_or_dimensions() {
    let validator = catalog_validator();
    let query = validator.validate(&json!({
        "dimensions": ["Departments.name"],
        "filters": [
            {"member": "Employees.count", "operator": "gt", "values": [10]},
            {"member": "Departments.budget", "operator": "lt", "values": [1000000]}
        ]
    }));
    assert!(query.is_ok());

    assert_rejected(
        validator.validate(&json!({
            "dimensions": ["Departments.name"],
            "filters": [{"or": [{"member": "Departments.manager", "operator": "set"}]}]
        })),
        ErrorKind::InvalidIdentifier,
        "filters[0].or[0].member",
    );
}

#[test]
fn test_grammar_errors_still_reported_as_grammar() {
    let validator = catalog_validator();
    let err = validator
        .validate(&json!({"measures": ["Employees"]}))
        .unwrap_err();
    assert_eq!(err.kind, ErrorKind::InvalidIdentifier);
    assert!(err.message.contains("expected 'Cube.field'"), "{}", err.message);
}

#[test]
fn test_meta_listing() {
    let meta = load_catalog("employees.yaml").meta();
    let names: Vec<&str> = meta.cubes.iter().map(|c| c.name.as_str()).collect();
    assert_eq!(names, vec!["Employees", "Departments"]);

    let departments = &meta.cubes[1];
    assert_eq!(departments.title, "Departments");
    assert_eq!(departments.measures, vec!["Departments.count"]);
    assert_eq!(departments.dimensions, vec!["Departments.name", "Departments.budget"]);
}

#[test]
fn test_result_annotations_come_from_catalog() {
    let catalog = load_catalog("employees.yaml");
    let validator = catalog_validator();
    let query = validator.validate(&load_query("nested_filters.json")).unwrap();

    let mut builder = ResultBuilder::new(&query)
        .catalog(&catalog)
        .request_id("3f1c");
    builder
        .push_row(
            json!({
                "Departments.name": "Engineering",
                "Employees.hiredAt": "2023-01-01T00:00:00.000",
                "Employees.count": 42,
                "Employees.avgSalary": 123456.5
            })
            .as_object()
            .unwrap(),
        )
        .unwrap();
    let result = builder.build();

    let annotation = result.annotation();
    assert_eq!(annotation["Employees.count"].title, "Employee Count");
    assert_eq!(annotation["Employees.count"].kind, "count");
    assert_eq!(annotation["Employees.avgSalary"].kind, "avg");
    assert_eq!(annotation["Departments.name"].title, "Department");
    assert_eq!(annotation["Employees.hiredAt"].kind, "time");
    assert_eq!(result.rows().len(), 1);
}
