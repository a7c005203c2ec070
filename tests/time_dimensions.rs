//! Integration tests for time dimensions

mod common;

use common::{assert_rejected, revalidate};
use cubeq::query::{DateBound, DateRange, Granularity, RelativeRange, RelativeUnit};
use cubeq::{validate, validate_with, ErrorKind, ValidatorConfig};
use serde_json::{json, Value};

fn with_time_dimension(td: Value) -> Value {
    json!({"measures": ["Employees.count"], "timeDimensions": [td]})
}

#[test]
fn test_all_granularities_are_accepted() {
    for token in ["second", "minute", "hour", "day", "week", "month", "quarter", "year"] {
        let query = validate(&with_time_dimension(json!({
            "dimension": "Employees.hiredAt",
            "granularity": token
        })))
        .unwrap();
        let granularity = query.time_dimensions()[0].granularity().unwrap();
        assert_eq!(granularity.as_str(), token);
    }
}

#[test]
fn test_granularity_must_match_exactly() {
    for bad in [json!("Month"), json!("fortnight"), json!(""), json!(7)] {
        assert_rejected(
            validate(&with_time_dimension(json!({
                "dimension": "Employees.hiredAt",
                "granularity": bad
            }))),
            ErrorKind::InvalidGranularity,
            "timeDimensions[0].granularity",
        );
    }
}

#[test]
fn test_dimension_is_required() {
    assert_rejected(
        validate(&with_time_dimension(json!({"granularity": "day"}))),
        ErrorKind::InvalidIdentifier,
        "timeDimensions[0].dimension",
    );
    assert_rejected(
        validate(&with_time_dimension(json!({"dimension": "hiredAt"}))),
        ErrorKind::InvalidIdentifier,
        "timeDimensions[0].dimension",
    );
    assert_rejected(
        validate(&with_time_dimension(json!("Employees.hiredAt"))),
        ErrorKind::MalformedQuery,
        "timeDimensions[0]",
    );
}

#[test]
fn test_absolute_date_range() {
    let query = validate(&with_time_dimension(json!({
        "dimension": "Employees.hiredAt",
        "granularity": "month",
        "dateRange": ["2024-01-01", "2024-03-31T23:59:59.999"]
    })))
    .unwrap();

    let td = &query.time_dimensions()[0];
    assert_eq!(td.granularity(), Some(Granularity::Month));
    let Some(DateRange::Absolute { start, end }) = td.date_range() else {
        panic!("expected absolute range");
    };
    assert!(matches!(start, DateBound::Date(_)));
    assert!(matches!(end, DateBound::DateTime(_)));
    assert_eq!(
        query.to_json()["timeDimensions"][0]["dateRange"],
        json!(["2024-01-01", "2024-03-31T23:59:59.999"])
    );

    // A single-day range is fine
    assert!(validate(&with_time_dimension(json!({
        "dimension": "Employees.hiredAt",
        "dateRange": ["2024-01-01", "2024-01-01"]
    })))
    .is_ok());
}

#[test]
fn test_absolute_range_errors() {
    let cases = [
        (json!(["2024-02-01", "2024-01-01"]), "timeDimensions[0].dateRange"),
        (json!(["2024-01-01"]), "timeDimensions[0].dateRange"),
        (json!(["2024-01-01", "2024-01-02", "2024-01-03"]), "timeDimensions[0].dateRange"),
        (json!(["2024-13-01", "2024-12-31"]), "timeDimensions[0].dateRange[0]"),
        (json!(["2024-01-01", 20240131]), "timeDimensions[0].dateRange[1]"),
        (json!({"from": "2024-01-01"}), "timeDimensions[0].dateRange"),
    ];
    for (range, path) in cases {
        assert_rejected(
            validate(&with_time_dimension(json!({
                "dimension": "Employees.hiredAt",
                "dateRange": range
            }))),
            ErrorKind::InvalidDateRange,
            path,
        );
    }
}

#[test]
fn test_relative_date_ranges() {
    let cases = [
        ("today", RelativeRange::Today),
        ("yesterday", RelativeRange::Yesterday),
        ("this month", RelativeRange::This(RelativeUnit::Month)),
        ("last quarter", RelativeRange::Last(RelativeUnit::Quarter)),
        ("next year", RelativeRange::Next(RelativeUnit::Year)),
        ("last 7 days", RelativeRange::LastN(7, RelativeUnit::Day)),
        ("next 12 hours", RelativeRange::NextN(12, RelativeUnit::Hour)),
    ];
    for (token, expected) in cases {
        let query = validate(&with_time_dimension(json!({
            "dimension": "Employees.hiredAt",
            "dateRange": token
        })))
        .unwrap();
        assert_eq!(
            query.time_dimensions()[0].date_range(),
            Some(&DateRange::Relative(expected))
        );
        assert_eq!(query.to_json()["timeDimensions"][0]["dateRange"], token);
    }

    assert_rejected(
        validate(&with_time_dimension(json!({
            "dimension": "Employees.hiredAt",
            "dateRange": "since forever"
        }))),
        ErrorKind::InvalidDateRange,
        "timeDimensions[0].dateRange",
    );
}

#[test]
fn test_mixed_absolute_and_relative_ranges() {
    let query = validate(&json!({
        "measures": ["Employees.count"],
        "timeDimensions": [
            {"dimension": "Employees.hiredAt", "granularity": "week", "dateRange": "last 4 weeks"},
            {"dimension": "Employees.createdAt", "dateRange": ["2023-01-01", "2023-06-30"]}
        ]
    }))
    .unwrap();
    assert_eq!(query.time_dimensions().len(), 2);
    assert_eq!(revalidate(&query), query);
}

#[test]
fn test_time_dimension_limit_from_config() {
    let config = ValidatorConfig {
        max_time_dimensions: Some(1),
        ..Default::default()
    };
    let raw = json!({
        "measures": ["Employees.count"],
        "timeDimensions": [
            {"dimension": "Employees.hiredAt"},
            {"dimension": "Employees.createdAt"}
        ]
    });
    assert!(validate(&raw).is_ok());
    assert_rejected(
        validate_with(&raw, &config),
        ErrorKind::MalformedQuery,
        "timeDimensions",
    );
}
