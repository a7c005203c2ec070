//! Catalog definition

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;

use crate::error::ParseError;
use crate::query::QualifiedIdentifier;

/// The root catalog containing cube definitions
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Catalog {
    #[serde(default)]
    pub cubes: Vec<Cube>,
}

/// A named grouping of measures and dimensions over one or more tables
#[derive(Debug, Clone, Deserialize)]
pub struct Cube {
    pub name: String,
    /// Human-readable name; defaults to `name`
    pub title: Option<String>,
    #[serde(default)]
    pub measures: Vec<Member<MeasureType>>,
    #[serde(default)]
    pub dimensions: Vec<Member<DimensionType>>,
}

/// A measure or dimension of a cube
#[derive(Debug, Clone, Deserialize)]
pub struct Member<T> {
    pub name: String,
    pub title: Option<String>,
    #[serde(rename = "type")]
    pub kind: T,
}

impl<T> Member<T> {
    pub fn title(&self) -> &str {
        self.title.as_deref().unwrap_or(&self.name)
    }
}

/// Aggregation of a measure
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum MeasureType {
    Count,
    CountDistinct,
    Sum,
    Avg,
    Min,
    Max,
    /// Calculated expression over other measures
    Number,
}

/// Value type of a dimension
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum DimensionType {
    String,
    Number,
    Time,
    Boolean,
}

impl fmt::Display for MeasureType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            MeasureType::Count => "count",
            MeasureType::CountDistinct => "countDistinct",
            MeasureType::Sum => "sum",
            MeasureType::Avg => "avg",
            MeasureType::Min => "min",
            MeasureType::Max => "max",
            MeasureType::Number => "number",
        };
        f.write_str(s)
    }
}

impl fmt::Display for DimensionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            DimensionType::String => "string",
            DimensionType::Number => "number",
            DimensionType::Time => "time",
            DimensionType::Boolean => "boolean",
        };
        f.write_str(s)
    }
}

/// Listing of every queryable identifier, grouped per cube
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CatalogMeta {
    pub cubes: Vec<CubeMeta>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CubeMeta {
    pub name: String,
    pub title: String,
    pub measures: Vec<String>,
    pub dimensions: Vec<String>,
}

impl Catalog {
    /// Load a catalog from a YAML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ParseError> {
        crate::parser::parse_catalog_file(path)
    }

    /// Get a cube by name
    pub fn get_cube(&self, name: &str) -> Option<&Cube> {
        self.cubes.iter().find(|c| c.name == name)
    }

    /// Look up the measure an identifier refers to
    pub fn measure(&self, id: &QualifiedIdentifier) -> Option<&Member<MeasureType>> {
        self.get_cube(id.cube())?.get_measure(id.field())
    }

    /// Look up the dimension an identifier refers to
    pub fn dimension(&self, id: &QualifiedIdentifier) -> Option<&Member<DimensionType>> {
        self.get_cube(id.cube())?.get_dimension(id.field())
    }

    /// Whether the identifier names any measure or dimension
    pub fn contains(&self, id: &QualifiedIdentifier) -> bool {
        self.measure(id).is_some() || self.dimension(id).is_some()
    }

    /// Title and type name of a member, for result annotations
    pub fn describe(&self, id: &QualifiedIdentifier) -> Option<(String, String)> {
        if let Some(m) = self.measure(id) {
            return Some((m.title().to_string(), m.kind.to_string()));
        }
        self.dimension(id)
            .map(|d| (d.title().to_string(), d.kind.to_string()))
    }

    /// Reject names that could never appear in a `Cube.field` identifier
    pub(crate) fn check_names(&self) -> Result<(), ParseError> {
        let bad = |name: &str| name.is_empty() || name.contains('.');
        for cube in &self.cubes {
            if bad(&cube.name) {
                return Err(ParseError::InvalidCatalog(format!(
                    "cube name '{}' must be non-empty and contain no '.'",
                    cube.name
                )));
            }
            let members = cube
                .measures
                .iter()
                .map(|m| m.name.as_str())
                .chain(cube.dimensions.iter().map(|d| d.name.as_str()));
            for name in members {
                if bad(name) {
                    return Err(ParseError::InvalidCatalog(format!(
                        "member name '{}' of cube '{}' must be non-empty and contain no '.'",
                        name, cube.name
                    )));
                }
            }
        }
        Ok(())
    }

    pub fn meta(&self) -> CatalogMeta {
        let cubes = self
            .cubes
            .iter()
            .map(|cube| CubeMeta {
                name: cube.name.clone(),
                title: cube.title().to_string(),
                measures: cube
                    .measures
                    .iter()
                    .map(|m| format!("{}.{}", cube.name, m.name))
                    .collect(),
                dimensions: cube
                    .dimensions
                    .iter()
                    .map(|d| format!("{}.{}", cube.name, d.name))
                    .collect(),
            })
            .collect();
        CatalogMeta { cubes }
    }
}

impl Cube {
    pub fn title(&self) -> &str {
        self.title.as_deref().unwrap_or(&self.name)
    }

    pub fn get_measure(&self, name: &str) -> Option<&Member<MeasureType>> {
        self.measures.iter().find(|m| m.name == name)
    }

    pub fn get_dimension(&self, name: &str) -> Option<&Member<DimensionType>> {
        self.dimensions.iter().find(|d| d.name == name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const YAML: &str = r#"
cubes:
  - name: Employees
    title: Staff
    measures:
      - name: count
        type: count
      - name: avgSalary
        title: Average Salary
        type: avg
    dimensions:
      - name: name
        type: string
      - name: hiredAt
        title: Hire Date
        type: time
"#;

    fn catalog() -> Catalog {
        crate::parser::parse_catalog_str(YAML).unwrap()
    }

    #[test]
    fn test_lookup_by_identifier() {
        let catalog = catalog();
        let id = QualifiedIdentifier::parse("Employees.avgSalary").unwrap();
        assert_eq!(catalog.measure(&id).unwrap().kind, MeasureType::Avg);
        assert!(catalog.dimension(&id).is_none());

        let id = QualifiedIdentifier::parse("Employees.hiredAt").unwrap();
        assert_eq!(catalog.dimension(&id).unwrap().kind, DimensionType::Time);

        let id = QualifiedIdentifier::parse("Departments.name").unwrap();
        assert!(!catalog.contains(&id));
    }

    #[test]
    fn test_describe_falls_back_to_name() {
        let catalog = catalog();
        let count = QualifiedIdentifier::parse("Employees.count").unwrap();
        assert_eq!(catalog.describe(&count), Some(("count".to_string(), "count".to_string())));
        let hired = QualifiedIdentifier::parse("Employees.hiredAt").unwrap();
        assert_eq!(catalog.describe(&hired), Some(("Hire Date".to_string(), "time".to_string())));
    }

    #[test]
    fn test_meta_lists_qualified_members() {
        let meta = catalog().meta();
        assert_eq!(meta.cubes.len(), 1);
        let cube = &meta.cubes[0];
        assert_eq!(cube.title, "Staff");
        assert_eq!(cube.measures, vec!["Employees.count", "Employees.avgSalary"]);
        assert_eq!(cube.dimensions, vec!["Employees.name", "Employees.hiredAt"]);
    }

    #[test]
    fn test_names_that_cannot_form_identifiers_are_rejected() {
        let dotted_cube = "cubes:\n  - name: Sales.EU\n    measures:\n      - name: count\n        type: count\n";
        let err = crate::parser::parse_catalog_str(dotted_cube).unwrap_err();
        assert!(matches!(err, ParseError::InvalidCatalog(_)));
        assert!(err.to_string().contains("Sales.EU"));

        let dotted_member = "cubes:\n  - name: Sales\n    dimensions:\n      - name: region.code\n        type: string\n";
        assert!(matches!(
            crate::parser::parse_catalog_str(dotted_member),
            Err(ParseError::InvalidCatalog(_))
        ));

        let empty_member = "cubes:\n  - name: Sales\n    measures:\n      - name: ''\n        type: sum\n";
        assert!(matches!(
            crate::parser::parse_catalog_str(empty_member),
            Err(ParseError::InvalidCatalog(_))
        ));
    }

    #[test]
    fn test_meta_identifiers_parse() {
        for cube in catalog().meta().cubes {
            for id in cube.measures.iter().chain(&cube.dimensions) {
                assert!(QualifiedIdentifier::parse(id).is_ok(), "{}", id);
            }
        }
    }

    #[test]
    fn test_unknown_member_type_is_rejected() {
        let yaml = "cubes:\n  - name: A\n    measures:\n      - name: x\n        type: median\n";
        assert!(crate::parser::parse_catalog_str(yaml).is_err());
    }
}
