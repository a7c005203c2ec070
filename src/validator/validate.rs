use serde_json::{Map, Value};
use tracing::debug;

use crate::catalog::{Catalog, DimensionType};
use crate::config::ValidatorConfig;
use crate::context::{SecurityContext, ValidatedRequest};
use crate::query::{
    CompoundFilter, DateBound, DateRange, FilterNode, Granularity, Junction, LeafFilter, Literal,
    Operator, OrderDirection, QualifiedIdentifier, Query, RelativeRange, TimeDimension,
};

use super::error::{ErrorKind, ValidationError};
use super::path::FieldPath;

type Result<T> = std::result::Result<T, ValidationError>;

/// Top-level keys of the query grammar
const QUERY_KEYS: [&str; 7] = [
    "measures",
    "dimensions",
    "timeDimensions",
    "filters",
    "order",
    "limit",
    "offset",
];

/// Validates raw queries against a config and, optionally, a cube catalog.
///
/// Holds no mutable state; one validator can serve any number of threads.
#[derive(Debug, Clone, Default)]
pub struct Validator {
    config: ValidatorConfig,
    catalog: Option<Catalog>,
}

impl Validator {
    pub fn new(config: ValidatorConfig) -> Self {
        Self {
            config,
            catalog: None,
        }
    }

    /// Also require every identifier to exist in `catalog`
    pub fn with_catalog(mut self, catalog: Catalog) -> Self {
        self.catalog = Some(catalog);
        self
    }

    pub fn config(&self) -> &ValidatorConfig {
        &self.config
    }

    pub fn catalog(&self) -> Option<&Catalog> {
        self.catalog.as_ref()
    }

    /// Validate a raw query document into a canonical [`Query`]
    pub fn validate(&self, raw: &Value) -> Result<Query> {
        let cx = Cx {
            config: &self.config,
            catalog: self.catalog.as_ref(),
        };
        traced(cx.query(raw))
    }

    /// Validate a raw query and pair it with the caller's security context.
    ///
    /// The context is never inspected.
    pub fn validate_request(&self, raw: &Value, context: SecurityContext) -> Result<ValidatedRequest> {
        let query = self.validate(raw)?;
        Ok(ValidatedRequest::new(query, context))
    }
}

/// Validate a raw query with the default config and no catalog
pub fn validate(raw: &Value) -> Result<Query> {
    Validator::default().validate(raw)
}

/// Validate a raw query with a custom config and no catalog
pub fn validate_with(raw: &Value, config: &ValidatorConfig) -> Result<Query> {
    let cx = Cx {
        config,
        catalog: None,
    };
    traced(cx.query(raw))
}

fn traced(result: Result<Query>) -> Result<Query> {
    match &result {
        Ok(query) => debug!(
            measures = query.measures().len(),
            dimensions = query.dimensions().len(),
            time_dimensions = query.time_dimensions().len(),
            filters = query.filters().len(),
            "query validated"
        ),
        Err(err) => debug!(kind = %err.kind, path = %err.path, "query rejected: {}", err.message),
    }
    result
}

/// Borrowed validation context
struct Cx<'a> {
    config: &'a ValidatorConfig,
    catalog: Option<&'a Catalog>,
}

#[derive(Clone, Copy)]
enum Role {
    Measure,
    Dimension,
}

impl Cx<'_> {
    fn query(&self, raw: &Value) -> Result<Query> {
        let root = FieldPath::root();
        let obj = raw.as_object().ok_or_else(|| {
            ValidationError::new(
                ErrorKind::MalformedQuery,
                &root,
                format!("query must be an object, got {}", json_type(raw)),
            )
        })?;

        if self.config.reject_unknown_keys {
            if let Some(key) = obj.keys().find(|k| !QUERY_KEYS.contains(&k.as_str())) {
                return Err(ValidationError::new(
                    ErrorKind::MalformedQuery,
                    root.key(key),
                    format!("unknown query key '{}'", key),
                ));
            }
        }

        // 1. Measures and dimensions
        let measures = self.members(obj, "measures", Role::Measure)?;
        let dimensions = self.members(obj, "dimensions", Role::Dimension)?;

        // 2. Something must be selected
        if measures.is_empty() && dimensions.is_empty() {
            return Err(ValidationError::new(
                ErrorKind::EmptyQuery,
                &root,
                "query must have at least one measure or dimension",
            ));
        }

        // 3. Time dimensions
        let time_dimensions = self.time_dimensions(obj, "timeDimensions")?;

        // 4. Filters
        let filters = self.filters(obj, "filters")?;

        // 5. Order, which may only reference selected members
        let declared: Vec<&QualifiedIdentifier> = measures
            .iter()
            .chain(dimensions.iter())
            .chain(time_dimensions.iter().map(|t| &t.dimension))
            .collect();
        let order = self.order(obj, "order", &declared)?;

        // 6. Pagination
        let limit = pagination(obj, "limit")?;
        if let (Some(limit), Some(max)) = (limit, self.config.max_limit) {
            if limit > max {
                return Err(ValidationError::new(
                    ErrorKind::InvalidPagination,
                    root.key("limit"),
                    format!("limit {} exceeds the maximum of {}", limit, max),
                ));
            }
        }
        let offset = pagination(obj, "offset")?;

        Ok(Query {
            measures,
            dimensions,
            time_dimensions,
            filters,
            order,
            limit,
            offset,
        })
    }

    fn members(&self, obj: &Map<String, Value>, key: &str, role: Role) -> Result<Vec<QualifiedIdentifier>> {
        let path = &FieldPath::root().key(key);
        let Some(items) = optional_array(obj, key)? else {
            return Ok(vec![]);
        };

        items
            .iter()
            .enumerate()
            .map(|(i, item)| {
                let item_path = path.index(i);
                let id = identifier(item, &item_path)?;
                self.check_member(&id, &item_path, role)?;
                Ok(id)
            })
            .collect()
    }

    fn check_member(&self, id: &QualifiedIdentifier, path: &FieldPath, role: Role) -> Result<()> {
        let Some(catalog) = self.catalog else {
            return Ok(());
        };
        let (known, what) = match role {
            Role::Measure => (catalog.measure(id).is_some(), "measure"),
            Role::Dimension => (catalog.dimension(id).is_some(), "dimension"),
        };
        if known {
            Ok(())
        } else {
            Err(ValidationError::new(
                ErrorKind::InvalidIdentifier,
                path,
                format!("unknown {} '{}'", what, id),
            ))
        }
    }

    fn time_dimensions(&self, obj: &Map<String, Value>, key: &str) -> Result<Vec<TimeDimension>> {
        let path = &FieldPath::root().key(key);
        let Some(items) = optional_array(obj, key)? else {
            return Ok(vec![]);
        };

        if let Some(max) = self.config.max_time_dimensions {
            if items.len() > max {
                return Err(ValidationError::new(
                    ErrorKind::MalformedQuery,
                    path,
                    format!("at most {} time dimensions are allowed, got {}", max, items.len()),
                ));
            }
        }

        items
            .iter()
            .enumerate()
            .map(|(i, item)| self.time_dimension(item, &path.index(i)))
            .collect()
    }

    fn time_dimension(&self, raw: &Value, path: &FieldPath) -> Result<TimeDimension> {
        let obj = object(raw, path, "time dimension")?;

        let dim_path = path.key("dimension");
        let dimension = match present(obj, "dimension") {
            Some(value) => identifier(value, &dim_path)?,
            None => {
                return Err(ValidationError::new(
                    ErrorKind::InvalidIdentifier,
                    dim_path,
                    "time dimension requires a 'dimension'",
                ))
            }
        };
        if let Some(catalog) = self.catalog {
            let is_time = catalog
                .dimension(&dimension)
                .is_some_and(|d| d.kind == DimensionType::Time);
            if !is_time {
                return Err(ValidationError::new(
                    ErrorKind::InvalidIdentifier,
                    dim_path,
                    format!("'{}' is not a time dimension", dimension),
                ));
            }
        }

        let granularity = match present(obj, "granularity") {
            None => None,
            Some(value) => Some(granularity(value, &path.key("granularity"))?),
        };

        let date_range = match present(obj, "dateRange") {
            None => None,
            Some(value) => Some(date_range(value, &path.key("dateRange"))?),
        };

        Ok(TimeDimension {
            dimension,
            granularity,
            date_range,
        })
    }

    fn filters(&self, obj: &Map<String, Value>, key: &str) -> Result<Vec<FilterNode>> {
        let path = &FieldPath::root().key(key);
        let Some(items) = optional_array(obj, key)? else {
            return Ok(vec![]);
        };

        items
            .iter()
            .enumerate()
            .map(|(i, item)| self.filter(item, &path.index(i), 1))
            .collect()
    }

    fn filter(&self, raw: &Value, path: &FieldPath, depth: usize) -> Result<FilterNode> {
        if depth > self.config.max_filter_depth {
            return Err(ValidationError::new(
                ErrorKind::MalformedQuery,
                path,
                format!("filters nest deeper than {} levels", self.config.max_filter_depth),
            ));
        }

        let obj = object(raw, path, "filter")?;

        let kind = match (obj.contains_key("and"), obj.contains_key("or")) {
            (true, true) => {
                return Err(ValidationError::new(
                    ErrorKind::MalformedQuery,
                    path,
                    "filter cannot have both 'and' and 'or'",
                ))
            }
            (true, false) => Some(Junction::And),
            (false, true) => Some(Junction::Or),
            (false, false) => None,
        };

        match kind {
            Some(kind) => self.compound(obj, kind, path, depth).map(FilterNode::Compound),
            None => self.leaf(obj, path).map(FilterNode::Leaf),
        }
    }

    fn compound(
        &self,
        obj: &Map<String, Value>,
        kind: Junction,
        path: &FieldPath,
        depth: usize,
    ) -> Result<CompoundFilter> {
        let children_path = path.key(kind.key());
        let items = obj
            .get(kind.key())
            .and_then(Value::as_array)
            .ok_or_else(|| {
                ValidationError::new(
                    ErrorKind::MalformedQuery,
                    &children_path,
                    format!("'{}' must be an array of filters", kind.key()),
                )
            })?;

        if items.is_empty() {
            return Err(ValidationError::new(
                ErrorKind::MalformedQuery,
                &children_path,
                format!("'{}' needs at least one filter", kind.key()),
            ));
        }

        let children = items
            .iter()
            .enumerate()
            .map(|(i, item)| self.filter(item, &children_path.index(i), depth + 1))
            .collect::<Result<Vec<_>>>()?;

        Ok(CompoundFilter { kind, children })
    }

    fn leaf(&self, obj: &Map<String, Value>, path: &FieldPath) -> Result<LeafFilter> {
        // `dimension` is the older spelling of `member`
        let (member_key, member_value) = match (present(obj, "member"), present(obj, "dimension")) {
            (Some(value), _) => ("member", value),
            (None, Some(value)) => ("dimension", value),
            (None, None) => {
                return Err(ValidationError::new(
                    ErrorKind::InvalidIdentifier,
                    path.key("member"),
                    "filter requires a 'member'",
                ))
            }
        };
        let member_path = path.key(member_key);
        let member = identifier(member_value, &member_path)?;
        if let Some(catalog) = self.catalog {
            if !catalog.contains(&member) {
                return Err(ValidationError::new(
                    ErrorKind::InvalidIdentifier,
                    member_path,
                    format!("unknown member '{}'", member),
                ));
            }
        }

        let op_path = path.key("operator");
        let operator = match present(obj, "operator") {
            Some(Value::String(s)) => s.parse::<Operator>().map_err(|e| {
                ValidationError::new(ErrorKind::InvalidOperator, &op_path, e.to_string())
            })?,
            Some(other) => {
                return Err(ValidationError::new(
                    ErrorKind::InvalidOperator,
                    op_path,
                    format!("operator must be a string, got {}", json_type(other)),
                ))
            }
            None => {
                return Err(ValidationError::new(
                    ErrorKind::InvalidOperator,
                    op_path,
                    "filter requires an 'operator'",
                ))
            }
        };

        let values_path = path.key("values");
        let raw_values: &[Value] = match present(obj, "values") {
            None => &[],
            Some(Value::Array(items)) => items,
            Some(other) => {
                return Err(ValidationError::new(
                    ErrorKind::MalformedQuery,
                    values_path,
                    format!("values must be an array, got {}", json_type(other)),
                ))
            }
        };

        let arity = operator.arity();
        if !arity.accepts(raw_values.len()) {
            return Err(ValidationError::new(
                ErrorKind::ArityMismatch,
                values_path,
                format!(
                    "operator '{}' takes {}, got {}",
                    operator,
                    arity,
                    raw_values.len()
                ),
            ));
        }

        let values = raw_values
            .iter()
            .enumerate()
            .map(|(i, value)| filter_value(operator, value, &values_path.index(i)))
            .collect::<Result<Vec<_>>>()?;

        Ok(LeafFilter {
            member,
            operator,
            values,
        })
    }

    fn order(
        &self,
        obj: &Map<String, Value>,
        key: &str,
        declared: &[&QualifiedIdentifier],
    ) -> Result<Vec<(QualifiedIdentifier, OrderDirection)>> {
        let path = &FieldPath::root().key(key);
        let entries: Vec<(FieldPath, &str, &Value)> = match present(obj, key) {
            None => return Ok(vec![]),
            Some(Value::Object(map)) => map
                .iter()
                .map(|(k, v)| (path.entry(k), k.as_str(), v))
                .collect(),
            Some(Value::Array(pairs)) => pairs
                .iter()
                .enumerate()
                .map(|(i, pair)| {
                    let pair_path = path.index(i);
                    match pair.as_array().map(Vec::as_slice) {
                        Some([Value::String(k), v]) => Ok((pair_path, k.as_str(), v)),
                        _ => Err(ValidationError::new(
                            ErrorKind::MalformedQuery,
                            pair_path,
                            "order entries must be [member, direction] pairs",
                        )),
                    }
                })
                .collect::<Result<Vec<_>>>()?,
            Some(other) => {
                return Err(ValidationError::new(
                    ErrorKind::MalformedQuery,
                    path,
                    format!("order must be an object or an array, got {}", json_type(other)),
                ))
            }
        };

        let mut order: Vec<(QualifiedIdentifier, OrderDirection)> = Vec::with_capacity(entries.len());
        for (entry_path, key, value) in entries {
            let member = QualifiedIdentifier::parse(key).map_err(|e| {
                ValidationError::new(ErrorKind::InvalidIdentifier, &entry_path, e.to_string())
            })?;

            if !declared.contains(&&member) {
                return Err(ValidationError::new(
                    ErrorKind::UnknownOrderField,
                    entry_path,
                    format!("cannot order by '{}', it is not selected by the query", member),
                ));
            }

            let direction = value
                .as_str()
                .and_then(OrderDirection::parse)
                .ok_or_else(|| {
                    ValidationError::new(
                        ErrorKind::UnknownOrderField,
                        &entry_path,
                        format!("order direction must be 'asc' or 'desc', got {}", value),
                    )
                })?;

            let existing = order.iter().find(|(m, _)| *m == member).map(|(_, d)| *d);
            match existing {
                Some(existing) if existing == direction => {}
                Some(_) => {
                    return Err(ValidationError::new(
                        ErrorKind::MalformedQuery,
                        entry_path,
                        format!("'{}' is ordered in both directions", member),
                    ))
                }
                None => order.push((member, direction)),
            }
        }

        Ok(order)
    }
}

fn filter_value(operator: Operator, value: &Value, path: &FieldPath) -> Result<Literal> {
    let literal = Literal::from_json(value).ok_or_else(|| {
        ValidationError::new(
            ErrorKind::InvalidFilterValue,
            path,
            format!("filter values must be strings, numbers or booleans, got {}", json_type(value)),
        )
    })?;

    if operator.takes_dates() {
        let is_date = literal.as_str().and_then(DateBound::parse).is_some();
        if !is_date {
            return Err(ValidationError::new(
                ErrorKind::InvalidFilterValue,
                path,
                format!("operator '{}' needs an ISO-8601 date, got {}", operator, value),
            ));
        }
    }

    if operator == Operator::Regex {
        let pattern = literal.as_str().ok_or_else(|| {
            ValidationError::new(
                ErrorKind::InvalidFilterValue,
                path,
                "regex patterns must be strings",
            )
        })?;
        regex::Regex::new(pattern).map_err(|e| {
            ValidationError::new(
                ErrorKind::InvalidFilterValue,
                path,
                format!("invalid regex: {}", e),
            )
        })?;
    }

    Ok(literal)
}

fn granularity(value: &Value, path: &FieldPath) -> Result<Granularity> {
    let token = value.as_str().ok_or_else(|| {
        ValidationError::new(
            ErrorKind::InvalidGranularity,
            path,
            format!("granularity must be a string, got {}", json_type(value)),
        )
    })?;
    token
        .parse()
        .map_err(|e: crate::query::ParseGranularityError| {
            ValidationError::new(ErrorKind::InvalidGranularity, path, e.to_string())
        })
}

fn date_range(value: &Value, path: &FieldPath) -> Result<DateRange> {
    match value {
        Value::String(token) => RelativeRange::parse(token)
            .map(DateRange::Relative)
            .ok_or_else(|| {
                ValidationError::new(
                    ErrorKind::InvalidDateRange,
                    path,
                    format!("unrecognized relative date range '{}'", token),
                )
            }),
        Value::Array(items) => {
            let [start, end] = items.as_slice() else {
                return Err(ValidationError::new(
                    ErrorKind::InvalidDateRange,
                    path,
                    format!("date range must have exactly 2 dates, got {}", items.len()),
                ));
            };
            let start = date_bound(start, &path.index(0))?;
            let end = date_bound(end, &path.index(1))?;
            if start.as_datetime() > end.as_datetime() {
                return Err(ValidationError::new(
                    ErrorKind::InvalidDateRange,
                    path,
                    format!("date range starts ({}) after it ends ({})", start, end),
                ));
            }
            Ok(DateRange::Absolute { start, end })
        }
        other => Err(ValidationError::new(
            ErrorKind::InvalidDateRange,
            path,
            format!("date range must be a string or a [start, end] pair, got {}", json_type(other)),
        )),
    }
}

fn date_bound(value: &Value, path: &FieldPath) -> Result<DateBound> {
    value
        .as_str()
        .and_then(DateBound::parse)
        .ok_or_else(|| {
            ValidationError::new(
                ErrorKind::InvalidDateRange,
                path,
                format!("expected an ISO-8601 date, got {}", value),
            )
        })
}

/// Non-negative integer; integral floats such as `10.0` are accepted
fn pagination(obj: &Map<String, Value>, key: &str) -> Result<Option<u64>> {
    let path = FieldPath::root().key(key);
    let Some(value) = present(obj, key) else {
        return Ok(None);
    };

    let parsed = match value {
        Value::Number(n) => n.as_u64().or_else(|| {
            // 2^64 itself would saturate to u64::MAX
            n.as_f64()
                .filter(|f| *f >= 0.0 && f.fract() == 0.0 && *f < u64::MAX as f64)
                .map(|f| f as u64)
        }),
        _ => None,
    };

    parsed.map(Some).ok_or_else(|| {
        ValidationError::new(
            ErrorKind::InvalidPagination,
            path,
            format!("expected a non-negative integer, got {}", value),
        )
    })
}

fn identifier(value: &Value, path: &FieldPath) -> Result<QualifiedIdentifier> {
    let s = value.as_str().ok_or_else(|| {
        ValidationError::new(
            ErrorKind::InvalidIdentifier,
            path,
            format!("identifier must be a string, got {}", json_type(value)),
        )
    })?;
    QualifiedIdentifier::parse(s)
        .map_err(|e| ValidationError::new(ErrorKind::InvalidIdentifier, path, e.to_string()))
}

fn object<'v>(value: &'v Value, path: &FieldPath, what: &str) -> Result<&'v Map<String, Value>> {
    value.as_object().ok_or_else(|| {
        ValidationError::new(
            ErrorKind::MalformedQuery,
            path,
            format!("{} must be an object, got {}", what, json_type(value)),
        )
    })
}

/// Value under `key`, treating an explicit `null` as absent
fn present<'v>(obj: &'v Map<String, Value>, key: &str) -> Option<&'v Value> {
    obj.get(key).filter(|v| !v.is_null())
}

/// Top-level array under `key`; absent or `null` yields `None`
fn optional_array<'v>(obj: &'v Map<String, Value>, key: &str) -> Result<Option<&'v Vec<Value>>> {
    match present(obj, key) {
        None => Ok(None),
        Some(Value::Array(items)) => Ok(Some(items)),
        Some(other) => Err(ValidationError::new(
            ErrorKind::MalformedQuery,
            FieldPath::root().key(key),
            format!("'{}' must be an array, got {}", key, json_type(other)),
        )),
    }
}

fn json_type(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
