use std::sync::Arc;

use anyhow::{Result, bail};
use rusqlite::types::Value as SqlValue;
use serde::Serialize;
use serde::ser::{SerializeMap, Serializer};

use super::error::{QueryError, QueryValidationError};
use super::lookup::Comparison;
use super::request::AggregateRequest;
use super::validate::{Aggregation, FilterValue, QueryValidator, ValidatedFilter, ValidatedQuery};
use crate::models::{FieldSpec, RecordType, choice_label};
use crate::sqlite::CASEFOLD_FUNCTION;
use crate::telemetry::{Telemetry, TelemetryEvent};

/// Label used for groups whose raw value is empty.
pub const UNKNOWN_LABEL: &str = "unknown";

/// Parameterized SQL for one aggregate query. Identifiers come only from the
/// field table; every caller-supplied value is bound.
#[derive(Debug, Clone, PartialEq)]
pub struct AggregateStatement {
    pub sql: String,
    pub params: Vec<SqlValue>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct AggregateRow {
    pub group: SqlValue,
    pub value: SqlValue,
}

/// Read side of the case store used by the ad-hoc query path.
pub trait AggregateStore {
    fn fetch_groups(&self, statement: &AggregateStatement) -> Result<Vec<AggregateRow>>;
}

fn quoted(identifier: &str) -> String {
    format!("\"{identifier}\"")
}

#[must_use]
pub fn compile(query: &ValidatedQuery) -> AggregateStatement {
    let table = quoted(query.record_type.table());
    let metric = match query.aggregation {
        Aggregation::Count => "COUNT(*)".to_string(),
        Aggregation::Sum(field) => format!("COALESCE(SUM({}), 0)", quoted(field.name)),
    };

    let mut params = Vec::new();
    let conditions = query
        .filters
        .iter()
        .map(|filter| compile_filter(filter, &mut params))
        .collect::<Vec<_>>();
    let where_clause = if conditions.is_empty() {
        String::new()
    } else {
        format!(" WHERE {}", conditions.join(" AND "))
    };

    let sql = match query.group_by {
        Some(field) => {
            let column = quoted(field.name);
            format!(
                "SELECT {column}, {metric} FROM {table}{where_clause} GROUP BY {column} ORDER BY {column}"
            )
        }
        None => format!("SELECT NULL, {metric} FROM {table}{where_clause}"),
    };

    AggregateStatement { sql, params }
}

fn compile_filter(filter: &ValidatedFilter, params: &mut Vec<SqlValue>) -> String {
    let column = quoted(filter.field.name);
    let operand = match filter.lookup.transform {
        Some(part) => part.sql_expression(&column),
        None => column,
    };

    match filter.lookup.comparison {
        Comparison::In => {
            let placeholders = filter
                .values
                .iter()
                .map(|value| {
                    params.push(value.to_sql());
                    "?"
                })
                .collect::<Vec<_>>()
                .join(", ");
            format!("{operand} IN ({placeholders})")
        }
        comparison => {
            let value = filter.values.first();
            match comparison {
                Comparison::IContains => {
                    let needle = text_of(value).to_lowercase();
                    params.push(SqlValue::Text(format!("%{}%", escape_like(&needle))));
                    format!("{CASEFOLD_FUNCTION}({operand}) LIKE ? ESCAPE '\\'")
                }
                Comparison::StartsWith => {
                    params.push(SqlValue::Text(format!("{}*", escape_glob(text_of(value)))));
                    format!("{operand} GLOB ?")
                }
                Comparison::EndsWith => {
                    params.push(SqlValue::Text(format!("*{}", escape_glob(text_of(value)))));
                    format!("{operand} GLOB ?")
                }
                _ => {
                    params.push(value.map_or(SqlValue::Null, FilterValue::to_sql));
                    format!("{operand} {} ?", sql_operator(comparison))
                }
            }
        }
    }
}

const fn sql_operator(comparison: Comparison) -> &'static str {
    match comparison {
        Comparison::Gt => ">",
        Comparison::Gte => ">=",
        Comparison::Lt => "<",
        Comparison::Lte => "<=",
        _ => "=",
    }
}

fn text_of(value: Option<&FilterValue>) -> &str {
    match value {
        Some(FilterValue::Text(text)) => text,
        _ => "",
    }
}

fn escape_like(raw: &str) -> String {
    let mut escaped = String::with_capacity(raw.len());
    for character in raw.chars() {
        if matches!(character, '\\' | '%' | '_') {
            escaped.push('\\');
        }
        escaped.push(character);
    }
    escaped
}

fn escape_glob(raw: &str) -> String {
    let mut escaped = String::with_capacity(raw.len());
    for character in raw.chars() {
        match character {
            '*' => escaped.push_str("[*]"),
            '?' => escaped.push_str("[?]"),
            '[' => escaped.push_str("[[]"),
            other => escaped.push(other),
        }
    }
    escaped
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(untagged)]
pub enum MetricValue {
    Integer(i64),
    Real(f64),
}

impl MetricValue {
    fn from_sql(value: SqlValue) -> Result<Self> {
        match value {
            SqlValue::Null => Ok(Self::Integer(0)),
            SqlValue::Integer(number) => Ok(Self::Integer(number)),
            SqlValue::Real(number) => Ok(Self::Real(number)),
            SqlValue::Text(text) => bail!("aggregate returned text `{text}`"),
            SqlValue::Blob(_) => bail!("aggregate returned a blob"),
        }
    }

    #[must_use]
    pub fn as_f64(self) -> f64 {
        match self {
            Self::Integer(number) => number as f64,
            Self::Real(number) => number,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum GroupValue {
    Null,
    Integer(i64),
    Real(f64),
    Text(String),
}

impl GroupValue {
    fn from_sql(value: SqlValue) -> Self {
        match value {
            SqlValue::Null | SqlValue::Blob(_) => Self::Null,
            SqlValue::Integer(number) => Self::Integer(number),
            SqlValue::Real(number) => Self::Real(number),
            SqlValue::Text(text) => Self::Text(text),
        }
    }

    fn raw_text(&self) -> Option<String> {
        match self {
            Self::Null => None,
            Self::Integer(number) => Some(number.to_string()),
            Self::Real(number) => Some(number.to_string()),
            Self::Text(text) if text.trim().is_empty() => None,
            Self::Text(text) => Some(text.clone()),
        }
    }
}

impl Serialize for GroupValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::Null => serializer.serialize_none(),
            Self::Integer(number) => serializer.serialize_i64(*number),
            Self::Real(number) => serializer.serialize_f64(*number),
            Self::Text(text) => serializer.serialize_str(text),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct GroupResult {
    pub dimension: Option<&'static str>,
    pub group: GroupValue,
    pub label: Option<String>,
    pub value: MetricValue,
}

/// Grouped rows serialize as `{<dimension>: raw, "label": .., "value": ..}`,
/// the single ungrouped row as `{"value": ..}`.
impl Serialize for GroupResult {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(None)?;
        if let Some(dimension) = self.dimension {
            map.serialize_entry(dimension, &self.group)?;
            map.serialize_entry("label", &self.label)?;
        }
        map.serialize_entry("value", &self.value)?;
        map.end()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QueryResult {
    pub record_type: RecordType,
    pub group_by: Option<&'static str>,
    pub aggregation: String,
    pub results: Vec<GroupResult>,
}

/// Display label for a group value: the choice label when the field has a
/// choice domain containing the code, the raw value otherwise.
#[must_use]
pub fn group_label(field: &FieldSpec, group: &GroupValue) -> String {
    let Some(raw) = group.raw_text() else {
        return UNKNOWN_LABEL.to_string();
    };
    field
        .choices
        .and_then(|domain| choice_label(domain, &raw))
        .map_or(raw, str::to_string)
}

/// Validates and runs ad-hoc aggregate queries.
#[derive(Clone)]
pub struct QueryExecutor {
    registry: Arc<crate::registry::MetadataRegistry>,
    telemetry: Arc<dyn Telemetry>,
}

impl QueryExecutor {
    #[must_use]
    pub fn new(
        registry: Arc<crate::registry::MetadataRegistry>,
        telemetry: Arc<dyn Telemetry>,
    ) -> Self {
        Self {
            registry,
            telemetry,
        }
    }

    pub fn validate(
        &self,
        request: &AggregateRequest,
    ) -> Result<ValidatedQuery, QueryValidationError> {
        QueryValidator::new(&self.registry)
            .validate(request)
            .inspect_err(|error| {
                self.telemetry.record(&TelemetryEvent::QueryRejected {
                    record_type: &request.record_type,
                    code: error.code(),
                    field: &error.field(),
                });
            })
    }

    /// Rejected requests never reach the store.
    pub fn run(
        &self,
        store: &dyn AggregateStore,
        request: &AggregateRequest,
    ) -> Result<QueryResult, QueryError> {
        let query = self.validate(request)?;
        let statement = compile(&query);
        let rows = store.fetch_groups(&statement)?;

        let mut results = Vec::with_capacity(rows.len());
        for row in rows {
            let value = MetricValue::from_sql(row.value)?;
            let group = GroupValue::from_sql(row.group);
            let (dimension, label) = match query.group_by {
                Some(field) => (Some(field.name), Some(group_label(field, &group))),
                None => (None, None),
            };
            results.push(GroupResult {
                dimension,
                group,
                label,
                value,
            });
        }

        let aggregation = query.aggregation.name();
        self.telemetry.record(&TelemetryEvent::QueryExecuted {
            record_type: query.record_type.as_str(),
            group_by: query.group_by.map(|field| field.name),
            aggregation: &aggregation,
            groups: results.len(),
        });

        Ok(QueryResult {
            record_type: query.record_type,
            group_by: query.group_by.map(|field| field.name),
            aggregation,
            results,
        })
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::{GroupValue, compile, escape_glob, escape_like, group_label};
    use crate::models::RecordType;
    use crate::query::request::AggregateRequest;
    use crate::query::validate::QueryValidator;
    use crate::registry::MetadataRegistry;
    use rusqlite::types::Value as SqlValue;

    #[test]
    fn grouped_sum_compiles_to_bound_parameters() {
        let registry = MetadataRegistry::standard();
        let request = AggregateRequest::count("Consultation")
            .grouped_by("type")
            .with_aggregation("sum:duration")
            .with_filter("scheduled_at__date__gte", json!("2024-01-01"))
            .with_filter("status__in", json!(["occurred", "planned"]));
        let query = QueryValidator::new(&registry)
            .validate(&request)
            .expect("query should validate");

        let statement = compile(&query);
        assert_eq!(
            statement.sql,
            "SELECT \"type\", COALESCE(SUM(\"duration\"), 0) FROM \"consultations\" \
             WHERE date(\"scheduled_at\") >= ? AND \"status\" IN (?, ?) \
             GROUP BY \"type\" ORDER BY \"type\""
        );
        assert_eq!(
            statement.params,
            vec![
                SqlValue::Text("2024-01-01".to_string()),
                SqlValue::Text("occurred".to_string()),
                SqlValue::Text("planned".to_string()),
            ]
        );
    }

    #[test]
    fn text_matching_escapes_wildcards() {
        assert_eq!(escape_like("50%_a\\b"), "50\\%\\_a\\\\b");
        assert_eq!(escape_glob("a*b?[c"), "a[*]b[?][[]c");
    }

    #[test]
    fn labels_fall_back_to_raw_value_then_unknown() {
        let field = RecordType::Consultation
            .field("type")
            .expect("type field should exist");
        assert_eq!(
            group_label(field, &GroupValue::Text("phone".to_string())),
            "Phone"
        );
        assert_eq!(
            group_label(field, &GroupValue::Text("carrier-pigeon".to_string())),
            "carrier-pigeon"
        );
        assert_eq!(group_label(field, &GroupValue::Null), "unknown");
        assert_eq!(
            group_label(field, &GroupValue::Text("  ".to_string())),
            "unknown"
        );
    }
}
