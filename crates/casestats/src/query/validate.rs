use rusqlite::types::Value as SqlValue;
use serde_json::Value;
use time::{Date, PrimitiveDateTime};

use super::error::QueryValidationError;
use super::lookup::{Comparison, DatePart, Lookup, parse_lookup, split_filter_path};
use super::request::AggregateRequest;
use crate::models::{FieldKind, FieldSpec, RecordType};
use crate::registry::{COUNT_METRIC, MetadataRegistry, RecordTypeMetadata, SUM_METRIC_PREFIX};
use crate::utils::time::{format_date, format_date_time, parse_calendar_date, parse_date_time};

/// Value type a lookup compares against after any date-part transform.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OperandKind {
    Integer,
    Decimal,
    Boolean,
    Text,
    Date,
    DateTime,
}

impl OperandKind {
    fn of_field(kind: FieldKind) -> Self {
        match kind {
            FieldKind::PrimaryKey
            | FieldKind::Integer
            | FieldKind::Reference(_)
            | FieldKind::ExternalReference
            | FieldKind::ReverseRelation(_) => Self::Integer,
            FieldKind::Decimal => Self::Decimal,
            FieldKind::Boolean => Self::Boolean,
            FieldKind::ShortText | FieldKind::LongText => Self::Text,
            FieldKind::Date => Self::Date,
            FieldKind::DateTime => Self::DateTime,
        }
    }

    const fn is_ordered(self) -> bool {
        matches!(
            self,
            Self::Integer | Self::Decimal | Self::Date | Self::DateTime
        )
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum FilterValue {
    Integer(i64),
    Decimal(f64),
    Boolean(bool),
    Text(String),
    Date(Date),
    DateTime(PrimitiveDateTime),
}

impl FilterValue {
    #[must_use]
    pub fn to_sql(&self) -> SqlValue {
        match self {
            Self::Integer(value) => SqlValue::Integer(*value),
            Self::Decimal(value) => SqlValue::Real(*value),
            Self::Boolean(flag) => SqlValue::Integer(i64::from(*flag)),
            Self::Text(text) => SqlValue::Text(text.clone()),
            Self::Date(date) => SqlValue::Text(format_date(*date)),
            Self::DateTime(value) => SqlValue::Text(format_date_time(*value)),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ValidatedFilter {
    pub key: String,
    pub field: &'static FieldSpec,
    pub lookup: Lookup,
    /// One entry for scalar comparisons, one or more for `in`.
    pub values: Vec<FilterValue>,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Aggregation {
    Count,
    Sum(&'static FieldSpec),
}

impl Aggregation {
    #[must_use]
    pub fn name(self) -> String {
        match self {
            Self::Count => COUNT_METRIC.to_string(),
            Self::Sum(field) => format!("sum:{}", field.name),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ValidatedQuery {
    pub record_type: RecordType,
    pub group_by: Option<&'static FieldSpec>,
    pub filters: Vec<ValidatedFilter>,
    pub aggregation: Aggregation,
}

/// Checks an ad-hoc request against the registry whitelist.
#[derive(Debug, Clone, Copy)]
pub struct QueryValidator<'r> {
    registry: &'r MetadataRegistry,
}

impl<'r> QueryValidator<'r> {
    #[must_use]
    pub fn new(registry: &'r MetadataRegistry) -> Self {
        Self { registry }
    }

    pub fn validate(
        &self,
        request: &AggregateRequest,
    ) -> Result<ValidatedQuery, QueryValidationError> {
        let metadata = self.registry.lookup(&request.record_type).ok_or_else(|| {
            QueryValidationError::InvalidRecordType {
                record_type: request.record_type.clone(),
            }
        })?;

        let group_by = match request.group_by.as_deref() {
            None | Some("") => None,
            Some(name) => Some(metadata.group_field(name).ok_or_else(|| {
                QueryValidationError::InvalidGroupBy {
                    record_type: request.record_type.clone(),
                    group_by: name.to_string(),
                }
            })?),
        };

        let filters = request
            .filters
            .iter()
            .map(|(key, value)| validate_filter(metadata, &request.record_type, key, value))
            .collect::<Result<Vec<_>, _>>()?;

        let aggregation = resolve_aggregation(metadata, request)?;

        Ok(ValidatedQuery {
            record_type: metadata.record_type,
            group_by,
            filters,
            aggregation,
        })
    }
}

fn validate_filter(
    metadata: &RecordTypeMetadata,
    record_type: &str,
    key: &str,
    value: &Value,
) -> Result<ValidatedFilter, QueryValidationError> {
    let path = split_filter_path(key);
    let field = metadata.filter_field(path.field).ok_or_else(|| {
        QueryValidationError::InvalidFilterField {
            record_type: record_type.to_string(),
            filter: key.to_string(),
            field: path.field.to_string(),
        }
    })?;

    let lookup = parse_lookup(&path.segments).map_err(|segment| {
        QueryValidationError::InvalidFilterOperator {
            filter: key.to_string(),
            operator: segment.to_string(),
            reason: "not an allowed lookup",
        }
    })?;

    let operand = operand_kind(field, lookup).map_err(|(operator, reason)| {
        QueryValidationError::InvalidFilterOperator {
            filter: key.to_string(),
            operator: operator.to_string(),
            reason,
        }
    })?;

    let values = parse_values(operand, lookup.comparison, value).map_err(|reason| {
        QueryValidationError::InvalidFilterValue {
            filter: key.to_string(),
            reason,
        }
    })?;

    Ok(ValidatedFilter {
        key: key.to_string(),
        field,
        lookup,
        values,
    })
}

fn operand_kind(
    field: &FieldSpec,
    lookup: Lookup,
) -> Result<OperandKind, (&'static str, &'static str)> {
    let base = OperandKind::of_field(field.kind);
    let operand = match lookup.transform {
        None => base,
        Some(part @ (DatePart::Year | DatePart::Month | DatePart::Day)) => {
            if !field.kind.is_temporal() {
                return Err((part.as_str(), "date-part lookups apply only to date fields"));
            }
            OperandKind::Integer
        }
        Some(DatePart::Date) => {
            if field.kind != FieldKind::DateTime {
                return Err((
                    DatePart::Date.as_str(),
                    "`date` applies only to date-time fields",
                ));
            }
            OperandKind::Date
        }
    };

    let comparison = lookup.comparison;
    if comparison.is_range() && !operand.is_ordered() {
        return Err((
            comparison.as_str(),
            "range lookups apply only to numeric and date values",
        ));
    }
    if comparison.is_text_match() && operand != OperandKind::Text {
        return Err((
            comparison.as_str(),
            "text matching applies only to text fields",
        ));
    }

    Ok(operand)
}

fn parse_values(
    operand: OperandKind,
    comparison: Comparison,
    value: &Value,
) -> Result<Vec<FilterValue>, String> {
    match (comparison, value) {
        (Comparison::In, Value::Array(items)) => {
            if items.is_empty() {
                return Err("`in` requires at least one value".to_string());
            }
            items
                .iter()
                .map(|item| match item {
                    Value::Array(_) => Err("nested lists are not allowed".to_string()),
                    scalar => parse_scalar(operand, scalar),
                })
                .collect()
        }
        (_, Value::Array(_)) => Err(format!(
            "a list is only accepted by the `in` lookup, not `{}`",
            comparison.as_str()
        )),
        (_, scalar) => Ok(vec![parse_scalar(operand, scalar)?]),
    }
}

fn parse_scalar(operand: OperandKind, value: &Value) -> Result<FilterValue, String> {
    match value {
        Value::Null => return Err("null is not a valid filter value".to_string()),
        Value::Object(_) => return Err("objects are not valid filter values".to_string()),
        _ => {}
    }

    match operand {
        OperandKind::Integer => parse_integer(value).map(FilterValue::Integer),
        OperandKind::Decimal => parse_decimal(value).map(FilterValue::Decimal),
        OperandKind::Boolean => parse_boolean(value).map(FilterValue::Boolean),
        OperandKind::Text => match value {
            Value::String(text) => Ok(FilterValue::Text(text.clone())),
            Value::Number(number) => Ok(FilterValue::Text(number.to_string())),
            _ => Err("expected a text value".to_string()),
        },
        OperandKind::Date => {
            let raw = expect_string(value, "a date")?;
            parse_calendar_date(raw)
                .map(FilterValue::Date)
                .map_err(|error| format!("{error:#}"))
        }
        OperandKind::DateTime => {
            let raw = expect_string(value, "a date-time")?;
            parse_date_time(raw)
                .map(FilterValue::DateTime)
                .map_err(|error| format!("{error:#}"))
        }
    }
}

fn expect_string<'v>(value: &'v Value, expected: &str) -> Result<&'v str, String> {
    value
        .as_str()
        .ok_or_else(|| format!("expected {expected} string, got `{value}`"))
}

fn parse_integer(value: &Value) -> Result<i64, String> {
    match value {
        Value::Number(number) => number
            .as_i64()
            .ok_or_else(|| format!("expected an integer, got `{number}`")),
        Value::String(text) => text
            .trim()
            .parse::<i64>()
            .map_err(|_| format!("expected an integer, got `{text}`")),
        other => Err(format!("expected an integer, got `{other}`")),
    }
}

fn parse_decimal(value: &Value) -> Result<f64, String> {
    let parsed = match value {
        Value::Number(number) => number.as_f64(),
        Value::String(text) => text.trim().parse::<f64>().ok(),
        _ => None,
    };
    parsed
        .filter(|number| number.is_finite())
        .ok_or_else(|| format!("expected a number, got `{value}`"))
}

fn parse_boolean(value: &Value) -> Result<bool, String> {
    match value {
        Value::Bool(flag) => Ok(*flag),
        Value::Number(number) => match number.as_i64() {
            Some(1) => Ok(true),
            Some(0) => Ok(false),
            _ => Err(format!("expected a boolean, got `{number}`")),
        },
        Value::String(text) => match text.trim().to_ascii_lowercase().as_str() {
            "true" | "1" | "yes" => Ok(true),
            "false" | "0" | "no" => Ok(false),
            _ => Err(format!("expected a boolean, got `{text}`")),
        },
        other => Err(format!("expected a boolean, got `{other}`")),
    }
}

fn resolve_aggregation(
    metadata: &RecordTypeMetadata,
    request: &AggregateRequest,
) -> Result<Aggregation, QueryValidationError> {
    let invalid = |aggregation: &str, parameter: &'static str| {
        QueryValidationError::InvalidAggregation {
            record_type: request.record_type.clone(),
            aggregation: aggregation.to_string(),
            parameter,
        }
    };

    let raw = request.aggregation.as_str();
    let (target, parameter) = if raw == COUNT_METRIC {
        return Ok(Aggregation::Count);
    } else if raw == "sum" {
        match request.sum_field.as_deref() {
            Some(field) if !field.is_empty() => (field, "sum_field"),
            _ => return Err(invalid("sum", "sum_field")),
        }
    } else if let Some(field) = raw.strip_prefix("sum:") {
        (field, "aggregation")
    } else if let Some(field) = raw.strip_prefix(SUM_METRIC_PREFIX) {
        (field, "aggregation")
    } else {
        return Err(invalid(raw, "aggregation"));
    };

    metadata
        .summable_field(target)
        .map(Aggregation::Sum)
        .ok_or_else(|| invalid(&format!("sum:{target}"), parameter))
}
