use thiserror::Error;

/// Caller-facing rejection of an ad-hoc query. Raised before any storage access.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum QueryValidationError {
    #[error("record type `{record_type}` is not available for statistics")]
    InvalidRecordType { record_type: String },

    #[error("field `{group_by}` cannot be used for grouping {record_type}")]
    InvalidGroupBy {
        record_type: String,
        group_by: String,
    },

    #[error("filter field `{field}` is not allowed for {record_type}")]
    InvalidFilterField {
        record_type: String,
        filter: String,
        field: String,
    },

    #[error("filter `{filter}` uses unsupported lookup `{operator}`: {reason}")]
    InvalidFilterOperator {
        filter: String,
        operator: String,
        reason: &'static str,
    },

    #[error("aggregation `{aggregation}` is not available for {record_type}")]
    InvalidAggregation {
        record_type: String,
        aggregation: String,
        parameter: &'static str,
    },

    #[error("filter `{filter}` has an invalid value: {reason}")]
    InvalidFilterValue { filter: String, reason: String },
}

impl QueryValidationError {
    #[must_use]
    pub const fn code(&self) -> &'static str {
        match self {
            Self::InvalidRecordType { .. } => "invalid_record_type",
            Self::InvalidGroupBy { .. } => "invalid_group_by",
            Self::InvalidFilterField { .. } => "invalid_filter_field",
            Self::InvalidFilterOperator { .. } => "invalid_filter_operator",
            Self::InvalidAggregation { .. } => "invalid_aggregation",
            Self::InvalidFilterValue { .. } => "invalid_filter_value",
        }
    }

    /// Request parameter the error refers to, e.g. `group_by` or `filters.age__gte`.
    #[must_use]
    pub fn field(&self) -> String {
        match self {
            Self::InvalidRecordType { .. } => "record_type".to_string(),
            Self::InvalidGroupBy { .. } => "group_by".to_string(),
            Self::InvalidFilterField { filter, .. }
            | Self::InvalidFilterOperator { filter, .. }
            | Self::InvalidFilterValue { filter, .. } => format!("filters.{filter}"),
            Self::InvalidAggregation { parameter, .. } => (*parameter).to_string(),
        }
    }

    #[must_use]
    pub const fn is_value_error(&self) -> bool {
        matches!(self, Self::InvalidFilterValue { .. })
    }
}

#[derive(Debug, Error)]
pub enum QueryError {
    #[error(transparent)]
    Validation(#[from] QueryValidationError),

    /// Storage failures are not input problems and propagate unchanged.
    #[error(transparent)]
    Store(#[from] anyhow::Error),
}

#[cfg(test)]
mod tests {
    use super::QueryValidationError;

    #[test]
    fn filter_errors_point_at_the_filter_key() {
        let error = QueryValidationError::InvalidFilterOperator {
            filter: "age__regex".to_string(),
            operator: "regex".to_string(),
            reason: "not an allowed lookup",
        };
        assert_eq!(error.code(), "invalid_filter_operator");
        assert_eq!(error.field(), "filters.age__regex");
        assert!(error.to_string().contains("`regex`"));
    }

    #[test]
    fn only_value_errors_are_value_errors() {
        let value = QueryValidationError::InvalidFilterValue {
            filter: "start_date__gte".to_string(),
            reason: "expected a date".to_string(),
        };
        let record_type = QueryValidationError::InvalidRecordType {
            record_type: "User".to_string(),
        };
        assert!(value.is_value_error());
        assert!(!record_type.is_value_error());
    }
}
