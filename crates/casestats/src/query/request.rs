use std::collections::BTreeMap;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Ad-hoc aggregation request as sent by the web layer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(deny_unknown_fields)]
pub struct AggregateRequest {
    #[serde(alias = "base_model")]
    pub record_type: String,

    /// Keys are `<field>[__<lookup>]`; values are scalars or, for `in`, lists.
    #[serde(default)]
    pub filters: BTreeMap<String, Value>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub group_by: Option<String>,

    /// `count`, `sum` (with `sum_field`), `sum:<field>` or `sum_<field>`.
    #[serde(default = "default_aggregation", alias = "metric")]
    pub aggregation: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sum_field: Option<String>,
}

fn default_aggregation() -> String {
    "count".to_string()
}

impl AggregateRequest {
    #[must_use]
    pub fn count(record_type: impl Into<String>) -> Self {
        Self {
            record_type: record_type.into(),
            filters: BTreeMap::new(),
            group_by: None,
            aggregation: default_aggregation(),
            sum_field: None,
        }
    }

    #[must_use]
    pub fn grouped_by(mut self, field: impl Into<String>) -> Self {
        self.group_by = Some(field.into());
        self
    }

    #[must_use]
    pub fn with_filter(mut self, key: impl Into<String>, value: Value) -> Self {
        self.filters.insert(key.into(), value);
        self
    }

    #[must_use]
    pub fn with_aggregation(mut self, aggregation: impl Into<String>) -> Self {
        self.aggregation = aggregation.into();
        self
    }
}

#[must_use]
pub fn json_schema() -> Value {
    schemars::schema_for!(AggregateRequest).to_value()
}
