//! Metadata registry: which fields of each whitelisted record type may be
//! filtered on, grouped by, or summed.
//!
//! Built once from the static field table. The query validator consults the
//! same instance, so everything advertised here is accepted there and nothing
//! else is.

use serde::Serialize;
use serde::ser::{SerializeMap, Serializer};

use crate::models::{Choice, FieldKind, FieldSpec, RecordType};
use crate::telemetry::{Telemetry, TelemetryEvent};

pub const COUNT_METRIC: &str = "count";
pub const SUM_METRIC_PREFIX: &str = "sum_";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DisplayKind {
    Date,
    Boolean,
    Number,
    Select,
    Text,
}

impl DisplayKind {
    #[must_use]
    pub fn of(field: &FieldSpec) -> Self {
        match field.kind {
            FieldKind::Date | FieldKind::DateTime => Self::Date,
            FieldKind::Boolean => Self::Boolean,
            kind if kind.is_numeric() => Self::Number,
            FieldKind::ShortText if field.choices.is_some() => Self::Select,
            _ => Self::Text,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct FieldDescriptor {
    pub name: &'static str,
    pub label: &'static str,
    #[serde(rename = "type")]
    pub display: DisplayKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub choices: Option<&'static [Choice]>,
    #[serde(skip)]
    pub spec: &'static FieldSpec,
}

impl FieldDescriptor {
    fn from_spec(spec: &'static FieldSpec) -> Self {
        Self {
            name: spec.name,
            label: spec.label,
            display: DisplayKind::of(spec),
            choices: spec.choices,
            spec,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct MetricDescriptor {
    pub name: String,
    pub label: String,
    #[serde(skip)]
    pub sum_field: Option<&'static FieldSpec>,
}

#[derive(Debug, Clone, Serialize)]
pub struct RecordTypeMetadata {
    pub record_type: RecordType,
    pub label: &'static str,
    pub label_plural: &'static str,
    pub filterable_fields: Vec<FieldDescriptor>,
    pub groupable_fields: Vec<FieldDescriptor>,
    pub metrics: Vec<MetricDescriptor>,
}

impl RecordTypeMetadata {
    fn describe(record_type: RecordType) -> Self {
        let mut filterable_fields = Vec::new();
        let mut groupable_fields = Vec::new();
        let mut metrics = vec![MetricDescriptor {
            name: COUNT_METRIC.to_string(),
            label: "Count".to_string(),
            sum_field: None,
        }];

        for spec in record_type.fields() {
            if is_filterable(spec) {
                filterable_fields.push(FieldDescriptor::from_spec(spec));
            }
            if is_groupable(spec) {
                groupable_fields.push(FieldDescriptor::from_spec(spec));
            }
            if is_summable(spec) {
                metrics.push(MetricDescriptor {
                    name: format!("{SUM_METRIC_PREFIX}{}", spec.name),
                    label: format!("Sum {}", spec.label),
                    sum_field: Some(spec),
                });
            }
        }

        Self {
            record_type,
            label: record_type.label(),
            label_plural: record_type.label_plural(),
            filterable_fields,
            groupable_fields,
            metrics,
        }
    }

    /// Whitelisted filter field: the union of filterable and groupable fields.
    #[must_use]
    pub fn filter_field(&self, name: &str) -> Option<&'static FieldSpec> {
        self.filterable_fields
            .iter()
            .chain(self.groupable_fields.iter())
            .find(|descriptor| descriptor.name == name)
            .map(|descriptor| descriptor.spec)
    }

    #[must_use]
    pub fn group_field(&self, name: &str) -> Option<&'static FieldSpec> {
        self.groupable_fields
            .iter()
            .find(|descriptor| descriptor.name == name)
            .map(|descriptor| descriptor.spec)
    }

    /// Field behind an advertised `sum_<field>` metric.
    #[must_use]
    pub fn summable_field(&self, name: &str) -> Option<&'static FieldSpec> {
        self.metrics
            .iter()
            .filter_map(|metric| metric.sum_field)
            .find(|spec| spec.name == name)
    }
}

fn is_filterable(spec: &FieldSpec) -> bool {
    !matches!(
        spec.kind,
        FieldKind::LongText | FieldKind::ReverseRelation(_)
    )
}

fn is_groupable(spec: &FieldSpec) -> bool {
    spec.choices.is_some()
        && matches!(
            spec.kind,
            FieldKind::ShortText | FieldKind::Integer | FieldKind::Boolean
        )
}

fn is_summable(spec: &FieldSpec) -> bool {
    matches!(spec.kind, FieldKind::Integer | FieldKind::Decimal)
}

#[derive(Debug, Clone)]
pub struct MetadataRegistry {
    entries: Vec<RecordTypeMetadata>,
}

impl MetadataRegistry {
    /// Registry over every analyzable record type.
    #[must_use]
    pub fn standard() -> Self {
        Self {
            entries: RecordType::ALL
                .into_iter()
                .map(RecordTypeMetadata::describe)
                .collect(),
        }
    }

    /// Registry restricted to the named record types. Names that are not
    /// whitelisted are reported to telemetry and left out.
    pub fn for_record_types<'a>(
        names: impl IntoIterator<Item = &'a str>,
        telemetry: &dyn Telemetry,
    ) -> Self {
        let mut entries: Vec<RecordTypeMetadata> = Vec::new();
        for name in names {
            let Some(record_type) = RecordType::from_name(name) else {
                telemetry.record(&TelemetryEvent::RegistryTypeMissing { record_type: name });
                continue;
            };
            if entries.iter().any(|entry| entry.record_type == record_type) {
                continue;
            }
            entries.push(RecordTypeMetadata::describe(record_type));
        }
        Self { entries }
    }

    #[must_use]
    pub fn get(&self, record_type: RecordType) -> Option<&RecordTypeMetadata> {
        self.entries
            .iter()
            .find(|entry| entry.record_type == record_type)
    }

    #[must_use]
    pub fn lookup(&self, name: &str) -> Option<&RecordTypeMetadata> {
        RecordType::from_name(name).and_then(|record_type| self.get(record_type))
    }

    pub fn entries(&self) -> impl Iterator<Item = &RecordTypeMetadata> {
        self.entries.iter()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Default for MetadataRegistry {
    fn default() -> Self {
        Self::standard()
    }
}

/// Serializes as a map from record-type name to its metadata.
impl Serialize for MetadataRegistry {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for entry in &self.entries {
            map.serialize_entry(entry.record_type.as_str(), entry)?;
        }
        map.end()
    }
}

#[cfg(test)]
mod tests {
    use super::{DisplayKind, MetadataRegistry};
    use crate::models::RecordType;
    use crate::telemetry::RecordingTelemetry;

    #[test]
    fn long_text_and_reverse_relations_are_never_advertised() {
        let registry = MetadataRegistry::standard();
        let case = registry.get(RecordType::Case).expect("case metadata");

        let names = case
            .filterable_fields
            .iter()
            .map(|field| field.name)
            .collect::<Vec<_>>();
        assert!(!names.contains(&"notes"));
        assert!(!names.contains(&"consultations"));
        assert!(names.contains(&"client_id"));
        assert!(names.contains(&"start_date"));
    }

    #[test]
    fn primary_keys_and_references_are_not_summable() {
        let registry = MetadataRegistry::standard();
        let consultation = registry
            .get(RecordType::Consultation)
            .expect("consultation metadata");

        let metric_names = consultation
            .metrics
            .iter()
            .map(|metric| metric.name.as_str())
            .collect::<Vec<_>>();
        assert_eq!(
            metric_names,
            vec![
                "count",
                "sum_duration",
                "sum_interpreter_hours",
                "sum_session_count"
            ]
        );
        assert!(consultation.summable_field("id").is_none());
        assert!(consultation.summable_field("case_id").is_none());
        assert!(consultation.summable_field("counselor_id").is_none());
    }

    #[test]
    fn display_kinds_follow_field_kinds() {
        let registry = MetadataRegistry::standard();
        let consultation = registry
            .get(RecordType::Consultation)
            .expect("consultation metadata");

        let kind_of = |name: &str| {
            consultation
                .filterable_fields
                .iter()
                .find(|field| field.name == name)
                .map(|field| field.display)
        };
        assert_eq!(kind_of("scheduled_at"), Some(DisplayKind::Date));
        assert_eq!(kind_of("type"), Some(DisplayKind::Select));
        assert_eq!(kind_of("duration"), Some(DisplayKind::Number));
        assert_eq!(kind_of("case_id"), Some(DisplayKind::Number));
        assert_eq!(kind_of("id"), Some(DisplayKind::Number));
        assert_eq!(kind_of("interpreter_hours"), Some(DisplayKind::Number));
        assert_eq!(kind_of("counseling_office"), Some(DisplayKind::Select));
    }

    #[test]
    fn unknown_record_types_are_omitted_and_reported() {
        let telemetry = RecordingTelemetry::shared();
        let registry = MetadataRegistry::for_record_types(
            ["Consultation", "Staff", "Consultation", "Client"],
            telemetry.as_ref(),
        );

        assert_eq!(registry.len(), 2);
        assert!(registry.lookup("Staff").is_none());
        assert!(registry.lookup("Client").is_some());
        assert_eq!(telemetry.event_names(), vec!["registry_type_missing"]);
    }
}
