mod common;

use std::sync::Arc;

use casestats::query::{AggregateRequest, QueryError, QueryExecutor, QueryValidationError};
use casestats::registry::MetadataRegistry;
use casestats::telemetry::RecordingTelemetry;
use common::SpyStore;
use serde_json::{Value, json};

fn executor(telemetry: Arc<RecordingTelemetry>) -> QueryExecutor {
    QueryExecutor::new(Arc::new(MetadataRegistry::standard()), telemetry)
}

fn rejection(request: &AggregateRequest) -> QueryValidationError {
    let store = SpyStore::empty();
    let error = executor(RecordingTelemetry::shared())
        .run(&store, request)
        .expect_err("request should be rejected");
    assert_eq!(store.calls(), 0, "rejected requests must not reach the store");
    match error {
        QueryError::Validation(error) => error,
        QueryError::Store(error) => panic!("expected a validation error, got {error:#}"),
    }
}

#[test]
fn non_whitelisted_record_type_is_rejected() {
    for record_type in ["User", "consultation", "", "Consultation; DROP TABLE cases"] {
        let error = rejection(&AggregateRequest::count(record_type));
        assert_eq!(error.code(), "invalid_record_type");
        assert_eq!(error.field(), "record_type");
    }
}

#[test]
fn non_groupable_fields_are_rejected() {
    for field in ["notes", "duration", "case_id", "scheduled_at", "unknown"] {
        let error = rejection(&AggregateRequest::count("Consultation").grouped_by(field));
        assert_eq!(error.code(), "invalid_group_by", "group_by {field}");
        assert_eq!(error.field(), "group_by");
    }
}

#[test]
fn unknown_or_long_text_filter_fields_are_rejected() {
    let cases: [(&str, &str, Value); 3] = [
        ("Case", "notes__icontains", json!("police")),
        ("Case", "consultations", json!(1)),
        ("Request", "password", json!("x")),
    ];
    for (record_type, key, value) in cases {
        let error = rejection(&AggregateRequest::count(record_type).with_filter(key, value));
        assert_eq!(error.code(), "invalid_filter_field", "filter {key}");
        assert_eq!(error.field(), format!("filters.{key}"));
    }
}

#[test]
fn unsupported_lookups_are_rejected() {
    let cases: [(&str, Value); 5] = [
        ("duration__regex", json!("3")),
        ("type__gte", json!("phone")),
        ("duration__icontains", json!("3")),
        ("status__year", json!(2024)),
        ("scheduled_at__date__year", json!(2024)),
    ];
    for (key, value) in cases {
        let error = rejection(&AggregateRequest::count("Consultation").with_filter(key, value));
        assert_eq!(error.code(), "invalid_filter_operator", "filter {key}");
    }
}

#[test]
fn malformed_filter_values_are_rejected() {
    let cases: [(&str, &str, Value); 5] = [
        ("Case", "start_date__gte", json!("01.01.2024")),
        ("Case", "start_date", json!("2024-02-30")),
        ("Consultation", "duration__in", json!([])),
        ("Consultation", "duration__gt", json!([10, 20])),
        ("Request", "follow_up_required", json!("maybe")),
    ];
    for (record_type, key, value) in cases {
        let error = rejection(&AggregateRequest::count(record_type).with_filter(key, value));
        assert_eq!(error.code(), "invalid_filter_value", "filter {key}");
        assert!(error.is_value_error());
    }
}

#[test]
fn sums_require_an_advertised_numeric_field() {
    let missing = rejection(&AggregateRequest::count("Consultation").with_aggregation("sum"));
    assert_eq!(missing.code(), "invalid_aggregation");
    assert_eq!(missing.field(), "sum_field");

    let mut by_parameter = AggregateRequest::count("Request").with_aggregation("sum");
    by_parameter.sum_field = Some("staff_id".to_string());
    let external = rejection(&by_parameter);
    assert_eq!(external.field(), "sum_field");

    for aggregation in ["sum:id", "sum_notes", "sum:type", "avg", "max:duration"] {
        let error =
            rejection(&AggregateRequest::count("Consultation").with_aggregation(aggregation));
        assert_eq!(error.code(), "invalid_aggregation", "aggregation {aggregation}");
        assert_eq!(error.field(), "aggregation");
    }
}

#[test]
fn rejections_are_reported_to_telemetry() {
    let telemetry = RecordingTelemetry::shared();
    let store = SpyStore::empty();
    let result = executor(Arc::clone(&telemetry)).run(
        &store,
        &AggregateRequest::count("Consultation").grouped_by("notes"),
    );

    assert!(result.is_err());
    assert_eq!(telemetry.event_names(), vec!["query_rejected"]);
}
