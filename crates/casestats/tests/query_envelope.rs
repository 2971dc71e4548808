use casestats::models::{
    FailureKind, QUERY_ENVELOPE_SCHEMA_VERSION, QueryEnvelope, QueryEnvelopeCommandFailure,
};
use serde_json::json;

#[test]
fn ok_envelope_tracks_contract_fields() {
    let envelope = QueryEnvelope::ok(
        "query",
        json!({
            "record_type": "Consultation",
            "results": [{"type": "phone", "label": "Phone", "value": 3}]
        }),
    )
    .with_meta("group_count", json!(1))
    .with_warning("unknown_record_type", "some record types are not available")
    .with_warning_details(json!({"record_types": ["Staff"]}));

    assert!(envelope.ok);
    assert_eq!(envelope.command, "query");
    assert!(envelope.generated_at_utc.ends_with('Z'));
    assert!(envelope.data.is_some());
    assert_eq!(
        envelope.meta.get("schema_version"),
        Some(&json!(QUERY_ENVELOPE_SCHEMA_VERSION))
    );
    assert_eq!(envelope.meta.get("group_count"), Some(&json!(1)));
    assert_eq!(envelope.warnings.len(), 1);
    assert_eq!(envelope.warnings[0].code, "unknown_record_type");
    assert_eq!(
        envelope.warnings[0].details.as_ref(),
        Some(&json!({"record_types": ["Staff"]}))
    );
    assert!(envelope.error.is_none());
}

#[test]
fn ok_envelope_serializes_required_top_level_fields() {
    let envelope = QueryEnvelope::ok("filters", json!({"filters": []}));
    let encoded = serde_json::to_value(&envelope).expect("envelope should serialize");

    let object = encoded
        .as_object()
        .expect("envelope JSON should be an object");
    assert_eq!(object.get("ok"), Some(&json!(true)));
    assert_eq!(object.get("command"), Some(&json!("filters")));
    assert!(object.contains_key("generated_at_utc"));
    assert!(object.contains_key("data"));
    assert!(object.contains_key("meta"));
    assert!(object.contains_key("warnings"));
    assert!(!object.contains_key("error"));
}

#[test]
fn error_envelope_carries_code_and_field() {
    let envelope = QueryEnvelope::error(
        "query",
        "invalid_group_by",
        "field `notes` cannot be used for grouping Case",
    )
    .with_error_details(json!({"field": "group_by"}));

    assert!(!envelope.ok);
    assert!(envelope.data.is_none());
    let encoded = serde_json::to_value(&envelope).expect("envelope should serialize");
    assert_eq!(
        encoded.pointer("/error/code").and_then(|value| value.as_str()),
        Some("invalid_group_by")
    );
    assert_eq!(
        encoded
            .pointer("/error/details/field")
            .and_then(|value| value.as_str()),
        Some("group_by")
    );
}

#[test]
fn command_failure_display_is_json_envelope() {
    let failure = QueryEnvelopeCommandFailure::runtime(QueryEnvelope::error(
        "report",
        "store_unavailable",
        "unable to open case store",
    ));
    assert_eq!(failure.kind(), FailureKind::Runtime);

    let parsed: serde_json::Value =
        serde_json::from_str(&failure.to_string()).expect("display output should be JSON");
    assert_eq!(parsed.get("ok").and_then(|value| value.as_bool()), Some(false));
    assert_eq!(
        parsed.pointer("/error/code").and_then(|value| value.as_str()),
        Some("store_unavailable")
    );
}

#[test]
fn validation_failures_keep_their_kind() {
    let failure = QueryEnvelopeCommandFailure::validation(QueryEnvelope::error(
        "report",
        "invalid_date",
        "`zeitraum_start` must be a date",
    ));
    assert_eq!(failure.kind(), FailureKind::Validation);
    assert_eq!(failure.envelope().command, "report");
}
