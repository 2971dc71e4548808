//! Injected logging interface.
//!
//! Components receive an `Arc<dyn Telemetry>` at construction and never reach
//! for a global logger. The binary wires [`TracingTelemetry`]; embedders that
//! do their own logging can pass [`NoopTelemetry`].

use std::sync::{Arc, Mutex};

#[derive(Debug, Clone, PartialEq)]
pub enum TelemetryEvent<'a> {
    /// A record type was requested from the registry but is not whitelisted.
    RegistryTypeMissing { record_type: &'a str },
    QueryRejected {
        record_type: &'a str,
        code: &'static str,
        field: &'a str,
    },
    QueryExecuted {
        record_type: &'a str,
        group_by: Option<&'a str>,
        aggregation: &'a str,
        groups: usize,
    },
    ReportComputed {
        period_start: Option<&'a str>,
        period_end: Option<&'a str>,
        facets: usize,
        kpis: usize,
    },
    /// Records in scope whose expected counterpart is missing; they contribute zero.
    IncompleteRecords {
        collection: &'static str,
        missing: &'static str,
        count: i64,
    },
}

impl TelemetryEvent<'_> {
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::RegistryTypeMissing { .. } => "registry_type_missing",
            Self::QueryRejected { .. } => "query_rejected",
            Self::QueryExecuted { .. } => "query_executed",
            Self::ReportComputed { .. } => "report_computed",
            Self::IncompleteRecords { .. } => "incomplete_records",
        }
    }
}

pub trait Telemetry: Send + Sync {
    fn record(&self, event: &TelemetryEvent<'_>);
}

#[derive(Debug, Default, Clone, Copy)]
pub struct TracingTelemetry;

impl Telemetry for TracingTelemetry {
    fn record(&self, event: &TelemetryEvent<'_>) {
        match event {
            TelemetryEvent::RegistryTypeMissing { record_type } => {
                tracing::warn!(record_type, "record type is not whitelisted; omitted");
            }
            TelemetryEvent::QueryRejected {
                record_type,
                code,
                field,
            } => {
                tracing::info!(record_type, code, field, "ad-hoc query rejected");
            }
            TelemetryEvent::QueryExecuted {
                record_type,
                group_by,
                aggregation,
                groups,
            } => {
                tracing::debug!(
                    record_type,
                    group_by = group_by.unwrap_or("-"),
                    aggregation,
                    groups,
                    "ad-hoc query executed"
                );
            }
            TelemetryEvent::ReportComputed {
                period_start,
                period_end,
                facets,
                kpis,
            } => {
                tracing::info!(
                    period_start = period_start.unwrap_or("-"),
                    period_end = period_end.unwrap_or("-"),
                    facets,
                    kpis,
                    "kpi report computed"
                );
            }
            TelemetryEvent::IncompleteRecords {
                collection,
                missing,
                count,
            } => {
                tracing::warn!(
                    collection,
                    missing,
                    count,
                    "records without counterpart contribute zero"
                );
            }
        }
    }
}

#[derive(Debug, Default, Clone, Copy)]
pub struct NoopTelemetry;

impl Telemetry for NoopTelemetry {
    fn record(&self, _event: &TelemetryEvent<'_>) {}
}

/// Keeps event names in memory; used by tests to assert on emitted telemetry.
#[derive(Debug, Default)]
pub struct RecordingTelemetry {
    events: Mutex<Vec<String>>,
}

impl RecordingTelemetry {
    #[must_use]
    pub fn shared() -> Arc<Self> {
        Arc::new(Self::default())
    }

    #[must_use]
    pub fn event_names(&self) -> Vec<String> {
        self.events
            .lock()
            .map(|events| events.clone())
            .unwrap_or_default()
    }
}

impl Telemetry for RecordingTelemetry {
    fn record(&self, event: &TelemetryEvent<'_>) {
        if let Ok(mut events) = self.events.lock() {
            events.push(event.name().to_string());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{RecordingTelemetry, Telemetry, TelemetryEvent};

    #[test]
    fn recording_telemetry_keeps_event_order() {
        let telemetry = RecordingTelemetry::shared();
        telemetry.record(&TelemetryEvent::RegistryTypeMissing {
            record_type: "Staff",
        });
        telemetry.record(&TelemetryEvent::IncompleteRecords {
            collection: "violence_incidents",
            missing: "violence_consequence",
            count: 2,
        });

        assert_eq!(
            telemetry.event_names(),
            vec!["registry_type_missing", "incomplete_records"]
        );
    }
}
