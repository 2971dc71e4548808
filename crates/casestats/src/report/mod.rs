//! Fixed KPI report: scoped collections, the KPI catalogue, keyword
//! classifiers and the section visibility filter.

pub mod catalog;
pub mod classify;
pub mod kpis;
pub mod request;
pub mod scope;
pub mod visibility;

use std::sync::Arc;

use rusqlite::Connection;
use serde::Serialize;
use thiserror::Error;

pub use catalog::{KpiValue, REPORT_SECTIONS, ReportData, ReportStructure};
pub use kpis::KpiAggregator;
pub use request::{
    Facet, FacetValue, FilterDefinition, ReportParameters, ReportRequest, ReportRequestError,
    filter_catalog,
};
pub use visibility::apply_visibility;

use crate::telemetry::{Telemetry, TelemetryEvent};
use crate::utils::time::format_date;

#[derive(Debug, Error)]
pub enum ReportError {
    #[error(transparent)]
    Request(#[from] ReportRequestError),

    #[error(transparent)]
    Store(#[from] anyhow::Error),
}

/// Layout and values returned to the statistics page.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Report {
    pub structure: ReportStructure,
    pub data: ReportData,
}

#[derive(Clone)]
pub struct ReportEngine {
    aggregator: KpiAggregator,
    telemetry: Arc<dyn Telemetry>,
}

impl ReportEngine {
    #[must_use]
    pub fn new(telemetry: Arc<dyn Telemetry>) -> Self {
        Self {
            aggregator: KpiAggregator::new(Arc::clone(&telemetry)),
            telemetry,
        }
    }

    /// Request errors are raised before the store is read.
    pub fn run(&self, connection: &Connection, request: &ReportRequest) -> Result<Report, ReportError> {
        let parameters = request.resolve()?;
        let data = self.aggregator.compute(connection, &parameters)?;
        let structure = apply_visibility(ReportStructure::full(), &parameters.visible_sections);

        let period_start = parameters.period_start.map(format_date);
        let period_end = parameters.period_end.map(format_date);
        self.telemetry.record(&TelemetryEvent::ReportComputed {
            period_start: period_start.as_deref(),
            period_end: period_end.as_deref(),
            facets: parameters.facets.len(),
            kpis: data.len(),
        });

        Ok(Report { structure, data })
    }
}
