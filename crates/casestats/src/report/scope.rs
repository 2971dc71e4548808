//! Scoped collections for one report pass.
//!
//! Every KPI statement is prefixed with the same `WITH` clause, so all of them
//! read the same narrowed collections:
//!
//! - `scoped_cases`: start date in period, case-status and client-residence facets
//! - `scoped_consultations`: occurred, scheduled in period, case in scope
//! - `scoped_accompaniments`: dated in period, case in scope
//! - `scoped_incidents`: case in scope, incident facets
//! - `scoped_consequences`: incident in scope, consequence facets
//! - `scoped_clients`: clients of scoped cases
//! - `scoped_requests`: request date in period, request facets

use anyhow::{Context, Result};
use rusqlite::types::{ToSql, Value as SqlValue};
use rusqlite::{Connection, Row};

use super::request::{Facet, FacetTarget, ReportParameters};
use crate::utils::time::format_date;

const PERIOD_START_PARAM: &str = ":period_start";
const PERIOD_END_PARAM: &str = ":period_end";

#[derive(Debug, Clone, PartialEq)]
pub struct ReportScope {
    prefix: String,
    params: Vec<(String, SqlValue)>,
}

impl ReportScope {
    #[must_use]
    pub fn build(parameters: &ReportParameters) -> Self {
        let mut params = vec![
            (
                PERIOD_START_PARAM.to_string(),
                parameters
                    .period_start
                    .map_or(SqlValue::Null, |date| SqlValue::Text(format_date(date))),
            ),
            (
                PERIOD_END_PARAM.to_string(),
                parameters
                    .period_end
                    .map_or(SqlValue::Null, |date| SqlValue::Text(format_date(date))),
            ),
        ];

        let mut facet_conditions = |target: FacetTarget| -> String {
            let mut sql = String::new();
            for facet in Facet::ALL.into_iter().filter(|facet| facet.target() == target) {
                let values = parameters.facet_values(facet);
                if values.is_empty() {
                    continue;
                }
                let placeholders = values
                    .iter()
                    .enumerate()
                    .map(|(index, value)| {
                        let name = format!(":facet_{}_{index}", facet.key());
                        params.push((name.clone(), SqlValue::Text(value.clone())));
                        name
                    })
                    .collect::<Vec<_>>()
                    .join(", ");
                sql.push_str(&format!("\n      AND {} IN ({placeholders})", facet.column()));
            }
            sql
        };

        let case_facets = facet_conditions(FacetTarget::Cases);
        let client_facets = facet_conditions(FacetTarget::Clients);
        let consultation_facets = facet_conditions(FacetTarget::Consultations);
        let incident_facets = facet_conditions(FacetTarget::ViolenceIncidents);
        let consequence_facets = facet_conditions(FacetTarget::ViolenceConsequences);
        let request_facets = facet_conditions(FacetTarget::Requests);

        let prefix = format!(
            r#"WITH
scoped_cases AS (
    SELECT c.id, c.client_id
    FROM cases c
    LEFT JOIN clients cl ON cl.id = c.client_id
    WHERE ({PERIOD_START_PARAM} IS NULL OR c.start_date >= {PERIOD_START_PARAM})
      AND ({PERIOD_END_PARAM} IS NULL OR c.start_date <= {PERIOD_END_PARAM}){case_facets}{client_facets}
),
scoped_consultations AS (
    SELECT co.*
    FROM consultations co
    WHERE co.status = 'occurred'
      AND co.case_id IN (SELECT id FROM scoped_cases)
      AND ({PERIOD_START_PARAM} IS NULL OR date(co.scheduled_at) >= {PERIOD_START_PARAM})
      AND ({PERIOD_END_PARAM} IS NULL OR date(co.scheduled_at) <= {PERIOD_END_PARAM}){consultation_facets}
),
scoped_accompaniments AS (
    SELECT a.*
    FROM accompaniments a
    WHERE a.case_id IN (SELECT id FROM scoped_cases)
      AND ({PERIOD_START_PARAM} IS NULL OR a."date" >= {PERIOD_START_PARAM})
      AND ({PERIOD_END_PARAM} IS NULL OR a."date" <= {PERIOD_END_PARAM})
),
scoped_incidents AS (
    SELECT vi.*
    FROM violence_incidents vi
    WHERE vi.case_id IN (SELECT id FROM scoped_cases){incident_facets}
),
scoped_consequences AS (
    SELECT vc.*
    FROM violence_consequences vc
    WHERE vc.incident_id IN (SELECT id FROM scoped_incidents){consequence_facets}
),
scoped_clients AS (
    SELECT cl.*
    FROM clients cl
    WHERE cl.id IN (SELECT client_id FROM scoped_cases)
),
scoped_requests AS (
    SELECT r.*
    FROM requests r
    WHERE ({PERIOD_START_PARAM} IS NULL OR r.request_date >= {PERIOD_START_PARAM})
      AND ({PERIOD_END_PARAM} IS NULL OR r.request_date <= {PERIOD_END_PARAM}){request_facets}
)
"#
        );

        Self { prefix, params }
    }

    #[must_use]
    pub fn sql(&self, body: &str) -> String {
        format!("{}{body}", self.prefix)
    }

    fn bound(&self) -> Vec<(&str, &dyn ToSql)> {
        self.params
            .iter()
            .map(|(name, value)| (name.as_str(), value as &dyn ToSql))
            .collect()
    }

    /// Runs a single-row statement over the scoped collections.
    pub fn query_row<T>(
        &self,
        connection: &Connection,
        body: &str,
        map: impl FnOnce(&Row<'_>) -> rusqlite::Result<T>,
    ) -> Result<T> {
        let sql = self.sql(body);
        let mut statement = connection
            .prepare(&sql)
            .with_context(|| format!("failed to prepare report statement: {body}"))?;
        statement
            .query_row(self.bound().as_slice(), map)
            .with_context(|| format!("failed to run report statement: {body}"))
    }

    /// Runs a multi-row statement over the scoped collections.
    pub fn query_rows<T>(
        &self,
        connection: &Connection,
        body: &str,
        mut map: impl FnMut(&Row<'_>) -> rusqlite::Result<T>,
    ) -> Result<Vec<T>> {
        let sql = self.sql(body);
        let mut statement = connection
            .prepare(&sql)
            .with_context(|| format!("failed to prepare report statement: {body}"))?;
        let rows = statement
            .query_map(self.bound().as_slice(), |row| map(row))
            .with_context(|| format!("failed to run report statement: {body}"))?;
        rows.map(|row| row.context("failed to decode report row"))
            .collect()
    }
}
