use std::collections::BTreeMap;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;
use time::Date;

use crate::models::{Choice, ChoiceDomain, choices};
use crate::utils::time::parse_calendar_date;

pub const PERIOD_START_KEY: &str = "zeitraum_start";
pub const PERIOD_END_KEY: &str = "zeitraum_ende";

/// Facet value: one code or a list meaning "any of".
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(untagged)]
pub enum FacetValue {
    One(String),
    Many(Vec<String>),
}

impl FacetValue {
    fn into_codes(self) -> Vec<String> {
        let codes = match self {
            Self::One(code) => vec![code],
            Self::Many(codes) => codes,
        };
        codes
            .into_iter()
            .map(|code| code.trim().to_string())
            .filter(|code| !code.is_empty())
            .collect()
    }
}

/// Fixed-report request as posted by the statistics page.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct ReportRequest {
    #[serde(
        default,
        rename = "zeitraum_start",
        alias = "period_start",
        skip_serializing_if = "Option::is_none"
    )]
    pub period_start: Option<String>,

    #[serde(
        default,
        rename = "zeitraum_ende",
        alias = "period_end",
        skip_serializing_if = "Option::is_none"
    )]
    pub period_end: Option<String>,

    /// Section or subsection key to visibility; absent keys are visible.
    #[serde(
        default,
        rename = "_visible_sections",
        skip_serializing_if = "BTreeMap::is_empty"
    )]
    pub visible_sections: BTreeMap<String, bool>,

    #[serde(flatten)]
    pub facets: BTreeMap<String, Option<FacetValue>>,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ReportRequestError {
    #[error("`{field}` must be a date formatted as YYYY-MM-DD, got `{value}`")]
    InvalidDate { field: &'static str, value: String },

    #[error("unknown report filter `{name}`")]
    UnknownFacet { name: String },
}

impl ReportRequestError {
    #[must_use]
    pub const fn code(&self) -> &'static str {
        match self {
            Self::InvalidDate { .. } => "invalid_date",
            Self::UnknownFacet { .. } => "unknown_filter",
        }
    }

    #[must_use]
    pub fn field(&self) -> &str {
        match self {
            Self::InvalidDate { field, .. } => field,
            Self::UnknownFacet { name } => name,
        }
    }
}

/// Collection a facet restricts first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum FacetTarget {
    Requests,
    Cases,
    Clients,
    Consultations,
    ViolenceIncidents,
    ViolenceConsequences,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Facet {
    RequestLocation,
    Requester,
    RequestKind,
    CaseStatus,
    ClientResidence,
    CounselingOffice,
    ConsultationType,
    ViolenceLocation,
    ReportFiled,
    PsychologicalConsequences,
    PhysicalConsequences,
}

impl Facet {
    pub const ALL: [Self; 11] = [
        Self::RequestLocation,
        Self::Requester,
        Self::RequestKind,
        Self::CaseStatus,
        Self::ClientResidence,
        Self::CounselingOffice,
        Self::ConsultationType,
        Self::ViolenceLocation,
        Self::ReportFiled,
        Self::PsychologicalConsequences,
        Self::PhysicalConsequences,
    ];

    #[must_use]
    pub const fn key(self) -> &'static str {
        match self {
            Self::RequestLocation => "request_location",
            Self::Requester => "requester",
            Self::RequestKind => "request_kind",
            Self::CaseStatus => "case_status",
            Self::ClientResidence => "client_residence",
            Self::CounselingOffice => "counseling_office",
            Self::ConsultationType => "consultation_type",
            Self::ViolenceLocation => "violence_location",
            Self::ReportFiled => "report_filed",
            Self::PsychologicalConsequences => "psychological_consequences",
            Self::PhysicalConsequences => "physical_consequences",
        }
    }

    /// Name used by older statistics clients.
    #[must_use]
    pub const fn legacy_key(self) -> Option<&'static str> {
        match self {
            Self::RequestLocation => Some("anfrage_ort"),
            Self::Requester => Some("anfrage_person"),
            Self::RequestKind => Some("anfrage_art"),
            Self::CounselingOffice => Some("beratungsstelle"),
            Self::ConsultationType => Some("beratungsart"),
            Self::ViolenceLocation => Some("tatort"),
            Self::ReportFiled => Some("anzeige"),
            Self::PsychologicalConsequences => Some("psychische_folgen"),
            Self::PhysicalConsequences => Some("koerperliche_folgen"),
            Self::CaseStatus | Self::ClientResidence => None,
        }
    }

    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|facet| facet.key() == name || facet.legacy_key() == Some(name))
    }

    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::RequestLocation => "Request location",
            Self::Requester => "Requesting person",
            Self::RequestKind => "Request kind",
            Self::CaseStatus => "Case status",
            Self::ClientResidence => "Client residence",
            Self::CounselingOffice => "Counseling office",
            Self::ConsultationType => "Counseling format",
            Self::ViolenceLocation => "Crime scene",
            Self::ReportFiled => "Report filed",
            Self::PsychologicalConsequences => "Psychological consequences",
            Self::PhysicalConsequences => "Physical consequences",
        }
    }

    #[must_use]
    pub const fn choices(self) -> ChoiceDomain {
        match self {
            Self::RequestLocation | Self::ClientResidence => choices::LOCATION,
            Self::Requester => choices::REQUESTER,
            Self::RequestKind => choices::REQUEST_KIND,
            Self::CaseStatus => choices::CASE_STATUS,
            Self::CounselingOffice => choices::COUNSELING_OFFICE,
            Self::ConsultationType => choices::CONSULTATION_TYPE,
            Self::ViolenceLocation => choices::CRIME_SCENE,
            Self::ReportFiled => choices::REPORT_FILED,
            Self::PsychologicalConsequences => choices::PSYCHOLOGICAL_CONSEQUENCE,
            Self::PhysicalConsequences => choices::PHYSICAL_CONSEQUENCE,
        }
    }

    #[must_use]
    pub const fn target(self) -> FacetTarget {
        match self {
            Self::RequestLocation | Self::Requester | Self::RequestKind => FacetTarget::Requests,
            Self::CaseStatus => FacetTarget::Cases,
            Self::ClientResidence => FacetTarget::Clients,
            Self::CounselingOffice | Self::ConsultationType => FacetTarget::Consultations,
            Self::ViolenceLocation | Self::ReportFiled => FacetTarget::ViolenceIncidents,
            Self::PsychologicalConsequences | Self::PhysicalConsequences => {
                FacetTarget::ViolenceConsequences
            }
        }
    }

    /// Column restricted by this facet, qualified by the scope alias.
    #[must_use]
    pub const fn column(self) -> &'static str {
        match self {
            Self::RequestLocation => "r.location",
            Self::Requester => "r.requester",
            Self::RequestKind => "r.request_kind",
            Self::CaseStatus => "c.status",
            Self::ClientResidence => "cl.residence",
            Self::CounselingOffice => "co.counseling_office",
            Self::ConsultationType => "co.\"type\"",
            Self::ViolenceLocation => "vi.location",
            Self::ReportFiled => "vi.report_filed",
            Self::PsychologicalConsequences => "vc.psychological",
            Self::PhysicalConsequences => "vc.physical",
        }
    }
}

/// Parsed and checked report request.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReportParameters {
    pub period_start: Option<Date>,
    pub period_end: Option<Date>,
    pub facets: BTreeMap<Facet, Vec<String>>,
    pub visible_sections: BTreeMap<String, bool>,
}

impl ReportParameters {
    #[must_use]
    pub fn facet_values(&self, facet: Facet) -> &[String] {
        self.facets
            .get(&facet)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }
}

impl ReportRequest {
    pub fn from_json(value: Value) -> serde_json::Result<Self> {
        serde_json::from_value(value)
    }

    #[must_use]
    pub fn with_period(mut self, start: Option<&str>, end: Option<&str>) -> Self {
        self.period_start = start.map(str::to_string);
        self.period_end = end.map(str::to_string);
        self
    }

    #[must_use]
    pub fn with_facet(mut self, name: impl Into<String>, value: FacetValue) -> Self {
        self.facets.insert(name.into(), Some(value));
        self
    }

    #[must_use]
    pub fn with_visibility(mut self, key: impl Into<String>, visible: bool) -> Self {
        self.visible_sections.insert(key.into(), visible);
        self
    }

    /// Checks dates and facet names. Empty dates and empty facet values are
    /// treated as absent; values given under two aliases are merged.
    pub fn resolve(&self) -> Result<ReportParameters, ReportRequestError> {
        let period_start = parse_period(PERIOD_START_KEY, self.period_start.as_deref())?;
        let period_end = parse_period(PERIOD_END_KEY, self.period_end.as_deref())?;

        let mut facets: BTreeMap<Facet, Vec<String>> = BTreeMap::new();
        for (name, value) in &self.facets {
            let facet = Facet::from_name(name)
                .ok_or_else(|| ReportRequestError::UnknownFacet { name: name.clone() })?;
            let codes = value.clone().map(FacetValue::into_codes).unwrap_or_default();
            if codes.is_empty() {
                continue;
            }
            let entry = facets.entry(facet).or_default();
            for code in codes {
                if !entry.contains(&code) {
                    entry.push(code);
                }
            }
        }

        Ok(ReportParameters {
            period_start,
            period_end,
            facets,
            visible_sections: self.visible_sections.clone(),
        })
    }
}

fn parse_period(field: &'static str, raw: Option<&str>) -> Result<Option<Date>, ReportRequestError> {
    match raw.map(str::trim) {
        None | Some("") => Ok(None),
        Some(value) => parse_calendar_date(value)
            .map(Some)
            .map_err(|_| ReportRequestError::InvalidDate {
                field,
                value: value.to_string(),
            }),
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FilterKind {
    Date,
    Select,
}

/// One entry of the report filter catalogue.
#[derive(Debug, Clone, Serialize)]
pub struct FilterDefinition {
    pub name: &'static str,
    pub label: &'static str,
    #[serde(rename = "type")]
    pub kind: FilterKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub options: Option<&'static [Choice]>,
}

/// Filters the report accepts: the period bounds followed by every facet.
#[must_use]
pub fn filter_catalog() -> Vec<FilterDefinition> {
    let mut catalog = vec![
        FilterDefinition {
            name: PERIOD_START_KEY,
            label: "From",
            kind: FilterKind::Date,
            options: None,
        },
        FilterDefinition {
            name: PERIOD_END_KEY,
            label: "To",
            kind: FilterKind::Date,
            options: None,
        },
    ];
    catalog.extend(Facet::ALL.into_iter().map(|facet| FilterDefinition {
        name: facet.key(),
        label: facet.label(),
        kind: FilterKind::Select,
        options: Some(facet.choices()),
    }));
    catalog
}

#[must_use]
pub fn json_schema() -> Value {
    schemars::schema_for!(ReportRequest).to_value()
}
