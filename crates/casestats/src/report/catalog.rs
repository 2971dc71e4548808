//! The fixed report layout: sections, subsections, KPI groups and KPI fields.
//!
//! KPI field names are unique across the whole report. Values live in
//! [`ReportData`] keyed by field and are laid out along this catalogue when
//! serialized, so structure and data always agree on nesting.

use std::collections::BTreeMap;

use serde::Serialize;
use serde::ser::{SerializeMap, SerializeStruct, Serializer};

/// Placeholder for text KPIs without any example.
pub const EMPTY_TEXT: &str = "-";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KpiKind {
    Count,
    Hours,
    Text,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct KpiSpec {
    pub field: &'static str,
    pub label: &'static str,
    #[serde(skip)]
    pub kind: KpiKind,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct GroupSpec {
    pub label: &'static str,
    pub kpis: &'static [KpiSpec],
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SubsectionSpec {
    pub key: &'static str,
    pub label: &'static str,
    pub groups: &'static [GroupSpec],
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SectionSpec {
    pub key: &'static str,
    pub label: &'static str,
    pub subsections: &'static [SubsectionSpec],
}

const fn count(field: &'static str, label: &'static str) -> KpiSpec {
    KpiSpec {
        field,
        label,
        kind: KpiKind::Count,
    }
}

const fn hours(field: &'static str, label: &'static str) -> KpiSpec {
    KpiSpec {
        field,
        label,
        kind: KpiKind::Hours,
    }
}

const fn text(field: &'static str, label: &'static str) -> KpiSpec {
    KpiSpec {
        field,
        label,
        kind: KpiKind::Text,
    }
}

const fn group(label: &'static str, kpis: &'static [KpiSpec]) -> GroupSpec {
    GroupSpec { label, kpis }
}

pub const REPORT_SECTIONS: &[SectionSpec] = &[
    SectionSpec {
        key: "utilization",
        label: "Utilization",
        subsections: &[
            SubsectionSpec {
                key: "consultations",
                label: "Consultations",
                groups: &[
                    group(
                        "03-1-1 Gender of counseled persons",
                        &[
                            count("03_1_1_a_total", "03-1-1-a total"),
                            count("03_1_1_b_female", "03-1-1-b female"),
                            count("03_1_1_c_male", "03-1-1-c male"),
                            count("03_1_1_d_diverse", "03-1-1-d diverse"),
                        ],
                    ),
                    group(
                        "03-1-2 Age of counseled persons",
                        &[
                            count("03_1_2_a_total", "03-1-2-a total"),
                            count("03_1_2_b_18_to_20", "03-1-2-b 18 to 20 years"),
                            count("03_1_2_c_21_to_26", "03-1-2-c 21 to 26 years"),
                            count("03_1_2_d_27_to_59", "03-1-2-d 27 to 59 years"),
                            count("03_1_2_e_60_plus", "03-1-2-e 60 years and older"),
                            count("03_1_2_f_unknown", "03-1-2-f unknown or under 18"),
                        ],
                    ),
                    group(
                        "03-1-3 Counseling format",
                        &[
                            count("03_1_3_a_in_person", "03-1-3-a in person"),
                            count("03_1_3_b_outreach", "03-1-3-b outreach"),
                            count("03_1_3_c_phone", "03-1-3-c by phone"),
                            count("03_1_3_d_video", "03-1-3-d by video"),
                            count("03_1_3_e_written", "03-1-3-e in writing"),
                        ],
                    ),
                    group(
                        "03-1-4 Volume",
                        &[
                            count("03_1_4_a_minutes", "03-1-4-a minutes of counseling"),
                            count("03_1_4_b_sessions", "03-1-4-b sessions"),
                        ],
                    ),
                ],
            },
            SubsectionSpec {
                key: "accompaniments",
                label: "Accompaniments",
                groups: &[
                    group("03-2-1 total", &[count("03_2_1_total", "03-2-1 total")]),
                    group(
                        "03-2-2 to 03-2-11 institutions",
                        &[
                            count("03_2_2_courts", "03-2-2 courts"),
                            count("03_2_3_police", "03-2-3 police"),
                            count("03_2_4_attorneys", "03-2-4 attorneys"),
                            count("03_2_5_medical", "03-2-5 doctors and forensic medicine"),
                            count("03_2_6_youth_services", "03-2-6 youth welfare office"),
                            count("03_2_7_social_services", "03-2-7 social welfare office"),
                            count("03_2_8_employment_services", "03-2-8 job center"),
                            count("03_2_9_violence_counseling", "03-2-9 violence counseling"),
                            count("03_2_10_protective_shelters", "03-2-10 protective shelters"),
                            count(
                                "03_2_11_intervention_offices",
                                "03-2-11 intervention offices",
                            ),
                        ],
                    ),
                    group(
                        "03-2-12 other",
                        &[
                            count("03_2_12_other", "03-2-12 other"),
                            text("03_2_12_a_which", "03-2-12-a which"),
                        ],
                    ),
                ],
            },
            SubsectionSpec {
                key: "requests",
                label: "Requests",
                groups: &[
                    group("03-3-1 total", &[count("03_3_1_total", "03-3-1 total")]),
                    group(
                        "03-3-2 Request kind",
                        &[
                            count("03_3_2_a_medical_emergency", "03-3-2-a immediate medical help"),
                            count(
                                "03_3_2_b_confidential_evidence",
                                "03-3-2-b confidential evidence collection",
                            ),
                            count("03_3_2_c_counseling", "03-3-2-c counseling need"),
                            count("03_3_2_d_legal", "03-3-2-d legal questions"),
                            count("03_3_2_e_other", "03-3-2-e other"),
                        ],
                    ),
                    group(
                        "03-3-3 Requesting person",
                        &[
                            count("03_3_3_a_affected", "03-3-3-a affected persons"),
                            count("03_3_3_b_relatives", "03-3-3-b relatives"),
                            count("03_3_3_c_professionals", "03-3-3-c professionals"),
                            count("03_3_3_d_on_behalf", "03-3-3-d on behalf of someone"),
                            count("03_3_3_e_anonymous", "03-3-3-e anonymous"),
                            count("03_3_3_f_queer", "03-3-3-f of which queer"),
                        ],
                    ),
                ],
            },
        ],
    },
    SectionSpec {
        key: "report_data",
        label: "Report data",
        subsections: &[
            SubsectionSpec {
                key: "residence",
                label: "Place of residence",
                groups: &[
                    group(
                        "04-1-0 total",
                        &[
                            count("04_1_0_a_clients", "Clients"),
                            count("04_1_0_b_consultations", "Consultations"),
                        ],
                    ),
                    group(
                        "04-1-1 Leipzig (city)",
                        &[
                            count("04_1_1_a_clients", "Clients"),
                            count("04_1_1_b_consultations", "Consultations"),
                        ],
                    ),
                    group(
                        "04-1-2 Leipzig (district)",
                        &[
                            count("04_1_2_a_clients", "Clients"),
                            count("04_1_2_b_consultations", "Consultations"),
                        ],
                    ),
                    group(
                        "04-1-3 North Saxony",
                        &[
                            count("04_1_3_a_clients", "Clients"),
                            count("04_1_3_b_consultations", "Consultations"),
                        ],
                    ),
                    group(
                        "04-1-4 Saxony (other)",
                        &[
                            count("04_1_4_a_clients", "Clients"),
                            count("04_1_4_b_consultations", "Consultations"),
                        ],
                    ),
                    group(
                        "04-1-5 Germany (other)",
                        &[
                            count("04_1_5_a_clients", "Clients"),
                            count("04_1_5_b_consultations", "Consultations"),
                        ],
                    ),
                    group(
                        "04-1-6 Abroad",
                        &[
                            count("04_1_6_a_clients", "Clients"),
                            count("04_1_6_b_consultations", "Consultations"),
                            text("04_1_6_c_which_countries", "Which countries"),
                        ],
                    ),
                    group(
                        "04-1-7 unknown",
                        &[
                            count("04_1_7_a_clients", "Clients"),
                            count("04_1_7_b_consultations", "Consultations"),
                        ],
                    ),
                ],
            },
            SubsectionSpec {
                key: "nationality",
                label: "Nationality",
                groups: &[group(
                    "04-2 Non-German nationality",
                    &[
                        count("04_2_1_a_clients", "Clients"),
                        count("04_2_2_a_consultations", "Consultations"),
                        text("04_2_3_a_which_countries", "Which countries"),
                    ],
                )],
            },
            SubsectionSpec {
                key: "age_structure",
                label: "Age structure",
                groups: &[
                    group("04-3-1 18 to 20 years", &[count("04_3_1_a_clients", "Clients")]),
                    group("04-3-2 21 to 26 years", &[count("04_3_2_a_clients", "Clients")]),
                    group("04-3-3 27 to 59 years", &[count("04_3_3_a_clients", "Clients")]),
                    group("04-3-4 60 years and older", &[count("04_3_4_a_clients", "Clients")]),
                    group("04-3-5 unknown or under 18", &[count("04_3_5_a_clients", "Clients")]),
                ],
            },
            SubsectionSpec {
                key: "disability",
                label: "Disability",
                groups: &[
                    group("04-4-1 Severe disability", &[count("04_4_1_a_clients", "Clients")]),
                    group(
                        "04-4-2 Severe disability with details",
                        &[count("04_4_2_a_clients", "Clients")],
                    ),
                    group("04-4-3 unknown", &[count("04_4_3_a_clients", "Clients")]),
                ],
            },
            SubsectionSpec {
                key: "co_affected_children",
                label: "Co-affected children",
                groups: &[group(
                    "04-5-1 Co-affected children",
                    &[
                        count("04_5_1_a_affected_children", "Total"),
                        count("04_5_1_b_directly_affected", "Directly affected"),
                    ],
                )],
            },
            SubsectionSpec {
                key: "violence_type",
                label: "Type of violence",
                groups: &[
                    group("04-6-1 Rape", &[count("04_6_1_rape", "Count")]),
                    group(
                        "04-6-2 Attempted rape",
                        &[count("04_6_2_attempted_rape", "Count")],
                    ),
                    group(
                        "04-6-3 Sexual assault",
                        &[count("04_6_3_sexual_assault", "Count")],
                    ),
                    group(
                        "04-6-4 Attempted sexual assault",
                        &[count("04_6_4_attempted_sexual_assault", "Count")],
                    ),
                    group(
                        "04-6-5 Sexual harassment",
                        &[count("04_6_5_sexual_harassment", "Count")],
                    ),
                    group(
                        "04-6-6 Sexual exploitation",
                        &[count("04_6_6_sexual_exploitation", "Count")],
                    ),
                    group("04-6-7 Upskirting", &[count("04_6_7_upskirting", "Count")]),
                    group("04-6-8 Catcalling", &[count("04_6_8_catcalling", "Count")]),
                    group("04-6-9 Digital violence", &[count("04_6_9_digital", "Count")]),
                    group(
                        "04-6-10 other",
                        &[
                            count("04_6_10_other", "Count"),
                            text("04_6_10_a_which", "Which"),
                        ],
                    ),
                ],
            },
            SubsectionSpec {
                key: "consequences",
                label: "Consequences of violence",
                groups: &[
                    group("04-7-1 Physical consequences", &[count("04_7_1_physical", "Count")]),
                    group(
                        "04-7-2 Psychological consequences",
                        &[count("04_7_2_psychological", "Count")],
                    ),
                    group(
                        "04-7-3 Impaired ability to work",
                        &[count("04_7_3_work_impairment", "Count")],
                    ),
                    group(
                        "04-7-4 Financial consequences",
                        &[count("04_7_4_financial_hardship", "Count")],
                    ),
                    group("04-7-5 Job loss", &[count("04_7_5_job_loss", "Count")]),
                    group(
                        "04-7-6 Social isolation",
                        &[count("04_7_6_social_isolation", "Count")],
                    ),
                    group("04-7-7 Suicidality", &[count("04_7_7_suicidality", "Count")]),
                    group("04-7-8 No information", &[count("04_7_8_unspecified", "Count")]),
                    group(
                        "04-7-9 Further consequences",
                        &[
                            count("04_7_9_other", "Count"),
                            text("04_7_9_a_description", "Description"),
                        ],
                    ),
                ],
            },
            SubsectionSpec {
                key: "prosecution",
                label: "Prosecution",
                groups: &[
                    group(
                        "04-8-1 Report to police",
                        &[
                            count("04_8_1_total", "Total"),
                            count("04_8_1_a_reported", "Reported"),
                            count("04_8_1_b_not_reported", "Not reported"),
                            count("04_8_1_c_undecided", "Not decided yet"),
                            count("04_8_1_d_unspecified", "Not specified"),
                        ],
                    ),
                    group(
                        "04-8-2 Confidential evidence collection",
                        &[
                            count("04_8_2_a_collected", "Collected"),
                            count("04_8_2_b_not_collected", "Not collected"),
                        ],
                    ),
                    group(
                        "04-8-3 Medical care",
                        &[count("04_8_3_a_medical_care", "Received medical care")],
                    ),
                ],
            },
        ],
    },
    SectionSpec {
        key: "network",
        label: "Network",
        subsections: &[SubsectionSpec {
            key: "contact_sources",
            label: "Contact sources",
            groups: &[group(
                "05-1 How did clients hear about the service?",
                &[
                    count("05_1_1_police", "Police"),
                    count("05_1_2_private", "Private contacts"),
                    count("05_1_3_counseling", "Counseling services"),
                    count("05_1_4_internet", "Internet"),
                    count("05_1_5_authorities", "Public authorities"),
                    count("05_1_6_health", "Health care"),
                    count("05_1_7_attorneys", "Attorneys"),
                    count("05_1_8_unknown", "Unknown"),
                    count("05_1_9_other", "Other source"),
                    text("05_1_9_a_which", "Which other source"),
                ],
            )],
        }],
    },
    SectionSpec {
        key: "funding",
        label: "Funding",
        subsections: &[SubsectionSpec {
            key: "interpreting",
            label: "Interpreting",
            groups: &[group(
                "06-1 Interpreting",
                &[
                    hours("06_1_1_total_hours", "Total hours"),
                    hours("06_1_2_consultation_hours", "Hours in consultations"),
                    hours("06_1_3_accompaniment_hours", "Hours in accompaniments"),
                    count("06_1_4_unspecified", "Records without hours"),
                ],
            )],
        }],
    },
];

pub fn all_kpis() -> impl Iterator<Item = &'static KpiSpec> {
    REPORT_SECTIONS
        .iter()
        .flat_map(|section| section.subsections.iter())
        .flat_map(|subsection| subsection.groups.iter())
        .flat_map(|group| group.kpis.iter())
}

/// Layout handed to the caller; sections and subsections may be hidden.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportStructure {
    pub sections: Vec<VisibleSection>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VisibleSection {
    pub spec: &'static SectionSpec,
    pub subsections: Vec<&'static SubsectionSpec>,
}

impl ReportStructure {
    /// The complete layout with everything visible.
    #[must_use]
    pub fn full() -> Self {
        Self {
            sections: REPORT_SECTIONS
                .iter()
                .map(|spec| VisibleSection {
                    spec,
                    subsections: spec.subsections.iter().collect(),
                })
                .collect(),
        }
    }

    #[must_use]
    pub fn section(&self, key: &str) -> Option<&VisibleSection> {
        self.sections.iter().find(|section| section.spec.key == key)
    }
}

struct SubsectionLayout<'a>(&'a SubsectionSpec);

impl Serialize for SubsectionLayout<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut state = serializer.serialize_struct("Subsection", 2)?;
        state.serialize_field("label", self.0.label)?;
        state.serialize_field("groups", self.0.groups)?;
        state.end()
    }
}

struct SubsectionMap<'a>(&'a [&'static SubsectionSpec]);

impl Serialize for SubsectionMap<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.0.len()))?;
        for subsection in self.0 {
            map.serialize_entry(subsection.key, &SubsectionLayout(subsection))?;
        }
        map.end()
    }
}

impl Serialize for VisibleSection {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut state = serializer.serialize_struct("Section", 2)?;
        state.serialize_field("label", self.spec.label)?;
        state.serialize_field("subsections", &SubsectionMap(&self.subsections))?;
        state.end()
    }
}

impl Serialize for ReportStructure {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.sections.len()))?;
        for section in &self.sections {
            map.serialize_entry(section.spec.key, section)?;
        }
        map.end()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum KpiValue {
    Count(i64),
    Hours(f64),
    Text(String),
}

impl KpiValue {
    fn empty(kind: KpiKind) -> Self {
        match kind {
            KpiKind::Count => Self::Count(0),
            KpiKind::Hours => Self::Hours(0.0),
            KpiKind::Text => Self::Text(EMPTY_TEXT.to_string()),
        }
    }

    /// Text KPI listing examples, or the placeholder when there are none.
    #[must_use]
    pub fn examples(examples: &[String]) -> Self {
        if examples.is_empty() {
            Self::Text(EMPTY_TEXT.to_string())
        } else {
            Self::Text(examples.join(", "))
        }
    }

    /// Hour sums are rounded to hundredths.
    #[must_use]
    pub fn hours(value: f64) -> Self {
        Self::Hours((value * 100.0).round() / 100.0)
    }
}

/// Computed KPI values, laid out along [`REPORT_SECTIONS`] when serialized.
/// Fields without a computed value serialize as zero or the text placeholder.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ReportData {
    values: BTreeMap<&'static str, KpiValue>,
}

impl ReportData {
    /// Stores a value; fields missing from the catalogue are never serialized.
    pub fn set(&mut self, field: &'static str, value: KpiValue) {
        self.values.insert(field, value);
    }

    pub fn fields(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.values.keys().copied()
    }

    #[must_use]
    pub fn get(&self, field: &str) -> Option<&KpiValue> {
        self.values.get(field)
    }

    /// Count value of a KPI; zero when absent.
    #[must_use]
    pub fn count(&self, field: &str) -> i64 {
        match self.values.get(field) {
            Some(KpiValue::Count(value)) => *value,
            _ => 0,
        }
    }

    #[must_use]
    pub fn hours(&self, field: &str) -> f64 {
        match self.values.get(field) {
            Some(KpiValue::Hours(value)) => *value,
            Some(KpiValue::Count(value)) => *value as f64,
            _ => 0.0,
        }
    }

    #[must_use]
    pub fn text(&self, field: &str) -> &str {
        match self.values.get(field) {
            Some(KpiValue::Text(value)) => value,
            _ => EMPTY_TEXT,
        }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    fn value_of(&self, kpi: &KpiSpec) -> KpiValue {
        self.values
            .get(kpi.field)
            .cloned()
            .unwrap_or_else(|| KpiValue::empty(kpi.kind))
    }
}

struct SubsectionValues<'a> {
    data: &'a ReportData,
    spec: &'static SubsectionSpec,
}

impl Serialize for SubsectionValues<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(None)?;
        for kpi in self.spec.groups.iter().flat_map(|group| group.kpis.iter()) {
            map.serialize_entry(kpi.field, &self.data.value_of(kpi))?;
        }
        map.end()
    }
}

struct SectionValues<'a> {
    data: &'a ReportData,
    spec: &'static SectionSpec,
}

impl Serialize for SectionValues<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.spec.subsections.len()))?;
        for spec in self.spec.subsections {
            map.serialize_entry(
                spec.key,
                &SubsectionValues {
                    data: self.data,
                    spec,
                },
            )?;
        }
        map.end()
    }
}

impl Serialize for ReportData {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(REPORT_SECTIONS.len()))?;
        for spec in REPORT_SECTIONS {
            map.serialize_entry(spec.key, &SectionValues { data: self, spec })?;
        }
        map.end()
    }
}
