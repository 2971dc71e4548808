//! Static field-descriptor table for the seven record collections.
//!
//! Every identifier that ever reaches generated SQL is taken from this table.
//! The table is versioned so metadata consumers can detect layout changes.

use serde::{Deserialize, Serialize};

use super::choices::{self, ChoiceDomain};

pub const FIELD_TABLE_VERSION: &str = "casestats.fields.v1";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum RecordType {
    Request,
    Case,
    Client,
    Consultation,
    Accompaniment,
    ViolenceIncident,
    ViolenceConsequence,
}

impl RecordType {
    pub const ALL: [Self; 7] = [
        Self::Request,
        Self::Case,
        Self::Client,
        Self::Consultation,
        Self::Accompaniment,
        Self::ViolenceIncident,
        Self::ViolenceConsequence,
    ];

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Request => "Request",
            Self::Case => "Case",
            Self::Client => "Client",
            Self::Consultation => "Consultation",
            Self::Accompaniment => "Accompaniment",
            Self::ViolenceIncident => "ViolenceIncident",
            Self::ViolenceConsequence => "ViolenceConsequence",
        }
    }

    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|record_type| record_type.as_str() == name)
    }

    #[must_use]
    pub const fn table(self) -> &'static str {
        match self {
            Self::Request => "requests",
            Self::Case => "cases",
            Self::Client => "clients",
            Self::Consultation => "consultations",
            Self::Accompaniment => "accompaniments",
            Self::ViolenceIncident => "violence_incidents",
            Self::ViolenceConsequence => "violence_consequences",
        }
    }

    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Request => "Request",
            Self::Case => "Case",
            Self::Client => "Client",
            Self::Consultation => "Consultation",
            Self::Accompaniment => "Accompaniment",
            Self::ViolenceIncident => "Violence incident",
            Self::ViolenceConsequence => "Violence consequence",
        }
    }

    #[must_use]
    pub const fn label_plural(self) -> &'static str {
        match self {
            Self::Request => "Requests",
            Self::Case => "Cases",
            Self::Client => "Clients",
            Self::Consultation => "Consultations",
            Self::Accompaniment => "Accompaniments",
            Self::ViolenceIncident => "Violence incidents",
            Self::ViolenceConsequence => "Violence consequences",
        }
    }

    #[must_use]
    pub const fn fields(self) -> &'static [FieldSpec] {
        match self {
            Self::Request => REQUEST_FIELDS,
            Self::Case => CASE_FIELDS,
            Self::Client => CLIENT_FIELDS,
            Self::Consultation => CONSULTATION_FIELDS,
            Self::Accompaniment => ACCOMPANIMENT_FIELDS,
            Self::ViolenceIncident => VIOLENCE_INCIDENT_FIELDS,
            Self::ViolenceConsequence => VIOLENCE_CONSEQUENCE_FIELDS,
        }
    }

    #[must_use]
    pub fn field(self, name: &str) -> Option<&'static FieldSpec> {
        self.fields().iter().find(|field| field.name == name)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    PrimaryKey,
    Date,
    DateTime,
    Boolean,
    Integer,
    Decimal,
    ShortText,
    LongText,
    /// Direct to-one reference stored as an id column on this record.
    Reference(RecordType),
    /// Id of a record owned outside the seven collections, e.g. a staff account.
    ExternalReference,
    /// Backward relation owned by another record type; has no column here.
    ReverseRelation(RecordType),
}

impl FieldKind {
    #[must_use]
    pub const fn is_temporal(self) -> bool {
        matches!(self, Self::Date | Self::DateTime)
    }

    #[must_use]
    pub const fn is_numeric(self) -> bool {
        matches!(
            self,
            Self::PrimaryKey
                | Self::Integer
                | Self::Decimal
                | Self::Reference(_)
                | Self::ExternalReference
        )
    }

    #[must_use]
    pub const fn has_column(self) -> bool {
        !matches!(self, Self::ReverseRelation(_))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldSpec {
    pub name: &'static str,
    pub label: &'static str,
    pub kind: FieldKind,
    pub choices: Option<ChoiceDomain>,
}

const fn field(name: &'static str, label: &'static str, kind: FieldKind) -> FieldSpec {
    FieldSpec {
        name,
        label,
        kind,
        choices: None,
    }
}

const fn select(name: &'static str, label: &'static str, choices: ChoiceDomain) -> FieldSpec {
    FieldSpec {
        name,
        label,
        kind: FieldKind::ShortText,
        choices: Some(choices),
    }
}

const REQUEST_FIELDS: &[FieldSpec] = &[
    field("id", "Request id", FieldKind::PrimaryKey),
    field("channel", "Request channel (free text)", FieldKind::LongText),
    field("request_date", "Request date", FieldKind::Date),
    select("location", "Request location", choices::LOCATION),
    select("requester", "Requesting person", choices::REQUESTER),
    select("request_kind", "Request kind", choices::REQUEST_KIND),
    field(
        "follow_up_required",
        "Follow-up required",
        FieldKind::Boolean,
    ),
    field(
        "consultation_id",
        "Linked consultation",
        FieldKind::Reference(RecordType::Consultation),
    ),
    field(
        "case_id",
        "Linked case",
        FieldKind::Reference(RecordType::Case),
    ),
    field("staff_id", "Responsible staff member", FieldKind::ExternalReference),
    field("created_at", "Created at", FieldKind::DateTime),
];

const CASE_FIELDS: &[FieldSpec] = &[
    field("id", "Case id", FieldKind::PrimaryKey),
    field(
        "client_id",
        "Client",
        FieldKind::Reference(RecordType::Client),
    ),
    field("staff_id", "Responsible staff member", FieldKind::ExternalReference),
    select("status", "Status", choices::CASE_STATUS),
    field("start_date", "Start date", FieldKind::Date),
    field("notes", "Notes", FieldKind::LongText),
    field(
        "consultations",
        "Consultations",
        FieldKind::ReverseRelation(RecordType::Consultation),
    ),
    field(
        "accompaniments",
        "Accompaniments",
        FieldKind::ReverseRelation(RecordType::Accompaniment),
    ),
    field(
        "violence_incidents",
        "Violence incidents",
        FieldKind::ReverseRelation(RecordType::ViolenceIncident),
    ),
];

const CLIENT_FIELDS: &[FieldSpec] = &[
    field("id", "Client id", FieldKind::PrimaryKey),
    select("role", "Role", choices::CLIENT_ROLE),
    field("pseudonym", "Pseudonym", FieldKind::ShortText),
    field("age", "Age (years)", FieldKind::Integer),
    select(
        "gender_identity",
        "Gender identity",
        choices::GENDER_IDENTITY,
    ),
    select("sexuality", "Sexuality", choices::SEXUALITY),
    select("residence", "Place of residence", choices::LOCATION),
    field("nationality", "Nationality", FieldKind::ShortText),
    field("occupation", "Occupation", FieldKind::ShortText),
    select(
        "severe_disability",
        "Severe disability",
        choices::YES_NO_UNSPECIFIED,
    ),
    field(
        "disability_detail",
        "Form or degree of disability",
        FieldKind::LongText,
    ),
    select(
        "migration_background",
        "Migration background",
        choices::YES_NO_UNSPECIFIED,
    ),
    field("contact_point", "Contact point (source)", FieldKind::ShortText),
    field(
        "interpreter_languages",
        "Interpreting languages",
        FieldKind::ShortText,
    ),
    field("created_at", "Created at", FieldKind::DateTime),
    field(
        "cases",
        "Cases",
        FieldKind::ReverseRelation(RecordType::Case),
    ),
];

const CONSULTATION_FIELDS: &[FieldSpec] = &[
    field("id", "Consultation id", FieldKind::PrimaryKey),
    select(
        "counseling_office",
        "Counseling office",
        choices::COUNSELING_OFFICE,
    ),
    field("scheduled_at", "Appointment time", FieldKind::DateTime),
    field("duration", "Duration (minutes)", FieldKind::Integer),
    select("status", "Status", choices::CONSULTATION_STATUS),
    field(
        "interpreter_hours",
        "Interpreter hours",
        FieldKind::Decimal,
    ),
    field(
        "session_count",
        "Number of sessions (statistics)",
        FieldKind::Integer,
    ),
    select("type", "Format", choices::CONSULTATION_TYPE),
    field("notes", "Notes", FieldKind::LongText),
    field("counselor_id", "Counselor", FieldKind::ExternalReference),
    field(
        "case_id",
        "Case",
        FieldKind::Reference(RecordType::Case),
    ),
];

const ACCOMPANIMENT_FIELDS: &[FieldSpec] = &[
    field("id", "Accompaniment id", FieldKind::PrimaryKey),
    field("date", "Date", FieldKind::Date),
    field(
        "institution",
        "Institution (e.g. police, court)",
        FieldKind::ShortText,
    ),
    field(
        "interpreter_hours",
        "Interpreter hours",
        FieldKind::Decimal,
    ),
    field("notes", "Notes", FieldKind::LongText),
    field(
        "client_id",
        "Client",
        FieldKind::Reference(RecordType::Client),
    ),
    field(
        "case_id",
        "Case",
        FieldKind::Reference(RecordType::Case),
    ),
];

const VIOLENCE_INCIDENT_FIELDS: &[FieldSpec] = &[
    field("id", "Incident id", FieldKind::PrimaryKey),
    field("incident_date", "Incident date", FieldKind::Date),
    select("location", "Crime scene", choices::CRIME_SCENE),
    field("postal_code", "Postal code of crime scene", FieldKind::ShortText),
    field("violence_type", "Type of violence", FieldKind::ShortText),
    select(
        "incident_count",
        "Number of incidents",
        choices::INCIDENT_COUNT,
    ),
    select(
        "perpetrator_count",
        "Number of perpetrators",
        choices::PERPETRATOR_COUNT,
    ),
    select("report_filed", "Report filed", choices::REPORT_FILED),
    select(
        "medical_care",
        "Medical care",
        choices::YES_NO_UNSPECIFIED,
    ),
    select(
        "evidence_collected",
        "Confidential evidence collection",
        choices::YES_NO_UNSPECIFIED,
    ),
    field(
        "affected_children",
        "Co-affected children",
        FieldKind::Integer,
    ),
    field(
        "directly_affected_children",
        "Directly affected children",
        FieldKind::Integer,
    ),
    field(
        "client_id",
        "Affected client",
        FieldKind::Reference(RecordType::Client),
    ),
    field(
        "case_id",
        "Case",
        FieldKind::Reference(RecordType::Case),
    ),
    field(
        "consequence",
        "Consequences",
        FieldKind::ReverseRelation(RecordType::ViolenceConsequence),
    ),
];

const VIOLENCE_CONSEQUENCE_FIELDS: &[FieldSpec] = &[
    field("id", "Consequence id", FieldKind::PrimaryKey),
    field(
        "incident_id",
        "Violence incident",
        FieldKind::Reference(RecordType::ViolenceIncident),
    ),
    select(
        "psychological",
        "Psychological consequences",
        choices::PSYCHOLOGICAL_CONSEQUENCE,
    ),
    select(
        "physical",
        "Physical consequences",
        choices::PHYSICAL_CONSEQUENCE,
    ),
    select(
        "work_impairment",
        "Impaired ability to work",
        choices::YES_NO_UNSPECIFIED,
    ),
    select(
        "financial_hardship",
        "Financial consequences",
        choices::YES_NO_UNSPECIFIED,
    ),
    select("job_loss", "Job loss", choices::YES_NO_UNSPECIFIED),
    select(
        "social_isolation",
        "Social isolation",
        choices::YES_NO_UNSPECIFIED,
    ),
    select("suicidality", "Suicidality", choices::YES_NO_UNSPECIFIED),
    select(
        "unspecified",
        "No information given",
        choices::YES_NO_UNSPECIFIED,
    ),
    field(
        "lasting_impairments",
        "Lasting physical impairments",
        FieldKind::LongText,
    ),
    field("other_text", "Further consequences", FieldKind::LongText),
    field("notes", "Notes", FieldKind::LongText),
];
