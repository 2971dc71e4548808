use std::sync::Arc;

use anyhow::{Context, Result};
use rusqlite::Connection;

use super::catalog::{KpiValue, ReportData};
use super::classify::{
    ContactClass, ContactSource, Examples, Institution, OTHER_EXAMPLE_LIMIT, ViolenceType,
    classify_contact_point, classify_institution, classify_violence,
};
use super::request::ReportParameters;
use super::scope::ReportScope;
use crate::telemetry::{Telemetry, TelemetryEvent};

pub const NATIONALITY_EXAMPLE_LIMIT: usize = 5;

const FEMALE_CODES: &str = "'cis-female', 'trans-female'";
const MALE_CODES: &str = "'cis-male', 'trans-male'";
const DIVERSE_CODES: &str = "'trans-nonbinary', 'inter', 'agender', 'diverse'";

/// Residence regions in report order. Anything else, blank included, is unknown.
const RESIDENCE_REGIONS: [(&str, &str, &str); 6] = [
    ("leipzig-city", "04_1_1_a_clients", "04_1_1_b_consultations"),
    ("leipzig-district", "04_1_2_a_clients", "04_1_2_b_consultations"),
    ("north-saxony", "04_1_3_a_clients", "04_1_3_b_consultations"),
    ("saxony-other", "04_1_4_a_clients", "04_1_4_b_consultations"),
    ("germany-other", "04_1_5_a_clients", "04_1_5_b_consultations"),
    ("abroad", "04_1_6_a_clients", "04_1_6_b_consultations"),
];
const RESIDENCE_UNKNOWN_CLIENTS: &str = "04_1_7_a_clients";
const RESIDENCE_UNKNOWN_CONSULTATIONS: &str = "04_1_7_b_consultations";

const NON_GERMAN: &str = "TRIM(COALESCE(cl.nationality, '')) <> '' \
     AND cl.nationality NOT LIKE '%german%' \
     AND cl.nationality NOT LIKE '%deutsch%'";

const CONSULTATIONS_WITH_CLIENTS: &str = "scoped_consultations co \
     LEFT JOIN cases c ON c.id = co.case_id \
     LEFT JOIN clients cl ON cl.id = c.client_id";

fn when(condition: &str) -> String {
    format!("COALESCE(SUM(CASE WHEN {condition} THEN 1 ELSE 0 END), 0)")
}

fn total(expression: &str) -> String {
    format!("COALESCE(SUM({expression}), 0)")
}

fn age_band(column: &str, from: u32, below: Option<u32>) -> String {
    match below {
        Some(below) => when(&format!("{column} >= {from} AND {column} < {below}")),
        None => when(&format!("{column} >= {from}")),
    }
}

fn age_unknown(column: &str) -> String {
    when(&format!("{column} IS NULL OR {column} < 18"))
}

/// One statement, one row, one integer column per KPI.
fn tally(
    connection: &Connection,
    scope: &ReportScope,
    from: &str,
    columns: &[(&'static str, String)],
    data: &mut ReportData,
) -> Result<()> {
    let select = columns
        .iter()
        .map(|(_, expression)| expression.as_str())
        .collect::<Vec<_>>()
        .join(",\n       ");
    let body = format!("SELECT {select}\nFROM {from}");
    let values = scope.query_row(connection, &body, |row| {
        (0..columns.len())
            .map(|index| row.get::<usize, i64>(index))
            .collect::<rusqlite::Result<Vec<_>>>()
    })?;

    for ((field, _), value) in columns.iter().zip(values) {
        data.set(*field, KpiValue::Count(value));
    }
    Ok(())
}

fn texts(connection: &Connection, scope: &ReportScope, body: &str) -> Result<Vec<Option<String>>> {
    scope.query_rows(connection, body, |row| row.get::<usize, Option<String>>(0))
}

/// Computes the fixed KPI report from the case store.
#[derive(Clone)]
pub struct KpiAggregator {
    telemetry: Arc<dyn Telemetry>,
}

impl KpiAggregator {
    #[must_use]
    pub fn new(telemetry: Arc<dyn Telemetry>) -> Self {
        Self { telemetry }
    }

    /// All statements run inside one read transaction, so every KPI sees the
    /// same snapshot of the store.
    pub fn compute(
        &self,
        connection: &Connection,
        parameters: &ReportParameters,
    ) -> Result<ReportData> {
        let transaction = connection
            .unchecked_transaction()
            .context("failed to open report read transaction")?;
        let scope = ReportScope::build(parameters);
        let mut data = ReportData::default();

        consultation_kpis(&transaction, &scope, &mut data)?;
        accompaniment_kpis(&transaction, &scope, &mut data)?;
        request_kpis(&transaction, &scope, &mut data)?;
        residence_kpis(&transaction, &scope, &mut data)?;
        nationality_kpis(&transaction, &scope, &mut data)?;
        client_profile_kpis(&transaction, &scope, &mut data)?;
        incident_kpis(&transaction, &scope, &mut data)?;
        violence_type_kpis(&transaction, &scope, &mut data)?;
        consequence_kpis(&transaction, &scope, &mut data)?;
        contact_source_kpis(&transaction, &scope, &mut data)?;
        interpreting_kpis(&transaction, &scope, &mut data)?;
        self.report_incomplete_records(&transaction, &scope)?;

        transaction
            .commit()
            .context("failed to close report read transaction")?;
        Ok(data)
    }

    fn report_incomplete_records(&self, connection: &Connection, scope: &ReportScope) -> Result<()> {
        let (incidents, cases) = scope.query_row(
            connection,
            "SELECT
    (SELECT COUNT(*) FROM scoped_incidents vi
     WHERE NOT EXISTS (SELECT 1 FROM violence_consequences vc WHERE vc.incident_id = vi.id)),
    (SELECT COUNT(*) FROM scoped_cases c
     WHERE c.client_id IS NULL
        OR NOT EXISTS (SELECT 1 FROM clients cl WHERE cl.id = c.client_id))",
            |row| Ok((row.get::<usize, i64>(0)?, row.get::<usize, i64>(1)?)),
        )?;

        if incidents > 0 {
            self.telemetry.record(&TelemetryEvent::IncompleteRecords {
                collection: "violence_incidents",
                missing: "violence_consequence",
                count: incidents,
            });
        }
        if cases > 0 {
            self.telemetry.record(&TelemetryEvent::IncompleteRecords {
                collection: "cases",
                missing: "client",
                count: cases,
            });
        }
        Ok(())
    }
}

fn consultation_kpis(
    connection: &Connection,
    scope: &ReportScope,
    data: &mut ReportData,
) -> Result<()> {
    let columns = [
        ("03_1_1_a_total", "COUNT(*)".to_string()),
        (
            "03_1_1_b_female",
            when(&format!("cl.gender_identity IN ({FEMALE_CODES})")),
        ),
        (
            "03_1_1_c_male",
            when(&format!("cl.gender_identity IN ({MALE_CODES})")),
        ),
        (
            "03_1_1_d_diverse",
            when(&format!("cl.gender_identity IN ({DIVERSE_CODES})")),
        ),
        ("03_1_2_a_total", "COUNT(*)".to_string()),
        ("03_1_2_b_18_to_20", age_band("cl.age", 18, Some(21))),
        ("03_1_2_c_21_to_26", age_band("cl.age", 21, Some(27))),
        ("03_1_2_d_27_to_59", age_band("cl.age", 27, Some(60))),
        ("03_1_2_e_60_plus", age_band("cl.age", 60, None)),
        ("03_1_2_f_unknown", age_unknown("cl.age")),
        ("03_1_3_a_in_person", when("co.\"type\" = 'in-person'")),
        ("03_1_3_b_outreach", when("co.\"type\" = 'outreach'")),
        ("03_1_3_c_phone", when("co.\"type\" = 'phone'")),
        ("03_1_3_d_video", when("co.\"type\" = 'video'")),
        ("03_1_3_e_written", when("co.\"type\" = 'written'")),
        ("03_1_4_a_minutes", total("co.duration")),
        ("03_1_4_b_sessions", total("COALESCE(co.session_count, 1)")),
    ];
    tally(connection, scope, CONSULTATIONS_WITH_CLIENTS, &columns, data)
}

const fn institution_field(institution: Institution) -> &'static str {
    match institution {
        Institution::Court => "03_2_2_courts",
        Institution::Police => "03_2_3_police",
        Institution::Attorney => "03_2_4_attorneys",
        Institution::Medical => "03_2_5_medical",
        Institution::YouthServices => "03_2_6_youth_services",
        Institution::SocialServices => "03_2_7_social_services",
        Institution::EmploymentServices => "03_2_8_employment_services",
        Institution::ViolenceCounseling => "03_2_9_violence_counseling",
        Institution::ProtectiveShelter => "03_2_10_protective_shelters",
        Institution::InterventionOffice => "03_2_11_intervention_offices",
    }
}

const INSTITUTIONS: [Institution; 10] = [
    Institution::Court,
    Institution::Police,
    Institution::Attorney,
    Institution::Medical,
    Institution::YouthServices,
    Institution::SocialServices,
    Institution::EmploymentServices,
    Institution::ViolenceCounseling,
    Institution::ProtectiveShelter,
    Institution::InterventionOffice,
];

fn accompaniment_kpis(
    connection: &Connection,
    scope: &ReportScope,
    data: &mut ReportData,
) -> Result<()> {
    let institutions = texts(
        connection,
        scope,
        "SELECT institution FROM scoped_accompaniments ORDER BY id",
    )?;

    let mut counts = [0_i64; INSTITUTIONS.len()];
    let mut other = 0_i64;
    let mut examples = Examples::with_limit(OTHER_EXAMPLE_LIMIT);
    for institution in &institutions {
        let name = institution.as_deref().unwrap_or_default();
        match classify_institution(name) {
            Some(matched) => {
                if let Some(position) = INSTITUTIONS.iter().position(|known| *known == matched) {
                    counts[position] += 1;
                }
            }
            None => {
                other += 1;
                examples.offer(Some(name));
            }
        }
    }

    data.set("03_2_1_total", KpiValue::Count(institutions.len() as i64));
    for (institution, count) in INSTITUTIONS.iter().zip(counts) {
        data.set(institution_field(*institution), KpiValue::Count(count));
    }
    data.set("03_2_12_other", KpiValue::Count(other));
    data.set("03_2_12_a_which", KpiValue::examples(examples.items()));
    Ok(())
}

fn request_kpis(connection: &Connection, scope: &ReportScope, data: &mut ReportData) -> Result<()> {
    let columns = [
        ("03_3_1_total", "COUNT(*)".to_string()),
        (
            "03_3_2_a_medical_emergency",
            when("r.request_kind = 'medical-emergency'"),
        ),
        (
            "03_3_2_b_confidential_evidence",
            when("r.request_kind = 'confidential-evidence'"),
        ),
        ("03_3_2_c_counseling", when("r.request_kind = 'counseling'")),
        ("03_3_2_d_legal", when("r.request_kind = 'legal'")),
        ("03_3_2_e_other", when("r.request_kind = 'other'")),
        (
            "03_3_3_a_affected",
            when("r.requester IN ('affected', 'queer-affected')"),
        ),
        (
            "03_3_3_b_relatives",
            when("r.requester IN ('relative', 'queer-relative')"),
        ),
        (
            "03_3_3_c_professionals",
            when("r.requester IN ('professional', 'queer-professional')"),
        ),
        ("03_3_3_d_on_behalf", when("r.requester LIKE '%-for-%'")),
        (
            "03_3_3_e_anonymous",
            when("r.requester IN ('anonymous', 'queer-anonymous')"),
        ),
        ("03_3_3_f_queer", when("r.requester LIKE '%queer%'")),
    ];
    tally(connection, scope, "scoped_requests r", &columns, data)
}

fn residence_kpis(
    connection: &Connection,
    scope: &ReportScope,
    data: &mut ReportData,
) -> Result<()> {
    let known = RESIDENCE_REGIONS
        .iter()
        .map(|(code, _, _)| format!("'{code}'"))
        .collect::<Vec<_>>()
        .join(", ");
    let unknown = format!("COALESCE(cl.residence, '') NOT IN ({known})");

    let mut clients = vec![("04_1_0_a_clients", "COUNT(*)".to_string())];
    let mut consultations = vec![("04_1_0_b_consultations", "COUNT(*)".to_string())];
    for (code, clients_field, consultations_field) in RESIDENCE_REGIONS {
        let condition = format!("cl.residence = '{code}'");
        clients.push((clients_field, when(&condition)));
        consultations.push((consultations_field, when(&condition)));
    }
    clients.push((RESIDENCE_UNKNOWN_CLIENTS, when(&unknown)));
    consultations.push((RESIDENCE_UNKNOWN_CONSULTATIONS, when(&unknown)));

    tally(connection, scope, "scoped_clients cl", &clients, data)?;
    tally(
        connection,
        scope,
        CONSULTATIONS_WITH_CLIENTS,
        &consultations,
        data,
    )?;

    let mut countries = Examples::with_limit(NATIONALITY_EXAMPLE_LIMIT);
    for nationality in texts(
        connection,
        scope,
        "SELECT nationality FROM scoped_clients WHERE residence = 'abroad' ORDER BY id",
    )? {
        countries.offer(nationality.as_deref());
    }
    data.set(
        "04_1_6_c_which_countries",
        KpiValue::examples(countries.items()),
    );
    Ok(())
}

fn nationality_kpis(
    connection: &Connection,
    scope: &ReportScope,
    data: &mut ReportData,
) -> Result<()> {
    tally(
        connection,
        scope,
        "scoped_clients cl",
        &[("04_2_1_a_clients", when(NON_GERMAN))],
        data,
    )?;
    tally(
        connection,
        scope,
        CONSULTATIONS_WITH_CLIENTS,
        &[("04_2_2_a_consultations", when(NON_GERMAN))],
        data,
    )?;

    let mut countries = Examples::with_limit(NATIONALITY_EXAMPLE_LIMIT);
    let body = format!("SELECT cl.nationality FROM scoped_clients cl WHERE {NON_GERMAN} ORDER BY cl.id");
    for nationality in texts(connection, scope, &body)? {
        countries.offer(nationality.as_deref());
    }
    data.set(
        "04_2_3_a_which_countries",
        KpiValue::examples(countries.items()),
    );
    Ok(())
}

/// Age structure, disability and the client side of the report.
fn client_profile_kpis(
    connection: &Connection,
    scope: &ReportScope,
    data: &mut ReportData,
) -> Result<()> {
    let columns = [
        ("04_3_1_a_clients", age_band("cl.age", 18, Some(21))),
        ("04_3_2_a_clients", age_band("cl.age", 21, Some(27))),
        ("04_3_3_a_clients", age_band("cl.age", 27, Some(60))),
        ("04_3_4_a_clients", age_band("cl.age", 60, None)),
        ("04_3_5_a_clients", age_unknown("cl.age")),
        ("04_4_1_a_clients", when("cl.severe_disability = 'yes'")),
        (
            "04_4_2_a_clients",
            when(
                "cl.severe_disability = 'yes' \
                 AND TRIM(COALESCE(cl.disability_detail, '')) <> ''",
            ),
        ),
        (
            "04_4_3_a_clients",
            when("COALESCE(cl.severe_disability, '') IN ('', 'unspecified')"),
        ),
    ];
    tally(connection, scope, "scoped_clients cl", &columns, data)
}

fn incident_kpis(
    connection: &Connection,
    scope: &ReportScope,
    data: &mut ReportData,
) -> Result<()> {
    let columns = [
        ("04_5_1_a_affected_children", total("vi.affected_children")),
        (
            "04_5_1_b_directly_affected",
            total("vi.directly_affected_children"),
        ),
        ("04_8_1_total", "COUNT(*)".to_string()),
        ("04_8_1_a_reported", when("vi.report_filed = 'yes'")),
        ("04_8_1_b_not_reported", when("vi.report_filed = 'no'")),
        ("04_8_1_c_undecided", when("vi.report_filed = 'undecided'")),
        (
            "04_8_1_d_unspecified",
            when("COALESCE(vi.report_filed, '') NOT IN ('yes', 'no', 'undecided')"),
        ),
        ("04_8_2_a_collected", when("vi.evidence_collected = 'yes'")),
        ("04_8_2_b_not_collected", when("vi.evidence_collected = 'no'")),
        ("04_8_3_a_medical_care", when("vi.medical_care = 'yes'")),
    ];
    tally(connection, scope, "scoped_incidents vi", &columns, data)
}

const fn violence_field(kind: ViolenceType) -> &'static str {
    match kind {
        ViolenceType::Rape => "04_6_1_rape",
        ViolenceType::AttemptedRape => "04_6_2_attempted_rape",
        ViolenceType::SexualAssault => "04_6_3_sexual_assault",
        ViolenceType::AttemptedSexualAssault => "04_6_4_attempted_sexual_assault",
        ViolenceType::SexualHarassment => "04_6_5_sexual_harassment",
        ViolenceType::SexualExploitation => "04_6_6_sexual_exploitation",
        ViolenceType::Upskirting => "04_6_7_upskirting",
        ViolenceType::Catcalling => "04_6_8_catcalling",
        ViolenceType::Digital => "04_6_9_digital",
    }
}

fn violence_type_kpis(
    connection: &Connection,
    scope: &ReportScope,
    data: &mut ReportData,
) -> Result<()> {
    let mut counts = [0_i64; ViolenceType::ALL.len()];
    let mut other = 0_i64;
    let mut examples = Examples::with_limit(OTHER_EXAMPLE_LIMIT);

    for text in texts(
        connection,
        scope,
        "SELECT violence_type FROM scoped_incidents ORDER BY id",
    )? {
        let raw = text.as_deref().unwrap_or_default();
        let kinds = classify_violence(raw);
        if kinds.is_empty() {
            other += 1;
            examples.offer(Some(raw));
        }
        for kind in kinds {
            if let Some(position) = ViolenceType::ALL.iter().position(|known| *known == kind) {
                counts[position] += 1;
            }
        }
    }

    for (kind, count) in ViolenceType::ALL.into_iter().zip(counts) {
        data.set(violence_field(kind), KpiValue::Count(count));
    }
    data.set("04_6_10_other", KpiValue::Count(other));
    data.set("04_6_10_a_which", KpiValue::examples(examples.items()));
    Ok(())
}

fn consequence_kpis(
    connection: &Connection,
    scope: &ReportScope,
    data: &mut ReportData,
) -> Result<()> {
    let columns = [
        (
            "04_7_1_physical",
            when("COALESCE(vc.physical, '') NOT IN ('', 'none')"),
        ),
        (
            "04_7_2_psychological",
            when("COALESCE(vc.psychological, '') NOT IN ('', 'none')"),
        ),
        ("04_7_3_work_impairment", when("vc.work_impairment = 'yes'")),
        (
            "04_7_4_financial_hardship",
            when("vc.financial_hardship = 'yes'"),
        ),
        ("04_7_5_job_loss", when("vc.job_loss = 'yes'")),
        ("04_7_6_social_isolation", when("vc.social_isolation = 'yes'")),
        ("04_7_7_suicidality", when("vc.suicidality = 'yes'")),
        ("04_7_8_unspecified", when("vc.unspecified = 'yes'")),
        (
            "04_7_9_other",
            when("TRIM(COALESCE(vc.other_text, '')) <> ''"),
        ),
    ];
    tally(connection, scope, "scoped_consequences vc", &columns, data)?;

    let mut descriptions = Examples::with_limit(OTHER_EXAMPLE_LIMIT);
    for text in texts(
        connection,
        scope,
        "SELECT other_text FROM scoped_consequences ORDER BY id",
    )? {
        descriptions.offer(text.as_deref());
    }
    data.set(
        "04_7_9_a_description",
        KpiValue::examples(descriptions.items()),
    );
    Ok(())
}

const fn contact_field(source: ContactSource) -> &'static str {
    match source {
        ContactSource::Police => "05_1_1_police",
        ContactSource::Private => "05_1_2_private",
        ContactSource::Counseling => "05_1_3_counseling",
        ContactSource::Internet => "05_1_4_internet",
        ContactSource::Authorities => "05_1_5_authorities",
        ContactSource::Health => "05_1_6_health",
        ContactSource::Attorneys => "05_1_7_attorneys",
    }
}

const CONTACT_SOURCES: [ContactSource; 7] = [
    ContactSource::Police,
    ContactSource::Private,
    ContactSource::Counseling,
    ContactSource::Internet,
    ContactSource::Authorities,
    ContactSource::Health,
    ContactSource::Attorneys,
];

fn contact_source_kpis(
    connection: &Connection,
    scope: &ReportScope,
    data: &mut ReportData,
) -> Result<()> {
    let mut counts = [0_i64; CONTACT_SOURCES.len()];
    let mut unknown = 0_i64;
    let mut other = 0_i64;
    let mut examples = Examples::with_limit(OTHER_EXAMPLE_LIMIT);

    for contact_point in texts(
        connection,
        scope,
        "SELECT contact_point FROM scoped_clients ORDER BY id",
    )? {
        match classify_contact_point(contact_point.as_deref()) {
            ContactClass::Known(source) => {
                if let Some(position) = CONTACT_SOURCES.iter().position(|known| *known == source) {
                    counts[position] += 1;
                }
            }
            ContactClass::Unknown => unknown += 1,
            ContactClass::Other => {
                other += 1;
                examples.offer(contact_point.as_deref());
            }
        }
    }

    for (source, count) in CONTACT_SOURCES.into_iter().zip(counts) {
        data.set(contact_field(source), KpiValue::Count(count));
    }
    data.set("05_1_8_unknown", KpiValue::Count(unknown));
    data.set("05_1_9_other", KpiValue::Count(other));
    data.set("05_1_9_a_which", KpiValue::examples(examples.items()));
    Ok(())
}

fn interpreting_kpis(
    connection: &Connection,
    scope: &ReportScope,
    data: &mut ReportData,
) -> Result<()> {
    let (consultation_hours, accompaniment_hours, unspecified) = scope.query_row(
        connection,
        "SELECT
    (SELECT COALESCE(SUM(interpreter_hours), 0.0) FROM scoped_consultations),
    (SELECT COALESCE(SUM(interpreter_hours), 0.0) FROM scoped_accompaniments),
    (SELECT COUNT(*) FROM scoped_consultations WHERE interpreter_hours IS NULL)
      + (SELECT COUNT(*) FROM scoped_accompaniments WHERE interpreter_hours IS NULL)",
        |row| {
            Ok((
                row.get::<usize, f64>(0)?,
                row.get::<usize, f64>(1)?,
                row.get::<usize, i64>(2)?,
            ))
        },
    )?;

    data.set(
        "06_1_1_total_hours",
        KpiValue::hours(consultation_hours + accompaniment_hours),
    );
    data.set(
        "06_1_2_consultation_hours",
        KpiValue::hours(consultation_hours),
    );
    data.set(
        "06_1_3_accompaniment_hours",
        KpiValue::hours(accompaniment_hours),
    );
    data.set("06_1_4_unspecified", KpiValue::Count(unspecified));
    Ok(())
}
