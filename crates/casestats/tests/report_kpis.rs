mod common;

use std::sync::Arc;

use casestats::report::{
    FacetValue, Report, ReportEngine, ReportError, ReportRequest, ReportRequestError,
};
use casestats::telemetry::{NoopTelemetry, RecordingTelemetry};
use common::{seed, store};
use rusqlite::Connection;
use serde_json::json;

const REPORT_ROWS: &str = r#"
INSERT INTO clients (id, age, gender_identity, residence, nationality, contact_point, severe_disability, disability_detail)
VALUES
    (1, 19, 'cis-female', 'leipzig-city', 'deutsch', 'Polizei', 'yes', 'GdB 50'),
    (2, 30, 'trans-male', 'abroad', 'Syrian', 'Internetrecherche', 'no', NULL),
    (3, NULL, 'diverse', NULL, '', NULL, NULL, NULL),
    (4, 65, 'cis-female', 'north-saxony', 'Polish', 'Flyer', 'no', NULL);
INSERT INTO cases (id, client_id, status, start_date)
VALUES
    (1, 1, 'open', '2024-02-01'),
    (2, 2, 'closed', '2024-05-10'),
    (3, 3, 'ongoing', '2024-06-01'),
    (4, 4, 'closed', '2023-12-31'),
    (5, NULL, 'open', '2024-07-01');
INSERT INTO consultations (id, counseling_office, scheduled_at, duration, status, interpreter_hours, session_count, "type", case_id)
VALUES
    (1, 'leipzig-city', '2024-02-05T10:00:00', 60, 'occurred', 1.5, NULL, 'in-person', 1),
    (2, 'leipzig-city', '2024-02-20T11:00:00', 30, 'occurred', NULL, 2, 'phone', 1),
    (3, 'north-saxony', '2024-05-11T09:30:00', 45, 'occurred', 0.5, 1, 'video', 2),
    (4, 'north-saxony', '2024-06-02T15:00:00', 20, 'occurred', NULL, 1, 'written', 3),
    (5, 'north-saxony', '2024-05-12T09:00:00', 90, 'cancelled', 3.0, 1, 'in-person', 2),
    (6, 'leipzig-city', '2024-01-10T10:00:00', 60, 'occurred', NULL, 1, 'in-person', 4),
    (7, 'leipzig-city', '2025-01-05T10:00:00', 60, 'occurred', NULL, 1, 'outreach', 1);
INSERT INTO accompaniments (id, "date", institution, interpreter_hours, case_id)
VALUES
    (1, '2024-02-10', 'Amtsgericht Leipzig', 2.0, 1),
    (2, '2024-05-15', 'Polizeirevier Süd', NULL, 2),
    (3, '2024-05-16', 'Standesamt', 0.25, 2),
    (4, '2024-06-10', 'Standesamt', 1.0, 3),
    (5, '2024-03-01', 'Polizei', 1.0, 4);
INSERT INTO requests (id, request_date, location, requester, request_kind)
VALUES
    (1, '2024-03-01', 'leipzig-city', 'queer-affected', 'counseling'),
    (2, '2024-04-01', 'leipzig-city', 'professional-for-affected', 'legal'),
    (3, '2024-05-01', 'north-saxony', 'relative', 'counseling'),
    (4, '2023-11-01', 'leipzig-city', 'anonymous', 'legal');
INSERT INTO violence_incidents (id, location, violence_type, report_filed, medical_care, evidence_collected, affected_children, directly_affected_children, case_id)
VALUES
    (1, 'leipzig', 'Versuchte Vergewaltigung, Vergewaltigung', 'yes', 'yes', 'yes', 2, 1, 1),
    (2, 'abroad', 'sexual assault; catcalling', 'no', 'no', 'no', NULL, NULL, 2),
    (3, 'leipzig', 'Stalking', NULL, NULL, NULL, NULL, NULL, 3),
    (4, 'leipzig', 'rape', 'yes', NULL, NULL, NULL, NULL, 4);
INSERT INTO violence_consequences (id, incident_id, psychological, physical, job_loss, suicidality, other_text)
VALUES
    (1, 1, 'ptsd', 'none', NULL, 'yes', 'Schlafstörungen'),
    (2, 2, 'none', 'pain', 'yes', NULL, NULL);
"#;

fn seeded() -> Connection {
    let connection = store();
    seed(&connection, REPORT_ROWS);
    connection
}

fn year_2024() -> ReportRequest {
    ReportRequest::default().with_period(Some("2024-01-01"), Some("2024-12-31"))
}

fn report(connection: &Connection, request: &ReportRequest) -> Report {
    ReportEngine::new(Arc::new(NoopTelemetry))
        .run(connection, request)
        .expect("report should compute")
}

#[test]
fn consultation_kpis_follow_period_and_status() {
    let data = report(&seeded(), &year_2024()).data;

    assert_eq!(data.count("03_1_1_a_total"), 4);
    assert_eq!(data.count("03_1_1_b_female"), 2);
    assert_eq!(data.count("03_1_1_c_male"), 1);
    assert_eq!(data.count("03_1_1_d_diverse"), 1);

    assert_eq!(data.count("03_1_2_b_18_to_20"), 2);
    assert_eq!(data.count("03_1_2_c_21_to_26"), 0);
    assert_eq!(data.count("03_1_2_d_27_to_59"), 1);
    assert_eq!(data.count("03_1_2_e_60_plus"), 0);
    assert_eq!(data.count("03_1_2_f_unknown"), 1);

    assert_eq!(data.count("03_1_3_a_in_person"), 1);
    assert_eq!(data.count("03_1_3_b_outreach"), 0);
    assert_eq!(data.count("03_1_3_c_phone"), 1);
    assert_eq!(data.count("03_1_3_d_video"), 1);
    assert_eq!(data.count("03_1_3_e_written"), 1);

    assert_eq!(data.count("03_1_4_a_minutes"), 155);
    assert_eq!(data.count("03_1_4_b_sessions"), 5);
}

#[test]
fn consultation_total_counts_clients_outside_the_gender_buckets() {
    let connection = store();
    seed(
        &connection,
        r#"
INSERT INTO clients (id, gender_identity) VALUES
    (1, 'cis-female'),
    (2, 'unspecified'),
    (3, NULL);
INSERT INTO cases (id, client_id, status, start_date) VALUES
    (1, 1, 'open', '2024-03-01'),
    (2, 2, 'open', '2024-03-01'),
    (3, 3, 'open', '2024-03-01'),
    (4, NULL, 'open', '2024-03-01');
INSERT INTO consultations (id, scheduled_at, status, "type", case_id) VALUES
    (1, '2024-03-04T10:00:00', 'occurred', 'in-person', 1),
    (2, '2024-03-05T10:00:00', 'occurred', 'phone', 2),
    (3, '2024-03-06T10:00:00', 'occurred', 'phone', 3),
    (4, '2024-03-07T10:00:00', 'occurred', 'video', 4),
    (5, '2024-03-08T10:00:00', 'cancelled', 'video', 1);
"#,
    );
    let occurred: i64 = connection
        .query_row(
            "SELECT COUNT(*) FROM consultations WHERE status = 'occurred'",
            [],
            |row| row.get(0),
        )
        .expect("count should succeed");

    let data = report(&connection, &year_2024()).data;

    let total = data.count("03_1_1_a_total");
    let bucketed = data.count("03_1_1_b_female")
        + data.count("03_1_1_c_male")
        + data.count("03_1_1_d_diverse");
    assert_eq!(total, occurred);
    assert_eq!(total, 4);
    assert_eq!(bucketed, 1);
    assert!(total >= bucketed);
    assert_eq!(data.count("03_1_2_a_total"), 4);
    assert_eq!(data.count("03_1_2_f_unknown"), 4);
}

#[test]
fn accompaniments_are_classified_by_institution() {
    let data = report(&seeded(), &year_2024()).data;

    assert_eq!(data.count("03_2_1_total"), 4);
    assert_eq!(data.count("03_2_2_courts"), 1);
    assert_eq!(data.count("03_2_3_police"), 1);
    assert_eq!(data.count("03_2_5_medical"), 0);
    assert_eq!(data.count("03_2_12_other"), 2);
    assert_eq!(data.text("03_2_12_a_which"), "Standesamt");
}

#[test]
fn requests_are_counted_by_kind_and_requester() {
    let data = report(&seeded(), &year_2024()).data;

    assert_eq!(data.count("03_3_1_total"), 3);
    assert_eq!(data.count("03_3_2_c_counseling"), 2);
    assert_eq!(data.count("03_3_2_d_legal"), 1);
    assert_eq!(data.count("03_3_3_a_affected"), 1);
    assert_eq!(data.count("03_3_3_b_relatives"), 1);
    assert_eq!(data.count("03_3_3_c_professionals"), 0);
    assert_eq!(data.count("03_3_3_d_on_behalf"), 1);
    assert_eq!(data.count("03_3_3_e_anonymous"), 0);
    assert_eq!(data.count("03_3_3_f_queer"), 1);
}

#[test]
fn client_profile_kpis_cover_scoped_clients_only() {
    let data = report(&seeded(), &year_2024()).data;

    assert_eq!(data.count("04_1_0_a_clients"), 3);
    assert_eq!(data.count("04_1_1_a_clients"), 1);
    assert_eq!(data.count("04_1_3_a_clients"), 0);
    assert_eq!(data.count("04_1_6_a_clients"), 1);
    assert_eq!(data.count("04_1_7_a_clients"), 1);
    assert_eq!(data.count("04_1_0_b_consultations"), 4);
    assert_eq!(data.count("04_1_1_b_consultations"), 2);
    assert_eq!(data.count("04_1_6_b_consultations"), 1);
    assert_eq!(data.count("04_1_7_b_consultations"), 1);
    assert_eq!(data.text("04_1_6_c_which_countries"), "Syrian");

    assert_eq!(data.count("04_2_1_a_clients"), 1);
    assert_eq!(data.count("04_2_2_a_consultations"), 1);
    assert_eq!(data.text("04_2_3_a_which_countries"), "Syrian");

    assert_eq!(data.count("04_3_1_a_clients"), 1);
    assert_eq!(data.count("04_3_3_a_clients"), 1);
    assert_eq!(data.count("04_3_4_a_clients"), 0);
    assert_eq!(data.count("04_3_5_a_clients"), 1);

    assert_eq!(data.count("04_4_1_a_clients"), 1);
    assert_eq!(data.count("04_4_2_a_clients"), 1);
    assert_eq!(data.count("04_4_3_a_clients"), 1);

    assert_eq!(data.count("05_1_1_police"), 1);
    assert_eq!(data.count("05_1_4_internet"), 1);
    assert_eq!(data.count("05_1_8_unknown"), 1);
    assert_eq!(data.count("05_1_9_other"), 0);
    assert_eq!(data.text("05_1_9_a_which"), "-");
}

#[test]
fn attempted_violence_is_not_also_counted_as_completed() {
    let data = report(&seeded(), &year_2024()).data;

    assert_eq!(data.count("04_6_1_rape"), 0);
    assert_eq!(data.count("04_6_2_attempted_rape"), 1);
    assert_eq!(data.count("04_6_3_sexual_assault"), 1);
    assert_eq!(data.count("04_6_4_attempted_sexual_assault"), 0);
    assert_eq!(data.count("04_6_8_catcalling"), 1);
    assert_eq!(data.count("04_6_10_other"), 1);
    assert_eq!(data.text("04_6_10_a_which"), "Stalking");
}

#[test]
fn incident_and_consequence_kpis() {
    let data = report(&seeded(), &year_2024()).data;

    assert_eq!(data.count("04_5_1_a_affected_children"), 2);
    assert_eq!(data.count("04_5_1_b_directly_affected"), 1);

    assert_eq!(data.count("04_7_1_physical"), 1);
    assert_eq!(data.count("04_7_2_psychological"), 1);
    assert_eq!(data.count("04_7_5_job_loss"), 1);
    assert_eq!(data.count("04_7_7_suicidality"), 1);
    assert_eq!(data.count("04_7_9_other"), 1);
    assert_eq!(data.text("04_7_9_a_description"), "Schlafstörungen");

    assert_eq!(data.count("04_8_1_total"), 3);
    assert_eq!(data.count("04_8_1_a_reported"), 1);
    assert_eq!(data.count("04_8_1_b_not_reported"), 1);
    assert_eq!(data.count("04_8_1_c_undecided"), 0);
    assert_eq!(data.count("04_8_1_d_unspecified"), 1);
    assert_eq!(data.count("04_8_2_a_collected"), 1);
    assert_eq!(data.count("04_8_2_b_not_collected"), 1);
    assert_eq!(data.count("04_8_3_a_medical_care"), 1);
}

#[test]
fn interpreting_hours_add_consultations_and_accompaniments() {
    let data = report(&seeded(), &year_2024()).data;

    assert_eq!(data.hours("06_1_2_consultation_hours"), 2.0);
    assert_eq!(data.hours("06_1_3_accompaniment_hours"), 3.25);
    assert_eq!(data.hours("06_1_1_total_hours"), 5.25);
    assert_eq!(data.count("06_1_4_unspecified"), 3);
}

#[test]
fn missing_period_covers_the_whole_store() {
    let data = report(&seeded(), &ReportRequest::default()).data;

    assert_eq!(data.count("03_1_1_a_total"), 6);
    assert_eq!(data.count("03_2_1_total"), 5);
    assert_eq!(data.count("03_3_1_total"), 4);
    assert_eq!(data.count("04_6_1_rape"), 1);
}

#[test]
fn facets_narrow_their_own_collection() {
    let connection = seeded();

    let phone_only = report(
        &connection,
        &year_2024().with_facet("consultation_type", FacetValue::One("phone".to_string())),
    )
    .data;
    assert_eq!(phone_only.count("03_1_1_a_total"), 1);
    assert_eq!(phone_only.count("04_1_0_b_consultations"), 1);
    assert_eq!(phone_only.count("03_2_1_total"), 4);
    assert_eq!(phone_only.count("04_1_0_a_clients"), 3);

    let legacy_alias = report(
        &connection,
        &year_2024().with_facet("beratungsart", FacetValue::One("phone".to_string())),
    )
    .data;
    assert_eq!(legacy_alias, phone_only);

    let closed_cases = report(
        &connection,
        &year_2024().with_facet("case_status", FacetValue::One("closed".to_string())),
    )
    .data;
    assert_eq!(closed_cases.count("03_1_1_a_total"), 1);
    assert_eq!(closed_cases.count("04_1_0_a_clients"), 1);
    assert_eq!(closed_cases.count("03_3_1_total"), 3);

    let ptsd = report(
        &connection,
        &year_2024().with_facet(
            "psychological_consequences",
            FacetValue::Many(vec!["ptsd".to_string(), "anxiety".to_string()]),
        ),
    )
    .data;
    assert_eq!(ptsd.count("04_7_2_psychological"), 1);
    assert_eq!(ptsd.count("04_7_1_physical"), 0);
    assert_eq!(ptsd.count("04_8_1_total"), 3);
}

#[test]
fn identical_requests_give_identical_reports() {
    let connection = seeded();
    let request = year_2024().with_facet("report_filed", FacetValue::One("yes".to_string()));

    let first = report(&connection, &request);
    let second = report(&connection, &request);
    assert_eq!(first, second);
    assert_eq!(first.data.count("04_8_1_total"), 1);
}

#[test]
fn request_errors_are_raised_before_computing() {
    let telemetry = RecordingTelemetry::shared();
    let engine = ReportEngine::new(telemetry.clone());
    let connection = seeded();

    let invalid_date = ReportRequest::from_json(json!({"zeitraum_start": "31.12.2024"}))
        .expect("request should parse");
    match engine.run(&connection, &invalid_date) {
        Err(ReportError::Request(ReportRequestError::InvalidDate { field, .. })) => {
            assert_eq!(field, "zeitraum_start");
        }
        other => panic!("expected an invalid date, got {other:?}"),
    }

    let unknown_facet = ReportRequest::from_json(json!({"favourite_colour": "blue"}))
        .expect("request should parse");
    match engine.run(&connection, &unknown_facet) {
        Err(ReportError::Request(error)) => assert_eq!(error.code(), "unknown_filter"),
        other => panic!("expected an unknown filter, got {other:?}"),
    }

    assert!(telemetry.event_names().is_empty());
}

#[test]
fn incomplete_records_are_reported_to_telemetry() {
    let telemetry = RecordingTelemetry::shared();
    ReportEngine::new(telemetry.clone())
        .run(&seeded(), &year_2024())
        .expect("report should compute");

    assert_eq!(
        telemetry.event_names(),
        vec!["incomplete_records", "incomplete_records", "report_computed"]
    );
}
