use std::fs;

use serde_json::{json, Value};
use vitals_core::{ClinicalRecord, RecordKind};
use vitals_fhir::{normalize, normalize_all, normalize_payload, normalize_str, to_transport};

fn fixture_path(name: &str) -> String {
    format!("{}/tests/data/{name}", env!("CARGO_MANIFEST_DIR"))
}

fn load_fixture(name: &str) -> Vec<Value> {
    let text = fs::read_to_string(fixture_path(name)).expect("fixture should be readable");
    serde_json::from_str(&text).expect("fixture should be a JSON array")
}

#[test]
fn vitals_normalize_identically_from_either_spelling() {
    let camel = normalize_all(&load_fixture("vitals_camel.json"));
    let snake = normalize_all(&load_fixture("vitals_snake.json"));

    assert_eq!(camel.len(), 5);
    assert_eq!(camel, snake);
}

#[test]
fn medication_logs_normalize_identically_from_either_spelling() {
    let camel = normalize_all(&load_fixture("medication_logs_camel.json"));
    let snake = normalize_all(&load_fixture("medication_logs_snake.json"));

    assert_eq!(camel, snake);
    assert_eq!(camel[1].medication_name(), Some("Lisinopril 10mg"));
    assert_eq!(camel[2].medication_name(), Some("Unknown"));
}

#[test]
fn observation_fields_land_in_canonical_shape() {
    let records = normalize_all(&load_fixture("vitals_camel.json"));
    let temperature = &records[0];

    assert_eq!(temperature.id.as_deref(), Some("obs-temp-1"));
    assert_eq!(temperature.status, "final");
    assert_eq!(
        temperature.timestamp.map(|ts| ts.to_rfc3339()),
        Some("2024-01-01T08:00:00+00:00".to_string())
    );
    assert_eq!(
        temperature.kind,
        RecordKind::Observation {
            observation_code: "8310-5".to_string(),
            value: Some(37.2),
            unit: Some("Cel".to_string()),
        }
    );

    // Offsets are folded into UTC.
    assert_eq!(
        records[2].timestamp.map(|ts| ts.to_rfc3339()),
        Some("2024-01-01T10:30:00+00:00".to_string())
    );
    assert_eq!(records[3].value(), None);
    assert_eq!(records[4].timestamp, None);
}

#[test]
fn missing_fields_fall_back_to_sentinels() {
    let record = normalize(&json!({}));
    assert_eq!(
        record,
        ClinicalRecord {
            id: None,
            timestamp: None,
            status: String::new(),
            kind: RecordKind::MedicationAdministration {
                medication_name: "Unknown".to_string(),
                active: None,
            },
        }
    );

    let observation = normalize(&json!({ "resourceType": "Observation" }));
    assert_eq!(observation.observation_code(), Some(""));
    assert_eq!(observation.value(), None);
}

#[test]
fn schedule_rows_keep_their_active_flag() {
    let records = normalize_all(&load_fixture("medications.json"));
    let active: Vec<bool> = records.iter().map(ClinicalRecord::is_active).collect();

    assert_eq!(active, vec![true, true, false]);
    assert_eq!(records[0].id.as_deref(), Some("1"));
    assert_eq!(records[2].medication_name(), Some("Amoxicillin 250mg"));
}

#[test]
fn zero_is_a_present_value() {
    let record = normalize(&json!({
        "resourceType": "Observation",
        "code": { "coding": [{ "code": "8867-4" }] },
        "value_quantity": { "value": 0 }
    }));
    assert_eq!(record.value(), Some(0.0));
}

#[test]
fn normalization_is_idempotent_through_transport_shape() {
    let mut fixtures = load_fixture("vitals_snake.json");
    fixtures.extend(load_fixture("medication_logs_snake.json"));
    fixtures.extend(load_fixture("medications.json"));

    for raw in &fixtures {
        let once = normalize(raw);
        let twice = normalize(&to_transport(&once));
        assert_eq!(once, twice, "record {raw} changed on second normalization");
    }
}

#[test]
fn payloads_accept_single_records_and_batches() {
    let single = normalize_payload(&json!({ "status": "completed", "medicationName": "Aspirin" }))
        .expect("object payload");
    assert_eq!(single.len(), 1);
    assert_eq!(single[0].medication_name(), Some("Aspirin"));

    let batch = normalize_str(r#"[{"code": "8310-5", "value": 36.6}, 42, {"name": "Aspirin"}]"#)
        .expect("array payload");
    assert_eq!(batch.len(), 2);
    assert_eq!(batch[0].observation_code(), Some("8310-5"));
    assert_eq!(batch[0].value(), Some(36.6));

    assert!(normalize_payload(&json!("not a record")).is_err());
    assert!(normalize_str("{ not json").is_err());
}

#[test]
fn blank_camel_case_values_fall_back_to_snake_case() {
    let record = normalize(&json!({
        "resourceType": "",
        "resource_type": "Observation",
        "code": { "coding": [{ "code": "8310-5" }] },
        "effectiveDateTime": "",
        "effective_date_time": "2024-01-01T08:00:00Z",
        "valueQuantity": {},
        "value_quantity": { "value": 37.4, "unit": "Cel" }
    }));

    let reference = normalize(&json!({
        "resourceType": "Observation",
        "code": { "coding": [{ "code": "8310-5" }] },
        "effectiveDateTime": "2024-01-01T08:00:00Z",
        "valueQuantity": { "value": 37.4, "unit": "Cel" }
    }));

    assert_eq!(record, reference);
    assert_eq!(record.value(), Some(37.4));
    assert!(record.timestamp.is_some());
}

#[test]
fn blank_values_under_both_spellings_stay_absent() {
    let record = normalize(&json!({
        "code": "8867-4",
        "effectiveDateTime": " ",
        "effective_date_time": "",
        "valueQuantity": {}
    }));

    assert!(record.is_observation());
    assert_eq!(record.timestamp, None);
    assert_eq!(record.value(), None);
}
