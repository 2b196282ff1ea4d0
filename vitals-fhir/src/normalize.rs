use chrono::{DateTime, NaiveDateTime, SecondsFormat, Utc};
use serde_json::{json, Map, Value};
use vitals_core::{ClinicalRecord, RecordKind, VitalsError};

/// Name used when a medication record carries no usable display name.
pub const UNKNOWN_MEDICATION: &str = "Unknown";

/// Normalize one transport record into its canonical shape.
///
/// Every logical field is looked up under its camelCase key first and its
/// snake_case key second; absent or malformed fields fall back to sentinel
/// defaults, so this never fails.
pub fn normalize(raw: &Value) -> ClinicalRecord {
    let kind = match record_type(raw) {
        RecordType::Observation => RecordKind::Observation {
            observation_code: observation_code(raw).unwrap_or_default(),
            value: observation_value(raw),
            unit: quantity(raw)
                .and_then(|quantity| quantity.get("unit"))
                .and_then(Value::as_str)
                .map(str::to_string),
        },
        RecordType::Medication => RecordKind::MedicationAdministration {
            medication_name: medication_name(raw)
                .unwrap_or_else(|| UNKNOWN_MEDICATION.to_string()),
            active: raw.get("active").and_then(Value::as_bool),
        },
    };

    ClinicalRecord {
        id: raw.get("id").and_then(id_text),
        timestamp: dual_field(raw, "effectiveDateTime", "effective_date_time")
            .and_then(Value::as_str)
            .and_then(parse_datetime),
        status: raw
            .get("status")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string(),
        kind,
    }
}

/// Normalize every element of a collection, keeping input order.
pub fn normalize_all<'a, I>(values: I) -> Vec<ClinicalRecord>
where
    I: IntoIterator<Item = &'a Value>,
{
    values.into_iter().map(normalize).collect()
}

/// Normalize a payload that is either a single record or a batch of records.
pub fn normalize_payload(payload: &Value) -> Result<Vec<ClinicalRecord>, VitalsError> {
    match payload {
        Value::Array(items) => Ok(items
            .iter()
            .filter(|item| {
                let keep = item.is_object();
                if !keep {
                    tracing::debug!(entry = %item, "skipping non-object batch entry");
                }
                keep
            })
            .map(normalize)
            .collect()),
        Value::Object(_) => Ok(vec![normalize(payload)]),
        other => Err(VitalsError::Parse(format!(
            "expected a record or an array of records, received {}",
            json_kind(other)
        ))),
    }
}

/// Parse a JSON document and normalize the record(s) it contains.
pub fn normalize_str(payload: &str) -> Result<Vec<ClinicalRecord>, VitalsError> {
    let value: Value =
        serde_json::from_str(payload).map_err(|err| VitalsError::Parse(err.to_string()))?;
    normalize_payload(&value)
}

/// Render a canonical record back into its camelCase transport shape.
///
/// `normalize(&to_transport(record)) == *record` for every record.
pub fn to_transport(record: &ClinicalRecord) -> Value {
    let mut object = Map::new();

    match &record.kind {
        RecordKind::Observation {
            observation_code,
            value,
            unit,
        } => {
            object.insert("resourceType".into(), json!("Observation"));
            object.insert(
                "code".into(),
                json!({ "coding": [{ "code": observation_code }] }),
            );
            if value.is_some() || unit.is_some() {
                let mut quantity = Map::new();
                if let Some(value) = value {
                    quantity.insert("value".into(), json!(value));
                }
                if let Some(unit) = unit {
                    quantity.insert("unit".into(), json!(unit));
                }
                object.insert("valueQuantity".into(), Value::Object(quantity));
            }
        }
        RecordKind::MedicationAdministration {
            medication_name,
            active,
        } => {
            object.insert("resourceType".into(), json!("MedicationStatement"));
            object.insert(
                "medication".into(),
                json!({ "display": medication_name }),
            );
            if let Some(active) = active {
                object.insert("active".into(), json!(active));
            }
        }
    }

    if let Some(id) = &record.id {
        object.insert("id".into(), json!(id));
    }
    if let Some(timestamp) = record.timestamp {
        object.insert(
            "effectiveDateTime".into(),
            json!(timestamp.to_rfc3339_opts(SecondsFormat::AutoSi, true)),
        );
    }
    object.insert("status".into(), json!(record.status));

    Value::Object(object)
}

/// Parse the timestamp spellings seen on the wire. Zone-less values are read as UTC.
pub fn parse_datetime(value: &str) -> Option<DateTime<Utc>> {
    let value = value.trim();
    if let Ok(parsed) = DateTime::parse_from_rfc3339(value) {
        return Some(parsed.with_timezone(&Utc));
    }
    ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"]
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(value, format).ok())
        .map(|naive| naive.and_utc())
}

enum RecordType {
    Observation,
    Medication,
}

fn record_type(raw: &Value) -> RecordType {
    match dual_field(raw, "resourceType", "resource_type").and_then(Value::as_str) {
        Some("Observation") => RecordType::Observation,
        Some("MedicationStatement" | "MedicationAdministration" | "Medication") => {
            RecordType::Medication
        }
        _ if raw.get("code").is_some() || quantity(raw).is_some() => RecordType::Observation,
        _ => RecordType::Medication,
    }
}

/// Null, blank strings and empty containers count as absent, so the snake_case
/// spelling is consulted when the camelCase key holds nothing.
fn dual_field<'a>(raw: &'a Value, camel: &str, snake: &str) -> Option<&'a Value> {
    raw.get(camel)
        .filter(|value| !is_blank(value))
        .or_else(|| raw.get(snake).filter(|value| !is_blank(value)))
}

fn is_blank(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::String(text) => text.trim().is_empty(),
        Value::Array(items) => items.is_empty(),
        Value::Object(fields) => fields.is_empty(),
        Value::Bool(_) | Value::Number(_) => false,
    }
}

fn quantity(raw: &Value) -> Option<&Value> {
    dual_field(raw, "valueQuantity", "value_quantity").filter(|value| value.is_object())
}

fn observation_value(raw: &Value) -> Option<f64> {
    match quantity(raw) {
        Some(quantity) => quantity.get("value").and_then(Value::as_f64),
        None => raw.get("value").and_then(Value::as_f64),
    }
}

fn observation_code(raw: &Value) -> Option<String> {
    let code = raw.get("code")?;
    if let Some(text) = code.as_str() {
        return Some(text.trim().to_string());
    }
    code.get("coding")
        .and_then(Value::as_array)
        .and_then(|codings| codings.first())
        .and_then(|coding| coding.get("code"))
        .and_then(Value::as_str)
        .map(|text| text.trim().to_string())
}

fn medication_name(raw: &Value) -> Option<String> {
    let display = raw
        .get("medication")
        .and_then(|medication| medication.get("display"));

    [
        display,
        raw.get("medicationName"),
        raw.get("medication_name"),
        raw.get("name"),
    ]
    .into_iter()
    .flatten()
    .filter_map(Value::as_str)
    .map(str::trim)
    .find(|text| !text.is_empty())
    .map(str::to_string)
}

fn id_text(value: &Value) -> Option<String> {
    match value {
        Value::String(text) if !text.is_empty() => Some(text.clone()),
        Value::Number(number) => Some(number.to_string()),
        _ => None,
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
