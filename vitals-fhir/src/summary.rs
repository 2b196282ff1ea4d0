use chrono::NaiveDate;
use vitals_core::{ClinicalRecord, DashboardSummary, HEART_RATE_CODE, TEMPERATURE_CODE};

/// Headline numbers for the overview tab.
///
/// `today` is the UTC calendar day used for the taken-today count.
pub fn summarize(
    medications: &[ClinicalRecord],
    logs: &[ClinicalRecord],
    vitals: &[ClinicalRecord],
    today: NaiveDate,
) -> DashboardSummary {
    DashboardSummary {
        active_medications: count_active(medications),
        taken_today: count_taken_on(logs, today),
        current_temperature: latest_value(vitals, TEMPERATURE_CODE),
        current_heart_rate: latest_value(vitals, HEART_RATE_CODE),
    }
}

pub fn count_active(medications: &[ClinicalRecord]) -> usize {
    medications.iter().filter(|record| record.is_active()).count()
}

/// Logs on `day` whose status reads as an administered dose.
///
/// Days are UTC calendar days: a log stamped with an offset counts on the
/// date its instant falls on in UTC, not on its local date.
pub fn count_taken_on(logs: &[ClinicalRecord], day: NaiveDate) -> usize {
    logs.iter()
        .filter(|log| log.timestamp.map(|ts| ts.date_naive()) == Some(day))
        .filter(|log| {
            let status = log.status.to_lowercase();
            status == "completed" || status == "taken"
        })
        .count()
}

/// Value of the most recent observation carrying `code`.
///
/// The newest matching record wins even when it has no value, in which case
/// the reading is reported as missing. Undated records rank oldest; ties keep
/// the earliest record in input order.
pub fn latest_value(vitals: &[ClinicalRecord], code: &str) -> Option<f64> {
    let mut latest: Option<&ClinicalRecord> = None;
    for record in vitals
        .iter()
        .filter(|record| record.observation_code() == Some(code))
    {
        match latest {
            Some(current) if current.timestamp >= record.timestamp => {}
            _ => latest = Some(record),
        }
    }
    latest.and_then(ClinicalRecord::value)
}
