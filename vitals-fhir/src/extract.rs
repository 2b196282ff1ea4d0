use vitals_core::{ClinicalRecord, Series, SeriesPoint, StatusPoint, StatusSeries};

/// Points for one observation code, in input order.
///
/// Records without a value are skipped, as are records whose timestamp
/// could not be parsed. An empty result is a valid series.
pub fn extract_series(records: &[ClinicalRecord], observation_code: &str) -> Series {
    let mut undated = 0usize;
    let points: Vec<SeriesPoint> = records
        .iter()
        .filter(|record| record.observation_code() == Some(observation_code))
        .filter_map(|record| record.value().map(|value| (record.timestamp, value)))
        .filter_map(|(timestamp, value)| match timestamp {
            Some(timestamp) => Some(SeriesPoint { timestamp, value }),
            None => {
                undated += 1;
                None
            }
        })
        .collect();

    if undated > 0 {
        tracing::debug!(
            code = observation_code,
            dropped = undated,
            "dropped observations without a parsable timestamp"
        );
    }

    Series::new(observation_code, points)
}

/// Medication administrations as `(timestamp, medication, status)` markers, in input order.
pub fn extract_status_series(records: &[ClinicalRecord]) -> StatusSeries {
    let mut undated = 0usize;
    let points = records
        .iter()
        .filter_map(|record| {
            let category = record.medication_name()?;
            let Some(timestamp) = record.timestamp else {
                undated += 1;
                return None;
            };
            Some(StatusPoint {
                timestamp,
                category: category.to_string(),
                status: record.status.clone(),
            })
        })
        .collect();

    if undated > 0 {
        tracing::debug!(
            dropped = undated,
            "dropped medication events without a parsable timestamp"
        );
    }

    StatusSeries { points }
}
