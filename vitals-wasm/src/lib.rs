//! Framework-neutral WASM <-> JavaScript bridge for the vitals pipeline.

use serde::Deserialize;
use serde_wasm_bindgen::{from_value, to_value};
use vitals_core::{ChartBands, ChartKind, ClinicalRecord, ValueBand, VitalsError};
use wasm_bindgen::prelude::*;

/// DOM rendering lives in `vitals-ui`; re-exported so one bundle carries every entry point.
#[cfg(target_arch = "wasm32")]
pub use vitals_ui::render_chart;

#[derive(Deserialize)]
struct JsChartBands {
    #[serde(default)]
    temperature: Option<ValueBand>,
    #[serde(default)]
    heart_rate: Option<ValueBand>,
}

impl From<JsChartBands> for ChartBands {
    fn from(cfg: JsChartBands) -> Self {
        let mut base = ChartBands::default();
        if let Some(band) = cfg.temperature {
            base.temperature = band;
        }
        if let Some(band) = cfg.heart_rate {
            base.heart_rate = band;
        }
        base
    }
}

/// Normalize a record or an array of records into canonical form.
#[wasm_bindgen]
pub fn normalize_records(records: JsValue) -> Result<JsValue, JsValue> {
    #[cfg(target_arch = "wasm32")]
    console_error_panic_hook::set_once();

    let records = read_records(records)?;
    to_value(&records).map_err(|err| JsValue::from_str(&format!("could not serialize records: {err}")))
}

/// `(timestamp, value)` points for one observation code, in input order.
#[wasm_bindgen]
pub fn extract_series(records: JsValue, observation_code: &str) -> Result<JsValue, JsValue> {
    let records = read_records(records)?;
    let series = vitals_fhir::extract_series(&records, observation_code);
    to_value(&series).map_err(|err| JsValue::from_str(&format!("could not serialize series: {err}")))
}

/// SVG markup (or the placeholder) for `kind`, without touching the DOM.
#[wasm_bindgen]
pub fn render_chart_markup(
    records: JsValue,
    kind: &str,
    bands: Option<JsValue>,
) -> Result<String, JsValue> {
    let kind: ChartKind = kind.parse().map_err(format_vitals_error)?;
    let bands = match bands {
        Some(value) if !value.is_undefined() && !value.is_null() => {
            let cfg: JsChartBands = from_value(value)
                .map_err(|err| JsValue::from_str(&format!("could not read chart bands: {err}")))?;
            ChartBands::from(cfg)
        }
        _ => ChartBands::default(),
    };

    let records = read_records(records)?;
    let data = vitals_ui::chart_data(kind, &records);
    Ok(vitals_ui::chart_markup(&data, kind, &bands))
}

fn read_records(records: JsValue) -> Result<Vec<ClinicalRecord>, JsValue> {
    let payload = from_value::<serde_json::Value>(records)
        .map_err(|err| JsValue::from_str(&format!("could not read records: {err}")))?;
    vitals_fhir::normalize_payload(&payload).map_err(format_vitals_error)
}

fn format_vitals_error(err: VitalsError) -> JsValue {
    JsValue::from_str(&format!("Vitals error: {err}"))
}
