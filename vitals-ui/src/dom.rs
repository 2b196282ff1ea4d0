use serde_wasm_bindgen::from_value;
use vitals_core::{ChartBands, ChartKind, VitalsError};
use wasm_bindgen::prelude::*;
use web_sys::{console, Document};

use crate::render::{chart_data, render, render_error};
use crate::styles;
use crate::surface::Surface;

/// Surface backed by DOM elements looked up by id.
pub struct DomSurface {
    document: Document,
}

impl DomSurface {
    pub fn from_window() -> Result<Self, VitalsError> {
        let document = web_sys::window()
            .and_then(|window| window.document())
            .ok_or_else(|| VitalsError::Surface {
                id: "document".to_string(),
                message: "no window document available".to_string(),
            })?;
        if let Err(err) = styles::ensure_styles(&document) {
            console::error_1(&err);
        }
        Ok(Self { document })
    }
}

impl Surface for DomSurface {
    fn replace_contents(&mut self, surface_id: &str, markup: &str) -> Result<(), VitalsError> {
        let element = self
            .document
            .get_element_by_id(surface_id)
            .ok_or_else(|| VitalsError::Surface {
                id: surface_id.to_string(),
                message: "no element with this id".to_string(),
            })?;
        element.set_inner_html(markup);
        Ok(())
    }

    fn replace_text(&mut self, surface_id: &str, text: &str) -> Result<(), VitalsError> {
        let element = self
            .document
            .get_element_by_id(surface_id)
            .ok_or_else(|| VitalsError::Surface {
                id: surface_id.to_string(),
                message: "no element with this id".to_string(),
            })?;
        element.set_text_content(Some(text));
        Ok(())
    }
}

/// Normalize `records`, extract the series for `kind` and draw it into `container_id`.
///
/// Bad input is reported inside the container and on the console rather than thrown.
#[wasm_bindgen]
pub fn render_chart(
    container_id: &str,
    records: JsValue,
    kind: &str,
    bands: Option<JsValue>,
) -> Result<(), JsValue> {
    let mut surface =
        DomSurface::from_window().map_err(|err| JsValue::from_str(&err.to_string()))?;

    if let Err(err) = draw(&mut surface, container_id, records, kind, bands) {
        console::error_1(&JsValue::from_str(&format!("chart {container_id}: {err}")));
        render_error(&mut surface, container_id, "Error loading charts")
            .map_err(|err| JsValue::from_str(&err.to_string()))?;
    }
    Ok(())
}

fn draw(
    surface: &mut DomSurface,
    container_id: &str,
    records: JsValue,
    kind: &str,
    bands: Option<JsValue>,
) -> Result<(), VitalsError> {
    let kind: ChartKind = kind.parse()?;
    let bands = match bands {
        Some(value) if !value.is_undefined() && !value.is_null() => from_value::<ChartBands>(value)
            .map_err(|err| VitalsError::Parse(format!("chart bands: {err}")))?,
        _ => ChartBands::default(),
    };
    let payload = from_value::<serde_json::Value>(records)
        .map_err(|err| VitalsError::Parse(err.to_string()))?;
    let records = vitals_fhir::normalize_payload(&payload)?;
    render(&chart_data(kind, &records), surface, container_id, kind, &bands)
}
