#![cfg(target_arch = "wasm32")]

use wasm_bindgen::{JsCast, JsValue};
use web_sys::{Document, Node};

const STYLE_TAG_SELECTOR: &str = "style[data-vitals-ui]";

/// Default chart styling, overridable through the custom properties below.
pub const DEFAULT_STYLES: &str = r#"
:root {
  --vitals-font-family: 'Inter', system-ui, -apple-system, BlinkMacSystemFont, 'Segoe UI', sans-serif;
  --vitals-axis: #52606d;
  --vitals-axis-text: #3f4c5a;
  --vitals-grid: rgba(148, 163, 184, 0.28);
  --vitals-placeholder: #666666;
  --vitals-error: #b42318;
}

svg.chart {
  font-family: var(--vitals-font-family);
  max-width: 100%;
  height: auto;
  overflow: visible;
}

svg.chart .axis line,
svg.chart .axis .domain {
  stroke: var(--vitals-axis);
  shape-rendering: crispEdges;
}

svg.chart .axis text {
  fill: var(--vitals-axis-text);
  font-size: 10px;
  font-variant-numeric: tabular-nums;
}

svg.chart .axis-title {
  font-size: 12px;
  font-weight: 600;
}

svg.chart circle {
  cursor: pointer;
  transition: r 120ms ease-in-out;
}

svg.chart circle:hover {
  r: 8;
}

.chart-placeholder {
  text-align: center;
  padding: 50px;
  color: var(--vitals-placeholder);
  font-family: var(--vitals-font-family);
}

.chart-placeholder.chart-error {
  color: var(--vitals-error);
}
"#;

pub fn ensure_styles(document: &Document) -> Result<(), JsValue> {
    if document.query_selector(STYLE_TAG_SELECTOR)?.is_some() {
        return Ok(());
    }

    let head = document
        .head()
        .ok_or_else(|| JsValue::from_str("document has no <head> element"))?;

    let style_el = document.create_element("style")?;
    style_el.set_attribute("data-vitals-ui", "v1")?;
    style_el.set_text_content(Some(DEFAULT_STYLES));
    head.append_child(&style_el.clone().dyn_into::<Node>()?)?;

    Ok(())
}
