//! Chart renderer for the vitals dashboard: scales, axes, lines and markers as SVG.
//!
//! Rendering is target independent and writes into any [`Surface`]; on
//! `wasm32` a DOM-backed surface is available as well.

mod curve;
mod render;
pub mod scale;
mod surface;
mod svg;

#[cfg(target_arch = "wasm32")]
mod dom;
#[cfg(target_arch = "wasm32")]
mod styles;

pub use render::{
    chart_data, chart_markup, marker_color, placeholder_markup, render, render_error, ChartData,
    FAILURE_COLOR, SUCCESS_COLOR, WARNING_COLOR,
};
pub use surface::{MemorySurface, Surface};
pub use svg::escape;

#[cfg(target_arch = "wasm32")]
pub use dom::{render_chart, DomSurface};
