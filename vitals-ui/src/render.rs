//! Chart rendering: scales, axes, line and markers emitted as SVG markup.

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use vitals_core::{ChartBands, ChartKind, Series, StatusSeries, ValueBand, VitalsError};

use crate::curve::monotone_x_path;
use crate::scale::{BandScale, LinearScale, TimeScale};
use crate::surface::Surface;
use crate::svg::{fmt_num, Markup};

pub const SUCCESS_COLOR: &str = "#4CAF50";
pub const FAILURE_COLOR: &str = "#f44336";
pub const WARNING_COLOR: &str = "#ff9800";

const CHART_WIDTH: f64 = 800.0;
const CHART_HEIGHT: f64 = 400.0;
const ROW_HEIGHT: f64 = 50.0;
const TIME_TICKS: usize = 5;
const VALUE_TICKS: usize = 10;
const TICK_FORMAT: &str = "%Y-%m-%d %H:%M";

/// Data feeding one chart.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "shape", content = "data", rename_all = "snake_case")]
pub enum ChartData {
    Continuous(Series),
    Categorical(StatusSeries),
}

impl ChartData {
    pub fn is_empty(&self) -> bool {
        match self {
            ChartData::Continuous(series) => series.is_empty(),
            ChartData::Categorical(series) => series.is_empty(),
        }
    }
}

impl From<Series> for ChartData {
    fn from(series: Series) -> Self {
        ChartData::Continuous(series)
    }
}

impl From<StatusSeries> for ChartData {
    fn from(series: StatusSeries) -> Self {
        ChartData::Categorical(series)
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct Margins {
    top: f64,
    right: f64,
    bottom: f64,
    left: f64,
}

/// Marker color for a medication status.
pub fn marker_color(status: &str) -> &'static str {
    match status.trim().to_lowercase().as_str() {
        "completed" => SUCCESS_COLOR,
        "not-taken" => FAILURE_COLOR,
        _ => WARNING_COLOR,
    }
}

/// Render `data` into `surface_id`, replacing whatever the surface held.
pub fn render<S>(
    data: &ChartData,
    surface: &mut S,
    surface_id: &str,
    kind: ChartKind,
    bands: &ChartBands,
) -> Result<(), VitalsError>
where
    S: Surface + ?Sized,
{
    if data.is_empty() {
        tracing::debug!(surface = surface_id, %kind, "nothing to plot");
    } else {
        tracing::debug!(surface = surface_id, %kind, "rendering chart");
    }
    surface.replace_contents(surface_id, &chart_markup(data, kind, bands))
}

/// Write the inline error placeholder into `surface_id`.
pub fn render_error<S>(surface: &mut S, surface_id: &str, message: &str) -> Result<(), VitalsError>
where
    S: Surface + ?Sized,
{
    let mut markup = Markup::new();
    markup.element(
        "p",
        &[("class", "chart-placeholder chart-error".to_string())],
        message,
    );
    surface.replace_contents(surface_id, &markup.finish())
}

/// Markup for `data`; the "no data" placeholder when it is empty.
pub fn chart_markup(data: &ChartData, kind: ChartKind, bands: &ChartBands) -> String {
    match data {
        _ if data.is_empty() => placeholder_markup(kind.empty_message()),
        ChartData::Continuous(series) => continuous_markup(series, kind, bands),
        ChartData::Categorical(series) => categorical_markup(series),
    }
}

pub fn placeholder_markup(message: &str) -> String {
    let mut markup = Markup::new();
    markup.element("p", &[("class", "chart-placeholder".to_string())], message);
    markup.finish()
}

struct LineProfile {
    color: &'static str,
    point_class: &'static str,
    axis_title: &'static str,
    tooltip: fn(f64) -> String,
}

fn line_profile(kind: ChartKind) -> LineProfile {
    match kind {
        ChartKind::HeartRate => LineProfile {
            color: FAILURE_COLOR,
            point_class: "hr-point",
            axis_title: "Heart Rate (bpm)",
            tooltip: |value| format!("HR: {} bpm", value.round()),
        },
        ChartKind::Temperature => LineProfile {
            color: "#2196F3",
            point_class: "temp-point",
            axis_title: "Temperature (°C)",
            tooltip: |value| format!("Temp: {value:.1}°C"),
        },
        ChartKind::MedicationAdherence => LineProfile {
            color: "#607D8B",
            point_class: "value-point",
            axis_title: "Value",
            tooltip: |value| format!("Value: {}", fmt_num(value)),
        },
    }
}

fn continuous_markup(series: &Series, kind: ChartKind, bands: &ChartBands) -> String {
    let margins = Margins {
        top: 20.0,
        right: 30.0,
        bottom: 40.0,
        left: 60.0,
    };
    let inner_width = CHART_WIDTH - margins.left - margins.right;
    let inner_height = CHART_HEIGHT - margins.top - margins.bottom;
    let profile = line_profile(kind);

    let sorted = series.sorted_points();
    let Some(x) = TimeScale::from_extent(sorted.iter().map(|p| p.timestamp), (0.0, inner_width))
    else {
        return placeholder_markup(kind.empty_message());
    };

    let (min, max) = sorted.iter().fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), p| {
        (lo.min(p.value), hi.max(p.value))
    });
    let band = bands
        .for_kind(kind)
        .unwrap_or(ValueBand::new(f64::NEG_INFINITY, f64::INFINITY, 0.0));
    let y = LinearScale::new(band.domain(min, max), (inner_height, 0.0));

    let mut markup = Markup::new();
    open_chart(&mut markup, kind, CHART_HEIGHT, margins);

    let line: Vec<(f64, f64)> = sorted
        .iter()
        .map(|point| (x.map(point.timestamp), y.map(point.value)))
        .collect();
    markup.empty(
        "path",
        &[
            ("class", "series-line".to_string()),
            ("fill", "none".to_string()),
            ("stroke", profile.color.to_string()),
            ("stroke-width", "3".to_string()),
            ("d", monotone_x_path(&line)),
        ],
    );

    for point in &series.points {
        markup.open(
            "circle",
            &[
                ("class", profile.point_class.to_string()),
                ("cx", fmt_num(x.map(point.timestamp))),
                ("cy", fmt_num(y.map(point.value))),
                ("r", "4".to_string()),
                ("fill", profile.color.to_string()),
            ],
        );
        let tooltip = format!(
            "{}\n{}",
            (profile.tooltip)(point.value),
            format_tick_time(point.timestamp)
        );
        markup.element("title", &[], &tooltip);
        markup.close("circle");
    }

    time_axis(&mut markup, &x, inner_width, inner_height);

    markup.open("g", &[("class", "axis axis-y".to_string())]);
    axis_rule(&mut markup, 0.0, 0.0, 0.0, inner_height);
    for tick in y.ticks(VALUE_TICKS) {
        markup.open(
            "g",
            &[
                ("class", "tick".to_string()),
                ("transform", format!("translate(0,{})", fmt_num(y.map(tick)))),
            ],
        );
        markup.empty("line", &[("x2", "-6".to_string())]);
        markup.element(
            "text",
            &[
                ("x", "-9".to_string()),
                ("dy", "0.32em".to_string()),
                ("text-anchor", "end".to_string()),
            ],
            &fmt_num(tick),
        );
        markup.close("g");
    }
    markup.element(
        "text",
        &[
            ("class", "axis-title".to_string()),
            ("fill", "#000".to_string()),
            ("transform", "rotate(-90)".to_string()),
            ("y", "-40".to_string()),
            ("x", fmt_num(-inner_height / 2.0)),
            ("text-anchor", "middle".to_string()),
        ],
        profile.axis_title,
    );
    markup.close("g");

    close_chart(&mut markup);
    markup.finish()
}

fn categorical_markup(series: &StatusSeries) -> String {
    let kind = ChartKind::MedicationAdherence;
    let margins = Margins {
        top: 20.0,
        right: 30.0,
        bottom: 40.0,
        left: 100.0,
    };
    let total_height = CHART_HEIGHT.max(series.len() as f64 * ROW_HEIGHT);
    let inner_width = CHART_WIDTH - margins.left - margins.right;
    let inner_height = total_height - margins.top - margins.bottom;

    let Some(x) = TimeScale::from_extent(series.points.iter().map(|p| p.timestamp), (0.0, inner_width))
    else {
        return placeholder_markup(kind.empty_message());
    };
    let categories: Vec<String> = series
        .categories()
        .into_iter()
        .map(str::to_string)
        .collect();
    let y = BandScale::new(categories, (0.0, inner_height), 0.2);

    let mut markup = Markup::new();
    open_chart(&mut markup, kind, total_height, margins);

    time_axis(&mut markup, &x, inner_width, inner_height);

    markup.open("g", &[("class", "axis axis-y".to_string())]);
    axis_rule(&mut markup, 0.0, 0.0, 0.0, inner_height);
    for category in y.domain() {
        let center = y.center(category).unwrap_or_default();
        markup.open(
            "g",
            &[
                ("class", "tick".to_string()),
                ("transform", format!("translate(0,{})", fmt_num(center))),
            ],
        );
        markup.empty("line", &[("x2", "-6".to_string())]);
        markup.element(
            "text",
            &[
                ("x", "-9".to_string()),
                ("dy", "0.32em".to_string()),
                ("text-anchor", "end".to_string()),
            ],
            category,
        );
        markup.close("g");
    }
    markup.close("g");

    for point in &series.points {
        let cy = y.center(&point.category).unwrap_or_default();
        let status = if point.status.is_empty() {
            "unknown"
        } else {
            point.status.as_str()
        };
        markup.open(
            "circle",
            &[
                ("class", "medication-point".to_string()),
                ("data-status", status.to_lowercase()),
                ("cx", fmt_num(x.map(point.timestamp))),
                ("cy", fmt_num(cy)),
                ("r", "6".to_string()),
                ("fill", marker_color(&point.status).to_string()),
                ("stroke", "#fff".to_string()),
                ("stroke-width", "2".to_string()),
            ],
        );
        let tooltip = format!(
            "{}\n{}\nStatus: {}",
            point.category,
            point.timestamp.to_rfc3339_opts(SecondsFormat::Secs, true),
            status
        );
        markup.element("title", &[], &tooltip);
        markup.close("circle");
    }

    close_chart(&mut markup);
    markup.finish()
}

fn open_chart(markup: &mut Markup, kind: ChartKind, height: f64, margins: Margins) {
    markup.open(
        "svg",
        &[
            ("xmlns", "http://www.w3.org/2000/svg".to_string()),
            ("class", format!("chart chart-{kind}")),
            ("width", fmt_num(CHART_WIDTH)),
            ("height", fmt_num(height)),
            ("viewBox", format!("0 0 {} {}", fmt_num(CHART_WIDTH), fmt_num(height))),
        ],
    );
    markup.open(
        "g",
        &[(
            "transform",
            format!(
                "translate({},{})",
                fmt_num(margins.left),
                fmt_num(margins.top)
            ),
        )],
    );
}

fn close_chart(markup: &mut Markup) {
    markup.close("g");
    markup.close("svg");
}

fn time_axis(markup: &mut Markup, x: &TimeScale, inner_width: f64, inner_height: f64) {
    markup.open(
        "g",
        &[
            ("class", "axis axis-x".to_string()),
            ("transform", format!("translate(0,{})", fmt_num(inner_height))),
        ],
    );
    axis_rule(markup, 0.0, 0.0, inner_width, 0.0);
    for tick in x.ticks(TIME_TICKS) {
        markup.open(
            "g",
            &[
                ("class", "tick".to_string()),
                ("transform", format!("translate({},0)", fmt_num(x.map(tick)))),
            ],
        );
        markup.empty("line", &[("y2", "6".to_string())]);
        markup.element(
            "text",
            &[
                ("y", "9".to_string()),
                ("dy", "0.71em".to_string()),
                ("text-anchor", "middle".to_string()),
            ],
            &format_tick_time(tick),
        );
        markup.close("g");
    }
    markup.close("g");
}

fn axis_rule(markup: &mut Markup, x1: f64, y1: f64, x2: f64, y2: f64) {
    markup.empty(
        "line",
        &[
            ("class", "domain".to_string()),
            ("x1", fmt_num(x1)),
            ("y1", fmt_num(y1)),
            ("x2", fmt_num(x2)),
            ("y2", fmt_num(y2)),
        ],
    );
}

fn format_tick_time(timestamp: DateTime<Utc>) -> String {
    timestamp.format(TICK_FORMAT).to_string()
}

/// Chart input for `kind` extracted from normalized records.
pub fn chart_data(kind: ChartKind, records: &[vitals_core::ClinicalRecord]) -> ChartData {
    match kind.observation_code() {
        Some(code) => ChartData::Continuous(vitals_fhir::extract_series(records, code)),
        None => ChartData::Categorical(vitals_fhir::extract_status_series(records)),
    }
}
