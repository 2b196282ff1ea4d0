//! Core domain types shared by the normalizer, the chart renderer and the dashboard runtime.

use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// LOINC code for body temperature observations.
pub const TEMPERATURE_CODE: &str = "8310-5";
/// LOINC code for heart rate observations.
pub const HEART_RATE_CODE: &str = "8867-4";

/// Runtime settings for the dashboard and its push channels.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct DashboardConfig {
    /// Base address of the REST API, without a trailing slash.
    pub api_base: String,
    /// Base address of the push channel endpoints.
    pub ws_base: String,
    /// Seconds between periodic refreshes.
    pub refresh_interval_secs: u64,
    /// Maximum number of medication logs plotted on the overview tab.
    pub dashboard_log_limit: usize,
    pub log_level: String,
    pub reconnect: ReconnectPolicy,
    pub bands: ChartBands,
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            api_base: "http://127.0.0.1:8080/api".to_string(),
            ws_base: "ws://127.0.0.1:8080/ws".to_string(),
            refresh_interval_secs: 5,
            dashboard_log_limit: 20,
            log_level: "info".to_string(),
            reconnect: ReconnectPolicy::default(),
            bands: ChartBands::default(),
        }
    }
}

impl DashboardConfig {
    pub fn refresh_interval(&self) -> Duration {
        Duration::from_secs(self.refresh_interval_secs.max(1))
    }
}

/// How a closed push channel schedules its next connection attempt.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "strategy", rename_all = "snake_case")]
pub enum ReconnectPolicy {
    /// Flat delay, unbounded attempts.
    Fixed { delay_ms: u64 },
    /// Exponential delay starting at `base_ms`, never above `cap_ms`.
    Backoff {
        base_ms: u64,
        cap_ms: u64,
        #[serde(default)]
        jitter: bool,
    },
}

impl Default for ReconnectPolicy {
    fn default() -> Self {
        ReconnectPolicy::Fixed { delay_ms: 5_000 }
    }
}

impl ReconnectPolicy {
    /// Delay before reconnect attempt number `attempt` (zero based).
    ///
    /// `jitter_sample` is expected in `[0, 1)` and is only consulted by a
    /// jittered backoff policy, which keeps the upper half of the computed
    /// delay fixed and randomizes the lower half.
    pub fn delay(&self, attempt: u32, jitter_sample: f64) -> Duration {
        match *self {
            ReconnectPolicy::Fixed { delay_ms } => Duration::from_millis(delay_ms),
            ReconnectPolicy::Backoff {
                base_ms,
                cap_ms,
                jitter,
            } => {
                let factor = 1u64.checked_shl(attempt).unwrap_or(u64::MAX);
                let raw = base_ms.saturating_mul(factor).min(cap_ms);
                if !jitter {
                    return Duration::from_millis(raw);
                }
                let sample = jitter_sample.clamp(0.0, 1.0);
                let half = raw / 2;
                let spread = ((raw - half) as f64 * sample) as u64;
                Duration::from_millis((half + spread).min(cap_ms))
            }
        }
    }
}

/// Clamp applied to the value axis of a continuous chart.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct ValueBand {
    pub floor: f64,
    pub ceiling: f64,
    pub padding: f64,
}

impl ValueBand {
    pub const fn new(floor: f64, ceiling: f64, padding: f64) -> Self {
        Self {
            floor,
            ceiling,
            padding,
        }
    }

    /// Axis domain for observed `min`/`max`: padded, then clamped into the band.
    pub fn domain(&self, min: f64, max: f64) -> (f64, f64) {
        (
            (min - self.padding).max(self.floor),
            (max + self.padding).min(self.ceiling),
        )
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ChartBands {
    pub temperature: ValueBand,
    pub heart_rate: ValueBand,
}

impl Default for ChartBands {
    fn default() -> Self {
        Self {
            temperature: ValueBand::new(30.0, 40.0, 2.0),
            heart_rate: ValueBand::new(40.0, 120.0, 10.0),
        }
    }
}

impl ChartBands {
    pub fn for_kind(&self, kind: ChartKind) -> Option<ValueBand> {
        match kind {
            ChartKind::Temperature => Some(self.temperature),
            ChartKind::HeartRate => Some(self.heart_rate),
            ChartKind::MedicationAdherence => None,
        }
    }
}

/// The charts the dashboard knows how to draw.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "kebab-case")]
pub enum ChartKind {
    Temperature,
    HeartRate,
    MedicationAdherence,
}

impl ChartKind {
    /// Observation code feeding a continuous chart; `None` for categorical charts.
    pub fn observation_code(self) -> Option<&'static str> {
        match self {
            ChartKind::Temperature => Some(TEMPERATURE_CODE),
            ChartKind::HeartRate => Some(HEART_RATE_CODE),
            ChartKind::MedicationAdherence => None,
        }
    }

    pub fn is_continuous(self) -> bool {
        self.observation_code().is_some()
    }

    /// Message shown on the surface when there is nothing to plot.
    pub fn empty_message(self) -> &'static str {
        match self {
            ChartKind::Temperature => "No temperature data available",
            ChartKind::HeartRate => "No heart rate data available",
            ChartKind::MedicationAdherence => "No medication data available",
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ChartKind::Temperature => "temperature",
            ChartKind::HeartRate => "heart-rate",
            ChartKind::MedicationAdherence => "medication-adherence",
        }
    }
}

impl fmt::Display for ChartKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ChartKind {
    type Err = VitalsError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_lowercase().replace('_', "-").as_str() {
            "temperature" | "temp" => Ok(ChartKind::Temperature),
            "heart-rate" | "heartrate" | "hr" => Ok(ChartKind::HeartRate),
            "medication" | "medications" | "medication-adherence" => {
                Ok(ChartKind::MedicationAdherence)
            }
            other => Err(VitalsError::Parse(format!("unknown chart kind `{other}`"))),
        }
    }
}

/// A medication administration or observation event in canonical form.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ClinicalRecord {
    pub id: Option<String>,
    /// `None` when the transport timestamp was absent or not RFC 3339.
    pub timestamp: Option<DateTime<Utc>>,
    pub status: String,
    pub kind: RecordKind,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum RecordKind {
    MedicationAdministration {
        medication_name: String,
        active: Option<bool>,
    },
    Observation {
        observation_code: String,
        value: Option<f64>,
        unit: Option<String>,
    },
}

impl ClinicalRecord {
    pub fn is_observation(&self) -> bool {
        matches!(self.kind, RecordKind::Observation { .. })
    }

    pub fn observation_code(&self) -> Option<&str> {
        match &self.kind {
            RecordKind::Observation {
                observation_code, ..
            } => Some(observation_code),
            RecordKind::MedicationAdministration { .. } => None,
        }
    }

    pub fn value(&self) -> Option<f64> {
        match &self.kind {
            RecordKind::Observation { value, .. } => *value,
            RecordKind::MedicationAdministration { .. } => None,
        }
    }

    pub fn medication_name(&self) -> Option<&str> {
        match &self.kind {
            RecordKind::MedicationAdministration {
                medication_name, ..
            } => Some(medication_name),
            RecordKind::Observation { .. } => None,
        }
    }

    pub fn is_active(&self) -> bool {
        matches!(
            self.kind,
            RecordKind::MedicationAdministration {
                active: Some(true),
                ..
            }
        )
    }
}

/// One point of a continuous chart.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct SeriesPoint {
    pub timestamp: DateTime<Utc>,
    pub value: f64,
}

/// Points for a single observation code, in extraction order.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Series {
    pub code: String,
    pub points: Vec<SeriesPoint>,
}

impl Series {
    pub fn new(code: impl Into<String>, points: Vec<SeriesPoint>) -> Self {
        Self {
            code: code.into(),
            points,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    /// Copy of the points ordered by ascending timestamp (stable for ties).
    pub fn sorted_points(&self) -> Vec<SeriesPoint> {
        let mut points = self.points.clone();
        points.sort_by_key(|point| point.timestamp);
        points
    }
}

/// One marker of the categorical medication chart.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct StatusPoint {
    pub timestamp: DateTime<Utc>,
    pub category: String,
    pub status: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct StatusSeries {
    pub points: Vec<StatusPoint>,
}

impl StatusSeries {
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    /// Distinct categories in first-seen order.
    pub fn categories(&self) -> Vec<&str> {
        let mut seen: Vec<&str> = Vec::new();
        for point in &self.points {
            if !seen.contains(&point.category.as_str()) {
                seen.push(point.category.as_str());
            }
        }
        seen
    }
}

/// Headline numbers shown above the charts.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct DashboardSummary {
    pub active_medications: usize,
    pub taken_today: usize,
    pub current_temperature: Option<f64>,
    pub current_heart_rate: Option<f64>,
}

/// Errors surfaced by the dashboard pipeline.
#[derive(Debug, thiserror::Error)]
pub enum VitalsError {
    #[error("failed to fetch {resource}: {message}")]
    Fetch { resource: String, message: String },
    #[error("could not parse payload: {0}")]
    Parse(String),
    #[error("surface `{id}` unavailable: {message}")]
    Surface { id: String, message: String },
    #[error("invalid configuration: {0}")]
    Config(String),
    #[error("{0}")]
    Other(String),
}
