//! Dashboard views and the surfaces each one draws into.

use std::fmt;
use std::str::FromStr;

use vitals_core::{ChartKind, VitalsError};

use crate::api::Resource;

pub const DASHBOARD_CHARTS: &str = "dashboard-charts";
pub const MEDICATION_TIMELINE: &str = "medication-timeline";
pub const TEMPERATURE_CHART: &str = "temperature-chart";
pub const HEARTRATE_CHART: &str = "heartrate-chart";
pub const COMBINED_TIMELINE: &str = "combined-timeline";

pub const ACTIVE_MEDS_COUNT: &str = "active-meds-count";
pub const TAKEN_TODAY: &str = "taken-today";
pub const CURRENT_TEMP: &str = "current-temp";
pub const CURRENT_HR: &str = "current-hr";

/// One chart drawn by a view.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChartBinding {
    pub surface_id: &'static str,
    pub kind: ChartKind,
    pub resource: Resource,
    /// Plot at most `dashboard_log_limit` records.
    pub limited: bool,
}

impl ChartBinding {
    const fn new(surface_id: &'static str, kind: ChartKind, resource: Resource) -> Self {
        Self {
            surface_id,
            kind,
            resource,
            limited: false,
        }
    }
}

const DASHBOARD_BINDINGS: [ChartBinding; 1] = [ChartBinding {
    limited: true,
    ..ChartBinding::new(
        DASHBOARD_CHARTS,
        ChartKind::MedicationAdherence,
        Resource::MedicationLogs,
    )
}];
const MEDICATION_BINDINGS: [ChartBinding; 1] = [ChartBinding::new(
    MEDICATION_TIMELINE,
    ChartKind::MedicationAdherence,
    Resource::MedicationLogs,
)];
const VITALS_BINDINGS: [ChartBinding; 2] = [
    ChartBinding::new(TEMPERATURE_CHART, ChartKind::Temperature, Resource::Vitals),
    ChartBinding::new(HEARTRATE_CHART, ChartKind::HeartRate, Resource::Vitals),
];
const TIMELINE_BINDINGS: [ChartBinding; 1] = [ChartBinding::new(
    COMBINED_TIMELINE,
    ChartKind::MedicationAdherence,
    Resource::MedicationLogs,
)];

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum View {
    #[default]
    Dashboard,
    Medications,
    Vitals,
    Timeline,
}

impl View {
    pub const ALL: [View; 4] = [View::Dashboard, View::Medications, View::Vitals, View::Timeline];

    pub fn as_str(self) -> &'static str {
        match self {
            View::Dashboard => "dashboard",
            View::Medications => "medications",
            View::Vitals => "vitals",
            View::Timeline => "timeline",
        }
    }

    pub fn charts(self) -> &'static [ChartBinding] {
        match self {
            View::Dashboard => &DASHBOARD_BINDINGS,
            View::Medications => &MEDICATION_BINDINGS,
            View::Vitals => &VITALS_BINDINGS,
            View::Timeline => &TIMELINE_BINDINGS,
        }
    }

    /// Collections fetched whenever the view is shown or refreshed.
    ///
    /// The timeline pulls vitals alongside the logs even though it only plots
    /// the logs, so the headline readings stay current while it is open.
    pub fn resources(self) -> &'static [Resource] {
        match self {
            View::Dashboard | View::Medications => &[Resource::MedicationLogs],
            View::Vitals => &[Resource::Vitals],
            View::Timeline => &[Resource::MedicationLogs, Resource::Vitals],
        }
    }

    /// Inline message shown when a fetch for this view fails.
    pub fn error_message(self) -> &'static str {
        match self {
            View::Dashboard | View::Vitals => "Error loading charts",
            View::Medications | View::Timeline => "Error loading timeline",
        }
    }
}

impl fmt::Display for View {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for View {
    type Err = VitalsError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let wanted = value.trim().to_lowercase();
        View::ALL
            .into_iter()
            .find(|view| view.as_str() == wanted)
            .ok_or_else(|| VitalsError::Parse(format!("unknown view `{}`", value.trim())))
    }
}
