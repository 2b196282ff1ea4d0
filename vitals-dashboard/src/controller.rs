//! View switching, fetch orchestration and the periodic refresh loop.

use std::time::Duration;

use chrono::{NaiveDate, Utc};
use futures::future::join_all;
use tokio::sync::mpsc;
use tokio::time::MissedTickBehavior;
use tracing::{debug, error, info, warn};
use vitals_core::{ClinicalRecord, DashboardConfig, DashboardSummary};
use vitals_ui::{chart_data, render, render_error, Surface};

use crate::api::{FetchError, RecordSource, Resource};
use crate::live::LiveUpdate;
use crate::view::{self, View};

/// Last fetched copy of every collection. Each slice is replaced wholesale.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DashboardState {
    pub medications: Vec<ClinicalRecord>,
    pub vitals: Vec<ClinicalRecord>,
    pub medication_logs: Vec<ClinicalRecord>,
}

impl DashboardState {
    pub fn records(&self, resource: Resource) -> &[ClinicalRecord] {
        match resource {
            Resource::Medications => &self.medications,
            Resource::Vitals => &self.vitals,
            Resource::MedicationLogs => &self.medication_logs,
        }
    }

    pub fn replace(&mut self, resource: Resource, records: Vec<ClinicalRecord>) {
        let slot = match resource {
            Resource::Medications => &mut self.medications,
            Resource::Vitals => &mut self.vitals,
            Resource::MedicationLogs => &mut self.medication_logs,
        };
        *slot = records;
    }

    pub fn summary(&self, today: NaiveDate) -> DashboardSummary {
        vitals_fhir::summarize(
            &self.medications,
            &self.medication_logs,
            &self.vitals,
            today,
        )
    }
}

/// Input to the run loop besides timer ticks and pushed updates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Activate(View),
    Refresh,
    Shutdown,
}

pub struct Dashboard<S, F> {
    source: S,
    surface: F,
    config: DashboardConfig,
    state: DashboardState,
    active: View,
    logs_available: bool,
    today: fn() -> NaiveDate,
}

fn utc_today() -> NaiveDate {
    Utc::now().date_naive()
}

impl<S, F> Dashboard<S, F>
where
    S: RecordSource,
    F: Surface,
{
    pub fn new(source: S, surface: F, config: DashboardConfig) -> Self {
        Self {
            source,
            surface,
            config,
            state: DashboardState::default(),
            active: View::default(),
            logs_available: false,
            today: utc_today,
        }
    }

    /// Start on `view` instead of the overview.
    pub fn with_view(mut self, view: View) -> Self {
        self.active = view;
        self
    }

    /// Calendar day used for the taken-today count.
    pub fn with_clock(mut self, today: fn() -> NaiveDate) -> Self {
        self.today = today;
        self
    }

    pub fn active_view(&self) -> View {
        self.active
    }

    pub fn state(&self) -> &DashboardState {
        &self.state
    }

    pub fn surface(&self) -> &F {
        &self.surface
    }

    pub fn into_surface(self) -> F {
        self.surface
    }

    /// Fetch medications and vitals together, then draw the active view and the summary.
    pub async fn load_initial(&mut self) {
        info!(view = %self.active, "loading initial data");
        let loaded = [Resource::Medications, Resource::Vitals];
        let failed = self.fetch_into_state(&loaded).await;
        self.refresh_skipping(&loaded, failed).await;
    }

    /// Switch to `view`, always re-fetching its collections.
    pub async fn activate(&mut self, view: View) {
        info!(from = %self.active, to = %view, "switching view");
        self.active = view;
        let failed = self.fetch_into_state(view.resources()).await;
        self.render_view(&failed);
    }

    /// Periodic refresh: medication logs for the summary plus the active view.
    pub async fn refresh(&mut self) {
        self.refresh_skipping(&[], Vec::new()).await;
    }

    /// Refresh without re-fetching `fresh`, whose fetch outcome is `failed`.
    async fn refresh_skipping(&mut self, fresh: &[Resource], mut failed: Vec<Resource>) {
        let mut resources = vec![Resource::MedicationLogs];
        for resource in self.active.resources() {
            if !resources.contains(resource) {
                resources.push(*resource);
            }
        }
        resources.retain(|resource| !fresh.contains(resource));

        failed.extend(self.fetch_into_state(&resources).await);
        self.render_summary();
        self.render_view(&failed);
    }

    /// A push announces new data on its topic: re-fetch that collection and redraw.
    ///
    /// The pushed records only trigger the fetch. The backend pushes a short
    /// tail of recent records, so they never replace the fetched history.
    pub async fn apply_live_update(&mut self, update: LiveUpdate) {
        let resource = update.topic.resource();
        debug!(topic = %update.topic, pushed = update.records.len(), %resource, "push received; re-fetching");
        let failed = self.fetch_into_state(&[resource]).await;
        self.render_summary();
        self.render_view(&failed);
    }

    /// Fetch `resources` concurrently; returns those that failed.
    async fn fetch_into_state(&mut self, resources: &[Resource]) -> Vec<Resource> {
        let source = &self.source;
        let results = join_all(resources.iter().map(|resource| async move {
            (*resource, source.fetch(*resource).await)
        }))
        .await;

        let mut failed = Vec::new();
        for (resource, result) in results {
            match result {
                Ok(records) => {
                    debug!(%resource, records = records.len(), "fetched");
                    self.state.replace(resource, records);
                    self.note_log_fetch(resource, true);
                }
                Err(err) => {
                    log_fetch_error(resource, &err);
                    self.note_log_fetch(resource, false);
                    failed.push(resource);
                }
            }
        }
        failed
    }

    fn note_log_fetch(&mut self, resource: Resource, ok: bool) {
        if resource == Resource::MedicationLogs {
            self.logs_available = ok;
        }
    }

    fn render_view(&mut self, failed: &[Resource]) {
        let view = self.active;
        for binding in view.charts() {
            let outcome = if failed.contains(&binding.resource) {
                render_error(&mut self.surface, binding.surface_id, view.error_message())
            } else {
                let records = self.state.records(binding.resource);
                let records = if binding.limited {
                    &records[..records.len().min(self.config.dashboard_log_limit)]
                } else {
                    records
                };
                let data = chart_data(binding.kind, records);
                render(
                    &data,
                    &mut self.surface,
                    binding.surface_id,
                    binding.kind,
                    &self.config.bands,
                )
            };
            if let Err(err) = outcome {
                warn!(surface = binding.surface_id, error = %err, "could not update surface");
            }
        }
    }

    fn render_summary(&mut self) {
        let summary = self.state.summary((self.today)());
        let taken = if self.logs_available {
            summary.taken_today.to_string()
        } else {
            "--".to_string()
        };
        let texts = [
            (view::ACTIVE_MEDS_COUNT, summary.active_medications.to_string()),
            (view::TAKEN_TODAY, taken),
            (
                view::CURRENT_TEMP,
                format_temperature(summary.current_temperature),
            ),
            (view::CURRENT_HR, format_heart_rate(summary.current_heart_rate)),
        ];
        for (surface_id, text) in texts {
            if let Err(err) = self.surface.replace_text(surface_id, &text) {
                warn!(surface = surface_id, error = %err, "could not update summary");
            }
        }
    }
}

fn log_fetch_error(resource: Resource, err: &FetchError) {
    error!(%resource, error = %err, "fetch failed");
}

pub fn format_temperature(value: Option<f64>) -> String {
    match value {
        Some(celsius) => format!("{celsius:.1}°C"),
        None => "--°C".to_string(),
    }
}

pub fn format_heart_rate(value: Option<f64>) -> String {
    match value {
        Some(bpm) => format!("{} bpm", bpm.round()),
        None => "-- bpm".to_string(),
    }
}

/// Drive `dashboard` until a shutdown command arrives or the command channel closes.
///
/// Timer ticks refresh, pushed updates re-fetch their collection, commands
/// switch views. The first tick fires one `interval` after start.
pub async fn run<S, F>(
    mut dashboard: Dashboard<S, F>,
    mut updates: mpsc::Receiver<LiveUpdate>,
    mut commands: mpsc::Receiver<Command>,
    interval: Duration,
) -> Dashboard<S, F>
where
    S: RecordSource,
    F: Surface,
{
    let mut ticker = tokio::time::interval_at(tokio::time::Instant::now() + interval, interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            _ = ticker.tick() => dashboard.refresh().await,
            Some(update) = updates.recv() => dashboard.apply_live_update(update).await,
            command = commands.recv() => match command {
                Some(Command::Activate(view)) => dashboard.activate(view).await,
                Some(Command::Refresh) => dashboard.refresh().await,
                Some(Command::Shutdown) | None => {
                    info!("dashboard stopping");
                    break;
                }
            },
        }
    }
    dashboard
}
