use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use chrono::NaiveDate;
use serde_json::{json, Value};
use tokio::sync::mpsc;
use vitals_core::{ClinicalRecord, DashboardConfig};
use vitals_dashboard::view::{
    ACTIVE_MEDS_COUNT, CURRENT_HR, CURRENT_TEMP, DASHBOARD_CHARTS, HEARTRATE_CHART,
    MEDICATION_TIMELINE, TAKEN_TODAY, TEMPERATURE_CHART,
};
use vitals_dashboard::{
    run, Command, Dashboard, FetchError, LiveUpdate, RecordSource, Resource, Topic, View,
};
use vitals_ui::MemorySurface;

#[derive(Default)]
struct Backend {
    payloads: HashMap<Resource, Value>,
    failing: HashSet<Resource>,
    calls: Vec<Resource>,
}

#[derive(Clone, Default)]
struct FakeSource(Arc<Mutex<Backend>>);

impl FakeSource {
    fn with(self, resource: Resource, payload: Value) -> Self {
        self.set(resource, payload);
        self
    }

    fn set(&self, resource: Resource, payload: Value) {
        self.0.lock().unwrap().payloads.insert(resource, payload);
    }

    fn fail(&self, resource: Resource) {
        self.0.lock().unwrap().failing.insert(resource);
    }

    fn calls(&self, resource: Resource) -> usize {
        self.0
            .lock()
            .unwrap()
            .calls
            .iter()
            .filter(|call| **call == resource)
            .count()
    }
}

#[async_trait]
impl RecordSource for FakeSource {
    async fn fetch(&self, resource: Resource) -> Result<Vec<ClinicalRecord>, FetchError> {
        let mut backend = self.0.lock().unwrap();
        backend.calls.push(resource);
        if backend.failing.contains(&resource) {
            return Err(FetchError::Status {
                url: format!("http://backend{resource}"),
                status: 500,
            });
        }
        let payload = backend
            .payloads
            .get(&resource)
            .cloned()
            .unwrap_or_else(|| json!([]));
        Ok(vitals_fhir::normalize_payload(&payload).unwrap())
    }
}

fn march_first() -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 3, 1).unwrap()
}

fn backend() -> FakeSource {
    FakeSource::default()
        .with(
            Resource::Medications,
            json!([
                { "id": 1, "name": "Metformin", "active": true },
                { "id": 2, "name": "Lisinopril", "active": true },
                { "id": 3, "name": "Aspirin", "active": false }
            ]),
        )
        .with(
            Resource::MedicationLogs,
            json!([
                { "medicationName": "Metformin", "status": "completed", "effectiveDateTime": "2024-03-01T08:00:00Z" },
                { "medication_name": "Lisinopril", "status": "not-taken", "effective_date_time": "2024-03-01T09:00:00Z" },
                { "medicationName": "Metformin", "status": "taken", "effectiveDateTime": "2024-02-29T08:00:00Z" }
            ]),
        )
        .with(
            Resource::Vitals,
            json!([
                { "code": "8310-5", "value": 37.2, "effectiveDateTime": "2024-03-01T08:00:00Z" },
                { "code": { "coding": [{ "code": "8867-4" }] }, "valueQuantity": { "value": 72 }, "effectiveDateTime": "2024-03-01T08:00:00Z" }
            ]),
        )
}

fn dashboard(source: FakeSource) -> Dashboard<FakeSource, MemorySurface> {
    Dashboard::new(source, MemorySurface::new(), DashboardConfig::default()).with_clock(march_first)
}

#[tokio::test]
async fn initial_load_fills_summary_and_overview() {
    let source = backend();
    let mut dashboard = dashboard(source.clone());
    dashboard.load_initial().await;

    let surface = dashboard.surface();
    assert_eq!(surface.get(ACTIVE_MEDS_COUNT), Some("2"));
    assert_eq!(surface.get(TAKEN_TODAY), Some("1"));
    assert_eq!(surface.get(CURRENT_TEMP), Some("37.2°C"));
    assert_eq!(surface.get(CURRENT_HR), Some("72 bpm"));

    let overview = surface.get(DASHBOARD_CHARTS).unwrap();
    assert_eq!(overview.matches(r#"class="medication-point""#).count(), 3);
    assert_eq!(source.calls(Resource::Medications), 1);
    assert_eq!(source.calls(Resource::Vitals), 1);
    assert_eq!(source.calls(Resource::MedicationLogs), 1);
}

#[tokio::test]
async fn overview_plots_at_most_the_configured_number_of_logs() {
    let logs: Vec<Value> = (0..25)
        .map(|minute| {
            json!({
                "medicationName": "Metformin",
                "status": "completed",
                "effectiveDateTime": format!("2024-03-01T08:{minute:02}:00Z")
            })
        })
        .collect();
    let source = backend().with(Resource::MedicationLogs, Value::Array(logs));
    let mut dashboard = dashboard(source);
    dashboard.load_initial().await;

    let overview = dashboard.surface().get(DASHBOARD_CHARTS).unwrap();
    assert_eq!(overview.matches(r#"class="medication-point""#).count(), 20);
    assert_eq!(dashboard.state().medication_logs.len(), 25);

    dashboard.activate(View::Medications).await;
    let timeline = dashboard.surface().get(MEDICATION_TIMELINE).unwrap();
    assert_eq!(timeline.matches(r#"class="medication-point""#).count(), 25);
}

#[tokio::test]
async fn switching_views_always_fetches() {
    let source = backend();
    let mut dashboard = dashboard(source.clone());
    dashboard.load_initial().await;

    dashboard.activate(View::Vitals).await;
    dashboard.activate(View::Vitals).await;
    assert_eq!(dashboard.active_view(), View::Vitals);
    assert_eq!(source.calls(Resource::Vitals), 3);

    let surface = dashboard.surface();
    assert!(surface.get(TEMPERATURE_CHART).unwrap().starts_with("<svg"));
    assert!(surface.get(HEARTRATE_CHART).unwrap().contains("HR: 72 bpm"));
}

#[tokio::test]
async fn failed_fetch_only_affects_its_own_surfaces() {
    let source = backend();
    let mut dashboard = dashboard(source.clone());
    dashboard.load_initial().await;
    let overview_before = dashboard.surface().get(DASHBOARD_CHARTS).unwrap().to_string();

    source.fail(Resource::Vitals);
    dashboard.activate(View::Vitals).await;

    let surface = dashboard.surface();
    for id in [TEMPERATURE_CHART, HEARTRATE_CHART] {
        let markup = surface.get(id).unwrap();
        assert!(markup.contains("Error loading charts"), "{id}");
        assert!(markup.contains("chart-error"));
    }
    assert_eq!(surface.get(DASHBOARD_CHARTS).unwrap(), overview_before);
    // earlier readings survive a failed fetch
    assert_eq!(surface.get(CURRENT_TEMP), Some("37.2°C"));
    assert_eq!(dashboard.state().vitals.len(), 2);
}

#[tokio::test]
async fn failed_log_fetch_blanks_taken_today() {
    let source = backend();
    source.fail(Resource::MedicationLogs);
    let mut dashboard = dashboard(source);
    dashboard.load_initial().await;

    let surface = dashboard.surface();
    assert_eq!(surface.get(TAKEN_TODAY), Some("--"));
    assert_eq!(surface.get(ACTIVE_MEDS_COUNT), Some("2"));
    assert!(surface
        .get(DASHBOARD_CHARTS)
        .unwrap()
        .contains("Error loading charts"));
}

#[tokio::test]
async fn missing_readings_show_placeholders() {
    let source = backend().with(Resource::Vitals, json!([]));
    let mut dashboard = dashboard(source);
    dashboard.load_initial().await;

    let surface = dashboard.surface();
    assert_eq!(surface.get(CURRENT_TEMP), Some("--°C"));
    assert_eq!(surface.get(CURRENT_HR), Some("-- bpm"));
}

#[tokio::test]
async fn initial_load_does_not_fetch_vitals_twice() {
    for view in [View::Vitals, View::Timeline] {
        let source = backend();
        let mut dashboard = dashboard(source.clone()).with_view(view);
        dashboard.load_initial().await;
        assert_eq!(source.calls(Resource::Vitals), 1, "{view}");
        assert_eq!(source.calls(Resource::Medications), 1, "{view}");
        assert_eq!(source.calls(Resource::MedicationLogs), 1, "{view}");
    }

    let source = backend();
    source.fail(Resource::Vitals);
    let mut dashboard = dashboard(source.clone()).with_view(View::Vitals);
    dashboard.load_initial().await;
    assert_eq!(source.calls(Resource::Vitals), 1);
    assert!(dashboard
        .surface()
        .get(TEMPERATURE_CHART)
        .unwrap()
        .contains("Error loading charts"));
}

#[tokio::test]
async fn push_message_refetches_its_collection() {
    let source = backend();
    let mut dashboard = dashboard(source.clone()).with_view(View::Vitals);
    dashboard.load_initial().await;

    source.set(
        Resource::Vitals,
        json!([
            { "code": "8310-5", "value": 37.2, "effectiveDateTime": "2024-03-01T08:00:00Z" },
            { "code": "8867-4", "value": 72, "effectiveDateTime": "2024-03-01T08:00:00Z" },
            { "code": "8310-5", "value": 38.4, "effectiveDateTime": "2024-03-01T10:00:00Z" }
        ]),
    );
    // the push carries only the newest reading
    let pushed = vitals_fhir::normalize_str(
        r#"{"code":"8310-5","value":38.4,"effectiveDateTime":"2024-03-01T10:00:00Z"}"#,
    )
    .unwrap();
    dashboard
        .apply_live_update(LiveUpdate {
            topic: Topic::Vitals,
            records: pushed,
        })
        .await;

    assert_eq!(source.calls(Resource::Vitals), 2);
    assert_eq!(source.calls(Resource::MedicationLogs), 1);
    assert_eq!(dashboard.state().vitals.len(), 3);

    let surface = dashboard.surface();
    assert_eq!(surface.get(CURRENT_TEMP), Some("38.4°C"));
    assert_eq!(surface.get(CURRENT_HR), Some("72 bpm"));
    let temperature = surface.get(TEMPERATURE_CHART).unwrap();
    assert!(temperature.contains("Temp: 37.2°C"));
    assert!(temperature.contains("Temp: 38.4°C"));
    assert!(surface
        .get(HEARTRATE_CHART)
        .unwrap()
        .contains("HR: 72 bpm"));
}

#[tokio::test]
async fn push_with_failing_refetch_keeps_previous_records() {
    let source = backend();
    let mut dashboard = dashboard(source.clone()).with_view(View::Medications);
    dashboard.load_initial().await;
    assert_eq!(dashboard.state().medication_logs.len(), 3);

    source.fail(Resource::MedicationLogs);
    let pushed = vitals_fhir::normalize_str(
        r#"[{"medicationName":"Aspirin","status":"completed","effectiveDateTime":"2024-03-01T11:00:00Z"}]"#,
    )
    .unwrap();
    dashboard
        .apply_live_update(LiveUpdate {
            topic: Topic::Medications,
            records: pushed,
        })
        .await;

    assert_eq!(source.calls(Resource::MedicationLogs), 2);
    assert_eq!(dashboard.state().medication_logs.len(), 3);
    let surface = dashboard.surface();
    assert!(surface
        .get(MEDICATION_TIMELINE)
        .unwrap()
        .contains("Error loading timeline"));
    assert_eq!(surface.get(TAKEN_TODAY), Some("--"));
}

#[tokio::test]
async fn run_loop_follows_commands_and_updates() {
    let source = backend();
    let mut dashboard = dashboard(source.clone());
    dashboard.load_initial().await;

    let (update_tx, update_rx) = mpsc::channel(4);
    let (command_tx, command_rx) = mpsc::channel(4);
    let handle = tokio::spawn(run(
        dashboard,
        update_rx,
        command_rx,
        Duration::from_secs(3600),
    ));

    let records = vitals_fhir::normalize_str(
        r#"[{"medicationName":"Aspirin","status":"completed","effectiveDateTime":"2024-03-01T11:00:00Z"}]"#,
    )
    .unwrap();
    update_tx
        .send(LiveUpdate {
            topic: Topic::Medications,
            records,
        })
        .await
        .unwrap();
    tokio::time::timeout(Duration::from_secs(5), async {
        while source.calls(Resource::MedicationLogs) < 2 {
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
    })
    .await
    .expect("pushed medications should be re-fetched");

    command_tx.send(Command::Activate(View::Timeline)).await.unwrap();
    command_tx.send(Command::Shutdown).await.unwrap();

    let dashboard = tokio::time::timeout(Duration::from_secs(5), handle)
        .await
        .expect("run loop should stop on shutdown")
        .unwrap();

    assert_eq!(dashboard.active_view(), View::Timeline);
    assert_eq!(source.calls(Resource::Vitals), 2);
    assert_eq!(source.calls(Resource::MedicationLogs), 3);
}
