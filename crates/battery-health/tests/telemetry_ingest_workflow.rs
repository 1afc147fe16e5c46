//! Integration scenarios for telemetry ingest and battery health scoring.
//!
//! Scenarios drive the public service facade, the CSV history importer, and the HTTP router so
//! the temporal context builder, rule engine, and projector are exercised together.

mod common {
    use std::collections::HashMap;
    use std::sync::{Arc, Mutex};

    use chrono::{DateTime, Duration, TimeZone, Utc};

    use battery_health::health::{RuleParameters, TelemetrySample, VehicleId};
    use battery_health::ingest::{
        InsightLogEntry, InsightLogRepository, NewInsightLog, RepositoryError,
        TelemetryRepository, TelemetryService, VehicleRecord,
    };

    pub(super) fn base_time() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 4, 7, 30, 0).unwrap()
    }

    pub(super) fn sample(minutes: i64, battery: f64) -> TelemetrySample {
        TelemetrySample {
            vehicle_id: VehicleId::from("veh-fleet-7"),
            snapshot_timestamp: base_time() + Duration::minutes(minutes),
            battery_percentage: battery,
            speed_kmph: 0.0,
            engine_on: true,
            charging: false,
            ambient_temperature: Some(22.0),
            odometer_km: Some(18_250.0),
        }
    }

    pub(super) fn charging(minutes: i64, battery: f64) -> TelemetrySample {
        TelemetrySample {
            engine_on: false,
            charging: true,
            ..sample(minutes, battery)
        }
    }

    pub(super) fn driving(minutes: i64, battery: f64) -> TelemetrySample {
        TelemetrySample {
            speed_kmph: 48.0,
            ..sample(minutes, battery)
        }
    }

    #[derive(Default, Clone)]
    pub(super) struct Snapshots {
        samples: Arc<Mutex<Vec<TelemetrySample>>>,
        vehicles: Arc<Mutex<HashMap<VehicleId, VehicleRecord>>>,
    }

    impl TelemetryRepository for Snapshots {
        fn insert_snapshot(&self, sample: TelemetrySample) -> Result<(), RepositoryError> {
            self.samples.lock().expect("lock").push(sample);
            Ok(())
        }

        fn recent_snapshots(
            &self,
            vehicle_id: &VehicleId,
            limit: usize,
        ) -> Result<Vec<TelemetrySample>, RepositoryError> {
            let guard = self.samples.lock().expect("lock");
            let mut matching: Vec<_> = guard
                .iter()
                .filter(|sample| &sample.vehicle_id == vehicle_id)
                .cloned()
                .collect();
            matching.sort_by(|a, b| b.snapshot_timestamp.cmp(&a.snapshot_timestamp));
            matching.truncate(limit);
            Ok(matching)
        }

        fn latest_snapshot(
            &self,
            vehicle_id: &VehicleId,
        ) -> Result<Option<TelemetrySample>, RepositoryError> {
            Ok(self.recent_snapshots(vehicle_id, 1)?.into_iter().next())
        }

        fn upsert_vehicle(&self, record: VehicleRecord) -> Result<(), RepositoryError> {
            self.vehicles
                .lock()
                .expect("lock")
                .insert(record.vehicle_id.clone(), record);
            Ok(())
        }

        fn fetch_vehicle(
            &self,
            vehicle_id: &VehicleId,
        ) -> Result<Option<VehicleRecord>, RepositoryError> {
            Ok(self.vehicles.lock().expect("lock").get(vehicle_id).cloned())
        }
    }

    #[derive(Default, Clone)]
    pub(super) struct Insights {
        entries: Arc<Mutex<Vec<InsightLogEntry>>>,
    }

    impl InsightLogRepository for Insights {
        fn append(&self, entry: NewInsightLog) -> Result<InsightLogEntry, RepositoryError> {
            let mut guard = self.entries.lock().expect("lock");
            let stored = InsightLogEntry::from_new(guard.len() as u64 + 1, entry);
            guard.push(stored.clone());
            Ok(stored)
        }

        fn recent(
            &self,
            vehicle_id: &VehicleId,
            limit: usize,
        ) -> Result<Vec<InsightLogEntry>, RepositoryError> {
            Ok(self
                .entries
                .lock()
                .expect("lock")
                .iter()
                .rev()
                .filter(|entry| &entry.vehicle_id == vehicle_id)
                .take(limit)
                .cloned()
                .collect())
        }
    }

    pub(super) fn build_service(parameters: RuleParameters) -> TelemetryService<Snapshots, Insights> {
        TelemetryService::new(
            Arc::new(Snapshots::default()),
            Arc::new(Insights::default()),
            parameters,
        )
    }
}

mod scoring {
    use super::common::*;
    use battery_health::health::{AlertSeverity, HealthStatus, RuleId, RuleParameters};

    #[test]
    fn commute_with_long_idle_accumulates_deductions() {
        let service = build_service(RuleParameters::default());

        service.record(driving(0, 62.0)).expect("departure");
        service.record(driving(10, 45.0)).expect("hard acceleration");
        service.record(sample(20, 18.0)).expect("stopped");
        service.record(sample(40, 17.0)).expect("still idling");
        let result = service.record(sample(50, 16.0)).expect("idle continues");

        // 30 idle minutes (3 intervals) and a low battery, no sharp drop inside the window.
        assert_eq!(
            result.evaluation.triggered_rules(),
            vec![RuleId::DeepDischargeWarning, RuleId::IdleDrain]
        );
        assert_eq!(result.score, 86.0);
        assert_eq!(result.status, HealthStatus::Good);

        let insights = service
            .insights(&"veh-fleet-7".into())
            .expect("insights available");
        assert_eq!(insights.history.len(), 5);
        assert_eq!(insights.history[0].health_score, 86.0);
    }

    #[test]
    fn sharp_drain_within_window_is_flagged() {
        let service = build_service(RuleParameters::default());

        service.record(driving(0, 80.0)).expect("departure");
        let result = service.record(driving(12, 61.0)).expect("drain");

        assert_eq!(result.evaluation.triggered_rules(), vec![RuleId::RapidDrop]);
        assert_eq!(result.alerts[0].title, "Rapid charge depletion");
        assert_eq!(result.score, 96.0);
    }

    #[test]
    fn stalled_charging_session_reports_informational_alert() {
        let service = build_service(RuleParameters::default());

        service.record(charging(0, 40.0)).expect("plugged in");
        service.record(charging(10, 41.0)).expect("charging");
        service.record(charging(20, 42.0)).expect("charging");
        let result = service.record(charging(30, 42.0)).expect("charging");

        assert_eq!(result.evaluation.triggered_rules(), vec![RuleId::SlowCharge]);
        assert_eq!(result.score, 100.0);
        assert_eq!(result.alerts[0].severity, AlertSeverity::Info);
        assert_eq!(
            result.tips[0].message,
            "Inspect charging equipment and prefer faster AC/DC chargers when available."
        );
    }

    #[test]
    fn custom_parameters_reshape_scores_and_bands() {
        let parameters = RuleParameters::from_reader(
            br#"{
                "version": "fleet-strict",
                "baseScore": 90,
                "deepDischarge": {
                    "warningThreshold": 30,
                    "criticalThreshold": 15,
                    "warningDeduction": 20,
                    "criticalDeduction": 40
                },
                "statusBands": [
                    { "threshold": 0, "status": "POOR" },
                    { "threshold": 85, "status": "GOOD" },
                    { "threshold": 65, "status": "MODERATE" }
                ]
            }"#
            .as_slice(),
        )
        .expect("parameters parse");
        let service = build_service(parameters);

        let result = service.record(driving(0, 25.0)).expect("records");

        assert_eq!(result.evaluation.base_score, 90.0);
        assert_eq!(result.score, 70.0);
        assert_eq!(result.status, HealthStatus::Moderate);
        assert_eq!(service.engine().parameters().version, "fleet-strict");
    }
}

mod history_import {
    use super::common::*;
    use battery_health::health::{
        build_evaluation_context, evaluate_battery_health, RuleId, RuleParameters,
    };
    use battery_health::ingest::SnapshotHistoryImporter;
    use std::io::Cursor;

    const EXPORT: &str = "vehicle_id,timestamp,battery_percentage,speed_kmph,engine_on,charging
veh-fleet-7,2024-03-04T07:30:00Z,55,0,true,false
veh-fleet-9,2024-03-04T07:35:00Z,90,60,true,false
veh-fleet-7,2024-03-04T07:45:00Z,54,0,true,false
veh-fleet-7,2024-03-04T08:00:00Z,53,0,true,false
";

    #[test]
    fn imported_history_feeds_the_context_builder() {
        let history = SnapshotHistoryImporter::from_reader(Cursor::new(EXPORT), Some("veh-fleet-7"))
            .expect("export imports");
        assert_eq!(history.len(), 3);

        let current = sample(45, 52.0);
        let context = build_evaluation_context(&current, &history);
        assert_eq!(context.idle_duration_minutes, 45.0);
        assert_eq!(context.recent_snapshots.len(), 3);

        let result = evaluate_battery_health(&context, &RuleParameters::default());
        // 45 idle minutes count as four full intervals.
        assert_eq!(result.triggered_rules(), vec![RuleId::IdleDrain]);
        assert_eq!(result.score, 88.0);
    }
}

mod routing {
    use super::common::*;
    use axum::body::Body;
    use axum::http::{header, Request, StatusCode};
    use battery_health::health::RuleParameters;
    use battery_health::ingest::{telemetry_router, API_KEY_HEADER};
    use serde_json::{json, Value};
    use std::sync::Arc;
    use tower::ServiceExt;

    async fn body_json(response: axum::response::Response) -> Value {
        let bytes = axum::body::to_bytes(response.into_body(), 64 * 1024)
            .await
            .expect("body");
        serde_json::from_slice(&bytes).expect("json")
    }

    #[tokio::test]
    async fn ingest_then_query_insights_over_http() {
        let router = telemetry_router(
            Arc::new(build_service(RuleParameters::default())),
            Some("fleet-key".to_string()),
        );

        for (timestamp, battery) in [
            ("2024-03-04T07:30:00Z", 30.0),
            ("2024-03-04T07:40:00Z", 29.5),
            ("2024-03-04T07:50:00Z", 29.0),
        ] {
            let payload = json!({
                "vehicleId": "veh-fleet-7",
                "timestamp": timestamp,
                "batteryPercentage": battery,
                "speedKmph": 0,
                "engineOn": true,
                "charging": false,
                "ambientTemperature": -4
            });
            let response = router
                .clone()
                .oneshot(
                    Request::post("/api/v1/telemetry")
                        .header(header::CONTENT_TYPE, "application/json")
                        .header(API_KEY_HEADER, "fleet-key")
                        .body(Body::from(payload.to_string()))
                        .unwrap(),
                )
                .await
                .unwrap();
            assert_eq!(response.status(), StatusCode::CREATED);
        }

        let response = router
            .oneshot(
                Request::get("/api/v1/vehicles/veh-fleet-7/insights")
                    .header(API_KEY_HEADER, "fleet-key")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        let data = &body["data"];
        // 20 idle minutes (6) plus cold weather (1).
        assert_eq!(data["score"], 93.0);
        assert_eq!(data["alerts"][0]["id"], "idle_drain");
        assert_eq!(data["alerts"][1]["id"], "temperature_low");
        assert_eq!(data["history"].as_array().map(Vec::len), Some(3));
    }
}
