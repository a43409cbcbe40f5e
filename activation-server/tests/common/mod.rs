//! 集成测试公共夹具
//!
//! 内存 redb + 手动时钟 (2026-03-01 12:00 胡志明市，周日)，
//! 门店 b-1 下两位教练，每周一至周五 08:00-10:00 各有课程。

#![allow(dead_code)]

use std::sync::Arc;

use activation_server::api::build_app;
use activation_server::clock::ManualClock;
use activation_server::{ActivationStorage, Config, ServerState};
use axum::Router;
use axum::body::Body;
use chrono::{NaiveDate, NaiveTime, TimeZone, Utc};
use http::{Method, Request, StatusCode};
use http_body_util::BodyExt;
use rust_decimal::Decimal;
use serde_json::{Value, json};
use shared::models::{Branch, Package, Session, Trainer};
use tempfile::TempDir;
use tower::ServiceExt;

pub const OWNER: &str = "u-owner";
pub const PARTNER: &str = "u-partner";

pub struct TestApp {
    pub state: ServerState,
    pub router: Router,
    pub clock: Arc<ManualClock>,
    _dir: TempDir,
}

pub fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

pub fn session(id: &str, trainer: &str, day: NaiveDate, start: u32, capacity: u32) -> Session {
    Session {
        id: id.into(),
        branch_id: "b-1".into(),
        trainer_id: trainer.into(),
        date: day,
        start_time: NaiveTime::from_hms_opt(start, 0, 0).unwrap(),
        end_time: NaiveTime::from_hms_opt(start + 2, 0, 0).unwrap(),
        capacity_max: capacity,
        capacity_used: 0,
        template_id: None,
        version: 0,
    }
}

fn seed(storage: &ActivationStorage) {
    for (id, active) in [("b-1", true), ("b-2", true)] {
        storage
            .put_branch(&Branch {
                id: id.into(),
                name: format!("Branch {id}"),
                address: None,
                active,
            })
            .unwrap();
    }
    for (id, name) in [("t-1", "Linh"), ("t-2", "Minh"), ("t-3", "Quan")] {
        storage
            .put_trainer(&Trainer {
                id: id.into(),
                name: name.into(),
                branch_ids: vec!["b-1".into()],
                active: true,
            })
            .unwrap();
    }
    for (id, price, participants) in [
        ("p-basic", 1_500_000, 1),
        ("p-solo", 3_000_000, 1),
        ("p-duo", 3_000_000, 2),
        ("p-premium", 5_000_000, 2),
    ] {
        storage
            .put_package(&Package {
                id: id.into(),
                name: id.into(),
                price: Decimal::from(price),
                term_days: 30,
                max_participants: participants,
                active: true,
            })
            .unwrap();
    }

    // Mon 2 .. Fri 6 March 2026
    for s in [
        session("s-t1-mon", "t-1", date(2026, 3, 2), 8, 5),
        session("s-t1-wed", "t-1", date(2026, 3, 4), 8, 5),
        session("s-t1-fri", "t-1", date(2026, 3, 6), 8, 5),
        session("s-t2-mon", "t-2", date(2026, 3, 2), 8, 5),
        session("s-t2-tue", "t-2", date(2026, 3, 3), 8, 5),
        session("s-t2-thu", "t-2", date(2026, 3, 5), 8, 5),
    ] {
        storage.upsert_session(&s).unwrap();
    }
}

pub fn test_app() -> TestApp {
    let dir = tempfile::tempdir().unwrap();
    let config = Config::with_overrides(dir.path().to_string_lossy(), 0);
    let storage = ActivationStorage::open_in_memory().unwrap();
    seed(&storage);

    let clock = Arc::new(ManualClock::new(
        Utc.with_ymd_and_hms(2026, 3, 1, 5, 0, 0).unwrap(),
    ));
    let state = ServerState::with_storage(config, storage, clock.clone());
    let router = build_app(&state).with_state(state.clone());

    TestApp {
        state,
        router,
        clock,
        _dir: dir,
    }
}

impl TestApp {
    pub async fn send(
        &self,
        method: Method,
        uri: &str,
        actor: Option<&str>,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(actor) = actor {
            builder = builder.header("x-actor-id", actor);
        }
        let request = match body {
            Some(body) => builder
                .header("content-type", "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };

        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let json = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, json)
    }

    /// Ingest a payment record and return the registration id
    pub async fn purchase(&self, registration_id: &str, package_id: &str, participants: &[&str]) -> String {
        let (status, body) = self
            .send(
                Method::POST,
                "/api/payments/completed",
                None,
                Some(json!({
                    "registrationId": registration_id,
                    "packageId": package_id,
                    "payerId": OWNER,
                    "participantIds": participants,
                    "amount": 3000000,
                    "startDate": "2026-03-01",
                })),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED, "{body}");
        body["registration"]["id"].as_str().unwrap().to_string()
    }
}

/// Selection item echoing what the client was shown
pub fn pick(session_id: &str, trainer: &str, day: &str) -> Value {
    json!({
        "sessionId": session_id,
        "date": day,
        "startTime": "08:00:00",
        "endTime": "10:00:00",
        "trainerId": trainer,
    })
}
