//! 名额竞争测试
//!
//! 多个注册同时提交包含同一节满员在即课程的课表：
//! 成功数不超过容量，失败者已占的其它名额全部回滚。

mod common;

use std::sync::Arc;

use activation_server::scheduling::{ConflictReason, SchedulingError};
use activation_server::workflow::WorkflowError;
use chrono::{TimeZone, Utc, Weekday};
use common::{OWNER, date, session, test_app};
use rand::seq::SliceRandom;
use shared::models::PreferredWindow;
use shared::request::{GenerateScheduleRequest, SelectTrainerRequest, SessionSelection};

const CONTENDERS: usize = 12;
const SCARCE_CAPACITY: u32 = 4;

fn selection(s: &shared::models::Session) -> SessionSelection {
    SessionSelection {
        session_id: s.id.clone(),
        date: s.date,
        start_time: s.start_time,
        end_time: s.end_time,
        trainer_id: s.trainer_id.clone(),
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_commits_never_overbook() {
    let app = test_app();

    // Saturday is scarce, Sunday is not
    let scarce = session("s-t3-sat", "t-3", date(2026, 3, 7), 8, SCARCE_CAPACITY);
    let roomy = session("s-t3-sun", "t-3", date(2026, 3, 8), 8, 50);
    app.state.storage.upsert_session(&scarce).unwrap();
    app.state.storage.upsert_session(&roomy).unwrap();

    let mut ids = Vec::with_capacity(CONTENDERS);
    for i in 0..CONTENDERS {
        let id = app.purchase(&format!("r-{i:02}"), "p-solo", &[OWNER]).await;
        let workflow = &app.state.workflow;
        workflow.confirm_branch(&id, OWNER, "b-1").await.unwrap();
        workflow
            .select_trainer(
                &id,
                OWNER,
                &SelectTrainerRequest {
                    trainer_id: "t-3".into(),
                    preferred_windows: vec![PreferredWindow {
                        slot_id: 2,
                        weekday: Some(Weekday::Sat),
                    }],
                    sessions_per_week: 2,
                },
            )
            .await
            .unwrap();
        ids.push(id);
    }
    ids.shuffle(&mut rand::thread_rng());

    // Roomy first so losers have something to roll back
    let request = Arc::new(GenerateScheduleRequest {
        sessions: vec![selection(&roomy), selection(&scarce)],
    });

    let mut handles = Vec::with_capacity(CONTENDERS);
    for id in ids {
        let workflow = app.state.workflow.clone();
        let request = request.clone();
        handles.push(tokio::spawn(async move {
            workflow.generate_schedule(&id, OWNER, &request).await
        }));
    }

    let mut committed = 0;
    let mut rejected = 0;
    for handle in handles {
        match handle.await.unwrap() {
            Ok(result) => {
                assert_eq!(result.reservations.len(), 2);
                committed += 1;
            }
            Err(WorkflowError::Scheduling(SchedulingError::Conflict(conflicts))) => {
                assert_eq!(conflicts[0].session_id, "s-t3-sat");
                assert_eq!(conflicts[0].reason, ConflictReason::Full);
                rejected += 1;
            }
            Err(other) => panic!("unexpected error: {other}"),
        }
    }

    assert_eq!(committed, SCARCE_CAPACITY as usize);
    assert_eq!(rejected, CONTENDERS - SCARCE_CAPACITY as usize);

    let sat = app.state.storage.get_session("s-t3-sat").unwrap().unwrap();
    let sun = app.state.storage.get_session("s-t3-sun").unwrap().unwrap();
    assert_eq!(sat.capacity_used, SCARCE_CAPACITY);
    assert_eq!(sun.capacity_used, SCARCE_CAPACITY);
    assert_eq!(
        app.state.storage.get_stats().unwrap().reservation_count,
        u64::from(SCARCE_CAPACITY) * 2
    );
}

#[tokio::test]
async fn test_started_session_is_not_registrable() {
    let app = test_app();
    let id = app.purchase("r-late", "p-solo", &[OWNER]).await;
    let workflow = &app.state.workflow;
    workflow.confirm_branch(&id, OWNER, "b-1").await.unwrap();
    workflow
        .select_trainer(
            &id,
            OWNER,
            &SelectTrainerRequest {
                trainer_id: "t-1".into(),
                preferred_windows: vec![PreferredWindow {
                    slot_id: 2,
                    weekday: None,
                }],
                sessions_per_week: 2,
            },
        )
        .await
        .unwrap();

    // Monday 08:30 local: the Monday session is under way
    app.clock.set(Utc.with_ymd_and_hms(2026, 3, 2, 1, 30, 0).unwrap());

    let mon = app.state.storage.get_session("s-t1-mon").unwrap().unwrap();
    let wed = app.state.storage.get_session("s-t1-wed").unwrap().unwrap();
    let err = workflow
        .generate_schedule(
            &id,
            OWNER,
            &GenerateScheduleRequest {
                sessions: vec![selection(&mon), selection(&wed)],
            },
        )
        .await
        .unwrap_err();

    match err {
        WorkflowError::Scheduling(SchedulingError::Conflict(conflicts)) => {
            assert_eq!(conflicts.len(), 1);
            assert_eq!(conflicts[0].session_id, "s-t1-mon");
            assert_eq!(conflicts[0].reason, ConflictReason::Started);
        }
        other => panic!("unexpected error: {other}"),
    }
    let wed = app.state.storage.get_session("s-t1-wed").unwrap().unwrap();
    assert_eq!(wed.capacity_used, 0);
}
