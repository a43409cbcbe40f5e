//! Workflow API 模块
//!
//! | 路径 | 方法 | 说明 |
//! |------|------|------|
//! | /api/workflow-status/{id} | GET | 当前步骤与候选数据 |
//! | /api/registration/{id}/branch | PUT | 确认/更换门店 (仅购买人) |
//! | /api/registration/{id}/schedule | GET | 已提交课表 |
//! | /api/select-trainer/{id} | POST | 选择教练与偏好 |
//! | /api/match-trainers/{id} | POST | 按偏好匹配教练 (分页) |
//! | /api/generate-schedule/{id} | POST | 提交每周课表 |
//! | /api/complete-workflow/{id} | POST | 完成激活 |

mod handler;

use axum::{
    Router,
    routing::{get, post, put},
};

use crate::core::ServerState;

pub fn router() -> Router<ServerState> {
    Router::new()
        .route("/api/workflow-status/{id}", get(handler::get_status))
        .route("/api/registration/{id}/branch", put(handler::confirm_branch))
        .route("/api/registration/{id}/schedule", get(handler::get_schedule))
        .route("/api/select-trainer/{id}", post(handler::select_trainer))
        .route("/api/match-trainers/{id}", post(handler::match_trainers))
        .route("/api/generate-schedule/{id}", post(handler::generate_schedule))
        .route("/api/complete-workflow/{id}", post(handler::complete_workflow))
}
