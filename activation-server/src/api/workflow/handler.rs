//! Workflow API Handlers

use axum::{
    Json,
    extract::{Path, Query, State},
};
use shared::models::{Registration, Trainer};
use shared::request::{
    ConfirmBranchRequest, GenerateScheduleRequest, MatchTrainersRequest, SelectTrainerRequest,
};
use shared::response::{CompleteWorkflowResult, ScheduleCommitResult, ScheduleEntry, WorkflowStatus};
use shared::types::Page;

use crate::api::Actor;
use crate::core::ServerState;
use crate::utils::AppResult;
use crate::utils::types::PaginationParams;
use crate::utils::validation::validate_request;

/// GET /api/workflow-status/:id - 获取工作流状态
pub async fn get_status(
    State(state): State<ServerState>,
    actor: Actor,
    Path(id): Path<String>,
) -> AppResult<Json<WorkflowStatus>> {
    let status = state.workflow.get_status(&id, actor.id()).await?;
    Ok(Json(status))
}

/// PUT /api/registration/:id/branch - 确认或更换门店
pub async fn confirm_branch(
    State(state): State<ServerState>,
    actor: Actor,
    Path(id): Path<String>,
    Json(payload): Json<ConfirmBranchRequest>,
) -> AppResult<Json<Registration>> {
    validate_request(&payload)?;
    let registration = state
        .workflow
        .confirm_branch(&id, actor.id(), &payload.branch_id)
        .await?;

    tracing::info!(
        registration_id = %id,
        actor_id = %actor.id(),
        branch_id = %payload.branch_id,
        "Branch confirmed"
    );
    Ok(Json(registration))
}

/// GET /api/registration/:id/schedule - 获取已提交课表
pub async fn get_schedule(
    State(state): State<ServerState>,
    actor: Actor,
    Path(id): Path<String>,
) -> AppResult<Json<Vec<ScheduleEntry>>> {
    let entries = state.workflow.schedule(&id, actor.id()).await?;
    Ok(Json(entries))
}

/// POST /api/select-trainer/:id - 选择教练
pub async fn select_trainer(
    State(state): State<ServerState>,
    actor: Actor,
    Path(id): Path<String>,
    Json(payload): Json<SelectTrainerRequest>,
) -> AppResult<Json<Registration>> {
    validate_request(&payload)?;
    let registration = state
        .workflow
        .select_trainer(&id, actor.id(), &payload)
        .await?;

    tracing::info!(
        registration_id = %id,
        actor_id = %actor.id(),
        trainer_id = %payload.trainer_id,
        sessions_per_week = payload.sessions_per_week,
        "Trainer selected"
    );
    Ok(Json(registration))
}

/// POST /api/match-trainers/:id?page=&page_size= - 按偏好匹配教练
pub async fn match_trainers(
    State(state): State<ServerState>,
    actor: Actor,
    Path(id): Path<String>,
    Query(params): Query<PaginationParams>,
    Json(payload): Json<MatchTrainersRequest>,
) -> AppResult<Json<Page<Trainer>>> {
    validate_request(&payload)?;
    let page_size = params.page_size_or(state.config.match_page_size);
    let page = state
        .workflow
        .match_trainers(&id, actor.id(), &payload, params.page(), page_size)
        .await?;
    Ok(Json(page))
}

/// POST /api/generate-schedule/:id - 提交每周课表
pub async fn generate_schedule(
    State(state): State<ServerState>,
    actor: Actor,
    Path(id): Path<String>,
    Json(payload): Json<GenerateScheduleRequest>,
) -> AppResult<Json<ScheduleCommitResult>> {
    validate_request(&payload)?;
    let result = state
        .workflow
        .generate_schedule(&id, actor.id(), &payload)
        .await?;

    tracing::info!(
        registration_id = %id,
        actor_id = %actor.id(),
        role = %result.role,
        sessions = result.reservations.len(),
        already_committed = result.already_committed,
        "Schedule committed"
    );
    Ok(Json(result))
}

/// POST /api/complete-workflow/:id - 完成激活
pub async fn complete_workflow(
    State(state): State<ServerState>,
    actor: Actor,
    Path(id): Path<String>,
) -> AppResult<Json<CompleteWorkflowResult>> {
    let result = state.workflow.complete_workflow(&id, actor.id()).await?;
    Ok(Json(result))
}
