// handler/tasks.rs
use std::sync::Arc;

use axum::{
    extract::Path,
    response::IntoResponse,
    routing::{get, post},
    Extension, Json, Router,
};
use uuid::Uuid;
use validator::Validate;

use crate::{
    db::taskdb::TaskExt,
    dtos::taskdtos::*,
    error::HttpError,
    middleware::{require_role, JWTAuthMiddeware},
    models::usermodel::UserRole,
    AppState,
};

pub fn task_handler() -> Router {
    Router::new()
        .route("/", post(create_task))
        .route("/:task_id", get(get_task).delete(delete_task))
        .route("/:task_id/matches", get(list_matching_providers))
        .route("/:task_id/interest", post(submit_interest))
        .route("/:task_id/engagements", get(list_task_engagements))
        .route("/:task_id/audit", get(get_task_audit_trail))
}

pub async fn create_task(
    Extension(app_state): Extension<Arc<AppState>>,
    Extension(auth): Extension<JWTAuthMiddeware>,
    Json(body): Json<CreateTaskDto>,
) -> Result<impl IntoResponse, HttpError> {
    require_role(&auth, &[UserRole::Client, UserRole::Admin])?;
    body.validate()
        .map_err(|e| HttpError::bad_request(e.to_string()))?;
    validate_coordinates(body.latitude, body.longitude).map_err(HttpError::bad_request)?;

    let task = app_state
        .db_client
        .create_task(
            auth.user.id,
            body.category,
            body.description,
            body.budget,
            body.latitude,
            body.longitude,
        )
        .await
        .map_err(|e| HttpError::server_error(e.to_string()))?;

    app_state
        .audit_service
        .log_task_created(auth.user.id, &task)
        .await?;

    // Candidate discovery runs synchronously on creation; dispatching the
    // notifications is fire-and-forget.
    let matches = app_state
        .matching_service
        .match_providers_for_task(&task)
        .await?;

    let mut candidate_user_ids = Vec::with_capacity(matches.len());
    for m in &matches {
        candidate_user_ids.push(m.provider.user_id);
    }

    if let Err(err) = app_state
        .notification_service
        .notify_task_candidates(&task, &candidate_user_ids)
        .await
    {
        tracing::warn!("candidate notification dispatch failed: {}", err);
    }

    Ok(Json(ApiResponse::success("Task created successfully", task)))
}

pub async fn get_task(
    Extension(app_state): Extension<Arc<AppState>>,
    Extension(auth): Extension<JWTAuthMiddeware>,
    Path(task_id): Path<Uuid>,
) -> Result<impl IntoResponse, HttpError> {
    let task = app_state
        .db_client
        .get_task_by_id(task_id)
        .await
        .map_err(|e| HttpError::server_error(e.to_string()))?
        .ok_or_else(|| HttpError::not_found("Task not found"))?;

    // Owners and staff see the full row; providers browsing get the public
    // summary only (no client identity attached).
    let is_owner = task.client_id == auth.user.id;
    let is_staff = matches!(
        auth.user.role,
        UserRole::Admin | UserRole::CallCenter | UserRole::PaymentApprover | UserRole::Verifier
    );

    if is_owner || is_staff {
        Ok(Json(ApiResponse::success("Task retrieved successfully", serde_json::json!(task))))
    } else {
        let summary = TaskSummaryDto::from_task(&task);
        Ok(Json(ApiResponse::success(
            "Task retrieved successfully",
            serde_json::json!(summary),
        )))
    }
}

pub async fn delete_task(
    Extension(app_state): Extension<Arc<AppState>>,
    Extension(auth): Extension<JWTAuthMiddeware>,
    Path(task_id): Path<Uuid>,
) -> Result<impl IntoResponse, HttpError> {
    let task = app_state
        .db_client
        .get_task_by_id(task_id)
        .await
        .map_err(|e| HttpError::server_error(e.to_string()))?
        .ok_or_else(|| HttpError::not_found("Task not found"))?;

    if task.client_id != auth.user.id && auth.user.role != UserRole::Admin {
        return Err(HttpError::forbidden("Not authorized to delete this task"));
    }

    let deleted = app_state
        .db_client
        .soft_delete_task(task_id)
        .await
        .map_err(|e| HttpError::server_error(e.to_string()))?
        .ok_or_else(|| HttpError::not_found("Task not found"))?;

    Ok(Json(ApiResponse::success("Task deleted successfully", deleted)))
}

pub async fn list_matching_providers(
    Extension(app_state): Extension<Arc<AppState>>,
    Extension(auth): Extension<JWTAuthMiddeware>,
    Path(task_id): Path<Uuid>,
) -> Result<impl IntoResponse, HttpError> {
    let task = app_state
        .db_client
        .get_task_by_id(task_id)
        .await
        .map_err(|e| HttpError::server_error(e.to_string()))?
        .ok_or_else(|| HttpError::not_found("Task not found"))?;

    if task.client_id != auth.user.id {
        require_role(&auth, &[UserRole::Admin, UserRole::CallCenter])?;
    }

    let matches = app_state
        .matching_service
        .match_providers_for_task(&task)
        .await?;

    Ok(Json(ApiResponse::success(
        "Matching providers retrieved successfully",
        matches,
    )))
}

pub async fn submit_interest(
    Extension(app_state): Extension<Arc<AppState>>,
    Extension(auth): Extension<JWTAuthMiddeware>,
    Path(task_id): Path<Uuid>,
    Json(body): Json<SubmitInterestDto>,
) -> Result<impl IntoResponse, HttpError> {
    require_role(&auth, &[UserRole::Provider])?;
    body.validate()
        .map_err(|e| HttpError::bad_request(e.to_string()))?;

    let engagement = app_state
        .engagement_service
        .submit_interest(task_id, auth.user.id, body.message)
        .await?;

    Ok(Json(ApiResponse::success(
        "Interest submitted successfully",
        engagement,
    )))
}

pub async fn get_task_audit_trail(
    Extension(app_state): Extension<Arc<AppState>>,
    Extension(auth): Extension<JWTAuthMiddeware>,
    Path(task_id): Path<Uuid>,
) -> Result<impl IntoResponse, HttpError> {
    require_role(&auth, &[UserRole::Admin, UserRole::CallCenter])?;

    let logs = app_state
        .audit_service
        .get_audit_logs_for_task(task_id, 100, 0)
        .await?;

    Ok(Json(ApiResponse::success(
        "Audit trail retrieved successfully",
        logs,
    )))
}

pub async fn list_task_engagements(
    Extension(app_state): Extension<Arc<AppState>>,
    Extension(auth): Extension<JWTAuthMiddeware>,
    Path(task_id): Path<Uuid>,
) -> Result<impl IntoResponse, HttpError> {
    let task = app_state
        .db_client
        .get_task_by_id(task_id)
        .await
        .map_err(|e| HttpError::server_error(e.to_string()))?
        .ok_or_else(|| HttpError::not_found("Task not found"))?;

    if task.client_id != auth.user.id {
        require_role(&auth, &[UserRole::Admin, UserRole::CallCenter])?;
    }

    let engagements = app_state.engagement_service.list_for_task(task_id).await?;

    Ok(Json(ApiResponse::success(
        "Engagements retrieved successfully",
        engagements,
    )))
}
