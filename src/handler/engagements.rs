// handler/engagements.rs
use std::sync::Arc;

use axum::{
    extract::Path,
    response::IntoResponse,
    routing::{get, put},
    Extension, Json, Router,
};
use uuid::Uuid;
use validator::Validate;

use crate::{
    db::{providerdb::ProviderExt, taskdb::TaskExt, userdb::UserExt},
    dtos::taskdtos::*,
    error::HttpError,
    middleware::{require_role, JWTAuthMiddeware},
    models::{taskmodel::EngagementStatus, usermodel::UserRole},
    service::disclosure::{self, Viewer},
    AppState,
};

pub fn engagement_handler() -> Router {
    Router::new()
        .route("/:engagement_id", get(get_engagement))
        .route("/:engagement_id/decision", put(call_center_decision))
        .route("/:engagement_id/start", put(start_work))
        .route("/:engagement_id/complete", put(mark_completed))
        .route("/:engagement_id/cancel", put(cancel_engagement))
}

/// Disclosure-filtered read. The mask is recomputed on every call from the
/// current status and viewer; nothing here is cacheable.
pub async fn get_engagement(
    Extension(app_state): Extension<Arc<AppState>>,
    Extension(auth): Extension<JWTAuthMiddeware>,
    Path(engagement_id): Path<Uuid>,
) -> Result<impl IntoResponse, HttpError> {
    let engagement = app_state
        .engagement_service
        .get_engagement(engagement_id)
        .await?;

    let profile = app_state
        .db_client
        .get_provider_profile_by_id(engagement.provider_id)
        .await
        .map_err(|e| HttpError::server_error(e.to_string()))?
        .ok_or_else(|| HttpError::not_found("Provider profile not found"))?;

    let viewer = Viewer::resolve(&auth.user, profile.user_id, &engagement)
        .ok_or_else(|| HttpError::forbidden("Not a party to this engagement"))?;

    let task = app_state
        .db_client
        .get_task_by_id(engagement.task_id)
        .await
        .map_err(|e| HttpError::server_error(e.to_string()))?
        .ok_or_else(|| HttpError::not_found("Task not found"))?;

    let client_user = app_state
        .db_client
        .get_user(engagement.client_id)
        .await
        .map_err(|e| HttpError::server_error(e.to_string()))?
        .ok_or_else(|| HttpError::not_found("Client not found"))?;

    let provider_user = app_state
        .db_client
        .get_user(profile.user_id)
        .await
        .map_err(|e| HttpError::server_error(e.to_string()))?
        .ok_or_else(|| HttpError::not_found("Provider not found"))?;

    let status = engagement.status.unwrap_or(EngagementStatus::Pending);

    let view = EngagementViewDto {
        task: TaskSummaryDto::from_task(&task),
        client: disclosure::client_view(&client_user, status, viewer),
        provider: disclosure::provider_view(&provider_user, &profile, status, viewer),
        engagement,
    };

    Ok(Json(ApiResponse::success(
        "Engagement retrieved successfully",
        view,
    )))
}

pub async fn call_center_decision(
    Extension(app_state): Extension<Arc<AppState>>,
    Extension(auth): Extension<JWTAuthMiddeware>,
    Path(engagement_id): Path<Uuid>,
    Json(body): Json<CallCenterDecisionDto>,
) -> Result<impl IntoResponse, HttpError> {
    require_role(&auth, &[UserRole::CallCenter, UserRole::Admin])?;
    body.validate()
        .map_err(|e| HttpError::bad_request(e.to_string()))?;

    let engagement = if body.approve {
        app_state
            .engagement_service
            .call_center_approve(engagement_id, auth.user.id)
            .await?
    } else {
        app_state
            .engagement_service
            .call_center_reject(
                engagement_id,
                auth.user.id,
                body.notes.unwrap_or_else(|| "Not approved".to_string()),
            )
            .await?
    };

    Ok(Json(ApiResponse::success(
        "Decision recorded successfully",
        engagement,
    )))
}

pub async fn start_work(
    Extension(app_state): Extension<Arc<AppState>>,
    Extension(auth): Extension<JWTAuthMiddeware>,
    Path(engagement_id): Path<Uuid>,
) -> Result<impl IntoResponse, HttpError> {
    require_role(&auth, &[UserRole::Provider])?;

    let engagement = app_state
        .engagement_service
        .start_work(engagement_id, auth.user.id)
        .await?;

    Ok(Json(ApiResponse::success(
        "Work started successfully",
        engagement,
    )))
}

pub async fn mark_completed(
    Extension(app_state): Extension<Arc<AppState>>,
    Extension(auth): Extension<JWTAuthMiddeware>,
    Path(engagement_id): Path<Uuid>,
) -> Result<impl IntoResponse, HttpError> {
    let result = app_state
        .engagement_service
        .mark_completed(engagement_id, auth.user.id)
        .await?;

    Ok(Json(ApiResponse::success(
        "Engagement completed successfully",
        result,
    )))
}

pub async fn cancel_engagement(
    Extension(app_state): Extension<Arc<AppState>>,
    Extension(auth): Extension<JWTAuthMiddeware>,
    Path(engagement_id): Path<Uuid>,
) -> Result<impl IntoResponse, HttpError> {
    let engagement = app_state
        .engagement_service
        .cancel(engagement_id, auth.user.id)
        .await?;

    Ok(Json(ApiResponse::success(
        "Engagement cancelled successfully",
        engagement,
    )))
}
