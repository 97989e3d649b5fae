// handler/payments.rs
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
    dtos::{
        paymentdtos::{PaymentDecisionDto, PaymentResponseDto},
        taskdtos::ApiResponse,
    },
    error::HttpError,
    middleware::{require_role, JWTAuthMiddeware},
    models::usermodel::UserRole,
    AppState,
};

pub fn payment_handler() -> Router {
    Router::new()
        .route("/:payment_id", get(get_payment))
        .route("/:payment_id/decision", put(payment_decision))
        .route("/:payment_id/release", put(release_payment))
}

pub async fn get_payment(
    Extension(app_state): Extension<Arc<AppState>>,
    Extension(auth): Extension<JWTAuthMiddeware>,
    Path(payment_id): Path<Uuid>,
) -> Result<impl IntoResponse, HttpError> {
    require_role(&auth, &[UserRole::PaymentApprover, UserRole::Admin])?;

    let payment = app_state.escrow_service.get_payment(payment_id).await?;

    Ok(Json(ApiResponse::success(
        "Payment retrieved successfully",
        PaymentResponseDto::from_record(&payment),
    )))
}

pub async fn payment_decision(
    Extension(app_state): Extension<Arc<AppState>>,
    Extension(auth): Extension<JWTAuthMiddeware>,
    Path(payment_id): Path<Uuid>,
    Json(body): Json<PaymentDecisionDto>,
) -> Result<impl IntoResponse, HttpError> {
    require_role(&auth, &[UserRole::PaymentApprover])?;
    body.validate()
        .map_err(|e| HttpError::bad_request(e.to_string()))?;

    let payment = app_state
        .escrow_service
        .decide_payment(payment_id, auth.user.id, body.approve, body.notes)
        .await?;

    Ok(Json(ApiResponse::success(
        "Payment decision recorded successfully",
        PaymentResponseDto::from_record(&payment),
    )))
}

pub async fn release_payment(
    Extension(app_state): Extension<Arc<AppState>>,
    Extension(auth): Extension<JWTAuthMiddeware>,
    Path(payment_id): Path<Uuid>,
) -> Result<impl IntoResponse, HttpError> {
    require_role(&auth, &[UserRole::PaymentApprover])?;

    let payment = app_state
        .escrow_service
        .release_payment(payment_id, auth.user.id)
        .await?;

    Ok(Json(ApiResponse::success(
        "Payment released successfully",
        PaymentResponseDto::from_record(&payment),
    )))
}
