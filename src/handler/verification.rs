// handler/verification.rs
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
    dtos::{providerdtos::ReviewDocumentDto, taskdtos::ApiResponse},
    error::HttpError,
    middleware::{require_role, JWTAuthMiddeware},
    models::usermodel::UserRole,
    AppState,
};

pub fn verification_handler() -> Router {
    Router::new()
        .route("/:document_id/review", put(review_document))
        .route("/provider/:provider_id/approved-types", get(get_approved_types))
}

pub async fn review_document(
    Extension(app_state): Extension<Arc<AppState>>,
    Extension(auth): Extension<JWTAuthMiddeware>,
    Path(document_id): Path<Uuid>,
    Json(body): Json<ReviewDocumentDto>,
) -> Result<impl IntoResponse, HttpError> {
    require_role(&auth, &[UserRole::Verifier, UserRole::Admin])?;
    body.validate()
        .map_err(|e| HttpError::bad_request(e.to_string()))?;

    let (document, profile) = app_state
        .verification_service
        .review_document(document_id, auth.user.id, body.approve, body.notes)
        .await?;

    Ok(Json(ApiResponse::success(
        "Document review recorded successfully",
        serde_json::json!({
            "document": document,
            "verification_status": profile.verification_status,
        }),
    )))
}

pub async fn get_approved_types(
    Extension(app_state): Extension<Arc<AppState>>,
    Extension(auth): Extension<JWTAuthMiddeware>,
    Path(provider_id): Path<Uuid>,
) -> Result<impl IntoResponse, HttpError> {
    require_role(
        &auth,
        &[UserRole::Verifier, UserRole::Admin, UserRole::CallCenter],
    )?;

    let types = app_state
        .verification_service
        .get_approved_documents(provider_id)
        .await?;

    Ok(Json(ApiResponse::success(
        "Approved document types retrieved successfully",
        types,
    )))
}
