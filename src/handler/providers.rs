// handler/providers.rs
use std::sync::Arc;

use axum::{
    response::IntoResponse,
    routing::{get, post, put},
    Extension, Json, Router,
};
use validator::Validate;

use crate::{
    db::{providerdb::ProviderExt, verificationdb::VerificationExt},
    dtos::{
        providerdtos::*,
        taskdtos::{validate_coordinates, ApiResponse},
    },
    error::HttpError,
    middleware::{require_role, JWTAuthMiddeware},
    models::usermodel::UserRole,
    AppState,
};

pub fn provider_handler() -> Router {
    Router::new()
        .route("/profile", post(create_provider_profile).get(get_provider_profile))
        .route("/profile/availability", put(update_availability))
        .route("/documents", post(submit_document).get(get_own_documents))
}

pub async fn create_provider_profile(
    Extension(app_state): Extension<Arc<AppState>>,
    Extension(auth): Extension<JWTAuthMiddeware>,
    Json(body): Json<CreateProviderProfileDto>,
) -> Result<impl IntoResponse, HttpError> {
    require_role(&auth, &[UserRole::Provider])?;
    body.validate()
        .map_err(|e| HttpError::bad_request(e.to_string()))?;
    validate_coordinates(body.latitude, body.longitude).map_err(HttpError::bad_request)?;

    let existing = app_state
        .db_client
        .get_provider_profile(auth.user.id)
        .await
        .map_err(|e| HttpError::server_error(e.to_string()))?;

    if existing.is_some() {
        return Err(HttpError::bad_request("Provider profile already exists"));
    }

    let profile = app_state
        .db_client
        .create_provider_profile(
            auth.user.id,
            body.category,
            body.hourly_rate,
            body.latitude,
            body.longitude,
        )
        .await
        .map_err(|e| HttpError::server_error(e.to_string()))?;

    Ok(Json(ApiResponse::success(
        "Provider profile created successfully",
        profile,
    )))
}

pub async fn get_provider_profile(
    Extension(app_state): Extension<Arc<AppState>>,
    Extension(auth): Extension<JWTAuthMiddeware>,
) -> Result<impl IntoResponse, HttpError> {
    let profile = app_state
        .db_client
        .get_provider_profile(auth.user.id)
        .await
        .map_err(|e| HttpError::server_error(e.to_string()))?
        .ok_or_else(|| HttpError::not_found("Provider profile not found"))?;

    Ok(Json(ApiResponse::success(
        "Provider profile retrieved successfully",
        profile,
    )))
}

pub async fn update_availability(
    Extension(app_state): Extension<Arc<AppState>>,
    Extension(auth): Extension<JWTAuthMiddeware>,
    Json(body): Json<UpdateAvailabilityDto>,
) -> Result<impl IntoResponse, HttpError> {
    require_role(&auth, &[UserRole::Provider])?;

    let profile = app_state
        .db_client
        .get_provider_profile(auth.user.id)
        .await
        .map_err(|e| HttpError::server_error(e.to_string()))?
        .ok_or_else(|| HttpError::not_found("Provider profile not found"))?;

    let updated = app_state
        .db_client
        .update_provider_availability(profile.id, body.is_available)
        .await
        .map_err(|e| HttpError::server_error(e.to_string()))?
        .ok_or_else(|| HttpError::not_found("Provider profile not found"))?;

    Ok(Json(ApiResponse::success(
        "Availability updated successfully",
        updated,
    )))
}

pub async fn submit_document(
    Extension(app_state): Extension<Arc<AppState>>,
    Extension(auth): Extension<JWTAuthMiddeware>,
    Json(body): Json<SubmitDocumentDto>,
) -> Result<impl IntoResponse, HttpError> {
    require_role(&auth, &[UserRole::Provider])?;
    body.validate()
        .map_err(|e| HttpError::bad_request(e.to_string()))?;

    let (document, profile) = app_state
        .verification_service
        .submit_document(auth.user.id, body.doc_type, body.storage_ref)
        .await?;

    Ok(Json(ApiResponse::success(
        "Document submitted successfully",
        serde_json::json!({
            "document": document,
            "verification_status": profile.verification_status,
        }),
    )))
}

pub async fn get_own_documents(
    Extension(app_state): Extension<Arc<AppState>>,
    Extension(auth): Extension<JWTAuthMiddeware>,
) -> Result<impl IntoResponse, HttpError> {
    require_role(&auth, &[UserRole::Provider])?;

    let profile = app_state
        .db_client
        .get_provider_profile(auth.user.id)
        .await
        .map_err(|e| HttpError::server_error(e.to_string()))?
        .ok_or_else(|| HttpError::not_found("Provider profile not found"))?;

    let documents = app_state
        .db_client
        .get_documents_for_provider(profile.id)
        .await
        .map_err(|e| HttpError::server_error(e.to_string()))?;

    Ok(Json(ApiResponse::success(
        "Documents retrieved successfully",
        documents,
    )))
}
