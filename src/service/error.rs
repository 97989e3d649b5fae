use crate::{error::HttpError, models::taskmodel::*};
use axum::http::StatusCode;
use thiserror::Error;
use uuid::Uuid;

#[derive(Error, Debug)]
pub enum ServiceError {
    #[error("Task {0} not found")]
    TaskNotFound(Uuid),

    #[error("Engagement {0} not found")]
    EngagementNotFound(Uuid),

    #[error("Payment record {0} not found")]
    PaymentNotFound(Uuid),

    #[error("Provider profile not found for user {0}")]
    ProviderProfileNotFound(Uuid),

    #[error("Document {0} not found")]
    DocumentNotFound(Uuid),

    #[error("Engagement {0} is in status {1:?}, cannot {2}")]
    InvalidEngagementStatus(Uuid, EngagementStatus, &'static str),

    #[error("Task {0} is in status {1:?}, cannot {2}")]
    InvalidTaskStatus(Uuid, TaskStatus, &'static str),

    #[error("Payment record {0} is in status {1:?}, cannot {2}")]
    InvalidPaymentStatus(Uuid, PaymentStatus, &'static str),

    #[error("Guard violation: {0}")]
    Guard(String),

    // Optimistic-concurrency loss: another actor won the conditional write.
    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("User {0} is not authorized to perform this action on {1}")]
    Unauthorized(Uuid, Uuid),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Notification error: {0}")]
    Notification(String),
}

impl ServiceError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            ServiceError::TaskNotFound(_)
            | ServiceError::EngagementNotFound(_)
            | ServiceError::PaymentNotFound(_)
            | ServiceError::ProviderProfileNotFound(_)
            | ServiceError::DocumentNotFound(_) => StatusCode::NOT_FOUND,

            ServiceError::InvalidEngagementStatus(_, _, _)
            | ServiceError::InvalidTaskStatus(_, _, _)
            | ServiceError::InvalidPaymentStatus(_, _, _)
            | ServiceError::Guard(_) => StatusCode::UNPROCESSABLE_ENTITY,

            ServiceError::Conflict(_) => StatusCode::CONFLICT,

            ServiceError::Unauthorized(_, _) => StatusCode::FORBIDDEN,

            ServiceError::Validation(_) => StatusCode::BAD_REQUEST,

            ServiceError::Database(_) | ServiceError::Notification(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl From<ServiceError> for HttpError {
    fn from(error: ServiceError) -> Self {
        let status = error.status_code();
        HttpError::new(error.to_string(), status)
    }
}
