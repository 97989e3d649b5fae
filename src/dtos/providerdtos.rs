use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::models::{taskmodel::ServiceCategory, verificationmodels::DocumentType};

#[derive(Debug, Serialize, Deserialize, Validate)]
pub struct CreateProviderProfileDto {
    pub category: ServiceCategory,

    #[validate(range(min = 0.0, message = "Hourly rate must be positive"))]
    pub hourly_rate: Option<f64>,

    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateAvailabilityDto {
    pub is_available: bool,
}

#[derive(Debug, Serialize, Deserialize, Validate)]
pub struct SubmitDocumentDto {
    pub doc_type: DocumentType,

    #[validate(length(min = 1, max = 500, message = "Storage reference is required"))]
    pub storage_ref: String,
}

#[derive(Debug, Serialize, Deserialize, Validate)]
pub struct ReviewDocumentDto {
    pub approve: bool,

    #[validate(length(max = 1000, message = "Notes must be at most 1000 characters"))]
    pub notes: Option<String>,
}
