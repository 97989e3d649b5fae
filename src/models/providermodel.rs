use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::types::BigDecimal;
use uuid::Uuid;

use super::taskmodel::ServiceCategory;

#[derive(Debug, Serialize, Deserialize, Clone, Copy, sqlx::Type, PartialEq)]
#[sqlx(type_name = "verification_status", rename_all = "snake_case")]
pub enum VerificationStatus {
    Unverified,
    Pending,
    Verified,
    Rejected,
}

impl VerificationStatus {
    pub fn to_str(&self) -> &str {
        match self {
            VerificationStatus::Unverified => "unverified",
            VerificationStatus::Pending => "pending",
            VerificationStatus::Verified => "verified",
            VerificationStatus::Rejected => "rejected",
        }
    }
}

#[derive(Debug, Serialize, Deserialize, sqlx::FromRow, Clone)]
pub struct ProviderProfile {
    pub id: Uuid,
    pub user_id: Uuid,
    pub category: ServiceCategory,
    pub hourly_rate: Option<BigDecimal>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    // Derived by the verification gate from document rows. Matching and
    // notification targeting filter on this column instead of re-deriving.
    pub verification_status: Option<VerificationStatus>,
    pub is_available: Option<bool>,        // Database has DEFAULT TRUE, can be NULL
    pub rating: Option<f32>,               // Database has DEFAULT 0.0, can be NULL
    pub completed_jobs: Option<i32>,       // Database has DEFAULT 0, can be NULL
    pub created_at: Option<DateTime<Utc>>, // Database has DEFAULT NOW(), can be NULL
    pub updated_at: Option<DateTime<Utc>>,
}

impl ProviderProfile {
    pub fn is_verified(&self) -> bool {
        self.verification_status == Some(VerificationStatus::Verified)
    }
}
