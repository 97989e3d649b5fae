use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Deserialize, Serialize, Clone, Copy, sqlx::Type, PartialEq, Eq, Hash)]
#[sqlx(type_name = "document_type", rename_all = "snake_case")]
pub enum DocumentType {
    NationalId,
    DriversLicense,
    Passport,
    BankStatement,
    TradeLicense,
    Certificate,
    Other,
}

impl DocumentType {
    pub fn to_str(&self) -> &str {
        match self {
            DocumentType::NationalId => "national_id",
            DocumentType::DriversLicense => "drivers_license",
            DocumentType::Passport => "passport",
            DocumentType::BankStatement => "bank_statement",
            DocumentType::TradeLicense => "trade_license",
            DocumentType::Certificate => "certificate",
            DocumentType::Other => "other",
        }
    }
}

#[derive(Debug, Deserialize, Serialize, Clone, Copy, sqlx::Type, PartialEq)]
#[sqlx(type_name = "document_status", rename_all = "snake_case")]
pub enum DocumentStatus {
    Pending,
    UnderReview,
    Approved,
    Rejected,
}

impl DocumentStatus {
    pub fn to_str(&self) -> &str {
        match self {
            DocumentStatus::Pending => "pending",
            DocumentStatus::UnderReview => "under_review",
            DocumentStatus::Approved => "approved",
            DocumentStatus::Rejected => "rejected",
        }
    }
}

// Documents are never deleted. A resubmission inserts a fresh row and the
// old one is simply no longer the latest for its type.
#[derive(Debug, Serialize, Deserialize, sqlx::FromRow, Clone)]
pub struct Document {
    pub id: Uuid,
    pub provider_id: Uuid, // provider_profiles.id
    pub doc_type: DocumentType,
    pub storage_ref: String,
    pub status: Option<DocumentStatus>, // Database has DEFAULT 'pending', can be NULL
    pub reviewed_by: Option<Uuid>,
    pub reviewed_at: Option<DateTime<Utc>>,
    pub review_notes: Option<String>,
    pub created_at: Option<DateTime<Utc>>, // Database has DEFAULT NOW(), can be NULL
}
