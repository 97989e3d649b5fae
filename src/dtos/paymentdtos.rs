use chrono::{DateTime, Utc};
use num_traits::ToPrimitive;
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::models::taskmodel::{PaymentRecord, PaymentStatus};

#[derive(Debug, Serialize, Deserialize, Validate)]
pub struct PaymentDecisionDto {
    pub approve: bool,

    #[validate(length(max = 1000, message = "Notes must be at most 1000 characters"))]
    pub notes: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct PaymentResponseDto {
    pub id: Uuid,
    pub engagement_id: Uuid,
    pub gross_amount: f64,
    pub platform_fee: f64,
    pub payout_amount: Option<f64>,
    pub status: Option<PaymentStatus>,
    pub decided_by: Option<Uuid>,
    pub decided_at: Option<DateTime<Utc>>,
    pub released_at: Option<DateTime<Utc>>,
    pub created_at: Option<DateTime<Utc>>,
}

impl PaymentResponseDto {
    pub fn from_record(payment: &PaymentRecord) -> Self {
        Self {
            id: payment.id,
            engagement_id: payment.engagement_id,
            gross_amount: payment.gross_amount.to_f64().unwrap_or(0.0),
            platform_fee: payment.platform_fee.to_f64().unwrap_or(0.0),
            payout_amount: payment.payout_amount.as_ref().and_then(|p| p.to_f64()),
            status: payment.status,
            decided_by: payment.decided_by,
            decided_at: payment.decided_at,
            released_at: payment.released_at,
            created_at: payment.created_at,
        }
    }
}
