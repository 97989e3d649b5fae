// service/escrow_service.rs
//
// Payment approval sub-machine: pending -> approved -> released, or
// pending -> rejected. Rows are created exactly once per completed
// engagement and become immutable once released or rejected. Rejecting a
// payment is a financial decision only; the engagement stays completed.
use std::sync::Arc;

use num_traits::ToPrimitive;
use sqlx::types::BigDecimal;
use uuid::Uuid;

use crate::{
    db::{db::DBClient, providerdb::ProviderExt, taskdb::TaskExt},
    models::taskmodel::*,
    service::{
        audit_service::AuditService, error::ServiceError,
        notification_service::NotificationService,
    },
};

/// Platform fee on the gross amount, rounded to cents.
pub fn compute_platform_fee(gross: f64, percent: f64) -> f64 {
    (gross * percent / 100.0 * 100.0).round() / 100.0
}

#[derive(Debug, Clone)]
pub struct EscrowService {
    db_client: Arc<DBClient>,
    notification_service: Arc<NotificationService>,
    audit_service: Arc<AuditService>,
    platform_fee_percent: f64,
}

impl EscrowService {
    pub fn new(
        db_client: Arc<DBClient>,
        notification_service: Arc<NotificationService>,
        audit_service: Arc<AuditService>,
        platform_fee_percent: f64,
    ) -> Self {
        Self {
            db_client,
            notification_service,
            audit_service,
            platform_fee_percent,
        }
    }

    /// Called by the engagement state machine when an engagement reaches
    /// completed. Safe under retry: the unique engagement_id makes this
    /// create-or-fetch.
    pub async fn create_for_completion(
        &self,
        engagement: &Engagement,
        task: &Task,
    ) -> Result<PaymentRecord, ServiceError> {
        let gross = task
            .budget
            .as_ref()
            .and_then(|b| b.to_f64())
            .unwrap_or(0.0);
        let fee = compute_platform_fee(gross, self.platform_fee_percent);

        let gross_bd = BigDecimal::try_from(gross)
            .map_err(|_| ServiceError::Validation("Invalid gross amount".to_string()))?;
        let fee_bd = BigDecimal::try_from(fee)
            .map_err(|_| ServiceError::Validation("Invalid platform fee".to_string()))?;

        let payment = self
            .db_client
            .ensure_payment_record(engagement.id, gross_bd, fee_bd)
            .await?;

        Ok(payment)
    }

    pub async fn get_payment(&self, payment_id: Uuid) -> Result<PaymentRecord, ServiceError> {
        self.db_client
            .get_payment_by_id(payment_id)
            .await?
            .ok_or(ServiceError::PaymentNotFound(payment_id))
    }

    /// Payment-approver decision on a pending record. Repeating the same
    /// decision is a no-op returning the current row; a different decision
    /// on a resolved row is a guard violation.
    pub async fn decide_payment(
        &self,
        payment_id: Uuid,
        approver_id: Uuid,
        approve: bool,
        notes: Option<String>,
    ) -> Result<PaymentRecord, ServiceError> {
        let target = if approve {
            PaymentStatus::Approved
        } else {
            PaymentStatus::Rejected
        };

        let payment = self.get_payment(payment_id).await?;
        if payment.status == Some(target) {
            return Ok(payment);
        }
        let status = payment.status.unwrap_or(PaymentStatus::Pending);
        if status != PaymentStatus::Pending {
            return Err(ServiceError::InvalidPaymentStatus(
                payment_id, status, "decide",
            ));
        }

        let updated = self
            .db_client
            .decide_payment(payment_id, approver_id, target, notes)
            .await?;

        let payment = match updated {
            Some(payment) => payment,
            None => {
                // Lost the conditional write; another approver resolved the
                // row first.
                let current = self.get_payment(payment_id).await?;
                if current.status == Some(target) {
                    return Ok(current);
                }
                return Err(ServiceError::Conflict(format!(
                    "payment {} was concurrently resolved as {:?}",
                    payment_id, current.status
                )));
            }
        };

        self.audit_service
            .log_payment_decision(approver_id, &payment)
            .await?;

        if let Err(err) = self.dispatch_payment_notification(&payment, false).await {
            tracing::warn!("payment notification dispatch failed: {}", err);
        }

        Ok(payment)
    }

    /// Disbursement. Finalises the payout amount (gross minus platform
    /// fee) and freezes the row.
    pub async fn release_payment(
        &self,
        payment_id: Uuid,
        approver_id: Uuid,
    ) -> Result<PaymentRecord, ServiceError> {
        let payment = self.get_payment(payment_id).await?;
        if payment.status == Some(PaymentStatus::Released) {
            return Ok(payment);
        }
        let status = payment.status.unwrap_or(PaymentStatus::Pending);
        if status != PaymentStatus::Approved {
            return Err(ServiceError::InvalidPaymentStatus(
                payment_id, status, "release",
            ));
        }

        let payout = &payment.gross_amount - &payment.platform_fee;

        let updated = self
            .db_client
            .release_payment(payment_id, payout)
            .await?;

        let payment = match updated {
            Some(payment) => payment,
            None => {
                let current = self.get_payment(payment_id).await?;
                if current.status == Some(PaymentStatus::Released) {
                    return Ok(current);
                }
                return Err(ServiceError::Conflict(format!(
                    "payment {} changed concurrently, now {:?}",
                    payment_id, current.status
                )));
            }
        };

        self.audit_service
            .log_payment_released(approver_id, &payment)
            .await?;

        if let Err(err) = self.dispatch_payment_notification(&payment, true).await {
            tracing::warn!("payment notification dispatch failed: {}", err);
        }

        Ok(payment)
    }

    async fn dispatch_payment_notification(
        &self,
        payment: &PaymentRecord,
        released: bool,
    ) -> Result<(), ServiceError> {
        let engagement = self
            .db_client
            .get_engagement_by_id(payment.engagement_id)
            .await?
            .ok_or(ServiceError::EngagementNotFound(payment.engagement_id))?;

        let profile = self
            .db_client
            .get_provider_profile_by_id(engagement.provider_id)
            .await?
            .ok_or(ServiceError::ProviderProfileNotFound(engagement.provider_id))?;

        if released {
            self.notification_service
                .notify_payment_released(profile.user_id, payment)
                .await
        } else {
            self.notification_service
                .notify_payment_decided(profile.user_id, payment)
                .await
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fee_is_percentage_of_gross() {
        assert_eq!(compute_platform_fee(100.0, 3.0), 3.0);
        assert_eq!(compute_platform_fee(250.0, 3.0), 7.5);
        assert_eq!(compute_platform_fee(0.0, 3.0), 0.0);
    }

    #[test]
    fn fee_rounds_to_cents() {
        assert_eq!(compute_platform_fee(99.99, 3.0), 3.0);
        assert_eq!(compute_platform_fee(33.33, 3.0), 1.0);
    }

    #[test]
    fn payout_is_gross_minus_fee() {
        let gross = BigDecimal::try_from(100.0).unwrap();
        let fee = BigDecimal::try_from(3.0).unwrap();
        let payout = &gross - &fee;
        assert_eq!(payout, BigDecimal::try_from(97.0).unwrap());
    }
}
