// service/notification_service.rs
//
// Fire-and-forget dispatcher. Each call stores a notification row for the
// external delivery pipeline and logs it; callers must not let a dispatch
// failure roll back the state transition that triggered it.
use std::sync::Arc;

use uuid::Uuid;

use crate::{
    db::db::DBClient,
    models::taskmodel::*,
    service::error::ServiceError,
};

#[derive(Debug, Clone)]
pub struct NotificationService {
    db_client: Arc<DBClient>,
}

impl NotificationService {
    pub fn new(db_client: Arc<DBClient>) -> Self {
        Self { db_client }
    }

    pub async fn notify_task_candidates(
        &self,
        task: &Task,
        candidate_user_ids: &[Uuid],
    ) -> Result<(), ServiceError> {
        tracing::info!(
            "new task notification: {} candidates for task {} ({})",
            candidate_user_ids.len(),
            task.id,
            task.category.to_str()
        );

        for user_id in candidate_user_ids {
            self.store_notification(
                Some(*user_id),
                "new_task",
                Some(task.id),
                Some(serde_json::json!({
                    "category": task.category.to_str(),
                    "budget": task.budget,
                })),
                format!("A new {} task is available near you", task.category.to_str()),
            )
            .await?;
        }
        Ok(())
    }

    pub async fn notify_interest_received(
        &self,
        client_id: Uuid,
        engagement: &Engagement,
    ) -> Result<(), ServiceError> {
        self.store_notification(
            Some(client_id),
            "interest_received",
            Some(engagement.id),
            Some(serde_json::json!({ "task_id": engagement.task_id })),
            "A provider has expressed interest in your task".to_string(),
        )
        .await
    }

    /// Broadcast row for the call-center queue (user_id NULL).
    pub async fn notify_call_center_queue(
        &self,
        engagement: &Engagement,
    ) -> Result<(), ServiceError> {
        self.store_notification(
            None,
            "engagement_awaiting_review",
            Some(engagement.id),
            Some(serde_json::json!({ "task_id": engagement.task_id })),
            "An engagement is awaiting call-center review".to_string(),
        )
        .await
    }

    pub async fn notify_engagement_approved(
        &self,
        client_id: Uuid,
        provider_user_id: Uuid,
        engagement: &Engagement,
    ) -> Result<(), ServiceError> {
        for user_id in [client_id, provider_user_id] {
            self.store_notification(
                Some(user_id),
                "engagement_approved",
                Some(engagement.id),
                Some(serde_json::json!({ "task_id": engagement.task_id })),
                "Your engagement was approved; contact details are now shared".to_string(),
            )
            .await?;
        }
        Ok(())
    }

    pub async fn notify_engagement_rejected(
        &self,
        provider_user_id: Uuid,
        engagement: &Engagement,
    ) -> Result<(), ServiceError> {
        self.store_notification(
            Some(provider_user_id),
            "engagement_rejected",
            Some(engagement.id),
            Some(serde_json::json!({
                "task_id": engagement.task_id,
                "reason": engagement.rejection_reason,
            })),
            "Your interest was not approved".to_string(),
        )
        .await
    }

    pub async fn notify_work_started(
        &self,
        client_id: Uuid,
        engagement: &Engagement,
    ) -> Result<(), ServiceError> {
        self.store_notification(
            Some(client_id),
            "work_started",
            Some(engagement.id),
            Some(serde_json::json!({ "task_id": engagement.task_id })),
            "The provider has started work on your task".to_string(),
        )
        .await
    }

    pub async fn notify_work_completed(
        &self,
        client_id: Uuid,
        provider_user_id: Uuid,
        engagement: &Engagement,
        payment: &PaymentRecord,
    ) -> Result<(), ServiceError> {
        for user_id in [client_id, provider_user_id] {
            self.store_notification(
                Some(user_id),
                "work_completed",
                Some(engagement.id),
                Some(serde_json::json!({
                    "task_id": engagement.task_id,
                    "payment_id": payment.id,
                })),
                "Work is marked complete; payment is awaiting approval".to_string(),
            )
            .await?;
        }
        Ok(())
    }

    pub async fn notify_engagement_cancelled(
        &self,
        provider_user_id: Uuid,
        engagement: &Engagement,
    ) -> Result<(), ServiceError> {
        self.store_notification(
            Some(provider_user_id),
            "engagement_cancelled",
            Some(engagement.id),
            Some(serde_json::json!({ "task_id": engagement.task_id })),
            "The client cancelled this engagement".to_string(),
        )
        .await
    }

    pub async fn notify_payment_decided(
        &self,
        provider_user_id: Uuid,
        payment: &PaymentRecord,
    ) -> Result<(), ServiceError> {
        let decided = payment
            .status
            .map(|s| s.to_str().to_owned())
            .unwrap_or_else(|| "pending".to_string());

        self.store_notification(
            Some(provider_user_id),
            "payment_decided",
            Some(payment.id),
            Some(serde_json::json!({
                "engagement_id": payment.engagement_id,
                "status": decided,
            })),
            format!("Payment for your engagement is {}", decided),
        )
        .await
    }

    pub async fn notify_payment_released(
        &self,
        provider_user_id: Uuid,
        payment: &PaymentRecord,
    ) -> Result<(), ServiceError> {
        self.store_notification(
            Some(provider_user_id),
            "payment_released",
            Some(payment.id),
            Some(serde_json::json!({
                "engagement_id": payment.engagement_id,
                "payout_amount": payment.payout_amount,
            })),
            "Your payout has been released".to_string(),
        )
        .await
    }

    async fn store_notification(
        &self,
        user_id: Option<Uuid>,
        event_type: &str,
        entity_id: Option<Uuid>,
        payload: Option<serde_json::Value>,
        message: String,
    ) -> Result<(), ServiceError> {
        sqlx::query(
            r#"
            INSERT INTO notifications (user_id, event_type, entity_id, payload, message)
            VALUES ($1, $2, $3, $4, $5)
            "#,
        )
        .bind(user_id)
        .bind(event_type)
        .bind(entity_id)
        .bind(payload)
        .bind(&message)
        .execute(&self.db_client.pool)
        .await
        .map_err(|e| ServiceError::Notification(e.to_string()))?;

        tracing::info!("notification stored: {} -> {:?}", event_type, user_id);
        Ok(())
    }
}
