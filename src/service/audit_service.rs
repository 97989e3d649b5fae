// service/audit_service.rs
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use crate::{
    db::db::DBClient,
    models::{providermodel::VerificationStatus, taskmodel::*, verificationmodels::Document},
    service::error::ServiceError,
};

#[derive(Debug, Clone)]
pub struct AuditService {
    db_client: Arc<DBClient>,
}

impl AuditService {
    pub fn new(db_client: Arc<DBClient>) -> Self {
        Self { db_client }
    }

    pub async fn log_task_created(&self, client_id: Uuid, task: &Task) -> Result<(), ServiceError> {
        self.log_audit_event(
            client_id,
            "task_created",
            Some(task.id),
            None,
            Some(serde_json::json!({
                "category": task.category.to_str(),
                "budget": task.budget,
            })),
            "Task created".to_string(),
        )
        .await
    }

    pub async fn log_interest_submitted(
        &self,
        provider_user_id: Uuid,
        engagement: &Engagement,
    ) -> Result<(), ServiceError> {
        self.log_audit_event(
            provider_user_id,
            "interest_submitted",
            Some(engagement.task_id),
            Some(engagement.id),
            None,
            "Provider expressed interest".to_string(),
        )
        .await
    }

    pub async fn log_engagement_approved(
        &self,
        approver_id: Uuid,
        engagement: &Engagement,
    ) -> Result<(), ServiceError> {
        self.log_audit_event(
            approver_id,
            "engagement_approved",
            Some(engagement.task_id),
            Some(engagement.id),
            Some(serde_json::json!({ "provider_id": engagement.provider_id })),
            "Call center approved engagement; contact details disclosed".to_string(),
        )
        .await
    }

    pub async fn log_engagement_rejected(
        &self,
        approver_id: Uuid,
        engagement: &Engagement,
    ) -> Result<(), ServiceError> {
        self.log_audit_event(
            approver_id,
            "engagement_rejected",
            Some(engagement.task_id),
            Some(engagement.id),
            Some(serde_json::json!({ "reason": engagement.rejection_reason })),
            "Call center rejected engagement".to_string(),
        )
        .await
    }

    pub async fn log_work_started(
        &self,
        provider_user_id: Uuid,
        engagement: &Engagement,
    ) -> Result<(), ServiceError> {
        self.log_audit_event(
            provider_user_id,
            "work_started",
            Some(engagement.task_id),
            Some(engagement.id),
            None,
            "Provider started work".to_string(),
        )
        .await
    }

    pub async fn log_engagement_completed(
        &self,
        actor_id: Uuid,
        engagement: &Engagement,
        payment: &PaymentRecord,
    ) -> Result<(), ServiceError> {
        self.log_audit_event(
            actor_id,
            "engagement_completed",
            Some(engagement.task_id),
            Some(engagement.id),
            Some(serde_json::json!({
                "payment_id": payment.id,
                "gross_amount": payment.gross_amount,
            })),
            "Engagement completed; payment record created".to_string(),
        )
        .await
    }

    pub async fn log_engagement_cancelled(
        &self,
        client_id: Uuid,
        engagement: &Engagement,
    ) -> Result<(), ServiceError> {
        self.log_audit_event(
            client_id,
            "engagement_cancelled",
            Some(engagement.task_id),
            Some(engagement.id),
            None,
            "Client cancelled engagement".to_string(),
        )
        .await
    }

    pub async fn log_payment_decision(
        &self,
        approver_id: Uuid,
        payment: &PaymentRecord,
    ) -> Result<(), ServiceError> {
        self.log_audit_event(
            approver_id,
            "payment_decision",
            None,
            Some(payment.engagement_id),
            Some(serde_json::json!({
                "payment_id": payment.id,
                "status": payment.status.map(|s| s.to_str().to_owned()),
                "notes": payment.decision_notes,
            })),
            "Payment approver decided on payment".to_string(),
        )
        .await
    }

    pub async fn log_payment_released(
        &self,
        approver_id: Uuid,
        payment: &PaymentRecord,
    ) -> Result<(), ServiceError> {
        self.log_audit_event(
            approver_id,
            "payment_released",
            None,
            Some(payment.engagement_id),
            Some(serde_json::json!({
                "payment_id": payment.id,
                "payout_amount": payment.payout_amount,
            })),
            "Payout released".to_string(),
        )
        .await
    }

    pub async fn log_document_review(
        &self,
        verifier_id: Uuid,
        document: &Document,
        derived_status: Option<VerificationStatus>,
    ) -> Result<(), ServiceError> {
        self.log_audit_event(
            verifier_id,
            "document_review",
            None,
            Some(document.id),
            Some(serde_json::json!({
                "provider_id": document.provider_id,
                "doc_type": document.doc_type.to_str(),
                "status": document.status.map(|s| s.to_str().to_owned()),
                "derived_verification": derived_status.map(|s| s.to_str().to_owned()),
            })),
            "Document reviewed".to_string(),
        )
        .await
    }

    async fn log_audit_event(
        &self,
        actor_id: Uuid,
        event_type: &str,
        task_id: Option<Uuid>,
        entity_id: Option<Uuid>,
        metadata: Option<serde_json::Value>,
        description: String,
    ) -> Result<(), ServiceError> {
        sqlx::query(
            r#"
            INSERT INTO audit_logs (actor_id, event_type, task_id, entity_id, metadata, description)
            VALUES ($1, $2, $3, $4, $5, $6)
            "#,
        )
        .bind(actor_id)
        .bind(event_type)
        .bind(task_id)
        .bind(entity_id)
        .bind(metadata)
        .bind(description)
        .execute(&self.db_client.pool)
        .await?;

        Ok(())
    }

    pub async fn get_audit_logs_for_task(
        &self,
        task_id: Uuid,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<AuditLog>, ServiceError> {
        let logs = sqlx::query_as::<_, AuditLog>(
            r#"
            SELECT id, actor_id, event_type, task_id, entity_id, metadata, description, created_at
            FROM audit_logs
            WHERE task_id = $1
            ORDER BY created_at DESC
            LIMIT $2 OFFSET $3
            "#,
        )
        .bind(task_id)
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.db_client.pool)
        .await?;

        Ok(logs)
    }
}

#[derive(Debug, Serialize, sqlx::FromRow)]
pub struct AuditLog {
    pub id: Uuid,
    pub actor_id: Uuid,
    pub event_type: String,
    pub task_id: Option<Uuid>,
    pub entity_id: Option<Uuid>,
    pub metadata: Option<serde_json::Value>,
    pub description: String,
    pub created_at: Option<DateTime<Utc>>,
}
