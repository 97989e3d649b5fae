// service/engagement_service.rs
//
// The engagement lifecycle state machine. Every transition is a single
// conditional write keyed on the current status; losing the write means
// either an idempotent retry (same target state, return it) or a guard or
// concurrency failure (report it, never silently double-apply).
use std::sync::Arc;

use serde::Serialize;
use uuid::Uuid;

use crate::{
    db::{db::DBClient, providerdb::ProviderExt, taskdb::TaskExt},
    models::{providermodel::ProviderProfile, taskmodel::*},
    service::{
        audit_service::AuditService,
        error::ServiceError,
        escrow_service::EscrowService,
        notification_service::NotificationService,
    },
};

#[derive(Debug, Clone)]
pub struct EngagementService {
    db_client: Arc<DBClient>,
    escrow_service: Arc<EscrowService>,
    notification_service: Arc<NotificationService>,
    audit_service: Arc<AuditService>,
}

impl EngagementService {
    pub fn new(
        db_client: Arc<DBClient>,
        escrow_service: Arc<EscrowService>,
        notification_service: Arc<NotificationService>,
        audit_service: Arc<AuditService>,
    ) -> Self {
        Self {
            db_client,
            escrow_service,
            notification_service,
            audit_service,
        }
    }

    pub async fn get_engagement(&self, engagement_id: Uuid) -> Result<Engagement, ServiceError> {
        self.db_client
            .get_engagement_by_id(engagement_id)
            .await?
            .ok_or(ServiceError::EngagementNotFound(engagement_id))
    }

    /// Provider expresses interest in an open task. Creates the engagement
    /// in `pending`, queued for call-center review. Retrying returns the
    /// already-existing active engagement for the pair.
    pub async fn submit_interest(
        &self,
        task_id: Uuid,
        provider_user_id: Uuid,
        message: String,
    ) -> Result<Engagement, ServiceError> {
        let task = self
            .db_client
            .get_task_by_id(task_id)
            .await?
            .ok_or(ServiceError::TaskNotFound(task_id))?;

        let task_status = task.status.unwrap_or(TaskStatus::Open);
        if task_status != TaskStatus::Open {
            return Err(ServiceError::InvalidTaskStatus(
                task_id,
                task_status,
                "submit interest",
            ));
        }

        let profile = self
            .db_client
            .get_provider_profile(provider_user_id)
            .await?
            .ok_or(ServiceError::ProviderProfileNotFound(provider_user_id))?;

        if !profile.is_verified() {
            return Err(ServiceError::Guard(
                "provider must be fully verified before seeing or taking tasks".to_string(),
            ));
        }

        if task.client_id == provider_user_id {
            return Err(ServiceError::Validation(
                "cannot express interest in your own task".to_string(),
            ));
        }

        if let Some(existing) = self
            .db_client
            .get_active_engagement_for_pair(task_id, profile.id)
            .await?
        {
            return Ok(existing);
        }

        let engagement = self
            .db_client
            .create_engagement(task_id, profile.id, task.client_id, message)
            .await
            .map_err(|e| {
                if unique_violation(&e) {
                    ServiceError::Conflict(format!(
                        "provider {} already has an active engagement on task {}",
                        profile.id, task_id
                    ))
                } else {
                    ServiceError::Database(e)
                }
            })?;

        tracing::info!(
            "engagement {} created as {} for task {}",
            engagement.id,
            EngagementStatus::Pending.to_str(),
            task_id
        );

        self.audit_service
            .log_interest_submitted(provider_user_id, &engagement)
            .await?;

        if let Err(err) = self
            .notification_service
            .notify_interest_received(task.client_id, &engagement)
            .await
        {
            tracing::warn!("notification dispatch failed: {}", err);
        }
        if let Err(err) = self
            .notification_service
            .notify_call_center_queue(&engagement)
            .await
        {
            tracing::warn!("notification dispatch failed: {}", err);
        }

        Ok(engagement)
    }

    /// Call-center releases contact details. The conditional write both
    /// checks the pending status and excludes a second concurrently
    /// approved engagement on the task, so a racing approval of a sibling
    /// engagement loses with a conflict.
    pub async fn call_center_approve(
        &self,
        engagement_id: Uuid,
        approver_id: Uuid,
    ) -> Result<Engagement, ServiceError> {
        let engagement = self.get_engagement(engagement_id).await?;
        let status = engagement.status.unwrap_or(EngagementStatus::Pending);

        if status == EngagementStatus::Approved {
            return Ok(engagement);
        }
        if status != EngagementStatus::Pending {
            return Err(ServiceError::InvalidEngagementStatus(
                engagement_id,
                status,
                "approve",
            ));
        }

        // Approval is a point-in-time commitment: the provider must still
        // be verified when the human signs off.
        let profile = self.profile_for(&engagement).await?;
        if !profile.is_verified() {
            return Err(ServiceError::Guard(
                "provider verification lapsed; engagement cannot be approved".to_string(),
            ));
        }

        let approved = self
            .db_client
            .approve_engagement(engagement_id, approver_id)
            .await?;

        let engagement = match approved {
            Some(engagement) => engagement,
            None => {
                let current = self.get_engagement(engagement_id).await?;
                if current.status == Some(EngagementStatus::Approved) {
                    return Ok(current);
                }
                // Either a sibling engagement holds the task or this one
                // moved out of pending under us.
                return Err(ServiceError::Conflict(format!(
                    "task {} already has a committed engagement or engagement {} changed state",
                    current.task_id, engagement_id
                )));
            }
        };

        tracing::info!(
            "engagement {} -> {} by approver {}",
            engagement.id,
            EngagementStatus::Approved.to_str(),
            approver_id
        );

        // The task follows its committed engagement.
        self.db_client
            .update_task_status_if(engagement.task_id, TaskStatus::Open, TaskStatus::InProgress)
            .await?;

        self.audit_service
            .log_engagement_approved(approver_id, &engagement)
            .await?;

        if let Err(err) = self
            .notification_service
            .notify_engagement_approved(engagement.client_id, profile.user_id, &engagement)
            .await
        {
            tracing::warn!("notification dispatch failed: {}", err);
        }

        Ok(engagement)
    }

    pub async fn call_center_reject(
        &self,
        engagement_id: Uuid,
        approver_id: Uuid,
        reason: String,
    ) -> Result<Engagement, ServiceError> {
        let engagement = self.get_engagement(engagement_id).await?;
        let status = engagement.status.unwrap_or(EngagementStatus::Pending);

        if status == EngagementStatus::Rejected {
            return Ok(engagement);
        }
        if status != EngagementStatus::Pending {
            return Err(ServiceError::InvalidEngagementStatus(
                engagement_id,
                status,
                "reject",
            ));
        }

        let rejected = self
            .db_client
            .reject_engagement(engagement_id, approver_id, reason)
            .await?;

        let engagement = match rejected {
            Some(engagement) => engagement,
            None => {
                let current = self.get_engagement(engagement_id).await?;
                if current.status == Some(EngagementStatus::Rejected) {
                    return Ok(current);
                }
                return Err(ServiceError::Conflict(format!(
                    "engagement {} changed state concurrently",
                    engagement_id
                )));
            }
        };

        self.audit_service
            .log_engagement_rejected(approver_id, &engagement)
            .await?;

        let profile = self.profile_for(&engagement).await?;
        if let Err(err) = self
            .notification_service
            .notify_engagement_rejected(profile.user_id, &engagement)
            .await
        {
            tracing::warn!("notification dispatch failed: {}", err);
        }

        Ok(engagement)
    }

    /// Provider marks work begun on an approved engagement.
    pub async fn start_work(
        &self,
        engagement_id: Uuid,
        provider_user_id: Uuid,
    ) -> Result<Engagement, ServiceError> {
        let engagement = self.get_engagement(engagement_id).await?;

        let profile = self.profile_for(&engagement).await?;
        if profile.user_id != provider_user_id {
            return Err(ServiceError::Unauthorized(provider_user_id, engagement_id));
        }

        let status = engagement.status.unwrap_or(EngagementStatus::Pending);
        if status == EngagementStatus::InProgress {
            return Ok(engagement);
        }
        if status != EngagementStatus::Approved {
            return Err(ServiceError::InvalidEngagementStatus(
                engagement_id,
                status,
                "start work",
            ));
        }

        let engagement = self
            .transition_or_reconcile(
                engagement_id,
                EngagementStatus::Approved,
                EngagementStatus::InProgress,
            )
            .await?;

        self.audit_service
            .log_work_started(provider_user_id, &engagement)
            .await?;

        if let Err(err) = self
            .notification_service
            .notify_work_started(engagement.client_id, &engagement)
            .await
        {
            tracing::warn!("notification dispatch failed: {}", err);
        }

        Ok(engagement)
    }

    /// Either party marks the work done. Exactly one pending payment record
    /// is created, even under retry.
    pub async fn mark_completed(
        &self,
        engagement_id: Uuid,
        actor_id: Uuid,
    ) -> Result<EngagementCompletionResult, ServiceError> {
        let engagement = self.get_engagement(engagement_id).await?;
        let profile = self.profile_for(&engagement).await?;

        if actor_id != engagement.client_id && actor_id != profile.user_id {
            return Err(ServiceError::Unauthorized(actor_id, engagement_id));
        }

        let task = self
            .db_client
            .get_task_by_id(engagement.task_id)
            .await?
            .ok_or(ServiceError::TaskNotFound(engagement.task_id))?;

        let status = engagement.status.unwrap_or(EngagementStatus::Pending);
        if status == EngagementStatus::Completed {
            // Retry of a completed engagement: the payment row already
            // exists (or is recreated idempotently).
            let payment = self.escrow_service.create_for_completion(&engagement, &task).await?;
            return Ok(EngagementCompletionResult { engagement, payment });
        }
        if status != EngagementStatus::InProgress {
            return Err(ServiceError::InvalidEngagementStatus(
                engagement_id,
                status,
                "complete",
            ));
        }

        let completed = self.db_client.complete_engagement(engagement_id).await?;

        let engagement = match completed {
            Some(engagement) => engagement,
            None => {
                let current = self.get_engagement(engagement_id).await?;
                if current.status == Some(EngagementStatus::Completed) {
                    current
                } else {
                    return Err(ServiceError::Conflict(format!(
                        "engagement {} changed state concurrently",
                        engagement_id
                    )));
                }
            }
        };

        let payment = self
            .escrow_service
            .create_for_completion(&engagement, &task)
            .await?;

        self.db_client
            .update_task_status_if(
                engagement.task_id,
                TaskStatus::InProgress,
                TaskStatus::Completed,
            )
            .await?;

        self.db_client
            .increment_completed_jobs(engagement.provider_id)
            .await?;

        self.audit_service
            .log_engagement_completed(actor_id, &engagement, &payment)
            .await?;

        if let Err(err) = self
            .notification_service
            .notify_work_completed(engagement.client_id, profile.user_id, &engagement, &payment)
            .await
        {
            tracing::warn!("notification dispatch failed: {}", err);
        }

        Ok(EngagementCompletionResult { engagement, payment })
    }

    /// Client-only cancellation, legal from any non-terminal state, refused
    /// once a payout has been released.
    pub async fn cancel(
        &self,
        engagement_id: Uuid,
        client_id: Uuid,
    ) -> Result<Engagement, ServiceError> {
        let engagement = self.get_engagement(engagement_id).await?;

        if engagement.client_id != client_id {
            return Err(ServiceError::Unauthorized(client_id, engagement_id));
        }

        let status = engagement.status.unwrap_or(EngagementStatus::Pending);
        if status == EngagementStatus::Cancelled {
            return Ok(engagement);
        }
        if status.is_terminal() {
            return Err(ServiceError::InvalidEngagementStatus(
                engagement_id,
                status,
                "cancel",
            ));
        }

        if let Some(payment) = self
            .db_client
            .get_payment_by_engagement(engagement_id)
            .await?
        {
            if payment.status == Some(PaymentStatus::Released) {
                return Err(ServiceError::Guard(
                    "payment already released; engagement can no longer be cancelled".to_string(),
                ));
            }
        }

        let cancelled = self.db_client.cancel_engagement(engagement_id).await?;

        let engagement = match cancelled {
            Some(engagement) => engagement,
            None => {
                let current = self.get_engagement(engagement_id).await?;
                if current.status == Some(EngagementStatus::Cancelled) {
                    return Ok(current);
                }
                return Err(ServiceError::Conflict(format!(
                    "engagement {} changed state concurrently",
                    engagement_id
                )));
            }
        };

        // A task committed to this engagement goes back on the market.
        if matches!(
            status,
            EngagementStatus::Approved | EngagementStatus::InProgress
        ) {
            self.db_client
                .update_task_status_if(engagement.task_id, TaskStatus::InProgress, TaskStatus::Open)
                .await?;
        }

        self.audit_service
            .log_engagement_cancelled(client_id, &engagement)
            .await?;

        let profile = self.profile_for(&engagement).await?;
        if let Err(err) = self
            .notification_service
            .notify_engagement_cancelled(profile.user_id, &engagement)
            .await
        {
            tracing::warn!("notification dispatch failed: {}", err);
        }

        Ok(engagement)
    }

    pub async fn list_for_task(&self, task_id: Uuid) -> Result<Vec<Engagement>, ServiceError> {
        Ok(self.db_client.get_engagements_by_task(task_id).await?)
    }

    async fn transition_or_reconcile(
        &self,
        engagement_id: Uuid,
        from: EngagementStatus,
        to: EngagementStatus,
    ) -> Result<Engagement, ServiceError> {
        debug_assert!(EngagementStatus::can_transition(from, to));

        let updated = self
            .db_client
            .update_engagement_status_if(engagement_id, from, to)
            .await?;

        match updated {
            Some(engagement) => Ok(engagement),
            None => {
                let current = self.get_engagement(engagement_id).await?;
                if current.status == Some(to) {
                    Ok(current)
                } else {
                    Err(ServiceError::Conflict(format!(
                        "engagement {} changed state concurrently",
                        engagement_id
                    )))
                }
            }
        }
    }

    async fn profile_for(&self, engagement: &Engagement) -> Result<ProviderProfile, ServiceError> {
        self.db_client
            .get_provider_profile_by_id(engagement.provider_id)
            .await?
            .ok_or(ServiceError::ProviderProfileNotFound(engagement.provider_id))
    }
}

fn unique_violation(error: &sqlx::Error) -> bool {
    error
        .as_database_error()
        .and_then(|db| db.code())
        .map(|code| code == "23505")
        .unwrap_or(false)
}

#[derive(Debug, Serialize)]
pub struct EngagementCompletionResult {
    pub engagement: Engagement,
    pub payment: PaymentRecord,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn service_wiring_compiles() {
        let pool = sqlx::PgPool::connect_lazy("postgres://localhost/worknest").unwrap();
        let db_client = Arc::new(DBClient::new(pool));

        let notifications = Arc::new(NotificationService::new(db_client.clone()));
        let audit = Arc::new(AuditService::new(db_client.clone()));
        let escrow = Arc::new(EscrowService::new(
            db_client.clone(),
            notifications.clone(),
            audit.clone(),
            3.0,
        ));
        let svc = EngagementService::new(db_client, escrow, notifications, audit);

        let _ = svc.get_engagement(Uuid::nil());
    }
}
