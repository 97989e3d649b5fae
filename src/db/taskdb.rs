use async_trait::async_trait;
use sqlx::{types::BigDecimal, Error};
use uuid::Uuid;

use super::db::DBClient;
use crate::models::taskmodel::*;

const ENGAGEMENT_COLS: &str = r#"
    id, task_id, provider_id, client_id, status, message,
    approved_by, approved_at, rejection_reason, completed_at,
    created_at, updated_at
"#;

const PAYMENT_COLS: &str = r#"
    id, engagement_id, gross_amount, platform_fee, payout_amount, status,
    decided_by, decided_at, decision_notes, released_at, created_at
"#;

const TASK_COLS: &str = r#"
    id, client_id, category, description, budget, latitude, longitude,
    status, deleted_at, created_at, updated_at
"#;

#[async_trait]
pub trait TaskExt {
    async fn create_task(
        &self,
        client_id: Uuid,
        category: ServiceCategory,
        description: String,
        budget: Option<f64>,
        latitude: Option<f64>,
        longitude: Option<f64>,
    ) -> Result<Task, Error>;

    async fn get_task_by_id(&self, task_id: Uuid) -> Result<Option<Task>, Error>;

    /// Conditional status write. Returns None when the task was not in
    /// `from` at write time, which the caller maps to a guard or conflict.
    async fn update_task_status_if(
        &self,
        task_id: Uuid,
        from: TaskStatus,
        to: TaskStatus,
    ) -> Result<Option<Task>, Error>;

    async fn soft_delete_task(&self, task_id: Uuid) -> Result<Option<Task>, Error>;

    async fn create_engagement(
        &self,
        task_id: Uuid,
        provider_id: Uuid,
        client_id: Uuid,
        message: String,
    ) -> Result<Engagement, Error>;

    async fn get_engagement_by_id(&self, engagement_id: Uuid) -> Result<Option<Engagement>, Error>;

    async fn get_engagements_by_task(&self, task_id: Uuid) -> Result<Vec<Engagement>, Error>;

    async fn get_active_engagement_for_pair(
        &self,
        task_id: Uuid,
        provider_id: Uuid,
    ) -> Result<Option<Engagement>, Error>;

    /// The invariant-bearing write: flips pending -> approved only while no
    /// sibling engagement on the same task is approved or later. A loser of
    /// a concurrent race sees None.
    async fn approve_engagement(
        &self,
        engagement_id: Uuid,
        approver_id: Uuid,
    ) -> Result<Option<Engagement>, Error>;

    async fn reject_engagement(
        &self,
        engagement_id: Uuid,
        approver_id: Uuid,
        reason: String,
    ) -> Result<Option<Engagement>, Error>;

    async fn update_engagement_status_if(
        &self,
        engagement_id: Uuid,
        from: EngagementStatus,
        to: EngagementStatus,
    ) -> Result<Option<Engagement>, Error>;

    async fn complete_engagement(&self, engagement_id: Uuid) -> Result<Option<Engagement>, Error>;

    async fn cancel_engagement(&self, engagement_id: Uuid) -> Result<Option<Engagement>, Error>;

    /// Inserts the payment row for a completed engagement, tolerating
    /// retries: the unique engagement_id column makes a second insert a
    /// no-op and the existing row is returned instead.
    async fn ensure_payment_record(
        &self,
        engagement_id: Uuid,
        gross_amount: BigDecimal,
        platform_fee: BigDecimal,
    ) -> Result<PaymentRecord, Error>;

    async fn get_payment_by_id(&self, payment_id: Uuid) -> Result<Option<PaymentRecord>, Error>;

    async fn get_payment_by_engagement(
        &self,
        engagement_id: Uuid,
    ) -> Result<Option<PaymentRecord>, Error>;

    async fn decide_payment(
        &self,
        payment_id: Uuid,
        approver_id: Uuid,
        to: PaymentStatus,
        notes: Option<String>,
    ) -> Result<Option<PaymentRecord>, Error>;

    async fn release_payment(
        &self,
        payment_id: Uuid,
        payout_amount: BigDecimal,
    ) -> Result<Option<PaymentRecord>, Error>;
}

#[async_trait]
impl TaskExt for DBClient {
    async fn create_task(
        &self,
        client_id: Uuid,
        category: ServiceCategory,
        description: String,
        budget: Option<f64>,
        latitude: Option<f64>,
        longitude: Option<f64>,
    ) -> Result<Task, Error> {
        let budget_bd = budget.and_then(|b| BigDecimal::try_from(b).ok());

        sqlx::query_as::<_, Task>(&format!(
            r#"
            INSERT INTO tasks (client_id, category, description, budget, latitude, longitude)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING {TASK_COLS}
            "#
        ))
        .bind(client_id)
        .bind(category)
        .bind(description)
        .bind(budget_bd)
        .bind(latitude)
        .bind(longitude)
        .fetch_one(&self.pool)
        .await
    }

    async fn get_task_by_id(&self, task_id: Uuid) -> Result<Option<Task>, Error> {
        sqlx::query_as::<_, Task>(&format!(
            r#"
            SELECT {TASK_COLS}
            FROM tasks
            WHERE id = $1 AND deleted_at IS NULL
            "#
        ))
        .bind(task_id)
        .fetch_optional(&self.pool)
        .await
    }

    async fn update_task_status_if(
        &self,
        task_id: Uuid,
        from: TaskStatus,
        to: TaskStatus,
    ) -> Result<Option<Task>, Error> {
        sqlx::query_as::<_, Task>(&format!(
            r#"
            UPDATE tasks
            SET status = $3, updated_at = NOW()
            WHERE id = $1 AND status = $2 AND deleted_at IS NULL
            RETURNING {TASK_COLS}
            "#
        ))
        .bind(task_id)
        .bind(from)
        .bind(to)
        .fetch_optional(&self.pool)
        .await
    }

    async fn soft_delete_task(&self, task_id: Uuid) -> Result<Option<Task>, Error> {
        sqlx::query_as::<_, Task>(&format!(
            r#"
            UPDATE tasks
            SET deleted_at = NOW(), updated_at = NOW()
            WHERE id = $1 AND deleted_at IS NULL
            RETURNING {TASK_COLS}
            "#
        ))
        .bind(task_id)
        .fetch_optional(&self.pool)
        .await
    }

    async fn create_engagement(
        &self,
        task_id: Uuid,
        provider_id: Uuid,
        client_id: Uuid,
        message: String,
    ) -> Result<Engagement, Error> {
        sqlx::query_as::<_, Engagement>(&format!(
            r#"
            INSERT INTO engagements (task_id, provider_id, client_id, message)
            VALUES ($1, $2, $3, $4)
            RETURNING {ENGAGEMENT_COLS}
            "#
        ))
        .bind(task_id)
        .bind(provider_id)
        .bind(client_id)
        .bind(message)
        .fetch_one(&self.pool)
        .await
    }

    async fn get_engagement_by_id(&self, engagement_id: Uuid) -> Result<Option<Engagement>, Error> {
        sqlx::query_as::<_, Engagement>(&format!(
            r#"
            SELECT {ENGAGEMENT_COLS}
            FROM engagements
            WHERE id = $1
            "#
        ))
        .bind(engagement_id)
        .fetch_optional(&self.pool)
        .await
    }

    async fn get_engagements_by_task(&self, task_id: Uuid) -> Result<Vec<Engagement>, Error> {
        sqlx::query_as::<_, Engagement>(&format!(
            r#"
            SELECT {ENGAGEMENT_COLS}
            FROM engagements
            WHERE task_id = $1
            ORDER BY created_at ASC
            "#
        ))
        .bind(task_id)
        .fetch_all(&self.pool)
        .await
    }

    async fn get_active_engagement_for_pair(
        &self,
        task_id: Uuid,
        provider_id: Uuid,
    ) -> Result<Option<Engagement>, Error> {
        sqlx::query_as::<_, Engagement>(&format!(
            r#"
            SELECT {ENGAGEMENT_COLS}
            FROM engagements
            WHERE task_id = $1 AND provider_id = $2
              AND status NOT IN ('rejected', 'completed', 'cancelled')
            "#
        ))
        .bind(task_id)
        .bind(provider_id)
        .fetch_optional(&self.pool)
        .await
    }

    async fn approve_engagement(
        &self,
        engagement_id: Uuid,
        approver_id: Uuid,
    ) -> Result<Option<Engagement>, Error> {
        sqlx::query_as::<_, Engagement>(&format!(
            r#"
            UPDATE engagements e
            SET status = 'approved', approved_by = $2, approved_at = NOW(), updated_at = NOW()
            WHERE e.id = $1
              AND e.status = 'pending'
              AND NOT EXISTS (
                  SELECT 1 FROM engagements o
                  WHERE o.task_id = e.task_id
                    AND o.id <> e.id
                    AND o.status IN ('approved', 'in_progress', 'completed')
              )
            RETURNING {ENGAGEMENT_COLS}
            "#
        ))
        .bind(engagement_id)
        .bind(approver_id)
        .fetch_optional(&self.pool)
        .await
    }

    async fn reject_engagement(
        &self,
        engagement_id: Uuid,
        approver_id: Uuid,
        reason: String,
    ) -> Result<Option<Engagement>, Error> {
        sqlx::query_as::<_, Engagement>(&format!(
            r#"
            UPDATE engagements
            SET status = 'rejected', approved_by = $2, rejection_reason = $3, updated_at = NOW()
            WHERE id = $1 AND status = 'pending'
            RETURNING {ENGAGEMENT_COLS}
            "#
        ))
        .bind(engagement_id)
        .bind(approver_id)
        .bind(reason)
        .fetch_optional(&self.pool)
        .await
    }

    async fn update_engagement_status_if(
        &self,
        engagement_id: Uuid,
        from: EngagementStatus,
        to: EngagementStatus,
    ) -> Result<Option<Engagement>, Error> {
        sqlx::query_as::<_, Engagement>(&format!(
            r#"
            UPDATE engagements
            SET status = $3, updated_at = NOW()
            WHERE id = $1 AND status = $2
            RETURNING {ENGAGEMENT_COLS}
            "#
        ))
        .bind(engagement_id)
        .bind(from)
        .bind(to)
        .fetch_optional(&self.pool)
        .await
    }

    async fn complete_engagement(&self, engagement_id: Uuid) -> Result<Option<Engagement>, Error> {
        sqlx::query_as::<_, Engagement>(&format!(
            r#"
            UPDATE engagements
            SET status = 'completed', completed_at = NOW(), updated_at = NOW()
            WHERE id = $1 AND status = 'in_progress'
            RETURNING {ENGAGEMENT_COLS}
            "#
        ))
        .bind(engagement_id)
        .fetch_optional(&self.pool)
        .await
    }

    async fn cancel_engagement(&self, engagement_id: Uuid) -> Result<Option<Engagement>, Error> {
        sqlx::query_as::<_, Engagement>(&format!(
            r#"
            UPDATE engagements
            SET status = 'cancelled', updated_at = NOW()
            WHERE id = $1 AND status IN ('pending', 'approved', 'in_progress')
            RETURNING {ENGAGEMENT_COLS}
            "#
        ))
        .bind(engagement_id)
        .fetch_optional(&self.pool)
        .await
    }

    async fn ensure_payment_record(
        &self,
        engagement_id: Uuid,
        gross_amount: BigDecimal,
        platform_fee: BigDecimal,
    ) -> Result<PaymentRecord, Error> {
        let inserted = sqlx::query_as::<_, PaymentRecord>(&format!(
            r#"
            INSERT INTO payment_records (engagement_id, gross_amount, platform_fee)
            VALUES ($1, $2, $3)
            ON CONFLICT (engagement_id) DO NOTHING
            RETURNING {PAYMENT_COLS}
            "#
        ))
        .bind(engagement_id)
        .bind(gross_amount)
        .bind(platform_fee)
        .fetch_optional(&self.pool)
        .await?;

        match inserted {
            Some(payment) => Ok(payment),
            None => self
                .get_payment_by_engagement(engagement_id)
                .await?
                .ok_or(Error::RowNotFound),
        }
    }

    async fn get_payment_by_id(&self, payment_id: Uuid) -> Result<Option<PaymentRecord>, Error> {
        sqlx::query_as::<_, PaymentRecord>(&format!(
            r#"
            SELECT {PAYMENT_COLS}
            FROM payment_records
            WHERE id = $1
            "#
        ))
        .bind(payment_id)
        .fetch_optional(&self.pool)
        .await
    }

    async fn get_payment_by_engagement(
        &self,
        engagement_id: Uuid,
    ) -> Result<Option<PaymentRecord>, Error> {
        sqlx::query_as::<_, PaymentRecord>(&format!(
            r#"
            SELECT {PAYMENT_COLS}
            FROM payment_records
            WHERE engagement_id = $1
            "#
        ))
        .bind(engagement_id)
        .fetch_optional(&self.pool)
        .await
    }

    async fn decide_payment(
        &self,
        payment_id: Uuid,
        approver_id: Uuid,
        to: PaymentStatus,
        notes: Option<String>,
    ) -> Result<Option<PaymentRecord>, Error> {
        sqlx::query_as::<_, PaymentRecord>(&format!(
            r#"
            UPDATE payment_records
            SET status = $3, decided_by = $2, decided_at = NOW(), decision_notes = $4
            WHERE id = $1 AND status = 'pending'
            RETURNING {PAYMENT_COLS}
            "#
        ))
        .bind(payment_id)
        .bind(approver_id)
        .bind(to)
        .bind(notes)
        .fetch_optional(&self.pool)
        .await
    }

    async fn release_payment(
        &self,
        payment_id: Uuid,
        payout_amount: BigDecimal,
    ) -> Result<Option<PaymentRecord>, Error> {
        sqlx::query_as::<_, PaymentRecord>(&format!(
            r#"
            UPDATE payment_records
            SET status = 'released', payout_amount = $2, released_at = NOW()
            WHERE id = $1 AND status = 'approved'
            RETURNING {PAYMENT_COLS}
            "#
        ))
        .bind(payment_id)
        .bind(payout_amount)
        .fetch_optional(&self.pool)
        .await
    }
}
