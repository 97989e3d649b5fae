use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::types::BigDecimal;
use uuid::Uuid;

#[derive(Debug, Serialize, Deserialize, Clone, Copy, sqlx::Type, PartialEq)]
#[sqlx(type_name = "service_category", rename_all = "snake_case")]
pub enum ServiceCategory {
    Cleaning,
    Plumbing,
    Electrical,
    Painting,
    Carpentry,
    Gardening,
    Moving,
    ApplianceRepair,
    PestControl,
    Tutoring,
    Childcare,
    ElderCare,
    Other,
}

impl ServiceCategory {
    pub fn to_str(&self) -> &str {
        match self {
            ServiceCategory::Cleaning => "cleaning",
            ServiceCategory::Plumbing => "plumbing",
            ServiceCategory::Electrical => "electrical",
            ServiceCategory::Painting => "painting",
            ServiceCategory::Carpentry => "carpentry",
            ServiceCategory::Gardening => "gardening",
            ServiceCategory::Moving => "moving",
            ServiceCategory::ApplianceRepair => "appliance_repair",
            ServiceCategory::PestControl => "pest_control",
            ServiceCategory::Tutoring => "tutoring",
            ServiceCategory::Childcare => "childcare",
            ServiceCategory::ElderCare => "elder_care",
            ServiceCategory::Other => "other",
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, sqlx::Type, PartialEq)]
#[sqlx(type_name = "task_status", rename_all = "snake_case")]
pub enum TaskStatus {
    Open,
    InProgress,
    Completed,
    Cancelled,
}

impl TaskStatus {
    pub fn to_str(&self) -> &str {
        match self {
            TaskStatus::Open => "open",
            TaskStatus::InProgress => "in_progress",
            TaskStatus::Completed => "completed",
            TaskStatus::Cancelled => "cancelled",
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, sqlx::Type, PartialEq)]
#[sqlx(type_name = "engagement_status", rename_all = "snake_case")]
pub enum EngagementStatus {
    Pending,
    Approved,
    InProgress,
    Rejected,
    Completed,
    Cancelled,
}

impl EngagementStatus {
    pub fn to_str(&self) -> &str {
        match self {
            EngagementStatus::Pending => "pending",
            EngagementStatus::Approved => "approved",
            EngagementStatus::InProgress => "in_progress",
            EngagementStatus::Rejected => "rejected",
            EngagementStatus::Completed => "completed",
            EngagementStatus::Cancelled => "cancelled",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            EngagementStatus::Rejected | EngagementStatus::Completed | EngagementStatus::Cancelled
        )
    }

    /// Contact details are unlocked at approval and stay unlocked for the
    /// rest of the engagement's life.
    pub fn is_disclosed(&self) -> bool {
        matches!(
            self,
            EngagementStatus::Approved | EngagementStatus::InProgress | EngagementStatus::Completed
        )
    }

    /// The legal transition table. Everything not listed here is illegal,
    /// including any move out of a terminal state.
    pub fn can_transition(from: EngagementStatus, to: EngagementStatus) -> bool {
        use EngagementStatus::*;
        match (from, to) {
            (Pending, Approved) => true,
            (Pending, Rejected) => true,
            (Approved, InProgress) => true,
            (InProgress, Completed) => true,
            (Pending, Cancelled) => true,
            (Approved, Cancelled) => true,
            (InProgress, Cancelled) => true,
            _ => false,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, sqlx::Type, PartialEq)]
#[sqlx(type_name = "payment_status", rename_all = "snake_case")]
pub enum PaymentStatus {
    Pending,
    Approved,
    Rejected,
    Released,
}

impl PaymentStatus {
    pub fn to_str(&self) -> &str {
        match self {
            PaymentStatus::Pending => "pending",
            PaymentStatus::Approved => "approved",
            PaymentStatus::Rejected => "rejected",
            PaymentStatus::Released => "released",
        }
    }

    /// pending -> approved -> released, or pending -> rejected. No reversal.
    pub fn can_transition(from: PaymentStatus, to: PaymentStatus) -> bool {
        use PaymentStatus::*;
        match (from, to) {
            (Pending, Approved) => true,
            (Pending, Rejected) => true,
            (Approved, Released) => true,
            _ => false,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Task {
    pub id: Uuid,
    pub client_id: Uuid,
    pub category: ServiceCategory,
    pub description: String,
    pub budget: Option<BigDecimal>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub status: Option<TaskStatus>,        // Database has DEFAULT 'open', can be NULL
    pub deleted_at: Option<DateTime<Utc>>, // Soft delete, owner or admin only
    pub created_at: Option<DateTime<Utc>>, // Database has DEFAULT NOW(), can be NULL
    pub updated_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Engagement {
    pub id: Uuid,
    pub task_id: Uuid,
    pub provider_id: Uuid, // provider_profiles.id
    pub client_id: Uuid,
    pub status: Option<EngagementStatus>, // Database has DEFAULT 'pending', can be NULL
    pub message: String,
    pub approved_by: Option<Uuid>,
    pub approved_at: Option<DateTime<Utc>>,
    pub rejection_reason: Option<String>,
    pub completed_at: Option<DateTime<Utc>>,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct PaymentRecord {
    pub id: Uuid,
    pub engagement_id: Uuid,
    pub gross_amount: BigDecimal,
    pub platform_fee: BigDecimal,
    pub payout_amount: Option<BigDecimal>, // Finalised at release
    pub status: Option<PaymentStatus>,     // Database has DEFAULT 'pending', can be NULL
    pub decided_by: Option<Uuid>,
    pub decided_at: Option<DateTime<Utc>>,
    pub decision_notes: Option<String>,
    pub released_at: Option<DateTime<Utc>>,
    pub created_at: Option<DateTime<Utc>>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn engagement_happy_path_is_legal() {
        use EngagementStatus::*;
        assert!(EngagementStatus::can_transition(Pending, Approved));
        assert!(EngagementStatus::can_transition(Approved, InProgress));
        assert!(EngagementStatus::can_transition(InProgress, Completed));
    }

    #[test]
    fn engagement_terminal_states_admit_nothing() {
        use EngagementStatus::*;
        for terminal in [Rejected, Completed, Cancelled] {
            for to in [Pending, Approved, InProgress, Rejected, Completed, Cancelled] {
                assert!(!EngagementStatus::can_transition(terminal, to));
            }
        }
    }

    #[test]
    fn engagement_cancel_reaches_every_non_terminal_state() {
        use EngagementStatus::*;
        assert!(EngagementStatus::can_transition(Pending, Cancelled));
        assert!(EngagementStatus::can_transition(Approved, Cancelled));
        assert!(EngagementStatus::can_transition(InProgress, Cancelled));
    }

    #[test]
    fn engagement_cannot_skip_approval() {
        use EngagementStatus::*;
        assert!(!EngagementStatus::can_transition(Pending, InProgress));
        assert!(!EngagementStatus::can_transition(Pending, Completed));
        assert!(!EngagementStatus::can_transition(Approved, Completed));
    }

    #[test]
    fn disclosure_tracks_approval() {
        use EngagementStatus::*;
        assert!(!Pending.is_disclosed());
        assert!(!Rejected.is_disclosed());
        assert!(!Cancelled.is_disclosed());
        assert!(Approved.is_disclosed());
        assert!(InProgress.is_disclosed());
        assert!(Completed.is_disclosed());
    }

    #[test]
    fn payment_transitions_are_monotonic() {
        use PaymentStatus::*;
        assert!(PaymentStatus::can_transition(Pending, Approved));
        assert!(PaymentStatus::can_transition(Pending, Rejected));
        assert!(PaymentStatus::can_transition(Approved, Released));

        assert!(!PaymentStatus::can_transition(Approved, Pending));
        assert!(!PaymentStatus::can_transition(Rejected, Approved));
        assert!(!PaymentStatus::can_transition(Released, Pending));
        assert!(!PaymentStatus::can_transition(Released, Rejected));
        assert!(!PaymentStatus::can_transition(Pending, Released));
    }
}
