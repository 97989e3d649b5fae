// service/disclosure.rs
//
// Field-level visibility for engagement reads. Stateless: the mask is a
// function of the engagement status and the viewer, recomputed on every
// read. Responses are built from these views, never from raw user rows.
use serde::Serialize;
use uuid::Uuid;

use crate::models::{
    providermodel::ProviderProfile,
    taskmodel::{Engagement, EngagementStatus},
    usermodel::{User, UserRole},
};
use num_traits::ToPrimitive;

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Viewer {
    Client,
    Provider,
    Staff,
}

impl Viewer {
    /// Resolve the viewer for an engagement. Staff roles vet the exchange
    /// and see both sides; anyone else must be one of the two parties.
    pub fn resolve(
        user: &User,
        provider_profile_user_id: Uuid,
        engagement: &Engagement,
    ) -> Option<Viewer> {
        match user.role {
            UserRole::Admin
            | UserRole::CallCenter
            | UserRole::PaymentApprover
            | UserRole::Verifier => Some(Viewer::Staff),
            _ if user.id == engagement.client_id => Some(Viewer::Client),
            _ if user.id == provider_profile_user_id => Some(Viewer::Provider),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DisclosureMask {
    pub client_name: bool,
    pub client_email: bool,
    pub client_phone: bool,
    pub client_address: bool,
    pub provider_name: bool,
    pub provider_category: bool,
    pub provider_rate: bool,
    pub provider_email: bool,
    pub provider_phone: bool,
}

impl DisclosureMask {
    const NOTHING: DisclosureMask = DisclosureMask {
        client_name: false,
        client_email: false,
        client_phone: false,
        client_address: false,
        provider_name: false,
        provider_category: false,
        provider_rate: false,
        provider_email: false,
        provider_phone: false,
    };

    const EVERYTHING: DisclosureMask = DisclosureMask {
        client_name: true,
        client_email: true,
        client_phone: true,
        client_address: true,
        provider_name: true,
        provider_category: true,
        provider_rate: true,
        provider_email: true,
        provider_phone: true,
    };
}

pub fn disclosure_mask(status: EngagementStatus, viewer: Viewer) -> DisclosureMask {
    match viewer {
        Viewer::Staff => DisclosureMask::EVERYTHING,
        Viewer::Provider => {
            if status.is_disclosed() {
                DisclosureMask {
                    client_name: true,
                    client_email: true,
                    client_phone: true,
                    client_address: true,
                    ..DisclosureMask::NOTHING
                }
            } else {
                // Task description/category/budget come from the task row;
                // nothing of the client themselves is visible yet.
                DisclosureMask::NOTHING
            }
        }
        Viewer::Client => {
            let public = DisclosureMask {
                provider_name: true,
                provider_category: true,
                provider_rate: true,
                ..DisclosureMask::NOTHING
            };
            if status.is_disclosed() {
                DisclosureMask {
                    provider_email: true,
                    provider_phone: true,
                    ..public
                }
            } else {
                public
            }
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ClientContactView {
    pub id: Uuid,
    pub name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub address: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ProviderContactView {
    pub id: Uuid,
    pub name: Option<String>,
    pub category: Option<String>,
    pub hourly_rate: Option<f64>,
    pub rating: Option<f32>,
    pub email: Option<String>,
    pub phone: Option<String>,
    // Providers never expose an address, at any status.
}

pub fn client_view(client: &User, status: EngagementStatus, viewer: Viewer) -> ClientContactView {
    let mask = disclosure_mask(status, viewer);
    ClientContactView {
        id: client.id,
        name: mask.client_name.then(|| client.name.clone()),
        email: mask.client_email.then(|| client.email.clone()),
        phone: mask.client_phone.then(|| client.phone.clone()).flatten(),
        address: mask.client_address.then(|| client.address.clone()).flatten(),
    }
}

pub fn provider_view(
    provider_user: &User,
    profile: &ProviderProfile,
    status: EngagementStatus,
    viewer: Viewer,
) -> ProviderContactView {
    let mask = disclosure_mask(status, viewer);
    ProviderContactView {
        id: profile.id,
        name: mask.provider_name.then(|| provider_user.name.clone()),
        category: mask
            .provider_category
            .then(|| profile.category.to_str().to_owned()),
        hourly_rate: mask
            .provider_rate
            .then(|| profile.hourly_rate.as_ref().and_then(|r| r.to_f64()))
            .flatten(),
        rating: mask.provider_rate.then_some(profile.rating).flatten(),
        email: mask
            .provider_email
            .then(|| provider_user.email.clone()),
        phone: mask
            .provider_phone
            .then(|| provider_user.phone.clone())
            .flatten(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use EngagementStatus::*;

    const UNDISCLOSED: [EngagementStatus; 3] = [Pending, Rejected, Cancelled];
    const DISCLOSED: [EngagementStatus; 3] = [Approved, InProgress, Completed];

    #[test]
    fn provider_never_sees_client_contact_before_approval() {
        for status in UNDISCLOSED {
            let mask = disclosure_mask(status, Viewer::Provider);
            assert!(!mask.client_address, "address leaked at {:?}", status);
            assert!(!mask.client_email, "email leaked at {:?}", status);
            assert!(!mask.client_phone, "phone leaked at {:?}", status);
        }
    }

    #[test]
    fn both_parties_see_contact_fields_once_approved() {
        for status in DISCLOSED {
            let provider_mask = disclosure_mask(status, Viewer::Provider);
            assert!(provider_mask.client_address);
            assert!(provider_mask.client_email);
            assert!(provider_mask.client_phone);

            let client_mask = disclosure_mask(status, Viewer::Client);
            assert!(client_mask.provider_email);
            assert!(client_mask.provider_phone);
        }
    }

    #[test]
    fn client_always_sees_provider_public_profile() {
        for status in UNDISCLOSED.into_iter().chain(DISCLOSED) {
            let mask = disclosure_mask(status, Viewer::Client);
            assert!(mask.provider_name);
            assert!(mask.provider_category);
            assert!(mask.provider_rate);
        }
    }

    #[test]
    fn staff_sees_everything() {
        let mask = disclosure_mask(Pending, Viewer::Staff);
        assert!(mask.client_address && mask.provider_email);
    }

    #[test]
    fn filtered_client_view_withholds_fields() {
        let client = User {
            id: Uuid::from_bytes([7; 16]),
            name: "Ada".into(),
            email: "ada@example.com".into(),
            phone: Some("+15550100".into()),
            address: Some("1 Main St".into()),
            role: UserRole::Client,
            created_at: chrono::Utc::now(),
            updated_at: chrono::Utc::now(),
        };

        let before = client_view(&client, Pending, Viewer::Provider);
        assert!(before.email.is_none());
        assert!(before.phone.is_none());
        assert!(before.address.is_none());

        let after = client_view(&client, Approved, Viewer::Provider);
        assert_eq!(after.email.as_deref(), Some("ada@example.com"));
        assert_eq!(after.address.as_deref(), Some("1 Main St"));
    }
}
