// service/verification_service.rs
use std::collections::HashMap;
use std::sync::Arc;

use uuid::Uuid;

use crate::{
    db::{db::DBClient, providerdb::ProviderExt, verificationdb::VerificationExt},
    models::{
        providermodel::{ProviderProfile, VerificationStatus},
        verificationmodels::*,
    },
    service::{audit_service::AuditService, error::ServiceError},
};

/// OR-groups: one approved document from each group makes a provider fully
/// verified.
const IDENTITY_DOCS: &[DocumentType] = &[
    DocumentType::NationalId,
    DocumentType::DriversLicense,
    DocumentType::Passport,
];
const BANKING_DOCS: &[DocumentType] = &[DocumentType::BankStatement];
const LICENSE_DOCS: &[DocumentType] = &[DocumentType::TradeLicense, DocumentType::Certificate];

pub fn is_fully_verified(approved_types: &[DocumentType]) -> bool {
    [IDENTITY_DOCS, BANKING_DOCS, LICENSE_DOCS]
        .iter()
        .all(|group| group.iter().any(|t| approved_types.contains(t)))
}

/// Derive the profile-level status from the latest document per type.
/// Approved coverage wins; anything still in review keeps the provider at
/// pending; a fully-resolved but uncovered set is rejected.
pub fn derive_verification_status(
    latest_by_type: &HashMap<DocumentType, DocumentStatus>,
) -> VerificationStatus {
    let approved: Vec<DocumentType> = latest_by_type
        .iter()
        .filter(|(_, s)| **s == DocumentStatus::Approved)
        .map(|(t, _)| *t)
        .collect();

    if is_fully_verified(&approved) {
        return VerificationStatus::Verified;
    }

    if latest_by_type
        .values()
        .any(|s| matches!(s, DocumentStatus::Pending | DocumentStatus::UnderReview))
    {
        return VerificationStatus::Pending;
    }

    if latest_by_type.is_empty() {
        VerificationStatus::Unverified
    } else {
        VerificationStatus::Rejected
    }
}

fn latest_status_per_type(documents: &[Document]) -> HashMap<DocumentType, DocumentStatus> {
    // Documents arrive newest-first; the first row seen per type is the
    // live one, older rows are superseded.
    let mut latest = HashMap::new();
    for doc in documents {
        if let Some(status) = doc.status {
            latest.entry(doc.doc_type).or_insert(status);
        }
    }
    latest
}

#[derive(Debug, Clone)]
pub struct VerificationService {
    db_client: Arc<DBClient>,
    audit_service: Arc<AuditService>,
}

impl VerificationService {
    pub fn new(db_client: Arc<DBClient>, audit_service: Arc<AuditService>) -> Self {
        Self {
            db_client,
            audit_service,
        }
    }

    /// Provider uploads a document. The new row supersedes any earlier row
    /// of the same type and the derived profile status is recomputed.
    pub async fn submit_document(
        &self,
        provider_user_id: Uuid,
        doc_type: DocumentType,
        storage_ref: String,
    ) -> Result<(Document, ProviderProfile), ServiceError> {
        let profile = self
            .db_client
            .get_provider_profile(provider_user_id)
            .await?
            .ok_or(ServiceError::ProviderProfileNotFound(provider_user_id))?;

        let document = self
            .db_client
            .create_document(profile.id, doc_type, storage_ref)
            .await?;

        let profile = self.recompute_provider_status(profile.id).await?;

        Ok((document, profile))
    }

    /// Verifier decision on a single document, followed by the gate
    /// recomputation. Deciding an already-resolved document is a guard
    /// violation, not a silent overwrite.
    pub async fn review_document(
        &self,
        document_id: Uuid,
        verifier_id: Uuid,
        approve: bool,
        notes: Option<String>,
    ) -> Result<(Document, ProviderProfile), ServiceError> {
        let decision = if approve {
            DocumentStatus::Approved
        } else {
            DocumentStatus::Rejected
        };

        let updated = self
            .db_client
            .review_document(document_id, verifier_id, decision, notes)
            .await?;

        let document = match updated {
            Some(doc) => doc,
            None => {
                let current = self
                    .db_client
                    .get_document_by_id(document_id)
                    .await?
                    .ok_or(ServiceError::DocumentNotFound(document_id))?;
                // Repeating the same decision is a retry, not an error.
                if current.status == Some(decision) {
                    current
                } else {
                    return Err(ServiceError::Guard(format!(
                        "document {} is already resolved as {:?}",
                        document_id, current.status
                    )));
                }
            }
        };

        let profile = self.recompute_provider_status(document.provider_id).await?;

        self.audit_service
            .log_document_review(verifier_id, &document, profile.verification_status)
            .await?;

        Ok((document, profile))
    }

    /// Recompute the derived flag from document rows and write it onto the
    /// profile so matching and notification targeting can filter cheaply.
    /// A regression takes effect immediately; engagements already past
    /// approval are left alone.
    pub async fn recompute_provider_status(
        &self,
        provider_id: Uuid,
    ) -> Result<ProviderProfile, ServiceError> {
        let documents = self
            .db_client
            .get_documents_for_provider(provider_id)
            .await?;

        let derived = derive_verification_status(&latest_status_per_type(&documents));

        let profile = self
            .db_client
            .set_provider_verification_status(provider_id, derived)
            .await?
            .ok_or(ServiceError::ProviderProfileNotFound(provider_id))?;

        tracing::info!(
            "provider {} verification recomputed to {}",
            provider_id,
            derived.to_str()
        );

        Ok(profile)
    }

    pub async fn get_approved_documents(
        &self,
        provider_id: Uuid,
    ) -> Result<Vec<DocumentType>, ServiceError> {
        Ok(self
            .db_client
            .get_approved_document_types(provider_id)
            .await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use DocumentStatus::*;
    use DocumentType::*;

    #[test]
    fn full_coverage_is_verified() {
        assert!(is_fully_verified(&[NationalId, BankStatement, TradeLicense]));
        assert!(is_fully_verified(&[Passport, BankStatement, Certificate]));
        assert!(is_fully_verified(&[DriversLicense, BankStatement, TradeLicense, Certificate]));
    }

    #[test]
    fn any_partial_set_is_not_verified() {
        assert!(!is_fully_verified(&[]));
        assert!(!is_fully_verified(&[NationalId]));
        assert!(!is_fully_verified(&[NationalId, BankStatement]));
        assert!(!is_fully_verified(&[NationalId, TradeLicense]));
        assert!(!is_fully_verified(&[BankStatement, TradeLicense]));
        // Two identity documents cannot stand in for a missing group.
        assert!(!is_fully_verified(&[NationalId, Passport, BankStatement]));
        // Irrelevant types never count toward coverage.
        assert!(!is_fully_verified(&[Other, BankStatement, TradeLicense]));
    }

    #[test]
    fn derived_status_verified_on_coverage() {
        let latest = HashMap::from([
            (Passport, Approved),
            (BankStatement, Approved),
            (TradeLicense, Approved),
        ]);
        assert_eq!(
            derive_verification_status(&latest),
            VerificationStatus::Verified
        );
    }

    #[test]
    fn derived_status_pending_while_any_doc_in_review() {
        let latest = HashMap::from([
            (Passport, Approved),
            (BankStatement, Pending),
            (TradeLicense, Approved),
        ]);
        assert_eq!(
            derive_verification_status(&latest),
            VerificationStatus::Pending
        );
    }

    #[test]
    fn derived_status_rejected_when_resolved_but_uncovered() {
        let latest = HashMap::from([
            (Passport, Approved),
            (BankStatement, Rejected),
            (TradeLicense, Approved),
        ]);
        assert_eq!(
            derive_verification_status(&latest),
            VerificationStatus::Rejected
        );
    }

    #[test]
    fn derived_status_unverified_with_no_documents() {
        assert_eq!(
            derive_verification_status(&HashMap::new()),
            VerificationStatus::Unverified
        );
    }

    #[test]
    fn regression_downgrades_verified_provider() {
        // A rejected resubmission supersedes the earlier approval of the
        // only banking document, so coverage is lost.
        let latest = HashMap::from([
            (Passport, Approved),
            (BankStatement, Rejected),
            (Certificate, Approved),
        ]);
        assert_ne!(
            derive_verification_status(&latest),
            VerificationStatus::Verified
        );
    }

    #[test]
    fn latest_row_per_type_wins() {
        let newer = Document {
            id: Uuid::from_bytes([1; 16]),
            provider_id: Uuid::from_bytes([9; 16]),
            doc_type: BankStatement,
            storage_ref: "doc/2".into(),
            status: Some(Rejected),
            reviewed_by: None,
            reviewed_at: None,
            review_notes: None,
            created_at: None,
        };
        let older = Document {
            id: Uuid::from_bytes([2; 16]),
            status: Some(Approved),
            storage_ref: "doc/1".into(),
            ..newer.clone()
        };

        // get_documents_for_provider returns newest first.
        let latest = latest_status_per_type(&[newer, older]);
        assert_eq!(latest.get(&BankStatement), Some(&Rejected));
    }
}
