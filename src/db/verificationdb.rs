use async_trait::async_trait;
use sqlx::Error;
use uuid::Uuid;

use super::db::DBClient;
use crate::models::verificationmodels::*;

const DOCUMENT_COLS: &str = r#"
    id, provider_id, doc_type, storage_ref, status,
    reviewed_by, reviewed_at, review_notes, created_at
"#;

#[async_trait]
pub trait VerificationExt {
    async fn create_document(
        &self,
        provider_id: Uuid,
        doc_type: DocumentType,
        storage_ref: String,
    ) -> Result<Document, Error>;

    async fn get_document_by_id(&self, document_id: Uuid) -> Result<Option<Document>, Error>;

    async fn get_documents_for_provider(&self, provider_id: Uuid) -> Result<Vec<Document>, Error>;

    /// Conditional: only an unresolved document can be decided. Returns None
    /// when the row was already resolved, letting the caller report a guard
    /// violation instead of silently re-deciding.
    async fn review_document(
        &self,
        document_id: Uuid,
        verifier_id: Uuid,
        status: DocumentStatus,
        notes: Option<String>,
    ) -> Result<Option<Document>, Error>;

    /// The approved document types for a provider, deduplicated. Only the
    /// latest row per type counts: a rejected resubmission supersedes an
    /// older approval.
    async fn get_approved_document_types(
        &self,
        provider_id: Uuid,
    ) -> Result<Vec<DocumentType>, Error>;
}

#[async_trait]
impl VerificationExt for DBClient {
    async fn create_document(
        &self,
        provider_id: Uuid,
        doc_type: DocumentType,
        storage_ref: String,
    ) -> Result<Document, Error> {
        sqlx::query_as::<_, Document>(&format!(
            r#"
            INSERT INTO documents (provider_id, doc_type, storage_ref)
            VALUES ($1, $2, $3)
            RETURNING {DOCUMENT_COLS}
            "#
        ))
        .bind(provider_id)
        .bind(doc_type)
        .bind(storage_ref)
        .fetch_one(&self.pool)
        .await
    }

    async fn get_document_by_id(&self, document_id: Uuid) -> Result<Option<Document>, Error> {
        sqlx::query_as::<_, Document>(&format!(
            r#"
            SELECT {DOCUMENT_COLS}
            FROM documents
            WHERE id = $1
            "#
        ))
        .bind(document_id)
        .fetch_optional(&self.pool)
        .await
    }

    async fn get_documents_for_provider(&self, provider_id: Uuid) -> Result<Vec<Document>, Error> {
        sqlx::query_as::<_, Document>(&format!(
            r#"
            SELECT {DOCUMENT_COLS}
            FROM documents
            WHERE provider_id = $1
            ORDER BY created_at DESC
            "#
        ))
        .bind(provider_id)
        .fetch_all(&self.pool)
        .await
    }

    async fn review_document(
        &self,
        document_id: Uuid,
        verifier_id: Uuid,
        status: DocumentStatus,
        notes: Option<String>,
    ) -> Result<Option<Document>, Error> {
        sqlx::query_as::<_, Document>(&format!(
            r#"
            UPDATE documents
            SET status = $3, reviewed_by = $2, reviewed_at = NOW(), review_notes = $4
            WHERE id = $1 AND status IN ('pending', 'under_review')
            RETURNING {DOCUMENT_COLS}
            "#
        ))
        .bind(document_id)
        .bind(verifier_id)
        .bind(status)
        .bind(notes)
        .fetch_optional(&self.pool)
        .await
    }

    async fn get_approved_document_types(
        &self,
        provider_id: Uuid,
    ) -> Result<Vec<DocumentType>, Error> {
        let rows: Vec<(DocumentType,)> = sqlx::query_as(
            r#"
            SELECT doc_type
            FROM (
                SELECT DISTINCT ON (doc_type) doc_type, status
                FROM documents
                WHERE provider_id = $1
                ORDER BY doc_type, created_at DESC
            ) latest
            WHERE status = 'approved'
            "#,
        )
        .bind(provider_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(|(t,)| t).collect())
    }
}
