use async_trait::async_trait;
use sqlx::{types::BigDecimal, Error};
use uuid::Uuid;

use super::db::DBClient;
use crate::models::{providermodel::*, taskmodel::ServiceCategory};

const PROFILE_COLS: &str = r#"
    id, user_id, category, hourly_rate, latitude, longitude,
    verification_status, is_available, rating, completed_jobs,
    created_at, updated_at
"#;

#[async_trait]
pub trait ProviderExt {
    async fn create_provider_profile(
        &self,
        user_id: Uuid,
        category: ServiceCategory,
        hourly_rate: Option<f64>,
        latitude: Option<f64>,
        longitude: Option<f64>,
    ) -> Result<ProviderProfile, Error>;

    async fn get_provider_profile(&self, user_id: Uuid) -> Result<Option<ProviderProfile>, Error>;

    async fn get_provider_profile_by_id(
        &self,
        profile_id: Uuid,
    ) -> Result<Option<ProviderProfile>, Error>;

    async fn update_provider_availability(
        &self,
        profile_id: Uuid,
        is_available: bool,
    ) -> Result<Option<ProviderProfile>, Error>;

    /// Written only by the verification gate after recomputing coverage.
    async fn set_provider_verification_status(
        &self,
        profile_id: Uuid,
        status: VerificationStatus,
    ) -> Result<Option<ProviderProfile>, Error>;

    /// Candidate pool for the geo-matcher: verified, available, in category,
    /// with coordinates on record. Distance filtering happens in Rust.
    async fn get_matchable_providers(
        &self,
        category: ServiceCategory,
    ) -> Result<Vec<ProviderProfile>, Error>;

    async fn increment_completed_jobs(&self, profile_id: Uuid) -> Result<(), Error>;
}

#[async_trait]
impl ProviderExt for DBClient {
    async fn create_provider_profile(
        &self,
        user_id: Uuid,
        category: ServiceCategory,
        hourly_rate: Option<f64>,
        latitude: Option<f64>,
        longitude: Option<f64>,
    ) -> Result<ProviderProfile, Error> {
        let hourly_rate_bd = hourly_rate.and_then(|rate| BigDecimal::try_from(rate).ok());

        sqlx::query_as::<_, ProviderProfile>(&format!(
            r#"
            INSERT INTO provider_profiles (user_id, category, hourly_rate, latitude, longitude)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING {PROFILE_COLS}
            "#
        ))
        .bind(user_id)
        .bind(category)
        .bind(hourly_rate_bd)
        .bind(latitude)
        .bind(longitude)
        .fetch_one(&self.pool)
        .await
    }

    async fn get_provider_profile(&self, user_id: Uuid) -> Result<Option<ProviderProfile>, Error> {
        sqlx::query_as::<_, ProviderProfile>(&format!(
            r#"
            SELECT {PROFILE_COLS}
            FROM provider_profiles
            WHERE user_id = $1
            "#
        ))
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await
    }

    async fn get_provider_profile_by_id(
        &self,
        profile_id: Uuid,
    ) -> Result<Option<ProviderProfile>, Error> {
        sqlx::query_as::<_, ProviderProfile>(&format!(
            r#"
            SELECT {PROFILE_COLS}
            FROM provider_profiles
            WHERE id = $1
            "#
        ))
        .bind(profile_id)
        .fetch_optional(&self.pool)
        .await
    }

    async fn update_provider_availability(
        &self,
        profile_id: Uuid,
        is_available: bool,
    ) -> Result<Option<ProviderProfile>, Error> {
        sqlx::query_as::<_, ProviderProfile>(&format!(
            r#"
            UPDATE provider_profiles
            SET is_available = $2, updated_at = NOW()
            WHERE id = $1
            RETURNING {PROFILE_COLS}
            "#
        ))
        .bind(profile_id)
        .bind(is_available)
        .fetch_optional(&self.pool)
        .await
    }

    async fn set_provider_verification_status(
        &self,
        profile_id: Uuid,
        status: VerificationStatus,
    ) -> Result<Option<ProviderProfile>, Error> {
        sqlx::query_as::<_, ProviderProfile>(&format!(
            r#"
            UPDATE provider_profiles
            SET verification_status = $2, updated_at = NOW()
            WHERE id = $1
            RETURNING {PROFILE_COLS}
            "#
        ))
        .bind(profile_id)
        .bind(status)
        .fetch_optional(&self.pool)
        .await
    }

    async fn get_matchable_providers(
        &self,
        category: ServiceCategory,
    ) -> Result<Vec<ProviderProfile>, Error> {
        sqlx::query_as::<_, ProviderProfile>(&format!(
            r#"
            SELECT {PROFILE_COLS}
            FROM provider_profiles
            WHERE category = $1
              AND verification_status = 'verified'
              AND is_available = true
              AND latitude IS NOT NULL
              AND longitude IS NOT NULL
            "#
        ))
        .bind(category)
        .fetch_all(&self.pool)
        .await
    }

    async fn increment_completed_jobs(&self, profile_id: Uuid) -> Result<(), Error> {
        sqlx::query(
            r#"
            UPDATE provider_profiles
            SET completed_jobs = COALESCE(completed_jobs, 0) + 1, updated_at = NOW()
            WHERE id = $1
            "#,
        )
        .bind(profile_id)
        .execute(&self.pool)
        .await?;

        Ok(())
    }
}
