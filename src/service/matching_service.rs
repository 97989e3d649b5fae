// service/matching_service.rs
use std::sync::Arc;

use serde::Serialize;

use crate::{
    db::{db::DBClient, providerdb::ProviderExt},
    models::{providermodel::ProviderProfile, taskmodel::Task},
    service::error::ServiceError,
};

const EARTH_RADIUS_KM: f64 = 6371.0;

/// Widening schedule: start at the default band, retry wider while the
/// candidate count stays below the minimum, capped at the last step.
const RADIUS_STEPS_KM: [f64; 3] = [6.0, 10.0, 15.0];

/// Great-circle distance between two points in decimal degrees.
pub fn haversine_km(lat1: f64, lon1: f64, lat2: f64, lon2: f64) -> f64 {
    let d_lat = (lat2 - lat1).to_radians();
    let d_lon = (lon2 - lon1).to_radians();

    let a = (d_lat / 2.0).sin().powi(2)
        + lat1.to_radians().cos() * lat2.to_radians().cos() * (d_lon / 2.0).sin().powi(2);

    2.0 * EARTH_RADIUS_KM * a.sqrt().asin()
}

#[derive(Debug, Clone, Serialize)]
pub struct ProviderMatch {
    pub provider: ProviderProfile,
    pub distance_km: f64,
}

/// Distance-filter and rank a candidate pool against a task location.
/// Candidates without coordinates are skipped, not errors. Ordering is
/// ascending distance with provider id as the deterministic tiebreak.
pub fn rank_candidates(
    task_lat: f64,
    task_lon: f64,
    candidates: Vec<ProviderProfile>,
    radius_km: f64,
) -> Vec<ProviderMatch> {
    let mut matches: Vec<ProviderMatch> = candidates
        .into_iter()
        .filter_map(|provider| {
            let (lat, lon) = match (provider.latitude, provider.longitude) {
                (Some(lat), Some(lon)) => (lat, lon),
                _ => return None,
            };
            let distance_km = haversine_km(task_lat, task_lon, lat, lon);
            (distance_km <= radius_km).then_some(ProviderMatch {
                provider,
                distance_km,
            })
        })
        .collect();

    matches.sort_by(|a, b| {
        a.distance_km
            .partial_cmp(&b.distance_km)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then_with(|| a.provider.id.cmp(&b.provider.id))
    });

    matches
}

#[derive(Debug, Clone)]
pub struct MatchingService {
    db_client: Arc<DBClient>,
    min_candidates: usize,
}

impl MatchingService {
    pub fn new(db_client: Arc<DBClient>, min_candidates: usize) -> Self {
        Self {
            db_client,
            min_candidates,
        }
    }

    /// Pure query over current provider state: verified, available
    /// providers in the task's category within the radius band, nearest
    /// first. Tasks without coordinates match nobody.
    pub async fn match_providers_for_task(
        &self,
        task: &Task,
    ) -> Result<Vec<ProviderMatch>, ServiceError> {
        let (task_lat, task_lon) = match (task.latitude, task.longitude) {
            (Some(lat), Some(lon)) => (lat, lon),
            _ => return Ok(Vec::new()),
        };

        let candidates = self
            .db_client
            .get_matchable_providers(task.category)
            .await?;

        let mut matches = Vec::new();
        for radius_km in RADIUS_STEPS_KM {
            matches = rank_candidates(task_lat, task_lon, candidates.clone(), radius_km);
            if matches.len() >= self.min_candidates {
                break;
            }
            tracing::debug!(
                "task {} has {} candidates at {} km, widening search",
                task.id,
                matches.len(),
                radius_km
            );
        }

        Ok(matches)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{providermodel::VerificationStatus, taskmodel::ServiceCategory};
    use uuid::Uuid;

    fn profile(id_byte: u8, lat: f64, lon: f64) -> ProviderProfile {
        ProviderProfile {
            id: Uuid::from_bytes([id_byte; 16]),
            user_id: Uuid::from_bytes([id_byte.wrapping_add(100); 16]),
            category: ServiceCategory::Cleaning,
            hourly_rate: None,
            latitude: Some(lat),
            longitude: Some(lon),
            verification_status: Some(VerificationStatus::Verified),
            is_available: Some(true),
            rating: None,
            completed_jobs: Some(0),
            created_at: None,
            updated_at: None,
        }
    }

    #[test]
    fn haversine_known_distance() {
        // Midtown Manhattan to JFK airport, roughly 21 km.
        let d = haversine_km(40.7527, -73.9772, 40.6413, -73.7781);
        assert!((d - 21.0).abs() < 1.5, "got {}", d);
    }

    #[test]
    fn haversine_zero_for_same_point() {
        assert!(haversine_km(40.75, -73.99, 40.75, -73.99) < 1e-9);
    }

    #[test]
    fn ranking_sorts_by_distance_ascending() {
        // ~0.01 degrees latitude is about 1.1 km.
        let near = profile(1, 40.76, -73.99);
        let far = profile(2, 40.79, -73.99);
        let matches = rank_candidates(40.75, -73.99, vec![far, near], 6.0);

        assert_eq!(matches.len(), 2);
        assert!(matches[0].distance_km < matches[1].distance_km);
        assert_eq!(matches[0].provider.id, Uuid::from_bytes([1; 16]));
    }

    #[test]
    fn ranking_excludes_providers_outside_radius() {
        let near = profile(1, 40.76, -73.99);
        let outside = profile(2, 41.75, -73.99); // >100 km away
        let matches = rank_candidates(40.75, -73.99, vec![near, outside], 6.0);

        assert_eq!(matches.len(), 1);
        assert_eq!(matches[0].provider.id, Uuid::from_bytes([1; 16]));
    }

    #[test]
    fn ranking_skips_candidates_without_coordinates() {
        let mut missing = profile(1, 0.0, 0.0);
        missing.latitude = None;
        let ok = profile(2, 40.76, -73.99);
        let matches = rank_candidates(40.75, -73.99, vec![missing, ok], 6.0);

        assert_eq!(matches.len(), 1);
        assert_eq!(matches[0].provider.id, Uuid::from_bytes([2; 16]));
    }

    #[test]
    fn equidistant_candidates_tie_break_on_id() {
        let a = profile(3, 40.76, -73.99);
        let b = profile(1, 40.76, -73.99);
        let matches = rank_candidates(40.75, -73.99, vec![a, b], 6.0);

        assert_eq!(matches.len(), 2);
        assert_eq!(matches[0].provider.id, Uuid::from_bytes([1; 16]));
        assert_eq!(matches[1].provider.id, Uuid::from_bytes([3; 16]));
    }
}
