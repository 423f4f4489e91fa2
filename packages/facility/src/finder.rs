//! Nearby-facility search service.
//!
//! Wraps a [`FacilityProvider`] with a TTL cache and a timeout, then ranks
//! the candidates with the [`crate::graph`] resolvers.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use incident_map_facility_models::{
    FacilityMatch, FacilitySearchResult, NearestStrategy, QueryPoint,
};
use incident_map_report_models::ReportSeverity;

use crate::cache::FacilityCache;
use crate::graph::{DEFAULT_ALTERNATIVES, find_nearest_facility_with, find_top_k_facilities};
use crate::overpass::OverpassProvider;
use crate::service_registry::{self, FacilityService};
use crate::{FacilityError, FacilityProvider};

/// Default search radius in kilometres.
pub const DEFAULT_RADIUS_KM: f64 = 10.0;

/// Default provider timeout.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(25);

/// Cached, time-bounded facility search.
pub struct FacilityFinder {
    provider: Arc<dyn FacilityProvider>,
    cache: FacilityCache,
    timeout: Duration,
    alternatives: usize,
    strategy: NearestStrategy,
}

impl FacilityFinder {
    /// Creates a finder over `provider` with default cache TTL, timeout,
    /// alternative count and the sorted nearest strategy.
    #[must_use]
    pub fn new(provider: Arc<dyn FacilityProvider>) -> Self {
        Self {
            provider,
            cache: FacilityCache::default(),
            timeout: DEFAULT_TIMEOUT,
            alternatives: DEFAULT_ALTERNATIVES,
            strategy: NearestStrategy::default(),
        }
    }

    /// Creates a finder backed by an Overpass registry entry, taking the
    /// cache TTL and timeout from it.
    ///
    /// # Errors
    ///
    /// Returns [`FacilityError::Http`] if the HTTP client cannot be built.
    pub fn from_service(service: &FacilityService) -> Result<Self, FacilityError> {
        let provider = OverpassProvider::from_service(service)?;
        Ok(Self::new(Arc::new(provider))
            .with_cache_ttl(Duration::from_secs(service.cache_ttl_secs))
            .with_timeout(Duration::from_secs(service.timeout_secs)))
    }

    /// Creates a finder from the default enabled registry service.
    ///
    /// # Errors
    ///
    /// * If no facility service is enabled
    /// * If the HTTP client cannot be built
    pub fn from_registry() -> Result<Self, FacilityError> {
        let service =
            service_registry::default_service().ok_or_else(|| FacilityError::Unavailable {
                message: "no facility service is enabled".to_string(),
            })?;
        log::info!("Using facility service '{}' ({})", service.id, service.name);
        Self::from_service(&service)
    }

    /// Sets how long provider results are cached.
    #[must_use]
    pub fn with_cache_ttl(mut self, ttl: Duration) -> Self {
        self.cache = FacilityCache::new(ttl);
        self
    }

    /// Sets the provider timeout.
    #[must_use]
    pub const fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Sets how many alternatives a search returns.
    #[must_use]
    pub const fn with_alternatives(mut self, alternatives: usize) -> Self {
        self.alternatives = alternatives;
        self
    }

    /// Sets the nearest-facility resolver.
    #[must_use]
    pub const fn with_strategy(mut self, strategy: NearestStrategy) -> Self {
        self.strategy = strategy;
        self
    }

    /// Name of the underlying provider.
    #[must_use]
    pub fn provider_name(&self) -> &str {
        self.provider.name()
    }

    /// Finds the nearest facility and ranked alternatives around a point.
    ///
    /// # Errors
    ///
    /// * [`FacilityError::InvalidLocation`] if a coordinate is not finite
    /// * [`FacilityError::Timeout`] if the provider does not answer in time
    /// * [`FacilityError::NoFacilitiesFound`] if the radius holds no
    ///   facility
    /// * Any provider error
    pub async fn find_nearby(
        &self,
        latitude: f64,
        longitude: f64,
        severity: Option<ReportSeverity>,
        radius_km: f64,
    ) -> Result<FacilitySearchResult, FacilityError> {
        if !latitude.is_finite() || !longitude.is_finite() {
            return Err(FacilityError::InvalidLocation {
                latitude,
                longitude,
            });
        }

        let query = QueryPoint::new(latitude, longitude);
        let key = FacilityCache::key(latitude, longitude, radius_km);

        let facilities = if let Some(cached) = self.cache.get(&key).await {
            log::debug!("Facility cache hit for {key}");
            cached
        } else {
            log::debug!("Facility cache miss for {key}");
            let fetched = tokio::time::timeout(
                self.timeout,
                self.provider.search(latitude, longitude, radius_km),
            )
            .await
            .map_err(|_| {
                log::warn!(
                    "Facility provider '{}' timed out after {:?}",
                    self.provider.name(),
                    self.timeout
                );
                FacilityError::Timeout {
                    seconds: self.timeout.as_secs(),
                }
            })?
            .inspect_err(|e| {
                log::warn!("Facility provider '{}' failed: {e}", self.provider.name());
            })?;

            if fetched.is_empty() {
                return Err(FacilityError::NoFacilitiesFound { radius_km });
            }
            self.cache.insert(key, fetched.clone()).await;
            fetched
        };

        let nearest = find_nearest_facility_with(query, &facilities, self.strategy)
            .ok_or(FacilityError::NoFacilitiesFound { radius_km })?;
        let alternatives = find_top_k_facilities(query, &facilities, self.alternatives);

        log::debug!(
            "Nearest facility: {} ({:.2} km)",
            nearest.facility.name,
            nearest.distance_km
        );

        Ok(FacilitySearchResult {
            nearest,
            alternatives,
            query_point: query,
            severity,
            timestamp: Utc::now(),
        })
    }

    /// Just the nearest facility around a point.
    ///
    /// # Errors
    ///
    /// See [`Self::find_nearby`].
    pub async fn nearest(
        &self,
        latitude: f64,
        longitude: f64,
        radius_km: f64,
    ) -> Result<FacilityMatch, FacilityError> {
        self.find_nearby(latitude, longitude, None, radius_km)
            .await
            .map(|r| r.nearest)
    }

    /// Drops all cached provider results.
    pub async fn clear_cache(&self) {
        self.cache.clear().await;
    }
}
