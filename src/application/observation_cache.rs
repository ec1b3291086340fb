// Observation cache - TTL memoization in front of a WeatherRepository
use crate::application::weather_repository::WeatherRepository;
use crate::domain::error::FetchError;
use crate::domain::observation::{HourlyObservation, LookbackWindow};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;
use tokio::time::Instant;

pub const DEFAULT_TTL: Duration = Duration::from_secs(300);

/// Coordinates are stored as raw bits so the key can be hashed
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct CacheKey {
    city: String,
    latitude: u64,
    longitude: u64,
    past_days: u8,
}

impl CacheKey {
    fn new(city: &str, latitude: f64, longitude: f64, lookback: LookbackWindow) -> Self {
        Self {
            city: city.to_string(),
            latitude: latitude.to_bits(),
            longitude: longitude.to_bits(),
            past_days: lookback.past_days(),
        }
    }
}

#[derive(Debug, Clone)]
struct CacheEntry {
    value: Vec<HourlyObservation>,
    created_at: Instant,
}

#[derive(Debug, Default)]
struct CacheState {
    entries: HashMap<CacheKey, CacheEntry>,
    /// Bumped by every `invalidate_all`; a fetch may only store its result
    /// if the generation it started under is still current.
    generation: u64,
}

#[derive(Clone)]
pub struct ObservationCache {
    repository: Arc<dyn WeatherRepository>,
    ttl: Duration,
    state: Arc<RwLock<CacheState>>,
}

impl ObservationCache {
    pub fn new(repository: Arc<dyn WeatherRepository>, ttl: Duration) -> Self {
        Self {
            repository,
            ttl,
            state: Arc::new(RwLock::new(CacheState::default())),
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    pub async fn get_or_fetch(
        &self,
        city: &str,
        latitude: f64,
        longitude: f64,
        lookback: LookbackWindow,
    ) -> Result<Vec<HourlyObservation>, FetchError> {
        let key = CacheKey::new(city, latitude, longitude, lookback);

        let started_generation = {
            let state = self.state.read().await;
            if let Some(entry) = state.entries.get(&key) {
                if entry.created_at.elapsed() < self.ttl {
                    tracing::debug!("Cache hit for {} ({} past days)", city, key.past_days);
                    return Ok(entry.value.clone());
                }
            }
            state.generation
        };

        tracing::debug!("Cache miss for {} ({} past days)", city, key.past_days);
        let value = self
            .repository
            .fetch_hourly(city, latitude, longitude, lookback)
            .await?;

        let mut state = self.state.write().await;
        if state.generation == started_generation {
            state.entries.insert(
                key,
                CacheEntry {
                    value: value.clone(),
                    created_at: Instant::now(),
                },
            );
        } else {
            tracing::debug!(
                "Cache invalidated while fetching {}; result not stored",
                city
            );
        }

        Ok(value)
    }

    /// Drop every entry regardless of age
    pub async fn invalidate_all(&self) {
        let mut state = self.state.write().await;
        state.entries.clear();
        state.generation += 1;
        tracing::info!("Observation cache invalidated");
    }

    pub async fn len(&self) -> usize {
        self.state.read().await.entries.len()
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use super::*;
    use async_trait::async_trait;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Repository that returns canned per-city responses and counts calls
    #[derive(Default)]
    pub struct StubRepository {
        responses: Mutex<HashMap<String, Result<Vec<HourlyObservation>, FetchError>>>,
        calls: AtomicUsize,
    }

    impl StubRepository {
        pub fn with(
            self,
            city: &str,
            response: Result<Vec<HourlyObservation>, FetchError>,
        ) -> Self {
            self.set(city, response);
            self
        }

        pub fn set(&self, city: &str, response: Result<Vec<HourlyObservation>, FetchError>) {
            self.responses
                .lock()
                .unwrap()
                .insert(city.to_string(), response);
        }

        pub fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl WeatherRepository for StubRepository {
        async fn fetch_hourly(
            &self,
            city: &str,
            _latitude: f64,
            _longitude: f64,
            _lookback: LookbackWindow,
        ) -> Result<Vec<HourlyObservation>, FetchError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.responses
                .lock()
                .unwrap()
                .get(city)
                .cloned()
                .unwrap_or_else(|| Ok(Vec::new()))
        }
    }
}
