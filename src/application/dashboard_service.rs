// Dashboard service - Use case for one fetch/merge/derive run
use crate::application::aggregator;
use crate::application::observation_cache::ObservationCache;
use crate::domain::city::{CityCoordinate, CityRegistry};
use crate::domain::dashboard::DashboardReport;
use crate::domain::error::{CityWarning, DashboardError, FetchError};
use crate::domain::observation::{HourlyObservation, LookbackWindow, ObservationSet};
use futures::future::join_all;
use std::time::{Duration, Instant};

/// Upper bound on one city's fetch, cache wait included
pub const DEFAULT_FETCH_TIMEOUT: Duration = Duration::from_secs(10);

/// Phases of a single run, logged as the run progresses
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunPhase {
    Idle,
    Fetching,
    Merging,
    Derived,
    Failed,
}

#[derive(Clone)]
pub struct DashboardService {
    cache: ObservationCache,
    registry: CityRegistry,
    fetch_timeout: Duration,
}

impl DashboardService {
    pub fn new(cache: ObservationCache, registry: CityRegistry) -> Self {
        Self {
            cache,
            registry,
            fetch_timeout: DEFAULT_FETCH_TIMEOUT,
        }
    }

    pub fn with_fetch_timeout(mut self, fetch_timeout: Duration) -> Self {
        self.fetch_timeout = fetch_timeout;
        self
    }

    pub fn registry(&self) -> &CityRegistry {
        &self.registry
    }

    pub async fn build(
        &self,
        selected_cities: &[String],
        lookback: LookbackWindow,
        refresh: bool,
    ) -> Result<DashboardReport, DashboardError> {
        let start_time = Instant::now();
        let mut phase = RunPhase::Idle;
        let cities = self.resolve_selection(selected_cities)?;

        if refresh {
            self.cache.invalidate_all().await;
        }

        transition(&mut phase, RunPhase::Fetching);
        let fetches = cities.iter().map(|city| async move {
            let fetch = self
                .cache
                .get_or_fetch(city.name, city.latitude, city.longitude, lookback);
            let result = match tokio::time::timeout(self.fetch_timeout, fetch).await {
                Ok(result) => result,
                Err(_) => Err(FetchError::ScheduleTimeout(self.fetch_timeout)),
            };
            (city.name, result)
        });
        let outcomes = join_all(fetches).await;

        let mut per_city: Vec<Vec<HourlyObservation>> = Vec::new();
        let mut warnings = Vec::new();
        for (city, outcome) in outcomes {
            match outcome {
                Ok(rows) if rows.is_empty() => {
                    tracing::warn!("No hourly data for {}, skipping", city);
                    warnings.push(CityWarning::empty(city));
                }
                Ok(rows) => per_city.push(rows),
                Err(e) => {
                    tracing::warn!("Error fetching data for {}: {}", city, e);
                    warnings.push(CityWarning::from_error(city, &e));
                }
            }
        }

        if per_city.is_empty() {
            transition(&mut phase, RunPhase::Failed);
            return Err(DashboardError::NoData { warnings });
        }

        transition(&mut phase, RunPhase::Merging);
        let observations = ObservationSet::merge(per_city);

        let Some(result) = aggregator::aggregate(observations) else {
            transition(&mut phase, RunPhase::Failed);
            return Err(DashboardError::NoData { warnings });
        };
        transition(&mut phase, RunPhase::Derived);

        tracing::info!(
            "Dashboard built: {} cities, {} records, {} warnings in {}ms ({} cached series)",
            result.summary.city_count,
            result.summary.record_count,
            warnings.len(),
            start_time.elapsed().as_millis(),
            self.cache.len().await
        );

        Ok(DashboardReport::new(lookback, result, warnings))
    }

    /// Observations of a single city for the given window, in timestamp order
    pub async fn city_series(
        &self,
        city: &str,
        lookback: LookbackWindow,
    ) -> Result<Vec<HourlyObservation>, DashboardError> {
        if self.registry.lookup(city).is_none() {
            return Err(DashboardError::UnknownCity(city.to_string()));
        }

        let report = self.build(&[city.to_string()], lookback, false).await?;
        Ok(report
            .result
            .city_series(city)
            .into_iter()
            .cloned()
            .collect())
    }

    /// Validate the caller's selection: non-empty, known cities, duplicates collapsed
    fn resolve_selection(
        &self,
        selected_cities: &[String],
    ) -> Result<Vec<&'static CityCoordinate>, DashboardError> {
        if selected_cities.is_empty() {
            return Err(DashboardError::Precondition(
                "Please select at least one city.".to_string(),
            ));
        }

        let mut cities: Vec<&'static CityCoordinate> = Vec::with_capacity(selected_cities.len());
        for name in selected_cities {
            let city = self
                .registry
                .lookup(name)
                .ok_or_else(|| DashboardError::Precondition(format!("Unknown city: {}", name)))?;
            if !cities.iter().any(|c| c.name == city.name) {
                cities.push(city);
            }
        }

        Ok(cities)
    }
}

fn transition(phase: &mut RunPhase, next: RunPhase) {
    tracing::debug!("Dashboard run {:?} -> {:?}", phase, next);
    *phase = next;
}
