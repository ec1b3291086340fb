// Repository trait for hourly weather data access
use crate::domain::error::FetchError;
use crate::domain::observation::{HourlyObservation, LookbackWindow};
use async_trait::async_trait;

#[async_trait]
pub trait WeatherRepository: Send + Sync {
    /// Fetch hourly observations for one location, from `lookback` past days
    /// through the end of today, in the location's local timezone.
    ///
    /// An empty vector means the provider had no hourly series for the city.
    async fn fetch_hourly(
        &self,
        city: &str,
        latitude: f64,
        longitude: f64,
        lookback: LookbackWindow,
    ) -> Result<Vec<HourlyObservation>, FetchError>;
}
