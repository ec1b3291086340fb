// Dashboard domain model - derived views handed to the rendering layer
use super::error::CityWarning;
use super::observation::{HourlyObservation, LookbackWindow, ObservationSet};
use chrono::{DateTime, NaiveDate, Utc};
use serde::ser::{SerializeStruct, Serializer};
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Summary {
    pub mean_temperature: f64,
    pub max_temperature: f64,
    pub min_temperature: f64,
    pub mean_wind_speed: f64,
    pub city_count: usize,
    pub record_count: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Extremes {
    pub hottest: HourlyObservation,
    pub windiest: HourlyObservation,
}

/// City x column mapping of mean temperatures.
///
/// Serialized as `{"columns": [...], "rows": {city: {column: mean}}}` so a
/// heatmap can lay out its axis without scanning every row.
#[derive(Debug, Clone, PartialEq)]
pub struct Pivot<K: Ord> {
    cells: BTreeMap<String, BTreeMap<K, f64>>,
}

pub type DailyAverage = Pivot<NaiveDate>;
pub type HourlyAverage = Pivot<u32>;

impl<K: Ord + Clone> Pivot<K> {
    pub fn new(cells: BTreeMap<String, BTreeMap<K, f64>>) -> Self {
        Self { cells }
    }

    #[cfg(test)]
    pub fn get(&self, city: &str, column: &K) -> Option<f64> {
        self.cells.get(city).and_then(|row| row.get(column)).copied()
    }

    /// Union of every column present in any row, sorted
    pub fn columns(&self) -> BTreeSet<K> {
        self.cells
            .values()
            .flat_map(|row| row.keys().cloned())
            .collect()
    }
}

impl<K: Ord + Clone + Serialize> Serialize for Pivot<K> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut state = serializer.serialize_struct("Pivot", 2)?;
        state.serialize_field("columns", &self.columns())?;
        state.serialize_field("rows", &self.cells)?;
        state.end()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TemperatureRange {
    pub city: String,
    pub min: f64,
    pub mean: f64,
    pub max: f64,
    pub samples: usize,
}

/// Immutable output of one successful pipeline run
#[derive(Debug, Clone, Serialize)]
pub struct AggregateResult {
    pub observations: ObservationSet,
    pub summary: Summary,
    pub extremes: Extremes,
    pub latest: Vec<HourlyObservation>,
    pub daily_average: DailyAverage,
    pub hourly_average: HourlyAverage,
    pub temperature_ranges: Vec<TemperatureRange>,
}

impl AggregateResult {
    /// Distinct cities in the set, sorted by name
    pub fn cities(&self) -> Vec<&str> {
        self.observations
            .iter()
            .map(|o| o.city.as_str())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }

    /// Rows of a single city in timestamp order (wind-rose input)
    pub fn city_series(&self, city: &str) -> Vec<&HourlyObservation> {
        self.observations.iter().filter(|o| o.city == city).collect()
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct DashboardReport {
    pub lookback: LookbackWindow,
    pub generated_at: DateTime<Utc>,
    /// Cities present in the result, offered by the wind-rose picker
    pub cities: Vec<String>,
    pub result: AggregateResult,
    pub warnings: Vec<CityWarning>,
}

impl DashboardReport {
    pub fn new(
        lookback: LookbackWindow,
        result: AggregateResult,
        warnings: Vec<CityWarning>,
    ) -> Self {
        let cities = result.cities().into_iter().map(str::to_string).collect();
        Self {
            lookback,
            generated_at: Utc::now(),
            cities,
            result,
            warnings,
        }
    }
}
