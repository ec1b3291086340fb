// Aggregator - Reshapes a merged ObservationSet into the dashboard views
use crate::domain::dashboard::{
    AggregateResult, DailyAverage, Extremes, HourlyAverage, Pivot, Summary, TemperatureRange,
};
use crate::domain::observation::{HourlyObservation, ObservationSet};
use std::collections::{BTreeMap, HashSet};

/// Running sum/count used by the group-by-mean reductions
#[derive(Debug, Default, Clone, Copy)]
struct MeanAcc {
    sum: f64,
    count: usize,
}

impl MeanAcc {
    fn push(&mut self, value: f64) {
        self.sum += value;
        self.count += 1;
    }

    fn mean(&self) -> f64 {
        self.sum / self.count as f64
    }
}

/// Compute every derived view. Returns `None` for an empty set.
pub fn aggregate(observations: ObservationSet) -> Option<AggregateResult> {
    let summary = summarize(&observations)?;
    let extremes = extremes(&observations)?;

    Some(AggregateResult {
        summary,
        extremes,
        latest: latest_snapshot(&observations),
        daily_average: daily_average(&observations),
        hourly_average: hourly_average(&observations),
        temperature_ranges: temperature_ranges(&observations),
        observations,
    })
}

pub fn summarize(observations: &ObservationSet) -> Option<Summary> {
    if observations.is_empty() {
        return None;
    }

    let mut temperature = MeanAcc::default();
    let mut wind = MeanAcc::default();
    let mut max_temperature = f64::NEG_INFINITY;
    let mut min_temperature = f64::INFINITY;
    let mut cities = HashSet::new();

    for o in observations.iter() {
        temperature.push(o.temperature);
        wind.push(o.wind_speed);
        max_temperature = max_temperature.max(o.temperature);
        min_temperature = min_temperature.min(o.temperature);
        cities.insert(o.city.as_str());
    }

    Some(Summary {
        mean_temperature: temperature.mean(),
        max_temperature,
        min_temperature,
        mean_wind_speed: wind.mean(),
        city_count: cities.len(),
        record_count: observations.len(),
    })
}

/// Hottest and windiest rows. On ties the earliest row wins, which relies on
/// the set being ordered by timestamp.
pub fn extremes(observations: &ObservationSet) -> Option<Extremes> {
    let hottest = argmax_by(observations.rows(), |o| o.temperature)?;
    let windiest = argmax_by(observations.rows(), |o| o.wind_speed)?;

    Some(Extremes {
        hottest: hottest.clone(),
        windiest: windiest.clone(),
    })
}

fn argmax_by<F>(rows: &[HourlyObservation], key: F) -> Option<&HourlyObservation>
where
    F: Fn(&HourlyObservation) -> f64,
{
    let mut best: Option<&HourlyObservation> = None;
    for row in rows {
        match best {
            Some(current) if key(row) <= key(current) => {}
            _ => best = Some(row),
        }
    }
    best
}

/// Most recent row per city, ordered by city name
pub fn latest_snapshot(observations: &ObservationSet) -> Vec<HourlyObservation> {
    let mut latest: BTreeMap<&str, &HourlyObservation> = BTreeMap::new();
    for o in observations.iter() {
        latest
            .entry(o.city.as_str())
            .and_modify(|current| {
                if o.timestamp >= current.timestamp {
                    *current = o;
                }
            })
            .or_insert(o);
    }
    latest.into_values().cloned().collect()
}

pub fn daily_average(observations: &ObservationSet) -> DailyAverage {
    pivot_mean(observations, HourlyObservation::date)
}

pub fn hourly_average(observations: &ObservationSet) -> HourlyAverage {
    pivot_mean(observations, HourlyObservation::hour)
}

fn pivot_mean<K, F>(observations: &ObservationSet, column: F) -> Pivot<K>
where
    K: Ord + Clone,
    F: Fn(&HourlyObservation) -> K,
{
    let mut groups: BTreeMap<String, BTreeMap<K, MeanAcc>> = BTreeMap::new();
    for o in observations.iter() {
        groups
            .entry(o.city.clone())
            .or_default()
            .entry(column(o))
            .or_default()
            .push(o.temperature);
    }

    let cells = groups
        .into_iter()
        .map(|(city, row)| {
            let row = row.into_iter().map(|(k, acc)| (k, acc.mean())).collect();
            (city, row)
        })
        .collect();

    Pivot::new(cells)
}

/// Per-city temperature distribution (min / mean / max)
pub fn temperature_ranges(observations: &ObservationSet) -> Vec<TemperatureRange> {
    let mut groups: BTreeMap<&str, Vec<f64>> = BTreeMap::new();
    for o in observations.iter() {
        groups.entry(o.city.as_str()).or_default().push(o.temperature);
    }

    groups
        .into_iter()
        .map(|(city, temps)| {
            let min = temps.iter().copied().fold(f64::INFINITY, f64::min);
            let max = temps.iter().copied().fold(f64::NEG_INFINITY, f64::max);
            let mean = temps.iter().sum::<f64>() / temps.len() as f64;
            TemperatureRange {
                city: city.to_string(),
                min,
                mean,
                max,
                samples: temps.len(),
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::observation::fixtures::{at, obs};
    use chrono::NaiveDate;

    fn set(rows: Vec<HourlyObservation>) -> ObservationSet {
        ObservationSet::merge(vec![rows])
    }

    #[test]
    fn test_extremes_pick_hottest_and_windiest() {
        let observations = set(vec![
            obs("Riyadh", 10, 12, 41.0, 3.0),
            obs("Jeddah", 10, 12, 38.0, 9.0),
        ]);

        let extremes = extremes(&observations).unwrap();
        assert_eq!(extremes.hottest.city, "Riyadh");
        assert_eq!(extremes.hottest.temperature, 41.0);
        assert_eq!(extremes.windiest.city, "Jeddah");
        assert_eq!(extremes.windiest.wind_speed, 9.0);
    }

    #[test]
    fn test_extremes_ties_go_to_earliest() {
        let observations = set(vec![
            obs("Dammam", 10, 15, 40.0, 7.0),
            obs("Riyadh", 10, 13, 40.0, 7.0),
            obs("Abha", 10, 14, 25.0, 7.0),
        ]);

        let extremes = extremes(&observations).unwrap();
        assert_eq!(extremes.hottest.city, "Riyadh");
        assert_eq!(extremes.hottest.timestamp, at(10, 13));
        assert_eq!(extremes.windiest.timestamp, at(10, 13));
    }

    #[test]
    fn test_latest_snapshot_uses_timestamp_not_temperature() {
        let observations = set(vec![
            obs("Riyadh", 10, 14, 44.0, 2.0),
            obs("Riyadh", 10, 22, 33.0, 4.0),
            obs("Jeddah", 10, 9, 36.0, 6.0),
            obs("Jeddah", 10, 21, 31.0, 5.0),
        ]);

        let latest = latest_snapshot(&observations);
        assert_eq!(latest.len(), 2);
        assert_eq!(latest[0].city, "Jeddah");
        assert_eq!(latest[0].timestamp, at(10, 21));
        assert_eq!(latest[0].temperature, 31.0);
        assert_eq!(latest[1].city, "Riyadh");
        assert_eq!(latest[1].timestamp, at(10, 22));
        assert_eq!(latest[1].temperature, 33.0);
    }

    #[test]
    fn test_daily_average() {
        let observations = set(vec![
            obs("Abha", 10, 6, 20.0, 1.0),
            obs("Abha", 10, 15, 30.0, 1.0),
            obs("Abha", 11, 6, 18.0, 1.0),
        ]);

        let daily = daily_average(&observations);
        let day10 = NaiveDate::from_ymd_opt(2024, 7, 10).unwrap();
        let day11 = NaiveDate::from_ymd_opt(2024, 7, 11).unwrap();
        assert_eq!(daily.get("Abha", &day10), Some(25.0));
        assert_eq!(daily.get("Abha", &day11), Some(18.0));
        assert_eq!(daily.columns().len(), 2);
    }

    #[test]
    fn test_hourly_average_spans_dates() {
        let observations = set(vec![
            obs("Jeddah", 10, 6, 28.0, 1.0),
            obs("Jeddah", 11, 6, 30.0, 1.0),
            obs("Jeddah", 11, 7, 31.0, 1.0),
        ]);

        let hourly = hourly_average(&observations);
        assert_eq!(hourly.get("Jeddah", &6), Some(29.0));
        assert_eq!(hourly.get("Jeddah", &7), Some(31.0));
        assert_eq!(hourly.get("Jeddah", &8), None);
    }

    #[test]
    fn test_summary() {
        let observations = set(vec![
            obs("Riyadh", 10, 12, 40.0, 2.0),
            obs("Riyadh", 10, 13, 42.0, 4.0),
            obs("Abha", 10, 12, 20.0, 6.0),
        ]);

        let summary = summarize(&observations).unwrap();
        assert_eq!(summary.record_count, 3);
        assert_eq!(summary.city_count, 2);
        assert_eq!(summary.max_temperature, 42.0);
        assert_eq!(summary.min_temperature, 20.0);
        assert!((summary.mean_temperature - 34.0).abs() < 1e-9);
        assert!((summary.mean_wind_speed - 4.0).abs() < 1e-9);
    }

    #[test]
    fn test_temperature_ranges() {
        let observations = set(vec![
            obs("Dammam", 10, 1, 30.0, 2.0),
            obs("Dammam", 10, 2, 36.0, 2.0),
            obs("Dammam", 10, 3, 33.0, 2.0),
        ]);

        let ranges = temperature_ranges(&observations);
        assert_eq!(
            ranges,
            vec![TemperatureRange {
                city: "Dammam".to_string(),
                min: 30.0,
                mean: 33.0,
                max: 36.0,
                samples: 3,
            }]
        );
    }

    #[test]
    fn test_aggregate_empty_is_none() {
        assert!(aggregate(ObservationSet::default()).is_none());
    }

    #[test]
    fn test_aggregate_city_series() {
        let result = aggregate(ObservationSet::merge(vec![
            vec![obs("Riyadh", 10, 1, 30.0, 2.0), obs("Riyadh", 10, 2, 31.0, 3.0)],
            vec![obs("Abha", 10, 1, 19.0, 5.0)],
        ]))
        .unwrap();

        assert_eq!(result.cities(), vec!["Abha", "Riyadh"]);
        let wind: Vec<f64> = result
            .city_series("Riyadh")
            .iter()
            .map(|o| o.wind_speed)
            .collect();
        assert_eq!(wind, vec![2.0, 3.0]);
        assert!(result.city_series("Dammam").is_empty());
    }
}
