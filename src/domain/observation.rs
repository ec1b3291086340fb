// Observation domain models
use crate::domain::error::DashboardError;
use chrono::{DateTime, FixedOffset, NaiveDate, Timelike};
use serde::Serialize;

/// How many past days of history are requested alongside today's forecast.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
#[serde(into = "u8")]
pub enum LookbackWindow {
    Today,
    #[default]
    TodayAndYesterday,
    LastThreeDays,
}

impl LookbackWindow {
    pub const ALL: [LookbackWindow; 3] = [
        LookbackWindow::Today,
        LookbackWindow::TodayAndYesterday,
        LookbackWindow::LastThreeDays,
    ];

    pub fn past_days(self) -> u8 {
        match self {
            LookbackWindow::Today => 0,
            LookbackWindow::TodayAndYesterday => 1,
            LookbackWindow::LastThreeDays => 3,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            LookbackWindow::Today => "Today only (0 past days)",
            LookbackWindow::TodayAndYesterday => "Today + Yesterday (1 past day)",
            LookbackWindow::LastThreeDays => "Last 3 days (3 past days)",
        }
    }
}

impl From<LookbackWindow> for u8 {
    fn from(window: LookbackWindow) -> Self {
        window.past_days()
    }
}

impl TryFrom<u8> for LookbackWindow {
    type Error = DashboardError;

    fn try_from(days: u8) -> Result<Self, Self::Error> {
        match days {
            0 => Ok(LookbackWindow::Today),
            1 => Ok(LookbackWindow::TodayAndYesterday),
            3 => Ok(LookbackWindow::LastThreeDays),
            other => Err(DashboardError::Precondition(format!(
                "past_days must be one of 0, 1 or 3 (got {})",
                other
            ))),
        }
    }
}

/// One hour of weather for one city.
///
/// `timestamp` carries the provider-reported UTC offset of the city, so
/// calendar fields derived from it are in the city's local time.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HourlyObservation {
    pub city: String,
    pub timestamp: DateTime<FixedOffset>,
    pub temperature: f64,
    pub wind_speed: f64,
    pub wind_direction: f64,
}

impl HourlyObservation {
    pub fn new(
        city: impl Into<String>,
        timestamp: DateTime<FixedOffset>,
        temperature: f64,
        wind_speed: f64,
        wind_direction: f64,
    ) -> Self {
        Self {
            city: city.into(),
            timestamp,
            temperature,
            wind_speed,
            wind_direction,
        }
    }

    pub fn date(&self) -> NaiveDate {
        self.timestamp.date_naive()
    }

    pub fn hour(&self) -> u32 {
        self.timestamp.hour()
    }
}

/// All selected cities' observations, ordered by timestamp then city name.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(transparent)]
pub struct ObservationSet {
    rows: Vec<HourlyObservation>,
}

impl ObservationSet {
    pub fn merge(per_city: impl IntoIterator<Item = Vec<HourlyObservation>>) -> Self {
        let mut rows: Vec<HourlyObservation> = per_city.into_iter().flatten().collect();
        rows.sort_by(|a, b| {
            a.timestamp
                .cmp(&b.timestamp)
                .then_with(|| a.city.cmp(&b.city))
        });
        Self { rows }
    }

    pub fn rows(&self) -> &[HourlyObservation] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, HourlyObservation> {
        self.rows.iter()
    }
}
