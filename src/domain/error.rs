// Error taxonomy for the fetch/aggregate pipeline
use serde::Serialize;
use std::time::Duration;
use thiserror::Error;

/// Failure of a single city's fetch
#[derive(Debug, Clone, Error, PartialEq)]
pub enum FetchError {
    #[error("network error: {0}")]
    Network(String),

    #[error("no response within {0:?}")]
    ScheduleTimeout(Duration),

    #[error("malformed response: {0}")]
    MalformedResponse(String),
}

impl FetchError {
    pub fn kind(&self) -> WarningKind {
        match self {
            FetchError::Network(_) => WarningKind::Network,
            FetchError::ScheduleTimeout(_) => WarningKind::Timeout,
            FetchError::MalformedResponse(_) => WarningKind::MalformedResponse,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum WarningKind {
    Network,
    Timeout,
    MalformedResponse,
    /// The provider answered but had no hourly rows for the city
    Empty,
}

/// Non-fatal, per-city annotation attached to a run
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CityWarning {
    pub city: String,
    pub kind: WarningKind,
    pub message: String,
}

impl CityWarning {
    pub fn from_error(city: &str, error: &FetchError) -> Self {
        Self {
            city: city.to_string(),
            kind: error.kind(),
            message: format!("Error fetching data for {}: {}", city, error),
        }
    }

    pub fn empty(city: &str) -> Self {
        Self {
            city: city.to_string(),
            kind: WarningKind::Empty,
            message: format!("No hourly data returned for {}", city),
        }
    }
}

/// Failure that aborts a whole dashboard run
#[derive(Debug, Clone, Error, PartialEq)]
pub enum DashboardError {
    #[error("{0}")]
    Precondition(String),

    #[error("no data fetched for any selected city")]
    NoData { warnings: Vec<CityWarning> },

    #[error("unknown city: {0}")]
    UnknownCity(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_warning_from_error() {
        let warning = CityWarning::from_error(
            "Abha",
            &FetchError::ScheduleTimeout(Duration::from_secs(10)),
        );
        assert_eq!(warning.kind, WarningKind::Timeout);
        assert!(warning.message.contains("Abha"));
        assert!(warning.message.contains("10s"));
    }

    #[test]
    fn test_error_display() {
        let err = FetchError::Network("HTTP 503".to_string());
        assert_eq!(err.to_string(), "network error: HTTP 503");

        let err = DashboardError::NoData { warnings: vec![] };
        assert!(err.to_string().contains("no data"));
    }
}
