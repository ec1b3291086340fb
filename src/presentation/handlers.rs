// HTTP request handlers
use crate::domain::city::CityCoordinate;
use crate::domain::error::{CityWarning, DashboardError};
use crate::domain::observation::{HourlyObservation, LookbackWindow};
use crate::infrastructure::http_response::{accepts_brotli, json_response};
use crate::presentation::app_state::AppState;
use axum::{
    extract::{Path, Query, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

#[derive(Debug, Deserialize)]
pub struct DashboardQuery {
    /// Comma-separated city names; absent means the default selection
    pub cities: Option<String>,
    pub past_days: Option<u8>,
    pub refresh: Option<bool>,
}

#[derive(Debug, Deserialize)]
pub struct WindQuery {
    pub past_days: Option<u8>,
}

#[derive(Debug, Serialize)]
struct LookbackOption {
    past_days: u8,
    label: &'static str,
}

#[derive(Debug, Serialize)]
struct CityCatalog {
    cities: &'static [CityCoordinate],
    default_selection: Vec<String>,
    lookback_options: Vec<LookbackOption>,
    default_lookback: LookbackWindow,
}

#[derive(Debug, Serialize)]
struct CitySeriesBody<'a> {
    city: &'a str,
    lookback: LookbackWindow,
    observations: Vec<HourlyObservation>,
}

#[derive(Debug, Serialize)]
struct ErrorBody {
    error: String,
    warnings: Vec<CityWarning>,
}

/// Health check endpoint
pub async fn health_check() -> &'static str {
    "ok"
}

/// List the known cities and the selectable lookback windows
pub async fn list_cities(headers: HeaderMap, State(state): State<Arc<AppState>>) -> Response {
    let registry = state.dashboard_service.registry();
    let catalog = CityCatalog {
        cities: registry.all(),
        default_selection: registry.default_selection(),
        lookback_options: LookbackWindow::ALL
            .iter()
            .map(|w| LookbackOption {
                past_days: w.past_days(),
                label: w.label(),
            })
            .collect(),
        default_lookback: LookbackWindow::default(),
    };

    respond(StatusCode::OK, &catalog, accepts_brotli(&headers)).await
}

/// Run the pipeline once for the requested selection
pub async fn get_dashboard(
    Query(query): Query<DashboardQuery>,
    headers: HeaderMap,
    State(state): State<Arc<AppState>>,
) -> Response {
    let compress = accepts_brotli(&headers);
    let service = &state.dashboard_service;

    let selected = match query.cities.as_deref() {
        Some(raw) => parse_city_list(raw),
        None => service.registry().default_selection(),
    };

    let lookback = match parse_lookback(query.past_days) {
        Ok(lookback) => lookback,
        Err(e) => return error_response(e, compress).await,
    };

    match service
        .build(&selected, lookback, query.refresh.unwrap_or(false))
        .await
    {
        Ok(report) => respond(StatusCode::OK, &report, compress).await,
        Err(e) => error_response(e, compress).await,
    }
}

/// Wind speed and direction series for one city
pub async fn get_city_wind(
    Path(city): Path<String>,
    Query(query): Query<WindQuery>,
    headers: HeaderMap,
    State(state): State<Arc<AppState>>,
) -> Response {
    let compress = accepts_brotli(&headers);

    let lookback = match parse_lookback(query.past_days) {
        Ok(lookback) => lookback,
        Err(e) => return error_response(e, compress).await,
    };

    match state.dashboard_service.city_series(&city, lookback).await {
        Ok(observations) => {
            let body = CitySeriesBody {
                city: &city,
                lookback,
                observations,
            };
            respond(StatusCode::OK, &body, compress).await
        }
        Err(e) => error_response(e, compress).await,
    }
}

fn parse_city_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|name| !name.is_empty())
        .map(str::to_string)
        .collect()
}

fn parse_lookback(past_days: Option<u8>) -> Result<LookbackWindow, DashboardError> {
    past_days.map_or(Ok(LookbackWindow::default()), LookbackWindow::try_from)
}

async fn error_response(error: DashboardError, compress: bool) -> Response {
    let status = match &error {
        DashboardError::Precondition(_) => StatusCode::BAD_REQUEST,
        DashboardError::NoData { .. } => StatusCode::SERVICE_UNAVAILABLE,
        DashboardError::UnknownCity(_) => StatusCode::NOT_FOUND,
    };
    tracing::warn!("Dashboard request failed ({}): {}", status, error);

    let body = ErrorBody {
        error: error.to_string(),
        warnings: match error {
            DashboardError::NoData { warnings } => warnings,
            _ => Vec::new(),
        },
    };
    respond(status, &body, compress).await
}

async fn respond<T: Serialize>(status: StatusCode, data: &T, compress: bool) -> Response {
    match json_response(status, data, compress).await {
        Ok(response) => response,
        Err(status) => status.into_response(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::dashboard_service::DashboardService;
    use crate::application::observation_cache::testing::StubRepository;
    use crate::application::observation_cache::{ObservationCache, DEFAULT_TTL};
    use crate::domain::city::CityRegistry;
    use crate::domain::error::FetchError;
    use crate::domain::observation::fixtures::obs;
    use crate::presentation::router;
    use axum::body::{to_bytes, Body};
    use axum::http::Request;
    use tower::ServiceExt;

    fn app(repo: StubRepository) -> axum::Router {
        let cache = ObservationCache::new(Arc::new(repo), DEFAULT_TTL);
        let state = Arc::new(AppState {
            dashboard_service: DashboardService::new(cache, CityRegistry),
        });
        router(state)
    }

    async fn get(app: axum::Router, uri: &str) -> (StatusCode, serde_json::Value) {
        let response = app
            .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[test]
    fn test_parse_city_list() {
        assert_eq!(parse_city_list("Riyadh, Jeddah,,"), vec!["Riyadh", "Jeddah"]);
        assert!(parse_city_list("").is_empty());
    }

    #[tokio::test]
    async fn test_dashboard_ok() {
        let repo = StubRepository::default()
            .with("Riyadh", Ok(vec![obs("Riyadh", 10, 12, 41.0, 3.0)]))
            .with("Jeddah", Ok(vec![obs("Jeddah", 10, 12, 38.0, 9.0)]));

        let (status, body) = get(app(repo), "/dashboard?cities=Riyadh,Jeddah&past_days=3").await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["lookback"], 3);
        assert_eq!(body["result"]["extremes"]["hottest"]["city"], "Riyadh");
        assert_eq!(body["result"]["extremes"]["windiest"]["city"], "Jeddah");
        assert_eq!(body["result"]["summary"]["record_count"], 2);
        assert_eq!(body["result"]["daily_average"]["rows"]["Riyadh"]["2024-07-10"], 41.0);
        assert_eq!(body["result"]["hourly_average"]["columns"], serde_json::json!([12]));
        assert_eq!(body["cities"], serde_json::json!(["Jeddah", "Riyadh"]));
        assert_eq!(body["warnings"].as_array().unwrap().len(), 0);
    }

    #[tokio::test]
    async fn test_dashboard_empty_selection_is_bad_request() {
        let (status, body) = get(app(StubRepository::default()), "/dashboard?cities=").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["error"].as_str().unwrap().contains("at least one city"));
    }

    #[tokio::test]
    async fn test_dashboard_invalid_lookback_is_bad_request() {
        let (status, _) = get(app(StubRepository::default()), "/dashboard?past_days=2").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_dashboard_no_data_is_unavailable() {
        let repo = StubRepository::default()
            .with("Abha", Err(FetchError::Network("HTTP 500".to_string())));

        let (status, body) = get(app(repo), "/dashboard?cities=Abha").await;
        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(body["warnings"][0]["city"], "Abha");
        assert_eq!(body["warnings"][0]["kind"], "network");
    }

    #[tokio::test]
    async fn test_city_wind_unknown_city_is_not_found() {
        let (status, _) = get(app(StubRepository::default()), "/dashboard/wind/Tabuk").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_list_cities() {
        let (status, body) = get(app(StubRepository::default()), "/cities").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["cities"].as_array().unwrap().len(), 4);
        assert_eq!(body["default_lookback"], 1);
        assert_eq!(body["lookback_options"][2]["past_days"], 3);
    }
}
