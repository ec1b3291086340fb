// Presentation layer - HTTP surface consumed by the dashboard frontend
pub mod app_state;
pub mod handlers;

use crate::presentation::app_state::AppState;
use crate::presentation::handlers::{get_city_wind, get_dashboard, health_check, list_cities};
use axum::{routing::get, Router};
use std::sync::Arc;

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/healthz", get(health_check))
        .route("/cities", get(list_cities))
        .route("/dashboard", get(get_dashboard))
        .route("/dashboard/wind/:city", get(get_city_wind))
        .with_state(state)
}
