// Infrastructure layer - External dependencies and adapters
pub mod config;
pub mod http_response;
pub mod open_meteo_repository;
