// Application layer - Fetch, cache and aggregation use cases
pub mod aggregator;
pub mod dashboard_service;
pub mod observation_cache;
pub mod weather_repository;
