// City domain model - the fixed set of monitored cities
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct CityCoordinate {
    pub name: &'static str,
    pub latitude: f64,
    pub longitude: f64,
}

impl CityCoordinate {
    const fn new(name: &'static str, latitude: f64, longitude: f64) -> Self {
        Self {
            name,
            latitude,
            longitude,
        }
    }
}

const CITIES: [CityCoordinate; 4] = [
    CityCoordinate::new("Riyadh", 24.7136, 46.6753),
    CityCoordinate::new("Jeddah", 21.4858, 39.1925),
    CityCoordinate::new("Dammam", 26.3927, 49.9777),
    CityCoordinate::new("Abha", 18.2465, 42.5117),
];

/// Static registry of the cities the dashboard knows coordinates for.
#[derive(Debug, Clone, Copy, Default)]
pub struct CityRegistry;

impl CityRegistry {
    pub fn all(&self) -> &'static [CityCoordinate] {
        &CITIES
    }

    /// Exact, case-sensitive lookup by city name
    pub fn lookup(&self, name: &str) -> Option<&'static CityCoordinate> {
        CITIES.iter().find(|c| c.name == name)
    }

    /// Cities selected when the caller does not pick any explicitly
    pub fn default_selection(&self) -> Vec<String> {
        CITIES.iter().map(|c| c.name.to_string()).collect()
    }
}
