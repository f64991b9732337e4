//! Live temperature lookup.
//!
//! The weather collaborator talks to the Open-Meteo forecast endpoint (no API
//! key). Every failure (transport, timeout, non-2xx status, malformed JSON) is
//! logged and normalised to `None`; callers never see an error.

use std::time::Duration;

use anyhow::{anyhow, Context, Result};
use serde::Deserialize;
use url::Url;

pub const DEFAULT_WEATHER_URL: &str = "https://api.open-meteo.com/v1/forecast";
pub const DEFAULT_WEATHER_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Coordinates {
    pub latitude: f64,
    pub longitude: f64,
}

impl Coordinates {
    pub fn new(latitude: f64, longitude: f64) -> Result<Self> {
        if !(-90.0..=90.0).contains(&latitude) {
            return Err(anyhow!("latitude {} out of range", latitude));
        }
        if !(-180.0..=180.0).contains(&longitude) {
            return Err(anyhow!("longitude {} out of range", longitude));
        }
        Ok(Self {
            latitude,
            longitude,
        })
    }
}

/// Fallback coordinates for users without GPS.
pub const CITY_COORDS: &[(&str, f64, f64)] = &[
    ("Warszawa", 52.23, 21.01),
    ("Kraków", 50.06, 19.94),
    ("Poznań", 52.41, 16.92),
    ("Wrocław", 51.11, 17.03),
    ("Lublin", 51.25, 22.57),
    ("Białystok", 53.13, 23.16),
    ("Łódź", 51.75, 19.46),
];

#[derive(Clone, Debug, PartialEq)]
pub struct Location {
    pub name: String,
    pub coordinates: Coordinates,
}

pub fn city_coordinates(city: &str) -> Option<Location> {
    let wanted = city.trim().to_lowercase();
    CITY_COORDS
        .iter()
        .find(|(name, _, _)| name.to_lowercase() == wanted)
        .map(|&(name, latitude, longitude)| Location {
            name: name.to_string(),
            coordinates: Coordinates {
                latitude,
                longitude,
            },
        })
}

/// GPS coordinates win; otherwise the named city from `CITY_COORDS`.
pub fn resolve_location(gps: Option<Coordinates>, city: &str) -> Result<Location> {
    if let Some(coordinates) = gps {
        return Ok(Location {
            name: "Your location (GPS)".to_string(),
            coordinates,
        });
    }
    city_coordinates(city).ok_or_else(|| {
        let known: Vec<&str> = CITY_COORDS.iter().map(|(name, _, _)| *name).collect();
        anyhow!("unknown city '{}'; expected one of: {}", city, known.join(", "))
    })
}

/// Source of the current temperature. `None` means unavailable.
pub trait WeatherSource {
    fn current_temperature(&self, at: Coordinates) -> Option<f64>;
}

/// A source that never answers, for offline runs.
#[derive(Clone, Copy, Debug, Default)]
pub struct Offline;

impl WeatherSource for Offline {
    fn current_temperature(&self, _at: Coordinates) -> Option<f64> {
        None
    }
}

#[derive(Debug, Deserialize)]
struct ForecastResponse {
    current_weather: CurrentWeather,
}

#[derive(Debug, Deserialize)]
struct CurrentWeather {
    temperature: f64,
}

/// Extract `current_weather.temperature` from an Open-Meteo response body.
pub fn parse_current_temperature(body: &str) -> Option<f64> {
    match serde_json::from_str::<ForecastResponse>(body) {
        Ok(parsed) if parsed.current_weather.temperature.is_finite() => {
            Some(parsed.current_weather.temperature)
        }
        Ok(_) => {
            log::warn!("weather response carried a non-finite temperature");
            None
        }
        Err(e) => {
            log::warn!("malformed weather response: {}", e);
            None
        }
    }
}

#[derive(Clone, Debug)]
pub struct OpenMeteoConfig {
    pub base_url: String,
    pub timeout: Duration,
}

impl Default for OpenMeteoConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_WEATHER_URL.to_string(),
            timeout: DEFAULT_WEATHER_TIMEOUT,
        }
    }
}

/// Blocking Open-Meteo client.
pub struct OpenMeteoClient {
    base_url: Url,
    agent: ureq::Agent,
}

impl OpenMeteoClient {
    pub fn new(config: OpenMeteoConfig) -> Result<Self> {
        let base_url = Url::parse(&config.base_url).context("parse weather url")?;
        match base_url.scheme() {
            "http" | "https" => {}
            other => {
                return Err(anyhow!(
                    "unsupported weather url scheme '{}'; expected http(s)",
                    other
                ))
            }
        }
        let agent = ureq::AgentBuilder::new().timeout(config.timeout).build();
        Ok(Self { base_url, agent })
    }

    pub fn request_url(&self, at: Coordinates) -> Url {
        let mut url = self.base_url.clone();
        url.query_pairs_mut()
            .append_pair("latitude", &at.latitude.to_string())
            .append_pair("longitude", &at.longitude.to_string())
            .append_pair("current_weather", "true");
        url
    }

    fn fetch(&self, at: Coordinates) -> Result<String> {
        let url = self.request_url(at);
        let response = self
            .agent
            .get(url.as_str())
            .call()
            .with_context(|| format!("GET {}", url))?;
        response.into_string().context("read weather response body")
    }
}

impl WeatherSource for OpenMeteoClient {
    fn current_temperature(&self, at: Coordinates) -> Option<f64> {
        match self.fetch(at) {
            Ok(body) => parse_current_temperature(&body),
            Err(e) => {
                log::warn!("weather lookup failed: {:#}", e);
                None
            }
        }
    }
}
