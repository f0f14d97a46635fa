use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::Client;
use serde::Deserialize;

use crate::{
    error::WeatherError,
    model::{Coordinate, WeatherReport, WindSample},
};

use super::{WeatherProvider, fetch_body};

const DEFAULT_BASE_URL: &str = "https://api.openweathermap.org/data/2.5";

#[derive(Debug, Clone)]
pub struct OpenWeatherProvider {
    api_key: String,
    base_url: String,
    http: Client,
}

impl OpenWeatherProvider {
    pub fn new(api_key: String) -> Self {
        Self { api_key, base_url: DEFAULT_BASE_URL.to_string(), http: Client::new() }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    async fn fetch_current(&self, at: Coordinate) -> Result<WeatherReport, WeatherError> {
        let url = format!("{}/weather", self.base_url);
        let request = self.http.get(&url).query(&[
            ("lat", at.latitude.to_string()),
            ("lon", at.longitude.to_string()),
            ("appid", self.api_key.clone()),
            ("units", "metric".to_string()),
        ]);

        let body = fetch_body(request, "OpenWeather current weather").await?;
        parse_current(&body)
    }
}

#[derive(Debug, Deserialize)]
struct OwMain {
    temp: Option<f64>,
    humidity: Option<u8>,
}

#[derive(Debug, Deserialize)]
struct OwWeather {
    description: String,
}

#[derive(Debug, Deserialize)]
struct OwWind {
    speed: f64,
    deg: f64,
}

#[derive(Debug, Deserialize)]
struct OwCurrentResponse {
    #[serde(default)]
    name: Option<String>,
    dt: Option<i64>,
    main: Option<OwMain>,
    #[serde(default)]
    weather: Vec<OwWeather>,
    wind: OwWind,
}

pub(crate) fn parse_current(body: &str) -> Result<WeatherReport, WeatherError> {
    let parsed: OwCurrentResponse = serde_json::from_str(body)
        .map_err(|e| WeatherError::Parse(format!("OpenWeather current JSON: {e}")))?;

    let wind = WindSample::new(parsed.wind.speed, parsed.wind.deg)?;
    let observed_at = parsed.dt.and_then(unix_to_utc).unwrap_or_else(Utc::now);
    let description = parsed.weather.into_iter().next().map(|w| w.description);

    Ok(WeatherReport {
        provider: "openweather".to_string(),
        location_name: parsed.name.filter(|n| !n.is_empty()),
        wind,
        temperature_c: parsed.main.as_ref().and_then(|m| m.temp),
        humidity_pct: parsed.main.as_ref().and_then(|m| m.humidity),
        description,
        observed_at,
    })
}

#[async_trait]
impl WeatherProvider for OpenWeatherProvider {
    async fn current_weather(&self, at: Coordinate) -> Result<WeatherReport, WeatherError> {
        self.fetch_current(at).await
    }
}

fn unix_to_utc(ts: i64) -> Option<DateTime<Utc>> {
    DateTime::from_timestamp(ts, 0)
}
