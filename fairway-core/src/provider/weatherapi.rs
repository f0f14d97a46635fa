use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::Client;
use serde::Deserialize;

use crate::{
    error::WeatherError,
    model::{Coordinate, WeatherReport, WindSample},
};

use super::{WeatherProvider, fetch_body};

const DEFAULT_BASE_URL: &str = "http://api.weatherapi.com/v1";

#[derive(Debug, Clone)]
pub struct WeatherApiProvider {
    api_key: String,
    base_url: String,
    http: Client,
}

impl WeatherApiProvider {
    pub fn new(api_key: String) -> Self {
        Self { api_key, base_url: DEFAULT_BASE_URL.to_string(), http: Client::new() }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    async fn fetch_current(&self, at: Coordinate) -> Result<WeatherReport, WeatherError> {
        let url = format!("{}/current.json", self.base_url);
        let q = format!("{},{}", at.latitude, at.longitude);
        let request =
            self.http.get(&url).query(&[("key", self.api_key.as_str()), ("q", q.as_str())]);

        let body = fetch_body(request, "WeatherAPI.com current").await?;
        parse_current(&body)
    }
}

#[derive(Debug, Deserialize)]
struct WaLocation {
    name: String,
    country: String,
    localtime_epoch: Option<i64>,
}

#[derive(Debug, Deserialize)]
struct WaCondition {
    text: String,
}

#[derive(Debug, Deserialize)]
struct WaCurrent {
    temp_c: Option<f64>,
    humidity: Option<u8>,
    wind_kph: f64,
    wind_degree: f64,
    condition: Option<WaCondition>,
    last_updated_epoch: Option<i64>,
}

#[derive(Debug, Deserialize)]
struct WaResponse {
    location: Option<WaLocation>,
    current: WaCurrent,
}

pub(crate) fn parse_current(body: &str) -> Result<WeatherReport, WeatherError> {
    let parsed: WaResponse = serde_json::from_str(body)
        .map_err(|e| WeatherError::Parse(format!("WeatherAPI current JSON: {e}")))?;

    let ts = parsed
        .current
        .last_updated_epoch
        .or(parsed.location.as_ref().and_then(|l| l.localtime_epoch));
    let observed_at = ts.and_then(unix_to_utc).unwrap_or_else(Utc::now);

    let location_name = parsed.location.map(|l| format!("{}, {}", l.name, l.country));
    let wind = WindSample::new(parsed.current.wind_kph / 3.6, parsed.current.wind_degree)?;

    Ok(WeatherReport {
        provider: "weatherapi".to_string(),
        location_name,
        wind,
        temperature_c: parsed.current.temp_c,
        humidity_pct: parsed.current.humidity,
        description: parsed.current.condition.map(|c| c.text),
        observed_at,
    })
}

#[async_trait]
impl WeatherProvider for WeatherApiProvider {
    async fn current_weather(&self, at: Coordinate) -> Result<WeatherReport, WeatherError> {
        self.fetch_current(at).await
    }
}

fn unix_to_utc(ts: i64) -> Option<DateTime<Utc>> {
    DateTime::from_timestamp(ts, 0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn converts_kph_to_mps() {
        let body = r#"{
            "location": {"name": "Buyeo", "country": "South Korea", "localtime_epoch": 1760400100},
            "current": {
                "temp_c": 17.0, "humidity": 60, "wind_kph": 18.0, "wind_degree": 200,
                "condition": {"text": "Partly cloudy"}, "last_updated_epoch": 1760400000
            }
        }"#;

        let report = parse_current(body).expect("sample parses");
        assert!((report.wind.speed_mps() - 5.0).abs() < 1e-9);
        assert_eq!(report.wind.direction_deg(), 200.0);
        assert_eq!(report.location_name.as_deref(), Some("Buyeo, South Korea"));
        assert_eq!(report.description.as_deref(), Some("Partly cloudy"));
        assert_eq!(report.observed_at.timestamp(), 1_760_400_000);
    }

    #[test]
    fn falls_back_to_location_time() {
        let body = r#"{
            "location": {"name": "X", "country": "Y", "localtime_epoch": 1760400100},
            "current": {"wind_kph": 0.0, "wind_degree": 0}
        }"#;
        let report = parse_current(body).expect("minimal body parses");
        assert_eq!(report.observed_at.timestamp(), 1_760_400_100);
        assert_eq!(report.temperature_c, None);
    }

    #[test]
    fn missing_wind_is_malformed() {
        let err = parse_current(r#"{"current": {"temp_c": 3.0}}"#).unwrap_err();
        assert!(matches!(err, WeatherError::Parse(_)));
    }
}
