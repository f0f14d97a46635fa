use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::direction::{self, CompassPoint};
use crate::error::WeatherError;

/// A point on the globe in decimal degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinate {
    pub latitude: f64,
    pub longitude: f64,
}

impl Coordinate {
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self { latitude, longitude }
    }

    /// Cache key with both axes rounded to `precision` decimal places.
    ///
    /// Values that round to zero are written without a sign so `-0.00001` and
    /// `0.00001` share a key.
    pub fn cache_key(&self, precision: u32) -> String {
        let precision = precision.min(10);
        let lat = round_to(self.latitude, precision);
        let lon = round_to(self.longitude, precision);
        let width = precision as usize;
        format!("{lat:.width$},{lon:.width$}")
    }
}

impl fmt::Display for Coordinate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.4},{:.4}", self.latitude, self.longitude)
    }
}

fn round_to(value: f64, precision: u32) -> f64 {
    let scale = 10f64.powi(precision as i32);
    let rounded = (value * scale).round() / scale;
    if rounded == 0.0 { 0.0 } else { rounded }
}

/// Wind at a site: speed in m/s, direction in degrees the wind blows from.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WindSample {
    speed_mps: f64,
    direction_deg: f64,
}

impl WindSample {
    /// Validates speed and normalizes direction into `[0, 360)`.
    pub fn new(speed_mps: f64, direction_deg: f64) -> Result<Self, WeatherError> {
        if !speed_mps.is_finite() || speed_mps < 0.0 {
            return Err(WeatherError::Parse(format!("invalid wind speed {speed_mps}")));
        }
        if !direction_deg.is_finite() {
            return Err(WeatherError::Parse(format!("invalid wind direction {direction_deg}")));
        }
        Ok(Self { speed_mps, direction_deg: direction::normalize(direction_deg) })
    }

    /// Still air from the north, used when nothing better is known.
    pub const fn calm() -> Self {
        Self { speed_mps: 0.0, direction_deg: 0.0 }
    }

    pub fn speed_mps(&self) -> f64 {
        self.speed_mps
    }

    pub fn direction_deg(&self) -> f64 {
        self.direction_deg
    }

    pub fn compass_point(&self) -> CompassPoint {
        direction::compass_label8(self.direction_deg)
    }

    pub fn strength(&self) -> WindStrength {
        WindStrength::classify(self.speed_mps)
    }
}

/// Everything the weather provider told us about a site.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeatherReport {
    pub provider: String,
    pub location_name: Option<String>,
    pub wind: WindSample,
    pub temperature_c: Option<f64>,
    pub humidity_pct: Option<u8>,
    pub description: Option<String>,
    pub observed_at: DateTime<Utc>,
}

impl WeatherReport {
    pub fn from_wind(provider: impl Into<String>, wind: WindSample, observed_at: DateTime<Utc>) -> Self {
        Self {
            provider: provider.into(),
            location_name: None,
            wind,
            temperature_c: None,
            humidity_pct: None,
            description: None,
            observed_at,
        }
    }
}

/// Progress of an acquisition operation as shown to the display layer.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum OperationStatus {
    #[default]
    Idle,
    Loading,
    Success,
    Error(String),
}

impl OperationStatus {
    pub fn is_error(&self) -> bool {
        matches!(self, OperationStatus::Error(_))
    }
}

impl fmt::Display for OperationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OperationStatus::Idle => f.write_str("idle"),
            OperationStatus::Loading => f.write_str("loading"),
            OperationStatus::Success => f.write_str("ok"),
            OperationStatus::Error(message) => write!(f, "error: {message}"),
        }
    }
}

/// Coarse effect of wind on ball flight.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WindStrength {
    Light,
    Moderate,
    Strong,
}

impl WindStrength {
    pub fn classify(speed_mps: f64) -> Self {
        if speed_mps > 10.0 {
            WindStrength::Strong
        } else if speed_mps > 5.0 {
            WindStrength::Moderate
        } else {
            WindStrength::Light
        }
    }

    pub fn impact(&self) -> &'static str {
        match self {
            WindStrength::Light => "light wind, little effect on ball flight",
            WindStrength::Moderate => "moderate wind, expect some drift",
            WindStrength::Strong => "strong wind, ball flight heavily affected",
        }
    }
}
