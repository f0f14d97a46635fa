//! What the display layer renders: heading, wind relative to heading, and the
//! selected hole, combined from the component observables.

use tokio::sync::watch;

use crate::{
    acquisition::{WeatherAcquisition, WindReading},
    config::WeatherSettings,
    course::{CourseResolver, Hole, Selection},
    direction::{self, CompassPoint},
    heading::{HeadingOrigin, HeadingSource, HeadingUpdate},
    model::{OperationStatus, WindStrength},
};

/// Eases the displayed wind direction toward each new sample.
#[derive(Debug, Clone)]
pub struct WindSmoother {
    enabled: bool,
    factor: f64,
    displayed: Option<f64>,
}

impl WindSmoother {
    pub fn new(enabled: bool, factor: f64) -> Self {
        Self { enabled, factor, displayed: None }
    }

    pub fn from_settings(settings: &WeatherSettings) -> Self {
        Self::new(settings.smoothing, settings.smoothing_factor)
    }

    /// Feed a new direction and return the one to display. The first sample,
    /// and every sample while disabled, is shown as is.
    pub fn update(&mut self, direction_deg: f64) -> f64 {
        let next = match self.displayed {
            Some(current) if self.enabled => direction::interpolate(current, direction_deg, self.factor),
            _ => direction::normalize(direction_deg),
        };
        self.displayed = Some(next);
        next
    }

    pub fn displayed(&self) -> Option<f64> {
        self.displayed
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct WindView {
    pub speed_mps: f64,
    /// Displayed direction the wind blows from, after smoothing.
    pub direction_deg: f64,
    /// Arrow rotation on a heading-up display.
    pub relative_angle: f64,
    pub label: CompassPoint,
    pub strength: WindStrength,
    /// Set when the reading is a stale or synthetic fallback.
    pub stale: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DisplaySnapshot {
    pub heading: f64,
    pub heading_origin: Option<HeadingOrigin>,
    pub wind: Option<WindView>,
    pub hole: Option<Hole>,
    pub selection: Selection,
    pub weather_status: OperationStatus,
}

#[derive(Debug)]
pub struct Dashboard {
    heading: watch::Receiver<Option<HeadingUpdate>>,
    weather: watch::Receiver<Option<WindReading>>,
    status: watch::Receiver<OperationStatus>,
    smoother: WindSmoother,
    last_reading: Option<WindReading>,
}

impl Dashboard {
    pub fn new(heading: &HeadingSource, weather: &WeatherAcquisition, settings: &WeatherSettings) -> Self {
        Self::from_receivers(
            heading.subscribe(),
            weather.latest(),
            weather.status(),
            WindSmoother::from_settings(settings),
        )
    }

    pub fn from_receivers(
        heading: watch::Receiver<Option<HeadingUpdate>>,
        weather: watch::Receiver<Option<WindReading>>,
        status: watch::Receiver<OperationStatus>,
        smoother: WindSmoother,
    ) -> Self {
        Self { heading, weather, status, smoother, last_reading: None }
    }

    pub fn snapshot(&mut self, courses: &CourseResolver) -> DisplaySnapshot {
        let heading = *self.heading.borrow_and_update();
        let reading = self.weather.borrow_and_update().clone();
        let weather_status = self.status.borrow_and_update().clone();

        let heading_deg = heading.map_or(0.0, |h| h.degrees);
        let wind = reading.map(|reading| self.wind_view(reading, heading_deg));

        DisplaySnapshot {
            heading: heading_deg,
            heading_origin: heading.map(|h| h.origin),
            wind,
            hole: courses.selected_hole(),
            selection: courses.selection(),
            weather_status,
        }
    }

    fn wind_view(&mut self, reading: WindReading, heading_deg: f64) -> WindView {
        let wind = reading.wind();
        // Smooth once per distinct reading, not once per snapshot.
        let direction_deg = match self.smoother.displayed() {
            Some(displayed) if self.last_reading.as_ref() == Some(&reading) => displayed,
            _ => self.smoother.update(wind.direction_deg()),
        };
        let stale = reading.is_degraded();
        self.last_reading = Some(reading);

        WindView {
            speed_mps: wind.speed_mps(),
            direction_deg,
            relative_angle: direction::relative_angle(direction_deg, heading_deg),
            label: direction::compass_label8(direction_deg),
            strength: wind.strength(),
            stale,
        }
    }

    /// Wait until the heading, wind or weather status changes. Returns `false`
    /// once the sources have shut down.
    pub async fn changed(&mut self) -> bool {
        tokio::select! {
            r = self.heading.changed() => r.is_ok(),
            r = self.weather.changed() => r.is_ok(),
            r = self.status.changed() => r.is_ok(),
        }
    }
}
