//! Compass heading with a synthetic fallback.
//!
//! [`HeadingSource`] owns a driver task that asks the sensor for permission,
//! streams filtered readings while the sensor works, and falls back to a slow
//! synthetic rotation whenever it does not. Consumers watch the current value;
//! no history is kept.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::{
    fmt::Debug,
    sync::{Arc, Mutex, PoisonError},
};
use tokio::{
    sync::{mpsc, watch},
    task::JoinHandle,
    time::{Instant, MissedTickBehavior},
};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, trace, warn};

use crate::{
    clock::{Clock, SystemClock},
    config::HeadingSettings,
    direction,
    error::SensorError,
};

/// Location/compass permission as reported by the platform.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Authorization {
    Undetermined,
    Granted,
    Denied,
    Restricted,
}

/// One message from a running sensor subscription.
#[derive(Debug, Clone, PartialEq)]
pub enum SensorEvent {
    Reading { degrees: f64, at: DateTime<Utc> },
    Failed(String),
}

/// Platform compass. Implementations wrap whatever the host provides.
#[async_trait]
pub trait HeadingSensor: Send + Sync + Debug {
    fn authorization(&self) -> Authorization;

    /// Prompt for permission and wait for the answer.
    async fn request_authorization(&self) -> Authorization;

    fn heading_available(&self) -> bool;

    async fn start_updates(&self) -> Result<mpsc::Receiver<SensorEvent>, SensorError>;

    fn stop_updates(&self);
}

/// A host with no compass at all. Always leads to synthetic heading.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoSensor;

#[async_trait]
impl HeadingSensor for NoSensor {
    fn authorization(&self) -> Authorization {
        Authorization::Granted
    }

    async fn request_authorization(&self) -> Authorization {
        Authorization::Granted
    }

    fn heading_available(&self) -> bool {
        false
    }

    async fn start_updates(&self) -> Result<mpsc::Receiver<SensorEvent>, SensorError> {
        Err(SensorError("no heading sensor on this device".to_string()))
    }

    fn stop_updates(&self) {}
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HeadingState {
    Unauthorized,
    Requesting,
    Live,
    Synthetic,
    Stopped,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HeadingOrigin {
    Sensor,
    Synthetic,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HeadingUpdate {
    pub degrees: f64,
    pub at: DateTime<Utc>,
    pub origin: HeadingOrigin,
}

/// Observable compass heading.
#[derive(Debug)]
pub struct HeadingSource {
    sensor: Arc<dyn HeadingSensor>,
    settings: HeadingSettings,
    clock: Arc<dyn Clock>,
    state: Arc<watch::Sender<HeadingState>>,
    heading: Arc<watch::Sender<Option<HeadingUpdate>>>,
    running: Mutex<Option<Running>>,
}

#[derive(Debug)]
struct Running {
    cancel: CancellationToken,
    handle: JoinHandle<()>,
}

impl HeadingSource {
    pub fn new(sensor: Arc<dyn HeadingSensor>, settings: HeadingSettings) -> Self {
        Self::with_clock(sensor, settings, Arc::new(SystemClock))
    }

    pub fn with_clock(
        sensor: Arc<dyn HeadingSensor>,
        settings: HeadingSettings,
        clock: Arc<dyn Clock>,
    ) -> Self {
        let (state, _) = watch::channel(HeadingState::Unauthorized);
        let (heading, _) = watch::channel(None);
        Self {
            sensor,
            settings,
            clock,
            state: Arc::new(state),
            heading: Arc::new(heading),
            running: Mutex::new(None),
        }
    }

    pub fn state(&self) -> HeadingState {
        *self.state.borrow()
    }

    pub fn state_changes(&self) -> watch::Receiver<HeadingState> {
        self.state.subscribe()
    }

    pub fn current(&self) -> Option<HeadingUpdate> {
        *self.heading.borrow()
    }

    pub fn subscribe(&self) -> watch::Receiver<Option<HeadingUpdate>> {
        self.heading.subscribe()
    }

    /// Begin producing headings. Returns immediately; a second call while
    /// already running does nothing. Must be called within a tokio runtime.
    pub fn start(&self) {
        let mut running = self.running.lock().unwrap_or_else(PoisonError::into_inner);
        if running.as_ref().is_some_and(|r| !r.handle.is_finished()) {
            trace!("Heading source already running");
            return;
        }

        let cancel = CancellationToken::new();
        let driver = HeadingDriver {
            sensor: self.sensor.clone(),
            settings: self.settings.clone(),
            clock: self.clock.clone(),
            state: self.state.clone(),
            heading: self.heading.clone(),
            cancel: cancel.clone(),
        };
        let handle = tokio::spawn(driver.run());
        *running = Some(Running { cancel, handle });
    }

    /// Stop producing headings. Once this returns nothing else is emitted.
    pub async fn stop(&self) {
        let running = self.running.lock().unwrap_or_else(PoisonError::into_inner).take();
        if let Some(running) = running {
            running.cancel.cancel();
            if let Err(e) = running.handle.await {
                warn!("Heading driver ended abnormally: {}", e);
            }
        }
        self.sensor.stop_updates();
        self.state.send_replace(HeadingState::Stopped);
        info!("Heading source stopped");
    }
}

impl Drop for HeadingSource {
    fn drop(&mut self) {
        let running = self.running.get_mut().unwrap_or_else(PoisonError::into_inner).take();
        if let Some(running) = running {
            running.cancel.cancel();
        }
    }
}

enum LiveExit {
    Cancelled,
    Fallback,
}

struct HeadingDriver {
    sensor: Arc<dyn HeadingSensor>,
    settings: HeadingSettings,
    clock: Arc<dyn Clock>,
    state: Arc<watch::Sender<HeadingState>>,
    heading: Arc<watch::Sender<Option<HeadingUpdate>>>,
    cancel: CancellationToken,
}

impl HeadingDriver {
    async fn run(self) {
        let mut auth = self.sensor.authorization();

        if auth == Authorization::Undetermined {
            self.set_state(HeadingState::Requesting);
            auth = tokio::select! {
                _ = self.cancel.cancelled() => return,
                answer = self.sensor.request_authorization() => answer,
            };
            debug!("Heading authorization answered: {:?}", auth);
        }

        if auth == Authorization::Granted && self.sensor.heading_available() {
            let started = tokio::select! {
                _ = self.cancel.cancelled() => return,
                started = self.sensor.start_updates() => started,
            };
            match started {
                Ok(events) => {
                    self.set_state(HeadingState::Live);
                    info!("Heading sensor live");
                    if let LiveExit::Cancelled = self.run_live(events).await {
                        return;
                    }
                    self.sensor.stop_updates();
                }
                Err(e) => warn!("Could not start heading updates: {}", e),
            }
        } else {
            info!("Heading sensor unavailable ({:?}), using synthetic heading", auth);
        }

        self.set_state(HeadingState::Synthetic);
        self.run_synthetic().await;
    }

    async fn run_live(&self, mut events: mpsc::Receiver<SensorEvent>) -> LiveExit {
        let mut filter = HeadingFilter::new(self.settings.min_change_degrees);

        loop {
            let event = tokio::select! {
                biased;
                _ = self.cancel.cancelled() => return LiveExit::Cancelled,
                event = events.recv() => event,
            };

            match event {
                Some(SensorEvent::Reading { degrees, at }) => {
                    if let Some(rounded) = filter.accept(degrees, at) {
                        self.emit(rounded, at, HeadingOrigin::Sensor);
                    }
                }
                Some(SensorEvent::Failed(reason)) => {
                    warn!("Heading sensor failed, switching to synthetic: {}", reason);
                    return LiveExit::Fallback;
                }
                None => {
                    warn!("Heading sensor stream ended, switching to synthetic");
                    return LiveExit::Fallback;
                }
            }
        }
    }

    async fn run_synthetic(&self) {
        let period = self.settings.synthetic_interval();
        let step = self.settings.synthetic_step_degrees;

        let mut degrees = match *self.heading.borrow() {
            Some(last) => last.degrees.round(),
            None => 0.0,
        };
        degrees = direction::normalize(degrees);
        self.emit(degrees, self.clock.now(), HeadingOrigin::Synthetic);

        let mut ticker = tokio::time::interval_at(Instant::now() + period, period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                biased;
                _ = self.cancel.cancelled() => return,
                _ = ticker.tick() => {}
            }
            degrees = direction::normalize(degrees + step);
            self.emit(degrees, self.clock.now(), HeadingOrigin::Synthetic);
        }
    }

    fn emit(&self, degrees: f64, at: DateTime<Utc>, origin: HeadingOrigin) {
        trace!("Heading {:.0}° ({:?})", degrees, origin);
        self.heading.send_replace(Some(HeadingUpdate { degrees, at, origin }));
    }

    fn set_state(&self, state: HeadingState) {
        self.state.send_replace(state);
    }
}

/// Rounds sensor readings to whole degrees and suppresses jitter and stale callbacks.
#[derive(Debug, Clone)]
pub struct HeadingFilter {
    min_change: f64,
    last_emitted: Option<f64>,
    last_seen_at: Option<DateTime<Utc>>,
}

impl HeadingFilter {
    pub fn new(min_change_degrees: f64) -> Self {
        Self { min_change: min_change_degrees, last_emitted: None, last_seen_at: None }
    }

    /// The value to emit for this reading, if any.
    pub fn accept(&mut self, degrees: f64, at: DateTime<Utc>) -> Option<f64> {
        if !degrees.is_finite() {
            trace!("Dropping non-finite heading reading");
            return None;
        }
        if self.last_seen_at.is_some_and(|seen| at < seen) {
            trace!("Dropping out-of-order heading reading from {}", at);
            return None;
        }
        self.last_seen_at = Some(at);

        let rounded = direction::normalize(degrees.round());
        let changed = match self.last_emitted {
            None => true,
            Some(last) => direction::shortest_delta(last, rounded).abs() >= self.min_change,
        };
        if changed {
            self.last_emitted = Some(rounded);
            Some(rounded)
        } else {
            None
        }
    }
}
