use async_trait::async_trait;
use chrono::Utc;
use fairway_core::{
    SensorError,
    heading::{Authorization, HeadingSensor, SensorEvent},
};
use std::sync::{Mutex, PoisonError};
use tokio::sync::mpsc;

/// A compass that always reads the heading given on the command line.
#[derive(Debug)]
pub struct FixedHeading {
    degrees: f64,
    // Held so the stream stays open until `stop_updates`.
    events: Mutex<Option<mpsc::Sender<SensorEvent>>>,
}

impl FixedHeading {
    pub fn new(degrees: f64) -> Self {
        Self { degrees, events: Mutex::new(None) }
    }
}

#[async_trait]
impl HeadingSensor for FixedHeading {
    fn authorization(&self) -> Authorization {
        Authorization::Granted
    }

    async fn request_authorization(&self) -> Authorization {
        Authorization::Granted
    }

    fn heading_available(&self) -> bool {
        true
    }

    async fn start_updates(&self) -> Result<mpsc::Receiver<SensorEvent>, SensorError> {
        let (tx, rx) = mpsc::channel(1);
        tx.send(SensorEvent::Reading { degrees: self.degrees, at: Utc::now() })
            .await
            .map_err(|e| SensorError(e.to_string()))?;
        *self.events.lock().unwrap_or_else(PoisonError::into_inner) = Some(tx);
        Ok(rx)
    }

    fn stop_updates(&self) {
        self.events.lock().unwrap_or_else(PoisonError::into_inner).take();
    }
}
