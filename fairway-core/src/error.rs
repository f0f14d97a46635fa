//! Error types for the acquisition, dataset and selection layers.
//!
//! None of these are fatal. Each layer recovers to a safe default (synthetic
//! heading, stale wind, sample course data) and surfaces the error as a status
//! value for the display layer.

use std::{path::PathBuf, time::Duration};
use thiserror::Error;

/// Failure to obtain a weather report.
///
/// `Clone` because a single in-flight fetch hands its result to every caller
/// waiting on the same coordinate.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum WeatherError {
    #[error("weather request timed out after {0:?}")]
    Timeout(Duration),

    #[error("weather provider returned status {status}: {body}")]
    Status { status: u16, body: String },

    #[error("weather request failed: {0}")]
    Transport(String),

    #[error("malformed weather response: {0}")]
    Parse(String),
}

/// Failure to load a course dataset from one source.
#[derive(Error, Debug)]
pub enum DatasetError {
    #[error("failed to read course dataset {path}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("course dataset request to {url} failed: {reason}")]
    Http { url: String, reason: String },

    #[error("course dataset request to {url} returned status {status}")]
    Status { url: String, status: u16 },

    #[error("course dataset request to {url} timed out after {after:?}")]
    Timeout { url: String, after: Duration },

    #[error("failed to parse course dataset from {origin}")]
    Parse {
        origin: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("course dataset from {origin} contains no playable holes")]
    Empty { origin: String },
}

impl DatasetError {
    /// Transient network failures are worth another attempt at the same source.
    pub fn is_retryable(&self) -> bool {
        match self {
            DatasetError::Http { .. } | DatasetError::Timeout { .. } => true,
            DatasetError::Status { status, .. } => *status == 429 || *status >= 500,
            DatasetError::Io { .. } | DatasetError::Parse { .. } | DatasetError::Empty { .. } => false,
        }
    }
}

/// A selection that does not resolve against the loaded dataset.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SelectionError {
    #[error("unknown club '{0}'")]
    UnknownClub(String),

    #[error("club '{club}' has no course named '{course}'")]
    UnknownCourse { club: String, course: String },

    #[error("course '{course}' has no hole {number}")]
    UnknownHole { course: String, number: u32 },

    #[error("select a club first")]
    NoClub,

    #[error("select a course first")]
    NoCourse,
}

/// Heading sensor failure. Always recovered by switching to synthetic heading.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("heading sensor error: {0}")]
pub struct SensorError(pub String);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dataset_retry_classification() {
        let url = || "https://example.com/course.json".to_string();
        assert!(DatasetError::Timeout { url: url(), after: Duration::from_secs(30) }.is_retryable());
        assert!(DatasetError::Http { url: url(), reason: "reset".into() }.is_retryable());
        assert!(DatasetError::Status { url: url(), status: 503 }.is_retryable());
        assert!(!DatasetError::Status { url: url(), status: 404 }.is_retryable());
        assert!(!DatasetError::Empty { origin: url() }.is_retryable());
    }

    #[test]
    fn messages_carry_context() {
        let err = SelectionError::UnknownHole { course: "SKY".into(), number: 12 };
        assert_eq!(err.to_string(), "course 'SKY' has no hole 12");

        let err = WeatherError::Status { status: 401, body: "bad key".into() };
        assert!(err.to_string().contains("401"));
    }
}
