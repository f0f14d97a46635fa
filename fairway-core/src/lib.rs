//! Core library for the `fairway` golf indicator.
//!
//! This crate defines:
//! - Angle math and compass naming
//! - Compass heading with a synthetic fallback
//! - Wind acquisition from weather providers behind a TTL cache
//! - The club → course → hole dataset and selection
//! - The combined snapshot a display layer renders
//!
//! It is used by `fairway-cli`, but the components carry no terminal concerns
//! and can back any other front end.

pub mod acquisition;
pub mod cache;
pub mod clock;
pub mod config;
pub mod course;
pub mod dashboard;
pub mod direction;
pub mod error;
pub mod heading;
pub mod model;
pub mod provider;

pub use acquisition::{ReadingSource, WeatherAcquisition, WindReading};
pub use cache::{CacheEntry, WeatherCache};
pub use clock::{Clock, ManualClock, SystemClock};
pub use config::{Config, ProviderConfig};
pub use course::{Club, Course, CourseResolver, Dataset, Hole, Selection};
pub use dashboard::{Dashboard, DisplaySnapshot, WindView};
pub use direction::CompassPoint;
pub use error::{DatasetError, SelectionError, SensorError, WeatherError};
pub use heading::{HeadingSensor, HeadingSource, HeadingState, HeadingUpdate, NoSensor};
pub use model::{Coordinate, OperationStatus, WeatherReport, WindSample, WindStrength};
pub use provider::{ProviderId, WeatherProvider};
