use std::{
    fmt,
    sync::{Arc, Mutex, PoisonError, RwLock},
    time::Duration,
};
use tokio::sync::watch;
use tracing::{debug, info, warn};

use super::{
    model::{Club, Course, Dataset, Hole},
    source::{DatasetSource, source_from_location},
};
use crate::{
    config::DatasetSettings,
    error::{DatasetError, SelectionError},
    model::{Coordinate, OperationStatus},
};

/// The user's position in the club → course → hole hierarchy.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Selection {
    pub club: Option<String>,
    pub course: Option<String>,
    pub hole: Option<u32>,
}

impl Selection {
    /// Choosing a different club clears course and hole.
    pub fn set_club(&mut self, club: &str) {
        if self.club.as_deref() != Some(club) {
            self.club = Some(club.to_string());
            self.course = None;
            self.hole = None;
        }
    }

    /// Choosing a different course clears the hole.
    pub fn set_course(&mut self, course: &str) {
        if self.course.as_deref() != Some(course) {
            self.course = Some(course.to_string());
            self.hole = None;
        }
    }

    pub fn set_hole(&mut self, number: u32) {
        self.hole = Some(number);
    }

    /// Drop levels that no longer resolve against `dataset`.
    fn prune(&mut self, dataset: &Dataset) {
        let Some(club) = self.club.as_deref().and_then(|name| dataset.club(name)) else {
            *self = Selection::default();
            return;
        };
        let Some(course) = self.course.as_deref().and_then(|name| club.course(name)) else {
            self.course = None;
            self.hole = None;
            return;
        };
        if self.hole.is_some_and(|n| course.hole_by_number(n).is_none()) {
            self.hole = None;
        }
    }
}

impl fmt::Display for Selection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let club = self.club.as_deref().unwrap_or("-");
        let course = self.course.as_deref().unwrap_or("-");
        match self.hole {
            Some(n) => write!(f, "{club} / {course} / #{n}"),
            None => write!(f, "{club} / {course} / -"),
        }
    }
}

/// Where the currently installed dataset came from.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum DatasetOrigin {
    #[default]
    NotLoaded,
    Primary(String),
    Mirror(String),
    Sample,
}

impl DatasetOrigin {
    pub fn is_sample(&self) -> bool {
        matches!(self, DatasetOrigin::Sample)
    }
}

/// Outcome of one `load()`.
#[derive(Debug, Clone, PartialEq)]
pub struct LoadReport {
    pub origin: DatasetOrigin,
    /// Skipped records and source failures, in the order they occurred.
    pub warnings: Vec<String>,
}

/// Loads the course dataset and tracks the selection within it.
#[derive(Debug)]
pub struct CourseResolver {
    primary: Option<Arc<dyn DatasetSource>>,
    mirrors: Vec<Arc<dyn DatasetSource>>,
    attempts_per_source: u32,
    retry_backoff: Duration,
    dataset: RwLock<Arc<Dataset>>,
    origin: RwLock<DatasetOrigin>,
    selection: Mutex<Selection>,
    status: watch::Sender<OperationStatus>,
}

impl CourseResolver {
    pub fn new(
        primary: Option<Arc<dyn DatasetSource>>,
        mirrors: Vec<Arc<dyn DatasetSource>>,
        settings: &DatasetSettings,
    ) -> Self {
        Self {
            primary,
            mirrors,
            attempts_per_source: settings.attempts_per_source.max(1),
            retry_backoff: settings.retry_backoff(),
            dataset: RwLock::new(Arc::new(Dataset::default())),
            origin: RwLock::new(DatasetOrigin::NotLoaded),
            selection: Mutex::new(Selection::default()),
            status: watch::Sender::new(OperationStatus::Idle),
        }
    }

    /// Sources taken from `settings.primary` and `settings.mirrors`.
    pub fn from_settings(settings: &DatasetSettings) -> Self {
        let timeout = settings.request_timeout();
        let primary = settings.primary.as_deref().map(|loc| source_from_location(loc, timeout));
        let mirrors =
            settings.mirrors.iter().map(|loc| source_from_location(loc, timeout)).collect();
        Self::new(primary, mirrors, settings)
    }

    /// Replace the configured primary source.
    pub fn with_primary(mut self, primary: Arc<dyn DatasetSource>) -> Self {
        self.primary = Some(primary);
        self
    }

    pub fn status(&self) -> watch::Receiver<OperationStatus> {
        self.status.subscribe()
    }

    pub fn dataset(&self) -> Arc<Dataset> {
        Arc::clone(&self.dataset.read().unwrap_or_else(PoisonError::into_inner))
    }

    pub fn origin(&self) -> DatasetOrigin {
        self.origin.read().unwrap_or_else(PoisonError::into_inner).clone()
    }

    /// Load the dataset: the primary source, then each mirror in order, then
    /// the built-in sample. Always leaves a dataset installed.
    pub async fn load(&self) -> LoadReport {
        self.status.send_replace(OperationStatus::Loading);
        let mut warnings = Vec::new();

        let candidates = self
            .primary
            .iter()
            .map(|s| (s, true))
            .chain(self.mirrors.iter().map(|s| (s, false)));

        for (source, is_primary) in candidates {
            let name = source.describe();
            match self.fetch_with_retry(source.as_ref()).await {
                Ok((dataset, skipped)) => {
                    info!(
                        "loaded {} clubs from {name}{}",
                        dataset.clubs().len(),
                        if is_primary { "" } else { " (mirror)" }
                    );
                    warnings.extend(skipped);
                    let origin = if is_primary {
                        DatasetOrigin::Primary(name)
                    } else {
                        DatasetOrigin::Mirror(name)
                    };
                    self.install(dataset, origin.clone());
                    self.status.send_replace(OperationStatus::Success);
                    return LoadReport { origin, warnings };
                }
                Err(e) => {
                    warn!("course dataset source {name} failed: {e}");
                    warnings.push(format!("{name}: {e}"));
                }
            }
        }

        let message = if warnings.is_empty() {
            "no course dataset source configured, using sample data".to_string()
        } else {
            "all course dataset sources failed, using sample data".to_string()
        };
        warn!("{message}");
        warnings.push(message.clone());

        self.install(Dataset::sample(), DatasetOrigin::Sample);
        self.status.send_replace(OperationStatus::Error(message));
        LoadReport { origin: DatasetOrigin::Sample, warnings }
    }

    async fn fetch_with_retry(
        &self,
        source: &dyn DatasetSource,
    ) -> Result<(Dataset, Vec<String>), DatasetError> {
        let name = source.describe();
        let mut attempt = 1;
        loop {
            let result = match source.fetch().await {
                Ok(body) => Dataset::from_json(&body, &name),
                Err(e) => Err(e),
            };

            match result {
                Ok(loaded) => return Ok(loaded),
                Err(e) if e.is_retryable() && attempt < self.attempts_per_source => {
                    let backoff = self.retry_backoff.saturating_mul(1 << (attempt - 1).min(16));
                    debug!("{name}: attempt {attempt} failed ({e}), retrying in {backoff:?}");
                    tokio::time::sleep(backoff).await;
                    attempt += 1;
                }
                Err(e) => return Err(e),
            }
        }
    }

    /// Swap in `dataset` and prune the selection under one selection lock, so a
    /// concurrent `select_*` sees either the old pair or the new one.
    fn install(&self, dataset: Dataset, origin: DatasetOrigin) {
        let mut selection = self.selection.lock().unwrap_or_else(PoisonError::into_inner);
        selection.prune(&dataset);
        *self.dataset.write().unwrap_or_else(PoisonError::into_inner) = Arc::new(dataset);
        *self.origin.write().unwrap_or_else(PoisonError::into_inner) = origin;
    }

    pub fn clubs(&self) -> Vec<Club> {
        self.dataset().clubs().to_vec()
    }

    pub fn courses_of(&self, club: &str) -> Vec<Course> {
        self.dataset().courses_of(club).to_vec()
    }

    pub fn holes_of(&self, club: &str, course: &str) -> Vec<Hole> {
        self.dataset().holes_of(club, course).to_vec()
    }

    pub fn selection(&self) -> Selection {
        self.selection.lock().unwrap_or_else(PoisonError::into_inner).clone()
    }

    // Each select takes the selection lock before reading the dataset, the same
    // order as `install`.
    pub fn select_club(&self, name: &str) -> Result<(), SelectionError> {
        let mut selection = self.selection.lock().unwrap_or_else(PoisonError::into_inner);
        if self.dataset().club(name).is_none() {
            return Err(SelectionError::UnknownClub(name.to_string()));
        }
        selection.set_club(name);
        debug!("selected club {name}");
        Ok(())
    }

    pub fn select_course(&self, name: &str) -> Result<(), SelectionError> {
        let mut selection = self.selection.lock().unwrap_or_else(PoisonError::into_inner);
        let dataset = self.dataset();
        let club = selection.club.as_deref().ok_or(SelectionError::NoClub)?;
        if dataset.club(club).and_then(|c| c.course(name)).is_none() {
            return Err(SelectionError::UnknownCourse {
                club: club.to_string(),
                course: name.to_string(),
            });
        }
        selection.set_course(name);
        debug!("selected course {name}");
        Ok(())
    }

    pub fn select_hole(&self, number: u32) -> Result<(), SelectionError> {
        let mut selection = self.selection.lock().unwrap_or_else(PoisonError::into_inner);
        let dataset = self.dataset();
        let club = selection.club.as_deref().ok_or(SelectionError::NoClub)?;
        let course = selection.course.as_deref().ok_or(SelectionError::NoCourse)?;
        if dataset.hole_by_number(club, course, number).is_none() {
            return Err(SelectionError::UnknownHole { course: course.to_string(), number });
        }
        selection.set_hole(number);
        Ok(())
    }

    pub fn selected_club(&self) -> Option<Club> {
        let selection = self.selection.lock().unwrap_or_else(PoisonError::into_inner);
        self.dataset().club(selection.club.as_deref()?).cloned()
    }

    pub fn selected_hole(&self) -> Option<Hole> {
        let selection = self.selection.lock().unwrap_or_else(PoisonError::into_inner);
        let (club, course, hole) =
            (selection.club.as_deref()?, selection.course.as_deref()?, selection.hole?);
        self.dataset().hole_by_number(club, course, hole).cloned()
    }

    /// Location of the selected club, used as the weather query point.
    pub fn selected_location(&self) -> Option<Coordinate> {
        self.selected_club().map(|c| c.location)
    }
}
