use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use fairway_core::{
    Config, Coordinate, CourseResolver, Dashboard, HeadingSensor, HeadingSource, NoSensor,
    OperationStatus, ProviderId, WeatherAcquisition, WindReading,
    config::WeatherSettings,
    course::EmbeddedSource,
    dashboard::WindSmoother,
    provider::default_provider_from_config,
};
use inquire::Password;
use std::sync::Arc;
use tokio::sync::watch;
use tracing::debug;

use crate::{render, sensor::FixedHeading};

const BUNDLED_DATASET: &str = include_str!("../data/course.json");

/// Top-level CLI struct.
#[derive(Debug, Parser)]
#[command(name = "fairway", version, about = "Wind and hole info for the course you are on")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Configure credentials for a specific provider.
    Configure {
        /// Provider short name, e.g. "openweather" or "weatherapi".
        provider: String,

        /// Also make this the default provider.
        #[arg(long)]
        default: bool,
    },

    /// List clubs, courses and holes.
    Courses,

    /// Print wind and hole info once.
    Show(HoleArgs),

    /// Keep printing wind and hole info as it changes, until Ctrl-C.
    Watch(HoleArgs),
}

#[derive(Debug, Args)]
pub struct HoleArgs {
    /// Club name; defaults to the first club.
    #[arg(long)]
    club: Option<String>,

    /// Course name; defaults to the club's first course.
    #[arg(long)]
    course: Option<String>,

    /// Hole number; defaults to the course's first hole.
    #[arg(long)]
    hole: Option<u32>,

    /// Direction you are facing in degrees. Without it the heading is simulated.
    #[arg(long, allow_negative_numbers = true)]
    heading: Option<f64>,
}

impl Cli {
    pub async fn run(self) -> Result<()> {
        match self.command {
            Command::Configure { provider, default } => configure(&provider, default),
            Command::Courses => {
                let config = Config::load()?;
                let courses = load_courses(&config).await;
                render::print_courses(&courses.dataset(), &courses.origin());
                Ok(())
            }
            Command::Show(args) => show(&args).await,
            Command::Watch(args) => watch(&args).await,
        }
    }
}

fn configure(provider: &str, make_default: bool) -> Result<()> {
    let id = ProviderId::try_from(provider)?;
    let mut config = Config::load()?;

    let prompt = if config.is_provider_configured(id) {
        format!("New API key for {id}:")
    } else {
        format!("API key for {id}:")
    };
    let api_key = Password::new(&prompt)
        .without_confirmation()
        .prompt()
        .context("Failed to read API key")?;
    let api_key = api_key.trim();
    if api_key.is_empty() {
        anyhow::bail!("API key must not be empty");
    }

    config.upsert_provider_api_key(id, api_key.to_string());
    if make_default {
        config.set_default_provider(id);
    }
    config.save()?;

    println!("Saved {id} credentials to {}", Config::config_file_path()?.display());
    Ok(())
}

async fn load_courses(config: &Config) -> CourseResolver {
    let mut courses = CourseResolver::from_settings(&config.dataset);
    if config.dataset.primary.is_none() {
        courses = courses.with_primary(Arc::new(EmbeddedSource::new("bundled course.json", BUNDLED_DATASET)));
    }

    let report = courses.load().await;
    if report.origin.is_sample() {
        eprintln!("Could not load course data, showing the built-in sample instead.");
    }
    courses
}

/// Select the requested hole, filling unspecified levels with the first entry.
fn select(courses: &CourseResolver, args: &HoleArgs) -> Result<()> {
    let dataset = courses.dataset();

    let club = match &args.club {
        Some(name) => name.clone(),
        None => dataset.clubs().first().map(|c| c.name.clone()).context("No clubs available")?,
    };
    courses.select_club(&club)?;

    let course = match &args.course {
        Some(name) => name.clone(),
        None => dataset
            .courses_of(&club)
            .first()
            .map(|c| c.name.clone())
            .with_context(|| format!("Club '{club}' has no courses"))?,
    };
    courses.select_course(&course)?;

    let hole = match args.hole {
        Some(number) => number,
        None => dataset
            .holes_of(&club, &course)
            .first()
            .map(|h| h.number)
            .with_context(|| format!("Course '{course}' has no holes"))?,
    };
    courses.select_hole(hole)?;

    debug!("Selected {}", courses.selection());
    Ok(())
}

/// Where a session gets its wind from.
enum Wind {
    Live(WeatherAcquisition),
    /// No provider is configured. The channels stay open so the dashboard keeps
    /// rendering the hole, with the reason shown as the weather status.
    Unavailable {
        latest: watch::Sender<Option<WindReading>>,
        status: watch::Sender<OperationStatus>,
    },
}

impl Wind {
    fn from_config(config: &Config) -> Self {
        match default_provider_from_config(config) {
            Ok(provider) => Wind::Live(WeatherAcquisition::new(provider, &config.weather)),
            Err(e) => {
                debug!("No weather provider: {e}");
                let (latest, _) = watch::channel(None);
                let (status, _) = watch::channel(OperationStatus::Error(e.to_string()));
                Wind::Unavailable { latest, status }
            }
        }
    }

    fn dashboard(&self, heading: &HeadingSource, settings: &WeatherSettings) -> Dashboard {
        match self {
            Wind::Live(weather) => Dashboard::new(heading, weather, settings),
            Wind::Unavailable { latest, status } => Dashboard::from_receivers(
                heading.subscribe(),
                latest.subscribe(),
                status.subscribe(),
                WindSmoother::from_settings(settings),
            ),
        }
    }

    async fn acquire(&self, at: Coordinate) {
        if let Wind::Live(weather) = self {
            if let Err(e) = weather.acquire(at).await {
                eprintln!("Could not get wind: {e}");
            }
        }
    }

    async fn start_auto_refresh(&self, at: Coordinate) {
        if let Wind::Live(weather) = self {
            weather.start_auto_refresh(at).await;
        }
    }

    async fn stop(&self) {
        if let Wind::Live(weather) = self {
            weather.stop_auto_refresh().await;
        }
    }
}

/// Everything a snapshot needs, wired together.
struct Session {
    courses: CourseResolver,
    wind: Wind,
    heading: HeadingSource,
    dashboard: Dashboard,
}

impl Session {
    async fn open(args: &HoleArgs) -> Result<Self> {
        let config = Config::load()?;
        let courses = load_courses(&config).await;
        select(&courses, args)?;

        let sensor: Arc<dyn HeadingSensor> = match args.heading {
            Some(degrees) => Arc::new(FixedHeading::new(degrees)),
            None => Arc::new(NoSensor),
        };
        let heading = HeadingSource::new(sensor, config.heading.clone());
        heading.start();

        let wind = Wind::from_config(&config);
        let dashboard = wind.dashboard(&heading, &config.weather);
        Ok(Self { courses, wind, heading, dashboard })
    }

    fn print(&mut self) {
        let snapshot = self.dashboard.snapshot(&self.courses);
        render::print_snapshot(&snapshot);
    }

    async fn close(&self) {
        self.wind.stop().await;
        self.heading.stop().await;
    }
}

async fn show(args: &HoleArgs) -> Result<()> {
    let mut session = Session::open(args).await?;
    let location = session.courses.selected_location().context("No club selected")?;

    session.wind.acquire(location).await;

    // The source is owned by the session, so its channel cannot close here.
    let mut headings = session.heading.subscribe();
    if headings.wait_for(Option::is_some).await.is_err() {
        debug!("Heading channel closed before the first reading");
    }

    session.print();
    session.close().await;
    Ok(())
}

async fn watch(args: &HoleArgs) -> Result<()> {
    let mut session = Session::open(args).await?;
    let location = session.courses.selected_location().context("No club selected")?;

    session.wind.start_auto_refresh(location).await;
    session.print();

    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => break,
            changed = session.dashboard.changed() => {
                if !changed {
                    break;
                }
                println!();
                session.print();
            }
        }
    }

    session.close().await;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn first_hole() -> HoleArgs {
        HoleArgs { club: None, course: None, hole: None, heading: None }
    }

    #[tokio::test]
    async fn missing_provider_still_renders_hole() {
        let config = Config::default();
        let courses = load_courses(&config).await;
        select(&courses, &first_hole()).unwrap();

        let wind = Wind::from_config(&config);
        assert!(matches!(wind, Wind::Unavailable { .. }));

        let heading = HeadingSource::new(Arc::new(NoSensor), config.heading.clone());
        let mut dashboard = wind.dashboard(&heading, &config.weather);
        let snapshot = dashboard.snapshot(&courses);

        assert_eq!(snapshot.hole.map(|h| (h.number, h.distance)), Some((1, 375)));
        assert_eq!(snapshot.wind, None);
        assert!(snapshot.weather_status.to_string().contains("No default provider configured"));
    }

    #[tokio::test]
    async fn explicit_selection_is_applied() {
        let courses = load_courses(&Config::default()).await;
        let args = HoleArgs {
            club: Some("Buyeo CC".into()),
            course: Some("HILL".into()),
            hole: Some(3),
            heading: None,
        };
        select(&courses, &args).unwrap();
        assert_eq!(courses.selected_hole().map(|h| h.distance), Some(510));

        let args = HoleArgs { hole: Some(9), ..args };
        assert!(select(&courses, &args).is_err());
    }
}
