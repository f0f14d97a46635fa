use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::{error::DatasetError, model::Coordinate};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Club {
    pub name: String,
    pub location: Coordinate,
    /// Declaration order is display order.
    pub courses: Vec<Course>,
}

impl Club {
    pub fn course(&self, name: &str) -> Option<&Course> {
        self.courses.iter().find(|c| c.name == name)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Course {
    pub name: String,
    pub holes: Vec<Hole>,
}

impl Course {
    /// First hole carrying `number`. Duplicate numbers are a data defect; the
    /// earliest entry wins.
    pub fn hole_by_number(&self, number: u32) -> Option<&Hole> {
        self.holes.iter().find(|h| h.number == number)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Hole {
    #[serde(rename = "num")]
    pub number: u32,
    pub par: u32,
    /// Meters from tee to green.
    pub distance: u32,
    /// Meters; positive plays uphill.
    #[serde(default)]
    pub elevation: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hole_image: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub green_image: Option<String>,
}

impl Hole {
    pub fn is_uphill(&self) -> bool {
        self.elevation > 0.0
    }

    pub fn is_downhill(&self) -> bool {
        self.elevation < 0.0
    }
}

/// The whole loaded hierarchy. Immutable once built.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Dataset {
    clubs: Vec<Club>,
}

impl Dataset {
    pub fn new(clubs: Vec<Club>) -> Self {
        Self { clubs }
    }

    /// Parse and validate a dataset document.
    ///
    /// Accepts either a list of clubs or a single club object. Holes with a
    /// non-positive par or distance are skipped, as are courses and clubs left
    /// empty by that; each skip is returned as a warning. A document with no
    /// playable hole at all is rejected.
    pub fn from_json(body: &str, origin: &str) -> Result<(Self, Vec<String>), DatasetError> {
        let document: RawDocument = serde_json::from_str(body)
            .map_err(|source| DatasetError::Parse { origin: origin.to_string(), source })?;

        let raw_clubs = match document {
            RawDocument::Clubs(clubs) => clubs,
            RawDocument::Club(club) => vec![club],
        };

        let mut warnings = Vec::new();
        let clubs: Vec<Club> =
            raw_clubs.into_iter().filter_map(|club| club.validate(&mut warnings)).collect();

        for warning in &warnings {
            warn!("{origin}: {warning}");
        }

        if clubs.is_empty() {
            return Err(DatasetError::Empty { origin: origin.to_string() });
        }
        Ok((Self { clubs }, warnings))
    }

    /// Built-in data used when no source can be loaded.
    pub fn sample() -> Self {
        let hole = |number, par, distance, elevation: f64, prefix: &str| Hole {
            number,
            par,
            distance,
            elevation,
            hole_image: Some(format!("{prefix}_{number}")),
            green_image: Some(format!("{prefix}_g_{number}")),
        };

        Self {
            clubs: vec![Club {
                name: "Buyeo CC".to_string(),
                location: Coordinate::new(36.2754, 126.9094),
                courses: vec![
                    Course {
                        name: "SKY".to_string(),
                        holes: vec![hole(1, 4, 375, 22.0, "sky"), hole(2, 5, 450, 15.0, "sky")],
                    },
                    Course {
                        name: "HILL".to_string(),
                        holes: vec![hole(1, 4, 380, 18.0, "hill"), hole(2, 3, 320, 25.0, "hill")],
                    },
                ],
            }],
        }
    }

    pub fn clubs(&self) -> &[Club] {
        &self.clubs
    }

    pub fn club(&self, name: &str) -> Option<&Club> {
        self.clubs.iter().find(|c| c.name == name)
    }

    /// Courses of `club`, empty when the club is unknown.
    pub fn courses_of(&self, club: &str) -> &[Course] {
        self.club(club).map(|c| c.courses.as_slice()).unwrap_or_default()
    }

    /// Holes of `course` within `club`, empty when either is unknown.
    pub fn holes_of(&self, club: &str, course: &str) -> &[Hole] {
        self.club(club)
            .and_then(|c| c.course(course))
            .map(|c| c.holes.as_slice())
            .unwrap_or_default()
    }

    pub fn hole_by_number(&self, club: &str, course: &str, number: u32) -> Option<&Hole> {
        self.club(club).and_then(|c| c.course(course)).and_then(|c| c.hole_by_number(number))
    }

    pub fn is_empty(&self) -> bool {
        self.clubs.is_empty()
    }
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum RawDocument {
    Clubs(Vec<RawClub>),
    Club(RawClub),
}

#[derive(Debug, Deserialize)]
struct RawClub {
    name: String,
    location: Coordinate,
    #[serde(default)]
    courses: Vec<RawCourse>,
}

#[derive(Debug, Deserialize)]
struct RawCourse {
    name: String,
    #[serde(default)]
    holes: Vec<RawHole>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawHole {
    num: i64,
    par: i64,
    distance: f64,
    #[serde(default)]
    elevation: f64,
    #[serde(default)]
    hole_image: Option<String>,
    #[serde(default)]
    green_image: Option<String>,
}

impl RawClub {
    fn validate(self, warnings: &mut Vec<String>) -> Option<Club> {
        let club_name = self.name;
        let courses: Vec<Course> = self
            .courses
            .into_iter()
            .filter_map(|course| course.validate(&club_name, warnings))
            .collect();

        if courses.is_empty() {
            warnings.push(format!("club '{club_name}' has no playable course, skipped"));
            return None;
        }
        Some(Club { name: club_name, location: self.location, courses })
    }
}

impl RawCourse {
    fn validate(self, club: &str, warnings: &mut Vec<String>) -> Option<Course> {
        let course_name = self.name;
        let holes: Vec<Hole> = self
            .holes
            .into_iter()
            .filter_map(|hole| match hole.validate() {
                Ok(hole) => Some(hole),
                Err(reason) => {
                    warnings.push(format!("{club}/{course_name}: {reason}, hole skipped"));
                    None
                }
            })
            .collect();

        if holes.is_empty() {
            warnings.push(format!("{club}/{course_name} has no playable hole, skipped"));
            return None;
        }
        Some(Course { name: course_name, holes })
    }
}

impl RawHole {
    fn validate(self) -> Result<Hole, String> {
        let number = u32::try_from(self.num)
            .ok()
            .filter(|n| *n > 0)
            .ok_or_else(|| format!("invalid hole number {}", self.num))?;
        let par = u32::try_from(self.par)
            .ok()
            .filter(|p| *p > 0)
            .ok_or_else(|| format!("hole {number} has invalid par {}", self.par))?;
        if !self.distance.is_finite() || self.distance < 1.0 || self.distance > f64::from(u32::MAX) {
            return Err(format!("hole {number} has invalid distance {}", self.distance));
        }
        let elevation = if self.elevation.is_finite() { self.elevation } else { 0.0 };

        Ok(Hole {
            number,
            par,
            distance: self.distance.round() as u32,
            elevation,
            hole_image: self.hole_image.filter(|s| !s.is_empty()),
            green_image: self.green_image.filter(|s| !s.is_empty()),
        })
    }
}
