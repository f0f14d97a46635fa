use fairway_core::{
    CompassPoint, Dataset, DisplaySnapshot, Hole, direction, heading::HeadingOrigin, course::DatasetOrigin,
};

pub fn print_courses(dataset: &Dataset, origin: &DatasetOrigin) {
    match origin {
        DatasetOrigin::Primary(name) => println!("Courses from {name}"),
        DatasetOrigin::Mirror(name) => println!("Courses from mirror {name}"),
        DatasetOrigin::Sample => println!("Built-in sample courses"),
        DatasetOrigin::NotLoaded => println!("No course data loaded"),
    }

    for club in dataset.clubs() {
        println!();
        println!("{} ({})", club.name, club.location);
        for course in &club.courses {
            println!("  {}", course.name);
            for hole in &course.holes {
                println!("    {}", hole_line(hole));
            }
        }
    }
}

pub fn print_snapshot(snapshot: &DisplaySnapshot) {
    println!("{}", snapshot.selection);
    if let Some(hole) = &snapshot.hole {
        println!("  {}", hole_line(hole));
    }

    let origin = match snapshot.heading_origin {
        Some(HeadingOrigin::Sensor) => "",
        Some(HeadingOrigin::Synthetic) => " (simulated)",
        None => " (no compass)",
    };
    println!(
        "  Facing {:.0}° {}{}",
        snapshot.heading,
        direction::compass_label8(snapshot.heading),
        origin
    );

    match &snapshot.wind {
        Some(wind) => {
            println!(
                "  Wind {:.1} m/s from {} ({:.0}°), {} [arrow {:.0}°]{}",
                wind.speed_mps,
                wind.label,
                wind.direction_deg,
                wind_feel(wind.relative_angle),
                wind.relative_angle,
                if wind.stale { " (stale)" } else { "" }
            );
            println!("  {}", wind.strength.impact());
        }
        None => println!("  Wind unknown"),
    }

    if snapshot.weather_status.is_error() {
        println!("  Weather {}", snapshot.weather_status);
    }
}

fn hole_line(hole: &Hole) -> String {
    let slope = if hole.is_uphill() {
        " uphill"
    } else if hole.is_downhill() {
        " downhill"
    } else {
        ""
    };
    format!(
        "#{:<2} par {}  {} m  {:+.0} m{}",
        hole.number, hole.par, hole.distance, hole.elevation, slope
    )
}

/// How wind coming from `relative_angle` feels to a player facing forward.
fn wind_feel(relative_angle: f64) -> &'static str {
    match direction::compass_label8(relative_angle) {
        CompassPoint::N => "headwind",
        CompassPoint::S => "tailwind",
        CompassPoint::NE | CompassPoint::E | CompassPoint::SE => "from the right",
        CompassPoint::NW | CompassPoint::W | CompassPoint::SW => "from the left",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wind_feel_by_relative_angle() {
        assert_eq!(wind_feel(0.0), "headwind");
        assert_eq!(wind_feel(30.0), "from the right");
        assert_eq!(wind_feel(180.0), "tailwind");
        assert_eq!(wind_feel(275.0), "from the left");
    }

    #[test]
    fn hole_line_shows_signed_elevation() {
        let hole = Hole {
            number: 2,
            par: 5,
            distance: 450,
            elevation: -15.0,
            hole_image: None,
            green_image: None,
        };
        assert_eq!(hole_line(&hole), "#2  par 5  450 m  -15 m downhill");
    }
}
