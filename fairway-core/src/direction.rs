//! Angle arithmetic and compass naming.
//!
//! Everything here is pure. Angles are degrees, 0 = North, increasing
//! clockwise.

use std::{fmt, str::FromStr};

const FULL_TURN: f64 = 360.0;

/// Reduce any angle to `[0, 360)`.
///
/// Non-finite input yields `0.0` so a heading is always displayable.
pub fn normalize(degrees: f64) -> f64 {
    if !degrees.is_finite() {
        return 0.0;
    }
    // Tiny negatives round up to 360.0 after the add; the outer remainder folds it to 0.
    ((degrees % FULL_TURN) + FULL_TURN) % FULL_TURN
}

/// Signed minimal rotation from `from` to `to`, in `(-180, 180]`.
pub fn shortest_delta(from: f64, to: f64) -> f64 {
    let diff = normalize(to - from);
    if diff > 180.0 { diff - FULL_TURN } else { diff }
}

/// Linear interpolation along the shortest arc. `progress` is clamped to `[0, 1]`.
pub fn interpolate(from: f64, to: f64, progress: f64) -> f64 {
    let progress = if progress.is_nan() { 0.0 } else { progress.clamp(0.0, 1.0) };
    normalize(from + shortest_delta(from, to) * progress)
}

/// Rotation for a screen-fixed glyph so it points at `target` while the
/// device faces `heading`.
pub fn relative_angle(target: f64, heading: f64) -> f64 {
    normalize(target - heading)
}

/// Eight-point compass name using 45° sectors centered on each point.
pub fn compass_label8(degrees: f64) -> CompassPoint {
    let sector = ((normalize(degrees) + 22.5) / 45.0).floor() as usize % 8;
    CompassPoint::EIGHT[sector]
}

/// Nearest of the four cardinal points. Exact ties round clockwise.
pub fn compass_label4(degrees: f64) -> CompassPoint {
    let sector = ((normalize(degrees) + 45.0) / 90.0).floor() as usize % 4;
    CompassPoint::FOUR[sector]
}

/// A named compass point.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CompassPoint {
    N,
    NE,
    E,
    SE,
    S,
    SW,
    W,
    NW,
}

impl CompassPoint {
    const EIGHT: [CompassPoint; 8] = [
        CompassPoint::N,
        CompassPoint::NE,
        CompassPoint::E,
        CompassPoint::SE,
        CompassPoint::S,
        CompassPoint::SW,
        CompassPoint::W,
        CompassPoint::NW,
    ];

    const FOUR: [CompassPoint; 4] =
        [CompassPoint::N, CompassPoint::E, CompassPoint::S, CompassPoint::W];

    pub fn label(&self) -> &'static str {
        match self {
            CompassPoint::N => "N",
            CompassPoint::NE => "NE",
            CompassPoint::E => "E",
            CompassPoint::SE => "SE",
            CompassPoint::S => "S",
            CompassPoint::SW => "SW",
            CompassPoint::W => "W",
            CompassPoint::NW => "NW",
        }
    }

    /// Arrow rotation that points at this compass point.
    pub fn degrees(&self) -> f64 {
        match self {
            CompassPoint::N => 0.0,
            CompassPoint::NE => 45.0,
            CompassPoint::E => 90.0,
            CompassPoint::SE => 135.0,
            CompassPoint::S => 180.0,
            CompassPoint::SW => 225.0,
            CompassPoint::W => 270.0,
            CompassPoint::NW => 315.0,
        }
    }

    pub const fn all() -> &'static [CompassPoint] {
        &Self::EIGHT
    }
}

impl fmt::Display for CompassPoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for CompassPoint {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let upper = s.trim().to_uppercase();
        CompassPoint::EIGHT
            .iter()
            .copied()
            .find(|p| p.label() == upper)
            .ok_or_else(|| format!("Unknown compass point '{s}'"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn close(a: f64, b: f64) -> bool {
        shortest_delta(a, b).abs() < 1e-9
    }

    #[test]
    fn normalize_handles_negative_and_large_values() {
        assert_eq!(normalize(-90.0), 270.0);
        assert_eq!(normalize(720.0), 0.0);
        assert_eq!(normalize(360.0), 0.0);
        assert_eq!(normalize(0.0), 0.0);
        assert_eq!(normalize(-360.0), 0.0);
        assert_eq!(normalize(725.5), 5.5);
    }

    #[test]
    fn normalize_never_returns_full_turn() {
        let tiny = normalize(-1e-15);
        assert!((0.0..360.0).contains(&tiny), "got {tiny}");
    }

    #[test]
    fn normalize_maps_non_finite_to_north() {
        assert_eq!(normalize(f64::NAN), 0.0);
        assert_eq!(normalize(f64::INFINITY), 0.0);
    }

    #[test]
    fn shortest_delta_crosses_north() {
        assert_eq!(shortest_delta(359.0, 1.0), 2.0);
        assert_eq!(shortest_delta(1.0, 359.0), -2.0);
        assert_eq!(shortest_delta(0.0, 180.0), 180.0);
        assert_eq!(shortest_delta(180.0, 0.0), 180.0);
    }

    #[test]
    fn interpolate_endpoints_and_wrap() {
        assert_eq!(interpolate(350.0, 10.0, 0.0), 350.0);
        assert_eq!(interpolate(350.0, 10.0, 1.0), 10.0);
        assert_eq!(interpolate(350.0, 10.0, 0.5), 0.0);
        assert_eq!(interpolate(10.0, 350.0, 2.0), 350.0);
    }

    #[test]
    fn relative_angle_examples() {
        assert_eq!(relative_angle(200.0, 170.0), 30.0);
        assert_eq!(relative_angle(10.0, 350.0), 20.0);
        assert_eq!(relative_angle(90.0, 90.0), 0.0);
    }

    #[test]
    fn label8_sectors() {
        assert_eq!(compass_label8(0.0), CompassPoint::N);
        assert_eq!(compass_label8(359.0), CompassPoint::N);
        assert_eq!(compass_label8(337.5), CompassPoint::N);
        assert_eq!(compass_label8(22.4), CompassPoint::N);
        assert_eq!(compass_label8(22.5), CompassPoint::NE);
        assert_eq!(compass_label8(44.0), CompassPoint::NE);
        assert_eq!(compass_label8(46.0), CompassPoint::NE);
        assert_eq!(compass_label8(67.5), CompassPoint::E);
        assert_eq!(compass_label8(180.0), CompassPoint::S);
        assert_eq!(compass_label8(-45.0), CompassPoint::NW);
        assert_eq!(compass_label8(405.0), CompassPoint::NE);
    }

    #[test]
    fn label4_rounds_to_nearest_cardinal() {
        assert_eq!(compass_label4(0.0), CompassPoint::N);
        assert_eq!(compass_label4(90.0), CompassPoint::E);
        assert_eq!(compass_label4(180.0), CompassPoint::S);
        assert_eq!(compass_label4(270.0), CompassPoint::W);
        assert_eq!(compass_label4(44.9), CompassPoint::N);
        assert_eq!(compass_label4(45.0), CompassPoint::E);
        assert_eq!(compass_label4(316.0), CompassPoint::N);
        assert_eq!(compass_label4(-80.0), CompassPoint::W);
    }

    #[test]
    fn compass_point_parse_and_rotation() {
        for point in CompassPoint::all() {
            let parsed: CompassPoint = point.label().parse().expect("label should parse");
            assert_eq!(*point, parsed);
            assert_eq!(compass_label8(point.degrees()), *point);
        }
        assert!("north".parse::<CompassPoint>().is_err());
        assert_eq!(" sw ".parse::<CompassPoint>(), Ok(CompassPoint::SW));
    }

    proptest! {
        #[test]
        fn normalize_is_periodic(d in -1.0e6f64..1.0e6, k in -50i32..50) {
            let shifted = d + 360.0 * f64::from(k);
            prop_assert!(close(normalize(d), normalize(shifted)));
            let n = normalize(d);
            prop_assert!((0.0..360.0).contains(&n));
        }

        #[test]
        fn shortest_delta_is_bounded_and_closes(a in -1.0e4f64..1.0e4, b in -1.0e4f64..1.0e4) {
            let delta = shortest_delta(a, b);
            prop_assert!(delta.abs() <= 180.0);
            prop_assert!(close(normalize(a + delta), normalize(b)));
        }

        #[test]
        fn relative_angle_is_translation_invariant(
            target in -1.0e4f64..1.0e4,
            heading in -1.0e4f64..1.0e4,
            c in -1.0e4f64..1.0e4,
        ) {
            let base = relative_angle(target, heading);
            let moved = relative_angle(target + c, heading + c);
            prop_assert!(close(base, moved));
        }

        #[test]
        fn interpolate_stays_on_the_short_arc(a in 0.0f64..360.0, b in 0.0f64..360.0, p in 0.0f64..1.0) {
            let mid = interpolate(a, b, p);
            let travelled = shortest_delta(a, mid).abs();
            prop_assert!(travelled <= shortest_delta(a, b).abs() + 1e-9);
        }
    }
}
