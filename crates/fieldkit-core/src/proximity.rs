use std::fmt;

use crate::geo::distance_m;
use crate::model::{Position, SamplingPoint};

/// Maximum distance (meters) between the user and the selected point before
/// a warning is shown.
pub const PROXIMITY_THRESHOLD_M: f64 = 30.0;

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Proximity {
    /// No position fix yet, nothing selected, or the fix is not a number.
    Unavailable,
    Within { distance_m: f64 },
    Exceeds { distance_m: f64 },
}

impl Proximity {
    pub fn distance_m(&self) -> Option<f64> {
        match self {
            Proximity::Unavailable => None,
            Proximity::Within { distance_m } | Proximity::Exceeds { distance_m } => {
                Some(*distance_m)
            }
        }
    }

    pub fn exceeds_threshold(&self) -> bool {
        matches!(self, Proximity::Exceeds { .. })
    }
}

impl fmt::Display for Proximity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Proximity::Unavailable => f.write_str("no proximity data available"),
            Proximity::Within { distance_m } => write!(f, "Distance: {}m", distance_m.round()),
            Proximity::Exceeds { distance_m } => write!(
                f,
                "Distance: {}m (more than {}m from the point)",
                distance_m.round(),
                PROXIMITY_THRESHOLD_M
            ),
        }
    }
}

pub fn evaluate(position: Option<&Position>, point: Option<&SamplingPoint>) -> Proximity {
    let (Some(position), Some(point)) = (position, point) else {
        return Proximity::Unavailable;
    };
    classify(distance_m(position.location(), point.location()))
}

pub fn classify(distance_m: f64) -> Proximity {
    if distance_m.is_nan() {
        Proximity::Unavailable
    } else if distance_m > PROXIMITY_THRESHOLD_M {
        Proximity::Exceeds { distance_m }
    } else {
        Proximity::Within { distance_m }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::ElevationZone;

    fn point(lat: f64, lon: f64) -> SamplingPoint {
        SamplingPoint {
            number: 1,
            grid: "G3".to_string(),
            lat,
            lon,
            elevation: ElevationZone::High,
        }
    }

    #[test]
    fn close_fix_is_within_threshold() {
        let position = Position::new(28.1000, 77.7880, 5.0);
        let target = point(28.1000, 77.7881);
        let result = evaluate(Some(&position), Some(&target));

        assert!(matches!(result, Proximity::Within { .. }));
        let distance = result.distance_m().expect("distance");
        assert!((9.5..10.0).contains(&distance));
        assert_eq!(result.to_string(), "Distance: 10m");
    }

    #[test]
    fn far_fix_exceeds_threshold() {
        let position = Position::new(28.0990, 77.7880, 5.0);
        let target = point(28.1000, 77.7880);
        let result = evaluate(Some(&position), Some(&target));

        assert!(result.exceeds_threshold());
        assert!(result.distance_m().expect("distance") > 100.0);
    }

    #[test]
    fn threshold_boundary_is_inclusive() {
        assert!(matches!(
            classify(PROXIMITY_THRESHOLD_M),
            Proximity::Within { .. }
        ));
        assert!(classify(PROXIMITY_THRESHOLD_M + 0.01).exceeds_threshold());
    }

    #[test]
    fn missing_inputs_report_unavailable() {
        let position = Position::new(28.1, 77.788, 5.0);
        let target = point(28.1, 77.788);
        assert_eq!(evaluate(None, Some(&target)), Proximity::Unavailable);
        assert_eq!(evaluate(Some(&position), None), Proximity::Unavailable);
        assert_eq!(evaluate(None, None), Proximity::Unavailable);
        assert_eq!(Proximity::Unavailable.distance_m(), None);
    }

    #[test]
    fn nan_fix_is_unavailable() {
        let position = Position::new(f64::NAN, 77.788, 5.0);
        let target = point(28.1, 77.788);
        assert_eq!(evaluate(Some(&position), Some(&target)), Proximity::Unavailable);
    }
}
