use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use thiserror::Error;

use crate::geo::LatLon;
use crate::model::{ElevationZone, SamplingPoint};

#[derive(Debug, Error, PartialEq)]
pub enum PlanError {
    #[error("sampling plan has no points")]
    Empty,
    #[error("sampling point numbers must be positive")]
    ZeroPointNumber,
    #[error("duplicate sampling point number {0}")]
    DuplicatePoint(u32),
    #[error("sampling point {number} has invalid coordinates ({lat}, {lon})")]
    InvalidCoordinate { number: u32, lat: f64, lon: f64 },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntryPoint {
    pub lat: f64,
    pub lon: f64,
    #[serde(default)]
    pub description: String,
}

/// The fixed set of points for one field, in suggested walking order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SamplingPlan {
    pub name: String,
    pub points: Vec<SamplingPoint>,
    /// Plot boundary as a closed ring.
    #[serde(default)]
    pub boundary: Vec<LatLon>,
    #[serde(default)]
    pub entry_point: Option<EntryPoint>,
    #[serde(default)]
    pub map_center: Option<LatLon>,
}

impl SamplingPlan {
    /// Elevation-zone based selection for the reference plot: ten points
    /// spanning 192.4 m to 194.2 m, walked from the south-east entry.
    pub fn builtin() -> Self {
        let points = [
            (1, "G3", 28.100198, 77.788817, ElevationZone::High),
            (2, "F2", 28.100584, 77.788174, ElevationZone::High),
            (3, "E2", 28.10100, 77.78780, ElevationZone::Medium),
            (4, "D3", 28.10050, 77.78720, ElevationZone::Medium),
            (5, "C2", 28.101098, 77.786547, ElevationZone::Medium),
            (6, "C3", 28.100341, 77.786364, ElevationZone::Low),
            (7, "B4", 28.099788, 77.785699, ElevationZone::Low),
            (8, "D5", 28.099844, 77.787030, ElevationZone::Low),
            (9, "G4", 28.09960, 77.78780, ElevationZone::Medium),
            (10, "H5", 28.099366, 77.788489, ElevationZone::High),
        ]
        .into_iter()
        .map(|(number, grid, lat, lon, elevation)| SamplingPoint {
            number,
            grid: grid.to_string(),
            lat,
            lon,
            elevation,
        })
        .collect();

        let boundary = [
            (28.10046115640565, 77.78939804167037),
            (28.10079793697927, 77.78880428908039),
            (28.10146028547256, 77.78805542636508),
            (28.10161310587113, 77.78795331429811),
            (28.10154117498568, 77.78751166178249),
            (28.10103086916328, 77.78709710495055),
            (28.10114658934855, 77.78695277538301),
            (28.10151028147857, 77.78643910280523),
            (28.10118076006495, 77.78606212097766),
            (28.10082846323772, 77.78645358561086),
            (28.10081471087444, 77.78647221876281),
            (28.1006159018711, 77.7863030906033),
            (28.10040242821022, 77.78614069441018),
            (28.10063316220857, 77.78580010841193),
            (28.09989519081241, 77.78530893094901),
            (28.09985458401478, 77.78536856592865),
            (28.09952960181319, 77.78505320479195),
            (28.09925473411002, 77.78553387470014),
            (28.09996902328279, 77.78651655823099),
            (28.09933055517165, 77.78718691116667),
            (28.09940343189318, 77.787303763964),
            (28.09922643177073, 77.78752543921395),
            (28.09863109826777, 77.78868069567859),
            (28.10046115640565, 77.78939804167037),
        ]
        .into_iter()
        .map(|(lat, lon)| LatLon::new(lat, lon))
        .collect();

        Self {
            name: "Fortune Farming plot".to_string(),
            points,
            boundary,
            entry_point: Some(EntryPoint {
                lat: 28.09863,
                lon: 77.78868,
                description: "Entry Point H6 (Southeast corner)".to_string(),
            }),
            map_center: Some(LatLon::new(28.100, 77.787)),
        }
    }

    pub fn validate(&self) -> Result<(), PlanError> {
        if self.points.is_empty() {
            return Err(PlanError::Empty);
        }
        let mut seen = BTreeSet::new();
        for point in &self.points {
            if point.number == 0 {
                return Err(PlanError::ZeroPointNumber);
            }
            if !seen.insert(point.number) {
                return Err(PlanError::DuplicatePoint(point.number));
            }
            if !point.location().is_valid() {
                return Err(PlanError::InvalidCoordinate {
                    number: point.number,
                    lat: point.lat,
                    lon: point.lon,
                });
            }
        }
        Ok(())
    }

    pub fn point(&self, number: u32) -> Option<&SamplingPoint> {
        self.points.iter().find(|point| point.number == number)
    }

    pub fn contains(&self, number: u32) -> bool {
        self.point(number).is_some()
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }
}

impl Default for SamplingPlan {
    fn default() -> Self {
        Self::builtin()
    }
}
