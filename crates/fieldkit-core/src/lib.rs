//! Domain model and pure logic for soil-sampling field work: sampling plans,
//! observations, distance and proximity, CSV export.

pub mod checklist;
pub mod export;
pub mod geo;
pub mod model;
pub mod plan;
pub mod progress;
pub mod proximity;

pub use checklist::{checklist_items, ChecklistItem, EQUIPMENT_CHECKLIST};
pub use export::{csv_field, export_file_name, render_csv, ExportOutcome, ExportSink, CSV_HEADER};
pub use geo::{distance_m, walking_directions_url, LatLon, EARTH_RADIUS_M};
pub use model::{
    Compaction, ElevationZone, Observation, ObservationDraft, Position, SamplingPoint, SoilColor,
    Vegetation, Waterlogging, WhiteDeposits,
};
pub use plan::{EntryPoint, PlanError, SamplingPlan};
pub use progress::{PointProgress, Progress};
pub use proximity::{evaluate, Proximity, PROXIMITY_THRESHOLD_M};
