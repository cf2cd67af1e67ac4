use chrono::NaiveDate;
use std::io;

use crate::model::Observation;

pub const CSV_HEADER: [&str; 11] = [
    "Point",
    "Grid",
    "Lat",
    "Lon",
    "White Deposits",
    "Soil Color",
    "Waterlogging",
    "Compaction",
    "Vegetation",
    "Notes",
    "Recorded At",
];

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExportOutcome {
    NothingToExport,
    Exported { file_name: String, rows: usize },
}

/// Destination for an exported CSV blob (file, share sheet, stdout).
pub trait ExportSink {
    fn deliver(&mut self, file_name: &str, contents: &str) -> io::Result<()>;
}

/// Renders observations in the order given. `None` when there is nothing to
/// export.
pub fn render_csv(observations: &[Observation]) -> Option<String> {
    if observations.is_empty() {
        return None;
    }

    let mut lines = Vec::with_capacity(observations.len() + 1);
    lines.push(CSV_HEADER.join(","));
    for obs in observations {
        let row = [
            obs.point_number.to_string(),
            csv_field(&obs.grid_ref),
            obs.lat.to_string(),
            obs.lon.to_string(),
            optional_field(obs.white_deposits.as_ref().map(|v| v.as_str())),
            optional_field(obs.soil_color.as_ref().map(|v| v.as_str())),
            optional_field(obs.waterlogging.as_ref().map(|v| v.as_str())),
            optional_field(obs.compaction.as_ref().map(|v| v.as_str())),
            optional_field(obs.vegetation.as_ref().map(|v| v.as_str())),
            quote_text(&obs.notes),
            obs.created_at_text(),
        ];
        lines.push(row.join(","));
    }
    Some(lines.join("\n"))
}

/// Notes are always quoted; embedded quotes are doubled.
pub fn quote_text(value: &str) -> String {
    format!("\"{}\"", value.replace('"', "\"\""))
}

/// Bare unless the value would break the row, then quoted like notes.
pub fn csv_field(value: &str) -> String {
    if value.contains([',', '"', '\n', '\r']) {
        quote_text(value)
    } else {
        value.to_string()
    }
}

pub fn export_file_name(date: NaiveDate) -> String {
    format!("soil_samples_{}.csv", date.format("%Y-%m-%d"))
}

fn optional_field(value: Option<&str>) -> String {
    csv_field(value.unwrap_or_default())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{
        Compaction, ElevationZone, ObservationDraft, SamplingPoint, SoilColor, Vegetation,
        Waterlogging, WhiteDeposits,
    };
    use chrono::{TimeZone, Utc};

    fn observation(number: u32, notes: &str) -> Observation {
        let point = SamplingPoint {
            number,
            grid: format!("G{number}"),
            lat: 28.100198,
            lon: 77.788817,
            elevation: ElevationZone::High,
        };
        let draft = ObservationDraft {
            white_deposits: Some(WhiteDeposits::Slight),
            soil_color: Some(SoilColor::Dark),
            waterlogging: Some(Waterlogging::No),
            compaction: Some(Compaction::Yes),
            vegetation: Some(Vegetation::Stunted),
            notes: notes.to_string(),
        };
        let ts = Utc
            .with_ymd_and_hms(2026, 3, 14, 9, 30, 0)
            .single()
            .expect("valid timestamp");
        Observation::new(&point, draft, ts)
    }

    #[test]
    fn empty_collection_has_nothing_to_export() {
        assert_eq!(render_csv(&[]), None);
    }

    #[test]
    fn header_and_row_layout() {
        let csv = render_csv(&[observation(1, "dry")]).expect("csv");
        let lines: Vec<&str> = csv.lines().collect();
        assert_eq!(
            lines[0],
            "Point,Grid,Lat,Lon,White Deposits,Soil Color,Waterlogging,Compaction,Vegetation,Notes,Recorded At"
        );
        assert_eq!(
            lines[1],
            "1,G1,28.100198,77.788817,Slight,Dark,No,Yes,Stunted,\"dry\",2026-03-14T09:30:00.000Z"
        );
        assert!(!csv.ends_with('\n'));
    }

    #[test]
    fn notes_with_quotes_and_commas_are_escaped() {
        let csv = render_csv(&[observation(2, "He said \"wet\", twice")]).expect("csv");
        assert!(csv.contains("\"He said \"\"wet\"\", twice\""));
        assert_eq!(quote_text("He said \"wet\""), "\"He said \"\"wet\"\"\"");
    }

    #[test]
    fn rows_follow_collection_order_and_blank_answers_are_empty() {
        let mut partial = observation(1, "");
        partial.soil_color = None;
        partial.vegetation = None;
        let csv = render_csv(&[observation(5, "a"), partial]).expect("csv");
        let lines: Vec<&str> = csv.lines().collect();
        assert!(lines[1].starts_with("5,G5,"));
        assert!(lines[2].starts_with("1,G1,"));
        assert!(lines[2].contains(",Slight,,No,Yes,,\"\","));
    }

    #[test]
    fn unlisted_answers_and_grid_labels_with_commas_stay_in_their_column() {
        let mut obs = observation(1, "");
        obs.grid_ref = "A,1".to_string();
        obs.vegetation = Some(Vegetation::from("Lush, green"));
        obs.soil_color = Some(SoilColor::from("Red \"clay\""));
        let csv = render_csv(&[obs]).expect("csv");
        let row = csv.lines().nth(1).expect("row");
        assert_eq!(
            row,
            "1,\"A,1\",28.100198,77.788817,Slight,\"Red \"\"clay\"\"\",No,Yes,\"Lush, green\",\"\",2026-03-14T09:30:00.000Z"
        );
        assert_eq!(csv_field("Yes"), "Yes");
        assert_eq!(csv_field("two\nlines"), "\"two\nlines\"");
    }

    #[test]
    fn file_name_carries_the_date() {
        let date = NaiveDate::from_ymd_opt(2026, 10, 19).expect("date");
        assert_eq!(export_file_name(date), "soil_samples_2026-10-19.csv");
    }
}
