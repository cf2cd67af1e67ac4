use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::convert::Infallible;
use std::fmt;
use std::str::FromStr;

use crate::geo::LatLon;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum ElevationZone {
    High,
    Medium,
    Low,
}

impl ElevationZone {
    pub fn as_str(&self) -> &'static str {
        match self {
            ElevationZone::High => "high",
            ElevationZone::Medium => "medium",
            ElevationZone::Low => "low",
        }
    }
}

impl fmt::Display for ElevationZone {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ElevationZone {
    type Err = String;

    fn from_str(input: &str) -> Result<Self, Self::Err> {
        let normalized = input.trim().to_lowercase();
        match normalized.as_str() {
            "high" => Ok(ElevationZone::High),
            "medium" => Ok(ElevationZone::Medium),
            "low" => Ok(ElevationZone::Low),
            other => Err(format!("Unknown elevation zone: {other}")),
        }
    }
}

/// A pre-surveyed location where a soil sample and/or observation is taken.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SamplingPoint {
    pub number: u32,
    pub grid: String,
    pub lat: f64,
    pub lon: f64,
    pub elevation: ElevationZone,
}

impl SamplingPoint {
    pub fn location(&self) -> LatLon {
        LatLon::new(self.lat, self.lon)
    }
}

/// Declares a categorical form answer backed by a fixed option set.
///
/// Values outside the option set are kept verbatim in `Other` so stored data
/// written by older forms never fails to load.
macro_rules! categorical {
    ($(#[$meta:meta])* $name:ident { $($variant:ident => $label:literal),+ $(,)? }) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash)]
        pub enum $name {
            $($variant,)+
            Other(String),
        }

        impl $name {
            pub const OPTIONS: &'static [&'static str] = &[$($label),+];

            pub fn as_str(&self) -> &str {
                match self {
                    $(Self::$variant => $label,)+
                    Self::Other(value) => value.as_str(),
                }
            }

            pub fn is_known(&self) -> bool {
                !matches!(self, Self::Other(_))
            }
        }

        impl From<&str> for $name {
            fn from(input: &str) -> Self {
                let trimmed = input.trim();
                $(
                    if trimmed.eq_ignore_ascii_case($label) {
                        return Self::$variant;
                    }
                )+
                Self::Other(input.to_string())
            }
        }

        impl FromStr for $name {
            type Err = Infallible;

            fn from_str(input: &str) -> Result<Self, Self::Err> {
                Ok(Self::from(input))
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl Serialize for $name {
            fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
            where
                S: Serializer,
            {
                serializer.serialize_str(self.as_str())
            }
        }

        impl<'de> Deserialize<'de> for $name {
            fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
            where
                D: Deserializer<'de>,
            {
                let raw = String::deserialize(deserializer)?;
                Ok(Self::from(raw.as_str()))
            }
        }
    };
}

categorical! {
    /// Presence of white (salt) deposits on the surface.
    WhiteDeposits {
        Yes => "Yes",
        Slight => "Slight",
        No => "No",
    }
}

categorical! {
    SoilColor {
        Dark => "Dark",
        Medium => "Medium",
        Pale => "Pale",
    }
}

categorical! {
    Waterlogging {
        Yes => "Yes",
        No => "No",
    }
}

categorical! {
    Compaction {
        Yes => "Yes",
        No => "No",
    }
}

categorical! {
    Vegetation {
        Healthy => "Healthy",
        Stunted => "Stunted",
        Patchy => "Patchy",
        Absent => "Absent",
    }
}

/// Form contents before submission. Every answer may be left blank.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ObservationDraft {
    pub white_deposits: Option<WhiteDeposits>,
    pub soil_color: Option<SoilColor>,
    pub waterlogging: Option<Waterlogging>,
    pub compaction: Option<Compaction>,
    pub vegetation: Option<Vegetation>,
    pub notes: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Observation {
    pub id: String,
    pub point_number: u32,
    pub grid_ref: String,
    pub lat: f64,
    pub lon: f64,
    #[serde(default)]
    pub white_deposits: Option<WhiteDeposits>,
    #[serde(default)]
    pub soil_color: Option<SoilColor>,
    #[serde(default)]
    pub waterlogging: Option<Waterlogging>,
    #[serde(default)]
    pub compaction: Option<Compaction>,
    #[serde(default)]
    pub vegetation: Option<Vegetation>,
    #[serde(default, deserialize_with = "deserialize_notes")]
    pub notes: String,
    pub created_at: DateTime<Utc>,
}

impl Observation {
    /// Builds the record for `point`, copying its grid reference and
    /// coordinates so later plan edits never rewrite history.
    pub fn new(point: &SamplingPoint, draft: ObservationDraft, created_at: DateTime<Utc>) -> Self {
        Self {
            id: observation_id(point.number, created_at),
            point_number: point.number,
            grid_ref: point.grid.clone(),
            lat: point.lat,
            lon: point.lon,
            white_deposits: draft.white_deposits,
            soil_color: draft.soil_color,
            waterlogging: draft.waterlogging,
            compaction: draft.compaction,
            vegetation: draft.vegetation,
            notes: draft.notes,
            created_at,
        }
    }

    pub fn location(&self) -> LatLon {
        LatLon::new(self.lat, self.lon)
    }

    /// RFC 3339 with millisecond precision and a `Z` suffix.
    pub fn created_at_text(&self) -> String {
        format_timestamp(self.created_at)
    }

    /// One-line status used when a recorded point is selected.
    pub fn summary(&self) -> String {
        format!(
            "Recorded: {} deposits, {} soil",
            answer_text(self.white_deposits.as_ref()),
            answer_text(self.soil_color.as_ref())
        )
    }
}

pub fn observation_id(point_number: u32, created_at: DateTime<Utc>) -> String {
    format!("obs_{}_{}", point_number, created_at.timestamp_millis())
}

pub fn format_timestamp(ts: DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// Renders an optional answer for display; blank answers show as `-`.
pub fn answer_text<T: fmt::Display>(answer: Option<&T>) -> String {
    match answer {
        Some(value) => value.to_string(),
        None => "-".to_string(),
    }
}

fn deserialize_notes<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    let notes: Option<String> = Option::deserialize(deserializer)?;
    Ok(notes.unwrap_or_default())
}

/// A fix from the location sensor. Never persisted.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Position {
    pub lat: f64,
    pub lon: f64,
    pub accuracy_m: f64,
}

impl Position {
    pub fn new(lat: f64, lon: f64, accuracy_m: f64) -> Self {
        Self {
            lat,
            lon,
            accuracy_m,
        }
    }

    pub fn location(&self) -> LatLon {
        LatLon::new(self.lat, self.lon)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn ts() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 3, 14, 9, 30, 0)
            .single()
            .expect("valid timestamp")
    }

    fn point() -> SamplingPoint {
        SamplingPoint {
            number: 3,
            grid: "E2".to_string(),
            lat: 28.101,
            lon: 77.7878,
            elevation: ElevationZone::Medium,
        }
    }

    #[test]
    fn categorical_parse_is_case_insensitive_for_known_options() {
        assert_eq!(WhiteDeposits::from("slight"), WhiteDeposits::Slight);
        assert_eq!(Vegetation::from(" Patchy "), Vegetation::Patchy);
        assert_eq!(
            SoilColor::from("Reddish"),
            SoilColor::Other("Reddish".to_string())
        );
        assert!(!SoilColor::from("Reddish").is_known());
        assert_eq!(Waterlogging::OPTIONS, &["Yes", "No"]);
    }

    #[test]
    fn observation_copies_point_fields() {
        let draft = ObservationDraft {
            white_deposits: Some(WhiteDeposits::Yes),
            notes: "crusty surface".to_string(),
            ..ObservationDraft::default()
        };
        let obs = Observation::new(&point(), draft, ts());

        assert_eq!(obs.id, format!("obs_3_{}", ts().timestamp_millis()));
        assert_eq!(obs.point_number, 3);
        assert_eq!(obs.grid_ref, "E2");
        assert_eq!(obs.lat, 28.101);
        assert_eq!(obs.soil_color, None);
        assert_eq!(obs.created_at_text(), "2026-03-14T09:30:00.000Z");
        assert_eq!(obs.summary(), "Recorded: Yes deposits, - soil");
    }

    #[test]
    fn observation_json_uses_camel_case_and_tolerates_unknown_answers() {
        let raw = r#"{
            "id": "obs_3_1",
            "pointNumber": 3,
            "gridRef": "E2",
            "lat": 28.101,
            "lon": 77.7878,
            "whiteDeposits": "Yes",
            "soilColor": "Ochre",
            "waterlogging": null,
            "compaction": "No",
            "vegetation": null,
            "notes": null,
            "createdAt": "2026-03-14T09:30:00.000Z"
        }"#;
        let obs: Observation = serde_json::from_str(raw).expect("parse observation");
        assert_eq!(obs.white_deposits, Some(WhiteDeposits::Yes));
        assert_eq!(obs.soil_color, Some(SoilColor::Other("Ochre".to_string())));
        assert_eq!(obs.waterlogging, None);
        assert_eq!(obs.notes, "");
        assert_eq!(obs.created_at, ts());

        let json = serde_json::to_value(&obs).expect("serialize observation");
        assert_eq!(json["pointNumber"], 3);
        assert_eq!(json["soilColor"], "Ochre");
        assert!(json["vegetation"].is_null());
    }
}
