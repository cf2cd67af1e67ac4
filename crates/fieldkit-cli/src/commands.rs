use anyhow::{bail, Context, Result};
use chrono::{DateTime, Local, NaiveDate, Utc};
use clap::Args;
use fieldkit_core::model::answer_text;
use fieldkit_core::{
    Compaction, ExportOutcome, Observation, ObservationDraft, Position, SoilColor, Vegetation,
    Waterlogging, WhiteDeposits,
};
use fieldkit_session::{FieldSession, LocationEvent};
use fieldkit_storage::KvStore;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;
use tracing::warn;

use crate::config::FieldkitConfig;
use crate::sink::{FileSink, StdoutSink};

#[derive(Args, Debug, Default)]
pub struct RecordArgs {
    /// Sampling point number
    pub point: u32,
    /// Yes / Slight / No
    #[arg(long)]
    pub white_deposits: Option<String>,
    /// Dark / Medium / Pale
    #[arg(long)]
    pub soil_color: Option<String>,
    /// Yes / No
    #[arg(long)]
    pub waterlogging: Option<String>,
    /// Yes / No
    #[arg(long)]
    pub compaction: Option<String>,
    /// Healthy / Stunted / Patchy / Absent
    #[arg(long)]
    pub vegetation: Option<String>,
    #[arg(long, default_value = "")]
    pub notes: String,
}

#[derive(Args, Debug)]
pub struct ExportArgs {
    /// Print the CSV instead of writing a file
    #[arg(long)]
    pub stdout: bool,
    /// Output directory (defaults to the configured export dir)
    #[arg(long)]
    pub dir: Option<std::path::PathBuf>,
}

#[derive(Args, Debug)]
pub struct ChecklistArgs {
    /// Mark an item (by index) as packed
    #[arg(long)]
    pub check: Option<usize>,
    /// Mark an item (by index) as not packed
    #[arg(long)]
    pub uncheck: Option<usize>,
}

pub fn list_points<K: KvStore>(session: &FieldSession<K>) {
    let progress = session.progress();
    println!(
        "{} ({} of {} recorded, {} sampled)",
        session.plan().name,
        progress.observed_count(),
        progress.points.len(),
        progress.sampled_count()
    );
    for point in &session.plan().points {
        let observed = session.observation(point.number).is_some();
        let sampled = session.is_sample_taken(point.number);
        let marker = if progress.current == Some(point.number) {
            ">"
        } else {
            " "
        };
        println!(
            "{marker} {:>3}  {:<4} {:.6}, {:.6}  {:<6}  sample:{}  data:{}",
            point.number,
            point.grid,
            point.lat,
            point.lon,
            point.elevation,
            check_mark(sampled),
            check_mark(observed)
        );
    }
}

pub fn show_point<K: KvStore>(
    session: &mut FieldSession<K>,
    number: u32,
    at: Option<Position>,
) -> Result<()> {
    if let Some(position) = at {
        session.update_position(position);
    }
    let status = session.select_point(number)?;
    let point = &status.point;
    println!("Point {} ({})", point.number, point.grid);
    println!("  location:  {:.5}, {:.5}", point.lat, point.lon);
    println!("  elevation: {}", point.elevation);
    let sample = if status.sample_taken {
        "taken"
    } else {
        "pending"
    };
    println!("  sample:    {sample}");
    match status.summary() {
        Some(summary) => println!("  {summary}"),
        None => println!("  no observation recorded"),
    }
    println!("  {}", status.proximity);
    if status.proximity.exceeds_threshold() {
        println!("  warning: you are not at the sampling point");
    }
    println!("  directions: {}", session.navigation_url(number)?);
    Ok(())
}

pub fn record<K: KvStore>(session: &mut FieldSession<K>, args: RecordArgs) -> Result<()> {
    let point = args.point;
    let draft = draft_from_args(args);
    let observation = session
        .record_observation(point, draft)
        .with_context(|| format!("Failed to record point {point}"))?;
    println!("Point {} data recorded ({})", point, observation.id);
    if session.sync_enabled() {
        println!("  syncing to remote store in the background");
    }
    Ok(())
}

pub fn sample_done<K: KvStore>(session: &mut FieldSession<K>, number: u32) -> Result<()> {
    session
        .mark_sample_taken(number)
        .with_context(|| format!("Failed to mark sample {number}"))?;
    println!("Sample {number} marked complete");
    Ok(())
}

pub fn list_observations<K: KvStore>(session: &FieldSession<K>) {
    let observations = session.observations();
    if observations.is_empty() {
        println!("No observations recorded yet.");
        return;
    }
    for obs in &observations {
        println!("{}", format_observation(obs));
    }
}

pub fn export<K: KvStore>(
    session: &FieldSession<K>,
    config: &FieldkitConfig,
    args: ExportArgs,
) -> Result<()> {
    let today = export_date(Utc::now());
    let outcome = if args.stdout {
        session.export(&mut StdoutSink, today)?
    } else {
        let dir = args.dir.unwrap_or_else(|| config.export_dir());
        let mut sink = FileSink::new(dir);
        let outcome = session.export(&mut sink, today)?;
        if let Some(path) = sink.written() {
            eprintln!("CSV exported to {}", path.display());
        }
        outcome
    };
    if outcome == ExportOutcome::NothingToExport {
        eprintln!("No data to export");
    }
    Ok(())
}

pub fn clear<K: KvStore>(session: &mut FieldSession<K>, confirmed: bool) -> Result<()> {
    if !confirmed {
        bail!("Refusing to delete all observations without --yes (this cannot be undone)");
    }
    session.clear_observations()?;
    println!("All data cleared");
    Ok(())
}

pub fn checklist<K: KvStore>(session: &mut FieldSession<K>, args: ChecklistArgs) -> Result<()> {
    if let Some(index) = args.check {
        session.set_checklist_item(index, true)?;
    }
    if let Some(index) = args.uncheck {
        session.set_checklist_item(index, false)?;
    }
    for item in session.checklist() {
        println!("[{}] {} {}", check_mark(item.checked), item.index, item.label);
    }
    Ok(())
}

/// Follows `lat,lon[,accuracy]` lines on stdin as the location sensor and
/// prints proximity to `number` after every fix.
pub async fn track<K: KvStore>(session: &mut FieldSession<K>, number: u32) -> Result<()> {
    let status = session.select_point(number)?;
    println!(
        "Tracking distance to point {} ({}); one fix per line, Ctrl-D to stop",
        status.point.number, status.point.grid
    );

    let (tx, rx) = mpsc::channel(64);
    let reader = tokio::spawn(async move {
        let mut lines = BufReader::new(tokio::io::stdin()).lines();
        loop {
            let event = match lines.next_line().await {
                Ok(Some(line)) if line.trim().is_empty() => continue,
                Ok(Some(line)) => match parse_position(&line) {
                    Ok(position) => LocationEvent::Fix(position),
                    Err(err) => LocationEvent::Error(err),
                },
                Ok(None) => break,
                Err(err) => {
                    warn!(event = "stdin_read_failed", error = %err);
                    break;
                }
            };
            if tx.send(event).await.is_err() {
                break;
            }
        }
    });

    let fixes = session
        .run_location_stream(rx, |position, proximity| {
            let warning = if proximity.exceeds_threshold() {
                "  (too far)"
            } else {
                ""
            };
            println!(
                "{:.6}, {:.6} ±{}m  {}{}",
                position.lat,
                position.lon,
                position.accuracy_m.round(),
                proximity,
                warning
            );
        })
        .await;
    reader.await.context("Location reader task failed")?;
    println!("{fixes} fixes processed");
    Ok(())
}

/// File names carry the UTC date, like the exported timestamps.
pub fn export_date(now: DateTime<Utc>) -> NaiveDate {
    now.date_naive()
}

/// Parses `lat,lon` or `lat,lon,accuracy` (accuracy defaults to 0).
pub fn parse_position(input: &str) -> std::result::Result<Position, String> {
    let parts: Vec<&str> = input.split(',').map(str::trim).collect();
    if !(2..=3).contains(&parts.len()) {
        return Err(format!("expected lat,lon[,accuracy], got {input:?}"));
    }
    let number = |raw: &str, what: &str| {
        raw.parse::<f64>()
            .ok()
            .filter(|value| value.is_finite())
            .ok_or_else(|| format!("invalid {what}: {raw:?}"))
    };
    let lat = number(parts[0], "latitude")?;
    let lon = number(parts[1], "longitude")?;
    let accuracy_m = match parts.get(2) {
        Some(raw) => number(raw, "accuracy")?,
        None => 0.0,
    };
    Ok(Position::new(lat, lon, accuracy_m))
}

pub fn draft_from_args(args: RecordArgs) -> ObservationDraft {
    ObservationDraft {
        white_deposits: answer::<WhiteDeposits>("white-deposits", args.white_deposits),
        soil_color: answer::<SoilColor>("soil-color", args.soil_color),
        waterlogging: answer::<Waterlogging>("waterlogging", args.waterlogging),
        compaction: answer::<Compaction>("compaction", args.compaction),
        vegetation: answer::<Vegetation>("vegetation", args.vegetation),
        notes: args.notes,
    }
}

pub fn format_observation(obs: &Observation) -> String {
    let mut out = format!(
        "Point {} ({})  deposits:{} color:{} waterlog:{} compact:{} veg:{}  {}",
        obs.point_number,
        obs.grid_ref,
        answer_text(obs.white_deposits.as_ref()),
        answer_text(obs.soil_color.as_ref()),
        answer_text(obs.waterlogging.as_ref()),
        answer_text(obs.compaction.as_ref()),
        answer_text(obs.vegetation.as_ref()),
        obs.created_at
            .with_timezone(&Local)
            .format("%Y-%m-%d %H:%M")
    );
    if !obs.notes.is_empty() {
        out.push_str(&format!("\n    {}", obs.notes));
    }
    out
}

/// Blank answers stay unanswered; values outside the option set are kept
/// but logged.
fn answer<T>(field: &str, raw: Option<String>) -> Option<T>
where
    T: for<'a> From<&'a str> + KnownOption,
{
    let raw = raw?;
    if raw.trim().is_empty() {
        return None;
    }
    let value = T::from(raw.as_str());
    if !value.known() {
        warn!(event = "unlisted_answer", field, value = %raw);
    }
    Some(value)
}

pub trait KnownOption {
    fn known(&self) -> bool;
}

macro_rules! known_option {
    ($($ty:ty),+) => {
        $(impl KnownOption for $ty {
            fn known(&self) -> bool {
                self.is_known()
            }
        })+
    };
}

known_option!(WhiteDeposits, SoilColor, Waterlogging, Compaction, Vegetation);

fn check_mark(done: bool) -> &'static str {
    if done {
        "x"
    } else {
        " "
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn positions_parse_with_optional_accuracy() {
        assert_eq!(
            parse_position("28.1, 77.788"),
            Ok(Position::new(28.1, 77.788, 0.0))
        );
        assert_eq!(
            parse_position("28.1,77.788,4.5"),
            Ok(Position::new(28.1, 77.788, 4.5))
        );
        assert!(parse_position("28.1").is_err());
        assert!(parse_position("north,77.7").is_err());
        assert!(parse_position("NaN,77.7").is_err());
        assert!(parse_position("1,2,3,4").is_err());
    }

    #[test]
    fn export_date_follows_utc_near_midnight() {
        use chrono::TimeZone;

        let late = Utc
            .with_ymd_and_hms(2026, 3, 14, 23, 45, 0)
            .single()
            .expect("valid timestamp");
        assert_eq!(
            export_date(late),
            NaiveDate::from_ymd_opt(2026, 3, 14).expect("valid date")
        );
        let early = Utc
            .with_ymd_and_hms(2026, 3, 15, 0, 5, 0)
            .single()
            .expect("valid timestamp");
        assert_eq!(
            export_date(early),
            NaiveDate::from_ymd_opt(2026, 3, 15).expect("valid date")
        );
    }

    #[test]
    fn draft_maps_blank_and_unlisted_answers() {
        let draft = draft_from_args(RecordArgs {
            point: 3,
            white_deposits: Some("yes".to_string()),
            soil_color: Some(" ".to_string()),
            waterlogging: None,
            compaction: Some("No".to_string()),
            vegetation: Some("Lush".to_string()),
            notes: "by the gate".to_string(),
        });
        assert_eq!(draft.white_deposits, Some(WhiteDeposits::Yes));
        assert_eq!(draft.soil_color, None);
        assert_eq!(draft.waterlogging, None);
        assert_eq!(draft.compaction, Some(Compaction::No));
        assert_eq!(draft.vegetation, Some(Vegetation::Other("Lush".to_string())));
        assert_eq!(draft.notes, "by the gate");
    }
}
