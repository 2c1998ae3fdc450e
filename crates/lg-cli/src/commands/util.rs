//! Shared utilities for CLI commands.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use anyhow::{Context, Result};
use chrono::{Duration, Local, NaiveDate};
use lg_core::{DateRange, StayCollection};
use lg_db::Database;

use crate::cli::RangeArgs;

/// Today's date in the local time zone.
pub fn today() -> NaiveDate {
    Local::now().date_naive()
}

/// Resolves the analysis range, filling in defaults from the log.
///
/// The start evening defaults to the evening before the first logged night;
/// the thru morning defaults to `today`.
pub fn resolve_range(db: &Database, args: RangeArgs, today: NaiveDate) -> Result<DateRange> {
    let start_evening = match args.start_evening {
        Some(date) => date,
        None => {
            let first = db
                .first_morning()
                .context("failed to find the first logged night")?
                .context("no stays logged; pass --start-evening to set the range")?;
            first - Duration::days(1)
        }
    };
    let thru_morning = args.thru_morning.unwrap_or(today);

    DateRange::new(start_evening, thru_morning).with_context(|| {
        format!("invalid range: evening of {start_evening} thru morning of {thru_morning}")
    })
}

/// Loads every stay and builds the periods for `range`.
pub fn load_collection(db: &Database, range: DateRange) -> Result<StayCollection> {
    let stays = db.stays().context("failed to load stays")?;
    StayCollection::build(&stays, range).context("failed to build stay periods")
}

/// Writes an output file through a buffered writer, creating parent directories.
pub fn write_file<F>(path: &Path, write: F) -> Result<()>
where
    F: FnOnce(&mut BufWriter<File>) -> std::io::Result<()>,
{
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("failed to create {}", parent.display()))?;
    }
    let file =
        File::create(path).with_context(|| format!("failed to create {}", path.display()))?;
    let mut writer = BufWriter::new(file);
    write(&mut writer).with_context(|| format!("failed to write {}", path.display()))?;
    writer
        .flush()
        .with_context(|| format!("failed to flush {}", path.display()))?;
    tracing::info!(path = %path.display(), "wrote output file");
    Ok(())
}

/// Formats a date as `5 Jun 2021`.
pub fn format_date(date: NaiveDate) -> String {
    date.format("%-d %b %Y").to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use lg_core::Purpose;
    use lg_db::NewStay;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_format_date_drops_zero_padding() {
        assert_eq!(format_date(date(2021, 6, 5)), "5 Jun 2021");
        assert_eq!(format_date(date(2022, 12, 31)), "31 Dec 2022");
    }

    #[test]
    fn test_resolve_range_defaults_from_log() {
        let mut db = Database::open_in_memory().unwrap();
        let hotel = db
            .insert_stay_location("hotel", "Hotel", "Hotel", None)
            .unwrap();
        db.insert_stays(&[NewStay {
            check_out_date: date(2021, 6, 5),
            nights: 3,
            purpose: Purpose::Business,
            stay_location_fid: hotel,
            absence_flags: None,
        }])
        .unwrap();

        let range = resolve_range(&db, RangeArgs::default(), date(2021, 7, 1)).unwrap();
        assert_eq!(range.start_evening(), date(2021, 6, 1));
        assert_eq!(range.thru_morning(), date(2021, 7, 1));

        let explicit = RangeArgs {
            start_evening: Some(date(2021, 1, 1)),
            thru_morning: Some(date(2021, 2, 1)),
        };
        let range = resolve_range(&db, explicit, date(2021, 7, 1)).unwrap();
        assert_eq!(range.nights(), 31);
    }

    #[test]
    fn test_resolve_range_needs_stays_or_start() {
        let db = Database::open_in_memory().unwrap();
        let err = resolve_range(&db, RangeArgs::default(), date(2021, 7, 1)).unwrap_err();
        assert!(err.to_string().contains("--start-evening"));
    }

    #[test]
    fn test_resolve_range_rejects_empty_range() {
        let db = Database::open_in_memory().unwrap();
        let args = RangeArgs {
            start_evening: Some(date(2021, 7, 1)),
            thru_morning: Some(date(2021, 7, 1)),
        };
        assert!(resolve_range(&db, args, date(2021, 7, 1)).is_err());
    }

    #[test]
    fn test_write_file_creates_parent_dirs() {
        let temp = tempfile::tempdir().unwrap();
        let path = temp.path().join("out/nested/report.txt");
        write_file(&path, |w| writeln!(w, "hello")).unwrap();
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "hello\n");
    }
}
