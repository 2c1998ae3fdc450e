//! Stats command listing the longest home and away periods.

use std::fmt::Write as _;
use std::io::Write;

use anyhow::Result;
use chrono::NaiveDate;
use lg_core::{Status, StayCollection, StayPeriod};
use lg_db::Database;
use serde::Serialize;

use crate::cli::RangeArgs;
use crate::commands::util;

/// One ranked period for JSON output.
#[derive(Debug, Serialize)]
struct JsonPeriod {
    rank: usize,
    start_evening: NaiveDate,
    thru_morning: NaiveDate,
    nights: u32,
    label: String,
}

#[derive(Debug, Serialize)]
struct JsonStats {
    start_evening: NaiveDate,
    thru_morning: NaiveDate,
    home_nights: u32,
    away_nights: u32,
    home: Vec<JsonPeriod>,
    away: Vec<JsonPeriod>,
}

fn ranked(collection: &StayCollection, kind: Status, limit: Option<usize>) -> Vec<&StayPeriod> {
    let mut top = collection.top(kind);
    if let Some(limit) = limit {
        top.truncate(limit);
    }
    top
}

/// Formats the statistics text file.
pub fn format_stats(collection: &StayCollection, limit: Option<usize>) -> String {
    let range = collection.range();
    let mut output = String::new();

    let _ = writeln!(
        output,
        "Statistics for stays from {} to {}:",
        range.start_evening(),
        range.thru_morning()
    );

    for (heading, kind) in [("home", Status::Home), ("away", Status::Away)] {
        let _ = writeln!(output);
        let _ = writeln!(output, "Top longest {heading} stays:");
        for (i, period) in ranked(collection, kind, limit).iter().enumerate() {
            let _ = writeln!(output, "  #{}\t{period}", i + 1);
        }
    }

    output
}

/// Formats the statistics as JSON.
pub fn format_stats_json(collection: &StayCollection, limit: Option<usize>) -> Result<String> {
    let to_json = |kind| -> Vec<JsonPeriod> {
        ranked(collection, kind, limit)
            .into_iter()
            .enumerate()
            .map(|(i, period)| JsonPeriod {
                rank: i + 1,
                start_evening: period.start_date,
                thru_morning: period.end_date,
                nights: period.nights,
                label: period.date_range_label(),
            })
            .collect()
    };

    let range = collection.range();
    let stats = JsonStats {
        start_evening: range.start_evening(),
        thru_morning: range.thru_morning(),
        home_nights: collection.total_nights(Status::Home),
        away_nights: collection.total_nights(Status::Away),
        home: to_json(Status::Home),
        away: to_json(Status::Away),
    };
    Ok(serde_json::to_string_pretty(&stats)?)
}

/// Runs the stats command.
pub fn run<W: Write>(
    writer: &mut W,
    db: &Database,
    range: RangeArgs,
    limit: Option<usize>,
    json: bool,
) -> Result<()> {
    let range = util::resolve_range(db, range, util::today())?;
    let collection = util::load_collection(db, range)?;

    if json {
        writeln!(writer, "{}", format_stats_json(&collection, limit)?)?;
    } else {
        write!(writer, "{}", format_stats(&collection, limit))?;
    }
    Ok(())
}
