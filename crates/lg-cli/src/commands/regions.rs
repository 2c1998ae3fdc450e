//! Regions command listing regions lived in or stayed in.

use std::fmt::Write as _;
use std::io::Write;

use anyhow::{Context, Result};
use lg_core::RegionTree;
use lg_core::regions::{RegionSummary, summarize};
use lg_db::Database;

const fn yes_no(value: bool) -> &'static str {
    if value { "yes" } else { "no" }
}

/// Formats the summaries as aligned columns.
pub fn format_regions(summaries: &[RegionSummary]) -> String {
    let iso_width = summaries
        .iter()
        .map(|s| s.iso_3166.as_str().len())
        .chain(["ISO 3166".len()])
        .max()
        .unwrap_or_default();
    let name_width = summaries
        .iter()
        .map(|s| s.name.chars().count())
        .chain(["NAME".len()])
        .max()
        .unwrap_or_default();

    let mut output = String::new();
    if summaries.is_empty() {
        let _ = writeln!(output, "No regions recorded.");
        return output;
    }

    let _ = writeln!(
        output,
        "{:<iso_width$}  {:<name_width$}  LIVED IN  STAYED IN",
        "ISO 3166", "NAME"
    );
    for summary in summaries {
        let _ = writeln!(
            output,
            "{:<iso_width$}  {:<name_width$}  {:<8}  {}",
            summary.iso_3166.as_str(),
            summary.name,
            yes_no(summary.lived_in),
            yes_no(summary.stayed_in)
        );
    }
    output
}

/// Runs the regions command.
pub fn run<W: Write>(writer: &mut W, db: &Database, json: bool) -> Result<()> {
    let tree = RegionTree::new(db.regions().context("failed to load regions")?);
    let lived = db.home_region_fids().context("failed to load home regions")?;
    let stayed = db
        .stayed_region_fids(true)
        .context("failed to load stayed regions")?;
    let summaries = summarize(&tree, lived, stayed);

    if json {
        writeln!(writer, "{}", serde_json::to_string_pretty(&summaries)?)?;
    } else {
        write!(writer, "{}", format_regions(&summaries))?;
    }
    Ok(())
}
