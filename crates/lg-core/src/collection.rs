//! The timeline pipeline for one analysis range.

use crate::error::TimelineError;
use crate::period::{StayPeriod, merge_periods};
use crate::rows::{Row, pair_rows};
use crate::stats;
use crate::timeline::PresenceTimeline;
use crate::types::{DateRange, Status, StayRecord};

/// Stay periods for a range, built from the full stay log.
#[derive(Debug, Clone)]
pub struct StayCollection {
    range: DateRange,
    periods: Vec<StayPeriod>,
}

impl StayCollection {
    /// Runs the presence timeline and interval merger over `records`.
    pub fn build(records: &[StayRecord], range: DateRange) -> Result<Self, TimelineError> {
        let timeline = PresenceTimeline::build(records, range)?;
        let periods = merge_periods(timeline.days())?;
        Ok(Self { range, periods })
    }

    #[must_use]
    pub const fn range(&self) -> DateRange {
        self.range
    }

    /// Alternating away and home periods, oldest first.
    #[must_use]
    pub fn periods(&self) -> &[StayPeriod] {
        &self.periods
    }

    /// The periods paired into chart rows.
    #[must_use]
    pub fn rows(&self) -> Vec<Row<'_>> {
        pair_rows(&self.periods)
    }

    /// Periods of `kind`, longest first.
    #[must_use]
    pub fn top(&self, kind: Status) -> Vec<&StayPeriod> {
        stats::top(&self.periods, kind)
    }

    /// Total nights of `kind` in the range.
    #[must_use]
    pub fn total_nights(&self, kind: Status) -> u32 {
        self.periods
            .iter()
            .filter(|p| p.kind() == kind)
            .map(|p| p.nights)
            .sum()
    }
}
