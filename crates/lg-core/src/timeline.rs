//! Per-morning presence timeline.
//!
//! Expands logged stays into one [`DayRecord`] per morning of a [`DateRange`].
//! Mornings not claimed by any stay are spent at home.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde::Serialize;

use crate::error::TimelineError;
use crate::types::{DateRange, LocationKey, Purpose, Status, StayRecord};

/// Where the traveler was on the night ending on `morning`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DayRecord {
    pub morning: NaiveDate,
    pub status: Status,
    /// Trip purpose; `None` for home nights.
    pub purpose: Option<Purpose>,
    /// Stay location; `None` for home nights.
    pub location: Option<LocationKey>,
}

/// The stay that claimed a given morning.
#[derive(Debug, Clone, Copy)]
struct Claim<'a> {
    record: &'a StayRecord,
}

/// Classifies one morning given the stay claiming it, if any.
fn classify_morning(morning: NaiveDate, claim: Option<Claim<'_>>) -> DayRecord {
    match claim {
        Some(Claim { record }) => DayRecord {
            morning,
            status: Status::Away,
            purpose: Some(record.purpose()),
            location: Some(record.location().clone()),
        },
        None => DayRecord {
            morning,
            status: Status::Home,
            purpose: None,
            location: None,
        },
    }
}

/// A gap-free daily status series over a date range.
#[derive(Debug, Clone)]
pub struct PresenceTimeline {
    range: DateRange,
    days: Vec<DayRecord>,
}

impl PresenceTimeline {
    /// Builds the timeline for `range` from the full stay log.
    ///
    /// Every present night in the log is checked for double booking, including
    /// nights outside `range`.
    pub fn build(records: &[StayRecord], range: DateRange) -> Result<Self, TimelineError> {
        let mut claims: BTreeMap<NaiveDate, Claim<'_>> = BTreeMap::new();

        for record in records {
            for morning in record.present_mornings() {
                if let Some(existing) = claims.insert(morning, Claim { record }) {
                    return Err(TimelineError::DuplicateNight {
                        morning,
                        first: existing.record.location().clone(),
                        second: record.location().clone(),
                    });
                }
            }
        }

        let outside = claims.keys().filter(|m| !range.contains(**m)).count();
        let ignored = records
            .iter()
            .filter(|r| r.present_mornings().all(|m| !range.contains(m)))
            .count();
        if ignored > 0 {
            tracing::warn!(
                ignored,
                start_evening = %range.start_evening(),
                thru_morning = %range.thru_morning(),
                "stays fall entirely outside the range"
            );
        }

        let days: Vec<DayRecord> = range
            .mornings()
            .map(|morning| classify_morning(morning, claims.get(&morning).copied()))
            .collect();

        tracing::debug!(
            records = records.len(),
            away_nights = claims.len() - outside,
            days = days.len(),
            "built presence timeline"
        );

        Ok(Self { range, days })
    }

    #[must_use]
    pub const fn range(&self) -> DateRange {
        self.range
    }

    #[must_use]
    pub fn days(&self) -> &[DayRecord] {
        &self.days
    }
}
