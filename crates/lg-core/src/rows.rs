//! Pairing of stay periods into chart rows.

use chrono::NaiveDate;
use serde::Serialize;

use crate::period::StayPeriod;

/// One chart row: an away period followed by the home period after it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Row<'a> {
    /// `None` only on the first row, when the range begins at home.
    pub away: Option<&'a StayPeriod>,
    /// `None` only on the last row, when the range ends mid-trip.
    pub home: Option<&'a StayPeriod>,
}

impl Row<'_> {
    /// Evening before the row's first night.
    #[must_use]
    pub fn start_date(&self) -> Option<NaiveDate> {
        self.away.or(self.home).map(|p| p.start_date)
    }

    /// Morning after the row's last night.
    #[must_use]
    pub fn end_date(&self) -> Option<NaiveDate> {
        self.home.or(self.away).map(|p| p.end_date)
    }

    /// Returns true if the night ending on `morning` is drawn on this row.
    #[must_use]
    pub fn contains(&self, morning: NaiveDate) -> bool {
        match (self.start_date(), self.end_date()) {
            (Some(start), Some(end)) => start < morning && morning <= end,
            _ => false,
        }
    }
}

/// Pairs alternating periods into rows that always start with an away slot.
///
/// Periods must alternate, as produced by
/// [`merge_periods`](crate::merge_periods).
pub fn pair_rows(periods: &[StayPeriod]) -> Vec<Row<'_>> {
    let mut slots: Vec<Option<&StayPeriod>> = Vec::with_capacity(periods.len() + 1);
    if periods.first().is_some_and(|p| !p.is_away) {
        slots.push(None);
    }
    slots.extend(periods.iter().map(Some));

    let rows: Vec<Row<'_>> = slots
        .chunks(2)
        .map(|pair| Row {
            away: pair[0],
            home: pair.get(1).copied().flatten(),
        })
        .collect();

    tracing::debug!(periods = periods.len(), rows = rows.len(), "paired rows");
    rows
}
