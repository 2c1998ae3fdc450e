//! Ranking of stay periods by length.

use crate::error::TimelineError;
use crate::period::StayPeriod;
use crate::types::Status;

/// Returns periods of `kind`, longest first.
///
/// The sort is stable: periods of equal length stay in chronological order.
pub fn top<'a>(
    periods: impl IntoIterator<Item = &'a StayPeriod>,
    kind: Status,
) -> Vec<&'a StayPeriod> {
    let mut ranked: Vec<&StayPeriod> = periods
        .into_iter()
        .filter(|p| p.kind() == kind)
        .collect();
    ranked.sort_by_key(|p| std::cmp::Reverse(p.nights));
    ranked
}

/// Returns the longest period of `kind`, the earliest one on ties.
pub fn longest<'a>(
    periods: impl IntoIterator<Item = &'a StayPeriod>,
    kind: Status,
) -> Result<&'a StayPeriod, TimelineError> {
    top(periods, kind)
        .into_iter()
        .next()
        .ok_or(TimelineError::InsufficientPeriods { kind })
}
