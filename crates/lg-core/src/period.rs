//! Stay periods and the interval merger.
//!
//! Run-length encodes a daily presence series into alternating Away and Home
//! [`StayPeriod`]s.

use std::fmt;

use chrono::{Datelike, Duration, NaiveDate};
use serde::Serialize;

use crate::error::TimelineError;
use crate::timeline::DayRecord;
use crate::types::{LocationKey, Purpose, Status};

/// A run of consecutive nights at one location for one purpose.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Segment {
    pub location: Option<LocationKey>,
    pub purpose: Option<Purpose>,
    /// Evening before the first night.
    pub start: NaiveDate,
    /// Morning after the last night.
    pub end: NaiveDate,
    pub nights: u32,
}

impl Segment {
    fn from_day(day: &DayRecord) -> Self {
        Self {
            location: day.location.clone(),
            purpose: day.purpose,
            start: day.morning - Duration::days(1),
            end: day.morning,
            nights: 1,
        }
    }

    fn matches(&self, day: &DayRecord) -> bool {
        self.location == day.location && self.purpose == day.purpose
    }
}

/// A contiguous run of nights either away from home or at home.
///
/// Away periods may span several back-to-back stays; each is kept as a
/// [`Segment`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StayPeriod {
    pub is_away: bool,
    /// Evening before the first night.
    pub start_date: NaiveDate,
    /// Morning after the last night.
    pub end_date: NaiveDate,
    pub nights: u32,
    /// One purpose per night for away periods; empty for home periods.
    pub purposes: Vec<Purpose>,
    pub segments: Vec<Segment>,
}

impl StayPeriod {
    /// Starts a one-night period from a day.
    fn from_day(day: &DayRecord) -> Self {
        let is_away = day.status == Status::Away;
        Self {
            is_away,
            start_date: day.morning - Duration::days(1),
            end_date: day.morning,
            nights: 1,
            purposes: if is_away {
                day.purpose.into_iter().collect()
            } else {
                Vec::new()
            },
            segments: vec![Segment::from_day(day)],
        }
    }

    /// Extends the period by the night ending on `day.morning`.
    fn append(&mut self, day: &DayRecord) {
        self.nights += 1;
        self.end_date = day.morning;
        if self.is_away {
            self.purposes.extend(day.purpose);
        }
        match self.segments.last_mut() {
            Some(last) if last.matches(day) => {
                last.nights += 1;
                last.end = day.morning;
            }
            _ => self.segments.push(Segment::from_day(day)),
        }
    }

    #[must_use]
    pub const fn kind(&self) -> Status {
        if self.is_away { Status::Away } else { Status::Home }
    }

    /// Morning after the first night of the period.
    #[must_use]
    pub fn first_morning(&self) -> NaiveDate {
        self.start_date + Duration::days(1)
    }

    /// Returns true if the night ending on `morning` belongs to this period.
    #[must_use]
    pub fn contains(&self, morning: NaiveDate) -> bool {
        self.start_date < morning && morning <= self.end_date
    }

    /// Iterates over the mornings of the period, oldest first.
    pub fn mornings(&self) -> impl Iterator<Item = NaiveDate> + '_ {
        (1..=i64::from(self.nights)).map(|i| self.start_date + Duration::days(i))
    }

    /// Human-readable date span, omitting repeated month and year parts.
    ///
    /// `3–5 Jun 2021`, `30 May–2 Jun 2021`, `28 Dec 2021–2 Jan 2022`.
    #[must_use]
    pub fn date_range_label(&self) -> String {
        let start = self.start_date;
        let end = self.end_date;
        let start_label = if start.year() != end.year() {
            format!("{} {} {}", start.day(), start.format("%b"), start.year())
        } else if start.month() != end.month() {
            format!("{} {}", start.day(), start.format("%b"))
        } else {
            start.day().to_string()
        };
        format!(
            "{start_label}\u{2013}{} {} {}",
            end.day(),
            end.format("%b"),
            end.year()
        )
    }
}

impl fmt::Display for StayPeriod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let kind = if self.is_away { "Away" } else { "Home" };
        let plural = if self.nights == 1 { "" } else { "s" };
        write!(
            f,
            "{kind} thru {} ({} night{plural})",
            self.end_date, self.nights
        )
    }
}

/// Merges a chronological day series into alternating stay periods.
pub fn merge_periods(days: &[DayRecord]) -> Result<Vec<StayPeriod>, TimelineError> {
    if days.is_empty() {
        return Err(TimelineError::EmptyRange);
    }

    let mut periods: Vec<StayPeriod> = Vec::new();
    let mut previous: Option<Status> = None;

    for day in days {
        match periods.last_mut() {
            Some(current) if previous == Some(day.status) => current.append(day),
            _ => periods.push(StayPeriod::from_day(day)),
        }
        previous = Some(day.status);
    }

    tracing::debug!(
        days = days.len(),
        periods = periods.len(),
        "merged stay periods"
    );
    Ok(periods)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn home(morning: NaiveDate) -> DayRecord {
        DayRecord {
            morning,
            status: Status::Home,
            purpose: None,
            location: None,
        }
    }

    fn away(morning: NaiveDate, location: &str, purpose: Purpose) -> DayRecord {
        DayRecord {
            morning,
            status: Status::Away,
            purpose: Some(purpose),
            location: Some(LocationKey::new(location).unwrap()),
        }
    }

    /// Builds days from a status string such as `"HHAAAHHHAH"` starting on
    /// 2021-06-01.
    fn days_from(pattern: &str) -> Vec<DayRecord> {
        pattern
            .chars()
            .enumerate()
            .map(|(i, c)| {
                let morning = date(2021, 6, 1) + Duration::days(i as i64);
                if c == 'A' {
                    away(morning, "hotel", Purpose::Business)
                } else {
                    home(morning)
                }
            })
            .collect()
    }

    #[test]
    fn merges_status_runs() {
        let periods = merge_periods(&days_from("HHAAAHHHAH")).unwrap();
        let summary: Vec<_> = periods.iter().map(|p| (p.is_away, p.nights)).collect();
        assert_eq!(
            summary,
            vec![(false, 2), (true, 3), (false, 3), (true, 1), (false, 1)]
        );

        assert_eq!(periods[0].start_date, date(2021, 5, 31));
        assert_eq!(periods[0].end_date, date(2021, 6, 2));
        assert_eq!(periods[1].first_morning(), date(2021, 6, 3));
        assert_eq!(periods[1].end_date, date(2021, 6, 5));
    }

    #[test]
    fn periods_alternate_and_partition_the_range() {
        let days = days_from("AHHAAHAAAAHHHHHAH");
        let periods = merge_periods(&days).unwrap();

        for pair in periods.windows(2) {
            assert_ne!(pair[0].is_away, pair[1].is_away);
            assert_eq!(pair[0].end_date, pair[1].start_date);
        }
        let total: u32 = periods.iter().map(|p| p.nights).sum();
        assert_eq!(total as usize, days.len());

        for period in &periods {
            assert_eq!(
                i64::from(period.nights),
                (period.end_date - period.start_date).num_days()
            );
            if period.is_away {
                assert_eq!(period.purposes.len(), period.nights as usize);
            } else {
                assert!(period.purposes.is_empty());
            }
            let segment_nights: u32 = period.segments.iter().map(|s| s.nights).sum();
            assert_eq!(segment_nights, period.nights);
        }
    }

    #[test]
    fn segments_split_on_location_or_purpose_change() {
        let days = vec![
            away(date(2021, 6, 1), "a", Purpose::Business),
            away(date(2021, 6, 2), "a", Purpose::Business),
            away(date(2021, 6, 3), "a", Purpose::Personal),
            away(date(2021, 6, 4), "b", Purpose::Personal),
            away(date(2021, 6, 5), "b", Purpose::Personal),
        ];
        let periods = merge_periods(&days).unwrap();
        assert_eq!(periods.len(), 1);

        let segments: Vec<_> = periods[0]
            .segments
            .iter()
            .map(|s| (s.location.as_ref().unwrap().as_str(), s.purpose, s.nights))
            .collect();
        assert_eq!(
            segments,
            vec![
                ("a", Some(Purpose::Business), 2),
                ("a", Some(Purpose::Personal), 1),
                ("b", Some(Purpose::Personal), 2),
            ]
        );
        assert_eq!(periods[0].segments[1].start, date(2021, 6, 2));
        assert_eq!(periods[0].segments[2].end, date(2021, 6, 5));
        assert_eq!(
            periods[0].purposes,
            vec![
                Purpose::Business,
                Purpose::Business,
                Purpose::Personal,
                Purpose::Personal,
                Purpose::Personal
            ]
        );
    }

    #[test]
    fn empty_day_series_is_rejected() {
        assert_eq!(merge_periods(&[]), Err(TimelineError::EmptyRange));
    }

    #[test]
    fn display_and_date_range_label() {
        let periods = merge_periods(&days_from("HHAAAHHHAH")).unwrap();
        assert_eq!(periods[1].to_string(), "Away thru 2021-06-05 (3 nights)");
        assert_eq!(periods[3].to_string(), "Away thru 2021-06-09 (1 night)");
        assert_eq!(periods[1].date_range_label(), "2\u{2013}5 Jun 2021");
        assert_eq!(periods[0].date_range_label(), "31 May\u{2013}2 Jun 2021");

        let new_year = merge_periods(&[
            home(date(2021, 12, 31)),
            home(date(2022, 1, 1)),
        ])
        .unwrap();
        assert_eq!(
            new_year[0].date_range_label(),
            "30 Dec 2021\u{2013}1 Jan 2022"
        );
    }
}
