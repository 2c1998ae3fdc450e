//! Core domain logic for the lodging log.
//!
//! This crate turns logged stays into a night-by-night picture of time away
//! from and at home:
//! - Presence timeline: one status per morning in a date range
//! - Interval merging: alternating away and home stay periods
//! - Row pairing and chart layout: pixel geometry for the nights chart
//! - Statistics: ranking periods by length
//! - Regions: rolling stayed-in regions up the region hierarchy

mod collection;
mod error;
pub mod layout;
mod period;
pub mod regions;
mod rows;
pub mod stats;
mod timeline;
pub mod types;

pub use collection::StayCollection;
pub use error::TimelineError;
pub use layout::{ChartLayout, ChartParams};
pub use period::{Segment, StayPeriod, merge_periods};
pub use regions::{Region, RegionSummary, RegionTree};
pub use rows::{Row, pair_rows};
pub use timeline::{DayRecord, PresenceTimeline};
pub use types::{
    AbsenceFlags, AbsenceFlagsError, DateRange, LocationKey, Purpose, RegionKey,
    Status, StayRecord, ValidationError,
};
