//! Errors raised by the timeline engine.
//!
//! Every variant is fatal for the report being generated: inputs are
//! deterministic in-memory data, so a failure means bad input or a broken
//! upstream invariant.

use chrono::NaiveDate;
use thiserror::Error;

use crate::types::{AbsenceFlagsError, LocationKey, Status, ValidationError};

/// Errors from building, merging, ranking, or laying out stay periods.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TimelineError {
    /// Two stay records claim the same night.
    #[error("night ending {morning} is claimed by both {first} and {second}")]
    DuplicateNight {
        morning: NaiveDate,
        first: LocationKey,
        second: LocationKey,
    },

    /// The analysis range contains no mornings.
    #[error("analysis range contains no nights")]
    EmptyRange,

    /// No period of the requested kind exists.
    #[error("no {kind} periods in range")]
    InsufficientPeriods { kind: Status },

    /// A stay's absence flags do not describe its nights.
    #[error("malformed absence flags for stay checking out {checkout_date}")]
    MalformedAbsenceFlags {
        checkout_date: NaiveDate,
        #[source]
        source: AbsenceFlagsError,
    },

    /// Chart layout was requested for an empty row list.
    #[error("cannot lay out a chart with no rows")]
    EmptyLayout,

    /// A field failed validation.
    #[error(transparent)]
    Validation(#[from] ValidationError),
}
