//! Core type definitions with validation.

use std::fmt;

use chrono::{Duration, NaiveDate};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::error::TimelineError;

/// Validation errors for core types.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// The provided value was empty.
    #[error("{field} cannot be empty")]
    Empty { field: &'static str },

    /// Invalid trip purpose value.
    #[error("invalid purpose: {value}")]
    InvalidPurpose { value: String },

    /// Invalid status value.
    #[error("invalid status: {value}")]
    InvalidStatus { value: String },

    /// A stay must last at least one night.
    #[error("stay checking out {checkout_date} has no nights")]
    ZeroNights { checkout_date: NaiveDate },
}

/// Why a trip was taken.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Purpose {
    Business,
    Personal,
}

impl Purpose {
    /// String representation for storage.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Business => "Business",
            Self::Personal => "Personal",
        }
    }
}

impl fmt::Display for Purpose {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Purpose {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.eq_ignore_ascii_case("business") {
            Ok(Self::Business)
        } else if s.eq_ignore_ascii_case("personal") {
            Ok(Self::Personal)
        } else {
            Err(ValidationError::InvalidPurpose {
                value: s.to_string(),
            })
        }
    }
}

/// Where the traveler slept on a given night.
///
/// Also used as the kind of a [`StayPeriod`](crate::StayPeriod) when ranking.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Status {
    Home,
    Away,
}

impl Status {
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Home => "home",
            Self::Away => "away",
        }
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Status {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "home" => Ok(Self::Home),
            "away" => Ok(Self::Away),
            _ => Err(ValidationError::InvalidStatus {
                value: s.to_string(),
            }),
        }
    }
}

/// Generates a validated string key newtype with common trait implementations.
macro_rules! define_string_key {
    (
        $(#[$meta:meta])*
        $name:ident, $field_name:literal
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(try_from = "String", into = "String")]
        pub struct $name(String);

        impl $name {
            /// Creates a new key after validation.
            pub fn new(key: impl Into<String>) -> Result<Self, ValidationError> {
                let key = key.into();
                if key.is_empty() {
                    return Err(ValidationError::Empty { field: $field_name });
                }
                Ok(Self(key))
            }

            /// Returns the key as a string slice.
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl TryFrom<String> for $name {
            type Error = ValidationError;

            fn try_from(value: String) -> Result<Self, Self::Error> {
                Self::new(value)
            }
        }

        impl From<$name> for String {
            fn from(key: $name) -> Self {
                key.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl AsRef<str> for $name {
            fn as_ref(&self) -> &str {
                &self.0
            }
        }
    };
}

define_string_key!(
    /// A validated stay location key (a hotel, a relative's house, a flight).
    LocationKey, "location key"
);

define_string_key!(
    /// A validated region key, usually an ISO 3166 code.
    RegionKey, "region key"
);

/// The analysis range, from an evening thru a morning.
///
/// The mornings in the range are `start_evening + 1 ..= thru_morning`; each
/// morning stands for the night that ends on it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateRange {
    start_evening: NaiveDate,
    thru_morning: NaiveDate,
}

impl DateRange {
    /// Creates a range, rejecting ranges without a single night.
    pub fn new(start_evening: NaiveDate, thru_morning: NaiveDate) -> Result<Self, TimelineError> {
        if thru_morning <= start_evening {
            return Err(TimelineError::EmptyRange);
        }
        Ok(Self {
            start_evening,
            thru_morning,
        })
    }

    #[must_use]
    pub const fn start_evening(&self) -> NaiveDate {
        self.start_evening
    }

    #[must_use]
    pub const fn thru_morning(&self) -> NaiveDate {
        self.thru_morning
    }

    /// Number of nights in the range.
    #[must_use]
    pub fn nights(&self) -> i64 {
        (self.thru_morning - self.start_evening).num_days()
    }

    /// Returns true if the night ending on `morning` falls within the range.
    #[must_use]
    pub fn contains(&self, morning: NaiveDate) -> bool {
        self.start_evening < morning && morning <= self.thru_morning
    }

    /// Iterates over the mornings in the range, oldest first.
    pub fn mornings(&self) -> impl Iterator<Item = NaiveDate> + '_ {
        (1..=self.nights()).map(|i| self.start_evening + Duration::days(i))
    }
}

/// Problems with a per-night absence flag string.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AbsenceFlagsError {
    #[error("expected {expected} flags, got {actual}")]
    LengthMismatch { expected: u32, actual: usize },

    #[error("invalid flag {flag:?} at position {position} (expected 'P' or 'A')")]
    InvalidFlag { flag: char, position: usize },
}

/// Per-night presence flags for a stay, oldest night first.
///
/// Parsed from a string of `P` (present) and `A` (absent) characters. Absent
/// nights cover transit legs where the traveler paid for a room but slept
/// elsewhere, such as on an overnight flight.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AbsenceFlags(Vec<bool>);

impl AbsenceFlags {
    /// Parses a flag string that must contain exactly one flag per night.
    pub fn parse(flags: &str, nights: u32) -> Result<Self, AbsenceFlagsError> {
        let present = flags
            .chars()
            .enumerate()
            .map(|(position, flag)| match flag {
                'P' => Ok(true),
                'A' => Ok(false),
                _ => Err(AbsenceFlagsError::InvalidFlag { flag, position }),
            })
            .collect::<Result<Vec<_>, _>>()?;

        if present.len() != nights as usize {
            return Err(AbsenceFlagsError::LengthMismatch {
                expected: nights,
                actual: present.len(),
            });
        }
        Ok(Self(present))
    }

    /// Returns true if the traveler was present on the `index`-th night.
    #[must_use]
    pub fn is_present(&self, index: usize) -> bool {
        self.0.get(index).copied().unwrap_or(true)
    }
}

/// A single logged stay, as provided by the lodging log.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StayRecord {
    checkout_date: NaiveDate,
    nights: u32,
    location: LocationKey,
    purpose: Purpose,
    absence_flags: Option<AbsenceFlags>,
}

impl StayRecord {
    /// Builds a stay record, validating its night count and absence flags.
    pub fn new(
        checkout_date: NaiveDate,
        nights: u32,
        location: LocationKey,
        purpose: Purpose,
        absence_flags: Option<&str>,
    ) -> Result<Self, TimelineError> {
        if nights == 0 {
            return Err(ValidationError::ZeroNights { checkout_date }.into());
        }
        let absence_flags = absence_flags
            .map(|flags| AbsenceFlags::parse(flags, nights))
            .transpose()
            .map_err(|source| TimelineError::MalformedAbsenceFlags {
                checkout_date,
                source,
            })?;

        Ok(Self {
            checkout_date,
            nights,
            location,
            purpose,
            absence_flags,
        })
    }

    #[must_use]
    pub const fn checkout_date(&self) -> NaiveDate {
        self.checkout_date
    }

    #[must_use]
    pub const fn nights(&self) -> u32 {
        self.nights
    }

    #[must_use]
    pub const fn location(&self) -> &LocationKey {
        &self.location
    }

    #[must_use]
    pub const fn purpose(&self) -> Purpose {
        self.purpose
    }

    #[must_use]
    pub const fn absence_flags(&self) -> Option<&AbsenceFlags> {
        self.absence_flags.as_ref()
    }

    /// Mornings on which the traveler was actually present, oldest first.
    pub fn present_mornings(&self) -> impl Iterator<Item = NaiveDate> + '_ {
        (0..self.nights)
            .rev()
            .map(|i| self.checkout_date - Duration::days(i64::from(i)))
            .enumerate()
            .filter(|(index, _)| {
                self.absence_flags
                    .as_ref()
                    .is_none_or(|flags| flags.is_present(*index))
            })
            .map(|(_, morning)| morning)
    }
}
