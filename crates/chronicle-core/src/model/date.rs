//! Resolution of upstream ISO date strings into comparable calendar dates.
//!
//! Upstream extraction emits `date_iso` at varying precision. Month and year
//! precision resolve to the first day of the period so that two events can
//! always be compared once both carry a date.

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

/// Coarseness of a resolved date.
///
/// Serialized as the integer tag used on the wire: day = 0, month = 1,
/// year = 2.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub enum DatePrecision {
    Day,
    Month,
    /// Also used for events without any date.
    #[default]
    Year,
}

impl DatePrecision {
    #[must_use]
    pub const fn tag(self) -> u8 {
        match self {
            Self::Day => 0,
            Self::Month => 1,
            Self::Year => 2,
        }
    }

    #[must_use]
    pub const fn from_tag(tag: u8) -> Option<Self> {
        match tag {
            0 => Some(Self::Day),
            1 => Some(Self::Month),
            2 => Some(Self::Year),
            _ => None,
        }
    }
}

impl Serialize for DatePrecision {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u8(self.tag())
    }
}

impl<'de> Deserialize<'de> for DatePrecision {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let tag = u8::deserialize(deserializer)?;
        Self::from_tag(tag).ok_or_else(|| {
            serde::de::Error::custom(format!("temporal_precision must be 0, 1 or 2, got {tag}"))
        })
    }
}

/// A calendar date plus the precision it was stated with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ResolvedDate {
    pub date: NaiveDate,
    pub precision: DatePrecision,
}

impl ResolvedDate {
    /// Parse an upstream `date_iso` value.
    ///
    /// Accepts `YYYY-MM-DD`, `YYYY-MM`, `YYYY`, RFC 3339 timestamps and
    /// naive `YYYY-MM-DDTHH:MM:SS` timestamps. Returns `None` when the value
    /// matches none of these.
    #[must_use]
    pub fn parse(raw: &str) -> Option<Self> {
        let raw = raw.trim();
        if raw.is_empty() {
            return None;
        }

        if let Ok(date) = NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
            return Some(Self::day(date));
        }
        if let Ok(ts) = DateTime::parse_from_rfc3339(raw) {
            return Some(Self::day(ts.date_naive()));
        }
        if let Ok(ts) = NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S") {
            return Some(Self::day(ts.date()));
        }

        let mut parts = raw.split('-');
        let year: i32 = parts.next()?.parse().ok()?;
        match (parts.next(), parts.next()) {
            (None, _) => NaiveDate::from_ymd_opt(year, 1, 1).map(|date| Self {
                date,
                precision: DatePrecision::Year,
            }),
            (Some(month), None) => {
                let month: u32 = month.parse().ok()?;
                NaiveDate::from_ymd_opt(year, month, 1).map(|date| Self {
                    date,
                    precision: DatePrecision::Month,
                })
            }
            _ => None,
        }
    }

    const fn day(date: NaiveDate) -> Self {
        Self {
            date,
            precision: DatePrecision::Day,
        }
    }

    /// Signed day difference `later - self`.
    #[must_use]
    pub fn days_until(&self, later: &Self) -> i64 {
        (later.date - self.date).num_days()
    }
}
