//! Core domain types: date ranges and the per-day units of work they expand into.

use crate::error::{Error, Result};
use chrono::{Days, NaiveDate};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Wire format for dates in query parameters and upstream requests
pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// Inclusive range of calendar days, `from <= to`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateRange {
    from: NaiveDate,
    to: NaiveDate,
}

impl DateRange {
    /// Create a range, rejecting `to < from` as a caller-input error
    pub fn new(from: NaiveDate, to: NaiveDate) -> Result<Self> {
        if to < from {
            return Err(Error::InvalidRequest(format!(
                "invalid date range ({}, {})",
                from.format(DATE_FORMAT),
                to.format(DATE_FORMAT)
            )));
        }
        Ok(Self { from, to })
    }

    /// Single-day range
    pub fn single(date: NaiveDate) -> Self {
        Self { from: date, to: date }
    }

    /// First day of the range
    pub fn start(&self) -> NaiveDate {
        self.from
    }

    /// Last day of the range (inclusive)
    pub fn end(&self) -> NaiveDate {
        self.to
    }

    /// Number of days in the range, always at least 1
    pub fn len(&self) -> usize {
        // from <= to is guaranteed by construction, so this is never negative
        (self.to - self.from).num_days() as usize + 1
    }

    /// Always false; a range holds at least one day
    pub fn is_empty(&self) -> bool {
        false
    }

    /// Work units for every day in the range, in chronological order
    pub fn units(&self) -> impl Iterator<Item = WorkUnit> + '_ {
        (0..self.len()).map(move |offset| WorkUnit {
            offset,
            date: self.from + Days::new(offset as u64),
        })
    }
}

/// One day of work inside a [`DateRange`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WorkUnit {
    /// Position of the day within the range (0 = `from`)
    pub offset: usize,
    /// The day itself, `from + offset` days
    pub date: NaiveDate,
}

/// Response body for `GET /pictures`
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct PicturesResponse {
    /// Picture URLs ordered by date, one per day of the requested range
    pub urls: Vec<String>,
}
