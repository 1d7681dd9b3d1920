//! Date range chunking.
//!
//! The USAspending transaction search slows down badly on wide time windows,
//! so a fiscal year is pulled as a sequence of short sub-ranges. `DateChunks`
//! yields contiguous, non-overlapping ranges that cover the full interval;
//! the final chunk is truncated so it never runs past the requested end.

use chrono::{Duration, NaiveDate};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// An inclusive calendar date range. Invariant: `start <= end`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateRange {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum RangeError {
    #[error("invalid date range: start {start} is after end {end}")]
    StartAfterEnd { start: NaiveDate, end: NaiveDate },
}

impl DateRange {
    pub fn new(start: NaiveDate, end: NaiveDate) -> Result<Self, RangeError> {
        if start > end {
            return Err(RangeError::StartAfterEnd { start, end });
        }
        Ok(Self { start, end })
    }

    /// Number of calendar days covered, inclusive of both endpoints.
    pub fn days(&self) -> i64 {
        (self.end - self.start).num_days() + 1
    }
}

impl std::fmt::Display for DateRange {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} to {}", self.start, self.end)
    }
}

/// Iterator over fixed-size sub-ranges of a `DateRange`.
///
/// Cloning gives a fresh iteration from the start, which is how the chunked
/// pipeline counts chunks before walking them.
#[derive(Debug, Clone)]
pub struct DateChunks {
    cursor: Option<NaiveDate>,
    end: NaiveDate,
    chunk_days: u32,
}

impl DateChunks {
    /// Split `range` into chunks of at most `chunk_days` calendar days.
    pub fn new(range: DateRange, chunk_days: u32) -> Self {
        Self {
            cursor: Some(range.start),
            end: range.end,
            // a zero-day chunk would never advance the cursor
            chunk_days: chunk_days.max(1),
        }
    }

    /// Weekly chunks, the size the transaction pull uses.
    pub fn weekly(range: DateRange) -> Self {
        Self::new(range, 7)
    }
}

impl Iterator for DateChunks {
    type Item = DateRange;

    fn next(&mut self) -> Option<DateRange> {
        let start = self.cursor.filter(|s| *s <= self.end)?;
        let chunk_end = (start + Duration::days(i64::from(self.chunk_days) - 1)).min(self.end);
        self.cursor = chunk_end.succ_opt();
        Some(DateRange {
            start,
            end: chunk_end,
        })
    }
}
