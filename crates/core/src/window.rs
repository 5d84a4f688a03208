//! Time windows that record timestamps are drawn from.

use rand::{seq::IndexedRandom, Rng};
use time::{
    macros::{datetime, format_description, offset},
    Date, Duration, OffsetDateTime, PrimitiveDateTime, UtcOffset,
};

use crate::err::{Error, Result};

/// Offsets used by the correlated web log.
pub const CORRELATED_OFFSETS: &[UtcOffset] = &[UtcOffset::UTC, offset!(+1), offset!(-5)];

/// First instant of every default window. Fixed so that runs reproduce.
pub const DEFAULT_START: PrimitiveDateTime = datetime!(2025-09-01 0:00);

/// A half-open range `[start, start + span)` of wall-clock times, plus the set
/// of offsets a sampled time may be tagged with.
#[derive(Debug, Clone, Copy)]
pub struct TimeWindow {
    pub start: PrimitiveDateTime,
    pub span: Duration,
    pub offsets: &'static [UtcOffset],
}

impl TimeWindow {
    pub fn new(start: PrimitiveDateTime, span: Duration, offsets: &'static [UtcOffset]) -> Self {
        Self {
            start,
            span,
            offsets,
        }
    }

    /// Window of `days` whole days starting at midnight of `date`.
    pub fn days_from(date: Date, days: u32, offsets: &'static [UtcOffset]) -> Self {
        Self::new(date.midnight(), Duration::days(i64::from(days)), offsets)
    }

    pub fn validate(&self) -> Result<()> {
        if self.span.whole_seconds() < 1 {
            return Err(Error::InvalidArgument(format!(
                "time window must span at least one second, got {}",
                self.span
            )));
        }
        if self.offsets.is_empty() {
            return Err(Error::InvalidArgument(
                "time window needs at least one utc offset".to_string(),
            ));
        }
        // Leave a day of headroom for offsets and sub-second jitter.
        if self
            .start
            .checked_add(self.span)
            .and_then(|end| end.checked_add(Duration::DAY))
            .is_none()
        {
            return Err(Error::InvalidArgument(format!(
                "time window starting {} and spanning {} runs past the last representable date",
                self.start, self.span
            )));
        }
        Ok(())
    }

    /// Draw a whole-second time inside the window and tag it with one of the
    /// window's offsets. The wall-clock value is kept as drawn.
    ///
    /// Unvalidated windows that run off the calendar clamp to its last instant.
    pub fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> OffsetDateTime {
        let seconds = rng.random_range(0..self.span.whole_seconds().max(1));
        let offset = self.offsets.choose(rng).copied().unwrap_or(UtcOffset::UTC);
        self.start
            .saturating_add(Duration::seconds(seconds))
            .assume_offset(offset)
    }

    pub fn end(&self) -> PrimitiveDateTime {
        self.start.saturating_add(self.span)
    }
}

impl Default for TimeWindow {
    fn default() -> Self {
        Self::new(DEFAULT_START, Duration::days(7), CORRELATED_OFFSETS)
    }
}

/// Parse a `YYYY-MM-DD` date, as accepted by `--start`.
pub fn parse_date(s: &str) -> Result<Date> {
    Ok(Date::parse(s, format_description!("[year]-[month]-[day]"))?)
}
