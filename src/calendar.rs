//! Draw calendar: maps rounds to draw dates from a fixed epoch.
//!
//! Round 1 was drawn on the epoch date and every following round one
//! interval later. The same arithmetic bounds the newest round that can
//! exist on a given day.

use chrono::{Duration, NaiveDate};

use crate::draw::Round;

pub const DEFAULT_INTERVAL_DAYS: u32 = 7;

/// Date of round 1.
pub fn default_epoch() -> NaiveDate {
    NaiveDate::from_ymd_opt(2002, 12, 7).expect("2002-12-07 is a valid date")
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DrawCalendar {
    epoch: NaiveDate,
    interval_days: u32,
}

impl DrawCalendar {
    /// `interval_days` of zero is clamped to one.
    pub fn new(epoch: NaiveDate, interval_days: u32) -> Self {
        Self {
            epoch,
            interval_days: interval_days.max(1),
        }
    }

    pub fn epoch(&self) -> NaiveDate {
        self.epoch
    }

    pub fn interval_days(&self) -> u32 {
        self.interval_days
    }

    /// Draw date of `round`. Round 0 maps to the epoch. `None` when the date
    /// falls outside the representable calendar.
    pub fn date_of(&self, round: Round) -> Option<NaiveDate> {
        let offset = i64::from(round.saturating_sub(1)).checked_mul(i64::from(self.interval_days))?;
        self.epoch.checked_add_signed(Duration::try_days(offset)?)
    }

    /// Highest round whose draw date is on or before `today`; 0 before the epoch.
    pub fn expected_round(&self, today: NaiveDate) -> Round {
        let elapsed = (today - self.epoch).num_days();
        if elapsed < 0 {
            return 0;
        }
        let weeks = elapsed / i64::from(self.interval_days);
        Round::try_from(weeks + 1).unwrap_or(Round::MAX)
    }
}

impl Default for DrawCalendar {
    fn default() -> Self {
        Self::new(default_epoch(), DEFAULT_INTERVAL_DAYS)
    }
}
