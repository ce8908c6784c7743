//! Current-date source consumed by lifecycle and dashboard services.

use chrono::{Local, NaiveDate};

/// Supplies "today" for operations whose date parameter is optional.
pub trait Clock {
    fn today(&self) -> NaiveDate;
}

/// Local-time calendar date of the running process.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn today(&self) -> NaiveDate {
        Local::now().date_naive()
    }
}

/// Clock pinned to one date.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FixedClock(pub NaiveDate);

impl Clock for FixedClock {
    fn today(&self) -> NaiveDate {
        self.0
    }
}
