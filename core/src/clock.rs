//! Injected clock and statutory date arithmetic.
//!
//! RULE: No ambient "now". Scheduler jobs and deadline checks take their
//! date from a `Clock` passed in at construction, so every job is
//! deterministic and testable with a fixed date.

use chrono::{Datelike, Days, Local, NaiveDate, Weekday};

pub trait Clock: Send {
    fn today(&self) -> NaiveDate;
}

/// Wall-clock dates. Used by the runner binary.
pub struct SystemClock;

impl Clock for SystemClock {
    fn today(&self) -> NaiveDate {
        Local::now().date_naive()
    }
}

/// A clock pinned to one date. Used in tests and replay tooling.
pub struct FixedClock(pub NaiveDate);

impl Clock for FixedClock {
    fn today(&self) -> NaiveDate {
        self.0
    }
}

fn is_business_day(date: NaiveDate) -> bool {
    !matches!(date.weekday(), Weekday::Sat | Weekday::Sun)
}

/// Advance `n` business days (weekends excluded; holidays are not modeled
/// at this boundary — the notice rule counts calendar business days).
pub fn add_business_days(start: NaiveDate, n: u32) -> NaiveDate {
    let mut date = start;
    let mut remaining = n;
    while remaining > 0 {
        date = date + Days::new(1);
        if is_business_day(date) {
            remaining -= 1;
        }
    }
    date
}

/// A reinsertion notice is timely iff five business days elapse between
/// the notice and the reinsertion itself.
pub fn notice_is_timely(notice_date: NaiveDate, reinsertion_date: NaiveDate) -> bool {
    add_business_days(notice_date, 5) <= reinsertion_date
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    #[test]
    fn business_days_skip_weekends() {
        // 2025-01-01 is a Wednesday; +5 business days crosses one weekend.
        assert_eq!(add_business_days(d("2025-01-01"), 5), d("2025-01-08"));
    }

    #[test]
    fn notice_five_business_days_before_reinsertion_is_timely() {
        assert!(notice_is_timely(d("2025-01-01"), d("2025-01-08")));
        assert!(!notice_is_timely(d("2025-01-06"), d("2025-01-08")));
    }
}
