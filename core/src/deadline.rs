//! Deadline engine — statutory response windows and breach detection.

use crate::dispute::{Dispute, DisputeSource};
use chrono::{Days, NaiveDate};

/// Response window for a dispute mailed directly to the entity.
pub const DIRECT_RESPONSE_DAYS: u64 = 30;
/// Response window when the report came through annualcreditreport.com.
pub const ANNUAL_REPORT_RESPONSE_DAYS: u64 = 45;
/// Reset window after an additional-information request. Single reset,
/// not stacking.
pub const INFO_REQUEST_RESET_DAYS: u64 = 15;

pub fn compute_deadline(source: DisputeSource, sent_date: NaiveDate) -> NaiveDate {
    let days = match source {
        DisputeSource::AnnualCreditReport => ANNUAL_REPORT_RESPONSE_DAYS,
        DisputeSource::Direct => DIRECT_RESPONSE_DAYS,
    };
    sent_date + Days::new(days)
}

pub fn reset_for_info_request(request_date: NaiveDate) -> NaiveDate {
    request_date + Days::new(INFO_REQUEST_RESET_DAYS)
}

/// Breached := past the deadline with no response logged.
pub fn is_breached(dispute: &Dispute, today: NaiveDate, has_response: bool) -> bool {
    match dispute.deadline_date {
        Some(deadline) => today > deadline && !has_response,
        None => false,
    }
}
