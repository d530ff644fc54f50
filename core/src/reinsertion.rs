//! Reinsertion watches — monitoring deleted items for reappearance.

use crate::types::{DisputeId, Fingerprint, ViolationId, WatchId};
use chrono::{Days, NaiveDate};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Days a deleted item stays under watch.
pub const REINSERTION_WINDOW_DAYS: u64 = 90;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WatchStatus {
    Active,
    Expired,
    ReinsertionDetected,
    NoticeReceived,
}

impl WatchStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::Expired => "expired",
            Self::ReinsertionDetected => "reinsertion_detected",
            Self::NoticeReceived => "notice_received",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "active" => Some(Self::Active),
            "expired" => Some(Self::Expired),
            "reinsertion_detected" => Some(Self::ReinsertionDetected),
            "notice_received" => Some(Self::NoticeReceived),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReinsertionWatch {
    pub watch_id: WatchId,
    pub dispute_id: DisputeId,
    pub violation_id: ViolationId,
    pub account_fingerprint: Fingerprint,
    pub furnisher_name: String,
    pub window_start: NaiveDate,
    pub window_end: NaiveDate,
    pub status: WatchStatus,
    /// Advance notice on file, if any. Recorded before or after detection.
    pub notice_date: Option<NaiveDate>,
    pub reinsertion_date: Option<NaiveDate>,
}

impl ReinsertionWatch {
    /// Opened automatically on a DELETED response.
    pub fn open(
        dispute_id: &str,
        violation_id: &str,
        account_fingerprint: &str,
        furnisher_name: &str,
        response_date: NaiveDate,
    ) -> Self {
        Self {
            watch_id: Uuid::new_v4().to_string(),
            dispute_id: dispute_id.to_string(),
            violation_id: violation_id.to_string(),
            account_fingerprint: account_fingerprint.to_string(),
            furnisher_name: furnisher_name.to_string(),
            window_start: response_date,
            window_end: response_date + Days::new(REINSERTION_WINDOW_DAYS),
            status: WatchStatus::Active,
            notice_date: None,
            reinsertion_date: None,
        }
    }

    pub fn covers(&self, report_date: NaiveDate) -> bool {
        self.window_start <= report_date && report_date <= self.window_end
    }
}
