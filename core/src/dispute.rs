//! Dispute record — the unit of tracking and of mutual exclusion.

use crate::escalation::EscalationState;
use crate::types::{DisputeId, EntityId, Fingerprint, ViolationId};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DisputeSource {
    Direct,
    AnnualCreditReport,
}

impl DisputeSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Direct => "direct",
            Self::AnnualCreditReport => "annual_credit_report",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "direct" => Some(Self::Direct),
            "annual_credit_report" => Some(Self::AnnualCreditReport),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Dispute {
    pub dispute_id: DisputeId,
    pub entity_id: EntityId,
    pub violation_ids: Vec<ViolationId>,
    pub account_fingerprint: Fingerprint,
    pub source: DisputeSource,
    /// Set exactly once by confirm_mailed, immutable afterwards.
    pub dispute_date: Option<NaiveDate>,
    /// Derived from dispute_date + source, immutable after set
    /// (except for the single additional-information reset).
    pub deadline_date: Option<NaiveDate>,
    /// Guards the additional-information reset against stacking.
    pub deadline_extended: bool,
    /// 15-day INVESTIGATING window; cleared on any later response.
    pub interim_deadline: Option<NaiveDate>,
    /// REJECTED cure sub-flow window.
    pub cure_deadline: Option<NaiveDate>,
    pub current_state: EscalationState,
    pub has_validation_request: bool,
    pub collection_continued: bool,
}

impl Dispute {
    /// Tracking has started once the mailing is confirmed.
    pub fn is_tracking(&self) -> bool {
        self.dispute_date.is_some()
    }
}
