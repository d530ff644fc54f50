//! Report-ingestion boundary — the shape the parsing collaborator hands us.

use crate::types::Fingerprint;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// One ingested bureau report, already normalized by the parser.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportSnapshot {
    pub report_date: NaiveDate,
    /// Raw bureau name; canonicalized through the entity registry.
    pub bureau: String,
    pub accounts: Vec<ReportedAccount>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportedAccount {
    pub account_fingerprint: Fingerprint,
    pub creditor_name: String,
    pub status_code: Option<String>,
    pub reported_date: Option<NaiveDate>,
}

/// What an ingestion produced, for the caller's bookkeeping.
#[derive(Debug, Clone, Default)]
pub struct IngestOutcome {
    pub reinsertions_detected: usize,
    pub violations_created: usize,
    pub patterns_recorded: usize,
}
