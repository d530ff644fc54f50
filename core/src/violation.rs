//! Violation records and statute selection.
//!
//! RULE: A violation is never mutated after creation. A superseding
//! determination is a new record, not an edit.

use crate::entity::EntityType;
use crate::types::{Fingerprint, ViolationId};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Minor,
    Moderate,
    Major,
    Critical,
}

impl Severity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Minor => "minor",
            Self::Moderate => "moderate",
            Self::Major => "major",
            Self::Critical => "critical",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "minor" => Some(Self::Minor),
            "moderate" => Some(Self::Moderate),
            "major" => Some(Self::Major),
            "critical" => Some(Self::Critical),
            _ => None,
        }
    }
}

/// Closed set of violation kinds this core stores and can determine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ViolationKind {
    /// Reported data contradicts the consumer's records. Handed in by the
    /// audit/parsing collaborator; the seed of most disputes.
    InaccurateReporting,
    /// VERIFIED without a reasonable investigation.
    UnreasonableVerification,
    /// UPDATED but the reported data still contradicts ground truth.
    ContinuedInaccuracy,
    /// Statutory response window elapsed with no response.
    InvestigationFailure,
    /// Frivolous rejection without the 5-day advance notice.
    RejectionWithoutNotice,
    /// Frivolous rejection with no specific reason stated.
    RejectionWithoutReason,
    /// Frivolous rejection that fails to identify the missing information.
    RejectionWithoutDetail,
    /// Deleted item reappeared with no advance notice.
    ReinsertionWithoutNotice,
    /// Furnisher re-reported an item a bureau had deleted.
    ReinsertionRefurnished,
    /// Reinsertion notice arrived but outside the 5-business-day window.
    ReinsertionLateNotice,
    /// One bureau verified what a peer bureau deleted.
    InconsistentVerification,
    /// CRA verification contradicted by furnisher silence or deletion.
    FurnisherContradiction,
    /// Cross-bureau field variance beyond tolerance.
    AccuracyVariance,
}

impl ViolationKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::InaccurateReporting => "inaccurate_reporting",
            Self::UnreasonableVerification => "unreasonable_verification",
            Self::ContinuedInaccuracy => "continued_inaccuracy",
            Self::InvestigationFailure => "investigation_failure",
            Self::RejectionWithoutNotice => "rejection_without_notice",
            Self::RejectionWithoutReason => "rejection_without_reason",
            Self::RejectionWithoutDetail => "rejection_without_detail",
            Self::ReinsertionWithoutNotice => "reinsertion_without_notice",
            Self::ReinsertionRefurnished => "reinsertion_refurnished",
            Self::ReinsertionLateNotice => "reinsertion_late_notice",
            Self::InconsistentVerification => "inconsistent_verification",
            Self::FurnisherContradiction => "furnisher_contradiction",
            Self::AccuracyVariance => "accuracy_variance",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "inaccurate_reporting" => Some(Self::InaccurateReporting),
            "unreasonable_verification" => Some(Self::UnreasonableVerification),
            "continued_inaccuracy" => Some(Self::ContinuedInaccuracy),
            "investigation_failure" => Some(Self::InvestigationFailure),
            "rejection_without_notice" => Some(Self::RejectionWithoutNotice),
            "rejection_without_reason" => Some(Self::RejectionWithoutReason),
            "rejection_without_detail" => Some(Self::RejectionWithoutDetail),
            "reinsertion_without_notice" => Some(Self::ReinsertionWithoutNotice),
            "reinsertion_refurnished" => Some(Self::ReinsertionRefurnished),
            "reinsertion_late_notice" => Some(Self::ReinsertionLateNotice),
            "inconsistent_verification" => Some(Self::InconsistentVerification),
            "furnisher_contradiction" => Some(Self::FurnisherContradiction),
            "accuracy_variance" => Some(Self::AccuracyVariance),
            _ => None,
        }
    }
}

/// Who determined the violation: the audit/parsing collaborator, or
/// this core (response evaluation, reinsertion, cross-entity detection).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DetectedBy {
    Audit,
    Core,
}

impl DetectedBy {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Audit => "audit",
            Self::Core => "core",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "audit" => Some(Self::Audit),
            "core" => Some(Self::Core),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Violation {
    pub violation_id: ViolationId,
    pub kind: ViolationKind,
    pub statute_refs: Vec<String>,
    pub severity: Severity,
    pub account_fingerprint: Fingerprint,
    pub creditor_name: String,
    pub masked_account_number: Option<String>,
    pub evidence: Option<String>,
    pub evidence_proves_inaccuracy: bool,
    pub willful_indicator: bool,
    pub detected_by: DetectedBy,
    pub created_date: NaiveDate,
}

impl Violation {
    /// A core-determined violation against an account already under dispute.
    pub fn determined(
        kind: ViolationKind,
        statute_refs: Vec<String>,
        severity: Severity,
        account_fingerprint: &str,
        creditor_name: &str,
        created_date: NaiveDate,
    ) -> Self {
        Self {
            violation_id: Uuid::new_v4().to_string(),
            kind,
            statute_refs,
            severity,
            account_fingerprint: account_fingerprint.to_string(),
            creditor_name: creditor_name.to_string(),
            masked_account_number: None,
            evidence: None,
            evidence_proves_inaccuracy: false,
            willful_indicator: false,
            detected_by: DetectedBy::Core,
            created_date,
        }
    }

    /// A violation handed in by the audit/parsing collaborator.
    pub fn reported(
        kind: ViolationKind,
        statute_refs: Vec<String>,
        severity: Severity,
        account_fingerprint: &str,
        creditor_name: &str,
        created_date: NaiveDate,
    ) -> Self {
        Self {
            detected_by: DetectedBy::Audit,
            ..Self::determined(
                kind,
                statute_refs,
                severity,
                account_fingerprint,
                creditor_name,
                created_date,
            )
        }
    }

    pub fn with_willful(mut self, willful: bool) -> Self {
        self.willful_indicator = willful;
        self
    }

    /// The audit evidence already proves the inaccuracy; a later VERIFIED
    /// on this item is willful.
    pub fn with_proven_inaccuracy(mut self, proven: bool) -> Self {
        self.evidence_proves_inaccuracy = proven;
        self
    }

    pub fn with_evidence(mut self, evidence: String) -> Self {
        self.evidence = Some(evidence);
        self
    }
}

/// Statute citations activated by core determinations. Wording and legal
/// interpretation live with the letter renderer; the core only selects
/// which citations a determination activates.
pub mod statutes {
    use super::EntityType;

    pub const FCRA_611_INVESTIGATION: &str = "FCRA 611(a)(1)(A)";
    pub const FCRA_611_FRIVOLOUS_NOTICE: &str = "FCRA 611(a)(3)";
    pub const FCRA_611_REINSERTION_CERT: &str = "FCRA 611(a)(5)(B)(i)";
    pub const FCRA_611_REINSERTION_NOTICE: &str = "FCRA 611(a)(5)(B)(ii)";
    pub const FCRA_607_ACCURACY: &str = "FCRA 607(b)";
    pub const FCRA_623_INVESTIGATION: &str = "FCRA 623(b)(1)";
    pub const FDCPA_809_VALIDATION: &str = "FDCPA 809(b)";
    pub const FDCPA_807_FALSE_REPRESENTATION: &str = "FDCPA 807(2)(A)";
    pub const FDCPA_808_UNFAIR_PRACTICE: &str = "FDCPA 808";

    /// The duty-to-investigate citation for a given entity type.
    ///
    /// For collectors, `validation_duty` is the guardrail verdict: only
    /// when it holds may the validation statute be cited; otherwise the
    /// general false-representation / unfair-practice pair substitutes.
    pub fn duty_to_investigate(entity_type: EntityType, validation_duty: bool) -> Vec<String> {
        match entity_type {
            EntityType::Cra => vec![FCRA_611_INVESTIGATION.to_string()],
            EntityType::Furnisher => vec![FCRA_623_INVESTIGATION.to_string()],
            EntityType::Collector => {
                if validation_duty {
                    vec![FDCPA_809_VALIDATION.to_string()]
                } else {
                    vec![
                        FDCPA_807_FALSE_REPRESENTATION.to_string(),
                        FDCPA_808_UNFAIR_PRACTICE.to_string(),
                    ]
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kind_round_trips_through_store_string() {
        for kind in [
            ViolationKind::UnreasonableVerification,
            ViolationKind::ReinsertionWithoutNotice,
            ViolationKind::AccuracyVariance,
        ] {
            assert_eq!(ViolationKind::from_str(kind.as_str()), Some(kind));
        }
    }

    #[test]
    fn collector_statute_selection_follows_guardrail() {
        let cited = statutes::duty_to_investigate(EntityType::Collector, true);
        assert_eq!(cited, vec![statutes::FDCPA_809_VALIDATION.to_string()]);

        let substituted = statutes::duty_to_investigate(EntityType::Collector, false);
        assert!(substituted.contains(&statutes::FDCPA_807_FALSE_REPRESENTATION.to_string()));
        assert!(!substituted.contains(&statutes::FDCPA_809_VALIDATION.to_string()));
    }
}
