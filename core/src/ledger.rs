//! Paper trail — the append-only escalation ledger.
//!
//! RULE: Every accepted transition produces exactly one log entry, and the
//! entry commits in the same store transaction as the state-field update.
//! The log is the source of truth; `current_state` on the dispute row is a
//! derived cache, rebuildable by `fold_state`.

use crate::escalation::{Actor, EscalationState, Trigger};
use crate::types::DisputeId;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EscalationLogEntry {
    pub id: Option<i64>,
    pub dispute_id: DisputeId,
    pub from_state: EscalationState,
    pub to_state: EscalationState,
    pub trigger: Trigger,
    pub actor: Actor,
    pub statutes_activated: Vec<String>,
    pub recorded_on: NaiveDate,
}

/// Reconstruct the current state by folding a dispute's log entries in
/// append order. `None` for an empty log (a dispute still in DETECTED
/// that has never transitioned).
pub fn fold_state(entries: &[EscalationLogEntry]) -> Option<EscalationState> {
    entries.last().map(|entry| entry.to_state)
}

/// Artifact kinds the letter renderer can produce for each state.
/// Pure lookup, no side effects.
pub fn artifacts_for_state(state: EscalationState) -> &'static [&'static str] {
    match state {
        EscalationState::Detected => &["dispute_letter"],
        EscalationState::Disputed => &[],
        EscalationState::Responded => &[],
        EscalationState::NoResponse => &["failure_to_respond_notice"],
        EscalationState::Evaluated => &["rebuttal_letter"],
        EscalationState::NonCompliant => &[
            "statutory_notice_letter",
            "method_of_verification_request",
        ],
        EscalationState::ProceduralEnforcement => &["procedural_demand_letter"],
        EscalationState::SubstantiveEnforcement => &["pre_litigation_notice"],
        EscalationState::RegulatoryEscalation => &["cfpb_complaint", "state_ag_complaint"],
        EscalationState::LitigationReady => &["litigation_packet"],
        EscalationState::ResolvedDeleted => &["deletion_confirmation_request"],
        EscalationState::ResolvedCured => &[],
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(to: EscalationState) -> EscalationLogEntry {
        EscalationLogEntry {
            id: None,
            dispute_id: "d1".into(),
            from_state: EscalationState::Detected,
            to_state: to,
            trigger: Trigger::DisputeMailed,
            actor: Actor::User,
            statutes_activated: vec![],
            recorded_on: NaiveDate::from_ymd_opt(2025, 1, 1).unwrap(),
        }
    }

    #[test]
    fn fold_takes_the_last_entry() {
        let entries = vec![entry(EscalationState::Disputed), entry(EscalationState::Responded)];
        assert_eq!(fold_state(&entries), Some(EscalationState::Responded));
        assert_eq!(fold_state(&[]), None);
    }

    #[test]
    fn every_enforcement_state_owes_artifacts() {
        for state in [
            EscalationState::NonCompliant,
            EscalationState::ProceduralEnforcement,
            EscalationState::SubstantiveEnforcement,
            EscalationState::RegulatoryEscalation,
            EscalationState::LitigationReady,
        ] {
            assert!(!artifacts_for_state(state).is_empty(), "{state:?} has no artifacts");
        }
    }
}
