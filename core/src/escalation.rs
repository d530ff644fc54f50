//! Escalation state machine — the authoritative dispute lifecycle.
//!
//! Transitions are validated against an explicit allow-list of
//! `(from_state, trigger) -> to_state` pairs. Anything not in the list is
//! rejected as `InvalidTransition`, never silently ignored.
//!
//! NON_COMPLIANT, REGULATORY_ESCALATION, and LITIGATION_READY are one-way:
//! no rule targets a lower-ranked state from them, and `commit` re-checks
//! the rank as a second line against future allow-list edits.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EscalationState {
    Detected,
    Disputed,
    Responded,
    NoResponse,
    Evaluated,
    NonCompliant,
    ProceduralEnforcement,
    SubstantiveEnforcement,
    RegulatoryEscalation,
    LitigationReady,
    ResolvedDeleted,
    ResolvedCured,
}

impl EscalationState {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Detected => "detected",
            Self::Disputed => "disputed",
            Self::Responded => "responded",
            Self::NoResponse => "no_response",
            Self::Evaluated => "evaluated",
            Self::NonCompliant => "non_compliant",
            Self::ProceduralEnforcement => "procedural_enforcement",
            Self::SubstantiveEnforcement => "substantive_enforcement",
            Self::RegulatoryEscalation => "regulatory_escalation",
            Self::LitigationReady => "litigation_ready",
            Self::ResolvedDeleted => "resolved_deleted",
            Self::ResolvedCured => "resolved_cured",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "detected" => Some(Self::Detected),
            "disputed" => Some(Self::Disputed),
            "responded" => Some(Self::Responded),
            "no_response" => Some(Self::NoResponse),
            "evaluated" => Some(Self::Evaluated),
            "non_compliant" => Some(Self::NonCompliant),
            "procedural_enforcement" => Some(Self::ProceduralEnforcement),
            "substantive_enforcement" => Some(Self::SubstantiveEnforcement),
            "regulatory_escalation" => Some(Self::RegulatoryEscalation),
            "litigation_ready" => Some(Self::LitigationReady),
            "resolved_deleted" => Some(Self::ResolvedDeleted),
            "resolved_cured" => Some(Self::ResolvedCured),
            _ => None,
        }
    }

    /// Escalation rank on the enforcement track. Resolved branches sit
    /// outside the track (rank 0) — they are terminal, not "lower".
    pub fn rank(&self) -> u8 {
        match self {
            Self::Detected => 1,
            Self::Disputed => 2,
            Self::Responded | Self::NoResponse => 3,
            Self::Evaluated => 4,
            Self::NonCompliant => 5,
            Self::ProceduralEnforcement => 6,
            Self::SubstantiveEnforcement => 7,
            Self::RegulatoryEscalation => 8,
            Self::LitigationReady => 9,
            Self::ResolvedDeleted | Self::ResolvedCured => 0,
        }
    }

    /// One-way states: once entered, no log entry may target a
    /// lower-ranked enforcement state.
    pub fn is_one_way(&self) -> bool {
        matches!(
            self,
            Self::NonCompliant | Self::RegulatoryEscalation | Self::LitigationReady
        )
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::LitigationReady | Self::ResolvedCured)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Trigger {
    DisputeMailed,
    ResponseLogged,
    DeadlineBreached,
    EvaluationCompleted,
    ViolationConfirmed,
    ItemDeleted,
    DisputeCured,
    EscalationAdvanced,
    PatternDetected,
    ReinsertionDetected,
}

impl Trigger {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::DisputeMailed => "dispute_mailed",
            Self::ResponseLogged => "response_logged",
            Self::DeadlineBreached => "deadline_breached",
            Self::EvaluationCompleted => "evaluation_completed",
            Self::ViolationConfirmed => "violation_confirmed",
            Self::ItemDeleted => "item_deleted",
            Self::DisputeCured => "dispute_cured",
            Self::EscalationAdvanced => "escalation_advanced",
            Self::PatternDetected => "pattern_detected",
            Self::ReinsertionDetected => "reinsertion_detected",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "dispute_mailed" => Some(Self::DisputeMailed),
            "response_logged" => Some(Self::ResponseLogged),
            "deadline_breached" => Some(Self::DeadlineBreached),
            "evaluation_completed" => Some(Self::EvaluationCompleted),
            "violation_confirmed" => Some(Self::ViolationConfirmed),
            "item_deleted" => Some(Self::ItemDeleted),
            "dispute_cured" => Some(Self::DisputeCured),
            "escalation_advanced" => Some(Self::EscalationAdvanced),
            "pattern_detected" => Some(Self::PatternDetected),
            "reinsertion_detected" => Some(Self::ReinsertionDetected),
            _ => None,
        }
    }
}

/// Provenance of a transition request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Actor {
    User,
    System,
    Entity,
}

impl Actor {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::User => "user",
            Self::System => "system",
            Self::Entity => "entity",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "user" => Some(Self::User),
            "system" => Some(Self::System),
            "entity" => Some(Self::Entity),
            _ => None,
        }
    }
}

/// The transition allow-list. Returns the target state for a
/// `(from, trigger)` pair, or None when the pair is not listed.
pub fn next_state(from: EscalationState, trigger: Trigger) -> Option<EscalationState> {
    use EscalationState::*;
    use Trigger::*;

    let to = match (from, trigger) {
        (Detected, DisputeMailed) => Disputed,

        (Disputed, ResponseLogged) => Responded,
        (Disputed, DeadlineBreached) => NoResponse,
        (Disputed, PatternDetected) => NonCompliant,

        (Responded, EvaluationCompleted) => Evaluated,
        (Responded, ItemDeleted) => ResolvedDeleted,
        (Responded, PatternDetected) => NonCompliant,

        (NoResponse, ViolationConfirmed) => NonCompliant,

        (Evaluated, ViolationConfirmed) => NonCompliant,
        (Evaluated, DisputeCured) => ResolvedCured,
        (Evaluated, PatternDetected) => NonCompliant,

        (NonCompliant, EscalationAdvanced) => ProceduralEnforcement,
        (ProceduralEnforcement, EscalationAdvanced) => SubstantiveEnforcement,
        (SubstantiveEnforcement, EscalationAdvanced) => RegulatoryEscalation,
        (RegulatoryEscalation, EscalationAdvanced) => LitigationReady,

        // Reinsertion bypasses the intermediate enforcement states.
        (ResolvedDeleted, ReinsertionDetected) => RegulatoryEscalation,

        _ => return None,
    };
    Some(to)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn one_way_states_have_no_backward_edge() {
        let all = [
            EscalationState::Detected,
            EscalationState::Disputed,
            EscalationState::Responded,
            EscalationState::NoResponse,
            EscalationState::Evaluated,
            EscalationState::NonCompliant,
            EscalationState::ProceduralEnforcement,
            EscalationState::SubstantiveEnforcement,
            EscalationState::RegulatoryEscalation,
            EscalationState::LitigationReady,
            EscalationState::ResolvedDeleted,
            EscalationState::ResolvedCured,
        ];
        let triggers = [
            Trigger::DisputeMailed,
            Trigger::ResponseLogged,
            Trigger::DeadlineBreached,
            Trigger::EvaluationCompleted,
            Trigger::ViolationConfirmed,
            Trigger::ItemDeleted,
            Trigger::DisputeCured,
            Trigger::EscalationAdvanced,
            Trigger::PatternDetected,
            Trigger::ReinsertionDetected,
        ];
        for from in all.iter().filter(|s| s.is_one_way()) {
            for trigger in triggers {
                if let Some(to) = next_state(*from, trigger) {
                    assert!(
                        to.rank() > from.rank(),
                        "{from:?} --{trigger:?}--> {to:?} regresses a one-way state"
                    );
                }
            }
        }
    }

    #[test]
    fn reinsertion_bypass_is_the_only_edge_out_of_resolved_deleted() {
        assert_eq!(
            next_state(EscalationState::ResolvedDeleted, Trigger::ReinsertionDetected),
            Some(EscalationState::RegulatoryEscalation)
        );
        assert_eq!(
            next_state(EscalationState::ResolvedDeleted, Trigger::EscalationAdvanced),
            None
        );
    }

    #[test]
    fn litigation_ready_is_terminal() {
        assert!(EscalationState::LitigationReady.is_terminal());
        assert_eq!(
            next_state(EscalationState::LitigationReady, Trigger::EscalationAdvanced),
            None
        );
    }
}
