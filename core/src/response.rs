//! Response evaluator — maps an entity response to violations and an
//! evaluation outcome.
//!
//! RULE: `ResponseKind` is a closed enum and `evaluate` matches it
//! exhaustively, so adding a response kind is a compile-time-checked
//! change. Evaluation is pure: it builds violations and names an outcome;
//! the engine persists records and requests transitions.

use crate::{
    dispute::Dispute,
    entity::Entity,
    guardrail::can_cite_validation_duty,
    types::{DisputeId, ResponseId, ViolationId},
    violation::{statutes, Severity, Violation, ViolationKind},
};
use chrono::{Days, NaiveDate};
use serde::{Deserialize, Serialize};

/// Days an INVESTIGATING reply buys before stall conversion.
pub const INTERIM_RESPONSE_DAYS: u64 = 15;
/// Cure windows offered after a procedurally valid rejection.
pub const CURE_WINDOW_DAYS: u64 = 15;
pub const CURE_WINDOW_EXTENDED_DAYS: u64 = 30;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResponseKind {
    Deleted,
    Verified,
    Updated,
    Investigating,
    NoResponse,
    Rejected,
}

impl ResponseKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Deleted => "deleted",
            Self::Verified => "verified",
            Self::Updated => "updated",
            Self::Investigating => "investigating",
            Self::NoResponse => "no_response",
            Self::Rejected => "rejected",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "deleted" => Some(Self::Deleted),
            "verified" => Some(Self::Verified),
            "updated" => Some(Self::Updated),
            "investigating" => Some(Self::Investigating),
            "no_response" => Some(Self::NoResponse),
            "rejected" => Some(Self::Rejected),
            _ => None,
        }
    }
}

/// Causal step in the dispute correspondence. A stage is resolved by its
/// first non-INVESTIGATING response; logging a second resolving response
/// at the same stage is a conflict.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResponseStage {
    Initial,
    Rebuttal,
    Final,
}

impl ResponseStage {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Initial => "initial",
            Self::Rebuttal => "rebuttal",
            Self::Final => "final",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "initial" => Some(Self::Initial),
            "rebuttal" => Some(Self::Rebuttal),
            "final" => Some(Self::Final),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReportedBy {
    User,
    System,
}

impl ReportedBy {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::User => "user",
            Self::System => "system",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "user" => Some(Self::User),
            "system" => Some(Self::System),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DisputeResponse {
    pub response_id: ResponseId,
    pub dispute_id: DisputeId,
    pub kind: ResponseKind,
    pub stage: ResponseStage,
    pub response_date: NaiveDate,
    pub reported_by: ReportedBy,
    pub evidence_ref: Option<String>,
    pub resulting_violation_ids: Vec<ViolationId>,
}

/// One disputed field under UPDATED reconciliation. A field is cured when
/// the current report matches the expected (corrected) value.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FieldReconciliation {
    pub field: String,
    pub expected: String,
    pub entity_claimed: String,
    pub current_report: String,
}

impl FieldReconciliation {
    pub fn is_cured(&self) -> bool {
        self.current_report == self.expected
    }
}

/// The three procedural requirements of a frivolous/irrelevant rejection.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RejectionReview {
    pub advance_notice_given: bool,
    pub specific_reason_stated: bool,
    pub missing_information_identified: bool,
    /// Entity granted the longer cure window.
    pub extended_cure_window: bool,
}

impl RejectionReview {
    pub fn all_requirements_met(&self) -> bool {
        self.advance_notice_given && self.specific_reason_stated && self.missing_information_identified
    }
}

/// Response payload as reported at the API boundary. Carrying the
/// kind-specific data here keeps `evaluate` a single exhaustive match.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ResponseDetails {
    Deleted,
    Verified,
    Updated { fields: Vec<FieldReconciliation> },
    Investigating,
    NoResponse,
    Rejected(RejectionReview),
}

impl ResponseDetails {
    pub fn kind(&self) -> ResponseKind {
        match self {
            Self::Deleted => ResponseKind::Deleted,
            Self::Verified => ResponseKind::Verified,
            Self::Updated { .. } => ResponseKind::Updated,
            Self::Investigating => ResponseKind::Investigating,
            Self::NoResponse => ResponseKind::NoResponse,
            Self::Rejected(_) => ResponseKind::Rejected,
        }
    }
}

/// Where the dispute goes after this response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EvaluationOutcome {
    /// Item deleted: open a reinsertion watch, resolve the dispute.
    Deleted,
    /// Violations confirmed: escalate to NON_COMPLIANT.
    NonCompliant { statutes: Vec<String> },
    /// UPDATED and every disputed field reconciled: resolve cured.
    Cured,
    /// INVESTIGATING: interim window, no determination yet.
    Interim { interim_deadline: NaiveDate },
    /// Procedurally valid rejection: cure-offer sub-flow.
    CureOffer { cure_deadline: NaiveDate },
}

#[derive(Debug, Clone)]
pub struct Evaluation {
    pub new_violations: Vec<Violation>,
    pub outcome: EvaluationOutcome,
}

fn creditor_name<'a>(source_violation: Option<&'a Violation>, entity: &'a Entity) -> &'a str {
    source_violation
        .map(|v| v.creditor_name.as_str())
        .unwrap_or(entity.canonical_name.as_str())
}

/// Evaluate one entity response against the dispute's facts.
pub fn evaluate(
    dispute: &Dispute,
    entity: &Entity,
    source_violation: Option<&Violation>,
    details: &ResponseDetails,
    response_date: NaiveDate,
) -> Evaluation {
    let validation_duty = can_cite_validation_duty(
        entity.entity_type,
        dispute.has_validation_request,
        dispute.collection_continued,
    );
    let duty_statutes = statutes::duty_to_investigate(entity.entity_type, validation_duty);
    let creditor = creditor_name(source_violation, entity);

    match details {
        ResponseDetails::Deleted => Evaluation {
            new_violations: vec![],
            outcome: EvaluationOutcome::Deleted,
        },

        ResponseDetails::Verified => {
            // VERIFIED always escalates, whatever the entity type.
            let willful = source_violation
                .map(|v| v.evidence_proves_inaccuracy)
                .unwrap_or(false);
            let violation = Violation::determined(
                ViolationKind::UnreasonableVerification,
                duty_statutes.clone(),
                Severity::Major,
                &dispute.account_fingerprint,
                creditor,
                response_date,
            )
            .with_willful(willful);
            Evaluation {
                new_violations: vec![violation],
                outcome: EvaluationOutcome::NonCompliant {
                    statutes: duty_statutes,
                },
            }
        }

        ResponseDetails::Updated { fields } => {
            let uncured: Vec<&FieldReconciliation> =
                fields.iter().filter(|f| !f.is_cured()).collect();
            if uncured.is_empty() {
                return Evaluation {
                    new_violations: vec![],
                    outcome: EvaluationOutcome::Cured,
                };
            }
            let mut cited = duty_statutes.clone();
            if entity.entity_type == crate::entity::EntityType::Cra {
                cited.push(statutes::FCRA_607_ACCURACY.to_string());
            }
            let evidence = serde_json::to_string(&uncured).unwrap_or_default();
            let violation = Violation::determined(
                ViolationKind::ContinuedInaccuracy,
                cited.clone(),
                Severity::Major,
                &dispute.account_fingerprint,
                creditor,
                response_date,
            )
            .with_evidence(evidence);
            Evaluation {
                new_violations: vec![violation],
                outcome: EvaluationOutcome::NonCompliant { statutes: cited },
            }
        }

        ResponseDetails::Investigating => Evaluation {
            new_violations: vec![],
            outcome: EvaluationOutcome::Interim {
                interim_deadline: response_date + Days::new(INTERIM_RESPONSE_DAYS),
            },
        },

        ResponseDetails::NoResponse => {
            let violation = Violation::determined(
                ViolationKind::InvestigationFailure,
                duty_statutes.clone(),
                Severity::Major,
                &dispute.account_fingerprint,
                creditor,
                response_date,
            );
            Evaluation {
                new_violations: vec![violation],
                outcome: EvaluationOutcome::NonCompliant {
                    statutes: duty_statutes,
                },
            }
        }

        ResponseDetails::Rejected(review) => {
            let mut violations = Vec::new();
            let procedural_statute = match entity.entity_type {
                crate::entity::EntityType::Cra => {
                    vec![statutes::FCRA_611_FRIVOLOUS_NOTICE.to_string()]
                }
                crate::entity::EntityType::Furnisher => duty_statutes.clone(),
                crate::entity::EntityType::Collector => duty_statutes.clone(),
            };
            let mut unmet = |kind: ViolationKind| {
                violations.push(Violation::determined(
                    kind,
                    procedural_statute.clone(),
                    Severity::Moderate,
                    &dispute.account_fingerprint,
                    creditor,
                    response_date,
                ));
            };
            if !review.advance_notice_given {
                unmet(ViolationKind::RejectionWithoutNotice);
            }
            if !review.specific_reason_stated {
                unmet(ViolationKind::RejectionWithoutReason);
            }
            if !review.missing_information_identified {
                unmet(ViolationKind::RejectionWithoutDetail);
            }

            if violations.is_empty() {
                let window = if review.extended_cure_window {
                    CURE_WINDOW_EXTENDED_DAYS
                } else {
                    CURE_WINDOW_DAYS
                };
                Evaluation {
                    new_violations: vec![],
                    outcome: EvaluationOutcome::CureOffer {
                        cure_deadline: response_date + Days::new(window),
                    },
                }
            } else {
                Evaluation {
                    new_violations: violations,
                    outcome: EvaluationOutcome::NonCompliant {
                        statutes: procedural_statute,
                    },
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entity::EntityType;
    use crate::escalation::EscalationState;

    fn fixture(entity_type: EntityType) -> (Dispute, Entity) {
        let entity = Entity {
            entity_id: "e1".into(),
            canonical_name: "TransUnion LLC".into(),
            entity_type,
        };
        let dispute = Dispute {
            dispute_id: "d1".into(),
            entity_id: "e1".into(),
            violation_ids: vec![],
            account_fingerprint: "fp-1".into(),
            source: crate::dispute::DisputeSource::Direct,
            dispute_date: None,
            deadline_date: None,
            deadline_extended: false,
            interim_deadline: None,
            cure_deadline: None,
            current_state: EscalationState::Disputed,
            has_validation_request: false,
            collection_continued: false,
        };
        (dispute, entity)
    }

    fn d(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    #[test]
    fn verified_always_goes_non_compliant() {
        for entity_type in [EntityType::Cra, EntityType::Furnisher, EntityType::Collector] {
            let (dispute, entity) = fixture(entity_type);
            let eval = evaluate(&dispute, &entity, None, &ResponseDetails::Verified, d("2025-03-01"));
            assert!(matches!(eval.outcome, EvaluationOutcome::NonCompliant { .. }));
            assert_eq!(eval.new_violations.len(), 1);
            assert_eq!(eval.new_violations[0].kind, ViolationKind::UnreasonableVerification);
        }
    }

    #[test]
    fn investigating_sets_fifteen_day_interim() {
        let (dispute, entity) = fixture(EntityType::Cra);
        let eval = evaluate(&dispute, &entity, None, &ResponseDetails::Investigating, d("2025-03-01"));
        assert_eq!(
            eval.outcome,
            EvaluationOutcome::Interim { interim_deadline: d("2025-03-16") }
        );
        assert!(eval.new_violations.is_empty());
    }

    #[test]
    fn updated_with_all_fields_cured_resolves() {
        let (dispute, entity) = fixture(EntityType::Cra);
        let fields = vec![FieldReconciliation {
            field: "balance".into(),
            expected: "0".into(),
            entity_claimed: "0".into(),
            current_report: "0".into(),
        }];
        let eval = evaluate(&dispute, &entity, None, &ResponseDetails::Updated { fields }, d("2025-03-01"));
        assert_eq!(eval.outcome, EvaluationOutcome::Cured);
        assert!(eval.new_violations.is_empty());
    }

    #[test]
    fn updated_with_any_uncured_field_is_continued_inaccuracy() {
        let (dispute, entity) = fixture(EntityType::Cra);
        let fields = vec![
            FieldReconciliation {
                field: "balance".into(),
                expected: "0".into(),
                entity_claimed: "0".into(),
                current_report: "0".into(),
            },
            FieldReconciliation {
                field: "status".into(),
                expected: "paid".into(),
                entity_claimed: "paid".into(),
                current_report: "collection".into(),
            },
        ];
        let eval = evaluate(&dispute, &entity, None, &ResponseDetails::Updated { fields }, d("2025-03-01"));
        assert!(matches!(eval.outcome, EvaluationOutcome::NonCompliant { .. }));
        assert_eq!(eval.new_violations[0].kind, ViolationKind::ContinuedInaccuracy);
    }

    #[test]
    fn procedurally_valid_rejection_offers_cure_instead_of_escalating() {
        let (dispute, entity) = fixture(EntityType::Cra);
        let review = RejectionReview {
            advance_notice_given: true,
            specific_reason_stated: true,
            missing_information_identified: true,
            extended_cure_window: false,
        };
        let eval = evaluate(&dispute, &entity, None, &ResponseDetails::Rejected(review), d("2025-03-01"));
        assert!(eval.new_violations.is_empty());
        assert_eq!(
            eval.outcome,
            EvaluationOutcome::CureOffer { cure_deadline: d("2025-03-16") }
        );
    }

    #[test]
    fn each_unmet_rejection_requirement_is_its_own_violation() {
        let (dispute, entity) = fixture(EntityType::Cra);
        let review = RejectionReview {
            advance_notice_given: false,
            specific_reason_stated: false,
            missing_information_identified: true,
            extended_cure_window: false,
        };
        let eval = evaluate(&dispute, &entity, None, &ResponseDetails::Rejected(review), d("2025-03-01"));
        assert_eq!(eval.new_violations.len(), 2);
        assert!(matches!(eval.outcome, EvaluationOutcome::NonCompliant { .. }));
    }

    #[test]
    fn collector_rejection_without_guardrail_substitutes_statutes() {
        let (dispute, entity) = fixture(EntityType::Collector);
        let eval = evaluate(&dispute, &entity, None, &ResponseDetails::NoResponse, d("2025-03-01"));
        let cited = &eval.new_violations[0].statute_refs;
        assert!(cited.contains(&statutes::FDCPA_807_FALSE_REPRESENTATION.to_string()));
        assert!(!cited.contains(&statutes::FDCPA_809_VALIDATION.to_string()));
    }

    #[test]
    fn collector_with_guardrail_cites_validation_duty() {
        let (mut dispute, entity) = fixture(EntityType::Collector);
        dispute.has_validation_request = true;
        dispute.collection_continued = true;
        let eval = evaluate(&dispute, &entity, None, &ResponseDetails::NoResponse, d("2025-03-01"));
        assert_eq!(
            eval.new_violations[0].statute_refs,
            vec![statutes::FDCPA_809_VALIDATION.to_string()]
        );
    }
}
