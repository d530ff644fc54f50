//! Escalation state machine tests: allow-list enforcement, one-way
//! states, fold consistency, and the artifact queue.

use chrono::NaiveDate;
use fcra_core::{
    clock::FixedClock,
    dispute::DisputeSource,
    engine::DisputeEngine,
    entity::EntityType,
    error::CoreError,
    escalation::EscalationState,
    response::{ResponseDetails, ResponseStage},
    scheduler,
    store::CoreStore,
    violation::{Severity, Violation, ViolationKind},
};

fn d(s: &str) -> NaiveDate {
    NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
}

fn engine_at(date: &str) -> DisputeEngine {
    let store = CoreStore::in_memory().unwrap();
    store.migrate().unwrap();
    DisputeEngine::new(store, Box::new(FixedClock(d(date))))
}

fn new_dispute(engine: &DisputeEngine) -> String {
    let entity = engine
        .canonicalize_entity("transunion", EntityType::Cra)
        .unwrap();
    let violation = Violation::reported(
        ViolationKind::InaccurateReporting,
        vec!["FCRA 607(b)".to_string()],
        Severity::Major,
        "fp-1",
        "Acme Card Services",
        d("2024-12-01"),
    );
    engine.register_violation(&violation).unwrap();
    engine
        .create_dispute(
            vec![violation.violation_id],
            &entity.entity_id,
            DisputeSource::Direct,
        )
        .unwrap()
        .dispute_id
}

/// Drive a dispute to NON_COMPLIANT: mail it, then log VERIFIED.
fn non_compliant_dispute(engine: &DisputeEngine) -> String {
    let id = new_dispute(engine);
    engine.confirm_mailed(&id, d("2025-01-01")).unwrap();
    engine
        .log_response(
            &id,
            ResponseStage::Initial,
            d("2025-01-20"),
            None,
            &ResponseDetails::Verified,
        )
        .unwrap();
    id
}

#[test]
fn unlisted_transitions_are_rejected_not_ignored() {
    let engine = engine_at("2025-01-01");
    let id = new_dispute(&engine);

    // DETECTED has no EscalationAdvanced edge.
    let err = engine.advance_escalation(&id).unwrap_err();
    assert!(
        matches!(err, CoreError::InvalidTransition { .. }),
        "expected InvalidTransition, got {err:?}"
    );
    // Dispute unchanged, paper trail untouched.
    let dispute = engine.store().get_dispute(&id).unwrap();
    assert_eq!(dispute.current_state, EscalationState::Detected);
    assert!(engine.paper_trail(&id).unwrap().is_empty());
}

#[test]
fn fold_of_the_paper_trail_matches_the_cached_state() {
    let engine = engine_at("2025-01-20");
    let id = non_compliant_dispute(&engine);

    let folded = engine.current_state(&id).unwrap();
    let cached = engine.store().get_dispute(&id).unwrap().current_state;
    assert_eq!(folded, cached);
    assert_eq!(folded, EscalationState::NonCompliant);

    // Every transition wrote exactly one entry, and the entries chain:
    // each from_state is the previous to_state.
    let trail = engine.paper_trail(&id).unwrap();
    assert_eq!(trail.len(), 4); // mailed + logged + evaluated + confirmed
    assert_eq!(trail[0].from_state, EscalationState::Detected);
    for pair in trail.windows(2) {
        assert_eq!(pair[0].to_state, pair[1].from_state);
    }
}

#[test]
fn enforcement_track_runs_one_way_to_litigation_ready() {
    let engine = engine_at("2025-01-20");
    let id = non_compliant_dispute(&engine);

    let track = [
        EscalationState::ProceduralEnforcement,
        EscalationState::SubstantiveEnforcement,
        EscalationState::RegulatoryEscalation,
        EscalationState::LitigationReady,
    ];
    for expected in track {
        assert_eq!(engine.advance_escalation(&id).unwrap(), expected);
    }

    // Terminal: no further advance.
    let err = engine.advance_escalation(&id).unwrap_err();
    assert!(matches!(err, CoreError::InvalidTransition { .. }));

    // One-way invariant over the whole trail: once a one-way state is
    // entered, no later entry targets a lower-ranked state.
    let trail = engine.paper_trail(&id).unwrap();
    let mut floor = 0u8;
    for entry in &trail {
        assert!(
            entry.to_state.rank() >= floor,
            "{:?} regressed below rank {floor}",
            entry.to_state
        );
        if entry.to_state.is_one_way() {
            floor = entry.to_state.rank();
        }
    }
}

#[test]
fn resolved_cured_is_terminal_without_enforcement() {
    let engine = engine_at("2025-01-20");
    let id = new_dispute(&engine);
    engine.confirm_mailed(&id, d("2025-01-01")).unwrap();
    engine
        .log_response(
            &id,
            ResponseStage::Initial,
            d("2025-01-20"),
            None,
            &ResponseDetails::Updated {
                fields: vec![fcra_core::response::FieldReconciliation {
                    field: "balance".into(),
                    expected: "0".into(),
                    entity_claimed: "0".into(),
                    current_report: "0".into(),
                }],
            },
        )
        .unwrap();

    assert_eq!(
        engine.current_state(&id).unwrap(),
        EscalationState::ResolvedCured
    );
    let err = engine.advance_escalation(&id).unwrap_err();
    assert!(matches!(err, CoreError::InvalidTransition { .. }));
}

#[test]
fn transitions_enqueue_artifacts_and_the_flush_job_readies_them() {
    let engine = engine_at("2025-01-20");
    let id = non_compliant_dispute(&engine);

    let queued = engine
        .store()
        .artifact_kinds_for_dispute(&id, "queued")
        .unwrap();
    assert!(queued.contains(&"statutory_notice_letter".to_string()));
    assert!(queued.contains(&"method_of_verification_request".to_string()));

    let flushed = scheduler::flush_artifacts(&engine, d("2025-01-20")).unwrap();
    assert_eq!(flushed, queued.len());
    assert!(engine
        .store()
        .artifact_kinds_for_dispute(&id, "queued")
        .unwrap()
        .is_empty());
    let ready = engine
        .store()
        .artifact_kinds_for_dispute(&id, "ready")
        .unwrap();
    assert_eq!(ready.len(), flushed);

    // Re-running the flush is a no-op.
    assert_eq!(scheduler::flush_artifacts(&engine, d("2025-01-21")).unwrap(), 0);
}

#[test]
fn letter_context_collects_state_violations_and_statutes() {
    let engine = engine_at("2025-01-20");
    let id = non_compliant_dispute(&engine);

    let context = engine.letter_context(&id).unwrap();
    assert_eq!(context.current_state, EscalationState::NonCompliant);
    // The seed violation plus the verification violation.
    assert_eq!(context.active_violations.len(), 2);
    assert!(context
        .statutes_activated
        .iter()
        .any(|s| s.starts_with("FCRA 611")));
    assert_eq!(
        DisputeEngine::available_artifacts(EscalationState::NonCompliant),
        &["statutory_notice_letter", "method_of_verification_request"]
    );
}
