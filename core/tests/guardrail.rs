//! Collector validation guardrail: statute routing end to end.

use chrono::NaiveDate;
use fcra_core::{
    clock::FixedClock,
    dispute::DisputeSource,
    engine::DisputeEngine,
    entity::EntityType,
    guardrail::can_cite_validation_duty,
    scheduler,
    store::CoreStore,
    violation::{statutes, Severity, Violation, ViolationKind},
};

fn d(s: &str) -> NaiveDate {
    NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
}

fn engine_at(date: &str) -> DisputeEngine {
    let store = CoreStore::in_memory().unwrap();
    store.migrate().unwrap();
    DisputeEngine::new(store, Box::new(FixedClock(d(date))))
}

fn collector_dispute(engine: &DisputeEngine) -> String {
    let entity = engine
        .canonicalize_entity("Midland Credit Management", EntityType::Collector)
        .unwrap();
    let violation = Violation::reported(
        ViolationKind::InaccurateReporting,
        vec![statutes::FDCPA_807_FALSE_REPRESENTATION.to_string()],
        Severity::Major,
        "fp-collector",
        "Midland Credit Management",
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

/// Breach on one dispute, with and without the guardrail facts.
fn breach_statutes(has_request: bool, continued: bool) -> Vec<String> {
    let engine = engine_at("2025-03-01");
    let id = collector_dispute(&engine);
    engine.confirm_mailed(&id, d("2025-01-01")).unwrap();
    engine
        .record_validation_activity(&id, has_request, continued)
        .unwrap();

    let summary = scheduler::deadline_breach_scan(&engine, d("2025-03-01"));
    assert_eq!(summary.converted, 1);

    let responses = engine.store().responses_for_dispute(&id).unwrap();
    let violation_id = &responses[0].resulting_violation_ids[0];
    engine.store().get_violation(violation_id).unwrap().statute_refs
}

#[test]
fn full_guardrail_cites_the_validation_duty() {
    let cited = breach_statutes(true, true);
    assert_eq!(cited, vec![statutes::FDCPA_809_VALIDATION.to_string()]);
}

#[test]
fn missing_validation_request_substitutes_general_statutes() {
    let cited = breach_statutes(false, true);
    assert!(cited.contains(&statutes::FDCPA_807_FALSE_REPRESENTATION.to_string()));
    assert!(cited.contains(&statutes::FDCPA_808_UNFAIR_PRACTICE.to_string()));
    assert!(!cited.contains(&statutes::FDCPA_809_VALIDATION.to_string()));
}

#[test]
fn halted_collection_substitutes_general_statutes() {
    let cited = breach_statutes(true, false);
    assert!(!cited.contains(&statutes::FDCPA_809_VALIDATION.to_string()));
}

#[test]
fn guardrail_facts_are_one_way() {
    let engine = engine_at("2025-01-01");
    let id = collector_dispute(&engine);
    engine.record_validation_activity(&id, true, true).unwrap();
    // Re-recording with false never clears a fact already on file.
    engine.record_validation_activity(&id, false, false).unwrap();

    let dispute = engine.store().get_dispute(&id).unwrap();
    assert!(dispute.has_validation_request);
    assert!(dispute.collection_continued);
}

#[test]
fn predicate_holds_only_for_the_exact_collector_combination() {
    for entity_type in [EntityType::Cra, EntityType::Furnisher, EntityType::Collector] {
        for has_request in [false, true] {
            for continued in [false, true] {
                let expected =
                    entity_type == EntityType::Collector && has_request && continued;
                assert_eq!(
                    can_cite_validation_duty(entity_type, has_request, continued),
                    expected,
                    "{entity_type:?} request={has_request} continued={continued}"
                );
            }
        }
    }
}
