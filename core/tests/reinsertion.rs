//! Reinsertion monitor tests: watch lifecycle, the notice-validity
//! rules, and the bypass escalation.

use chrono::NaiveDate;
use fcra_core::{
    clock::FixedClock,
    dispute::DisputeSource,
    engine::DisputeEngine,
    entity::EntityType,
    escalation::EscalationState,
    reinsertion::WatchStatus,
    report::{ReportSnapshot, ReportedAccount},
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

/// Seed a CRA dispute on fingerprint F1 and log DELETED on 2025-01-01.
fn deleted_dispute(engine: &DisputeEngine) -> String {
    let entity = engine
        .canonicalize_entity("transunion", EntityType::Cra)
        .unwrap();
    let violation = Violation::reported(
        ViolationKind::InaccurateReporting,
        vec!["FCRA 607(b)".to_string()],
        Severity::Major,
        "F1",
        "Acme Recovery",
        d("2024-11-01"),
    );
    engine.register_violation(&violation).unwrap();
    let id = engine
        .create_dispute(
            vec![violation.violation_id],
            &entity.entity_id,
            DisputeSource::Direct,
        )
        .unwrap()
        .dispute_id;
    engine.confirm_mailed(&id, d("2024-12-01")).unwrap();
    engine
        .log_response(
            &id,
            ResponseStage::Initial,
            d("2025-01-01"),
            None,
            &ResponseDetails::Deleted,
        )
        .unwrap();
    id
}

fn report_with_f1(date: &str) -> ReportSnapshot {
    ReportSnapshot {
        report_date: d(date),
        bureau: "transunion".into(),
        accounts: vec![ReportedAccount {
            account_fingerprint: "F1".into(),
            creditor_name: "Acme Recovery".into(),
            status_code: Some("collection".into()),
            reported_date: Some(d(date)),
        }],
    }
}

#[test]
fn deleted_response_opens_a_ninety_day_watch() {
    let engine = engine_at("2025-01-01");
    let id = deleted_dispute(&engine);

    let watches = engine.store().watches_for_fingerprint("F1").unwrap();
    assert_eq!(watches.len(), 1);
    assert_eq!(watches[0].window_start, d("2025-01-01"));
    assert_eq!(watches[0].window_end, d("2025-04-01"));
    assert_eq!(watches[0].status, WatchStatus::Active);
    assert_eq!(
        engine.store().get_dispute(&id).unwrap().current_state,
        EscalationState::ResolvedDeleted
    );
}

#[test]
fn reinsertion_without_notice_is_critical_and_bypasses_to_regulatory() {
    let engine = engine_at("2025-02-01");
    let id = deleted_dispute(&engine);

    let outcome = engine.ingest_report(&report_with_f1("2025-02-01")).unwrap();
    assert_eq!(outcome.reinsertions_detected, 1);

    let watch = &engine.store().watches_for_fingerprint("F1").unwrap()[0];
    assert_eq!(watch.status, WatchStatus::ReinsertionDetected);
    assert_eq!(watch.reinsertion_date, Some(d("2025-02-01")));

    let cra_violations = engine
        .store()
        .violations_for_fingerprint("F1")
        .unwrap()
        .into_iter()
        .filter(|v| v.kind == ViolationKind::ReinsertionWithoutNotice)
        .collect::<Vec<_>>();
    assert_eq!(cra_violations.len(), 1);
    assert_eq!(cra_violations[0].severity, Severity::Critical);
    assert!(cra_violations[0].willful_indicator);

    // Correlated furnisher violation.
    assert_eq!(
        engine
            .store()
            .count_violations_of_kind(ViolationKind::ReinsertionRefurnished)
            .unwrap(),
        1
    );

    // RESOLVED_DELETED bypasses straight to REGULATORY_ESCALATION.
    assert_eq!(
        engine.store().get_dispute(&id).unwrap().current_state,
        EscalationState::RegulatoryEscalation
    );
}

#[test]
fn timely_advance_notice_makes_the_reinsertion_clean() {
    let engine = engine_at("2025-02-01");
    let id = deleted_dispute(&engine);
    let watch_id = engine.store().watches_for_fingerprint("F1").unwrap()[0]
        .watch_id
        .clone();

    // 2025-01-20 + 5 business days = 2025-01-27 <= 2025-02-01.
    engine
        .log_reinsertion_notice(&watch_id, d("2025-01-20"))
        .unwrap();
    engine.ingest_report(&report_with_f1("2025-02-01")).unwrap();

    let watch = engine.store().get_watch(&watch_id).unwrap();
    assert_eq!(watch.status, WatchStatus::NoticeReceived);
    assert_eq!(
        engine
            .store()
            .count_violations_of_kind(ViolationKind::ReinsertionWithoutNotice)
            .unwrap(),
        0
    );
    assert_eq!(
        engine.store().get_dispute(&id).unwrap().current_state,
        EscalationState::ResolvedDeleted
    );
}

#[test]
fn late_notice_after_detection_is_a_moderate_violation() {
    let engine = engine_at("2025-02-01");
    deleted_dispute(&engine);
    engine.ingest_report(&report_with_f1("2025-02-01")).unwrap();

    let watch_id = engine.store().watches_for_fingerprint("F1").unwrap()[0]
        .watch_id
        .clone();
    // 2025-01-30 + 5 business days = 2025-02-06 > 2025-02-01: late.
    let watch = engine
        .log_reinsertion_notice(&watch_id, d("2025-01-30"))
        .unwrap();
    assert_eq!(watch.status, WatchStatus::ReinsertionDetected);
    assert_eq!(watch.notice_date, Some(d("2025-01-30")));

    let late = engine
        .store()
        .violations_for_fingerprint("F1")
        .unwrap()
        .into_iter()
        .filter(|v| v.kind == ViolationKind::ReinsertionLateNotice)
        .collect::<Vec<_>>();
    assert_eq!(late.len(), 1);
    assert_eq!(late[0].severity, Severity::Moderate);
}

#[test]
fn window_expiry_closes_the_watch_with_no_violation() {
    let engine = engine_at("2025-04-02");
    deleted_dispute(&engine);

    // Window ended 2025-04-01; 2025-04-01 itself does not expire it.
    let early = scheduler::reinsertion_window_scan(&engine, d("2025-04-01"));
    assert_eq!(early.converted, 0);

    let summary = scheduler::reinsertion_window_scan(&engine, d("2025-04-02"));
    assert_eq!(summary.converted, 1);

    let watch = &engine.store().watches_for_fingerprint("F1").unwrap()[0];
    assert_eq!(watch.status, WatchStatus::Expired);
    for kind in [
        ViolationKind::ReinsertionWithoutNotice,
        ViolationKind::ReinsertionRefurnished,
        ViolationKind::ReinsertionLateNotice,
    ] {
        assert_eq!(engine.store().count_violations_of_kind(kind).unwrap(), 0);
    }
}

#[test]
fn report_outside_the_window_detects_nothing() {
    let engine = engine_at("2025-04-10");
    deleted_dispute(&engine);
    // Expire first, as the daily scan would have.
    scheduler::reinsertion_window_scan(&engine, d("2025-04-10"));

    let outcome = engine.ingest_report(&report_with_f1("2025-04-10")).unwrap();
    assert_eq!(outcome.reinsertions_detected, 0);
    assert_eq!(
        engine.store().watches_for_fingerprint("F1").unwrap()[0].status,
        WatchStatus::Expired
    );
}
