//! Cross-entity pattern detector.
//!
//! Runs after each response evaluation or report ingestion, comparing
//! records that share an account fingerprint across entities. Detection is
//! system-authoritative (no user confirmation) and idempotent: the
//! pattern_match table is the witness, and a kind already logged for a
//! fingerprint is never re-logged.

use crate::{
    clock::notice_is_timely,
    entity::EntityType,
    error::CoreResult,
    reinsertion::WatchStatus,
    response::ResponseKind,
    store::{CoreStore, FingerprintResponseRow},
    violation::{statutes, Severity, Violation, ViolationKind},
};
use chrono::NaiveDate;

/// Max days between a VERIFIED and a peer bureau's DELETED for the two to
/// count as contradictory (pattern 2).
pub const VERIFIED_DELETED_WINDOW_DAYS: i64 = 90;
/// Cross-bureau reported-date variance tolerance (pattern 4).
pub const DATE_VARIANCE_TOLERANCE_DAYS: i64 = 30;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PatternKind {
    /// Bureau deleted, fingerprint reappeared in-window with no notice.
    /// Composes with the reinsertion monitor, which already created the
    /// violations and requested the bypass escalation.
    ReinsertionAfterDeletion,
    /// One bureau verified what a peer bureau deleted.
    ContradictedVerification,
    /// CRA verified while the furnisher went silent or deleted.
    FurnisherContradiction,
    /// Cross-bureau field variance beyond tolerance.
    FieldVariance,
}

impl PatternKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ReinsertionAfterDeletion => "reinsertion_after_deletion",
            Self::ContradictedVerification => "contradicted_verification",
            Self::FurnisherContradiction => "furnisher_contradiction",
            Self::FieldVariance => "field_variance",
        }
    }
}

/// One detected pattern: the violations to record and the disputes to
/// escalate. Persisting the hit is the engine's job.
#[derive(Debug)]
pub struct PatternHit {
    pub fingerprint: String,
    pub kind: PatternKind,
    pub violations: Vec<Violation>,
    pub escalation_targets: Vec<String>,
}

pub fn detect(store: &CoreStore, fingerprint: &str, today: NaiveDate) -> CoreResult<Vec<PatternHit>> {
    let already_logged = store.pattern_kinds_for_fingerprint(fingerprint)?;
    let logged = |kind: PatternKind| already_logged.iter().any(|k| k == kind.as_str());

    let responses = store.responses_for_fingerprint(fingerprint)?;
    let creditor = store
        .creditor_for_fingerprint(fingerprint)?
        .unwrap_or_else(|| "unknown".to_string());

    let mut hits = Vec::new();

    if !logged(PatternKind::ReinsertionAfterDeletion) {
        if let Some(hit) = detect_reinsertion_compound(store, fingerprint)? {
            hits.push(hit);
        }
    }
    if !logged(PatternKind::ContradictedVerification) {
        if let Some(hit) = detect_contradicted_verification(&responses, fingerprint, &creditor, today)
        {
            hits.push(hit);
        }
    }
    if !logged(PatternKind::FurnisherContradiction) {
        if let Some(hit) = detect_furnisher_contradiction(&responses, fingerprint, &creditor, today)
        {
            hits.push(hit);
        }
    }
    if !logged(PatternKind::FieldVariance) {
        if let Some(hit) = detect_field_variance(store, fingerprint, &creditor, today)? {
            hits.push(hit);
        }
    }

    Ok(hits)
}

/// Pattern 1. The reinsertion monitor owns the violations and the bypass
/// escalation; this records the compound pattern for the paper trail.
fn detect_reinsertion_compound(
    store: &CoreStore,
    fingerprint: &str,
) -> CoreResult<Option<PatternHit>> {
    for watch in store.watches_for_fingerprint(fingerprint)? {
        if watch.status != WatchStatus::ReinsertionDetected {
            continue;
        }
        let Some(reinserted) = watch.reinsertion_date else {
            continue;
        };
        let noticed = watch
            .notice_date
            .map(|n| notice_is_timely(n, reinserted))
            .unwrap_or(false);
        if !noticed {
            return Ok(Some(PatternHit {
                fingerprint: fingerprint.to_string(),
                kind: PatternKind::ReinsertionAfterDeletion,
                violations: vec![],
                escalation_targets: vec![],
            }));
        }
    }
    Ok(None)
}

/// Pattern 2. A peer bureau's deletion is evidence the verifying bureau's
/// investigation was unreasonable.
fn detect_contradicted_verification(
    responses: &[FingerprintResponseRow],
    fingerprint: &str,
    creditor: &str,
    today: NaiveDate,
) -> Option<PatternHit> {
    let verifieds = responses
        .iter()
        .filter(|r| r.kind == ResponseKind::Verified && r.entity_type == EntityType::Cra);
    for verified in verifieds {
        let contradicted = responses.iter().find(|r| {
            r.kind == ResponseKind::Deleted
                && r.entity_type == EntityType::Cra
                && r.entity_id != verified.entity_id
                && (r.response_date - verified.response_date).num_days().abs()
                    <= VERIFIED_DELETED_WINDOW_DAYS
        });
        if let Some(deleted) = contradicted {
            let evidence = serde_json::json!({
                "verified_by": verified.entity_name,
                "verified_on": verified.response_date.to_string(),
                "deleted_by": deleted.entity_name,
                "deleted_on": deleted.response_date.to_string(),
            });
            let violation = Violation::determined(
                ViolationKind::InconsistentVerification,
                vec![statutes::FCRA_611_INVESTIGATION.to_string()],
                Severity::Major,
                fingerprint,
                creditor,
                today,
            )
            .with_evidence(evidence.to_string());
            return Some(PatternHit {
                fingerprint: fingerprint.to_string(),
                kind: PatternKind::ContradictedVerification,
                violations: vec![violation],
                escalation_targets: vec![verified.dispute_id.clone()],
            });
        }
    }
    None
}

/// Pattern 3. Furnisher silence or deletion contradicts the CRA's
/// verification claim.
fn detect_furnisher_contradiction(
    responses: &[FingerprintResponseRow],
    fingerprint: &str,
    creditor: &str,
    today: NaiveDate,
) -> Option<PatternHit> {
    let verified = responses
        .iter()
        .find(|r| r.kind == ResponseKind::Verified && r.entity_type == EntityType::Cra)?;
    let contradiction = responses.iter().find(|r| {
        r.entity_type == EntityType::Furnisher
            && matches!(r.kind, ResponseKind::NoResponse | ResponseKind::Deleted)
    })?;

    let evidence = serde_json::json!({
        "cra": verified.entity_name,
        "verified_on": verified.response_date.to_string(),
        "furnisher": contradiction.entity_name,
        "furnisher_response": contradiction.kind.as_str(),
    });
    let violation = Violation::determined(
        ViolationKind::FurnisherContradiction,
        vec![
            statutes::FCRA_611_INVESTIGATION.to_string(),
            statutes::FCRA_623_INVESTIGATION.to_string(),
        ],
        Severity::Major,
        fingerprint,
        creditor,
        today,
    )
    .with_evidence(evidence.to_string());
    Some(PatternHit {
        fingerprint: fingerprint.to_string(),
        kind: PatternKind::FurnisherContradiction,
        violations: vec![violation],
        escalation_targets: vec![verified.dispute_id.clone()],
    })
}

/// Pattern 4. Maximum-possible-accuracy violation, independent of any
/// response: reported-date variance > 30 days, or conflicting status codes.
fn detect_field_variance(
    store: &CoreStore,
    fingerprint: &str,
    creditor: &str,
    today: NaiveDate,
) -> CoreResult<Option<PatternHit>> {
    let rows = store.report_rows_for_fingerprint(fingerprint)?;
    let bureaus: std::collections::HashSet<&str> =
        rows.iter().map(|r| r.bureau_entity_id.as_str()).collect();
    if bureaus.len() < 2 {
        return Ok(None);
    }

    let dates: Vec<NaiveDate> = rows.iter().filter_map(|r| r.reported_date).collect();
    let date_variance = match (dates.iter().min(), dates.iter().max()) {
        (Some(min), Some(max)) => (*max - *min).num_days() > DATE_VARIANCE_TOLERANCE_DAYS,
        _ => false,
    };

    let status_codes: std::collections::HashSet<&str> = rows
        .iter()
        .filter_map(|r| r.status_code.as_deref())
        .collect();
    let status_conflict = status_codes.len() >= 2;

    if !date_variance && !status_conflict {
        return Ok(None);
    }

    let evidence = serde_json::json!({
        "bureaus": rows.iter().map(|r| r.bureau_name.clone()).collect::<Vec<_>>(),
        "reported_dates": dates.iter().map(|d| d.to_string()).collect::<Vec<_>>(),
        "status_codes": status_codes.iter().collect::<Vec<_>>(),
    });
    let violation = Violation::determined(
        ViolationKind::AccuracyVariance,
        vec![statutes::FCRA_607_ACCURACY.to_string()],
        Severity::Major,
        fingerprint,
        creditor,
        today,
    )
    .with_evidence(evidence.to_string());

    let targets = store.dispute_ids_for_fingerprint(fingerprint)?;
    Ok(Some(PatternHit {
        fingerprint: fingerprint.to_string(),
        kind: PatternKind::FieldVariance,
        violations: vec![violation],
        escalation_targets: targets,
    }))
}
