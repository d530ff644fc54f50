//! The dispute engine — the public facade over the enforcement core.
//!
//! CONTROL FLOW (fixed, documented):
//!   user actions (create dispute, confirm mailing, log response, ingest
//!   report) and scheduler jobs both feed the response evaluator, deadline
//!   engine, and reinsertion monitor; their outputs become transition
//!   requests against the escalation state machine. Every accepted
//!   transition is appended to the paper trail before it is durable.
//!
//! RULES:
//!   - Downstream collaborators (letter renderer, UI) only read; they
//!     never write state directly.
//!   - SYSTEM-authored responses are created only here, by the breach and
//!     stall converters. The public API always stamps USER provenance.
//!   - No ambient "now": every date comes from the injected clock.

use crate::{
    clock::{notice_is_timely, Clock, SystemClock},
    deadline,
    dispute::{Dispute, DisputeSource},
    entity::{self, Entity, EntityType},
    error::{CoreError, CoreResult},
    escalation::{next_state, Actor, EscalationState, Trigger},
    guardrail::can_cite_validation_duty,
    ledger::{artifacts_for_state, fold_state, EscalationLogEntry},
    patterns,
    reinsertion::{ReinsertionWatch, WatchStatus},
    report::{IngestOutcome, ReportSnapshot},
    response::{
        self, DisputeResponse, EvaluationOutcome, ReportedBy, ResponseDetails, ResponseKind,
        ResponseStage,
    },
    store::CoreStore,
    violation::{statutes, Severity, Violation, ViolationKind},
};
use anyhow::anyhow;
use chrono::NaiveDate;
use uuid::Uuid;

/// Read-only view handed to the letter renderer.
#[derive(Debug, Clone)]
pub struct LetterContext {
    pub dispute: Dispute,
    pub current_state: EscalationState,
    pub active_violations: Vec<Violation>,
    pub statutes_activated: Vec<String>,
}

pub struct DisputeEngine {
    store: CoreStore,
    clock: Box<dyn Clock>,
}

impl DisputeEngine {
    pub fn new(store: CoreStore, clock: Box<dyn Clock>) -> Self {
        Self { store, clock }
    }

    pub fn with_system_clock(store: CoreStore) -> Self {
        Self::new(store, Box::new(SystemClock))
    }

    /// Read access for tooling and tests. Writes go through the API.
    pub fn store(&self) -> &CoreStore {
        &self.store
    }

    // ── Entity registry ────────────────────────────────────────

    /// Canonicalize a raw entity name, creating the registry row lazily
    /// on first reference.
    pub fn canonicalize_entity(&self, raw_name: &str, entity_type: EntityType) -> CoreResult<Entity> {
        let canonical = entity::canonical_name(raw_name);
        self.store.upsert_entity(&canonical, entity_type)
    }

    // ── Violations from the audit boundary ─────────────────────

    pub fn register_violation(&self, violation: &Violation) -> CoreResult<()> {
        self.store.insert_violation(violation)
    }

    // ── Dispute lifecycle ──────────────────────────────────────

    pub fn create_dispute(
        &self,
        violation_ids: Vec<String>,
        entity_id: &str,
        source: DisputeSource,
    ) -> CoreResult<Dispute> {
        if violation_ids.is_empty() {
            return Err(CoreError::Other(anyhow!(
                "a dispute requires at least one violation"
            )));
        }
        // Both lookups validate existence before the insert.
        self.store.get_entity(entity_id)?;
        let first = self.store.get_violation(&violation_ids[0])?;

        let dispute = Dispute {
            dispute_id: Uuid::new_v4().to_string(),
            entity_id: entity_id.to_string(),
            violation_ids,
            account_fingerprint: first.account_fingerprint.clone(),
            source,
            dispute_date: None,
            deadline_date: None,
            deadline_extended: false,
            interim_deadline: None,
            cure_deadline: None,
            current_state: EscalationState::Detected,
            has_validation_request: false,
            collection_continued: false,
        };
        self.store.insert_dispute(&dispute)?;
        log::info!(
            "dispute {} created against entity {} ({} violations)",
            dispute.dispute_id,
            entity_id,
            dispute.violation_ids.len()
        );
        Ok(dispute)
    }

    /// Start tracking: sets dispute_date and the derived deadline exactly
    /// once. A second call is an `ImmutableField` error.
    pub fn confirm_mailed(&self, dispute_id: &str, sent_date: NaiveDate) -> CoreResult<Dispute> {
        let dispute = self.store.get_dispute(dispute_id)?;
        if dispute.is_tracking() {
            return Err(CoreError::ImmutableField {
                dispute_id: dispute_id.to_string(),
                field: "dispute_date",
            });
        }
        let deadline = deadline::compute_deadline(dispute.source, sent_date);
        self.store.set_mailing(dispute_id, sent_date, deadline)?;
        self.transition_strict(dispute_id, Trigger::DisputeMailed, Actor::User, &[], sent_date)?;
        self.store.get_dispute(dispute_id)
    }

    /// Entity requested additional information: deadline resets to
    /// request_date + 15 days. Single reset — a second request does not
    /// stack and leaves the deadline untouched.
    pub fn request_additional_information(
        &self,
        dispute_id: &str,
        request_date: NaiveDate,
    ) -> CoreResult<NaiveDate> {
        let dispute = self.store.get_dispute(dispute_id)?;
        let Some(current_deadline) = dispute.deadline_date else {
            return Err(CoreError::Other(anyhow!(
                "dispute {dispute_id} has no deadline to reset; confirm the mailing first"
            )));
        };
        if dispute.deadline_extended {
            log::warn!("dispute {dispute_id}: additional-information reset already used");
            return Ok(current_deadline);
        }
        let reset = deadline::reset_for_info_request(request_date);
        self.store.set_deadline_reset(dispute_id, reset)?;
        Ok(reset)
    }

    /// Record guardrail facts for a collector dispute. One-way flags.
    pub fn record_validation_activity(
        &self,
        dispute_id: &str,
        has_validation_request: bool,
        collection_continued: bool,
    ) -> CoreResult<()> {
        self.store.get_dispute(dispute_id)?;
        self.store
            .record_validation_activity(dispute_id, has_validation_request, collection_continued)
    }

    // ── Response logging and evaluation ────────────────────────

    /// Log a USER-reported entity response and evaluate it. SYSTEM
    /// provenance is reserved for the breach and stall converters.
    pub fn log_response(
        &self,
        dispute_id: &str,
        stage: ResponseStage,
        response_date: NaiveDate,
        evidence_ref: Option<String>,
        details: &ResponseDetails,
    ) -> CoreResult<DisputeResponse> {
        let dispute = self.store.get_dispute(dispute_id)?;
        let entity = self.store.get_entity(&dispute.entity_id)?;

        if self.store.stage_resolved(dispute_id, stage)? {
            return Err(CoreError::ConflictingResponse {
                dispute_id: dispute_id.to_string(),
                stage: stage.as_str().to_string(),
            });
        }

        let source_violation = dispute
            .violation_ids
            .first()
            .map(|id| self.store.get_violation(id))
            .transpose()?;
        let evaluation = response::evaluate(
            &dispute,
            &entity,
            source_violation.as_ref(),
            details,
            response_date,
        );

        let mut resulting_ids = Vec::new();
        for violation in &evaluation.new_violations {
            self.store.insert_violation(violation)?;
            resulting_ids.push(violation.violation_id.clone());
        }

        let record = DisputeResponse {
            response_id: Uuid::new_v4().to_string(),
            dispute_id: dispute_id.to_string(),
            kind: details.kind(),
            stage,
            response_date,
            reported_by: ReportedBy::User,
            evidence_ref,
            resulting_violation_ids: resulting_ids,
        };
        self.store.insert_response(&record)?;

        // Any new response closes an open INVESTIGATING interim.
        if record.kind != ResponseKind::Investigating && dispute.interim_deadline.is_some() {
            self.store.set_interim_deadline(dispute_id, None)?;
        }

        self.apply_evaluation(&dispute, &source_violation, &record, &evaluation)?;
        self.run_pattern_detection(&dispute.account_fingerprint, response_date)?;

        Ok(record)
    }

    fn apply_evaluation(
        &self,
        dispute: &Dispute,
        source_violation: &Option<Violation>,
        record: &DisputeResponse,
        evaluation: &response::Evaluation,
    ) -> CoreResult<()> {
        let dispute_id = dispute.dispute_id.as_str();
        let on = record.response_date;

        // Any determination closes an open cure offer; only an interim
        // INVESTIGATING reply keeps it pending.
        if dispute.cure_deadline.is_some()
            && !matches!(evaluation.outcome, EvaluationOutcome::Interim { .. })
        {
            self.store.set_cure_deadline(dispute_id, None)?;
        }

        match &evaluation.outcome {
            EvaluationOutcome::Deleted => {
                self.transition_if_allowed(dispute_id, Trigger::ResponseLogged, Actor::Entity, &[], on)?;
                self.open_reinsertion_watch(dispute, source_violation, record.response_date)?;
                self.transition_if_allowed(dispute_id, Trigger::ItemDeleted, Actor::Entity, &[], on)?;
            }
            EvaluationOutcome::NonCompliant { statutes } => {
                if record.kind == ResponseKind::NoResponse {
                    // Entity's silence, reported by the user.
                    self.transition_if_allowed(
                        dispute_id,
                        Trigger::DeadlineBreached,
                        Actor::User,
                        &[],
                        on,
                    )?;
                } else {
                    self.transition_if_allowed(
                        dispute_id,
                        Trigger::ResponseLogged,
                        Actor::Entity,
                        &[],
                        on,
                    )?;
                    self.transition_if_allowed(
                        dispute_id,
                        Trigger::EvaluationCompleted,
                        Actor::System,
                        &[],
                        on,
                    )?;
                }
                self.transition_if_allowed(
                    dispute_id,
                    Trigger::ViolationConfirmed,
                    Actor::System,
                    statutes,
                    on,
                )?;
            }
            EvaluationOutcome::Cured => {
                self.transition_if_allowed(dispute_id, Trigger::ResponseLogged, Actor::Entity, &[], on)?;
                self.transition_if_allowed(
                    dispute_id,
                    Trigger::EvaluationCompleted,
                    Actor::System,
                    &[],
                    on,
                )?;
                self.transition_if_allowed(dispute_id, Trigger::DisputeCured, Actor::Entity, &[], on)?;
            }
            EvaluationOutcome::Interim { interim_deadline } => {
                self.transition_if_allowed(dispute_id, Trigger::ResponseLogged, Actor::Entity, &[], on)?;
                self.store
                    .set_interim_deadline(dispute_id, Some(*interim_deadline))?;
            }
            EvaluationOutcome::CureOffer { cure_deadline } => {
                self.transition_if_allowed(dispute_id, Trigger::ResponseLogged, Actor::Entity, &[], on)?;
                self.transition_if_allowed(
                    dispute_id,
                    Trigger::EvaluationCompleted,
                    Actor::System,
                    &[],
                    on,
                )?;
                self.store
                    .set_cure_deadline(dispute_id, Some(*cure_deadline))?;
                log::info!("dispute {dispute_id}: cure offer open until {cure_deadline}");
            }
        }
        Ok(())
    }

    fn open_reinsertion_watch(
        &self,
        dispute: &Dispute,
        source_violation: &Option<Violation>,
        response_date: NaiveDate,
    ) -> CoreResult<ReinsertionWatch> {
        let violation_id = dispute
            .violation_ids
            .first()
            .cloned()
            .unwrap_or_default();
        let furnisher_name = source_violation
            .as_ref()
            .map(|v| v.creditor_name.clone())
            .unwrap_or_else(|| "unknown".to_string());
        let watch = ReinsertionWatch::open(
            &dispute.dispute_id,
            &violation_id,
            &dispute.account_fingerprint,
            &furnisher_name,
            response_date,
        );
        self.store.insert_watch(&watch)?;
        log::info!(
            "watch {} opened on {} until {}",
            watch.watch_id,
            watch.account_fingerprint,
            watch.window_end
        );
        Ok(watch)
    }

    // ── Reinsertion monitor ────────────────────────────────────

    /// Ingest a parsed report: record per-bureau account rows, sweep
    /// active watches, and re-run pattern detection.
    pub fn ingest_report(&self, snapshot: &ReportSnapshot) -> CoreResult<IngestOutcome> {
        let bureau = self.canonicalize_entity(&snapshot.bureau, EntityType::Cra)?;
        let mut outcome = IngestOutcome::default();

        for account in &snapshot.accounts {
            self.store
                .insert_report_account(snapshot.report_date, &bureau.entity_id, account)?;
        }

        for account in &snapshot.accounts {
            for watch in self
                .store
                .active_watches_for_fingerprint(&account.account_fingerprint)?
            {
                if !watch.covers(snapshot.report_date) {
                    continue;
                }
                outcome.reinsertions_detected += 1;
                outcome.violations_created +=
                    self.handle_reinsertion(&watch, snapshot.report_date, &account.creditor_name)?;
            }
        }

        for account in &snapshot.accounts {
            outcome.patterns_recorded +=
                self.run_pattern_detection(&account.account_fingerprint, snapshot.report_date)?;
        }

        Ok(outcome)
    }

    /// A fingerprint under an ACTIVE watch reappeared — the sole trigger
    /// for REINSERTION_DETECTED.
    fn handle_reinsertion(
        &self,
        watch: &ReinsertionWatch,
        report_date: NaiveDate,
        creditor_name: &str,
    ) -> CoreResult<usize> {
        self.store
            .mark_reinsertion_detected(&watch.watch_id, report_date)?;

        // A timely prior notice makes the reinsertion procedurally clean.
        if let Some(notice) = watch.notice_date {
            if notice_is_timely(notice, report_date) {
                self.store.mark_notice_received(&watch.watch_id, notice)?;
                log::info!("watch {}: reinsertion with timely notice", watch.watch_id);
                return Ok(0);
            }
        }

        let cra_statutes = vec![
            statutes::FCRA_611_REINSERTION_CERT.to_string(),
            statutes::FCRA_611_REINSERTION_NOTICE.to_string(),
        ];
        let cra_violation = Violation::determined(
            ViolationKind::ReinsertionWithoutNotice,
            cra_statutes.clone(),
            Severity::Critical,
            &watch.account_fingerprint,
            creditor_name,
            report_date,
        )
        .with_willful(true);
        let furnisher_violation = Violation::determined(
            ViolationKind::ReinsertionRefurnished,
            vec![statutes::FCRA_623_INVESTIGATION.to_string()],
            Severity::Major,
            &watch.account_fingerprint,
            &watch.furnisher_name,
            report_date,
        );
        self.store.insert_violation(&cra_violation)?;
        self.store.insert_violation(&furnisher_violation)?;

        log::warn!(
            "watch {}: reinsertion without notice on {} — escalating",
            watch.watch_id,
            watch.account_fingerprint
        );

        // Bypass: RESOLVED_DELETED goes straight to REGULATORY_ESCALATION.
        self.transition_if_allowed(
            &watch.dispute_id,
            Trigger::ReinsertionDetected,
            Actor::System,
            &cra_statutes,
            report_date,
        )?;
        Ok(2)
    }

    /// Record a 5-business-day advance notice against a watch.
    pub fn log_reinsertion_notice(
        &self,
        watch_id: &str,
        notice_date: NaiveDate,
    ) -> CoreResult<ReinsertionWatch> {
        let watch = self.store.get_watch(watch_id)?;
        match watch.status {
            WatchStatus::Active => {
                self.store.set_notice_date(watch_id, notice_date)?;
            }
            WatchStatus::ReinsertionDetected => {
                // Watch carries a reinsertion_date from detection.
                let reinserted = watch.reinsertion_date.ok_or_else(|| {
                    CoreError::Other(anyhow!("detected watch {watch_id} missing reinsertion date"))
                })?;
                if notice_is_timely(notice_date, reinserted) {
                    self.store.mark_notice_received(watch_id, notice_date)?;
                } else {
                    self.store.set_notice_date(watch_id, notice_date)?;
                    let violation = Violation::determined(
                        ViolationKind::ReinsertionLateNotice,
                        vec![statutes::FCRA_611_REINSERTION_NOTICE.to_string()],
                        Severity::Moderate,
                        &watch.account_fingerprint,
                        &watch.furnisher_name,
                        notice_date,
                    );
                    self.store.insert_violation(&violation)?;
                }
            }
            WatchStatus::Expired | WatchStatus::NoticeReceived => {
                log::warn!("watch {watch_id}: notice logged on a closed watch, ignoring");
            }
        }
        self.store.get_watch(watch_id)
    }

    // ── Scheduler job bodies ───────────────────────────────────

    /// Deadline-breach conversion for one dispute. Returns true when a
    /// breach was converted. Idempotent: the SYSTEM NO_RESPONSE record is
    /// the witness, so a same-day re-run is a no-op.
    pub(crate) fn check_deadline_breach(&self, dispute_id: &str, today: NaiveDate) -> CoreResult<bool> {
        let dispute = self.store.get_dispute(dispute_id)?;
        let has_response = self.store.has_response(dispute_id)?;
        if !deadline::is_breached(&dispute, today, has_response) {
            return Ok(false);
        }
        if self.store.has_no_response_record(dispute_id)? {
            return Ok(false);
        }

        let cited = self.system_no_response(&dispute, today, ResponseStage::Initial)?;
        self.transition_if_allowed(dispute_id, Trigger::DeadlineBreached, Actor::System, &[], today)?;
        self.transition_if_allowed(dispute_id, Trigger::ViolationConfirmed, Actor::System, &cited, today)?;
        log::info!("dispute {dispute_id}: deadline breach converted");
        Ok(true)
    }

    /// Stall conversion: an INVESTIGATING reply whose 15-day interim
    /// elapsed with no further response becomes a SYSTEM NO_RESPONSE.
    pub(crate) fn convert_stalled(&self, dispute_id: &str, today: NaiveDate) -> CoreResult<bool> {
        let dispute = self.store.get_dispute(dispute_id)?;
        let Some(interim) = dispute.interim_deadline else {
            return Ok(false);
        };
        if today <= interim {
            return Ok(false);
        }
        if self.store.has_no_response_record(dispute_id)? {
            self.store.set_interim_deadline(dispute_id, None)?;
            return Ok(false);
        }

        // Resolve the stage the INVESTIGATING reply left open.
        let stage = self
            .store
            .responses_for_dispute(dispute_id)?
            .iter()
            .rev()
            .find(|r| r.kind == ResponseKind::Investigating)
            .map(|r| r.stage)
            .unwrap_or(ResponseStage::Initial);

        let cited = self.system_no_response(&dispute, today, stage)?;
        self.store.set_interim_deadline(dispute_id, None)?;
        self.transition_if_allowed(dispute_id, Trigger::EvaluationCompleted, Actor::System, &[], today)?;
        self.transition_if_allowed(dispute_id, Trigger::ViolationConfirmed, Actor::System, &cited, today)?;
        log::info!("dispute {dispute_id}: stalled investigation converted");
        Ok(true)
    }

    /// Cure-lapse conversion: a cure offer whose window elapsed with no
    /// curing response confirms the underlying inaccuracy. Idempotent:
    /// the cleared cure_deadline is the witness.
    pub(crate) fn convert_lapsed_cure(&self, dispute_id: &str, today: NaiveDate) -> CoreResult<bool> {
        let dispute = self.store.get_dispute(dispute_id)?;
        let Some(cure) = dispute.cure_deadline else {
            return Ok(false);
        };
        if today <= cure {
            return Ok(false);
        }

        let entity = self.store.get_entity(&dispute.entity_id)?;
        let validation_duty = can_cite_validation_duty(
            entity.entity_type,
            dispute.has_validation_request,
            dispute.collection_continued,
        );
        let cited = statutes::duty_to_investigate(entity.entity_type, validation_duty);
        let creditor = dispute
            .violation_ids
            .first()
            .map(|id| self.store.get_violation(id))
            .transpose()?
            .map(|v| v.creditor_name)
            .unwrap_or_else(|| entity.canonical_name.clone());

        let violation = Violation::determined(
            ViolationKind::ContinuedInaccuracy,
            cited.clone(),
            Severity::Major,
            &dispute.account_fingerprint,
            &creditor,
            today,
        );
        self.store.insert_violation(&violation)?;
        self.store.set_cure_deadline(dispute_id, None)?;
        self.transition_if_allowed(dispute_id, Trigger::ViolationConfirmed, Actor::System, &cited, today)?;
        log::info!("dispute {dispute_id}: cure window lapsed uncured");
        Ok(true)
    }

    /// The only paths that create SYSTEM-authored responses.
    fn system_no_response(
        &self,
        dispute: &Dispute,
        today: NaiveDate,
        stage: ResponseStage,
    ) -> CoreResult<Vec<String>> {
        let entity = self.store.get_entity(&dispute.entity_id)?;
        let validation_duty = can_cite_validation_duty(
            entity.entity_type,
            dispute.has_validation_request,
            dispute.collection_continued,
        );
        let cited = statutes::duty_to_investigate(entity.entity_type, validation_duty);
        let creditor = dispute
            .violation_ids
            .first()
            .map(|id| self.store.get_violation(id))
            .transpose()?
            .map(|v| v.creditor_name)
            .unwrap_or_else(|| entity.canonical_name.clone());

        let violation = Violation::determined(
            ViolationKind::InvestigationFailure,
            cited.clone(),
            Severity::Major,
            &dispute.account_fingerprint,
            &creditor,
            today,
        );
        self.store.insert_violation(&violation)?;

        let record = DisputeResponse {
            response_id: Uuid::new_v4().to_string(),
            dispute_id: dispute.dispute_id.clone(),
            kind: ResponseKind::NoResponse,
            stage,
            response_date: today,
            reported_by: ReportedBy::System,
            evidence_ref: None,
            resulting_violation_ids: vec![violation.violation_id.clone()],
        };
        self.store.insert_response(&record)?;
        Ok(cited)
    }

    // ── Cross-entity pattern detection ─────────────────────────

    /// `today` is the date of the event that prompted the scan: the
    /// response date from logging, the report date from ingestion.
    pub(crate) fn run_pattern_detection(&self, fingerprint: &str, today: NaiveDate) -> CoreResult<usize> {
        let hits = patterns::detect(&self.store, fingerprint, today)?;
        let recorded = hits.len();
        for hit in hits {
            let mut ids = Vec::new();
            let mut cited = Vec::new();
            for violation in &hit.violations {
                self.store.insert_violation(violation)?;
                ids.push(violation.violation_id.clone());
                for statute in &violation.statute_refs {
                    if !cited.contains(statute) {
                        cited.push(statute.clone());
                    }
                }
            }
            self.store
                .insert_pattern_match(fingerprint, hit.kind.as_str(), today, &ids)?;
            log::info!("pattern {} recorded on {}", hit.kind.as_str(), fingerprint);
            for target in &hit.escalation_targets {
                self.transition_if_allowed(target, Trigger::PatternDetected, Actor::System, &cited, today)?;
            }
        }
        Ok(recorded)
    }

    // ── Escalation ─────────────────────────────────────────────

    /// User-driven advance along the enforcement track
    /// (NON_COMPLIANT → … → LITIGATION_READY).
    pub fn advance_escalation(&self, dispute_id: &str) -> CoreResult<EscalationState> {
        self.transition_strict(
            dispute_id,
            Trigger::EscalationAdvanced,
            Actor::User,
            &[],
            self.clock.today(),
        )
    }

    /// Apply a transition or fail with `InvalidTransition`.
    fn transition_strict(
        &self,
        dispute_id: &str,
        trigger: Trigger,
        actor: Actor,
        cited: &[String],
        on: NaiveDate,
    ) -> CoreResult<EscalationState> {
        let dispute = self.store.get_dispute(dispute_id)?;
        match self.transition_if_allowed(dispute_id, trigger, actor, cited, on)? {
            Some(state) => Ok(state),
            None => Err(CoreError::InvalidTransition {
                from: dispute.current_state,
                trigger,
            }),
        }
    }

    /// Apply a transition when the allow-list has an edge for it; skip
    /// otherwise. Component-driven requests use this so a rebuttal on an
    /// already-escalated dispute does not error out the whole evaluation.
    ///
    /// `on` is the causal date of the triggering event, never an ambient
    /// "now": scheduler jobs pass their scan date, response evaluation the
    /// response date, ingestion the report date.
    fn transition_if_allowed(
        &self,
        dispute_id: &str,
        trigger: Trigger,
        actor: Actor,
        cited: &[String],
        on: NaiveDate,
    ) -> CoreResult<Option<EscalationState>> {
        let dispute = self.store.get_dispute(dispute_id)?;
        let from = dispute.current_state;
        let Some(to) = next_state(from, trigger) else {
            return Ok(None);
        };
        // Second line behind the allow-list: one-way states never regress.
        if from.is_one_way() && to.rank() <= from.rank() {
            return Ok(None);
        }
        let entry = EscalationLogEntry {
            id: None,
            dispute_id: dispute_id.to_string(),
            from_state: from,
            to_state: to,
            trigger,
            actor,
            statutes_activated: cited.to_vec(),
            recorded_on: on,
        };
        self.store.apply_transition(&entry, artifacts_for_state(to))?;
        log::debug!(
            "dispute {dispute_id}: {} -> {} on {}",
            from.as_str(),
            to.as_str(),
            trigger.as_str()
        );
        Ok(Some(to))
    }

    // ── Read-only views ────────────────────────────────────────

    /// Current state derived by folding the paper trail. The cached field
    /// on the dispute row is an index; the log is authoritative.
    pub fn current_state(&self, dispute_id: &str) -> CoreResult<EscalationState> {
        self.store.get_dispute(dispute_id)?;
        let entries = self.store.log_for_dispute(dispute_id)?;
        Ok(fold_state(&entries).unwrap_or(EscalationState::Detected))
    }

    pub fn paper_trail(&self, dispute_id: &str) -> CoreResult<Vec<EscalationLogEntry>> {
        self.store.get_dispute(dispute_id)?;
        self.store.log_for_dispute(dispute_id)
    }

    pub fn letter_context(&self, dispute_id: &str) -> CoreResult<LetterContext> {
        let dispute = self.store.get_dispute(dispute_id)?;
        let entries = self.store.log_for_dispute(dispute_id)?;
        let current_state = fold_state(&entries).unwrap_or(EscalationState::Detected);

        let mut violation_ids = dispute.violation_ids.clone();
        for response in self.store.responses_for_dispute(dispute_id)? {
            for id in response.resulting_violation_ids {
                if !violation_ids.contains(&id) {
                    violation_ids.push(id);
                }
            }
        }
        let active_violations = self.store.violations_by_ids(&violation_ids)?;

        let mut statutes_activated = Vec::new();
        for entry in &entries {
            for statute in &entry.statutes_activated {
                if !statutes_activated.contains(statute) {
                    statutes_activated.push(statute.clone());
                }
            }
        }

        Ok(LetterContext {
            dispute,
            current_state,
            active_violations,
            statutes_activated,
        })
    }

    /// "Next available artifacts for current state" lookup. Pure read.
    pub fn available_artifacts(state: EscalationState) -> &'static [&'static str] {
        artifacts_for_state(state)
    }
}
