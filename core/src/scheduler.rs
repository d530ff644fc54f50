//! Scheduler — the daily jobs that run without user interaction.
//!
//! RULES:
//!   - Jobs take `today` as a parameter; there is no ambient "now". The
//!     scan date flows into every record a job creates, paper-trail
//!     entries included.
//!   - Every job is idempotent. The breach and stall converters use the
//!     SYSTEM NO_RESPONSE record as their witness, the cure-lapse
//!     converter the cleared cure_deadline; watch expiry and the
//!     artifact flush are guarded UPDATEs.
//!   - A failure on one record is logged and skipped; the scan continues
//!     to the next record instead of aborting.

use crate::{engine::DisputeEngine, error::CoreResult};
use chrono::NaiveDate;

/// What one job did on one run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct JobSummary {
    pub scanned: usize,
    pub converted: usize,
    pub failed: usize,
}

/// One full daily run across all five jobs.
#[derive(Debug, Clone, Copy, Default)]
pub struct DailySummary {
    pub breaches: JobSummary,
    pub expiries: JobSummary,
    pub stalls: JobSummary,
    pub cure_lapses: JobSummary,
    pub artifacts_flushed: usize,
}

/// Run all five jobs for one day, in causal order: breaches first (they
/// create the NO_RESPONSE witnesses stall conversion checks), then watch
/// expiry, stall conversion, cure lapses, and the artifact flush.
pub fn run_daily(engine: &DisputeEngine, today: NaiveDate) -> CoreResult<DailySummary> {
    let summary = DailySummary {
        breaches: deadline_breach_scan(engine, today),
        expiries: reinsertion_window_scan(engine, today),
        stalls: stall_conversion_scan(engine, today),
        cure_lapses: cure_lapse_scan(engine, today),
        artifacts_flushed: flush_artifacts(engine, today)?,
    };
    log::info!(
        "scheduler run {today}: {} breaches, {} expiries, {} stalls, {} cure lapses, {} artifacts",
        summary.breaches.converted,
        summary.expiries.converted,
        summary.stalls.converted,
        summary.cure_lapses.converted,
        summary.artifacts_flushed
    );
    Ok(summary)
}

/// Job 1: convert deadline breaches into SYSTEM NO_RESPONSE responses.
pub fn deadline_breach_scan(engine: &DisputeEngine, today: NaiveDate) -> JobSummary {
    let mut summary = JobSummary::default();
    let dispute_ids = match engine.store().tracked_dispute_ids() {
        Ok(ids) => ids,
        Err(e) => {
            log::warn!("breach scan could not list disputes: {e}");
            summary.failed += 1;
            return summary;
        }
    };
    for dispute_id in dispute_ids {
        summary.scanned += 1;
        match engine.check_deadline_breach(&dispute_id, today) {
            Ok(true) => summary.converted += 1,
            Ok(false) => {}
            Err(e) => {
                log::warn!("breach scan skipping dispute {dispute_id}: {e}");
                summary.failed += 1;
            }
        }
    }
    summary
}

/// Job 2: expire active watches whose window has passed. Expiry creates
/// no violation; reinsertion detection itself happens at report
/// ingestion, where the fingerprints are.
pub fn reinsertion_window_scan(engine: &DisputeEngine, today: NaiveDate) -> JobSummary {
    let mut summary = JobSummary::default();
    let watches = match engine.store().expired_watch_candidates(today) {
        Ok(w) => w,
        Err(e) => {
            log::warn!("reinsertion scan could not list watches: {e}");
            summary.failed += 1;
            return summary;
        }
    };
    for watch in watches {
        summary.scanned += 1;
        match engine.store().mark_watch_expired(&watch.watch_id) {
            Ok(()) => {
                summary.converted += 1;
                log::debug!("watch {} expired with no reinsertion", watch.watch_id);
            }
            Err(e) => {
                log::warn!("reinsertion scan skipping watch {}: {e}", watch.watch_id);
                summary.failed += 1;
            }
        }
    }
    summary
}

/// Job 3: stall conversion — INVESTIGATING replies whose 15-day interim
/// elapsed become SYSTEM NO_RESPONSE responses.
pub fn stall_conversion_scan(engine: &DisputeEngine, today: NaiveDate) -> JobSummary {
    let mut summary = JobSummary::default();
    let dispute_ids = match engine.store().dispute_ids_with_expired_interim(today) {
        Ok(ids) => ids,
        Err(e) => {
            log::warn!("stall scan could not list disputes: {e}");
            summary.failed += 1;
            return summary;
        }
    };
    for dispute_id in dispute_ids {
        summary.scanned += 1;
        match engine.convert_stalled(&dispute_id, today) {
            Ok(true) => summary.converted += 1,
            Ok(false) => {}
            Err(e) => {
                log::warn!("stall scan skipping dispute {dispute_id}: {e}");
                summary.failed += 1;
            }
        }
    }
    summary
}

/// Job 4: cure-lapse conversion — cure offers whose window elapsed with
/// no curing response confirm the underlying inaccuracy.
pub fn cure_lapse_scan(engine: &DisputeEngine, today: NaiveDate) -> JobSummary {
    let mut summary = JobSummary::default();
    let dispute_ids = match engine.store().dispute_ids_with_lapsed_cure(today) {
        Ok(ids) => ids,
        Err(e) => {
            log::warn!("cure-lapse scan could not list disputes: {e}");
            summary.failed += 1;
            return summary;
        }
    };
    for dispute_id in dispute_ids {
        summary.scanned += 1;
        match engine.convert_lapsed_cure(&dispute_id, today) {
            Ok(true) => summary.converted += 1,
            Ok(false) => {}
            Err(e) => {
                log::warn!("cure-lapse scan skipping dispute {dispute_id}: {e}");
                summary.failed += 1;
            }
        }
    }
    summary
}

/// Job 5: mark queued escalation artifacts ready for the letter renderer.
pub fn flush_artifacts(engine: &DisputeEngine, today: NaiveDate) -> CoreResult<usize> {
    engine.store().flush_queued_artifacts(today)
}
