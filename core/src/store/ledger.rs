use super::{bad_column, read_date, read_json_vec, json_vec, sql_date, CoreStore};
use crate::{
    error::{CoreError, CoreResult},
    escalation::{Actor, EscalationState, Trigger},
    ledger::EscalationLogEntry,
};
use chrono::NaiveDate;
use rusqlite::params;

fn log_row_mapper(row: &rusqlite::Row<'_>) -> rusqlite::Result<EscalationLogEntry> {
    let from_str: String = row.get(2)?;
    let to_str: String = row.get(3)?;
    let trigger_str: String = row.get(4)?;
    let actor_str: String = row.get(5)?;
    let statutes_str: String = row.get(6)?;
    let date_str: String = row.get(7)?;
    Ok(EscalationLogEntry {
        id: Some(row.get(0)?),
        dispute_id: row.get(1)?,
        from_state: EscalationState::from_str(&from_str)
            .ok_or_else(|| bad_column("from_state", &from_str))?,
        to_state: EscalationState::from_str(&to_str)
            .ok_or_else(|| bad_column("to_state", &to_str))?,
        trigger: Trigger::from_str(&trigger_str)
            .ok_or_else(|| bad_column("trigger_kind", &trigger_str))?,
        actor: Actor::from_str(&actor_str).ok_or_else(|| bad_column("actor", &actor_str))?,
        statutes_activated: read_json_vec(&statutes_str)?,
        recorded_on: read_date(&date_str)?,
    })
}

impl CoreStore {
    // ── Escalation log (paper trail) ───────────────────────────

    /// Commit one transition: state-field update, log append, and artifact
    /// enqueue in a single transaction. The `WHERE current_state = from`
    /// guard is the optimistic concurrency check — if another writer moved
    /// the dispute first, nothing commits and the caller gets
    /// `InvalidTransition` to re-read and retry.
    pub fn apply_transition(
        &self,
        entry: &EscalationLogEntry,
        artifact_kinds: &[&str],
    ) -> CoreResult<()> {
        let tx = self.conn().unchecked_transaction()?;

        let changed = tx.execute(
            "UPDATE dispute SET current_state = ?1
             WHERE dispute_id = ?2 AND current_state = ?3",
            params![
                entry.to_state.as_str(),
                &entry.dispute_id,
                entry.from_state.as_str()
            ],
        )?;
        if changed != 1 {
            // tx dropped here rolls back.
            return Err(CoreError::InvalidTransition {
                from: entry.from_state,
                trigger: entry.trigger,
            });
        }

        tx.execute(
            "INSERT INTO escalation_log (
                dispute_id, from_state, to_state, trigger_kind, actor,
                statutes_activated, recorded_on
             ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            params![
                &entry.dispute_id,
                entry.from_state.as_str(),
                entry.to_state.as_str(),
                entry.trigger.as_str(),
                entry.actor.as_str(),
                json_vec(&entry.statutes_activated),
                sql_date(entry.recorded_on),
            ],
        )?;

        for kind in artifact_kinds {
            tx.execute(
                "INSERT INTO artifact_queue (dispute_id, state, artifact_kind, queued_on, status)
                 VALUES (?1, ?2, ?3, ?4, 'queued')",
                params![
                    &entry.dispute_id,
                    entry.to_state.as_str(),
                    kind,
                    sql_date(entry.recorded_on)
                ],
            )?;
        }

        tx.commit()?;
        Ok(())
    }

    pub fn log_for_dispute(&self, dispute_id: &str) -> CoreResult<Vec<EscalationLogEntry>> {
        let mut stmt = self.conn().prepare(
            "SELECT id, dispute_id, from_state, to_state, trigger_kind, actor,
                    statutes_activated, recorded_on
             FROM escalation_log WHERE dispute_id = ?1 ORDER BY id ASC",
        )?;
        let rows = stmt.query_map(params![dispute_id], log_row_mapper)?;
        rows.collect::<Result<Vec<_>, _>>().map_err(Into::into)
    }

    // ── Artifact queue ─────────────────────────────────────────

    pub fn flush_queued_artifacts(&self, _today: NaiveDate) -> CoreResult<usize> {
        let changed = self
            .conn()
            .execute("UPDATE artifact_queue SET status = 'ready' WHERE status = 'queued'", [])?;
        Ok(changed)
    }

    pub fn artifact_kinds_for_dispute(
        &self,
        dispute_id: &str,
        status: &str,
    ) -> CoreResult<Vec<String>> {
        let mut stmt = self.conn().prepare(
            "SELECT artifact_kind FROM artifact_queue
             WHERE dispute_id = ?1 AND status = ?2 ORDER BY id ASC",
        )?;
        let rows = stmt.query_map(params![dispute_id, status], |row| row.get(0))?;
        rows.collect::<Result<Vec<_>, _>>().map_err(Into::into)
    }
}
