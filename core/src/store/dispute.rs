use super::{bad_column, read_date_opt, read_json_vec, json_vec, sql_date, CoreStore};
use crate::{
    dispute::{Dispute, DisputeSource},
    error::{CoreError, CoreResult},
    escalation::EscalationState,
    types::DisputeId,
};
use chrono::NaiveDate;
use rusqlite::{params, OptionalExtension};

fn dispute_row_mapper(row: &rusqlite::Row<'_>) -> rusqlite::Result<Dispute> {
    let violation_ids_str: String = row.get(2)?;
    let source_str: String = row.get(4)?;
    let state_str: String = row.get(10)?;
    Ok(Dispute {
        dispute_id: row.get(0)?,
        entity_id: row.get(1)?,
        violation_ids: read_json_vec(&violation_ids_str)?,
        account_fingerprint: row.get(3)?,
        source: DisputeSource::from_str(&source_str)
            .ok_or_else(|| bad_column("source", &source_str))?,
        dispute_date: read_date_opt(row.get(5)?)?,
        deadline_date: read_date_opt(row.get(6)?)?,
        deadline_extended: row.get::<_, i32>(7)? != 0,
        interim_deadline: read_date_opt(row.get(8)?)?,
        cure_deadline: read_date_opt(row.get(9)?)?,
        current_state: EscalationState::from_str(&state_str)
            .ok_or_else(|| bad_column("current_state", &state_str))?,
        has_validation_request: row.get::<_, i32>(11)? != 0,
        collection_continued: row.get::<_, i32>(12)? != 0,
    })
}

const DISPUTE_COLUMNS: &str = "dispute_id, entity_id, violation_ids, account_fingerprint, source,
    dispute_date, deadline_date, deadline_extended, interim_deadline, cure_deadline,
    current_state, has_validation_request, collection_continued";

impl CoreStore {
    // ── Dispute ────────────────────────────────────────────────

    pub fn insert_dispute(&self, d: &Dispute) -> CoreResult<()> {
        self.conn().execute(
            "INSERT INTO dispute (
                dispute_id, entity_id, violation_ids, account_fingerprint, source,
                dispute_date, deadline_date, deadline_extended, interim_deadline,
                cure_deadline, current_state, has_validation_request, collection_continued
             ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13)",
            params![
                &d.dispute_id,
                &d.entity_id,
                json_vec(&d.violation_ids),
                &d.account_fingerprint,
                d.source.as_str(),
                super::sql_date_opt(d.dispute_date),
                super::sql_date_opt(d.deadline_date),
                i32::from(d.deadline_extended),
                super::sql_date_opt(d.interim_deadline),
                super::sql_date_opt(d.cure_deadline),
                d.current_state.as_str(),
                i32::from(d.has_validation_request),
                i32::from(d.collection_continued),
            ],
        )?;
        Ok(())
    }

    pub fn get_dispute(&self, dispute_id: &str) -> CoreResult<Dispute> {
        self.conn()
            .query_row(
                &format!("SELECT {DISPUTE_COLUMNS} FROM dispute WHERE dispute_id = ?1"),
                params![dispute_id],
                dispute_row_mapper,
            )
            .optional()?
            .ok_or_else(|| CoreError::DisputeNotFound(dispute_id.to_string()))
    }

    /// Set dispute_date + deadline_date. The engine enforces the
    /// set-exactly-once rule before calling this.
    pub fn set_mailing(
        &self,
        dispute_id: &str,
        dispute_date: NaiveDate,
        deadline_date: NaiveDate,
    ) -> CoreResult<()> {
        self.conn().execute(
            "UPDATE dispute SET dispute_date = ?1, deadline_date = ?2
             WHERE dispute_id = ?3 AND dispute_date IS NULL",
            params![sql_date(dispute_date), sql_date(deadline_date), dispute_id],
        )?;
        Ok(())
    }

    /// The single additional-information reset.
    pub fn set_deadline_reset(&self, dispute_id: &str, new_deadline: NaiveDate) -> CoreResult<()> {
        self.conn().execute(
            "UPDATE dispute SET deadline_date = ?1, deadline_extended = 1
             WHERE dispute_id = ?2 AND deadline_extended = 0",
            params![sql_date(new_deadline), dispute_id],
        )?;
        Ok(())
    }

    pub fn set_interim_deadline(
        &self,
        dispute_id: &str,
        interim: Option<NaiveDate>,
    ) -> CoreResult<()> {
        self.conn().execute(
            "UPDATE dispute SET interim_deadline = ?1 WHERE dispute_id = ?2",
            params![super::sql_date_opt(interim), dispute_id],
        )?;
        Ok(())
    }

    pub fn set_cure_deadline(&self, dispute_id: &str, cure: Option<NaiveDate>) -> CoreResult<()> {
        self.conn().execute(
            "UPDATE dispute SET cure_deadline = ?1 WHERE dispute_id = ?2",
            params![super::sql_date_opt(cure), dispute_id],
        )?;
        Ok(())
    }

    /// Guardrail facts are one-way: once recorded they stay recorded.
    pub fn record_validation_activity(
        &self,
        dispute_id: &str,
        has_validation_request: bool,
        collection_continued: bool,
    ) -> CoreResult<()> {
        self.conn().execute(
            "UPDATE dispute SET
                has_validation_request = MAX(has_validation_request, ?1),
                collection_continued   = MAX(collection_continued, ?2)
             WHERE dispute_id = ?3",
            params![
                i32::from(has_validation_request),
                i32::from(collection_continued),
                dispute_id
            ],
        )?;
        Ok(())
    }

    /// Disputes whose tracking has started (mailing confirmed).
    pub fn tracked_dispute_ids(&self) -> CoreResult<Vec<DisputeId>> {
        let mut stmt = self.conn().prepare(
            "SELECT dispute_id FROM dispute WHERE dispute_date IS NOT NULL
             ORDER BY dispute_date ASC",
        )?;
        let rows = stmt.query_map([], |row| row.get(0))?;
        rows.collect::<Result<Vec<_>, _>>().map_err(Into::into)
    }

    pub fn dispute_ids_with_expired_interim(&self, today: NaiveDate) -> CoreResult<Vec<DisputeId>> {
        let mut stmt = self.conn().prepare(
            "SELECT dispute_id FROM dispute
             WHERE interim_deadline IS NOT NULL AND interim_deadline < ?1",
        )?;
        let rows = stmt.query_map(params![sql_date(today)], |row| row.get(0))?;
        rows.collect::<Result<Vec<_>, _>>().map_err(Into::into)
    }

    pub fn dispute_ids_with_lapsed_cure(&self, today: NaiveDate) -> CoreResult<Vec<DisputeId>> {
        let mut stmt = self.conn().prepare(
            "SELECT dispute_id FROM dispute
             WHERE cure_deadline IS NOT NULL AND cure_deadline < ?1",
        )?;
        let rows = stmt.query_map(params![sql_date(today)], |row| row.get(0))?;
        rows.collect::<Result<Vec<_>, _>>().map_err(Into::into)
    }

    pub fn dispute_ids_for_fingerprint(&self, fingerprint: &str) -> CoreResult<Vec<DisputeId>> {
        let mut stmt = self
            .conn()
            .prepare("SELECT dispute_id FROM dispute WHERE account_fingerprint = ?1")?;
        let rows = stmt.query_map(params![fingerprint], |row| row.get(0))?;
        rows.collect::<Result<Vec<_>, _>>().map_err(Into::into)
    }
}
