use super::{bad_column, read_date, read_date_opt, sql_date, CoreStore};
use crate::{
    error::{CoreError, CoreResult},
    reinsertion::{ReinsertionWatch, WatchStatus},
};
use chrono::NaiveDate;
use rusqlite::{params, OptionalExtension};

fn watch_row_mapper(row: &rusqlite::Row<'_>) -> rusqlite::Result<ReinsertionWatch> {
    let start_str: String = row.get(5)?;
    let end_str: String = row.get(6)?;
    let status_str: String = row.get(7)?;
    Ok(ReinsertionWatch {
        watch_id: row.get(0)?,
        dispute_id: row.get(1)?,
        violation_id: row.get(2)?,
        account_fingerprint: row.get(3)?,
        furnisher_name: row.get(4)?,
        window_start: read_date(&start_str)?,
        window_end: read_date(&end_str)?,
        status: WatchStatus::from_str(&status_str)
            .ok_or_else(|| bad_column("status", &status_str))?,
        notice_date: read_date_opt(row.get(8)?)?,
        reinsertion_date: read_date_opt(row.get(9)?)?,
    })
}

const WATCH_COLUMNS: &str = "watch_id, dispute_id, violation_id, account_fingerprint,
    furnisher_name, window_start, window_end, status, notice_date, reinsertion_date";

impl CoreStore {
    // ── Reinsertion watch ──────────────────────────────────────

    pub fn insert_watch(&self, w: &ReinsertionWatch) -> CoreResult<()> {
        self.conn().execute(
            "INSERT INTO reinsertion_watch (
                watch_id, dispute_id, violation_id, account_fingerprint, furnisher_name,
                window_start, window_end, status, notice_date, reinsertion_date
             ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
            params![
                &w.watch_id,
                &w.dispute_id,
                &w.violation_id,
                &w.account_fingerprint,
                &w.furnisher_name,
                sql_date(w.window_start),
                sql_date(w.window_end),
                w.status.as_str(),
                super::sql_date_opt(w.notice_date),
                super::sql_date_opt(w.reinsertion_date),
            ],
        )?;
        Ok(())
    }

    pub fn get_watch(&self, watch_id: &str) -> CoreResult<ReinsertionWatch> {
        self.conn()
            .query_row(
                &format!("SELECT {WATCH_COLUMNS} FROM reinsertion_watch WHERE watch_id = ?1"),
                params![watch_id],
                watch_row_mapper,
            )
            .optional()?
            .ok_or_else(|| CoreError::WatchNotFound(watch_id.to_string()))
    }

    pub fn active_watches_for_fingerprint(
        &self,
        fingerprint: &str,
    ) -> CoreResult<Vec<ReinsertionWatch>> {
        let mut stmt = self.conn().prepare(&format!(
            "SELECT {WATCH_COLUMNS} FROM reinsertion_watch
             WHERE account_fingerprint = ?1 AND status = 'active'"
        ))?;
        let rows = stmt.query_map(params![fingerprint], watch_row_mapper)?;
        rows.collect::<Result<Vec<_>, _>>().map_err(Into::into)
    }

    pub fn watches_for_fingerprint(&self, fingerprint: &str) -> CoreResult<Vec<ReinsertionWatch>> {
        let mut stmt = self.conn().prepare(&format!(
            "SELECT {WATCH_COLUMNS} FROM reinsertion_watch WHERE account_fingerprint = ?1"
        ))?;
        let rows = stmt.query_map(params![fingerprint], watch_row_mapper)?;
        rows.collect::<Result<Vec<_>, _>>().map_err(Into::into)
    }

    /// Active watches whose window has passed — candidates for expiry.
    pub fn expired_watch_candidates(&self, today: NaiveDate) -> CoreResult<Vec<ReinsertionWatch>> {
        let mut stmt = self.conn().prepare(&format!(
            "SELECT {WATCH_COLUMNS} FROM reinsertion_watch
             WHERE status = 'active' AND window_end < ?1"
        ))?;
        let rows = stmt.query_map(params![sql_date(today)], watch_row_mapper)?;
        rows.collect::<Result<Vec<_>, _>>().map_err(Into::into)
    }

    pub fn mark_reinsertion_detected(
        &self,
        watch_id: &str,
        reinsertion_date: NaiveDate,
    ) -> CoreResult<()> {
        self.conn().execute(
            "UPDATE reinsertion_watch
             SET status = 'reinsertion_detected', reinsertion_date = ?1
             WHERE watch_id = ?2 AND status = 'active'",
            params![sql_date(reinsertion_date), watch_id],
        )?;
        Ok(())
    }

    pub fn mark_notice_received(&self, watch_id: &str, notice_date: NaiveDate) -> CoreResult<()> {
        self.conn().execute(
            "UPDATE reinsertion_watch SET status = 'notice_received', notice_date = ?1
             WHERE watch_id = ?2",
            params![sql_date(notice_date), watch_id],
        )?;
        Ok(())
    }

    pub fn set_notice_date(&self, watch_id: &str, notice_date: NaiveDate) -> CoreResult<()> {
        self.conn().execute(
            "UPDATE reinsertion_watch SET notice_date = ?1 WHERE watch_id = ?2",
            params![sql_date(notice_date), watch_id],
        )?;
        Ok(())
    }

    pub fn mark_watch_expired(&self, watch_id: &str) -> CoreResult<()> {
        self.conn().execute(
            "UPDATE reinsertion_watch SET status = 'expired'
             WHERE watch_id = ?1 AND status = 'active'",
            params![watch_id],
        )?;
        Ok(())
    }
}
