use super::{json_vec, sql_date, CoreStore};
use crate::error::CoreResult;
use chrono::NaiveDate;
use rusqlite::params;

impl CoreStore {
    // ── Cross-entity pattern matches ───────────────────────────

    /// Pattern kinds already logged for a fingerprint. Detection skips
    /// these: a pattern already logged is never re-logged.
    pub fn pattern_kinds_for_fingerprint(&self, fingerprint: &str) -> CoreResult<Vec<String>> {
        let mut stmt = self.conn().prepare(
            "SELECT pattern_kind FROM pattern_match WHERE account_fingerprint = ?1",
        )?;
        let rows = stmt.query_map(params![fingerprint], |row| row.get(0))?;
        rows.collect::<Result<Vec<_>, _>>().map_err(Into::into)
    }

    pub fn insert_pattern_match(
        &self,
        fingerprint: &str,
        pattern_kind: &str,
        detected_on: NaiveDate,
        violation_ids: &[String],
    ) -> CoreResult<()> {
        self.conn().execute(
            "INSERT OR IGNORE INTO pattern_match
                (account_fingerprint, pattern_kind, detected_on, violation_ids)
             VALUES (?1, ?2, ?3, ?4)",
            params![
                fingerprint,
                pattern_kind,
                sql_date(detected_on),
                json_vec(violation_ids)
            ],
        )?;
        Ok(())
    }

    pub fn count_pattern_matches(&self, fingerprint: &str) -> CoreResult<i64> {
        self.conn()
            .query_row(
                "SELECT COUNT(*) FROM pattern_match WHERE account_fingerprint = ?1",
                params![fingerprint],
                |row| row.get(0),
            )
            .map_err(Into::into)
    }
}
