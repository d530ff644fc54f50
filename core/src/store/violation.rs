use super::{bad_column, read_date, read_json_vec, json_vec, sql_date, CoreStore};
use crate::{
    error::{CoreError, CoreResult},
    violation::{DetectedBy, Severity, Violation, ViolationKind},
};
use rusqlite::{params, OptionalExtension};

fn violation_row_mapper(row: &rusqlite::Row<'_>) -> rusqlite::Result<Violation> {
    let kind_str: String = row.get(1)?;
    let statutes_str: String = row.get(2)?;
    let severity_str: String = row.get(3)?;
    let detected_str: String = row.get(10)?;
    let created_str: String = row.get(11)?;
    Ok(Violation {
        violation_id: row.get(0)?,
        kind: ViolationKind::from_str(&kind_str).ok_or_else(|| bad_column("kind", &kind_str))?,
        statute_refs: read_json_vec(&statutes_str)?,
        severity: Severity::from_str(&severity_str)
            .ok_or_else(|| bad_column("severity", &severity_str))?,
        account_fingerprint: row.get(4)?,
        creditor_name: row.get(5)?,
        masked_account_number: row.get(6)?,
        evidence: row.get(7)?,
        evidence_proves_inaccuracy: row.get::<_, i32>(8)? != 0,
        willful_indicator: row.get::<_, i32>(9)? != 0,
        detected_by: DetectedBy::from_str(&detected_str)
            .ok_or_else(|| bad_column("detected_by", &detected_str))?,
        created_date: read_date(&created_str)?,
    })
}

const VIOLATION_COLUMNS: &str = "violation_id, kind, statute_refs, severity, account_fingerprint,
    creditor_name, masked_account_number, evidence, evidence_proves_inaccuracy,
    willful_indicator, detected_by, created_date";

impl CoreStore {
    // ── Violation ──────────────────────────────────────────────

    pub fn insert_violation(&self, v: &Violation) -> CoreResult<()> {
        self.conn().execute(
            "INSERT INTO violation (
                violation_id, kind, statute_refs, severity, account_fingerprint,
                creditor_name, masked_account_number, evidence, evidence_proves_inaccuracy,
                willful_indicator, detected_by, created_date
             ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)",
            params![
                &v.violation_id,
                v.kind.as_str(),
                json_vec(&v.statute_refs),
                v.severity.as_str(),
                &v.account_fingerprint,
                &v.creditor_name,
                v.masked_account_number.as_deref(),
                v.evidence.as_deref(),
                i32::from(v.evidence_proves_inaccuracy),
                i32::from(v.willful_indicator),
                v.detected_by.as_str(),
                sql_date(v.created_date),
            ],
        )?;
        Ok(())
    }

    pub fn get_violation(&self, violation_id: &str) -> CoreResult<Violation> {
        self.conn()
            .query_row(
                &format!("SELECT {VIOLATION_COLUMNS} FROM violation WHERE violation_id = ?1"),
                params![violation_id],
                violation_row_mapper,
            )
            .optional()?
            .ok_or_else(|| CoreError::ViolationNotFound(violation_id.to_string()))
    }

    pub fn violations_by_ids(&self, ids: &[String]) -> CoreResult<Vec<Violation>> {
        ids.iter().map(|id| self.get_violation(id)).collect()
    }

    pub fn violations_for_fingerprint(&self, fingerprint: &str) -> CoreResult<Vec<Violation>> {
        let mut stmt = self.conn().prepare(&format!(
            "SELECT {VIOLATION_COLUMNS} FROM violation
             WHERE account_fingerprint = ?1 ORDER BY created_date ASC"
        ))?;
        let rows = stmt.query_map(params![fingerprint], violation_row_mapper)?;
        rows.collect::<Result<Vec<_>, _>>().map_err(Into::into)
    }

    /// Best-known creditor name for a fingerprint, for violations built
    /// by cross-entity detection.
    pub fn creditor_for_fingerprint(&self, fingerprint: &str) -> CoreResult<Option<String>> {
        if let Some(name) = self
            .conn()
            .query_row(
                "SELECT creditor_name FROM violation
                 WHERE account_fingerprint = ?1 ORDER BY created_date ASC LIMIT 1",
                params![fingerprint],
                |row| row.get::<_, String>(0),
            )
            .optional()?
        {
            return Ok(Some(name));
        }
        self.conn()
            .query_row(
                "SELECT creditor_name FROM report_account
                 WHERE account_fingerprint = ?1 LIMIT 1",
                params![fingerprint],
                |row| row.get::<_, String>(0),
            )
            .optional()
            .map_err(Into::into)
    }

    pub fn count_violations_of_kind(&self, kind: ViolationKind) -> CoreResult<i64> {
        self.conn()
            .query_row(
                "SELECT COUNT(*) FROM violation WHERE kind = ?1",
                params![kind.as_str()],
                |row| row.get(0),
            )
            .map_err(Into::into)
    }
}
