use super::{read_date, read_date_opt, sql_date, CoreStore};
use crate::{
    error::CoreResult,
    report::ReportedAccount,
    types::{EntityId, Fingerprint},
};
use chrono::NaiveDate;
use rusqlite::params;

/// One bureau's view of an account, as ingested.
#[derive(Debug, Clone)]
pub struct ReportAccountRow {
    pub report_date: NaiveDate,
    pub bureau_entity_id: EntityId,
    pub bureau_name: String,
    pub account_fingerprint: Fingerprint,
    pub status_code: Option<String>,
    pub reported_date: Option<NaiveDate>,
}

impl CoreStore {
    // ── Ingested report accounts ───────────────────────────────

    pub fn insert_report_account(
        &self,
        report_date: NaiveDate,
        bureau_entity_id: &str,
        account: &ReportedAccount,
    ) -> CoreResult<()> {
        self.conn().execute(
            "INSERT INTO report_account (
                report_date, bureau_entity_id, account_fingerprint,
                creditor_name, status_code, reported_date
             ) VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                sql_date(report_date),
                bureau_entity_id,
                &account.account_fingerprint,
                &account.creditor_name,
                account.status_code.as_deref(),
                super::sql_date_opt(account.reported_date),
            ],
        )?;
        Ok(())
    }

    /// The latest row per bureau for a fingerprint, for field-variance
    /// comparison.
    pub fn report_rows_for_fingerprint(
        &self,
        fingerprint: &str,
    ) -> CoreResult<Vec<ReportAccountRow>> {
        let mut stmt = self.conn().prepare(
            "SELECT r.report_date, r.bureau_entity_id, e.canonical_name,
                    r.account_fingerprint, r.status_code, r.reported_date
             FROM report_account r
             JOIN entity e ON e.entity_id = r.bureau_entity_id
             WHERE r.account_fingerprint = ?1
               AND r.report_date = (
                   SELECT MAX(r2.report_date) FROM report_account r2
                   WHERE r2.account_fingerprint = r.account_fingerprint
                     AND r2.bureau_entity_id = r.bureau_entity_id
               )",
        )?;
        let rows = stmt.query_map(params![fingerprint], |row| {
            let report_str: String = row.get(0)?;
            Ok(ReportAccountRow {
                report_date: read_date(&report_str)?,
                bureau_entity_id: row.get(1)?,
                bureau_name: row.get(2)?,
                account_fingerprint: row.get(3)?,
                status_code: row.get(4)?,
                reported_date: read_date_opt(row.get(5)?)?,
            })
        })?;
        rows.collect::<Result<Vec<_>, _>>().map_err(Into::into)
    }
}
