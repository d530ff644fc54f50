use super::{bad_column, read_date, read_json_vec, json_vec, sql_date, CoreStore};
use crate::{
    entity::EntityType,
    error::CoreResult,
    response::{DisputeResponse, ReportedBy, ResponseKind, ResponseStage},
    types::{DisputeId, EntityId},
};
use chrono::NaiveDate;
use rusqlite::params;

fn response_row_mapper(row: &rusqlite::Row<'_>) -> rusqlite::Result<DisputeResponse> {
    let kind_str: String = row.get(2)?;
    let stage_str: String = row.get(3)?;
    let date_str: String = row.get(4)?;
    let by_str: String = row.get(5)?;
    let resulting_str: String = row.get(7)?;
    Ok(DisputeResponse {
        response_id: row.get(0)?,
        dispute_id: row.get(1)?,
        kind: ResponseKind::from_str(&kind_str).ok_or_else(|| bad_column("kind", &kind_str))?,
        stage: ResponseStage::from_str(&stage_str)
            .ok_or_else(|| bad_column("stage", &stage_str))?,
        response_date: read_date(&date_str)?,
        reported_by: ReportedBy::from_str(&by_str)
            .ok_or_else(|| bad_column("reported_by", &by_str))?,
        evidence_ref: row.get(6)?,
        resulting_violation_ids: read_json_vec(&resulting_str)?,
    })
}

const RESPONSE_COLUMNS: &str = "response_id, dispute_id, kind, stage, response_date,
    reported_by, evidence_ref, resulting_violation_ids";

/// A response joined with its dispute's entity, for cross-entity
/// pattern detection on one fingerprint.
#[derive(Debug, Clone)]
pub struct FingerprintResponseRow {
    pub dispute_id: DisputeId,
    pub entity_id: EntityId,
    pub entity_name: String,
    pub entity_type: EntityType,
    pub kind: ResponseKind,
    pub response_date: NaiveDate,
}

impl CoreStore {
    // ── Dispute responses ──────────────────────────────────────

    pub fn insert_response(&self, r: &DisputeResponse) -> CoreResult<()> {
        self.conn().execute(
            "INSERT INTO dispute_response (
                response_id, dispute_id, kind, stage, response_date,
                reported_by, evidence_ref, resulting_violation_ids
             ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
            params![
                &r.response_id,
                &r.dispute_id,
                r.kind.as_str(),
                r.stage.as_str(),
                sql_date(r.response_date),
                r.reported_by.as_str(),
                r.evidence_ref.as_deref(),
                json_vec(&r.resulting_violation_ids),
            ],
        )?;
        Ok(())
    }

    pub fn responses_for_dispute(&self, dispute_id: &str) -> CoreResult<Vec<DisputeResponse>> {
        let mut stmt = self.conn().prepare(&format!(
            "SELECT {RESPONSE_COLUMNS} FROM dispute_response
             WHERE dispute_id = ?1 ORDER BY response_date ASC, response_id ASC"
        ))?;
        let rows = stmt.query_map(params![dispute_id], response_row_mapper)?;
        rows.collect::<Result<Vec<_>, _>>().map_err(Into::into)
    }

    pub fn has_response(&self, dispute_id: &str) -> CoreResult<bool> {
        let count: i64 = self.conn().query_row(
            "SELECT COUNT(*) FROM dispute_response WHERE dispute_id = ?1",
            params![dispute_id],
            |row| row.get(0),
        )?;
        Ok(count > 0)
    }

    /// Idempotency witness for breach and stall conversion: at most one
    /// NO_RESPONSE record per dispute.
    pub fn has_no_response_record(&self, dispute_id: &str) -> CoreResult<bool> {
        let count: i64 = self.conn().query_row(
            "SELECT COUNT(*) FROM dispute_response
             WHERE dispute_id = ?1 AND kind = 'no_response'",
            params![dispute_id],
            |row| row.get(0),
        )?;
        Ok(count > 0)
    }

    /// A stage is resolved by its first non-INVESTIGATING response.
    pub fn stage_resolved(&self, dispute_id: &str, stage: ResponseStage) -> CoreResult<bool> {
        let count: i64 = self.conn().query_row(
            "SELECT COUNT(*) FROM dispute_response
             WHERE dispute_id = ?1 AND stage = ?2 AND kind != 'investigating'",
            params![dispute_id, stage.as_str()],
            |row| row.get(0),
        )?;
        Ok(count > 0)
    }

    /// Responses across every entity touching a fingerprint.
    pub fn responses_for_fingerprint(
        &self,
        fingerprint: &str,
    ) -> CoreResult<Vec<FingerprintResponseRow>> {
        let mut stmt = self.conn().prepare(
            "SELECT d.dispute_id, e.entity_id, e.canonical_name, e.entity_type,
                    r.kind, r.response_date
             FROM dispute_response r
             JOIN dispute d ON d.dispute_id = r.dispute_id
             JOIN entity e  ON e.entity_id = d.entity_id
             WHERE d.account_fingerprint = ?1
             ORDER BY r.response_date ASC",
        )?;
        let rows = stmt.query_map(params![fingerprint], |row| {
            let type_str: String = row.get(3)?;
            let kind_str: String = row.get(4)?;
            let date_str: String = row.get(5)?;
            Ok(FingerprintResponseRow {
                dispute_id: row.get(0)?,
                entity_id: row.get(1)?,
                entity_name: row.get(2)?,
                entity_type: EntityType::from_str(&type_str)
                    .ok_or_else(|| bad_column("entity_type", &type_str))?,
                kind: ResponseKind::from_str(&kind_str)
                    .ok_or_else(|| bad_column("kind", &kind_str))?,
                response_date: read_date(&date_str)?,
            })
        })?;
        rows.collect::<Result<Vec<_>, _>>().map_err(Into::into)
    }
}
