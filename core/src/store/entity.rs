use super::{bad_column, CoreStore};
use crate::{
    entity::{Entity, EntityType},
    error::{CoreError, CoreResult},
};
use rusqlite::{params, OptionalExtension};
use uuid::Uuid;

fn entity_row_mapper(row: &rusqlite::Row<'_>) -> rusqlite::Result<Entity> {
    let type_str: String = row.get(2)?;
    Ok(Entity {
        entity_id: row.get(0)?,
        canonical_name: row.get(1)?,
        entity_type: EntityType::from_str(&type_str)
            .ok_or_else(|| bad_column("entity_type", &type_str))?,
    })
}

impl CoreStore {
    // ── Entity registry ────────────────────────────────────────

    /// Lookup-or-insert by the canonical (name, type) join key.
    /// Entities are immutable once canonicalized.
    pub fn upsert_entity(&self, canonical_name: &str, entity_type: EntityType) -> CoreResult<Entity> {
        if let Some(existing) = self
            .conn()
            .query_row(
                "SELECT entity_id, canonical_name, entity_type FROM entity
                 WHERE canonical_name = ?1 AND entity_type = ?2",
                params![canonical_name, entity_type.as_str()],
                entity_row_mapper,
            )
            .optional()?
        {
            return Ok(existing);
        }

        let entity = Entity {
            entity_id: Uuid::new_v4().to_string(),
            canonical_name: canonical_name.to_string(),
            entity_type,
        };
        self.conn().execute(
            "INSERT INTO entity (entity_id, canonical_name, entity_type) VALUES (?1, ?2, ?3)",
            params![
                &entity.entity_id,
                &entity.canonical_name,
                entity.entity_type.as_str()
            ],
        )?;
        Ok(entity)
    }

    pub fn get_entity(&self, entity_id: &str) -> CoreResult<Entity> {
        self.conn()
            .query_row(
                "SELECT entity_id, canonical_name, entity_type FROM entity WHERE entity_id = ?1",
                params![entity_id],
                entity_row_mapper,
            )
            .optional()?
            .ok_or_else(|| CoreError::EntityNotFound(entity_id.to_string()))
    }
}
