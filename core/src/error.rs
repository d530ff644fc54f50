use crate::escalation::{EscalationState, Trigger};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum CoreError {
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Invalid transition: {trigger:?} is not allowed from {from:?}")]
    InvalidTransition {
        from: EscalationState,
        trigger: Trigger,
    },

    #[error("Conflicting response: dispute {dispute_id} already resolved stage '{stage}'")]
    ConflictingResponse { dispute_id: String, stage: String },

    #[error("Immutable field '{field}' already set on dispute {dispute_id}")]
    ImmutableField {
        dispute_id: String,
        field: &'static str,
    },

    #[error("Dispute '{0}' not found")]
    DisputeNotFound(String),

    #[error("Entity '{0}' not found")]
    EntityNotFound(String),

    #[error("Violation '{0}' not found")]
    ViolationNotFound(String),

    #[error("Reinsertion watch '{0}' not found")]
    WatchNotFound(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

pub type CoreResult<T> = Result<T, CoreError>;
