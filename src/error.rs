use thiserror::Error;

use crate::gateway::GatewayError;
use crate::gateway::types::FailedSegment;
use crate::state_machine::{ItemId, ItemStatus, JobStatus};

pub type Result<T> = std::result::Result<T, SyncError>;

/// Error taxonomy for the synchronization core.
///
/// Local validation errors (`InvalidTransition`, `InvalidJobTransition`,
/// `UnsavedChanges`) carry no side effects. Gateway errors are retryable by
/// the user; the core never retries on its own and never mutates local state
/// before remote confirmation.
#[derive(Debug, Error)]
pub enum SyncError {
    #[error("invalid item transition: {from} -> {to}")]
    InvalidTransition { from: ItemStatus, to: ItemStatus },

    #[error("invalid job transition: {from} -> {to}")]
    InvalidJobTransition { from: JobStatus, to: JobStatus },

    #[error("item {0} has unsaved changes")]
    UnsavedChanges(ItemId),

    #[error("{} segment action(s) failed during save", failed.len())]
    PartialSave { failed: Vec<FailedSegment> },

    #[error("item not found: {0}")]
    ItemNotFound(ItemId),

    #[error("item {0} is not editable in this cycle")]
    ItemNotEditable(ItemId),

    #[error("no job is open in this session")]
    NoJobOpen,

    #[error("no item is active in this session")]
    NoActiveItem,

    #[error("gateway error: {0}")]
    Gateway(#[from] GatewayError),

    #[error("config error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
}
