use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{Result, SyncError};

pub type JobId = u64;
pub type ItemId = u64;
pub type TeamId = u64;
pub type UserId = u64;
pub type SegmentId = Uuid;

/// Who is driving the current session. The transition table differs per role.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Annotator,
    Reviewer,
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Role::Annotator => write!(f, "annotator"),
            Role::Reviewer => write!(f, "reviewer"),
        }
    }
}

/// Per-item (volume) work status. The annotator side walks
/// `None → InProgress → Done`; a reviewer overlays `Accepted`/`Rejected`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ItemStatus {
    None,
    InProgress,
    Done,
    Accepted,
    Rejected,
}

impl fmt::Display for ItemStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ItemStatus::None => write!(f, "none"),
            ItemStatus::InProgress => write!(f, "in_progress"),
            ItemStatus::Done => write!(f, "done"),
            ItemStatus::Accepted => write!(f, "accepted"),
            ItemStatus::Rejected => write!(f, "rejected"),
        }
    }
}

/// Validity table for item status transitions.
///
/// An annotator may only advance `None → InProgress → Done`. A reviewer may
/// set `Accepted` or `Rejected` from any status. Everything else is invalid.
pub fn can_transition(from: ItemStatus, to: ItemStatus, role: Role) -> bool {
    match role {
        Role::Annotator => matches!(
            (from, to),
            (ItemStatus::None, ItemStatus::InProgress) | (ItemStatus::InProgress, ItemStatus::Done)
        ),
        Role::Reviewer => matches!(to, ItemStatus::Accepted | ItemStatus::Rejected),
    }
}

/// Marker the viewer keeps per segment. `Completed` is the viewer's "done".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SegmentStatus {
    None,
    InProgress,
    Completed,
    Accepted,
    Rejected,
}

/// One annotated object within an item's segmentation.
///
/// `geometry` is an opaque blob owned by the viewer collaborator; this core
/// only snapshots and ships it. `object_id` is the remote object id once the
/// segment exists on the server; a fresh local segment carries `None` until
/// its first successful upsert.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Segment {
    pub id: SegmentId,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    pub status: SegmentStatus,
    #[serde(default)]
    pub deleted: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub object_id: Option<u64>,
    pub geometry: Vec<u8>,
}

impl Segment {
    pub fn new(name: impl Into<String>, geometry: Vec<u8>) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            label: None,
            status: SegmentStatus::None,
            deleted: false,
            object_id: None,
            geometry,
        }
    }
}

/// A tag attached to an item. Values are platform-typed (string, number,
/// one-of) and kept as raw JSON here.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Tag {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<serde_json::Value>,
}

/// One unit of work (a volume) within a job, together with its local edit
/// state. `dirty` means local edits exist since the last successful push.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Item {
    pub id: ItemId,
    pub job_id: JobId,
    pub name: String,
    pub status: ItemStatus,
    pub dirty: bool,
    pub remote_synced_at: Option<DateTime<Utc>>,
    pub segments: Vec<Segment>,
    pub tags: Vec<Tag>,
}

impl Item {
    /// Apply a status transition after validating it against the table.
    /// An invalid transition fails with `InvalidTransition` and leaves the
    /// item untouched.
    pub fn set_status(&mut self, to: ItemStatus, role: Role) -> Result<()> {
        if !can_transition(self.status, to, role) {
            return Err(SyncError::InvalidTransition {
                from: self.status,
                to,
            });
        }
        self.status = to;
        Ok(())
    }
}
