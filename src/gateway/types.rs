//! Wire types for the annotation delta protocol.
//!
//! A save pushes a sequence of per-segment actions; the server answers with
//! the subset that failed plus the object ids it assigned to newly created
//! segments. All types serialize as JSON in the platform's snake_case form.

use serde::{Deserialize, Serialize};

use crate::state_machine::SegmentId;

/// One staged action against a remote segment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum SegmentAction {
    /// Create or update a segment's geometry and label.
    Upsert {
        segment_id: SegmentId,
        label: String,
        geometry: Vec<u8>,
    },
    /// Remove a segment from the remote store.
    Delete { segment_id: SegmentId },
}

impl SegmentAction {
    pub fn segment_id(&self) -> SegmentId {
        match self {
            SegmentAction::Upsert { segment_id, .. } | SegmentAction::Delete { segment_id } => {
                *segment_id
            }
        }
    }

    pub fn is_delete(&self) -> bool {
        matches!(self, SegmentAction::Delete { .. })
    }
}

/// A segment action the server could not apply.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FailedSegment {
    pub segment_id: SegmentId,
    pub error: String,
}

/// Remote object id assigned to a freshly created segment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreatedObject {
    pub segment_id: SegmentId,
    pub object_id: u64,
}

/// Server response to an uploaded delta.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DeltaOutcome {
    #[serde(default)]
    pub failed: Vec<FailedSegment>,
    #[serde(default)]
    pub created: Vec<CreatedObject>,
}

impl DeltaOutcome {
    pub fn is_full_success(&self) -> bool {
        self.failed.is_empty()
    }
}

/// Raw payload for one item as served by the platform: the segmentation set
/// plus tags. Item identity and status travel separately on the job.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ItemPayload {
    pub segments: Vec<crate::state_machine::Segment>,
    #[serde(default)]
    pub tags: Vec<crate::state_machine::Tag>,
}
