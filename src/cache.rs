//! Durable staging area between remote fetch and remote push.
//!
//! Each item lives under `working_directory/<job_id>/<item_id>/` as two
//! files: `payload.json` (segments and tags) and `state.json` (status and
//! edit flags). A crash between a local write and a save leaves
//! `dirty=true` on disk, so the next session surfaces the unsaved changes
//! instead of silently discarding them.

use std::path::PathBuf;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{Result, SyncError};
use crate::gateway::{ItemPayload, RemoteGateway};
use crate::state_machine::{Item, ItemId, ItemRef, ItemStatus, JobId};

const PAYLOAD_FILE: &str = "payload.json";
const STATE_FILE: &str = "state.json";

/// Sidecar record for one cached item.
#[derive(Debug, Serialize, Deserialize)]
struct ItemState {
    id: ItemId,
    job_id: JobId,
    name: String,
    status: ItemStatus,
    dirty: bool,
    remote_synced_at: Option<DateTime<Utc>>,
}

pub struct LocalCache {
    root: PathBuf,
}

impl LocalCache {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn item_dir(&self, job_id: JobId, item_id: ItemId) -> PathBuf {
        self.root.join(job_id.to_string()).join(item_id.to_string())
    }

    /// Load a cached item, or `None` when nothing was fetched yet.
    pub fn load(&self, job_id: JobId, item_id: ItemId) -> Result<Option<Item>> {
        let dir = self.item_dir(job_id, item_id);
        let state_path = dir.join(STATE_FILE);
        if !state_path.exists() {
            return Ok(None);
        }
        let state: ItemState = serde_json::from_str(&std::fs::read_to_string(state_path)?)?;
        let payload: ItemPayload =
            serde_json::from_str(&std::fs::read_to_string(dir.join(PAYLOAD_FILE))?)?;
        Ok(Some(Item {
            id: state.id,
            job_id: state.job_id,
            name: state.name,
            status: state.status,
            dirty: state.dirty,
            remote_synced_at: state.remote_synced_at,
            segments: payload.segments,
            tags: payload.tags,
        }))
    }

    /// Whether the cached copy carries unsaved edits. Absent items are not
    /// dirty.
    pub fn is_dirty(&self, job_id: JobId, item_id: ItemId) -> Result<bool> {
        Ok(self
            .load(job_id, item_id)?
            .map(|item| item.dirty)
            .unwrap_or(false))
    }

    /// Return the cached copy, downloading only when none exists or the
    /// caller forces a refresh. A forced refresh of a dirty item fails with
    /// `UnsavedChanges` rather than discarding local edits.
    pub async fn fetch_if_absent(
        &self,
        gateway: &impl RemoteGateway,
        job_id: JobId,
        item_ref: &ItemRef,
        force: bool,
    ) -> Result<Item> {
        if let Some(existing) = self.load(job_id, item_ref.id)? {
            if !force {
                return Ok(existing);
            }
            if existing.dirty {
                return Err(SyncError::UnsavedChanges(item_ref.id));
            }
        }

        debug!(job_id, item_id = item_ref.id, "downloading item into cache");
        let payload = gateway.download_item(item_ref.id).await?;
        let item = Item {
            id: item_ref.id,
            job_id,
            name: item_ref.name.clone(),
            status: item_ref.status,
            dirty: false,
            remote_synced_at: Some(Utc::now()),
            segments: payload.segments,
            tags: payload.tags,
        };
        self.persist(&item)?;
        Ok(item)
    }

    /// Commit a local edit: the item is flagged dirty and both files are
    /// rewritten.
    pub fn write_local(&self, item: &mut Item) -> Result<()> {
        item.dirty = true;
        self.persist(item)
    }

    /// Record a successful push: clears the dirty flag and stamps the sync
    /// time.
    pub fn mark_synced(&self, item: &mut Item) -> Result<()> {
        item.dirty = false;
        item.remote_synced_at = Some(Utc::now());
        self.persist(item)
    }

    /// Rewrite both cache files for an item.
    pub fn persist(&self, item: &Item) -> Result<()> {
        let dir = self.item_dir(item.job_id, item.id);
        std::fs::create_dir_all(&dir)?;
        let payload = ItemPayload {
            segments: item.segments.clone(),
            tags: item.tags.clone(),
        };
        std::fs::write(
            dir.join(PAYLOAD_FILE),
            serde_json::to_string_pretty(&payload)?,
        )?;
        let state = ItemState {
            id: item.id,
            job_id: item.job_id,
            name: item.name.clone(),
            status: item.status,
            dirty: item.dirty,
            remote_synced_at: item.remote_synced_at,
        };
        std::fs::write(dir.join(STATE_FILE), serde_json::to_string_pretty(&state)?)?;
        Ok(())
    }

    /// Drop the local copy of one item. Used when a restart reopens it.
    pub fn clear(&self, job_id: JobId, item_id: ItemId) -> Result<()> {
        let dir = self.item_dir(job_id, item_id);
        if dir.exists() {
            std::fs::remove_dir_all(dir)?;
        }
        Ok(())
    }
}
