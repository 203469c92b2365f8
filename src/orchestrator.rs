//! Top-level session coordinator.
//!
//! UI-originated events arrive as [`SessionEvent`] values and are applied
//! sequentially; the surrounding UI serializes user actions, so no method
//! here is ever invoked concurrently. Exactly one job and one active item
//! are mutated at a time. Remote confirmation always precedes local commit:
//! `dirty` is cleared and statuses advance only after the platform accepted
//! the corresponding call.

use tracing::{info, warn};

use crate::cache::LocalCache;
use crate::config::Settings;
use crate::error::{Result, SyncError};
use crate::gateway::{ItemPayload, RemoteGateway};
use crate::save_filter;
use crate::session::SessionContext;
use crate::state_machine::{
    Item, ItemId, ItemStatus, Job, JobId, JobStateMachine, JobStatus, Role, can_transition,
};

/// One user action, decoupled from any widget toolkit.
#[derive(Debug, Clone, PartialEq)]
pub enum SessionEvent {
    /// The user switched the viewer to another item.
    ItemSelected { item_id: ItemId },
    /// The viewer handed back an edited payload for the active item.
    ItemEdited { payload: ItemPayload },
    /// The annotator marked the active item as done.
    MarkDone,
    /// Explicit save of the active item.
    Save,
    /// Hand the job to review. `confirmed` acknowledges losing no unsaved
    /// work is impossible and submits anyway.
    SubmitForReview { confirmed: bool },
    /// Reviewer verdict on a single item.
    ReviewItem { item_id: ItemId, verdict: ItemStatus },
    /// Reviewer accepts the whole job.
    Accept,
    /// Reviewer rejects the whole job.
    Reject,
    /// Reopen a rejected job for another cycle.
    Restart,
    /// Close out an accepted job.
    Complete,
}

pub struct SyncOrchestrator<G: RemoteGateway> {
    gateway: G,
    cache: LocalCache,
    settings: Settings,
    session: SessionContext,
    machine: Option<JobStateMachine>,
    active_item: Option<Item>,
}

impl<G: RemoteGateway> SyncOrchestrator<G> {
    pub fn new(gateway: G, cache: LocalCache, settings: Settings, session: SessionContext) -> Self {
        Self {
            gateway,
            cache,
            settings,
            session,
            machine: None,
            active_item: None,
        }
    }

    pub fn job(&self) -> Option<&Job> {
        self.machine.as_ref().map(JobStateMachine::job)
    }

    pub fn active_item(&self) -> Option<&Item> {
        self.active_item.as_ref()
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// Gate for every mutating path: accepted items are excluded from the
    /// current cycle, and a terminal job stops local mutation entirely.
    fn assert_active_editable(&self) -> Result<()> {
        let item = self.active_item.as_ref().ok_or(SyncError::NoActiveItem)?;
        if item.status == ItemStatus::Accepted {
            return Err(SyncError::ItemNotEditable(item.id));
        }
        if let Some(machine) = self.machine.as_ref()
            && machine.job().status.is_terminal()
        {
            return Err(SyncError::ItemNotEditable(item.id));
        }
        Ok(())
    }

    /// Apply one user action.
    pub async fn handle(&mut self, event: SessionEvent) -> Result<()> {
        match event {
            SessionEvent::ItemSelected { item_id } => self.on_item_selected(item_id).await,
            SessionEvent::ItemEdited { payload } => self.on_item_edited(payload),
            SessionEvent::MarkDone => self.on_mark_done(),
            SessionEvent::Save => self.on_save().await,
            SessionEvent::SubmitForReview { confirmed } => {
                self.on_submit_for_review(confirmed).await
            }
            SessionEvent::ReviewItem { item_id, verdict } => {
                self.on_review_item(item_id, verdict).await
            }
            SessionEvent::Accept => self.on_accept().await,
            SessionEvent::Reject => self.on_reject().await,
            SessionEvent::Restart => self.on_restart().await.map(|_| ()),
            SessionEvent::Complete => self.on_complete().await,
        }
    }

    /// Jobs on this user's work list, per role and assignment.
    pub async fn workable_jobs(&self) -> Result<Vec<Job>> {
        let statuses = JobStatus::workable_for(self.session.role);
        let jobs = self
            .gateway
            .list_jobs(self.session.team_id, self.session.user_id, statuses)
            .await?;
        Ok(jobs
            .into_iter()
            .filter(|job| job.workable_by(self.session.user_id, self.session.role))
            .collect())
    }

    /// Fetch a job for display without opening it or touching its status.
    pub async fn inspect_job(&self, job_id: JobId) -> Result<Job> {
        Ok(self.gateway.get_job(job_id).await?)
    }

    /// Open a job for this session: fetch it, start it when annotating, and
    /// populate the cache for every item not yet fetched.
    pub async fn open_job(&mut self, job_id: JobId) -> Result<()> {
        let job = self.gateway.get_job(job_id).await?;
        let mut machine = JobStateMachine::new(job);
        if self.session.role == Role::Annotator {
            machine.start(&self.gateway).await?;
        }

        let item_refs = machine.job().items.clone();
        for item_ref in &item_refs {
            self.cache
                .fetch_if_absent(&self.gateway, job_id, item_ref, false)
                .await?;
        }

        info!(job_id, items = item_refs.len(), "job opened");
        self.machine = Some(machine);
        self.active_item = None;
        Ok(())
    }

    /// Tear down the session's job state. Cached payloads stay on disk.
    pub fn close_job(&mut self) {
        self.machine = None;
        self.active_item = None;
    }

    /// Switch the active item, saving the previous one first when it is
    /// dirty and autosave-on-switch is enabled.
    pub async fn on_item_selected(&mut self, item_id: ItemId) -> Result<()> {
        let previous_dirty = self
            .active_item
            .as_ref()
            .is_some_and(|item| item.dirty && item.id != item_id);
        if previous_dirty && self.settings.autosave_on_volume_change {
            self.on_save().await?;
        }

        let machine = self.machine.as_ref().ok_or(SyncError::NoJobOpen)?;
        let job_id = machine.job().id;
        let item_ref = machine
            .job()
            .item(item_id)
            .cloned()
            .ok_or(SyncError::ItemNotFound(item_id))?;

        let item = self
            .cache
            .fetch_if_absent(&self.gateway, job_id, &item_ref, false)
            .await?;
        self.active_item = Some(item);
        Ok(())
    }

    /// Commit an edited payload for the active item. The first edit on an
    /// untouched item advances it to `InProgress` locally; the status is
    /// pushed with the next save.
    pub fn on_item_edited(&mut self, payload: ItemPayload) -> Result<()> {
        self.assert_active_editable()?;
        let item = self.active_item.as_mut().ok_or(SyncError::NoActiveItem)?;
        item.segments = payload.segments;
        item.tags = payload.tags;
        if self.session.role == Role::Annotator && item.status == ItemStatus::None {
            item.set_status(ItemStatus::InProgress, Role::Annotator)?;
        }
        self.cache.write_local(item)?;

        let status = item.status;
        let item_id = item.id;
        if let Some(machine) = self.machine.as_mut()
            && let Some(item_ref) = machine.job_mut().item_mut(item_id)
        {
            item_ref.status = status;
        }
        Ok(())
    }

    /// Mark the active item done. Local-only; the status reaches the
    /// platform with the next save.
    pub fn on_mark_done(&mut self) -> Result<()> {
        self.assert_active_editable()?;
        let role = self.session.role;
        let item = self.active_item.as_mut().ok_or(SyncError::NoActiveItem)?;
        item.set_status(ItemStatus::Done, role)?;
        self.cache.write_local(item)?;

        let item_id = item.id;
        if let Some(machine) = self.machine.as_mut()
            && let Some(item_ref) = machine.job_mut().item_mut(item_id)
        {
            item_ref.status = ItemStatus::Done;
        }
        Ok(())
    }

    /// Push the active item: filtered segment actions first, then its
    /// status. `dirty` is cleared and `remote_synced_at` advances only when
    /// every action succeeded; a partial failure surfaces the failing
    /// subset and leaves the local copy untouched.
    pub async fn on_save(&mut self) -> Result<()> {
        self.assert_active_editable()?;
        let item = self.active_item.as_mut().ok_or(SyncError::NoActiveItem)?;
        let actions = save_filter::plan(item, &self.settings);

        if !actions.is_empty() {
            let outcome = self.gateway.upload_item_delta(item.id, actions).await?;
            if !outcome.is_full_success() {
                warn!(
                    item_id = item.id,
                    failed = outcome.failed.len(),
                    "save rejected for part of the delta"
                );
                return Err(SyncError::PartialSave {
                    failed: outcome.failed,
                });
            }
            for created in outcome.created {
                if let Some(segment) = item
                    .segments
                    .iter_mut()
                    .find(|s| s.id == created.segment_id)
                {
                    segment.object_id = Some(created.object_id);
                }
            }
            // Deletions are confirmed remote; drop them locally.
            item.segments.retain(|s| !s.deleted);
            // Keep the on-disk copy in step with the confirmed delta; the
            // item stays dirty until the status push lands.
            self.cache.persist(item)?;
        }

        self.gateway.set_item_status(item.id, item.status).await?;
        self.cache.mark_synced(item)?;
        info!(item_id = item.id, "item saved");
        Ok(())
    }

    /// Hand the job over to review. A dirty active item is autosaved when
    /// `autosave_on_submit` is set; otherwise the caller must confirm that
    /// it submits with unsaved changes.
    pub async fn on_submit_for_review(&mut self, confirmed: bool) -> Result<()> {
        let dirty_item = self
            .active_item
            .as_ref()
            .filter(|item| item.dirty)
            .map(|item| item.id);
        if let Some(item_id) = dirty_item {
            if self.settings.autosave_on_submit {
                self.on_save().await?;
            } else if !confirmed {
                return Err(SyncError::UnsavedChanges(item_id));
            }
        }
        let machine = self.machine.as_mut().ok_or(SyncError::NoJobOpen)?;
        machine.submit_for_review(&self.gateway).await
    }

    /// Reviewer verdict on one item, pushed to the platform immediately.
    pub async fn on_review_item(&mut self, item_id: ItemId, verdict: ItemStatus) -> Result<()> {
        let role = self.session.role;
        let machine = self.machine.as_ref().ok_or(SyncError::NoJobOpen)?;
        let job_id = machine.job().id;
        let current = machine
            .job()
            .item(item_id)
            .ok_or(SyncError::ItemNotFound(item_id))?
            .status;
        if !can_transition(current, verdict, role) {
            return Err(SyncError::InvalidTransition {
                from: current,
                to: verdict,
            });
        }

        self.gateway.set_item_status(item_id, verdict).await?;

        if let Some(machine) = self.machine.as_mut()
            && let Some(item_ref) = machine.job_mut().item_mut(item_id)
        {
            item_ref.status = verdict;
        }
        if let Some(mut cached) = self.cache.load(job_id, item_id)? {
            cached.status = verdict;
            self.cache.persist(&cached)?;
        }
        if let Some(active) = self.active_item.as_mut()
            && active.id == item_id
        {
            active.status = verdict;
        }
        Ok(())
    }

    pub async fn on_accept(&mut self) -> Result<()> {
        let machine = self.machine.as_mut().ok_or(SyncError::NoJobOpen)?;
        machine.accept(&self.gateway).await
    }

    /// Reject the job. Per-item resets happen on the subsequent restart.
    pub async fn on_reject(&mut self) -> Result<()> {
        let machine = self.machine.as_mut().ok_or(SyncError::NoJobOpen)?;
        machine.reject(&self.gateway).await
    }

    pub async fn on_complete(&mut self) -> Result<()> {
        let machine = self.machine.as_mut().ok_or(SyncError::NoJobOpen)?;
        machine.complete(&self.gateway).await
    }

    /// Restart a rejected job and drop the local copies of every reopened
    /// item, so the next selection re-downloads remote truth.
    pub async fn on_restart(&mut self) -> Result<Vec<ItemId>> {
        let rejected_only = self.settings.restart_with_rejected_only;
        let machine = self.machine.as_mut().ok_or(SyncError::NoJobOpen)?;
        let reopened = machine.restart(&self.gateway, rejected_only).await?;
        let job_id = machine.job().id;

        for &item_id in &reopened {
            self.cache.clear(job_id, item_id)?;
            if self.active_item.as_ref().is_some_and(|i| i.id == item_id) {
                self.active_item = None;
            }
        }
        Ok(reopened)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gateway::testing::MockGateway;
    use crate::gateway::types::{CreatedObject, DeltaOutcome, FailedSegment};
    use crate::state_machine::{ItemRef, Segment};

    fn make_job(status: JobStatus, items: &[(ItemId, ItemStatus)]) -> Job {
        Job {
            id: 100,
            team_id: 7,
            name: "CT batch 12".into(),
            status,
            assigned_annotator_id: 1,
            assigned_reviewer_id: 2,
            items: items
                .iter()
                .map(|&(id, status)| ItemRef {
                    id,
                    name: format!("vol_{id:03}.nrrd"),
                    status,
                })
                .collect(),
        }
    }

    fn payload_with(names: &[&str]) -> ItemPayload {
        ItemPayload {
            segments: names
                .iter()
                .map(|name| Segment::new(*name, vec![1]))
                .collect(),
            tags: Vec::new(),
        }
    }

    fn annotator() -> SessionContext {
        SessionContext::new(1, 7, Role::Annotator)
    }

    fn reviewer() -> SessionContext {
        SessionContext::new(2, 7, Role::Reviewer)
    }

    fn orchestrator(
        gw: MockGateway,
        dir: &tempfile::TempDir,
        settings: Settings,
        session: SessionContext,
    ) -> SyncOrchestrator<MockGateway> {
        SyncOrchestrator::new(gw, LocalCache::new(dir.path()), settings, session)
    }

    async fn open_annotation_job(
        items: &[(ItemId, ItemStatus)],
        settings: Settings,
        dir: &tempfile::TempDir,
    ) -> SyncOrchestrator<MockGateway> {
        let gw = MockGateway::with_job(make_job(JobStatus::InProgress, items));
        for &(id, _) in items {
            gw.put_payload(id, payload_with(&["liver"]));
        }
        let mut orch = orchestrator(gw, dir, settings, annotator());
        orch.open_job(100).await.unwrap();
        orch
    }

    #[tokio::test]
    async fn workable_jobs_respects_role_and_assignment() {
        let gw = MockGateway::default();
        {
            let mut jobs = gw.jobs.lock().unwrap();
            jobs.push(make_job(JobStatus::Pending, &[]));
            let mut other = make_job(JobStatus::OnReview, &[]);
            other.id = 101;
            jobs.push(other);
        }
        let dir = tempfile::tempdir().unwrap();
        let orch = orchestrator(gw, &dir, Settings::default(), annotator());
        let jobs = orch.workable_jobs().await.unwrap();
        assert_eq!(jobs.len(), 1);
        assert_eq!(jobs[0].status, JobStatus::Pending);
    }

    #[tokio::test]
    async fn open_job_starts_and_prefetches() {
        let gw = MockGateway::with_job(make_job(
            JobStatus::Pending,
            &[(1, ItemStatus::None), (2, ItemStatus::None)],
        ));
        gw.put_payload(1, payload_with(&["liver"]));
        gw.put_payload(2, payload_with(&["tumor"]));
        let dir = tempfile::tempdir().unwrap();
        let mut orch = orchestrator(gw, &dir, Settings::default(), annotator());

        orch.open_job(100).await.unwrap();
        assert_eq!(orch.job().unwrap().status, JobStatus::InProgress);

        // Both items were cached during open.
        orch.on_item_selected(2).await.unwrap();
        assert_eq!(orch.active_item().unwrap().name, "vol_002.nrrd");
    }

    #[tokio::test]
    async fn first_edit_advances_item_and_marks_dirty() {
        let dir = tempfile::tempdir().unwrap();
        let mut orch =
            open_annotation_job(&[(1, ItemStatus::None)], Settings::default(), &dir).await;
        orch.on_item_selected(1).await.unwrap();

        orch.on_item_edited(payload_with(&["liver", "tumor"])).unwrap();
        let item = orch.active_item().unwrap();
        assert!(item.dirty);
        assert_eq!(item.status, ItemStatus::InProgress);
        assert_eq!(orch.job().unwrap().item(1).unwrap().status, ItemStatus::InProgress);
    }

    #[tokio::test]
    async fn mark_done_requires_in_progress() {
        let dir = tempfile::tempdir().unwrap();
        let mut orch =
            open_annotation_job(&[(1, ItemStatus::None)], Settings::default(), &dir).await;
        orch.on_item_selected(1).await.unwrap();

        let err = orch.on_mark_done().unwrap_err();
        assert!(matches!(err, SyncError::InvalidTransition { .. }));

        orch.on_item_edited(payload_with(&["liver"])).unwrap();
        orch.on_mark_done().unwrap();
        assert_eq!(orch.active_item().unwrap().status, ItemStatus::Done);
    }

    #[tokio::test]
    async fn save_pushes_delta_then_status_and_clears_dirty() {
        let dir = tempfile::tempdir().unwrap();
        let mut orch =
            open_annotation_job(&[(1, ItemStatus::None)], Settings::default(), &dir).await;
        orch.on_item_selected(1).await.unwrap();
        orch.on_item_edited(payload_with(&["liver"])).unwrap();

        orch.on_save().await.unwrap();
        let item = orch.active_item().unwrap();
        assert!(!item.dirty);
        assert!(item.remote_synced_at.is_some());
        assert_eq!(orch.gateway.delta_calls.lock().unwrap().len(), 1);
        assert_eq!(
            *orch.gateway.item_status_calls.lock().unwrap(),
            vec![(1, ItemStatus::InProgress)]
        );
    }

    #[tokio::test]
    async fn partial_save_failure_keeps_dirty() {
        let dir = tempfile::tempdir().unwrap();
        let mut orch =
            open_annotation_job(&[(1, ItemStatus::None)], Settings::default(), &dir).await;
        orch.on_item_selected(1).await.unwrap();
        orch.on_item_edited(payload_with(&["liver"])).unwrap();

        let failing = orch.active_item().unwrap().segments[0].id;
        *orch.gateway.delta_outcome.lock().unwrap() = DeltaOutcome {
            failed: vec![FailedSegment {
                segment_id: failing,
                error: "geometry rejected".into(),
            }],
            created: Vec::new(),
        };

        let err = orch.on_save().await.unwrap_err();
        match err {
            SyncError::PartialSave { failed } => assert_eq!(failed[0].segment_id, failing),
            other => panic!("expected PartialSave, got {other}"),
        }
        let item = orch.active_item().unwrap();
        assert!(item.dirty);
        // Status was never pushed.
        assert!(orch.gateway.item_status_calls.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn save_applies_created_object_ids_and_drops_deleted() {
        let dir = tempfile::tempdir().unwrap();
        let mut orch =
            open_annotation_job(&[(1, ItemStatus::None)], Settings::default(), &dir).await;
        orch.on_item_selected(1).await.unwrap();

        let mut payload = payload_with(&["liver", "obsolete"]);
        payload.segments[1].deleted = true;
        let created_id = payload.segments[0].id;
        orch.on_item_edited(payload).unwrap();

        *orch.gateway.delta_outcome.lock().unwrap() = DeltaOutcome {
            failed: Vec::new(),
            created: vec![CreatedObject {
                segment_id: created_id,
                object_id: 555,
            }],
        };

        orch.on_save().await.unwrap();
        let item = orch.active_item().unwrap();
        assert_eq!(item.segments.len(), 1);
        assert_eq!(item.segments[0].object_id, Some(555));
    }

    #[tokio::test]
    async fn accepted_items_are_excluded_from_editing() {
        let dir = tempfile::tempdir().unwrap();
        let mut orch = open_annotation_job(
            &[(1, ItemStatus::None), (2, ItemStatus::Accepted)],
            Settings::default(),
            &dir,
        )
        .await;
        orch.on_item_selected(2).await.unwrap();

        let err = orch.on_item_edited(payload_with(&["liver"])).unwrap_err();
        assert!(matches!(err, SyncError::ItemNotEditable(2)));
        let err = orch.on_save().await.unwrap_err();
        assert!(matches!(err, SyncError::ItemNotEditable(2)));

        // Nothing reached the platform.
        assert!(orch.gateway.delta_calls.lock().unwrap().is_empty());
        assert!(orch.gateway.item_status_calls.lock().unwrap().is_empty());
        assert!(!orch.cache.load(100, 2).unwrap().unwrap().dirty);
    }

    #[tokio::test]
    async fn terminal_job_stops_local_mutation() {
        let gw = MockGateway::with_job(make_job(JobStatus::Accepted, &[(1, ItemStatus::Done)]));
        gw.put_payload(1, payload_with(&["liver"]));
        let dir = tempfile::tempdir().unwrap();
        let mut orch = orchestrator(gw, &dir, Settings::default(), reviewer());
        orch.open_job(100).await.unwrap();
        orch.on_item_selected(1).await.unwrap();

        let err = orch.on_item_edited(payload_with(&["liver"])).unwrap_err();
        assert!(matches!(err, SyncError::ItemNotEditable(1)));
        let err = orch.on_save().await.unwrap_err();
        assert!(matches!(err, SyncError::ItemNotEditable(1)));
        assert!(orch.gateway.delta_calls.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn status_push_failure_does_not_replay_confirmed_deletes() {
        let dir = tempfile::tempdir().unwrap();
        let mut orch =
            open_annotation_job(&[(1, ItemStatus::None)], Settings::default(), &dir).await;
        orch.on_item_selected(1).await.unwrap();

        let mut payload = payload_with(&["liver", "obsolete"]);
        payload.segments[1].deleted = true;
        orch.on_item_edited(payload).unwrap();

        *orch.gateway.fail_item_status_for.lock().unwrap() = Some(1);
        let err = orch.on_save().await.unwrap_err();
        assert!(matches!(err, SyncError::Gateway(_)));

        // The delta was confirmed, so the deletion is already recorded on
        // disk; the item stays dirty for the retry.
        let cached = orch.cache.load(100, 1).unwrap().unwrap();
        assert!(cached.dirty);
        assert!(cached.segments.iter().all(|s| !s.deleted));

        *orch.gateway.fail_item_status_for.lock().unwrap() = None;
        orch.on_save().await.unwrap();
        let calls = orch.gateway.delta_calls.lock().unwrap();
        assert_eq!(calls.len(), 2);
        assert!(calls[1].1.iter().all(|a| !a.is_delete()));
        drop(calls);
        assert!(!orch.active_item().unwrap().dirty);
    }

    #[tokio::test]
    async fn switching_items_autosaves_dirty_previous() {
        let dir = tempfile::tempdir().unwrap();
        let mut orch = open_annotation_job(
            &[(1, ItemStatus::None), (2, ItemStatus::None)],
            Settings::default(),
            &dir,
        )
        .await;
        orch.on_item_selected(1).await.unwrap();
        orch.on_item_edited(payload_with(&["liver"])).unwrap();

        orch.on_item_selected(2).await.unwrap();
        assert_eq!(orch.gateway.delta_calls.lock().unwrap().len(), 1);
        assert_eq!(orch.active_item().unwrap().id, 2);
        // The saved copy is clean on disk.
        let saved = orch.cache.load(100, 1).unwrap().unwrap();
        assert!(!saved.dirty);
    }

    #[tokio::test]
    async fn switching_items_keeps_dirty_when_autosave_disabled() {
        let dir = tempfile::tempdir().unwrap();
        let settings = Settings {
            autosave_on_volume_change: false,
            ..Settings::default()
        };
        let mut orch = open_annotation_job(
            &[(1, ItemStatus::None), (2, ItemStatus::None)],
            settings,
            &dir,
        )
        .await;
        orch.on_item_selected(1).await.unwrap();
        orch.on_item_edited(payload_with(&["liver"])).unwrap();

        orch.on_item_selected(2).await.unwrap();
        assert!(orch.gateway.delta_calls.lock().unwrap().is_empty());
        assert!(orch.cache.load(100, 1).unwrap().unwrap().dirty);
    }

    #[tokio::test]
    async fn submit_with_unsaved_changes_fails_without_confirmation() {
        let dir = tempfile::tempdir().unwrap();
        let mut orch =
            open_annotation_job(&[(1, ItemStatus::None)], Settings::default(), &dir).await;
        orch.on_item_selected(1).await.unwrap();
        orch.on_item_edited(payload_with(&["liver"])).unwrap();

        let err = orch.on_submit_for_review(false).await.unwrap_err();
        assert!(matches!(err, SyncError::UnsavedChanges(1)));
        assert_eq!(orch.job().unwrap().status, JobStatus::InProgress);
        assert!(orch.gateway.job_status_calls.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn submit_autosaves_when_enabled() {
        let dir = tempfile::tempdir().unwrap();
        let settings = Settings {
            autosave_on_submit: true,
            ..Settings::default()
        };
        let mut orch = open_annotation_job(&[(1, ItemStatus::None)], settings, &dir).await;
        orch.on_item_selected(1).await.unwrap();
        orch.on_item_edited(payload_with(&["liver"])).unwrap();

        orch.on_submit_for_review(false).await.unwrap();
        assert_eq!(orch.job().unwrap().status, JobStatus::OnReview);
        assert_eq!(orch.gateway.delta_calls.lock().unwrap().len(), 1);
        assert!(!orch.active_item().unwrap().dirty);
    }

    #[tokio::test]
    async fn submit_with_confirmation_skips_the_save() {
        let dir = tempfile::tempdir().unwrap();
        let mut orch =
            open_annotation_job(&[(1, ItemStatus::None)], Settings::default(), &dir).await;
        orch.on_item_selected(1).await.unwrap();
        orch.on_item_edited(payload_with(&["liver"])).unwrap();

        orch.on_submit_for_review(true).await.unwrap();
        assert_eq!(orch.job().unwrap().status, JobStatus::OnReview);
        assert!(orch.gateway.delta_calls.lock().unwrap().is_empty());
        assert!(orch.active_item().unwrap().dirty);
    }

    #[tokio::test]
    async fn reviewer_verdict_is_pushed_immediately() {
        let gw = MockGateway::with_job(make_job(JobStatus::OnReview, &[(1, ItemStatus::Done)]));
        gw.put_payload(1, payload_with(&["liver"]));
        let dir = tempfile::tempdir().unwrap();
        let mut orch = orchestrator(gw, &dir, Settings::default(), reviewer());
        orch.open_job(100).await.unwrap();

        orch.on_review_item(1, ItemStatus::Accepted).await.unwrap();
        assert_eq!(
            *orch.gateway.item_status_calls.lock().unwrap(),
            vec![(1, ItemStatus::Accepted)]
        );
        assert_eq!(orch.job().unwrap().item(1).unwrap().status, ItemStatus::Accepted);
        assert_eq!(
            orch.cache.load(100, 1).unwrap().unwrap().status,
            ItemStatus::Accepted
        );
    }

    #[tokio::test]
    async fn annotator_cannot_pass_review_verdicts() {
        let dir = tempfile::tempdir().unwrap();
        let mut orch =
            open_annotation_job(&[(1, ItemStatus::Done)], Settings::default(), &dir).await;
        let err = orch
            .on_review_item(1, ItemStatus::Accepted)
            .await
            .unwrap_err();
        assert!(matches!(err, SyncError::InvalidTransition { .. }));
        assert!(orch.gateway.item_status_calls.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn reject_then_restart_reopens_only_rejected_items() {
        let gw = MockGateway::with_job(make_job(
            JobStatus::OnReview,
            &[(1, ItemStatus::Rejected), (2, ItemStatus::Accepted)],
        ));
        gw.put_payload(1, payload_with(&["liver"]));
        gw.put_payload(2, payload_with(&["tumor"]));
        let dir = tempfile::tempdir().unwrap();
        let settings = Settings {
            restart_with_rejected_only: true,
            ..Settings::default()
        };
        let mut orch = orchestrator(gw, &dir, settings, reviewer());
        orch.open_job(100).await.unwrap();

        orch.on_reject().await.unwrap();
        assert_eq!(orch.job().unwrap().status, JobStatus::Rejected);

        let reopened = orch.on_restart().await.unwrap();
        assert_eq!(reopened, vec![1]);
        assert_eq!(orch.job().unwrap().status, JobStatus::InProgress);
        assert_eq!(orch.job().unwrap().item(1).unwrap().status, ItemStatus::None);
        assert_eq!(orch.job().unwrap().item(2).unwrap().status, ItemStatus::Accepted);
        // The reopened item's local copy was dropped; the accepted one stays.
        assert!(orch.cache.load(100, 1).unwrap().is_none());
        assert!(orch.cache.load(100, 2).unwrap().is_some());
    }

    #[tokio::test]
    async fn accept_then_complete_closes_the_job() {
        let gw = MockGateway::with_job(make_job(JobStatus::OnReview, &[]));
        let dir = tempfile::tempdir().unwrap();
        let mut orch = orchestrator(gw, &dir, Settings::default(), reviewer());
        orch.open_job(100).await.unwrap();

        orch.handle(SessionEvent::Accept).await.unwrap();
        orch.handle(SessionEvent::Complete).await.unwrap();
        assert_eq!(orch.job().unwrap().status, JobStatus::Completed);
    }

    #[tokio::test]
    async fn events_require_an_open_job() {
        let gw = MockGateway::default();
        let dir = tempfile::tempdir().unwrap();
        let mut orch = orchestrator(gw, &dir, Settings::default(), annotator());
        let err = orch
            .handle(SessionEvent::SubmitForReview { confirmed: false })
            .await
            .unwrap_err();
        assert!(matches!(err, SyncError::NoJobOpen));
    }
}
