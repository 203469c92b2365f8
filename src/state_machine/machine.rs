//! Job lifecycle driver.
//!
//! Every lifecycle operation is committed remote-first: the platform is
//! updated before any local field changes, so a failed network call leaves
//! the local job exactly as it was. Restart additionally stages per-item
//! status resets ahead of the job transition.

use tracing::info;

use crate::error::{Result, SyncError};
use crate::gateway::RemoteGateway;
use crate::state_machine::{ItemId, ItemStatus, Job, JobStatus};

/// Valid job status transitions, independent of role. Role and assignment
/// checks happen at the work-list level before a job is ever opened.
pub fn job_can_transition(from: JobStatus, to: JobStatus) -> bool {
    matches!(
        (from, to),
        (JobStatus::Pending, JobStatus::InProgress)
            | (JobStatus::InProgress, JobStatus::OnReview)
            | (JobStatus::OnReview, JobStatus::Accepted)
            | (JobStatus::OnReview, JobStatus::Rejected)
            | (JobStatus::Rejected, JobStatus::InProgress)
            | (JobStatus::Accepted, JobStatus::Completed)
    )
}

/// Owns a job and walks it through its lifecycle against the platform.
pub struct JobStateMachine {
    job: Job,
}

impl JobStateMachine {
    pub fn new(job: Job) -> Self {
        Self { job }
    }

    pub fn job(&self) -> &Job {
        &self.job
    }

    pub fn job_mut(&mut self) -> &mut Job {
        &mut self.job
    }

    /// Validate a job transition, push it to the platform, then commit it
    /// locally. Local state is untouched on any failure.
    async fn commit(&mut self, gateway: &impl RemoteGateway, to: JobStatus) -> Result<()> {
        if !job_can_transition(self.job.status, to) {
            return Err(SyncError::InvalidJobTransition {
                from: self.job.status,
                to,
            });
        }
        gateway.set_job_status(self.job.id, to).await?;
        info!(job_id = self.job.id, from = %self.job.status, to = %to, "job transition");
        self.job.status = to;
        Ok(())
    }

    /// Take a pending job into annotation. A no-op when the job is already
    /// in progress, so reopening a session never trips on the transition
    /// table. Starting a rejected job is not allowed; that path goes
    /// through [`restart`](Self::restart).
    pub async fn start(&mut self, gateway: &impl RemoteGateway) -> Result<()> {
        match self.job.status {
            JobStatus::InProgress => Ok(()),
            JobStatus::Pending => self.commit(gateway, JobStatus::InProgress).await,
            from => Err(SyncError::InvalidJobTransition {
                from,
                to: JobStatus::InProgress,
            }),
        }
    }

    /// Hand the job over to review.
    pub async fn submit_for_review(&mut self, gateway: &impl RemoteGateway) -> Result<()> {
        self.commit(gateway, JobStatus::OnReview).await
    }

    /// Accept the whole job.
    pub async fn accept(&mut self, gateway: &impl RemoteGateway) -> Result<()> {
        self.commit(gateway, JobStatus::Accepted).await
    }

    /// Reject the whole job. Item statuses are left as the reviewer set
    /// them; the per-item reset happens on restart.
    pub async fn reject(&mut self, gateway: &impl RemoteGateway) -> Result<()> {
        self.commit(gateway, JobStatus::Rejected).await
    }

    /// Close out an accepted job.
    pub async fn complete(&mut self, gateway: &impl RemoteGateway) -> Result<()> {
        self.commit(gateway, JobStatus::Completed).await
    }

    /// Reopen a rejected job for another annotation cycle.
    ///
    /// With `rejected_only` set, only items the reviewer rejected are reset
    /// to `None`; accepted items keep their status. Otherwise every
    /// non-accepted item is reopened: still-open items are marked rejected
    /// on the platform before the reset.
    ///
    /// All remote item resets and the job transition are pushed before any
    /// local field changes; a failure partway leaves the local job intact.
    /// Returns the ids of the reopened items.
    pub async fn restart(
        &mut self,
        gateway: &impl RemoteGateway,
        rejected_only: bool,
    ) -> Result<Vec<ItemId>> {
        if !job_can_transition(self.job.status, JobStatus::InProgress) {
            return Err(SyncError::InvalidJobTransition {
                from: self.job.status,
                to: JobStatus::InProgress,
            });
        }

        let mut staged: Vec<(ItemId, ItemStatus)> = Vec::new();
        let mut reopened: Vec<ItemId> = Vec::new();
        for item in &self.job.items {
            match item.status {
                ItemStatus::Accepted => {}
                ItemStatus::Rejected => {
                    staged.push((item.id, ItemStatus::None));
                    reopened.push(item.id);
                }
                _ if !rejected_only => {
                    staged.push((item.id, ItemStatus::Rejected));
                    staged.push((item.id, ItemStatus::None));
                    reopened.push(item.id);
                }
                _ => {}
            }
        }

        for &(item_id, status) in &staged {
            gateway.set_item_status(item_id, status).await?;
        }
        gateway
            .set_job_status(self.job.id, JobStatus::InProgress)
            .await?;

        for &item_id in &reopened {
            if let Some(item) = self.job.item_mut(item_id) {
                item.status = ItemStatus::None;
            }
        }
        self.job.status = JobStatus::InProgress;
        info!(
            job_id = self.job.id,
            reopened = reopened.len(),
            rejected_only,
            "job restarted"
        );
        Ok(reopened)
    }
}
