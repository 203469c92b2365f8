//! Remote platform gateway: the capability set this core consumes, plus a
//! concrete HTTP client.

pub mod client;
pub mod error;
#[cfg(test)]
pub mod testing;
pub mod types;

pub use client::PlatformClient;
pub use error::GatewayError;
pub use types::{DeltaOutcome, ItemPayload, SegmentAction};

use crate::state_machine::{ItemId, ItemStatus, Job, JobId, JobStatus, TeamId, UserId};

/// Authenticated access to the labeling platform.
///
/// All calls may fail with transport or auth errors; both are treated as
/// retryable by the user and never corrupt local state. Retry policy, if
/// any, lives behind the implementation.
pub trait RemoteGateway: Send + Sync {
    /// Fetch a job with its item list.
    fn get_job(&self, job_id: JobId) -> impl Future<Output = Result<Job, GatewayError>> + Send;

    /// List jobs in a team assigned to the given user, filtered by status.
    fn list_jobs(
        &self,
        team_id: TeamId,
        assigned_to: UserId,
        statuses: &[JobStatus],
    ) -> impl Future<Output = Result<Vec<Job>, GatewayError>> + Send;

    /// Download the full payload for one item.
    fn download_item(
        &self,
        item_id: ItemId,
    ) -> impl Future<Output = Result<ItemPayload, GatewayError>> + Send;

    /// Push a set of segment actions for one item.
    fn upload_item_delta(
        &self,
        item_id: ItemId,
        actions: Vec<SegmentAction>,
    ) -> impl Future<Output = Result<DeltaOutcome, GatewayError>> + Send;

    /// Set the review status of one item.
    fn set_item_status(
        &self,
        item_id: ItemId,
        status: ItemStatus,
    ) -> impl Future<Output = Result<(), GatewayError>> + Send;

    /// Set the status of a job.
    fn set_job_status(
        &self,
        job_id: JobId,
        status: JobStatus,
    ) -> impl Future<Output = Result<(), GatewayError>> + Send;
}
