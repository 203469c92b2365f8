//! In-memory gateway used by unit tests. Records every remote call and can
//! be told to fail specific operations.

use std::collections::HashMap;
use std::sync::Mutex;

use super::error::GatewayError;
use super::types::{DeltaOutcome, ItemPayload, SegmentAction};
use crate::state_machine::{ItemId, ItemStatus, Job, JobId, JobStatus, TeamId, UserId};

#[derive(Default)]
pub struct MockGateway {
    pub jobs: Mutex<Vec<Job>>,
    pub payloads: Mutex<HashMap<ItemId, ItemPayload>>,
    pub delta_outcome: Mutex<DeltaOutcome>,
    pub item_status_calls: Mutex<Vec<(ItemId, ItemStatus)>>,
    pub job_status_calls: Mutex<Vec<(JobId, JobStatus)>>,
    pub delta_calls: Mutex<Vec<(ItemId, Vec<SegmentAction>)>>,
    pub fail_item_status_for: Mutex<Option<ItemId>>,
    pub fail_job_status: Mutex<bool>,
}

impl MockGateway {
    pub fn with_job(job: Job) -> Self {
        let gw = Self::default();
        gw.jobs.lock().unwrap().push(job);
        gw
    }

    pub fn put_payload(&self, item_id: ItemId, payload: ItemPayload) {
        self.payloads.lock().unwrap().insert(item_id, payload);
    }
}

impl super::RemoteGateway for MockGateway {
    async fn get_job(&self, job_id: JobId) -> Result<Job, GatewayError> {
        self.jobs
            .lock()
            .unwrap()
            .iter()
            .find(|j| j.id == job_id)
            .cloned()
            .ok_or_else(|| GatewayError::Api {
                status: 404,
                message: format!("job {job_id} not found"),
            })
    }

    async fn list_jobs(
        &self,
        team_id: TeamId,
        assigned_to: UserId,
        statuses: &[JobStatus],
    ) -> Result<Vec<Job>, GatewayError> {
        Ok(self
            .jobs
            .lock()
            .unwrap()
            .iter()
            .filter(|j| {
                j.team_id == team_id
                    && (j.assigned_annotator_id == assigned_to
                        || j.assigned_reviewer_id == assigned_to)
                    && statuses.contains(&j.status)
            })
            .cloned()
            .collect())
    }

    async fn download_item(&self, item_id: ItemId) -> Result<ItemPayload, GatewayError> {
        self.payloads
            .lock()
            .unwrap()
            .get(&item_id)
            .cloned()
            .ok_or_else(|| GatewayError::Api {
                status: 404,
                message: format!("item {item_id} not found"),
            })
    }

    async fn upload_item_delta(
        &self,
        item_id: ItemId,
        actions: Vec<SegmentAction>,
    ) -> Result<DeltaOutcome, GatewayError> {
        self.delta_calls.lock().unwrap().push((item_id, actions));
        Ok(self.delta_outcome.lock().unwrap().clone())
    }

    async fn set_item_status(
        &self,
        item_id: ItemId,
        status: ItemStatus,
    ) -> Result<(), GatewayError> {
        if *self.fail_item_status_for.lock().unwrap() == Some(item_id) {
            return Err(GatewayError::Transport("connection reset".into()));
        }
        self.item_status_calls.lock().unwrap().push((item_id, status));
        Ok(())
    }

    async fn set_job_status(&self, job_id: JobId, status: JobStatus) -> Result<(), GatewayError> {
        if *self.fail_job_status.lock().unwrap() {
            return Err(GatewayError::Transport("connection reset".into()));
        }
        self.job_status_calls.lock().unwrap().push((job_id, status));
        Ok(())
    }
}
