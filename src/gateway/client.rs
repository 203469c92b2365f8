use std::time::Duration;

use reqwest::{Client, Response, StatusCode};
use tracing::debug;

use super::error::GatewayError;
use super::types::{DeltaOutcome, ItemPayload, SegmentAction};
use crate::state_machine::{ItemId, ItemStatus, Job, JobId, JobStatus, TeamId, UserId};

const TOKEN_HEADER: &str = "x-api-token";

/// HTTP client for the labeling platform's REST API.
pub struct PlatformClient {
    token: String,
    client: Client,
    base_url: String,
}

impl PlatformClient {
    /// Create a client pointing at a custom base URL (useful for testing).
    pub fn new(base_url: impl Into<String>, token: impl Into<String>) -> Self {
        let client = Client::builder()
            .connect_timeout(Duration::from_secs(10))
            .timeout(Duration::from_secs(120))
            .build()
            .expect("failed to build HTTP client");
        Self {
            token: token.into(),
            client,
            base_url: base_url.into(),
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url.trim_end_matches('/'))
    }

    /// Map authentication and API failures before handing back the body.
    async fn check(response: Response) -> Result<Response, GatewayError> {
        let status = response.status();
        if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
            let message = response
                .text()
                .await
                .unwrap_or_else(|_| "credentials rejected".to_string());
            return Err(GatewayError::Auth(message));
        }
        if !status.is_success() {
            let message = response
                .text()
                .await
                .unwrap_or_else(|_| "unknown error".to_string());
            return Err(GatewayError::Api {
                status: status.as_u16(),
                message,
            });
        }
        Ok(response)
    }
}

impl super::RemoteGateway for PlatformClient {
    async fn get_job(&self, job_id: JobId) -> Result<Job, GatewayError> {
        debug!(job_id, "fetching job");
        let response = self
            .client
            .get(self.url(&format!("/jobs/{job_id}")))
            .header(TOKEN_HEADER, &self.token)
            .send()
            .await?;
        let job = Self::check(response).await?.json::<Job>().await?;
        Ok(job)
    }

    async fn list_jobs(
        &self,
        team_id: TeamId,
        assigned_to: UserId,
        statuses: &[JobStatus],
    ) -> Result<Vec<Job>, GatewayError> {
        let status_filter = statuses
            .iter()
            .map(JobStatus::to_string)
            .collect::<Vec<_>>()
            .join(",");
        let response = self
            .client
            .get(self.url("/jobs"))
            .header(TOKEN_HEADER, &self.token)
            .query(&[
                ("team_id", team_id.to_string()),
                ("assigned_to", assigned_to.to_string()),
                ("status", status_filter),
            ])
            .send()
            .await?;
        let jobs = Self::check(response).await?.json::<Vec<Job>>().await?;
        Ok(jobs)
    }

    async fn download_item(&self, item_id: ItemId) -> Result<ItemPayload, GatewayError> {
        debug!(item_id, "downloading item payload");
        let response = self
            .client
            .get(self.url(&format!("/items/{item_id}/payload")))
            .header(TOKEN_HEADER, &self.token)
            .send()
            .await?;
        let payload = Self::check(response).await?.json::<ItemPayload>().await?;
        Ok(payload)
    }

    async fn upload_item_delta(
        &self,
        item_id: ItemId,
        actions: Vec<SegmentAction>,
    ) -> Result<DeltaOutcome, GatewayError> {
        debug!(item_id, count = actions.len(), "uploading item delta");
        let body = serde_json::json!({ "actions": actions });
        let response = self
            .client
            .post(self.url(&format!("/items/{item_id}/delta")))
            .header(TOKEN_HEADER, &self.token)
            .json(&body)
            .send()
            .await?;
        let outcome = Self::check(response).await?.json::<DeltaOutcome>().await?;
        Ok(outcome)
    }

    async fn set_item_status(
        &self,
        item_id: ItemId,
        status: ItemStatus,
    ) -> Result<(), GatewayError> {
        let response = self
            .client
            .post(self.url(&format!("/items/{item_id}/status")))
            .header(TOKEN_HEADER, &self.token)
            .json(&serde_json::json!({ "status": status }))
            .send()
            .await?;
        Self::check(response).await?;
        Ok(())
    }

    async fn set_job_status(&self, job_id: JobId, status: JobStatus) -> Result<(), GatewayError> {
        let response = self
            .client
            .post(self.url(&format!("/jobs/{job_id}/status")))
            .header(TOKEN_HEADER, &self.token)
            .json(&serde_json::json!({ "status": status }))
            .send()
            .await?;
        Self::check(response).await?;
        Ok(())
    }
}
