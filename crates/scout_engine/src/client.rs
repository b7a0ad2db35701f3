use reqwest::header::{ACCEPT, CONTENT_TYPE};
use scout_core::{CompanyTile, Deal, JobHandle, JobSnapshot, ScrapeRequest, TaskId};
use serde::de::DeserializeOwned;
use url::Url;

use crate::{ClientError, ClientErrorKind, ClientSettings};

const JSON: &str = "application/json";

/// Request builders for the scrape backend. Implementations keep no per-job
/// state; the caller decides whether a failed call is retried.
#[async_trait::async_trait]
pub trait JobClient: Send + Sync {
    /// `POST start-scrape`.
    async fn submit(&self, request: &ScrapeRequest) -> Result<JobHandle, ClientError>;

    /// `GET tasks/{task_id}`: one status check.
    async fn poll_once(&self, task_id: &TaskId) -> Result<JobSnapshot, ClientError>;

    /// `GET results`: persisted results, independent of any job.
    async fn fetch_aggregate_results(&self) -> Result<Vec<Deal>, ClientError>;

    /// `GET deals?limit=N`.
    async fn fetch_deals(&self, limit: usize) -> Result<Vec<Deal>, ClientError>;

    /// `GET dashboard/heatmap?targets=...`; a blank target asks for everything.
    async fn fetch_heatmap(&self, targets: &str) -> Result<Vec<CompanyTile>, ClientError>;
}

#[derive(Debug, Clone)]
pub struct ReqwestJobClient {
    base_url: Url,
    client: reqwest::Client,
}

impl ReqwestJobClient {
    pub fn new(settings: &ClientSettings) -> Result<Self, ClientError> {
        let mut base_url = Url::parse(&settings.base_url)
            .map_err(|err| ClientError::new(ClientErrorKind::InvalidUrl, err.to_string()))?;
        if base_url.cannot_be_a_base() {
            return Err(ClientError::new(
                ClientErrorKind::InvalidUrl,
                format!("{} cannot be a base url", settings.base_url),
            ));
        }
        // Without the trailing slash `join` would drop the last segment.
        if !base_url.path().ends_with('/') {
            let path = format!("{}/", base_url.path());
            base_url.set_path(&path);
        }

        let client = reqwest::Client::builder()
            .connect_timeout(settings.connect_timeout)
            .timeout(settings.request_timeout)
            .build()
            .map_err(|err| ClientError::new(ClientErrorKind::Transport, err.to_string()))?;

        Ok(Self { base_url, client })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    fn endpoint(&self, segments: &[&str]) -> Result<Url, ClientError> {
        let mut url = self.base_url.clone();
        {
            let mut path = url.path_segments_mut().map_err(|()| {
                ClientError::new(ClientErrorKind::InvalidUrl, "base url cannot be a base")
            })?;
            path.pop_if_empty();
            path.extend(segments);
        }
        Ok(url)
    }

    async fn get_json<T: DeserializeOwned>(&self, url: Url) -> Result<T, ClientError> {
        let response = self
            .client
            .get(url)
            .header(ACCEPT, JSON)
            .send()
            .await
            .map_err(map_reqwest_error)?;
        read_json(response).await
    }
}

#[async_trait::async_trait]
impl JobClient for ReqwestJobClient {
    async fn submit(&self, request: &ScrapeRequest) -> Result<JobHandle, ClientError> {
        let url = self.endpoint(&["start-scrape"])?;
        let body = serde_json::to_vec(request)
            .map_err(|err| ClientError::new(ClientErrorKind::Decode, err.to_string()))?;
        let response = self
            .client
            .post(url)
            .header(CONTENT_TYPE, JSON)
            .header(ACCEPT, JSON)
            .body(body)
            .send()
            .await
            .map_err(map_reqwest_error)?;
        read_json(response).await
    }

    async fn poll_once(&self, task_id: &TaskId) -> Result<JobSnapshot, ClientError> {
        let url = self.endpoint(&["tasks", task_id.as_str()])?;
        self.get_json(url).await
    }

    async fn fetch_aggregate_results(&self) -> Result<Vec<Deal>, ClientError> {
        let url = self.endpoint(&["results"])?;
        self.get_json(url).await
    }

    async fn fetch_deals(&self, limit: usize) -> Result<Vec<Deal>, ClientError> {
        let mut url = self.endpoint(&["deals"])?;
        url.query_pairs_mut()
            .append_pair("limit", &limit.to_string());
        self.get_json(url).await
    }

    async fn fetch_heatmap(&self, targets: &str) -> Result<Vec<CompanyTile>, ClientError> {
        let mut url = self.endpoint(&["dashboard", "heatmap"])?;
        let targets = targets.trim();
        if !targets.is_empty() {
            url.query_pairs_mut().append_pair("targets", targets);
        }
        self.get_json(url).await
    }
}

async fn read_json<T: DeserializeOwned>(response: reqwest::Response) -> Result<T, ClientError> {
    let status = response.status();
    if !status.is_success() {
        let code = status.as_u16();
        let body = response.text().await.unwrap_or_default();
        let message = error_detail(&body).unwrap_or_else(|| status.to_string());
        let kind = if status.is_client_error() {
            ClientErrorKind::Rejected(code)
        } else {
            ClientErrorKind::HttpStatus(code)
        };
        return Err(ClientError::new(kind, message));
    }

    let bytes = response.bytes().await.map_err(map_reqwest_error)?;
    serde_json::from_slice(&bytes)
        .map_err(|err| ClientError::new(ClientErrorKind::Decode, err.to_string()))
}

/// Extracts the `detail` text of a FastAPI-style error body.
fn error_detail(body: &str) -> Option<String> {
    let value: serde_json::Value = serde_json::from_str(body).ok()?;
    match value.get("detail")? {
        serde_json::Value::String(detail) => Some(detail.clone()),
        other => Some(other.to_string()),
    }
}

fn map_reqwest_error(err: reqwest::Error) -> ClientError {
    if err.is_timeout() {
        return ClientError::new(ClientErrorKind::Timeout, err.to_string());
    }
    if err.is_decode() {
        return ClientError::new(ClientErrorKind::Decode, err.to_string());
    }
    ClientError::new(ClientErrorKind::Transport, err.to_string())
}
