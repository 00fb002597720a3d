//! CLI Commands

use landreg_core::{KeyedRecord, OwnerReport, PropertyRecord};
use reqwest::{Client, Url};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;

/// API Client for interacting with a LANDREG node
pub struct ApiClient {
    base_url: Url,
    client: Client,
}

impl ApiClient {
    pub fn new(base_url: &str) -> Result<Self, ApiError> {
        let base_url =
            Url::parse(base_url).map_err(|e| ApiError::InvalidUrl(format!("{}: {}", base_url, e)))?;
        if base_url.cannot_be_a_base() {
            return Err(ApiError::InvalidUrl(base_url.to_string()));
        }
        Ok(Self {
            base_url,
            client: Client::builder().timeout(Duration::from_secs(30)).build()?,
        })
    }

    /// Node URL with `segments` appended as path segments. Each segment is
    /// percent-encoded, so keys may contain `/`, `?` or `#`.
    pub fn url(&self, segments: &[&str]) -> Result<Url, ApiError> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| ApiError::InvalidUrl(self.base_url.to_string()))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    /// Get node status
    pub async fn status(&self) -> Result<NodeStatus, ApiError> {
        let resp = self.client.get(self.url(&["status"])?).send().await?.json().await?;
        unwrap_response(resp)
    }

    /// Write the demonstration records
    pub async fn seed(&self) -> Result<usize, ApiError> {
        let resp: ApiResponse<SeedResponse> = self
            .client
            .post(self.url(&["ledger", "seed"])?)
            .send()
            .await?
            .json()
            .await?;
        unwrap_response(resp).map(|r| r.seeded)
    }

    pub async fn create_record(&self, key: &str, record: &PropertyRecord) -> Result<(), ApiError> {
        let body = CreateRecordRequest { key, record };
        let resp: ApiResponse<serde_json::Value> = self
            .client
            .post(self.url(&["records"])?)
            .json(&body)
            .send()
            .await?
            .json()
            .await?;
        unwrap_response(resp).map(|_| ())
    }

    pub async fn read_record(&self, key: &str) -> Result<PropertyRecord, ApiError> {
        let resp = self
            .client
            .get(self.url(&["records", key])?)
            .send()
            .await?
            .json()
            .await?;
        unwrap_response(resp)
    }

    pub async fn list_records(&self) -> Result<Vec<KeyedRecord>, ApiError> {
        let resp = self.client.get(self.url(&["records"])?).send().await?.json().await?;
        unwrap_response(resp)
    }

    /// Reassign ownership, returning the updated record
    pub async fn transfer_owner(&self, key: &str, new_owner: &str) -> Result<KeyedRecord, ApiError> {
        let resp = self
            .client
            .put(self.url(&["records", key, "owner"])?)
            .json(&serde_json::json!({ "new_owner": new_owner }))
            .send()
            .await?
            .json()
            .await?;
        unwrap_response(resp)
    }

    pub async fn owned_by(&self, owner: &str) -> Result<Vec<OwnerReport>, ApiError> {
        let resp = self
            .client
            .get(self.url(&["owners", owner, "records"])?)
            .send()
            .await?
            .json()
            .await?;
        unwrap_response(resp)
    }
}

/// API response wrapper
#[derive(Deserialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub data: Option<T>,
    pub error: Option<String>,
}

/// Extract the payload of a response envelope
pub fn unwrap_response<T: DeserializeOwned>(resp: ApiResponse<T>) -> Result<T, ApiError> {
    if resp.success {
        resp.data.ok_or(ApiError::EmptyResponse)
    } else {
        Err(ApiError::Server(resp.error.unwrap_or_default()))
    }
}

#[derive(Serialize)]
struct CreateRecordRequest<'a> {
    key: &'a str,
    #[serde(flatten)]
    record: &'a PropertyRecord,
}

#[derive(Deserialize)]
struct SeedResponse {
    seeded: usize,
}

/// Node status
#[derive(Debug, Deserialize)]
pub struct NodeStatus {
    pub name: String,
    pub backend: String,
    pub height: u64,
    pub records: usize,
    pub committed_transactions: u64,
    pub rejected_transactions: u64,
    pub open_cursors: usize,
}

/// API Error
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Invalid node URL: {0}")]
    InvalidUrl(String),

    #[error("Server error: {0}")]
    Server(String),

    #[error("Empty response")]
    EmptyResponse,
}
