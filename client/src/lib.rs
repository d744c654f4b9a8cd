#![cfg_attr(test, allow(clippy::unwrap_used, clippy::expect_used))]

pub mod cache;
pub mod editor;
pub mod service;
pub mod transport;

pub use editor::{EditorError, ImageEditor, ListEditor, ValueEditor};
pub use service::{DataService, DataServiceConfig};
pub use transport::Transport;

use anyhow::Result;
use async_trait::async_trait;
use reqwest::{Client as ReqwestClient, Response};
use shared_types::{
    ContentKey, DataEnvelope, ErrorResponse, LeadResponse, PostDataRequest, UploadResponse,
};
use std::collections::HashMap;
use std::time::Duration;
use tracing::warn;

/// Header carrying the admin token on write requests.
pub const ADMIN_TOKEN_HEADER: &str = "x-admin-token";

/// HTTP client for the site content gateway
pub struct ContentClient {
    client: ReqwestClient,
    base_url: String,
    admin_token: Option<String>,
}

impl ContentClient {
    /// Create a new client instance
    pub fn new(base_url: impl Into<String>) -> Result<Self> {
        let client = ReqwestClient::builder()
            .timeout(Duration::from_secs(30))
            .build()?;

        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            admin_token: None,
        })
    }

    /// Send `token` with every write request
    #[must_use]
    pub fn with_admin_token(mut self, token: impl Into<String>) -> Self {
        self.admin_token = Some(token.into());
        self
    }

    fn authorized(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match &self.admin_token {
            Some(token) => request.header(ADMIN_TOKEN_HEADER, token),
            None => request,
        }
    }

    /// Get the current value of a content key
    pub async fn get_data(&self, key: ContentKey) -> Result<serde_json::Value> {
        let url = format!("{}/data", self.base_url);

        let response = self
            .client
            .get(&url)
            .query(&[("key", key.as_str())])
            .send()
            .await?;

        let envelope: DataEnvelope<serde_json::Value> = check(response).await?.json().await?;
        Ok(envelope.data)
    }

    /// Get several content keys in one round trip
    pub async fn get_many(
        &self,
        keys: &[ContentKey],
    ) -> Result<HashMap<ContentKey, serde_json::Value>> {
        let url = format!("{}/data", self.base_url);
        let joined = keys
            .iter()
            .map(|key| key.as_str())
            .collect::<Vec<_>>()
            .join(",");

        let response = self
            .client
            .get(&url)
            .query(&[("keys", joined)])
            .send()
            .await?;

        let envelope: DataEnvelope<HashMap<String, serde_json::Value>> =
            check(response).await?.json().await?;

        let mut values = HashMap::with_capacity(envelope.data.len());
        for (raw, value) in envelope.data {
            match raw.parse::<ContentKey>() {
                Ok(key) => {
                    values.insert(key, value);
                }
                Err(e) => warn!("Ignoring {}", e),
            }
        }
        Ok(values)
    }

    /// Replace the value of a content key
    pub async fn put_data(&self, key: ContentKey, data: &serde_json::Value) -> Result<()> {
        let url = format!("{}/data", self.base_url);

        let body = PostDataRequest {
            key: Some(key.as_str().to_string()),
            data: Some(data.clone()),
        };

        let response = self
            .authorized(self.client.post(&url))
            .json(&body)
            .send()
            .await?;

        check(response).await?;
        Ok(())
    }

    /// Upload a file and get back its inline `data:` URI
    pub async fn upload(&self, file_name: &str, mime: &str, bytes: Vec<u8>) -> Result<String> {
        let url = format!("{}/upload", self.base_url);

        let part = reqwest::multipart::Part::bytes(bytes)
            .file_name(file_name.to_string())
            .mime_str(mime)?;
        let form = reqwest::multipart::Form::new().part("file", part);

        let response = self
            .authorized(self.client.post(&url))
            .multipart(form)
            .send()
            .await?;

        let uploaded: UploadResponse = check(response).await?.json().await?;
        Ok(uploaded.url)
    }

    /// Submit a lead capture form (`contact`, `booking` or `enquiry`)
    pub async fn submit_lead(&self, form: &str, fields: &serde_json::Value) -> Result<String> {
        let url = format!("{}/leads/{}", self.base_url, form);

        let response = self.client.post(&url).json(fields).send().await?;

        let lead: LeadResponse = check(response).await?.json().await?;
        Ok(lead.id)
    }

    /// Check if the service is healthy
    pub async fn health_check(&self) -> Result<bool> {
        let url = format!("{}/health", self.base_url);

        let response = self.client.get(&url).send().await?;

        Ok(response.status().is_success())
    }
}

/// Turn a non-2xx response into an error carrying the gateway's message.
async fn check(response: Response) -> Result<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let message = match response.json::<ErrorResponse>().await {
        Ok(body) => body.error,
        Err(_) => status
            .canonical_reason()
            .unwrap_or("request failed")
            .to_string(),
    };
    anyhow::bail!("{}: {}", status.as_u16(), message)
}

#[async_trait]
impl Transport for ContentClient {
    async fn fetch(&self, key: ContentKey) -> Result<serde_json::Value> {
        self.get_data(key).await
    }

    async fn fetch_batch(
        &self,
        keys: &[ContentKey],
    ) -> Result<HashMap<ContentKey, serde_json::Value>> {
        self.get_many(keys).await
    }

    async fn store(&self, key: ContentKey, data: &serde_json::Value) -> Result<()> {
        self.put_data(key, data).await
    }
}
