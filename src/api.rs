use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::chat::ChatBackend;
use crate::portfolio::PortfolioData;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("server responded with status {0}")]
    Status(StatusCode),
    #[error("could not decode response body: {0}")]
    Decode(#[from] serde_json::Error),
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    message: &'a str,
}

#[derive(Deserialize)]
struct ChatResponse {
    response: String,
}

/// Client for the portfolio backend
#[derive(Clone)]
pub struct ApiClient {
    client: Client,
    base_url: String,
}

impl ApiClient {
    pub fn new(base_url: &str) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub async fn portfolio(&self) -> Result<PortfolioData, ApiError> {
        let url = format!("{}/api/portfolio", self.base_url);

        let response = self.client.get(&url).send().await?;

        if !response.status().is_success() {
            return Err(ApiError::Status(response.status()));
        }

        let body = response.bytes().await?;
        Ok(serde_json::from_slice(&body)?)
    }

    pub async fn chat(&self, message: &str) -> Result<String, ApiError> {
        let url = format!("{}/api/chat", self.base_url);

        let response = self
            .client
            .post(&url)
            .json(&ChatRequest { message })
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(ApiError::Status(response.status()));
        }

        let body = response.bytes().await?;
        let chat_response: ChatResponse = serde_json::from_slice(&body)?;
        Ok(chat_response.response)
    }

    /// Download URL for an experience report, keyed by the last path segment
    pub fn report_url(&self, report: &str) -> String {
        format!("{}/api/reports/{}", self.base_url, report_filename(report))
    }
}

#[async_trait]
impl ChatBackend for ApiClient {
    async fn chat(&self, message: &str) -> Result<String, ApiError> {
        ApiClient::chat(self, message).await
    }
}

pub fn report_filename(report: &str) -> &str {
    report.rsplit('/').next().unwrap_or(report)
}
