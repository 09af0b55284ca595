//! HTTP client for the monitor's API.

pub mod types;

use anyhow::{Context, Result};

use types::{CommandReply, CommandRequest, StatusReport, SummaryReport};

pub const DEFAULT_BASE_URL: &str = "http://127.0.0.1:7786";

pub struct Client {
    http: reqwest::Client,
    base_url: String,
}

impl Client {
    pub fn new() -> Self {
        Self::with_base_url(DEFAULT_BASE_URL)
    }

    pub fn with_base_url(base_url: impl Into<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}/api/v0{}", self.base_url, path)
    }

    pub async fn get_status(&self) -> Result<StatusReport> {
        self.get("/status").await
    }

    /// `period` is `day`, `week` or `month`.
    pub async fn get_summary(&self, period: &str) -> Result<SummaryReport> {
        self.get(&format!("/summary/{period}")).await
    }

    pub async fn send_command(&self, text: &str) -> Result<CommandReply> {
        let url = self.url("/command");
        let reply = self
            .http
            .post(&url)
            .json(&CommandRequest {
                text: text.to_string(),
            })
            .send()
            .await
            .with_context(|| format!("failed to reach {url}"))?
            .error_for_status()?
            .json()
            .await?;
        Ok(reply)
    }

    async fn get<T: serde::de::DeserializeOwned>(&self, path: &str) -> Result<T> {
        let url = self.url(path);
        let body = self
            .http
            .get(&url)
            .send()
            .await
            .with_context(|| format!("failed to reach {url}"))?
            .error_for_status()?
            .json()
            .await?;
        Ok(body)
    }
}

impl Default for Client {
    fn default() -> Self {
        Self::new()
    }
}
