use async_trait::async_trait;
use serde_json::Value;

use super::{SampleSource, SourceError};

/// Polls a JSON status endpoint and reads a boolean at a JSON pointer.
pub struct HttpSampleSource {
    client: reqwest::Client,
    url: String,
    pointer: String,
    token: Option<String>,
}

impl HttpSampleSource {
    pub fn new(url: impl Into<String>, pointer: impl Into<String>, token: Option<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            url: url.into(),
            pointer: pointer.into(),
            token,
        }
    }
}

#[async_trait]
impl SampleSource for HttpSampleSource {
    async fn poll(&self) -> Result<bool, SourceError> {
        let mut request = self.client.get(&self.url);
        if let Some(token) = &self.token {
            request = request.bearer_auth(token);
        }

        let response = request.send().await?;
        if !response.status().is_success() {
            return Err(SourceError::Status(response.status()));
        }

        let body: Value = response.json().await?;
        read_flag(&body, &self.pointer)
    }
}

fn read_flag(body: &Value, pointer: &str) -> Result<bool, SourceError> {
    body.pointer(pointer)
        .and_then(Value::as_bool)
        .ok_or_else(|| SourceError::MissingField {
            pointer: pointer.to_string(),
        })
}
