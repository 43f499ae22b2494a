//! Copyright © 2025-2026 The Synx Authors. All Rights Reserved.
//!
//! This file is part of Synx.
//!
//! Licensed under the Apache License, Version 2.0 (the "License");
//! You may not use this file except in compliance with the License.
//! You may obtain a copy of the License at
//!
//!     http://www.apache.org/licenses/LICENSE-2.0
//!
//! Unless required by applicable law or agreed to in writing, software
//! distributed under the License is distributed on an "AS IS" BASIS,
//! WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
//! See the License for the specific language governing permissions and
//! limitations under the License.

//! # Synx LLM Client Module
//!
//! HTTP client for OpenAI-compatible chat-completion endpoints, used by the
//! in-process engine. Generated programs talk to the API through their own
//! client; this one serves the [`SynLLMProcessor`](crate::processor::SynLLMProcessor).

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::errors::{Result, SynError};

/// Default HTTP timeout for completion requests.
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// One message in a chat-completion exchange.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SynMessage {
    pub role: String,
    pub content: String,
}

/// Request body for `/chat/completions`.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SynCompletionRequest {
    pub model: String,
    pub messages: Vec<SynMessage>,
    pub temperature: f64,
}

/// One returned completion choice.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SynChoice {
    pub message: SynMessage,
}

/// Response body for `/chat/completions`.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SynCompletionResponse {
    pub choices: Vec<SynChoice>,
}

/// Client for an OpenAI-compatible LLM API.
#[derive(Clone, Debug)]
pub struct SynLLMClient {
    base_url: String,
    api_key: String,
    http: reqwest::Client,
    timeout: Duration,
}

impl SynLLMClient {
    /// Creates a client for the given endpoint and key.
    pub fn new(base_url: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            api_key: api_key.into(),
            http: reqwest::Client::new(),
            timeout: DEFAULT_TIMEOUT,
        }
    }

    /// Overrides the request timeout.
    pub fn set_timeout(&mut self, timeout: Duration) {
        self.timeout = timeout;
    }

    /// Requests a completion for the given prompts and returns the first
    /// choice's content.
    pub async fn generate_completion(
        &self,
        model: &str,
        system_prompt: &str,
        user_prompt: &str,
        temperature: f64,
    ) -> Result<String> {
        let url = format!("{}/chat/completions", self.base_url);

        let request = SynCompletionRequest {
            model: model.to_string(),
            messages: vec![
                SynMessage {
                    role: "system".to_string(),
                    content: system_prompt.to_string(),
                },
                SynMessage {
                    role: "user".to_string(),
                    content: user_prompt.to_string(),
                },
            ],
            temperature,
        };

        let response = self
            .http
            .post(&url)
            .json(&request)
            .bearer_auth(&self.api_key)
            .timeout(self.timeout)
            .send()
            .await
            .map_err(|err| SynError::client(format!("request failed: {}", err)))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(SynError::client(format!(
                "API returned non-200 status: {}, body: {}",
                status, body
            )));
        }

        let completion: SynCompletionResponse = response
            .json()
            .await
            .map_err(|err| SynError::client(format!("failed to decode response: {}", err)))?;

        completion
            .choices
            .first()
            .map(|choice| choice.message.content.clone())
            .ok_or_else(|| SynError::client("no choices in response"))
    }
}
