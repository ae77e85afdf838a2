//! Sum-type result shared by every LLM-shaped collaborator (§6.2/§9), built
//! on top of the `chat_completion`-style HTTP client this codebase already
//! uses for its LLM integrations.

use std::time::Duration;

#[derive(Debug, Clone)]
pub enum LLMResult<T> {
    Ok(T),
    MalformedOutput(String),
    Timeout(Duration),
    TransportError(String),
}

impl<T> LLMResult<T> {
    pub fn is_ok(&self) -> bool {
        matches!(self, LLMResult::Ok(_))
    }

    pub fn ok(self) -> Option<T> {
        match self {
            LLMResult::Ok(v) => Some(v),
            _ => None,
        }
    }
}

/// Thin reqwest-backed client shared by the planner, router-selection, and
/// explanation collaborators, mirroring this codebase's `LLMClient`.
pub struct LlmHttpClient {
    http: reqwest::Client,
    endpoint: Option<String>,
    api_key: Option<String>,
}

impl LlmHttpClient {
    pub fn new(endpoint: Option<String>, api_key: Option<String>, timeout: Duration) -> Self {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .expect("failed to build LLM http client");
        Self { http, endpoint, api_key }
    }

    /// Sends `{system_prompt, user_prompt}` as a single JSON chat-completion
    /// style request and parses the response body as `T`. Returns
    /// `TransportError` if no endpoint is configured (treated the same as a
    /// network failure by callers, who must have a non-LLM fallback).
    pub async fn complete<T: serde::de::DeserializeOwned>(
        &self,
        system_prompt: &str,
        user_prompt: &str,
    ) -> LLMResult<T> {
        let Some(endpoint) = &self.endpoint else {
            return LLMResult::TransportError("no LLM endpoint configured".to_string());
        };

        let mut request = self.http.post(endpoint).json(&serde_json::json!({
            "system_prompt": system_prompt,
            "user_prompt": user_prompt,
            "response_format": "json",
        }));
        if let Some(key) = &self.api_key {
            request = request.header("Authorization", format!("Bearer {key}"));
        }

        let response = match request.send().await {
            Ok(r) => r,
            Err(e) if e.is_timeout() => {
                return LLMResult::Timeout(Duration::from_secs(0));
            },
            Err(e) => return LLMResult::TransportError(e.to_string()),
        };

        if !response.status().is_success() {
            return LLMResult::TransportError(format!("LLM endpoint returned {}", response.status()));
        }

        let text = match response.text().await {
            Ok(t) => t,
            Err(e) => return LLMResult::TransportError(e.to_string()),
        };

        match serde_json::from_str::<T>(&text) {
            Ok(v) => LLMResult::Ok(v),
            Err(e) => LLMResult::MalformedOutput(format!("{e}: {text}")),
        }
    }
}
