//! §4.3 step 3: LLM semantic table selection, preferred over rule-based
//! scoring when available and confident.

use super::types::{LLMResult, LlmHttpClient};
use async_trait::async_trait;
use serde::Deserialize;
use std::time::Duration;

#[derive(Debug, Clone, Deserialize)]
pub struct RouterSelection {
    pub selected_table: String,
    pub confidence: f64,
    #[serde(default)]
    pub reason: String,
    #[serde(default)]
    pub alternative: Option<String>,
}

#[async_trait]
pub trait RouterLlm: Send + Sync {
    async fn select_table(&self, question: &str, table_context_text: &str) -> LLMResult<RouterSelection>;
}

pub struct LlmTableRouter {
    client: LlmHttpClient,
}

impl LlmTableRouter {
    pub fn new(endpoint: Option<String>, api_key: Option<String>, timeout: Duration) -> Self {
        Self { client: LlmHttpClient::new(endpoint, api_key, timeout) }
    }

    const SYSTEM_PROMPT: &'static str = "Choose the single best table for this question from the \
        provided table contexts. Never choose a partial/summary table (names containing top_, \
        summary, or calculation) when the question asks for a count or an across-all total and a \
        complete table exists. Respond with JSON: {selected_table, confidence, reason, alternative?}.";
}

#[async_trait]
impl RouterLlm for LlmTableRouter {
    async fn select_table(&self, question: &str, table_context_text: &str) -> LLMResult<RouterSelection> {
        let user_prompt = format!("Question: {question}\n\nTables:\n{table_context_text}");
        self.client.complete::<RouterSelection>(Self::SYSTEM_PROMPT, &user_prompt).await
    }
}
