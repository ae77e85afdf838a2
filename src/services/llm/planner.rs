//! C4: the planner is a black-box LLM call; the core owns only the prompt
//! scaffold, timeout, JSON parse, and retry-on-malformed-JSON policy.

use super::types::{LLMResult, LlmHttpClient};
use async_trait::async_trait;
use serde_json::Value;
use std::time::Duration;

#[async_trait]
pub trait Planner: Send + Sync {
    async fn plan(&self, question: &str, table_schema_text: &str) -> LLMResult<Value>;
}

pub struct LlmPlanner {
    client: LlmHttpClient,
}

impl LlmPlanner {
    pub fn new(endpoint: Option<String>, api_key: Option<String>, timeout: Duration) -> Self {
        Self { client: LlmHttpClient::new(endpoint, api_key, timeout) }
    }

    const SYSTEM_PROMPT: &'static str = "Translate the question into a JSON query plan. \
        query_type must be one of: metric, lookup, filter, extrema_lookup, rank, list, \
        aggregation_on_subset, comparison, percentage, trend. Respond with JSON only.";
}

#[async_trait]
impl Planner for LlmPlanner {
    /// A malformed first response is retried once with an amended prompt
    /// demanding strict JSON; a second malformed response or any timeout is
    /// surfaced as-is rather than looped further (§4.4).
    async fn plan(&self, question: &str, table_schema_text: &str) -> LLMResult<Value> {
        let user_prompt = format!("Question: {question}\nSchema:\n{table_schema_text}");
        match self.client.complete::<Value>(Self::SYSTEM_PROMPT, &user_prompt).await {
            LLMResult::MalformedOutput(_) => {
                let amended = format!(
                    "{}\n\nYour previous response was not valid JSON. Respond with strict JSON and nothing else.",
                    Self::SYSTEM_PROMPT
                );
                self.client.complete::<Value>(&amended, &user_prompt).await
            },
            other => other,
        }
    }
}
