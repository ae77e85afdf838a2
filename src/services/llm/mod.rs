//! LLM collaborators module. All four LLM-shaped interactions (planner,
//! router, explanation, and semantic-summary generation in the profiler)
//! share the `LLMResult<T>` sum type in [`types`], built over the same
//! `chat_completion`-flavored HTTP pattern this codebase's other LLM client
//! uses - see `types::LlmHttpClient`.

mod explanation;
mod planner;
mod router_llm;
mod translation;
mod types;

pub use explanation::{Explainer, TemplatedExplainer};
pub use planner::{LlmPlanner, Planner};
pub use router_llm::{LlmTableRouter, RouterLlm, RouterSelection};
pub use translation::{IdentityTranslator, Translator};
pub use types::{LLMResult, LlmHttpClient};
