//! Thara analytics engine library.
//!
//! This library contains the query pipeline: profile store, entity
//! extractor, table router, planner/plan-validator/SQL-compiler, the
//! self-healing executor, the advanced analytical operators, conversation
//! context, and the dialogue gate that fronts all of it.

use std::sync::Arc;

pub mod config;
pub mod error;
pub mod models;
pub mod services;
pub mod utils;

pub use config::Config;
pub use error::{QueryError, QueryResult};
pub use services::{
    ConversationContext, DialogueGate, EntityExtractor, GateOutcome, PipelineResponse,
    PlanValidator, ProfileStore, QueryHealer, QueryPipeline, SqlCatalog, SqlCompiler,
    TableProfiler, TableRouter,
};
use services::llm::{Explainer, IdentityTranslator, LlmPlanner, LlmTableRouter, Planner, TemplatedExplainer, Translator};

/// Everything a request needs to run the full C10->C2->C9->C3->C4->C5->C6/C8->C7
/// path, assembled once at startup and shared behind `Arc` across requests.
///
/// Design philosophy: keep it simple - Rust's type system IS our DI container.
/// All collaborators are wrapped in `Arc` for cheap cloning and thread safety.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub profile_store: ProfileStore,
    pub pipeline: Arc<QueryPipeline>,
}

impl AppState {
    /// Wires the engine's collaborators from config, following §6.2's "LLM
    /// as a typed call" pattern - planner, router selection, and explanation
    /// each get their own endpoint/timeout, with an absent endpoint treated
    /// as a always-fallback transport error rather than a startup failure
    /// (the engine must still work against pure rule-based routing and a
    /// templated explainer with no LLM configured at all).
    pub fn new(config: Config, profile_store: ProfileStore, catalog: Arc<dyn SqlCatalog>) -> Self {
        let config = Arc::new(config);

        let planner: Arc<dyn Planner> = Arc::new(LlmPlanner::new(
            config.llm.planner_endpoint.clone(),
            config.llm.api_key.clone(),
            std::time::Duration::from_secs(config.llm.planner_timeout_secs),
        ));

        let router_llm = config.llm.use_llm_table_selection.then(|| {
            Arc::new(LlmTableRouter::new(
                config.llm.router_endpoint.clone(),
                config.llm.api_key.clone(),
                std::time::Duration::from_secs(config.llm.router_timeout_secs),
            )) as Arc<dyn services::llm::RouterLlm>
        });

        let router = TableRouter::new(profile_store.clone(), router_llm, config.llm.use_llm_table_selection);
        let extractor = EntityExtractor::new();
        extractor.refresh_from_profiles(&profile_store.get_all());

        let conversation = ConversationContext::new(config.conversation.max_turns);
        let explainer: Arc<dyn Explainer> = Arc::new(TemplatedExplainer);
        let translator: Arc<dyn Translator> = Arc::new(IdentityTranslator);

        let pipeline = Arc::new(QueryPipeline::new(
            extractor,
            conversation,
            profile_store.clone(),
            router,
            planner,
            catalog,
            explainer,
            translator,
            config.healer.max_retries,
        ));

        Self { config, profile_store, pipeline }
    }
}
