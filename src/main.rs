use axum::extract::State;
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use thara_engine::services::catalog::{CatalogError, ColumnInfo, SqlCatalog, TabularResult};
use thara_engine::utils::{ScheduledExecutor, ScheduledTask};
use thara_engine::{AppState, Config, ProfileStore, QueryError};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

#[derive(Debug, Deserialize)]
struct QueryRequest {
    #[serde(default)]
    session_id: Option<String>,
    question: String,
}

#[derive(Debug, Serialize)]
struct QueryResponse {
    session_id: String,
    answer: String,
    table_used: Option<String>,
    sql: Vec<String>,
    routing_confidence: f64,
    was_followup: bool,
}

async fn health() -> impl IntoResponse {
    Json(serde_json::json!({"status": "ok"}))
}

async fn ready(State(state): State<AppState>) -> impl IntoResponse {
    let tables = state.profile_store.names().len();
    Json(serde_json::json!({"status": "ready", "profiled_tables": tables}))
}

async fn query(State(state): State<AppState>, Json(request): Json<QueryRequest>) -> Result<Json<QueryResponse>, QueryError> {
    // A fresh browser tab has no session yet; mint one the way the teacher's
    // own session table does, instead of rejecting the request.
    let session_id = match request.session_id {
        Some(id) if !id.trim().is_empty() => id,
        _ => uuid::Uuid::new_v4().to_string(),
    };
    let response = state.pipeline.handle(&session_id, &request.question).await?;
    Ok(Json(QueryResponse {
        session_id,
        answer: response.answer,
        table_used: response.table_used,
        sql: response.sql,
        routing_confidence: response.routing_confidence,
        was_followup: response.was_followup,
    }))
}

/// No live engine is wired up by default (§2's data-source adapters are out
/// of scope beyond the trait boundary); this reports every table as missing
/// so the server is honest about having no rows to serve rather than
/// pretending to be a working catalog.
struct UnconfiguredCatalog;

#[async_trait::async_trait]
impl SqlCatalog for UnconfiguredCatalog {
    async fn list_tables(&self) -> Result<Vec<String>, CatalogError> {
        Ok(Vec::new())
    }

    async fn describe(&self, table: &str) -> Result<Vec<ColumnInfo>, CatalogError> {
        Err(CatalogError::TableNotFound(table.to_string()))
    }

    async fn query(&self, _sql: &str) -> Result<TabularResult, CatalogError> {
        Ok(TabularResult::default())
    }
}

/// §5's profiling fan-out runs at load time; this task keeps the on-disk
/// snapshot and in-memory `ProfileStore` reconciled on an interval rather
/// than only on process start.
struct ProfileRefreshTask {
    profile_store: ProfileStore,
}

impl ScheduledTask for ProfileRefreshTask {
    fn run(&self) -> std::pin::Pin<Box<dyn std::future::Future<Output = Result<(), anyhow::Error>> + Send + '_>> {
        Box::pin(async move {
            self.profile_store.load()?;
            tracing::debug!(tables = self.profile_store.names().len(), "profile store reloaded from snapshot");
            Ok(())
        })
    }
}

fn init_tracing(config: &Config) {
    let log_filter = tracing_subscriber::EnvFilter::new(&config.logging.level);
    let registry = tracing_subscriber::registry().with(log_filter);

    if let Some(log_file) = &config.logging.file {
        let log_path = std::path::Path::new(log_file);
        if let Some(parent) = log_path.parent() {
            let _ = std::fs::create_dir_all(parent);
        }

        let log_dir = log_path.parent().and_then(|p| p.to_str()).unwrap_or("logs");
        let file_name = log_path.file_name().and_then(|n| n.to_str()).unwrap_or("thara-engine.log");
        let file_prefix = file_name.strip_suffix(".log").unwrap_or(file_name);

        let file_appender = tracing_appender::rolling::daily(log_dir, file_prefix);
        let (non_blocking, _guard) = tracing_appender::non_blocking(file_appender);
        // Leaking the guard keeps the non-blocking writer alive for the
        // process lifetime; this process never tears the subscriber down.
        std::mem::forget(_guard);
        registry.with(tracing_subscriber::fmt::layer().with_writer(non_blocking)).with(tracing_subscriber::fmt::layer()).init();
    } else {
        registry.with(tracing_subscriber::fmt::layer()).init();
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let _ = dotenvy::dotenv();
    let config = Config::load()?;
    init_tracing(&config);

    tracing::info!("thara-engine starting up");
    tracing::info!("configuration loaded successfully");

    let profile_store = ProfileStore::new(&config.profile_store.path);
    if let Err(err) = profile_store.load() {
        tracing::warn!(%err, "no existing profile snapshot loaded, starting with an empty store");
    }
    tracing::info!(tables = profile_store.names().len(), "profile store ready");

    let catalog: Arc<dyn SqlCatalog> = Arc::new(UnconfiguredCatalog);

    let app_state = AppState::new(config.clone(), profile_store.clone(), catalog);

    let refresh_interval = std::time::Duration::from_secs(300);
    let executor = ScheduledExecutor::new("profile-refresh", refresh_interval);
    let refresh_task = Arc::new(ProfileRefreshTask { profile_store: profile_store.clone() });
    tokio::spawn(executor.start(refresh_task));

    let app = Router::new()
        .route("/healthz", get(health))
        .route("/readyz", get(ready))
        .route("/api/query", post(query))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(app_state);

    let addr = format!("{}:{}", config.server.host, config.server.port);
    tracing::info!(%addr, "listening");
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
