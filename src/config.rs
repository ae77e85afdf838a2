use clap::Parser;
use serde::Deserialize;
use std::fs;
use std::path::Path;

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct Config {
    pub server: ServerConfig,
    pub logging: LoggingConfig,
    pub profile_store: ProfileStoreConfig,
    pub llm: LlmConfig,
    pub healer: HealerConfig,
    pub conversation: ConversationConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self { host: "0.0.0.0".to_string(), port: 8080 }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
    pub file: Option<String>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self { level: "info,thara_engine=debug".to_string(), file: Some("logs/thara-engine.log".to_string()) }
    }
}

/// §4.1 / §9: the profile store persists to one JSON document, plus the
/// §5 worker pool size used for the profiling fan-out.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ProfileStoreConfig {
    pub path: String,
    pub profiling_worker_pool_size: usize,
}

impl Default for ProfileStoreConfig {
    fn default() -> Self {
        Self { path: "data/table_profiles.json".to_string(), profiling_worker_pool_size: 5 }
    }
}

/// §6.2: timeouts for the planner, router-selection, explanation, and
/// semantic-summary LLM calls. Each is an independent wall-clock budget.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LlmConfig {
    pub planner_endpoint: Option<String>,
    pub router_endpoint: Option<String>,
    pub explanation_endpoint: Option<String>,
    pub api_key: Option<String>,
    pub planner_timeout_secs: u64,
    pub router_timeout_secs: u64,
    pub explanation_timeout_secs: u64,
    pub summary_timeout_secs: u64,
    /// §4.3: disable LLM-based table selection and use only rule-based scoring.
    pub use_llm_table_selection: bool,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            planner_endpoint: None,
            router_endpoint: None,
            explanation_endpoint: None,
            api_key: None,
            planner_timeout_secs: 20,
            router_timeout_secs: 8,
            explanation_timeout_secs: 15,
            summary_timeout_secs: 10,
            use_llm_table_selection: true,
        }
    }
}

/// §4.7: bounded retries for the self-healing executor.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct HealerConfig {
    pub max_retries: u32,
}

impl Default for HealerConfig {
    fn default() -> Self {
        Self { max_retries: 3 }
    }
}

/// §4.9: bounded per-session turn ring.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ConversationConfig {
    pub max_turns: usize,
    pub session_ttl_hours: i64,
}

impl Default for ConversationConfig {
    fn default() -> Self {
        Self { max_turns: 20, session_ttl_hours: 24 }
    }
}

/// Command line arguments for configuration overrides.
#[derive(Parser, Debug, Clone)]
#[command(name = "thara-engine")]
#[command(version, about = "Thara - Natural-language analytics engine over tabular data")]
pub struct CommandLineArgs {
    /// Path to configuration file
    #[arg(long, value_name = "PATH")]
    pub config: Option<String>,

    /// Server host (overrides config file)
    #[arg(long, value_name = "HOST")]
    pub server_host: Option<String>,

    /// Server port (overrides config file)
    #[arg(long, value_name = "PORT")]
    pub server_port: Option<u16>,

    /// Logging level (overrides config file, e.g., "info,thara_engine=debug")
    #[arg(long, value_name = "LEVEL")]
    pub log_level: Option<String>,

    /// Profile store snapshot path (overrides config file)
    #[arg(long, value_name = "PATH")]
    pub profile_store_path: Option<String>,

    /// Bounded worker pool size for table profiling fan-out (overrides config file)
    #[arg(long, value_name = "N")]
    pub profiling_worker_pool_size: Option<usize>,

    /// Maximum query-healing retries (overrides config file)
    #[arg(long, value_name = "N")]
    pub healer_max_retries: Option<u32>,

    /// Disable LLM-based table selection, using only rule-based scoring
    #[arg(long)]
    pub no_llm_routing: bool,
}

impl Config {
    /// Loading order (priority from highest to lowest):
    /// 1. Command line arguments
    /// 2. Environment variables (prefixed with APP_)
    /// 3. Configuration file (config.toml)
    /// 4. Default values
    pub fn load() -> Result<Self, anyhow::Error> {
        let cli_args = CommandLineArgs::parse();

        let config_path = cli_args.config.clone().or_else(Self::find_config_file);
        let mut config = if let Some(config_path) = config_path {
            Self::from_toml(&config_path)?
        } else {
            tracing::warn!("Configuration file not found, using defaults");
            Config::default()
        };

        config.apply_env_overrides();
        config.apply_cli_overrides(&cli_args);
        config.validate()?;

        Ok(config)
    }

    /// Supported environment variables:
    /// - APP_SERVER_HOST, APP_SERVER_PORT
    /// - APP_LOG_LEVEL
    /// - APP_PROFILE_STORE_PATH
    /// - APP_PROFILING_WORKER_POOL_SIZE
    /// - APP_HEALER_MAX_RETRIES
    /// - APP_LLM_PLANNER_ENDPOINT, APP_LLM_ROUTER_ENDPOINT, APP_LLM_EXPLANATION_ENDPOINT, APP_LLM_API_KEY
    fn apply_env_overrides(&mut self) {
        if let Ok(host) = std::env::var("APP_SERVER_HOST") {
            self.server.host = host;
        }
        if let Ok(port) = std::env::var("APP_SERVER_PORT")
            && let Ok(port) = port.parse()
        {
            self.server.port = port;
        }
        if let Ok(level) = std::env::var("APP_LOG_LEVEL") {
            self.logging.level = level;
        }
        if let Ok(path) = std::env::var("APP_PROFILE_STORE_PATH") {
            self.profile_store.path = path;
        }
        if let Ok(n) = std::env::var("APP_PROFILING_WORKER_POOL_SIZE")
            && let Ok(n) = n.parse()
        {
            self.profile_store.profiling_worker_pool_size = n;
        }
        if let Ok(n) = std::env::var("APP_HEALER_MAX_RETRIES")
            && let Ok(n) = n.parse()
        {
            self.healer.max_retries = n;
        }
        if let Ok(endpoint) = std::env::var("APP_LLM_PLANNER_ENDPOINT") {
            self.llm.planner_endpoint = Some(endpoint);
        }
        if let Ok(endpoint) = std::env::var("APP_LLM_ROUTER_ENDPOINT") {
            self.llm.router_endpoint = Some(endpoint);
        }
        if let Ok(endpoint) = std::env::var("APP_LLM_EXPLANATION_ENDPOINT") {
            self.llm.explanation_endpoint = Some(endpoint);
        }
        if let Ok(key) = std::env::var("APP_LLM_API_KEY") {
            self.llm.api_key = Some(key);
        }
    }

    fn apply_cli_overrides(&mut self, args: &CommandLineArgs) {
        if let Some(host) = &args.server_host {
            self.server.host = host.clone();
        }
        if let Some(port) = args.server_port {
            self.server.port = port;
        }
        if let Some(level) = &args.log_level {
            self.logging.level = level.clone();
        }
        if let Some(path) = &args.profile_store_path {
            self.profile_store.path = path.clone();
        }
        if let Some(n) = args.profiling_worker_pool_size {
            self.profile_store.profiling_worker_pool_size = n;
        }
        if let Some(n) = args.healer_max_retries {
            self.healer.max_retries = n;
        }
        if args.no_llm_routing {
            self.llm.use_llm_table_selection = false;
        }
    }

    fn validate(&self) -> Result<(), anyhow::Error> {
        if self.server.port == 0 {
            anyhow::bail!("Server port cannot be 0");
        }
        if self.profile_store.profiling_worker_pool_size == 0 {
            anyhow::bail!("profile_store.profiling_worker_pool_size must be > 0");
        }
        if self.healer.max_retries == 0 {
            anyhow::bail!("healer.max_retries must be > 0");
        }
        if self.profile_store.path.is_empty() {
            anyhow::bail!("profile_store.path cannot be empty");
        }
        Ok(())
    }

    fn find_config_file() -> Option<String> {
        let possible_paths = ["conf/config.toml", "config.toml", "./conf/config.toml", "./config.toml"];
        for path in &possible_paths {
            if Path::new(path).exists() {
                return Some(path.to_string());
            }
        }
        None
    }

    fn from_toml(path: &str) -> Result<Self, anyhow::Error> {
        let content = fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_pass_validation() {
        let config = Config::default();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn rejects_zero_worker_pool() {
        let mut config = Config::default();
        config.profile_store.profiling_worker_pool_size = 0;
        assert!(config.validate().is_err());
    }
}
