//! Run config: model endpoint, persistence and workflow limits. Filled from env / .env.
//!
//! Interacts with [`RunOptions`](super::RunOptions) and
//! [`build_orchestrator`](crate::build_orchestrator).

use craftgraph::WorkflowConfig;

/// Error type used for config loading and runs.
pub type Error = Box<dyn std::error::Error + Send + Sync>;

/// Default SQLite file for threads when `DB_PATH` is not set.
pub const DEFAULT_DB_PATH: &str = "craftgraph.db";

/// Run config: model endpoint, persistence and workflow limits.
#[derive(Clone, Debug)]
pub struct RunConfig {
    /// OpenAI-compatible API base URL, e.g. `https://api.openai.com/v1`.
    pub api_base: String,
    /// API key. Required unless `offline` is set.
    pub api_key: Option<String>,
    /// Model name, e.g. `gpt-4o-mini`.
    pub model: String,
    /// SQLite database path for thread checkpoints.
    pub db_path: String,
    /// When true, every model call is answered by the offline fallbacks.
    pub offline: bool,
    /// When true, node enter/exit lines are printed to stderr.
    pub verbose: bool,
    /// Workflow limits (`CRAFTGRAPH_*` variables).
    pub workflow: WorkflowConfig,
}

impl RunConfig {
    /// Fill config from process env. Call `dotenv::dotenv().ok()` first to pick up `.env`.
    ///
    /// `OPENAI_API_KEY` is required unless `CRAFTGRAPH_OFFLINE` is `1`/`true`;
    /// `OPENAI_API_BASE`, `OPENAI_MODEL` and `DB_PATH` have defaults.
    pub fn from_env() -> Result<Self, Error> {
        Self::from_lookup(|k| std::env::var(k).ok())
    }

    /// Same as [`RunConfig::from_env`] over an arbitrary variable source.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, Error> {
        let offline = lookup("CRAFTGRAPH_OFFLINE")
            .map(|v| matches!(v.trim(), "1" | "true" | "yes"))
            .unwrap_or(false);
        let api_key = lookup("OPENAI_API_KEY").filter(|k| !k.trim().is_empty());
        if api_key.is_none() && !offline {
            return Err("OPENAI_API_KEY is not set; configure it in .env or pass --offline".into());
        }
        let api_base =
            lookup("OPENAI_API_BASE").unwrap_or_else(|| "https://api.openai.com/v1".to_string());
        let model = lookup("OPENAI_MODEL").unwrap_or_else(|| "gpt-4o-mini".to_string());
        let db_path = lookup("DB_PATH").unwrap_or_else(|| DEFAULT_DB_PATH.to_string());
        let workflow = WorkflowConfig::from_lookup(&lookup)?;
        Ok(Self {
            api_base,
            api_key,
            model,
            db_path,
            offline,
            verbose: false,
            workflow,
        })
    }

    /// Apply the set fields of `options`.
    pub fn apply_options(&mut self, options: &super::RunOptions) {
        if let Some(model) = &options.model {
            self.model = model.clone();
        }
        if let Some(path) = &options.db_path {
            self.db_path = path.clone();
        }
        if options.offline {
            self.offline = true;
        }
        self.verbose = options.verbose;
    }

    /// Env config with `options` applied. A missing API key is fine when `options.offline`.
    pub fn load(options: &super::RunOptions) -> Result<Self, Error> {
        let offline = options.offline;
        let mut config = Self::from_lookup(|k| {
            if offline && k == "CRAFTGRAPH_OFFLINE" {
                Some("1".to_string())
            } else {
                std::env::var(k).ok()
            }
        })?;
        config.apply_options(options);
        Ok(config)
    }
}
