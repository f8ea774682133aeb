//! Optional overrides for a run (CLI flags or programmatic).
//!
//! Applied by [`RunConfig::apply_options`](super::RunConfig::apply_options); only set
//! fields override the env-based config.

/// Overrides for model, persistence and verbosity. All fields are optional.
#[derive(Clone, Debug, Default)]
pub struct RunOptions {
    /// Override the model name.
    pub model: Option<String>,
    /// Override the SQLite database path.
    pub db_path: Option<String>,
    /// Use the scripted offline gateway instead of a real model.
    pub offline: bool,
    /// Print node progress to stderr.
    pub verbose: bool,
}
