//! Workflow limits, TTLs and retry settings.
//!
//! Defaults match the documented contract; every value can be overridden with a
//! `CRAFTGRAPH_*` environment variable via [`WorkflowConfig::from_env`].

use std::time::Duration;

use thiserror::Error;

use crate::gateway::RetryPolicy;

#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    #[error("invalid value for {var}: {value:?}")]
    InvalidValue { var: String, value: String },
}

/// Tunables of one orchestrator.
#[derive(Debug, Clone, PartialEq)]
pub struct WorkflowConfig {
    /// Clarification questions per discovery phase.
    pub max_clarifications: u32,
    /// Times evaluation may send the workflow back to choice generation.
    pub max_choice_regenerations: u32,
    /// Re-invocations of a faulting node before the workflow errors out.
    pub max_node_retries: u32,
    /// Concept variants per run.
    pub variant_count: usize,
    /// Extra image iterations allowed beyond `variant_count`.
    pub image_iteration_slack: u32,
    pub retry_policy: RetryPolicy,
    pub checkpoint_ttl: Duration,
    /// TTL once the workflow is complete.
    pub completed_ttl: Duration,
    /// Long-poll ceiling for `wait_for_update`.
    pub poll_timeout: Duration,
    pub recursion_limit: usize,
}

impl Default for WorkflowConfig {
    fn default() -> Self {
        Self {
            max_clarifications: 3,
            max_choice_regenerations: 2,
            max_node_retries: 3,
            variant_count: 3,
            image_iteration_slack: 2,
            retry_policy: RetryPolicy::default(),
            checkpoint_ttl: Duration::from_secs(60 * 60),
            completed_ttl: Duration::from_secs(2 * 60 * 60),
            poll_timeout: Duration::from_secs(300),
            recursion_limit: crate::graph::DEFAULT_RECURSION_LIMIT,
        }
    }
}

fn parse_var<T: std::str::FromStr>(
    lookup: &impl Fn(&str) -> Option<String>,
    var: &str,
) -> Result<Option<T>, ConfigError> {
    match lookup(var) {
        None => Ok(None),
        Some(raw) if raw.trim().is_empty() => Ok(None),
        Some(raw) => raw
            .trim()
            .parse::<T>()
            .map(Some)
            .map_err(|_| ConfigError::InvalidValue {
                var: var.to_string(),
                value: raw,
            }),
    }
}

impl WorkflowConfig {
    /// Ceiling of `image_generate` iterations.
    pub fn image_iteration_ceiling(&self) -> u32 {
        self.variant_count as u32 + self.image_iteration_slack
    }

    /// Defaults overridden by `CRAFTGRAPH_*` environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|k| std::env::var(k).ok())
    }

    /// Defaults overridden by whatever `lookup` returns for each variable.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let mut config = Self::default();
        if let Some(v) = parse_var(&lookup, "CRAFTGRAPH_MAX_CLARIFICATIONS")? {
            config.max_clarifications = v;
        }
        if let Some(v) = parse_var(&lookup, "CRAFTGRAPH_MAX_CHOICE_REGENERATIONS")? {
            config.max_choice_regenerations = v;
        }
        if let Some(v) = parse_var(&lookup, "CRAFTGRAPH_MAX_NODE_RETRIES")? {
            config.max_node_retries = v;
        }
        if let Some(v) = parse_var(&lookup, "CRAFTGRAPH_MODEL_MAX_RETRIES")? {
            config.retry_policy.max_retries = v;
        }
        if let Some(ms) = parse_var::<u64>(&lookup, "CRAFTGRAPH_RETRY_BASE_MS")? {
            config.retry_policy.base_delay = Duration::from_millis(ms);
        }
        if let Some(ms) = parse_var::<u64>(&lookup, "CRAFTGRAPH_RETRY_MAX_MS")? {
            config.retry_policy.max_delay = Duration::from_millis(ms);
        }
        if let Some(secs) = parse_var::<u64>(&lookup, "CRAFTGRAPH_CHECKPOINT_TTL_SECS")? {
            config.checkpoint_ttl = Duration::from_secs(secs);
        }
        if let Some(secs) = parse_var::<u64>(&lookup, "CRAFTGRAPH_COMPLETED_TTL_SECS")? {
            config.completed_ttl = Duration::from_secs(secs);
        }
        if let Some(secs) = parse_var::<u64>(&lookup, "CRAFTGRAPH_POLL_TIMEOUT_SECS")? {
            config.poll_timeout = Duration::from_secs(secs);
        }
        if let Some(v) = parse_var(&lookup, "CRAFTGRAPH_RECURSION_LIMIT")? {
            config.recursion_limit = v;
        }
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    /// **Scenario**: Defaults carry the documented limits.
    #[test]
    fn defaults() {
        let c = WorkflowConfig::default();
        assert_eq!(c.max_clarifications, 3);
        assert_eq!(c.max_choice_regenerations, 2);
        assert_eq!(c.variant_count, 3);
        assert_eq!(c.image_iteration_ceiling(), 5);
        assert_eq!(c.checkpoint_ttl, Duration::from_secs(3600));
        assert_eq!(c.completed_ttl, Duration::from_secs(7200));
        assert_eq!(c.poll_timeout, Duration::from_secs(300));
        assert_eq!(c.retry_policy.max_retries, 3);
        assert_eq!(c.retry_policy.max_delay, Duration::from_secs(10));
    }

    /// **Scenario**: Variables override defaults; blanks are ignored.
    #[test]
    fn lookup_overrides() {
        let vars: HashMap<&str, &str> = HashMap::from([
            ("CRAFTGRAPH_MAX_CLARIFICATIONS", "5"),
            ("CRAFTGRAPH_RETRY_BASE_MS", "10"),
            ("CRAFTGRAPH_POLL_TIMEOUT_SECS", " "),
        ]);
        let c = WorkflowConfig::from_lookup(|k| vars.get(k).map(|v| v.to_string())).unwrap();
        assert_eq!(c.max_clarifications, 5);
        assert_eq!(c.retry_policy.base_delay, Duration::from_millis(10));
        assert_eq!(c.poll_timeout, Duration::from_secs(300));
    }

    /// **Scenario**: Unparseable values are reported with the variable name.
    #[test]
    fn invalid_value_is_an_error() {
        let err = WorkflowConfig::from_lookup(|k| {
            (k == "CRAFTGRAPH_RECURSION_LIMIT").then(|| "lots".to_string())
        })
        .unwrap_err();
        assert_eq!(
            err,
            ConfigError::InvalidValue {
                var: "CRAFTGRAPH_RECURSION_LIMIT".into(),
                value: "lots".into()
            }
        );
    }
}
