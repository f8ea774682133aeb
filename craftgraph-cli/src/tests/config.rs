//! Unit tests for [`RunConfig`](crate::config::RunConfig).
//!
//! Scenarios: from_lookup with/without OPENAI_API_KEY, offline mode, overrides.

use std::collections::HashMap;

use crate::config::{RunConfig, RunOptions, DEFAULT_DB_PATH};

fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
    let map: HashMap<String, String> = vars
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();
    move |k| map.get(k).cloned()
}

/// **Scenario**: Without OPENAI_API_KEY and not offline, loading fails and names the variable.
#[test]
fn from_lookup_fails_when_api_key_is_missing() {
    let err = RunConfig::from_lookup(lookup(&[])).unwrap_err();
    assert!(err.to_string().contains("OPENAI_API_KEY"), "{}", err);
}

/// **Scenario**: With only the API key set, base URL, model and DB path take their defaults.
#[test]
fn from_lookup_fills_defaults() {
    let config = RunConfig::from_lookup(lookup(&[("OPENAI_API_KEY", "sk-test")])).unwrap();
    assert_eq!(config.api_key.as_deref(), Some("sk-test"));
    assert_eq!(config.api_base, "https://api.openai.com/v1");
    assert_eq!(config.model, "gpt-4o-mini");
    assert_eq!(config.db_path, DEFAULT_DB_PATH);
    assert!(!config.offline);
    assert_eq!(config.workflow.max_clarifications, 3);
}

/// **Scenario**: Offline mode needs no API key.
#[test]
fn offline_does_not_need_api_key() {
    let config = RunConfig::from_lookup(lookup(&[("CRAFTGRAPH_OFFLINE", "true")])).unwrap();
    assert!(config.offline);
    assert!(config.api_key.is_none());
}

/// **Scenario**: Workflow limits come from CRAFTGRAPH_* variables; bad values are errors.
#[test]
fn workflow_limits_from_env() {
    let config = RunConfig::from_lookup(lookup(&[
        ("CRAFTGRAPH_OFFLINE", "1"),
        ("CRAFTGRAPH_MAX_CLARIFICATIONS", "5"),
    ]))
    .unwrap();
    assert_eq!(config.workflow.max_clarifications, 5);

    assert!(RunConfig::from_lookup(lookup(&[
        ("CRAFTGRAPH_OFFLINE", "1"),
        ("CRAFTGRAPH_MAX_CLARIFICATIONS", "many"),
    ]))
    .is_err());
}

/// **Scenario**: Only the set fields of RunOptions override the config.
#[test]
fn apply_options_overrides_set_fields() {
    let mut config = RunConfig::from_lookup(lookup(&[
        ("OPENAI_API_KEY", "sk-test"),
        ("OPENAI_MODEL", "base-model"),
    ]))
    .unwrap();
    config.apply_options(&RunOptions {
        db_path: Some("other.db".into()),
        verbose: true,
        ..Default::default()
    });
    assert_eq!(config.model, "base-model");
    assert_eq!(config.db_path, "other.db");
    assert!(config.verbose);
    assert!(!config.offline);
}
