//! Command handler modules for mrf-cli.
//!
//! Shared utilities used by multiple command paths live here.
//! Command-specific logic lives in the submodules.

pub mod eval;
pub mod overrides;
pub mod state;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use mrf_config::{report_unused_keys, LoadedConfig, UnusedKeyPolicy};
use mrf_engine::EngineConfig;
use std::path::PathBuf;
use tracing::warn;

/// Env var naming the state file when `--state` is not given.
pub const ENV_STATE_PATH: &str = "MRF_STATE_PATH";
pub const DEFAULT_STATE_PATH: &str = "mrf_state.json";

// ---------------------------------------------------------------------------
// Shared helpers
// ---------------------------------------------------------------------------

/// Load layered config. No paths means built-in defaults only.
pub fn load_config(config_paths: &[String], strict: bool) -> Result<LoadedConfig> {
    let path_refs: Vec<&str> = config_paths.iter().map(|s| s.as_str()).collect();
    let loaded = if path_refs.is_empty() {
        mrf_config::load_layered_yaml_from_strings(&[])?
    } else {
        mrf_config::load_layered_yaml(&path_refs)?
    };

    let policy = if strict {
        UnusedKeyPolicy::Fail
    } else {
        UnusedKeyPolicy::Warn
    };
    let report = report_unused_keys(&loaded.config_json, policy)?;
    if !report.is_clean() {
        warn!(
            unused_leaf_keys = report.unused_leaf_pointers.len(),
            "CONFIG_UNUSED_KEYS"
        );
        for p in report.unused_leaf_pointers.iter().take(50) {
            warn!(unused = %p, "config key is not read by mrf");
        }
    }
    Ok(loaded)
}

/// Typed, validated engine configuration from the `/engine` subtree.
pub fn engine_config(loaded: &LoadedConfig) -> Result<EngineConfig> {
    let cfg: EngineConfig = loaded
        .section("/engine")
        .context("ENGINE_CONFIG_INVALID: /engine does not match the engine configuration schema")?;
    cfg.validate()?;
    Ok(cfg)
}

/// `--state`, else `$MRF_STATE_PATH`, else `store.state_path`, else `mrf_state.json`.
pub fn resolve_state_path(flag: Option<&str>, loaded: &LoadedConfig) -> PathBuf {
    if let Some(p) = flag.filter(|p| !p.trim().is_empty()) {
        return PathBuf::from(p);
    }
    if let Ok(p) = std::env::var(ENV_STATE_PATH) {
        if !p.trim().is_empty() {
            return PathBuf::from(p);
        }
    }
    if let Some(p) = loaded.str_at("/store/state_path") {
        return PathBuf::from(p);
    }
    PathBuf::from(DEFAULT_STATE_PATH)
}

pub fn opt_dt(dt: &Option<DateTime<Utc>>) -> String {
    dt.map(|d| d.to_rfc3339()).unwrap_or_else(|| "none".to_string())
}

pub fn opt_str<T: ToString>(v: &Option<T>) -> String {
    v.as_ref()
        .map(|x| x.to_string())
        .unwrap_or_else(|| "none".to_string())
}
