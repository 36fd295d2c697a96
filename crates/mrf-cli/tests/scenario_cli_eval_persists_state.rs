//! Scenario: `mrf eval` runs a cycle and threads engine state through the state file.
//!
//! # Invariants under test
//!
//! 1. A first cycle initializes the regime from immediate thresholds and persists it.
//! 2. A weak week pends for one cycle and commits on the second (state survives
//!    between processes).
//! 3. `--dry-run` never creates or modifies the state file.
//! 4. `--json` emits a decision envelope with cycle id and config hash.
//! 5. Percent-unit observation files evaluate the same as fraction files.

use assert_cmd::Command;
use predicates::prelude::*;
use serde_json::Value;
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::tempdir;

const CALM_WEEK: &str = r#"{
  "period": "2026-W41",
  "currency_weekly_change": 0.008,
  "spread_level_bp": 204,
  "spread_weekly_delta_bp": 0,
  "volatility_index": 17.5,
  "global_equity_weekly_change": 0.01,
  "local_broad_weekly_change": 0.02,
  "local_financials_weekly_change": 0.025,
  "volume_ratio": 1.0,
  "rate_proxy_score": 60
}"#;

const CALM_WEEK_PERCENT: &str = r#"{
  "units": "percent",
  "currency_weekly_change": 0.8,
  "spread_level_bp": 204,
  "spread_weekly_delta_bp": 0,
  "volatility_index": 17.5,
  "global_equity_weekly_change": 1.0,
  "local_broad_weekly_change": 2.0,
  "local_financials_weekly_change": 2.5,
  "volume_ratio": 1.0,
  "rate_proxy_score": 60
}"#;

/// Scores 54 with every gate passing: FX 40, credit 50, global 80, rate 40, liquidity 70.
const SOFT_WEEK: &str = r#"{
  "currency_weekly_change": 0.02,
  "spread_level_bp": 450,
  "spread_weekly_delta_bp": 0,
  "volatility_index": 22,
  "global_equity_weekly_change": 0.0,
  "local_broad_weekly_change": 0.0,
  "local_financials_weekly_change": 0.0,
  "volume_ratio": 0.9,
  "rate_proxy_score": 40
}"#;

fn write(dir: &Path, name: &str, body: &str) -> PathBuf {
    let p = dir.join(name);
    fs::write(&p, body).unwrap();
    p
}

fn mrf(dir: &Path) -> Command {
    let mut cmd = Command::cargo_bin("mrf").unwrap();
    cmd.current_dir(dir).env_remove("MRF_STATE_PATH");
    cmd
}

fn eval(dir: &Path, obs: &Path, state: &Path) -> assert_cmd::assert::Assert {
    mrf(dir)
        .args(["eval", "--observation"])
        .arg(obs)
        .arg("--state")
        .arg(state)
        .assert()
}

fn read_state(state: &Path) -> Value {
    serde_json::from_str(&fs::read_to_string(state).unwrap()).unwrap()
}

#[test]
fn first_cycle_initializes_and_persists() {
    let dir = tempdir().unwrap();
    let obs = write(dir.path(), "calm.json", CALM_WEEK);
    let state = dir.path().join("state.json");

    eval(dir.path(), &obs, &state)
        .success()
        .stdout(predicate::str::contains("regime=ON\n"))
        .stdout(predicate::str::contains("total_score=84\n"))
        .stdout(predicate::str::contains("transition=initialized at ON\n"))
        .stdout(predicate::str::contains("period=2026-W41\n"))
        .stdout(predicate::str::contains("max_positions=12\n"))
        .stdout(predicate::str::contains("gate_K1=pass"))
        .stdout(predicate::str::contains("confidence=HIGH\n"))
        .stdout(predicate::str::contains("persisted=true\n"));

    let s = read_state(&state);
    assert_eq!(s["schema_version"], 1);
    assert_eq!(s["engine_state"]["regime"], "ON");
    assert_eq!(s["engine_state"]["last_total_score"], 84);
    assert!(s["last_cycle_id"].is_string());
    assert!(!dir.path().join("state.json.lock").exists(), "lock released");
}

#[test]
fn weak_week_commits_only_on_second_cycle() {
    let dir = tempdir().unwrap();
    let calm = write(dir.path(), "calm.json", CALM_WEEK);
    let soft = write(dir.path(), "soft.json", SOFT_WEEK);
    let state = dir.path().join("state.json");

    eval(dir.path(), &calm, &state).success();

    eval(dir.path(), &soft, &state)
        .success()
        .stdout(predicate::str::contains("total_score=54\n"))
        .stdout(predicate::str::contains("regime=ON\n"))
        .stdout(predicate::str::contains("transition=ON -> NEUTRAL pending (1/2)\n"));
    assert_eq!(read_state(&state)["engine_state"]["pending_transition_weeks"], 1);

    eval(dir.path(), &soft, &state)
        .success()
        .stdout(predicate::str::contains("regime=NEUTRAL\n"))
        .stdout(predicate::str::contains("transition=ON -> NEUTRAL committed\n"))
        .stdout(predicate::str::contains("max_positions=7\n"));

    let s = read_state(&state);
    assert_eq!(s["engine_state"]["regime"], "NEUTRAL");
    assert_eq!(s["engine_state"]["pending_transition_weeks"], 0);
}

#[test]
fn dry_run_never_writes() {
    let dir = tempdir().unwrap();
    let obs = write(dir.path(), "calm.json", CALM_WEEK);
    let state = dir.path().join("state.json");

    mrf(dir.path())
        .args(["eval", "--dry-run", "--observation"])
        .arg(&obs)
        .arg("--state")
        .arg(&state)
        .assert()
        .success()
        .stdout(predicate::str::contains("persisted=false\n"));

    assert!(!state.exists());
}

#[test]
fn json_envelope_carries_cycle_metadata() {
    let dir = tempdir().unwrap();
    let obs = write(dir.path(), "calm.json", CALM_WEEK);
    let state = dir.path().join("state.json");

    let out = mrf(dir.path())
        .args(["eval", "--json", "--dry-run", "--observation"])
        .arg(&obs)
        .arg("--state")
        .arg(&state)
        .output()
        .unwrap();
    assert!(out.status.success());

    let v: Value = serde_json::from_slice(&out.stdout).unwrap();
    assert_eq!(v["persisted"], false);
    assert_eq!(v["period"], "2026-W41");
    assert_eq!(v["config_hash"].as_str().unwrap().len(), 64);
    assert!(v["cycle_id"].is_string());
    assert_eq!(v["decision"]["regime"], "ON");
    assert_eq!(v["decision"]["total_score"], 84);
    assert_eq!(v["decision"]["adjusted_budget"]["entry_stance"], "normal");
    assert_eq!(v["decision"]["gates"]["checks"]["K3"], true);
    assert_eq!(v["decision"]["validation"]["confidence"], "HIGH");
}

#[test]
fn percent_units_match_fraction_units() {
    let dir = tempdir().unwrap();
    let obs = write(dir.path(), "calm_pct.json", CALM_WEEK_PERCENT);
    let state = dir.path().join("state.json");

    eval(dir.path(), &obs, &state)
        .success()
        .stdout(predicate::str::contains("total_score=84\n"))
        .stdout(predicate::str::contains("factor_fx=70 "));
}

#[test]
fn malformed_observation_fails_without_touching_state() {
    let dir = tempdir().unwrap();
    let obs = write(dir.path(), "bad.json", r#"{"currency_weekly_change": 0.01}"#);
    let state = dir.path().join("state.json");

    eval(dir.path(), &obs, &state)
        .failure()
        .stderr(predicate::str::contains("observation must be a JSON object"));
    assert!(!state.exists());
}
