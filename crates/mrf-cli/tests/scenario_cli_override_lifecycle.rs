//! Scenario: manual override lifecycle through the CLI.
//!
//! # Invariants under test
//!
//! 1. `override set` requires a non-empty reason.
//! 2. While engaged, every cycle is OFF_KILL with the reason in kill reasons,
//!    even when every gate passes.
//! 3. Only `override clear` disengages it; the next cycle recovers immediately.

use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use std::path::Path;
use tempfile::tempdir;

const CALM_WEEK: &str = r#"{
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

fn mrf(dir: &Path) -> Command {
    let mut cmd = Command::cargo_bin("mrf").unwrap();
    cmd.current_dir(dir).env_remove("MRF_STATE_PATH");
    cmd
}

#[test]
fn override_forces_kill_until_explicitly_cleared() {
    let dir = tempdir().unwrap();
    let d = dir.path();
    fs::write(d.join("calm.json"), CALM_WEEK).unwrap();

    mrf(d)
        .args(["override", "set", "--state", "s.json", "--reason", "   "])
        .assert()
        .failure()
        .stderr(predicate::str::contains("non-empty --reason"));

    mrf(d)
        .args(["override", "set", "--state", "s.json", "--reason", "election weekend"])
        .assert()
        .success()
        .stdout(predicate::str::contains("override_engaged=true\n"))
        .stdout(predicate::str::contains("override_reason=election weekend\n"));

    for _ in 0..2 {
        mrf(d)
            .args(["eval", "--observation", "calm.json", "--state", "s.json"])
            .assert()
            .success()
            .stdout(predicate::str::contains("regime=OFF_KILL\n"))
            .stdout(predicate::str::contains("hard_kill=true\n"))
            .stdout(predicate::str::contains("kill_reason=manual override: election weekend\n"))
            .stdout(predicate::str::contains("gate_K1=pass"))
            .stdout(predicate::str::contains("max_positions=2\n"))
            .stdout(predicate::str::contains("entry_stance=forbidden\n"));
    }

    mrf(d)
        .args(["override", "status", "--state", "s.json"])
        .assert()
        .success()
        .stdout(predicate::str::contains("override_engaged=true\n"));

    mrf(d)
        .args(["override", "clear", "--state", "s.json"])
        .assert()
        .success()
        .stdout(predicate::str::contains("cleared=true\n"))
        .stdout(predicate::str::contains("override_engaged=false\n"));

    mrf(d)
        .args(["eval", "--observation", "calm.json", "--state", "s.json"])
        .assert()
        .success()
        .stdout(predicate::str::contains("regime=ON\n"))
        .stdout(predicate::str::contains("transition=OFF_KILL -> ON recovered\n"))
        .stdout(predicate::str::contains("kill_reason=").not());
}

#[test]
fn clearing_a_disengaged_override_is_a_no_op() {
    let dir = tempdir().unwrap();
    mrf(dir.path())
        .args(["override", "clear", "--state", "s.json"])
        .assert()
        .success()
        .stdout(predicate::str::contains("cleared=false\n"));
    assert!(!dir.path().join("s.json").exists());
}

#[test]
fn state_show_reports_override_and_regime() {
    let dir = tempdir().unwrap();
    let d = dir.path();

    mrf(d)
        .args(["state", "show", "--state", "s.json"])
        .assert()
        .success()
        .stdout(predicate::str::contains("regime=none\n"));

    mrf(d)
        .args(["override", "set", "--state", "s.json", "--reason", "data outage"])
        .assert()
        .success();

    mrf(d)
        .args(["state", "show", "--state", "s.json"])
        .assert()
        .success()
        .stdout(predicate::str::contains("override_engaged=true\n"))
        .stdout(predicate::str::contains("schema_version=1\n"));
}
