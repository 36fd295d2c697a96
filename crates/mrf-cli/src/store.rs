//! State file owned by the CLI: engine state + manual override between cycles.
//!
//! One writer at a time. Mutating commands hold a `<state>.lock` file created
//! with create-new semantics for their whole read-modify-write, and replace the
//! state file atomically (temp file + rename).

use anyhow::{bail, Context, Result};
use chrono::{DateTime, Utc};
use mrf_engine::{EngineState, ManualOverride};
use serde::{Deserialize, Serialize};
use std::fs::{self, OpenOptions};
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use uuid::Uuid;

pub const STATE_SCHEMA_VERSION: u32 = 1;

/// Operator override as persisted, with audit timestamps.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OverrideRecord {
    pub engaged: bool,
    #[serde(default)]
    pub reason: Option<String>,
    #[serde(default)]
    pub set_at_utc: Option<DateTime<Utc>>,
    #[serde(default)]
    pub cleared_at_utc: Option<DateTime<Utc>>,
}

impl OverrideRecord {
    pub fn to_engine(&self) -> ManualOverride {
        if self.engaged {
            ManualOverride::engaged(self.reason.clone().unwrap_or_default())
        } else {
            ManualOverride::disengaged()
        }
    }

    pub fn set(&mut self, reason: &str, now: DateTime<Utc>) -> Result<()> {
        let reason = reason.trim();
        if reason.is_empty() {
            bail!("manual override requires a non-empty --reason");
        }
        self.engaged = true;
        self.reason = Some(reason.to_string());
        self.set_at_utc = Some(now);
        self.cleared_at_utc = None;
        Ok(())
    }

    /// Returns false when there was nothing to clear.
    pub fn clear(&mut self, now: DateTime<Utc>) -> bool {
        if !self.engaged {
            return false;
        }
        self.engaged = false;
        self.cleared_at_utc = Some(now);
        true
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StateFile {
    pub schema_version: u32,
    pub engine_state: EngineState,
    #[serde(default)]
    pub manual_override: OverrideRecord,
    #[serde(default)]
    pub updated_at_utc: Option<DateTime<Utc>>,
    #[serde(default)]
    pub last_cycle_id: Option<Uuid>,
}

impl StateFile {
    pub fn fresh() -> Self {
        Self {
            schema_version: STATE_SCHEMA_VERSION,
            engine_state: EngineState::new(),
            manual_override: OverrideRecord::default(),
            updated_at_utc: None,
            last_cycle_id: None,
        }
    }
}

/// Missing file -> fresh state.
pub fn load_state(path: &Path) -> Result<StateFile> {
    if !path.exists() {
        return Ok(StateFile::fresh());
    }
    let raw = fs::read_to_string(path)
        .with_context(|| format!("read state file failed: {}", path.display()))?;
    let v: serde_json::Value = serde_json::from_str(&raw)
        .with_context(|| format!("state file is not valid JSON: {}", path.display()))?;

    let version = v.get("schema_version").and_then(|x| x.as_u64());
    if version != Some(STATE_SCHEMA_VERSION as u64) {
        bail!(
            "STATE_SCHEMA: {} has schema_version {:?}, expected {}",
            path.display(),
            version,
            STATE_SCHEMA_VERSION
        );
    }

    serde_json::from_value(v)
        .with_context(|| format!("STATE_SCHEMA: malformed state file: {}", path.display()))
}

pub fn save_state(path: &Path, state: &StateFile) -> Result<()> {
    ensure_parent_dir(path)?;
    let json = serde_json::to_string_pretty(state).context("serialize state failed")?;

    let tmp = sibling(path, "tmp");
    fs::write(&tmp, format!("{json}\n"))
        .with_context(|| format!("write temp state failed: {}", tmp.display()))?;
    fs::rename(&tmp, path)
        .with_context(|| format!("replace state file failed: {}", path.display()))?;
    Ok(())
}

/// Exclusive single-writer lock on a state file. Released on drop.
#[derive(Debug)]
pub struct StateLock {
    path: PathBuf,
}

impl StateLock {
    pub fn acquire(state_path: &Path) -> Result<Self> {
        ensure_parent_dir(state_path)?;
        let path = sibling(state_path, "lock");
        let mut f = match OpenOptions::new().write(true).create_new(true).open(&path) {
            Ok(f) => f,
            Err(e) if e.kind() == ErrorKind::AlreadyExists => bail!(
                "STATE_LOCKED: {} exists; another mrf process is writing this state. \
                Remove the lock file only if no such process is running.",
                path.display()
            ),
            Err(e) => {
                return Err(e).with_context(|| format!("create lock failed: {}", path.display()))
            }
        };
        // Holder pid is informational only.
        let _ = writeln!(f, "{}", std::process::id());
        Ok(Self { path })
    }
}

impl Drop for StateLock {
    fn drop(&mut self) {
        let _ = fs::remove_file(&self.path);
    }
}

/// `<path>.<ext>` next to `path`.
fn sibling(path: &Path, ext: &str) -> PathBuf {
    let mut name = path.as_os_str().to_os_string();
    name.push(".");
    name.push(ext);
    PathBuf::from(name)
}

fn ensure_parent_dir(path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)
                .with_context(|| format!("create state dir failed: {}", parent.display()))?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use mrf_engine::Regime;
    use tempfile::tempdir;

    #[test]
    fn missing_file_is_fresh_state() {
        let dir = tempdir().unwrap();
        let s = load_state(&dir.path().join("state.json")).unwrap();
        assert_eq!(s, StateFile::fresh());
        assert_eq!(s.engine_state.regime, None);
    }

    #[test]
    fn save_then_load_preserves_state() {
        let dir = tempdir().unwrap();
        let p = dir.path().join("nested").join("state.json");
        let mut s = StateFile::fresh();
        s.engine_state = EngineState::settled(Regime::Neutral, 48);
        s.manual_override.set("election week", Utc::now()).unwrap();
        save_state(&p, &s).unwrap();

        assert!(!sibling(&p, "tmp").exists(), "temp file renamed away");
        assert_eq!(load_state(&p).unwrap(), s);
    }

    #[test]
    fn unknown_schema_version_is_rejected() {
        let dir = tempdir().unwrap();
        let p = dir.path().join("state.json");
        fs::write(&p, r#"{"schema_version": 9, "engine_state": {"regime": null, "pending_transition_weeks": 0}}"#)
            .unwrap();
        let err = load_state(&p).unwrap_err();
        assert!(err.to_string().starts_with("STATE_SCHEMA"), "{err}");
    }

    #[test]
    fn second_lock_is_refused_until_first_drops() {
        let dir = tempdir().unwrap();
        let p = dir.path().join("state.json");
        let lock_file = dir.path().join("state.json.lock");

        let first = StateLock::acquire(&p).unwrap();
        assert!(lock_file.exists());
        let err = StateLock::acquire(&p).unwrap_err();
        assert!(err.to_string().starts_with("STATE_LOCKED"), "{err}");
        drop(first);
        assert!(!lock_file.exists(), "lock removed on drop");

        let again = StateLock::acquire(&p).unwrap();
        assert!(lock_file.exists());
        drop(again);
    }

    #[test]
    fn override_requires_reason_and_clears_explicitly() {
        let mut o = OverrideRecord::default();
        assert!(o.set("   ", Utc::now()).is_err());
        assert!(!o.engaged);

        o.set("capital controls rumour", Utc::now()).unwrap();
        assert_eq!(
            o.to_engine().kill_reason(),
            "manual override: capital controls rumour"
        );
        assert!(o.clear(Utc::now()));
        assert!(!o.clear(Utc::now()), "second clear is a no-op");
        assert!(!o.to_engine().engaged);
        assert!(o.cleared_at_utc.is_some());
    }
}
