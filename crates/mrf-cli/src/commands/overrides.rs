//! `mrf override set|clear|status`.
//!
//! The override is only ever changed by these commands. No cycle outcome
//! engages or clears it.

use anyhow::Result;
use chrono::Utc;
use std::path::Path;
use tracing::{info, warn};

use super::{opt_dt, opt_str};
use crate::store::{load_state, save_state, OverrideRecord, StateLock};

pub fn override_set(state_path: &Path, reason: &str) -> Result<()> {
    let _lock = StateLock::acquire(state_path)?;
    let mut state = load_state(state_path)?;

    let now = Utc::now();
    state.manual_override.set(reason, now)?;
    state.updated_at_utc = Some(now);
    save_state(state_path, &state)?;

    warn!(reason = reason.trim(), "manual override engaged; every cycle is OFF_KILL until cleared");
    print_override(&state.manual_override);
    Ok(())
}

pub fn override_clear(state_path: &Path) -> Result<()> {
    let _lock = StateLock::acquire(state_path)?;
    let mut state = load_state(state_path)?;

    let now = Utc::now();
    let cleared = state.manual_override.clear(now);
    if cleared {
        state.updated_at_utc = Some(now);
        save_state(state_path, &state)?;
        info!("manual override cleared");
    }

    println!("cleared={}", cleared);
    print_override(&state.manual_override);
    Ok(())
}

pub fn override_status(state_path: &Path) -> Result<()> {
    let state = load_state(state_path)?;
    print_override(&state.manual_override);
    Ok(())
}

fn print_override(o: &OverrideRecord) {
    println!("override_engaged={}", o.engaged);
    println!("override_reason={}", opt_str(&o.reason));
    println!("override_set_at_utc={}", opt_dt(&o.set_at_utc));
    println!("override_cleared_at_utc={}", opt_dt(&o.cleared_at_utc));
}
