use anyhow::{Context, Result};
use std::path::Path;

use super::{opt_dt, opt_str};
use crate::store::load_state;

/// `mrf state show`: print the persisted engine state without evaluating.
pub fn state_show(state_path: &Path, json: bool) -> Result<()> {
    let state = load_state(state_path)?;

    if json {
        let s = serde_json::to_string_pretty(&state).context("serialize state failed")?;
        println!("{s}");
        return Ok(());
    }

    let es = &state.engine_state;
    println!("state_path={}", state_path.display());
    println!("schema_version={}", state.schema_version);
    println!("regime={}", opt_str(&es.regime));
    println!("pending_transition_weeks={}", es.pending_transition_weeks);
    println!("pending_target={}", opt_str(&es.pending_target));
    println!("last_total_score={}", opt_str(&es.last_total_score));
    println!("override_engaged={}", state.manual_override.engaged);
    println!("updated_at_utc={}", opt_dt(&state.updated_at_utc));
    println!("last_cycle_id={}", opt_str(&state.last_cycle_id));
    Ok(())
}
