//! `mrf eval`: run one cycle from an observation file and persist the new state.

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use mrf_engine::{evaluate, Decision, GateId};
use serde::Serialize;
use std::path::{Path, PathBuf};
use tracing::info;
use uuid::Uuid;

use super::{engine_config, load_config, resolve_state_path};
use crate::observation::load_observation;
use crate::store::{load_state, save_state, StateLock};

pub struct EvalArgs {
    pub observation: PathBuf,
    pub config_paths: Vec<String>,
    pub state: Option<String>,
    pub dry_run: bool,
    pub json: bool,
    pub strict_config: bool,
}

/// Machine-readable output of one cycle.
#[derive(Debug, Serialize)]
struct DecisionEnvelope<'a> {
    cycle_id: Uuid,
    evaluated_at_utc: DateTime<Utc>,
    config_hash: &'a str,
    period: Option<&'a str>,
    state_path: String,
    persisted: bool,
    decision: &'a Decision,
}

pub fn run_eval(args: EvalArgs) -> Result<()> {
    let loaded = load_config(&args.config_paths, args.strict_config)?;
    let cfg = engine_config(&loaded)?;

    let obs_file = load_observation(&args.observation)?;
    let period = obs_file.period.clone();
    let obs = obs_file.into_observation();

    let state_path = resolve_state_path(args.state.as_deref(), &loaded);

    // Hold the lock across read-modify-write. Dry runs never write.
    let _lock = if args.dry_run {
        None
    } else {
        Some(StateLock::acquire(&state_path)?)
    };

    let mut state = load_state(&state_path)?;
    let outcome = evaluate(
        &cfg,
        &state.engine_state,
        &obs,
        &state.manual_override.to_engine(),
    );

    let cycle_id = Uuid::new_v4();
    let now = Utc::now();

    if !args.dry_run {
        state.engine_state = outcome.state.clone();
        state.updated_at_utc = Some(now);
        state.last_cycle_id = Some(cycle_id);
        save_state(&state_path, &state)?;
    }

    let d = &outcome.decision;
    info!(
        %cycle_id,
        regime = %d.regime,
        total_score = d.total_score,
        confidence = d.validation.confidence.as_str(),
        persisted = !args.dry_run,
        "cycle evaluated"
    );

    if args.json {
        let env = DecisionEnvelope {
            cycle_id,
            evaluated_at_utc: now,
            config_hash: &loaded.config_hash,
            period: period.as_deref(),
            state_path: state_path.display().to_string(),
            persisted: !args.dry_run,
            decision: d,
        };
        let json = serde_json::to_string_pretty(&env).context("serialize decision failed")?;
        println!("{json}");
    } else {
        print_decision(cycle_id, &loaded.config_hash, period.as_deref(), d);
        print_persistence(&state_path, !args.dry_run);
    }

    Ok(())
}

fn print_decision(cycle_id: Uuid, config_hash: &str, period: Option<&str>, d: &Decision) {
    println!("cycle_id={}", cycle_id);
    println!("config_hash={}", config_hash);
    if let Some(p) = period {
        println!("period={}", p);
    }
    println!("regime={}", d.regime);
    println!("total_score={}", d.total_score);
    println!("score_band={}", d.score_band.as_str());
    println!("transition={}", d.transition_note);

    for b in &d.factors {
        println!(
            "factor_{}={} status={} weight={:.2} contribution={:.2}",
            b.factor.as_str(),
            b.score,
            b.status,
            b.weight,
            b.contribution
        );
    }

    for g in GateId::ALL {
        let verdict = if d.gates.passed(g) { "pass" } else { "fail" };
        let kind = if g.is_hard() { "hard" } else { "soft" };
        println!("gate_{}={} kind={} label={}", g.as_str(), verdict, kind, g.label());
    }

    println!("hard_kill={}", d.hard_kill);
    for r in &d.kill_reasons {
        println!("kill_reason={}", r);
    }
    println!("soft_reduction={:.2}", d.soft_reduction);
    for r in &d.soft_veto_reasons {
        println!("soft_veto_reason={}", r);
    }

    let b = &d.adjusted_budget;
    println!("max_positions={}", b.max_positions);
    println!("max_risk_multiple={:.1}", b.max_risk_multiple);
    println!("entry_stance={}", b.entry_stance.as_str());
    println!(
        "base_budget={} positions, {:.1}R, {}",
        d.base_budget.max_positions,
        d.base_budget.max_risk_multiple,
        d.base_budget.entry_stance.as_str()
    );

    println!("confidence={}", d.validation.confidence.as_str());
    for e in &d.validation.errors {
        println!("validation_error={}", e);
    }
    for w in &d.validation.warnings {
        println!("validation_warning={}", w);
    }
    println!("actionable={}", d.is_actionable());
}

fn print_persistence(state_path: &Path, persisted: bool) {
    println!("state_path={}", state_path.display());
    println!("persisted={}", persisted);
}
