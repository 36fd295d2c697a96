use tracing::{debug, info, warn};

use crate::{
    adjust_budget, aggregate, base_budget, evaluate_gates, score_all, step_regime,
    validate_observation, weighted_contributions, CycleOutcome, Decision, EngineConfig,
    EngineState, ManualOverride, Observation, Regime, ScoreBand, Transition,
};

/// Run one full cycle: validate -> gates -> scores -> aggregate -> regime -> budget.
///
/// Pure function of its arguments. The returned [`CycleOutcome::state`] replaces
/// `prior`; the caller persists it until the next cycle. Validation problems
/// never stop the cycle, they surface in [`Decision::validation`].
pub fn evaluate(
    cfg: &EngineConfig,
    prior: &EngineState,
    obs: &Observation,
    manual_override: &ManualOverride,
) -> CycleOutcome {
    let validation = validate_observation(&cfg.validation, obs);
    if !validation.is_valid {
        warn!(
            errors = validation.errors.len(),
            first = validation.errors.first().map(String::as_str).unwrap_or(""),
            "observation failed validation; decision confidence is LOW"
        );
    }

    // Gates use raw observations only.
    let gates = evaluate_gates(&cfg.gates, obs);
    let mut kill_reasons: Vec<String> = gates
        .failed()
        .filter(|g| g.is_hard())
        .map(|g| g.reason())
        .collect();
    if manual_override.engaged {
        kill_reasons.push(manual_override.kill_reason());
    }
    let hard_kill = gates.hard_kill() || manual_override.engaged;

    let soft_reduction = cfg.gates.soft_reduction(&gates);
    let soft_veto_reasons: Vec<String> = gates.failed_soft().map(|g| g.reason()).collect();

    let scores = score_all(&cfg.scoring, obs);
    let total_score = aggregate(&cfg.weights, &scores);
    let failed_gates: Vec<&str> = gates.failed().map(|g| g.as_str()).collect();
    debug!(
        total_score,
        hard_kill,
        soft_reduction,
        failed_gates = ?failed_gates,
        "cycle scored"
    );

    let step = step_regime(&cfg.regime, prior, total_score, hard_kill);
    log_transition(&step.transition, total_score);

    let base = base_budget(&cfg.budget, step.regime);
    let adjusted = adjust_budget(&cfg.budget, base, soft_reduction);

    let score_band = if total_score >= cfg.regime.immediate_on_at {
        ScoreBand::Strong
    } else if total_score >= cfg.regime.immediate_neutral_at {
        ScoreBand::Mixed
    } else {
        ScoreBand::Weak
    };

    let decision = Decision {
        regime: step.regime,
        total_score,
        score_band,
        factors: weighted_contributions(&cfg.weights, &scores),
        gates,
        hard_kill,
        kill_reasons,
        soft_reduction,
        soft_veto_reasons,
        base_budget: base,
        adjusted_budget: adjusted,
        transition_note: step.transition.to_string(),
        transition: step.transition,
        validation,
    };

    CycleOutcome {
        decision,
        state: step.state,
    }
}

fn log_transition(t: &Transition, total_score: u32) {
    match t {
        Transition::Committed { from, to } => {
            info!(%from, %to, total_score, "regime change committed")
        }
        Transition::Killed { from } if *from != Some(Regime::OffKill) => {
            info!(from = ?from, total_score, "hard kill engaged")
        }
        Transition::Recovered { to } => info!(%to, total_score, "hard kill lifted"),
        Transition::Initialized { to } => info!(%to, total_score, "regime initialized"),
        Transition::Pending {
            from,
            to,
            weeks,
            window,
        } => debug!(%from, %to, weeks, window, "regime change pending"),
        _ => {}
    }
}
