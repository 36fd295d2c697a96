use crate::{EngineState, Regime, RegimeConfig, Transition};

/// Result of one state machine step.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RegimeStep {
    pub regime: Regime,
    pub transition: Transition,
    /// Replacement state (`last_total_score` set to this cycle's score).
    pub state: EngineState,
}

/// Non-hysteresis rule used on the first cycle and when a hard kill lifts.
pub fn immediate_regime(cfg: &RegimeConfig, total_score: u32) -> Regime {
    if total_score >= cfg.immediate_on_at {
        Regime::On
    } else if total_score >= cfg.immediate_neutral_at {
        Regime::Neutral
    } else {
        Regime::Off
    }
}

/// Asymmetric hysteresis: the regime `current` would move to at `total_score`, if any.
fn move_target(cfg: &RegimeConfig, current: Regime, total_score: u32) -> Option<Regime> {
    match current {
        Regime::On if total_score < cfg.on_exit_below => Some(Regime::Neutral),
        Regime::Neutral if total_score > cfg.neutral_to_on_above => Some(Regime::On),
        Regime::Neutral if total_score < cfg.neutral_to_off_below => Some(Regime::Off),
        Regime::Off if total_score > cfg.off_exit_above => Some(Regime::Neutral),
        _ => None,
    }
}

/// Advance the regime state machine by one cycle.
///
/// - hard kill: OFF_KILL immediately, pending counter cleared
/// - no prior regime / leaving OFF_KILL: immediate thresholds, no confirmation
/// - otherwise: a move commits only after `confirmation_window` consecutive
///   cycles toward the same target; any cycle without a move condition resets
///   the counter
pub fn step_regime(
    cfg: &RegimeConfig,
    prior: &EngineState,
    total_score: u32,
    hard_kill: bool,
) -> RegimeStep {
    if hard_kill {
        return settled(
            Regime::OffKill,
            Transition::Killed { from: prior.regime },
            total_score,
        );
    }

    let current = match prior.regime {
        None => {
            let to = immediate_regime(cfg, total_score);
            return settled(to, Transition::Initialized { to }, total_score);
        }
        Some(Regime::OffKill) => {
            let to = immediate_regime(cfg, total_score);
            return settled(to, Transition::Recovered { to }, total_score);
        }
        Some(r) => r,
    };

    let target = match move_target(cfg, current, total_score) {
        None => {
            return settled(current, Transition::Held { regime: current }, total_score);
        }
        Some(t) => t,
    };

    // A counter persisted without a target is credited to the current move.
    let weeks = match prior.pending_target {
        Some(t) if t != target => 1,
        _ => prior.pending_transition_weeks.saturating_add(1),
    };

    let window = cfg.confirmation_window.max(1);
    if weeks >= window {
        return settled(
            target,
            Transition::Committed {
                from: current,
                to: target,
            },
            total_score,
        );
    }

    RegimeStep {
        regime: current,
        transition: Transition::Pending {
            from: current,
            to: target,
            weeks,
            window,
        },
        state: EngineState {
            regime: Some(current),
            pending_transition_weeks: weeks,
            pending_target: Some(target),
            last_total_score: Some(total_score),
        },
    }
}

fn settled(regime: Regime, transition: Transition, total_score: u32) -> RegimeStep {
    RegimeStep {
        regime,
        transition,
        state: EngineState::settled(regime, total_score),
    }
}
