use crate::{BudgetConfig, EntryStance, Regime, RiskBudget};

pub fn base_budget(cfg: &BudgetConfig, regime: Regime) -> RiskBudget {
    cfg.for_regime(regime)
}

/// Shrink `base` by the soft-veto reduction.
///
/// - positions: `max(min_positions, floor(base * (1 - r)))`, the floor is absolute
/// - risk multiple: `base * (1 - r)` rounded to one decimal
/// - stance: cautious once `r >= cautious_at`
///
/// A zero (or non-finite) reduction returns `base` unchanged.
pub fn adjust_budget(cfg: &BudgetConfig, base: RiskBudget, soft_reduction: f64) -> RiskBudget {
    if !soft_reduction.is_finite() || soft_reduction <= 0.0 {
        return base;
    }
    let keep = (1.0 - soft_reduction).clamp(0.0, 1.0);

    let scaled = (f64::from(base.max_positions) * keep).floor() as u32;
    let max_positions = scaled.max(cfg.min_positions);

    let max_risk_multiple = round_1dp(base.max_risk_multiple * keep);

    let entry_stance = if soft_reduction >= cfg.cautious_at {
        EntryStance::Cautious
    } else {
        base.entry_stance
    };

    RiskBudget {
        max_positions,
        max_risk_multiple,
        entry_stance,
    }
}

/// Half away from zero.
fn round_1dp(v: f64) -> f64 {
    (v * 10.0).round() / 10.0
}
