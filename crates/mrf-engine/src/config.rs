use anyhow::{bail, Result};
use serde::{Deserialize, Serialize};

use crate::{EntryStance, Factor, Regime, RiskBudget};

/// Basis-point scale used for exact weight arithmetic.
pub const WEIGHT_BP_SCALE: i64 = 10_000;

/// Engine configuration (thresholds, weights, budgets, confirmation window).
///
/// Every field defaults to the production constants, so a config layer only
/// needs to list what it overrides.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct EngineConfig {
    pub validation: ValidationLimits,
    pub scoring: ScoringConfig,
    pub gates: GateThresholds,
    pub weights: FactorWeights,
    pub regime: RegimeConfig,
    pub budget: BudgetConfig,
}

/// Plausibility limits for the validator.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ValidationLimits {
    pub currency_change_warn: f64,
    pub currency_change_error: f64,
    pub spread_level_min_bp: f64,
    pub spread_level_max_bp: f64,
    pub spread_delta_warn_bp: f64,
    pub spread_delta_error_bp: f64,
    /// Lower plausibility bound for the volatility index. 5 is a chosen
    /// default, not a published figure; tune it per data source.
    pub volatility_min: f64,
    /// Upper plausibility bound for the volatility index. Revisions have used
    /// both 80 and 60; see `config/profiles/vix_cap_60.yaml`.
    pub volatility_max: f64,

    /// Spread falling below this delta while the currency weakens is inconsistent.
    pub inconsistent_spread_drop_bp: f64,
    pub inconsistent_currency_weakening: f64,
    /// Spread rising above this delta while the currency strengthens is inconsistent.
    pub inconsistent_spread_rise_bp: f64,
    pub inconsistent_currency_strengthening: f64,
    /// High volatility with a strong global equity rally looks like a regime-transition artifact.
    pub artifact_volatility: f64,
    pub artifact_global_equity_rally: f64,
}

impl Default for ValidationLimits {
    fn default() -> Self {
        Self {
            currency_change_warn: 0.05,
            currency_change_error: 0.10,
            spread_level_min_bp: 50.0,
            spread_level_max_bp: 1500.0,
            spread_delta_warn_bp: 75.0,
            spread_delta_error_bp: 150.0,
            volatility_min: 5.0,
            volatility_max: 80.0,
            inconsistent_spread_drop_bp: -30.0,
            inconsistent_currency_weakening: 0.03,
            inconsistent_spread_rise_bp: 50.0,
            inconsistent_currency_strengthening: -0.02,
            artifact_volatility: 30.0,
            artifact_global_equity_rally: 0.02,
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ScoringConfig {
    pub fx: FxScoring,
    pub credit: CreditScoring,
    pub global: GlobalScoring,
    pub liquidity: LiquidityScoring,
}

/// FX bands over |currency weekly change|: value `< edges[i]` scores `scores[i]`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FxScoring {
    pub abs_change_edges: Vec<f64>,
    pub scores: Vec<u8>,
}

impl Default for FxScoring {
    fn default() -> Self {
        Self {
            abs_change_edges: vec![0.005, 0.015, 0.030, 0.050],
            scores: vec![100, 70, 40, 10, 0],
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CreditScoring {
    pub level_edges_bp: Vec<f64>,
    pub scores: Vec<u8>,
    /// Weekly spread delta strictly above this costs `spike_penalty` points.
    pub spike_delta_bp: f64,
    pub spike_penalty: u8,
}

impl Default for CreditScoring {
    fn default() -> Self {
        Self {
            level_edges_bp: vec![300.0, 400.0, 500.0, 600.0, 700.0],
            scores: vec![100, 70, 50, 30, 10, 0],
            spike_delta_bp: 50.0,
            spike_penalty: 20,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct GlobalScoring {
    pub volatility_edges: Vec<f64>,
    pub scores: Vec<u8>,
    /// Global equity change strictly below this costs `severe_penalty` points.
    pub severe_equity_drop: f64,
    pub severe_penalty: u8,
    /// Otherwise, strictly below this costs `mild_penalty` points.
    pub mild_equity_drop: f64,
    pub mild_penalty: u8,
}

impl Default for GlobalScoring {
    fn default() -> Self {
        Self {
            volatility_edges: vec![20.0, 25.0, 30.0, 35.0],
            scores: vec![100, 80, 60, 40, 20],
            severe_equity_drop: -0.02,
            severe_penalty: 20,
            mild_equity_drop: -0.01,
            mild_penalty: 10,
        }
    }
}

/// Liquidity floors, descending: ratio `>= floors[i]` scores `scores[i]`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LiquidityScoring {
    pub volume_ratio_floors: Vec<f64>,
    pub scores: Vec<u8>,
}

impl Default for LiquidityScoring {
    fn default() -> Self {
        Self {
            volume_ratio_floors: vec![1.2, 0.8, 0.5],
            scores: vec![100, 70, 40, 10],
        }
    }
}

/// Kill-switch (K1..K3) and soft-veto (K4..K5) thresholds.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct GateThresholds {
    pub k1_currency_shock: f64,
    pub k2_spread_level_bp: f64,
    pub k2_spread_spike_bp: f64,
    pub k3_volatility: f64,
    pub k3_global_equity_drop: f64,
    pub k4_financials_drop: f64,
    pub k4_broad_stable: f64,
    pub k5_volume_ratio: f64,
    pub k4_reduction: f64,
    pub k5_reduction: f64,
    pub max_soft_reduction: f64,
}

impl Default for GateThresholds {
    fn default() -> Self {
        Self {
            k1_currency_shock: 0.05,
            k2_spread_level_bp: 700.0,
            k2_spread_spike_bp: 100.0,
            k3_volatility: 35.0,
            k3_global_equity_drop: -0.03,
            k4_financials_drop: -0.05,
            k4_broad_stable: -0.01,
            k5_volume_ratio: 0.5,
            k4_reduction: 0.25,
            k5_reduction: 0.15,
            max_soft_reduction: 0.5,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FactorWeights {
    pub fx: f64,
    pub credit: f64,
    pub global: f64,
    pub rate: f64,
    pub liquidity: f64,
}

impl Default for FactorWeights {
    fn default() -> Self {
        Self {
            fx: 0.30,
            credit: 0.25,
            global: 0.25,
            rate: 0.15,
            liquidity: 0.05,
        }
    }
}

impl FactorWeights {
    pub fn weight(&self, factor: Factor) -> f64 {
        match factor {
            Factor::Fx => self.fx,
            Factor::Credit => self.credit,
            Factor::Global => self.global,
            Factor::Rate => self.rate,
            Factor::Liquidity => self.liquidity,
        }
    }

    /// Weight in basis points (0.30 -> 3000). Non-finite or negative weights map to 0.
    pub fn basis_points(&self, factor: Factor) -> i64 {
        let w = self.weight(factor);
        if !w.is_finite() || w <= 0.0 {
            return 0;
        }
        (w * WEIGHT_BP_SCALE as f64).round() as i64
    }
}

/// Hysteresis thresholds and confirmation window.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RegimeConfig {
    /// Consecutive cycles a move condition must hold before it commits.
    pub confirmation_window: u32,
    /// ON moves toward NEUTRAL when score < this.
    pub on_exit_below: u32,
    /// NEUTRAL moves toward ON when score > this.
    pub neutral_to_on_above: u32,
    /// NEUTRAL moves toward OFF when score < this.
    pub neutral_to_off_below: u32,
    /// OFF moves toward NEUTRAL when score > this.
    pub off_exit_above: u32,
    /// Immediate rule (first cycle, kill recovery): score >= this is ON.
    pub immediate_on_at: u32,
    /// Immediate rule: score >= this is NEUTRAL, else OFF.
    pub immediate_neutral_at: u32,
}

impl Default for RegimeConfig {
    fn default() -> Self {
        Self {
            confirmation_window: 2,
            on_exit_below: 57,
            neutral_to_on_above: 63,
            neutral_to_off_below: 37,
            off_exit_above: 43,
            immediate_on_at: 60,
            immediate_neutral_at: 40,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct BudgetConfig {
    pub on: RiskBudget,
    pub neutral: RiskBudget,
    pub off: RiskBudget,
    pub off_kill: RiskBudget,
    /// Absolute floor on adjusted positions.
    pub min_positions: u32,
    /// Soft reduction at or above this switches entry stance to cautious.
    pub cautious_at: f64,
}

impl Default for BudgetConfig {
    fn default() -> Self {
        Self {
            on: RiskBudget {
                max_positions: 12,
                max_risk_multiple: 2.5,
                entry_stance: EntryStance::Normal,
            },
            neutral: RiskBudget {
                max_positions: 7,
                max_risk_multiple: 1.5,
                entry_stance: EntryStance::Selective,
            },
            off: RiskBudget {
                max_positions: 4,
                max_risk_multiple: 1.0,
                entry_stance: EntryStance::Restricted,
            },
            off_kill: RiskBudget {
                max_positions: 2,
                max_risk_multiple: 0.5,
                entry_stance: EntryStance::Forbidden,
            },
            min_positions: 2,
            cautious_at: 0.3,
        }
    }
}

impl BudgetConfig {
    pub fn for_regime(&self, regime: Regime) -> RiskBudget {
        match regime {
            Regime::On => self.on,
            Regime::Neutral => self.neutral,
            Regime::Off => self.off,
            Regime::OffKill => self.off_kill,
        }
    }
}

impl EngineConfig {
    /// Production constants.
    pub fn sane_defaults() -> Self {
        Self::default()
    }

    /// Reject configurations the engine cannot evaluate consistently.
    pub fn validate(&self) -> Result<()> {
        self.validate_weights()?;
        self.validate_scoring()?;
        self.validate_gates()?;
        self.validate_regime()?;
        self.validate_budget()?;
        self.validate_limits()?;
        Ok(())
    }

    fn validate_weights(&self) -> Result<()> {
        let mut sum_bp = 0i64;
        for f in Factor::ALL {
            let w = self.weights.weight(f);
            if !w.is_finite() || w < 0.0 {
                bail!(
                    "ENGINE_CONFIG_INVALID: weight for {} must be a finite non-negative number, got {}",
                    f.as_str(),
                    w
                );
            }
            sum_bp += self.weights.basis_points(f);
        }
        if sum_bp != WEIGHT_BP_SCALE {
            bail!(
                "ENGINE_CONFIG_INVALID: factor weights must sum to 1.0, got {:.4}",
                sum_bp as f64 / WEIGHT_BP_SCALE as f64
            );
        }
        Ok(())
    }

    fn validate_scoring(&self) -> Result<()> {
        let s = &self.scoring;
        check_bands("scoring.fx", &s.fx.abs_change_edges, &s.fx.scores, Order::Ascending)?;
        check_bands(
            "scoring.credit",
            &s.credit.level_edges_bp,
            &s.credit.scores,
            Order::Ascending,
        )?;
        check_bands(
            "scoring.global",
            &s.global.volatility_edges,
            &s.global.scores,
            Order::Ascending,
        )?;
        check_bands(
            "scoring.liquidity",
            &s.liquidity.volume_ratio_floors,
            &s.liquidity.scores,
            Order::Descending,
        )?;
        if !(s.global.severe_equity_drop <= s.global.mild_equity_drop) {
            bail!("ENGINE_CONFIG_INVALID: scoring.global severe_equity_drop must be <= mild_equity_drop");
        }
        Ok(())
    }

    fn validate_gates(&self) -> Result<()> {
        let g = &self.gates;
        for (name, v) in [
            ("k4_reduction", g.k4_reduction),
            ("k5_reduction", g.k5_reduction),
            ("max_soft_reduction", g.max_soft_reduction),
        ] {
            if !(0.0..=1.0).contains(&v) {
                bail!("ENGINE_CONFIG_INVALID: gates.{name} must be within [0, 1], got {v}");
            }
        }
        Ok(())
    }

    fn validate_regime(&self) -> Result<()> {
        let r = &self.regime;
        if r.confirmation_window == 0 {
            bail!("ENGINE_CONFIG_INVALID: regime.confirmation_window must be >= 1");
        }
        if r.immediate_neutral_at >= r.immediate_on_at || r.immediate_on_at > 100 {
            bail!(
                "ENGINE_CONFIG_INVALID: regime immediate thresholds must satisfy neutral_at < on_at <= 100"
            );
        }
        let straddles = r.on_exit_below < r.immediate_on_at
            && r.immediate_on_at <= r.neutral_to_on_above
            && r.neutral_to_off_below < r.immediate_neutral_at
            && r.immediate_neutral_at <= r.off_exit_above
            && r.off_exit_above < r.on_exit_below;
        if !straddles {
            bail!(
                "ENGINE_CONFIG_INVALID: hysteresis thresholds must straddle the immediate thresholds \
                (neutral_to_off_below < immediate_neutral_at <= off_exit_above < on_exit_below < immediate_on_at <= neutral_to_on_above)"
            );
        }
        Ok(())
    }

    fn validate_budget(&self) -> Result<()> {
        let b = &self.budget;
        if b.min_positions == 0 {
            bail!("ENGINE_CONFIG_INVALID: budget.min_positions must be >= 1");
        }
        for regime in [Regime::On, Regime::Neutral, Regime::Off, Regime::OffKill] {
            let rb = b.for_regime(regime);
            if !rb.max_risk_multiple.is_finite() || rb.max_risk_multiple < 0.0 {
                bail!(
                    "ENGINE_CONFIG_INVALID: budget for {} has invalid max_risk_multiple {}",
                    regime,
                    rb.max_risk_multiple
                );
            }
        }
        if !(0.0..=1.0).contains(&b.cautious_at) {
            bail!("ENGINE_CONFIG_INVALID: budget.cautious_at must be within [0, 1]");
        }
        Ok(())
    }

    fn validate_limits(&self) -> Result<()> {
        let v = &self.validation;
        if !(v.volatility_min < v.volatility_max) {
            bail!("ENGINE_CONFIG_INVALID: validation.volatility_min must be < volatility_max");
        }
        if !(v.spread_level_min_bp < v.spread_level_max_bp) {
            bail!("ENGINE_CONFIG_INVALID: validation.spread_level_min_bp must be < spread_level_max_bp");
        }
        if !(v.currency_change_warn <= v.currency_change_error) {
            bail!("ENGINE_CONFIG_INVALID: validation.currency_change_warn must be <= currency_change_error");
        }
        if !(v.spread_delta_warn_bp <= v.spread_delta_error_bp) {
            bail!("ENGINE_CONFIG_INVALID: validation.spread_delta_warn_bp must be <= spread_delta_error_bp");
        }
        Ok(())
    }
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum Order {
    Ascending,
    Descending,
}

fn check_bands(name: &str, edges: &[f64], scores: &[u8], order: Order) -> Result<()> {
    if edges.is_empty() {
        bail!("ENGINE_CONFIG_INVALID: {name} needs at least one band edge");
    }
    if scores.len() != edges.len() + 1 {
        bail!(
            "ENGINE_CONFIG_INVALID: {name} needs {} scores for {} edges, got {}",
            edges.len() + 1,
            edges.len(),
            scores.len()
        );
    }
    if edges.iter().any(|e| !e.is_finite()) {
        bail!("ENGINE_CONFIG_INVALID: {name} band edges must be finite");
    }
    let ordered = edges.windows(2).all(|w| match order {
        Order::Ascending => w[0] < w[1],
        Order::Descending => w[0] > w[1],
    });
    if !ordered {
        bail!("ENGINE_CONFIG_INVALID: {name} band edges must be strictly monotone");
    }
    if scores.iter().any(|s| *s > 100) {
        bail!("ENGINE_CONFIG_INVALID: {name} scores must be within 0..=100");
    }
    // Monotone by construction: a worse band never scores higher.
    if scores.windows(2).any(|w| w[1] > w[0]) {
        bail!("ENGINE_CONFIG_INVALID: {name} scores must be non-increasing across bands");
    }
    Ok(())
}
