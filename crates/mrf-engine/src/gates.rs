use crate::{GateId, GateResult, GateThresholds, Observation};

/// Evaluate K1..K5. `true` means the gate passed.
///
/// Gates compare raw observations against fixed thresholds; they do not look
/// at factor scores. K1 and K2 are written as "pass while below", so a
/// non-finite input fails them closed.
pub fn evaluate_gates(th: &GateThresholds, obs: &Observation) -> GateResult {
    // K1 currency shock: weakening of k1 or more fails.
    let k1 = obs.currency_weekly_change < th.k1_currency_shock;

    // K2 credit event: level at/above the cap or a weekly spike at/above the cap.
    let k2 = obs.spread_level_bp < th.k2_spread_level_bp
        && obs.spread_weekly_delta_bp < th.k2_spread_spike_bp;

    // K3 global panic: both high volatility AND a global equity drop.
    // The conjunction is a policy choice; either leg alone does not kill.
    let k3 = !(obs.volatility_index > th.k3_volatility
        && obs.global_equity_weekly_change <= th.k3_global_equity_drop);

    // K4 sector divergence: financials drop hard while the broad index holds up.
    let k4 = !(obs.local_financials_weekly_change <= th.k4_financials_drop
        && obs.local_broad_weekly_change > th.k4_broad_stable);

    // K5 liquidity floor.
    let k5 = obs.volume_ratio >= th.k5_volume_ratio;

    let mut out = GateResult::default();
    out.checks.insert(GateId::K1, k1);
    out.checks.insert(GateId::K2, k2);
    out.checks.insert(GateId::K3, k3);
    out.checks.insert(GateId::K4, k4);
    out.checks.insert(GateId::K5, k5);
    out
}

impl GateThresholds {
    /// Budget reduction fraction applied when `gate` fails. Hard gates carry none.
    pub fn reduction_for(&self, gate: GateId) -> f64 {
        match gate {
            GateId::K4 => self.k4_reduction,
            GateId::K5 => self.k5_reduction,
            _ => 0.0,
        }
    }

    /// Sum of failing soft-gate reductions, clamped to `[0, max_soft_reduction]`.
    pub fn soft_reduction(&self, gates: &GateResult) -> f64 {
        let total: f64 = gates.failed_soft().map(|g| self.reduction_for(g)).sum();
        total.clamp(0.0, self.max_soft_reduction.max(0.0))
    }
}
