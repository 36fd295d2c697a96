use crate::{Observation, ValidationLimits, ValidationResult};

/// Sanity-check one observation.
///
/// Errors mark values as implausible (confidence LOW, `is_valid = false`);
/// warnings mark plausible-but-notable values and cross-field inconsistencies
/// (confidence MEDIUM). Never fails: the cycle always proceeds and the caller
/// decides whether to act on the result.
pub fn validate_observation(limits: &ValidationLimits, obs: &Observation) -> ValidationResult {
    let mut errors = Vec::new();
    let mut warnings = Vec::new();

    // Non-finite values make every downstream comparison meaningless.
    for (name, v) in obs.fields() {
        if !v.is_finite() {
            errors.push(format!("{name}: non-finite value ({v})"));
        }
    }

    let fx = obs.currency_weekly_change.abs();
    if fx > limits.currency_change_error {
        errors.push(format!(
            "currency_weekly_change: |{:+.2}%| exceeds {:.0}% plausibility limit",
            obs.currency_weekly_change * 100.0,
            limits.currency_change_error * 100.0
        ));
    } else if fx > limits.currency_change_warn {
        warnings.push(format!(
            "currency_weekly_change: |{:+.2}%| above {:.0}%",
            obs.currency_weekly_change * 100.0,
            limits.currency_change_warn * 100.0
        ));
    }

    let level = obs.spread_level_bp;
    if level < limits.spread_level_min_bp || level > limits.spread_level_max_bp {
        errors.push(format!(
            "spread_level_bp: {level:.0}bp outside [{:.0}, {:.0}]",
            limits.spread_level_min_bp, limits.spread_level_max_bp
        ));
    }

    let delta = obs.spread_weekly_delta_bp.abs();
    if delta > limits.spread_delta_error_bp {
        errors.push(format!(
            "spread_weekly_delta_bp: |{:+.0}bp| exceeds {:.0}bp plausibility limit",
            obs.spread_weekly_delta_bp, limits.spread_delta_error_bp
        ));
    } else if delta > limits.spread_delta_warn_bp {
        warnings.push(format!(
            "spread_weekly_delta_bp: |{:+.0}bp| above {:.0}bp",
            obs.spread_weekly_delta_bp, limits.spread_delta_warn_bp
        ));
    }

    let vol = obs.volatility_index;
    if vol < limits.volatility_min || vol > limits.volatility_max {
        errors.push(format!(
            "volatility_index: {vol:.1} outside [{:.0}, {:.0}]",
            limits.volatility_min, limits.volatility_max
        ));
    }

    if obs.volume_ratio < 0.0 {
        errors.push(format!(
            "volume_ratio: {:.2} is negative",
            obs.volume_ratio
        ));
    }

    if obs.rate_proxy_score < 0.0 || obs.rate_proxy_score > 100.0 {
        warnings.push(format!(
            "rate_proxy_score: {:.1} outside [0, 100], clamped",
            obs.rate_proxy_score
        ));
    }

    // Cross-field consistency (warnings only).
    if obs.spread_weekly_delta_bp < limits.inconsistent_spread_drop_bp
        && obs.currency_weekly_change > limits.inconsistent_currency_weakening
    {
        warnings.push(format!(
            "inconsistent: spread fell {:+.0}bp while currency weakened {:+.2}%",
            obs.spread_weekly_delta_bp,
            obs.currency_weekly_change * 100.0
        ));
    }
    if obs.spread_weekly_delta_bp > limits.inconsistent_spread_rise_bp
        && obs.currency_weekly_change < limits.inconsistent_currency_strengthening
    {
        warnings.push(format!(
            "inconsistent: spread rose {:+.0}bp while currency strengthened {:+.2}%",
            obs.spread_weekly_delta_bp,
            obs.currency_weekly_change * 100.0
        ));
    }
    if obs.volatility_index > limits.artifact_volatility
        && obs.global_equity_weekly_change > limits.artifact_global_equity_rally
    {
        warnings.push(format!(
            "volatility {:.1} with global equity {:+.2}%: possible regime-transition artifact",
            obs.volatility_index,
            obs.global_equity_weekly_change * 100.0
        ));
    }

    ValidationResult::from_findings(errors, warnings)
}
