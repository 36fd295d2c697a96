use crate::{
    CreditScoring, Factor, FactorScore, FactorScores, FxScoring, GlobalScoring, LiquidityScoring,
    Observation, ScoringConfig,
};

/// One factor's scoring rule: a pure step function of the raw observation.
pub trait FactorScorer {
    fn factor(&self) -> Factor;
    fn score(&self, obs: &Observation) -> FactorScore;
}

const FX_LABELS: &[&str] = &["safe", "normal", "alarm", "danger", "shock"];
const CREDIT_LABELS: &[&str] = &["safe", "normal", "caution", "risky", "crisis", "collapse"];
const GLOBAL_LABELS: &[&str] = &["calm", "normal", "tense", "alarm", "panic"];
const LIQUIDITY_LABELS: &[&str] = &["high", "normal", "low", "critical"];

/// Scores |currency weekly change| against ascending band edges.
pub struct FxScorer<'a> {
    pub cfg: &'a FxScoring,
}

impl FactorScorer for FxScorer<'_> {
    fn factor(&self) -> Factor {
        Factor::Fx
    }

    fn score(&self, obs: &Observation) -> FactorScore {
        let band = band_below(obs.currency_weekly_change.abs(), &self.cfg.abs_change_edges);
        FactorScore::new(score_at(&self.cfg.scores, band), label_at(FX_LABELS, band))
    }
}

/// Scores the spread level, then penalises a weekly spike.
pub struct CreditScorer<'a> {
    pub cfg: &'a CreditScoring,
}

impl FactorScorer for CreditScorer<'_> {
    fn factor(&self) -> Factor {
        Factor::Credit
    }

    fn score(&self, obs: &Observation) -> FactorScore {
        let band = band_below(obs.spread_level_bp, &self.cfg.level_edges_bp);
        let mut score = score_at(&self.cfg.scores, band);
        if obs.spread_weekly_delta_bp > self.cfg.spike_delta_bp {
            score = score.saturating_sub(self.cfg.spike_penalty);
        }
        FactorScore::new(score, label_at(CREDIT_LABELS, band))
    }
}

/// Scores the volatility index, then penalises a global equity sell-off.
pub struct GlobalScorer<'a> {
    pub cfg: &'a GlobalScoring,
}

impl FactorScorer for GlobalScorer<'_> {
    fn factor(&self) -> Factor {
        Factor::Global
    }

    fn score(&self, obs: &Observation) -> FactorScore {
        let band = band_below(obs.volatility_index, &self.cfg.volatility_edges);
        let mut score = score_at(&self.cfg.scores, band);
        let eq = obs.global_equity_weekly_change;
        if eq < self.cfg.severe_equity_drop {
            score = score.saturating_sub(self.cfg.severe_penalty);
        } else if eq < self.cfg.mild_equity_drop {
            score = score.saturating_sub(self.cfg.mild_penalty);
        }
        FactorScore::new(score, label_at(GLOBAL_LABELS, band))
    }
}

/// Scores the volume ratio against descending floors.
pub struct LiquidityScorer<'a> {
    pub cfg: &'a LiquidityScoring,
}

impl FactorScorer for LiquidityScorer<'_> {
    fn factor(&self) -> Factor {
        Factor::Liquidity
    }

    fn score(&self, obs: &Observation) -> FactorScore {
        let band = band_at_or_above(obs.volume_ratio, &self.cfg.volume_ratio_floors);
        FactorScore::new(score_at(&self.cfg.scores, band), label_at(LIQUIDITY_LABELS, band))
    }
}

/// Passes the operator's rate proxy through, clamped to 0..=100. Always approximate.
pub struct RateProxyScorer;

impl FactorScorer for RateProxyScorer {
    fn factor(&self) -> Factor {
        Factor::Rate
    }

    fn score(&self, obs: &Observation) -> FactorScore {
        let v = obs.rate_proxy_score;
        let score = if v.is_finite() {
            v.clamp(0.0, 100.0).round() as u8
        } else {
            0
        };
        FactorScore::new(score, "proxy")
    }
}

/// Run all five scorers.
pub fn score_all(cfg: &ScoringConfig, obs: &Observation) -> FactorScores {
    let scorers: [&dyn FactorScorer; 5] = [
        &FxScorer { cfg: &cfg.fx },
        &CreditScorer { cfg: &cfg.credit },
        &GlobalScorer { cfg: &cfg.global },
        &RateProxyScorer,
        &LiquidityScorer { cfg: &cfg.liquidity },
    ];

    let mut out = FactorScores::default();
    for s in scorers {
        out.scores.insert(s.factor(), s.score(obs));
    }
    out
}

/// Index of the first band whose edge is strictly above `value`; the last band
/// when none is. NaN lands in the last (worst) band.
fn band_below(value: f64, edges: &[f64]) -> usize {
    edges
        .iter()
        .position(|e| value < *e)
        .unwrap_or(edges.len())
}

/// Index of the first floor `value` reaches; the last band when none is reached.
fn band_at_or_above(value: f64, floors: &[f64]) -> usize {
    floors
        .iter()
        .position(|f| value >= *f)
        .unwrap_or(floors.len())
}

fn score_at(scores: &[u8], band: usize) -> u8 {
    scores
        .get(band)
        .or_else(|| scores.last())
        .copied()
        .unwrap_or(0)
        .min(100)
}

fn label_at(labels: &[&'static str], band: usize) -> &'static str {
    labels
        .get(band)
        .or_else(|| labels.last())
        .copied()
        .unwrap_or("unknown")
}
