use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// One observation period (a week) of manually gathered indicators.
///
/// All `*_weekly_change` fields are fractions (`0.008` = +0.8%), never
/// percentage-scaled. Callers that collect percentages must divide before
/// building this value.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Observation {
    /// Local currency weekly change vs the reference currency (positive = weaker local currency).
    pub currency_weekly_change: f64,
    /// Sovereign credit spread level in basis points.
    pub spread_level_bp: f64,
    /// Weekly change of the sovereign spread in basis points.
    pub spread_weekly_delta_bp: f64,
    /// Global volatility index level.
    pub volatility_index: f64,
    /// Broad global equity index weekly change.
    pub global_equity_weekly_change: f64,
    /// Local broad index weekly change.
    pub local_broad_weekly_change: f64,
    /// Local financial-sector index weekly change.
    pub local_financials_weekly_change: f64,
    /// Trading volume vs baseline (1.0 = normal).
    pub volume_ratio: f64,
    /// Manually supplied rate-policy proxy, 0..100. Passed through, never derived.
    pub rate_proxy_score: f64,
}

impl Observation {
    /// Field name / value pairs in declaration order.
    pub fn fields(&self) -> [(&'static str, f64); 9] {
        [
            ("currency_weekly_change", self.currency_weekly_change),
            ("spread_level_bp", self.spread_level_bp),
            ("spread_weekly_delta_bp", self.spread_weekly_delta_bp),
            ("volatility_index", self.volatility_index),
            ("global_equity_weekly_change", self.global_equity_weekly_change),
            ("local_broad_weekly_change", self.local_broad_weekly_change),
            ("local_financials_weekly_change", self.local_financials_weekly_change),
            ("volume_ratio", self.volume_ratio),
            ("rate_proxy_score", self.rate_proxy_score),
        ]
    }
}

/// Risk posture.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Regime {
    On,
    Neutral,
    Off,
    OffKill,
}

impl Regime {
    pub fn as_str(&self) -> &'static str {
        match self {
            Regime::On => "ON",
            Regime::Neutral => "NEUTRAL",
            Regime::Off => "OFF",
            Regime::OffKill => "OFF_KILL",
        }
    }
}

impl fmt::Display for Regime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Operator-controlled override. While engaged, every cycle takes the hard-kill
/// path. Only an explicit operator action clears it.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ManualOverride {
    pub engaged: bool,
    #[serde(default)]
    pub reason: Option<String>,
}

impl ManualOverride {
    pub fn disengaged() -> Self {
        Self {
            engaged: false,
            reason: None,
        }
    }

    pub fn engaged(reason: impl Into<String>) -> Self {
        Self {
            engaged: true,
            reason: Some(reason.into()),
        }
    }

    pub fn kill_reason(&self) -> String {
        match self.reason.as_deref().map(str::trim) {
            Some(r) if !r.is_empty() => format!("manual override: {r}"),
            _ => "manual override".to_string(),
        }
    }
}

/// Engine state persisted by the caller between cycles.
///
/// Owned by the regime state machine: [`crate::evaluate`] reads it once and
/// returns the replacement; nothing else mutates it.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EngineState {
    /// `None` until the first cycle has run.
    pub regime: Option<Regime>,
    /// Consecutive cycles the current move condition has held.
    pub pending_transition_weeks: u32,
    /// Target of the move being confirmed, if any.
    #[serde(default)]
    pub pending_target: Option<Regime>,
    /// Total score of the last evaluated cycle.
    #[serde(default)]
    pub last_total_score: Option<u32>,
}

impl EngineState {
    pub fn new() -> Self {
        Self::default()
    }

    /// State as it would be persisted after a cycle that settled in `regime`.
    pub fn settled(regime: Regime, last_total_score: u32) -> Self {
        Self {
            regime: Some(regime),
            pending_transition_weeks: 0,
            pending_target: None,
            last_total_score: Some(last_total_score),
        }
    }
}

/// Data-confidence grade.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Confidence {
    High,
    Medium,
    Low,
}

impl Confidence {
    pub fn as_str(&self) -> &'static str {
        match self {
            Confidence::High => "HIGH",
            Confidence::Medium => "MEDIUM",
            Confidence::Low => "LOW",
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationResult {
    pub is_valid: bool,
    pub confidence: Confidence,
    pub errors: Vec<String>,
    pub warnings: Vec<String>,
}

impl ValidationResult {
    /// Grades confidence: LOW iff any error, else MEDIUM iff any warning, else HIGH.
    pub fn from_findings(errors: Vec<String>, warnings: Vec<String>) -> Self {
        let confidence = if !errors.is_empty() {
            Confidence::Low
        } else if !warnings.is_empty() {
            Confidence::Medium
        } else {
            Confidence::High
        };
        Self {
            is_valid: errors.is_empty(),
            confidence,
            errors,
            warnings,
        }
    }
}

/// Scored factors, in aggregation order.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Factor {
    Fx,
    Credit,
    Global,
    Rate,
    Liquidity,
}

impl Factor {
    pub const ALL: [Factor; 5] = [
        Factor::Fx,
        Factor::Credit,
        Factor::Global,
        Factor::Rate,
        Factor::Liquidity,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Factor::Fx => "fx",
            Factor::Credit => "credit",
            Factor::Global => "global",
            Factor::Rate => "rate",
            Factor::Liquidity => "liquidity",
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct FactorScore {
    /// 0..=100
    pub score: u8,
    pub status: String,
}

impl FactorScore {
    pub fn new(score: u8, status: &str) -> Self {
        Self {
            score: score.min(100),
            status: status.to_string(),
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FactorScores {
    pub scores: BTreeMap<Factor, FactorScore>,
}

impl FactorScores {
    /// Sub-score for `factor`; 0 when absent.
    pub fn score(&self, factor: Factor) -> u8 {
        self.scores.get(&factor).map(|s| s.score).unwrap_or(0)
    }

    pub fn status(&self, factor: Factor) -> &str {
        self.scores
            .get(&factor)
            .map(|s| s.status.as_str())
            .unwrap_or("missing")
    }
}

/// Score breakdown line: sub-score, weight and weighted contribution.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct FactorBreakdown {
    pub factor: Factor,
    pub score: u8,
    pub status: String,
    pub weight: f64,
    pub contribution: f64,
}

/// Gate identifiers. K1..K3 are hard kills, K4..K5 soft vetoes.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum GateId {
    K1,
    K2,
    K3,
    K4,
    K5,
}

impl GateId {
    pub const ALL: [GateId; 5] = [GateId::K1, GateId::K2, GateId::K3, GateId::K4, GateId::K5];

    pub fn is_hard(&self) -> bool {
        matches!(self, GateId::K1 | GateId::K2 | GateId::K3)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            GateId::K1 => "K1",
            GateId::K2 => "K2",
            GateId::K3 => "K3",
            GateId::K4 => "K4",
            GateId::K5 => "K5",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            GateId::K1 => "currency shock",
            GateId::K2 => "credit event",
            GateId::K3 => "global panic",
            GateId::K4 => "financial-sector divergence",
            GateId::K5 => "low liquidity",
        }
    }

    /// Reason string used when this gate fails, e.g. `K1: currency shock`.
    pub fn reason(&self) -> String {
        format!("{}: {}", self.as_str(), self.label())
    }
}

/// Outcome of the five gates: `true` = passed.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GateResult {
    pub checks: BTreeMap<GateId, bool>,
}

impl GateResult {
    /// A gate missing from the map counts as failed.
    pub fn passed(&self, gate: GateId) -> bool {
        self.checks.get(&gate).copied().unwrap_or(false)
    }

    pub fn failed(&self) -> impl Iterator<Item = GateId> + '_ {
        GateId::ALL.into_iter().filter(|g| !self.passed(*g))
    }

    /// True when any of K1..K3 failed. Does not include the manual override.
    pub fn hard_kill(&self) -> bool {
        self.failed().any(|g| g.is_hard())
    }

    pub fn failed_soft(&self) -> impl Iterator<Item = GateId> + '_ {
        self.failed().filter(|g| !g.is_hard())
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntryStance {
    Normal,
    Selective,
    Restricted,
    Forbidden,
    Cautious,
}

impl EntryStance {
    pub fn as_str(&self) -> &'static str {
        match self {
            EntryStance::Normal => "normal",
            EntryStance::Selective => "selective",
            EntryStance::Restricted => "restricted",
            EntryStance::Forbidden => "forbidden",
            EntryStance::Cautious => "cautious",
        }
    }
}

/// Position/risk budget permitted in a regime.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RiskBudget {
    pub max_positions: u32,
    /// Total open risk, in multiples of the per-trade risk unit (R).
    pub max_risk_multiple: f64,
    pub entry_stance: EntryStance,
}

/// Coarse reading of the total score, independent of hysteresis.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScoreBand {
    Strong,
    Mixed,
    Weak,
}

impl ScoreBand {
    pub fn as_str(&self) -> &'static str {
        match self {
            ScoreBand::Strong => "strong",
            ScoreBand::Mixed => "mixed",
            ScoreBand::Weak => "weak",
        }
    }
}

/// What the regime state machine did this cycle.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Transition {
    /// First cycle: regime picked from immediate thresholds.
    Initialized { to: Regime },
    /// No move condition met.
    Held { regime: Regime },
    /// Move condition met but not yet confirmed.
    Pending {
        from: Regime,
        to: Regime,
        weeks: u32,
        window: u32,
    },
    /// Move confirmed and applied.
    Committed { from: Regime, to: Regime },
    /// Hard kill in force.
    Killed { from: Option<Regime> },
    /// Hard kill lifted; regime picked from immediate thresholds.
    Recovered { to: Regime },
}

impl fmt::Display for Transition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Transition::Initialized { to } => write!(f, "initialized at {to}"),
            Transition::Held { regime } => write!(f, "{regime} confirmed"),
            Transition::Pending {
                from,
                to,
                weeks,
                window,
            } => write!(f, "{from} -> {to} pending ({weeks}/{window})"),
            Transition::Committed { from, to } => write!(f, "{from} -> {to} committed"),
            Transition::Killed { from: Some(from) } if *from == Regime::OffKill => {
                write!(f, "hard kill in force")
            }
            Transition::Killed { from: Some(from) } => write!(f, "{from} -> OFF_KILL hard kill"),
            Transition::Killed { from: None } => write!(f, "initialized at OFF_KILL hard kill"),
            Transition::Recovered { to } => write!(f, "OFF_KILL -> {to} recovered"),
        }
    }
}

/// Per-cycle output handed to the presentation layer.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Decision {
    pub regime: Regime,
    pub total_score: u32,
    pub score_band: ScoreBand,
    pub factors: Vec<FactorBreakdown>,
    pub gates: GateResult,
    pub hard_kill: bool,
    pub kill_reasons: Vec<String>,
    pub soft_reduction: f64,
    pub soft_veto_reasons: Vec<String>,
    pub base_budget: RiskBudget,
    pub adjusted_budget: RiskBudget,
    pub transition: Transition,
    pub transition_note: String,
    pub validation: ValidationResult,
}

impl Decision {
    /// False when the caller should refuse to act on this decision.
    pub fn is_actionable(&self) -> bool {
        self.validation.is_valid && self.validation.confidence != Confidence::Low
    }
}

/// Result of one [`crate::evaluate`] call.
#[derive(Clone, Debug, PartialEq)]
pub struct CycleOutcome {
    pub decision: Decision,
    /// Replacement state for the caller to persist.
    pub state: EngineState,
}
