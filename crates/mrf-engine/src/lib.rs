//! mrf-engine
//!
//! Macro risk filter decision engine.
//!
//! One cycle per observation period:
//! - validate the raw observation and grade data confidence
//! - evaluate the K1..K5 gates (hard kills and soft vetoes)
//! - score the five factors and aggregate them into a 0..100 total
//! - step the hysteresis regime state machine
//! - derive the base and soft-veto-adjusted risk budget
//!
//! Deterministic, pure logic. No IO, no time, no globals. Cross-cycle state is
//! the explicit [`EngineState`] value threaded in and out of [`evaluate`].

mod aggregate;
mod budget;
mod config;
mod engine;
mod gates;
mod regime;
mod score;
mod types;
mod validate;

pub use aggregate::{aggregate, weighted_contributions};
pub use budget::{adjust_budget, base_budget};
pub use config::*;
pub use engine::evaluate;
pub use gates::evaluate_gates;
pub use regime::{immediate_regime, step_regime, RegimeStep};
pub use score::{
    score_all, CreditScorer, FactorScorer, FxScorer, GlobalScorer, LiquidityScorer,
    RateProxyScorer,
};
pub use types::*;
pub use validate::validate_observation;
