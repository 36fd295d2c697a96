//! Scenario: K1..K5 gate thresholds are exact on both sides.
//!
//! K1..K3 are hard kills, K4..K5 soft vetoes with fixed budget reductions.

use mrf_engine::*;

fn calm() -> Observation {
    Observation {
        currency_weekly_change: 0.0,
        spread_level_bp: 200.0,
        spread_weekly_delta_bp: 0.0,
        volatility_index: 15.0,
        global_equity_weekly_change: 0.0,
        local_broad_weekly_change: 0.0,
        local_financials_weekly_change: 0.0,
        volume_ratio: 1.0,
        rate_proxy_score: 50.0,
    }
}

fn gates(obs: &Observation) -> GateResult {
    evaluate_gates(&GateThresholds::default(), obs)
}

#[test]
fn calm_week_passes_every_gate() {
    let g = gates(&calm());
    assert!(GateId::ALL.iter().all(|id| g.passed(*id)));
    assert!(!g.hard_kill());
    assert_eq!(GateThresholds::default().soft_reduction(&g), 0.0);
}

#[test]
fn k1_fails_at_five_percent_weakening() {
    let pass = gates(&Observation {
        currency_weekly_change: 0.0499,
        ..calm()
    });
    let fail = gates(&Observation {
        currency_weekly_change: 0.05,
        ..calm()
    });
    assert!(pass.passed(GateId::K1));
    assert!(!fail.passed(GateId::K1));
    assert!(fail.hard_kill());
}

#[test]
fn k1_ignores_strengthening() {
    let g = gates(&Observation {
        currency_weekly_change: -0.08,
        ..calm()
    });
    assert!(g.passed(GateId::K1));
}

#[test]
fn k2_fails_on_level_or_spike() {
    let level_ok = gates(&Observation {
        spread_level_bp: 699.9,
        ..calm()
    });
    let level_fail = gates(&Observation {
        spread_level_bp: 700.0,
        ..calm()
    });
    let spike_ok = gates(&Observation {
        spread_weekly_delta_bp: 99.9,
        ..calm()
    });
    let spike_fail = gates(&Observation {
        spread_weekly_delta_bp: 100.0,
        ..calm()
    });
    assert!(level_ok.passed(GateId::K2));
    assert!(!level_fail.passed(GateId::K2));
    assert!(spike_ok.passed(GateId::K2));
    assert!(!spike_fail.passed(GateId::K2));
}

#[test]
fn k3_requires_both_volatility_and_equity_drop() {
    let both = gates(&Observation {
        volatility_index: 35.1,
        global_equity_weekly_change: -0.03,
        ..calm()
    });
    let vix_at_edge = gates(&Observation {
        volatility_index: 35.0,
        global_equity_weekly_change: -0.05,
        ..calm()
    });
    let equity_above_edge = gates(&Observation {
        volatility_index: 50.0,
        global_equity_weekly_change: -0.0299,
        ..calm()
    });
    assert!(!both.passed(GateId::K3));
    assert!(vix_at_edge.passed(GateId::K3), "vix must be strictly above 35");
    assert!(equity_above_edge.passed(GateId::K3), "equity must be <= -3%");
}

#[test]
fn k4_is_a_divergence_not_a_general_decline() {
    let divergence = gates(&Observation {
        local_financials_weekly_change: -0.05,
        local_broad_weekly_change: -0.0099,
        ..calm()
    });
    let general_decline = gates(&Observation {
        local_financials_weekly_change: -0.08,
        local_broad_weekly_change: -0.01,
        ..calm()
    });
    let mild_financials = gates(&Observation {
        local_financials_weekly_change: -0.0499,
        local_broad_weekly_change: 0.02,
        ..calm()
    });
    assert!(!divergence.passed(GateId::K4));
    assert!(!divergence.hard_kill(), "K4 is soft");
    assert!(general_decline.passed(GateId::K4));
    assert!(mild_financials.passed(GateId::K4));
}

#[test]
fn k5_liquidity_floor_is_closed() {
    let at_floor = gates(&Observation {
        volume_ratio: 0.5,
        ..calm()
    });
    let below = gates(&Observation {
        volume_ratio: 0.49,
        ..calm()
    });
    assert!(at_floor.passed(GateId::K5));
    assert!(!below.passed(GateId::K5));
    assert!(!below.hard_kill());
}

#[test]
fn soft_reductions_sum_and_clamp() {
    let th = GateThresholds::default();
    let both = gates(&Observation {
        local_financials_weekly_change: -0.06,
        local_broad_weekly_change: 0.0,
        volume_ratio: 0.3,
        ..calm()
    });
    assert!((th.soft_reduction(&both) - 0.40).abs() < 1e-12);

    let capped = GateThresholds {
        k4_reduction: 0.4,
        k5_reduction: 0.4,
        ..GateThresholds::default()
    };
    assert!((capped.soft_reduction(&both) - 0.5).abs() < 1e-12);

    let only_k5 = gates(&Observation {
        volume_ratio: 0.3,
        ..calm()
    });
    assert!((th.soft_reduction(&only_k5) - 0.15).abs() < 1e-12);
    assert_eq!(
        only_k5.failed_soft().map(|g| g.reason()).collect::<Vec<_>>(),
        vec!["K5: low liquidity".to_string()]
    );
}

#[test]
fn non_finite_inputs_fail_k1_and_k2_closed() {
    let g = gates(&Observation {
        currency_weekly_change: f64::NAN,
        spread_level_bp: f64::INFINITY,
        ..calm()
    });
    assert!(!g.passed(GateId::K1));
    assert!(!g.passed(GateId::K2));
}
