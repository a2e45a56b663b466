//! Property-based tests for the filter, the z-score and the signal policy
//!
//! These tests use proptest to verify invariants across many random inputs,
//! catching edge cases that unit tests might miss.

use proptest::prelude::*;
use statarb::math::kalman::is_psd;
use statarb::math::{KalmanConfig, KalmanHedgeRatio, RollingZScore};
use statarb::strategy::{Position, Signal, SignalPolicy, ThresholdPolicy};

fn position_strategy() -> impl Strategy<Value = Position> {
    prop_oneof![
        Just(Position::Flat),
        Just(Position::LongSpread),
        Just(Position::ShortSpread),
    ]
}

proptest! {
    /// Covariance stays symmetric PSD whatever the observations
    #[test]
    fn covariance_stays_psd(
        q in 1e-8f64..1e-1,
        r in 1e-6f64..1.0,
        points in prop::collection::vec((0.1f64..500.0, 0.1f64..500.0), 1..200)
    ) {
        let mut filter = KalmanHedgeRatio::new(KalmanConfig::with_noise(q, r));
        for (x, y) in points {
            let _ = filter.step(x, y);
            let p = filter.get_covariance();
            prop_assert!(is_psd(&p, 1e-9), "not PSD: {:?}", p);
            prop_assert!(filter.get_beta().is_finite());
            prop_assert!(filter.get_intercept().is_finite());
        }
    }

    /// Spread is always y minus beta times x under the posterior
    #[test]
    fn spread_uses_posterior_beta(
        points in prop::collection::vec((1.0f64..100.0, 1.0f64..100.0), 1..50)
    ) {
        let mut filter = KalmanHedgeRatio::default_for_pairs();
        for (x, y) in points {
            if let Some(est) = filter.step(x, y) {
                prop_assert!((est.spread - (y - est.hedge_ratio * x)).abs() < 1e-9);
                prop_assert!(est.innovation_variance > 0.0);
            }
        }
    }

    /// Z-score is undefined until the window fills, then finite when defined
    #[test]
    fn rolling_zscore_warms_up(
        window in 2usize..30,
        values in prop::collection::vec(-1000.0f64..1000.0, 1..100)
    ) {
        let mut z = RollingZScore::new(window);
        for (i, v) in values.iter().enumerate() {
            let out = z.push(*v);
            if i + 1 < window {
                prop_assert!(out.is_none());
            }
            if let Some(value) = out {
                prop_assert!(value.is_finite());
                // Bounded by (n-1)/sqrt(n) for a sample that includes the value
                let n = window as f64;
                prop_assert!(value.abs() <= (n - 1.0) / n.sqrt() + 1e-9);
            }
        }
    }

    /// Flat never exits, open positions never enter
    #[test]
    fn policy_respects_position(
        entry in 0.5f64..4.0,
        exit_frac in 0.0f64..0.99,
        z in prop::option::of(-10.0f64..10.0),
        position in position_strategy(),
        allowed in any::<bool>()
    ) {
        let policy = ThresholdPolicy::new(entry, entry * exit_frac);
        let signal = policy.decide(z, position, allowed);
        match position {
            Position::Flat => prop_assert!(signal != Signal::Exit),
            _ => prop_assert!(!signal.is_entry()),
        }
        if !allowed {
            prop_assert!(!signal.is_entry());
        }
        if z.is_none() {
            prop_assert_eq!(signal, Signal::Hold);
        }
    }

    /// Entries are contrarian: rich spread is sold, cheap spread is bought
    #[test]
    fn entries_are_contrarian(
        entry in 0.5f64..4.0,
        z in -10.0f64..10.0
    ) {
        let policy = ThresholdPolicy::new(entry, entry / 4.0);
        match policy.decide(Some(z), Position::Flat, true) {
            Signal::EnterShortSpread => prop_assert!(z > entry),
            Signal::EnterLongSpread => prop_assert!(z < -entry),
            Signal::Hold => prop_assert!(z.abs() <= entry),
            Signal::Exit => prop_assert!(false, "exit from flat"),
        }
    }

    /// Applying any signal sequence keeps a valid position machine
    #[test]
    fn position_transitions(
        signals in prop::collection::vec(
            prop_oneof![
                Just(Signal::EnterLongSpread),
                Just(Signal::EnterShortSpread),
                Just(Signal::Exit),
                Just(Signal::Hold),
            ],
            0..50
        )
    ) {
        let mut position = Position::Flat;
        for signal in signals {
            let next = position.apply(signal);
            if position != Position::Flat && next != Position::Flat {
                prop_assert_eq!(next, position);
            }
            if signal == Signal::Hold {
                prop_assert_eq!(next, position);
            }
            position = next;
        }
    }
}
