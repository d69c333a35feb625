use common::{BreakDirection, Candle};
use proptest::prelude::*;
use strategy::{cluster_lows, detect_supports, is_consolidating, normalize, scan_breakouts};

fn candle_strategy() -> impl Strategy<Value = Candle> {
    (1.0f64..1000.0, 0.0f64..0.05, 0.0f64..0.05, -0.04f64..0.04).prop_map(
        |(open, up, down, change)| {
            let close = open * (1.0 + change);
            Candle::new(
                0,
                open,
                open.max(close) * (1.0 + up),
                open.min(close) * (1.0 - down),
                close,
            )
        },
    )
}

fn series(max: usize) -> impl Strategy<Value = Vec<Candle>> {
    prop::collection::vec(candle_strategy(), 0..max).prop_map(|mut v| {
        for (i, c) in v.iter_mut().enumerate() {
            c.time = i as i64 * 900;
        }
        v
    })
}

proptest! {
    /// Same window and parameters always give the same levels in the same order.
    #[test]
    fn support_detection_is_deterministic(candles in series(80), tol in 0.01f64..2.0) {
        let a = detect_supports(&candles, 36, tol);
        let b = detect_supports(&candles, 36, tol);
        prop_assert_eq!(a, b);
    }

    /// Every reported level comes from a cluster of at least two lows, so
    /// there can never be more levels than half the window.
    #[test]
    fn support_levels_are_multi_member(lows in prop::collection::vec(50.0f64..150.0, 0..60), tol in 0.0f64..5.0) {
        let clusters = cluster_lows(&lows, tol);
        let members: usize = clusters.iter().map(|c| c.member_count).sum();
        prop_assert_eq!(members, lows.len());
        let multi = clusters.iter().filter(|c| c.member_count >= 2).count();
        prop_assert!(multi <= lows.len() / 2);
    }

    /// Candidates are strictly ascending and each matches its direction rule.
    #[test]
    fn breakout_candidates_match_pattern(candles in series(60)) {
        let found = scan_breakouts(&candles);
        for w in found.windows(2) {
            prop_assert!(w[0].index < w[1].index);
        }
        for c in &found {
            prop_assert!(c.index >= 1);
            prop_assert_eq!(c.previous, candles[c.index - 1]);
            prop_assert_eq!(c.current, candles[c.index]);
            match c.direction {
                BreakDirection::Bull => {
                    prop_assert!(c.previous.close < c.previous.open);
                    prop_assert!(c.current.high > c.previous.high);
                }
                BreakDirection::Bear => {
                    prop_assert!(c.previous.close > c.previous.open);
                    prop_assert!(c.current.low < c.previous.low);
                }
            }
        }
    }

    /// A window shorter than the lookback is never consolidating.
    #[test]
    fn short_windows_never_consolidate(candles in series(8)) {
        prop_assume!(candles.len() < 8);
        prop_assert!(!is_consolidating(&candles, 8, 100.0));
    }

    /// Normalized output is always time-ascending whatever the input order.
    #[test]
    fn normalized_candles_are_sorted(times in prop::collection::vec(-1_000_000i64..1_000_000, 0..40)) {
        let raw: Vec<common::RawCandle> = times
            .iter()
            .map(|&t| serde_json::from_value(serde_json::json!({
                "time": t, "open": 1, "high": 2, "low": 0.5, "close": 1.5
            })).unwrap())
            .collect();
        let out = normalize(&raw);
        prop_assert_eq!(out.len(), times.len());
        for w in out.windows(2) {
            prop_assert!(w[0].time <= w[1].time);
        }
    }
}
