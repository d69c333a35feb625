use common::{BreakDirection, BreakoutCandidate, Candle};

/// Scan adjacent pairs for the opposite-candle break, in ascending index order.
///
/// Bullish: the previous candle closed down and the current high exceeds the
/// previous high. Bearish: the previous candle closed up and the current low
/// undercuts the previous low. Every matching pair is reported, adjacent
/// matches are not merged.
pub fn scan_breakouts(candles: &[Candle]) -> Vec<BreakoutCandidate> {
    candles
        .windows(2)
        .enumerate()
        .filter_map(|(i, pair)| {
            let (previous, current) = (pair[0], pair[1]);
            let direction = classify(&previous, &current)?;
            Some(BreakoutCandidate {
                index: i + 1,
                previous,
                current,
                direction,
            })
        })
        .collect()
}

/// Direction of the break between `previous` and `current`, if any.
pub fn classify(previous: &Candle, current: &Candle) -> Option<BreakDirection> {
    if previous.is_bearish() && current.high > previous.high {
        Some(BreakDirection::Bull)
    } else if previous.is_bullish() && current.low < previous.low {
        Some(BreakDirection::Bear)
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bearish_then_higher_high_is_bull_break() {
        let candles = vec![
            Candle::new(0, 100.0, 101.0, 99.0, 98.0),
            Candle::new(900, 99.0, 103.0, 98.0, 102.0),
        ];
        let found = scan_breakouts(&candles);
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].index, 1);
        assert_eq!(found[0].direction, BreakDirection::Bull);
        assert_eq!(found[0].previous, candles[0]);
        assert_eq!(found[0].current, candles[1]);
    }

    #[test]
    fn bullish_then_lower_low_is_bear_break() {
        let candles = vec![
            Candle::new(0, 100.0, 102.0, 99.5, 101.0),
            Candle::new(900, 101.0, 101.5, 99.0, 99.2),
        ];
        let found = scan_breakouts(&candles);
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].direction, BreakDirection::Bear);
    }

    #[test]
    fn doji_previous_never_breaks() {
        let candles = vec![
            Candle::new(0, 100.0, 101.0, 99.0, 100.0),
            Candle::new(900, 100.0, 105.0, 95.0, 100.0),
        ];
        assert!(scan_breakouts(&candles).is_empty());
    }

    #[test]
    fn equal_high_is_not_a_break() {
        let candles = vec![
            Candle::new(0, 100.0, 101.0, 99.0, 99.5),
            Candle::new(900, 99.5, 101.0, 99.2, 100.5),
        ];
        assert!(scan_breakouts(&candles).is_empty());
    }

    #[test]
    fn adjacent_matches_are_all_reported_in_order() {
        let candles = vec![
            Candle::new(0, 100.0, 101.0, 99.0, 99.5),
            Candle::new(900, 99.5, 102.0, 99.0, 99.0),
            Candle::new(1800, 99.0, 103.0, 98.5, 98.8),
            Candle::new(2700, 98.8, 104.0, 98.0, 103.0),
        ];
        let idx: Vec<usize> = scan_breakouts(&candles).iter().map(|c| c.index).collect();
        assert_eq!(idx, vec![1, 2, 3]);
    }

    #[test]
    fn short_input_has_no_candidates() {
        assert!(scan_breakouts(&[]).is_empty());
        assert!(scan_breakouts(&[Candle::new(0, 1.0, 2.0, 0.5, 1.5)]).is_empty());
    }
}
