use common::{Bias, BreakoutForecast, Candle};

const MIN_HISTORY: usize = 6;
const WINDOW: usize = 20;
const RECENT: usize = 5;

/// Lightweight, explainable breakout probability from recent momentum,
/// volatility and volume. A fixed linear score squashed through a sigmoid;
/// it is advisory and never feeds the planner.
pub fn forecast(candles: &[Candle]) -> BreakoutForecast {
    if candles.len() < MIN_HISTORY {
        return BreakoutForecast {
            probability: 0.5,
            bias: Bias::Neutral,
            reason: "not enough history".to_string(),
        };
    }

    let window = &candles[candles.len() - WINDOW.min(candles.len())..];
    let returns: Vec<f64> = window
        .iter()
        .map(|c| {
            if c.open != 0.0 {
                (c.close - c.open) / c.open
            } else {
                0.0
            }
        })
        .collect();

    let recent = &returns[returns.len() - RECENT.min(returns.len())..];
    let avg_return = mean(recent);
    let volatility = sample_std(&returns);

    let vol_mean = mean(&window.iter().map(|c| c.volume).collect::<Vec<_>>());
    let latest_vol = window.last().map(|c| c.volume).unwrap_or(0.0);
    let spike = vol_mean > 0.0 && latest_vol > vol_mean * 1.5;

    let score = 2.5 * avg_return - 4.0 * volatility + if spike { 1.8 } else { 0.0 };
    let probability = sigmoid(score);

    let bias = if probability > 0.62 {
        Bias::Bullish
    } else if probability < 0.38 {
        Bias::Bearish
    } else {
        Bias::Neutral
    };

    let mut reasons = Vec::new();
    if avg_return > 0.001 {
        reasons.push("positive near-term momentum");
    }
    if avg_return < -0.001 {
        reasons.push("negative near-term momentum");
    }
    if volatility > 0.02 {
        reasons.push("high short-term volatility");
    }
    if spike {
        reasons.push("volume spike");
    }
    if reasons.is_empty() {
        reasons.push("mixed signals");
    }

    BreakoutForecast {
        probability,
        bias,
        reason: reasons.join("; "),
    }
}

fn sigmoid(x: f64) -> f64 {
    1.0 / (1.0 + (-x).exp())
}

fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

/// Standard deviation with Bessel's correction; zero for fewer than 2 values.
fn sample_std(values: &[f64]) -> f64 {
    if values.len() < 2 {
        return 0.0;
    }
    let m = mean(values);
    let var = values.iter().map(|v| (v - m).powi(2)).sum::<f64>() / (values.len() - 1) as f64;
    var.sqrt()
}
