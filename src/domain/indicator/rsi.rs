//! RSI (Relative Strength Index).
//!
//! Uses Wilder's smoothing for average gain/loss calculation:
//! - First average: simple mean of gains/losses over first n changes
//! - Subsequent: avg = (prev_avg * (n-1) + current) / n
//!
//! Formula: RSI = 100 - (100 / (1 + avg_gain / avg_loss))
//! If avg_loss == 0: RSI = 100
//!
//! Warmup: first n values undefined (need n price changes).

use crate::domain::indicator::{IndicatorSeries, IndicatorType};

pub fn calculate_rsi(prices: &[f64], period: usize) -> IndicatorSeries {
    let mut values = vec![None; prices.len()];

    if period == 0 || prices.len() <= period {
        return IndicatorSeries {
            indicator_type: IndicatorType::Rsi(period),
            values,
        };
    }

    let (gains, losses): (Vec<f64>, Vec<f64>) = prices
        .windows(2)
        .map(|w| {
            let change = w[1] - w[0];
            (change.max(0.0), (-change).max(0.0))
        })
        .unzip();

    let mut avg_gain = gains[..period].iter().sum::<f64>() / period as f64;
    let mut avg_loss = losses[..period].iter().sum::<f64>() / period as f64;
    values[period] = Some(rsi_value(avg_gain, avg_loss));

    for i in period + 1..prices.len() {
        let change_idx = i - 1;
        avg_gain = (avg_gain * (period - 1) as f64 + gains[change_idx]) / period as f64;
        avg_loss = (avg_loss * (period - 1) as f64 + losses[change_idx]) / period as f64;
        values[i] = Some(rsi_value(avg_gain, avg_loss));
    }

    IndicatorSeries {
        indicator_type: IndicatorType::Rsi(period),
        values,
    }
}

fn rsi_value(avg_gain: f64, avg_loss: f64) -> f64 {
    if avg_loss == 0.0 {
        100.0
    } else {
        100.0 - (100.0 / (1.0 + avg_gain / avg_loss))
    }
}
