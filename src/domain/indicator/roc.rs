//! ROC (Rate of Change).
//!
//! ROC(n)[i] = ((P[i] - P[i-n]) / P[i-n]) * 100
//! If P[i-n] == 0: ROC = 0
//! Warmup: first n values undefined.

use crate::domain::indicator::{IndicatorSeries, IndicatorType};

pub fn calculate_roc(prices: &[f64], period: usize) -> IndicatorSeries {
    let mut values = Vec::with_capacity(prices.len());

    for i in 0..prices.len() {
        let value = if period > 0 && i >= period {
            let prev = prices[i - period];
            if prev == 0.0 {
                Some(0.0)
            } else {
                Some(((prices[i] - prev) / prev) * 100.0)
            }
        } else {
            None
        };
        values.push(value);
    }

    IndicatorSeries {
        indicator_type: IndicatorType::Roc(period),
        values,
    }
}
