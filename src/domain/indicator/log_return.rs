//! Log returns: R[i] = ln(P[i] / P[i-1]). The first value is undefined.

use crate::domain::indicator::{IndicatorSeries, IndicatorType};

pub fn calculate_log_returns(prices: &[f64]) -> IndicatorSeries {
    let mut values = Vec::with_capacity(prices.len());

    for i in 0..prices.len() {
        let value = if i == 0 {
            None
        } else {
            let r = (prices[i] / prices[i - 1]).ln();
            r.is_finite().then_some(r)
        };
        values.push(value);
    }

    IndicatorSeries {
        indicator_type: IndicatorType::LogReturn,
        values,
    }
}
