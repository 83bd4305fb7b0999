//! SMA (Simple Moving Average).
//!
//! SMA(n)[i] = sum(P[i-n+1..=i]) / n
//! Warmup: first (n-1) values undefined.

use crate::domain::indicator::{IndicatorSeries, IndicatorType};

pub fn calculate_sma(prices: &[f64], period: usize) -> IndicatorSeries {
    let mut values = Vec::with_capacity(prices.len());

    for i in 0..prices.len() {
        let value = if period > 0 && i + 1 >= period {
            let window = &prices[i + 1 - period..=i];
            Some(window.iter().sum::<f64>() / period as f64)
        } else {
            None
        };
        values.push(value);
    }

    IndicatorSeries {
        indicator_type: IndicatorType::Sma(period),
        values,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sma_warmup() {
        let series = calculate_sma(&[1.0, 2.0, 3.0, 4.0], 3);
        assert_eq!(series.values[0], None);
        assert_eq!(series.values[1], None);
        assert!(series.values[2].is_some());
        assert_eq!(series.first_valid(), Some(2));
    }

    #[test]
    fn sma_basic_calculation() {
        let series = calculate_sma(&[1.0, 2.0, 3.0, 4.0, 5.0], 3);
        assert!((series.get(2).unwrap() - 2.0).abs() < f64::EPSILON);
        assert!((series.get(3).unwrap() - 3.0).abs() < f64::EPSILON);
        assert!((series.get(4).unwrap() - 4.0).abs() < f64::EPSILON);
    }

    #[test]
    fn sma_period_one_is_identity() {
        let prices = [3.5, 1.25, 8.0];
        let series = calculate_sma(&prices, 1);
        for (i, p) in prices.iter().enumerate() {
            assert_eq!(series.get(i), Some(*p));
        }
    }

    #[test]
    fn sma_longer_than_input() {
        let series = calculate_sma(&[1.0, 2.0], 5);
        assert_eq!(series.len(), 2);
        assert_eq!(series.first_valid(), None);
    }

    #[test]
    fn sma_zero_period() {
        let series = calculate_sma(&[1.0, 2.0], 0);
        assert!(series.values.iter().all(Option::is_none));
        assert_eq!(series.indicator_type, IndicatorType::Sma(0));
    }
}
