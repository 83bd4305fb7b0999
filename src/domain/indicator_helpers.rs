//! Shared helper functions for indicator calculations.

use crate::domain::bar::RawBar;
use crate::domain::indicator::{IndicatorSeries, IndicatorType};

/// Wilder ATR. True range starts at bar 1 (it needs a previous close); the
/// seed at bar `period` is the mean of TR[1..=period].
pub fn calc_atr(bars: &[RawBar], period: usize) -> IndicatorSeries {
    let mut values = vec![None; bars.len()];

    if period == 0 || bars.len() <= period {
        return IndicatorSeries {
            indicator_type: IndicatorType::Atr(period),
            values,
        };
    }

    let tr_values: Vec<f64> = bars
        .windows(2)
        .map(|w| w[1].true_range(w[0].close))
        .collect();

    let mut atr = tr_values[..period].iter().sum::<f64>() / period as f64;
    values[period] = Some(atr);

    for i in period + 1..bars.len() {
        atr = (atr * (period - 1) as f64 + tr_values[i - 1]) / period as f64;
        values[i] = Some(atr);
    }

    IndicatorSeries {
        indicator_type: IndicatorType::Atr(period),
        values,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    fn make_bar(day: u32, high: f64, low: f64, close: f64) -> RawBar {
        RawBar {
            symbol: "TEST".into(),
            timestamp: Utc.with_ymd_and_hms(2024, 1, day, 5, 0, 0).unwrap(),
            open: close,
            high,
            low,
            close,
            vwap: None,
        }
    }

    #[test]
    fn atr_warmup() {
        let bars: Vec<RawBar> = (1..=5).map(|d| make_bar(d, 110.0, 90.0, 100.0)).collect();
        let series = calc_atr(&bars, 3);

        assert_eq!(series.len(), 5);
        assert_eq!(series.first_valid(), Some(3));
    }

    #[test]
    fn atr_seed_is_average() {
        let bars = vec![
            make_bar(1, 110.0, 100.0, 105.0),
            make_bar(2, 115.0, 105.0, 110.0),
            make_bar(3, 120.0, 110.0, 115.0),
            make_bar(4, 125.0, 115.0, 120.0),
        ];
        let series = calc_atr(&bars, 3);
        assert!((series.get(3).unwrap() - 10.0).abs() < 1e-9);
    }

    #[test]
    fn atr_wilder_smoothing() {
        let bars = vec![
            make_bar(1, 110.0, 100.0, 105.0),
            make_bar(2, 115.0, 105.0, 110.0),
            make_bar(3, 120.0, 110.0, 115.0),
            make_bar(4, 150.0, 120.0, 140.0),
        ];
        let series = calc_atr(&bars, 2);

        // seed at bar 2 = (10 + 10) / 2; bar 3 TR = 150 - 115 = 35
        assert!((series.get(2).unwrap() - 10.0).abs() < 1e-9);
        let expected = (10.0 * 1.0 + 35.0) / 2.0;
        assert!((series.get(3).unwrap() - expected).abs() < 1e-9);
    }

    #[test]
    fn atr_insufficient_bars() {
        let bars: Vec<RawBar> = (1..=2).map(|d| make_bar(d, 110.0, 90.0, 100.0)).collect();
        let series = calc_atr(&bars, 5);
        assert_eq!(series.len(), 2);
        assert_eq!(series.first_valid(), None);
    }
}
