//! NATR (Normalized Average True Range).
//!
//! NATR(n)[i] = ATR(n)[i] / C[i] * 100
//! If C[i] == 0: NATR = 0
//! Warmup: first n bars undefined (same as ATR).

use crate::domain::bar::RawBar;
use crate::domain::indicator::{IndicatorSeries, IndicatorType};
use crate::domain::indicator_helpers::calc_atr;

pub fn calculate_natr(bars: &[RawBar], period: usize) -> IndicatorSeries {
    let atr = calc_atr(bars, period);

    let values = atr
        .values
        .iter()
        .zip(bars)
        .map(|(atr, bar)| {
            atr.map(|a| if bar.close == 0.0 { 0.0 } else { a / bar.close * 100.0 })
        })
        .collect();

    IndicatorSeries {
        indicator_type: IndicatorType::Natr(period),
        values,
    }
}
