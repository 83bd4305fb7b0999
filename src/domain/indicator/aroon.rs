//! Aroon oscillator.
//!
//! Over the window [i-n, i] (n + 1 bars):
//! Aroon Up   = 100 * (n - bars_since_highest_high) / n
//! Aroon Down = 100 * (n - bars_since_lowest_low) / n
//! AROONOSC   = Aroon Up - Aroon Down, in [-100, 100]
//! The most recent extreme wins ties. Warmup: first n bars undefined.

use crate::domain::bar::RawBar;
use crate::domain::indicator::{IndicatorSeries, IndicatorType};

pub fn calculate_aroon_oscillator(bars: &[RawBar], period: usize) -> IndicatorSeries {
    let mut values = vec![None; bars.len()];

    if period == 0 {
        return IndicatorSeries {
            indicator_type: IndicatorType::AroonOsc(period),
            values,
        };
    }

    for i in period..bars.len() {
        let window = &bars[i - period..=i];

        let mut max_val = f64::NEG_INFINITY;
        let mut max_offset = 0;
        let mut min_val = f64::INFINITY;
        let mut min_offset = 0;
        for (j, bar) in window.iter().enumerate() {
            if bar.high >= max_val {
                max_val = bar.high;
                max_offset = j;
            }
            if bar.low <= min_val {
                min_val = bar.low;
                min_offset = j;
            }
        }

        // offsets are measured from the window start, so up - down reduces
        // to the offset difference
        let osc = 100.0 * (max_offset as f64 - min_offset as f64) / period as f64;
        values[i] = Some(osc);
    }

    IndicatorSeries {
        indicator_type: IndicatorType::AroonOsc(period),
        values,
    }
}
