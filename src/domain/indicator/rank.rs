//! Expanding-window percentile rank.
//!
//! XRANK[i] = rank of X[i] among the defined values X[0..=i], divided by the
//! number of defined values. Ties take the average rank, so a value equal to
//! every prior value ranks (k + 1) / 2k. Undefined inputs stay undefined and
//! do not count toward later windows.

use crate::domain::indicator::{IndicatorSeries, IndicatorType};

pub fn expanding_rank(input: &[Option<f64>]) -> IndicatorSeries {
    let mut values = Vec::with_capacity(input.len());
    // defined history, kept sorted ascending
    let mut seen: Vec<f64> = Vec::with_capacity(input.len());

    for x in input {
        let value = match *x {
            Some(x) if !x.is_nan() => {
                let below = seen.partition_point(|&v| v < x);
                let through = seen.partition_point(|&v| v <= x);
                seen.insert(through, x);
                let equal = through - below + 1;
                let rank = below as f64 + (equal as f64 + 1.0) / 2.0;
                Some(rank / seen.len() as f64)
            }
            _ => None,
        };
        values.push(value);
    }

    IndicatorSeries {
        indicator_type: IndicatorType::ExpandingRank,
        values,
    }
}
