//! Position labels from the selected moving-average pair.

use crate::domain::bar::{BarTable, PriceField};
use crate::domain::indicator::sma::calculate_sma;
use crate::domain::search::BestConfig;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tracing::info;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LabelRow {
    pub date: NaiveDate,
    pub position: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LabelSeries {
    pub rows: Vec<LabelRow>,
}

impl LabelSeries {
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn long_count(&self) -> usize {
        self.rows.iter().filter(|r| r.position).count()
    }
}

pub struct LabelEngineer {
    field: PriceField,
}

impl LabelEngineer {
    pub fn new(field: PriceField) -> Self {
        Self { field }
    }

    /// `position[t] = fast_ma[t] >= slow_ma[t]`; rows before both averages exist are dropped.
    pub fn engineer(&self, table: &BarTable, best: &BestConfig) -> LabelSeries {
        let dated = table.dated_prices(self.field);
        let prices: Vec<f64> = dated.iter().map(|(_, p)| *p).collect();
        let fast = calculate_sma(&prices, best.fast);
        let slow = calculate_sma(&prices, best.slow);

        let rows: Vec<LabelRow> = dated
            .iter()
            .zip(fast.values.iter().zip(&slow.values))
            .filter_map(|((date, _), (fast, slow))| match (fast, slow) {
                (Some(fast), Some(slow)) => Some(LabelRow {
                    date: *date,
                    position: fast >= slow,
                }),
                _ => None,
            })
            .collect();

        let labels = LabelSeries { rows };
        info!(
            fast = best.fast,
            slow = best.slow,
            rows = labels.len(),
            long = labels.long_count(),
            "labels built"
        );
        labels
    }
}
