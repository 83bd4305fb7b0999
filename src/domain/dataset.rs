//! Training table: rank features joined with position labels by date.

use crate::domain::features::FeatureTable;
use crate::domain::labels::LabelSeries;
use chrono::NaiveDate;
use std::collections::HashMap;

#[derive(Debug, Clone, PartialEq)]
pub struct TrainingRow {
    pub date: NaiveDate,
    pub features: Vec<f64>,
    pub position: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TrainingSet {
    pub columns: Vec<String>,
    pub rows: Vec<TrainingRow>,
}

impl TrainingSet {
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// (flat, long) label counts.
    pub fn class_counts(&self) -> (usize, usize) {
        let long = self.rows.iter().filter(|r| r.position).count();
        (self.rows.len() - long, long)
    }
}

/// Inner join on date. Keeps feature order; drops rows with a non-finite feature.
pub fn build_training_set(features: &FeatureTable, labels: &LabelSeries) -> TrainingSet {
    let by_date: HashMap<NaiveDate, bool> =
        labels.rows.iter().map(|r| (r.date, r.position)).collect();

    let rows = features
        .rows
        .iter()
        .filter(|row| row.values.iter().all(|v| v.is_finite()))
        .filter_map(|row| {
            by_date.get(&row.date).map(|&position| TrainingRow {
                date: row.date,
                features: row.values.clone(),
                position,
            })
        })
        .collect();

    TrainingSet {
        columns: features.columns.clone(),
        rows,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::features::FeatureRow;
    use crate::domain::labels::LabelRow;

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 5, d).unwrap()
    }

    fn features(days: &[u32]) -> FeatureTable {
        FeatureTable {
            symbol: "SPY".into(),
            columns: vec!["SPY_NATR_RANK".into(), "SPY_RSI_RANK".into()],
            has_vwap: true,
            rows: days
                .iter()
                .map(|&d| FeatureRow {
                    date: day(d),
                    symbol: "SPY".into(),
                    vwap: Some(400.0),
                    values: vec![0.5, d as f64 / 31.0],
                })
                .collect(),
        }
    }

    fn labels(rows: &[(u32, bool)]) -> LabelSeries {
        LabelSeries {
            rows: rows
                .iter()
                .map(|&(d, position)| LabelRow {
                    date: day(d),
                    position,
                })
                .collect(),
        }
    }

    #[test]
    fn joins_on_shared_dates() {
        let set = build_training_set(
            &features(&[1, 2, 3, 4]),
            &labels(&[(2, true), (3, false), (4, true), (5, true)]),
        );
        assert_eq!(set.len(), 3);
        assert_eq!(set.rows[0].date, day(2));
        assert!(set.rows[0].position);
        assert_eq!(set.columns, vec!["SPY_NATR_RANK", "SPY_RSI_RANK"]);
        assert_eq!(set.class_counts(), (1, 2));
    }

    #[test]
    fn non_finite_rows_dropped() {
        let mut f = features(&[1, 2]);
        f.rows[0].values[1] = f64::NAN;
        let set = build_training_set(&f, &labels(&[(1, true), (2, false)]));
        assert_eq!(set.len(), 1);
        assert_eq!(set.rows[0].date, day(2));
    }

    #[test]
    fn disjoint_dates_give_empty_set() {
        let set = build_training_set(&features(&[1]), &labels(&[(9, true)]));
        assert!(set.is_empty());
        assert_eq!(set.class_counts(), (0, 0));
    }
}
