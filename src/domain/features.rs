//! Feature engineering: expanding-rank technical indicators per symbol.
//!
//! Each indicator is ranked against its own history only, so no row sees
//! future data. OHLC prices are not features and are dropped; the raw VWAP
//! column is carried through alongside its rank when the input has one.

use crate::domain::bar::{BarTable, RawBar};
use crate::domain::config::FeatureConfig;
use crate::domain::indicator::aroon::calculate_aroon_oscillator;
use crate::domain::indicator::log_return::calculate_log_returns;
use crate::domain::indicator::natr::calculate_natr;
use crate::domain::indicator::rank::expanding_rank;
use crate::domain::indicator::roc::calculate_roc;
use crate::domain::indicator::rsi::calculate_rsi;
use chrono::NaiveDate;
use tracing::{debug, info};

#[derive(Debug, Clone, PartialEq)]
pub struct FeatureRow {
    pub date: NaiveDate,
    pub symbol: String,
    pub vwap: Option<f64>,
    /// One value per entry of [`FeatureTable::columns`], each in (0, 1].
    pub values: Vec<f64>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FeatureTable {
    pub symbol: String,
    pub columns: Vec<String>,
    pub has_vwap: bool,
    pub rows: Vec<FeatureRow>,
}

impl FeatureTable {
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }
}

pub struct FeatureEngineer {
    config: FeatureConfig,
}

impl FeatureEngineer {
    pub fn new(config: FeatureConfig) -> Self {
        Self { config }
    }

    /// One table per symbol, in symbol order.
    pub fn engineer(&self, table: &BarTable) -> Vec<FeatureTable> {
        let has_vwap = table.has_vwap();
        table
            .symbols()
            .iter()
            .map(|symbol| self.engineer_symbol(symbol, table.for_symbol(symbol), has_vwap))
            .collect()
    }

    pub fn engineer_symbol(&self, symbol: &str, bars: &[RawBar], has_vwap: bool) -> FeatureTable {
        let window = self.config.window;
        let closes: Vec<f64> = bars.iter().map(|b| b.close).collect();
        let prefix = symbol.to_uppercase();

        let mut columns = Vec::new();
        let mut ranked = Vec::new();

        let mut push = |name: &str, values: Vec<Option<f64>>| {
            columns.push(format!("{prefix}_{name}_RANK"));
            ranked.push(expanding_rank(&values).values);
        };
        push("NATR", calculate_natr(bars, window).values);
        push(
            "AROON",
            calculate_aroon_oscillator(bars, self.config.aroon_period).values,
        );
        push("RSI", calculate_rsi(&closes, window).values);
        push("ROC", calculate_roc(&closes, window).values);
        push("RTNS", calculate_log_returns(&closes).values);
        if has_vwap {
            push("VWAP", bars.iter().map(|b| b.vwap).collect());
        }

        let mut rows = Vec::with_capacity(bars.len());
        for (i, bar) in bars.iter().enumerate() {
            if has_vwap && bar.vwap.is_none() {
                continue;
            }
            let values: Option<Vec<f64>> = ranked.iter().map(|col| col[i]).collect();
            if let Some(values) = values {
                rows.push(FeatureRow {
                    date: bar.date(),
                    symbol: bar.symbol.clone(),
                    vwap: bar.vwap,
                    values,
                });
            }
        }

        debug!(
            symbol,
            input_rows = bars.len(),
            kept = rows.len(),
            "dropped warm-up rows"
        );
        info!(symbol, rows = rows.len(), columns = columns.len(), "features built");

        FeatureTable {
            symbol: symbol.to_string(),
            columns,
            has_vwap,
            rows,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone, Utc};

    fn make_bars(symbol: &str, n: usize, with_vwap: bool) -> Vec<RawBar> {
        let start = Utc.with_ymd_and_hms(2022, 1, 3, 5, 0, 0).unwrap();
        (0..n)
            .map(|i| {
                let close = 100.0 + 8.0 * (i as f64 / 7.0).sin() + i as f64 * 0.1;
                RawBar {
                    symbol: symbol.into(),
                    timestamp: start + Duration::days(i as i64),
                    open: close - 0.5,
                    high: close + 1.0 + (i % 3) as f64 * 0.2,
                    low: close - 1.0,
                    close,
                    vwap: with_vwap.then_some(close - 0.1),
                }
            })
            .collect()
    }

    fn small_config() -> FeatureConfig {
        FeatureConfig {
            window: 5,
            aroon_period: 4,
        }
    }

    #[test]
    fn columns_are_prefixed_by_symbol() {
        let table = BarTable::new(make_bars("spy", 30, true));
        let features = FeatureEngineer::new(small_config()).engineer(&table);

        assert_eq!(features.len(), 1);
        assert_eq!(
            features[0].columns,
            vec![
                "SPY_NATR_RANK",
                "SPY_AROON_RANK",
                "SPY_RSI_RANK",
                "SPY_ROC_RANK",
                "SPY_RTNS_RANK",
                "SPY_VWAP_RANK"
            ]
        );
        assert_eq!(features[0].column_index("SPY_RSI_RANK"), Some(2));
    }

    #[test]
    fn vwap_rank_omitted_without_vwap() {
        let table = BarTable::new(make_bars("SPY", 30, false));
        let features = FeatureEngineer::new(small_config()).engineer(&table);
        assert_eq!(features[0].columns.len(), 5);
        assert!(!features[0].has_vwap);
        assert!(features[0].rows.iter().all(|r| r.vwap.is_none()));
    }

    #[test]
    fn warmup_rows_dropped() {
        let table = BarTable::new(make_bars("SPY", 30, true));
        let features = FeatureEngineer::new(small_config()).engineer(&table);
        // NATR, RSI and ROC all need `window` prior bars
        assert_eq!(features[0].len(), 30 - 5);
        let first = table.bars()[5].date();
        assert_eq!(features[0].rows[0].date, first);
    }

    #[test]
    fn values_are_percentile_ranks() {
        let table = BarTable::new(make_bars("SPY", 80, true));
        let features = FeatureEngineer::new(small_config()).engineer(&table);
        for row in &features[0].rows {
            assert_eq!(row.values.len(), features[0].columns.len());
            for v in &row.values {
                assert!(*v > 0.0 && *v <= 1.0, "rank {} out of range", v);
            }
        }
    }

    #[test]
    fn one_table_per_symbol() {
        let mut bars = make_bars("SPY", 20, false);
        bars.extend(make_bars("QQQ", 25, false));
        let features = FeatureEngineer::new(small_config()).engineer(&BarTable::new(bars));

        assert_eq!(features.len(), 2);
        assert_eq!(features[0].symbol, "QQQ");
        assert_eq!(features[0].len(), 20);
        assert_eq!(features[1].symbol, "SPY");
        assert_eq!(features[1].len(), 15);
        assert!(features[1].rows.iter().all(|r| r.symbol == "SPY"));
    }

    #[test]
    fn too_short_history_yields_no_rows() {
        let table = BarTable::new(make_bars("SPY", 4, false));
        let features = FeatureEngineer::new(small_config()).engineer(&table);
        assert!(features[0].is_empty());
    }
}
