#![allow(dead_code)]

use chrono::{DateTime, Duration, NaiveDate, TimeZone, Utc};
use lightquant::domain::bar::RawBar;
use lightquant::domain::config::{FeatureConfig, PipelineConfig, SearchRanges};
use lightquant::domain::error::QuantError;
use lightquant::ports::acquisition_port::AcquisitionPort;
use std::cell::Cell;
use std::collections::HashMap;
use std::path::Path;

pub struct MockAcquisition {
    pub data: HashMap<String, Vec<RawBar>>,
    pub errors: HashMap<String, String>,
    pub calls: Cell<usize>,
}

impl MockAcquisition {
    pub fn new() -> Self {
        Self {
            data: HashMap::new(),
            errors: HashMap::new(),
            calls: Cell::new(0),
        }
    }

    pub fn with_bars(mut self, symbol: &str, bars: Vec<RawBar>) -> Self {
        self.data.insert(symbol.to_string(), bars);
        self
    }

    pub fn with_error(mut self, symbol: &str, reason: &str) -> Self {
        self.errors.insert(symbol.to_string(), reason.to_string());
        self
    }
}

impl AcquisitionPort for MockAcquisition {
    fn fetch(
        &self,
        symbol: &str,
        _start_date: NaiveDate,
        _end_date: NaiveDate,
    ) -> Result<Vec<RawBar>, QuantError> {
        self.calls.set(self.calls.get() + 1);
        if let Some(reason) = self.errors.get(symbol) {
            return Err(QuantError::AcquisitionFailed {
                symbol: symbol.to_string(),
                reason: reason.clone(),
            });
        }
        Ok(self.data.get(symbol).cloned().unwrap_or_default())
    }
}

pub fn start_time() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2020, 1, 1, 21, 0, 0).unwrap()
}

pub fn run_instant() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 6, 3, 14, 30, 0).unwrap()
}

pub fn make_bar(symbol: &str, day: usize, close: f64) -> RawBar {
    RawBar {
        symbol: symbol.to_string(),
        timestamp: start_time() + Duration::days(day as i64),
        open: close,
        high: close * 1.01,
        low: close * 0.99,
        close,
        vwap: None,
    }
}

pub fn bars_from_closes(symbol: &str, closes: &[f64]) -> Vec<RawBar> {
    closes
        .iter()
        .enumerate()
        .map(|(i, &c)| make_bar(symbol, i, c))
        .collect()
}

/// 150 days falling from 200 by 0.5, then 150 days rising from 125 by 0.5.
pub fn v_shape_closes() -> Vec<f64> {
    (0..300)
        .map(|i| {
            if i < 150 {
                200.0 - 0.5 * i as f64
            } else {
                125.0 + 0.5 * (i - 150) as f64
            }
        })
        .collect()
}

/// 150 days rising by 1, then 100 days falling by 1.
pub fn peak_closes() -> Vec<f64> {
    (0..150)
        .map(|i| 100.0 + i as f64)
        .chain((0..100).map(|i| 248.0 - i as f64))
        .collect()
}

pub fn wave_closes(n: usize) -> Vec<f64> {
    (0..n)
        .map(|i| 100.0 + 8.0 * (i as f64 / 11.0).sin() + 0.03 * i as f64)
        .collect()
}

/// Small grid and short feature windows over a fresh data directory.
pub fn test_config(data_dir: &Path) -> PipelineConfig {
    let mut config = PipelineConfig::new("SPY");
    config.data_dir = data_dir.to_path_buf();
    config.search = SearchRanges::stepped(10..=20, 50..=60, 10);
    config.parallel = false;
    config.features = FeatureConfig {
        window: 14,
        aroon_period: 20,
    };
    config
}
