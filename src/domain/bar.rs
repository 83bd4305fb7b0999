//! Raw daily bars and the time-indexed bar table.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawBar {
    pub symbol: String,
    pub timestamp: DateTime<Utc>,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    #[serde(default)]
    pub vwap: Option<f64>,
}

impl RawBar {
    /// Calendar date of the bar, time of day discarded.
    pub fn date(&self) -> NaiveDate {
        self.timestamp.date_naive()
    }

    /// max(high - low, |high - prev_close|, |low - prev_close|)
    pub fn true_range(&self, prev_close: f64) -> f64 {
        let hl = self.high - self.low;
        let hc = (self.high - prev_close).abs();
        let lc = (self.low - prev_close).abs();
        hl.max(hc).max(lc)
    }
}

/// Price column selected by name, e.g. the search engine's close column.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PriceField {
    Open,
    High,
    Low,
    Close,
    Vwap,
}

impl PriceField {
    pub fn value(self, bar: &RawBar) -> Option<f64> {
        match self {
            PriceField::Open => Some(bar.open),
            PriceField::High => Some(bar.high),
            PriceField::Low => Some(bar.low),
            PriceField::Close => Some(bar.close),
            PriceField::Vwap => bar.vwap,
        }
    }
}

impl FromStr for PriceField {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "open" => Ok(PriceField::Open),
            "high" => Ok(PriceField::High),
            "low" => Ok(PriceField::Low),
            "close" => Ok(PriceField::Close),
            "vwap" => Ok(PriceField::Vwap),
            other => Err(format!("unknown price column '{other}'")),
        }
    }
}

impl fmt::Display for PriceField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            PriceField::Open => "open",
            PriceField::High => "high",
            PriceField::Low => "low",
            PriceField::Close => "close",
            PriceField::Vwap => "vwap",
        };
        f.write_str(name)
    }
}

/// Raw OHLCV table: sorted by (symbol, timestamp), one row per timestamp per symbol.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BarTable {
    bars: Vec<RawBar>,
}

impl BarTable {
    /// Sorts the rows and drops repeated (symbol, timestamp) pairs, keeping the first.
    pub fn new(mut bars: Vec<RawBar>) -> Self {
        bars.sort_by(|a, b| {
            a.symbol
                .cmp(&b.symbol)
                .then_with(|| a.timestamp.cmp(&b.timestamp))
        });
        bars.dedup_by(|later, earlier| {
            later.symbol == earlier.symbol && later.timestamp == earlier.timestamp
        });
        Self { bars }
    }

    pub fn bars(&self) -> &[RawBar] {
        &self.bars
    }

    pub fn into_bars(self) -> Vec<RawBar> {
        self.bars
    }

    pub fn len(&self) -> usize {
        self.bars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bars.is_empty()
    }

    /// Distinct symbols in sorted order.
    pub fn symbols(&self) -> Vec<String> {
        let mut symbols: Vec<String> = Vec::new();
        for bar in &self.bars {
            if symbols.last() != Some(&bar.symbol) {
                symbols.push(bar.symbol.clone());
            }
        }
        symbols
    }

    /// Contiguous rows for one symbol.
    pub fn for_symbol(&self, symbol: &str) -> &[RawBar] {
        let start = self.bars.partition_point(|b| b.symbol.as_str() < symbol);
        let end = self.bars.partition_point(|b| b.symbol.as_str() <= symbol);
        &self.bars[start..end]
    }

    pub fn has_vwap(&self) -> bool {
        self.bars.iter().any(|b| b.vwap.is_some())
    }

    /// Selected price keyed by calendar date; rows lacking the field are skipped.
    pub fn dated_prices(&self, field: PriceField) -> Vec<(NaiveDate, f64)> {
        self.bars
            .iter()
            .filter_map(|bar| field.value(bar).map(|price| (bar.date(), price)))
            .collect()
    }
}
