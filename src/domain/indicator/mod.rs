//! Technical indicator implementations.
//!
//! Every indicator maps an input series to an [`IndicatorSeries`] of the same
//! length. Warm-up positions are `None`; callers drop those rows.

pub mod aroon;
pub mod log_return;
pub mod natr;
pub mod rank;
pub mod roc;
pub mod rsi;
pub mod sma;

use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IndicatorType {
    Sma(usize),
    Atr(usize),
    Natr(usize),
    AroonOsc(usize),
    Rsi(usize),
    Roc(usize),
    LogReturn,
    ExpandingRank,
}

#[derive(Debug, Clone, PartialEq)]
pub struct IndicatorSeries {
    pub indicator_type: IndicatorType,
    pub values: Vec<Option<f64>>,
}

impl IndicatorSeries {
    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn get(&self, i: usize) -> Option<f64> {
        self.values.get(i).copied().flatten()
    }

    /// Index of the first defined value.
    pub fn first_valid(&self) -> Option<usize> {
        self.values.iter().position(Option::is_some)
    }
}

impl fmt::Display for IndicatorType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IndicatorType::Sma(period) => write!(f, "SMA({})", period),
            IndicatorType::Atr(period) => write!(f, "ATR({})", period),
            IndicatorType::Natr(period) => write!(f, "NATR({})", period),
            IndicatorType::AroonOsc(period) => write!(f, "AROONOSC({})", period),
            IndicatorType::Rsi(period) => write!(f, "RSI({})", period),
            IndicatorType::Roc(period) => write!(f, "ROC({})", period),
            IndicatorType::LogReturn => write!(f, "LOGRET"),
            IndicatorType::ExpandingRank => write!(f, "XRANK"),
        }
    }
}
