//! Pipeline configuration values.

use crate::domain::bar::PriceField;
use chrono_tz::Tz;
use std::ops::RangeInclusive;
use std::path::PathBuf;

pub const DEFAULT_MAX_DRAWDOWN: f64 = -0.3;
pub const DEFAULT_LOOKBACK_DAYS: i64 = 5 * 365;

/// Window lengths for the moving-average search, each list ascending.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchRanges {
    pub fast: Vec<usize>,
    pub slow: Vec<usize>,
}

impl Default for SearchRanges {
    fn default() -> Self {
        Self::stepped(10..=50, 50..=124, 1)
    }
}

impl SearchRanges {
    /// Inclusive bounds walked with a common step.
    pub fn stepped(fast: RangeInclusive<usize>, slow: RangeInclusive<usize>, step: usize) -> Self {
        let step = step.max(1);
        Self {
            fast: fast.step_by(step).collect(),
            slow: slow.step_by(step).collect(),
        }
    }

    /// Explicit window lists; sorted and deduplicated.
    pub fn from_values(mut fast: Vec<usize>, mut slow: Vec<usize>) -> Self {
        fast.sort_unstable();
        fast.dedup();
        slow.sort_unstable();
        slow.dedup();
        Self { fast, slow }
    }

    /// Size of the raw cartesian product, collisions included.
    pub fn grid_size(&self) -> usize {
        self.fast.len() * self.slow.len()
    }

    pub fn max_window(&self) -> usize {
        self.fast
            .iter()
            .chain(&self.slow)
            .copied()
            .max()
            .unwrap_or(0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FeatureConfig {
    /// Period for NATR, RSI and ROC.
    pub window: usize,
    pub aroon_period: usize,
}

impl Default for FeatureConfig {
    fn default() -> Self {
        Self {
            window: 50,
            aroon_period: 20,
        }
    }
}

#[derive(Debug, Clone)]
pub struct PipelineConfig {
    pub symbol: String,
    pub data_dir: PathBuf,
    pub timezone: Tz,
    pub close_col: PriceField,
    /// Negative fraction; candidates with a deeper drawdown are rejected.
    pub max_drawdown: f64,
    pub lookback_days: i64,
    pub search: SearchRanges,
    pub parallel: bool,
    pub features: FeatureConfig,
}

impl PipelineConfig {
    pub fn new(symbol: impl Into<String>) -> Self {
        Self {
            symbol: symbol.into(),
            data_dir: PathBuf::from("data"),
            timezone: chrono_tz::US::Eastern,
            close_col: PriceField::Close,
            max_drawdown: DEFAULT_MAX_DRAWDOWN,
            lookback_days: DEFAULT_LOOKBACK_DAYS,
            search: SearchRanges::default(),
            parallel: true,
            features: FeatureConfig::default(),
        }
    }
}
