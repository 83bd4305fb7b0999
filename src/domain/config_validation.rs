//! Configuration validation.
//!
//! Every key is checked before any stage touches the filesystem. Absent keys
//! take their defaults; present keys must parse.

use crate::domain::bar::PriceField;
use crate::domain::config::{FeatureConfig, PipelineConfig, SearchRanges};
use crate::domain::error::QuantError;
use crate::domain::workspace::validate_symbol;
use crate::ports::config_port::ConfigPort;
use chrono_tz::Tz;
use std::path::PathBuf;
use std::str::FromStr;

pub fn validate_pipeline_config(config: &dyn ConfigPort) -> Result<(), QuantError> {
    load_pipeline_config(config).map(|_| ())
}

/// Builds a [`PipelineConfig`] from `[pipeline]`, `[search]` and `[features]`.
pub fn load_pipeline_config(config: &dyn ConfigPort) -> Result<PipelineConfig, QuantError> {
    let symbol = config
        .get_string("pipeline", "symbol")
        .unwrap_or_else(|| "SPY".to_string());
    validate_symbol(&symbol)?;

    let mut out = PipelineConfig::new(symbol);
    if let Some(dir) = non_empty(config.get_string("pipeline", "data_dir")) {
        out.data_dir = PathBuf::from(dir);
    }
    if let Some(tz) = non_empty(config.get_string("pipeline", "timezone")) {
        out.timezone = Tz::from_str(&tz).map_err(|_| invalid(
            "pipeline",
            "timezone",
            format!("unknown timezone '{tz}'"),
        ))?;
    }
    if let Some(col) = non_empty(config.get_string("pipeline", "close_col")) {
        out.close_col = PriceField::from_str(&col)
            .map_err(|reason| invalid("pipeline", "close_col", reason))?;
    }
    out.max_drawdown = parse_key(config, "pipeline", "max_drawdown", out.max_drawdown)?;
    validate_drawdown(out.max_drawdown)?;
    out.lookback_days = parse_key(config, "pipeline", "lookback_days", out.lookback_days)?;
    if out.lookback_days < 1 {
        return Err(invalid(
            "pipeline",
            "lookback_days",
            "lookback_days must be at least 1".into(),
        ));
    }

    out.search = load_search_ranges(config)?;
    out.parallel = config.get_bool("search", "parallel", out.parallel);
    out.features = load_feature_config(config)?;
    Ok(out)
}

/// The drawdown floor is a non-positive fraction.
pub fn validate_drawdown(value: f64) -> Result<(), QuantError> {
    if !(-1.0..=0.0).contains(&value) {
        return Err(invalid(
            "pipeline",
            "max_drawdown",
            "max_drawdown must be between -1 and 0".into(),
        ));
    }
    Ok(())
}

fn load_search_ranges(config: &dyn ConfigPort) -> Result<SearchRanges, QuantError> {
    let fast_min = parse_key(config, "search", "fast_min", 10usize)?;
    let fast_max = parse_key(config, "search", "fast_max", 50usize)?;
    let slow_min = parse_key(config, "search", "slow_min", 50usize)?;
    let slow_max = parse_key(config, "search", "slow_max", 124usize)?;
    let step = parse_key(config, "search", "step", 1usize)?;

    for (key, value) in [("fast_min", fast_min), ("slow_min", slow_min), ("step", step)] {
        if value < 1 {
            return Err(invalid("search", key, format!("{key} must be at least 1")));
        }
    }
    if fast_min > fast_max {
        return Err(invalid(
            "search",
            "fast_min",
            "fast_min must not exceed fast_max".into(),
        ));
    }
    if slow_min > slow_max {
        return Err(invalid(
            "search",
            "slow_min",
            "slow_min must not exceed slow_max".into(),
        ));
    }
    Ok(SearchRanges::stepped(fast_min..=fast_max, slow_min..=slow_max, step))
}

fn load_feature_config(config: &dyn ConfigPort) -> Result<FeatureConfig, QuantError> {
    let defaults = FeatureConfig::default();
    let window = parse_key(config, "features", "window", defaults.window)?;
    let aroon_period = parse_key(config, "features", "aroon_period", defaults.aroon_period)?;
    for (key, value) in [("window", window), ("aroon_period", aroon_period)] {
        if value < 1 {
            return Err(invalid("features", key, format!("{key} must be at least 1")));
        }
    }
    Ok(FeatureConfig {
        window,
        aroon_period,
    })
}

fn parse_key<T: FromStr>(
    config: &dyn ConfigPort,
    section: &str,
    key: &str,
    default: T,
) -> Result<T, QuantError> {
    match non_empty(config.get_string(section, key)) {
        None => Ok(default),
        Some(raw) => raw.parse::<T>().map_err(|_| {
            invalid(section, key, format!("cannot parse '{raw}'"))
        }),
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn invalid(section: &str, key: &str, reason: String) -> QuantError {
    QuantError::ConfigInvalid {
        section: section.to_string(),
        key: key.to_string(),
        reason,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::file_config_adapter::FileConfigAdapter;

    fn make_config(content: &str) -> FileConfigAdapter {
        FileConfigAdapter::from_string(content).unwrap()
    }

    #[test]
    fn empty_config_uses_defaults() {
        let config = load_pipeline_config(&make_config("")).unwrap();
        assert_eq!(config.symbol, "SPY");
        assert_eq!(config.data_dir, PathBuf::from("data"));
        assert_eq!(config.timezone, chrono_tz::US::Eastern);
        assert_eq!(config.close_col, PriceField::Close);
        assert_eq!(config.max_drawdown, -0.3);
        assert_eq!(config.search, SearchRanges::default());
        assert!(config.parallel);
        assert_eq!(config.features, FeatureConfig::default());
    }

    #[test]
    fn valid_config_passes() {
        let config = make_config(
            r#"
[pipeline]
symbol = QQQ
data_dir = /tmp/runs
timezone = UTC
close_col = vwap
max_drawdown = -0.2
lookback_days = 365

[search]
fast_min = 5
fast_max = 15
slow_min = 20
slow_max = 40
step = 5
parallel = false

[features]
window = 14
aroon_period = 25
"#,
        );
        assert!(validate_pipeline_config(&config).is_ok());
        let loaded = load_pipeline_config(&config).unwrap();
        assert_eq!(loaded.symbol, "QQQ");
        assert_eq!(loaded.timezone, chrono_tz::UTC);
        assert_eq!(loaded.close_col, PriceField::Vwap);
        assert_eq!(loaded.lookback_days, 365);
        assert_eq!(loaded.search.fast, vec![5, 10, 15]);
        assert_eq!(loaded.search.slow, vec![20, 25, 30, 35, 40]);
        assert!(!loaded.parallel);
        assert_eq!(loaded.features.window, 14);
        assert_eq!(loaded.features.aroon_period, 25);
    }

    #[test]
    fn multi_symbol_fails() {
        let err = validate_pipeline_config(&make_config("[pipeline]\nsymbol = SPY,QQQ\n"))
            .unwrap_err();
        assert!(matches!(err, QuantError::InvalidSymbol { .. }));
    }

    #[test]
    fn positive_drawdown_fails() {
        let err = validate_pipeline_config(&make_config("[pipeline]\nmax_drawdown = 0.3\n"))
            .unwrap_err();
        assert!(matches!(err, QuantError::ConfigInvalid { key, .. } if key == "max_drawdown"));
    }

    #[test]
    fn non_numeric_drawdown_fails() {
        let err = validate_pipeline_config(&make_config("[pipeline]\nmax_drawdown = deep\n"))
            .unwrap_err();
        assert!(matches!(err, QuantError::ConfigInvalid { key, .. } if key == "max_drawdown"));
    }

    #[test]
    fn unknown_timezone_fails() {
        let err = validate_pipeline_config(&make_config("[pipeline]\ntimezone = Mars/Olympus\n"))
            .unwrap_err();
        assert!(matches!(err, QuantError::ConfigInvalid { key, .. } if key == "timezone"));
    }

    #[test]
    fn unknown_close_col_fails() {
        let err = validate_pipeline_config(&make_config("[pipeline]\nclose_col = adj_close\n"))
            .unwrap_err();
        assert!(matches!(err, QuantError::ConfigInvalid { key, .. } if key == "close_col"));
    }

    #[test]
    fn inverted_fast_range_fails() {
        let err = validate_pipeline_config(&make_config("[search]\nfast_min = 30\nfast_max = 20\n"))
            .unwrap_err();
        assert!(matches!(err, QuantError::ConfigInvalid { key, .. } if key == "fast_min"));
    }

    #[test]
    fn inverted_slow_range_fails() {
        let err = validate_pipeline_config(&make_config("[search]\nslow_min = 90\nslow_max = 60\n"))
            .unwrap_err();
        assert!(matches!(err, QuantError::ConfigInvalid { key, .. } if key == "slow_min"));
    }

    #[test]
    fn zero_window_fails() {
        let err = validate_pipeline_config(&make_config("[features]\nwindow = 0\n")).unwrap_err();
        assert!(matches!(err, QuantError::ConfigInvalid { key, .. } if key == "window"));
    }

    #[test]
    fn zero_step_fails() {
        let err = validate_pipeline_config(&make_config("[search]\nstep = 0\n")).unwrap_err();
        assert!(matches!(err, QuantError::ConfigInvalid { key, .. } if key == "step"));
    }

    #[test]
    fn negative_lookback_fails() {
        let err = validate_pipeline_config(&make_config("[pipeline]\nlookback_days = -5\n"))
            .unwrap_err();
        assert!(matches!(err, QuantError::ConfigInvalid { key, .. } if key == "lookback_days"));
    }
}
