//! Brute-force dual moving-average search.
//!
//! Every (fast, slow) pair of the configured ranges is backtested as a
//! long/flat crossover rule on daily log returns. The position on day t is
//! `fast_ma[t] >= slow_ma[t]` and is applied to the return realised on the
//! same day t; the signal is not shifted. Trial ids follow iteration order
//! (fast outer, slow inner, ascending) and never depend on evaluation order.

use crate::domain::bar::{BarTable, PriceField};
use crate::domain::config::SearchRanges;
use crate::domain::error::QuantError;
use crate::domain::indicator::log_return::calculate_log_returns;
use crate::domain::indicator::sma::calculate_sma;
use crate::domain::metrics::StrategyMetrics;
use chrono::NaiveDate;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::{debug, info, warn};

/// Called once per evaluated candidate.
pub type ProgressHook<'a> = &'a (dyn Fn(&CandidateResult) + Sync);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Candidate {
    pub fast: usize,
    pub slow: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CandidateResult {
    #[serde(rename = "Trial")]
    pub trial: usize,
    #[serde(rename = "Fast")]
    pub fast: usize,
    #[serde(rename = "Slow")]
    pub slow: usize,
    #[serde(rename = "CAGR")]
    pub cagr: f64,
    #[serde(rename = "Sharpe")]
    pub sharpe: f64,
    #[serde(rename = "Drawdown")]
    pub drawdown: f64,
    #[serde(rename = "Returns")]
    pub returns: f64,
}

/// The selected configuration, persisted for the label stage.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BestConfig {
    #[serde(rename = "Trial")]
    pub trial: usize,
    #[serde(rename = "Fast")]
    pub fast: usize,
    #[serde(rename = "Slow")]
    pub slow: usize,
    #[serde(rename = "CAGR")]
    pub cagr: f64,
    #[serde(rename = "Sharpe")]
    pub sharpe: f64,
    #[serde(rename = "Drawdown")]
    pub drawdown: f64,
    #[serde(rename = "Returns")]
    pub returns: f64,
}

impl From<&CandidateResult> for BestConfig {
    fn from(r: &CandidateResult) -> Self {
        BestConfig {
            trial: r.trial,
            fast: r.fast,
            slow: r.slow,
            cagr: r.cagr,
            sharpe: r.sharpe,
            drawdown: r.drawdown,
            returns: r.returns,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SearchOutcome {
    /// Every evaluated candidate, in trial order.
    pub results: Vec<CandidateResult>,
    /// `None` when no candidate survived filtering.
    pub best: Option<BestConfig>,
}

impl SearchOutcome {
    pub fn evaluated(&self) -> usize {
        self.results.len()
    }

    /// Results stable-sorted by descending cumulative return.
    pub fn ranked(&self) -> Vec<CandidateResult> {
        let mut ranked = self.results.clone();
        ranked.sort_by(|a, b| b.returns.total_cmp(&a.returns));
        ranked
    }
}

/// Price series reduced for the search: one row per date with a defined log
/// return. Moving averages are taken over `prices`, so the first raw row never
/// contributes to them.
#[derive(Debug, Clone, PartialEq)]
pub struct SearchSeries {
    pub dates: Vec<NaiveDate>,
    pub prices: Vec<f64>,
    pub returns: Vec<f64>,
}

impl SearchSeries {
    pub fn from_table(table: &BarTable, field: PriceField) -> Self {
        Self::from_prices(&table.dated_prices(field))
    }

    pub fn from_prices(dated: &[(NaiveDate, f64)]) -> Self {
        let prices: Vec<f64> = dated.iter().map(|(_, p)| *p).collect();
        let log_returns = calculate_log_returns(&prices);

        let mut series = SearchSeries {
            dates: Vec::with_capacity(dated.len()),
            prices: Vec::with_capacity(dated.len()),
            returns: Vec::with_capacity(dated.len()),
        };
        for (i, r) in log_returns.values.iter().enumerate() {
            if let Some(r) = r {
                series.dates.push(dated[i].0);
                series.prices.push(dated[i].1);
                series.returns.push(*r);
            }
        }
        series
    }

    pub fn len(&self) -> usize {
        self.returns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.returns.is_empty()
    }
}

/// Grid enumeration in fixed order; equal pairs are skipped and take no trial id.
pub fn enumerate_candidates(ranges: &SearchRanges) -> Vec<(usize, Candidate)> {
    ranges
        .fast
        .iter()
        .flat_map(|&fast| ranges.slow.iter().map(move |&slow| Candidate { fast, slow }))
        .filter(|c| c.fast != c.slow)
        .enumerate()
        .collect()
}

/// Keeps candidates within the drawdown floor that did not lose money, then
/// takes the highest cumulative return; the earliest trial wins ties.
pub fn select_best(results: &[CandidateResult], drawdown_floor: f64) -> Option<BestConfig> {
    let mut best: Option<&CandidateResult> = None;
    for r in results
        .iter()
        .filter(|r| r.drawdown >= drawdown_floor && r.returns >= 1.0)
    {
        match best {
            Some(b) if r.returns <= b.returns => {}
            _ => best = Some(r),
        }
    }
    best.map(BestConfig::from)
}

/// Daily strategy log returns for one window pair over the search series.
pub fn strategy_returns(
    returns: &[f64],
    fast_ma: &[Option<f64>],
    slow_ma: &[Option<f64>],
) -> Vec<f64> {
    returns
        .iter()
        .zip(fast_ma.iter().zip(slow_ma))
        .filter_map(|(r, (fast, slow))| match (fast, slow) {
            (Some(fast), Some(slow)) => {
                let position = if fast >= slow { 1.0 } else { 0.0 };
                Some(position * r)
            }
            _ => None,
        })
        .collect()
}

pub struct SearchEngine {
    ranges: SearchRanges,
    drawdown_floor: f64,
    parallel: bool,
}

impl SearchEngine {
    pub fn new(ranges: SearchRanges, drawdown_floor: f64) -> Self {
        Self {
            ranges,
            drawdown_floor,
            parallel: true,
        }
    }

    /// Enables or disables parallel candidate evaluation.
    pub fn with_parallelism(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    pub fn ranges(&self) -> &SearchRanges {
        &self.ranges
    }

    pub fn run(
        &self,
        table: &BarTable,
        field: PriceField,
        hook: Option<ProgressHook<'_>>,
    ) -> Result<SearchOutcome, QuantError> {
        self.run_series(&SearchSeries::from_table(table, field), hook)
    }

    pub fn run_series(
        &self,
        series: &SearchSeries,
        hook: Option<ProgressHook<'_>>,
    ) -> Result<SearchOutcome, QuantError> {
        if series.is_empty() {
            return Err(QuantError::InsufficientData { have: 0, need: 2 });
        }

        let candidates = enumerate_candidates(&self.ranges);
        info!(
            candidates = candidates.len(),
            rows = series.len(),
            parallel = self.parallel,
            "starting brute-force search"
        );

        let averages = self.moving_averages(series);
        let evaluate = |&(trial, candidate): &(usize, Candidate)| {
            let result = evaluate_candidate(trial, candidate, series, &averages);
            debug!(
                trial,
                fast = result.fast,
                slow = result.slow,
                cagr = result.cagr,
                drawdown = result.drawdown,
                "candidate evaluated"
            );
            if let Some(hook) = hook {
                hook(&result);
            }
            result
        };

        let results: Vec<CandidateResult> = if self.parallel {
            candidates.par_iter().map(evaluate).collect()
        } else {
            candidates.iter().map(evaluate).collect()
        };

        let best = select_best(&results, self.drawdown_floor);
        match &best {
            Some(b) => info!(
                fast = b.fast,
                slow = b.slow,
                cagr = b.cagr,
                drawdown = b.drawdown,
                returns = b.returns,
                "search selected best config"
            ),
            None => warn!(
                evaluated = results.len(),
                drawdown_floor = self.drawdown_floor,
                "no candidate survived filtering"
            ),
        }

        Ok(SearchOutcome { results, best })
    }

    /// One SMA per distinct window length, shared read-only by every candidate.
    fn moving_averages(&self, series: &SearchSeries) -> BTreeMap<usize, Vec<Option<f64>>> {
        self.ranges
            .fast
            .iter()
            .chain(&self.ranges.slow)
            .map(|&period| (period, calculate_sma(&series.prices, period).values))
            .collect()
    }
}

fn evaluate_candidate(
    trial: usize,
    candidate: Candidate,
    series: &SearchSeries,
    averages: &BTreeMap<usize, Vec<Option<f64>>>,
) -> CandidateResult {
    let empty = Vec::new();
    let fast_ma = averages.get(&candidate.fast).unwrap_or(&empty);
    let slow_ma = averages.get(&candidate.slow).unwrap_or(&empty);

    let strategy = strategy_returns(&series.returns, fast_ma, slow_ma);
    let metrics = StrategyMetrics::compute(&strategy);

    CandidateResult {
        trial,
        fast: candidate.fast,
        slow: candidate.slow,
        cagr: metrics.cagr,
        sharpe: metrics.sharpe,
        drawdown: metrics.max_drawdown,
        returns: metrics.cumulative_return,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    fn dated(prices: &[f64]) -> Vec<(NaiveDate, f64)> {
        let start = NaiveDate::from_ymd_opt(2020, 1, 1).unwrap();
        prices
            .iter()
            .enumerate()
            .map(|(i, &p)| (start + chrono::Duration::days(i as i64), p))
            .collect()
    }

    fn result(trial: usize, drawdown: f64, returns: f64) -> CandidateResult {
        CandidateResult {
            trial,
            fast: 10 + trial,
            slow: 60,
            cagr: 0.0,
            sharpe: 0.0,
            drawdown,
            returns,
        }
    }

    fn wave(n: usize) -> Vec<f64> {
        (0..n)
            .map(|i| 100.0 + 10.0 * (i as f64 / 9.0).sin() + i as f64 * 0.05)
            .collect()
    }

    #[test]
    fn enumeration_skips_equal_pairs() {
        let ranges = SearchRanges::stepped(1..=3, 2..=4, 1);
        let candidates = enumerate_candidates(&ranges);
        assert_eq!(candidates.len(), 9 - 2);
        assert!(candidates.iter().all(|(_, c)| c.fast != c.slow));
        let trials: Vec<usize> = candidates.iter().map(|(t, _)| *t).collect();
        assert_eq!(trials, (0..7).collect::<Vec<_>>());
        assert_eq!(candidates[0].1, Candidate { fast: 1, slow: 2 });
        assert_eq!(candidates[3].1, Candidate { fast: 2, slow: 3 });
    }

    #[test]
    fn default_grid_skips_single_collision() {
        let candidates = enumerate_candidates(&SearchRanges::default());
        assert_eq!(candidates.len(), 41 * 75 - 1);
    }

    #[test]
    fn series_drops_leading_return() {
        let series = SearchSeries::from_prices(&dated(&[100.0, 110.0, 121.0]));
        assert_eq!(series.len(), 2);
        assert_eq!(series.prices, vec![110.0, 121.0]);
        assert!((series.returns[0] - 1.1_f64.ln()).abs() < 1e-12);
    }

    #[test]
    fn averages_exclude_row_without_return() {
        // Reduced series is [2, 4, 8, 16]; slow(3) is defined on its last two rows.
        let series = SearchSeries::from_prices(&dated(&[1.0, 2.0, 4.0, 8.0, 16.0]));
        let ranges = SearchRanges::from_values(vec![2], vec![3]);
        let outcome = SearchEngine::new(ranges, -0.3)
            .with_parallelism(false)
            .run_series(&series, None)
            .unwrap();
        let r = outcome.results[0];
        assert!((r.returns - 4.0).abs() < 1e-12);
        assert_eq!(r.drawdown, 0.0);
    }

    #[test]
    fn strategy_returns_are_flat_when_fast_below_slow() {
        let returns = [0.1, -0.2, 0.3];
        let fast = [None, Some(1.0), Some(3.0)];
        let slow = [Some(2.0), Some(2.0), Some(2.0)];
        let out = strategy_returns(&returns, &fast, &slow);
        assert_eq!(out.len(), 2);
        assert_eq!(out[0], 0.0);
        assert_eq!(out[1], 0.3);
    }

    #[test]
    fn strategy_long_on_equal_averages() {
        let out = strategy_returns(&[0.05], &[Some(2.0)], &[Some(2.0)]);
        assert_eq!(out, vec![0.05]);
    }

    #[test]
    fn select_best_applies_both_filters() {
        let results = vec![
            result(0, -0.5, 3.0),
            result(1, -0.1, 0.9),
            result(2, -0.2, 1.4),
            result(3, -0.05, 1.2),
        ];
        let best = select_best(&results, -0.3).unwrap();
        assert_eq!(best.trial, 2);
    }

    #[test]
    fn select_best_ties_keep_earliest_trial() {
        let results = vec![result(0, -0.1, 1.5), result(1, -0.1, 1.5)];
        assert_eq!(select_best(&results, -0.3).unwrap().trial, 0);
    }

    #[test]
    fn select_best_none_when_nothing_survives() {
        let results = vec![result(0, -0.5, 2.0), result(1, -0.1, 0.5)];
        assert!(select_best(&results, -0.3).is_none());
    }

    #[test]
    fn ranked_is_stable_descending() {
        let outcome = SearchOutcome {
            results: vec![
                result(0, 0.0, 1.1),
                result(1, 0.0, 1.3),
                result(2, 0.0, 1.1),
            ],
            best: None,
        };
        let trials: Vec<usize> = outcome.ranked().iter().map(|r| r.trial).collect();
        assert_eq!(trials, vec![1, 0, 2]);
    }

    #[test]
    fn empty_series_is_insufficient() {
        let engine = SearchEngine::new(SearchRanges::default(), -0.3);
        let series = SearchSeries::from_prices(&dated(&[100.0]));
        let err = engine.run_series(&series, None).unwrap_err();
        assert!(matches!(err, QuantError::InsufficientData { .. }));
    }

    #[test]
    fn parallel_and_sequential_agree() {
        let series = SearchSeries::from_prices(&dated(&wave(200)));
        let ranges = SearchRanges::stepped(5..=15, 10..=30, 1);
        let par = SearchEngine::new(ranges.clone(), -0.3)
            .run_series(&series, None)
            .unwrap();
        let seq = SearchEngine::new(ranges, -0.3)
            .with_parallelism(false)
            .run_series(&series, None)
            .unwrap();
        assert_eq!(par, seq);
        assert!(par.results.iter().enumerate().all(|(i, r)| r.trial == i));
    }

    #[test]
    fn hook_sees_every_candidate() {
        let series = SearchSeries::from_prices(&dated(&wave(120)));
        let ranges = SearchRanges::stepped(5..=8, 8..=12, 1);
        let seen = Mutex::new(Vec::new());
        let hook = |r: &CandidateResult| seen.lock().unwrap().push(r.trial);
        let outcome = SearchEngine::new(ranges, -0.3)
            .run_series(&series, Some(&hook))
            .unwrap();

        let mut seen = seen.into_inner().unwrap();
        seen.sort_unstable();
        assert_eq!(seen.len(), outcome.evaluated());
        assert_eq!(seen, (0..outcome.evaluated()).collect::<Vec<_>>());
    }

    #[test]
    fn short_series_yields_neutral_candidates() {
        let series = SearchSeries::from_prices(&dated(&[100.0, 101.0, 102.0]));
        let ranges = SearchRanges::from_values(vec![10], vec![20]);
        let outcome = SearchEngine::new(ranges, -0.3).run_series(&series, None).unwrap();
        let r = outcome.results[0];
        assert_eq!(r.returns, 1.0);
        assert_eq!(r.drawdown, 0.0);
        assert_eq!(outcome.best.unwrap().trial, 0);
    }
}
