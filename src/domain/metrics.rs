//! Performance metrics for a strategy log-return series.

const TRADING_DAYS_PER_YEAR: f64 = 252.0;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StrategyMetrics {
    pub cagr: f64,
    pub sharpe: f64,
    /// Largest peak-to-trough decline as a negative fraction (0 when none).
    pub max_drawdown: f64,
    /// exp(sum of log returns)
    pub cumulative_return: f64,
}

impl StrategyMetrics {
    pub fn compute(log_returns: &[f64]) -> Self {
        let total_log: f64 = log_returns.iter().sum();
        let cumulative_return = total_log.exp();

        let periods = log_returns.len() as f64;
        let years = periods / TRADING_DAYS_PER_YEAR;
        let cagr = if years > 0.0 && cumulative_return.is_finite() {
            cumulative_return.powf(1.0 / years) - 1.0
        } else {
            0.0
        };

        StrategyMetrics {
            cagr,
            sharpe: compute_sharpe(log_returns),
            max_drawdown: compute_drawdown(log_returns),
            cumulative_return,
        }
    }
}

fn compute_drawdown(log_returns: &[f64]) -> f64 {
    let mut log_equity = 0.0_f64;
    let mut log_peak = 0.0_f64;
    let mut max_dd = 0.0_f64;

    for r in log_returns {
        log_equity += r;
        if log_equity > log_peak {
            log_peak = log_equity;
        }
        let dd = (log_equity - log_peak).exp() - 1.0;
        if dd < max_dd {
            max_dd = dd;
        }
    }

    max_dd
}

fn compute_sharpe(returns: &[f64]) -> f64 {
    if returns.len() < 2 {
        return 0.0;
    }

    let n = returns.len() as f64;
    let mean: f64 = returns.iter().sum::<f64>() / n;
    let variance: f64 = returns.iter().map(|r| (r - mean).powi(2)).sum::<f64>() / (n - 1.0);
    let stddev = variance.sqrt();

    if stddev > 0.0 {
        (mean / stddev) * TRADING_DAYS_PER_YEAR.sqrt()
    } else {
        0.0
    }
}
