//! Side-by-side strategy comparison.

use tracing::{info, warn};

use super::backtest::{run_backtest, BacktestConfig, BacktestResult};
use super::ohlcv::OhlcvBar;
use super::strategy::{StrategyKind, StrategyParams};

/// Runs every `(strategy, params)` candidate with the costs and range of
/// `base`, and ranks the results by Sharpe ratio, best first. Runs that
/// fail are logged and left out. Equal ratios keep candidate order.
pub fn compare_strategies(
    bars: &[OhlcvBar],
    base: &BacktestConfig,
    candidates: &[(StrategyKind, StrategyParams)],
) -> Vec<BacktestResult> {
    let mut results: Vec<BacktestResult> = candidates
        .iter()
        .filter_map(|(strategy, params)| {
            let config = BacktestConfig {
                strategy: *strategy,
                params: params.clone(),
                ..base.clone()
            };
            match run_backtest(bars, &config) {
                Ok(result) => Some(result),
                Err(e) => {
                    warn!(strategy = %strategy, error = %e, "comparison run failed, skipping");
                    None
                }
            }
        })
        .collect();

    results.sort_by(|a, b| {
        b.metrics
            .sharpe_ratio
            .partial_cmp(&a.metrics.sharpe_ratio)
            .unwrap_or(std::cmp::Ordering::Equal)
    });

    info!(
        candidates = candidates.len(),
        completed = results.len(),
        "strategy comparison finished"
    );
    results
}
