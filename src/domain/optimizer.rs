//! Exhaustive parameter sweeps.
//!
//! A [`ParameterGrid`] lists candidate values per parameter. The
//! [`Optimizer`] backtests every combination in parallel and keeps the one
//! with the highest value of the chosen [`MetricField`].

use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use tracing::{debug, info, warn};

use super::backtest::{run_backtest, BacktestConfig};
use super::metrics::{MetricField, PerformanceMetrics};
use super::ohlcv::OhlcvBar;
use super::strategy::StrategyParams;

/// Candidate values per parameter key. Keys iterate in sorted order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ParameterGrid(BTreeMap<String, Vec<f64>>);

impl ParameterGrid {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, key: &str, values: Vec<f64>) -> Self {
        self.insert(key, values);
        self
    }

    pub fn insert(&mut self, key: &str, values: Vec<f64>) {
        self.0.insert(key.to_string(), values);
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    /// Number of combinations. An empty grid has exactly one (no
    /// overrides); any key without candidates makes it zero.
    pub fn len(&self) -> usize {
        self.0.values().map(Vec::len).product()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Cartesian product of the candidate lists. The last key varies
    /// fastest.
    pub fn combinations(&self) -> Vec<StrategyParams> {
        let mut combos = vec![StrategyParams::new()];
        for (key, values) in &self.0 {
            combos = combos
                .iter()
                .flat_map(|partial| values.iter().map(move |&v| partial.clone().with(key, v)))
                .collect();
        }
        combos
    }
}

/// Best combination of a sweep. With no successful run, `params` is empty,
/// `metrics` is the zero record and `evaluated` is 0.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OptimizationResult {
    pub metric: Option<MetricField>,
    pub params: StrategyParams,
    pub metrics: PerformanceMetrics,
    pub value: f64,
    pub evaluated: usize,
    pub total: usize,
    pub cancelled: bool,
}

pub struct Optimizer<'a> {
    bars: &'a [OhlcvBar],
    base: BacktestConfig,
    metric: MetricField,
    cancel: Arc<AtomicBool>,
}

impl<'a> Optimizer<'a> {
    pub fn new(bars: &'a [OhlcvBar], base: BacktestConfig, metric: MetricField) -> Self {
        Self {
            bars,
            base,
            metric,
            cancel: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Shares a cancellation flag with the caller. Setting it stops new
    /// combinations from starting; finished ones still count.
    pub fn with_cancel(mut self, cancel: Arc<AtomicBool>) -> Self {
        self.cancel = cancel;
        self
    }

    pub fn cancel_handle(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.cancel)
    }

    pub fn run(&self, grid: &ParameterGrid) -> OptimizationResult {
        self.run_with_progress(grid, |_, _| {})
    }

    /// Sweeps `grid`, calling `progress(done, total)` after each
    /// combination finishes.
    pub fn run_with_progress<F>(&self, grid: &ParameterGrid, progress: F) -> OptimizationResult
    where
        F: Fn(usize, usize) + Send + Sync,
    {
        let defaults = self.base.params.merged_over(&self.base.strategy.default_params());
        let combinations = grid.combinations();
        let total = combinations.len();
        let done = AtomicUsize::new(0);

        let outcomes: Vec<Option<(StrategyParams, PerformanceMetrics)>> = combinations
            .par_iter()
            .map(|combo| {
                if self.cancel.load(Ordering::Relaxed) {
                    return None;
                }
                let config = BacktestConfig {
                    params: combo.merged_over(&defaults),
                    ..self.base.clone()
                };
                let outcome = match run_backtest(self.bars, &config) {
                    Ok(result) => {
                        debug!(params = ?config.params, "combination evaluated");
                        Some((config.params, result.metrics))
                    }
                    Err(e) => {
                        warn!(params = ?config.params, error = %e, "combination failed, skipping");
                        None
                    }
                };
                let finished = done.fetch_add(1, Ordering::Relaxed) + 1;
                progress(finished, total);
                outcome
            })
            .collect();

        let mut best = OptimizationResult {
            total,
            cancelled: self.cancel.load(Ordering::Relaxed),
            ..OptimizationResult::default()
        };
        rank(self.metric, outcomes.into_iter().flatten(), &mut best);

        info!(
            strategy = %self.base.strategy,
            metric = %self.metric,
            total,
            evaluated = best.evaluated,
            best = best.value,
            "optimization finished"
        );
        best
    }
}

/// Keeps the first outcome with the highest metric value. NaN values are
/// neither ranked nor counted as evaluated.
fn rank(
    metric: MetricField,
    outcomes: impl IntoIterator<Item = (StrategyParams, PerformanceMetrics)>,
    best: &mut OptimizationResult,
) {
    for (params, metrics) in outcomes {
        let value = metric.value(&metrics);
        if value.is_nan() {
            continue;
        }
        best.evaluated += 1;
        if best.metric.is_none() || value > best.value {
            best.metric = Some(metric);
            best.params = params;
            best.metrics = metrics;
            best.value = value;
        }
    }
}
