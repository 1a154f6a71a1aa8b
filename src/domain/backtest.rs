//! Backtest pipeline: strategy run, equity curve, metrics.
//!
//! [`BacktestConfig`] fixes everything a run depends on, so a result can be
//! regenerated from its config and the same bars.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::error::StrategylabError;
use super::metrics::PerformanceMetrics;
use super::ohlcv::OhlcvBar;
use super::position::{Signal, Trade};
use super::strategy::{StrategyKind, StrategyParams};

pub const DEFAULT_INITIAL_CAPITAL: f64 = 10_000.0;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BacktestConfig {
    pub strategy: StrategyKind,
    pub params: StrategyParams,
    pub initial_capital: f64,
    pub commission_rate: f64,
    pub slippage_rate: f64,
    pub start: Option<NaiveDateTime>,
    pub end: Option<NaiveDateTime>,
}

impl BacktestConfig {
    /// Default-parameter run over the whole series with no trading costs.
    pub fn new(strategy: StrategyKind) -> Self {
        BacktestConfig {
            strategy,
            params: StrategyParams::new(),
            initial_capital: DEFAULT_INITIAL_CAPITAL,
            commission_rate: 0.0,
            slippage_rate: 0.0,
            start: None,
            end: None,
        }
    }

    pub fn validate(&self) -> Result<(), StrategylabError> {
        let invalid = |key: &str, reason: &str| StrategylabError::ConfigInvalid {
            section: "backtest".to_string(),
            key: key.to_string(),
            reason: reason.to_string(),
        };

        if !self.initial_capital.is_finite() || self.initial_capital <= 0.0 {
            return Err(invalid("initial_capital", "must be a positive number"));
        }
        for (key, rate) in [
            ("commission_rate", self.commission_rate),
            ("slippage_rate", self.slippage_rate),
        ] {
            if !(0.0..1.0).contains(&rate) {
                return Err(invalid(key, "must be within [0, 1)"));
            }
        }
        if let (Some(start), Some(end)) = (self.start, self.end) {
            if start > end {
                return Err(invalid("start_date", "must not be after end_date"));
            }
        }
        Ok(())
    }

    fn includes(&self, timestamp: NaiveDateTime) -> bool {
        self.start.is_none_or(|start| timestamp >= start)
            && self.end.is_none_or(|end| timestamp <= end)
    }
}

/// One mark-to-market sample per input bar.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EquityPoint {
    pub timestamp: NaiveDateTime,
    pub equity: f64,
    pub drawdown_percent: f64,
    pub benchmark_percent: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BacktestResult {
    pub config: BacktestConfig,
    pub trades: Vec<Trade>,
    pub signals: Vec<Signal>,
    pub equity_curve: Vec<EquityPoint>,
    pub metrics: PerformanceMetrics,
}

/// Runs `config.strategy` over the bars inside the configured date range
/// and accounts for the resulting trades.
pub fn run_backtest(
    bars: &[OhlcvBar],
    config: &BacktestConfig,
) -> Result<BacktestResult, StrategylabError> {
    config.validate()?;

    let window: Vec<OhlcvBar> = bars
        .iter()
        .filter(|bar| config.includes(bar.timestamp))
        .cloned()
        .collect();

    if window.is_empty() {
        debug!(strategy = %config.strategy, "no bars in range, empty result");
        return Ok(BacktestResult {
            config: config.clone(),
            trades: Vec::new(),
            signals: Vec::new(),
            equity_curve: Vec::new(),
            metrics: PerformanceMetrics::default(),
        });
    }

    let output = config.strategy.run(&window, &config.params)?;
    let equity_curve = build_equity_curve(&window, &output.trades, config);
    let metrics = PerformanceMetrics::compute(
        &output.trades,
        &equity_curve,
        config.initial_capital,
        config.commission_rate,
    );

    debug!(
        strategy = %config.strategy,
        bars = window.len(),
        trades = output.trades.len(),
        sharpe = metrics.sharpe_ratio,
        "backtest finished"
    );

    Ok(BacktestResult {
        config: config.clone(),
        trades: output.trades,
        signals: output.signals,
        equity_curve,
        metrics,
    })
}

/// Walks the bars once, booking entry commission on the entry bar and the
/// cost-adjusted P&L on the exit bar. Open positions are marked to the bar
/// close in the reported equity without touching the running balance.
pub fn build_equity_curve(
    bars: &[OhlcvBar],
    trades: &[Trade],
    config: &BacktestConfig,
) -> Vec<EquityPoint> {
    let mut equity = config.initial_capital;
    let mut peak = config.initial_capital;
    let mut next = 0usize;
    let mut open: Option<&Trade> = None;
    let first_close = bars.first().map(|b| b.close).unwrap_or(0.0);

    let mut curve = Vec::with_capacity(bars.len());

    for bar in bars {
        loop {
            if let Some(trade) = open {
                if trade.exit_timestamp == Some(bar.timestamp) {
                    let exit_price = trade.exit_price.unwrap_or(bar.close);
                    let notional = exit_price * trade.size;
                    let adjusted = trade.pnl.unwrap_or(0.0)
                        - notional * config.slippage_rate
                        - notional * config.commission_rate;
                    equity += adjusted;
                    peak = peak.max(equity);
                    open = None;
                    continue;
                }
                break;
            }

            match trades.get(next) {
                Some(trade) if trade.entry_timestamp == bar.timestamp => {
                    equity -= trade.entry_price * trade.size * config.commission_rate;
                    open = Some(trade);
                    next += 1;
                }
                _ => break,
            }
        }

        let unrealized = open.map(|t| t.unrealized_pnl(bar.close)).unwrap_or(0.0);
        let reported = equity + unrealized;
        let drawdown_percent = if peak > 0.0 && reported < peak {
            (peak - reported) / peak * 100.0
        } else {
            0.0
        };
        let benchmark_percent = if first_close != 0.0 {
            (bar.close / first_close - 1.0) * 100.0
        } else {
            0.0
        };

        curve.push(EquityPoint {
            timestamp: bar.timestamp,
            equity: reported,
            drawdown_percent,
            benchmark_percent,
        });
    }

    curve
}
