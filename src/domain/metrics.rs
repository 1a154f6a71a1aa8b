//! Performance metrics derived from a finished backtest.
//!
//! Everything here is a pure function of the closed trades, the equity
//! curve and the run configuration. Percentages are expressed in percent.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::backtest::EquityPoint;
use super::error::StrategylabError;
use super::position::Trade;

const TRADING_DAYS_PER_YEAR: f64 = 252.0;
const DAYS_PER_YEAR: f64 = 365.25;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PerformanceMetrics {
    pub total_trades: usize,
    pub winning_trades: usize,
    pub losing_trades: usize,
    pub win_rate: f64,
    pub gross_profit: f64,
    pub gross_loss: f64,
    pub net_profit: f64,
    pub commission_paid: f64,
    pub total_return: f64,
    pub annualized_return: f64,
    pub volatility: f64,
    pub sharpe_ratio: f64,
    pub sortino_ratio: f64,
    pub max_drawdown: f64,
    pub max_drawdown_duration: usize,
    pub calmar_ratio: f64,
    #[serde(with = "infinite_as_string")]
    pub profit_factor: f64,
    pub average_win: f64,
    pub average_loss: f64,
    pub average_win_percent: f64,
    pub average_loss_percent: f64,
    pub expectancy: f64,
    pub largest_win: f64,
    pub largest_loss: f64,
    pub average_trade_duration_hours: f64,
    pub max_consecutive_wins: usize,
    pub max_consecutive_losses: usize,
    pub final_equity: f64,
}

impl PerformanceMetrics {
    /// Derives the report. Open trades are ignored; with no closed trade the
    /// zero record is returned.
    pub fn compute(
        trades: &[Trade],
        equity_curve: &[EquityPoint],
        initial_capital: f64,
        commission_rate: f64,
    ) -> Self {
        let closed: Vec<&Trade> = trades.iter().filter(|t| t.is_closed()).collect();
        if closed.is_empty() {
            return PerformanceMetrics::default();
        }

        let mut m = PerformanceMetrics {
            total_trades: closed.len(),
            final_equity: equity_curve
                .last()
                .map(|p| p.equity)
                .unwrap_or(initial_capital),
            ..PerformanceMetrics::default()
        };

        let mut win_percent_sum = 0.0;
        let mut loss_percent_sum = 0.0;
        let mut duration_hours = 0.0;
        let mut win_streak = 0usize;
        let mut loss_streak = 0usize;

        for trade in &closed {
            let pnl = trade.pnl.unwrap_or(0.0);
            let pnl_percent = trade.pnl_percent.unwrap_or(0.0);
            m.net_profit += pnl;
            duration_hours += trade.duration_hours().unwrap_or(0.0);

            if pnl > 0.0 {
                m.winning_trades += 1;
                m.gross_profit += pnl;
                win_percent_sum += pnl_percent;
                m.largest_win = m.largest_win.max(pnl);
                win_streak += 1;
                loss_streak = 0;
            } else if pnl < 0.0 {
                m.losing_trades += 1;
                m.gross_loss += -pnl;
                loss_percent_sum += -pnl_percent;
                m.largest_loss = m.largest_loss.max(-pnl);
                loss_streak += 1;
                win_streak = 0;
            } else {
                win_streak = 0;
                loss_streak = 0;
            }
            m.max_consecutive_wins = m.max_consecutive_wins.max(win_streak);
            m.max_consecutive_losses = m.max_consecutive_losses.max(loss_streak);
        }

        let total = m.total_trades as f64;
        m.win_rate = m.winning_trades as f64 / total * 100.0;
        m.average_trade_duration_hours = duration_hours / total;
        if m.winning_trades > 0 {
            m.average_win = m.gross_profit / m.winning_trades as f64;
            m.average_win_percent = win_percent_sum / m.winning_trades as f64;
        }
        if m.losing_trades > 0 {
            m.average_loss = m.gross_loss / m.losing_trades as f64;
            m.average_loss_percent = loss_percent_sum / m.losing_trades as f64;
        }
        let win_probability = m.winning_trades as f64 / total;
        let loss_probability = m.losing_trades as f64 / total;
        m.expectancy =
            win_probability * m.average_win_percent - loss_probability * m.average_loss_percent;

        m.profit_factor = profit_factor(m.gross_profit, m.gross_loss);
        m.commission_paid = total * initial_capital * commission_rate * 2.0;

        let total_return = if initial_capital > 0.0 {
            m.net_profit / initial_capital
        } else {
            0.0
        };
        m.total_return = total_return * 100.0;
        m.annualized_return = annualized_return(total_return, elapsed_days(equity_curve)) * 100.0;

        let returns = daily_returns(equity_curve);
        let (volatility, sharpe, sortino) = compute_risk_adjusted(&returns);
        m.volatility = volatility * 100.0;
        m.sharpe_ratio = sharpe;
        m.sortino_ratio = sortino;

        let (max_drawdown, duration) = compute_drawdown(equity_curve);
        m.max_drawdown = max_drawdown;
        m.max_drawdown_duration = duration;
        m.calmar_ratio = if max_drawdown > 0.0 {
            m.annualized_return / max_drawdown
        } else {
            m.annualized_return
        };

        m
    }
}

/// Gross profit over gross loss. Infinite when there are profits and no
/// losses, zero when there are neither.
pub fn profit_factor(gross_profit: f64, gross_loss: f64) -> f64 {
    if gross_loss > 0.0 {
        gross_profit / gross_loss
    } else if gross_profit > 0.0 {
        f64::INFINITY
    } else {
        0.0
    }
}

fn elapsed_days(equity_curve: &[EquityPoint]) -> f64 {
    match (equity_curve.first(), equity_curve.last()) {
        (Some(first), Some(last)) => {
            (last.timestamp - first.timestamp).num_seconds() as f64 / 86_400.0
        }
        _ => 0.0,
    }
}

/// Compounds a fractional total return to a yearly rate.
fn annualized_return(total_return: f64, days: f64) -> f64 {
    if days <= 0.0 {
        return total_return;
    }
    let growth = 1.0 + total_return;
    if growth <= 0.0 {
        return -1.0;
    }
    growth.powf(DAYS_PER_YEAR / days) - 1.0
}

fn daily_returns(equity_curve: &[EquityPoint]) -> Vec<f64> {
    equity_curve
        .windows(2)
        .map(|w| {
            let prev = w[0].equity;
            if prev != 0.0 {
                (w[1].equity - prev) / prev
            } else {
                0.0
            }
        })
        .collect()
}

/// Annualized volatility (as a fraction), Sharpe and Sortino of a return
/// series with a zero risk-free rate.
fn compute_risk_adjusted(returns: &[f64]) -> (f64, f64, f64) {
    if returns.is_empty() {
        return (0.0, 0.0, 0.0);
    }

    let n = returns.len() as f64;
    let mean = returns.iter().sum::<f64>() / n;
    let variance = returns.iter().map(|r| (r - mean).powi(2)).sum::<f64>() / n;
    let stddev = variance.sqrt();
    let annualizer = TRADING_DAYS_PER_YEAR.sqrt();

    let sharpe = if stddev > 0.0 {
        mean / stddev * annualizer
    } else {
        0.0
    };

    let negatives: Vec<f64> = returns.iter().copied().filter(|&r| r < 0.0).collect();
    let downside = if negatives.is_empty() {
        0.0
    } else {
        (negatives.iter().map(|r| r * r).sum::<f64>() / negatives.len() as f64).sqrt()
    };
    let sortino = if downside > 0.0 {
        mean / downside * annualizer
    } else {
        0.0
    };

    (stddev * annualizer, sharpe, sortino)
}

/// Largest peak-to-trough decline in percent, and the longest run of bars
/// spent below a previous high.
fn compute_drawdown(equity_curve: &[EquityPoint]) -> (f64, usize) {
    let Some(first) = equity_curve.first() else {
        return (0.0, 0);
    };

    let mut peak = first.equity;
    let mut max_dd = 0.0_f64;
    let mut underwater = 0usize;
    let mut max_duration = 0usize;

    for point in equity_curve {
        if point.equity >= peak {
            peak = point.equity;
            underwater = 0;
            continue;
        }
        underwater += 1;
        max_duration = max_duration.max(underwater);
        if peak > 0.0 {
            max_dd = max_dd.max((peak - point.equity) / peak * 100.0);
        }
    }

    (max_dd, max_duration)
}

/// Numeric fields of [`PerformanceMetrics`] that can rank optimizer runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MetricField {
    TotalTrades,
    WinRate,
    NetProfit,
    TotalReturn,
    AnnualizedReturn,
    Volatility,
    SharpeRatio,
    SortinoRatio,
    MaxDrawdown,
    CalmarRatio,
    ProfitFactor,
    Expectancy,
    FinalEquity,
}

impl MetricField {
    pub const ALL: [MetricField; 13] = [
        MetricField::TotalTrades,
        MetricField::WinRate,
        MetricField::NetProfit,
        MetricField::TotalReturn,
        MetricField::AnnualizedReturn,
        MetricField::Volatility,
        MetricField::SharpeRatio,
        MetricField::SortinoRatio,
        MetricField::MaxDrawdown,
        MetricField::CalmarRatio,
        MetricField::ProfitFactor,
        MetricField::Expectancy,
        MetricField::FinalEquity,
    ];

    pub fn name(self) -> &'static str {
        match self {
            MetricField::TotalTrades => "total_trades",
            MetricField::WinRate => "win_rate",
            MetricField::NetProfit => "net_profit",
            MetricField::TotalReturn => "total_return",
            MetricField::AnnualizedReturn => "annualized_return",
            MetricField::Volatility => "volatility",
            MetricField::SharpeRatio => "sharpe_ratio",
            MetricField::SortinoRatio => "sortino_ratio",
            MetricField::MaxDrawdown => "max_drawdown",
            MetricField::CalmarRatio => "calmar_ratio",
            MetricField::ProfitFactor => "profit_factor",
            MetricField::Expectancy => "expectancy",
            MetricField::FinalEquity => "final_equity",
        }
    }

    pub fn value(self, metrics: &PerformanceMetrics) -> f64 {
        match self {
            MetricField::TotalTrades => metrics.total_trades as f64,
            MetricField::WinRate => metrics.win_rate,
            MetricField::NetProfit => metrics.net_profit,
            MetricField::TotalReturn => metrics.total_return,
            MetricField::AnnualizedReturn => metrics.annualized_return,
            MetricField::Volatility => metrics.volatility,
            MetricField::SharpeRatio => metrics.sharpe_ratio,
            MetricField::SortinoRatio => metrics.sortino_ratio,
            MetricField::MaxDrawdown => metrics.max_drawdown,
            MetricField::CalmarRatio => metrics.calmar_ratio,
            MetricField::ProfitFactor => metrics.profit_factor,
            MetricField::Expectancy => metrics.expectancy,
            MetricField::FinalEquity => metrics.final_equity,
        }
    }
}

impl fmt::Display for MetricField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for MetricField {
    type Err = StrategylabError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_ascii_lowercase();
        MetricField::ALL
            .into_iter()
            .find(|field| field.name() == wanted)
            .ok_or_else(|| StrategylabError::ConfigInvalid {
                section: "optimizer".to_string(),
                key: "metric".to_string(),
                reason: format!("unknown metric '{s}'"),
            })
    }
}

/// JSON has no infinity; write it as the string `"Infinity"`.
mod infinite_as_string {
    use serde::de::{self, Deserializer};
    use serde::{Deserialize, Serializer};

    const INFINITY: &str = "Infinity";

    pub fn serialize<S: Serializer>(value: &f64, serializer: S) -> Result<S::Ok, S::Error> {
        if value.is_infinite() && value.is_sign_positive() {
            serializer.serialize_str(INFINITY)
        } else {
            serializer.serialize_f64(*value)
        }
    }

    #[derive(Deserialize)]
    #[serde(untagged)]
    enum NumberOrText {
        Number(f64),
        Text(String),
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<f64, D::Error> {
        match NumberOrText::deserialize(deserializer)? {
            NumberOrText::Number(n) => Ok(n),
            NumberOrText::Text(s) if s == INFINITY => Ok(f64::INFINITY),
            NumberOrText::Text(s) => Err(de::Error::custom(format!("invalid profit factor '{s}'"))),
        }
    }
}
