//! Stochastic %K/%D crossover at the oscillator extremes.

use crate::domain::error::StrategylabError;
use crate::domain::indicator::{calculate_sma, calculate_stochastic, cross_at};
use crate::domain::ohlcv::{closes, OhlcvBar};

use super::params::{ParamReader, RiskLimits, StrategyParams};
use super::{PositionBook, StrategyOutput};

pub const DEFAULTS: &[(&str, f64)] = &[
    ("k_period", 14.0),
    ("d_period", 3.0),
    ("oversold", 20.0),
    ("overbought", 80.0),
    ("sma_period", 50.0),
    ("stop_loss_percent", 2.0),
    ("take_profit_percent", 4.0),
];

#[derive(Debug, Clone, PartialEq)]
pub struct StochasticParams {
    pub k_period: usize,
    pub d_period: usize,
    pub oversold: f64,
    pub overbought: f64,
    pub sma_period: usize,
    pub risk: RiskLimits,
}

impl StochasticParams {
    pub fn from_params(params: &StrategyParams) -> Result<Self, StrategylabError> {
        let reader = ParamReader::new(params, DEFAULTS);
        Ok(Self {
            k_period: reader.period("k_period")?,
            d_period: reader.period("d_period")?,
            oversold: reader.level("oversold")?,
            overbought: reader.level("overbought")?,
            sma_period: reader.period("sma_period")?,
            risk: reader.risk()?,
        })
    }
}

/// Buys when %K crosses above %D below `oversold` with price above its
/// average; sells when %K crosses below %D above `overbought`.
pub fn run(bars: &[OhlcvBar], params: &StrategyParams) -> Result<StrategyOutput, StrategylabError> {
    let p = StochasticParams::from_params(params)?;
    let close = closes(bars);
    let stoch = calculate_stochastic(bars, p.k_period, p.d_period);
    let sma = calculate_sma(&close, p.sma_period);

    let mut book = PositionBook::new();
    let start = (p.k_period + p.d_period - 1).max(p.sma_period - 1);

    for i in start..bars.len() {
        let bar = &bars[i];
        let (Some(k), Some(sma_now)) = (stoch.k[i], sma[i]) else {
            continue;
        };
        let cross = cross_at(&stoch.k, &stoch.d, i);

        if book.is_flat() {
            if cross > 0 && k < p.oversold && bar.close > sma_now {
                book.enter(bar, format!("%K {:.1} crossed above %D while oversold", k));
            }
            continue;
        }

        let technical =
            (cross < 0 && k > p.overbought).then(|| format!("%K {:.1} crossed below %D while overbought", k));
        book.exit_on(bar, technical, &p.risk);
    }

    Ok(book.finish(bars))
}
