//! RSI reversal out of oversold territory, filtered by a moving average.

use crate::domain::error::StrategylabError;
use crate::domain::indicator::{calculate_rsi, calculate_sma};
use crate::domain::ohlcv::{closes, OhlcvBar};

use super::params::{ParamReader, RiskLimits, StrategyParams};
use super::{PositionBook, StrategyOutput};

pub const DEFAULTS: &[(&str, f64)] = &[
    ("rsi_period", 14.0),
    ("oversold", 30.0),
    ("overbought", 70.0),
    ("sma_period", 50.0),
    ("stop_loss_percent", 3.0),
    ("take_profit_percent", 6.0),
];

#[derive(Debug, Clone, PartialEq)]
pub struct RsiParams {
    pub rsi_period: usize,
    pub oversold: f64,
    pub overbought: f64,
    pub sma_period: usize,
    pub risk: RiskLimits,
}

impl RsiParams {
    pub fn from_params(params: &StrategyParams) -> Result<Self, StrategylabError> {
        let reader = ParamReader::new(params, DEFAULTS);
        Ok(Self {
            rsi_period: reader.period("rsi_period")?,
            oversold: reader.level("oversold")?,
            overbought: reader.level("overbought")?,
            sma_period: reader.period("sma_period")?,
            risk: reader.risk()?,
        })
    }
}

pub fn run(bars: &[OhlcvBar], params: &StrategyParams) -> Result<StrategyOutput, StrategylabError> {
    let p = RsiParams::from_params(params)?;
    let close = closes(bars);
    let rsi = calculate_rsi(&close, p.rsi_period);
    let sma = calculate_sma(&close, p.sma_period);

    let mut book = PositionBook::new();
    let start = (p.rsi_period + 1).max(p.sma_period - 1);

    for i in start..bars.len() {
        let bar = &bars[i];
        let (Some(prev_rsi), Some(rsi_now), Some(sma_now)) = (rsi[i - 1], rsi[i], sma[i]) else {
            continue;
        };

        if book.is_flat() {
            if prev_rsi < p.oversold && rsi_now >= p.oversold && bar.close > sma_now {
                book.enter(
                    bar,
                    format!("RSI crossed up through {:.0} ({:.1})", p.oversold, rsi_now),
                );
            }
            continue;
        }

        let technical = (rsi_now > p.overbought).then(|| format!("RSI {:.1} overbought", rsi_now));
        book.exit_on(bar, technical, &p.risk);
    }

    Ok(book.finish(bars))
}
