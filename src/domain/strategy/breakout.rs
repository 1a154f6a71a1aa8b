//! Donchian-style channel breakout.
//!
//! The channel at bar `i` spans the `lookback` bars before it, so the
//! current bar never contributes to the level it is compared against.

use crate::domain::error::StrategylabError;
use crate::domain::indicator::{highest, lowest};
use crate::domain::ohlcv::{highs, lows, OhlcvBar};

use super::params::{ParamReader, RiskLimits, StrategyParams};
use super::{PositionBook, StrategyOutput};

pub const DEFAULTS: &[(&str, f64)] = &[
    ("lookback", 20.0),
    ("stop_loss_percent", 3.0),
    ("take_profit_percent", 8.0),
];

#[derive(Debug, Clone, PartialEq)]
pub struct BreakoutParams {
    pub lookback: usize,
    pub risk: RiskLimits,
}

impl BreakoutParams {
    pub fn from_params(params: &StrategyParams) -> Result<Self, StrategylabError> {
        let reader = ParamReader::new(params, DEFAULTS);
        Ok(Self {
            lookback: reader.period("lookback")?,
            risk: reader.risk()?,
        })
    }
}

pub fn run(bars: &[OhlcvBar], params: &StrategyParams) -> Result<StrategyOutput, StrategylabError> {
    let p = BreakoutParams::from_params(params)?;
    let upper = highest(&highs(bars), p.lookback);
    let lower = lowest(&lows(bars), p.lookback);

    let mut book = PositionBook::new();

    for i in p.lookback..bars.len() {
        let bar = &bars[i];
        let (Some(channel_high), Some(channel_low)) = (upper[i - 1], lower[i - 1]) else {
            continue;
        };

        if book.is_flat() {
            if bar.close > channel_high {
                book.enter(
                    bar,
                    format!("Close {:.2} broke {}-bar high {:.2}", bar.close, p.lookback, channel_high),
                );
            }
            continue;
        }

        let technical = (bar.close < channel_low).then(|| {
            format!("Close {:.2} broke {}-bar low {:.2}", bar.close, p.lookback, channel_low)
        });
        book.exit_on(bar, technical, &p.risk);
    }

    Ok(book.finish(bars))
}
