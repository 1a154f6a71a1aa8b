//! Bollinger band / RSI mean reversion.
//!
//! Buys a close at or below the lower band while RSI is oversold. Sells on a
//! return to the middle band, an overbought RSI, or a fresh close below the
//! lower band.

use crate::domain::error::StrategylabError;
use crate::domain::indicator::{calculate_bollinger, calculate_rsi};
use crate::domain::ohlcv::{closes, OhlcvBar};

use super::params::{ParamReader, RiskLimits, StrategyParams};
use super::{PositionBook, StrategyOutput};

pub const DEFAULTS: &[(&str, f64)] = &[
    ("bb_period", 20.0),
    ("bb_std_dev", 2.0),
    ("rsi_period", 14.0),
    ("rsi_oversold", 30.0),
    ("rsi_overbought", 70.0),
    ("stop_loss_percent", 2.0),
    ("take_profit_percent", 4.0),
];

#[derive(Debug, Clone, PartialEq)]
pub struct MeanReversionParams {
    pub bb_period: usize,
    pub bb_std_dev: f64,
    pub rsi_period: usize,
    pub rsi_oversold: f64,
    pub rsi_overbought: f64,
    pub risk: RiskLimits,
}

impl MeanReversionParams {
    pub fn from_params(params: &StrategyParams) -> Result<Self, StrategylabError> {
        let reader = ParamReader::new(params, DEFAULTS);
        Ok(Self {
            bb_period: reader.period("bb_period")?,
            bb_std_dev: reader.positive("bb_std_dev")?,
            rsi_period: reader.period("rsi_period")?,
            rsi_oversold: reader.level("rsi_oversold")?,
            rsi_overbought: reader.level("rsi_overbought")?,
            risk: reader.risk()?,
        })
    }
}

pub fn run(bars: &[OhlcvBar], params: &StrategyParams) -> Result<StrategyOutput, StrategylabError> {
    let p = MeanReversionParams::from_params(params)?;
    let close = closes(bars);
    let bands = calculate_bollinger(&close, p.bb_period, p.bb_std_dev);
    let rsi = calculate_rsi(&close, p.rsi_period);

    let mut book = PositionBook::new();
    let start = (p.bb_period - 1).max(p.rsi_period).max(1);

    for i in start..bars.len() {
        let bar = &bars[i];
        let (Some(lower), Some(middle), Some(rsi_now), Some(prev_lower)) =
            (bands.lower[i], bands.middle[i], rsi[i], bands.lower[i - 1])
        else {
            continue;
        };

        if book.is_flat() {
            if bar.close <= lower && rsi_now < p.rsi_oversold {
                book.enter(
                    bar,
                    format!("Close {:.2} at lower band {:.2}, RSI {:.1} oversold", bar.close, lower, rsi_now),
                );
            }
            continue;
        }

        let technical = if bar.close >= middle {
            Some(format!("Close {:.2} reached middle band {:.2}", bar.close, middle))
        } else if rsi_now > p.rsi_overbought {
            Some(format!("RSI {:.1} overbought", rsi_now))
        } else if close[i - 1] >= prev_lower && bar.close < lower {
            Some(format!("Close {:.2} broke below lower band {:.2}", bar.close, lower))
        } else {
            None
        };
        book.exit_on(bar, technical, &p.risk);
    }

    Ok(book.finish(bars))
}
