//! Trend entry with a volatility trailing stop.
//!
//! Enters when price is above a rising SMA. The stop trails the highest
//! close since entry by `atr_multiplier` ATRs and only ever moves up. There
//! is no profit target and no technical exit.

use crate::domain::error::StrategylabError;
use crate::domain::indicator::{calculate_atr, calculate_sma, ema_warmup};
use crate::domain::ohlcv::{closes, OhlcvBar};
use crate::domain::position::SignalKind;

use super::params::{ParamReader, StrategyParams};
use super::{PositionBook, StrategyOutput};

pub const DEFAULTS: &[(&str, f64)] = &[
    ("atr_period", 14.0),
    ("atr_multiplier", 3.0),
    ("sma_period", 20.0),
];

pub const TRAILING_STOP: &str = "Trailing stop";

#[derive(Debug, Clone, PartialEq)]
pub struct AtrTrailingParams {
    pub atr_period: usize,
    pub atr_multiplier: f64,
    pub sma_period: usize,
}

impl AtrTrailingParams {
    pub fn from_params(params: &StrategyParams) -> Result<Self, StrategylabError> {
        let reader = ParamReader::new(params, DEFAULTS);
        Ok(Self {
            atr_period: reader.period("atr_period")?,
            atr_multiplier: reader.positive("atr_multiplier")?,
            sma_period: reader.period("sma_period")?,
        })
    }
}

struct TrailingStop {
    highest_close: f64,
    stop: f64,
}

pub fn run(bars: &[OhlcvBar], params: &StrategyParams) -> Result<StrategyOutput, StrategylabError> {
    let p = AtrTrailingParams::from_params(params)?;
    let close = closes(bars);
    let atr = calculate_atr(bars, p.atr_period);
    let sma = calculate_sma(&close, p.sma_period);

    let mut book = PositionBook::new();
    let mut trail: Option<TrailingStop> = None;

    let start = p.sma_period.max(ema_warmup(p.atr_period)).max(1);

    for i in start..bars.len() {
        let bar = &bars[i];
        let (Some(atr_now), Some(sma_now), Some(sma_prev)) = (atr[i], sma[i], sma[i - 1]) else {
            continue;
        };
        let distance = atr_now * p.atr_multiplier;

        match trail.as_mut() {
            None => {
                if bar.close > sma_now && sma_now > sma_prev {
                    book.enter(bar, format!("Close {:.2} above rising SMA {:.2}", bar.close, sma_now));
                    trail = Some(TrailingStop {
                        highest_close: bar.close,
                        stop: bar.close - distance,
                    });
                }
            }
            Some(state) => {
                state.highest_close = state.highest_close.max(bar.close);
                state.stop = state.stop.max(state.highest_close - distance);
                if bar.close < state.stop {
                    book.exit(bar, SignalKind::Exit, TRAILING_STOP.to_string());
                    trail = None;
                }
            }
        }
    }

    Ok(book.finish(bars))
}
