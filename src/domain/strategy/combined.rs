//! Multi-indicator voting strategy.
//!
//! Five bullish conditions vote for entry:
//! - RSI below `rsi_oversold`
//! - MACD histogram above zero
//! - close above the short SMA
//! - short SMA above the long SMA
//! - OBV above its EMA
//!
//! Four bearish conditions vote for exit:
//! - RSI above `rsi_overbought`
//! - MACD histogram below zero
//! - close below the short SMA
//! - close at or above the upper Bollinger band
//!
//! MACD runs with its standard 12/26/9 windows.

use crate::domain::error::StrategylabError;
use crate::domain::indicator::{
    calculate_bollinger, calculate_macd, calculate_obv, calculate_rsi, calculate_sma, ema_warmup,
    macd, macd_warmup,
};
use crate::domain::indicator::obv::OBV_EMA_PERIOD;
use crate::domain::ohlcv::{closes, OhlcvBar};

use super::params::{ParamReader, RiskLimits, StrategyParams};
use super::{PositionBook, StrategyOutput};

pub const DEFAULTS: &[(&str, f64)] = &[
    ("entry_votes", 3.0),
    ("exit_votes", 3.0),
    ("rsi_period", 14.0),
    ("rsi_oversold", 40.0),
    ("rsi_overbought", 65.0),
    ("sma_short", 20.0),
    ("sma_long", 50.0),
    ("bb_period", 20.0),
    ("bb_std_dev", 2.0),
    ("stop_loss_percent", 3.0),
    ("take_profit_percent", 6.0),
];

const BULLISH_CONDITIONS: usize = 5;
const BEARISH_CONDITIONS: usize = 4;

#[derive(Debug, Clone, PartialEq)]
pub struct CombinedParams {
    pub entry_votes: usize,
    pub exit_votes: usize,
    pub rsi_period: usize,
    pub rsi_oversold: f64,
    pub rsi_overbought: f64,
    pub sma_short: usize,
    pub sma_long: usize,
    pub bb_period: usize,
    pub bb_std_dev: f64,
    pub risk: RiskLimits,
}

impl CombinedParams {
    pub fn from_params(params: &StrategyParams) -> Result<Self, StrategylabError> {
        let reader = ParamReader::new(params, DEFAULTS);
        let entry_votes = reader.period("entry_votes")?;
        if entry_votes > BULLISH_CONDITIONS {
            return Err(StrategylabError::invalid_param(
                "entry_votes",
                entry_votes as f64,
                "exceeds the 5 bullish conditions",
            ));
        }
        let exit_votes = reader.period("exit_votes")?;
        if exit_votes > BEARISH_CONDITIONS {
            return Err(StrategylabError::invalid_param(
                "exit_votes",
                exit_votes as f64,
                "exceeds the 4 bearish conditions",
            ));
        }
        Ok(Self {
            entry_votes,
            exit_votes,
            rsi_period: reader.period("rsi_period")?,
            rsi_oversold: reader.level("rsi_oversold")?,
            rsi_overbought: reader.level("rsi_overbought")?,
            sma_short: reader.period("sma_short")?,
            sma_long: reader.period("sma_long")?,
            bb_period: reader.period("bb_period")?,
            bb_std_dev: reader.positive("bb_std_dev")?,
            risk: reader.risk()?,
        })
    }
}

fn votes(conditions: &[bool]) -> usize {
    conditions.iter().filter(|&&c| c).count()
}

pub fn run(bars: &[OhlcvBar], params: &StrategyParams) -> Result<StrategyOutput, StrategylabError> {
    let p = CombinedParams::from_params(params)?;
    let close = closes(bars);
    let rsi = calculate_rsi(&close, p.rsi_period);
    let macd_lines = calculate_macd(&close, macd::DEFAULT_FAST, macd::DEFAULT_SLOW, macd::DEFAULT_SIGNAL);
    let sma_short = calculate_sma(&close, p.sma_short);
    let sma_long = calculate_sma(&close, p.sma_long);
    let bands = calculate_bollinger(&close, p.bb_period, p.bb_std_dev);
    let obv = calculate_obv(bars);

    let mut book = PositionBook::new();
    let start = p
        .rsi_period
        .max(p.sma_short - 1)
        .max(p.sma_long - 1)
        .max(p.bb_period - 1)
        .max(macd_warmup(macd::DEFAULT_FAST, macd::DEFAULT_SLOW, macd::DEFAULT_SIGNAL))
        .max(ema_warmup(OBV_EMA_PERIOD));

    for i in start..bars.len() {
        let bar = &bars[i];
        let (Some(rsi_now), Some(hist), Some(short), Some(long), Some(upper), Some(obv_now), Some(obv_ema)) = (
            rsi[i],
            macd_lines.histogram[i],
            sma_short[i],
            sma_long[i],
            bands.upper[i],
            obv.obv[i],
            obv.obv_ema[i],
        ) else {
            continue;
        };

        if book.is_flat() {
            let bullish = votes(&[
                rsi_now < p.rsi_oversold,
                hist > 0.0,
                bar.close > short,
                short > long,
                obv_now > obv_ema,
            ]);
            if bullish >= p.entry_votes {
                book.enter(bar, format!("{bullish}/{BULLISH_CONDITIONS} bullish conditions"));
            }
            continue;
        }

        let bearish = votes(&[
            rsi_now > p.rsi_overbought,
            hist < 0.0,
            bar.close < short,
            bar.close >= upper,
        ]);
        let technical = (bearish >= p.exit_votes)
            .then(|| format!("{bearish}/{BEARISH_CONDITIONS} bearish conditions"));
        book.exit_on(bar, technical, &p.risk);
    }

    Ok(book.finish(bars))
}
