//! Technical indicator implementations.
//!
//! Every indicator is a pure function returning series aligned with its
//! input. Positions without enough history hold `None`; a `None` input
//! anywhere in a window yields `None` at that output position.

pub mod adx;
pub mod atr;
pub mod bollinger;
pub mod correlation;
pub mod crossover;
pub mod ema;
pub mod ichimoku;
pub mod macd;
pub mod obv;
pub mod pivot;
pub mod roc;
pub mod rsi;
pub mod sma;
pub mod stddev;
pub mod stochastic;
pub mod vwap;
pub mod wma;

pub use adx::{calculate_adx, Adx};
pub use atr::calculate_atr;
pub use bollinger::{calculate_bollinger, BollingerBands};
pub use correlation::calculate_correlation;
pub use crossover::{cross_at, crossover};
pub use ema::{calculate_ema, ema_series, ema_warmup};
pub use ichimoku::{calculate_ichimoku, Ichimoku};
pub use macd::{calculate_macd, macd_warmup, Macd};
pub use obv::{calculate_obv, Obv};
pub use pivot::{calculate_pivot_points, PivotPoints};
pub use roc::{calculate_momentum, calculate_roc};
pub use rsi::calculate_rsi;
pub use sma::{calculate_sma, sma_series};
pub use stddev::calculate_stddev;
pub use stochastic::{calculate_stochastic, Stochastic};
pub use vwap::calculate_vwap;
pub use wma::calculate_wma;

use std::fmt;
use std::str::FromStr;

use crate::domain::error::StrategylabError;

/// An indicator output column. `None` marks an undefined position.
pub type Series = Vec<Option<f64>>;

/// Wraps a fully defined slice as a series.
pub fn lift(values: &[f64]) -> Series {
    values.iter().copied().map(Some).collect()
}

/// Value at `i`, or `None` when out of range or undefined.
pub fn value_at(series: &[Option<f64>], i: usize) -> Option<f64> {
    series.get(i).copied().flatten()
}

/// Highest value of the trailing `period` window ending at each index.
pub fn highest(values: &[f64], period: usize) -> Series {
    rolling(values, period, f64::max)
}

/// Lowest value of the trailing `period` window ending at each index.
pub fn lowest(values: &[f64], period: usize) -> Series {
    rolling(values, period, f64::min)
}

fn rolling(values: &[f64], period: usize, pick: fn(f64, f64) -> f64) -> Series {
    let mut out = vec![None; values.len()];
    if period == 0 {
        return out;
    }
    for i in (period - 1)..values.len() {
        let window = &values[i + 1 - period..=i];
        out[i] = window.iter().copied().reduce(pick);
    }
    out
}

/// Indicator identity and parameters, used to request a computation by name.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum IndicatorType {
    Sma(usize),
    Ema(usize),
    Wma(usize),
    Rsi(usize),
    Roc(usize),
    Momentum(usize),
    Atr(usize),
    Stddev(usize),
    Adx(usize),
    /// Rolling correlation of close against volume.
    Correlation(usize),
    Obv,
    Vwap,
    Ichimoku,
    Pivot,
    Macd {
        fast: usize,
        slow: usize,
        signal: usize,
    },
    Stochastic {
        k_period: usize,
        d_period: usize,
    },
    Bollinger {
        period: usize,
        stddev_mult_x100: u32,
    },
}

impl fmt::Display for IndicatorType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IndicatorType::Sma(period) => write!(f, "SMA({})", period),
            IndicatorType::Ema(period) => write!(f, "EMA({})", period),
            IndicatorType::Wma(period) => write!(f, "WMA({})", period),
            IndicatorType::Rsi(period) => write!(f, "RSI({})", period),
            IndicatorType::Roc(period) => write!(f, "ROC({})", period),
            IndicatorType::Momentum(period) => write!(f, "MOMENTUM({})", period),
            IndicatorType::Atr(period) => write!(f, "ATR({})", period),
            IndicatorType::Stddev(period) => write!(f, "STDDEV({})", period),
            IndicatorType::Adx(period) => write!(f, "ADX({})", period),
            IndicatorType::Correlation(period) => write!(f, "CORRELATION({})", period),
            IndicatorType::Obv => write!(f, "OBV"),
            IndicatorType::Vwap => write!(f, "VWAP"),
            IndicatorType::Ichimoku => write!(f, "ICHIMOKU"),
            IndicatorType::Pivot => write!(f, "PIVOT"),
            IndicatorType::Macd { fast, slow, signal } => {
                write!(f, "MACD({},{},{})", fast, slow, signal)
            }
            IndicatorType::Stochastic { k_period, d_period } => {
                write!(f, "STOCHASTIC({},{})", k_period, d_period)
            }
            IndicatorType::Bollinger {
                period,
                stddev_mult_x100,
            } => {
                let mult = *stddev_mult_x100 as f64 / 100.0;
                write!(f, "BOLLINGER({},{})", period, mult)
            }
        }
    }
}

impl FromStr for IndicatorType {
    type Err = StrategylabError;

    /// Parses the `Display` form, e.g. `SMA(20)`, `MACD(12,26,9)`, `OBV`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || StrategylabError::ConfigInvalid {
            section: "indicator".into(),
            key: s.to_string(),
            reason: "expected NAME or NAME(args)".into(),
        };

        let s = s.trim();
        let (name, args) = match s.find('(') {
            Some(open) => {
                let inner = s[open + 1..].strip_suffix(')').ok_or_else(invalid)?;
                (&s[..open], inner.split(',').map(str::trim).collect::<Vec<_>>())
            }
            None => (s, Vec::new()),
        };

        let int = |idx: usize| -> Result<usize, StrategylabError> {
            args.get(idx)
                .and_then(|a| a.parse::<usize>().ok())
                .ok_or_else(invalid)
        };

        let parsed = match (name.to_ascii_uppercase().as_str(), args.len()) {
            ("SMA", 1) => IndicatorType::Sma(int(0)?),
            ("EMA", 1) => IndicatorType::Ema(int(0)?),
            ("WMA", 1) => IndicatorType::Wma(int(0)?),
            ("RSI", 1) => IndicatorType::Rsi(int(0)?),
            ("ROC", 1) => IndicatorType::Roc(int(0)?),
            ("MOMENTUM", 1) => IndicatorType::Momentum(int(0)?),
            ("ATR", 1) => IndicatorType::Atr(int(0)?),
            ("STDDEV", 1) => IndicatorType::Stddev(int(0)?),
            ("ADX", 1) => IndicatorType::Adx(int(0)?),
            ("CORRELATION", 1) => IndicatorType::Correlation(int(0)?),
            ("OBV", 0) => IndicatorType::Obv,
            ("VWAP", 0) => IndicatorType::Vwap,
            ("ICHIMOKU", 0) => IndicatorType::Ichimoku,
            ("PIVOT", 0) => IndicatorType::Pivot,
            ("MACD", 3) => IndicatorType::Macd {
                fast: int(0)?,
                slow: int(1)?,
                signal: int(2)?,
            },
            ("STOCHASTIC", 2) => IndicatorType::Stochastic {
                k_period: int(0)?,
                d_period: int(1)?,
            },
            ("BOLLINGER", 2) => {
                let mult: f64 = args[1].parse().map_err(|_| invalid())?;
                if !mult.is_finite() || mult < 0.0 {
                    return Err(invalid());
                }
                IndicatorType::Bollinger {
                    period: int(0)?,
                    stddev_mult_x100: (mult * 100.0).round() as u32,
                }
            }
            _ => return Err(invalid()),
        };
        Ok(parsed)
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use crate::domain::ohlcv::OhlcvBar;
    use chrono::NaiveDate;

    /// Daily bars with open = high = low = close.
    pub fn flat_bars(prices: &[f64]) -> Vec<OhlcvBar> {
        prices
            .iter()
            .enumerate()
            .map(|(i, &close)| OhlcvBar {
                timestamp: NaiveDate::from_ymd_opt(2024, 1, 1)
                    .unwrap()
                    .and_hms_opt(0, 0, 0)
                    .unwrap()
                    + chrono::Duration::days(i as i64),
                open: close,
                high: close,
                low: close,
                close,
                volume: 1000.0,
            })
            .collect()
    }

    /// Daily bars from (high, low, close) triples.
    pub fn hlc_bars(rows: &[(f64, f64, f64)]) -> Vec<OhlcvBar> {
        rows.iter()
            .enumerate()
            .map(|(i, &(high, low, close))| OhlcvBar {
                timestamp: NaiveDate::from_ymd_opt(2024, 1, 1)
                    .unwrap()
                    .and_hms_opt(0, 0, 0)
                    .unwrap()
                    + chrono::Duration::days(i as i64),
                open: close,
                high,
                low,
                close,
                volume: 1000.0,
            })
            .collect()
    }
}
