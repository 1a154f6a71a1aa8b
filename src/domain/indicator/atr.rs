//! Average True Range.
//!
//! TR[0] = high - low; TR[i] = max(h-l, |h-c[i-1]|, |l-c[i-1]|).
//! ATR is the EMA of TR with the same running-mean warmup as EMA.

use super::{calculate_ema, Series};
use crate::domain::ohlcv::OhlcvBar;

pub fn true_ranges(bars: &[OhlcvBar]) -> Vec<f64> {
    bars.iter()
        .enumerate()
        .map(|(i, bar)| {
            if i == 0 {
                bar.high - bar.low
            } else {
                bar.true_range(bars[i - 1].close)
            }
        })
        .collect()
}

pub fn calculate_atr(bars: &[OhlcvBar], period: usize) -> Series {
    calculate_ema(&true_ranges(bars), period)
}
