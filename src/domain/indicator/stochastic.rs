//! Stochastic oscillator.
//!
//! %K = 100 * (close - LL) / (HH - LL) over the trailing k bars, 50 when
//! the window has no range. %D = SMA(%K, d).

use super::{highest, lowest, sma_series, Series};
use crate::domain::ohlcv::{highs, lows, OhlcvBar};

#[derive(Debug, Clone, PartialEq)]
pub struct Stochastic {
    pub k: Series,
    pub d: Series,
}

pub fn calculate_stochastic(bars: &[OhlcvBar], k_period: usize, d_period: usize) -> Stochastic {
    let hh = highest(&highs(bars), k_period);
    let ll = lowest(&lows(bars), k_period);

    let k: Series = bars
        .iter()
        .enumerate()
        .map(|(i, bar)| {
            let (high, low) = (hh[i]?, ll[i]?);
            let range = high - low;
            if range == 0.0 {
                Some(50.0)
            } else {
                Some(100.0 * (bar.close - low) / range)
            }
        })
        .collect();
    let d = sma_series(&k, d_period);

    Stochastic { k, d }
}
