//! Ichimoku Kinko Hyo.
//!
//! Tenkan, Kijun and Senkou B are midpoints of the rolling high/low over 9,
//! 26 and 52 bars. Senkou A is the mean of Tenkan and Kijun. Chikou is the
//! close series as-is; no forward/backward displacement is applied to any
//! line.

use super::{highest, lowest, Series};
use crate::domain::ohlcv::{closes, highs, lows, OhlcvBar};

pub const TENKAN_PERIOD: usize = 9;
pub const KIJUN_PERIOD: usize = 26;
pub const SENKOU_B_PERIOD: usize = 52;

#[derive(Debug, Clone, PartialEq)]
pub struct Ichimoku {
    pub tenkan: Series,
    pub kijun: Series,
    pub senkou_a: Series,
    pub senkou_b: Series,
    pub chikou: Series,
}

pub fn calculate_ichimoku(bars: &[OhlcvBar]) -> Ichimoku {
    calculate_ichimoku_with(bars, TENKAN_PERIOD, KIJUN_PERIOD, SENKOU_B_PERIOD)
}

pub fn calculate_ichimoku_with(
    bars: &[OhlcvBar],
    tenkan_period: usize,
    kijun_period: usize,
    senkou_b_period: usize,
) -> Ichimoku {
    let high = highs(bars);
    let low = lows(bars);
    let midpoint = |period: usize| -> Series {
        highest(&high, period)
            .into_iter()
            .zip(lowest(&low, period))
            .map(|(h, l)| Some((h? + l?) / 2.0))
            .collect()
    };

    let tenkan = midpoint(tenkan_period);
    let kijun = midpoint(kijun_period);
    let senkou_a = tenkan
        .iter()
        .zip(&kijun)
        .map(|(t, k)| Some(((*t)? + (*k)?) / 2.0))
        .collect();
    let senkou_b = midpoint(senkou_b_period);
    let chikou = closes(bars).into_iter().map(Some).collect();

    Ichimoku {
        tenkan,
        kijun,
        senkou_a,
        senkou_b,
        chikou,
    }
}
