//! OBV (On-Balance Volume) indicator.

use super::{ema_series, Series};
use crate::domain::ohlcv::OhlcvBar;

pub const OBV_EMA_PERIOD: usize = 20;

#[derive(Debug, Clone, PartialEq)]
pub struct Obv {
    pub obv: Series,
    pub obv_ema: Series,
}

/// Calculate OBV and its EMA(20).
///
/// OBV[0] = volume[0]
/// If close[i] > close[i-1]: OBV[i] = OBV[i-1] + volume[i]
/// If close[i] < close[i-1]: OBV[i] = OBV[i-1] - volume[i]
/// If close[i] == close[i-1]: OBV[i] = OBV[i-1]
///
/// No warmup period; all bars are defined.
pub fn calculate_obv(bars: &[OhlcvBar]) -> Obv {
    let mut obv_values = Vec::with_capacity(bars.len());
    let mut obv = 0.0;

    for (i, bar) in bars.iter().enumerate() {
        if i == 0 {
            obv = bar.volume;
        } else if bar.close > bars[i - 1].close {
            obv += bar.volume;
        } else if bar.close < bars[i - 1].close {
            obv -= bar.volume;
        }
        obv_values.push(Some(obv));
    }

    let obv_ema = ema_series(&obv_values, OBV_EMA_PERIOD);
    Obv {
        obv: obv_values,
        obv_ema,
    }
}
