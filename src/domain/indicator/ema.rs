//! Exponential Moving Average.
//!
//! k = 2/(n+1). The first (n-1) positions carry the running simple mean of
//! the values seen so far; after that EMA[i] = (x[i] - EMA[i-1])*k + EMA[i-1].
//! The series is therefore defined from the first input onward.

use super::{lift, Series};

pub fn calculate_ema(values: &[f64], period: usize) -> Series {
    ema_series(&lift(values), period)
}

/// First index past the running-mean warmup of an EMA over a fully
/// defined input.
pub fn ema_warmup(period: usize) -> usize {
    period.saturating_sub(1)
}

/// EMA over a series with undefined positions. Smoothing starts at the
/// first defined value; undefined inputs emit `None` and leave the running
/// state untouched.
pub fn ema_series(values: &[Option<f64>], period: usize) -> Series {
    let mut out = vec![None; values.len()];
    if period == 0 {
        return out;
    }

    let k = 2.0 / (period as f64 + 1.0);
    let mut seen = 0usize;
    let mut sum = 0.0;
    let mut ema = 0.0;

    for (i, value) in values.iter().enumerate() {
        let Some(x) = *value else {
            continue;
        };

        if seen == 0 || seen < period - 1 {
            sum += x;
            ema = sum / (seen + 1) as f64;
        } else {
            ema = (x - ema) * k + ema;
        }
        seen += 1;
        out[i] = Some(ema);
    }

    out
}
