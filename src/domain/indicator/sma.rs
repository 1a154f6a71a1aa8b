//! Simple Moving Average.
//!
//! SMA(n)[i] = mean(x[i-n+1..=i]). Warmup: first (n-1) values are undefined.

use super::{lift, Series};

pub fn calculate_sma(values: &[f64], period: usize) -> Series {
    sma_series(&lift(values), period)
}

/// SMA over a series that may itself contain undefined values. A window
/// touching any `None` is undefined.
pub fn sma_series(values: &[Option<f64>], period: usize) -> Series {
    let mut out = vec![None; values.len()];
    if period == 0 {
        return out;
    }

    for i in (period - 1)..values.len() {
        let window = &values[i + 1 - period..=i];
        out[i] = window
            .iter()
            .copied()
            .sum::<Option<f64>>()
            .map(|sum| sum / period as f64);
    }
    out
}
