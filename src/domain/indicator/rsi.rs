//! RSI (Relative Strength Index) indicator.
//!
//! Uses Wilder's smoothing for average gain/loss calculation:
//! - First average: simple mean of the first n gains/losses
//! - Subsequent: avg = (prev_avg * (n-1) + current) / n
//!
//! RS = avg_gain / avg_loss, or 100 when avg_loss == 0.
//! RSI = 100 - 100 / (1 + RS)
//!
//! Warmup: first n values are undefined (n price changes are needed).

use super::Series;

pub const DEFAULT_PERIOD: usize = 14;

/// RS used when there are no losses in the smoothing window.
const RS_CEILING: f64 = 100.0;

pub fn calculate_rsi(values: &[f64], period: usize) -> Series {
    let mut out = vec![None; values.len()];
    if period == 0 || values.len() <= period {
        return out;
    }

    let p = period as f64;
    let mut avg_gain = 0.0;
    let mut avg_loss = 0.0;

    for i in 1..=period {
        let (gain, loss) = split_change(values[i] - values[i - 1]);
        avg_gain += gain;
        avg_loss += loss;
    }
    avg_gain /= p;
    avg_loss /= p;
    out[period] = Some(rsi_from(avg_gain, avg_loss));

    for i in (period + 1)..values.len() {
        let (gain, loss) = split_change(values[i] - values[i - 1]);
        avg_gain = (avg_gain * (p - 1.0) + gain) / p;
        avg_loss = (avg_loss * (p - 1.0) + loss) / p;
        out[i] = Some(rsi_from(avg_gain, avg_loss));
    }

    out
}

fn split_change(change: f64) -> (f64, f64) {
    if change > 0.0 {
        (change, 0.0)
    } else {
        (0.0, -change)
    }
}

fn rsi_from(avg_gain: f64, avg_loss: f64) -> f64 {
    let rs = if avg_loss == 0.0 {
        RS_CEILING
    } else {
        avg_gain / avg_loss
    };
    100.0 - 100.0 / (1.0 + rs)
}
