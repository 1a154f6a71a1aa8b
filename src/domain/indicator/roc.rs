//! Rate of Change and Momentum.
//!
//! ROC(n)[i] = 100 * (x[i] - x[i-n]) / x[i-n], undefined when x[i-n] == 0.
//! MOMENTUM(n)[i] = x[i] - x[i-n].
//! Warmup: first n values are undefined.

use super::Series;

pub fn calculate_roc(values: &[f64], period: usize) -> Series {
    lagged(values, period, |current, past| {
        if past == 0.0 {
            None
        } else {
            Some(100.0 * (current - past) / past)
        }
    })
}

pub fn calculate_momentum(values: &[f64], period: usize) -> Series {
    lagged(values, period, |current, past| Some(current - past))
}

fn lagged(values: &[f64], period: usize, f: impl Fn(f64, f64) -> Option<f64>) -> Series {
    let mut out = vec![None; values.len()];
    if period == 0 {
        return out;
    }
    for i in period..values.len() {
        out[i] = f(values[i], values[i - period]);
    }
    out
}
