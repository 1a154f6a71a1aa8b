//! MACD (Moving Average Convergence Divergence) indicator.
//!
//! MACD Line = EMA(fast) - EMA(slow)
//! Signal Line = EMA(signal) of MACD Line
//! Histogram = MACD Line - Signal Line
//!
//! Because EMA is warmup-seeded, every column is defined for non-empty input.

use super::{calculate_ema, ema_series, ema_warmup, Series};

pub const DEFAULT_FAST: usize = 12;
pub const DEFAULT_SLOW: usize = 26;
pub const DEFAULT_SIGNAL: usize = 9;

#[derive(Debug, Clone, PartialEq)]
pub struct Macd {
    pub macd: Series,
    pub signal: Series,
    pub histogram: Series,
}

/// First index at which the signal line smooths only fully warmed MACD
/// values.
pub fn macd_warmup(fast: usize, slow: usize, signal_period: usize) -> usize {
    ema_warmup(fast.max(slow)) + ema_warmup(signal_period)
}

pub fn calculate_macd(values: &[f64], fast: usize, slow: usize, signal_period: usize) -> Macd {
    let ema_fast = calculate_ema(values, fast);
    let ema_slow = calculate_ema(values, slow);

    let macd: Series = ema_fast
        .iter()
        .zip(&ema_slow)
        .map(|(f, s)| Some((*f)? - (*s)?))
        .collect();
    let signal = ema_series(&macd, signal_period);
    let histogram = macd
        .iter()
        .zip(&signal)
        .map(|(m, s)| Some((*m)? - (*s)?))
        .collect();

    Macd {
        macd,
        signal,
        histogram,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn macd_defined_from_first_bar() {
        let values: Vec<f64> = (0..40).map(|i| 100.0 + (i as f64 * 0.3).sin()).collect();
        let result = calculate_macd(&values, 12, 26, 9);
        assert!(result.macd.iter().all(Option::is_some));
        assert!(result.signal.iter().all(Option::is_some));
        assert!(result.histogram.iter().all(Option::is_some));
        assert_eq!(result.macd[0], Some(0.0));
    }

    #[test]
    fn macd_line_is_ema_difference() {
        let values = [10.0, 11.0, 13.0, 12.0, 15.0, 16.0];
        let result = calculate_macd(&values, 2, 4, 3);
        let fast = calculate_ema(&values, 2);
        let slow = calculate_ema(&values, 4);
        for i in 0..values.len() {
            assert_relative_eq!(
                result.macd[i].unwrap(),
                fast[i].unwrap() - slow[i].unwrap()
            );
            assert_relative_eq!(
                result.histogram[i].unwrap(),
                result.macd[i].unwrap() - result.signal[i].unwrap()
            );
        }
    }

    #[test]
    fn macd_flat_series_is_zero() {
        let result = calculate_macd(&[42.0; 30], 12, 26, 9);
        for v in result.histogram {
            assert_relative_eq!(v.unwrap(), 0.0);
        }
    }

    #[test]
    fn macd_zero_period_is_undefined() {
        let result = calculate_macd(&[1.0, 2.0, 3.0], 0, 26, 9);
        assert!(result.macd.iter().all(Option::is_none));
        assert!(result.signal.iter().all(Option::is_none));
    }

    #[test]
    fn warmup_covers_slow_and_signal_windows() {
        assert_eq!(macd_warmup(12, 26, 9), 33);
        assert_eq!(macd_warmup(26, 12, 1), 25);
    }
}
