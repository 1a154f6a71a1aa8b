//! Weighted Moving Average.
//!
//! Weights run n..1 with the newest value weighted n, normalized by
//! n(n+1)/2. Warmup: first (n-1) values are undefined.

use super::Series;

pub fn calculate_wma(values: &[f64], period: usize) -> Series {
    let mut out = vec![None; values.len()];
    if period == 0 {
        return out;
    }

    let denominator = (period * (period + 1)) as f64 / 2.0;

    for i in (period - 1)..values.len() {
        let window = &values[i + 1 - period..=i];
        let weighted: f64 = window
            .iter()
            .enumerate()
            .map(|(j, &x)| x * (j + 1) as f64)
            .sum();
        out[i] = Some(weighted / denominator);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn wma_weights_newest_heaviest() {
        let series = calculate_wma(&[1.0, 2.0, 3.0], 3);
        // (1*1 + 2*2 + 3*3) / 6
        assert_relative_eq!(series[2].unwrap(), 14.0 / 6.0);
    }

    #[test]
    fn wma_warmup() {
        let series = calculate_wma(&[1.0, 2.0, 3.0, 4.0], 3);
        assert!(series[0].is_none());
        assert!(series[1].is_none());
        assert_relative_eq!(series[3].unwrap(), (2.0 + 6.0 + 12.0) / 6.0);
    }

    #[test]
    fn wma_short_input_all_undefined() {
        assert_eq!(calculate_wma(&[1.0, 2.0], 3), vec![None, None]);
    }

    #[test]
    fn wma_constant_series() {
        let series = calculate_wma(&[7.0; 5], 4);
        assert_relative_eq!(series[4].unwrap(), 7.0);
    }
}
