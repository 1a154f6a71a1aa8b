//! Bollinger Bands indicator.
//!
//! - Middle: SMA(n)
//! - Upper/Lower: Middle ± multiplier × StdDev(n) (population)
//! - %B: (price - lower) / (upper - lower), undefined when the bands touch
//! - Bandwidth: (upper - lower) / middle, undefined when middle is zero
//!
//! Warmup: first (n-1) values are undefined in every column.

use super::{calculate_sma, calculate_stddev, Series};

pub const DEFAULT_PERIOD: usize = 20;
pub const DEFAULT_MULTIPLIER: f64 = 2.0;

#[derive(Debug, Clone, PartialEq)]
pub struct BollingerBands {
    pub upper: Series,
    pub middle: Series,
    pub lower: Series,
    pub percent_b: Series,
    pub bandwidth: Series,
}

pub fn calculate_bollinger(values: &[f64], period: usize, multiplier: f64) -> BollingerBands {
    let middle = calculate_sma(values, period);
    let sigma = calculate_stddev(values, period);

    let n = values.len();
    let mut bands = BollingerBands {
        upper: vec![None; n],
        middle: middle.clone(),
        lower: vec![None; n],
        percent_b: vec![None; n],
        bandwidth: vec![None; n],
    };

    for i in 0..n {
        let (Some(mid), Some(sd)) = (middle[i], sigma[i]) else {
            continue;
        };
        let upper = mid + multiplier * sd;
        let lower = mid - multiplier * sd;
        let width = upper - lower;

        bands.upper[i] = Some(upper);
        bands.lower[i] = Some(lower);
        if width != 0.0 {
            bands.percent_b[i] = Some((values[i] - lower) / width);
        }
        if mid != 0.0 {
            bands.bandwidth[i] = Some(width / mid);
        }
    }

    bands
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn bollinger_warmup() {
        let bands = calculate_bollinger(&[1.0, 2.0, 3.0, 4.0], 3, 2.0);
        for column in [&bands.upper, &bands.middle, &bands.lower, &bands.bandwidth] {
            assert!(column[0].is_none());
            assert!(column[1].is_none());
            assert!(column[2].is_some());
        }
    }

    #[test]
    fn bollinger_band_math() {
        let bands = calculate_bollinger(&[10.0, 20.0, 30.0], 3, 2.0);
        let mid = 20.0;
        let sd = (200.0_f64 / 3.0).sqrt();
        assert_relative_eq!(bands.middle[2].unwrap(), mid);
        assert_relative_eq!(bands.upper[2].unwrap(), mid + 2.0 * sd);
        assert_relative_eq!(bands.lower[2].unwrap(), mid - 2.0 * sd);
        assert_relative_eq!(bands.bandwidth[2].unwrap(), 4.0 * sd / mid, epsilon = 1e-10);
        let expected_b = (30.0 - (mid - 2.0 * sd)) / (4.0 * sd);
        assert_relative_eq!(bands.percent_b[2].unwrap(), expected_b, epsilon = 1e-10);
    }

    #[test]
    fn bollinger_constant_prices() {
        let bands = calculate_bollinger(&[50.0; 6], 4, 2.0);
        for i in 3..6 {
            assert_eq!(bands.bandwidth[i], Some(0.0));
            assert_eq!(bands.percent_b[i], None);
            assert_eq!(bands.upper[i], bands.lower[i]);
        }
    }

    #[test]
    fn bollinger_zero_middle_has_no_bandwidth() {
        let bands = calculate_bollinger(&[-1.0, 1.0], 2, 2.0);
        assert_eq!(bands.middle[1], Some(0.0));
        assert_eq!(bands.bandwidth[1], None);
        assert!(bands.percent_b[1].is_some());
    }
}
