//! Standard Deviation indicator.
//!
//! Population standard deviation over n values.
//! STDDEV(n)[i] = sqrt(sum((x[i-j] - SMA(n)[i])^2 for j in 0..n) / n)
//! Warmup: first (n-1) values are undefined.

use super::Series;

pub fn calculate_stddev(values: &[f64], period: usize) -> Series {
    let mut out = vec![None; values.len()];
    if period == 0 {
        return out;
    }

    for i in (period - 1)..values.len() {
        let window = &values[i + 1 - period..=i];
        let mean: f64 = window.iter().sum::<f64>() / period as f64;
        let variance: f64 = window
            .iter()
            .map(|x| {
                let diff = x - mean;
                diff * diff
            })
            .sum::<f64>()
            / period as f64;
        out[i] = Some(variance.sqrt());
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stddev_warmup() {
        let series = calculate_stddev(&[10.0, 20.0, 30.0, 40.0, 50.0], 3);
        assert!(series[0].is_none());
        assert!(series[1].is_none());
        assert!(series[2].is_some());
        assert!(series[4].is_some());
    }

    #[test]
    fn stddev_constant_values() {
        let series = calculate_stddev(&[100.0; 5], 3);
        assert_eq!(series[2], Some(0.0));
    }

    #[test]
    fn stddev_known_values() {
        let series = calculate_stddev(&[2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0], 8);
        let v = series[7].unwrap();
        assert!((v - 2.0).abs() < 1e-10);
    }

    #[test]
    fn stddev_is_population_not_sample() {
        let series = calculate_stddev(&[1.0, 3.0], 2);
        // population: sqrt(((1-2)^2 + (3-2)^2) / 2) = 1; sample would be sqrt(2)
        assert!((series[1].unwrap() - 1.0).abs() < 1e-12);
    }

    #[test]
    fn stddev_short_input_all_undefined() {
        assert_eq!(calculate_stddev(&[1.0, 2.0], 3), vec![None, None]);
    }
}
