//! Rolling Pearson correlation.
//!
//! 0 when either window has zero variance. Warmup: first (n-1) values are
//! undefined; positions past the end of the shorter input are undefined.

use super::Series;

pub fn calculate_correlation(a: &[f64], b: &[f64], period: usize) -> Series {
    let mut out = vec![None; a.len()];
    if period == 0 {
        return out;
    }

    let n = a.len().min(b.len());
    for i in (period - 1)..n {
        let wa = &a[i + 1 - period..=i];
        let wb = &b[i + 1 - period..=i];
        let mean_a = wa.iter().sum::<f64>() / period as f64;
        let mean_b = wb.iter().sum::<f64>() / period as f64;

        let mut cov = 0.0;
        let mut var_a = 0.0;
        let mut var_b = 0.0;
        for (x, y) in wa.iter().zip(wb) {
            let dx = x - mean_a;
            let dy = y - mean_b;
            cov += dx * dy;
            var_a += dx * dx;
            var_b += dy * dy;
        }

        out[i] = if var_a == 0.0 || var_b == 0.0 {
            Some(0.0)
        } else {
            Some(cov / (var_a * var_b).sqrt())
        };
    }
    out
}
