//! Classic floor-trader pivot points, computed from the previous bar.
//!
//! P = (H + L + C) / 3
//! R1 = 2P - L, S1 = 2P - H
//! R2 = P + (H - L), S2 = P - (H - L)
//! R3 = H + 2(P - L), S3 = L - 2(H - P)

use super::Series;
use crate::domain::ohlcv::OhlcvBar;

#[derive(Debug, Clone, PartialEq)]
pub struct PivotPoints {
    pub pivot: Series,
    pub r1: Series,
    pub r2: Series,
    pub r3: Series,
    pub s1: Series,
    pub s2: Series,
    pub s3: Series,
}

pub fn calculate_pivot_points(bars: &[OhlcvBar]) -> PivotPoints {
    let n = bars.len();
    let mut points = PivotPoints {
        pivot: vec![None; n],
        r1: vec![None; n],
        r2: vec![None; n],
        r3: vec![None; n],
        s1: vec![None; n],
        s2: vec![None; n],
        s3: vec![None; n],
    };

    for i in 1..n {
        let prev = &bars[i - 1];
        let (h, l) = (prev.high, prev.low);
        let p = prev.typical_price();

        points.pivot[i] = Some(p);
        points.r1[i] = Some(2.0 * p - l);
        points.s1[i] = Some(2.0 * p - h);
        points.r2[i] = Some(p + (h - l));
        points.s2[i] = Some(p - (h - l));
        points.r3[i] = Some(h + 2.0 * (p - l));
        points.s3[i] = Some(l - 2.0 * (h - p));
    }

    points
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::indicator::test_support::hlc_bars;
    use approx::assert_relative_eq;

    #[test]
    fn pivot_undefined_on_first_bar() {
        let points = calculate_pivot_points(&hlc_bars(&[(12.0, 8.0, 10.0)]));
        assert_eq!(points.pivot, vec![None]);
        assert_eq!(points.s3, vec![None]);
    }

    #[test]
    fn pivot_levels_from_previous_bar() {
        let bars = hlc_bars(&[(12.0, 6.0, 9.0), (50.0, 1.0, 30.0)]);
        let points = calculate_pivot_points(&bars);
        // P = 9, range = 6
        assert_relative_eq!(points.pivot[1].unwrap(), 9.0);
        assert_relative_eq!(points.r1[1].unwrap(), 12.0);
        assert_relative_eq!(points.s1[1].unwrap(), 6.0);
        assert_relative_eq!(points.r2[1].unwrap(), 15.0);
        assert_relative_eq!(points.s2[1].unwrap(), 3.0);
        assert_relative_eq!(points.r3[1].unwrap(), 18.0);
        assert_relative_eq!(points.s3[1].unwrap(), 0.0);
    }
}
