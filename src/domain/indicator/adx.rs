//! Average Directional Index.
//!
//! up = h[i] - h[i-1], down = l[i-1] - l[i]
//! +DM = up when up > down and up > 0, else 0 (mirrored for -DM)
//! DI = 100 * EMA(DM, n) / ATR(n), undefined when ATR is zero or undefined
//! DX = 100 * |+DI - -DI| / (+DI + -DI), 0 when both DI are zero
//! ADX = EMA(DX, n)

use super::{calculate_atr, calculate_ema, ema_series, Series};
use crate::domain::ohlcv::OhlcvBar;

pub const DEFAULT_PERIOD: usize = 14;

#[derive(Debug, Clone, PartialEq)]
pub struct Adx {
    pub adx: Series,
    pub plus_di: Series,
    pub minus_di: Series,
}

pub fn directional_movement(bars: &[OhlcvBar]) -> (Vec<f64>, Vec<f64>) {
    let mut plus_dm = Vec::with_capacity(bars.len());
    let mut minus_dm = Vec::with_capacity(bars.len());

    for (i, bar) in bars.iter().enumerate() {
        if i == 0 {
            plus_dm.push(0.0);
            minus_dm.push(0.0);
            continue;
        }
        let up = bar.high - bars[i - 1].high;
        let down = bars[i - 1].low - bar.low;
        plus_dm.push(if up > down && up > 0.0 { up } else { 0.0 });
        minus_dm.push(if down > up && down > 0.0 { down } else { 0.0 });
    }

    (plus_dm, minus_dm)
}

pub fn calculate_adx(bars: &[OhlcvBar], period: usize) -> Adx {
    let (plus_dm, minus_dm) = directional_movement(bars);
    let smoothed_plus = calculate_ema(&plus_dm, period);
    let smoothed_minus = calculate_ema(&minus_dm, period);
    let atr = calculate_atr(bars, period);

    let di = |smoothed: &Series| -> Series {
        smoothed
            .iter()
            .zip(&atr)
            .map(|(dm, tr)| match (*dm, *tr) {
                (Some(dm), Some(tr)) if tr != 0.0 => Some(100.0 * dm / tr),
                _ => None,
            })
            .collect()
    };
    let plus_di = di(&smoothed_plus);
    let minus_di = di(&smoothed_minus);

    let dx: Series = plus_di
        .iter()
        .zip(&minus_di)
        .map(|(p, m)| {
            let (p, m) = ((*p)?, (*m)?);
            let sum = p + m;
            if sum == 0.0 {
                Some(0.0)
            } else {
                Some(100.0 * (p - m).abs() / sum)
            }
        })
        .collect();
    let adx = ema_series(&dx, period);

    Adx {
        adx,
        plus_di,
        minus_di,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::indicator::test_support::hlc_bars;
    use approx::assert_relative_eq;

    #[test]
    fn directional_movement_tie_break() {
        let bars = hlc_bars(&[
            (10.0, 8.0, 9.0),
            (12.0, 7.0, 11.0), // up 2, down 1 → +DM 2
            (13.0, 5.0, 6.0),  // up 1, down 2 → -DM 2
            (14.0, 4.0, 9.0),  // up 1, down 1 → neither
        ]);
        let (plus, minus) = directional_movement(&bars);
        assert_eq!(plus, vec![0.0, 2.0, 0.0, 0.0]);
        assert_eq!(minus, vec![0.0, 0.0, 2.0, 0.0]);
    }

    #[test]
    fn adx_zero_range_is_undefined() {
        let bars = hlc_bars(&[(10.0, 10.0, 10.0); 6]);
        let result = calculate_adx(&bars, 3);
        assert!(result.plus_di.iter().all(Option::is_none));
        assert!(result.adx.iter().all(Option::is_none));
    }

    #[test]
    fn adx_steady_uptrend_is_strong() {
        let rows: Vec<(f64, f64, f64)> = (0..40)
            .map(|i| {
                let base = 100.0 + 2.0 * i as f64;
                (base + 1.0, base - 1.0, base)
            })
            .collect();
        let result = calculate_adx(&hlc_bars(&rows), 14);
        let last = rows.len() - 1;
        assert!(result.plus_di[last].unwrap() > result.minus_di[last].unwrap());
        assert_relative_eq!(result.minus_di[last].unwrap(), 0.0);
        assert!(result.adx[last].unwrap() > 90.0);
    }

    #[test]
    fn adx_lengths_match_input() {
        let bars = hlc_bars(&[(11.0, 9.0, 10.0), (12.0, 10.0, 11.0), (12.5, 9.5, 10.0)]);
        let result = calculate_adx(&bars, 2);
        assert_eq!(result.adx.len(), 3);
        assert_eq!(result.plus_di.len(), 3);
        assert_eq!(result.minus_di.len(), 3);
    }
}
