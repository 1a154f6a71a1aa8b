//! Volume Weighted Average Price.
//!
//! Cumulative typical_price * volume / cumulative volume, restarted whenever
//! the bar's local calendar date differs from the previous bar's. Undefined
//! while the session has seen no volume.

use super::Series;
use crate::domain::ohlcv::OhlcvBar;

pub fn calculate_vwap(bars: &[OhlcvBar]) -> Series {
    let mut out = Vec::with_capacity(bars.len());
    let mut session = None;
    let mut cum_pv = 0.0;
    let mut cum_volume = 0.0;

    for bar in bars {
        let date = bar.date();
        if session != Some(date) {
            session = Some(date);
            cum_pv = 0.0;
            cum_volume = 0.0;
        }

        cum_pv += bar.typical_price() * bar.volume;
        cum_volume += bar.volume;

        out.push(if cum_volume > 0.0 {
            Some(cum_pv / cum_volume)
        } else {
            None
        });
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use chrono::NaiveDate;

    fn bar(day: u32, hour: u32, price: f64, volume: f64) -> OhlcvBar {
        OhlcvBar {
            timestamp: NaiveDate::from_ymd_opt(2024, 3, day)
                .unwrap()
                .and_hms_opt(hour, 0, 0)
                .unwrap(),
            open: price,
            high: price,
            low: price,
            close: price,
            volume,
        }
    }

    #[test]
    fn vwap_accumulates_within_day() {
        let bars = vec![bar(4, 10, 100.0, 100.0), bar(4, 11, 110.0, 300.0)];
        let series = calculate_vwap(&bars);
        assert_relative_eq!(series[0].unwrap(), 100.0);
        assert_relative_eq!(series[1].unwrap(), (100.0 * 100.0 + 110.0 * 300.0) / 400.0);
    }

    #[test]
    fn vwap_resets_on_new_calendar_day() {
        let bars = vec![
            bar(4, 15, 100.0, 100.0),
            bar(4, 23, 120.0, 100.0),
            bar(5, 0, 90.0, 50.0),
        ];
        let series = calculate_vwap(&bars);
        assert_relative_eq!(series[1].unwrap(), 110.0);
        // one hour later, but a different date
        assert_relative_eq!(series[2].unwrap(), 90.0);
    }

    #[test]
    fn vwap_undefined_without_volume() {
        let bars = vec![bar(4, 10, 100.0, 0.0), bar(4, 11, 104.0, 10.0)];
        let series = calculate_vwap(&bars);
        assert_eq!(series[0], None);
        assert_relative_eq!(series[1].unwrap(), 104.0);
    }
}
