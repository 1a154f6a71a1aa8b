//! Dispatch from an [`IndicatorType`] to named output columns.

use crate::domain::indicator::{self, IndicatorType, Series};
use crate::domain::ohlcv::{closes, volumes, OhlcvBar};

/// Named output columns of one indicator computation, in display order.
pub type IndicatorColumns = Vec<(String, Series)>;

pub fn compute_indicator(bars: &[OhlcvBar], indicator_type: &IndicatorType) -> IndicatorColumns {
    let close = closes(bars);
    let single = |series: Series| vec![("value".to_string(), series)];

    match *indicator_type {
        IndicatorType::Sma(period) => single(indicator::calculate_sma(&close, period)),
        IndicatorType::Ema(period) => single(indicator::calculate_ema(&close, period)),
        IndicatorType::Wma(period) => single(indicator::calculate_wma(&close, period)),
        IndicatorType::Rsi(period) => single(indicator::calculate_rsi(&close, period)),
        IndicatorType::Roc(period) => single(indicator::calculate_roc(&close, period)),
        IndicatorType::Momentum(period) => single(indicator::calculate_momentum(&close, period)),
        IndicatorType::Atr(period) => single(indicator::calculate_atr(bars, period)),
        IndicatorType::Stddev(period) => single(indicator::calculate_stddev(&close, period)),
        IndicatorType::Vwap => single(indicator::calculate_vwap(bars)),
        IndicatorType::Correlation(period) => single(indicator::calculate_correlation(
            &close,
            &volumes(bars),
            period,
        )),
        IndicatorType::Adx(period) => {
            let adx = indicator::calculate_adx(bars, period);
            vec![
                ("adx".into(), adx.adx),
                ("plus_di".into(), adx.plus_di),
                ("minus_di".into(), adx.minus_di),
            ]
        }
        IndicatorType::Obv => {
            let obv = indicator::calculate_obv(bars);
            vec![("obv".into(), obv.obv), ("obv_ema".into(), obv.obv_ema)]
        }
        IndicatorType::Ichimoku => {
            let ich = indicator::calculate_ichimoku(bars);
            vec![
                ("tenkan".into(), ich.tenkan),
                ("kijun".into(), ich.kijun),
                ("senkou_a".into(), ich.senkou_a),
                ("senkou_b".into(), ich.senkou_b),
                ("chikou".into(), ich.chikou),
            ]
        }
        IndicatorType::Pivot => {
            let p = indicator::calculate_pivot_points(bars);
            vec![
                ("pivot".into(), p.pivot),
                ("r1".into(), p.r1),
                ("r2".into(), p.r2),
                ("r3".into(), p.r3),
                ("s1".into(), p.s1),
                ("s2".into(), p.s2),
                ("s3".into(), p.s3),
            ]
        }
        IndicatorType::Macd { fast, slow, signal } => {
            let m = indicator::calculate_macd(&close, fast, slow, signal);
            let cross = indicator::crossover(&m.macd, &m.signal)
                .into_iter()
                .map(|c| Some(f64::from(c)))
                .collect();
            vec![
                ("macd".into(), m.macd),
                ("signal".into(), m.signal),
                ("histogram".into(), m.histogram),
                ("cross".into(), cross),
            ]
        }
        IndicatorType::Stochastic { k_period, d_period } => {
            let s = indicator::calculate_stochastic(bars, k_period, d_period);
            vec![("k".into(), s.k), ("d".into(), s.d)]
        }
        IndicatorType::Bollinger {
            period,
            stddev_mult_x100,
        } => {
            let b = indicator::calculate_bollinger(&close, period, stddev_mult_x100 as f64 / 100.0);
            vec![
                ("upper".into(), b.upper),
                ("middle".into(), b.middle),
                ("lower".into(), b.lower),
                ("percent_b".into(), b.percent_b),
                ("bandwidth".into(), b.bandwidth),
            ]
        }
    }
}
