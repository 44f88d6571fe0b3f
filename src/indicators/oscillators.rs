// =============================================================================
// Bounded Oscillators - Stochastic, Williams %R, CCI, MFI
// =============================================================================
//
// Stochastic %K = (close - lowest_low) / (highest_high - lowest_low) * 100
//            %D = SMA(3) of %K
// Williams %R   = (highest_high - close) / (highest_high - lowest_low) * -100
// CCI           = (TP - SMA(TP)) / (0.015 * mean_deviation), TP = (H+L+C)/3
// MFI           = 100 - 100 / (1 + positive_flow / negative_flow)
//
// All functions operate on the trailing window and return the latest value.
// =============================================================================

use serde::{Deserialize, Serialize};

use crate::market_data::Candle;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StochasticReading {
    pub k: f64,
    pub d: f64,
}

fn raw_k(window: &[Candle]) -> Option<f64> {
    let high = window.iter().map(|c| c.high).fold(f64::MIN, f64::max);
    let low = window.iter().map(|c| c.low).fold(f64::MAX, f64::min);
    let close = window.last()?.close;
    let range = high - low;
    if range <= 0.0 {
        return Some(50.0);
    }
    let k = (close - low) / range * 100.0;
    k.is_finite().then_some(k)
}

/// Stochastic oscillator. Needs `period + smoothing - 1` candles.
pub fn calculate_stochastic(
    candles: &[Candle],
    period: usize,
    smoothing: usize,
) -> Option<StochasticReading> {
    if period == 0 || smoothing == 0 || candles.len() < period + smoothing - 1 {
        return None;
    }

    let ks: Vec<f64> = candles
        .windows(period)
        .rev()
        .take(smoothing)
        .map(raw_k)
        .collect::<Option<Vec<_>>>()?;

    let k = ks[0];
    let d = ks.iter().sum::<f64>() / ks.len() as f64;
    Some(StochasticReading { k, d })
}

/// Williams %R in [-100, 0].
pub fn calculate_williams_r(candles: &[Candle], period: usize) -> Option<f64> {
    if period == 0 || candles.len() < period {
        return None;
    }
    let window = &candles[candles.len() - period..];
    raw_k(window).map(|k| k - 100.0)
}

/// Commodity Channel Index.
pub fn calculate_cci(candles: &[Candle], period: usize) -> Option<f64> {
    if period == 0 || candles.len() < period {
        return None;
    }
    let typical: Vec<f64> = candles[candles.len() - period..]
        .iter()
        .map(|c| (c.high + c.low + c.close) / 3.0)
        .collect();
    let mean = typical.iter().sum::<f64>() / period as f64;
    let mean_dev = typical.iter().map(|tp| (tp - mean).abs()).sum::<f64>() / period as f64;
    if mean_dev == 0.0 {
        return Some(0.0);
    }
    let cci = (typical.last()? - mean) / (0.015 * mean_dev);
    cci.is_finite().then_some(cci)
}

/// Money Flow Index in [0, 100]. Needs `period + 1` candles.
pub fn calculate_mfi(candles: &[Candle], period: usize) -> Option<f64> {
    if period == 0 || candles.len() < period + 1 {
        return None;
    }

    let tail = &candles[candles.len() - period - 1..];
    let (mut positive, mut negative) = (0.0, 0.0);
    for w in tail.windows(2) {
        let prev_tp = (w[0].high + w[0].low + w[0].close) / 3.0;
        let tp = (w[1].high + w[1].low + w[1].close) / 3.0;
        let flow = tp * w[1].volume;
        if tp > prev_tp {
            positive += flow;
        } else if tp < prev_tp {
            negative += flow;
        }
    }

    let mfi = if negative == 0.0 && positive == 0.0 {
        50.0
    } else if negative == 0.0 {
        100.0
    } else {
        100.0 - 100.0 / (1.0 + positive / negative)
    };
    mfi.is_finite().then_some(mfi)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::indicators::test_candle as candle;

    fn rising(n: usize) -> Vec<Candle> {
        (0..n)
            .map(|i| {
                let b = 100.0 + i as f64;
                candle(b, b + 1.0, b - 1.0, b + 0.8, 10.0)
            })
            .collect()
    }

    #[test]
    fn stochastic_near_top_in_uptrend() {
        let s = calculate_stochastic(&rising(30), 14, 3).unwrap();
        assert!(s.k > 80.0, "k = {}", s.k);
        assert!((0.0..=100.0).contains(&s.d));
    }

    #[test]
    fn stochastic_insufficient() {
        assert!(calculate_stochastic(&rising(10), 14, 3).is_none());
    }

    #[test]
    fn williams_mirrors_stochastic() {
        let candles = rising(20);
        let w = calculate_williams_r(&candles, 14).unwrap();
        assert!((-100.0..=0.0).contains(&w));
        assert!(w > -20.0);
    }

    #[test]
    fn cci_flat_is_zero_and_trend_is_positive() {
        let flat = vec![candle(100.0, 101.0, 99.0, 100.0, 1.0); 25];
        assert_eq!(calculate_cci(&flat, 20), Some(0.0));
        assert!(calculate_cci(&rising(25), 20).unwrap() > 100.0);
    }

    #[test]
    fn mfi_all_inflow_is_100() {
        assert_eq!(calculate_mfi(&rising(20), 14), Some(100.0));
        let flat = vec![candle(100.0, 101.0, 99.0, 100.0, 1.0); 20];
        assert_eq!(calculate_mfi(&flat, 14), Some(50.0));
    }
}
