// =============================================================================
// Average True Range (ATR) - Wilder's Smoothing Method
// =============================================================================
//
//   TR    = max(H - L, |H - prevClose|, |L - prevClose|)
//   ATR_0 = SMA of the first `period` TR values
//   ATR_t = (ATR_{t-1} * (period - 1) + TR_t) / period
// =============================================================================

use crate::market_data::Candle;

/// True range of every bar after the first.
pub fn true_ranges(candles: &[Candle]) -> Vec<f64> {
    candles
        .windows(2)
        .map(|w| {
            let (prev, cur) = (&w[0], &w[1]);
            (cur.high - cur.low)
                .max((cur.high - prev.close).abs())
                .max((cur.low - prev.close).abs())
        })
        .collect()
}

/// Most recent ATR value. Needs `period + 1` candles.
pub fn calculate_atr(candles: &[Candle], period: usize) -> Option<f64> {
    if period == 0 || candles.len() < period + 1 {
        return None;
    }

    let trs = true_ranges(candles);
    let period_f = period as f64;

    let mut atr = trs[..period].iter().sum::<f64>() / period_f;
    for &tr in &trs[period..] {
        atr = (atr * (period_f - 1.0) + tr) / period_f;
    }

    atr.is_finite().then_some(atr)
}

/// ATR expressed as a percentage of the last close.
pub fn calculate_atr_pct(candles: &[Candle], period: usize) -> Option<f64> {
    let atr = calculate_atr(candles, period)?;
    let last_close = candles.last()?.close;
    if last_close == 0.0 {
        return None;
    }
    Some(atr / last_close * 100.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::indicators::test_candle;

    fn candle(open: f64, high: f64, low: f64, close: f64) -> Candle {
        test_candle(open, high, low, close, 100.0)
    }

    #[test]
    fn atr_insufficient_data() {
        let candles = vec![candle(100.0, 105.0, 95.0, 102.0); 10];
        assert!(calculate_atr(&candles, 14).is_none());
        assert!(calculate_atr(&candles, 0).is_none());
    }

    #[test]
    fn atr_constant_range_converges() {
        let candles: Vec<Candle> = (0..30)
            .map(|i| {
                let base = 100.0 + i as f64 * 0.1;
                candle(base, base + 5.0, base - 5.0, base)
            })
            .collect();
        let atr = calculate_atr(&candles, 14).unwrap();
        assert!((atr - 10.0).abs() < 1.0, "expected ATR near 10.0, got {atr}");
    }

    #[test]
    fn atr_counts_gaps() {
        let candles = vec![
            candle(100.0, 105.0, 95.0, 95.0),
            candle(110.0, 115.0, 108.0, 112.0),
            candle(112.0, 118.0, 110.0, 115.0),
            candle(115.0, 120.0, 113.0, 118.0),
        ];
        assert!((true_ranges(&candles)[0] - 20.0).abs() < 1e-10);
        assert!(calculate_atr(&candles, 3).unwrap() > 7.0);
    }

    #[test]
    fn atr_nan_returns_none() {
        let candles = vec![
            candle(100.0, 105.0, 95.0, 100.0),
            candle(100.0, f64::NAN, 95.0, 100.0),
            candle(100.0, 105.0, 95.0, 100.0),
            candle(100.0, 105.0, 95.0, 100.0),
        ];
        assert!(calculate_atr(&candles, 3).is_none());
    }

    #[test]
    fn atr_pct_is_relative_to_last_close() {
        let candles: Vec<Candle> = (0..30)
            .map(|_| candle(100.0, 101.0, 99.0, 100.0))
            .collect();
        let pct = calculate_atr_pct(&candles, 14).unwrap();
        assert!((pct - 2.0).abs() < 1e-9);
    }
}
