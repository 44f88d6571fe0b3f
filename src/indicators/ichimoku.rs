// =============================================================================
// Ichimoku Kinko Hyo (9 / 26 / 52)
// =============================================================================
//
//   tenkan   = midpoint of the last 9 highs/lows
//   kijun    = midpoint of the last 26 highs/lows
//   senkou A = (tenkan + kijun) / 2, measured 26 bars ago
//   senkou B = midpoint of 52 highs/lows, measured 26 bars ago
//
// The cloud that sits under the current bar was projected 26 bars earlier,
// so the spans are computed on the slice that ends `displacement` bars back.

use serde::{Deserialize, Serialize};

use crate::market_data::Candle;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IchimokuReading {
    pub tenkan: f64,
    pub kijun: f64,
    pub senkou_a: f64,
    pub senkou_b: f64,
}

impl IchimokuReading {
    pub fn cloud_top(&self) -> f64 {
        self.senkou_a.max(self.senkou_b)
    }

    pub fn cloud_bottom(&self) -> f64 {
        self.senkou_a.min(self.senkou_b)
    }
}

fn midpoint(window: &[Candle]) -> Option<f64> {
    if window.is_empty() {
        return None;
    }
    let high = window.iter().map(|c| c.high).fold(f64::MIN, f64::max);
    let low = window.iter().map(|c| c.low).fold(f64::MAX, f64::min);
    let mid = (high + low) / 2.0;
    mid.is_finite().then_some(mid)
}

fn trailing(candles: &[Candle], n: usize) -> Option<&[Candle]> {
    (candles.len() >= n).then(|| &candles[candles.len() - n..])
}

/// Standard Ichimoku reading. Needs 52 + 26 candles.
pub fn calculate_ichimoku(candles: &[Candle]) -> Option<IchimokuReading> {
    const TENKAN: usize = 9;
    const KIJUN: usize = 26;
    const SENKOU_B: usize = 52;
    const DISPLACEMENT: usize = 26;

    let tenkan = midpoint(trailing(candles, TENKAN)?)?;
    let kijun = midpoint(trailing(candles, KIJUN)?)?;

    let projected = candles.get(..candles.len().checked_sub(DISPLACEMENT)?)?;
    let past_tenkan = midpoint(trailing(projected, TENKAN)?)?;
    let past_kijun = midpoint(trailing(projected, KIJUN)?)?;
    let senkou_b = midpoint(trailing(projected, SENKOU_B)?)?;

    Some(IchimokuReading {
        tenkan,
        kijun,
        senkou_a: (past_tenkan + past_kijun) / 2.0,
        senkou_b,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::indicators::test_candle as candle;

    #[test]
    fn ichimoku_requires_78_candles() {
        let candles = vec![candle(100.0, 101.0, 99.0, 100.0, 1.0); 77];
        assert!(calculate_ichimoku(&candles).is_none());
        let candles = vec![candle(100.0, 101.0, 99.0, 100.0, 1.0); 78];
        let r = calculate_ichimoku(&candles).unwrap();
        assert!((r.tenkan - 100.0).abs() < 1e-10);
        assert!((r.cloud_top() - 100.0).abs() < 1e-10);
    }

    #[test]
    fn uptrend_price_above_cloud() {
        let candles: Vec<_> = (0..100)
            .map(|i| {
                let b = 100.0 + i as f64;
                candle(b, b + 1.0, b - 1.0, b + 0.5, 1.0)
            })
            .collect();
        let r = calculate_ichimoku(&candles).unwrap();
        let price = candles.last().unwrap().close;
        assert!(price > r.cloud_top());
        assert!(r.tenkan > r.kijun);
    }
}
