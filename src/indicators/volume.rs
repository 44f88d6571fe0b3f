// =============================================================================
// Volume Indicators - OBV, VWAP, relative volume
// =============================================================================

use crate::market_data::Candle;

/// On-Balance Volume series, one value per candle (first value is 0).
pub fn obv_series(candles: &[Candle]) -> Vec<f64> {
    let mut out = Vec::with_capacity(candles.len());
    let mut obv = 0.0;
    for (i, c) in candles.iter().enumerate() {
        if i > 0 {
            let prev = candles[i - 1].close;
            if c.close > prev {
                obv += c.volume;
            } else if c.close < prev {
                obv -= c.volume;
            }
        }
        out.push(obv);
    }
    out
}

/// Average OBV change per bar over the last `lookback` bars.
pub fn obv_slope(obv: &[f64], lookback: usize) -> Option<f64> {
    if lookback == 0 || obv.len() <= lookback {
        return None;
    }
    let last = *obv.last()?;
    let earlier = obv[obv.len() - 1 - lookback];
    let slope = (last - earlier) / lookback as f64;
    slope.is_finite().then_some(slope)
}

/// Volume-weighted average price over the whole candle slice.
pub fn calculate_vwap(candles: &[Candle]) -> Option<f64> {
    let (pv, vol) = candles.iter().fold((0.0, 0.0), |(pv, vol), c| {
        let tp = (c.high + c.low + c.close) / 3.0;
        (pv + tp * c.volume, vol + c.volume)
    });
    if vol <= 0.0 {
        return None;
    }
    let vwap = pv / vol;
    vwap.is_finite().then_some(vwap)
}

/// Last candle's volume divided by the mean volume of the `lookback` candles
/// before it.
pub fn relative_volume(candles: &[Candle], lookback: usize) -> Option<f64> {
    if lookback == 0 || candles.len() < lookback + 1 {
        return None;
    }
    let last = candles.last()?.volume;
    let prior = &candles[candles.len() - 1 - lookback..candles.len() - 1];
    let avg = prior.iter().map(|c| c.volume).sum::<f64>() / lookback as f64;
    if avg <= 0.0 {
        return None;
    }
    Some(last / avg)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::indicators::test_candle as candle;

    #[test]
    fn obv_accumulates_by_close_direction() {
        let candles = vec![
            candle(10.0, 11.0, 9.0, 10.0, 100.0),
            candle(10.0, 12.0, 9.5, 11.0, 50.0),
            candle(11.0, 11.5, 9.0, 9.5, 30.0),
            candle(9.5, 10.0, 9.0, 9.5, 70.0),
        ];
        assert_eq!(obv_series(&candles), vec![0.0, 50.0, 20.0, 20.0]);
        assert_eq!(obv_slope(&[0.0, 50.0, 20.0, 20.0], 2), Some(-15.0));
        assert!(obv_slope(&[0.0, 1.0], 5).is_none());
    }

    #[test]
    fn vwap_weights_by_volume() {
        let candles = vec![
            candle(10.0, 10.0, 10.0, 10.0, 1.0),
            candle(20.0, 20.0, 20.0, 20.0, 3.0),
        ];
        assert!((calculate_vwap(&candles).unwrap() - 17.5).abs() < 1e-10);
        assert!(calculate_vwap(&[]).is_none());
    }

    #[test]
    fn relative_volume_spike() {
        let mut candles = vec![candle(10.0, 11.0, 9.0, 10.0, 100.0); 20];
        candles.push(candle(10.0, 12.0, 9.0, 11.5, 300.0));
        assert!((relative_volume(&candles, 20).unwrap() - 3.0).abs() < 1e-10);
    }
}
