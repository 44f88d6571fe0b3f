// =============================================================================
// Indicator Snapshot
// =============================================================================
//
// One asset at one point in time: the candle history plus every indicator
// the bot panel reads. Each indicator is optional; a bot that needs a missing
// field abstains. Snapshots arrive either precomputed (JSON from the data
// provider, camelCase keys) or are derived from candles via `from_candles`.
// =============================================================================

use serde::{Deserialize, Serialize};

use crate::indicators::adx::{calculate_adx, AdxReading};
use crate::indicators::atr::calculate_atr;
use crate::indicators::bollinger::{calculate_bollinger, BollingerBands};
use crate::indicators::ema::{calculate_sma, current_ema};
use crate::indicators::ichimoku::{calculate_ichimoku, IchimokuReading};
use crate::indicators::macd::{standard_macd, MacdReading};
use crate::indicators::oscillators::{
    calculate_cci, calculate_mfi, calculate_stochastic, calculate_williams_r, StochasticReading,
};
use crate::indicators::parabolic_sar::{calculate_sar, SarReading};
use crate::indicators::roc::current_roc;
use crate::indicators::rsi::current_rsi;
use crate::indicators::volume::{calculate_vwap, obv_series, obv_slope};
use crate::market_data::Candle;

/// Look-back used for the OBV slope.
const OBV_SLOPE_LOOKBACK: usize = 10;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct IndicatorSnapshot {
    /// Candle history, oldest first.
    pub candles: Vec<Candle>,
    /// Current price. Falls back to the last close when absent.
    pub price: Option<f64>,

    pub rsi: Option<f64>,
    pub macd: Option<MacdReading>,
    pub ema9: Option<f64>,
    pub ema20: Option<f64>,
    pub ema21: Option<f64>,
    pub ema50: Option<f64>,
    pub ema200: Option<f64>,
    pub sma20: Option<f64>,
    pub sma50: Option<f64>,
    pub bollinger_bands: Option<BollingerBands>,
    pub adx: Option<AdxReading>,
    pub atr: Option<f64>,
    pub stochastic: Option<StochasticReading>,
    pub cci: Option<f64>,
    pub williams_r: Option<f64>,
    pub mfi: Option<f64>,
    pub obv: Option<f64>,
    pub obv_slope: Option<f64>,
    pub vwap: Option<f64>,
    pub ichimoku: Option<IchimokuReading>,
    pub parabolic_sar: Option<SarReading>,
    pub roc: Option<f64>,
}

impl IndicatorSnapshot {
    /// Build a snapshot by computing every indicator from `candles`.
    ///
    /// Indicators that need more history than provided stay `None`.
    pub fn from_candles(candles: Vec<Candle>) -> Self {
        let closes: Vec<f64> = candles.iter().map(|c| c.close).collect();
        let obv = obv_series(&candles);

        Self {
            price: closes.last().copied(),
            rsi: current_rsi(&closes, 14),
            macd: standard_macd(&closes),
            ema9: current_ema(&closes, 9),
            ema20: current_ema(&closes, 20),
            ema21: current_ema(&closes, 21),
            ema50: current_ema(&closes, 50),
            ema200: current_ema(&closes, 200),
            sma20: calculate_sma(&closes, 20),
            sma50: calculate_sma(&closes, 50),
            bollinger_bands: calculate_bollinger(&closes, 20, 2.0),
            adx: calculate_adx(&candles, 14),
            atr: calculate_atr(&candles, 14),
            stochastic: calculate_stochastic(&candles, 14, 3),
            cci: calculate_cci(&candles, 20),
            williams_r: calculate_williams_r(&candles, 14),
            mfi: calculate_mfi(&candles, 14),
            obv: obv.last().copied(),
            obv_slope: obv_slope(&obv, OBV_SLOPE_LOOKBACK),
            vwap: calculate_vwap(&candles),
            ichimoku: calculate_ichimoku(&candles),
            parabolic_sar: calculate_sar(&candles, 0.02, 0.2),
            roc: current_roc(&closes, 14),
            candles,
        }
    }

    /// Current price: the explicit `price` when usable, else the last close.
    pub fn current_price(&self) -> Option<f64> {
        self.price
            .filter(|p| p.is_finite() && *p > 0.0)
            .or_else(|| {
                self.candles
                    .last()
                    .map(|c| c.close)
                    .filter(|p| p.is_finite() && *p > 0.0)
            })
    }

    pub fn closes(&self) -> Vec<f64> {
        self.candles.iter().map(|c| c.close).collect()
    }

    /// ATR as a percentage of the current price.
    pub fn atr_pct(&self) -> Option<f64> {
        let atr = self.atr?;
        let price = self.current_price()?;
        let pct = atr / price * 100.0;
        pct.is_finite().then_some(pct)
    }

    /// The last `n` candles, or `None` if fewer are available.
    pub fn last_candles(&self, n: usize) -> Option<&[Candle]> {
        (n > 0 && self.candles.len() >= n).then(|| &self.candles[self.candles.len() - n..])
    }

    /// Timestamp of the newest candle, if any.
    pub fn as_of(&self) -> Option<i64> {
        self.candles.last().map(|c| c.time).filter(|t| *t > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::indicators::test_candle as candle;

    fn trending(n: usize) -> Vec<Candle> {
        (0..n)
            .map(|i| {
                let b = 100.0 + i as f64 * 0.5;
                candle(b, b + 1.0, b - 1.0, b + 0.3, 100.0 + i as f64)
            })
            .collect()
    }

    #[test]
    fn from_candles_fills_everything_with_enough_history() {
        let snap = IndicatorSnapshot::from_candles(trending(250));
        assert!(snap.rsi.is_some());
        assert!(snap.macd.is_some());
        assert!(snap.ema200.is_some());
        assert!(snap.bollinger_bands.is_some());
        assert!(snap.adx.is_some());
        assert!(snap.atr.is_some());
        assert!(snap.stochastic.is_some());
        assert!(snap.cci.is_some());
        assert!(snap.williams_r.is_some());
        assert!(snap.mfi.is_some());
        assert!(snap.obv_slope.is_some());
        assert!(snap.vwap.is_some());
        assert!(snap.ichimoku.is_some());
        assert!(snap.parabolic_sar.is_some());
        assert!(snap.roc.is_some());
        assert_eq!(snap.current_price(), Some(100.0 + 249.0 * 0.5 + 0.3));
    }

    #[test]
    fn short_history_leaves_long_indicators_empty() {
        let snap = IndicatorSnapshot::from_candles(trending(30));
        assert!(snap.rsi.is_some());
        assert!(snap.ema200.is_none());
        assert!(snap.ichimoku.is_none());
        assert!(snap.macd.is_none());
    }

    #[test]
    fn empty_snapshot_has_no_price() {
        let snap = IndicatorSnapshot::default();
        assert!(snap.current_price().is_none());
        assert!(snap.atr_pct().is_none());
        assert!(snap.as_of().is_none());
    }

    #[test]
    fn invalid_explicit_price_falls_back_to_close() {
        let snap = IndicatorSnapshot {
            price: Some(-1.0),
            candles: trending(3),
            ..IndicatorSnapshot::default()
        };
        assert_eq!(snap.current_price(), Some(101.3));
    }

    #[test]
    fn deserializes_provider_keys() {
        let json = r#"{
            "price": 100.0,
            "rsi": 25.0,
            "macd": {"value": 1.0, "signal": 0.5, "histogram": 0.5},
            "bollingerBands": {"upper": 110.0, "middle": 100.0, "lower": 90.0},
            "williamsR": -85.0,
            "parabolicSar": {"value": 95.0, "trend": "LONG"}
        }"#;
        let snap: IndicatorSnapshot = serde_json::from_str(json).unwrap();
        assert_eq!(snap.rsi, Some(25.0));
        assert_eq!(snap.bollinger_bands.unwrap().middle, 100.0);
        assert_eq!(snap.williams_r, Some(-85.0));
        assert!(snap.candles.is_empty());
        assert!(snap.ema200.is_none());
    }
}
