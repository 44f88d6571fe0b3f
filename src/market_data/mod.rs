// =============================================================================
// Market Data - per-asset inputs handed to the consensus pipeline
// =============================================================================
//
// Everything in here is an immutable value object built once per evaluation
// cycle. Fetching is somebody else's job; this module only describes the
// shape of what arrives and derives the indicator fields from raw candles.

pub mod options;
pub mod snapshot;

use serde::{Deserialize, Serialize};

pub use options::OptionsSnapshot;
pub use snapshot::IndicatorSnapshot;

/// Milliseconds in one day; used to cut the trailing 24h window.
const DAY_MS: i64 = 86_400_000;

/// A single OHLCV candle.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Candle {
    /// Open time in epoch milliseconds (0 when unknown).
    #[serde(default)]
    pub time: i64,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    #[serde(default)]
    pub volume: f64,
}

/// Ticker-level state of the coin being evaluated.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CoinState {
    pub symbol: String,
    #[serde(default)]
    pub price: Option<f64>,
    #[serde(default)]
    pub change_24h_pct: Option<f64>,
    #[serde(default)]
    pub high_24h: Option<f64>,
    #[serde(default)]
    pub low_24h: Option<f64>,
    #[serde(default)]
    pub volume_24h: Option<f64>,
}

impl CoinState {
    /// Derive the ticker view from an indicator snapshot.
    ///
    /// The 24h figures need timestamped candles; without them only the price
    /// is filled in.
    pub fn from_snapshot(symbol: impl Into<String>, snapshot: &IndicatorSnapshot) -> Self {
        let mut coin = Self {
            symbol: symbol.into(),
            price: snapshot.current_price(),
            ..Self::default()
        };

        let Some(last) = snapshot.candles.last() else {
            return coin;
        };
        if last.time <= 0 {
            return coin;
        }

        let cutoff = last.time - DAY_MS;
        let window: Vec<&Candle> = snapshot
            .candles
            .iter()
            .filter(|c| c.time > cutoff)
            .collect();
        let Some(first) = window.first() else {
            return coin;
        };

        coin.high_24h = Some(window.iter().map(|c| c.high).fold(f64::MIN, f64::max));
        coin.low_24h = Some(window.iter().map(|c| c.low).fold(f64::MAX, f64::min));
        coin.volume_24h = Some(window.iter().map(|c| c.volume).sum());
        if first.open > 0.0 {
            coin.change_24h_pct = Some((last.close - first.open) / first.open * 100.0);
        }
        coin
    }
}
