// =============================================================================
// Technical Indicators Module
// =============================================================================
//
// Pure, side-effect-free implementations of the indicators that feed the
// indicator snapshot. Every public function returns `Option<T>` (or an empty
// `Vec`) so callers must handle insufficient data and numerical edge cases.

pub mod adx;
pub mod atr;
pub mod bollinger;
pub mod ema;
pub mod ichimoku;
pub mod macd;
pub mod oscillators;
pub mod parabolic_sar;
pub mod roc;
pub mod rsi;
pub mod structure;
pub mod volume;

#[cfg(test)]
pub(crate) fn test_candle(
    open: f64,
    high: f64,
    low: f64,
    close: f64,
    volume: f64,
) -> crate::market_data::Candle {
    crate::market_data::Candle {
        time: 0,
        open,
        high,
        low,
        close,
        volume,
    }
}
