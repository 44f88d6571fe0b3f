// =============================================================================
// Price Structure - higher highs / higher lows vs lower highs / lower lows
// =============================================================================

use serde::{Deserialize, Serialize};

use crate::market_data::Candle;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StructureCounts {
    pub higher_highs: usize,
    pub higher_lows: usize,
    pub lower_highs: usize,
    pub lower_lows: usize,
    /// Number of bar-to-bar comparisons made.
    pub comparisons: usize,
}

impl StructureCounts {
    /// Net structure in [-1, 1]: +1 when every bar made a higher high and a
    /// higher low, -1 when every bar made a lower high and a lower low.
    pub fn bias(&self) -> f64 {
        if self.comparisons == 0 {
            return 0.0;
        }
        let up = (self.higher_highs + self.higher_lows) as f64;
        let down = (self.lower_highs + self.lower_lows) as f64;
        ((up - down) / (2 * self.comparisons) as f64).clamp(-1.0, 1.0)
    }
}

/// Count structure over the last `lookback` candles. `None` with fewer than
/// two candles in the window.
pub fn price_structure(candles: &[Candle], lookback: usize) -> Option<StructureCounts> {
    let n = lookback.min(candles.len());
    if n < 2 {
        return None;
    }

    let window = &candles[candles.len() - n..];
    let mut counts = StructureCounts::default();
    for w in window.windows(2) {
        let (prev, cur) = (&w[0], &w[1]);
        if cur.high > prev.high {
            counts.higher_highs += 1;
        } else if cur.high < prev.high {
            counts.lower_highs += 1;
        }
        if cur.low > prev.low {
            counts.higher_lows += 1;
        } else if cur.low < prev.low {
            counts.lower_lows += 1;
        }
        counts.comparisons += 1;
    }
    Some(counts)
}
