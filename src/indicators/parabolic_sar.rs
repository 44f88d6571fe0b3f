// =============================================================================
// Parabolic SAR (Wilder) - step 0.02, max 0.20
// =============================================================================

use serde::{Deserialize, Serialize};

use crate::market_data::Candle;
use crate::types::Direction;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SarReading {
    pub value: f64,
    /// LONG while the SAR trails below price, SHORT while it sits above.
    pub trend: Direction,
}

/// Latest Parabolic SAR. Needs at least 3 candles.
pub fn calculate_sar(candles: &[Candle], step: f64, max_af: f64) -> Option<SarReading> {
    if candles.len() < 3 || step <= 0.0 || max_af < step {
        return None;
    }

    let mut trend = if candles[1].close >= candles[0].close {
        Direction::Long
    } else {
        Direction::Short
    };
    let (mut sar, mut ep) = match trend {
        Direction::Long => (candles[0].low, candles[1].high),
        Direction::Short => (candles[0].high, candles[1].low),
    };
    let mut af = step;

    for i in 2..candles.len() {
        let cur = &candles[i];
        let (p1, p2) = (&candles[i - 1], &candles[i - 2]);
        sar += af * (ep - sar);

        match trend {
            Direction::Long => {
                sar = sar.min(p1.low).min(p2.low);
                if cur.low < sar {
                    trend = Direction::Short;
                    sar = ep;
                    ep = cur.low;
                    af = step;
                } else if cur.high > ep {
                    ep = cur.high;
                    af = (af + step).min(max_af);
                }
            }
            Direction::Short => {
                sar = sar.max(p1.high).max(p2.high);
                if cur.high > sar {
                    trend = Direction::Long;
                    sar = ep;
                    ep = cur.high;
                    af = step;
                } else if cur.low < ep {
                    ep = cur.low;
                    af = (af + step).min(max_af);
                }
            }
        }
    }

    sar.is_finite().then_some(SarReading { value: sar, trend })
}
