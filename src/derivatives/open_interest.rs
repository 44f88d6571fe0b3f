// =============================================================================
// Open Interest - participation signal
// =============================================================================
//
// OI change is read together with the price change over the same window:
//
//   OI up,   price up   => +0.6  new longs, trend confirmed
//   OI up,   price down => -0.6  new shorts, trend confirmed
//   OI down, price up   => +0.2  short covering, weak rally
//   OI down, price down => -0.2  long liquidation, weak selloff
//   |OI change| < 1%    =>  0.0
//
// An OI drop beyond 10% flags a liquidation cascade.

use serde::{Deserialize, Serialize};

/// OI moves smaller than this (percent) are treated as noise.
const OI_NOISE_PCT: f64 = 1.0;
/// OI drop (percent) that marks a liquidation cascade.
const CASCADE_DROP_PCT: f64 = -10.0;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OIState {
    pub oi_change_pct: f64,
    pub price_change_pct: f64,
    pub signal: f64,
    pub liquidation_cascade: bool,
}

pub fn interpret_open_interest(oi_change_pct: f64, price_change_pct: f64) -> Option<OIState> {
    if !oi_change_pct.is_finite() || !price_change_pct.is_finite() {
        return None;
    }

    let signal = if oi_change_pct.abs() < OI_NOISE_PCT || price_change_pct == 0.0 {
        0.0
    } else {
        let strength = if oi_change_pct > 0.0 { 0.6 } else { 0.2 };
        strength * price_change_pct.signum()
    };

    Some(OIState {
        oi_change_pct,
        price_change_pct,
        signal,
        liquidation_cascade: oi_change_pct < CASCADE_DROP_PCT,
    })
}
