// =============================================================================
// Long/Short Ratio - crowd positioning contrarian signal
// =============================================================================
//
//   long% > 70%  =>  signal = -0.9  (crowded long, fade)
//   long% > 65%  =>  signal = -0.5
//   short% > 70% =>  signal = +0.9  (crowded short, fade)
//   short% > 65% =>  signal = +0.5
//   long% > 55%  =>  signal = -0.2
//   short% > 55% =>  signal = +0.2
//   otherwise    =>  signal =  0.0

use serde::{Deserialize, Serialize};

use super::Bias;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LSState {
    pub long_pct: f64,
    pub short_pct: f64,
    /// Accounts long divided by accounts short.
    pub ratio: f64,
    pub signal: f64,
    pub bias: Bias,
}

/// Interpret a long/short account ratio. `None` for non-positive or
/// non-finite ratios.
pub fn interpret_long_short(ratio: f64) -> Option<LSState> {
    if !ratio.is_finite() || ratio <= 0.0 {
        return None;
    }

    let long_pct = ratio / (1.0 + ratio) * 100.0;
    let short_pct = 100.0 - long_pct;

    let (signal, bias) = if long_pct > 70.0 {
        (-0.9, Bias::Bearish)
    } else if long_pct > 65.0 {
        (-0.5, Bias::Bearish)
    } else if short_pct > 70.0 {
        (0.9, Bias::Bullish)
    } else if short_pct > 65.0 {
        (0.5, Bias::Bullish)
    } else if long_pct > 55.0 {
        (-0.2, Bias::Neutral)
    } else if short_pct > 55.0 {
        (0.2, Bias::Neutral)
    } else {
        (0.0, Bias::Neutral)
    };

    Some(LSState {
        long_pct,
        short_pct,
        ratio,
        signal,
        bias,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn crowded_long_is_faded() {
        // 3.0 => 75% long
        let s = interpret_long_short(3.0).unwrap();
        assert!((s.long_pct - 75.0).abs() < 1e-10);
        assert_eq!(s.signal, -0.9);
        assert_eq!(s.bias, Bias::Bearish);
    }

    #[test]
    fn crowded_short_is_faded() {
        // 0.5 => 33.3% long / 66.7% short
        let s = interpret_long_short(0.5).unwrap();
        assert_eq!(s.signal, 0.5);
    }

    #[test]
    fn balanced_and_invalid() {
        assert_eq!(interpret_long_short(1.0).unwrap().signal, 0.0);
        assert!(interpret_long_short(0.0).is_none());
        assert!(interpret_long_short(f64::NAN).is_none());
    }
}
