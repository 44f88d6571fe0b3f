// =============================================================================
// Funding Rate - contrarian signal from perpetual futures funding
// =============================================================================
//
//   rate > +0.05%  =>  signal = -0.8  (overleveraged longs, expect dump)
//   rate > +0.03%  =>  signal = -0.4  (moderate long bias)
//   rate < -0.05%  =>  signal = +0.9  (extreme short squeeze setup)
//   rate < -0.03%  =>  signal = +0.5  (shorts paying, mild bullish)
//   |rate| > 0.01% =>  small lean (-0.1 / +0.2)
//   otherwise      =>  signal =  0.0

use serde::{Deserialize, Serialize};

use super::Bias;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FundingState {
    /// Raw funding rate as a decimal (0.0001 = 0.01%).
    pub rate: f64,
    pub rate_pct: f64,
    /// Contrarian signal in [-1.0, +1.0].
    pub signal: f64,
    pub bias: Bias,
    pub interpretation: &'static str,
}

impl FundingState {
    /// True for the two outer bands on either side.
    pub fn is_extreme(&self) -> bool {
        self.rate_pct.abs() > 0.03
    }
}

/// Interpret a funding rate given as a decimal fraction.
pub fn interpret_funding(rate: f64) -> FundingState {
    let rate_pct = rate * 100.0;

    let (signal, bias, interpretation) = if rate_pct > 0.05 {
        (-0.8, Bias::Bearish, "Extreme positive funding - overleveraged longs, contrarian short")
    } else if rate_pct > 0.03 {
        (-0.4, Bias::Bearish, "Elevated positive funding - moderate contrarian short")
    } else if rate_pct < -0.05 {
        (0.9, Bias::Bullish, "Extreme negative funding - short squeeze likely, contrarian long")
    } else if rate_pct < -0.03 {
        (0.5, Bias::Bullish, "Elevated negative funding - shorts paying, contrarian long")
    } else if rate_pct > 0.01 {
        (-0.1, Bias::Neutral, "Slightly positive funding - normal conditions")
    } else if rate_pct < -0.01 {
        (0.2, Bias::Neutral, "Slightly negative funding - mild bullish lean")
    } else {
        (0.0, Bias::Neutral, "Neutral funding rate - no signal")
    };

    FundingState {
        rate,
        rate_pct,
        signal,
        bias,
        interpretation,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn funding_bands() {
        assert_eq!(interpret_funding(0.0006).signal, -0.8);
        assert_eq!(interpret_funding(0.0004).signal, -0.4);
        assert_eq!(interpret_funding(-0.0006).signal, 0.9);
        assert_eq!(interpret_funding(-0.0004).signal, 0.5);
        assert_eq!(interpret_funding(0.0002).bias, Bias::Neutral);
        assert_eq!(interpret_funding(0.0).signal, 0.0);
    }

    #[test]
    fn extreme_flag() {
        assert!(interpret_funding(0.0004).is_extreme());
        assert!(!interpret_funding(0.0002).is_extreme());
    }
}
