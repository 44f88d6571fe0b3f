// =============================================================================
// Derivatives Module
// =============================================================================
//
// Interprets the per-asset derivatives bundle into directional signals:
//
//   1. Funding Rate     - contrarian signal (extreme funding predicts reversal)
//   2. Open Interest    - participation signal (OI vs price quadrants)
//   3. Long/Short Ratio - crowd positioning (contrarian fade at extremes)
//
// Each interpreter produces a signal in [-1.0, +1.0]. The composite is the
// equal-weighted average of whichever sub-signals had data.

pub mod funding_rate;
pub mod long_short_ratio;
pub mod open_interest;

pub use funding_rate::{interpret_funding, FundingState};
pub use long_short_ratio::{interpret_long_short, LSState};
pub use open_interest::{interpret_open_interest, OIState};

use serde::{Deserialize, Serialize};

/// Directional bias label.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Bias {
    Bullish,
    Bearish,
    Neutral,
}

impl Bias {
    fn from_signal(signal: f64) -> Self {
        if signal > 0.2 {
            Self::Bullish
        } else if signal < -0.2 {
            Self::Bearish
        } else {
            Self::Neutral
        }
    }
}

/// Raw derivatives figures for one asset. Every field is optional.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct DerivativesSnapshot {
    /// Funding rate as a decimal fraction (0.0001 = 0.01%).
    pub funding_rate: Option<f64>,
    /// Open interest in contracts.
    pub open_interest: Option<f64>,
    /// Open interest change over the last 24h, in percent.
    pub open_interest_change_pct: Option<f64>,
    /// Accounts long divided by accounts short.
    pub long_short_ratio: Option<f64>,
    /// Net coins moved onto exchanges over 24h (positive = inflow).
    pub exchange_netflow: Option<f64>,
    /// Share of exchange inflow coming from the top-10 addresses, 0-1.
    pub whale_ratio: Option<f64>,
}

/// Interpreted view of a [`DerivativesSnapshot`].
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DerivativesView {
    pub funding: Option<FundingState>,
    pub long_short: Option<LSState>,
    pub open_interest: Option<OIState>,
    pub composite_signal: f64,
    pub composite_bias: Bias,
}

impl DerivativesSnapshot {
    pub fn funding(&self) -> Option<FundingState> {
        self.funding_rate
            .filter(|r| r.is_finite())
            .map(interpret_funding)
    }

    pub fn long_short(&self) -> Option<LSState> {
        self.long_short_ratio.and_then(interpret_long_short)
    }

    /// OI reading needs the price change over the same window.
    pub fn open_interest(&self, price_change_pct: Option<f64>) -> Option<OIState> {
        interpret_open_interest(self.open_interest_change_pct?, price_change_pct?)
    }

    /// Interpret every available figure and combine them.
    pub fn interpret(&self, price_change_pct: Option<f64>) -> DerivativesView {
        let funding = self.funding();
        let long_short = self.long_short();
        let open_interest = self.open_interest(price_change_pct);

        let signals: Vec<f64> = [
            funding.as_ref().map(|f| f.signal),
            long_short.as_ref().map(|l| l.signal),
            open_interest.as_ref().map(|o| o.signal),
        ]
        .into_iter()
        .flatten()
        .collect();

        let composite_signal = if signals.is_empty() {
            0.0
        } else {
            signals.iter().sum::<f64>() / signals.len() as f64
        };

        DerivativesView {
            funding,
            long_short,
            open_interest,
            composite_signal,
            composite_bias: Bias::from_signal(composite_signal),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_snapshot_is_neutral() {
        let view = DerivativesSnapshot::default().interpret(None);
        assert!(view.funding.is_none());
        assert_eq!(view.composite_signal, 0.0);
        assert_eq!(view.composite_bias, Bias::Neutral);
    }

    #[test]
    fn composite_averages_available_signals() {
        let snap = DerivativesSnapshot {
            funding_rate: Some(-0.0006),
            long_short_ratio: Some(0.5),
            ..DerivativesSnapshot::default()
        };
        let view = snap.interpret(None);
        assert!((view.composite_signal - 0.7).abs() < 1e-10);
        assert_eq!(view.composite_bias, Bias::Bullish);
        assert!(view.open_interest.is_none());
    }

    #[test]
    fn open_interest_needs_price_change() {
        let snap = DerivativesSnapshot {
            open_interest_change_pct: Some(4.0),
            ..DerivativesSnapshot::default()
        };
        assert!(snap.open_interest(None).is_none());
        assert_eq!(snap.open_interest(Some(-1.0)).unwrap().signal, -0.6);
    }
}
