// =============================================================================
// Signals Module
// =============================================================================
//
// Post-panel signal processing for one asset:
// - Regime-aware confidence weighting (static per-bot multiplier table)
// - Consensus aggregation into a single recommendation

pub mod consensus;
pub mod regime_weights;

pub use consensus::{ConsensusAggregator, ConsensusOutcome, ConsensusParams, TiePolicy};
pub use regime_weights::{
    final_confidence, RegimeWeightOverrides, RegimeWeightTable, CONFIDENCE_CAP, DEFAULT_WEIGHT,
};

use serde::{Deserialize, Serialize};

use crate::bots::BotPrediction;
use crate::types::{Direction, Regime};

/// A bot prediction after regime weighting. `prediction.confidence` holds the
/// final (weighted, capped) confidence; the inputs to that product are kept
/// alongside for the drill-down view.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WeightedPrediction {
    #[serde(flatten)]
    pub prediction: BotPrediction,
    pub base_confidence: f64,
    pub regime_weight: f64,
}

/// Terminal output of the pipeline for one asset.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Recommendation {
    pub asset: String,
    pub direction: Direction,
    pub confidence: f64,
    pub agreement_ratio: f64,
    pub long_votes: usize,
    pub short_votes: usize,
    pub entry: f64,
    pub take_profit: f64,
    pub stop_loss: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub leverage: Option<u32>,
    /// Majority-side predictions, sorted by bot name.
    pub contributing_bots: Vec<WeightedPrediction>,
    pub regime: Regime,
    pub regime_confidence: f64,
    /// Timestamp (ms) of the newest candle the evaluation saw.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub as_of: Option<i64>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn weighted_prediction_serializes_flat() {
        let prediction =
            BotPrediction::new("rsi_extreme", Direction::Long, 0.581, 100.0, 103.0, 98.5).unwrap();
        let w = WeightedPrediction {
            prediction,
            base_confidence: 0.83,
            regime_weight: 1.0,
        };
        let v = serde_json::to_value(&w).unwrap();
        assert_eq!(v["botName"], "rsi_extreme");
        assert_eq!(v["direction"], "LONG");
        assert_eq!(v["baseConfidence"], 0.83);
        assert!(v.get("leverage").is_none());

        let back: WeightedPrediction = serde_json::from_value(v).unwrap();
        assert_eq!(back, w);
    }
}
