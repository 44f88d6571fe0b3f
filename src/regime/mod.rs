// =============================================================================
// Regime Module
// =============================================================================
//
// Coarse BULL / BEAR / SIDEWAYS classification of a single indicator
// snapshot. The result scales every bot's vote in the weighting stage.

pub mod classifier;

pub use classifier::{
    classify, FactorWeights, RegimeClassification, RegimeClassifier, RegimeFactors, RegimeParams,
    MAX_REGIME_CONFIDENCE, MIN_REGIME_CONFIDENCE,
};
