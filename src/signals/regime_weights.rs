// =============================================================================
// Regime Weights - per-regime, per-bot confidence multipliers
// =============================================================================
//
//   final = min(base × weight(regime, bot) × regimeConfidence, 0.98)
//
// The table is built once at start (built-in defaults merged with config
// overrides) and shared read-only. A bot missing from a regime's map weighs
// 1.0. Direction and price levels pass through untouched.
// =============================================================================

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::WeightedPrediction;
use crate::bots::BotPrediction;
use crate::errors::{ConsensusError, ConsensusResult};
use crate::regime::RegimeClassification;
use crate::types::Regime;

/// No weighted or aggregated confidence may exceed this.
pub const CONFIDENCE_CAP: f64 = 0.98;

/// Multiplier used for bots a regime does not list.
pub const DEFAULT_WEIGHT: f64 = 1.0;

/// `{regime -> {bot name -> multiplier}}`.
pub type RegimeWeightOverrides = BTreeMap<Regime, BTreeMap<String, f64>>;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RegimeWeightTable {
    weights: RegimeWeightOverrides,
}

/// Bots that ride trends; favoured in trending regimes, damped in ranges.
const TREND_FOLLOWERS: &[&str] = &[
    "ema_cross",
    "golden_cross",
    "ema_ribbon",
    "adx_trend",
    "macd_zero_line",
    "ichimoku_cloud",
    "trend_ride",
    "sma_cross",
    "bollinger_walk",
    "donchian_breakout",
    "market_structure",
    "obv_trend",
];

/// Bots that fade stretches; favoured in ranges, damped in trends.
const MEAN_REVERTERS: &[&str] = &[
    "bollinger_reversion",
    "keltner_reversion",
    "vwap_reversion",
    "stochastic_extreme",
    "williams_r",
    "cci_extreme",
    "pivot_points",
    "ticker_mean_revert",
];

impl RegimeWeightTable {
    /// Empty table: every bot weighs 1.0 in every regime.
    pub fn neutral() -> Self {
        Self::default()
    }

    /// Built-in defaults.
    pub fn builtin() -> Self {
        let mut weights = RegimeWeightOverrides::new();

        let bull = weights.entry(Regime::Bull).or_default();
        for bot in TREND_FOLLOWERS {
            bull.insert(bot.to_string(), 1.2);
        }
        for bot in MEAN_REVERTERS {
            bull.insert(bot.to_string(), 0.8);
        }
        bull.insert("funding_contrarian".into(), 0.9);

        let bear = weights.entry(Regime::Bear).or_default();
        for bot in TREND_FOLLOWERS {
            bear.insert(bot.to_string(), 1.1);
        }
        for bot in MEAN_REVERTERS {
            bear.insert(bot.to_string(), 0.8);
        }
        bear.insert("funding_contrarian".into(), 1.2);
        bear.insert("squeeze_hunter".into(), 1.2);
        bear.insert("whale_activity".into(), 1.2);

        // rsi_extreme is deliberately absent: it weighs 1.0 in ranges.
        let sideways = weights.entry(Regime::Sideways).or_default();
        for bot in TREND_FOLLOWERS {
            sideways.insert(bot.to_string(), 0.7);
        }
        for bot in MEAN_REVERTERS {
            sideways.insert(bot.to_string(), 1.2);
        }
        sideways.insert("bollinger_reversion".into(), 1.3);
        sideways.insert("bollinger_squeeze".into(), 1.1);

        Self { weights }
    }

    /// Merge `overrides` over this table. Overrides replace individual
    /// entries; everything else is kept.
    pub fn with_overrides(mut self, overrides: &RegimeWeightOverrides) -> ConsensusResult<Self> {
        for (regime, bots) in overrides {
            let map = self.weights.entry(*regime).or_default();
            for (bot, value) in bots {
                map.insert(bot.clone(), *value);
            }
        }
        self.validate()?;
        Ok(self)
    }

    /// Every multiplier must be finite and non-negative.
    pub fn validate(&self) -> ConsensusResult<()> {
        for (regime, bots) in &self.weights {
            for (bot, value) in bots {
                if !value.is_finite() || *value < 0.0 {
                    return Err(ConsensusError::InvalidRegimeWeight {
                        regime: regime.to_string(),
                        bot: bot.clone(),
                        value: *value,
                    });
                }
            }
        }
        Ok(())
    }

    pub fn weight(&self, regime: Regime, bot: &str) -> f64 {
        self.weights
            .get(&regime)
            .and_then(|m| m.get(bot))
            .copied()
            .unwrap_or(DEFAULT_WEIGHT)
    }

    /// Every explicitly listed entry, for display.
    pub fn entries(&self) -> &RegimeWeightOverrides {
        &self.weights
    }

    /// Rescale each prediction's confidence for the classified regime.
    pub fn apply(
        &self,
        predictions: Vec<BotPrediction>,
        classification: &RegimeClassification,
    ) -> Vec<WeightedPrediction> {
        predictions
            .into_iter()
            .map(|mut prediction| {
                let regime_weight = self.weight(classification.regime, &prediction.bot_name);
                let base_confidence = prediction.confidence;
                prediction.confidence =
                    final_confidence(base_confidence, regime_weight, classification.confidence);
                WeightedPrediction {
                    prediction,
                    base_confidence,
                    regime_weight,
                }
            })
            .collect()
    }
}

/// `min(base × weight × regime_confidence, 0.98)`, floored at 0. Non-finite
/// products count as 0.
pub fn final_confidence(base: f64, weight: f64, regime_confidence: f64) -> f64 {
    let v = base * weight * regime_confidence;
    if v.is_finite() {
        v.clamp(0.0, CONFIDENCE_CAP)
    } else {
        0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bots::BotPanel;
    use crate::types::Direction;
    use proptest::prelude::*;

    fn pred(name: &str, conf: f64) -> BotPrediction {
        BotPrediction::new(name, Direction::Long, conf, 100.0, 103.0, 98.5).unwrap()
    }

    #[test]
    fn unknown_bot_weighs_one() {
        let table = RegimeWeightTable::builtin();
        assert_eq!(table.weight(Regime::Bull, "no_such_bot"), 1.0);
        assert_eq!(RegimeWeightTable::neutral().weight(Regime::Bear, "ema_cross"), 1.0);
    }

    #[test]
    fn rsi_bot_is_neutral_in_ranges() {
        assert_eq!(RegimeWeightTable::builtin().weight(Regime::Sideways, "rsi_extreme"), 1.0);
    }

    #[test]
    fn builtin_names_real_bots() {
        let panel = BotPanel::standard();
        for (regime, bots) in RegimeWeightTable::builtin().entries() {
            for bot in bots.keys() {
                assert!(panel.contains(bot), "{regime}: unknown bot {bot}");
            }
        }
    }

    #[test]
    fn apply_rescales_confidence_only() {
        let table = RegimeWeightTable::builtin();
        let regime = RegimeClassification::fixed(Regime::Sideways, 0.7);
        let out = table.apply(vec![pred("rsi_extreme", 0.83)], &regime);
        assert_eq!(out.len(), 1);
        let w = &out[0];
        assert!((w.prediction.confidence - 0.581).abs() < 1e-9);
        assert_eq!(w.base_confidence, 0.83);
        assert_eq!(w.regime_weight, 1.0);
        assert_eq!(w.prediction.entry, 100.0);
        assert_eq!(w.prediction.direction, Direction::Long);
    }

    #[test]
    fn cap_applies() {
        assert_eq!(final_confidence(1.0, 1.3, 0.95), CONFIDENCE_CAP);
        assert_eq!(final_confidence(0.5, f64::INFINITY, 0.9), 0.0);
    }

    #[test]
    fn overrides_merge_and_validate() {
        let mut overrides = RegimeWeightOverrides::new();
        overrides
            .entry(Regime::Bull)
            .or_default()
            .insert("rsi_extreme".into(), 0.5);
        let table = RegimeWeightTable::builtin().with_overrides(&overrides).unwrap();
        assert_eq!(table.weight(Regime::Bull, "rsi_extreme"), 0.5);
        assert_eq!(table.weight(Regime::Bull, "ema_cross"), 1.2);

        overrides
            .entry(Regime::Bear)
            .or_default()
            .insert("ema_cross".into(), -1.0);
        let err = RegimeWeightTable::builtin().with_overrides(&overrides).unwrap_err();
        assert!(matches!(err, ConsensusError::InvalidRegimeWeight { .. }));
    }

    #[test]
    fn overrides_parse_from_json() {
        let json = r#"{"BULL": {"rsi_extreme": 0.9}, "SIDEWAYS": {"ema_cross": 0.5}}"#;
        let overrides: RegimeWeightOverrides = serde_json::from_str(json).unwrap();
        let table = RegimeWeightTable::neutral().with_overrides(&overrides).unwrap();
        assert_eq!(table.weight(Regime::Sideways, "ema_cross"), 0.5);
        assert_eq!(table.weight(Regime::Bear, "ema_cross"), 1.0);
    }

    proptest! {
        #[test]
        fn monotonic_in_regime_confidence(
            base in 0.0f64..=1.0,
            weight in 0.0f64..3.0,
            a in 0.6f64..=0.95,
            b in 0.6f64..=0.95,
        ) {
            let (lo, hi) = if a <= b { (a, b) } else { (b, a) };
            let f_lo = final_confidence(base, weight, lo);
            let f_hi = final_confidence(base, weight, hi);
            prop_assert!(f_lo <= f_hi);
            prop_assert!(f_hi <= CONFIDENCE_CAP);
            prop_assert!(f_lo >= 0.0);
        }
    }
}
