// =============================================================================
// Consensus Aggregator
// =============================================================================
//
//   1. Partition weighted predictions by direction.
//   2. agreement = max(longs, shorts) / total
//   3. agreement < min_agreement            => no recommendation
//   4. confidence = mean confidence of the majority side
//   5. agreement >= amplify_agreement        => confidence × amplification
//   6. confidence capped at 0.98
//   7. entry / target / stop = arithmetic mean over the majority side
//
// Equal vote counts go through the configured `TiePolicy`. Inputs are sorted
// by bot name before any arithmetic so the result does not depend on the
// order bots were run in.
// =============================================================================

use std::cmp::Ordering;

use serde::{Deserialize, Serialize};
use tracing::debug;

use super::regime_weights::CONFIDENCE_CAP;
use super::{Recommendation, WeightedPrediction};
use crate::errors::{ConsensusError, ConsensusResult};
use crate::regime::RegimeClassification;
use crate::types::Direction;

fn default_min_agreement() -> f64 {
    0.60
}

fn default_amplify_agreement() -> f64 {
    0.80
}

fn default_amplification() -> f64 {
    1.2
}

/// What to do when LONG and SHORT votes are equal.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TiePolicy {
    /// Emit nothing.
    #[default]
    NoConsensus,
    /// Side with the higher mean weighted confidence; an exact tie there
    /// still emits nothing.
    PreferHigherConfidence,
    PreferShort,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ConsensusParams {
    #[serde(default = "default_min_agreement")]
    pub min_agreement: f64,
    #[serde(default = "default_amplify_agreement")]
    pub amplify_agreement: f64,
    #[serde(default = "default_amplification")]
    pub amplification: f64,
    #[serde(default)]
    pub tie_policy: TiePolicy,
}

impl Default for ConsensusParams {
    fn default() -> Self {
        Self {
            min_agreement: default_min_agreement(),
            amplify_agreement: default_amplify_agreement(),
            amplification: default_amplification(),
            tie_policy: TiePolicy::default(),
        }
    }
}

impl ConsensusParams {
    pub fn validate(&self) -> ConsensusResult<()> {
        let in_unit = |x: f64| x.is_finite() && x > 0.0 && x <= 1.0;
        if !in_unit(self.min_agreement) || !in_unit(self.amplify_agreement) {
            return Err(ConsensusError::Config(format!(
                "agreement thresholds must be in (0, 1], got min={} amplify={}",
                self.min_agreement, self.amplify_agreement
            )));
        }
        if self.amplify_agreement < self.min_agreement {
            return Err(ConsensusError::Config(format!(
                "amplify_agreement ({}) below min_agreement ({})",
                self.amplify_agreement, self.min_agreement
            )));
        }
        if !self.amplification.is_finite() || self.amplification < 1.0 {
            return Err(ConsensusError::Config(format!(
                "amplification must be >= 1.0, got {}",
                self.amplification
            )));
        }
        Ok(())
    }
}

/// Result of aggregating one asset.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum ConsensusOutcome {
    Emitted(Recommendation),
    /// Every bot abstained.
    NoPredictions,
    /// Majority too thin.
    NoConsensus { agreement_ratio: f64 },
    /// Equal votes and the tie policy declined to pick a side.
    Tie { votes: usize },
    /// The asset's pipeline could not run to completion.
    Failed { reason: String },
}

impl ConsensusOutcome {
    pub fn recommendation(&self) -> Option<&Recommendation> {
        match self {
            Self::Emitted(r) => Some(r),
            _ => None,
        }
    }

    pub fn into_recommendation(self) -> Option<Recommendation> {
        match self {
            Self::Emitted(r) => Some(r),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct ConsensusAggregator {
    params: ConsensusParams,
}

impl ConsensusAggregator {
    pub fn new(params: ConsensusParams) -> Self {
        Self { params }
    }

    pub fn params(&self) -> &ConsensusParams {
        &self.params
    }

    pub fn aggregate(
        &self,
        asset: &str,
        predictions: &[WeightedPrediction],
        regime: &RegimeClassification,
        as_of: Option<i64>,
    ) -> ConsensusOutcome {
        let total = predictions.len();
        if total == 0 {
            debug!(asset, "no predictions");
            return ConsensusOutcome::NoPredictions;
        }

        let mut sorted: Vec<&WeightedPrediction> = predictions.iter().collect();
        sorted.sort_by(|a, b| canonical_order(a, b));

        let long_votes = sorted
            .iter()
            .filter(|p| p.prediction.direction == Direction::Long)
            .count();
        let short_votes = total - long_votes;

        let direction = match long_votes.cmp(&short_votes) {
            Ordering::Greater => Direction::Long,
            Ordering::Less => Direction::Short,
            Ordering::Equal => match self.break_tie(&sorted) {
                Some(d) => d,
                None => {
                    debug!(asset, votes = long_votes, "tied vote");
                    return ConsensusOutcome::Tie { votes: long_votes };
                }
            },
        };

        let agreement_ratio = long_votes.max(short_votes) as f64 / total as f64;
        if agreement_ratio < self.params.min_agreement {
            debug!(
                asset,
                agreement = format!("{:.2}", agreement_ratio),
                "agreement below threshold"
            );
            return ConsensusOutcome::NoConsensus { agreement_ratio };
        }

        let agreeing: Vec<WeightedPrediction> = sorted
            .into_iter()
            .filter(|p| p.prediction.direction == direction)
            .cloned()
            .collect();
        let n = agreeing.len() as f64;
        let mean = |f: fn(&WeightedPrediction) -> f64| agreeing.iter().map(f).sum::<f64>() / n;

        let mut confidence = mean(|p| p.prediction.confidence);
        if agreement_ratio >= self.params.amplify_agreement {
            confidence *= self.params.amplification;
        }
        let confidence = confidence.clamp(0.0, CONFIDENCE_CAP);

        let entry = mean(|p| p.prediction.entry);
        let take_profit = mean(|p| p.prediction.take_profit);
        let stop_loss = mean(|p| p.prediction.stop_loss);

        let leverages: Vec<u32> = agreeing.iter().filter_map(|p| p.prediction.leverage).collect();
        let leverage = (!leverages.is_empty()).then(|| {
            let avg = leverages.iter().map(|&l| l as f64).sum::<f64>() / leverages.len() as f64;
            avg.round().max(1.0) as u32
        });

        debug!(
            asset,
            direction = %direction,
            agreement = format!("{:.2}", agreement_ratio),
            confidence = format!("{:.4}", confidence),
            bots = agreeing.len(),
            "consensus reached"
        );

        ConsensusOutcome::Emitted(Recommendation {
            asset: asset.to_string(),
            direction,
            confidence,
            agreement_ratio,
            long_votes,
            short_votes,
            entry,
            take_profit,
            stop_loss,
            leverage,
            contributing_bots: agreeing,
            regime: regime.regime,
            regime_confidence: regime.confidence,
            as_of,
        })
    }

    fn break_tie(&self, sorted: &[&WeightedPrediction]) -> Option<Direction> {
        match self.params.tie_policy {
            TiePolicy::NoConsensus => None,
            TiePolicy::PreferShort => Some(Direction::Short),
            TiePolicy::PreferHigherConfidence => {
                let side_mean = |d: Direction| {
                    let confs: Vec<f64> = sorted
                        .iter()
                        .filter(|p| p.prediction.direction == d)
                        .map(|p| p.prediction.confidence)
                        .collect();
                    confs.iter().sum::<f64>() / confs.len() as f64
                };
                let (long, short) = (side_mean(Direction::Long), side_mean(Direction::Short));
                match long.total_cmp(&short) {
                    Ordering::Greater => Some(Direction::Long),
                    Ordering::Less => Some(Direction::Short),
                    Ordering::Equal => None,
                }
            }
        }
    }
}

/// Total order used before summing: bot name, then every numeric field.
fn canonical_order(a: &WeightedPrediction, b: &WeightedPrediction) -> Ordering {
    let (pa, pb) = (&a.prediction, &b.prediction);
    pa.bot_name
        .cmp(&pb.bot_name)
        .then(pa.direction.cmp(&pb.direction))
        .then(pa.confidence.total_cmp(&pb.confidence))
        .then(pa.entry.total_cmp(&pb.entry))
        .then(pa.take_profit.total_cmp(&pb.take_profit))
        .then(pa.stop_loss.total_cmp(&pb.stop_loss))
        .then(pa.leverage.cmp(&pb.leverage))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bots::BotPrediction;
    use crate::types::Regime;
    use proptest::prelude::*;

    fn weighted(name: &str, direction: Direction, conf: f64, entry: f64) -> WeightedPrediction {
        let s = direction.sign();
        let prediction = BotPrediction::new(
            name,
            direction,
            conf,
            entry,
            entry * (1.0 + s * 0.03),
            entry * (1.0 - s * 0.015),
        )
        .unwrap();
        WeightedPrediction {
            base_confidence: conf,
            regime_weight: 1.0,
            prediction,
        }
    }

    fn votes(longs: usize, shorts: usize, conf: f64) -> Vec<WeightedPrediction> {
        (0..longs)
            .map(|k| weighted(&format!("long_{k:02}"), Direction::Long, conf, 100.0))
            .chain((0..shorts).map(|k| weighted(&format!("short_{k:02}"), Direction::Short, conf, 100.0)))
            .collect()
    }

    fn sideways() -> RegimeClassification {
        RegimeClassification::fixed(Regime::Sideways, 0.7)
    }

    fn agg() -> ConsensusAggregator {
        ConsensusAggregator::default()
    }

    #[test]
    fn empty_input_is_not_an_error() {
        assert_eq!(agg().aggregate("BTC", &[], &sideways(), None), ConsensusOutcome::NoPredictions);
    }

    #[test]
    fn single_bot_is_amplified() {
        let preds = vec![weighted("rsi_extreme", Direction::Long, 0.581, 100.0)];
        let rec = agg().aggregate("BTC", &preds, &sideways(), None).into_recommendation().unwrap();
        assert_eq!(rec.direction, Direction::Long);
        assert_eq!(rec.agreement_ratio, 1.0);
        assert!((rec.confidence - 0.6972).abs() < 1e-9);
        assert_eq!(rec.regime, Regime::Sideways);
        assert_eq!(rec.regime_confidence, 0.7);
    }

    #[test]
    fn six_four_is_emitted_at_the_boundary() {
        let rec = agg()
            .aggregate("ETH", &votes(6, 4, 0.5), &sideways(), None)
            .into_recommendation()
            .unwrap();
        assert_eq!(rec.direction, Direction::Long);
        assert!((rec.agreement_ratio - 0.6).abs() < 1e-12);
        // Below the amplification threshold: plain mean.
        assert!((rec.confidence - 0.5).abs() < 1e-12);
        assert_eq!(rec.contributing_bots.len(), 6);
        assert_eq!((rec.long_votes, rec.short_votes), (6, 4));
    }

    #[test]
    fn below_threshold_is_rejected() {
        let out = agg().aggregate("SOL", &votes(4, 3, 0.7), &sideways(), None);
        match out {
            ConsensusOutcome::NoConsensus { agreement_ratio } => {
                assert!((agreement_ratio - 4.0 / 7.0).abs() < 1e-12)
            }
            other => panic!("expected NoConsensus, got {other:?}"),
        }
    }

    #[test]
    fn five_five_is_a_tie_by_default() {
        let out = agg().aggregate("XRP", &votes(5, 5, 0.6), &sideways(), None);
        assert_eq!(out, ConsensusOutcome::Tie { votes: 5 });
    }

    #[test]
    fn tie_policies_with_lowered_threshold() {
        let mut preds = votes(5, 5, 0.6);
        preds[0].prediction.confidence = 0.9;
        let params = ConsensusParams {
            min_agreement: 0.5,
            tie_policy: TiePolicy::PreferHigherConfidence,
            ..ConsensusParams::default()
        };
        let rec = ConsensusAggregator::new(params)
            .aggregate("XRP", &preds, &sideways(), None)
            .into_recommendation()
            .unwrap();
        assert_eq!(rec.direction, Direction::Long);

        let params = ConsensusParams {
            min_agreement: 0.5,
            tie_policy: TiePolicy::PreferShort,
            ..ConsensusParams::default()
        };
        let rec = ConsensusAggregator::new(params)
            .aggregate("XRP", &preds, &sideways(), None)
            .into_recommendation()
            .unwrap();
        assert_eq!(rec.direction, Direction::Short);
    }

    #[test]
    fn tie_policy_cannot_beat_the_threshold() {
        let params = ConsensusParams {
            tie_policy: TiePolicy::PreferShort,
            ..ConsensusParams::default()
        };
        let out = ConsensusAggregator::new(params).aggregate("XRP", &votes(5, 5, 0.6), &sideways(), None);
        assert!(matches!(out, ConsensusOutcome::NoConsensus { .. }));
    }

    #[test]
    fn levels_are_averaged_over_the_majority() {
        let preds = vec![
            weighted("a", Direction::Short, 0.6, 100.0),
            weighted("b", Direction::Short, 0.8, 110.0),
            weighted("c", Direction::Short, 0.7, 90.0),
            weighted("d", Direction::Short, 0.7, 100.0),
            weighted("e", Direction::Long, 0.9, 500.0),
        ];
        let rec = agg().aggregate("BNB", &preds, &sideways(), Some(42)).into_recommendation().unwrap();
        assert_eq!(rec.direction, Direction::Short);
        assert!((rec.entry - 100.0).abs() < 1e-9);
        assert!((rec.take_profit - 97.0).abs() < 1e-9);
        assert!((rec.stop_loss - 101.5).abs() < 1e-9);
        // ratio 0.8 amplifies: mean 0.7 × 1.2
        assert!((rec.confidence - 0.84).abs() < 1e-9);
        assert_eq!(rec.as_of, Some(42));
        let names: Vec<_> = rec.contributing_bots.iter().map(|w| w.prediction.bot_name.as_str()).collect();
        assert_eq!(names, ["a", "b", "c", "d"]);
    }

    #[test]
    fn leverage_is_averaged_when_given() {
        let mut preds = votes(3, 0, 0.6);
        preds[0].prediction.leverage = Some(3);
        preds[1].prediction.leverage = Some(5);
        let rec = agg().aggregate("BTC", &preds, &sideways(), None).into_recommendation().unwrap();
        assert_eq!(rec.leverage, Some(4));
    }

    #[test]
    fn params_validation() {
        assert!(ConsensusParams::default().validate().is_ok());
        let bad = ConsensusParams { min_agreement: 0.9, amplify_agreement: 0.8, ..ConsensusParams::default() };
        assert!(bad.validate().is_err());
        let bad = ConsensusParams { amplification: 0.5, ..ConsensusParams::default() };
        assert!(bad.validate().is_err());
    }

    #[test]
    fn params_parse_with_defaults() {
        let p: ConsensusParams = serde_json::from_str(r#"{"tie_policy": "prefer_short"}"#).unwrap();
        assert_eq!(p.tie_policy, TiePolicy::PreferShort);
        assert_eq!(p.min_agreement, 0.60);
    }

    proptest! {
        #[test]
        fn rejection_and_amplification(
            longs in 0usize..12,
            shorts in 0usize..12,
            conf in 0.0f64..=0.98,
        ) {
            prop_assume!(longs + shorts > 0 && longs != shorts);
            let out = agg().aggregate("X", &votes(longs, shorts, conf), &sideways(), None);
            let ratio = longs.max(shorts) as f64 / (longs + shorts) as f64;
            if ratio < 0.60 {
                let rejected = matches!(out, ConsensusOutcome::NoConsensus { .. });
                prop_assert!(rejected);
            } else {
                let rec = out.into_recommendation().unwrap();
                let expected = if ratio >= 0.80 { (conf * 1.2).min(0.98) } else { conf };
                prop_assert!((rec.confidence - expected).abs() < 1e-9);
                prop_assert!(rec.confidence <= CONFIDENCE_CAP);
            }
        }

        #[test]
        fn order_does_not_matter(
            confs in proptest::collection::vec((0.0f64..=0.98, any::<bool>()), 1..15),
            seed in any::<u64>(),
        ) {
            let preds: Vec<_> = confs
                .iter()
                .enumerate()
                .map(|(k, (c, long))| {
                    let dir = if *long { Direction::Long } else { Direction::Short };
                    weighted(&format!("bot_{k:02}"), dir, *c, 100.0 + k as f64)
                })
                .collect();
            let mut shuffled = preds.clone();
            let len = shuffled.len();
            shuffled.rotate_left((seed as usize) % len);
            shuffled.reverse();

            let a = serde_json::to_string(&agg().aggregate("X", &preds, &sideways(), None)).unwrap();
            let b = serde_json::to_string(&agg().aggregate("X", &shuffled, &sideways(), None)).unwrap();
            prop_assert_eq!(a, b);
        }
    }
}
