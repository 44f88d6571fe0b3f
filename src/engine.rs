// =============================================================================
// Consensus Engine - per-asset evaluation pipeline
// =============================================================================
//
// Pipeline (one asset):
//   1. Classify the regime from the indicator snapshot
//   2. Run the bot panel over (indicators, derivatives, coin, options)
//   3. Rescale every prediction by the regime weight table
//   4. Aggregate into a consensus recommendation (or no recommendation)
//
// Every stage is a pure function of its inputs. Assets are independent, so a
// batch fans out over blocking tasks bounded by a semaphore; a failed asset
// only loses its own recommendation.
// =============================================================================

use std::sync::Arc;

use futures_util::future::join_all;
use serde::{Deserialize, Serialize};
use tokio::sync::Semaphore;
use tracing::{debug, info, warn};

use crate::bots::{BotInputs, BotPanel};
use crate::derivatives::{DerivativesSnapshot, DerivativesView};
use crate::errors::{ConsensusError, ConsensusResult};
use crate::market_data::{CoinState, IndicatorSnapshot, OptionsSnapshot};
use crate::regime::{RegimeClassification, RegimeClassifier, RegimeFactors, MIN_REGIME_CONFIDENCE};
use crate::runtime_config::RuntimeConfig;
use crate::signals::{
    ConsensusAggregator, ConsensusOutcome, Recommendation, RegimeWeightTable, WeightedPrediction,
};
use crate::types::Regime;

// =============================================================================
// Inputs / outputs
// =============================================================================

/// Everything known about one asset for one evaluation cycle.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssetInput {
    pub asset: String,
    #[serde(default)]
    pub indicators: IndicatorSnapshot,
    #[serde(default)]
    pub derivatives: DerivativesSnapshot,
    /// Ticker state; derived from the candles when absent.
    #[serde(default)]
    pub coin: Option<CoinState>,
    #[serde(default)]
    pub options: Option<OptionsSnapshot>,
}

impl AssetInput {
    pub fn new(asset: impl Into<String>, indicators: IndicatorSnapshot) -> Self {
        Self {
            asset: asset.into(),
            indicators,
            ..Self::default()
        }
    }

    pub fn validate(&self) -> ConsensusResult<()> {
        if self.asset.trim().is_empty() {
            return Err(ConsensusError::InvalidInput("asset must not be empty".into()));
        }
        Ok(())
    }
}

/// Full result for one asset: the regime, every weighted prediction (for the
/// bot drill-down) and the aggregation outcome.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Evaluation {
    pub asset: String,
    pub regime: RegimeClassification,
    /// All firing bots after weighting, sorted by bot name.
    pub predictions: Vec<WeightedPrediction>,
    /// Bots that abstained.
    pub abstained: usize,
    /// Funding, long/short and open interest read together.
    pub derivatives: DerivativesView,
    pub outcome: ConsensusOutcome,
}

impl Evaluation {
    /// Placeholder for an asset whose pipeline did not finish. Nothing was
    /// classified, so the regime is the least committed one.
    pub fn failed(asset: impl Into<String>, reason: impl Into<String>) -> Self {
        let reason = reason.into();
        Self {
            asset: asset.into(),
            regime: RegimeClassification {
                regime: Regime::Sideways,
                confidence: MIN_REGIME_CONFIDENCE,
                reasons: vec![format!("evaluation failed: {reason}")],
                factors: RegimeFactors::default(),
            },
            predictions: Vec::new(),
            abstained: 0,
            derivatives: DerivativesSnapshot::default().interpret(None),
            outcome: ConsensusOutcome::Failed { reason },
        }
    }

    pub fn recommendation(&self) -> Option<&Recommendation> {
        self.outcome.recommendation()
    }
}

// =============================================================================
// Engine
// =============================================================================

#[derive(Debug, Clone)]
pub struct ConsensusEngine {
    classifier: RegimeClassifier,
    panel: BotPanel,
    weights: Arc<RegimeWeightTable>,
    aggregator: ConsensusAggregator,
}

impl Default for ConsensusEngine {
    fn default() -> Self {
        Self::new(
            RegimeClassifier::default(),
            BotPanel::standard(),
            Arc::new(RegimeWeightTable::builtin()),
            ConsensusAggregator::default(),
        )
    }
}

impl ConsensusEngine {
    pub fn new(
        classifier: RegimeClassifier,
        panel: BotPanel,
        weights: Arc<RegimeWeightTable>,
        aggregator: ConsensusAggregator,
    ) -> Self {
        Self {
            classifier,
            panel,
            weights,
            aggregator,
        }
    }

    /// Build the engine described by `config`. The weight table is frozen
    /// here.
    pub fn from_config(config: &RuntimeConfig) -> ConsensusResult<Self> {
        config.validate()?;

        let base = if config.use_builtin_weights {
            RegimeWeightTable::builtin()
        } else {
            RegimeWeightTable::neutral()
        };
        let weights = base.with_overrides(&config.regime_weights)?;

        let panel = BotPanel::standard();
        for name in &config.disabled_bots {
            if !panel.contains(name) {
                warn!(bot = %name, "disabled bot is not in the roster");
            }
        }
        let panel = panel.without(&config.disabled_bots);

        Ok(Self::new(
            RegimeClassifier::new(config.regime.clone()),
            panel,
            Arc::new(weights),
            ConsensusAggregator::new(config.consensus),
        ))
    }

    pub fn panel(&self) -> &BotPanel {
        &self.panel
    }

    pub fn weights(&self) -> &RegimeWeightTable {
        &self.weights
    }

    pub fn classifier(&self) -> &RegimeClassifier {
        &self.classifier
    }

    /// Recommendation for one asset, or `None` when the panel abstains or
    /// cannot agree.
    pub fn evaluate(
        &self,
        asset: &str,
        indicators: &IndicatorSnapshot,
        derivatives: &DerivativesSnapshot,
        options: Option<&OptionsSnapshot>,
    ) -> Option<Recommendation> {
        let regime = self.classifier.classify(indicators);
        let coin = CoinState::from_snapshot(asset, indicators);
        self.run_pipeline(asset, indicators, derivatives, &coin, options, regime)
            .outcome
            .into_recommendation()
    }

    /// Full evaluation with the classifier's own regime.
    pub fn evaluate_detailed(&self, input: &AssetInput) -> Evaluation {
        let regime = self.classifier.classify(&input.indicators);
        self.evaluate_under_regime(input, regime)
    }

    /// Full evaluation with an externally supplied regime.
    pub fn evaluate_under_regime(&self, input: &AssetInput, regime: RegimeClassification) -> Evaluation {
        let derived;
        let coin = match &input.coin {
            Some(coin) => coin,
            None => {
                derived = CoinState::from_snapshot(&input.asset, &input.indicators);
                &derived
            }
        };
        self.run_pipeline(
            &input.asset,
            &input.indicators,
            &input.derivatives,
            coin,
            input.options.as_ref(),
            regime,
        )
    }

    fn run_pipeline(
        &self,
        asset: &str,
        indicators: &IndicatorSnapshot,
        derivatives: &DerivativesSnapshot,
        coin: &CoinState,
        options: Option<&OptionsSnapshot>,
        regime: RegimeClassification,
    ) -> Evaluation {
        // ── 1. Regime (already classified) ──────────────────────────────
        debug!(
            asset,
            regime = %regime.regime,
            confidence = format!("{:.2}", regime.confidence),
            "regime"
        );

        // ── 2. Bot panel ────────────────────────────────────────────────
        let inputs = BotInputs {
            indicators,
            derivatives,
            coin,
            options,
        };
        let raw = self.panel.run(&inputs);
        let abstained = self.panel.len() - raw.len();
        let derivatives_view = derivatives.interpret(inputs.recent_change_pct());

        // ── 3. Regime weighting ─────────────────────────────────────────
        let mut predictions = self.weights.apply(raw, &regime);
        predictions.sort_by(|a, b| a.prediction.bot_name.cmp(&b.prediction.bot_name));

        // ── 4. Consensus ────────────────────────────────────────────────
        let outcome = self
            .aggregator
            .aggregate(asset, &predictions, &regime, indicators.as_of());

        match &outcome {
            ConsensusOutcome::Emitted(rec) => info!(
                asset,
                direction = %rec.direction,
                confidence = format!("{:.4}", rec.confidence),
                agreement = format!("{:.2}", rec.agreement_ratio),
                regime = %rec.regime,
                bots = rec.contributing_bots.len(),
                "recommendation"
            ),
            other => debug!(asset, fired = predictions.len(), outcome = ?other, "no recommendation"),
        }

        Evaluation {
            asset: asset.to_string(),
            regime,
            predictions,
            abstained,
            derivatives: derivatives_view,
            outcome,
        }
    }

    /// Evaluate many assets concurrently, at most `max_parallel` at a time.
    /// Results come back in input order, one per input; an asset whose task
    /// fails comes back with a `Failed` outcome.
    pub async fn evaluate_batch(self: &Arc<Self>, inputs: Vec<AssetInput>, max_parallel: usize) -> Vec<Evaluation> {
        let permits = Arc::new(Semaphore::new(max_parallel.max(1)));

        let tasks = inputs.into_iter().map(|input| {
            let engine = Arc::clone(self);
            let permits = Arc::clone(&permits);
            async move {
                let asset = input.asset.clone();
                let _permit = match permits.acquire_owned().await {
                    Ok(p) => p,
                    Err(e) => {
                        warn!(asset = %asset, error = %e, "batch semaphore closed");
                        return Evaluation::failed(asset, e.to_string());
                    }
                };
                match tokio::task::spawn_blocking(move || engine.evaluate_detailed(&input)).await {
                    Ok(eval) => eval,
                    Err(e) => {
                        warn!(asset = %asset, error = %e, "asset evaluation failed");
                        Evaluation::failed(asset, e.to_string())
                    }
                }
            }
        });

        join_all(tasks).await
    }
}
