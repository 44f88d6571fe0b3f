// =============================================================================
// Market Regime Classifier
// =============================================================================
//
// Labels a snapshot BULL, BEAR or SIDEWAYS from four sub-scores in [-1, 1]:
//
//   trend       - EMA20 / EMA50 / EMA200 ordering and price vs EMA200
//   volatility  - side of the Bollinger midline, scaled by band expansion
//                 (Bollinger width and ATR as % of price)
//   momentum    - RSI distance from 50, MACD histogram sign, Stochastic
//                 extremes
//   structure   - higher highs / higher lows vs lower highs / lower lows
//
// score = Σ weight_i · sub_score_i   (missing factors contribute 0)
//
//   score >  bull_threshold  => BULL
//   score <  bear_threshold  => BEAR
//   otherwise                => SIDEWAYS
//
// Confidence is a remap of |score| into [0.60, 0.95], pulled toward 0.60 by
// the share of factor weight that had no data. The classifier is total: an
// empty snapshot is SIDEWAYS at 0.60.
// =============================================================================

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::errors::{ConsensusError, ConsensusResult};
use crate::indicators::ema::stack_alignment;
use crate::indicators::structure::price_structure;
use crate::market_data::IndicatorSnapshot;
use crate::types::Regime;

pub const MIN_REGIME_CONFIDENCE: f64 = 0.60;
pub const MAX_REGIME_CONFIDENCE: f64 = 0.95;

// =============================================================================
// Parameters
// =============================================================================

fn default_trend_weight() -> f64 {
    0.35
}

fn default_volatility_weight() -> f64 {
    0.15
}

fn default_momentum_weight() -> f64 {
    0.30
}

fn default_structure_weight() -> f64 {
    0.20
}

fn default_bull_threshold() -> f64 {
    0.2
}

fn default_bear_threshold() -> f64 {
    -0.2
}

fn default_structure_lookback() -> usize {
    10
}

/// Weight of each sub-score in the combined regime score. Must sum to 1.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FactorWeights {
    #[serde(default = "default_trend_weight")]
    pub trend: f64,
    #[serde(default = "default_volatility_weight")]
    pub volatility: f64,
    #[serde(default = "default_momentum_weight")]
    pub momentum: f64,
    #[serde(default = "default_structure_weight")]
    pub structure: f64,
}

impl Default for FactorWeights {
    fn default() -> Self {
        Self {
            trend: default_trend_weight(),
            volatility: default_volatility_weight(),
            momentum: default_momentum_weight(),
            structure: default_structure_weight(),
        }
    }
}

impl FactorWeights {
    fn as_array(&self) -> [f64; 4] {
        [self.trend, self.volatility, self.momentum, self.structure]
    }
}

/// Tunables for the regime classifier.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegimeParams {
    #[serde(default)]
    pub weights: FactorWeights,

    #[serde(default = "default_bull_threshold")]
    pub bull_threshold: f64,

    #[serde(default = "default_bear_threshold")]
    pub bear_threshold: f64,

    /// Candles inspected for the price-structure factor.
    #[serde(default = "default_structure_lookback")]
    pub structure_lookback: usize,
}

impl Default for RegimeParams {
    fn default() -> Self {
        Self {
            weights: FactorWeights::default(),
            bull_threshold: default_bull_threshold(),
            bear_threshold: default_bear_threshold(),
            structure_lookback: default_structure_lookback(),
        }
    }
}

impl RegimeParams {
    pub fn validate(&self) -> ConsensusResult<()> {
        let weights = self.weights.as_array();
        if weights.iter().any(|w| !w.is_finite() || *w < 0.0) {
            return Err(ConsensusError::Config(
                "regime factor weights must be finite and non-negative".into(),
            ));
        }
        let sum: f64 = weights.iter().sum();
        if (sum - 1.0).abs() > 1e-6 {
            return Err(ConsensusError::Config(format!(
                "regime factor weights must sum to 1.0, got {sum:.4}"
            )));
        }
        if !(self.bear_threshold < 0.0 && 0.0 < self.bull_threshold && self.bull_threshold < 1.0)
            || self.bear_threshold <= -1.0
        {
            return Err(ConsensusError::Config(format!(
                "regime thresholds must satisfy -1 < bear ({}) < 0 < bull ({}) < 1",
                self.bear_threshold, self.bull_threshold
            )));
        }
        if self.structure_lookback < 2 {
            return Err(ConsensusError::Config(
                "structure_lookback must be at least 2".into(),
            ));
        }
        Ok(())
    }
}

// =============================================================================
// Output
// =============================================================================

/// Sub-scores behind a classification. `None` marks a factor without data.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegimeFactors {
    pub trend: Option<f64>,
    pub volatility: Option<f64>,
    pub momentum: Option<f64>,
    pub structure: Option<f64>,
    pub score: f64,
    /// Share of the factor weight that had data, 0-1.
    pub coverage: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegimeClassification {
    pub regime: Regime,
    /// Always within [0.60, 0.95].
    pub confidence: f64,
    pub reasons: Vec<String>,
    #[serde(default)]
    pub factors: RegimeFactors,
}

impl RegimeClassification {
    /// A classification supplied from outside the classifier (tests, replays,
    /// an upstream service). Confidence is clamped into the regime range.
    pub fn fixed(regime: Regime, confidence: f64) -> Self {
        let confidence = if confidence.is_finite() {
            confidence.clamp(MIN_REGIME_CONFIDENCE, MAX_REGIME_CONFIDENCE)
        } else {
            MIN_REGIME_CONFIDENCE
        };
        Self {
            regime,
            confidence,
            reasons: vec![format!("regime fixed externally as {regime}")],
            factors: RegimeFactors::default(),
        }
    }
}

// =============================================================================
// Classifier
// =============================================================================

#[derive(Debug, Clone, Default)]
pub struct RegimeClassifier {
    params: RegimeParams,
}

impl RegimeClassifier {
    pub fn new(params: RegimeParams) -> Self {
        Self { params }
    }

    pub fn params(&self) -> &RegimeParams {
        &self.params
    }

    /// Classify a snapshot. Pure and total.
    pub fn classify(&self, snapshot: &IndicatorSnapshot) -> RegimeClassification {
        let mut reasons = Vec::with_capacity(4);

        let trend = trend_score(snapshot);
        let volatility = volatility_score(snapshot);
        let momentum = momentum_score(snapshot);
        let structure = structure_score(snapshot, self.params.structure_lookback);

        let w = &self.params.weights;
        let mut score = 0.0;
        let mut coverage = 0.0;
        for (name, weight, factor) in [
            ("trend", w.trend, &trend),
            ("volatility", w.volatility, &volatility),
            ("momentum", w.momentum, &momentum),
            ("structure", w.structure, &structure),
        ] {
            match factor {
                Some((value, why)) => {
                    score += weight * value;
                    coverage += weight;
                    reasons.push(format!("{name} {value:+.2}: {why}"));
                }
                None => reasons.push(format!("{name}: insufficient data")),
            }
        }
        let score = score.clamp(-1.0, 1.0);

        let (regime, raw_confidence) = if score > self.params.bull_threshold {
            (Regime::Bull, directional_confidence(score, self.params.bull_threshold))
        } else if score < self.params.bear_threshold {
            (Regime::Bear, directional_confidence(score, self.params.bear_threshold))
        } else {
            let edge = if score >= 0.0 {
                self.params.bull_threshold
            } else {
                self.params.bear_threshold
            };
            (
                Regime::Sideways,
                remap(score.abs(), edge.abs(), 0.0, MIN_REGIME_CONFIDENCE, MAX_REGIME_CONFIDENCE),
            )
        };

        let confidence = (MIN_REGIME_CONFIDENCE
            + (raw_confidence - MIN_REGIME_CONFIDENCE) * coverage)
            .clamp(MIN_REGIME_CONFIDENCE, MAX_REGIME_CONFIDENCE);

        debug!(
            regime = %regime,
            score = format!("{:.3}", score),
            coverage = format!("{:.2}", coverage),
            confidence = format!("{:.3}", confidence),
            "regime classified"
        );

        RegimeClassification {
            regime,
            confidence,
            reasons,
            factors: RegimeFactors {
                trend: trend.map(|(v, _)| v),
                volatility: volatility.map(|(v, _)| v),
                momentum: momentum.map(|(v, _)| v),
                structure: structure.map(|(v, _)| v),
                score,
                coverage,
            },
        }
    }
}

/// Classify with the default parameters.
pub fn classify(snapshot: &IndicatorSnapshot) -> RegimeClassification {
    RegimeClassifier::default().classify(snapshot)
}

// =============================================================================
// Sub-scores
// =============================================================================

type Factor = Option<(f64, String)>;

fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    Some((values.iter().sum::<f64>() / values.len() as f64).clamp(-1.0, 1.0))
}

fn sign(x: f64) -> f64 {
    if x > 0.0 {
        1.0
    } else if x < 0.0 {
        -1.0
    } else {
        0.0
    }
}

fn trend_score(s: &IndicatorSnapshot) -> Factor {
    let mut parts = Vec::new();
    let mut why = Vec::new();

    match (s.ema20, s.ema50, s.ema200) {
        (Some(e20), Some(e50), Some(e200)) => match stack_alignment(e20, e50, e200) {
            Some((true, _)) => {
                parts.push(1.0);
                why.push("EMA20 > EMA50 > EMA200".to_string());
            }
            Some((false, _)) => {
                parts.push(-1.0);
                why.push("EMA20 < EMA50 < EMA200".to_string());
            }
            None => {
                parts.push(0.5 * sign(e20 - e50));
                why.push("EMAs mixed".to_string());
            }
        },
        (Some(e20), Some(e50), None) => {
            parts.push(0.5 * sign(e20 - e50));
            why.push(format!("EMA20 {} EMA50", if e20 >= e50 { ">=" } else { "<" }));
        }
        _ => {}
    }

    if let (Some(price), Some(e200)) = (s.current_price(), s.ema200.filter(|e| *e > 0.0)) {
        let distance = (price - e200) / e200;
        parts.push((distance * 10.0).clamp(-1.0, 1.0));
        why.push(format!("price {:+.1}% vs EMA200", distance * 100.0));
    }

    mean(&parts).map(|v| (v, why.join(", ")))
}

fn volatility_score(s: &IndicatorSnapshot) -> Factor {
    let bands = s.bollinger_bands?;
    let price = s.current_price()?;

    let mut expansion = Vec::new();
    if let Some(width) = bands.width_pct() {
        expansion.push((width / 10.0).clamp(0.0, 1.0));
    }
    if let Some(atr_pct) = s.atr_pct() {
        expansion.push((atr_pct / 4.0).clamp(0.0, 1.0));
    }
    let expansion = if expansion.is_empty() {
        return None;
    } else {
        expansion.iter().sum::<f64>() / expansion.len() as f64
    };

    let side = sign(price - bands.middle);
    let value = side * expansion;
    Some((
        value,
        format!(
            "price {} BB midline, expansion {:.2}",
            if side >= 0.0 { "above" } else { "below" },
            expansion
        ),
    ))
}

fn momentum_score(s: &IndicatorSnapshot) -> Factor {
    let mut parts = Vec::new();
    let mut why = Vec::new();

    if let Some(rsi) = s.rsi.filter(|r| r.is_finite()) {
        parts.push(((rsi - 50.0) / 30.0).clamp(-1.0, 1.0));
        why.push(format!("RSI {rsi:.1}"));
    }
    if let Some(macd) = s.macd {
        parts.push(sign(macd.histogram));
        why.push(format!("MACD hist {:+.4}", macd.histogram));
    }
    if let Some(stoch) = s.stochastic {
        let v = if stoch.k > 80.0 {
            1.0
        } else if stoch.k < 20.0 {
            -1.0
        } else {
            0.0
        };
        parts.push(v);
        why.push(format!("Stoch %K {:.1}", stoch.k));
    }

    mean(&parts).map(|v| (v, why.join(", ")))
}

fn structure_score(s: &IndicatorSnapshot, lookback: usize) -> Factor {
    let counts = price_structure(&s.candles, lookback)?;
    Some((
        counts.bias(),
        format!(
            "{} HH / {} HL vs {} LH / {} LL",
            counts.higher_highs, counts.higher_lows, counts.lower_highs, counts.lower_lows
        ),
    ))
}

fn directional_confidence(score: f64, threshold: f64) -> f64 {
    remap(
        score.abs(),
        threshold.abs(),
        1.0,
        MIN_REGIME_CONFIDENCE,
        MAX_REGIME_CONFIDENCE,
    )
}

/// Linearly remap `value` from `[in_lo, in_hi]` to `[out_lo, out_hi]`, clamped
/// to the output range. Works with `in_lo > in_hi` too.
fn remap(value: f64, in_lo: f64, in_hi: f64, out_lo: f64, out_hi: f64) -> f64 {
    let t = if (in_hi - in_lo).abs() < f64::EPSILON {
        0.5
    } else {
        (value - in_lo) / (in_hi - in_lo)
    };
    out_lo + t.clamp(0.0, 1.0) * (out_hi - out_lo)
}

// =============================================================================
// Unit Tests
// =============================================================================
#[cfg(test)]
mod tests {
    use super::*;
    use crate::indicators::bollinger::BollingerBands;
    use crate::indicators::macd::MacdReading;
    use crate::indicators::test_candle as candle;
    use crate::market_data::Candle;
    use proptest::prelude::*;

    fn staircase(n: usize, step: f64) -> Vec<Candle> {
        (0..n)
            .map(|i| {
                let b = 1000.0 + i as f64 * step;
                candle(b, b + 2.0, b - 2.0, b + step.signum(), 100.0)
            })
            .collect()
    }

    #[test]
    fn empty_snapshot_is_sideways_at_floor() {
        let c = classify(&IndicatorSnapshot::default());
        assert_eq!(c.regime, Regime::Sideways);
        assert!((c.confidence - MIN_REGIME_CONFIDENCE).abs() < 1e-12);
        assert_eq!(c.factors.coverage, 0.0);
        assert_eq!(c.reasons.len(), 4);
    }

    #[test]
    fn steady_uptrend_is_bull() {
        let snap = IndicatorSnapshot::from_candles(staircase(260, 3.0));
        let c = classify(&snap);
        assert_eq!(c.regime, Regime::Bull, "factors: {:?}", c.factors);
        assert!(c.confidence > MIN_REGIME_CONFIDENCE);
        assert!(c.factors.trend.unwrap() > 0.9);
    }

    #[test]
    fn steady_downtrend_is_bear() {
        let snap = IndicatorSnapshot::from_candles(staircase(260, -3.0));
        let c = classify(&snap);
        assert_eq!(c.regime, Regime::Bear, "factors: {:?}", c.factors);
        assert!(c.factors.structure.unwrap() < -0.9);
    }

    #[test]
    fn flat_market_is_sideways() {
        let candles = vec![candle(100.0, 101.0, 99.0, 100.0, 10.0); 260];
        let c = classify(&IndicatorSnapshot::from_candles(candles));
        assert_eq!(c.regime, Regime::Sideways);
    }

    #[test]
    fn rsi_only_snapshot_leans_on_momentum() {
        let snap = IndicatorSnapshot {
            price: Some(100.0),
            rsi: Some(25.0),
            ..IndicatorSnapshot::default()
        };
        let c = classify(&snap);
        // momentum = -0.83, weighted 0.30 => -0.25 which crosses -0.2.
        assert_eq!(c.regime, Regime::Bear);
        assert!((c.factors.coverage - 0.30).abs() < 1e-12);
        assert!(c.confidence < 0.65);
    }

    #[test]
    fn partial_momentum_factors() {
        let snap = IndicatorSnapshot {
            price: Some(100.0),
            rsi: Some(50.0),
            macd: Some(MacdReading {
                value: 1.0,
                signal: 0.5,
                histogram: 0.5,
            }),
            bollinger_bands: Some(BollingerBands {
                upper: 104.0,
                middle: 99.0,
                lower: 94.0,
            }),
            ..IndicatorSnapshot::default()
        };
        let c = classify(&snap);
        assert!((c.factors.momentum.unwrap() - 0.5).abs() < 1e-12);
        assert!(c.factors.volatility.unwrap() > 0.0);
        assert!(c.factors.trend.is_none());
    }

    #[test]
    fn fixed_classification_is_clamped() {
        assert_eq!(RegimeClassification::fixed(Regime::Bull, 1.0).confidence, 0.95);
        assert_eq!(RegimeClassification::fixed(Regime::Bear, 0.1).confidence, 0.60);
        assert_eq!(RegimeClassification::fixed(Regime::Sideways, 0.7).confidence, 0.7);
        assert_eq!(
            RegimeClassification::fixed(Regime::Sideways, f64::NAN).confidence,
            0.60
        );
    }

    #[test]
    fn params_validation() {
        assert!(RegimeParams::default().validate().is_ok());

        let mut p = RegimeParams::default();
        p.weights.trend = 0.5;
        assert!(p.validate().is_err());

        let mut p = RegimeParams::default();
        p.bull_threshold = -0.1;
        assert!(p.validate().is_err());

        let mut p = RegimeParams::default();
        p.structure_lookback = 1;
        assert!(p.validate().is_err());
    }

    #[test]
    fn test_remap() {
        assert!((remap(0.5, 0.0, 1.0, 0.0, 10.0) - 5.0).abs() < 1e-10);
        assert!((remap(2.0, 0.0, 1.0, 0.0, 10.0) - 10.0).abs() < 1e-10);
        assert!((remap(-1.0, 0.0, 1.0, 0.0, 10.0) - 0.0).abs() < 1e-10);
    }

    proptest! {
        #[test]
        fn confidence_always_in_band(
            rsi in proptest::option::of(0.0f64..100.0),
            hist in proptest::option::of(-5.0f64..5.0),
            e20 in proptest::option::of(50.0f64..150.0),
            e50 in proptest::option::of(50.0f64..150.0),
            e200 in proptest::option::of(50.0f64..150.0),
            price in proptest::option::of(1.0f64..300.0),
            steps in proptest::collection::vec(-5.0f64..5.0, 0..40),
        ) {
            let mut level = 100.0;
            let candles: Vec<Candle> = steps
                .iter()
                .map(|d| {
                    level = (level + d).max(1.0);
                    candle(level, level + 1.0, level - 0.5, level, 10.0)
                })
                .collect();
            let snap = IndicatorSnapshot {
                candles,
                price,
                rsi,
                macd: hist.map(|h| MacdReading { value: h, signal: 0.0, histogram: h }),
                ema20: e20,
                ema50: e50,
                ema200: e200,
                ..IndicatorSnapshot::default()
            };
            let c = classify(&snap);
            prop_assert!(c.confidence >= MIN_REGIME_CONFIDENCE);
            prop_assert!(c.confidence <= MAX_REGIME_CONFIDENCE);
            prop_assert!(matches!(c.regime, Regime::Bull | Regime::Bear | Regime::Sideways));
        }
    }
}
