// =============================================================================
// Bot Panel
// =============================================================================
//
// A fixed roster of independent, stateless predictor units. Every bot is a
// plain function over the same immutable inputs:
//
//   (indicators, derivatives, coin, options?) -> Setup | abstain
//
// The panel stamps each setup with the bot's name and validates it into a
// `BotPrediction`. Validation is where the invariants live: confidence is
// clamped into [0, 1], prices must be finite and positive, and the target /
// stop must sit on the correct side of the entry for the direction. A setup
// that fails validation counts as an abstention.
// =============================================================================

pub mod derivatives;
pub mod fallback;
pub mod options;
pub mod oscillator;
pub mod pattern;
pub mod prediction;
pub mod trend;
pub mod volatility;
pub mod volume;

use serde::Serialize;
use tracing::trace;

use crate::derivatives::DerivativesSnapshot;
use crate::market_data::{CoinState, IndicatorSnapshot, OptionsSnapshot};
use crate::types::{BotCategory, Direction};

pub use prediction::BotPrediction;

// =============================================================================
// Inputs / outputs
// =============================================================================

/// Everything a bot may look at. Borrowed, never mutated.
#[derive(Debug, Clone, Copy)]
pub struct BotInputs<'a> {
    pub indicators: &'a IndicatorSnapshot,
    pub derivatives: &'a DerivativesSnapshot,
    pub coin: &'a CoinState,
    pub options: Option<&'a OptionsSnapshot>,
}

impl<'a> BotInputs<'a> {
    /// Current price: snapshot first, then the coin ticker.
    pub fn price(&self) -> Option<f64> {
        self.indicators.current_price().or_else(|| {
            self.coin
                .price
                .filter(|p| p.is_finite() && *p > 0.0)
        })
    }

    /// Price change used wherever a bot needs "recent move": 24h change when
    /// known, else the 14-bar ROC.
    pub fn recent_change_pct(&self) -> Option<f64> {
        self.coin.change_24h_pct.or(self.indicators.roc)
    }
}

/// Raw output of a bot before the panel names and validates it.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Setup {
    pub direction: Direction,
    pub confidence: f64,
    pub entry: f64,
    pub take_profit: f64,
    pub stop_loss: f64,
    pub leverage: Option<u32>,
}

impl Setup {
    /// Target and stop as percentage distances from the entry.
    pub fn at_pct(direction: Direction, confidence: f64, entry: f64, tp_pct: f64, sl_pct: f64) -> Self {
        let s = direction.sign();
        Self::at_levels(
            direction,
            confidence,
            entry,
            entry * (1.0 + s * tp_pct / 100.0),
            entry * (1.0 - s * sl_pct / 100.0),
        )
    }

    /// Target and stop as ATR multiples from the entry.
    pub fn at_atr(
        direction: Direction,
        confidence: f64,
        entry: f64,
        atr: f64,
        tp_mult: f64,
        sl_mult: f64,
    ) -> Self {
        let s = direction.sign();
        Self::at_levels(
            direction,
            confidence,
            entry,
            entry + s * atr * tp_mult,
            entry - s * atr * sl_mult,
        )
    }

    /// ATR multiples when the snapshot has a usable ATR, otherwise the
    /// percentage fallback.
    pub fn at_atr_or_pct(
        direction: Direction,
        confidence: f64,
        entry: f64,
        atr: Option<f64>,
        (tp_mult, sl_mult): (f64, f64),
        (tp_pct, sl_pct): (f64, f64),
    ) -> Self {
        match atr.filter(|a| a.is_finite() && *a > 0.0) {
            Some(atr) => Self::at_atr(direction, confidence, entry, atr, tp_mult, sl_mult),
            None => Self::at_pct(direction, confidence, entry, tp_pct, sl_pct),
        }
    }

    /// Explicit target and stop prices.
    pub fn at_levels(direction: Direction, confidence: f64, entry: f64, take_profit: f64, stop_loss: f64) -> Self {
        Self {
            direction,
            confidence,
            entry,
            take_profit,
            stop_loss,
            leverage: None,
        }
    }

    pub fn with_leverage(mut self, leverage: u32) -> Self {
        self.leverage = Some(leverage);
        self
    }
}

/// Capability every bot implements.
pub type BotFn = fn(&BotInputs<'_>) -> Option<Setup>;

/// A registered bot.
#[derive(Clone, Copy)]
pub struct BotSpec {
    pub name: &'static str,
    pub category: BotCategory,
    pub run: BotFn,
}

impl std::fmt::Debug for BotSpec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BotSpec")
            .field("name", &self.name)
            .field("category", &self.category)
            .finish()
    }
}

/// Roster listing entry for the API.
#[derive(Debug, Clone, Serialize)]
pub struct BotDescriptor {
    pub name: &'static str,
    pub category: BotCategory,
}

// =============================================================================
// Panel
// =============================================================================

/// Ordered collection of bots run against one asset at a time.
#[derive(Debug, Clone)]
pub struct BotPanel {
    bots: Vec<BotSpec>,
}

impl BotPanel {
    /// The full standard roster.
    pub fn standard() -> Self {
        let bots = [
            trend::BOTS,
            oscillator::BOTS,
            volatility::BOTS,
            volume::BOTS,
            pattern::BOTS,
            derivatives::BOTS,
            options::BOTS,
            fallback::BOTS,
        ]
        .concat();
        Self { bots }
    }

    pub fn from_specs(bots: Vec<BotSpec>) -> Self {
        Self { bots }
    }

    /// Drop the named bots from the roster. Unknown names are ignored.
    pub fn without(mut self, disabled: &[String]) -> Self {
        self.bots
            .retain(|b| !disabled.iter().any(|name| name == b.name));
        self
    }

    pub fn len(&self) -> usize {
        self.bots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bots.is_empty()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.bots.iter().any(|b| b.name == name)
    }

    pub fn descriptors(&self) -> Vec<BotDescriptor> {
        self.bots
            .iter()
            .map(|b| BotDescriptor {
                name: b.name,
                category: b.category,
            })
            .collect()
    }

    /// Run every bot and keep the valid predictions, in roster order.
    pub fn run(&self, inputs: &BotInputs<'_>) -> Vec<BotPrediction> {
        self.bots
            .iter()
            .filter_map(|bot| {
                let prediction = (bot.run)(inputs)
                    .and_then(|setup| BotPrediction::from_setup(bot.name, setup));
                if let Some(p) = &prediction {
                    trace!(
                        bot = bot.name,
                        category = %bot.category,
                        direction = %p.direction,
                        confidence = format!("{:.3}", p.confidence),
                        "bot fired"
                    );
                }
                prediction
            })
            .collect()
    }
}

impl Default for BotPanel {
    fn default() -> Self {
        Self::standard()
    }
}

// =============================================================================
// Helpers shared by the bot modules
// =============================================================================

/// Direction of a signed quantity; `None` at exactly zero.
pub(crate) fn direction_of(x: f64) -> Option<Direction> {
    if x > 0.0 {
        Some(Direction::Long)
    } else if x < 0.0 {
        Some(Direction::Short)
    } else {
        None
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::*;
    use crate::market_data::Candle;

    /// Owned bundle of bot inputs for tests.
    #[derive(Debug, Clone, Default)]
    pub struct Fixture {
        pub indicators: IndicatorSnapshot,
        pub derivatives: DerivativesSnapshot,
        pub coin: CoinState,
        pub options: Option<OptionsSnapshot>,
    }

    impl Fixture {
        pub fn priced(price: f64) -> Self {
            Self {
                indicators: IndicatorSnapshot {
                    price: Some(price),
                    ..IndicatorSnapshot::default()
                },
                ..Self::default()
            }
        }

        pub fn inputs(&self) -> BotInputs<'_> {
            BotInputs {
                indicators: &self.indicators,
                derivatives: &self.derivatives,
                coin: &self.coin,
                options: self.options.as_ref(),
            }
        }
    }

    pub fn candle(open: f64, high: f64, low: f64, close: f64, volume: f64) -> Candle {
        Candle {
            time: 0,
            open,
            high,
            low,
            close,
            volume,
        }
    }
}
