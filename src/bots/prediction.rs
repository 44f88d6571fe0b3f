use serde::{Deserialize, Serialize};

use super::Setup;
use crate::types::Direction;

/// A single bot's call on one asset.
///
/// Only constructed through [`BotPrediction::new`] / [`BotPrediction::from_setup`],
/// which guarantee: confidence in [0, 1]; entry, target and stop finite and
/// positive; target beyond the entry and stop behind it in the direction of
/// the trade.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BotPrediction {
    pub bot_name: String,
    pub direction: Direction,
    pub confidence: f64,
    pub entry: f64,
    pub take_profit: f64,
    pub stop_loss: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub leverage: Option<u32>,
}

impl BotPrediction {
    pub fn new(
        bot_name: impl Into<String>,
        direction: Direction,
        confidence: f64,
        entry: f64,
        take_profit: f64,
        stop_loss: f64,
    ) -> Option<Self> {
        if !confidence.is_finite() {
            return None;
        }
        let valid_price = |p: f64| p.is_finite() && p > 0.0;
        if !(valid_price(entry) && valid_price(take_profit) && valid_price(stop_loss)) {
            return None;
        }
        let s = direction.sign();
        if (take_profit - entry) * s <= 0.0 || (entry - stop_loss) * s <= 0.0 {
            return None;
        }

        Some(Self {
            bot_name: bot_name.into(),
            direction,
            confidence: confidence.clamp(0.0, 1.0),
            entry,
            take_profit,
            stop_loss,
            leverage: None,
        })
    }

    pub fn from_setup(bot_name: &str, setup: Setup) -> Option<Self> {
        let mut p = Self::new(
            bot_name,
            setup.direction,
            setup.confidence,
            setup.entry,
            setup.take_profit,
            setup.stop_loss,
        )?;
        p.leverage = setup.leverage.filter(|l| *l > 0);
        Some(p)
    }
}
