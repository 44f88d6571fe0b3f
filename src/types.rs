// =============================================================================
// Shared types used across the Aurora consensus engine
// =============================================================================
//
// The literal labels ("LONG"/"SHORT", "BULL"/"BEAR"/"SIDEWAYS") are consumed
// verbatim by the dashboard, so serde and Display must agree on them.

use serde::{Deserialize, Serialize};

/// Trade direction proposed by a bot or by the consensus.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Direction {
    Long,
    Short,
}

impl Direction {
    /// +1.0 for LONG, -1.0 for SHORT. Used when projecting price levels.
    pub fn sign(self) -> f64 {
        match self {
            Self::Long => 1.0,
            Self::Short => -1.0,
        }
    }

    pub fn opposite(self) -> Self {
        match self {
            Self::Long => Self::Short,
            Self::Short => Self::Long,
        }
    }
}

impl std::fmt::Display for Direction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Long => write!(f, "LONG"),
            Self::Short => write!(f, "SHORT"),
        }
    }
}

/// Coarse market condition label.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Regime {
    Bull,
    Bear,
    Sideways,
}

impl Regime {
    pub const ALL: [Regime; 3] = [Regime::Bull, Regime::Bear, Regime::Sideways];
}

impl Default for Regime {
    fn default() -> Self {
        Self::Sideways
    }
}

impl std::fmt::Display for Regime {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Bull => write!(f, "BULL"),
            Self::Bear => write!(f, "BEAR"),
            Self::Sideways => write!(f, "SIDEWAYS"),
        }
    }
}

/// Family a bot belongs to. Only used for the roster listing and logs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BotCategory {
    Trend,
    Oscillator,
    Volatility,
    Volume,
    Pattern,
    Derivatives,
    Options,
    Fallback,
}

impl std::fmt::Display for BotCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            Self::Trend => "trend",
            Self::Oscillator => "oscillator",
            Self::Volatility => "volatility",
            Self::Volume => "volume",
            Self::Pattern => "pattern",
            Self::Derivatives => "derivatives",
            Self::Options => "options",
            Self::Fallback => "fallback",
        };
        write!(f, "{label}")
    }
}
