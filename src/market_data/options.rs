use serde::{Deserialize, Serialize};

use crate::types::Direction;

/// Options-flow figures; only provided for the handful of assets with a
/// liquid options market.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct OptionsSnapshot {
    pub put_call_ratio: Option<f64>,
    /// Annualised implied volatility in percent.
    pub implied_volatility: Option<f64>,
    /// Rank of the current IV within its one-year range, 0-100.
    pub iv_percentile: Option<f64>,
    pub unusual_call_activity: bool,
    pub unusual_put_activity: bool,
    /// Net direction of block-sized institutional trades.
    pub institutional_flow: Option<Direction>,
}
