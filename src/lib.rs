// =============================================================================
// Aurora Consensus - library root
// =============================================================================
//
// Multi-bot consensus engine. For each asset: classify the market regime,
// run the bot panel, scale every vote by its regime weight and aggregate the
// weighted votes into a single recommendation or an explicit refusal.
// =============================================================================

pub mod api;
pub mod app_state;
pub mod bots;
pub mod derivatives;
pub mod engine;
pub mod errors;
pub mod indicators;
pub mod market_data;
pub mod regime;
pub mod runtime_config;
pub mod signals;
pub mod types;

pub use engine::{AssetInput, ConsensusEngine, Evaluation};
pub use errors::{ConsensusError, ConsensusResult};
