use thiserror::Error;

/// Typed error hierarchy for the consensus engine.
///
/// Abstentions and missing consensus are ordinary outcomes and never show up
/// here. These variants cover invalid configuration and malformed requests;
/// process-level code wraps them with `anyhow::Context`.
#[derive(Error, Debug)]
pub enum ConsensusError {
    // -- Configuration ------------------------------------------------------
    #[error("configuration error: {0}")]
    Config(String),

    #[error("regime weight for bot '{bot}' in {regime} must be finite and >= 0, got {value}")]
    InvalidRegimeWeight {
        regime: String,
        bot: String,
        value: f64,
    },

    // -- Input --------------------------------------------------------------
    #[error("invalid input: {0}")]
    InvalidInput(String),
}

pub type ConsensusResult<T> = Result<T, ConsensusError>;
