// =============================================================================
// Runtime Configuration - engine settings with atomic save
// =============================================================================
//
// Every tunable of the consensus engine lives here: where to listen, how
// many asset pipelines may run at once, regime classifier parameters,
// aggregation thresholds and the regime-weight overrides.
//
// `aurora-consensus write-config <path>` persists the effective settings
// using an atomic tmp + rename pattern. All fields carry serde
// defaults so that adding new fields never breaks loading an older file.
// The weight table is built from this once at start and never mutated.
//
// =============================================================================

use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::errors::{ConsensusError, ConsensusResult};
use crate::regime::RegimeParams;
use crate::signals::{ConsensusParams, RegimeWeightOverrides};

/// Environment variable naming the config file.
pub const CONFIG_PATH_ENV: &str = "AURORA_CONFIG";
pub const DEFAULT_CONFIG_PATH: &str = "consensus_config.json";

// =============================================================================
// Default-value helpers (required by serde `default = "..."` attribute)
// =============================================================================

fn default_true() -> bool {
    true
}

fn default_listen_addr() -> String {
    "0.0.0.0:3001".to_string()
}

fn default_max_parallel_assets() -> usize {
    8
}

fn default_history_capacity() -> usize {
    100
}

// =============================================================================
// RuntimeConfig
// =============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RuntimeConfig {
    // --- Serving -------------------------------------------------------------

    /// Address the HTTP API binds to.
    #[serde(default = "default_listen_addr")]
    pub listen_addr: String,

    // --- Engine --------------------------------------------------------------

    /// Upper bound on asset pipelines evaluated concurrently in a batch.
    #[serde(default = "default_max_parallel_assets")]
    pub max_parallel_assets: usize,

    /// Evaluations kept in the recent-history ring.
    #[serde(default = "default_history_capacity")]
    pub history_capacity: usize,

    /// Start from the built-in regime weight table. When false only
    /// `regime_weights` applies and every other bot weighs 1.0.
    #[serde(default = "default_true")]
    pub use_builtin_weights: bool,

    #[serde(default)]
    pub regime: RegimeParams,

    #[serde(default)]
    pub consensus: ConsensusParams,

    /// `{"BULL": {"ema_cross": 1.3}, ...}` merged over the built-in table.
    #[serde(default)]
    pub regime_weights: RegimeWeightOverrides,

    /// Bots removed from the panel.
    #[serde(default)]
    pub disabled_bots: Vec<String>,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            listen_addr: default_listen_addr(),
            max_parallel_assets: default_max_parallel_assets(),
            history_capacity: default_history_capacity(),
            use_builtin_weights: true,
            regime: RegimeParams::default(),
            consensus: ConsensusParams::default(),
            regime_weights: RegimeWeightOverrides::new(),
            disabled_bots: Vec::new(),
        }
    }
}

impl RuntimeConfig {
    /// Load configuration from a JSON file at `path`.
    ///
    /// If the file does not exist, returns an error so the caller can fall
    /// back to defaults with a warning.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();

        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read runtime config from {}", path.display()))?;

        let config: Self = serde_json::from_str(&content)
            .with_context(|| format!("failed to parse runtime config from {}", path.display()))?;

        config
            .validate()
            .with_context(|| format!("invalid runtime config in {}", path.display()))?;

        info!(
            path = %path.display(),
            disabled_bots = config.disabled_bots.len(),
            "runtime config loaded"
        );

        Ok(config)
    }

    /// Persist the current configuration to `path` using an atomic write
    /// (write to `.tmp`, then rename).
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();

        let content = serde_json::to_string_pretty(self)
            .context("failed to serialise runtime config to JSON")?;

        let tmp_path = path.with_extension("json.tmp");

        std::fs::write(&tmp_path, &content)
            .with_context(|| format!("failed to write tmp config to {}", tmp_path.display()))?;

        std::fs::rename(&tmp_path, path)
            .with_context(|| format!("failed to rename tmp config to {}", path.display()))?;

        info!(path = %path.display(), "runtime config saved (atomic)");
        Ok(())
    }

    /// Apply `AURORA_LISTEN_ADDR` / `AURORA_MAX_PARALLEL` from the
    /// environment.
    pub fn apply_env_overrides(&mut self) {
        self.apply_overrides(
            std::env::var("AURORA_LISTEN_ADDR").ok(),
            std::env::var("AURORA_MAX_PARALLEL").ok(),
        );
    }

    fn apply_overrides(&mut self, listen_addr: Option<String>, max_parallel: Option<String>) {
        if let Some(addr) = listen_addr.filter(|a| !a.trim().is_empty()) {
            self.listen_addr = addr.trim().to_string();
        }
        match max_parallel.as_deref().map(str::trim) {
            None | Some("") => {}
            Some(raw) => match raw.parse::<usize>() {
                Ok(n) if n > 0 => self.max_parallel_assets = n,
                _ => warn!(value = raw, "ignoring invalid AURORA_MAX_PARALLEL"),
            },
        }
    }

    pub fn validate(&self) -> ConsensusResult<()> {
        if self.max_parallel_assets == 0 {
            return Err(ConsensusError::Config("max_parallel_assets must be at least 1".into()));
        }
        if self.history_capacity == 0 {
            return Err(ConsensusError::Config("history_capacity must be at least 1".into()));
        }
        self.regime.validate()?;
        self.consensus.validate()?;
        Ok(())
    }
}
