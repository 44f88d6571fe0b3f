// =============================================================================
// Central Application State - recommendation store
// =============================================================================
//
// Holds the frozen engine and the results it produced: the latest evaluation
// per asset (superseded by the next one) and a bounded ring of recent
// evaluations for the audit view.
//
// Thread safety:
//   - Atomic counter for lock-free version tracking.
//   - parking_lot::RwLock for the mutable collections.
//   - The engine itself is immutable and shared through an Arc.
// =============================================================================

use std::collections::{BTreeMap, VecDeque};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use serde::Serialize;
use uuid::Uuid;

use crate::engine::{ConsensusEngine, Evaluation};
use crate::errors::ConsensusResult;
use crate::runtime_config::RuntimeConfig;

// =============================================================================
// Recommendation Record
// =============================================================================

/// A stored evaluation. The id and timestamp live here, outside the
/// evaluation, so the evaluation itself stays a pure function of its inputs.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RecommendationRecord {
    pub id: Uuid,
    pub created_at: DateTime<Utc>,
    pub evaluation: Evaluation,
}

// =============================================================================
// AppState
// =============================================================================

/// Shared across all request handlers via `Arc<AppState>`.
pub struct AppState {
    // ── Version tracking ────────────────────────────────────────────────
    /// Incremented on every stored evaluation.
    pub state_version: AtomicU64,

    // ── Configuration ───────────────────────────────────────────────────
    pub runtime_config: RuntimeConfig,

    // ── Engine ──────────────────────────────────────────────────────────
    pub engine: Arc<ConsensusEngine>,

    // ── Results ─────────────────────────────────────────────────────────
    latest: RwLock<BTreeMap<String, RecommendationRecord>>,
    recent: RwLock<VecDeque<RecommendationRecord>>,

    // ── Timing ──────────────────────────────────────────────────────────
    pub start_time: std::time::Instant,
}

/// Key under which an asset's latest record is kept.
fn asset_key(asset: &str) -> String {
    asset.trim().to_uppercase()
}

impl AppState {
    /// Build the engine from `config` and start with an empty store.
    pub fn new(config: RuntimeConfig) -> ConsensusResult<Self> {
        let engine = ConsensusEngine::from_config(&config)?;
        Ok(Self::with_engine(config, engine))
    }

    pub fn with_engine(config: RuntimeConfig, engine: ConsensusEngine) -> Self {
        let capacity = config.history_capacity.max(1);
        Self {
            state_version: AtomicU64::new(0),
            runtime_config: config,
            engine: Arc::new(engine),
            latest: RwLock::new(BTreeMap::new()),
            recent: RwLock::new(VecDeque::with_capacity(capacity)),
            start_time: std::time::Instant::now(),
        }
    }

    // ── Version Management ──────────────────────────────────────────────

    pub fn increment_version(&self) -> u64 {
        self.state_version.fetch_add(1, Ordering::SeqCst)
    }

    pub fn current_state_version(&self) -> u64 {
        self.state_version.load(Ordering::SeqCst)
    }

    // ── Store ───────────────────────────────────────────────────────────

    /// Store an evaluation as the asset's latest and append it to the
    /// recent ring, evicting the oldest entry beyond capacity.
    pub fn record(&self, evaluation: Evaluation) -> RecommendationRecord {
        let record = RecommendationRecord {
            id: Uuid::new_v4(),
            created_at: Utc::now(),
            evaluation,
        };

        self.latest
            .write()
            .insert(asset_key(&record.evaluation.asset), record.clone());

        {
            let capacity = self.runtime_config.history_capacity.max(1);
            let mut recent = self.recent.write();
            recent.push_back(record.clone());
            while recent.len() > capacity {
                recent.pop_front();
            }
        }

        self.increment_version();
        record
    }

    /// Latest record for `asset`, whether or not it produced a
    /// recommendation.
    pub fn latest(&self, asset: &str) -> Option<RecommendationRecord> {
        self.latest.read().get(&asset_key(asset)).cloned()
    }

    /// Latest records that carry a recommendation, ordered by asset.
    pub fn recommendations(&self) -> Vec<RecommendationRecord> {
        self.latest
            .read()
            .values()
            .filter(|r| r.evaluation.recommendation().is_some())
            .cloned()
            .collect()
    }

    /// Up to `limit` most recent records, newest first.
    pub fn recent(&self, limit: usize) -> Vec<RecommendationRecord> {
        self.recent.read().iter().rev().take(limit).cloned().collect()
    }

    pub fn tracked_assets(&self) -> usize {
        self.latest.read().len()
    }

    pub fn uptime_secs(&self) -> u64 {
        self.start_time.elapsed().as_secs()
    }
}
