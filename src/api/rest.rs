// =============================================================================
// REST API Endpoints - Axum 0.7
// =============================================================================
//
// All endpoints live under `/api/v1/`. Evaluation endpoints take the asset's
// snapshots in the request body, run the pipeline, store the result and
// return the stored record. Read endpoints serve the store and the frozen
// engine configuration.
//
// CORS is configured permissively; the API carries no credentials.
// =============================================================================

use std::sync::Arc;

use axum::{
    extract::{Json, Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
    Router,
};
use serde::{Deserialize, Serialize};
use tower_http::cors::{Any, CorsLayer};
use tracing::{info, warn};

use crate::app_state::AppState;
use crate::engine::AssetInput;
use crate::market_data::IndicatorSnapshot;
use crate::regime::RegimeClassification;
use crate::signals::DEFAULT_WEIGHT;
use crate::types::Regime;

type ApiError = (StatusCode, Json<serde_json::Value>);

fn api_error(status: StatusCode, message: impl Into<String>) -> ApiError {
    (status, Json(serde_json::json!({ "error": message.into() })))
}

// =============================================================================
// Router construction
// =============================================================================

/// Build the full REST API router with CORS middleware and shared state.
pub fn router(state: Arc<AppState>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/api/v1/health", get(health))
        // ── Evaluation ──────────────────────────────────────────────
        .route("/api/v1/evaluate", post(evaluate))
        .route("/api/v1/evaluate/batch", post(evaluate_batch))
        .route("/api/v1/regime", post(classify_regime))
        // ── Store ───────────────────────────────────────────────────
        .route("/api/v1/recommendations", get(recommendations))
        .route("/api/v1/recommendations/:asset", get(recommendation_for))
        .route("/api/v1/history", get(history))
        // ── Engine configuration ────────────────────────────────────
        .route("/api/v1/bots", get(bots))
        .route("/api/v1/regime-weights", get(regime_weights))
        // ── Middleware & State ───────────────────────────────────────
        .layer(cors)
        .with_state(state)
}

// =============================================================================
// Health
// =============================================================================

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct HealthResponse {
    status: &'static str,
    state_version: u64,
    server_time: i64,
    uptime_secs: u64,
    bots: usize,
    tracked_assets: usize,
}

async fn health(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    Json(HealthResponse {
        status: "ok",
        state_version: state.current_state_version(),
        server_time: chrono::Utc::now().timestamp_millis(),
        uptime_secs: state.uptime_secs(),
        bots: state.engine.panel().len(),
        tracked_assets: state.tracked_assets(),
    })
}

// =============================================================================
// Evaluation
// =============================================================================

/// Externally supplied regime; replaces the classifier for this request.
#[derive(Debug, Deserialize)]
struct RegimeOverride {
    regime: Regime,
    confidence: f64,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct EvaluateRequest {
    #[serde(flatten)]
    input: AssetInput,
    #[serde(default)]
    regime_override: Option<RegimeOverride>,
}

async fn evaluate(
    State(state): State<Arc<AppState>>,
    Json(req): Json<EvaluateRequest>,
) -> Result<impl IntoResponse, ApiError> {
    req.input
        .validate()
        .map_err(|e| api_error(StatusCode::BAD_REQUEST, e.to_string()))?;

    let engine = Arc::clone(&state.engine);
    let evaluation = tokio::task::spawn_blocking(move || match req.regime_override {
        Some(o) => {
            let regime = RegimeClassification::fixed(o.regime, o.confidence);
            engine.evaluate_under_regime(&req.input, regime)
        }
        None => engine.evaluate_detailed(&req.input),
    })
    .await
    .map_err(|e| {
        warn!(error = %e, "evaluation task failed");
        api_error(StatusCode::INTERNAL_SERVER_ERROR, "evaluation failed")
    })?;

    Ok(Json(state.record(evaluation)))
}

#[derive(Debug, Deserialize)]
struct BatchRequest {
    assets: Vec<AssetInput>,
}

async fn evaluate_batch(
    State(state): State<Arc<AppState>>,
    Json(req): Json<BatchRequest>,
) -> Result<impl IntoResponse, ApiError> {
    for input in &req.assets {
        input
            .validate()
            .map_err(|e| api_error(StatusCode::BAD_REQUEST, e.to_string()))?;
    }

    let count = req.assets.len();
    let evaluations = state
        .engine
        .evaluate_batch(req.assets, state.runtime_config.max_parallel_assets)
        .await;

    let records: Vec<_> = evaluations.into_iter().map(|e| state.record(e)).collect();
    let emitted = records
        .iter()
        .filter(|r| r.evaluation.recommendation().is_some())
        .count();
    info!(requested = count, evaluated = records.len(), emitted, "batch evaluated");

    Ok(Json(records))
}

async fn classify_regime(
    State(state): State<Arc<AppState>>,
    Json(snapshot): Json<IndicatorSnapshot>,
) -> impl IntoResponse {
    Json(state.engine.classifier().classify(&snapshot))
}

// =============================================================================
// Store
// =============================================================================

async fn recommendations(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    Json(state.recommendations())
}

async fn recommendation_for(
    State(state): State<Arc<AppState>>,
    Path(asset): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    if asset.trim().is_empty() {
        return Err(api_error(StatusCode::BAD_REQUEST, "asset must not be empty"));
    }
    state
        .latest(&asset)
        .map(Json)
        .ok_or_else(|| api_error(StatusCode::NOT_FOUND, format!("no evaluation for {asset}")))
}

#[derive(Debug, Deserialize)]
struct HistoryQuery {
    #[serde(default = "default_history_limit")]
    limit: usize,
}

fn default_history_limit() -> usize {
    20
}

async fn history(
    State(state): State<Arc<AppState>>,
    Query(q): Query<HistoryQuery>,
) -> impl IntoResponse {
    Json(state.recent(q.limit))
}

// =============================================================================
// Engine configuration
// =============================================================================

async fn bots(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let panel = state.engine.panel();
    Json(serde_json::json!({
        "count": panel.len(),
        "bots": panel.descriptors(),
    }))
}

async fn regime_weights(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    Json(serde_json::json!({
        "defaultWeight": DEFAULT_WEIGHT,
        "weights": state.engine.weights().entries(),
    }))
}
