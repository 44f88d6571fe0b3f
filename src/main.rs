// =============================================================================
// Aurora Consensus - Main Entry Point
// =============================================================================
//
// Modes:
//   aurora-consensus                        serve the REST API
//   aurora-consensus evaluate <file>        evaluate a JSON file of asset
//                                           inputs (one object or an array)
//                                           and print the results to stdout
//   aurora-consensus write-config <file>    save the effective configuration
//                                           (file + env overrides)
// =============================================================================

use std::sync::Arc;

use anyhow::{bail, Context};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use aurora_consensus::api;
use aurora_consensus::app_state::AppState;
use aurora_consensus::engine::{AssetInput, ConsensusEngine};
use aurora_consensus::runtime_config::{RuntimeConfig, CONFIG_PATH_ENV, DEFAULT_CONFIG_PATH};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // ── 1. Environment & config ──────────────────────────────────────────
    let _ = dotenv::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let config_path =
        std::env::var(CONFIG_PATH_ENV).unwrap_or_else(|_| DEFAULT_CONFIG_PATH.to_string());

    let mut config = RuntimeConfig::load(&config_path).unwrap_or_else(|e| {
        warn!(error = %e, "failed to load config, using defaults");
        RuntimeConfig::default()
    });
    config.apply_env_overrides();
    config.validate().context("invalid configuration after env overrides")?;

    // ── 2. One-shot commands ─────────────────────────────────────────────
    let args: Vec<String> = std::env::args().skip(1).collect();
    match args.as_slice() {
        [] => {}
        [cmd, path] if cmd == "evaluate" => return evaluate_file(&config, path).await,
        [cmd, path] if cmd == "write-config" => return config.save(path),
        _ => bail!("usage: aurora-consensus [evaluate <inputs.json> | write-config <config.json>]"),
    }

    // ── 3. Build shared state ────────────────────────────────────────────
    let state = Arc::new(AppState::new(config).context("failed to build consensus engine")?);

    info!(
        bots = state.engine.panel().len(),
        max_parallel = state.runtime_config.max_parallel_assets,
        min_agreement = state.runtime_config.consensus.min_agreement,
        "consensus engine ready"
    );

    // ── 4. Serve the API ─────────────────────────────────────────────────
    let bind_addr = state.runtime_config.listen_addr.clone();
    let app = api::router(Arc::clone(&state));
    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .with_context(|| format!("failed to bind API server on {bind_addr}"))?;
    info!(addr = %bind_addr, "API server listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
            warn!("shutdown signal received, stopping gracefully");
        })
        .await
        .context("API server failed")?;

    info!(
        evaluations = state.current_state_version(),
        uptime_secs = state.uptime_secs(),
        "Aurora Consensus shut down complete"
    );
    Ok(())
}

/// Evaluate every input in `path` and print the evaluations as pretty JSON.
async fn evaluate_file(config: &RuntimeConfig, path: &str) -> anyhow::Result<()> {
    let content =
        std::fs::read_to_string(path).with_context(|| format!("failed to read {path}"))?;

    let value: serde_json::Value =
        serde_json::from_str(&content).with_context(|| format!("failed to parse {path}"))?;
    let inputs: Vec<AssetInput> = if value.is_array() {
        serde_json::from_value(value)
    } else {
        serde_json::from_value(value).map(|one| vec![one])
    }
    .with_context(|| format!("{path} does not hold asset inputs"))?;

    for input in &inputs {
        input.validate()?;
    }

    let engine = Arc::new(ConsensusEngine::from_config(config)?);
    let evaluations = engine
        .evaluate_batch(inputs, config.max_parallel_assets)
        .await;

    println!("{}", serde_json::to_string_pretty(&evaluations)?);
    Ok(())
}
