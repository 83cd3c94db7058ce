mod cli;
mod handlers;
mod interceptor;

use std::path::Path;
use std::sync::Arc;

use serde::Serialize;
use tokio_util::task::TaskTracker;
use tracing_subscriber::EnvFilter;
use webbridge_common::BridgeError;
use webbridge_config::BridgeConfig;
use webbridge_core::scripted::{EngineCall, ScriptedEngine};
use webbridge_core::{
    EngineStateSnapshot, Headers, InMemoryCookieManager, JsBridge, Navigator, WebContent,
    WebSession,
};

#[derive(Serialize)]
struct Report<'a> {
    session: String,
    bridge: &'a str,
    calls: Vec<EngineCall>,
    state: &'a EngineStateSnapshot,
}

/// Resolve the config before logging exists; problems are returned so they
/// can be logged once the subscriber is installed.
fn load_config(args: &cli::Args) -> (BridgeConfig, Vec<String>) {
    let mut notes = Vec::new();
    let loaded = match &args.config {
        Some(path) => {
            notes.push(format!("Using config override: {path}"));
            webbridge_config::load_from_path(Path::new(path))
        }
        None => webbridge_config::load_config(),
    };
    let mut config = loaded.unwrap_or_else(|e| {
        notes.push(format!("Config load failed, using defaults: {e}"));
        BridgeConfig::default()
    });
    if let Some(name) = &args.bridge_name {
        let previous = std::mem::replace(&mut config.bridge.name, name.clone());
        if let Err(e) = webbridge_config::validation::validate(&config) {
            notes.push(format!("Ignoring --bridge-name: {e}"));
            config.bridge.name = previous;
        }
    }
    (config, notes)
}

async fn run(args: cli::Args, config: BridgeConfig) -> Result<(), BridgeError> {
    let navigator = if args.intercept {
        Navigator::with_interceptor(interceptor::demo_interceptor)
    } else {
        Navigator::new()
    };

    let bridge = Arc::new(JsBridge::from_config(&config.bridge, navigator.clone()));
    let tasks = TaskTracker::new();
    handlers::register_all(
        &bridge,
        &config,
        Arc::new(InMemoryCookieManager::new()),
        tasks.clone(),
    );

    let mut session = WebSession::from_config(&config, navigator.clone(), WebContent::NavigatorOnly)
        .with_bridge(Arc::clone(&bridge));

    let engine = ScriptedEngine::push().auto_complete();
    let probe = engine.probe();
    session.attach(Box::new(engine))?;

    if let Some(url) = &args.url {
        navigator.load_url(handlers::normalize_url(url), Headers::new());
    }
    session.pump_until_idle()?;

    for raw in &args.messages {
        probe.post_from_page(raw.as_str());
    }
    session.pump_until_idle()?;

    // Cookie handlers answer from tasks; their replies land on the queue.
    tasks.close();
    tasks.wait().await;
    session.pump_until_idle()?;

    let report = Report {
        session: session.id().to_string(),
        bridge: bridge.name(),
        calls: probe.calls(),
        state: session.snapshot(),
    };
    match serde_json::to_string_pretty(&report) {
        Ok(json) => println!("{json}"),
        Err(e) => tracing::error!("Failed to render report: {e}"),
    }

    session.detach();
    Ok(())
}

#[tokio::main]
async fn main() {
    let args = cli::parse();
    let (config, notes) = load_config(&args);

    let log_directive = args
        .log_level
        .clone()
        .unwrap_or_else(|| format!("webbridge={}", config.logging.level.as_directive()));
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(EnvFilter::from_default_env().add_directive(
            log_directive.parse().unwrap_or_else(|_| {
                tracing_subscriber::filter::LevelFilter::INFO.into()
            }),
        ))
        .init();

    tracing::info!("webbridge-demo v{} starting...", env!("CARGO_PKG_VERSION"));
    for note in &notes {
        tracing::warn!("{note}");
    }
    tracing::info!("Bridge object: window.{}", config.bridge.name);

    if let Err(e) = run(args, config).await {
        tracing::error!("Session failed: {e}");
        std::process::exit(1);
    }
    tracing::info!("Shutdown complete");
}
