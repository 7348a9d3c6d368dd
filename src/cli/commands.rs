//! Command implementations.

use std::sync::Arc;

use plancoach_config::Config;
use plancoach_gate::AccessGate;
use plancoach_llm::supported_providers;
use plancoach_orchestrator::{CallLimits, Orchestrator};
use plancoach_utils::error::PlanCoachError;
use serde::Serialize;
use tracing::info;

use crate::server::{self, AppState};

/// Everything `serve` needs, built from configuration.
///
/// Fails on a missing provider credential or an empty inbound key set.
pub fn build_state(config: &Config) -> Result<AppState, PlanCoachError> {
    config.require_access_keys()?;

    let provider = plancoach_llm::from_config(&config.provider)?;
    let orchestrator = Arc::new(Orchestrator::new(
        provider,
        CallLimits::from(&config.provider),
    ));

    let gate = AccessGate::new(&config.access.api_keys);
    let info = server::service_info(Some(orchestrator.as_ref()));

    let mut secrets = config.access.api_keys.clone();
    secrets.extend(config.provider.api_key.iter().cloned());

    Ok(AppState::new(Some(orchestrator), gate, info, secrets))
}

pub fn serve(config: &Config) -> Result<(), PlanCoachError> {
    let state = build_state(config)?;

    info!(
        provider = %config.provider.kind,
        model = %config.provider.model,
        timeout_secs = config.provider.timeout.as_secs(),
        inbound_keys = state.gate.key_count(),
        "starting plancoach"
    );

    let runtime = tokio::runtime::Runtime::new()?;
    runtime.block_on(server::serve(&config.server.host, config.server.port, state))?;
    Ok(())
}

pub fn check(config: &Config) -> Result<(), PlanCoachError> {
    let provider = plancoach_llm::from_config(&config.provider)?;

    println!("✓ Configuration valid");
    println!("  provider:     {} ({})", provider.kind(), provider.model());
    println!("  base url:     {}", config.provider.base_url);
    println!("  timeout:      {}s", config.provider.timeout.as_secs());
    println!(
        "  max tokens:   {} (quick advice {})",
        config.provider.max_tokens, config.provider.quick_max_tokens
    );
    println!("  listen:       {}:{}", config.server.host, config.server.port);

    match config.require_access_keys() {
        Ok(()) => println!("  inbound keys: {} configured", config.access.api_keys.len()),
        Err(_) => println!("⚠ No inbound API keys configured; `serve` will refuse to start"),
    }
    Ok(())
}

pub fn print_config(config: &Config, json: bool) -> Result<(), PlanCoachError> {
    let entries = config.effective_config();

    if json {
        let object: serde_json::Map<String, serde_json::Value> = entries
            .into_iter()
            .map(|(key, (value, source))| {
                (key, serde_json::json!({ "value": value, "source": source }))
            })
            .collect();
        println!("{}", render_json(&object)?);
        return Ok(());
    }

    let width = entries.keys().map(String::len).max().unwrap_or(0);
    for (key, (value, source)) in entries {
        println!("{key:<width$} = {value}  ({source})");
    }
    Ok(())
}

pub fn print_providers() -> Result<(), PlanCoachError> {
    println!("{}", render_json(&supported_providers())?);
    Ok(())
}

/// Pretty JSON for stdout. Serialization failures surface as I/O errors.
fn render_json<T: Serialize + ?Sized>(value: &T) -> Result<String, PlanCoachError> {
    serde_json::to_string_pretty(value).map_err(|e| PlanCoachError::Io(e.into()))
}
