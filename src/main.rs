//! Entry point for the EduDub narration client.
//!
//! Responsibilities here are intentionally minimal:
//! - Initialize logging with a reloadable filter.
//! - Load user configuration from `conf/config.toml`.
//! - Build the narration backend client.
//! - Launch the GUI application.

mod api;
mod app;
mod cache;
mod config;
mod pdf_text;
mod playback;
mod voices;

use crate::api::NarrationClient;
use crate::app::run_app;
use crate::config::{clamp_config, config_path, load_config};
use anyhow::{Context, Result};
use tracing::{error, info, warn};
use tracing_subscriber::{EnvFilter, fmt, prelude::*, reload};

type ReloadHandle = reload::Handle<EnvFilter, tracing_subscriber::Registry>;

fn main() {
    let reload_handle = init_tracing();
    if let Err(err) = run(&reload_handle) {
        error!("{err:?}");
        std::process::exit(1);
    }
}

fn run(reload_handle: &ReloadHandle) -> Result<()> {
    let mut config = load_config(&config_path());
    clamp_config(&mut config);
    set_log_level(reload_handle, config.log_level.as_filter_str());
    info!(
        backend = %config.backend_url,
        language = %config.language,
        default_voice = %config.default_voice_id,
        "Starting narration client"
    );

    let client = NarrationClient::new(&config).context("Failed to build the backend client")?;
    run_app(config, client).context("Failed to start the GUI")?;
    Ok(())
}

fn init_tracing() -> ReloadHandle {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let (filter_layer, handle) = reload::Layer::new(env_filter);
    tracing_subscriber::registry()
        .with(
            fmt::layer()
                .with_target(true)
                .with_file(true)
                .with_line_number(true)
                .with_filter(filter_layer),
        )
        .init();
    handle
}

fn set_log_level(handle: &ReloadHandle, level: &str) {
    let parsed = EnvFilter::builder()
        .parse(level)
        .unwrap_or_else(|_| EnvFilter::new("info"));
    if let Err(err) = handle.modify(|filter| *filter = parsed.clone()) {
        warn!(%level, "Failed to update log level from config: {err}");
    } else {
        info!(%level, "Applied log level from config");
    }
}
