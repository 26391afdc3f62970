// daemon/src/main.rs
use anyhow::{Context, Result};
use log::LevelFilter;
use std::{env, fs};
use vigil_core::utils::logging;

mod config;
mod monitor;

use config::Config;

#[tokio::main]
async fn main() -> Result<()> {
    let args: Vec<String> = env::args().collect();
    // Optional JSON config path; env vars override its values either way
    let config = Config::load(args.get(1).map(String::as_str))?;

    let log_level = match config.log_level.to_lowercase().as_str() {
        "trace" => LevelFilter::Trace,
        "debug" => LevelFilter::Debug,
        "info" => LevelFilter::Info,
        "warn" => LevelFilter::Warn,
        "error" => LevelFilter::Error,
        _ => LevelFilter::Info,
    };

    fs::create_dir_all(&config.log_dir).with_context(|| {
        format!("Failed to create log directory: {}", config.log_dir.display())
    })?;

    logging::init(&config.daemon_log_path(), log_level)
        .context("Failed to initialize logger")?;

    monitor::run_monitor(config).await
}
