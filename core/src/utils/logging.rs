// core/src/utils/logging.rs
use anyhow::{Context, Result};
use log::LevelFilter;
use std::path::Path;

/// Initializes the global logger: timestamped records to stdout and,
/// append-only, to the daemon log file. Must run before anything
/// logs; calling it twice fails.
pub fn init(log_file: &Path, level: LevelFilter) -> Result<()> {
    fern::Dispatch::new()
        .format(|out, message, record| {
            out.finish(format_args!(
                "{} - {} - {}",
                chrono::Local::now().format("%Y-%m-%d %H:%M:%S"),
                record.level(),
                message
            ))
        })
        .level(level)
        .chain(std::io::stdout())
        .chain(
            fern::log_file(log_file)
                .with_context(|| format!("Failed to open log file: {}", log_file.display()))?,
        )
        .apply()
        .context("Failed to install logger")?;
    Ok(())
}
