// daemon/src/config.rs
use anyhow::{bail, Context, Result};
use serde::Deserialize;
use std::path::PathBuf;
use std::time::Duration;
use std::{env, fs};
use vigil_core::gpu::DEFAULT_DEVICE_MARKER;
use vigil_core::utils::{DEFAULT_ALERT_THRESHOLD_MB, DEFAULT_CHECK_INTERVAL_SECS};

const WEBHOOK_URL_VAR: &str = "SLACK_WEBHOOK_URL";
const SERVER_NAME_VAR: &str = "SERVER_NAME";
const DEFAULT_SERVER_NAME: &str = "Unknown Server";

/// Which device-status query the sampler runs each cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusFormat {
    /// `--query-gpu` CSV form (default).
    Csv,
    /// Default human-readable table, scanned for the device marker.
    Table,
}

/// On-disk shape of the optional JSON config file.
#[derive(Debug, Deserialize, Default)]
struct FileConfig {
    #[serde(rename = "webhook-url")]
    webhook_url: Option<String>,
    #[serde(rename = "server-name")]
    server_name: Option<String>,
    #[serde(rename = "log-level")]
    log_level: Option<String>,
    #[serde(rename = "log-dir")]
    log_dir: Option<String>,
    #[serde(rename = "check-interval-secs")]
    check_interval_secs: Option<u64>,
    #[serde(rename = "alert-threshold-mb")]
    alert_threshold_mb: Option<u64>,
    #[serde(rename = "status-format")]
    status_format: Option<String>,
    #[serde(rename = "device-marker")]
    device_marker: Option<String>,
    #[serde(rename = "smi-path")]
    smi_path: Option<String>,
}

#[derive(Debug, Clone)]
pub struct Config {
    pub webhook_url: String,
    pub server_name: String,
    pub log_level: String,
    pub log_dir: PathBuf,
    pub check_interval: Duration,
    pub alert_threshold_mb: u64,
    pub status_format: StatusFormat,
    pub device_marker: String,
    pub smi_path: String,
}

impl Config {
    /// Loads startup configuration. Environment variables take
    /// precedence over the config file; the webhook URL must come
    /// from one of them or startup fails.
    pub fn load(path: Option<&str>) -> Result<Self> {
        let file = match path {
            Some(path) => {
                let raw = fs::read_to_string(path)
                    .with_context(|| format!("Failed to read config file: {}", path))?;
                serde_json::from_str(&raw)
                    .with_context(|| format!("Failed to parse config file: {}", path))?
            }
            None => FileConfig::default(),
        };

        let webhook_url = env::var(WEBHOOK_URL_VAR)
            .ok()
            .filter(|v| !v.is_empty())
            .or(file.webhook_url)
            .with_context(|| {
                format!("{} is not set and the config file has no webhook-url", WEBHOOK_URL_VAR)
            })?;

        let server_name = env::var(SERVER_NAME_VAR)
            .ok()
            .filter(|v| !v.is_empty())
            .or(file.server_name)
            .unwrap_or_else(|| DEFAULT_SERVER_NAME.to_string());

        let status_format = match file.status_format.as_deref() {
            None | Some("csv") => StatusFormat::Csv,
            Some("table") => StatusFormat::Table,
            Some(other) => bail!("Unknown status-format: {}", other),
        };

        Ok(Self {
            webhook_url,
            server_name,
            log_level: file.log_level.unwrap_or_else(|| "info".to_string()),
            log_dir: PathBuf::from(file.log_dir.unwrap_or_else(|| "monitor_log".to_string())),
            check_interval: Duration::from_secs(
                file.check_interval_secs.unwrap_or(DEFAULT_CHECK_INTERVAL_SECS),
            ),
            alert_threshold_mb: file.alert_threshold_mb.unwrap_or(DEFAULT_ALERT_THRESHOLD_MB),
            status_format,
            device_marker: file
                .device_marker
                .unwrap_or_else(|| DEFAULT_DEVICE_MARKER.to_string()),
            smi_path: file.smi_path.unwrap_or_else(|| "nvidia-smi".to_string()),
        })
    }

    /// Append-only store for composed messages.
    pub fn status_log_path(&self) -> PathBuf {
        self.log_dir.join("gpu_status.log")
    }

    pub fn daemon_log_path(&self) -> PathBuf {
        self.log_dir.join("daemon.log")
    }
}
