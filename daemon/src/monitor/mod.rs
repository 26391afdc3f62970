// daemon/src/monitor/mod.rs
pub mod notify;

use crate::config::{Config, StatusFormat};
use anyhow::Result;
use log::{debug, error, info};
use tokio::time::sleep;
use vigil_core::gpu::parser;
use vigil_core::gpu::sampler::StatusSampler;
use vigil_core::job::correlator::JobCorrelator;
use vigil_core::notify::composer;
use vigil_core::state::tracker::StateTracker;

/// The polling loop: strictly sequential, one cycle per interval, no
/// overlap. Nothing inside a cycle is fatal; transient failures are
/// logged and the next cycle starts fresh.
pub async fn run_monitor(config: Config) -> Result<()> {
    info!(
        "GPU monitor started: interval {}s, threshold {}MB, format {:?}",
        config.check_interval.as_secs(),
        config.alert_threshold_mb,
        config.status_format
    );

    let sampler = StatusSampler::new(config.smi_path.clone());
    let correlator = JobCorrelator::default();
    let mut tracker = StateTracker::new(config.alert_threshold_mb);
    let client = reqwest::Client::new();

    loop {
        run_cycle(&config, &sampler, &correlator, &mut tracker, &client).await;
        sleep(config.check_interval).await;
    }
}

async fn run_cycle(
    config: &Config,
    sampler: &StatusSampler,
    correlator: &JobCorrelator,
    tracker: &mut StateTracker,
    client: &reqwest::Client,
) {
    let samples = match config.status_format {
        StatusFormat::Csv => match sampler.query_memory_csv().await {
            Ok(raw) => parser::parse_memory_csv(&raw),
            Err(e) => {
                error!("device status query failed: {}", e);
                Vec::new()
            }
        },
        StatusFormat::Table => match sampler.query_table().await {
            Ok(raw) => parser::parse_smi_table(&raw, &config.device_marker),
            Err(e) => {
                error!("device status query failed: {}", e);
                Vec::new()
            }
        },
    };

    if samples.is_empty() {
        // tracker untouched: the first real reading still counts as
        // the first cycle
        info!("no GPUs detected this cycle");
        return;
    }

    let records = match sampler.query_compute_apps().await {
        Ok(raw) => parser::parse_compute_apps(&raw),
        Err(e) => {
            error!("compute-apps query failed: {}", e);
            Vec::new()
        }
    };

    for (uuid, total_mb) in parser::attribute_usage(&records) {
        debug!("device {} has {}MB attributed across its processes", uuid, total_mb);
    }

    let first_cycle = tracker.is_first_cycle();
    let events = tracker.observe(&samples);

    let message = composer::compose(&events, &samples, &records, first_cycle, |pid| {
        correlator.resolve_job(pid)
    });

    if let Some(message) = message {
        // fire-and-forget: a failed delivery neither retries nor
        // rolls back this cycle's state updates
        notify::send_webhook(client, &config.webhook_url, &config.server_name, &message).await;
        notify::append_status_log(&config.status_log_path(), &message).await;
    }
}
