// daemon/src/monitor/notify.rs
//! Outbound plumbing: the webhook POST and the append-only status
//! log. Both are fire-and-forget; failures are logged and the loop
//! carries on.

use log::{debug, error};
use serde_json::json;
use std::path::Path;
use tokio::fs::OpenOptions;
use tokio::io::AsyncWriteExt;

/// POSTs the composed message, prefixed with the server-name line, as
/// the webhook's JSON `text` payload. The response body is ignored.
pub async fn send_webhook(client: &reqwest::Client, url: &str, server_name: &str, message: &str) {
    let payload = json!({ "text": format!("🖥️ *{}*\n{}", server_name, message) });
    match client.post(url).json(&payload).send().await {
        Ok(response) if !response.status().is_success() => {
            error!("webhook delivery returned status {}", response.status());
        }
        Ok(_) => debug!("webhook delivered"),
        Err(e) => error!("webhook delivery failed: {}", e),
    }
}

/// Appends the exact message text, newline-terminated.
pub async fn append_status_log(path: &Path, message: &str) {
    let result = async {
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .await?;
        file.write_all(message.as_bytes()).await?;
        file.write_all(b"\n").await?;
        std::io::Result::Ok(())
    }
    .await;

    if let Err(e) = result {
        error!("failed to append status log {}: {}", path.display(), e);
    }
}
