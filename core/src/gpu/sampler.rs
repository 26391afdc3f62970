// core/src/gpu/sampler.rs
use crate::utils::error::MonitorError;
use tokio::process::Command;

/// Thin wrapper around the external `nvidia-smi` invocations. Returns
/// raw stdout only; turning it into structured records is the
/// parser's job.
#[derive(Debug, Clone)]
pub struct StatusSampler {
    tool: String,
}

impl Default for StatusSampler {
    fn default() -> Self {
        Self::new("nvidia-smi")
    }
}

impl StatusSampler {
    pub fn new(tool: impl Into<String>) -> Self {
        Self { tool: tool.into() }
    }

    /// `memory.used,memory.total` per device, CSV, no header, no
    /// units, one line per device in index order.
    pub async fn query_memory_csv(&self) -> Result<String, MonitorError> {
        self.run(&[
            "--query-gpu=memory.used,memory.total",
            "--format=csv,noheader,nounits",
        ])
        .await
    }

    /// The default human-readable table, for hosts where the query
    /// form is unavailable.
    pub async fn query_table(&self) -> Result<String, MonitorError> {
        self.run(&[]).await
    }

    /// `gpu_uuid,pid,used_memory` per compute process, CSV, no
    /// header, no units.
    pub async fn query_compute_apps(&self) -> Result<String, MonitorError> {
        self.run(&[
            "--query-compute-apps=gpu_uuid,pid,used_memory",
            "--format=csv,noheader,nounits",
        ])
        .await
    }

    async fn run(&self, args: &[&str]) -> Result<String, MonitorError> {
        let output = Command::new(&self.tool)
            .args(args)
            .output()
            .await
            .map_err(|source| MonitorError::ToolInvocation {
                tool: self.tool.clone(),
                source,
            })?;

        if !output.status.success() {
            return Err(MonitorError::ToolExit {
                tool: self.tool.clone(),
                status: output.status,
            });
        }

        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }
}
