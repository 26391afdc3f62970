// core/src/utils/error.rs
use thiserror::Error;

/// Failures raised by the sampling layer. Parse problems are not in
/// here on purpose: malformed lines are logged and skipped, and a
/// vanished process is an `Option::None`, not an error.
#[derive(Debug, Error)]
pub enum MonitorError {
    #[error("failed to invoke status tool `{tool}`: {source}")]
    ToolInvocation {
        tool: String,
        #[source]
        source: std::io::Error,
    },

    #[error("status tool `{tool}` exited with {status}")]
    ToolExit {
        tool: String,
        status: std::process::ExitStatus,
    },
}
