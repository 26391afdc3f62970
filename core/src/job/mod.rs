// core/src/job/mod.rs
pub mod correlator;

/// Model-section keys surfaced in a job descriptor, in display order.
pub const MODEL_PATH_KEYS: [&str; 3] = ["llama_path", "whisper_path", "beats_path"];

/// Sentinel for a recognized key that is absent from the config.
pub const PATH_NOT_AVAILABLE: &str = "N/A";
