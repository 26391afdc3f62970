// core/src/gpu/mod.rs
pub mod parser;
pub mod sampler;

/// Device-model marker the free-text table parser keys device
/// boundaries on. Other models need a different marker via
/// configuration.
pub const DEFAULT_DEVICE_MARKER: &str = "Tesla V100-SXM2-32GB";
