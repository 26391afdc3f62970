// core/src/utils/models.rs
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::PathBuf;

/// One device's memory reading for a single polling cycle. The index
/// is positional (line ordinal of the status query) and stays stable
/// for the lifetime of the run; samples are rebuilt every cycle,
/// never mutated in place.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceSample {
    pub index: u32,
    pub used_mb: u64,
    /// Unknown when the free-text table row did not carry a parsable
    /// total.
    pub total_mb: Option<u64>,
}

/// One compute process as reported by the process query, rebuilt
/// fresh every cycle. A device may host zero, one or many of these.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProcessRecord {
    pub device_uuid: String,
    pub pid: i32,
    pub used_mb: u64,
}

/// Resolved workload metadata for a busy device: the config file a
/// running process was launched with and the base filenames of the
/// model components it references. Built lazily per cycle, never
/// persisted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobDescriptor {
    pub config_path: PathBuf,
    pub named_paths: BTreeMap<String, String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ChangeKind {
    /// Every device gets one of these on the very first cycle.
    FirstObservation,
    /// Usage dropped to exactly zero and the device had not been
    /// reported idle yet.
    BecameIdle,
    /// Usage went from zero to nonzero with a delta at or above the
    /// alert threshold.
    ResumedAfterIdle,
    /// Busy-to-busy usage delta at or above the alert threshold.
    ThresholdCrossed,
}

/// A qualifying per-device change, produced at most once per device
/// per cycle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChangeEvent {
    pub device_index: u32,
    pub kind: ChangeKind,
    pub previous_used_mb: u64,
    pub current_used_mb: u64,
}
