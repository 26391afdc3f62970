// core/src/state/tracker.rs
//! Cross-cycle per-device memory, owned by the polling loop. The
//! tracker decides which usage changes are worth reporting; it knows
//! nothing about message text or transport.

use crate::utils::models::{ChangeEvent, ChangeKind, DeviceSample};
use std::collections::BTreeMap;

/// Per-device memory across cycles. `completion_notified` is true
/// only while the device's last observed usage was zero; it is
/// cleared the moment usage turns nonzero again. Entries are created
/// on first observation and never removed (device indices are stable
/// for the run's lifetime).
#[derive(Debug, Clone, Default)]
struct DeviceState {
    previous_used_mb: u64,
    completion_notified: bool,
}

#[derive(Debug)]
pub struct StateTracker {
    threshold_mb: u64,
    devices: BTreeMap<u32, DeviceState>,
    first_cycle: bool,
}

impl StateTracker {
    pub fn new(threshold_mb: u64) -> Self {
        Self {
            threshold_mb,
            devices: BTreeMap::new(),
            first_cycle: true,
        }
    }

    /// True until the first `observe` call; the composer reports
    /// everything on the first cycle regardless of deltas.
    pub fn is_first_cycle(&self) -> bool {
        self.first_cycle
    }

    /// Folds one cycle of samples into the per-device state and
    /// returns the qualifying change events, at most one per device.
    /// `previous_used_mb` is updated unconditionally, whether or not
    /// an event fired.
    pub fn observe(&mut self, samples: &[DeviceSample]) -> Vec<ChangeEvent> {
        let first_cycle = std::mem::take(&mut self.first_cycle);

        let mut events = Vec::new();
        for sample in samples {
            let state = self.devices.entry(sample.index).or_default();
            let previous = state.previous_used_mb;
            let current = sample.used_mb;

            let kind = if first_cycle {
                // report unconditionally; seed the idle flag so a
                // device that starts idle is not re-reported next cycle
                state.completion_notified = current == 0;
                Some(ChangeKind::FirstObservation)
            } else if current == 0 {
                if state.completion_notified {
                    None
                } else {
                    state.completion_notified = true;
                    Some(ChangeKind::BecameIdle)
                }
            } else {
                // clearing the idle flag forces no notification by itself
                state.completion_notified = false;
                if previous.abs_diff(current) >= self.threshold_mb {
                    if previous == 0 {
                        Some(ChangeKind::ResumedAfterIdle)
                    } else {
                        Some(ChangeKind::ThresholdCrossed)
                    }
                } else {
                    None
                }
            };

            if let Some(kind) = kind {
                events.push(ChangeEvent {
                    device_index: sample.index,
                    kind,
                    previous_used_mb: previous,
                    current_used_mb: current,
                });
            }

            state.previous_used_mb = current;
        }
        events
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::DEFAULT_ALERT_THRESHOLD_MB;

    fn sample(index: u32, used_mb: u64) -> DeviceSample {
        DeviceSample {
            index,
            used_mb,
            total_mb: Some(32768),
        }
    }

    fn tracker() -> StateTracker {
        StateTracker::new(DEFAULT_ALERT_THRESHOLD_MB)
    }

    #[test]
    fn first_cycle_reports_every_device() {
        let mut tracker = tracker();
        assert!(tracker.is_first_cycle());
        let events = tracker.observe(&[sample(0, 100), sample(1, 0)]);
        assert_eq!(events.len(), 2);
        assert!(events.iter().all(|e| e.kind == ChangeKind::FirstObservation));
        assert!(!tracker.is_first_cycle());
    }

    #[test]
    fn sub_threshold_busy_delta_is_silent() {
        let mut tracker = tracker();
        tracker.observe(&[sample(0, 10000)]);
        let events = tracker.observe(&[sample(0, 12000)]);
        assert!(events.is_empty());
    }

    #[test]
    fn threshold_delta_fires_once() {
        let mut tracker = tracker();
        tracker.observe(&[sample(0, 10000)]);
        let events = tracker.observe(&[sample(0, 16000)]);
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].kind, ChangeKind::ThresholdCrossed);
        assert_eq!(events[0].previous_used_mb, 10000);
        assert_eq!(events[0].current_used_mb, 16000);
    }

    #[test]
    fn became_idle_fires_exactly_once() {
        let mut tracker = tracker();
        tracker.observe(&[sample(0, 8000)]);
        let events = tracker.observe(&[sample(0, 0)]);
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].kind, ChangeKind::BecameIdle);
        // repeated zero readings stay silent
        assert!(tracker.observe(&[sample(0, 0)]).is_empty());
        assert!(tracker.observe(&[sample(0, 0)]).is_empty());
    }

    #[test]
    fn resume_above_threshold_fires_resumed_after_idle() {
        let mut tracker = tracker();
        tracker.observe(&[sample(0, 8000)]);
        tracker.observe(&[sample(0, 0)]);
        let events = tracker.observe(&[sample(0, 9000)]);
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].kind, ChangeKind::ResumedAfterIdle);
    }

    #[test]
    fn resume_below_threshold_is_silent_but_clears_idle_flag() {
        let mut tracker = tracker();
        tracker.observe(&[sample(0, 8000)]);
        tracker.observe(&[sample(0, 0)]);
        assert!(tracker.observe(&[sample(0, 400)]).is_empty());
        // flag was cleared: dropping to zero again is a fresh idle event
        let events = tracker.observe(&[sample(0, 0)]);
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].kind, ChangeKind::BecameIdle);
    }

    #[test]
    fn device_idle_since_first_cycle_is_not_rereported() {
        let mut tracker = tracker();
        tracker.observe(&[sample(0, 0)]);
        assert!(tracker.observe(&[sample(0, 0)]).is_empty());
    }

    #[test]
    fn previous_usage_updates_even_without_event() {
        let mut tracker = tracker();
        tracker.observe(&[sample(0, 10000)]);
        tracker.observe(&[sample(0, 12000)]); // silent, but remembered
        let events = tracker.observe(&[sample(0, 17500)]);
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].previous_used_mb, 12000);
    }

    #[test]
    fn device_appearing_mid_run_defaults_previous_to_zero() {
        let mut tracker = tracker();
        tracker.observe(&[sample(0, 1000)]);
        let events = tracker.observe(&[sample(0, 1000), sample(1, 9000)]);
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].device_index, 1);
        assert_eq!(events[0].kind, ChangeKind::ResumedAfterIdle);
        assert_eq!(events[0].previous_used_mb, 0);
    }
}
