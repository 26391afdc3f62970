// core/src/notify/composer.rs
//! Turns a cycle's change events into the outbound message text. Job
//! resolution is injected as a closure so the composer stays testable
//! without a real /proc.

use crate::job::{MODEL_PATH_KEYS, PATH_NOT_AVAILABLE};
use crate::utils::models::{ChangeEvent, ChangeKind, DeviceSample, JobDescriptor, ProcessRecord};

/// Builds the full message for one cycle, or `None` when nothing is
/// worth sending (not the first cycle and no event fired). A `None`
/// suppresses both the webhook call and the status-log write.
pub fn compose<R>(
    events: &[ChangeEvent],
    samples: &[DeviceSample],
    records: &[ProcessRecord],
    first_cycle: bool,
    mut resolve: R,
) -> Option<String>
where
    R: FnMut(i32) -> Option<JobDescriptor>,
{
    if !first_cycle && events.is_empty() {
        return None;
    }

    let mut lines: Vec<String> = events
        .iter()
        .map(|event| event_line(event, samples))
        .collect();

    // pairing runs over every busy device so a quiet busy device
    // still consumes its uuid; only the qualifying devices (those
    // that produced an event, or all of them on the first cycle)
    // surface a task block
    let busy: Vec<u32> = samples
        .iter()
        .filter(|s| s.used_mb > 0)
        .map(|s| s.index)
        .collect();

    let resolved: Vec<(u32, JobDescriptor)> = pair_device_uuids(&busy, records)
        .into_iter()
        .filter(|(device, _)| {
            first_cycle || events.iter().any(|e| e.device_index == *device)
        })
        .filter_map(|(device, uuid)| {
            let descriptor = records
                .iter()
                .filter(|r| r.device_uuid == uuid)
                .find_map(|r| resolve(r.pid))?;
            Some((device, descriptor))
        })
        .collect();

    if !resolved.is_empty() {
        let identical = resolved.windows(2).all(|pair| pair[0].1 == pair[1].1);
        if identical {
            lines.push(task_block(None, &resolved[0].1));
        } else {
            for (device, descriptor) in &resolved {
                lines.push(task_block(Some(*device), descriptor));
            }
        }
    }

    if lines.is_empty() {
        return None;
    }
    Some(lines.join("\n"))
}

/// Device-to-uuid pairing. The status queries expose no
/// index-to-uuid join, so distinct uuids in compute-apps file order
/// are paired with all busy devices in ascending index order — a
/// busy device that is not reported this cycle still consumes its
/// uuid, keeping the alignment stable. With fewer uuids than busy
/// devices the leftover devices get no pairing.
fn pair_device_uuids<'a>(busy: &[u32], records: &'a [ProcessRecord]) -> Vec<(u32, &'a str)> {
    let mut uuid_order: Vec<&str> = Vec::new();
    for record in records {
        if !uuid_order.contains(&record.device_uuid.as_str()) {
            uuid_order.push(&record.device_uuid);
        }
    }

    busy.iter()
        .zip(uuid_order)
        .map(|(device, uuid)| (*device, uuid))
        .collect()
}

fn event_line(event: &ChangeEvent, samples: &[DeviceSample]) -> String {
    let label = device_label(event.device_index);
    let index = event.device_index;
    match event.kind {
        ChangeKind::FirstObservation => {
            let total = samples
                .iter()
                .find(|s| s.index == index)
                .and_then(|s| s.total_mb);
            match total {
                Some(total) => {
                    format!("{label} GPU {index}: {}MB / {total}MB", event.current_used_mb)
                }
                None => format!("{label} GPU {index}: {}MB", event.current_used_mb),
            }
        }
        ChangeKind::BecameIdle => format!("{label} GPU {index}: 0MB ✅ training complete"),
        ChangeKind::ResumedAfterIdle => format!(
            "{label} GPU {index}: {}MB 🔄 training started (change: {}MB → {}MB)",
            event.current_used_mb, event.previous_used_mb, event.current_used_mb
        ),
        ChangeKind::ThresholdCrossed => format!(
            "{label} GPU {index}: {}MB (change: {}MB → {}MB)",
            event.current_used_mb, event.previous_used_mb, event.current_used_mb
        ),
    }
}

fn task_block(device: Option<u32>, descriptor: &JobDescriptor) -> String {
    let mut block = match device {
        Some(index) => format!(
            "{} Running task: {}",
            device_label(index),
            descriptor.config_path.display()
        ),
        None => format!("🔍 Running task: {}", descriptor.config_path.display()),
    };
    for key in MODEL_PATH_KEYS {
        let value = descriptor
            .named_paths
            .get(key)
            .map(String::as_str)
            .unwrap_or(PATH_NOT_AVAILABLE);
        block.push_str(&format!("\n- {key}: {value}"));
    }
    block
}

/// Keycap-digit labels exist for 0 through 9 only; higher indices
/// fall back to a plain bracketed number.
fn device_label(index: u32) -> String {
    if index <= 9 {
        format!("{index}\u{fe0f}\u{20e3}")
    } else {
        format!("[{index}]")
    }
}
