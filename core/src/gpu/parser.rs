// core/src/gpu/parser.rs
//! Pure text-to-record parsing for the three raw output shapes the
//! sampler produces. A malformed line never fails the cycle: it is
//! logged and skipped, and the remaining lines are still processed.

use crate::utils::models::{DeviceSample, ProcessRecord};
use log::warn;
use std::collections::BTreeMap;

/// Parses the structured `memory.used,memory.total` query output.
/// Device index = line ordinal, so a skipped malformed line leaves a
/// hole instead of shifting later devices.
pub fn parse_memory_csv(raw: &str) -> Vec<DeviceSample> {
    let mut samples = Vec::new();
    for (ordinal, line) in raw.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        match parse_memory_line(line) {
            Some((used_mb, total_mb)) => samples.push(DeviceSample {
                index: ordinal as u32,
                used_mb,
                total_mb: Some(total_mb),
            }),
            None => warn!("skipping malformed memory line {}: {:?}", ordinal, line),
        }
    }
    samples
}

fn parse_memory_line(line: &str) -> Option<(u64, u64)> {
    let mut fields = line.split(',').map(str::trim);
    let used = fields.next()?.parse::<u64>().ok()?;
    let total = fields.next()?.parse::<u64>().ok()?;
    Some((used, total))
}

/// Parses the default human-readable table. A line containing the
/// device-model `marker` opens the next device at 0 MB; the following
/// line carrying both a `MiB` figure and the `Default` compute-mode
/// column is its memory-usage row. A row that fails to split or parse
/// leaves the device at its initialized 0 MB for this cycle.
pub fn parse_smi_table(raw: &str, marker: &str) -> Vec<DeviceSample> {
    let mut samples: Vec<DeviceSample> = Vec::new();
    for line in raw.lines() {
        if line.contains(marker) {
            let index = samples.len() as u32;
            samples.push(DeviceSample {
                index,
                used_mb: 0,
                total_mb: None,
            });
        } else if line.contains("MiB") && line.contains("Default") {
            let Some(current) = samples.last_mut() else {
                // usage row before any model marker, nothing to attach it to
                continue;
            };
            match parse_usage_row(line) {
                Some((used_mb, total_mb)) => {
                    current.used_mb = used_mb;
                    current.total_mb = total_mb;
                }
                None => warn!("failed to parse memory usage row: {:?}", line),
            }
        }
    }
    samples
}

/// Used MB is the numeric prefix of the third `|`-delimited field's
/// first `/`-separated token; total comes from the second token when
/// it parses.
fn parse_usage_row(line: &str) -> Option<(u64, Option<u64>)> {
    let field = line.split('|').nth(2)?.trim();
    let mut tokens = field.split('/');
    let used = parse_mib_token(tokens.next()?)?;
    let total = tokens.next().and_then(parse_mib_token);
    Some((used, total))
}

fn parse_mib_token(token: &str) -> Option<u64> {
    token
        .trim()
        .trim_end_matches("MiB")
        .trim()
        .parse::<u64>()
        .ok()
}

/// Parses the `gpu_uuid,pid,used_memory` compute-apps query output.
pub fn parse_compute_apps(raw: &str) -> Vec<ProcessRecord> {
    let mut records = Vec::new();
    for line in raw.lines() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        match parse_compute_apps_line(line) {
            Some(record) => records.push(record),
            None => warn!("skipping malformed compute-apps line: {:?}", line),
        }
    }
    records
}

fn parse_compute_apps_line(line: &str) -> Option<ProcessRecord> {
    let mut fields = line.split(',').map(str::trim);
    let device_uuid = fields.next()?.to_string();
    let pid = fields.next()?.parse::<i32>().ok()?;
    let used_mb = fields.next()?.parse::<u64>().ok()?;
    Some(ProcessRecord {
        device_uuid,
        pid,
        used_mb,
    })
}

/// Total attributed usage per device uuid: the sum of that uuid's
/// process records.
pub fn attribute_usage(records: &[ProcessRecord]) -> BTreeMap<String, u64> {
    let mut totals = BTreeMap::new();
    for record in records {
        *totals.entry(record.device_uuid.clone()).or_insert(0) += record.used_mb;
    }
    totals
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn memory_csv_is_positional() {
        let samples = parse_memory_csv("100,16000\n0,16000\n");
        assert_eq!(samples.len(), 2);
        assert_eq!(samples[0].index, 0);
        assert_eq!(samples[0].used_mb, 100);
        assert_eq!(samples[0].total_mb, Some(16000));
        assert_eq!(samples[1].index, 1);
        assert_eq!(samples[1].used_mb, 0);
    }

    #[test]
    fn malformed_memory_line_keeps_its_ordinal_reserved() {
        let samples = parse_memory_csv("100,16000\nnot,numbers\n200,16000\n");
        assert_eq!(samples.len(), 2);
        assert_eq!(samples[0].index, 0);
        // line 1 was skipped, line 2 still maps to device 2
        assert_eq!(samples[1].index, 2);
        assert_eq!(samples[1].used_mb, 200);
    }

    #[test]
    fn table_form_extracts_used_from_third_field() {
        let raw = "\
|   0  Tesla V100-SXM2-32GB           On   | 00000000:06:00.0 Off |                    0 |
| N/A   42C    P0    55W / 300W |  12345MiB / 32768MiB |      0%      Default |
";
        let samples = parse_smi_table(raw, "Tesla V100-SXM2-32GB");
        assert_eq!(samples.len(), 1);
        assert_eq!(samples[0].used_mb, 12345);
        assert_eq!(samples[0].total_mb, Some(32768));
    }

    #[test]
    fn table_form_counts_devices_by_marker() {
        let raw = "\
| Tesla V100-SXM2-32GB |
| N/A   42C  P0  55W / 300W |  100MiB / 32768MiB | 0% Default |
| Tesla V100-SXM2-32GB |
| N/A   38C  P8  25W / 300W |  0MiB / 32768MiB | 0% Default |
";
        let samples = parse_smi_table(raw, "Tesla V100-SXM2-32GB");
        assert_eq!(samples.len(), 2);
        assert_eq!(samples[0].used_mb, 100);
        assert_eq!(samples[1].used_mb, 0);
    }

    #[test]
    fn bad_usage_row_leaves_device_at_zero() {
        let raw = "\
| Tesla V100-SXM2-32GB |
| N/A 42C P0 | garbageMiB Default |
";
        let samples = parse_smi_table(raw, "Tesla V100-SXM2-32GB");
        assert_eq!(samples.len(), 1);
        assert_eq!(samples[0].used_mb, 0);
        assert_eq!(samples[0].total_mb, None);
    }

    #[test]
    fn compute_apps_lines_parse_and_group() {
        let raw = "\
GPU-aaaa, 1111, 4000
GPU-aaaa, 1112, 2000
GPU-bbbb, 2222, 8000

";
        let records = parse_compute_apps(raw);
        assert_eq!(records.len(), 3);
        assert_eq!(records[0].pid, 1111);

        let totals = attribute_usage(&records);
        assert_eq!(totals.get("GPU-aaaa"), Some(&6000));
        assert_eq!(totals.get("GPU-bbbb"), Some(&8000));
    }

    #[test]
    fn malformed_compute_apps_line_is_skipped() {
        let records = parse_compute_apps("GPU-aaaa, not-a-pid, 4000\nGPU-bbbb, 2222, 8000\n");
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].device_uuid, "GPU-bbbb");
    }
}
