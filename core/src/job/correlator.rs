// core/src/job/correlator.rs
//! Maps a pid back to the job configuration it is running: the
//! process's working directory plus the first YAML path on its
//! command line. Processes vanish between the compute-apps query and
//! the /proc read all the time, so "no descriptor" is an Option, not
//! an error.

use crate::job::{MODEL_PATH_KEYS, PATH_NOT_AVAILABLE};
use crate::utils::models::JobDescriptor;
use log::{debug, warn};
use serde_yaml::Value;
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

const CONFIG_SUFFIXES: [&str; 2] = [".yaml", ".yml"];

#[derive(Debug, Clone)]
pub struct JobCorrelator {
    proc_root: PathBuf,
}

impl Default for JobCorrelator {
    fn default() -> Self {
        Self::with_proc_root("/proc")
    }
}

impl JobCorrelator {
    /// Tests point this at a fake /proc tree.
    pub fn with_proc_root(proc_root: impl Into<PathBuf>) -> Self {
        Self {
            proc_root: proc_root.into(),
        }
    }

    /// Resolves the job configuration behind `pid`. `None` covers the
    /// expected cases: process already exited, no config token on its
    /// command line, config path missing, or config unreadable or
    /// malformed.
    pub fn resolve_job(&self, pid: i32) -> Option<JobDescriptor> {
        let cwd = self.process_cwd(pid)?;
        let cmdline = self.process_cmdline(pid)?;
        let config_path = find_config_token(&cmdline, &cwd)?;
        load_descriptor(&config_path)
    }

    fn process_cwd(&self, pid: i32) -> Option<PathBuf> {
        let link = self.proc_root.join(pid.to_string()).join("cwd");
        match fs::read_link(&link) {
            Ok(path) => Some(path),
            Err(e) => {
                debug!("pid {} cwd unreadable (process gone?): {}", pid, e);
                None
            }
        }
    }

    fn process_cmdline(&self, pid: i32) -> Option<String> {
        let path = self.proc_root.join(pid.to_string()).join("cmdline");
        match fs::read_to_string(&path) {
            // cmdline arguments are NUL-separated
            Ok(raw) => Some(raw.replace('\0', " ").trim().to_string()),
            Err(e) => {
                debug!("pid {} cmdline unreadable (process gone?): {}", pid, e);
                None
            }
        }
    }
}

/// First command-line token ending in a config suffix, resolved
/// against the working directory when relative. A token that points
/// at a nonexistent file yields no descriptor.
fn find_config_token(cmdline: &str, cwd: &Path) -> Option<PathBuf> {
    let token = cmdline
        .split_whitespace()
        .find(|token| CONFIG_SUFFIXES.iter().any(|suffix| token.ends_with(suffix)))?;

    let path = if Path::new(token).is_absolute() {
        PathBuf::from(token)
    } else {
        cwd.join(token)
    };

    if path.exists() {
        Some(path)
    } else {
        debug!("config path from command line does not exist: {}", path.display());
        None
    }
}

fn load_descriptor(config_path: &Path) -> Option<JobDescriptor> {
    let raw = match fs::read_to_string(config_path) {
        Ok(raw) => raw,
        Err(e) => {
            debug!("failed to read job config {}: {}", config_path.display(), e);
            return None;
        }
    };

    let doc: Value = match serde_yaml::from_str(&raw) {
        Ok(doc) => doc,
        Err(e) => {
            warn!("failed to parse job config {}: {}", config_path.display(), e);
            return None;
        }
    };

    let model = doc.get("model");
    let mut named_paths = BTreeMap::new();
    for key in MODEL_PATH_KEYS {
        let value = model
            .and_then(|m| m.get(key))
            .and_then(Value::as_str)
            .map(base_name)
            .unwrap_or_else(|| PATH_NOT_AVAILABLE.to_string());
        named_paths.insert(key.to_string(), value);
    }

    Some(JobDescriptor {
        config_path: config_path.to_path_buf(),
        named_paths,
    })
}

/// Only the base filename of a model path is surfaced in messages.
fn base_name(path: &str) -> String {
    Path::new(path)
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.to_string())
}
