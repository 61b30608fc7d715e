use serde::{Deserialize, Serialize};

use crate::error::TargetError;

/// One remote host to query, with the credentials used to reach it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Target {
    pub address: String,
    pub username: String,
    pub password: String,
    pub port: Option<u16>,
    pub group: Option<String>,
}

/// Metadata for a single filesystem object as reported by a target.
///
/// `last_modified` is nanoseconds since the Unix epoch. `permissions` and
/// `umask` are the raw bits as reported; masking happens at render time only.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatEntry {
    pub path: String,
    pub size: u64,
    pub last_modified: i64,
    pub permissions: u32,
    pub umask: u32,
    pub is_dir: bool,
}

/// What one target's unit of work produced: a list of entries (possibly
/// empty, possibly partial), or a hard failure. Never both.
#[derive(Debug)]
pub enum TargetOutcome {
    Success {
        target: String,
        entries: Vec<StatEntry>,
    },
    Failure(TargetError),
}

impl TargetOutcome {
    pub fn target(&self) -> &str {
        match self {
            TargetOutcome::Success { target, .. } => target,
            TargetOutcome::Failure(err) => &err.target,
        }
    }
}
