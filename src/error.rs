use std::fmt;

use thiserror::Error;

/// Which step of a target's unit of work failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Connect,
    Stat,
    Classify,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Stage::Connect => write!(f, "connect"),
            Stage::Stat => write!(f, "stat"),
            Stage::Classify => write!(f, "classify"),
        }
    }
}

/// A hard per-target failure, tagged with the target address and the stage
/// that failed so callers can branch without string matching.
#[derive(Debug, Error)]
#[error("{target:?} {stage} failed: {source:#}")]
pub struct TargetError {
    pub target: String,
    pub stage: Stage,
    #[source]
    pub source: anyhow::Error,
}

impl TargetError {
    pub fn new(target: impl Into<String>, stage: Stage, source: anyhow::Error) -> Self {
        Self {
            target: target.into(),
            stage,
            source,
        }
    }
}
