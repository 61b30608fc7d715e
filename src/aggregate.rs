use std::collections::BTreeMap;

use crate::error::TargetError;
use crate::models::{StatEntry, TargetOutcome};

/// The consolidated result of one run: entries per successful target plus
/// the hard failures, keyed so no target appears on both sides. Built once
/// after the join barrier and read-only afterwards.
#[derive(Debug, Default)]
pub struct Report {
    pub results: BTreeMap<String, Vec<StatEntry>>,
    pub failures: Vec<TargetError>,
}

impl Report {
    /// Partitions outcomes, which arrive in whatever order the targets
    /// finished. Either side may end up empty.
    pub fn from_outcomes(outcomes: Vec<TargetOutcome>) -> Self {
        let mut report = Report::default();
        for outcome in outcomes {
            match outcome {
                TargetOutcome::Success { target, entries } => {
                    report.results.insert(target, entries);
                }
                TargetOutcome::Failure(err) => report.failures.push(err),
            }
        }
        report
    }

    pub fn has_failures(&self) -> bool {
        !self.failures.is_empty()
    }

    /// One line per failed target, each prefixed with the target address,
    /// for the end-of-run error. `None` when everything succeeded.
    pub fn failure_summary(&self) -> Option<String> {
        if self.failures.is_empty() {
            return None;
        }
        let lines: Vec<String> = self.failures.iter().map(|f| f.to_string()).collect();
        Some(format!(
            "{} target(s) failed:\n{}",
            self.failures.len(),
            lines.join("\n")
        ))
    }
}
