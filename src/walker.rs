use std::future::Future;
use std::pin::Pin;

use anyhow::Result;
use tracing::{debug, error};

use crate::error::{Stage, TargetError};
use crate::models::StatEntry;
use crate::probe::FileProbe;

/// Walks seed paths on one connected target and returns a flat, pre-order
/// depth-first list of entries, descending into directories when enabled.
///
/// Overlapping seed paths can yield duplicate entries; nothing here
/// de-duplicates. Callers choose non-overlapping seeds.
pub struct Walker<'a, P: FileProbe> {
    probe: &'a P,
    target: &'a str,
    recursive: bool,
}

impl<'a, P: FileProbe> Walker<'a, P> {
    pub fn new(probe: &'a P, target: &'a str, recursive: bool) -> Self {
        Self {
            probe,
            target,
            recursive,
        }
    }

    /// Stats every seed path in caller order. A stat failure at this top
    /// level aborts the whole walk for the target; everything deeper is
    /// absorbed as a partial-result condition.
    pub async fn walk(&self, seeds: &[String]) -> Result<Vec<StatEntry>, TargetError> {
        let mut entries = Vec::new();
        for seed in seeds {
            let found = self
                .stat_level(seed)
                .await
                .map_err(|err| TargetError::new(self.target, Stage::Stat, err))?;
            entries.extend(found);
        }
        Ok(entries)
    }

    /// One recursion level: stat `path`, classify each returned entry, and
    /// splice recursive results in immediately after their directory entry.
    fn stat_level<'s>(
        &'s self,
        path: &'s str,
    ) -> Pin<Box<dyn Future<Output = Result<Vec<StatEntry>>> + Send + 's>> {
        Box::pin(async move {
            let stats = self.probe.stat(path).await?;
            debug!(
                "{:?} stat {:?} returned {} entries",
                self.target,
                path,
                stats.len()
            );

            let mut out = Vec::with_capacity(stats.len());
            for mut entry in stats {
                let is_dir = match self.probe.is_dir(&entry.path).await {
                    Ok(is_dir) => is_dir,
                    Err(err) => {
                        // Non-fatal: the stat result is still valid, we just
                        // cannot confirm directory status, so never recurse.
                        error!(
                            "{}",
                            TargetError::new(
                                self.target,
                                Stage::Classify,
                                err.context(entry.path.clone())
                            )
                        );
                        out.push(entry);
                        continue;
                    }
                };
                entry.is_dir = is_dir;

                let child_path = entry.path.clone();
                out.push(entry);

                if is_dir && self.recursive {
                    match self.stat_level(&child_path).await {
                        Ok(children) => {
                            for child in &children {
                                debug!("{:?} adding file {:?}", self.target, child.path);
                            }
                            out.extend(children);
                        }
                        Err(err) => {
                            // Non-fatal: skip this subtree, keep walking.
                            error!("{:?} file {:?} stat err: {:#}", self.target, child_path, err);
                        }
                    }
                }
            }
            Ok(out)
        })
    }
}
