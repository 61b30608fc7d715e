use std::sync::Arc;

use tokio::sync::mpsc;
use tracing::{debug, error};

use crate::error::{Stage, TargetError};
use crate::models::{Target, TargetOutcome};
use crate::probe::Connect;
use crate::walker::Walker;

/// Fans one unit of work out per target and joins every outcome before
/// returning. No concurrency bound beyond the target count itself.
pub struct Dispatcher<C: Connect> {
    connector: Arc<C>,
    seeds: Arc<Vec<String>>,
    recursive: bool,
}

impl<C> Dispatcher<C>
where
    C: Connect + 'static,
    C::Session: Send + Sync + 'static,
{
    pub fn new(connector: C, seeds: Vec<String>, recursive: bool) -> Self {
        Self {
            connector: Arc::new(connector),
            seeds: Arc::new(seeds),
            recursive,
        }
    }

    /// Runs every target concurrently. Returns exactly one outcome per
    /// target, in completion order. Each target runs in its own task, so a
    /// failure or panic in one never touches the others; the task is its
    /// unit's cancellable scope and is aborted as soon as its outcome has
    /// been received.
    pub async fn run(&self, targets: &[Target]) -> Vec<TargetOutcome> {
        let n = targets.len();
        if n == 0 {
            return Vec::new();
        }

        let (tx, mut rx) = mpsc::channel::<(usize, TargetOutcome)>(n);
        let mut handles = Vec::with_capacity(n);

        for (idx, target) in targets.iter().cloned().enumerate() {
            let tx = tx.clone();
            let connector = Arc::clone(&self.connector);
            let seeds = Arc::clone(&self.seeds);
            let recursive = self.recursive;
            handles.push(Some(tokio::spawn(async move {
                let outcome = run_target(connector.as_ref(), &target, &seeds, recursive).await;
                // capacity is n and each producer sends once, so this
                // cannot block
                let _ = tx.send((idx, outcome)).await;
            })));
        }
        drop(tx);

        let mut outcomes = Vec::with_capacity(n);
        while let Some((idx, outcome)) = rx.recv().await {
            debug!("collected outcome for {:?}", outcome.target());
            // the unit is done; tear its scope down promptly
            if let Some(handle) = handles[idx].take() {
                handle.abort();
            }
            outcomes.push(outcome);
        }

        // A producer that never sent must have panicked. Its target still
        // owes the caller an outcome.
        for (idx, slot) in handles.iter_mut().enumerate() {
            let Some(handle) = slot.take() else { continue };
            if let Err(err) = handle.await {
                let failure = TargetError::new(
                    &targets[idx].address,
                    Stage::Stat,
                    anyhow::anyhow!("target worker panicked: {}", err),
                );
                error!("{}", failure);
                outcomes.push(TargetOutcome::Failure(failure));
            }
        }

        outcomes
    }
}

/// One target's unit of work: connect, then walk every seed path.
async fn run_target<C>(
    connector: &C,
    target: &Target,
    seeds: &[String],
    recursive: bool,
) -> TargetOutcome
where
    C: Connect,
{
    let session = match connector.connect(target).await {
        Ok(session) => session,
        Err(err) => {
            let failure = TargetError::new(&target.address, Stage::Connect, err);
            error!("{}", failure);
            return TargetOutcome::Failure(failure);
        }
    };

    let walker = Walker::new(&session, &target.address, recursive);
    match walker.walk(seeds).await {
        Ok(entries) => TargetOutcome::Success {
            target: target.address.clone(),
            entries,
        },
        Err(failure) => {
            error!("{}", failure);
            TargetOutcome::Failure(failure)
        }
    }
}
