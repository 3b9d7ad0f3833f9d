use std::sync::Arc;
use std::time::Duration;

use futures::stream::FuturesUnordered;
use futures::StreamExt;
use tokio::sync::mpsc;
use tokio::task::{self, JoinError};

use crate::cancel::CancellationFlag;
use crate::executor::{self, ProbeResult, Target, Task};

#[derive(Clone, Debug)]
pub struct DispatchConfig {
    pub threads: usize,
    pub timeout: Duration,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct DispatchOutcome {
    pub submitted: usize,
    pub stopped_early: bool,
    /// Most worker handles held at any one time. Never exceeds the pool width.
    pub peak_in_flight: usize,
}

fn reap(res: Result<(), JoinError>) {
    if let Err(e) = res {
        tracing::warn!(error = %e, "worker task failed");
    }
}

// submits one task per word, in wordlist order, onto `threads` concurrent slots.
// a slot frees up when its worker finishes and the worker's handle is reaped,
// so memory stays bounded by the pool width rather than the wordlist length.
// the cancellation flag is checked before every submission; tasks that were
// already submitted always run to completion. returns once every submitted
// task has finished. the sender is dropped on return, which closes the result
// channel once the last worker is done.
pub async fn dispatch(
    client: reqwest::Client,
    target: Arc<Target>,
    words: Vec<String>,
    config: DispatchConfig,
    tx: mpsc::Sender<ProbeResult>,
    cancel: CancellationFlag,
) -> DispatchOutcome {
    let width = config.threads.max(1);
    let mut workers = FuturesUnordered::new();
    let mut outcome = DispatchOutcome::default();

    for word in words {
        if cancel.is_triggered() {
            outcome.stopped_early = true;
            break;
        }
        while workers.len() >= width {
            if let Some(res) = workers.next().await {
                reap(res);
            }
        }
        // waiting for a free slot can take up to a full request timeout
        if cancel.is_triggered() {
            outcome.stopped_early = true;
            break;
        }

        let task = Task {
            target: target.clone(),
            path_segment: word,
            timeout: config.timeout,
        };
        let client = client.clone();
        let tx = tx.clone();
        workers.push(task::spawn(executor::run_task(client, task, tx)));
        outcome.submitted += 1;
        outcome.peak_in_flight = outcome.peak_in_flight.max(workers.len());
    }
    drop(tx);

    if outcome.stopped_early {
        tracing::info!(
            submitted = outcome.submitted,
            "cancellation requested, no further tasks submitted"
        );
    }

    while let Some(res) = workers.next().await {
        reap(res);
    }
    outcome
}
