use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

// one-way stop signal shared by the dispatcher and the aggregator.
// clones observe the same state.
#[derive(Clone, Debug, Default)]
pub struct CancellationFlag {
    triggered: Arc<AtomicBool>,
}

impl CancellationFlag {
    pub fn new() -> Self {
        Self::default()
    }

    /// Moves the flag to the triggered state. Returns `true` only for the call
    /// that performed the transition.
    pub fn trigger(&self) -> bool {
        !self.triggered.swap(true, Ordering::SeqCst)
    }

    pub fn is_triggered(&self) -> bool {
        self.triggered.load(Ordering::SeqCst)
    }
}

// listens for Ctrl-C for the lifetime of the runtime. the first signal trips the
// flag, later ones are ignored so the summary still gets printed.
pub fn install_interrupt_handler(flag: CancellationFlag) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        loop {
            if let Err(e) = tokio::signal::ctrl_c().await {
                tracing::warn!(error = %e, "could not listen for interrupt signal");
                return;
            }
            if flag.trigger() {
                tracing::info!("interrupt received, finishing in-flight requests");
            }
        }
    })
}
