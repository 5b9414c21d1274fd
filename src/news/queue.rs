//! Serialized dispatch of overview-generation calls.
//!
//! At most one unit is in flight at a time and consecutive dispatches are
//! spaced by a minimum interval, no matter how many callers enqueue
//! concurrently. A single drain task owns the loop; a `draining` flag
//! prevents a second one from starting. A failing unit is settled with its
//! error and the loop moves on.

use std::collections::VecDeque;
use std::future::Future;
use std::pin::Pin;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use metrics::gauge;
use tokio::sync::oneshot;
use tracing::warn;

use crate::news::transport::GenerationError;

pub type UnitFuture = Pin<Box<dyn Future<Output = Result<String, GenerationError>> + Send>>;

struct Pending {
    thunk: Box<dyn FnOnce() -> UnitFuture + Send>,
    settle: oneshot::Sender<Result<String, GenerationError>>,
}

struct Inner {
    pending: VecDeque<Pending>,
    draining: bool,
    last_dispatch: Option<tokio::time::Instant>,
}

pub struct DispatchQueue {
    min_interval: Duration,
    unit_timeout: Duration,
    inner: Mutex<Inner>,
}

impl DispatchQueue {
    pub fn new(min_interval: Duration, unit_timeout: Duration) -> Arc<Self> {
        Arc::new(Self {
            min_interval,
            unit_timeout,
            inner: Mutex::new(Inner {
                pending: VecDeque::new(),
                draining: false,
                last_dispatch: None,
            }),
        })
    }

    /// Enqueue a unit and await its settlement. FIFO relative to other
    /// submissions.
    pub async fn submit<F>(self: &Arc<Self>, thunk: F) -> Result<String, GenerationError>
    where
        F: FnOnce() -> UnitFuture + Send + 'static,
    {
        let (tx, rx) = oneshot::channel();
        let start_drain = {
            let mut g = self.inner.lock().expect("dispatch queue mutex poisoned");
            g.pending.push_back(Pending {
                thunk: Box::new(thunk),
                settle: tx,
            });
            gauge!("overview_queue_depth").set(g.pending.len() as f64);
            if g.draining {
                false
            } else {
                g.draining = true;
                true
            }
        };

        if start_drain {
            let queue = Arc::clone(self);
            tokio::spawn(async move { queue.drain().await });
        }

        match rx.await {
            Ok(result) => result,
            // Drain task died before settling; treat like any other failure.
            Err(_) => Err(GenerationError::Network("dispatch queue dropped the unit".into())),
        }
    }

    async fn drain(self: Arc<Self>) {
        loop {
            let (entry, wait) = {
                let mut g = self.inner.lock().expect("dispatch queue mutex poisoned");
                match g.pending.pop_front() {
                    Some(entry) => {
                        gauge!("overview_queue_depth").set(g.pending.len() as f64);
                        let wait = match g.last_dispatch {
                            Some(at) => self.min_interval.saturating_sub(at.elapsed()),
                            None => Duration::ZERO,
                        };
                        (entry, wait)
                    }
                    None => {
                        g.draining = false;
                        return;
                    }
                }
            };

            if !wait.is_zero() {
                tokio::time::sleep(wait).await;
            }

            let result = match tokio::time::timeout(self.unit_timeout, (entry.thunk)()).await {
                Ok(result) => result,
                Err(_) => Err(GenerationError::TimedOut),
            };

            {
                let mut g = self.inner.lock().expect("dispatch queue mutex poisoned");
                g.last_dispatch = Some(tokio::time::Instant::now());
            }

            if let Err(e) = &result {
                warn!(error = %e, "overview dispatch failed");
            }
            // Caller may have given up; nothing to do if the receiver is gone.
            let _ = entry.settle.send(result);
        }
    }
}
