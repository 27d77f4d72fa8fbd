//! Blocking call bridge
//!
//! Every driver call in this crate is blocking. [`BlockingBridge`] owns a
//! fixed set of OS worker threads and ships blocking closures to them over a
//! channel; the async caller awaits the result on a oneshot without ever
//! occupying a runtime thread. The worker count bounds how many driver calls
//! can run at once, so a traffic spike queues work instead of spawning
//! threads.
//!
//! No ordering is guaranteed between concurrently submitted jobs. A caller
//! that goes away mid-flight does not abort its job: a started job always
//! runs to completion and the unread result is dropped, so pool and
//! connection state stay consistent.

use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::mpsc;
use std::sync::Arc;
use std::thread;

use parking_lot::Mutex;
use tokio::sync::oneshot;
use tracing::{debug, error};

use crate::error::{DbError, DbResult};

type Job = Box<dyn FnOnce() + Send + 'static>;

/// Bounded worker pool for blocking database work
///
/// Cloning is cheap and shares the same workers.
#[derive(Clone)]
pub struct BlockingBridge {
    inner: Arc<BridgeInner>,
}

struct BridgeInner {
    /// `None` once the bridge has been shut down
    sender: Mutex<Option<mpsc::Sender<Job>>>,
    workers: Mutex<Vec<thread::JoinHandle<()>>>,
}

impl BlockingBridge {
    /// Spawn `worker_count` worker threads
    pub fn new(worker_count: usize) -> DbResult<Self> {
        let worker_count = worker_count.max(1);
        let (sender, receiver) = mpsc::channel::<Job>();
        let receiver = Arc::new(Mutex::new(receiver));

        let mut workers = Vec::with_capacity(worker_count);
        for id in 0..worker_count {
            let receiver = Arc::clone(&receiver);
            let handle = thread::Builder::new()
                .name(format!("brain-db-worker-{id}"))
                .spawn(move || worker_loop(&receiver))
                .map_err(|e| DbError::Connection(e.to_string()))?;
            workers.push(handle);
        }

        debug!(worker_count, "blocking bridge started");

        Ok(Self {
            inner: Arc::new(BridgeInner {
                sender: Mutex::new(Some(sender)),
                workers: Mutex::new(workers),
            }),
        })
    }

    /// Run a blocking operation on a worker and await its result
    ///
    /// The closure's error is propagated as-is. A panicking closure is caught
    /// on the worker and surfaced as [`DbError::Connection`]; submitting
    /// after [`shutdown`](Self::shutdown) fails with [`DbError::PoolClosed`].
    pub async fn run<T, F>(&self, operation: F) -> DbResult<T>
    where
        F: FnOnce() -> DbResult<T> + Send + 'static,
        T: Send + 'static,
    {
        let (tx, rx) = oneshot::channel();

        let job: Job = Box::new(move || {
            let result = catch_unwind(AssertUnwindSafe(operation)).unwrap_or_else(|_| {
                error!("blocking worker caught a panicking database operation");
                Err(DbError::Connection(
                    "blocking database operation panicked".to_string(),
                ))
            });
            // The caller may have been cancelled; the job still ran to
            // completion and its result is simply dropped.
            let _ = tx.send(result);
        });

        {
            let sender = self.inner.sender.lock();
            match sender.as_ref() {
                Some(s) => s.send(job).map_err(|_| DbError::PoolClosed)?,
                None => return Err(DbError::PoolClosed),
            }
        }

        rx.await.map_err(|_| DbError::PoolClosed)?
    }

    /// Shut the bridge down: close the queue, drain outstanding jobs, and
    /// join the workers
    ///
    /// Idempotent. Jobs already queued run to completion before the workers
    /// exit.
    pub fn shutdown(&self) {
        let sender = self.inner.sender.lock().take();
        if sender.is_none() {
            return;
        }
        drop(sender);

        let workers = std::mem::take(&mut *self.inner.workers.lock());
        for handle in workers {
            if handle.join().is_err() {
                error!("blocking worker exited with a panic");
            }
        }

        debug!("blocking bridge shut down");
    }
}

fn worker_loop(receiver: &Arc<Mutex<mpsc::Receiver<Job>>>) {
    loop {
        // Hold the lock only for the receive itself, never while running a job
        let job = {
            let guard = receiver.lock();
            guard.recv()
        };
        match job {
            Ok(job) => job(),
            // Channel closed and drained: shutdown
            Err(_) => break,
        }
    }
}
