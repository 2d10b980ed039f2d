//! Fire-and-forget execution of work that outlives a request.
//!
//! The stale-serving path answers the client from cache and hands the actual
//! refresh to a [`Spawner`]. Two promises define the contract:
//!
//! - the task keeps running after the response has been written, and
//! - its outcome (success or failure) never surfaces to the request that
//!   scheduled it.
//!
//! Production code uses [`TokioSpawner`]; tests substitute a spawner that
//! queues tasks so they can be driven deterministically.

use std::future::Future;
use std::pin::Pin;

/// A detached unit of work.
pub type Task = Pin<Box<dyn Future<Output = ()> + Send + 'static>>;

/// Runs tasks independently of the request that scheduled them.
pub trait Spawner: Send + Sync {
    /// Submits a task. Must not block, and must not report the task's outcome.
    fn spawn(&self, task: Task);
}

/// Spawns tasks onto the ambient tokio runtime.
#[derive(Debug, Clone, Copy, Default)]
pub struct TokioSpawner;

impl Spawner for TokioSpawner {
    fn spawn(&self, task: Task) {
        tokio::spawn(task);
    }
}
