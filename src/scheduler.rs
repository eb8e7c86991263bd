//! Delayed task scheduler — one-shot timers with a randomized delay.
//!
//! Each scheduled task sleeps on the tokio runtime and, when it wakes, sends
//! its payload back to the owner over an [`mpsc`] channel.  The owner is the
//! only place where payloads are acted upon, so callbacks never run
//! concurrently with each other.
//!
//! A payload is released to the owner only while its task is still armed:
//! a task cancelled after its timer elapsed, but before the owner drained
//! the channel, is dropped on the floor.

use std::collections::HashMap;
use std::time::Duration;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tokio::runtime::Handle;
use tokio::sync::mpsc;
use tokio::task::AbortHandle;

/// Identity of a scheduled task, unique per scheduler.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TaskId(u64);

/// Cancellation handle returned by [`Scheduler::schedule`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TaskHandle {
    id: TaskId,
    delay: Duration,
}

impl TaskHandle {
    /// The delay that was drawn for this task.
    pub fn delay(&self) -> Duration {
        self.delay
    }
}

struct Fired<T> {
    id: TaskId,
    payload: T,
}

/// Owner-side half of the timer machinery.
pub struct Scheduler<T> {
    runtime: Handle,
    rng: StdRng,
    next_id: u64,
    armed: HashMap<TaskId, AbortHandle>,
    tx: mpsc::UnboundedSender<Fired<T>>,
    rx: mpsc::UnboundedReceiver<Fired<T>>,
}

impl<T: Send + 'static> Scheduler<T> {
    /// Create a scheduler that spawns its timers on `runtime` and draws
    /// delays from `rng`.
    pub fn new(runtime: Handle, rng: StdRng) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        Scheduler {
            runtime,
            rng,
            next_id: 0,
            armed: HashMap::new(),
            tx,
            rx,
        }
    }

    /// A scheduler for owners that only arm fixed delays through
    /// [`Scheduler::schedule_after`].  Its rng is never drawn from.
    pub fn fixed(runtime: Handle) -> Self {
        Self::new(runtime, StdRng::seed_from_u64(0))
    }

    /// Arm a one-shot task firing after a uniformly random delay in
    /// `[min, max]`.  When `max <= min` the delay is exactly `min`.
    pub fn schedule(&mut self, min: Duration, max: Duration, payload: T) -> TaskHandle {
        let delay = if max <= min {
            min
        } else {
            self.rng.gen_range(min..=max)
        };
        self.schedule_after(delay, payload)
    }

    /// Arm a one-shot task firing after exactly `delay`.
    pub fn schedule_after(&mut self, delay: Duration, payload: T) -> TaskHandle {
        self.next_id += 1;
        let id = TaskId(self.next_id);
        let tx = self.tx.clone();

        let task = self.runtime.spawn(async move {
            tokio::time::sleep(delay).await;
            // The owner may already be gone; nothing left to notify then.
            let _ = tx.send(Fired { id, payload });
        });

        self.armed.insert(id, task.abort_handle());
        TaskHandle { id, delay }
    }

    /// Cancel a task.  Returns `false` when the handle had already fired or
    /// been cancelled; that is not an error.
    pub fn cancel(&mut self, handle: TaskHandle) -> bool {
        match self.armed.remove(&handle.id) {
            Some(abort) => {
                abort.abort();
                true
            }
            None => false,
        }
    }

    /// Cancel every armed task.
    pub fn cancel_all(&mut self) -> usize {
        let count = self.armed.len();
        for (_, abort) in self.armed.drain() {
            abort.abort();
        }
        count
    }

    /// Number of tasks not yet delivered or cancelled.
    pub fn pending(&self) -> usize {
        self.armed.len()
    }

    /// Collect every payload whose timer has elapsed, without waiting.
    pub fn drain_fired(&mut self) -> Vec<T> {
        let mut out = Vec::new();
        while let Ok(fired) = self.rx.try_recv() {
            if let Some(payload) = self.claim(fired) {
                out.push(payload);
            }
        }
        out
    }

    fn claim(&mut self, fired: Fired<T>) -> Option<T> {
        self.armed.remove(&fired.id).map(|_| fired.payload)
    }
}

impl<T> Drop for Scheduler<T> {
    fn drop(&mut self) {
        for (_, abort) in self.armed.drain() {
            abort.abort();
        }
    }
}
