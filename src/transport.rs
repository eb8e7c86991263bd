//! Outbound message transport — the opaque, fallible "send" operation.

use std::future::Future;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use crate::chat::ChatMessage;
use crate::constants::SEND_DELAY_MS;

#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum SendError {
    #[error("message rejected: {0}")]
    Rejected(String),
    #[error("peer unreachable")]
    Unreachable,
}

/// Something that can deliver a chat message.  Sends run concurrently on
/// the runtime, so implementations must be shareable across tasks.
pub trait Transport: Send + Sync + 'static {
    fn send(&self, message: ChatMessage) -> impl Future<Output = Result<(), SendError>> + Send;
}

/// Stand-in for a real network: waits a fixed latency, then succeeds unless
/// failure mode is switched on.
#[derive(Clone, Debug)]
pub struct SimulatedTransport {
    delay: Duration,
    fail: Arc<AtomicBool>,
}

impl SimulatedTransport {
    pub fn new(delay: Duration) -> Self {
        SimulatedTransport {
            delay,
            fail: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Make every following send fail (or succeed again).
    pub fn set_failing(&self, fail: bool) {
        self.fail.store(fail, Ordering::Relaxed);
    }

    pub fn is_failing(&self) -> bool {
        self.fail.load(Ordering::Relaxed)
    }
}

impl Default for SimulatedTransport {
    fn default() -> Self {
        Self::new(Duration::from_millis(SEND_DELAY_MS))
    }
}

impl Transport for SimulatedTransport {
    async fn send(&self, _message: ChatMessage) -> Result<(), SendError> {
        tokio::time::sleep(self.delay).await;
        if self.is_failing() {
            return Err(SendError::Unreachable);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn message() -> ChatMessage {
        ChatMessage {
            id: "1".to_string(),
            text: "hi".to_string(),
            sender: "Sam".to_string(),
            timestamp: 0,
        }
    }

    #[tokio::test(flavor = "current_thread", start_paused = true)]
    async fn simulated_send_takes_its_delay() {
        let transport = SimulatedTransport::default();
        let started = tokio::time::Instant::now();
        assert_eq!(transport.send(message()).await, Ok(()));
        assert_eq!(started.elapsed(), Duration::from_millis(SEND_DELAY_MS));
    }

    #[tokio::test(flavor = "current_thread", start_paused = true)]
    async fn failing_mode_is_shared_between_clones() {
        let transport = SimulatedTransport::default();
        let clone = transport.clone();
        clone.set_failing(true);
        assert_eq!(transport.send(message()).await, Err(SendError::Unreachable));
    }
}
