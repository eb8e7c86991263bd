//! Chat event router — optimistic sends, simulated replies, failure toasts.
//!
//! Per submitted message the flow is `Composing → Sending → Delivered` or
//! `Sending → Failed`:
//!
//! - the message lands in the transcript as `Pending` before the send
//!   resolves,
//! - a successful send marks it `Confirmed` and schedules a reply from a
//!   random peer 1–3 seconds later,
//! - a failed send marks it `Failed` (it stays in the transcript) and raises
//!   a destructive toast.
//!
//! Sends run concurrently on the runtime; their outcomes and the fired
//! replies are applied on the owner's thread by [`ChatRouter::pump`].

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use tokio::runtime::Handle;
use tokio::sync::mpsc;

use crate::chat::{ChatMessage, DeliveryState, Direction, Transcript};
use crate::constants::{
    AUTO_RESPONSES, BOT_NAMES, DEFAULT_TOAST_TTL_MS, REPLY_DELAY_MAX_MS, REPLY_DELAY_MIN_MS,
    SEND_FAILED_BODY, SEND_FAILED_TITLE, SYSTEM_SENDER,
};
use crate::notify::{NotificationSurface, OsNotification, PresenceSignals};
use crate::scheduler::Scheduler;
use crate::toast::{Severity, ToastId, ToastQueue, ToastRequest};
use crate::transport::{SendError, Transport};
use crate::util::now_millis;

#[derive(Clone, Debug)]
pub struct RouterConfig {
    pub reply_delay_min: Duration,
    pub reply_delay_max: Duration,
    /// Extra attempts after the first failed send.
    pub send_retries: u32,
}

impl Default for RouterConfig {
    fn default() -> Self {
        RouterConfig {
            reply_delay_min: Duration::from_millis(REPLY_DELAY_MIN_MS),
            reply_delay_max: Duration::from_millis(REPLY_DELAY_MAX_MS),
            send_retries: 0,
        }
    }
}

/// What happened during a [`ChatRouter::pump`], for the host to log.
#[derive(Clone, Debug, PartialEq)]
pub enum RouterEvent {
    Sent {
        id: String,
    },
    SendFailed {
        id: String,
        error: SendError,
        toast: ToastId,
    },
    ReplyScheduled {
        from: String,
        delay: Duration,
    },
    ReplyDelivered {
        id: String,
        from: String,
        notified: bool,
    },
    NotifyFailed {
        reason: String,
    },
}

struct SendOutcome {
    id: String,
    result: Result<(), SendError>,
}

pub struct ChatRouter<T: Transport> {
    transport: Arc<T>,
    runtime: Handle,
    config: RouterConfig,
    transcript: Transcript,
    replies: Scheduler<ChatMessage>,
    rng: StdRng,
    outcomes_tx: mpsc::UnboundedSender<SendOutcome>,
    outcomes_rx: mpsc::UnboundedReceiver<SendOutcome>,
    in_flight: HashSet<String>,
    seq: u64,
}

impl<T: Transport> ChatRouter<T> {
    pub fn new(transport: T, runtime: Handle, mut rng: StdRng, config: RouterConfig) -> Self {
        let scheduler_rng = StdRng::seed_from_u64(rng.r#gen());
        let (outcomes_tx, outcomes_rx) = mpsc::unbounded_channel();
        ChatRouter {
            transport: Arc::new(transport),
            replies: Scheduler::new(runtime.clone(), scheduler_rng),
            runtime,
            config,
            transcript: Transcript::new(),
            rng,
            outcomes_tx,
            outcomes_rx,
            in_flight: HashSet::new(),
            seq: 0,
        }
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub fn transcript(&self) -> &Transcript {
        &self.transcript
    }

    /// Sends not yet resolved.
    pub fn in_flight(&self) -> usize {
        self.in_flight.len()
    }

    /// Replies scheduled but not yet delivered.
    pub fn pending_replies(&self) -> usize {
        self.replies.pending()
    }

    /// Put the greeting messages of a fresh session into the transcript.
    pub fn seed_welcome(&mut self, username: &str) {
        let now = now_millis();
        let welcome = ChatMessage {
            id: self.next_message_id(now),
            text: "Hi! Welcome to the chat!".to_string(),
            sender: SYSTEM_SENDER.to_string(),
            timestamp: now - 60_000,
        };
        let greeting = ChatMessage {
            id: self.next_message_id(now),
            text: format!("Hi, {username}! How are you?"),
            sender: BOT_NAMES[0].to_string(),
            timestamp: now - 30_000,
        };
        self.transcript
            .push(welcome, Direction::Inbound, DeliveryState::Confirmed);
        self.transcript
            .push(greeting, Direction::Inbound, DeliveryState::Confirmed);
    }

    /// Append `text` from `sender` to the transcript and start sending it.
    /// Blank input is ignored.
    pub fn submit(&mut self, sender: &str, text: &str) -> Option<String> {
        if text.trim().is_empty() {
            return None;
        }

        let now = now_millis();
        let message = ChatMessage {
            id: self.next_message_id(now),
            text: text.to_string(),
            sender: sender.to_string(),
            timestamp: now,
        };
        let id = message.id.clone();

        self.transcript
            .push(message.clone(), Direction::Outbound, DeliveryState::Pending);
        self.in_flight.insert(id.clone());

        let transport = Arc::clone(&self.transport);
        let tx = self.outcomes_tx.clone();
        let attempts = self.config.send_retries.saturating_add(1);
        self.runtime.spawn(async move {
            let mut result = transport.send(message.clone()).await;
            for _ in 1..attempts {
                if result.is_ok() {
                    break;
                }
                result = transport.send(message.clone()).await;
            }
            let _ = tx.send(SendOutcome {
                id: message.id,
                result,
            });
        });

        Some(id)
    }

    /// Apply finished sends and due replies.
    pub fn pump(
        &mut self,
        toasts: &mut ToastQueue,
        signals: PresenceSignals,
        surface: &mut dyn NotificationSurface,
    ) -> Vec<RouterEvent> {
        let mut events = Vec::new();

        while let Ok(outcome) = self.outcomes_rx.try_recv() {
            // Torn down while the send was in flight.
            if !self.in_flight.remove(&outcome.id) {
                continue;
            }
            match outcome.result {
                Ok(()) => {
                    self.transcript
                        .mark(&outcome.id, DeliveryState::Confirmed);
                    events.push(RouterEvent::Sent {
                        id: outcome.id.clone(),
                    });
                    events.push(self.schedule_reply());
                }
                Err(error) => {
                    self.transcript.mark(&outcome.id, DeliveryState::Failed);
                    let toast = toasts.enqueue(
                        ToastRequest::new()
                            .title(SEND_FAILED_TITLE)
                            .body(SEND_FAILED_BODY)
                            .severity(Severity::Destructive)
                            .ttl(Duration::from_millis(DEFAULT_TOAST_TTL_MS)),
                    );
                    events.push(RouterEvent::SendFailed {
                        id: outcome.id,
                        error,
                        toast,
                    });
                }
            }
        }

        for reply in self.replies.drain_fired() {
            events.extend(self.deliver(reply, signals, surface));
        }

        events
    }

    /// Cancel pending replies and forget in-flight sends.
    pub fn teardown(&mut self) -> usize {
        self.in_flight.clear();
        self.replies.cancel_all()
    }

    fn schedule_reply(&mut self) -> RouterEvent {
        let text = AUTO_RESPONSES
            .choose(&mut self.rng)
            .copied()
            .unwrap_or_default();
        let from = BOT_NAMES.choose(&mut self.rng).copied().unwrap_or_default();

        let now = now_millis();
        let reply = ChatMessage {
            id: self.next_message_id(now),
            text: text.to_string(),
            sender: from.to_string(),
            timestamp: now,
        };
        let handle = self.replies.schedule(
            self.config.reply_delay_min,
            self.config.reply_delay_max,
            reply,
        );

        RouterEvent::ReplyScheduled {
            from: from.to_string(),
            delay: handle.delay(),
        }
    }

    fn deliver(
        &mut self,
        reply: ChatMessage,
        signals: PresenceSignals,
        surface: &mut dyn NotificationSurface,
    ) -> Vec<RouterEvent> {
        let mut events = Vec::new();
        let mut notified = false;

        if signals.wants_os_notification() {
            let notification =
                OsNotification::new(format!("New message from {}", reply.sender), &reply.text);
            match surface.show(&notification) {
                Ok(()) => notified = true,
                Err(err) => events.push(RouterEvent::NotifyFailed {
                    reason: format!("{err:#}"),
                }),
            }
        }

        events.push(RouterEvent::ReplyDelivered {
            id: reply.id.clone(),
            from: reply.sender.clone(),
            notified,
        });
        self.transcript
            .push(reply, Direction::Inbound, DeliveryState::Confirmed);
        events
    }

    fn next_message_id(&mut self, now: i64) -> String {
        self.seq += 1;
        format!("{now}-{}", self.seq)
    }
}
