//! Toast manager — a bounded queue of transient, self-expiring notices.
//!
//! # Invariants
//! - At most `limit` toasts are live; overflow evicts the oldest first.
//! - Every live toast has exactly one armed expiry timer, and a removed
//!   toast has none.
//! - Display order is insertion order.

use std::collections::{HashMap, VecDeque};
use std::fmt;
use std::time::Duration;

use chrono::{DateTime, Local};
use tokio::runtime::Handle;

use crate::constants::{DEFAULT_TOAST_TTL_MS, TOAST_ID_WRAP, TOAST_LIMIT};
use crate::scheduler::{Scheduler, TaskHandle};

/// Opaque toast identity, unique for the lifetime of the queue (modulo
/// wraparound at 2^53 - 1).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ToastId(u64);

impl ToastId {
    pub fn get(self) -> u64 {
        self.0
    }
}

impl From<u64> for ToastId {
    fn from(raw: u64) -> Self {
        ToastId(raw)
    }
}

impl fmt::Display for ToastId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Severity {
    #[default]
    Normal,
    Destructive,
}

/// What a caller asks for.  Everything is optional.
#[derive(Clone, Debug, Default)]
pub struct ToastRequest {
    pub title: Option<String>,
    pub body: Option<String>,
    pub severity: Severity,
    pub ttl: Option<Duration>,
}

impl ToastRequest {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    pub fn body(mut self, body: impl Into<String>) -> Self {
        self.body = Some(body.into());
        self
    }

    pub fn severity(mut self, severity: Severity) -> Self {
        self.severity = severity;
        self
    }

    pub fn ttl(mut self, ttl: Duration) -> Self {
        self.ttl = Some(ttl);
        self
    }
}

/// A live toast.  Never edited after creation.
#[derive(Clone, Debug)]
pub struct Toast {
    pub id: ToastId,
    pub title: Option<String>,
    pub body: Option<String>,
    pub severity: Severity,
    pub ttl: Duration,
    pub created_at: DateTime<Local>,
}

/// The notification queue.  Owns the expiry timers of its toasts.
pub struct ToastQueue {
    items: VecDeque<Toast>,
    timers: HashMap<ToastId, TaskHandle>,
    scheduler: Scheduler<ToastId>,
    counter: u64,
    limit: usize,
    default_ttl: Duration,
}

impl ToastQueue {
    pub fn new(runtime: Handle) -> Self {
        Self::with_limits(
            runtime,
            TOAST_LIMIT,
            Duration::from_millis(DEFAULT_TOAST_TTL_MS),
        )
    }

    /// A zero `limit` is raised to one; a zero `default_ttl` means the
    /// built-in 5000 ms, same as a zero per-toast ttl.
    pub fn with_limits(runtime: Handle, limit: usize, default_ttl: Duration) -> Self {
        let default_ttl = if default_ttl.is_zero() {
            Duration::from_millis(DEFAULT_TOAST_TTL_MS)
        } else {
            default_ttl
        };
        ToastQueue {
            items: VecDeque::new(),
            timers: HashMap::new(),
            scheduler: Scheduler::fixed(runtime),
            counter: 0,
            limit: limit.max(1),
            default_ttl,
        }
    }

    /// Show a toast and arm its expiry.  Never fails: overflow evicts the
    /// oldest live toasts instead of rejecting the new one.
    pub fn enqueue(&mut self, request: ToastRequest) -> ToastId {
        let id = self.next_id();
        // A zero ttl counts as "not given".
        let ttl = request
            .ttl
            .filter(|ttl| !ttl.is_zero())
            .unwrap_or(self.default_ttl);

        self.items.push_back(Toast {
            id,
            title: request.title,
            body: request.body,
            severity: request.severity,
            ttl,
            created_at: Local::now(),
        });

        while self.items.len() > self.limit {
            if let Some(evicted) = self.items.pop_front() {
                self.disarm(evicted.id);
            }
        }

        let timer = self.scheduler.schedule_after(ttl, id);
        self.timers.insert(id, timer);
        id
    }

    /// Remove one toast early.  Unknown ids are ignored.
    pub fn dismiss(&mut self, id: ToastId) -> bool {
        let Some(pos) = self.items.iter().position(|toast| toast.id == id) else {
            return false;
        };
        self.items.remove(pos);
        self.disarm(id);
        true
    }

    /// Remove every toast and cancel every timer.
    pub fn dismiss_all(&mut self) -> usize {
        let count = self.items.len();
        self.items.clear();
        self.timers.clear();
        self.scheduler.cancel_all();
        count
    }

    /// Apply elapsed expiries.  Returns the ids that were removed.
    pub fn pump(&mut self) -> Vec<ToastId> {
        let mut expired = Vec::new();
        for id in self.scheduler.drain_fired() {
            // The scheduler already consumed the timer.
            self.timers.remove(&id);
            if let Some(pos) = self.items.iter().position(|toast| toast.id == id) {
                self.items.remove(pos);
                expired.push(id);
            }
        }
        expired
    }

    /// Live toasts, oldest first.
    pub fn items(&self) -> impl Iterator<Item = &Toast> {
        self.items.iter()
    }

    pub fn get(&self, id: ToastId) -> Option<&Toast> {
        self.items.iter().find(|toast| toast.id == id)
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Number of armed expiry timers.
    pub fn armed_timers(&self) -> usize {
        self.scheduler.pending()
    }

    fn disarm(&mut self, id: ToastId) {
        if let Some(timer) = self.timers.remove(&id) {
            self.scheduler.cancel(timer);
        }
    }

    fn next_id(&mut self) -> ToastId {
        self.counter = (self.counter + 1) % TOAST_ID_WRAP;
        if self.counter == 0 {
            self.counter = 1;
        }
        ToastId(self.counter)
    }
}

impl Drop for ToastQueue {
    fn drop(&mut self) {
        self.dismiss_all();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scheduler::tests::advance;

    fn queue() -> ToastQueue {
        ToastQueue::new(Handle::current())
    }

    fn titled(title: &str) -> ToastRequest {
        ToastRequest::new().title(title)
    }

    fn titles(queue: &ToastQueue) -> Vec<String> {
        queue
            .items()
            .filter_map(|toast| toast.title.clone())
            .collect()
    }

    #[tokio::test(flavor = "current_thread", start_paused = true)]
    async fn sixth_toast_evicts_the_oldest() {
        let mut q = queue();
        for title in ["A", "B", "C", "D", "E", "F"] {
            q.enqueue(titled(title));
        }
        assert_eq!(titles(&q), ["B", "C", "D", "E", "F"]);
        assert_eq!(q.armed_timers(), 5);
    }

    #[tokio::test(flavor = "current_thread", start_paused = true)]
    async fn live_set_never_exceeds_the_cap() {
        let mut q = queue();
        for i in 0..40 {
            q.enqueue(titled(&i.to_string()));
            assert!(q.len() <= TOAST_LIMIT);
            assert_eq!(q.len(), q.armed_timers());
        }
        assert_eq!(titles(&q), ["35", "36", "37", "38", "39"]);
    }

    #[tokio::test(flavor = "current_thread", start_paused = true)]
    async fn default_ttl_expires_after_five_seconds() {
        let mut q = queue();
        let id = q.enqueue(titled("hello"));
        assert_eq!(q.get(id).map(|t| t.ttl), Some(Duration::from_millis(5000)));

        advance(4999).await;
        assert!(q.pump().is_empty());
        assert_eq!(q.len(), 1);

        advance(1).await;
        assert_eq!(q.pump(), vec![id]);
        assert!(q.is_empty());
        assert_eq!(q.armed_timers(), 0);
    }

    #[tokio::test(flavor = "current_thread", start_paused = true)]
    async fn zero_ttl_falls_back_to_default() {
        let mut q = queue();
        let id = q.enqueue(titled("zero").ttl(Duration::ZERO));
        assert_eq!(q.get(id).map(|t| t.ttl), Some(Duration::from_millis(5000)));
    }

    #[tokio::test(flavor = "current_thread", start_paused = true)]
    async fn zero_configured_default_uses_five_seconds() {
        let mut q = ToastQueue::with_limits(Handle::current(), 0, Duration::ZERO);
        let id = q.enqueue(titled("configured"));
        assert_eq!(q.get(id).map(|t| t.ttl), Some(Duration::from_millis(5000)));

        advance(1).await;
        assert!(q.pump().is_empty());
        assert_eq!(q.len(), 1);

        advance(4999).await;
        assert_eq!(q.pump(), vec![id]);

        // A zero limit still keeps the newest toast.
        q.enqueue(titled("a"));
        q.enqueue(titled("b"));
        assert_eq!(titles(&q), ["b"]);
    }

    #[tokio::test(flavor = "current_thread", start_paused = true)]
    async fn custom_ttl_is_honoured() {
        let mut q = queue();
        let short = q.enqueue(titled("short").ttl(Duration::from_millis(500)));
        let long = q.enqueue(titled("long"));

        advance(500).await;
        assert_eq!(q.pump(), vec![short]);
        assert!(q.get(long).is_some());
    }

    #[tokio::test(flavor = "current_thread", start_paused = true)]
    async fn dismissed_toast_never_expires_later() {
        let mut q = queue();
        let id = q.enqueue(titled("bye"));
        assert!(q.dismiss(id));
        assert!(!q.dismiss(id));
        assert_eq!(q.armed_timers(), 0);

        advance(6000).await;
        assert!(q.pump().is_empty());
    }

    #[tokio::test(flavor = "current_thread", start_paused = true)]
    async fn dismiss_unknown_id_is_a_noop() {
        let mut q = queue();
        q.enqueue(titled("stay"));
        assert!(!q.dismiss(ToastId::from(999)));
        assert_eq!(q.len(), 1);
    }

    #[tokio::test(flavor = "current_thread", start_paused = true)]
    async fn evicted_toast_timer_is_cancelled() {
        let mut q = queue();
        let first = q.enqueue(titled("first").ttl(Duration::from_millis(100)));
        for i in 0..5 {
            q.enqueue(titled(&i.to_string()));
        }
        assert!(q.get(first).is_none());

        advance(200).await;
        assert!(q.pump().is_empty());
        assert_eq!(q.len(), 5);
    }

    #[tokio::test(flavor = "current_thread", start_paused = true)]
    async fn dismiss_all_then_fresh_start() {
        let mut q = queue();
        for i in 0..3 {
            q.enqueue(titled(&i.to_string()).ttl(Duration::from_millis(1000)));
        }
        assert_eq!(q.dismiss_all(), 3);
        assert!(q.is_empty());
        assert_eq!(q.armed_timers(), 0);

        advance(500).await;
        let fresh = q.enqueue(titled("fresh").ttl(Duration::from_millis(1000)));

        // The old timers would have fired at 1000ms; none of them may touch
        // the new toast.
        advance(600).await;
        assert!(q.pump().is_empty());
        assert_eq!(titles(&q), ["fresh"]);

        advance(400).await;
        assert_eq!(q.pump(), vec![fresh]);
    }

    #[tokio::test(flavor = "current_thread", start_paused = true)]
    async fn ids_increase_and_wrap() {
        let mut q = queue();
        let a = q.enqueue(titled("a"));
        let b = q.enqueue(titled("b"));
        assert!(b > a);
        q.dismiss_all();

        q.counter = TOAST_ID_WRAP - 1;
        assert_eq!(q.enqueue(titled("c")).get(), 1);
        assert_eq!(q.enqueue(titled("d")).get(), 2);
    }

    #[tokio::test(flavor = "current_thread", start_paused = true)]
    async fn destructive_severity_is_kept() {
        let mut q = queue();
        let id = q.enqueue(
            ToastRequest::new()
                .title("oops")
                .body("details")
                .severity(Severity::Destructive),
        );
        let toast = q.get(id).cloned();
        assert_eq!(toast.as_ref().map(|t| t.severity), Some(Severity::Destructive));
        assert_eq!(toast.and_then(|t| t.body), Some("details".to_string()));
    }
}
