//! Chat session — the owning context for the toast queue and the router.
//!
//! A session lives from the moment the user picks a name until the app
//! quits.  Everything with a timer hangs off it, so [`Session::teardown`]
//! (also run on drop) is enough to guarantee no callback fires into a
//! session that no longer exists.

use tokio::runtime::Handle;

use crate::config::AppConfig;
use crate::notify::{NotificationSurface, PresenceSignals};
use crate::router::{ChatRouter, RouterEvent};
use crate::toast::{ToastId, ToastQueue, ToastRequest};
use crate::transport::Transport;
use crate::util::seeded_rng;

/// Everything that changed during one [`Session::pump`].
#[derive(Debug, Default)]
pub struct Pumped {
    pub router: Vec<RouterEvent>,
    pub expired: Vec<ToastId>,
}

impl Pumped {
    pub fn is_empty(&self) -> bool {
        self.router.is_empty() && self.expired.is_empty()
    }
}

pub struct Session<T: Transport> {
    username: Option<String>,
    toasts: ToastQueue,
    router: ChatRouter<T>,
    closed: bool,
}

impl<T: Transport> Session<T> {
    pub fn new(config: &AppConfig, runtime: Handle, transport: T) -> Self {
        Session {
            username: None,
            toasts: ToastQueue::with_limits(runtime.clone(), config.toast_limit, config.toast_ttl()),
            router: ChatRouter::new(
                transport,
                runtime,
                seeded_rng(config.rng_seed),
                config.router_config(),
            ),
            closed: false,
        }
    }

    pub fn username(&self) -> Option<&str> {
        self.username.as_deref()
    }

    /// Join the chat under `name`.  The first join seeds the welcome
    /// messages; later calls just rename.
    pub fn join(&mut self, name: &str) -> bool {
        let name = name.trim();
        if name.is_empty() || self.closed {
            return false;
        }
        if self.username.is_none() {
            self.router.seed_welcome(name);
        }
        self.username = Some(name.to_string());
        true
    }

    /// Send `text` as the current user.  Ignored before [`Session::join`].
    pub fn submit(&mut self, text: &str) -> Option<String> {
        if self.closed {
            return None;
        }
        let sender = self.username.clone()?;
        self.router.submit(&sender, text)
    }

    pub fn toast(&mut self, request: ToastRequest) -> ToastId {
        self.toasts.enqueue(request)
    }

    pub fn pump(
        &mut self,
        signals: PresenceSignals,
        surface: &mut dyn NotificationSurface,
    ) -> Pumped {
        if self.closed {
            return Pumped::default();
        }
        let router = self.router.pump(&mut self.toasts, signals, surface);
        let expired = self.toasts.pump();
        Pumped { router, expired }
    }

    pub fn toasts(&self) -> &ToastQueue {
        &self.toasts
    }

    pub fn toasts_mut(&mut self) -> &mut ToastQueue {
        &mut self.toasts
    }

    pub fn router(&self) -> &ChatRouter<T> {
        &self.router
    }

    /// Cancel every outstanding timer.  Safe to call more than once.
    pub fn teardown(&mut self) -> usize {
        self.closed = true;
        self.router.teardown() + self.toasts.dismiss_all()
    }
}

impl<T: Transport> Drop for Session<T> {
    fn drop(&mut self) {
        self.teardown();
    }
}
