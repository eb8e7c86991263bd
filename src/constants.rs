//! Compile-time constants and tunables shared across the crate.

/// Application name used for config and cache directories.
pub const APP_NAME: &str = "chatpulse";
/// Application version injected from `Cargo.toml` at compile time.
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

// ── Notification queue ───────────────────────────────────────────────

/// Maximum number of toasts visible at once.
pub const TOAST_LIMIT: usize = 5;
/// Time-to-live applied to toasts that don't carry their own.
pub const DEFAULT_TOAST_TTL_MS: u64 = 5000;
/// Toast ids wrap back to 1 after this value (2^53 - 1).
pub const TOAST_ID_WRAP: u64 = (1 << 53) - 1;

// ── Chat routing ─────────────────────────────────────────────────────

/// Shortest delay before a simulated reply shows up.
pub const REPLY_DELAY_MIN_MS: u64 = 1000;
/// Longest delay before a simulated reply shows up.
pub const REPLY_DELAY_MAX_MS: u64 = 3000;
/// Artificial latency of the simulated send.
pub const SEND_DELAY_MS: u64 = 300;

/// Sender label used for system messages in the transcript.
pub const SYSTEM_SENDER: &str = "System";

/// Canned texts the simulated peers answer with.
pub const AUTO_RESPONSES: &[&str] = &[
    "Hi! How are you?",
    "Interesting, tell me more.",
    "I understand what you mean.",
    "That's a really interesting topic!",
    "I completely agree with you.",
    "Hmm, I need to think about that.",
    "Great idea!",
    "Not sure that's a good idea.",
    "Can you tell me more?",
    "Sounds great!",
];

/// Names of the simulated peers.
pub const BOT_NAMES: &[&str] = &["Anna", "Ivan", "Maria", "Alexey", "Elena"];

/// Toast title shown when a send fails.
pub const SEND_FAILED_TITLE: &str = "Send failed";
/// Toast body shown when a send fails.
pub const SEND_FAILED_BODY: &str = "Could not send the message. Please try again.";

// ── OS notifications ─────────────────────────────────────────────────

/// Icon attached to OS-level notifications.
pub const NOTIFICATION_ICON: &str = "/icon.png";

// ── Offline cache ────────────────────────────────────────────────────

/// Name of the offline resource cache; bump to invalidate snapshots.
pub const CACHE_NAME: &str = "chat-app-v1";
/// Resources fetched into the cache at install time.
pub const CACHE_MANIFEST: &[&str] = &["/", "/icon.png", "/manifest.json"];
/// Origin resources are resolved against when no config overrides it.
pub const DEFAULT_ORIGIN: &str = "http://localhost:3000";

// ── Host app ─────────────────────────────────────────────────────────

/// Maximum number of log entries kept in the activity panel.
pub const MAX_LOGS: usize = 1000;
