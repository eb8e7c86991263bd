//! Application core — state, lifecycle, and event dispatch.
//!
//! The [`App`] struct holds all runtime state and is the single entry point
//! for the rest of the binary.  It is also the single owner of the chat
//! session: timers, sends and fetches run on the tokio runtime, but their
//! results are applied here, one at a time, in [`App::tick`].
//!
//! | Module       | Responsibility                            |
//! |--------------|-------------------------------------------|
//! | `commands`   | Slash-command dispatch & handlers         |
//! | `input`      | Text-input editing (cursor, history)      |
//! | `logging`    | `LogLevel`, `LogLine`                     |
//! | `ui`         | TUI rendering & status-bar helpers        |

mod commands;
mod input;
mod logging;
mod ui;

use std::path::Path;

use anyhow::{Context, Result};
use chrono::Local;
use crossterm::event::{Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use tokio::runtime::Runtime;

use crate::cache::{CacheGateway, HttpFetcher, default_cache_dir};
use crate::config::{AppConfig, ConfigSource};
use crate::constants::{APP_VERSION, MAX_LOGS};
use crate::notify::{NotificationSurface, PresenceSignals, TerminalSurface};
use crate::router::RouterEvent;
use crate::session::{Pumped, Session};
use crate::transport::SimulatedTransport;

use self::logging::{LogLevel, LogLine};

// ── Application state ────────────────────────────────────────────────

/// Top-level application state.
///
/// Fields use `pub(crate)` visibility so that the sibling submodules
/// (`commands`, `input`, `ui`) can access them directly while keeping
/// them hidden from the rest of the crate.
pub struct App {
    pub(crate) config: AppConfig,
    pub(crate) config_source: ConfigSource,
    pub(crate) input: String,
    pub(crate) cursor: usize,
    pub(crate) input_history: Vec<String>,
    pub(crate) history_index: Option<usize>,
    pub(crate) history_stash: String,
    pub(crate) logs: Vec<LogLine>,
    pub(crate) session: Session<SimulatedTransport>,
    pub(crate) surface: TerminalSurface,
    pub(crate) cache: CacheGateway<HttpFetcher>,
    pub(crate) focused: bool,
    pub(crate) scroll_offset: u16,
    pub(crate) should_quit: bool,
    // Last, so every task handle above is released before the runtime.
    pub(crate) runtime: Runtime,
}

// ── Lifecycle ────────────────────────────────────────────────────────

impl App {
    /// Create and initialise a new application instance.
    pub fn new() -> Result<Self> {
        let (config, config_source) = AppConfig::load()?;
        let cache_dir = default_cache_dir();
        let mut app = Self::with_config(config, config_source, cache_dir.as_deref())?;
        app.bootstrap();
        Ok(app)
    }

    /// Build the app around an already-loaded config.  `cache_dir` enables
    /// the on-disk cache snapshot.
    pub(crate) fn with_config(
        config: AppConfig,
        config_source: ConfigSource,
        cache_dir: Option<&Path>,
    ) -> Result<Self> {
        let runtime = Runtime::new().context("create tokio runtime")?;

        let transport = SimulatedTransport::new(config.send_delay());
        transport.set_failing(config.fail_sends);
        let session = Session::new(&config, runtime.handle().clone(), transport);

        let origin = config.origin_url()?;
        let fetcher = HttpFetcher::new().context("build HTTP client")?;
        let cache = match cache_dir {
            Some(dir) => CacheGateway::open(&config.cache_name, origin, fetcher, dir)
                .context("open offline cache")?,
            None => CacheGateway::new(&config.cache_name, origin, fetcher),
        };

        Ok(App {
            config,
            config_source,
            input: String::new(),
            cursor: 0,
            input_history: Vec::new(),
            history_index: None,
            history_stash: String::new(),
            logs: Vec::new(),
            session,
            surface: TerminalSurface::stdout(),
            cache,
            focused: true,
            scroll_offset: 0,
            should_quit: false,
            runtime,
        })
    }

    /// Greet, join with a configured name, and warm the offline cache.
    fn bootstrap(&mut self) {
        self.log(
            LogLevel::Info,
            format!(
                "chatpulse {APP_VERSION} — config from {}.",
                self.config_source.label()
            ),
        );

        if let Some(name) = self.config.username.clone() {
            self.join(&name);
        } else {
            self.log(
                LogLevel::Info,
                "Enter your name to join the chat.".to_string(),
            );
        }

        if self.cache.is_empty() {
            self.install_cache();
        } else {
            self.log(
                LogLevel::Info,
                format!(
                    "Offline cache `{}` restored ({} resource(s)).",
                    self.cache.name(),
                    self.cache.len()
                ),
            );
        }
        self.log(LogLevel::Info, "Type /help for commands.".to_string());
    }

    /// Fetch the configured manifest into the offline cache.
    pub(crate) fn install_cache(&mut self) {
        let manifest = self.config.cache_manifest.clone();
        match self.runtime.block_on(self.cache.install(&manifest)) {
            Ok(count) => self.log(
                LogLevel::Success,
                format!("Offline cache `{}` installed ({count} resource(s)).", self.cache.name()),
            ),
            Err(err) => log_src!(
                self,
                LogLevel::Warn,
                format!("Offline cache install failed: {err}")
            ),
        }
    }

    pub(crate) fn join(&mut self, name: &str) {
        let first = self.session.username().is_none();
        if !self.session.join(name) {
            log_src!(self, LogLevel::Warn, "Name cannot be empty.".to_string());
            return;
        }
        let verb = if first { "Joined" } else { "Renamed" };
        self.log(LogLevel::Success, format!("{verb} as {}.", name.trim()));
    }

    /// Cancel every timer.  Called once the draw loop ends.
    pub fn shutdown(&mut self) {
        let cancelled = self.session.teardown();
        if cancelled > 0 {
            self.log(
                LogLevel::Info,
                format!("Cancelled {cancelled} pending timer(s)."),
            );
        }
    }

    /// Whether the user has requested to quit.
    pub fn should_quit(&self) -> bool {
        self.should_quit
    }

    pub(crate) fn signals(&self) -> PresenceSignals {
        PresenceSignals {
            page_hidden: !self.focused,
            permission: self.surface.permission(),
        }
    }
}

// ── Background results ───────────────────────────────────────────────

impl App {
    /// Apply finished sends, fired replies and expired toasts.
    pub fn tick(&mut self) {
        let signals = self.signals();
        let pumped = self.session.pump(signals, &mut self.surface);
        if !pumped.is_empty() {
            self.log_pumped(pumped);
        }
    }

    fn log_pumped(&mut self, pumped: Pumped) {
        for event in pumped.router {
            match event {
                RouterEvent::Sent { id } => self.log(LogLevel::Success, format!("Sent {id}.")),
                RouterEvent::ReplyScheduled { from, delay } => self.log(
                    LogLevel::Info,
                    format!("{from} is typing… ({} ms)", delay.as_millis()),
                ),
                RouterEvent::ReplyDelivered { from, notified, .. } => {
                    let suffix = if notified { " (desktop notification)" } else { "" };
                    self.log(LogLevel::Info, format!("New message from {from}{suffix}"));
                }
                RouterEvent::SendFailed { id, error, toast } => log_src!(
                    self,
                    LogLevel::Error,
                    format!("Message {id} not sent: {error} (toast {toast})")
                ),
                RouterEvent::NotifyFailed { reason } => log_src!(
                    self,
                    LogLevel::Warn,
                    format!("Desktop notification failed: {reason}")
                ),
            }
        }
        for id in pumped.expired {
            self.log(LogLevel::Info, format!("Toast {id} expired."));
        }
    }
}

// ── Event handling ───────────────────────────────────────────────────

impl App {
    /// Route a terminal event to the appropriate handler.
    pub fn handle_event(&mut self, event: Event) -> Result<()> {
        match event {
            Event::Key(key) if key.kind == KeyEventKind::Press => self.handle_key(key)?,
            Event::FocusGained => self.focused = true,
            Event::FocusLost => self.focused = false,
            _ => {}
        }
        Ok(())
    }

    /// Dispatch a key press to input editing, commands, or control actions.
    fn handle_key(&mut self, key: KeyEvent) -> Result<()> {
        match key {
            KeyEvent {
                code: KeyCode::Char('c'),
                modifiers: KeyModifiers::CONTROL,
                ..
            } => self.should_quit = true,

            KeyEvent {
                code: KeyCode::Char('l'),
                modifiers: KeyModifiers::CONTROL,
                ..
            } => self.logs.clear(),

            KeyEvent { code, .. } => match code {
                KeyCode::Char(ch) => self.insert_char(ch),
                KeyCode::Backspace => self.backspace(),
                KeyCode::Delete => self.delete(),
                KeyCode::Left => self.move_cursor_left(),
                KeyCode::Right => self.move_cursor_right(),
                KeyCode::Home => self.move_cursor_home(),
                KeyCode::End => self.move_cursor_end(),
                KeyCode::Up => self.history_prev(),
                KeyCode::Down => self.history_next(),
                KeyCode::PageUp => self.scroll_up(10),
                KeyCode::PageDown => self.scroll_down(10),
                KeyCode::Enter => {
                    self.scroll_offset = 0; // snap to bottom on submit
                    self.submit_input()?;
                }
                KeyCode::Esc => self.should_quit = true,
                _ => {}
            },
        }
        Ok(())
    }

    /// Submit the current input line for processing.
    fn submit_input(&mut self) -> Result<()> {
        let line = self.take_input().trim().to_string();

        if line.is_empty() {
            return Ok(());
        }

        if line.starts_with('/') {
            self.handle_command(&line)?;
        } else if self.session.username().is_none() {
            self.join(&line);
        } else {
            self.session.submit(&line);
        }

        Ok(())
    }
}

// ── Scrolling ────────────────────────────────────────────────────────

impl App {
    /// Scroll the transcript up by `n` lines.
    pub(crate) fn scroll_up(&mut self, n: u16) {
        self.scroll_offset = self.scroll_offset.saturating_add(n);
    }

    /// Scroll the transcript down by `n` lines (towards the latest).
    pub(crate) fn scroll_down(&mut self, n: u16) {
        self.scroll_offset = self.scroll_offset.saturating_sub(n);
    }
}

// ── Logging ──────────────────────────────────────────────────────────

/// Log a `Warn`/`Error` message, attaching `[file:line]` in debug-logs builds.
///
/// In release (no `debug-logs` feature) this behaves like `self.log()`.
///
/// ```ignore
/// log_src!(self, LogLevel::Warn, format!("something broke: {err:#}"));
/// ```
macro_rules! log_src {
    ($app:expr, $level:expr, $msg:expr) => {{
        #[cfg(feature = "debug-logs")]
        {
            let loc = format!("{}:{}", file!(), line!());
            $app.log_with_src($level, $msg, &loc);
        }
        #[cfg(not(feature = "debug-logs"))]
        {
            $app.log($level, $msg);
        }
    }};
}
pub(crate) use log_src;

impl App {
    /// Append a message to the activity log.
    pub(crate) fn log(&mut self, level: LogLevel, message: String) {
        let timestamp = Local::now().format("%H:%M:%S").to_string();
        self.logs.push(LogLine {
            timestamp,
            level,
            message,
        });
        if self.logs.len() > MAX_LOGS {
            let overflow = self.logs.len() - MAX_LOGS;
            self.logs.drain(0..overflow);
        }
    }

    /// Append a message with a source location suffix (debug-logs builds only).
    #[cfg(feature = "debug-logs")]
    pub(crate) fn log_with_src(&mut self, level: LogLevel, message: String, src: &str) {
        let tagged = match level {
            LogLevel::Warn | LogLevel::Error => format!("{message}  [{src}]"),
            _ => message,
        };
        self.log(level, tagged);
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    pub(crate) fn test_app() -> App {
        let config = AppConfig {
            rng_seed: Some(1),
            ..AppConfig::default()
        };
        App::with_config(config, ConfigSource::Embedded, None).expect("app builds")
    }

    pub(crate) fn type_line(app: &mut App, line: &str) {
        for ch in line.chars() {
            app.insert_char(ch);
        }
        app.submit_input().expect("submit");
    }

    #[test]
    fn first_line_becomes_the_username() {
        let mut app = test_app();
        type_line(&mut app, "  Sam ");
        assert_eq!(app.session.username(), Some("Sam"));
        assert_eq!(app.session.router().transcript().len(), 2);

        type_line(&mut app, "hi");
        let last = app.session.router().transcript().last().cloned();
        assert_eq!(last.map(|e| e.message.text), Some("hi".to_string()));
    }

    #[test]
    fn editing_handles_multibyte_text() {
        let mut app = test_app();
        for ch in "Привет".chars() {
            app.insert_char(ch);
        }
        app.move_cursor_left();
        app.backspace();
        assert_eq!(app.input, "Привт");
        app.move_cursor_home();
        app.delete();
        assert_eq!(app.input, "ривт");
    }

    #[test]
    fn history_walks_back_and_restores_stash() {
        let mut app = test_app();
        type_line(&mut app, "Sam");
        type_line(&mut app, "first");
        type_line(&mut app, "second");

        app.insert_char('x');
        app.history_prev();
        assert_eq!(app.input, "second");
        app.history_prev();
        assert_eq!(app.input, "first");
        app.history_next();
        app.history_next();
        assert_eq!(app.input, "x");
    }

    #[test]
    fn tick_logs_sends_and_expired_toasts() {
        let config = AppConfig {
            rng_seed: Some(1),
            toast_ttl_ms: 50,
            send_delay_ms: 10,
            ..AppConfig::default()
        };
        let mut app =
            App::with_config(config, ConfigSource::Embedded, None).expect("app builds");
        type_line(&mut app, "Sam");
        assert_eq!(app.logs.last().map(|l| l.level), Some(LogLevel::Success));

        type_line(&mut app, "/toast brief");
        type_line(&mut app, "hello");
        // Timers run in real time on the app's own runtime.
        std::thread::sleep(std::time::Duration::from_millis(400));
        app.tick();

        let messages: Vec<&str> = app.logs.iter().map(|l| l.message.as_str()).collect();
        assert!(messages.iter().any(|m| m.starts_with("Sent ")));
        assert!(messages.contains(&"Toast #1 expired."));
        assert!(app.session.toasts().is_empty());
    }

    #[test]
    fn focus_events_drive_page_visibility() {
        let mut app = test_app();
        assert!(!app.signals().page_hidden);
        app.handle_event(Event::FocusLost).expect("event");
        assert!(app.signals().page_hidden);
        app.handle_event(Event::FocusGained).expect("event");
        assert!(!app.signals().page_hidden);
    }
}
