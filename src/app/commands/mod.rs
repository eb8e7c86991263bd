//! Slash-command dispatch and handler implementations.
//!
//! Every `/command` typed by the user is routed through [`App::handle_command`]
//! and dispatched to the appropriate handler in a focused submodule:
//!
//! | Module    | Commands                           |
//! |-----------|------------------------------------|
//! | `cache`   | `/fetch`, `/cache`                 |
//! | `notify`  | `/notify`, `/fail`                 |
//! | `toasts`  | `/toast`, `/dismiss`               |

mod cache;
mod notify;
mod toasts;

use super::App;
use super::log_src;
use super::logging::LogLevel;

// ── Command dispatch ─────────────────────────────────────────────────

impl App {
    /// Route a slash-command to the matching handler.
    pub(crate) fn handle_command(&mut self, line: &str) -> anyhow::Result<()> {
        let mut parts = line.split_whitespace();
        let cmd = parts.next().unwrap_or("");

        match cmd {
            "/help" => self.show_help(),
            "/quit" | "/exit" => self.should_quit = true,
            "/clear" => self.logs.clear(),
            "/name" => {
                let name = parts.collect::<Vec<_>>().join(" ");
                if name.is_empty() {
                    log_src!(self, LogLevel::Warn, "Usage: /name <name>".to_string());
                } else {
                    self.join(&name);
                }
            }
            "/notify" => self.handle_notify_command(parts.collect()),
            "/fail" => self.handle_fail_command(parts.collect()),
            "/toast" => self.handle_toast_command(parts.collect()),
            "/dismiss" => self.handle_dismiss_command(parts.collect()),
            "/fetch" => self.handle_fetch_command(parts.collect()),
            "/cache" => self.handle_cache_command(parts.collect()),
            _ => log_src!(self, LogLevel::Warn, format!("Unknown command: {cmd}")),
        }

        Ok(())
    }
}

// ── Help ─────────────────────────────────────────────────────────────

impl App {
    fn show_help(&mut self) {
        let lines = [
            "━━━  chatpulse  ━━━",
            "",
            "Chat",
            "  (just type)             Send a message; someone will answer",
            "  /name <name>            Change your display name",
            "",
            "Notifications",
            "  /notify                 Show desktop-notification permission",
            "  /notify on|off          Allow or block desktop notifications",
            "  /toast <text>           Show a notification toast",
            "  /dismiss [id]           Dismiss one toast, or all of them",
            "",
            "Offline cache",
            "  /cache                  List cached resources",
            "  /cache install          Re-fetch the cache manifest",
            "  /cache check <path>     Whether a path is served offline",
            "  /fetch <path>           Request a resource through the cache",
            "",
            "Debugging",
            "  /fail [on|off]          Make sends fail (toggles without args)",
            "",
            "  PageUp/PageDown         Scroll the chat",
            "  Up/Down                 Input history",
            "  /clear                  Clear the activity log",
            "  /quit                   Exit",
        ];
        for line in lines {
            self.log(LogLevel::Info, line.to_string());
        }
    }
}

/// Parse an `on`/`off` style switch.
pub(super) fn parse_switch(arg: &str) -> Option<bool> {
    match arg.to_ascii_lowercase().as_str() {
        "on" | "yes" | "true" | "1" => Some(true),
        "off" | "no" | "false" | "0" => Some(false),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::super::tests::{test_app, type_line};
    use super::*;

    #[test]
    fn unknown_command_warns() {
        let mut app = test_app();
        type_line(&mut app, "/bogus");
        let last = app.logs.last().cloned().expect("logged");
        assert_eq!(last.level, LogLevel::Warn);
        assert!(last.message.contains("/bogus"));
    }

    #[test]
    fn name_command_renames() {
        let mut app = test_app();
        type_line(&mut app, "/name Sam Smith");
        assert_eq!(app.session.username(), Some("Sam Smith"));
    }

    #[test]
    fn quit_sets_flag() {
        let mut app = test_app();
        type_line(&mut app, "/quit");
        assert!(app.should_quit());
    }

    #[test]
    fn switches_parse() {
        assert_eq!(parse_switch("ON"), Some(true));
        assert_eq!(parse_switch("off"), Some(false));
        assert_eq!(parse_switch("maybe"), None);
    }
}
