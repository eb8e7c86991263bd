//! `/fetch` and `/cache` command handlers — the offline resource cache.

use super::super::App;
use super::super::log_src;
use super::super::logging::LogLevel;

impl App {
    pub(crate) fn handle_fetch_command(&mut self, args: Vec<&str>) {
        let Some(key) = args.first() else {
            log_src!(self, LogLevel::Warn, "Usage: /fetch <path>".to_string());
            return;
        };

        match self.runtime.block_on(self.cache.intercept(key)) {
            Ok(served) => {
                let origin = if served.from_cache { "cache" } else { "network" };
                let kind = served
                    .resource
                    .content_type
                    .as_deref()
                    .unwrap_or("unknown type");
                self.log(
                    LogLevel::Info,
                    format!(
                        "{} → {} from {origin} ({} bytes, {kind})",
                        served.resource.url,
                        served.resource.status,
                        served.resource.body.len()
                    ),
                );
            }
            Err(err) => log_src!(self, LogLevel::Error, format!("Fetch {key} failed: {err}")),
        }
    }

    pub(crate) fn handle_cache_command(&mut self, args: Vec<&str>) {
        match args.first().copied() {
            None | Some("list") => self.list_cache(),
            Some("install") => self.install_cache(),
            Some("check") => match args.get(1) {
                Some(key) => {
                    let state = if self.cache.contains(key) { "cached" } else { "not cached" };
                    self.log(LogLevel::Info, format!("{key}: {state}"));
                }
                None => log_src!(self, LogLevel::Warn, "Usage: /cache check <path>".to_string()),
            },
            Some(other) => log_src!(
                self,
                LogLevel::Warn,
                format!("Unknown /cache subcommand: {other}")
            ),
        }
    }

    fn list_cache(&mut self) {
        let keys = self.cache.keys();
        self.log(
            LogLevel::Info,
            format!(
                "Offline cache `{}`: {} resource(s).",
                self.cache.name(),
                keys.len()
            ),
        );
        for key in keys {
            self.log(LogLevel::Info, format!("  {key}"));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::super::super::tests::{test_app, type_line};
    use super::super::super::logging::LogLevel;

    #[test]
    fn empty_cache_lists_nothing() {
        let mut app = test_app();
        type_line(&mut app, "/cache");
        let last = app.logs.last().cloned().expect("logged");
        assert!(last.message.contains("0 resource(s)"));
    }

    #[test]
    fn check_reports_uncached_path() {
        let mut app = test_app();
        type_line(&mut app, "/cache check /icon.png");
        let last = app.logs.last().cloned().expect("logged");
        assert_eq!(last.message, "/icon.png: not cached");

        type_line(&mut app, "/cache check");
        assert_eq!(app.logs.last().map(|l| l.level), Some(LogLevel::Warn));
    }

    #[test]
    fn fetch_without_path_warns() {
        let mut app = test_app();
        type_line(&mut app, "/fetch");
        let last = app.logs.last().cloned().expect("logged");
        assert_eq!(last.level, LogLevel::Warn);
    }
}
