//! `/toast` and `/dismiss` command handlers.

use crate::toast::{ToastId, ToastRequest};

use super::super::App;
use super::super::log_src;
use super::super::logging::LogLevel;

impl App {
    pub(crate) fn handle_toast_command(&mut self, args: Vec<&str>) {
        if args.is_empty() {
            log_src!(self, LogLevel::Warn, "Usage: /toast <text>".to_string());
            return;
        }
        let id = self.session.toast(ToastRequest::new().title(args.join(" ")));
        self.log(LogLevel::Info, format!("Toast {id} shown."));
    }

    /// `/dismiss <id>` removes one toast; `/dismiss` alone clears them all.
    pub(crate) fn handle_dismiss_command(&mut self, args: Vec<&str>) {
        let Some(arg) = args.first() else {
            let count = self.session.toasts_mut().dismiss_all();
            self.log(LogLevel::Info, format!("Dismissed {count} toast(s)."));
            return;
        };

        let Ok(raw) = arg.trim_start_matches('#').parse::<u64>() else {
            log_src!(
                self,
                LogLevel::Warn,
                format!("Not a toast id: {arg}")
            );
            return;
        };
        let id = ToastId::from(raw);
        if self.session.toasts_mut().dismiss(id) {
            self.log(LogLevel::Info, format!("Toast {id} dismissed."));
        } else {
            self.log(LogLevel::Info, format!("Toast {id} is not showing."));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::super::super::tests::{test_app, type_line};

    #[test]
    fn toast_then_dismiss_by_id() {
        let mut app = test_app();
        type_line(&mut app, "/toast hello there");
        let toast = app.session.toasts().items().next().cloned().expect("toast");
        assert_eq!(toast.title.as_deref(), Some("hello there"));

        type_line(&mut app, &format!("/dismiss {}", toast.id));
        assert!(app.session.toasts().is_empty());
    }

    #[test]
    fn bare_dismiss_clears_everything() {
        let mut app = test_app();
        for i in 0..3 {
            type_line(&mut app, &format!("/toast note {i}"));
        }
        type_line(&mut app, "/dismiss");
        assert!(app.session.toasts().is_empty());
        assert_eq!(app.session.toasts().armed_timers(), 0);
    }
}
