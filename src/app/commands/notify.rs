//! `/notify` and `/fail` command handlers.

use crate::notify::{NotificationSurface, Permission};

use super::super::App;
use super::super::log_src;
use super::super::logging::LogLevel;
use super::parse_switch;

impl App {
    pub(crate) fn handle_notify_command(&mut self, args: Vec<&str>) {
        let Some(arg) = args.first() else {
            let hint = match self.surface.permission() {
                Permission::Granted => "",
                Permission::Denied => " (blocked; /notify on to allow)",
                Permission::Default => " (/notify on to enable)",
            };
            self.log(
                LogLevel::Info,
                format!("Desktop notifications: {}{hint}", self.surface.permission()),
            );
            return;
        };

        match parse_switch(arg) {
            Some(allow) => {
                let permission = self.surface.request_permission(allow);
                self.log(
                    LogLevel::Info,
                    format!("Desktop notifications: {permission}"),
                );
            }
            None => log_src!(
                self,
                LogLevel::Warn,
                "Usage: /notify [on|off]".to_string()
            ),
        }
    }

    pub(crate) fn handle_fail_command(&mut self, args: Vec<&str>) {
        let failing = match args.first() {
            None => !self.session.router().transport().is_failing(),
            Some(arg) => match parse_switch(arg) {
                Some(value) => value,
                None => {
                    log_src!(self, LogLevel::Warn, "Usage: /fail [on|off]".to_string());
                    return;
                }
            },
        };
        self.session.router().transport().set_failing(failing);

        let state = if failing { "fail" } else { "succeed" };
        self.log(LogLevel::Info, format!("Sends will now {state}."));
    }
}

#[cfg(test)]
mod tests {
    use super::super::super::tests::{test_app, type_line};
    use super::*;

    #[test]
    fn fail_toggles_and_sets() {
        let mut app = test_app();
        let failing = |app: &App| app.session.router().transport().is_failing();

        type_line(&mut app, "/fail");
        assert!(failing(&app));
        type_line(&mut app, "/fail");
        assert!(!failing(&app));
        type_line(&mut app, "/fail on");
        assert!(failing(&app));
        type_line(&mut app, "/fail off");
        assert!(!failing(&app));
    }

    #[test]
    fn notify_off_denies() {
        let mut app = test_app();
        type_line(&mut app, "/notify off");
        assert_eq!(app.surface.permission(), Permission::Denied);
        assert!(!app.signals().wants_os_notification());
    }
}
