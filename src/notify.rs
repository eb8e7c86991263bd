//! OS-level notification surface and the presence signals that gate it.

use std::fmt;
use std::io::{self, Write};

use anyhow::{Context, Result};

use crate::constants::NOTIFICATION_ICON;

/// Permission state of the OS notification surface.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Permission {
    #[default]
    Default,
    Granted,
    Denied,
}

impl fmt::Display for Permission {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Permission::Default => "default",
            Permission::Granted => "granted",
            Permission::Denied => "denied",
        };
        f.write_str(label)
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct OsNotification {
    pub title: String,
    pub body: String,
    pub icon: String,
}

impl OsNotification {
    pub fn new(title: impl Into<String>, body: impl Into<String>) -> Self {
        OsNotification {
            title: title.into(),
            body: body.into(),
            icon: NOTIFICATION_ICON.to_string(),
        }
    }
}

/// Snapshot of the host's visibility and permission, read at delivery time.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct PresenceSignals {
    pub page_hidden: bool,
    pub permission: Permission,
}

impl PresenceSignals {
    /// OS notifications are only worth showing when nobody is looking and
    /// the user allowed them.
    pub fn wants_os_notification(&self) -> bool {
        self.page_hidden && self.permission == Permission::Granted
    }
}

pub trait NotificationSurface {
    fn permission(&self) -> Permission;

    /// User-triggered permission prompt.
    fn request_permission(&mut self, allow: bool) -> Permission;

    fn show(&mut self, notification: &OsNotification) -> Result<()>;
}

/// Desktop notifications through the terminal's OSC 9 escape sequence,
/// which most modern terminal emulators forward to the OS.
pub struct TerminalSurface<W: Write = io::Stdout> {
    out: W,
    permission: Permission,
}

impl TerminalSurface {
    pub fn stdout() -> Self {
        Self::with_writer(io::stdout())
    }
}

impl<W: Write> TerminalSurface<W> {
    pub fn with_writer(out: W) -> Self {
        TerminalSurface {
            out,
            permission: Permission::Default,
        }
    }

    #[cfg(test)]
    pub fn into_inner(self) -> W {
        self.out
    }
}

impl<W: Write> NotificationSurface for TerminalSurface<W> {
    fn permission(&self) -> Permission {
        self.permission
    }

    fn request_permission(&mut self, allow: bool) -> Permission {
        let previous = self.permission;
        self.permission = if allow {
            Permission::Granted
        } else {
            Permission::Denied
        };

        if previous != Permission::Granted && self.permission == Permission::Granted {
            let welcome = OsNotification::new(
                "Notifications enabled!",
                "You will now be notified about new messages",
            );
            // The grant stands even if the greeting can't be written.
            let _ = self.show(&welcome);
        }
        self.permission
    }

    fn show(&mut self, notification: &OsNotification) -> Result<()> {
        if self.permission != Permission::Granted {
            return Ok(());
        }
        let title = sanitize(&notification.title);
        let body = sanitize(&notification.body);
        write!(self.out, "\x1b]9;{title}: {body}\x07").context("write OS notification")?;
        self.out.flush().context("flush OS notification")?;
        Ok(())
    }
}

/// Strip control characters so message text cannot terminate the escape.
fn sanitize(text: &str) -> String {
    text.chars().filter(|ch| !ch.is_control()).collect()
}

/// In-memory surface that records what it was asked to show.
#[cfg(test)]
#[derive(Default)]
pub(crate) struct RecordingSurface {
    pub permission: Permission,
    pub shown: Vec<OsNotification>,
}

#[cfg(test)]
impl NotificationSurface for RecordingSurface {
    fn permission(&self) -> Permission {
        self.permission
    }

    fn request_permission(&mut self, allow: bool) -> Permission {
        self.permission = if allow {
            Permission::Granted
        } else {
            Permission::Denied
        };
        self.permission
    }

    fn show(&mut self, notification: &OsNotification) -> Result<()> {
        self.shown.push(notification.clone());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn written(surface: TerminalSurface<Vec<u8>>) -> String {
        String::from_utf8_lossy(&surface.into_inner()).into_owned()
    }

    #[test]
    fn only_hidden_and_granted_wants_notification() {
        let cases = [
            (false, Permission::Granted, false),
            (true, Permission::Default, false),
            (true, Permission::Denied, false),
            (true, Permission::Granted, true),
        ];
        for (page_hidden, permission, expected) in cases {
            let signals = PresenceSignals {
                page_hidden,
                permission,
            };
            assert_eq!(signals.wants_os_notification(), expected);
        }
    }

    #[test]
    fn show_without_permission_writes_nothing() {
        let mut surface = TerminalSurface::with_writer(Vec::new());
        surface
            .show(&OsNotification::new("t", "b"))
            .expect("show succeeds");
        assert!(written(surface).is_empty());
    }

    #[test]
    fn granting_permission_greets_once() {
        let mut surface = TerminalSurface::with_writer(Vec::new());
        assert_eq!(surface.request_permission(true), Permission::Granted);
        assert_eq!(surface.request_permission(true), Permission::Granted);
        let out = written(surface);
        assert_eq!(out.matches("Notifications enabled!").count(), 1);
        assert!(out.starts_with("\x1b]9;"));
    }

    #[test]
    fn control_characters_are_stripped() {
        let mut surface = TerminalSurface::with_writer(Vec::new());
        surface.permission = Permission::Granted;
        surface
            .show(&OsNotification::new("Anna", "hi\x07\x1b]9;evil"))
            .expect("show succeeds");
        assert_eq!(written(surface), "\x1b]9;Anna: hi]9;evil\x07");
    }
}
