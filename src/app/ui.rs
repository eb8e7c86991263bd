//! Terminal UI rendering — status bar, transcript, toasts, activity log.

use chrono::{Local, TimeZone};
use ratatui::Frame;
use ratatui::layout::{Constraint, Direction, Layout, Position, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span, Text};
use ratatui::widgets::{Block, Borders, Paragraph, Wrap};

use crate::chat::{DeliveryState, Direction as Flow, TranscriptEntry};
use crate::constants::SYSTEM_SENDER;
use crate::notify::{NotificationSurface, Permission};
use crate::toast::{Severity, Toast};

use super::App;

impl App {
    /// Render the full TUI frame.
    pub fn draw(&mut self, frame: &mut Frame<'_>) {
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(1),
                Constraint::Min(1),
                Constraint::Length(3),
            ])
            .split(frame.area());

        frame.render_widget(Paragraph::new(self.status_line()), chunks[0]);

        let body = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Percentage(65), Constraint::Percentage(35)])
            .split(chunks[1]);

        self.draw_transcript(frame, body[0]);

        let toast_lines = self.toast_lines();
        let toast_height = (toast_lines.len() as u16).saturating_add(2);
        let side = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Length(toast_height), Constraint::Min(3)])
            .split(body[1]);

        let toast_panel = Paragraph::new(Text::from(toast_lines))
            .wrap(Wrap { trim: true })
            .block(Block::default().borders(Borders::ALL).title(" Notifications "));
        frame.render_widget(toast_panel, side[0]);

        self.draw_activity(frame, side[1]);

        // ── Input prompt ─────────────────────────────────────────────
        let title = if self.session.username().is_some() {
            "Message"
        } else {
            "Your name"
        };
        let input_panel = Paragraph::new(self.input.as_str())
            .block(Block::default().borders(Borders::ALL).title(title));
        frame.render_widget(input_panel, chunks[2]);

        let input_width = chunks[2].width.saturating_sub(2) as usize;
        let cursor = self.cursor.min(input_width);
        frame.set_cursor_position(Position::new(
            chunks[2].x + 1 + cursor as u16,
            chunks[2].y + 1,
        ));
    }

    fn draw_transcript(&mut self, frame: &mut Frame<'_>, area: Rect) {
        let inner_width = area.width.saturating_sub(2);
        let inner_height = area.height.saturating_sub(2) as usize;

        let transcript = self.session.router().transcript();
        let count = transcript.len();
        let lines: Vec<Line> = if transcript.is_empty() {
            vec![Line::styled(
                "No messages yet.",
                Style::default().fg(Color::DarkGray),
            )]
        } else {
            transcript.entries().iter().map(transcript_line).collect()
        };
        let paragraph = Paragraph::new(Text::from(lines)).wrap(Wrap { trim: true });

        let total_visual = paragraph.line_count(inner_width);
        let max_scroll = total_visual.saturating_sub(inner_height);

        // Clamp scroll_offset (lines from the bottom) to valid range.
        if (self.scroll_offset as usize) > max_scroll {
            self.scroll_offset = max_scroll as u16;
        }
        let top_row = max_scroll.saturating_sub(self.scroll_offset as usize) as u16;

        let title = if self.scroll_offset > 0 {
            format!(" Chat ({count}) [↑{}] ", self.scroll_offset)
        } else {
            format!(" Chat ({count}) ")
        };
        let panel = paragraph
            .block(Block::default().borders(Borders::ALL).title(title))
            .scroll((top_row, 0));
        frame.render_widget(panel, area);
    }

    fn draw_activity(&self, frame: &mut Frame<'_>, area: Rect) {
        let inner_width = area.width.saturating_sub(2);
        let inner_height = area.height.saturating_sub(2) as usize;

        let log_lines: Vec<Line> = self.logs.iter().map(|l| l.render()).collect();
        let paragraph = Paragraph::new(Text::from(log_lines)).wrap(Wrap { trim: true });
        let top_row = paragraph
            .line_count(inner_width)
            .saturating_sub(inner_height) as u16;

        let panel = paragraph
            .block(Block::default().borders(Borders::ALL).title(" Activity "))
            .scroll((top_row, 0));
        frame.render_widget(panel, area);
    }

    fn toast_lines(&self) -> Vec<Line<'static>> {
        let toasts = self.session.toasts();
        if toasts.is_empty() {
            return vec![Line::styled("none", Style::default().fg(Color::DarkGray))];
        }
        toasts.items().flat_map(toast_block).collect()
    }

    // ── Status-bar helpers ───────────────────────────────────────────

    fn status_line(&self) -> Line<'static> {
        let user = self.session.username().unwrap_or("(no name)").to_string();
        let router = self.session.router();
        let mut spans = vec![
            Span::styled("User: ", Style::default().fg(Color::DarkGray)),
            Span::styled(user, Style::default().fg(Color::Cyan)),
            Span::styled("  Notify: ", Style::default().fg(Color::DarkGray)),
            Span::styled(
                self.surface.permission().to_string(),
                Style::default().fg(permission_color(self.surface.permission())),
            ),
            Span::styled(
                format!("  {}", if self.focused { "focused" } else { "away" }),
                Style::default().fg(Color::DarkGray),
            ),
            Span::styled(
                format!("  Cache: {}", self.cache.len()),
                Style::default().fg(Color::DarkGray),
            ),
        ];
        if router.in_flight() > 0 {
            spans.push(Span::styled(
                format!("  ↑{}", router.in_flight()),
                Style::default().fg(Color::Yellow),
            ));
        }
        if router.pending_replies() > 0 {
            spans.push(Span::styled(
                format!("  ✎{}", router.pending_replies()),
                Style::default().fg(Color::Magenta),
            ));
        }
        if router.transport().is_failing() {
            spans.push(Span::styled(
                "  sends failing",
                Style::default().fg(Color::Red),
            ));
        }
        Line::from(spans)
    }
}

fn permission_color(permission: Permission) -> Color {
    match permission {
        Permission::Granted => Color::Green,
        Permission::Denied => Color::Red,
        Permission::Default => Color::DarkGray,
    }
}

fn transcript_line(entry: &TranscriptEntry) -> Line<'static> {
    let message = &entry.message;
    let time = Local
        .timestamp_millis_opt(message.timestamp)
        .single()
        .map(|t| t.format("%H:%M").to_string())
        .unwrap_or_default();

    let sender_color = match entry.direction {
        Flow::Outbound => Color::Cyan,
        Flow::Inbound if message.sender == SYSTEM_SENDER => Color::DarkGray,
        Flow::Inbound => Color::Magenta,
    };

    let mut spans = vec![
        Span::styled(format!("{time} "), Style::default().fg(Color::DarkGray)),
        Span::styled(
            format!("{}: ", message.sender),
            Style::default()
                .fg(sender_color)
                .add_modifier(Modifier::BOLD),
        ),
        Span::raw(message.text.clone()),
    ];
    match entry.state {
        DeliveryState::Pending => spans.push(Span::styled(
            " …",
            Style::default().fg(Color::DarkGray),
        )),
        DeliveryState::Failed => spans.push(Span::styled(
            " ✗ not sent",
            Style::default().fg(Color::Red),
        )),
        DeliveryState::Confirmed => {}
    }
    Line::from(spans)
}

fn toast_block(toast: &Toast) -> Vec<Line<'static>> {
    let color = match toast.severity {
        Severity::Normal => Color::White,
        Severity::Destructive => Color::Red,
    };
    let mut lines = vec![Line::from(vec![
        Span::styled(
            format!("{} ", toast.id),
            Style::default().fg(Color::DarkGray),
        ),
        Span::styled(
            toast.title.clone().unwrap_or_default(),
            Style::default().fg(color).add_modifier(Modifier::BOLD),
        ),
    ])];
    if let Some(body) = &toast.body {
        lines.push(Line::styled(body.clone(), Style::default().fg(color)));
    }
    lines
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chat::ChatMessage;

    fn entry(sender: &str, direction: Flow) -> TranscriptEntry {
        TranscriptEntry {
            message: ChatMessage {
                id: "1".to_string(),
                text: "hi".to_string(),
                sender: sender.to_string(),
                timestamp: 0,
            },
            direction,
            state: DeliveryState::Confirmed,
        }
    }

    fn sender_color(entry: &TranscriptEntry) -> Option<Color> {
        transcript_line(entry).spans.get(1).and_then(|span| span.style.fg)
    }

    #[test]
    fn colour_follows_direction_not_name() {
        // A user who picked a bot's name is still styled as the local side.
        assert_eq!(sender_color(&entry("Anna", Flow::Outbound)), Some(Color::Cyan));
        assert_eq!(sender_color(&entry("Anna", Flow::Inbound)), Some(Color::Magenta));
        assert_eq!(
            sender_color(&entry(SYSTEM_SENDER, Flow::Inbound)),
            Some(Color::DarkGray)
        );
    }
}
