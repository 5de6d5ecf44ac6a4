pub mod console;

use crate::popup::{StatusClass, StatusSink};
use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Wrap},
    Frame,
};

pub use console::ConsoleSink;

const TITLE: &str = " Phishing Check ";
const FOOTER: &str = "q / Esc to close";

/// The popup's two display regions: a status indicator and a text preview.
#[derive(Debug, Clone, Default)]
pub struct PopupView {
    status: String,
    class: StatusClass,
    preview: String,
}

impl PopupView {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn status(&self) -> &str {
        &self.status
    }

    pub fn class(&self) -> StatusClass {
        self.class
    }

    pub fn preview(&self) -> &str {
        &self.preview
    }

    pub fn render(&self, frame: &mut Frame, area: Rect) {
        let status_height = self.status.lines().count().max(1) as u16 + 2;
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(status_height),
                Constraint::Min(3),
                Constraint::Length(1),
            ])
            .split(area);

        let status_style = status_style(self.class);
        let status_lines: Vec<Line> = self
            .status
            .lines()
            .enumerate()
            .map(|(i, line)| {
                // Detail lines under the headline are dimmer
                if i == 0 {
                    Line::from(Span::styled(line, status_style))
                } else {
                    Line::from(Span::styled(line, Style::default().fg(Color::Gray)))
                }
            })
            .collect();

        let status = Paragraph::new(status_lines)
            .block(
                Block::default()
                    .title(TITLE)
                    .borders(Borders::ALL)
                    .border_style(status_style.remove_modifier(Modifier::BOLD)),
            )
            .wrap(Wrap { trim: true });
        frame.render_widget(status, chunks[0]);

        let preview = Paragraph::new(self.preview.as_str())
            .style(Style::default().fg(Color::White))
            .block(
                Block::default()
                    .title(" Preview ")
                    .borders(Borders::ALL)
                    .border_style(Style::default().fg(Color::DarkGray)),
            )
            .wrap(Wrap { trim: false });
        frame.render_widget(preview, chunks[1]);

        let footer = Paragraph::new(Span::styled(
            FOOTER,
            Style::default().fg(Color::DarkGray),
        ));
        frame.render_widget(footer, chunks[2]);
    }
}

impl StatusSink for PopupView {
    fn set_status(&mut self, text: &str, class: StatusClass) {
        self.status = text.to_string();
        self.class = class;
    }

    fn set_preview(&mut self, text: &str) {
        self.preview = text.to_string();
    }
}

pub fn status_style(class: StatusClass) -> Style {
    match class {
        StatusClass::Loading => Style::default().fg(Color::Yellow),
        StatusClass::Danger => Style::default()
            .fg(Color::Red)
            .add_modifier(Modifier::BOLD),
        StatusClass::Safe => Style::default()
            .fg(Color::Green)
            .add_modifier(Modifier::BOLD),
        StatusClass::Neutral => Style::default().fg(Color::White),
    }
}
