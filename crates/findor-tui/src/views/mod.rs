pub mod endpoint;
pub mod keys;
pub mod overview;

use findor_core::docs::HttpMethod;
use ratatui::prelude::*;
use ratatui::widgets::{Block, Borders, Paragraph};

/// Badge colour for an HTTP method.
pub fn method_style(method: HttpMethod) -> Style {
    match method {
        HttpMethod::Get => Style::default().fg(Color::Green).bold(),
        HttpMethod::Post => Style::default().fg(Color::Blue).bold(),
        HttpMethod::Put => Style::default().fg(Color::Yellow).bold(),
        HttpMethod::Patch => Style::default().fg(Color::LightRed).bold(),
        HttpMethod::Delete => Style::default().fg(Color::Red).bold(),
    }
}

pub fn render_not_found(frame: &mut Frame, area: Rect) {
    let text = vec![
        Line::from(Span::styled("Endpoint Not Found", Style::default().bold())),
        Line::raw(""),
        Line::styled(
            "Select an endpoint from the sidebar.",
            Style::default().fg(Color::DarkGray),
        ),
    ];
    let paragraph = Paragraph::new(text)
        .block(Block::default().borders(Borders::ALL))
        .alignment(Alignment::Center);
    frame.render_widget(paragraph, area);
}

pub fn centered_rect(percent_x: u16, percent_y: u16, area: Rect) -> Rect {
    let popup_layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - percent_y) / 2),
            Constraint::Percentage(percent_y),
            Constraint::Percentage((100 - percent_y) / 2),
        ])
        .split(area);

    Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(popup_layout[1])[1]
}
