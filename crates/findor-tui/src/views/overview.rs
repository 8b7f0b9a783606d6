use findor_core::docs::ApiOverview;
use ratatui::prelude::*;
use ratatui::widgets::{Block, Borders, Paragraph, Wrap};

fn heading(text: &str) -> Line<'static> {
    Line::from(Span::styled(
        text.to_string(),
        Style::default().fg(Color::Cyan).bold(),
    ))
}

fn bullets<'a>(lines: &mut Vec<Line<'a>>, items: &'a [String]) {
    for item in items {
        lines.push(Line::from(vec![
            Span::styled("  • ", Style::default().fg(Color::DarkGray)),
            Span::raw(item.as_str()),
        ]));
    }
}

pub fn render(frame: &mut Frame, area: Rect, overview: &ApiOverview, scroll: u16) {
    let block = Block::default()
        .title(" Home ")
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::DarkGray));

    let mut lines = vec![
        Line::from(Span::styled(
            overview.title.as_str(),
            Style::default().fg(Color::White).bold(),
        )),
        Line::raw(""),
        Line::styled(overview.description.as_str(), Style::default().fg(Color::Gray)),
        Line::raw(""),
        heading("Base URL"),
        Line::styled(
            format!("  {}", overview.base_url),
            Style::default().fg(Color::Yellow),
        ),
        Line::raw(""),
        heading("Authentication"),
        Line::raw(overview.authentication.as_str()),
        Line::styled(
            "  Authorization: Bearer <your_api_token>",
            Style::default().fg(Color::Yellow),
        ),
        Line::raw(""),
        heading("Rate Limiting & Support"),
        Line::raw(overview.rate_limiting.as_str()),
        Line::raw(overview.support.as_str()),
    ];

    if !overview.best_practices.is_empty() {
        lines.push(Line::raw(""));
        lines.push(heading("Best Practices"));
        bullets(&mut lines, &overview.best_practices);
    }
    if !overview.notes.is_empty() {
        lines.push(Line::raw(""));
        lines.push(heading("Notes"));
        bullets(&mut lines, &overview.notes);
    }

    let paragraph = Paragraph::new(lines)
        .block(block)
        .wrap(Wrap { trim: false })
        .scroll((scroll, 0));
    frame.render_widget(paragraph, area);
}
