use findor_core::docs::{Endpoint, Language, Parameter, ResponseExample};
use ratatui::prelude::*;
use ratatui::widgets::{Block, Borders, Paragraph, Tabs, Wrap};

use super::method_style;

/// Reference pane on the left, request snippet with language tabs on
/// the right.
pub fn render(frame: &mut Frame, area: Rect, endpoint: &Endpoint, language: Language, scroll: u16) {
    let columns = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(55), Constraint::Percentage(45)])
        .split(area);

    render_reference(frame, columns[0], endpoint, scroll);
    render_snippet(frame, columns[1], endpoint, language);
}

fn render_reference(frame: &mut Frame, area: Rect, endpoint: &Endpoint, scroll: u16) {
    let block = Block::default()
        .title(format!(" {} ", endpoint.title))
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::DarkGray));

    let mut lines = vec![
        Line::from(vec![
            Span::styled(format!(" {} ", endpoint.method), method_style(endpoint.method)),
            Span::raw(" "),
            Span::styled(endpoint.path.as_str(), Style::default().fg(Color::White)),
        ]),
        Line::raw(""),
        Line::styled(endpoint.description.as_str(), Style::default().fg(Color::Gray)),
    ];

    let params = &endpoint.parameters;
    for (title, list) in [
        ("Path Parameters", &params.path),
        ("Query Parameters", &params.query),
        ("Body Parameters", &params.body),
    ] {
        push_parameters(&mut lines, title, list);
    }

    lines.push(Line::raw(""));
    lines.push(Line::styled(
        "Responses",
        Style::default().fg(Color::Cyan).bold(),
    ));
    for response in &endpoint.responses {
        push_response(&mut lines, response);
    }

    let paragraph = Paragraph::new(lines)
        .block(block)
        .wrap(Wrap { trim: false })
        .scroll((scroll, 0));
    frame.render_widget(paragraph, area);
}

fn push_parameters<'a>(lines: &mut Vec<Line<'a>>, title: &'a str, params: &'a [Parameter]) {
    if params.is_empty() {
        return;
    }
    lines.push(Line::raw(""));
    lines.push(Line::styled(title, Style::default().fg(Color::Cyan).bold()));
    for param in params {
        let mut spans = vec![
            Span::styled(format!("  {}", param.name), Style::default().bold()),
            Span::styled(
                format!("  {}", param.type_name),
                Style::default().fg(Color::Magenta),
            ),
        ];
        if param.required {
            spans.push(Span::styled("  required", Style::default().fg(Color::Red)));
        }
        lines.push(Line::from(spans));
        lines.push(Line::styled(
            format!("    {}", param.description),
            Style::default().fg(Color::DarkGray),
        ));
    }
}

fn push_response<'a>(lines: &mut Vec<Line<'a>>, response: &'a ResponseExample) {
    let status_style = if response.is_error() {
        Style::default().fg(Color::Red).bold()
    } else {
        Style::default().fg(Color::Green).bold()
    };
    lines.push(Line::from(vec![
        Span::styled(format!("  {}", response.status), status_style),
        Span::raw(format!("  {}", response.description)),
    ]));
    for code_line in response.example.lines() {
        lines.push(Line::styled(
            format!("    {code_line}"),
            Style::default().fg(Color::Gray),
        ));
    }
}

fn render_snippet(frame: &mut Frame, area: Rect, endpoint: &Endpoint, language: Language) {
    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(3), Constraint::Min(0)])
        .split(area);

    let selected = Language::ALL
        .iter()
        .position(|&l| l == language)
        .unwrap_or_default();
    let tabs = Tabs::new(Language::ALL.iter().map(|l| l.label()))
        .block(Block::default().borders(Borders::ALL).title(" Request "))
        .select(selected)
        .highlight_style(Style::default().fg(Color::Black).bg(Color::Cyan).bold());
    frame.render_widget(tabs, rows[0]);

    let code = endpoint
        .example(language)
        .map(|ex| ex.code.as_str())
        .unwrap_or_default();
    let paragraph = Paragraph::new(code)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Style::default().fg(Color::DarkGray)),
        )
        .style(Style::default().fg(Color::Yellow));
    frame.render_widget(paragraph, rows[1]);
}
