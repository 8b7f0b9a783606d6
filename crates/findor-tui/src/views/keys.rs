//! Key dashboard drawing. Pure function of the controller snapshot plus
//! the local cursor and text input; nothing here talks to the network.

use findor_core::ApiKey;
use findor_manager::ManagerState;
use ratatui::prelude::*;
use ratatui::widgets::{Block, Borders, Clear, List, ListItem, ListState, Paragraph, Wrap};

use super::centered_rect;

pub const EMPTY_MESSAGE: &str = "You haven't created any API keys yet.";
pub const SYNCING: &str = "Syncing...";

pub struct KeysView<'a> {
    pub state: &'a ManagerState,
    pub list_state: &'a ListState,
    pub name_input: &'a str,
}

pub fn render(frame: &mut Frame, area: Rect, view: &KeysView) {
    let state = view.state;

    let mut block = Block::default()
        .title(" API Keys ")
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::DarkGray));
    if state.background_refreshing {
        block = block.title(
            Line::styled(format!(" {SYNCING} "), Style::default().fg(Color::Yellow))
                .right_aligned(),
        );
    }
    let inner = block.inner(area);
    frame.render_widget(block, area);

    let banner_height = if state.error.is_some() { 2 } else { 0 };
    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(2),
            Constraint::Length(banner_height),
            Constraint::Min(0),
        ])
        .split(inner);

    let header = Paragraph::new(vec![Line::styled(
        "Manage your secret keys for accessing the API.",
        Style::default().fg(Color::Gray),
    )]);
    frame.render_widget(header, rows[0]);

    if let Some(ref error) = state.error {
        let banner = Paragraph::new(Line::styled(
            error.as_str(),
            Style::default().fg(Color::Red).bold(),
        ));
        frame.render_widget(banner, rows[1]);
    }

    if state.is_loading() {
        let loading = Paragraph::new("Loading your API keys...")
            .style(Style::default().fg(Color::DarkGray));
        frame.render_widget(loading, rows[2]);
    } else if state.keys.is_empty() {
        let empty = Paragraph::new(vec![
            Line::raw(EMPTY_MESSAGE),
            Line::styled(
                "Press n to create a new secret key.",
                Style::default().fg(Color::DarkGray),
            ),
        ]);
        frame.render_widget(empty, rows[2]);
    } else {
        render_key_list(frame, rows[2], &state.keys, view.list_state);
    }

    // Overlays
    if state.create_dialog_open {
        render_create_dialog(frame, area, view.name_input, state.creating);
    }
    if let Some(ref key) = state.pending_reveal {
        render_reveal_dialog(frame, area, key);
    }
    if let Some(ref key) = state.pending_delete {
        render_delete_dialog(frame, area, key, state.deleting);
    }
}

fn render_key_list(frame: &mut Frame, area: Rect, keys: &[ApiKey], list_state: &ListState) {
    let items: Vec<ListItem> = keys
        .iter()
        .map(|key| {
            ListItem::new(vec![
                Line::from(Span::styled(key.name.as_str(), Style::default().bold())),
                Line::from(vec![
                    Span::styled(key.masked(), Style::default().fg(Color::Gray)),
                    Span::styled(
                        format!("  Created on {}", key.created_on()),
                        Style::default().fg(Color::DarkGray),
                    ),
                ]),
            ])
        })
        .collect();

    let list = List::new(items)
        .block(Block::default().title("Your Keys"))
        .highlight_style(Style::default().fg(Color::Cyan).bold())
        .highlight_symbol("> ");

    let mut state = list_state.clone();
    frame.render_stateful_widget(list, area, &mut state);
}

fn render_create_dialog(frame: &mut Frame, area: Rect, input: &str, creating: bool) {
    let popup = centered_rect(60, 40, area);
    frame.render_widget(Clear, popup);

    let block = Block::default()
        .title(" Create new secret key ")
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Cyan));

    let field = if input.is_empty() {
        Span::styled("e.g., My Test App", Style::default().fg(Color::DarkGray))
    } else {
        Span::raw(input)
    };
    let footer = if creating {
        Line::styled("Creating...", Style::default().fg(Color::Yellow))
    } else {
        Line::styled(
            "(Enter) create key / (Esc) cancel",
            Style::default().fg(Color::DarkGray),
        )
    };

    let text = vec![
        Line::raw("Give your key a name to help you identify it later."),
        Line::raw(""),
        Line::styled("Key name", Style::default().bold()),
        Line::from(vec![Span::raw("> "), field]),
        Line::raw(""),
        footer,
    ];
    let paragraph = Paragraph::new(text)
        .block(block)
        .wrap(Wrap { trim: false });
    frame.render_widget(paragraph, popup);
}

fn render_reveal_dialog(frame: &mut Frame, area: Rect, key: &ApiKey) {
    let popup = centered_rect(70, 40, area);
    frame.render_widget(Clear, popup);

    let block = Block::default()
        .title(" Secret key created ")
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Green));

    let text = vec![
        Line::raw(
            "Here is your new secret key. This is the only time you will see it. \
             Please copy and store it in a secure place.",
        ),
        Line::raw(""),
        Line::styled(key.name.as_str(), Style::default().bold()),
        Line::styled(key.secret.as_str(), Style::default().fg(Color::Yellow)),
        Line::raw(""),
        Line::styled("(Enter) done", Style::default().fg(Color::DarkGray)),
    ];
    let paragraph = Paragraph::new(text)
        .block(block)
        .wrap(Wrap { trim: false });
    frame.render_widget(paragraph, popup);
}

fn render_delete_dialog(frame: &mut Frame, area: Rect, key: &ApiKey, deleting: bool) {
    let popup = centered_rect(50, 30, area);
    frame.render_widget(Clear, popup);

    let block = Block::default()
        .title(" Delete API Key ")
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Red));

    let footer = if deleting {
        "Deleting..."
    } else {
        "(y) delete / (n) cancel"
    };
    let text = format!(
        "Are you sure you want to delete the key named \"{}\" ({})? \
         This action is irreversible.\n\n{footer}",
        key.name,
        key.masked()
    );
    let paragraph = Paragraph::new(text)
        .block(block)
        .wrap(Wrap { trim: false })
        .alignment(Alignment::Center);
    frame.render_widget(paragraph, popup);
}
