use findor_core::docs::{Catalog, HttpMethod};
use findor_core::Session;
use ratatui::prelude::*;
use ratatui::widgets::{Block, Borders, List, ListItem, ListState, Paragraph};

use crate::app::Page;
use crate::views::method_style;

#[derive(Debug, Clone)]
enum Entry {
    Home,
    ApiKeys,
    Group(String),
    Endpoint {
        id: String,
        title: String,
        method: HttpMethod,
    },
    NoResults(String),
}

impl Entry {
    fn page(&self) -> Option<Page> {
        match self {
            Entry::Home => Some(Page::Overview),
            Entry::ApiKeys => Some(Page::ApiKeys),
            Entry::Endpoint { id, .. } => Some(Page::Endpoint(id.clone())),
            Entry::Group(_) | Entry::NoResults(_) => None,
        }
    }
}

/// Navigation column: Home, API Keys when signed in, then the endpoint
/// groups narrowed by the search term.
pub struct Sidebar {
    entries: Vec<Entry>,
    list_state: ListState,
}

impl Sidebar {
    pub fn new(catalog: &Catalog, session: &Session, filter: &str) -> Self {
        let mut entries = vec![Entry::Home];
        if session.is_signed_in() {
            entries.push(Entry::ApiKeys);
        }
        let groups = catalog.filter_groups(filter);
        if groups.is_empty() {
            entries.push(Entry::NoResults(filter.trim().to_string()));
        }
        for group in groups {
            entries.push(Entry::Group(group.group));
            entries.extend(group.endpoints.into_iter().map(|ep| Entry::Endpoint {
                id: ep.id,
                title: ep.title,
                method: ep.method,
            }));
        }

        let mut list_state = ListState::default();
        list_state.select(Some(0));
        Self {
            entries,
            list_state,
        }
    }

    /// Rebuild after the filter changed, keeping the cursor on the same
    /// page when it is still listed.
    pub fn rebuild(&mut self, catalog: &Catalog, session: &Session, filter: &str) {
        let current = self.selected_page();
        *self = Self::new(catalog, session, filter);
        if let Some(page) = current {
            self.select_page(&page);
        }
    }

    pub fn selected_page(&self) -> Option<Page> {
        self.list_state
            .selected()
            .and_then(|i| self.entries.get(i))
            .and_then(Entry::page)
    }

    pub fn select_page(&mut self, page: &Page) -> bool {
        match self
            .entries
            .iter()
            .position(|e| e.page().as_ref() == Some(page))
        {
            Some(i) => {
                self.list_state.select(Some(i));
                true
            }
            None => false,
        }
    }

    /// Ids of the endpoints currently listed.
    pub fn endpoint_ids(&self) -> Vec<&str> {
        self.entries
            .iter()
            .filter_map(|e| match e {
                Entry::Endpoint { id, .. } => Some(id.as_str()),
                _ => None,
            })
            .collect()
    }

    pub fn next(&mut self) {
        let start = self.list_state.selected().map_or(0, |i| i + 1);
        if let Some(i) = (start..self.entries.len()).find(|&i| self.entries[i].page().is_some()) {
            self.list_state.select(Some(i));
        }
    }

    pub fn prev(&mut self) {
        let end = self.list_state.selected().unwrap_or(0);
        if let Some(i) = (0..end).rev().find(|&i| self.entries[i].page().is_some()) {
            self.list_state.select(Some(i));
        }
    }

    pub fn render(&self, frame: &mut Frame, area: Rect, focused: bool, filter: &str, searching: bool) {
        let rows = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Length(3), Constraint::Min(0)])
            .split(area);

        let search_style = if searching {
            Style::default().fg(Color::Cyan)
        } else {
            Style::default().fg(Color::DarkGray)
        };
        let search_text = if filter.is_empty() && !searching {
            Span::styled("Search... (/)", Style::default().fg(Color::DarkGray))
        } else {
            Span::raw(filter)
        };
        let search = Paragraph::new(Line::from(search_text)).block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(search_style),
        );
        frame.render_widget(search, rows[0]);

        let border_style = if focused {
            Style::default().fg(Color::Cyan)
        } else {
            Style::default().fg(Color::DarkGray)
        };
        let block = Block::default()
            .title(" Findor ")
            .borders(Borders::ALL)
            .border_style(border_style);

        let items: Vec<ListItem> = self
            .entries
            .iter()
            .map(|entry| match entry {
                Entry::Home => ListItem::new("Home"),
                Entry::ApiKeys => ListItem::new("API Keys"),
                Entry::Group(name) => ListItem::new(Line::styled(
                    name.to_uppercase(),
                    Style::default().fg(Color::DarkGray).bold(),
                )),
                Entry::Endpoint { title, method, .. } => ListItem::new(Line::from(vec![
                    Span::styled(format!("{:<6} ", method.as_str()), method_style(*method)),
                    Span::raw(title.as_str()),
                ])),
                Entry::NoResults(term) => ListItem::new(Line::styled(
                    format!("No results found for \"{term}\"."),
                    Style::default().fg(Color::DarkGray),
                )),
            })
            .collect();

        let list = List::new(items)
            .block(block)
            .highlight_style(
                Style::default()
                    .fg(Color::Black)
                    .bg(Color::Cyan)
                    .bold(),
            )
            .highlight_symbol("> ");

        let mut state = self.list_state.clone();
        frame.render_stateful_widget(list, rows[1], &mut state);
    }
}
