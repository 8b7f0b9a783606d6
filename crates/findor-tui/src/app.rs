use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use crossterm::event::{KeyCode, KeyEvent};
use findor_core::docs::{Catalog, Language};
use findor_core::Session;
use findor_manager::{KeyManager, ManagerState};
use findor_service::KeyService;
use ratatui::prelude::*;
use ratatui::widgets::ListState;
use tokio::runtime::Handle;
use tracing::debug;

use crate::components::sidebar::Sidebar;
use crate::views::{self, endpoint, keys, overview};

/// Which screen the content pane shows
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Page {
    Overview,
    ApiKeys,
    Endpoint(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Focus {
    Sidebar,
    Content,
}

/// What the app is currently doing
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    /// Browsing the sidebar or reading a page
    Normal,
    /// Typing into the sidebar search box
    Search,
    /// Typing a name in the create-key dialog
    NameKey,
    /// A freshly created secret is on screen
    RevealKey,
    /// Waiting for y/n on a key deletion
    ConfirmDelete,
}

/// The mounted key dashboard. Lives only while the keys page is open.
struct KeysPage {
    manager: KeyManager,
    list_state: ListState,
    name_input: String,
}

pub struct App {
    catalog: Catalog,
    session: Session,
    service: Arc<dyn KeyService>,
    runtime: Handle,
    refresh_interval: Duration,
    sidebar: Sidebar,
    page: Page,
    focus: Focus,
    searching: bool,
    filter: String,
    language: Language,
    scroll: u16,
    keys: Option<KeysPage>,
    status_message: Option<String>,
}

fn spawn_on<F, Fut>(runtime: &Handle, manager: &KeyManager, op: F)
where
    F: FnOnce(KeyManager) -> Fut,
    Fut: Future<Output = ()> + Send + 'static,
{
    runtime.spawn(op(manager.clone()));
}

impl App {
    pub fn new(
        catalog: Catalog,
        session: Session,
        service: Arc<dyn KeyService>,
        runtime: Handle,
        refresh_interval: Duration,
    ) -> Self {
        let sidebar = Sidebar::new(&catalog, &session, "");
        Self {
            catalog,
            session,
            service,
            runtime,
            refresh_interval,
            sidebar,
            page: Page::Overview,
            focus: Focus::Sidebar,
            searching: false,
            filter: String::new(),
            language: Language::Curl,
            scroll: 0,
            keys: None,
            status_message: None,
        }
    }

    pub fn page(&self) -> &Page {
        &self.page
    }

    pub fn focus(&self) -> Focus {
        self.focus
    }

    pub fn language(&self) -> Language {
        self.language
    }

    pub fn filter(&self) -> &str {
        &self.filter
    }

    pub fn key_manager(&self) -> Option<&KeyManager> {
        self.keys.as_ref().map(|k| &k.manager)
    }

    pub fn mode(&self) -> Mode {
        if self.searching {
            return Mode::Search;
        }
        let Some(page) = &self.keys else {
            return Mode::Normal;
        };
        let state = page.manager.snapshot();
        if state.pending_reveal.is_some() {
            Mode::RevealKey
        } else if state.pending_delete.is_some() {
            Mode::ConfirmDelete
        } else if state.create_dialog_open {
            Mode::NameKey
        } else {
            Mode::Normal
        }
    }

    pub fn is_input_mode(&self) -> bool {
        matches!(self.mode(), Mode::Search | Mode::NameKey)
    }

    /// Whether a bare `q` may quit. Not while typing, and not while a new
    /// secret is on screen since it cannot be shown again.
    pub fn can_quit(&self) -> bool {
        !self.is_input_mode() && self.mode() != Mode::RevealKey
    }

    /// Switch the content pane. Leaving the keys page unmounts its
    /// manager; entering it mounts a fresh one.
    pub fn open(&mut self, page: Page) {
        self.focus = Focus::Content;
        if page == self.page {
            return;
        }
        if page == Page::ApiKeys && !self.session.is_signed_in() {
            self.status_message = Some("Sign in to manage API keys".into());
            return;
        }
        if self.page == Page::ApiKeys {
            self.unmount_keys();
        }
        self.sidebar.select_page(&page);
        self.page = page;
        self.scroll = 0;
        if self.page == Page::ApiKeys {
            self.mount_keys();
        }
    }

    fn mount_keys(&mut self) {
        let manager = KeyManager::with_refresh_interval(self.service.clone(), self.refresh_interval);
        let session = self.session.clone();
        spawn_on(&self.runtime, &manager, |m| async move {
            m.mount(&session).await;
        });
        debug!("keys page mounted");
        self.keys = Some(KeysPage {
            manager,
            list_state: ListState::default(),
            name_input: String::new(),
        });
    }

    fn unmount_keys(&mut self) {
        if let Some(page) = self.keys.take() {
            page.manager.shutdown();
            debug!("keys page unmounted");
        }
    }

    /// Tear down background work before exit.
    pub fn shutdown(&mut self) {
        self.unmount_keys();
    }

    pub fn handle_key(&mut self, key: KeyEvent) {
        self.status_message = None;

        if self.searching {
            self.handle_search_key(key);
            return;
        }
        match self.focus {
            Focus::Sidebar => self.handle_sidebar_key(key),
            Focus::Content => match self.page {
                Page::ApiKeys => self.handle_keys_page_key(key),
                _ => self.handle_doc_key(key),
            },
        }
    }

    fn start_search(&mut self) {
        self.searching = true;
        self.focus = Focus::Sidebar;
    }

    fn handle_search_key(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Esc => {
                self.searching = false;
                self.filter.clear();
            }
            KeyCode::Enter => self.searching = false,
            KeyCode::Backspace => {
                self.filter.pop();
            }
            KeyCode::Char(c) => self.filter.push(c),
            _ => return,
        }
        self.sidebar
            .rebuild(&self.catalog, &self.session, &self.filter);
    }

    fn handle_sidebar_key(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Char('j') | KeyCode::Down => self.sidebar.next(),
            KeyCode::Char('k') | KeyCode::Up => self.sidebar.prev(),
            KeyCode::Char('/') => self.start_search(),
            KeyCode::Enter | KeyCode::Char('l') | KeyCode::Right => {
                if let Some(page) = self.sidebar.selected_page() {
                    self.open(page);
                }
            }
            KeyCode::Tab => self.focus = Focus::Content,
            _ => {}
        }
    }

    fn handle_doc_key(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Char('j') | KeyCode::Down => self.scroll = self.scroll.saturating_add(1),
            KeyCode::Char('k') | KeyCode::Up => self.scroll = self.scroll.saturating_sub(1),
            KeyCode::Tab => {
                if matches!(self.page, Page::Endpoint(_)) {
                    self.language = self.language.next();
                }
            }
            KeyCode::Char('/') => self.start_search(),
            KeyCode::Esc | KeyCode::Char('h') | KeyCode::Left => self.focus = Focus::Sidebar,
            _ => {}
        }
    }

    fn handle_keys_page_key(&mut self, key: KeyEvent) {
        let Some(page) = self.keys.as_mut() else {
            return;
        };
        let state = page.manager.snapshot();

        // Dialogs take every key while open.
        if state.pending_reveal.is_some() {
            if matches!(key.code, KeyCode::Enter | KeyCode::Esc) {
                page.manager.dismiss_reveal();
            }
            return;
        }
        if state.pending_delete.is_some() {
            match key.code {
                KeyCode::Char('y') if !state.deleting => {
                    spawn_on(&self.runtime, &page.manager, |m| async move {
                        m.confirm_delete().await;
                    });
                }
                KeyCode::Char('n') | KeyCode::Esc => {
                    page.manager.cancel_delete();
                }
                _ => {}
            }
            return;
        }
        if state.create_dialog_open {
            if state.creating {
                return;
            }
            match key.code {
                KeyCode::Char(c) => page.name_input.push(c),
                KeyCode::Backspace => {
                    page.name_input.pop();
                }
                KeyCode::Enter => {
                    let name = page.name_input.trim().to_string();
                    if !name.is_empty() {
                        spawn_on(&self.runtime, &page.manager, |m| async move {
                            m.create_key(&name).await;
                        });
                    }
                }
                KeyCode::Esc => {
                    page.manager.close_create_dialog();
                }
                _ => {}
            }
            return;
        }

        match key.code {
            KeyCode::Char('n') => {
                if page.manager.open_create_dialog() {
                    page.name_input.clear();
                } else {
                    self.status_message = Some("Keys are still loading".into());
                }
            }
            KeyCode::Char('d') => {
                if let Some(key) = selected_key(&state, &page.list_state) {
                    page.manager.request_delete(key.clone());
                }
            }
            KeyCode::Char('r') => {
                spawn_on(&self.runtime, &page.manager, |m| async move {
                    m.refresh().await;
                });
                self.status_message = Some("Refreshing...".into());
            }
            KeyCode::Char('j') | KeyCode::Down => {
                let next = clamp_selection(&state, &page.list_state).map_or(0, |i| i + 1);
                if next < state.key_count() {
                    page.list_state.select(Some(next));
                }
            }
            KeyCode::Char('k') | KeyCode::Up => {
                if let Some(i) = clamp_selection(&state, &page.list_state) {
                    page.list_state.select(Some(i.saturating_sub(1)));
                }
            }
            KeyCode::Char('/') => self.start_search(),
            KeyCode::Esc | KeyCode::Char('h') | KeyCode::Left => self.focus = Focus::Sidebar,
            _ => {}
        }
    }

    pub fn render(&self, frame: &mut Frame) {
        let area = frame.area();

        let layout = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(1),
                Constraint::Min(0),
                Constraint::Length(1),
            ])
            .split(area);

        let body = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Length(34), Constraint::Min(0)])
            .split(layout[1]);

        self.render_title_bar(frame, layout[0]);
        self.sidebar.render(
            frame,
            body[0],
            self.focus == Focus::Sidebar,
            &self.filter,
            self.searching,
        );
        self.render_content(frame, body[1]);
        self.render_status_bar(frame, layout[2]);
    }

    fn render_content(&self, frame: &mut Frame, area: Rect) {
        match &self.page {
            Page::Overview => overview::render(frame, area, &self.catalog.overview, self.scroll),
            Page::Endpoint(id) => match self.catalog.find(id) {
                Some(ep) => endpoint::render(frame, area, ep, self.language, self.scroll),
                None => views::render_not_found(frame, area),
            },
            Page::ApiKeys => {
                let Some(page) = &self.keys else {
                    return;
                };
                let state = page.manager.snapshot();
                let mut list_state = ListState::default();
                list_state.select(clamp_selection(&state, &page.list_state));
                keys::render(
                    frame,
                    area,
                    &keys::KeysView {
                        state: &state,
                        list_state: &list_state,
                        name_input: &page.name_input,
                    },
                );
            }
        }
    }

    fn render_title_bar(&self, frame: &mut Frame, area: Rect) {
        let user = match self.session.email() {
            Some(email) => Span::styled(email, Style::default().fg(Color::Yellow)),
            None => Span::styled("signed out", Style::default().fg(Color::DarkGray)),
        };
        let title = Line::from(vec![
            Span::styled(" findor ", Style::default().bold().fg(Color::Cyan)),
            Span::raw("| "),
            Span::raw(self.catalog.overview.title.as_str()),
            Span::raw(" | "),
            user,
        ]);
        frame.render_widget(title, area);
    }

    fn render_status_bar(&self, frame: &mut Frame, area: Rect) {
        if let Some(ref msg) = self.status_message {
            let line = Line::from(Span::styled(
                format!(" {msg}"),
                Style::default().fg(Color::Green),
            ));
            frame.render_widget(line, area);
            return;
        }

        let hints = match (self.mode(), self.focus, &self.page) {
            (Mode::Search, _, _) => vec![("Enter", "keep"), ("Esc", "clear")],
            (Mode::NameKey, _, _) => vec![("Enter", "create"), ("Esc", "cancel")],
            (Mode::RevealKey, _, _) => vec![("Enter", "done")],
            (Mode::ConfirmDelete, _, _) => vec![("y", "delete"), ("n", "cancel")],
            (Mode::Normal, Focus::Sidebar, _) => vec![
                ("q", "quit"),
                ("j/k", "nav"),
                ("Enter", "open"),
                ("/", "search"),
            ],
            (Mode::Normal, Focus::Content, Page::ApiKeys) => vec![
                ("j/k", "select"),
                ("n", "new"),
                ("d", "del"),
                ("r", "refresh"),
                ("Esc", "back"),
            ],
            (Mode::Normal, Focus::Content, Page::Endpoint(_)) => vec![
                ("j/k", "scroll"),
                ("Tab", "language"),
                ("Esc", "back"),
            ],
            (Mode::Normal, Focus::Content, Page::Overview) => {
                vec![("j/k", "scroll"), ("Esc", "back")]
            }
        };

        let spans: Vec<Span> = hints
            .into_iter()
            .flat_map(|(key, desc)| {
                vec![
                    Span::styled(
                        format!(" {key}"),
                        Style::default().fg(Color::Yellow).bold(),
                    ),
                    Span::raw(format!(" {desc} ")),
                ]
            })
            .collect();

        frame.render_widget(Line::from(spans), area);
    }
}

/// Cursor index clamped to the current list, or `None` when it is empty.
fn clamp_selection(state: &ManagerState, list_state: &ListState) -> Option<usize> {
    let len = state.key_count();
    if len == 0 {
        return None;
    }
    Some(list_state.selected().unwrap_or(0).min(len - 1))
}

fn selected_key<'a>(state: &'a ManagerState, list_state: &ListState) -> Option<&'a findor_core::ApiKey> {
    clamp_selection(state, list_state).and_then(|i| state.keys.get(i))
}
