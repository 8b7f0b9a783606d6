use std::fs::File;
use std::io;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use crossterm::{
    event::{self, Event, KeyCode, KeyEventKind, KeyModifiers},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use findor_core::docs::Catalog;
use findor_service::{HttpKeyService, KeyService};
use findor_tui::app::App;
use findor_tui::cli;
use findor_tui::config::{Command, Config};
use ratatui::prelude::*;
use tokio::runtime::Runtime;
use tracing::info;
use tracing_subscriber::EnvFilter;

/// Input poll timeout. Also how often background key updates are redrawn.
const TICK: Duration = Duration::from_millis(200);

fn main() -> Result<()> {
    let config = Config::parse();
    init_tracing(&config)?;

    let runtime = Runtime::new().context("failed to start tokio runtime")?;
    let catalog = Catalog::builtin().context("embedded API catalog is invalid")?;
    let service: Arc<dyn KeyService> = Arc::new(HttpKeyService::with_timeout(
        &config.base_url,
        config.timeout(),
    ));
    info!("key service: {}", config.base_url);

    match &config.command {
        None | Some(Command::Tui) => run_tui(&config, catalog, service, &runtime),
        Some(Command::Keys(cmd)) => {
            let mut out = io::stdout().lock();
            runtime.block_on(cli::run_keys(
                cmd,
                &config.session(),
                service.as_ref(),
                &mut out,
            ))
        }
        Some(Command::Docs(cmd)) => cli::run_docs(cmd, &catalog, &mut io::stdout().lock()),
    }
}

/// The TUI owns the terminal, so it only logs when `--log-file` is given.
/// One-shot commands log to stderr.
fn init_tracing(config: &Config) -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    match &config.log_file {
        Some(path) => {
            let file = File::create(path)
                .with_context(|| format!("failed to open log file {}", path.display()))?;
            tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_ansi(false)
                .with_writer(Mutex::new(file))
                .init();
        }
        None if config.is_tui() => {}
        None => {
            tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_writer(io::stderr)
                .init();
        }
    }
    Ok(())
}

fn run_tui(
    config: &Config,
    catalog: Catalog,
    service: Arc<dyn KeyService>,
    runtime: &Runtime,
) -> Result<()> {
    let mut app = App::new(
        catalog,
        config.session(),
        service,
        runtime.handle().clone(),
        config.refresh_interval(),
    );

    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let result = event_loop(&mut terminal, &mut app);
    app.shutdown();

    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    if let Err(ref e) = result {
        eprintln!("Error: {e}");
    }

    result
}

fn event_loop(terminal: &mut Terminal<CrosstermBackend<io::Stdout>>, app: &mut App) -> Result<()> {
    loop {
        terminal.draw(|frame| app.render(frame))?;

        // Timeout falls through to a redraw so background refreshes show up.
        if !event::poll(TICK)? {
            continue;
        }
        if let Event::Key(key) = event::read()? {
            if key.kind != KeyEventKind::Press {
                continue;
            }
            // Ctrl+C always quits
            if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
                break;
            }
            // q quits unless we're typing or showing a new secret
            if key.code == KeyCode::Char('q') && app.can_quit() {
                break;
            }
            app.handle_key(key);
        }
    }

    Ok(())
}
