use clap::{Parser, ValueEnum};
use crossterm::event::{self, DisableMouseCapture, EnableMouseCapture, Event as CEvent};
use crossterm::execute;
use crossterm::terminal::{
    disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen,
};
use ratatui::backend::CrosstermBackend;
use ratatui::Terminal;
use std::io;
use std::path::PathBuf;
use std::time::Duration;

use color_eyre::Result;
use engagetui::action::Action;
use engagetui::components::{Component, Dashboard};
use engagetui::config::{Config, Mode};
use engagetui::filter::users::{UserFilterState, UserFilterStore};
use engagetui::resources::WorkspaceSnapshot;
use engagetui::tui::Event as TuiEvent;
use tracing::{debug, error, info};

/// Keyboard-first dashboard over a customer-engagement workspace snapshot
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Enable file logging at the given level (overrides RUST_LOG)
    #[arg(long = "logging", value_enum)]
    logging: Option<LogLevel>,
    /// Path to a config file (overrides default config discovery)
    #[arg(long = "config", value_name = "PATH")]
    config: Option<PathBuf>,
    /// Path to a workspace snapshot JSON; demo fixtures are used when omitted
    #[arg(long = "snapshot", value_name = "PATH")]
    snapshot: Option<PathBuf>,
    /// Segment ids pinned into the users view (not user-removable)
    #[arg(long = "static-segment", value_name = "ID")]
    static_segments: Vec<String>,
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, ValueEnum)]
enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

fn main() -> Result<()> {
    let args = Args::parse();
    let cwd = std::env::current_dir()?;
    let log_path = cwd.join("engagetui.log");
    let level = match args.logging {
        Some(LogLevel::Error) => Some(tracing::Level::ERROR),
        Some(LogLevel::Warn) => Some(tracing::Level::WARN),
        Some(LogLevel::Info) => Some(tracing::Level::INFO),
        Some(LogLevel::Debug) => Some(tracing::Level::DEBUG),
        Some(LogLevel::Trace) => Some(tracing::Level::TRACE),
        None => Some(tracing::Level::WARN),
    };
    engagetui::logging::init_with(Some(log_path), level)?;

    let snapshot = match &args.snapshot {
        Some(path) => WorkspaceSnapshot::load(path)?,
        None => {
            info!("No snapshot supplied; using demo fixtures");
            WorkspaceSnapshot::demo()
        }
    };

    let mut dashboard = Dashboard::new(snapshot);
    if !args.static_segments.is_empty() {
        dashboard = dashboard.with_users_store(UserFilterStore::new(
            UserFilterState::new().with_static_segments(args.static_segments.clone()),
        ));
    }
    let config = match Config::from_path(args.config.as_ref()) {
        Ok(cfg) => cfg,
        Err(e) => {
            error!("Failed to load config, falling back to defaults: {e}");
            Config::default()
        }
    };
    dashboard.register_config_handler(config.clone())?;

    // Set up terminal
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let res = run_app(&mut terminal, &mut dashboard, &config);

    // Restore terminal
    disable_raw_mode()?;
    execute!(io::stdout(), LeaveAlternateScreen, DisableMouseCapture)?;
    if let Err(e) = res {
        error!("Error: {e}");
    }
    Ok(())
}

fn run_app<B: ratatui::backend::Backend>(
    terminal: &mut Terminal<B>,
    dashboard: &mut Dashboard,
    config: &Config,
) -> anyhow::Result<()> {
    loop {
        terminal.draw(|f| {
            let size = f.area();
            if let Err(e) = dashboard.draw(f, size) {
                error!("Draw error: {e}");
            }
        })?;

        if event::poll(Duration::from_millis(100))? {
            if let CEvent::Key(key_event) = event::read()? {
                // Global bindings apply everywhere except inside a popover,
                // where typed characters must reach the input line
                if !dashboard.popover_open() {
                    if let Some(global_action) = config.action_for_key(Mode::Global, key_event) {
                        debug!("Global action: {global_action}");
                        match global_action {
                            Action::Quit | Action::Suspend => break,
                            Action::ClearScreen => {
                                terminal.clear()?;
                                continue;
                            }
                            _ => {}
                        }
                    }
                }

                match dashboard.handle_events(Some(TuiEvent::Key(key_event))) {
                    Ok(Some(action)) => match action {
                        Action::Quit | Action::Suspend => break,
                        other => {
                            if let Err(e) = dashboard.update(other) {
                                error!("Error updating after action: {e}");
                            }
                        }
                    },
                    Ok(None) => {}
                    Err(e) => error!("Error handling TuiEvent: {e}"),
                }
            }
        }

        if let Ok(Some(a)) = dashboard.update(Action::Tick) {
            if matches!(a, Action::Quit | Action::Suspend) {
                break;
            }
        }
    }
    Ok(())
}
