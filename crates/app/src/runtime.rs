//! Composition of the dashboard with the terminal and background workers.
//!
//! A single control loop owns the [`TuiModel`]. Key presses arrive from an
//! input thread, resolution results from the refresh service, and timers
//! drive the spinner and optional auto refresh. Everything is funnelled
//! through [`TuiUpdate`], whose returned commands are executed here.

use crate::adapters::browser;
use crate::services::refresh_service::RefreshService;
use crate::tui::{TuiModel, TuiUpdate, TuiView};
use anyhow::Result;
use crossterm::{
    event::{self, Event as TermEvent, KeyEventKind},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{backend::CrosstermBackend, Terminal};
use std::io;
use std::sync::Arc;
use std::time::Duration;
use tagwatch_core::app::{Command, Dashboard};
use tagwatch_core::domain::Event;
use tagwatch_core::ports::Clock;
use tagwatch_core::StatusResolver;
use tokio::sync::mpsc;
use tokio::time::{interval, interval_at, Instant, Interval, MissedTickBehavior};
use tracing::{debug, error, info};

/// Spinner animation rate
const TICK_RATE: Duration = Duration::from_millis(100);

type Term = Terminal<CrosstermBackend<io::Stdout>>;

pub struct TagwatchApp {
    model: TuiModel,
    refresh: RefreshService,
    event_rx: mpsc::UnboundedReceiver<Event>,
    auto_refresh: Option<Duration>,
}

impl TagwatchApp {
    pub fn new(
        dashboard: Dashboard,
        resolver: Arc<StatusResolver>,
        clock: Arc<dyn Clock>,
        authenticated: bool,
    ) -> Self {
        let config = dashboard.registry().config();
        let web_url = config.remote.web_url.clone();
        let auto_refresh = match config.ui.auto_refresh_secs {
            0 => None,
            secs => Some(Duration::from_secs(secs)),
        };

        let (event_tx, event_rx) = mpsc::unbounded_channel();
        let refresh = RefreshService::new(resolver, clock, event_tx);

        Self {
            model: TuiModel::new(dashboard, authenticated, web_url),
            refresh,
            event_rx,
            auto_refresh,
        }
    }

    /// Take over the terminal and run until the user quits. The terminal is
    /// restored even when the loop fails.
    pub async fn run(self) -> Result<()> {
        info!("Starting dashboard");
        let mut terminal = setup_terminal()?;

        let result = self.run_loop(&mut terminal).await;

        if let Err(e) = restore_terminal(&mut terminal) {
            error!("Failed to restore terminal: {}", e);
        }
        result
    }

    async fn run_loop(self, terminal: &mut Term) -> Result<()> {
        let TagwatchApp {
            mut model,
            refresh,
            mut event_rx,
            auto_refresh,
        } = self;

        let mut input_rx = spawn_input_reader();
        let mut ticker = interval(TICK_RATE);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
        let mut auto_timer = auto_refresh.map(|period| {
            info!("Auto refresh every {}s", period.as_secs());
            let mut timer = interval_at(Instant::now() + period, period);
            timer.set_missed_tick_behavior(MissedTickBehavior::Delay);
            timer
        });

        let commands = model.dashboard.start();
        execute_commands(&mut model, &refresh, commands);

        while !model.should_quit {
            terminal.draw(|frame| TuiView::render(&model, frame))?;

            let commands = tokio::select! {
                Some(input) = input_rx.recv() => match input {
                    TermEvent::Key(key) if key.kind == KeyEventKind::Press => {
                        TuiUpdate::handle_key(&mut model, key.code, key.modifiers)
                    }
                    _ => Vec::new(),
                },
                Some(event) = event_rx.recv() => TuiUpdate::handle_event(&mut model, event),
                _ = ticker.tick() => {
                    model.tick();
                    Vec::new()
                }
                _ = next_auto_refresh(&mut auto_timer) => {
                    debug!("Auto refresh due");
                    TuiUpdate::handle_event(&mut model, Event::AutoRefreshDue)
                }
            };

            execute_commands(&mut model, &refresh, commands);
        }

        info!("Quit requested, leaving dashboard");
        Ok(())
    }
}

/// Carry out the side effects requested by the state machine
pub fn execute_commands(model: &mut TuiModel, refresh: &RefreshService, commands: Vec<Command>) {
    for command in commands {
        match command {
            Command::Resolve { ticket, target } => {
                debug!("Resolving {} ({})", target, ticket);
                refresh.spawn(ticket, target);
            }
            Command::OpenInBrowser { url } => browser::open_url(&url),
            Command::Quit => model.should_quit = true,
        }
    }
}

async fn next_auto_refresh(timer: &mut Option<Interval>) {
    match timer {
        Some(timer) => {
            timer.tick().await;
        }
        None => std::future::pending().await,
    }
}

/// Forward terminal events from a blocking reader thread. The thread ends
/// once the receiver is gone or the terminal stops producing events.
fn spawn_input_reader() -> mpsc::UnboundedReceiver<TermEvent> {
    let (tx, rx) = mpsc::unbounded_channel();
    std::thread::spawn(move || loop {
        match event::read() {
            Ok(ev) => {
                if tx.send(ev).is_err() {
                    break;
                }
            }
            Err(e) => {
                error!("Terminal input failed: {}", e);
                break;
            }
        }
    });
    rx
}

fn setup_terminal() -> Result<Term> {
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    Ok(Terminal::new(backend)?)
}

fn restore_terminal(terminal: &mut Term) -> Result<()> {
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use tagwatch_core::app::Registry;
    use tagwatch_core::domain::{RepoEntry, RepoRef, StatusState};
    use tagwatch_core::ports::{
        AppConfig, Comparison, ConfigStore, FixedClock, GitRefInfo, ReleaseInfo, RemoteApi,
        RepositoryInfo, TagInfo, TagObjectInfo,
    };
    use tagwatch_core::{ApiError, ApiResult};

    struct NullStore;

    impl ConfigStore for NullStore {
        fn load(&self) -> tagwatch_core::Result<AppConfig> {
            Ok(AppConfig::default())
        }
        fn save(&self, _: &AppConfig) -> tagwatch_core::Result<()> {
            Ok(())
        }
    }

    /// Every lookup fails as not found
    struct MissingApi;

    impl RemoteApi for MissingApi {
        fn repository(&self, _: &RepoRef) -> ApiResult<RepositoryInfo> {
            Err(ApiError::NotFound)
        }
        fn latest_release(&self, _: &RepoRef) -> ApiResult<ReleaseInfo> {
            Err(ApiError::NotFound)
        }
        fn tags(&self, _: &RepoRef, _: u32) -> ApiResult<Vec<TagInfo>> {
            Err(ApiError::NotFound)
        }
        fn tag_ref(&self, _: &RepoRef, _: &str) -> ApiResult<GitRefInfo> {
            Err(ApiError::NotFound)
        }
        fn tag_object(&self, _: &RepoRef, _: &str) -> ApiResult<TagObjectInfo> {
            Err(ApiError::NotFound)
        }
        fn compare(&self, _: &RepoRef, _: &str, _: &str) -> ApiResult<Comparison> {
            Err(ApiError::NotFound)
        }
    }

    fn app(auto_refresh_secs: u64) -> TagwatchApp {
        let mut config = AppConfig::default();
        config.repos.push(RepoEntry::new(RepoRef::new("acme", "gone"), ""));
        config.ui.auto_refresh_secs = auto_refresh_secs;
        let dashboard = Dashboard::new(Registry::new(config, Arc::new(NullStore)));
        let clock: Arc<dyn Clock> = Arc::new(FixedClock(Utc::now()));
        let resolver = Arc::new(StatusResolver::new(Arc::new(MissingApi), clock.clone()));
        TagwatchApp::new(dashboard, resolver, clock, false)
    }

    #[test]
    fn test_new_reads_ui_settings() {
        assert_eq!(app(0).auto_refresh, None);
        assert_eq!(app(300).auto_refresh, Some(Duration::from_secs(300)));
        assert_eq!(app(0).model.web_url, "https://github.com");
        assert!(!app(0).model.authenticated);
    }

    #[tokio::test]
    async fn test_execute_quit() {
        let TagwatchApp {
            mut model, refresh, ..
        } = app(0);
        execute_commands(&mut model, &refresh, vec![Command::Quit]);
        assert!(model.should_quit);
    }

    #[tokio::test]
    async fn test_resolve_round_trip_through_loop_pieces() {
        let TagwatchApp {
            mut model,
            refresh,
            mut event_rx,
            ..
        } = app(0);

        let commands = model.dashboard.start();
        execute_commands(&mut model, &refresh, commands);
        let key = model.dashboard.entries()[0].key();
        assert!(model.dashboard.is_loading(&key));

        let event = event_rx.recv().await.expect("resolution event");
        let follow_up = TuiUpdate::handle_event(&mut model, event);
        assert!(follow_up.is_empty());
        assert!(!model.dashboard.is_loading(&key));
        assert_eq!(model.dashboard.state(&key), Some(StatusState::Error));
        assert_eq!(
            model.dashboard.status(&key).map(|s| s.error_message.as_str()),
            Some("not found")
        );
    }
}
