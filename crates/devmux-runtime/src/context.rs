//! Process-wide state for one CLI invocation, plus display helpers.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use chrono::TimeZone;
use devmux_core::{ProjectConfig, Settings, ThreadSleeper, load_project, session_name};
use devmux_session::{PollPolicy, RestartPolicy, SessionError, SessionOrchestrator};
use devmux_tmux::{SystemProcesses, TmuxExecutor};
use devmux_window::{
    Backends, HighlightTiming, Highlighter, NavigationEngine, OverlaySurface, SystemBridge,
    TerminalApp, WindowTiler, system_backends, terminal_app,
};

use crate::cli::Cli;

pub type Orchestrator<'a> = SessionOrchestrator<&'a TmuxExecutor, SystemProcesses, ThreadSleeper>;

/// Everything a subcommand may need, built once from flags and settings.
pub struct AppContext {
    pub settings: Settings,
    pub project_dir: PathBuf,
    pub json: bool,
    /// Flags a relaunched devmux needs to reach the same server and config.
    pub relaunch_flags: Vec<String>,
    tmux: TmuxExecutor,
    terminal: Box<dyn TerminalApp>,
    backends: Backends,
    highlighter: Highlighter,
}

impl AppContext {
    pub fn from_cli(cli: &Cli, surface: Arc<dyn OverlaySurface>) -> anyhow::Result<Arc<Self>> {
        let settings = Settings::load_or_default(cli.config.as_deref());
        tracing::debug!("settings: {settings:?}");

        let project_dir = match &cli.dir {
            Some(dir) => dir.clone(),
            None => std::env::current_dir()?,
        };

        let mut tmux = TmuxExecutor::new(settings.tmux_bin.clone());
        if let Some(socket) = &cli.tmux_socket {
            tmux = tmux.with_socket_path(socket.clone());
        }

        let highlighter = Highlighter::new(
            surface,
            HighlightTiming::with_hold(settings.highlight_hold()),
            tokio::runtime::Handle::current(),
        );

        Ok(Arc::new(Self {
            terminal: terminal_app(settings.terminal, SystemBridge, tmux.command_prefix()),
            backends: system_backends(),
            settings,
            project_dir,
            json: cli.json,
            relaunch_flags: relaunch_flags(cli),
            tmux,
            highlighter,
        }))
    }

    /// Fails with [`SessionError::ToolMissing`] when tmux cannot be run.
    pub fn require_tmux(&self) -> Result<(), SessionError> {
        self.tmux.ensure_installed().map_err(SessionError::from)
    }

    pub fn orchestrator(&self) -> Orchestrator<'_> {
        SessionOrchestrator::new(
            &self.tmux,
            SystemProcesses,
            ThreadSleeper,
            self.settings.naming_scheme,
        )
        .with_restart_policy(restart_policy(&self.settings))
    }

    pub fn project(&self) -> ProjectConfig {
        self.project_at(&self.project_dir)
    }

    pub fn project_at(&self, dir: &Path) -> ProjectConfig {
        load_project(dir)
    }

    pub fn session_for(&self, dir: &Path) -> String {
        session_name(dir, self.settings.naming_scheme)
    }

    /// `explicit`, or the session of the project directory.
    pub fn session_or_project(&self, explicit: Option<&str>) -> String {
        match explicit {
            Some(name) => name.to_string(),
            None => self.session_for(&self.project_dir),
        }
    }

    pub fn terminal(&self) -> &dyn TerminalApp {
        self.terminal.as_ref()
    }

    pub fn backends(&self) -> &Backends {
        &self.backends
    }

    pub fn highlighter(&self) -> &Highlighter {
        &self.highlighter
    }

    pub fn navigation(&self) -> NavigationEngine<'_, ThreadSleeper> {
        NavigationEngine::new(
            self.backends.compositor.as_ref(),
            self.backends.accessibility.as_ref(),
            self.terminal.as_ref(),
            &self.backends.spaces,
            ThreadSleeper,
        )
        .with_highlighter(&self.highlighter)
        .with_settle(self.settings.space_settle())
    }

    pub fn tiler(&self) -> WindowTiler<'_> {
        WindowTiler::new(
            self.terminal.as_ref(),
            &SystemBridge,
            self.backends.screen.as_ref(),
        )
    }
}

/// Run blocking orchestration or navigation work off the async runtime.
pub async fn blocking<T, F>(ctx: &Arc<AppContext>, f: F) -> anyhow::Result<T>
where
    T: Send + 'static,
    F: FnOnce(&AppContext) -> T + Send + 'static,
{
    let ctx = Arc::clone(ctx);
    Ok(tokio::task::spawn_blocking(move || f(&ctx)).await?)
}

fn relaunch_flags(cli: &Cli) -> Vec<String> {
    let mut flags = Vec::new();
    if let Some(socket) = &cli.tmux_socket {
        flags.push("--tmux-socket".to_string());
        flags.push(socket.clone());
    }
    if let Some(config) = &cli.config {
        flags.push("--config".to_string());
        flags.push(config.display().to_string());
    }
    flags
}

pub fn restart_policy(settings: &Settings) -> RestartPolicy {
    let interval = settings.poll_interval();
    RestartPolicy {
        after_interrupt: PollPolicy::new(interval, settings.interrupt_timeout()),
        after_kill: PollPolicy::new(interval, settings.kill_timeout()),
    }
}

// ─── Display helpers ─────────────────────────────────────────────

/// Collapse `$HOME` to `~`.
pub fn tilde_path(path: &Path) -> String {
    let shown = path.display().to_string();
    match std::env::var("HOME") {
        Ok(home) if !home.is_empty() && shown.starts_with(&home) => {
            format!("~{}", &shown[home.len()..])
        }
        _ => shown,
    }
}

/// Local creation time in tmux's `session_created_string` layout.
pub fn created_at(created: Option<i64>) -> String {
    created_in(created, &chrono::Local)
}

pub fn created_in<Tz>(created: Option<i64>, tz: &Tz) -> String
where
    Tz: TimeZone,
    Tz::Offset: std::fmt::Display,
{
    created
        .and_then(|ts| chrono::DateTime::from_timestamp(ts, 0))
        .map(|dt| dt.with_timezone(tz).format("%a %b %e %H:%M:%S %Y").to_string())
        .unwrap_or_default()
}
