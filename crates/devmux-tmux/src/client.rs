//! Typed wrappers over the tmux commands devmux issues.
//!
//! Every method maps to exactly one tmux invocation so callers (and tests)
//! can reason about the command stream.

use crate::error::TmuxError;
use crate::executor::TmuxCommandRunner;
use crate::pane_info::{PaneInfo, SessionInfo, exact_session, list_panes, list_sessions};

/// Thin typed client over a [`TmuxCommandRunner`].
pub struct TmuxClient<R> {
    runner: R,
}

impl<R: TmuxCommandRunner> TmuxClient<R> {
    pub fn new(runner: R) -> Self {
        Self { runner }
    }

    pub fn runner(&self) -> &R {
        &self.runner
    }

    pub fn has_session(&self, session: &str) -> bool {
        self.runner
            .run(&["has-session", "-t", &exact_session(session)])
            .is_ok()
    }

    pub fn new_session(&self, session: &str, dir: &str) -> Result<(), TmuxError> {
        self.runner
            .run(&["new-session", "-d", "-s", session, "-c", dir])
            .map(drop)
    }

    /// Split the session's current window. `horizontal` places the new pane
    /// to the right; `percent` sizes the new pane.
    pub fn split_window(
        &self,
        session: &str,
        dir: &str,
        horizontal: bool,
        percent: Option<u8>,
    ) -> Result<(), TmuxError> {
        let target = window_target(session);
        let pct = percent.map(|p| p.to_string());
        let mut args = vec!["split-window"];
        if horizontal {
            args.push("-h");
        }
        args.extend(["-t", target.as_str(), "-c", dir]);
        if let Some(ref pct) = pct {
            args.extend(["-p", pct.as_str()]);
        }
        self.runner.run(&args).map(drop)
    }

    pub fn set_main_pane_width(&self, session: &str, percent: u8) -> Result<(), TmuxError> {
        let width = format!("{percent}%");
        self.runner
            .run(&[
                "set-option",
                "-w",
                "-t",
                &window_target(session),
                "main-pane-width",
                &width,
            ])
            .map(drop)
    }

    pub fn select_layout(&self, session: &str, layout: &str) -> Result<(), TmuxError> {
        self.runner
            .run(&["select-layout", "-t", &window_target(session), layout])
            .map(drop)
    }

    /// Turn on outer-terminal title updates and set the title format.
    pub fn set_titles(&self, session: &str, format: &str) -> Result<(), TmuxError> {
        let target = exact_session(session);
        self.runner
            .run(&["set-option", "-t", &target, "set-titles", "on"])?;
        self.runner
            .run(&["set-option", "-t", &target, "set-titles-string", format])
            .map(drop)
    }

    pub fn rename_window(&self, session: &str, name: &str) -> Result<(), TmuxError> {
        self.runner
            .run(&["rename-window", "-t", &window_target(session), name])
            .map(drop)
    }

    /// Set a pane's title (its label).
    pub fn set_pane_title(&self, pane_id: &str, title: &str) -> Result<(), TmuxError> {
        self.runner
            .run(&["select-pane", "-t", pane_id, "-T", title])
            .map(drop)
    }

    pub fn select_pane(&self, pane_id: &str) -> Result<(), TmuxError> {
        self.runner.run(&["select-pane", "-t", pane_id]).map(drop)
    }

    /// Type `text` literally into a pane, pressing Enter when `execute`.
    pub fn send_text(&self, pane_id: &str, text: &str, execute: bool) -> Result<(), TmuxError> {
        self.runner
            .run(&["send-keys", "-t", pane_id, "-l", text])?;
        if execute {
            self.runner.run(&["send-keys", "-t", pane_id, "Enter"])?;
        }
        Ok(())
    }

    /// Send Ctrl-C to the pane's foreground process.
    pub fn send_interrupt(&self, pane_id: &str) -> Result<(), TmuxError> {
        self.runner.run(&["send-keys", "-t", pane_id, "C-c"]).map(drop)
    }

    /// Pane ids of the session, in tmux order.
    pub fn pane_ids(&self, session: &str) -> Result<Vec<String>, TmuxError> {
        let out = self.runner.run(&[
            "list-panes",
            "-t",
            &window_target(session),
            "-F",
            "#{pane_id}",
        ])?;
        Ok(out
            .lines()
            .map(str::trim)
            .filter(|l| !l.is_empty())
            .map(String::from)
            .collect())
    }

    pub fn panes(&self, session: &str) -> Result<Vec<PaneInfo>, TmuxError> {
        list_panes(&self.runner, session)
    }

    /// Foreground command of a pane (`#{pane_current_command}`).
    pub fn pane_current_command(&self, pane_id: &str) -> Option<String> {
        self.display(pane_id, "#{pane_current_command}")
            .filter(|s| !s.is_empty())
    }

    /// PID of the pane's root process (`#{pane_pid}`).
    pub fn pane_pid(&self, pane_id: &str) -> Option<u32> {
        self.display(pane_id, "#{pane_pid}")
            .and_then(|s| s.parse().ok())
    }

    fn display(&self, pane_id: &str, format: &str) -> Option<String> {
        match self
            .runner
            .run(&["display-message", "-p", "-t", pane_id, format])
        {
            Ok(out) => Some(out.trim().to_string()),
            Err(e) => {
                tracing::debug!("display-message {format} for {pane_id} failed: {e}");
                None
            }
        }
    }

    pub fn kill_session(&self, session: &str) -> Result<(), TmuxError> {
        self.runner
            .run(&["kill-session", "-t", &exact_session(session)])
            .map(drop)
    }

    pub fn detach_all(&self, session: &str) -> Result<(), TmuxError> {
        self.runner
            .run(&["detach-client", "-s", &exact_session(session)])
            .map(drop)
    }

    pub fn sessions(&self) -> Result<Vec<SessionInfo>, TmuxError> {
        list_sessions(&self.runner)
    }

    /// Attach the current terminal, or switch the current client when
    /// already running inside tmux.
    pub fn attach(&self, session: &str, inside_tmux: bool) -> Result<(), TmuxError> {
        let target = exact_session(session);
        if inside_tmux {
            self.runner
                .run_interactive(&["switch-client", "-t", &target])
        } else {
            self.runner
                .run_interactive(&["attach-session", "-t", &target])
        }
    }
}

/// Target the session's current window. The trailing colon stops tmux from
/// reading the name as a window name.
pub fn window_target(session: &str) -> String {
    format!("={session}:")
}

/// Whether this process runs inside a tmux client.
pub fn inside_tmux() -> bool {
    std::env::var_os("TMUX").is_some_and(|v| !v.is_empty())
}
