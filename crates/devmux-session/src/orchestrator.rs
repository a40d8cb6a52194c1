//! SessionOrchestrator: create, reattach, reconcile and restart sessions.
//!
//! Every call reads the project configuration it is handed and rebuilds the
//! session view from tmux; nothing is cached between calls. There is no
//! locking against concurrent callers: each operation is written so that
//! running it again converges on the same state.

use devmux_core::poll::{PollPolicy, Sleeper};
use devmux_core::{LayoutPlan, MAIN_VERTICAL, NamingScheme, PaneSpec, ProjectConfig, title_format};
use devmux_tmux::{ProcessControl, TmuxClient, TmuxCommandRunner, is_idle_shell};

use crate::error::SessionError;
use crate::report::{
    AttachOutcome, ReconcileMode, RestartReport, SessionHandle, SyncReport,
};

/// Timing for the interrupt → kill escalation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RestartPolicy {
    /// How long to wait for Ctrl-C to return the pane to a shell.
    pub after_interrupt: PollPolicy,
    /// How long to wait after killing the pane's children.
    pub after_kill: PollPolicy,
}

impl Default for RestartPolicy {
    fn default() -> Self {
        use std::time::Duration;
        Self {
            after_interrupt: PollPolicy::new(Duration::from_millis(100), Duration::from_millis(1_500)),
            after_kill: PollPolicy::new(Duration::from_millis(100), Duration::from_millis(1_000)),
        }
    }
}

pub struct SessionOrchestrator<R, P, S> {
    tmux: TmuxClient<R>,
    processes: P,
    sleeper: S,
    scheme: NamingScheme,
    policy: RestartPolicy,
}

impl<R, P, S> SessionOrchestrator<R, P, S>
where
    R: TmuxCommandRunner,
    P: ProcessControl,
    S: Sleeper,
{
    pub fn new(runner: R, processes: P, sleeper: S, scheme: NamingScheme) -> Self {
        Self {
            tmux: TmuxClient::new(runner),
            processes,
            sleeper,
            scheme,
            policy: RestartPolicy::default(),
        }
    }

    #[must_use]
    pub fn with_restart_policy(mut self, policy: RestartPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn tmux(&self) -> &TmuxClient<R> {
        &self.tmux
    }

    pub fn session_name(&self, config: &ProjectConfig) -> String {
        devmux_core::session_name(&config.path, self.scheme)
    }

    pub fn exists(&self, session: &str) -> bool {
        self.tmux.has_session(session)
    }

    // ─── create ──────────────────────────────────────────────────

    /// Create the session for `config` with its full layout, labels and
    /// commands, and tag its window title.
    pub fn create(&self, config: &ProjectConfig) -> Result<SessionHandle, SessionError> {
        let name = self.session_name(config);
        let dir = config.path.to_string_lossy();
        tracing::info!("creating session {name} in {dir}");

        self.tmux.new_session(&name, &dir)?;
        let plan = LayoutPlan::for_panes(&config.panes);
        self.grow_layout(&name, &dir, 1, plan)?;

        // Positional addressing is unreliable under custom base-index settings;
        // always address panes by the ids tmux reports.
        let pane_ids = self.tmux.pane_ids(&name)?;
        for (spec, pane_id) in config.panes.iter().zip(&pane_ids) {
            self.label(pane_id, spec);
            if let Some(cmd) = &spec.cmd {
                self.tmux.send_text(pane_id, cmd, true)?;
            }
        }

        self.finish_window(&name, config, &pane_ids);
        Ok(SessionHandle { name, pane_ids })
    }

    /// Split from `live` panes up to the plan's pane count and apply its layout.
    /// Returns whether a layout was (re)applied.
    fn grow_layout(
        &self,
        name: &str,
        dir: &str,
        live: usize,
        plan: LayoutPlan,
    ) -> Result<bool, SessionError> {
        match plan {
            LayoutPlan::Single => Ok(false),
            LayoutPlan::SideBySide { .. } => {
                if live >= 2 {
                    return Ok(false);
                }
                self.tmux
                    .split_window(name, dir, true, plan.secondary_pct())?;
                Ok(true)
            }
            LayoutPlan::MainVertical { main_pct, .. } => {
                for _ in live..plan.pane_count() {
                    self.tmux.split_window(name, dir, false, None)?;
                }
                if let Err(e) = self.tmux.set_main_pane_width(name, main_pct) {
                    tracing::debug!("main-pane-width not applied: {e}");
                }
                self.tmux.select_layout(name, MAIN_VERTICAL)?;
                Ok(true)
            }
        }
    }

    fn finish_window(&self, name: &str, config: &ProjectConfig, pane_ids: &[String]) {
        if let Err(e) = self.tmux.set_titles(name, &title_format(name)) {
            tracing::warn!("could not tag window title for {name}: {e}");
        }
        if let Err(e) = self.tmux.rename_window(name, &config.base_name()) {
            tracing::debug!("rename-window failed: {e}");
        }
        if let Some(first) = pane_ids.first() {
            if let Err(e) = self.tmux.select_pane(first) {
                tracing::debug!("select-pane {first} failed: {e}");
            }
        }
    }

    fn label(&self, pane_id: &str, spec: &PaneSpec) {
        if spec.name.is_empty() {
            return;
        }
        if let Err(e) = self.tmux.set_pane_title(pane_id, &spec.name) {
            tracing::debug!("labelling {pane_id} failed: {e}");
        }
    }

    // ─── attach ──────────────────────────────────────────────────

    /// Reattach to the project's session, creating it if needed.
    ///
    /// When the session exists, idle panes are refilled according to the
    /// declaration's `ensure`/`prefill` flags before attaching.
    pub fn attach_or_create(
        &self,
        config: &ProjectConfig,
        inside_tmux: bool,
    ) -> Result<AttachOutcome, SessionError> {
        let outcome = self.prepare_attach(config)?;
        let name = match &outcome {
            AttachOutcome::Created(handle) => handle.name.as_str(),
            AttachOutcome::Reattached { name, .. } => name.as_str(),
        };
        self.tmux.attach(name, inside_tmux)?;
        Ok(outcome)
    }

    /// Everything `attach_or_create` does short of attaching the terminal.
    pub fn prepare_attach(&self, config: &ProjectConfig) -> Result<AttachOutcome, SessionError> {
        let name = self.session_name(config);
        if !self.tmux.has_session(&name) {
            return self.create(config).map(AttachOutcome::Created);
        }

        let mode = ReconcileMode::from_flags(config.ensure, config.prefill);
        let refilled = match mode {
            Some(mode) => self.refill_idle(&name, config, mode)?,
            None => Vec::new(),
        };
        Ok(AttachOutcome::Reattached {
            name,
            refilled,
            mode: mode.map(|m| match m {
                ReconcileMode::Ensure => "ensure",
                ReconcileMode::Prefill => "prefill",
            }),
        })
    }

    fn refill_idle(
        &self,
        name: &str,
        config: &ProjectConfig,
        mode: ReconcileMode,
    ) -> Result<Vec<String>, SessionError> {
        let panes = self.tmux.panes(name)?;
        let mut refilled = Vec::new();
        for (spec, pane) in config.panes.iter().zip(&panes) {
            let Some(cmd) = &spec.cmd else { continue };
            if !is_idle_shell(&pane.current_cmd) {
                continue;
            }
            self.tmux
                .send_text(&pane.pane_id, cmd, mode == ReconcileMode::Ensure)?;
            refilled.push(pane.pane_id.clone());
        }
        if !refilled.is_empty() {
            tracing::info!("{mode:?}: refilled {} idle pane(s) in {name}", refilled.len());
        }
        Ok(refilled)
    }

    // ─── sync ────────────────────────────────────────────────────

    /// Reconcile the live session with the declaration.
    ///
    /// Adds missing panes, reapplies the layout when panes were added,
    /// restores labels, and submits commands only to panes sitting at an idle
    /// shell. Busy panes are never touched, so repeated calls converge.
    pub fn sync(&self, config: &ProjectConfig) -> Result<SyncReport, SessionError> {
        let name = self.session_name(config);
        if !self.tmux.has_session(&name) {
            let handle = self.create(config)?;
            return Ok(SyncReport {
                session: handle.name,
                created_session: true,
                panes_added: config.panes.len().saturating_sub(1),
                layout_reapplied: config.panes.len() > 1,
                submitted: config
                    .panes
                    .iter()
                    .zip(&handle.pane_ids)
                    .filter(|(spec, _)| spec.cmd.is_some())
                    .map(|(_, id)| id.clone())
                    .collect(),
                ..SyncReport::default()
            });
        }

        let mut report = SyncReport {
            session: name.clone(),
            ..SyncReport::default()
        };
        let dir = config.path.to_string_lossy();
        let declared = config.panes.len();

        let live = self.tmux.pane_ids(&name)?.len();
        if live < declared {
            let plan = LayoutPlan::for_panes(&config.panes);
            report.panes_added = declared - live;
            tracing::info!("{name}: adding {} missing pane(s)", report.panes_added);
            report.layout_reapplied = self.grow_layout(&name, &dir, live, plan)?;
        }

        let panes = self.tmux.panes(&name)?;
        report.extra_panes = panes.len().saturating_sub(declared);
        for (spec, pane) in config.panes.iter().zip(&panes) {
            if !spec.name.is_empty() && pane.title != spec.name {
                self.label(&pane.pane_id, spec);
                report.relabelled.push(pane.pane_id.clone());
            }

            let Some(cmd) = &spec.cmd else { continue };
            if is_idle_shell(&pane.current_cmd) {
                self.tmux.send_text(&pane.pane_id, cmd, true)?;
                report.submitted.push(pane.pane_id.clone());
            } else {
                tracing::debug!(
                    "{}: {} busy running {:?}, not touching",
                    name,
                    pane.pane_id,
                    pane.current_cmd
                );
                report.busy.push(pane.pane_id.clone());
            }
        }
        Ok(report)
    }

    // ─── restart ─────────────────────────────────────────────────

    /// Restart one declared pane: interrupt, escalate to killing its
    /// children if it stays busy, then resubmit its command.
    ///
    /// `target` is a pane name (case-insensitive) or a 0-based index;
    /// `None` means the first pane. An unknown target is reported with the
    /// list of valid ones and has no side effect.
    pub fn restart_pane(
        &self,
        config: &ProjectConfig,
        target: Option<&str>,
    ) -> Result<RestartReport, SessionError> {
        let (index, spec) = resolve_target(&config.panes, target)?;
        let name = self.session_name(config);
        if !self.tmux.has_session(&name) {
            return Err(SessionError::SessionNotFound(name));
        }
        let pane_ids = self.tmux.pane_ids(&name)?;
        let Some(pane_id) = pane_ids.get(index).cloned() else {
            return Err(SessionError::PaneNotLive {
                session: name,
                index,
                label: spec.name.clone(),
            });
        };

        let mut report = RestartReport {
            session: name,
            pane_id: pane_id.clone(),
            label: spec.name.clone(),
            was_running: false,
            interrupted: false,
            escalated: false,
            killed: Vec::new(),
            escalation_ineffective: false,
            resubmitted: None,
        };

        let pane_pid = self.tmux.pane_pid(&pane_id);
        let is_idle = || {
            self.tmux
                .pane_current_command(&pane_id)
                .is_some_and(|c| is_idle_shell(&c))
        };

        report.was_running = !is_idle();
        if report.was_running {
            // Running → Settling₁
            self.tmux.send_interrupt(&pane_id)?;
            report.interrupted = true;
            let settled = self
                .policy
                .after_interrupt
                .wait_until(&self.sleeper, is_idle);

            if !settled {
                // Settling₁ → Settling₂ via force kill
                report.escalated = true;
                match pane_pid {
                    Some(pid) => {
                        for child in self.processes.children(pid) {
                            if self.processes.force_kill(child) {
                                report.killed.push(child);
                            }
                        }
                    }
                    None => tracing::warn!("{pane_id}: pane pid unknown, cannot escalate"),
                }
                tracing::info!("{pane_id}: interrupt ignored, killed {:?}", report.killed);
                report.escalation_ineffective =
                    !self.policy.after_kill.wait_until(&self.sleeper, is_idle);
            }
        }

        // → Starting. Runs whatever the escalation achieved.
        match &spec.cmd {
            Some(cmd) => {
                self.tmux.send_text(&pane_id, cmd, true)?;
                report.resubmitted = Some(cmd.clone());
            }
            None => tracing::info!("{pane_id}: no command declared, left at the shell"),
        }
        Ok(report)
    }

    // ─── misc ────────────────────────────────────────────────────

    pub fn kill(&self, session: &str) -> Result<(), SessionError> {
        if !self.tmux.has_session(session) {
            return Err(SessionError::SessionNotFound(session.to_string()));
        }
        self.tmux.kill_session(session)?;
        Ok(())
    }

    pub fn detach_all(&self, session: &str) -> Result<(), SessionError> {
        if !self.tmux.has_session(session) {
            return Err(SessionError::SessionNotFound(session.to_string()));
        }
        self.tmux.detach_all(session)?;
        Ok(())
    }

    pub fn list(&self) -> Result<Vec<devmux_tmux::SessionInfo>, SessionError> {
        Ok(self.tmux.sessions()?)
    }
}

/// Resolve a restart target to a declared pane.
pub fn resolve_target<'a>(
    panes: &'a [PaneSpec],
    target: Option<&str>,
) -> Result<(usize, &'a PaneSpec), SessionError> {
    let invalid = |target: &str| SessionError::TargetResolution {
        target: target.to_string(),
        valid: valid_targets(panes),
    };

    let Some(target) = target.map(str::trim).filter(|t| !t.is_empty()) else {
        return panes.first().map(|p| (0, p)).ok_or_else(|| invalid(""));
    };

    if let Some(found) = panes
        .iter()
        .enumerate()
        .find(|(_, p)| !p.name.is_empty() && p.name.eq_ignore_ascii_case(target))
    {
        return Ok(found);
    }
    target
        .parse::<usize>()
        .ok()
        .and_then(|i| panes.get(i).map(|p| (i, p)))
        .ok_or_else(|| invalid(target))
}

/// `0:claude`, `1:server`, `2` … for error messages and help output.
pub fn valid_targets(panes: &[PaneSpec]) -> Vec<String> {
    panes
        .iter()
        .enumerate()
        .map(|(i, p)| {
            if p.name.is_empty() {
                i.to_string()
            } else {
                format!("{i}:{}", p.name)
            }
        })
        .collect()
}
