//! Stateful in-memory tmux server and process table for orchestration tests.
//!
//! The fake models just enough of tmux for the orchestrator: sessions with
//! one window of panes, pane titles, a foreground command per pane that
//! changes when a typed line is submitted, and Ctrl-C / SIGKILL handling.

#![allow(dead_code)]

use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use devmux_core::{ConfigSource, PaneSpec, ProjectConfig};
use devmux_session::Sleeper;
use devmux_tmux::{ProcessControl, TmuxCommandRunner, TmuxError};

#[derive(Debug, Clone, Default)]
pub struct FakePane {
    pub id: String,
    pub pid: u32,
    pub cmd: String,
    pub title: String,
    /// Text typed with `send-keys -l` and not yet submitted.
    pub pending: String,
    /// Every line submitted with Enter.
    pub submitted: Vec<String>,
    pub interrupts: usize,
    pub children: Vec<u32>,
    /// Foreground process shrugs off Ctrl-C.
    pub ignores_interrupt: bool,
    /// Foreground process survives SIGKILL of its children.
    pub unkillable: bool,
}

#[derive(Debug, Clone, Default)]
pub struct FakeSession {
    pub name: String,
    pub dir: String,
    pub panes: Vec<FakePane>,
    pub layout: Option<String>,
    pub options: Vec<(String, String)>,
    pub window_name: String,
}

#[derive(Debug, Default)]
pub struct State {
    pub sessions: Vec<FakeSession>,
    pub calls: Vec<Vec<String>>,
    pub killed: Vec<u32>,
    pub attached: Vec<String>,
    next_pane: u32,
}

impl State {
    fn session_mut(&mut self, target: &str) -> Result<&mut FakeSession, TmuxError> {
        let name = target.trim_start_matches('=').trim_end_matches(':');
        self.sessions
            .iter_mut()
            .find(|s| s.name == name)
            .ok_or_else(|| TmuxError::CommandFailed(format!("can't find session: {name}")))
    }

    fn pane_mut(&mut self, pane_id: &str) -> Result<&mut FakePane, TmuxError> {
        self.sessions
            .iter_mut()
            .flat_map(|s| s.panes.iter_mut())
            .find(|p| p.id == pane_id)
            .ok_or_else(|| TmuxError::CommandFailed(format!("can't find pane: {pane_id}")))
    }

    fn new_pane(&mut self) -> FakePane {
        let n = self.next_pane;
        self.next_pane += 1;
        FakePane {
            id: format!("%{n}"),
            pid: 4000 + n,
            cmd: "zsh".to_string(),
            ..FakePane::default()
        }
    }
}

#[derive(Clone, Default)]
pub struct FakeTmux {
    state: Arc<Mutex<State>>,
}

impl FakeTmux {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> MutexGuard<'_, State> {
        self.state.lock().expect("fake tmux state")
    }

    pub fn session(&self, name: &str) -> FakeSession {
        self.state()
            .sessions
            .iter()
            .find(|s| s.name == name)
            .cloned()
            .unwrap_or_else(|| panic!("no fake session {name:?}"))
    }

    /// Count recorded calls whose first argument is `verb`.
    pub fn count(&self, verb: &str) -> usize {
        self.state()
            .calls
            .iter()
            .filter(|c| c.first().is_some_and(|v| v == verb))
            .count()
    }

    pub fn clear_calls(&self) {
        self.state().calls.clear();
    }

    pub fn total_submissions(&self) -> usize {
        self.state()
            .sessions
            .iter()
            .flat_map(|s| &s.panes)
            .map(|p| p.submitted.len())
            .sum()
    }

    /// Drop the pane at `index`, as if the user had closed it.
    pub fn close_pane(&self, session: &str, index: usize) {
        let mut st = self.state();
        let s = st.session_mut(session).expect("session");
        s.panes.remove(index);
    }

    /// Split a pane into the session behind the orchestrator's back.
    pub fn add_stray_pane(&self, session: &str) {
        let mut st = self.state();
        let pane = st.new_pane();
        st.session_mut(session).expect("session").panes.push(pane);
    }

    /// Put a long-running process in the foreground of a pane.
    pub fn run_in_pane(&self, pane_id: &str, cmd: &str) {
        let mut st = self.state();
        let p = st.pane_mut(pane_id).expect("pane");
        p.cmd = cmd.to_string();
        p.children = vec![p.pid + 10_000];
    }

    pub fn with_pane(&self, pane_id: &str, f: impl FnOnce(&mut FakePane)) {
        let mut st = self.state();
        f(st.pane_mut(pane_id).expect("pane"));
    }

    fn dispatch(&self, args: &[&str]) -> Result<String, TmuxError> {
        let mut st = self.state();
        st.calls.push(args.iter().map(|s| s.to_string()).collect());
        let flag = |name: &str| {
            args.iter()
                .position(|a| *a == name)
                .and_then(|i| args.get(i + 1))
                .copied()
        };

        match args.first().copied() {
            Some("has-session") => {
                st.session_mut(flag("-t").unwrap_or_default())?;
                Ok(String::new())
            }
            Some("new-session") => {
                let name = flag("-s").unwrap_or_default().to_string();
                if st.sessions.iter().any(|s| s.name == name) {
                    return Err(TmuxError::CommandFailed(format!("duplicate session: {name}")));
                }
                let pane = st.new_pane();
                st.sessions.push(FakeSession {
                    window_name: "zsh".to_string(),
                    dir: flag("-c").unwrap_or_default().to_string(),
                    name,
                    panes: vec![pane],
                    ..FakeSession::default()
                });
                Ok(String::new())
            }
            Some("split-window") => {
                let pane = st.new_pane();
                st.session_mut(flag("-t").unwrap_or_default())?.panes.push(pane);
                Ok(String::new())
            }
            Some("select-layout") => {
                let layout = args.last().copied().unwrap_or_default().to_string();
                st.session_mut(flag("-t").unwrap_or_default())?.layout = Some(layout);
                Ok(String::new())
            }
            Some("set-option") => {
                let n = args.len();
                let (key, value) = (args[n - 2].to_string(), args[n - 1].to_string());
                st.session_mut(flag("-t").unwrap_or_default())?
                    .options
                    .push((key, value));
                Ok(String::new())
            }
            Some("rename-window") => {
                let name = args.last().copied().unwrap_or_default().to_string();
                st.session_mut(flag("-t").unwrap_or_default())?.window_name = name;
                Ok(String::new())
            }
            Some("select-pane") => {
                let title = flag("-T").map(str::to_string);
                let pane = st.pane_mut(flag("-t").unwrap_or_default())?;
                if let Some(title) = title {
                    pane.title = title;
                }
                Ok(String::new())
            }
            Some("send-keys") => {
                let literal = args.contains(&"-l");
                let key = args.last().copied().unwrap_or_default();
                let pane = st.pane_mut(flag("-t").unwrap_or_default())?;
                if literal {
                    pane.pending.push_str(key);
                } else if key == "Enter" {
                    let line = std::mem::take(&mut pane.pending);
                    if !line.is_empty() {
                        pane.cmd = line.split_whitespace().next().unwrap_or("sh").to_string();
                        pane.children = vec![pane.pid + 10_000];
                        pane.submitted.push(line);
                    }
                } else if key == "C-c" {
                    pane.interrupts += 1;
                    pane.pending.clear();
                    if !pane.ignores_interrupt {
                        pane.cmd = "zsh".to_string();
                        pane.children.clear();
                    }
                }
                Ok(String::new())
            }
            Some("list-panes") => {
                let format = flag("-F").unwrap_or_default();
                let s = st.session_mut(flag("-t").unwrap_or_default())?;
                let lines: Vec<String> = s
                    .panes
                    .iter()
                    .enumerate()
                    .map(|(i, p)| {
                        if format == "#{pane_id}" {
                            p.id.clone()
                        } else {
                            format!(
                                "{}\t{}\t{}\t{}\t80\t24\t{}\t{}",
                                p.id,
                                i,
                                p.cmd,
                                p.pid,
                                u8::from(i == 0),
                                p.title
                            )
                        }
                    })
                    .collect();
                Ok(lines.join("\n"))
            }
            Some("display-message") => {
                let format = args.last().copied().unwrap_or_default();
                let pane = st.pane_mut(flag("-t").unwrap_or_default())?;
                Ok(match format {
                    "#{pane_current_command}" => pane.cmd.clone(),
                    "#{pane_pid}" => pane.pid.to_string(),
                    _ => String::new(),
                })
            }
            Some("kill-session") => {
                let name = flag("-t").unwrap_or_default().trim_start_matches('=').to_string();
                st.session_mut(&name)?;
                st.sessions.retain(|s| s.name != name);
                Ok(String::new())
            }
            Some("detach-client") => {
                st.session_mut(flag("-s").unwrap_or_default())?;
                Ok(String::new())
            }
            Some("list-sessions") => {
                if st.sessions.is_empty() {
                    return Err(TmuxError::CommandFailed(
                        "no server running on /tmp/tmux-501/default".to_string(),
                    ));
                }
                Ok(st
                    .sessions
                    .iter()
                    .map(|s| format!("{}\t1\t1700000000\t0", s.name))
                    .collect::<Vec<_>>()
                    .join("\n"))
            }
            Some("attach-session") | Some("switch-client") => {
                let target = flag("-t").unwrap_or_default().to_string();
                st.session_mut(&target)?;
                st.attached.push(target.trim_start_matches('=').to_string());
                Ok(String::new())
            }
            other => Err(TmuxError::CommandFailed(format!("unknown command {other:?}"))),
        }
    }
}

impl TmuxCommandRunner for FakeTmux {
    fn run(&self, args: &[&str]) -> Result<String, TmuxError> {
        self.dispatch(args)
    }
}

/// Process table backed by the fake server's panes.
pub struct FakeProcesses {
    tmux: FakeTmux,
}

impl FakeProcesses {
    pub fn new(tmux: &FakeTmux) -> Self {
        Self { tmux: tmux.clone() }
    }
}

impl ProcessControl for FakeProcesses {
    fn children(&self, pid: u32) -> Vec<u32> {
        self.tmux
            .state()
            .sessions
            .iter()
            .flat_map(|s| &s.panes)
            .find(|p| p.pid == pid)
            .map(|p| p.children.clone())
            .unwrap_or_default()
    }

    fn force_kill(&self, pid: u32) -> bool {
        let mut st = self.tmux.state();
        st.killed.push(pid);
        let Some(pane) = st
            .sessions
            .iter_mut()
            .flat_map(|s| s.panes.iter_mut())
            .find(|p| p.children.contains(&pid))
        else {
            return false;
        };
        pane.children.retain(|c| *c != pid);
        if pane.children.is_empty() && !pane.unkillable {
            pane.cmd = "zsh".to_string();
        }
        true
    }
}

/// Sleeper that only counts.
#[derive(Default)]
pub struct NoSleep {
    pub slept: Mutex<Vec<Duration>>,
}

impl NoSleep {
    pub fn total(&self) -> Duration {
        self.slept.lock().expect("sleeps").iter().sum()
    }
}

impl Sleeper for NoSleep {
    fn sleep(&self, duration: Duration) {
        self.slept.lock().expect("sleeps").push(duration);
    }
}

impl Sleeper for &NoSleep {
    fn sleep(&self, duration: Duration) {
        (**self).sleep(duration);
    }
}

pub fn project(path: &str, panes: Vec<PaneSpec>) -> ProjectConfig {
    ProjectConfig {
        path: path.into(),
        panes,
        ensure: false,
        prefill: false,
        source: ConfigSource::Declared,
    }
}

pub fn claude_and_server() -> Vec<PaneSpec> {
    vec![
        PaneSpec::new("claude", Some("claude".to_string())).with_size(60),
        PaneSpec::new("server", Some("pnpm dev".to_string())),
    ]
}

pub fn three_panes() -> Vec<PaneSpec> {
    vec![
        PaneSpec::new("claude", Some("claude".to_string())).with_size(65),
        PaneSpec::new("server", Some("pnpm dev".to_string())),
        PaneSpec::new("tests", Some("pnpm test --watch".to_string())),
    ]
}
