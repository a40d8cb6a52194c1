//! Process inspection and signalling for pane restarts.

use std::collections::HashMap;

/// Interactive shells. A pane whose foreground command is one of these is
/// idle and may receive a command.
pub const SHELL_CMDS: &[&str] = &[
    "zsh", "bash", "fish", "sh", "dash", "ksh", "tcsh", "csh", "nu", "pwsh",
];

/// Whether tmux's `pane_current_command` names an idle shell.
///
/// Login shells report with a leading dash (`-zsh`) and some tmux builds
/// report the full path; both are accepted.
pub fn is_idle_shell(current_cmd: &str) -> bool {
    let trimmed = current_cmd.trim();
    let name = trimmed.rsplit('/').next().unwrap_or(trimmed);
    let name = name.strip_prefix('-').unwrap_or(name);
    SHELL_CMDS.contains(&name)
}

/// One entry from `ps -eo pid=,ppid=,args=`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessInfo {
    pub pid: u32,
    pub ppid: u32,
    pub args: String,
}

/// Snapshot of all running processes on the host, keyed by PID.
pub type ProcessMap = HashMap<u32, ProcessInfo>;

/// Process-table access and signalling. Mockable for restart tests.
pub trait ProcessControl: Send + Sync {
    /// Direct children of `pid`.
    fn children(&self, pid: u32) -> Vec<u32>;

    /// Send SIGKILL to `pid`. Returns whether the signal was delivered.
    fn force_kill(&self, pid: u32) -> bool;
}

/// Real process table via `ps` and `kill(2)`.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemProcesses;

impl ProcessControl for SystemProcesses {
    fn children(&self, pid: u32) -> Vec<u32> {
        children_of(pid, &scan_all_processes())
    }

    fn force_kill(&self, pid: u32) -> bool {
        let Ok(raw) = libc::pid_t::try_from(pid) else {
            return false;
        };
        if raw <= 1 {
            return false;
        }
        // SAFETY: kill(2) has no memory-safety preconditions; pid 0/1 and
        // negative values (process groups) are excluded above.
        let rc = unsafe { libc::kill(raw, libc::SIGKILL) };
        if rc != 0 {
            tracing::debug!(
                "kill -9 {pid} failed: {}",
                std::io::Error::last_os_error()
            );
        }
        rc == 0
    }
}

/// Scan all running processes. Returns an empty map on failure (non-fatal).
pub fn scan_all_processes() -> ProcessMap {
    let output = match std::process::Command::new("ps")
        .args(["-eo", "pid=,ppid=,args="])
        .output()
    {
        Ok(o) => o,
        Err(e) => {
            tracing::debug!("ps failed: {e}");
            return ProcessMap::new();
        }
    };
    parse_ps_output(&String::from_utf8_lossy(&output.stdout))
}

/// Direct children of `pid`, sorted for deterministic signalling order.
pub fn children_of(pid: u32, map: &ProcessMap) -> Vec<u32> {
    let mut kids: Vec<u32> = map
        .values()
        .filter(|p| p.ppid == pid && p.pid != pid)
        .map(|p| p.pid)
        .collect();
    kids.sort_unstable();
    kids
}

pub fn parse_ps_output(output: &str) -> ProcessMap {
    output
        .lines()
        .filter_map(parse_ps_line)
        .map(|info| (info.pid, info))
        .collect()
}

fn parse_ps_line(line: &str) -> Option<ProcessInfo> {
    let s = line.trim();
    if s.is_empty() {
        return None;
    }
    // PID: first whitespace-delimited token
    let ws = s.find(|c: char| c.is_ascii_whitespace())?;
    let pid: u32 = s[..ws].parse().ok()?;
    let s = s[ws..].trim_start();
    // PPID: second token
    let ws = s.find(|c: char| c.is_ascii_whitespace()).unwrap_or(s.len());
    let ppid: u32 = s[..ws].parse().ok()?;
    let args = s[ws..].trim_start().to_string();
    Some(ProcessInfo { pid, ppid, args })
}
