//! Pane and session listing: format strings and parsers.

use serde::Serialize;

use crate::error::TmuxError;
use crate::executor::TmuxCommandRunner;

/// Tab-delimited format for `tmux list-panes -t <session> -F`.
/// The title goes last because it is free text.
pub const LIST_PANES_FORMAT: &str = "#{pane_id}\t#{pane_index}\t#{pane_current_command}\t#{pane_pid}\t#{pane_width}\t#{pane_height}\t#{pane_active}\t#{pane_title}";

/// Tab-delimited format for `tmux list-sessions -F`.
pub const LIST_SESSIONS_FORMAT: &str =
    "#{session_name}\t#{session_windows}\t#{session_created}\t#{session_attached}";

/// Live metadata for one pane of a session.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct PaneInfo {
    /// tmux-assigned id such as `%12`. Stable for the pane's lifetime.
    pub pane_id: String,
    /// Positional index; affected by `pane-base-index`, informational only.
    pub index: u32,
    pub current_cmd: String,
    pub pane_pid: Option<u32>,
    pub width: u16,
    pub height: u16,
    pub active: bool,
    pub title: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SessionInfo {
    pub name: String,
    pub windows: u32,
    /// Creation time, seconds since the epoch.
    pub created: Option<i64>,
    /// Number of attached clients.
    pub attached: u32,
}

/// List the panes of `session` in tmux order.
pub fn list_panes(
    runner: &impl TmuxCommandRunner,
    session: &str,
) -> Result<Vec<PaneInfo>, TmuxError> {
    let target = exact_session(session);
    let output = runner.run(&["list-panes", "-t", &target, "-F", LIST_PANES_FORMAT])?;
    parse_list_panes_output(&output)
}

/// List every session on the server. A server with no sessions yields an
/// empty list rather than an error.
pub fn list_sessions(runner: &impl TmuxCommandRunner) -> Result<Vec<SessionInfo>, TmuxError> {
    match runner.run(&["list-sessions", "-F", LIST_SESSIONS_FORMAT]) {
        Ok(output) => parse_list_sessions_output(&output),
        Err(TmuxError::CommandFailed(msg))
            if msg.contains("no server running") || msg.contains("no sessions") =>
        {
            Ok(Vec::new())
        }
        Err(e) => Err(e),
    }
}

/// `=name` targets a session by exact name instead of tmux's prefix match.
pub fn exact_session(session: &str) -> String {
    format!("={session}")
}

pub fn parse_list_panes_output(output: &str) -> Result<Vec<PaneInfo>, TmuxError> {
    let mut panes = Vec::new();
    for (idx, line) in output.lines().enumerate() {
        if line.trim().is_empty() {
            continue;
        }
        panes.push(parse_pane_line(line, idx + 1)?);
    }
    Ok(panes)
}

fn parse_pane_line(line: &str, line_num: usize) -> Result<PaneInfo, TmuxError> {
    let parts: Vec<&str> = line.splitn(8, '\t').collect();
    if parts.len() < 7 {
        return Err(TmuxError::ParseError {
            line_num,
            detail: format!(
                "expected at least 7 tab-separated fields, got {}",
                parts.len()
            ),
        });
    }
    let pane_id = parts[0].trim();
    if !pane_id.starts_with('%') {
        return Err(TmuxError::ParseError {
            line_num,
            detail: format!("not a pane id: {pane_id:?}"),
        });
    }

    Ok(PaneInfo {
        pane_id: pane_id.to_string(),
        index: parts[1].trim().parse().unwrap_or(0),
        current_cmd: parts[2].to_string(),
        pane_pid: parts[3].trim().parse().ok(),
        width: parts[4].trim().parse().unwrap_or(80),
        height: parts[5].trim().parse().unwrap_or(24),
        active: parse_bool(parts[6]),
        title: parts.get(7).map(|s| s.to_string()).unwrap_or_default(),
    })
}

pub fn parse_list_sessions_output(output: &str) -> Result<Vec<SessionInfo>, TmuxError> {
    let mut sessions = Vec::new();
    for (idx, line) in output.lines().enumerate() {
        if line.trim().is_empty() {
            continue;
        }
        let parts: Vec<&str> = line.split('\t').collect();
        if parts.len() < 4 {
            return Err(TmuxError::ParseError {
                line_num: idx + 1,
                detail: format!("expected 4 tab-separated fields, got {}", parts.len()),
            });
        }
        sessions.push(SessionInfo {
            name: parts[0].to_string(),
            windows: parts[1].trim().parse().unwrap_or(0),
            created: parts[2].trim().parse().ok(),
            attached: parts[3].trim().parse().unwrap_or(0),
        });
    }
    Ok(sessions)
}

fn parse_bool(s: &str) -> bool {
    matches!(s.trim(), "1" | "true")
}
