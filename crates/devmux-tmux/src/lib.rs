//! devmux-tmux: tmux backend IO boundary.
//! Provides subprocess execution, typed tmux commands, pane/session listing,
//! and process inspection/signalling. No business logic; pure IO boundary.

pub mod client;
pub mod error;
pub mod executor;
pub mod pane_info;
pub mod process;

pub use client::{TmuxClient, inside_tmux, window_target};
pub use error::TmuxError;
pub use executor::{TmuxCommandRunner, TmuxExecutor};
pub use pane_info::{
    LIST_PANES_FORMAT, LIST_SESSIONS_FORMAT, PaneInfo, SessionInfo, exact_session, list_panes,
    list_sessions, parse_list_panes_output, parse_list_sessions_output,
};
pub use process::{
    ProcessControl, ProcessInfo, ProcessMap, SHELL_CMDS, SystemProcesses, children_of,
    is_idle_shell, scan_all_processes,
};
