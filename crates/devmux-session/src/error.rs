//! Orchestration errors. Only the cases a caller must report are errors;
//! everything else degrades to a field in the returned report.

use devmux_tmux::TmuxError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("{0} is not installed (install with: brew install tmux)")]
    ToolMissing(String),

    #[error("no session named {0:?}")]
    SessionNotFound(String),

    #[error("unknown pane {target:?}; valid targets: {}", valid.join(", "))]
    TargetResolution { target: String, valid: Vec<String> },

    #[error("pane {label:?} (#{index}) is not present in session {session:?}; run sync first")]
    PaneNotLive {
        session: String,
        index: usize,
        label: String,
    },

    #[error(transparent)]
    Tmux(TmuxError),
}

impl From<TmuxError> for SessionError {
    fn from(e: TmuxError) -> Self {
        match e {
            TmuxError::NotInstalled(bin) => Self::ToolMissing(bin),
            TmuxError::Io(ref io) if io.kind() == std::io::ErrorKind::NotFound => {
                Self::ToolMissing("tmux".to_string())
            }
            other => Self::Tmux(other),
        }
    }
}
