use thiserror::Error;

#[derive(Debug, Error)]
pub enum WindowError {
    /// `osascript` ran but reported an error.
    #[error("script failed: {0}")]
    ScriptFailed(String),

    #[error("unknown tile position {given:?}; valid: {}", valid.join(", "))]
    UnknownPosition { given: String, valid: Vec<&'static str> },

    #[error("{0} is not installed")]
    AppNotInstalled(String),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}
