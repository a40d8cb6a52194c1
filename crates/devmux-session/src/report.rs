//! Outcome records returned by orchestration calls.

use serde::Serialize;

/// A live session: its derived name and tmux pane ids in order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SessionHandle {
    pub name: String,
    pub pane_ids: Vec<String>,
}

/// How idle panes of an existing session are refilled on reattach.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReconcileMode {
    /// Type the command and press Enter.
    Ensure,
    /// Type the command and leave it for the user to run.
    Prefill,
}

impl ReconcileMode {
    /// `ensure` wins over `prefill`; neither means no reconciliation.
    pub fn from_flags(ensure: bool, prefill: bool) -> Option<Self> {
        if ensure {
            Some(Self::Ensure)
        } else if prefill {
            Some(Self::Prefill)
        } else {
            None
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum AttachOutcome {
    Created(SessionHandle),
    Reattached {
        name: String,
        /// Panes that received their command (typed or executed).
        refilled: Vec<String>,
        mode: Option<&'static str>,
    },
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SyncReport {
    pub session: String,
    /// The session did not exist and was created from scratch.
    pub created_session: bool,
    /// Number of panes added to reach the declared count.
    pub panes_added: usize,
    pub layout_reapplied: bool,
    /// Pane ids whose label was changed back to the declared one.
    pub relabelled: Vec<String>,
    /// Pane ids that received their declared command.
    pub submitted: Vec<String>,
    /// Pane ids left alone because a non-shell process was in the foreground.
    pub busy: Vec<String>,
    /// Live panes beyond the declared count; never touched.
    pub extra_panes: usize,
}

impl SyncReport {
    /// Whether the call changed anything observable.
    pub fn is_noop(&self) -> bool {
        !self.created_session
            && self.panes_added == 0
            && self.relabelled.is_empty()
            && self.submitted.is_empty()
    }
}

/// Result of a restart. Never an error once the target resolved: the
/// observed state is reported instead.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RestartReport {
    pub session: String,
    pub pane_id: String,
    pub label: String,
    /// The pane was running something other than a shell beforehand.
    pub was_running: bool,
    pub interrupted: bool,
    /// The interrupt did not return the pane to a shell; children were killed.
    pub escalated: bool,
    pub killed: Vec<u32>,
    /// Even after escalation the pane never returned to a shell.
    pub escalation_ineffective: bool,
    /// The declared command was resubmitted.
    pub resubmitted: Option<String>,
}

impl RestartReport {
    pub fn summary(&self) -> String {
        let label = if self.label.is_empty() {
            self.pane_id.as_str()
        } else {
            self.label.as_str()
        };
        match (&self.resubmitted, self.escalation_ineffective) {
            (Some(cmd), false) => format!("Restarted {label}: {cmd}"),
            (Some(cmd), true) => {
                format!("Resubmitted {cmd} in {label}, but the old process did not exit")
            }
            (None, _) => format!("Stopped {label}; no command declared, left at the shell"),
        }
    }
}
