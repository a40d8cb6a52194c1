//! devmux-session: session lifecycle on top of the tmux boundary.
//! Creation with layout and labels, reattach with idle-pane refill,
//! declaration sync, and pane restart with interrupt → kill escalation.

pub mod error;
pub mod orchestrator;
pub mod report;

pub use devmux_core::poll::{PollPolicy, Sleeper, ThreadSleeper};
pub use error::SessionError;
pub use orchestrator::{RestartPolicy, SessionOrchestrator, resolve_target, valid_targets};
pub use report::{AttachOutcome, ReconcileMode, RestartReport, SessionHandle, SyncReport};
