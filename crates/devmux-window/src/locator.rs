//! Three-tier window discovery.
//!
//! Each tier needs a different OS permission and silently yields nothing
//! without it:
//!
//! 1. compositor window list (screen recording, for titles),
//! 2. accessibility tree of the terminal app (accessibility),
//! 3. the terminal's scripting bridge, or plain activation.
//!
//! Tiers run in that order and the first hit wins.

use devmux_core::Rect;

use crate::terminal::TerminalApp;
use crate::types::{AxWindow, CompositorWindow, WindowHandle};

/// System-wide window enumeration.
pub trait Compositor: Send + Sync {
    /// Windows on every desktop, front to back, not only the ones on the
    /// current desktop. Titles are empty without screen-recording permission.
    fn windows(&self) -> Vec<CompositorWindow>;
}

/// Accessibility access to an application's windows.
pub trait Accessibility: Send + Sync {
    /// Pid of the running application `bundle_id` (display name `app_name`),
    /// whether or not it has a window on the current desktop.
    fn app_pid(&self, bundle_id: &str, app_name: &str) -> Option<i32>;

    /// Top-level windows of `pid`. `None` when access is denied.
    fn windows(&self, pid: i32) -> Option<Vec<AxWindow>>;

    /// Raise `window` and make it the app's main window.
    fn raise(&self, window: &AxWindow) -> bool;
}

/// Where the locator found the window.
#[derive(Debug, Clone, PartialEq)]
pub enum Located {
    /// A compositor window id is known; desktops can be correlated.
    Compositor(WindowHandle),
    /// Found through accessibility only; `handle.id` is `None`.
    Accessibility { handle: WindowHandle, element: AxWindow },
    /// Nothing addressable was found; the terminal was brought forward
    /// instead, by script when it could match the tag.
    Activated { raised_by_script: bool },
    None,
}

pub struct WindowLocator<'a> {
    compositor: &'a dyn Compositor,
    accessibility: &'a dyn Accessibility,
    terminal: &'a dyn TerminalApp,
}

impl<'a> WindowLocator<'a> {
    pub fn new(
        compositor: &'a dyn Compositor,
        accessibility: &'a dyn Accessibility,
        terminal: &'a dyn TerminalApp,
    ) -> Self {
        Self {
            compositor,
            accessibility,
            terminal,
        }
    }

    pub fn find_window(&self, tag: &str) -> Located {
        if let Some(handle) = self.by_compositor(tag) {
            tracing::info!(tier = 1, "found {tag} as window {:?}", handle.id);
            return Located::Compositor(handle);
        }
        tracing::debug!(tier = 1, "no titled window matches {tag} (screen recording denied?)");

        if let Some(found) = self.by_accessibility(tag) {
            return found;
        }
        tracing::debug!(tier = 2, "accessibility search for {tag} failed");

        self.by_script(tag)
    }

    /// Tier 1 lookup only, without side effects.
    pub fn by_compositor(&self, tag: &str) -> Option<WindowHandle> {
        self.compositor
            .windows()
            .into_iter()
            .find(|w| w.title.contains(tag))
            .map(|w| WindowHandle {
                id: Some(w.id),
                owner_pid: w.owner_pid,
                frame: w.frame,
                space_id: None,
            })
    }

    /// Tier 2 lookup only, without side effects.
    pub fn by_accessibility(&self, tag: &str) -> Option<Located> {
        let app = self.terminal.app_name();
        let Some(pid) = self.accessibility.app_pid(self.terminal.bundle_id(), app) else {
            tracing::debug!(tier = 2, "{app} is not running");
            return None;
        };
        let Some(windows) = self.accessibility.windows(pid) else {
            tracing::warn!(tier = 2, "accessibility denied for {app} (pid {pid})");
            return None;
        };
        let element = windows.into_iter().find(|w| w.title.contains(tag))?;

        let frame = element.frame.unwrap_or_default();
        match element.frame.and_then(|f| self.correlate(pid, f)) {
            Some(id) => {
                tracing::info!(tier = 2, "found {tag} via accessibility, window {id}");
                Some(Located::Compositor(WindowHandle {
                    id: Some(id),
                    owner_pid: pid,
                    frame,
                    space_id: None,
                }))
            }
            None => {
                tracing::warn!(tier = 2, "found {tag} via accessibility only; no desktop correlation");
                Some(Located::Accessibility {
                    handle: WindowHandle {
                        id: None,
                        owner_pid: pid,
                        frame,
                        space_id: None,
                    },
                    element,
                })
            }
        }
    }

    /// Compositor id of the window owned by `pid` whose frame matches.
    fn correlate(&self, pid: i32, frame: Rect) -> Option<u32> {
        self.compositor
            .windows()
            .into_iter()
            .find(|w| w.owner_pid == pid && w.frame.approx_eq(&frame))
            .map(|w| w.id)
    }

    fn by_script(&self, tag: &str) -> Located {
        if self.terminal.raise_tagged(tag) {
            tracing::info!(tier = 3, "raised {tag} via {} script", self.terminal.kind());
            return Located::Activated {
                raised_by_script: true,
            };
        }
        match self.terminal.activate() {
            Ok(()) => {
                tracing::warn!(tier = 3, "{tag} not found; activated {}", self.terminal.kind());
                Located::Activated {
                    raised_by_script: false,
                }
            }
            Err(e) => {
                tracing::warn!(tier = 3, "could not activate {}: {e}", self.terminal.kind());
                Located::None
            }
        }
    }
}
