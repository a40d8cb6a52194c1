//! Bring a session's window into view.

use std::time::Duration;

use devmux_core::poll::Sleeper;
use devmux_core::{Rect, window_tag};
use serde::Serialize;

use crate::highlight::Highlighter;
use crate::locator::{Accessibility, Compositor, Located, WindowLocator};
use crate::spaces::SpaceCoordinator;
use crate::terminal::TerminalApp;
use crate::types::WindowHandle;

/// Default wait for a desktop switch to land before raising the window.
pub const DEFAULT_SPACE_SETTLE: Duration = Duration::from_millis(200);

/// The path navigation took.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum NavigationOutcome {
    /// Raised a compositor-addressable window, switching desktops first
    /// when it lived elsewhere.
    Focused {
        window: WindowHandle,
        switched_space: Option<u64>,
        highlighted: bool,
    },
    /// Raised through accessibility; desktop switching was not possible.
    FocusedByAccessibility {
        window: WindowHandle,
        highlighted: bool,
    },
    /// Only the terminal app was brought forward.
    Activated { raised_by_script: bool },
    NotFound,
}

impl NavigationOutcome {
    pub fn describe(&self) -> String {
        match self {
            Self::Focused {
                switched_space: Some(space),
                ..
            } => format!("Switched to desktop {space} and focused the window"),
            Self::Focused { .. } => "Focused the window".to_string(),
            Self::FocusedByAccessibility { .. } => {
                "Focused the window (accessibility only; desktop not switched)".to_string()
            }
            Self::Activated {
                raised_by_script: true,
            } => "Raised the window via the terminal's scripting bridge".to_string(),
            Self::Activated { .. } => {
                "Window not found; activated the terminal instead".to_string()
            }
            Self::NotFound => "Window not found".to_string(),
        }
    }
}

pub struct NavigationEngine<'a, S> {
    compositor: &'a dyn Compositor,
    accessibility: &'a dyn Accessibility,
    terminal: &'a dyn TerminalApp,
    spaces: &'a SpaceCoordinator,
    highlighter: Option<&'a Highlighter>,
    sleeper: S,
    settle: Duration,
}

impl<'a, S: Sleeper> NavigationEngine<'a, S> {
    pub fn new(
        compositor: &'a dyn Compositor,
        accessibility: &'a dyn Accessibility,
        terminal: &'a dyn TerminalApp,
        spaces: &'a SpaceCoordinator,
        sleeper: S,
    ) -> Self {
        Self {
            compositor,
            accessibility,
            terminal,
            spaces,
            highlighter: None,
            sleeper,
            settle: DEFAULT_SPACE_SETTLE,
        }
    }

    #[must_use]
    pub fn with_highlighter(mut self, highlighter: &'a Highlighter) -> Self {
        self.highlighter = Some(highlighter);
        self
    }

    #[must_use]
    pub fn with_settle(mut self, settle: Duration) -> Self {
        self.settle = settle;
        self
    }

    fn locator(&self) -> WindowLocator<'a> {
        WindowLocator::new(self.compositor, self.accessibility, self.terminal)
    }

    pub fn navigate_to_window(&self, session: &str) -> NavigationOutcome {
        let tag = window_tag(session);
        match self.locator().find_window(&tag) {
            Located::Compositor(handle) => self.focus_known(handle, &tag),
            Located::Accessibility { handle, element } => {
                if !self.accessibility.raise(&element) {
                    tracing::debug!("accessibility raise of {tag} failed");
                }
                self.activate_terminal();
                let highlighted = element.frame.is_some() && self.highlight(handle.frame);
                NavigationOutcome::FocusedByAccessibility {
                    window: handle,
                    highlighted,
                }
            }
            Located::Activated { raised_by_script } => {
                NavigationOutcome::Activated { raised_by_script }
            }
            Located::None => NavigationOutcome::NotFound,
        }
    }

    fn focus_known(&self, mut handle: WindowHandle, tag: &str) -> NavigationOutcome {
        handle.space_id = handle.id.and_then(|id| self.spaces.space_for_window(id));
        let active = self.spaces.active_space();
        tracing::debug!("{tag}: window space {:?}, active {active:?}", handle.space_id);

        let switched_space = match (handle.space_id, active) {
            (Some(target), Some(current)) if target != current => self
                .spaces
                .switch_and_settle(target, self.settle, &self.sleeper)
                .then_some(target),
            _ => None,
        };

        self.raise(handle.owner_pid, tag);
        let highlighted = self.highlight(handle.frame);
        NavigationOutcome::Focused {
            window: handle,
            switched_space,
            highlighted,
        }
    }

    /// Raise the tagged window of `pid`: accessibility first, then script.
    fn raise(&self, pid: i32, tag: &str) {
        let by_ax = self
            .accessibility
            .windows(pid)
            .and_then(|ws| ws.into_iter().find(|w| w.title.contains(tag)))
            .is_some_and(|w| self.accessibility.raise(&w));
        if !by_ax && !self.terminal.raise_tagged(tag) {
            tracing::warn!("could not raise {tag}; activating only");
        }
        self.activate_terminal();
    }

    fn activate_terminal(&self) {
        if let Err(e) = self.terminal.activate() {
            tracing::debug!("activating {} failed: {e}", self.terminal.kind());
        }
    }

    fn highlight(&self, frame: Rect) -> bool {
        match self.highlighter {
            Some(h) if frame.width > 0.0 && frame.height > 0.0 => {
                h.flash(frame);
                true
            }
            _ => false,
        }
    }

    /// Flash the overlay over the session's window without moving anything.
    pub fn highlight_session(&self, session: &str) -> bool {
        let tag = window_tag(session);
        let locator = self.locator();
        let frame = locator.by_compositor(&tag).map(|h| h.frame).or_else(|| {
            match locator.by_accessibility(&tag)? {
                Located::Compositor(h) => Some(h.frame),
                Located::Accessibility { element, .. } => element.frame,
                _ => None,
            }
        });
        match frame {
            Some(frame) => self.highlight(frame),
            None => {
                tracing::warn!("no window found for {tag}; nothing to highlight");
                false
            }
        }
    }
}
