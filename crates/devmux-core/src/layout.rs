//! Layout planning: which tmux splits and layout a pane list needs.

use crate::config::{DEFAULT_MAIN_SIZE, PaneSpec};

/// tmux layout name for "first pane left, the rest stacked right".
pub const MAIN_VERTICAL: &str = "main-vertical";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LayoutPlan {
    /// A single pane; nothing to split.
    Single,
    /// One horizontal split; the second pane takes `100 - main_pct`.
    SideBySide { main_pct: u8 },
    /// `splits` plain splits, then `main-vertical` with the main width set.
    MainVertical { main_pct: u8, splits: usize },
}

impl LayoutPlan {
    pub fn for_panes(panes: &[PaneSpec]) -> Self {
        let main_pct = panes
            .first()
            .and_then(|p| p.size)
            .unwrap_or(DEFAULT_MAIN_SIZE)
            .clamp(1, 99);
        match panes.len() {
            0 | 1 => Self::Single,
            2 => Self::SideBySide { main_pct },
            n => Self::MainVertical {
                main_pct,
                splits: n - 1,
            },
        }
    }

    /// Percentage handed to `split-window -p` for the side-by-side split.
    pub fn secondary_pct(&self) -> Option<u8> {
        match self {
            Self::SideBySide { main_pct } => Some(100 - main_pct),
            _ => None,
        }
    }

    /// Total panes this plan produces.
    pub fn pane_count(&self) -> usize {
        match self {
            Self::Single => 1,
            Self::SideBySide { .. } => 2,
            Self::MainVertical { splits, .. } => splits + 1,
        }
    }
}
