//! Named tiling presets applied to a session's window.

use std::fmt;
use std::str::FromStr;

use devmux_core::Rect;
use serde::Serialize;

use crate::error::WindowError;
use crate::script::ScriptBridge;
use crate::terminal::TerminalApp;

/// Bounds used when the screen size cannot be read.
const FALLBACK_BOUNDS: Bounds = Bounds {
    left: 0,
    top: 0,
    right: 960,
    bottom: 540,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum TilePosition {
    Left,
    Right,
    Top,
    Bottom,
    TopLeft,
    TopRight,
    BottomLeft,
    BottomRight,
    Maximize,
    Center,
}

impl TilePosition {
    pub const ALL: [Self; 10] = [
        Self::Left,
        Self::Right,
        Self::Top,
        Self::Bottom,
        Self::TopLeft,
        Self::TopRight,
        Self::BottomLeft,
        Self::BottomRight,
        Self::Maximize,
        Self::Center,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Left => "left",
            Self::Right => "right",
            Self::Top => "top",
            Self::Bottom => "bottom",
            Self::TopLeft => "top-left",
            Self::TopRight => "top-right",
            Self::BottomLeft => "bottom-left",
            Self::BottomRight => "bottom-right",
            Self::Maximize => "maximize",
            Self::Center => "center",
        }
    }

    /// `(x, y, width, height)` as fractions of the visible screen area.
    pub fn fractions(self) -> (f64, f64, f64, f64) {
        match self {
            Self::Left => (0.0, 0.0, 0.5, 1.0),
            Self::Right => (0.5, 0.0, 0.5, 1.0),
            Self::Top => (0.0, 0.0, 1.0, 0.5),
            Self::Bottom => (0.0, 0.5, 1.0, 0.5),
            Self::TopLeft => (0.0, 0.0, 0.5, 0.5),
            Self::TopRight => (0.5, 0.0, 0.5, 0.5),
            Self::BottomLeft => (0.0, 0.5, 0.5, 0.5),
            Self::BottomRight => (0.5, 0.5, 0.5, 0.5),
            Self::Maximize => (0.0, 0.0, 1.0, 1.0),
            Self::Center => (0.15, 0.1, 0.7, 0.8),
        }
    }

    pub fn names() -> Vec<&'static str> {
        Self::ALL.iter().map(|p| p.as_str()).collect()
    }
}

impl fmt::Display for TilePosition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TilePosition {
    type Err = WindowError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let key = s.trim().to_ascii_lowercase();
        let alias = match key.as_str() {
            "left-half" => "left",
            "right-half" => "right",
            "top-half" => "top",
            "bottom-half" => "bottom",
            "max" => "maximize",
            other => other,
        };
        Self::ALL
            .into_iter()
            .find(|p| p.as_str() == alias)
            .ok_or_else(|| WindowError::UnknownPosition {
                given: s.to_string(),
                valid: Self::names(),
            })
    }
}

/// AppleScript window bounds: `{left, top, right, bottom}`, top-left origin.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Bounds {
    pub left: i64,
    pub top: i64,
    pub right: i64,
    pub bottom: i64,
}

/// Map `position` onto `visible` (top-left origin). Edges are rounded to
/// whole points, so neighbouring presets share their common edge exactly.
pub fn bounds_for(position: TilePosition, visible: Rect) -> Bounds {
    let (fx, fy, fw, fh) = position.fractions();
    let edge = |origin: f64, extent: f64, frac: f64| (origin + extent * frac).round() as i64;
    Bounds {
        left: edge(visible.x, visible.width, fx),
        top: edge(visible.y, visible.height, fy),
        right: edge(visible.x, visible.width, fx + fw),
        bottom: edge(visible.y, visible.height, fy + fh),
    }
}

/// Source of the main screen's usable area.
pub trait ScreenGeometry: Send + Sync {
    /// Visible area of the main screen (menu bar and Dock excluded), top-left
    /// origin. `None` when it cannot be determined.
    fn visible_area(&self) -> Option<Rect>;
}

/// How a tile request was carried out.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum TileOutcome {
    /// The session's tagged window was moved.
    Tagged(Bounds),
    /// The terminal cannot address windows by title; the frontmost window
    /// was moved instead.
    Frontmost(Bounds),
}

pub struct WindowTiler<'a> {
    terminal: &'a dyn TerminalApp,
    bridge: &'a dyn ScriptBridge,
    screen: &'a dyn ScreenGeometry,
}

impl<'a> WindowTiler<'a> {
    pub fn new(
        terminal: &'a dyn TerminalApp,
        bridge: &'a dyn ScriptBridge,
        screen: &'a dyn ScreenGeometry,
    ) -> Self {
        Self {
            terminal,
            bridge,
            screen,
        }
    }

    pub fn bounds(&self, position: TilePosition) -> Bounds {
        match self.screen.visible_area() {
            Some(area) => bounds_for(position, area),
            None => {
                tracing::warn!("screen size unavailable, using {FALLBACK_BOUNDS:?}");
                FALLBACK_BOUNDS
            }
        }
    }

    /// Tile the session's window, falling back to the frontmost window.
    pub fn tile(&self, session: &str, position: TilePosition) -> Result<TileOutcome, WindowError> {
        let bounds = self.bounds(position);
        let tag = devmux_core::window_tag(session);
        if self.terminal.set_bounds_tagged(&tag, bounds) {
            tracing::info!("tiled {tag} to {position}");
            return Ok(TileOutcome::Tagged(bounds));
        }
        tracing::debug!(
            "{} could not address {tag}; tiling frontmost window",
            self.terminal.kind()
        );
        self.tile_frontmost(position).map(TileOutcome::Frontmost)
    }

    pub fn tile_frontmost(&self, position: TilePosition) -> Result<Bounds, WindowError> {
        let b = self.bounds(position);
        let script = format!(
            "tell application \"System Events\"\n\
             set frontApp to name of first application process whose frontmost is true\n\
             end tell\n\
             tell application frontApp\n\
             set bounds of front window to {{{}, {}, {}, {}}}\n\
             end tell",
            b.left, b.top, b.right, b.bottom
        );
        self.bridge.run_script(&script)?;
        Ok(b)
    }
}
