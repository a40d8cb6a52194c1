//! Point-in-time snapshots of windows and virtual desktops.
//!
//! None of these are kept across calls: a handle is stale as soon as it has
//! been used for a mutating action.

use devmux_core::Rect;
use serde::Serialize;

/// A window the navigation layer can act on.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WindowHandle {
    /// Compositor window id. `None` when the window was only found through
    /// accessibility and could not be correlated.
    pub id: Option<u32>,
    pub owner_pid: i32,
    /// Top-left origin, screen points.
    pub frame: Rect,
    pub space_id: Option<u64>,
}

impl WindowHandle {
    /// Whether desktop correlation is possible for this handle.
    pub fn has_compositor_id(&self) -> bool {
        self.id.is_some()
    }
}

/// One entry of the system-wide on-screen window list.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CompositorWindow {
    pub id: u32,
    pub owner_pid: i32,
    pub owner_name: String,
    /// Empty when screen-recording permission has not been granted.
    pub title: String,
    pub frame: Rect,
}

/// A top-level window as seen through the accessibility tree.
///
/// `index` is its position in the application's window list at the time it
/// was read; backends use it together with the title to find the element
/// again.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AxWindow {
    pub pid: i32,
    pub index: usize,
    pub title: String,
    pub frame: Option<Rect>,
}

/// A user desktop.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SpaceInfo {
    pub id: u64,
    /// 1-based position within its display, counting every desktop the
    /// display has (fullscreen ones included).
    pub index: usize,
    /// 0-based display index.
    pub display: usize,
    pub is_current: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DisplaySpaces {
    pub display_index: usize,
    /// Compositor display UUID.
    pub display_id: String,
    pub spaces: Vec<SpaceInfo>,
    pub current_space_id: u64,
}
