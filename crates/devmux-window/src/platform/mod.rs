//! OS backends for window discovery, desktops, and screen geometry.
//!
//! Only macOS has real implementations. Elsewhere every backend reports
//! nothing, which the locator and [`SpaceCoordinator`] treat as "permission
//! denied" and degrade from.

#[cfg(target_os = "macos")]
mod appkit;
#[cfg(target_os = "macos")]
mod macos;

use std::sync::Arc;

use devmux_core::Rect;

use crate::highlight::{OverlaySurface, TracingSurface};
use crate::locator::{Accessibility, Compositor};
use crate::script::ScriptBridge;
use crate::spaces::SpaceCoordinator;
use crate::tile::ScreenGeometry;
use crate::types::{AxWindow, CompositorWindow};

/// Everything navigation needs from the OS.
pub struct Backends {
    pub compositor: Box<dyn Compositor>,
    pub accessibility: Box<dyn Accessibility>,
    pub spaces: SpaceCoordinator,
    pub screen: Box<dyn ScreenGeometry>,
}

#[cfg(target_os = "macos")]
pub fn system_backends() -> Backends {
    Backends {
        compositor: Box::new(macos::CgCompositor),
        accessibility: Box::new(macos::AxAccessibility),
        spaces: SpaceCoordinator::new(Box::new(macos::SkyLightSpaces::load())),
        screen: Box::new(ScriptScreen::new(crate::script::SystemBridge)),
    }
}

#[cfg(not(target_os = "macos"))]
pub fn system_backends() -> Backends {
    tracing::debug!("no window backends on this platform");
    Backends {
        compositor: Box::new(NullCompositor),
        accessibility: Box::new(NullAccessibility),
        spaces: SpaceCoordinator::unavailable(),
        screen: Box::new(NullScreen),
    }
}

// ─── Highlight overlay ────────────────────────────────────────────

/// Owner of the overlay window. Must stay on the thread that created it;
/// [`OverlayDriver::run_while`] is where the window actually gets drawn.
pub struct OverlayDriver {
    #[cfg(target_os = "macos")]
    window: Option<appkit::AppKitOverlay>,
}

impl OverlayDriver {
    /// Whether flashes are drawn on screen, rather than only logged.
    pub fn draws(&self) -> bool {
        #[cfg(target_os = "macos")]
        {
            self.window.is_some()
        }
        #[cfg(not(target_os = "macos"))]
        {
            false
        }
    }

    /// Draw the overlay on this thread until `active` turns false. Returns
    /// immediately when nothing is drawn.
    pub fn run_while(&mut self, active: &dyn Fn() -> bool) {
        #[cfg(target_os = "macos")]
        if let Some(window) = self.window.as_mut() {
            window.run_while(active);
        }
        #[cfg(not(target_os = "macos"))]
        let _ = active;
    }
}

/// Surface for the [`Highlighter`](crate::Highlighter) plus the driver that
/// draws it. Call from the main thread; elsewhere, and off macOS, the
/// surface only logs.
#[cfg(target_os = "macos")]
pub fn overlay_surface() -> (Arc<dyn OverlaySurface>, OverlayDriver) {
    let (surface, commands) = crate::overlay::channel_surface();
    match appkit::AppKitOverlay::new(commands) {
        Some(window) => (
            Arc::new(surface),
            OverlayDriver {
                window: Some(window),
            },
        ),
        None => {
            tracing::debug!("not on the main thread; highlights are logged only");
            (Arc::new(TracingSurface), OverlayDriver { window: None })
        }
    }
}

#[cfg(not(target_os = "macos"))]
pub fn overlay_surface() -> (Arc<dyn OverlaySurface>, OverlayDriver) {
    (Arc::new(TracingSurface), OverlayDriver {})
}

// ─── Null backends ───────────────────────────────────────────────

#[derive(Debug, Default, Clone, Copy)]
pub struct NullCompositor;

impl Compositor for NullCompositor {
    fn windows(&self) -> Vec<CompositorWindow> {
        Vec::new()
    }
}

#[derive(Debug, Default, Clone, Copy)]
pub struct NullAccessibility;

impl Accessibility for NullAccessibility {
    fn app_pid(&self, _bundle_id: &str, _app_name: &str) -> Option<i32> {
        None
    }

    fn windows(&self, _pid: i32) -> Option<Vec<AxWindow>> {
        None
    }

    fn raise(&self, _window: &AxWindow) -> bool {
        false
    }
}

#[derive(Debug, Default, Clone, Copy)]
pub struct NullScreen;

impl ScreenGeometry for NullScreen {
    fn visible_area(&self) -> Option<Rect> {
        None
    }
}

/// Reads the main screen through JXA. The reply is
/// `fullHeight,x,y,width,height` with the visible frame in bottom-left
/// origin coordinates.
const SCREEN_JXA: &str = "ObjC.import('AppKit');\
var s = $.NSScreen.mainScreen;\
var f = s.frame; var v = s.visibleFrame;\
[f.size.height, v.origin.x, v.origin.y, v.size.width, v.size.height].join(',')";

pub struct ScriptScreen<B> {
    bridge: B,
}

impl<B: ScriptBridge> ScriptScreen<B> {
    pub fn new(bridge: B) -> Self {
        Self { bridge }
    }
}

impl<B: ScriptBridge> ScreenGeometry for ScriptScreen<B> {
    fn visible_area(&self) -> Option<Rect> {
        match self.bridge.run_jxa(SCREEN_JXA) {
            Ok(out) => parse_visible_frame(&out),
            Err(e) => {
                tracing::debug!("reading screen geometry failed: {e}");
                None
            }
        }
    }
}

/// Parse the [`SCREEN_JXA`] reply into a top-left origin rect.
fn parse_visible_frame(out: &str) -> Option<Rect> {
    let nums: Vec<f64> = out
        .trim()
        .split(',')
        .map(|n| n.trim().parse::<f64>())
        .collect::<Result<_, _>>()
        .ok()?;
    let [full_height, x, y, width, height] = nums[..] else {
        return None;
    };
    if width <= 0.0 || height <= 0.0 {
        return None;
    }
    Some(Rect::new(x, y, width, height).flipped(full_height))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::WindowError;

    struct Reply(&'static str);

    impl ScriptBridge for Reply {
        fn run_script(&self, _script: &str) -> Result<String, WindowError> {
            Err(WindowError::ScriptFailed("unused".into()))
        }

        fn run_jxa(&self, _script: &str) -> Result<String, WindowError> {
            Ok(self.0.to_string())
        }

        fn spawn(&self, _program: &str, _args: &[&str], _env: &[(&str, &str)]) -> Result<(), WindowError> {
            Ok(())
        }
    }

    #[test]
    fn visible_frame_flipped_below_menu_bar() {
        // 900pt tall screen, 25pt menu bar, 70pt Dock at the bottom
        let screen = ScriptScreen::new(Reply("900,0,70,1440,805"));
        assert_eq!(
            screen.visible_area(),
            Some(Rect::new(0.0, 25.0, 1440.0, 805.0))
        );
    }

    #[test]
    fn malformed_reply_is_none() {
        assert_eq!(parse_visible_frame(""), None);
        assert_eq!(parse_visible_frame("900,0,0"), None);
        assert_eq!(parse_visible_frame("900,0,0,wide,800"), None);
        assert_eq!(parse_visible_frame("900,0,0,0,800"), None);
    }

    #[cfg(not(target_os = "macos"))]
    #[test]
    fn overlay_driver_returns_at_once_without_a_window() {
        let (_surface, mut driver) = overlay_surface();
        assert!(!driver.draws());
        let polls = std::cell::Cell::new(0);
        driver.run_while(&|| {
            polls.set(polls.get() + 1);
            true
        });
        assert_eq!(polls.get(), 0);
    }

    #[test]
    fn null_backends_report_nothing() {
        assert!(NullCompositor.windows().is_empty());
        assert_eq!(NullAccessibility.app_pid("com.apple.Terminal", "Terminal"), None);
        assert_eq!(NullAccessibility.windows(1), None);
        assert_eq!(NullScreen.visible_area(), None);
    }
}
