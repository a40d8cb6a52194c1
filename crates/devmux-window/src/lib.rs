//! Window-level navigation for devmux sessions.
//!
//! Finds the terminal window tagged with a session's marker, switches to the
//! virtual desktop it lives on, raises it, and flashes a highlight around it.
//! Also launches terminals and tiles windows to named screen regions.
//!
//! OS access sits behind traits ([`Compositor`], [`Accessibility`],
//! [`SpaceProvider`], [`TerminalApp`], [`ScriptBridge`], [`ScreenGeometry`])
//! so the decision logic is testable without a display.

pub mod error;
pub mod highlight;
pub mod locator;
pub mod navigation;
pub mod overlay;
pub mod platform;
pub mod script;
pub mod spaces;
pub mod terminal;
pub mod tile;
pub mod types;

pub use error::WindowError;
pub use highlight::{HighlightTiming, Highlighter, OVERLAY_OUTSET, OverlaySurface, TracingSurface};
pub use locator::{Accessibility, Compositor, Located, WindowLocator};
pub use navigation::{DEFAULT_SPACE_SETTLE, NavigationEngine, NavigationOutcome};
pub use overlay::{ChannelSurface, OverlayCommand, OverlayState, channel_surface};
pub use platform::{Backends, OverlayDriver, overlay_surface, system_backends};
pub use script::{ScriptBridge, SystemBridge};
pub use spaces::{NullSpaceProvider, RawDisplay, RawSpace, SpaceCoordinator, SpaceProvider};
pub use terminal::{TerminalApp, installed_terminals, terminal_app};
pub use tile::{Bounds, ScreenGeometry, TileOutcome, TilePosition, WindowTiler};
pub use types::{AxWindow, CompositorWindow, DisplaySpaces, SpaceInfo, WindowHandle};
