//! devmux-core: pure domain logic shared by every devmux client.
//! Session naming protocol, window tags, pane declarations and inference,
//! layout planning, geometry, user settings, project scanning and bounded
//! polling. No subprocesses, no async.

pub mod config;
pub mod detect;
pub mod error;
pub mod geometry;
pub mod identity;
pub mod layout;
pub mod poll;
pub mod scan;
pub mod settings;
pub mod tag;

pub use config::{
    ConfigSource, DECLARATION_FILE, DEFAULT_MAIN_SIZE, Declaration, DeclaredPane, PaneSpec,
    ProjectConfig, init_declaration, load_project, read_declaration,
};
pub use detect::{DevCommand, PackageManager, detect_dev_command, detect_package_manager};
pub use error::ConfigError;
pub use geometry::{FRAME_TOLERANCE, Rect};
pub use identity::{NamingScheme, absolutize, sanitize, session_name};
pub use layout::{LayoutPlan, MAIN_VERTICAL};
pub use poll::{PollPolicy, Sleeper, ThreadSleeper};
pub use scan::{ProjectSummary, scan_projects};
pub use settings::{Settings, TerminalKind};
pub use tag::{parse_tag, title_format, title_matches, window_tag};
