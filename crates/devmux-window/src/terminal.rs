//! Per-terminal capabilities.
//!
//! Terminal.app and iTerm2 expose their windows to AppleScript, so they can
//! raise and resize a specific tagged window. The others can only be
//! launched and activated.

use std::path::{Path, PathBuf};

use devmux_core::TerminalKind;

use crate::error::WindowError;
use crate::script::{ScriptBridge, applescript_string, script_bool, shell_join, shell_quote};
use crate::tile::Bounds;

const OPEN: &str = "/usr/bin/open";

/// What devmux can ask of a terminal emulator.
pub trait TerminalApp: Send + Sync {
    fn kind(&self) -> TerminalKind;

    fn bundle_id(&self) -> &'static str {
        self.kind().bundle_id()
    }

    fn app_name(&self) -> &'static str {
        self.kind().app_name()
    }

    /// Open a new window running `command` in `dir`.
    fn launch(&self, command: &str, dir: &Path) -> Result<(), WindowError>;

    /// Bring the session's tagged window forward, or open one attached to it.
    fn focus_or_attach(&self, session: &str) -> Result<(), WindowError>;

    /// Raise the window whose title contains `tag` via the scripting bridge.
    /// `false` when the terminal has no bridge or no window matched.
    fn raise_tagged(&self, _tag: &str) -> bool {
        false
    }

    /// Move and resize the tagged window. `false` when unsupported or not found.
    fn set_bounds_tagged(&self, _tag: &str, _bounds: Bounds) -> bool {
        false
    }

    fn activate(&self) -> Result<(), WindowError>;
}

/// Build the [`TerminalApp`] for `kind`. `tmux` is the argv prefix new
/// windows use to reach devmux's server, e.g. `["tmux", "-S", "/tmp/dev.sock"]`.
pub fn terminal_app<B>(kind: TerminalKind, bridge: B, tmux: Vec<String>) -> Box<dyn TerminalApp>
where
    B: ScriptBridge + 'static,
{
    match kind {
        TerminalKind::Terminal | TerminalKind::Iterm2 => Box::new(Scriptable { kind, bridge, tmux }),
        TerminalKind::Warp => Box::new(Warp { bridge }),
        TerminalKind::Ghostty => Box::new(Ghostty { bridge }),
        TerminalKind::Kitty | TerminalKind::Alacritty => Box::new(Bundled { kind, bridge }),
    }
}

/// Application bundle for `kind` in the usual install locations.
pub fn app_bundle(kind: TerminalKind) -> Option<PathBuf> {
    let bundle = match kind {
        TerminalKind::Iterm2 => "iTerm.app".to_string(),
        other => format!("{}.app", other.app_name()),
    };
    let mut roots = vec![
        PathBuf::from("/Applications"),
        PathBuf::from("/System/Applications/Utilities"),
    ];
    if let Some(home) = std::env::var_os("HOME") {
        roots.push(PathBuf::from(home).join("Applications"));
    }
    roots
        .into_iter()
        .map(|root| root.join(&bundle))
        .find(|p| p.is_dir())
}

/// Terminals installed on this machine, in [`TerminalKind::ALL`] order.
pub fn installed_terminals() -> Vec<TerminalKind> {
    TerminalKind::ALL
        .into_iter()
        .filter(|k| app_bundle(*k).is_some())
        .collect()
}

fn activate_app(bridge: &impl ScriptBridge, app: &str) -> Result<(), WindowError> {
    bridge
        .run_script(&format!("tell application {} to activate", applescript_string(app)))
        .map(drop)
}

fn cd_and_run(command: &str, dir: &Path) -> String {
    format!("cd {} && {command}", shell_quote(&dir.to_string_lossy()))
}

fn attach_command(tmux: &[String], session: &str) -> String {
    format!("{} attach -t {}", shell_join(tmux), shell_quote(session))
}

// ─── Terminal.app / iTerm2 ───────────────────────────────────────

struct Scriptable<B> {
    kind: TerminalKind,
    bridge: B,
    tmux: Vec<String>,
}

impl<B: ScriptBridge> Scriptable<B> {
    fn app(&self) -> String {
        applescript_string(self.kind.app_name())
    }

    /// The statement that brings window `w` to the front.
    fn select_window(&self) -> &'static str {
        match self.kind {
            TerminalKind::Iterm2 => "select w",
            _ => "set index of w to 1",
        }
    }

    /// Statements that open a new window running `command`.
    fn new_window(&self, command: &str) -> String {
        let command = applescript_string(command);
        match self.kind {
            TerminalKind::Iterm2 => format!(
                "set newWindow to (create window with default profile)\n\
                 tell current session of newWindow\n\
                 write text {command}\n\
                 end tell"
            ),
            _ => format!("do script {command}"),
        }
    }

    /// Script that runs `action` on the first window whose name contains
    /// `tag` and returns whether one matched; `otherwise` runs when none did.
    fn tagged_window_script(&self, tag: &str, action: &str, otherwise: Option<&str>) -> String {
        let fallback = otherwise
            .map(|s| format!("if not found then\n{s}\nend if\n"))
            .unwrap_or_default();
        format!(
            "tell application {app}\n\
             activate\n\
             set found to false\n\
             repeat with w in windows\n\
             if name of w contains {tag} then\n\
             {action}\n\
             set found to true\n\
             exit repeat\n\
             end if\n\
             end repeat\n\
             {fallback}\
             return found\n\
             end tell",
            app = self.app(),
            tag = applescript_string(tag),
        )
    }
}

impl<B: ScriptBridge> TerminalApp for Scriptable<B> {
    fn kind(&self) -> TerminalKind {
        self.kind
    }

    fn launch(&self, command: &str, dir: &Path) -> Result<(), WindowError> {
        let script = format!(
            "tell application {}\nactivate\n{}\nend tell",
            self.app(),
            self.new_window(&cd_and_run(command, dir))
        );
        self.bridge.run_script(&script).map(drop)
    }

    fn focus_or_attach(&self, session: &str) -> Result<(), WindowError> {
        let tag = devmux_core::window_tag(session);
        let script = self.tagged_window_script(
            &tag,
            self.select_window(),
            Some(&self.new_window(&attach_command(&self.tmux, session))),
        );
        self.bridge.run_script(&script).map(drop)
    }

    fn raise_tagged(&self, tag: &str) -> bool {
        let script = self.tagged_window_script(tag, self.select_window(), None);
        match self.bridge.run_script(&script) {
            Ok(out) => script_bool(&out),
            Err(e) => {
                tracing::debug!("{} raise script failed: {e}", self.kind);
                false
            }
        }
    }

    fn set_bounds_tagged(&self, tag: &str, bounds: Bounds) -> bool {
        let action = format!(
            "set bounds of w to {{{}, {}, {}, {}}}\nset index of w to 1",
            bounds.left, bounds.top, bounds.right, bounds.bottom
        );
        let script = self.tagged_window_script(tag, &action, None);
        match self.bridge.run_script(&script) {
            Ok(out) => script_bool(&out),
            Err(e) => {
                tracing::debug!("{} bounds script failed: {e}", self.kind);
                false
            }
        }
    }

    fn activate(&self) -> Result<(), WindowError> {
        activate_app(&self.bridge, self.kind.app_name())
    }
}

// ─── Warp ────────────────────────────────────────────────────────

struct Warp<B> {
    bridge: B,
}

impl<B: ScriptBridge> TerminalApp for Warp<B> {
    fn kind(&self) -> TerminalKind {
        TerminalKind::Warp
    }

    /// Warp has no scripting dictionary: open it on the directory, then type
    /// the command through System Events once the window is up.
    fn launch(&self, command: &str, dir: &Path) -> Result<(), WindowError> {
        let dir = dir.to_string_lossy();
        self.bridge.spawn(OPEN, &["-a", "Warp", dir.as_ref()], &[])?;
        let script = format!(
            "delay 1\n\
             tell application \"System Events\"\n\
             tell process \"Warp\"\n\
             keystroke {}\n\
             keystroke return\n\
             end tell\n\
             end tell",
            applescript_string(command)
        );
        self.bridge.run_script(&script).map(drop)
    }

    fn focus_or_attach(&self, _session: &str) -> Result<(), WindowError> {
        self.bridge.spawn(OPEN, &["-a", "Warp"], &[])
    }

    fn activate(&self) -> Result<(), WindowError> {
        activate_app(&self.bridge, "Warp")
    }
}

// ─── Ghostty ─────────────────────────────────────────────────────

struct Ghostty<B> {
    bridge: B,
}

impl<B: ScriptBridge> TerminalApp for Ghostty<B> {
    fn kind(&self) -> TerminalKind {
        TerminalKind::Ghostty
    }

    fn launch(&self, command: &str, dir: &Path) -> Result<(), WindowError> {
        let full = cd_and_run(command, dir);
        self.bridge.spawn(
            OPEN,
            &["-na", "Ghostty", "--args", "-e", "sh", "-c", full.as_str()],
            &[],
        )
    }

    fn focus_or_attach(&self, _session: &str) -> Result<(), WindowError> {
        self.bridge.spawn(OPEN, &["-a", "Ghostty"], &[])
    }

    fn activate(&self) -> Result<(), WindowError> {
        activate_app(&self.bridge, "Ghostty")
    }
}

// ─── Kitty / Alacritty ───────────────────────────────────────────

/// Terminals launched by running the binary inside their app bundle.
struct Bundled<B> {
    kind: TerminalKind,
    bridge: B,
}

impl<B: ScriptBridge> Bundled<B> {
    fn binary(&self) -> Result<PathBuf, WindowError> {
        let exe = match self.kind {
            TerminalKind::Kitty => "kitty",
            _ => "alacritty",
        };
        app_bundle(self.kind)
            .map(|b| b.join("Contents/MacOS").join(exe))
            .ok_or_else(|| WindowError::AppNotInstalled(self.kind.app_name().to_string()))
    }
}

/// Arguments that start `command` in `dir` for a bundled terminal binary.
fn bundled_args<'a>(kind: TerminalKind, command: &'a str, dir: &'a str) -> Vec<&'a str> {
    match kind {
        TerminalKind::Kitty => vec!["--single-instance", "--directory", dir, "sh", "-c", command],
        _ => vec!["--working-directory", dir, "-e", "sh", "-c", command],
    }
}

impl<B: ScriptBridge> TerminalApp for Bundled<B> {
    fn kind(&self) -> TerminalKind {
        self.kind
    }

    fn launch(&self, command: &str, dir: &Path) -> Result<(), WindowError> {
        let bin = self.binary()?;
        let dir = dir.to_string_lossy();
        self.bridge.spawn(
            &bin.to_string_lossy(),
            &bundled_args(self.kind, command, &dir),
            &[],
        )
    }

    fn focus_or_attach(&self, _session: &str) -> Result<(), WindowError> {
        self.bridge
            .spawn(OPEN, &["-a", self.kind.app_name()], &[])
    }

    fn activate(&self) -> Result<(), WindowError> {
        activate_app(&self.bridge, self.kind.app_name())
    }
}
