//! CLI definition using clap derive.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(
    name = "devmux",
    version,
    about = "Per-project tmux sessions, one command away",
    long_about = "Run with no subcommand to create or reattach the session for the current \
                  directory. Panes come from .devmux.json, or are inferred from the project."
)]
pub struct Cli {
    /// Settings file (default: ~/.config/devmux/config.toml)
    #[arg(long, global = true, env = "DEVMUX_CONFIG")]
    pub config: Option<PathBuf>,

    /// tmux server socket path (tmux -S)
    #[arg(long, global = true, env = "DEVMUX_TMUX_SOCKET")]
    pub tmux_socket: Option<String>,

    /// Debug logging to stderr
    #[arg(long, short = 'v', global = true)]
    pub verbose: bool,

    /// Project directory (default: current directory)
    #[arg(short = 'C', long = "dir", global = true)]
    pub dir: Option<PathBuf>,

    /// Machine-readable output where supported
    #[arg(long, global = true)]
    pub json: bool,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Subcommand)]
pub enum Command {
    /// Write a starter .devmux.json for the project
    Init,
    /// List running tmux sessions
    Ls,
    /// Kill a session (default: the project's session)
    Kill(KillOpts),
    /// Reconcile the live session with the project's panes
    Sync,
    /// Restart one pane: interrupt, kill if needed, rerun its command
    Restart(RestartOpts),
    /// Bring a session's terminal window into view
    Focus(FocusOpts),
    /// Move the session's window to a screen region
    Tile(TileOpts),
    /// Show virtual desktops per display
    Spaces,
    /// List projects under the scan root
    Projects,
    /// Print the session name for a directory
    Name(NameOpts),
    /// Open the project in the configured terminal
    Open(OpenOpts),
}

#[derive(clap::Args)]
pub struct KillOpts {
    /// Session name
    pub name: Option<String>,
}

#[derive(clap::Args)]
pub struct RestartOpts {
    /// Pane name or 0-based index (default: first pane)
    pub pane: Option<String>,
}

#[derive(clap::Args)]
pub struct FocusOpts {
    /// Session name (default: the project's session)
    pub session: Option<String>,

    /// Only flash the highlight; do not raise or switch desktops
    #[arg(long)]
    pub highlight_only: bool,
}

#[derive(clap::Args)]
pub struct TileOpts {
    /// left, right, top, bottom, top-left, top-right, bottom-left,
    /// bottom-right, maximize, center
    pub position: String,

    /// Session name (default: the project's session)
    #[arg(long, short = 's')]
    pub session: Option<String>,
}

#[derive(clap::Args)]
pub struct NameOpts {
    /// Directory (default: the project directory)
    pub path: Option<PathBuf>,
}

#[derive(clap::Args)]
pub struct OpenOpts {
    /// Directory (default: the project directory)
    pub path: Option<PathBuf>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn no_subcommand_means_attach() {
        let cli = Cli::try_parse_from(["devmux"]).expect("parse");
        assert!(cli.command.is_none());
        assert!(!cli.verbose);
    }

    #[test]
    fn global_flags_after_subcommand() {
        let cli = Cli::try_parse_from(["devmux", "restart", "server", "-C", "/srv/api", "-v"])
            .expect("parse");
        assert_eq!(cli.dir.as_deref(), Some(std::path::Path::new("/srv/api")));
        assert!(cli.verbose);
        match cli.command {
            Some(Command::Restart(opts)) => assert_eq!(opts.pane.as_deref(), Some("server")),
            _ => panic!("expected restart"),
        }
    }

    #[test]
    fn tile_requires_position() {
        assert!(Cli::try_parse_from(["devmux", "tile"]).is_err());
        let cli = Cli::try_parse_from(["devmux", "tile", "left", "-s", "app-432f13"]).expect("parse");
        match cli.command {
            Some(Command::Tile(opts)) => {
                assert_eq!(opts.position, "left");
                assert_eq!(opts.session.as_deref(), Some("app-432f13"));
            }
            _ => panic!("expected tile"),
        }
    }

    #[test]
    fn kill_name_is_optional() {
        let cli = Cli::try_parse_from(["devmux", "kill"]).expect("parse");
        assert!(matches!(cli.command, Some(Command::Kill(KillOpts { name: None }))));
    }
}
