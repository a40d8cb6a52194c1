//! Window subcommands: focus, tile, spaces, open.

use std::path::PathBuf;
use std::sync::Arc;

use devmux_window::script::shell_join;
use devmux_window::{DisplaySpaces, NavigationOutcome, OverlayDriver, TileOutcome, TilePosition};

use crate::cli::FocusOpts;
use crate::context::{AppContext, blocking, tilde_path};

pub async fn cmd_focus(
    ctx: &Arc<AppContext>,
    opts: FocusOpts,
    overlay: &mut OverlayDriver,
) -> anyhow::Result<()> {
    let session = ctx.session_or_project(opts.session.as_deref());

    if opts.highlight_only {
        let target = session.clone();
        let shown = blocking(ctx, move |ctx| ctx.navigation().highlight_session(&target)).await?;
        if !shown {
            println!("no window found for {session}");
        }
        show_overlay(ctx, overlay).await;
        return Ok(());
    }

    let target = session.clone();
    let outcome = blocking(ctx, move |ctx| ctx.navigation().navigate_to_window(&target)).await?;
    println!("{}", outcome.describe());

    if outcome == NavigationOutcome::NotFound {
        if session_running(ctx, &session).await? {
            println!("opening a {} window attached to {session}", ctx.terminal().kind());
            let target = session.clone();
            blocking(ctx, move |ctx| ctx.terminal().focus_or_attach(&target)).await??;
        }
    }

    show_overlay(ctx, overlay).await;
    Ok(())
}

/// Draw the flash on this thread, then keep the process alive until the
/// highlight task has dismissed it.
async fn show_overlay(ctx: &Arc<AppContext>, overlay: &mut OverlayDriver) {
    if overlay.draws() {
        tokio::task::block_in_place(|| overlay.run_while(&|| ctx.highlighter().is_flashing()));
    }
    ctx.highlighter().settled().await;
}

pub async fn cmd_tile(
    ctx: &Arc<AppContext>,
    position: &str,
    session: Option<String>,
) -> anyhow::Result<()> {
    let position: TilePosition = position.parse()?;
    let session = ctx.session_or_project(session.as_deref());
    let outcome = blocking(ctx, move |ctx| ctx.tiler().tile(&session, position)).await??;
    println!("{}", describe_tile(position, &outcome));
    Ok(())
}

pub async fn cmd_spaces(ctx: &Arc<AppContext>) -> anyhow::Result<()> {
    let (available, displays) = blocking(ctx, |ctx| {
        let spaces = &ctx.backends().spaces;
        (spaces.available(), spaces.displays())
    })
    .await?;

    if ctx.json {
        println!("{}", serde_json::to_string_pretty(&displays)?);
    } else if !available {
        println!("desktop control unavailable on this system");
    } else {
        println!("{}", format_spaces(&displays));
    }
    Ok(())
}

/// Open the project in the configured terminal. An existing session gets its
/// window raised (or a new one attached); otherwise the terminal starts
/// devmux in the project directory.
pub async fn cmd_open(ctx: &Arc<AppContext>, path: Option<PathBuf>) -> anyhow::Result<()> {
    let dir = path.unwrap_or_else(|| ctx.project_dir.clone());
    let session = ctx.session_for(&dir);
    let running = session_running(ctx, &session).await?;

    let kind = ctx.terminal().kind();
    if running {
        println!("focusing {session} in {kind}");
        blocking(ctx, move |ctx| ctx.terminal().focus_or_attach(&session)).await??;
    } else {
        println!("starting {session} in {kind} at {}", tilde_path(&dir));
        let exe = std::env::current_exe()
            .map(|p| p.to_string_lossy().into_owned())
            .map_err(|e| tracing::debug!("current_exe unavailable: {e}"))
            .ok();
        let command = devmux_command(exe, &ctx.relaunch_flags);
        blocking(ctx, move |ctx| ctx.terminal().launch(&command, &dir)).await??;
    }
    Ok(())
}

async fn session_running(ctx: &Arc<AppContext>, session: &str) -> anyhow::Result<bool> {
    let session = session.to_string();
    blocking(ctx, move |ctx| {
        ctx.require_tmux().is_ok() && ctx.orchestrator().exists(&session)
    })
    .await
}

/// Shell command that re-runs this binary with the same server and config
/// flags, falling back to `devmux` on PATH.
fn devmux_command(exe: Option<String>, flags: &[String]) -> String {
    let mut words = vec![exe.unwrap_or_else(|| "devmux".to_string())];
    words.extend(flags.iter().cloned());
    shell_join(&words)
}

// ── Formatting ──────────────────────────────────────────────────────────────

pub fn describe_tile(position: TilePosition, outcome: &TileOutcome) -> String {
    match outcome {
        TileOutcome::Tagged(b) => format!(
            "tiled to {position}: {{{}, {}, {}, {}}}",
            b.left, b.top, b.right, b.bottom
        ),
        TileOutcome::Frontmost(b) => format!(
            "session window not addressable; tiled the frontmost window to {position}: {{{}, {}, {}, {}}}",
            b.left, b.top, b.right, b.bottom
        ),
    }
}

/// `Display 1: [1] 2 4` style, current desktop bracketed.
pub fn format_spaces(displays: &[DisplaySpaces]) -> String {
    if displays.is_empty() {
        return "no desktops reported".to_string();
    }
    displays
        .iter()
        .map(|d| {
            let spaces = d
                .spaces
                .iter()
                .map(|s| {
                    if s.is_current {
                        format!("[{}]", s.index)
                    } else {
                        s.index.to_string()
                    }
                })
                .collect::<Vec<_>>()
                .join(" ");
            format!("Display {}: {spaces}", d.display_index + 1)
        })
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use devmux_window::{Bounds, SpaceInfo};

    use super::*;

    #[test]
    fn spaces_bracket_current() {
        let displays = vec![
            DisplaySpaces {
                display_index: 0,
                display_id: "main".into(),
                current_space_id: 11,
                spaces: vec![
                    SpaceInfo {
                        id: 11,
                        index: 1,
                        display: 0,
                        is_current: true,
                    },
                    SpaceInfo {
                        id: 13,
                        index: 3,
                        display: 0,
                        is_current: false,
                    },
                ],
            },
            DisplaySpaces {
                display_index: 1,
                display_id: "side".into(),
                current_space_id: 21,
                spaces: vec![SpaceInfo {
                    id: 21,
                    index: 1,
                    display: 1,
                    is_current: true,
                }],
            },
        ];
        assert_eq!(format_spaces(&displays), "Display 1: [1] 3\nDisplay 2: [1]");
        assert_eq!(format_spaces(&[]), "no desktops reported");
    }

    #[test]
    fn relaunch_command_carries_flags() {
        let flags = vec!["--tmux-socket".to_string(), "/tmp/dev sock".to_string()];
        assert_eq!(
            devmux_command(Some("/opt/devmux/bin/devmux".into()), &flags),
            "/opt/devmux/bin/devmux --tmux-socket '/tmp/dev sock'"
        );
        assert_eq!(devmux_command(None, &[]), "devmux");
    }

    #[test]
    fn tile_descriptions() {
        let b = Bounds {
            left: 0,
            top: 25,
            right: 720,
            bottom: 900,
        };
        assert_eq!(
            describe_tile(TilePosition::Left, &TileOutcome::Tagged(b)),
            "tiled to left: {0, 25, 720, 900}"
        );
        assert!(describe_tile(TilePosition::Left, &TileOutcome::Frontmost(b)).contains("frontmost"));
    }
}
