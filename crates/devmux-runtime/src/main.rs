//! devmux: per-project tmux sessions with window navigation.

use clap::Parser;
use devmux_core::ConfigError;
use devmux_session::SessionError;
use devmux_window::WindowError;

mod cli;
mod cmd_projects;
mod cmd_session;
mod cmd_window;
mod context;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = cli::Cli::parse();
    init_logging(args.verbose);

    // the overlay window belongs to this thread
    let (surface, mut overlay) = devmux_window::overlay_surface();
    let ctx = context::AppContext::from_cli(&args, surface)?;
    let result = match args.command {
        None => cmd_session::cmd_attach(&ctx).await,
        Some(cli::Command::Init) => cmd_session::cmd_init(&ctx),
        Some(cli::Command::Ls) => cmd_session::cmd_ls(&ctx).await,
        Some(cli::Command::Kill(opts)) => cmd_session::cmd_kill(&ctx, opts.name).await,
        Some(cli::Command::Sync) => cmd_session::cmd_sync(&ctx).await,
        Some(cli::Command::Restart(opts)) => cmd_session::cmd_restart(&ctx, opts.pane).await,
        Some(cli::Command::Focus(opts)) => cmd_window::cmd_focus(&ctx, opts, &mut overlay).await,
        Some(cli::Command::Tile(opts)) => {
            cmd_window::cmd_tile(&ctx, &opts.position, opts.session).await
        }
        Some(cli::Command::Spaces) => cmd_window::cmd_spaces(&ctx).await,
        Some(cli::Command::Projects) => cmd_projects::cmd_projects(&ctx).await,
        Some(cli::Command::Name(opts)) => {
            cmd_session::cmd_name(&ctx, opts.path.as_deref());
            Ok(())
        }
        Some(cli::Command::Open(opts)) => cmd_window::cmd_open(&ctx, opts.path).await,
    };

    if let Err(e) = result {
        eprintln!("devmux: {e}");
        let code = exit_code(&e);
        if code != 0 {
            std::process::exit(code);
        }
    }
    Ok(())
}

/// Filter from `DEVMUX_LOG`, then `RUST_LOG`; otherwise `warn`, or `debug`
/// with `--verbose`. Logs go to stderr so command output stays clean.
fn init_logging(verbose: bool) {
    let filter = std::env::var("DEVMUX_LOG")
        .or_else(|_| std::env::var("RUST_LOG"))
        .unwrap_or_else(|_| default_filter(verbose).to_string());
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::new(filter))
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn default_filter(verbose: bool) -> &'static str {
    if verbose { "debug" } else { "warn" }
}

/// Missing tmux is fatal. Domain errors leave state usable and exit 0;
/// anything unexpected exits 1.
fn exit_code(err: &anyhow::Error) -> i32 {
    if let Some(e) = err.downcast_ref::<SessionError>() {
        return match e {
            SessionError::ToolMissing(_) => 1,
            _ => 0,
        };
    }
    if err.downcast_ref::<WindowError>().is_some() || err.downcast_ref::<ConfigError>().is_some() {
        return 0;
    }
    1
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use super::*;

    #[test]
    fn missing_tmux_exits_nonzero() {
        let err = anyhow::Error::from(SessionError::ToolMissing("tmux".into()));
        assert_eq!(exit_code(&err), 1);
    }

    #[test]
    fn domain_errors_exit_zero() {
        let target = anyhow::Error::from(SessionError::TargetResolution {
            target: "db".into(),
            valid: vec!["0:claude".into(), "1:server".into()],
        });
        assert_eq!(exit_code(&target), 0);
        let missing = anyhow::Error::from(SessionError::SessionNotFound("app-432f13".into()));
        assert_eq!(exit_code(&missing), 0);
        let exists = anyhow::Error::from(ConfigError::AlreadyExists(PathBuf::from("/x/.devmux.json")));
        assert_eq!(exit_code(&exists), 0);
        let tile = "diagonal".parse::<devmux_window::TilePosition>().expect_err("unknown");
        assert_eq!(exit_code(&anyhow::Error::from(tile)), 0);
    }

    #[test]
    fn unexpected_errors_exit_one() {
        assert_eq!(exit_code(&anyhow::anyhow!("join failed")), 1);
    }

    #[test]
    fn verbose_raises_default_filter() {
        assert_eq!(default_filter(false), "warn");
        assert_eq!(default_filter(true), "debug");
    }
}
