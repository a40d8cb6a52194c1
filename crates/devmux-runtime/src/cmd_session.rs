//! Session subcommands: attach (default), init, sync, restart, kill, ls, name.

use std::path::Path;
use std::sync::Arc;

use devmux_core::{ConfigSource, PaneSpec, ProjectConfig, init_declaration};
use devmux_session::{AttachOutcome, RestartReport, SyncReport};
use devmux_tmux::{SessionInfo, inside_tmux};

use crate::context::{AppContext, blocking, created_at, tilde_path};

/// `devmux` with no subcommand: create or reattach, then attach the terminal.
pub async fn cmd_attach(ctx: &Arc<AppContext>) -> anyhow::Result<()> {
    ctx.require_tmux()?;
    let config = ctx.project();
    if let Some(note) = describe_source(&config) {
        eprintln!("{note}");
    }

    let in_tmux = inside_tmux();
    let outcome = blocking(ctx, move |ctx| {
        let orch = ctx.orchestrator();
        let outcome = orch.prepare_attach(&config)?;
        eprintln!("{}", describe_attach(&outcome));
        orch.tmux().attach(attach_target(&outcome), in_tmux)?;
        anyhow::Ok(outcome)
    })
    .await??;
    tracing::debug!("attach finished: {outcome:?}");
    Ok(())
}

fn attach_target(outcome: &AttachOutcome) -> &str {
    match outcome {
        AttachOutcome::Created(handle) => &handle.name,
        AttachOutcome::Reattached { name, .. } => name,
    }
}

pub fn cmd_init(ctx: &AppContext) -> anyhow::Result<()> {
    let (path, declaration) = init_declaration(&ctx.project_dir)?;
    println!("wrote {}", tilde_path(&path));
    let panes: Vec<PaneSpec> = declaration.panes.into_iter().map(PaneSpec::from).collect();
    for line in pane_lines(&panes) {
        println!("  {line}");
    }
    Ok(())
}

pub async fn cmd_sync(ctx: &Arc<AppContext>) -> anyhow::Result<()> {
    ctx.require_tmux()?;
    let config = ctx.project();
    let report = blocking(ctx, move |ctx| ctx.orchestrator().sync(&config)).await??;
    if ctx.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        println!("{}", format_sync(&report));
    }
    Ok(())
}

pub async fn cmd_restart(ctx: &Arc<AppContext>, pane: Option<String>) -> anyhow::Result<()> {
    ctx.require_tmux()?;
    let config = ctx.project();
    let report = blocking(ctx, move |ctx| {
        ctx.orchestrator().restart_pane(&config, pane.as_deref())
    })
    .await??;
    if ctx.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        println!("{}", format_restart(&report));
    }
    Ok(())
}

pub async fn cmd_kill(ctx: &Arc<AppContext>, name: Option<String>) -> anyhow::Result<()> {
    ctx.require_tmux()?;
    let session = ctx.session_or_project(name.as_deref());
    let killed = session.clone();
    blocking(ctx, move |ctx| ctx.orchestrator().kill(&killed)).await??;
    println!("killed {session}");
    Ok(())
}

pub async fn cmd_ls(ctx: &Arc<AppContext>) -> anyhow::Result<()> {
    ctx.require_tmux()?;
    let sessions = blocking(ctx, |ctx| ctx.orchestrator().list()).await??;
    if ctx.json {
        println!("{}", serde_json::to_string_pretty(&sessions)?);
        return Ok(());
    }
    let current = ctx.session_for(&ctx.project_dir);
    let output = format_sessions(&sessions, &current);
    if !output.is_empty() {
        println!("{output}");
    }
    Ok(())
}

pub fn cmd_name(ctx: &AppContext, path: Option<&Path>) {
    let dir = path.unwrap_or(&ctx.project_dir);
    println!("{}", ctx.session_for(dir));
}

// ── Formatting ──────────────────────────────────────────────────────────────

/// One line on where the pane list came from, when it was not declared.
pub fn describe_source(config: &ProjectConfig) -> Option<String> {
    match &config.source {
        ConfigSource::Declared => None,
        ConfigSource::Inferred {
            detected: Some(cmd),
        } => Some(format!("no .devmux.json; server pane runs {cmd}")),
        ConfigSource::Inferred { detected: None } => {
            Some("no .devmux.json and no dev script found; server pane left at the shell".into())
        }
        ConfigSource::Fallback { reason } => Some(format!("ignoring .devmux.json ({reason})")),
    }
}

pub fn describe_attach(outcome: &AttachOutcome) -> String {
    match outcome {
        AttachOutcome::Created(handle) => format!(
            "created {} with {} pane{}",
            handle.name,
            handle.pane_ids.len(),
            plural(handle.pane_ids.len())
        ),
        AttachOutcome::Reattached {
            name,
            refilled,
            mode: Some(mode),
        } if !refilled.is_empty() => format!(
            "attaching {name} ({mode}: {} idle pane{} refilled)",
            refilled.len(),
            plural(refilled.len())
        ),
        AttachOutcome::Reattached { name, .. } => format!("attaching {name}"),
    }
}

pub fn format_sync(report: &SyncReport) -> String {
    if report.created_session {
        return format!("{}: session was missing; created it", report.session);
    }
    if report.is_noop() {
        let mut line = format!("{}: in sync", report.session);
        if !report.busy.is_empty() {
            line.push_str(&format!(" ({} busy)", report.busy.len()));
        }
        return line;
    }

    let mut parts = Vec::new();
    if report.panes_added > 0 {
        parts.push(format!(
            "added {} pane{}",
            report.panes_added,
            plural(report.panes_added)
        ));
    }
    if !report.relabelled.is_empty() {
        parts.push(format!("relabelled {}", report.relabelled.len()));
    }
    if !report.submitted.is_empty() {
        parts.push(format!("started {}", report.submitted.len()));
    }
    if !report.busy.is_empty() {
        parts.push(format!("{} busy left alone", report.busy.len()));
    }
    if report.extra_panes > 0 {
        parts.push(format!("{} extra untouched", report.extra_panes));
    }
    format!("{}: {}", report.session, parts.join(", "))
}

pub fn format_restart(report: &RestartReport) -> String {
    let mut out = report.summary();
    if report.escalated {
        out.push_str(&format!(
            " (interrupt ignored; killed {} process{})",
            report.killed.len(),
            if report.killed.len() == 1 { "" } else { "es" }
        ));
    }
    out
}

/// One row per session; the project's own session is starred.
pub fn format_sessions(sessions: &[SessionInfo], current: &str) -> String {
    let width = sessions.iter().map(|s| s.name.len()).max().unwrap_or(0);
    sessions
        .iter()
        .map(|s| {
            let marker = if s.name == current { '*' } else { ' ' };
            let attached = if s.attached > 0 { "attached" } else { "" };
            format!(
                "{marker} {:<width$}  {}w  {}  {attached}",
                s.name,
                s.windows,
                created_at(s.created),
            )
            .trim_end()
            .to_string()
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// `name: cmd` lines for a pane list.
pub fn pane_lines(panes: &[PaneSpec]) -> Vec<String> {
    panes
        .iter()
        .map(|p| match &p.cmd {
            Some(cmd) => format!("{}: {cmd}", p.name),
            None => p.name.clone(),
        })
        .collect()
}

fn plural(n: usize) -> &'static str {
    if n == 1 { "" } else { "s" }
}
