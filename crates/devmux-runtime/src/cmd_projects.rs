//! `devmux projects`: project directories under the scan root.

use std::collections::HashSet;
use std::sync::Arc;

use devmux_core::{ProjectSummary, scan_projects};

use crate::context::{AppContext, blocking, tilde_path};

pub async fn cmd_projects(ctx: &Arc<AppContext>) -> anyhow::Result<()> {
    let root = ctx.settings.resolved_scan_root();
    let scan_root = root.clone();
    let projects = blocking(ctx, move |ctx| {
        // tmux absent or no server: nothing is running
        let running: HashSet<String> = match ctx.require_tmux() {
            Ok(()) => ctx
                .orchestrator()
                .list()
                .map(|sessions| sessions.into_iter().map(|s| s.name).collect())
                .unwrap_or_default(),
            Err(e) => {
                tracing::debug!("{e}");
                HashSet::new()
            }
        };
        scan_projects(&scan_root, ctx.settings.naming_scheme, |name| {
            running.contains(name)
        })
    })
    .await?;

    if ctx.json {
        println!("{}", serde_json::to_string_pretty(&projects)?);
    } else if projects.is_empty() {
        println!("no projects under {}", tilde_path(&root));
    } else {
        println!("{}", format_projects(&projects));
    }
    Ok(())
}

/// `● name  session  panes  dev-command`, running projects marked.
pub fn format_projects(projects: &[ProjectSummary]) -> String {
    let name_w = projects.iter().map(|p| p.name.len()).max().unwrap_or(0);
    let session_w = projects
        .iter()
        .map(|p| p.session_name.len())
        .max()
        .unwrap_or(0);
    projects
        .iter()
        .map(|p| {
            let marker = if p.running { '●' } else { ' ' };
            let declared = if p.has_declaration { "" } else { " (inferred)" };
            let cmd = p.dev_command.as_deref().unwrap_or("-");
            format!(
                "{marker} {:<name_w$}  {:<session_w$}  {}{declared}  {cmd}",
                p.name,
                p.session_name,
                p.pane_summary(),
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use super::*;

    fn summary(name: &str, session: &str, running: bool, declared: bool) -> ProjectSummary {
        ProjectSummary {
            name: name.into(),
            path: PathBuf::from("/dev").join(name),
            session_name: session.into(),
            dev_command: Some("pnpm dev".into()),
            package_manager: Some("pnpm".into()),
            has_declaration: declared,
            pane_names: vec!["claude".into(), "server".into()],
            running,
        }
    }

    #[test]
    fn running_projects_marked() {
        let out = format_projects(&[
            summary("app", "app-432f13", true, true),
            summary("api.v2", "api-v2-78f75d", false, false),
        ]);
        let lines: Vec<_> = out.lines().collect();
        assert_eq!(
            lines[0],
            "● app     app-432f13     claude + server  pnpm dev"
        );
        assert_eq!(
            lines[1],
            "  api.v2  api-v2-78f75d  claude + server (inferred)  pnpm dev"
        );
    }
}
