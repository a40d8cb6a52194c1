mod support;

use std::time::Duration;

use devmux_core::{NamingScheme, PaneSpec, load_project};
use devmux_session::{
    AttachOutcome, PollPolicy, RestartPolicy, SessionError, SessionOrchestrator,
};
use support::{FakeProcesses, FakeTmux, NoSleep, claude_and_server, project, three_panes};

fn orchestrator<'a>(
    tmux: &FakeTmux,
    sleeper: &'a NoSleep,
) -> SessionOrchestrator<FakeTmux, FakeProcesses, &'a NoSleep> {
    SessionOrchestrator::new(
        tmux.clone(),
        FakeProcesses::new(tmux),
        sleeper,
        NamingScheme::V2Hashed,
    )
}

// ─── create ──────────────────────────────────────────────────────

#[test]
fn two_pane_declaration_creates_side_by_side_session() {
    let tmux = FakeTmux::new();
    let sleeper = NoSleep::default();
    let orch = orchestrator(&tmux, &sleeper);
    let config = project("/Users/x/app", claude_and_server());

    let handle = orch.create(&config).expect("create");
    assert_eq!(handle.name, "app-432f13");
    assert_eq!(handle.pane_ids.len(), 2);

    let session = tmux.session("app-432f13");
    assert_eq!(session.dir, "/Users/x/app");
    assert_eq!(session.window_name, "app");
    assert_eq!(session.panes[0].title, "claude");
    assert_eq!(session.panes[0].submitted, ["claude"]);
    assert_eq!(session.panes[1].title, "server");
    assert_eq!(session.panes[1].submitted, ["pnpm dev"]);

    let splits: Vec<Vec<String>> = tmux
        .state()
        .calls
        .iter()
        .filter(|c| c[0] == "split-window")
        .cloned()
        .collect();
    assert_eq!(
        splits,
        [["split-window", "-h", "-t", "=app-432f13:", "-c", "/Users/x/app", "-p", "40"]]
    );
    assert_eq!(tmux.count("select-layout"), 0);
    assert!(
        session
            .options
            .contains(&("set-titles-string".to_string(), "[devmux:app-432f13] #{pane_title}".to_string()))
    );
}

#[test]
fn three_panes_use_main_vertical_with_main_width() {
    let tmux = FakeTmux::new();
    let sleeper = NoSleep::default();
    let orch = orchestrator(&tmux, &sleeper);
    let config = project("/home/dev/my project", three_panes());

    let handle = orch.create(&config).expect("create");
    assert_eq!(handle.name, "my-project-aaeeac");

    let session = tmux.session("my-project-aaeeac");
    assert_eq!(session.panes.len(), 3);
    assert_eq!(session.layout.as_deref(), Some("main-vertical"));
    assert!(
        session
            .options
            .contains(&("main-pane-width".to_string(), "65%".to_string()))
    );
    assert_eq!(tmux.count("split-window"), 2);
    assert_eq!(session.panes[2].submitted, ["pnpm test --watch"]);
}

#[test]
fn pane_without_command_is_left_at_shell() {
    let tmux = FakeTmux::new();
    let sleeper = NoSleep::default();
    let orch = orchestrator(&tmux, &sleeper);
    let config = project(
        "/srv/api.v2",
        vec![PaneSpec::new("", None), PaneSpec::new("logs", Some("tail -f log".into()))],
    );

    orch.create(&config).expect("create");
    let session = tmux.session("api-v2-78f75d");
    assert!(session.panes[0].submitted.is_empty());
    assert_eq!(session.panes[0].title, "");
    assert_eq!(session.panes[0].cmd, "zsh");
}

#[test]
fn inferred_project_runs_pnpm_dev() {
    let dir = tempfile::tempdir().expect("tempdir");
    std::fs::write(
        dir.path().join("package.json"),
        r#"{"scripts":{"dev":"vite","start":"node ."}}"#,
    )
    .expect("write");
    std::fs::write(dir.path().join("pnpm-lock.yaml"), "").expect("write");

    let tmux = FakeTmux::new();
    let sleeper = NoSleep::default();
    let orch = orchestrator(&tmux, &sleeper);
    let config = load_project(dir.path());
    let handle = orch.create(&config).expect("create");

    let session = tmux.session(&handle.name);
    assert_eq!(session.panes[1].submitted, ["pnpm dev"]);
}

// ─── attach ──────────────────────────────────────────────────────

#[test]
fn attach_creates_then_reattaches_without_resubmitting() {
    let tmux = FakeTmux::new();
    let sleeper = NoSleep::default();
    let orch = orchestrator(&tmux, &sleeper);
    let config = project("/Users/x/app", claude_and_server());

    let first = orch.attach_or_create(&config, false).expect("attach");
    assert!(matches!(first, AttachOutcome::Created(_)));
    assert_eq!(tmux.count("attach-session"), 1);

    let second = orch.attach_or_create(&config, true).expect("attach");
    assert_eq!(
        second,
        AttachOutcome::Reattached {
            name: "app-432f13".to_string(),
            refilled: Vec::new(),
            mode: None,
        }
    );
    assert_eq!(tmux.count("switch-client"), 1);
    assert_eq!(tmux.count("new-session"), 1);
    assert_eq!(tmux.total_submissions(), 2);
}

#[test]
fn prefill_types_without_running_in_idle_panes() {
    let tmux = FakeTmux::new();
    let sleeper = NoSleep::default();
    let orch = orchestrator(&tmux, &sleeper);
    let mut config = project("/Users/x/app", claude_and_server());
    let handle = orch.create(&config).expect("create");

    // server exited back to the shell; claude still running
    tmux.with_pane(&handle.pane_ids[1], |p| p.cmd = "zsh".into());
    config.prefill = true;

    match orch.prepare_attach(&config).expect("attach") {
        AttachOutcome::Reattached { refilled, mode, .. } => {
            assert_eq!(refilled, [handle.pane_ids[1].clone()]);
            assert_eq!(mode, Some("prefill"));
        }
        other => panic!("expected reattach, got {other:?}"),
    }
    let session = tmux.session("app-432f13");
    assert_eq!(session.panes[1].pending, "pnpm dev");
    assert_eq!(session.panes[1].submitted.len(), 1);
    assert!(session.panes[0].pending.is_empty());
}

#[test]
fn ensure_wins_over_prefill() {
    let tmux = FakeTmux::new();
    let sleeper = NoSleep::default();
    let orch = orchestrator(&tmux, &sleeper);
    let mut config = project("/Users/x/app", claude_and_server());
    let handle = orch.create(&config).expect("create");
    tmux.with_pane(&handle.pane_ids[1], |p| p.cmd = "bash".into());
    config.prefill = true;
    config.ensure = true;

    orch.prepare_attach(&config).expect("attach");
    let session = tmux.session("app-432f13");
    assert_eq!(session.panes[1].submitted, ["pnpm dev", "pnpm dev"]);
    assert_eq!(session.panes[0].submitted, ["claude"]);
}

// ─── sync ────────────────────────────────────────────────────────

#[test]
fn sync_restores_single_missing_pane() {
    let tmux = FakeTmux::new();
    let sleeper = NoSleep::default();
    let orch = orchestrator(&tmux, &sleeper);
    let config = project("/Users/x/app", three_panes());
    orch.create(&config).expect("create");

    tmux.close_pane("app-432f13", 2);
    tmux.clear_calls();
    let before = tmux.total_submissions();

    let report = orch.sync(&config).expect("sync");
    assert_eq!(report.panes_added, 1);
    assert!(report.layout_reapplied);
    assert_eq!(tmux.count("split-window"), 1);
    assert_eq!(tmux.count("select-layout"), 1);

    let session = tmux.session("app-432f13");
    assert_eq!(session.panes.len(), 3);
    assert_eq!(session.panes[2].submitted, ["pnpm test --watch"]);
    assert_eq!(session.panes[2].title, "tests");
    assert_eq!(tmux.total_submissions(), before + 1);
    assert_eq!(report.busy.len(), 2);
}

#[test]
fn second_sync_is_a_noop() {
    let tmux = FakeTmux::new();
    let sleeper = NoSleep::default();
    let orch = orchestrator(&tmux, &sleeper);
    let config = project("/Users/x/app", three_panes());
    orch.create(&config).expect("create");
    tmux.close_pane("app-432f13", 1);

    let first = orch.sync(&config).expect("sync");
    assert!(!first.is_noop());
    let panes = tmux.session("app-432f13").panes.len();
    let submissions = tmux.total_submissions();

    let second = orch.sync(&config).expect("sync");
    assert!(second.is_noop(), "{second:?}");
    assert_eq!(tmux.session("app-432f13").panes.len(), panes);
    assert_eq!(tmux.total_submissions(), submissions);
}

#[test]
fn sync_never_touches_busy_panes() {
    let tmux = FakeTmux::new();
    let sleeper = NoSleep::default();
    let orch = orchestrator(&tmux, &sleeper);
    let config = project("/Users/x/app", claude_and_server());
    let handle = orch.create(&config).expect("create");
    tmux.run_in_pane(&handle.pane_ids[1], "vim");
    tmux.clear_calls();

    let report = orch.sync(&config).expect("sync");
    assert_eq!(report.busy, handle.pane_ids);
    assert!(report.submitted.is_empty());
    assert_eq!(tmux.count("send-keys"), 0);
}

#[test]
fn sync_relabels_and_refills_idle_pane() {
    let tmux = FakeTmux::new();
    let sleeper = NoSleep::default();
    let orch = orchestrator(&tmux, &sleeper);
    let config = project("/Users/x/app", claude_and_server());
    let handle = orch.create(&config).expect("create");
    tmux.with_pane(&handle.pane_ids[1], |p| {
        p.cmd = "-zsh".into();
        p.title = "renamed".into();
    });

    let report = orch.sync(&config).expect("sync");
    assert_eq!(report.relabelled, [handle.pane_ids[1].clone()]);
    assert_eq!(report.submitted, [handle.pane_ids[1].clone()]);
    let pane = &tmux.session("app-432f13").panes[1];
    assert_eq!(pane.title, "server");
    assert_eq!(pane.submitted, ["pnpm dev", "pnpm dev"]);
}

#[test]
fn sync_creates_missing_session() {
    let tmux = FakeTmux::new();
    let sleeper = NoSleep::default();
    let orch = orchestrator(&tmux, &sleeper);
    let config = project("/Users/x/app", three_panes());

    let report = orch.sync(&config).expect("sync");
    assert!(report.created_session);
    assert_eq!(report.panes_added, 2);
    assert_eq!(report.submitted.len(), 3);
}

#[test]
fn sync_leaves_extra_panes_alone() {
    let tmux = FakeTmux::new();
    let sleeper = NoSleep::default();
    let orch = orchestrator(&tmux, &sleeper);
    let config = project("/Users/x/app", claude_and_server());
    orch.create(&config).expect("create");
    tmux.add_stray_pane("app-432f13");

    let report = orch.sync(&config).expect("sync");
    assert_eq!(report.extra_panes, 1);
    assert_eq!(tmux.session("app-432f13").panes[2].submitted.len(), 0);
}

// ─── restart ─────────────────────────────────────────────────────

#[test]
fn restart_stubborn_pane_escalates_exactly_once() {
    let tmux = FakeTmux::new();
    let sleeper = NoSleep::default();
    let orch = orchestrator(&tmux, &sleeper);
    let config = project("/Users/x/app", claude_and_server());
    let handle = orch.create(&config).expect("create");
    let server = handle.pane_ids[1].clone();
    tmux.with_pane(&server, |p| p.ignores_interrupt = true);

    let report = orch.restart_pane(&config, Some("server")).expect("restart");
    assert!(report.was_running);
    assert!(report.interrupted);
    assert!(report.escalated);
    assert!(!report.escalation_ineffective);
    assert_eq!(report.killed.len(), 1);
    assert_eq!(report.resubmitted.as_deref(), Some("pnpm dev"));

    let pane = &tmux.session("app-432f13").panes[1];
    assert_eq!(pane.interrupts, 1);
    assert_eq!(tmux.state().killed.len(), 1);
    assert_eq!(pane.submitted, ["pnpm dev", "pnpm dev"]);
    // waited out the interrupt window, then one interval after the kill
    assert_eq!(sleeper.total(), Duration::from_millis(1_600));
}

#[test]
fn restart_cooperative_pane_needs_no_kill() {
    let tmux = FakeTmux::new();
    let sleeper = NoSleep::default();
    let orch = orchestrator(&tmux, &sleeper);
    let config = project("/Users/x/app", claude_and_server());
    orch.create(&config).expect("create");

    let report = orch.restart_pane(&config, Some("1")).expect("restart");
    assert!(report.interrupted);
    assert!(!report.escalated);
    assert!(tmux.state().killed.is_empty());
    assert_eq!(sleeper.total(), Duration::from_millis(100));
    assert_eq!(report.summary(), "Restarted server: pnpm dev");
}

#[test]
fn restart_idle_pane_skips_interrupt() {
    let tmux = FakeTmux::new();
    let sleeper = NoSleep::default();
    let orch = orchestrator(&tmux, &sleeper);
    let config = project("/Users/x/app", claude_and_server());
    let handle = orch.create(&config).expect("create");
    tmux.with_pane(&handle.pane_ids[0], |p| p.cmd = "zsh".into());

    let report = orch.restart_pane(&config, None).expect("restart");
    assert_eq!(report.label, "claude");
    assert!(!report.was_running);
    assert!(!report.interrupted);
    assert_eq!(tmux.session("app-432f13").panes[0].interrupts, 0);
    assert_eq!(report.resubmitted.as_deref(), Some("claude"));
}

#[test]
fn restart_reports_ineffective_escalation_and_still_resubmits() {
    let tmux = FakeTmux::new();
    let sleeper = NoSleep::default();
    let orch = orchestrator(&tmux, &sleeper).with_restart_policy(RestartPolicy {
        after_interrupt: PollPolicy::new(Duration::from_millis(50), Duration::from_millis(100)),
        after_kill: PollPolicy::new(Duration::from_millis(50), Duration::from_millis(100)),
    });
    let config = project("/Users/x/app", claude_and_server());
    let handle = orch.create(&config).expect("create");
    tmux.with_pane(&handle.pane_ids[1], |p| {
        p.ignores_interrupt = true;
        p.unkillable = true;
    });

    let report = orch.restart_pane(&config, Some("SERVER")).expect("restart");
    assert!(report.escalation_ineffective);
    assert_eq!(report.resubmitted.as_deref(), Some("pnpm dev"));
    assert_eq!(tmux.session("app-432f13").panes[1].interrupts, 1);
    assert_eq!(sleeper.total(), Duration::from_millis(200));
    assert!(report.summary().contains("did not exit"));
}

#[test]
fn restart_unknown_target_has_no_side_effects() {
    let tmux = FakeTmux::new();
    let sleeper = NoSleep::default();
    let orch = orchestrator(&tmux, &sleeper);
    let config = project("/Users/x/app", claude_and_server());
    orch.create(&config).expect("create");
    tmux.clear_calls();

    let err = orch.restart_pane(&config, Some("tests")).expect_err("unknown");
    assert!(matches!(err, SessionError::TargetResolution { .. }));
    assert_eq!(err.to_string(), "unknown pane \"tests\"; valid targets: 0:claude, 1:server");
    assert!(tmux.state().calls.is_empty());
}

#[test]
fn restart_missing_session_is_an_error() {
    let tmux = FakeTmux::new();
    let sleeper = NoSleep::default();
    let orch = orchestrator(&tmux, &sleeper);
    let config = project("/Users/x/app", claude_and_server());

    let err = orch.restart_pane(&config, None).expect_err("no session");
    assert!(matches!(err, SessionError::SessionNotFound(ref n) if n == "app-432f13"));
}

#[test]
fn restart_closed_pane_suggests_sync() {
    let tmux = FakeTmux::new();
    let sleeper = NoSleep::default();
    let orch = orchestrator(&tmux, &sleeper);
    let config = project("/Users/x/app", three_panes());
    orch.create(&config).expect("create");
    tmux.close_pane("app-432f13", 2);

    let err = orch.restart_pane(&config, Some("tests")).expect_err("closed");
    assert!(matches!(err, SessionError::PaneNotLive { index: 2, .. }));
}

// ─── lifecycle ───────────────────────────────────────────────────

#[test]
fn list_kill_and_detach() {
    let tmux = FakeTmux::new();
    let sleeper = NoSleep::default();
    let orch = orchestrator(&tmux, &sleeper);
    assert!(orch.list().expect("list").is_empty());

    let config = project("/Users/x/app", claude_and_server());
    orch.create(&config).expect("create");
    let names: Vec<_> = orch.list().expect("list").into_iter().map(|s| s.name).collect();
    assert_eq!(names, ["app-432f13"]);
    assert!(orch.exists("app-432f13"));

    orch.detach_all("app-432f13").expect("detach");
    orch.kill("app-432f13").expect("kill");
    assert!(!orch.exists("app-432f13"));
    assert!(matches!(
        orch.kill("app-432f13"),
        Err(SessionError::SessionNotFound(_))
    ));
}
