mod common;

use std::fs;
use std::time::Duration;

use tokio::sync::mpsc;

use common::{controller, ScriptedProcess, TenantTree};
use multi_caddy::config::{RuleConfig, SyncConfig};
use multi_caddy::daemon::{Regenerator, ServerState, StatusHandle};
use multi_caddy::lifecycle::Shutdown;
use multi_caddy::reload::ReloadOutcome;
use multi_caddy::synthesis::RuleSet;
use multi_caddy::watch::{pulse, WatchController, WatchSet};
use multi_caddy::Daemon;

fn rule_config(tree: &TenantTree) -> RuleConfig {
    RuleConfig {
        source: tree.source("sites"),
        pattern: "example.com:@1.internal".into(),
        default_template: None,
    }
}

fn ruleset(tree: &TenantTree) -> RuleSet {
    RuleSet::from_configs(&[rule_config(tree)]).unwrap()
}

#[tokio::test]
async fn test_passes_publish_status() {
    let tree = TenantTree::new();
    let alpha = tree.tenant("sites", "alpha", Some("example.com {\n  gzip\n}\n"));
    let work = tempfile::tempdir().unwrap();

    let (sets_tx, mut sets_rx) = mpsc::unbounded_channel();
    let status = StatusHandle::new();
    let reload = controller(work.path(), ScriptedProcess::new(work.path().join("caddy.log")));
    let mut regen = Regenerator::new(ruleset(&tree), reload, sets_tx, status.clone());

    assert_eq!(regen.run_pass().await, Some(ReloadOutcome::Started));
    let snapshot = status.snapshot();
    assert_eq!(snapshot.server, ServerState::Running);
    assert_eq!(snapshot.passes, 1);
    assert_eq!(snapshot.generation, 1);
    assert_eq!(snapshot.tenants, 1);
    assert_eq!(snapshot.last_outcome, Some(ReloadOutcome::Started));
    assert!(status.committed().starts_with("alpha.internal {\n"));

    let watched = sets_rx.try_recv().unwrap();
    assert!(watched.contains(&alpha));
    assert!(watched.contains(&alpha.join("Caddyfile")));

    // Nothing changed: no reload, outcome of the last activation kept.
    assert_eq!(regen.run_pass().await, None);
    let snapshot = status.snapshot();
    assert_eq!(snapshot.passes, 2);
    assert_eq!(snapshot.generation, 1);
    assert_eq!(snapshot.last_outcome, Some(ReloadOutcome::Started));

    fs::write(alpha.join("Caddyfile"), "example.com {\n  log stdout\n}\n").unwrap();
    assert_eq!(regen.run_pass().await, Some(ReloadOutcome::ReloadConfirmed));
    assert_eq!(status.snapshot().generation, 2);
    assert!(status.committed().contains("log stdout"));
    assert_eq!(regen.reload().process().signals, 1);
}

#[tokio::test]
async fn test_restored_aggregate_is_started_first() {
    let tree = TenantTree::new();
    tree.tenant("sites", "alpha", Some("example.com {\n}\n"));
    let work = tempfile::tempdir().unwrap();

    let (sets_tx, _sets_rx) = mpsc::unbounded_channel();
    let reload = controller(work.path(), ScriptedProcess::new(work.path().join("caddy.log")));
    let mut regen = Regenerator::new(ruleset(&tree), reload, sets_tx, StatusHandle::new());

    let persisted = "old.internal {\n    root /gone\n}\n".to_string();
    assert_eq!(
        regen.restore(persisted.clone()).await,
        Some(ReloadOutcome::Started)
    );
    assert_eq!(regen.reload().process().seen, [persisted]);

    assert_eq!(regen.run_pass().await, Some(ReloadOutcome::ReloadConfirmed));
    assert_eq!(regen.reload().process().starts, 1);
}

#[tokio::test]
async fn test_burst_of_triggers_runs_once() {
    let tree = TenantTree::new();
    tree.tenant("sites", "alpha", Some("example.com {\n}\n"));
    let work = tempfile::tempdir().unwrap();

    let (pulse_tx, pulse_rx) = pulse::channel();
    let (sets_tx, _sets_rx) = mpsc::unbounded_channel();
    let status = StatusHandle::new();
    let reload = controller(work.path(), ScriptedProcess::new(work.path().join("caddy.log")));
    let regen = Regenerator::new(ruleset(&tree), reload, sets_tx, status.clone());

    assert!(pulse_tx.trigger());
    assert!(!pulse_tx.trigger());
    assert!(!pulse_tx.trigger());

    let shutdown = Shutdown::new();
    let task = tokio::spawn(regen.run(pulse_rx, shutdown.subscribe()));

    tokio::time::timeout(Duration::from_secs(5), async {
        while status.snapshot().passes == 0 {
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    })
    .await
    .expect("first pass");
    tokio::time::sleep(Duration::from_millis(100)).await;
    assert_eq!(status.snapshot().passes, 1);

    shutdown.trigger();
    tokio::time::timeout(Duration::from_secs(5), task)
        .await
        .expect("regenerator exits on shutdown")
        .unwrap();
}

#[tokio::test]
async fn test_fragment_change_pulses() {
    let tree = TenantTree::new();
    let alpha = tree.tenant("sites", "alpha", Some("example.com {\n}\n"));
    let fragment = alpha.join("Caddyfile");

    let (pulse_tx, mut pulse_rx) = pulse::channel();
    let (sets_tx, sets_rx) = mpsc::unbounded_channel();
    let shutdown = Shutdown::new();
    let task = tokio::spawn(WatchController::new(pulse_tx, sets_rx).run(shutdown.subscribe()));

    let set: WatchSet = [alpha.clone(), fragment.clone()].into_iter().collect();
    sets_tx.send(set).unwrap();
    tokio::time::sleep(Duration::from_millis(200)).await;
    while pulse_rx.try_recv() {}

    fs::write(&fragment, "example.com {\n  gzip\n}\n").unwrap();
    let pulse = tokio::time::timeout(Duration::from_secs(5), pulse_rx.recv())
        .await
        .expect("pulse after fragment write");
    assert_eq!(pulse, Some(()));

    shutdown.trigger();
    tokio::time::timeout(Duration::from_secs(5), task)
        .await
        .expect("watcher exits on shutdown")
        .unwrap();
}

#[test]
fn test_check_renders_without_side_effects() {
    let tree = TenantTree::new();
    tree.tenant("sites", "alpha", Some("example.com {\n}\n"));
    let work = tempfile::tempdir().unwrap();

    let mut config = SyncConfig::default();
    config.rules.push(rule_config(&tree));
    config.output.aggregate_path = work.path().join("caddy.txt");

    let daemon = Daemon::new(config).unwrap();
    let text = daemon.render();

    assert_eq!(text, ruleset(&tree).synthesize().text);
    assert!(!work.path().join("caddy.txt").exists());
}
