//! Integration tests driving the whole engine: a real source on disk (or a
//! real child process), the in-memory shell and a recording opener.

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use pretty_assertions::assert_eq;

use levelbar_engine::{
    Config, Correlation, Engine, EngineSettings, FileSource, MemoryShell, RecordingOpener,
    RenderSettings, ShellOp, SourceConfig, SourceFormat,
};

const BASE_URL: &str = "https://helpdesk.example/staff/index.php?";

const PRINTER_JAM: &str = r#"{
    "total": 5,
    "levels": [
        {"level": "Open", "value": 5, "details": [{"id": 1, "subject": "Printer jam"}]}
    ]
}"#;

const THREE_LEVELS: &str = r#"{
    "total": 6,
    "levels": [
        {"level": "Open", "value": 3},
        {"level": "Waiting", "value": 2},
        {"level": "Closed", "value": 1}
    ]
}"#;

const ONE_LEVEL: &str = r#"{"total": 4, "levels": [{"level": "Open", "value": 4}]}"#;

/// Engine reading snapshots from a file the test rewrites between cycles.
struct Harness {
    engine: Engine<MemoryShell>,
    shell: MemoryShell,
    opener: RecordingOpener,
    _dir: tempfile::TempDir,
    path: std::path::PathBuf,
}

impl Harness {
    fn new(initial: &str) -> Self {
        Self::with_interval(initial, Duration::from_secs(180))
    }

    fn with_interval(initial: &str, poll_interval: Duration) -> Self {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("levels.json");
        write(&path, initial);

        let shell = MemoryShell::new();
        let opener = RecordingOpener::new();
        let settings = EngineSettings {
            poll_interval,
            format: SourceFormat::Snapshot,
            render: RenderSettings {
                max_subject_length: 45,
                resource_base_url: BASE_URL.to_string(),
                correlation: Correlation::Positional,
            },
        };
        let engine = Engine::new(
            settings,
            Arc::new(FileSource::new(path.to_str().unwrap())),
            shell.clone(),
            Arc::new(opener.clone()),
        )
        .unwrap();

        Self { engine, shell, opener, _dir: dir, path }
    }

    fn publish(&self, body: &str) {
        write(&self.path, body);
    }
}

fn write(path: &Path, body: &str) {
    std::fs::write(path, body).unwrap();
}

#[tokio::test]
async fn test_printer_jam_scenario() {
    let mut h = Harness::new(PRINTER_JAM);
    h.engine.start().await;

    assert_eq!(h.shell.total_label(), "5");
    let categories = h.shell.categories();
    assert_eq!(categories.len(), 1);
    assert_eq!(categories[0].label, "Open");
    assert_eq!(categories[0].value, "5");
    assert_eq!(categories[0].details.len(), 1);
    assert_eq!(categories[0].details[0].label, "Printer jam");

    assert!(h.shell.activate_detail(0));
    assert_eq!(
        h.opener.opened(),
        vec![format!("{BASE_URL}/Tickets/Ticket/View/1")]
    );
    assert!(!h.shell.activate_detail(1));

    h.engine.stop().await;
}

#[tokio::test]
async fn test_shrink_from_three_levels_to_one() {
    let h = Harness::new(THREE_LEVELS);
    h.engine.refresh().await;
    assert_eq!(h.shell.categories().len(), 3);
    h.shell.take_journal();

    h.publish(ONE_LEVEL);
    let report = h.engine.refresh().await;
    assert_eq!(report.destroyed, 2);
    assert_eq!(report.created, 0);

    let journal = h.shell.take_journal();
    let destroys = journal.iter().filter(|op| matches!(op, ShellOp::Destroy(_))).count();
    assert_eq!(destroys, 2);

    assert_eq!(h.engine.rendered(), vec![("Open".to_string(), 4)]);
    assert_eq!(h.shell.categories()[0].value, "4");
    assert_eq!(h.shell.total_label(), "4");
}

#[tokio::test]
async fn test_malformed_output_clears_menu() {
    let h = Harness::new(THREE_LEVELS);
    h.engine.refresh().await;
    assert_eq!(h.shell.categories().len(), 3);

    h.publish("{\"total\": 6, \"levels\": [");
    let report = h.engine.refresh().await;
    assert_eq!(report.destroyed, 3);
    assert!(h.shell.categories().is_empty());
    assert_eq!(h.shell.total_label(), "0");

    // Recovery is just the next good snapshot.
    h.publish(PRINTER_JAM);
    h.engine.refresh().await;
    assert_eq!(h.shell.categories().len(), 1);
}

#[tokio::test]
async fn test_missing_source_file_is_zero_snapshot() {
    let h = Harness::new(ONE_LEVEL);
    h.engine.refresh().await;

    std::fs::remove_file(&h.path).unwrap();
    h.engine.refresh().await;
    assert!(h.engine.rendered().is_empty());
    assert_eq!(h.shell.total_label(), "0");
}

#[tokio::test]
async fn test_unchanged_snapshot_is_quiet() {
    let h = Harness::new(PRINTER_JAM);
    h.engine.refresh().await;
    h.shell.take_journal();

    let report = h.engine.refresh().await;
    assert!(report.is_noop());
    assert_eq!(
        h.shell.take_journal(),
        vec![ShellOp::SetTotal("5".to_string()), ShellOp::Present]
    );
}

#[tokio::test(start_paused = true)]
async fn test_no_cycle_after_stop() {
    let mut h = Harness::with_interval(ONE_LEVEL, Duration::from_secs(5));
    h.engine.start().await;
    h.engine.stop().await;
    assert!(h.shell.categories().is_empty());
    h.shell.take_journal();

    h.publish(THREE_LEVELS);
    tokio::time::sleep(Duration::from_secs(60)).await;
    assert!(h.shell.take_journal().is_empty());
    assert!(h.shell.categories().is_empty());
}

#[cfg(unix)]
#[tokio::test]
async fn test_engine_from_config_runs_command() {
    let config = Config {
        source: SourceConfig::Command {
            program: "sh".to_string(),
            args: vec![
                "-c".to_string(),
                r#"printf '[{"id": "7", "subject": "Refund", "departmenttitle": "Billing"}]'"#
                    .to_string(),
            ],
            env: Default::default(),
            cwd: None,
        },
        format: SourceFormat::Tickets,
        resource_base_url: BASE_URL.to_string(),
        ..Config::default()
    };
    let shell = MemoryShell::new();
    let opener = RecordingOpener::new();
    let mut engine = Engine::from_config(&config, shell.clone(), Arc::new(opener.clone())).unwrap();

    engine.start().await;
    assert_eq!(engine.rendered(), vec![("Billing".to_string(), 1)]);
    assert_eq!(shell.total_label(), "1");

    assert!(shell.activate_detail(0));
    assert_eq!(
        opener.opened(),
        vec![format!("{BASE_URL}/Tickets/Ticket/View/7")]
    );

    engine.stop().await;
    assert!(shell.categories().is_empty());
}

#[cfg(unix)]
#[tokio::test]
async fn test_failing_command_shows_zero() {
    let config = Config {
        source: SourceConfig::Command {
            program: "sh".to_string(),
            args: vec!["-c".to_string(), "echo 'auth failed' >&2; exit 1".to_string()],
            env: Default::default(),
            cwd: None,
        },
        ..Config::default()
    };
    let shell = MemoryShell::new();
    let engine = Engine::from_config(&config, shell.clone(), Arc::new(RecordingOpener::new())).unwrap();

    let report = engine.refresh().await;
    assert!(report.is_noop());
    assert_eq!(shell.total_label(), "0");
    assert!(shell.categories().is_empty());
}
