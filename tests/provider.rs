use std::sync::mpsc;
use std::time::Duration;

use sheet_leaderboard::config::Config;
use sheet_leaderboard::gviz::{Cell, ParseError, RawTable};
use sheet_leaderboard::provider::{refresh_and_send, refresh_model, spawn_provider};
use sheet_leaderboard::source::{ErrorKind, FakeSource, SourceError, TableRef, TableSource};
use sheet_leaderboard::state::{Delta, ProviderCommand};

/// Serves the totals sheet and fails on the rounds sheet.
struct BrokenRounds {
    rounds_sheet: String,
}

impl TableSource for BrokenRounds {
    fn fetch_table(&self, table: &TableRef) -> Result<RawTable, SourceError> {
        if table.sheet_name == self.rounds_sheet {
            return Err(SourceError::Parse {
                table: table.sheet_name.clone(),
                source: ParseError::Framing("body is 0 bytes".to_string()),
            });
        }
        Ok(RawTable::new(vec![vec![
            Cell::Text("Ana".to_string()),
            Cell::Number(10.0),
        ]]))
    }
}

fn fake_config() -> Config {
    Config {
        use_fake_source: true,
        ..Config::default()
    }
}

#[test]
fn fake_source_refresh_builds_model() {
    let config = fake_config();
    let source = FakeSource::new(
        config.totals.sheet_name.clone(),
        config.rounds.sheet_name.clone(),
    );
    let model = refresh_model(&source, &config).expect("fake refresh succeeds");
    assert_eq!(model.ranked[0].name, "Valkyrie");
    // Nox and Pixel tie on 37 and keep sheet order
    assert_eq!(model.ranked[1].name, "Nox");
    assert_eq!(model.ranked[2].name, "Pixel");
    assert_eq!(model.max_rounds, 4);
    assert_eq!(model.series_for("Pixel").map(Vec::len), Some(3));
    assert!(model.series_for("Zed").is_none());
}

#[test]
fn one_failed_table_aborts_the_refresh() {
    let config = Config::default();
    let source = BrokenRounds {
        rounds_sheet: config.rounds.sheet_name.clone(),
    };
    let err = refresh_model(&source, &config).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Parse);

    let (tx, rx) = mpsc::channel();
    assert!(!refresh_and_send(&source, &config, &tx));
    match rx.try_recv() {
        Ok(Delta::SourceUnavailable(message)) => {
            assert!(message.starts_with("parse error:"), "{message}");
            assert!(message.contains("Sheet2"));
        }
        other => panic!("expected SourceUnavailable, got {other:?}"),
    }
    assert!(rx.try_recv().is_err());
}

#[test]
fn provider_loads_immediately_and_stops_on_shutdown() {
    let config = fake_config();
    let source = FakeSource::new(
        config.totals.sheet_name.clone(),
        config.rounds.sheet_name.clone(),
    );
    let (tx, rx) = mpsc::channel();
    let (cmd_tx, cmd_rx) = mpsc::channel();
    let handle = spawn_provider(config, Box::new(source), tx, cmd_rx);

    let mut got_model = false;
    while let Ok(delta) = rx.recv_timeout(Duration::from_secs(5)) {
        if let Delta::SetModel(model) = delta {
            assert_eq!(model.ranked.len(), 8);
            got_model = true;
            break;
        }
    }
    assert!(got_model, "provider should send an initial model");

    cmd_tx.send(ProviderCommand::RefreshNow).unwrap();
    let mut refreshed = false;
    while let Ok(delta) = rx.recv_timeout(Duration::from_secs(5)) {
        if matches!(delta, Delta::SetModel(_)) {
            refreshed = true;
            break;
        }
    }
    assert!(refreshed, "manual refresh should send a model");

    cmd_tx.send(ProviderCommand::Shutdown).unwrap();
    handle.join().expect("provider thread exits cleanly");
}

#[test]
fn provider_stops_when_command_channel_drops() {
    let config = fake_config();
    let source = FakeSource::new(
        config.totals.sheet_name.clone(),
        config.rounds.sheet_name.clone(),
    );
    let (tx, _rx) = mpsc::channel();
    let (cmd_tx, cmd_rx) = mpsc::channel::<ProviderCommand>();
    let handle = spawn_provider(config, Box::new(source), tx, cmd_rx);
    drop(cmd_tx);
    handle.join().expect("provider thread exits cleanly");
}
