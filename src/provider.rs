use std::sync::mpsc::{Receiver, RecvTimeoutError, Sender};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use crate::config::Config;
use crate::reconcile::{ParticipantModel, reconcile_with};
use crate::source::{SourceError, TableSource};
use crate::state::{Delta, ProviderCommand};

/// Fetches both tables and reconciles them. Either fetch failing aborts the
/// whole refresh so callers never see a model built from half the data.
pub fn refresh_model(
    source: &dyn TableSource,
    config: &Config,
) -> Result<ParticipantModel, SourceError> {
    let totals = source.fetch_table(&config.totals)?;
    let rounds = source.fetch_table(&config.rounds)?;
    Ok(reconcile_with(&totals, &rounds, &config.layout))
}

/// Runs one refresh and reports the outcome. Returns whether it succeeded.
pub fn refresh_and_send(source: &dyn TableSource, config: &Config, tx: &Sender<Delta>) -> bool {
    match refresh_model(source, config) {
        Ok(model) => {
            let _ = tx.send(Delta::SetModel(model));
            true
        }
        Err(err) => {
            let _ = tx.send(Delta::SourceUnavailable(format!(
                "{} error: {err}",
                err.kind().label()
            )));
            false
        }
    }
}

/// Background refresh loop on the slow cadence. Stops on
/// [`ProviderCommand::Shutdown`] or when the command channel disconnects.
pub fn spawn_provider(
    config: Config,
    source: Box<dyn TableSource>,
    tx: Sender<Delta>,
    cmd_rx: Receiver<ProviderCommand>,
) -> JoinHandle<()> {
    thread::spawn(move || {
        let interval = config.slow_cadence;
        let _ = tx.send(Delta::Log(format!(
            "[INFO] Polling {} / {} every {}s",
            config.totals.sheet_name,
            config.rounds.sheet_name,
            interval.as_secs()
        )));

        refresh_and_send(source.as_ref(), &config, &tx);
        let mut last_refresh = Instant::now();

        loop {
            let wait = interval
                .checked_sub(last_refresh.elapsed())
                .unwrap_or(Duration::ZERO);
            match cmd_rx.recv_timeout(wait) {
                Ok(ProviderCommand::RefreshNow) => {
                    let _ = tx.send(Delta::Log("[INFO] Manual refresh".to_string()));
                    refresh_and_send(source.as_ref(), &config, &tx);
                    last_refresh = Instant::now();
                }
                Ok(ProviderCommand::Shutdown) | Err(RecvTimeoutError::Disconnected) => break,
                Err(RecvTimeoutError::Timeout) => {
                    refresh_and_send(source.as_ref(), &config, &tx);
                    last_refresh = Instant::now();
                }
            }
        }
    })
}
