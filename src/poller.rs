use std::io::Write;
use std::time::Duration;

use anyhow::{Context, Result};
use futures_util::future::join_all;
use tokio::sync::watch;
use tracing::{debug, info, warn};

use crate::api::GameApi;
use crate::reporter;
use crate::session::Session;

/// Asks a running [`Poller`] to stop after its current cycle.
#[derive(Debug, Clone)]
pub struct StopHandle(watch::Sender<bool>);

impl StopHandle {
    pub fn stop(&self) {
        self.0.send_replace(true);
    }
}

/// Receiving side of a [`StopHandle`], passed to [`Poller::run`].
pub type StopSignal = watch::Receiver<bool>;

pub fn stop_channel() -> (StopHandle, StopSignal) {
    let (tx, rx) = watch::channel(false);
    (StopHandle(tx), rx)
}

/// Periodically fetches and displays the state of every logged-in account.
pub struct Poller<A> {
    api: A,
    sessions: Vec<Session>,
    interval: Duration,
    max_cycles: Option<u64>,
}

impl<A: GameApi> Poller<A> {
    pub fn new(api: A, sessions: Vec<Session>, interval: Duration) -> Self {
        Self {
            api,
            sessions,
            interval,
            max_cycles: None,
        }
    }

    /// Stop on its own after `cycles` completed cycles.
    pub fn with_max_cycles(mut self, cycles: u64) -> Self {
        self.max_cycles = Some(cycles);
        self
    }

    /// Fetch every account's state concurrently and format one line per session.
    ///
    /// Waits for all requests. Lines follow session order; a failed fetch
    /// becomes a failure line for that account only.
    pub async fn poll_cycle(&self) -> Vec<String> {
        let fetches = self.sessions.iter().map(|session| async move {
            match self.api.game_state(&session.token).await {
                Ok(state) => reporter::format_state_line(
                    session.account(),
                    &state,
                    reporter::random_color(),
                ),
                Err(e) => {
                    warn!("Game state failed for account {}: {e}", session.account());
                    reporter::format_failure_line(session.account(), &e)
                }
            }
        });
        join_all(fetches).await
    }

    /// Poll, draw, wait; repeat until stopped.
    ///
    /// The first cycle runs immediately. A stop request never interrupts a
    /// cycle in flight, only the wait between cycles. Dropping every
    /// [`StopHandle`] also stops the loop. Returns the number of completed
    /// cycles.
    pub async fn run<W: Write>(&self, out: &mut W, mut stop: StopSignal) -> Result<u64> {
        info!(
            "Polling {} account(s) every {:?}",
            self.sessions.len(),
            self.interval
        );
        let mut cycles: u64 = 0;

        loop {
            if *stop.borrow() {
                info!("Stop requested");
                break;
            }

            let lines = self.poll_cycle().await;
            reporter::render(out, &lines).context("failed to write status")?;
            cycles += 1;
            debug!("Cycle {cycles} done");

            if self.max_cycles.is_some_and(|max| cycles >= max) {
                break;
            }

            tokio::select! {
                changed = stop.changed() => {
                    if changed.is_err() {
                        info!("Stop handle dropped");
                    } else {
                        info!("Stop requested");
                    }
                    break;
                }
                _ = tokio::time::sleep(self.interval) => {}
            }
        }

        info!("Poller stopped after {cycles} cycle(s)");
        Ok(cycles)
    }
}
