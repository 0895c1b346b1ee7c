use std::{sync::Arc, time::Duration};

use shared::protocol::SensorSnapshot;
use tokio::{
    sync::watch,
    task::{JoinHandle, JoinSet},
    time::MissedTickBehavior,
};
use tracing::{debug, warn};

use crate::{dashboard::DashboardState, error::GatewayError, gateway::RemoteDataGateway};

pub const MIN_POLL_INTERVAL: Duration = Duration::from_millis(1);

/// Keeps the dashboard's sensor snapshot fresh while it is alive.
///
/// One fetch goes out as soon as the poller starts and another on every tick
/// of `poll_interval`. A tick never waits for an earlier fetch, so responses
/// are applied in the order they arrive: a slow response can overwrite a
/// newer one. Dropping the poller aborts the ticker and every fetch still in
/// flight; nothing is published after that.
pub struct SensorPoller {
    state: watch::Receiver<DashboardState>,
    task: JoinHandle<()>,
}

impl SensorPoller {
    /// A zero `poll_interval` is raised to [`MIN_POLL_INTERVAL`].
    pub fn start(gateway: Arc<dyn RemoteDataGateway>, poll_interval: Duration) -> Self {
        let poll_interval = if poll_interval.is_zero() {
            warn!(min = ?MIN_POLL_INTERVAL, "zero poll interval raised to the minimum");
            MIN_POLL_INTERVAL
        } else {
            poll_interval
        };
        let (tx, rx) = watch::channel(DashboardState::default());
        let task = tokio::spawn(poll_loop(gateway, tx, poll_interval));
        Self { state: rx, task }
    }

    pub fn subscribe(&self) -> watch::Receiver<DashboardState> {
        self.state.clone()
    }

    pub fn state(&self) -> DashboardState {
        self.state.borrow().clone()
    }

    pub fn stop(self) {}
}

impl Drop for SensorPoller {
    fn drop(&mut self) {
        self.task.abort();
    }
}

async fn poll_loop(
    gateway: Arc<dyn RemoteDataGateway>,
    state: watch::Sender<DashboardState>,
    poll_interval: Duration,
) {
    let mut ticker = tokio::time::interval(poll_interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    // Owned by this task so that aborting it also aborts pending fetches.
    let mut inflight: JoinSet<Result<SensorSnapshot, GatewayError>> = JoinSet::new();

    loop {
        tokio::select! {
            _ = ticker.tick() => {
                let gateway = Arc::clone(&gateway);
                inflight.spawn(async move { gateway.fetch_sensor_snapshot().await });
            }
            Some(joined) = inflight.join_next() => match joined {
                Ok(Ok(snapshot)) => {
                    debug!(?snapshot, "sensor snapshot refreshed");
                    state.send_modify(|current| {
                        current.snapshot = snapshot;
                        current.is_loading = false;
                    });
                }
                Ok(Err(error)) => {
                    warn!(%error, "error fetching sensor data");
                    finish_loading(&state);
                }
                Err(error) => {
                    warn!(%error, "sensor fetch task ended abnormally");
                    finish_loading(&state);
                }
            },
        }
    }
}

fn finish_loading(state: &watch::Sender<DashboardState>) {
    state.send_if_modified(|current| {
        let was_loading = current.is_loading;
        current.is_loading = false;
        was_loading
    });
}

#[cfg(test)]
#[path = "tests/poller_tests.rs"]
mod tests;
