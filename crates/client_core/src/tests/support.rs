//! Scripted stand-ins for the remote collaborators.

use std::{
    collections::VecDeque,
    sync::{
        atomic::{AtomicUsize, Ordering},
        Mutex,
    },
    time::Duration,
};

use async_trait::async_trait;
use shared::protocol::SensorSnapshot;

use crate::{
    error::GatewayError,
    gateway::{DispatchOutcome, RemoteDataGateway},
};

/// A scripted reply: how long the call takes and what it returns. `Err` carries
/// the HTTP status to report.
pub(crate) type Step<T> = (Duration, Result<T, u16>);

#[derive(Default)]
pub(crate) struct ScriptedGateway {
    snapshots: Mutex<VecDeque<Step<SensorSnapshot>>>,
    dispatches: Mutex<VecDeque<Step<DispatchOutcome>>>,
    pub fetch_calls: AtomicUsize,
    pub fetch_completions: AtomicUsize,
    pub dispatched: Mutex<Vec<String>>,
}

impl ScriptedGateway {
    pub fn with_snapshots(steps: impl IntoIterator<Item = Step<SensorSnapshot>>) -> Self {
        let gateway = Self::default();
        gateway.snapshots.lock().expect("lock").extend(steps);
        gateway
    }

    pub fn with_dispatches(steps: impl IntoIterator<Item = Step<DispatchOutcome>>) -> Self {
        let gateway = Self::default();
        gateway.dispatches.lock().expect("lock").extend(steps);
        gateway
    }

    pub fn fetch_calls(&self) -> usize {
        self.fetch_calls.load(Ordering::SeqCst)
    }

    pub fn dispatched(&self) -> Vec<String> {
        self.dispatched.lock().expect("lock").clone()
    }
}

pub(crate) fn reading(temperature: f64) -> SensorSnapshot {
    SensorSnapshot {
        temperature: Some(temperature),
        humidity: Some(50.0),
        fall_detected: Some("NO".to_string()),
    }
}

fn status_error(status: u16) -> GatewayError {
    GatewayError::Status {
        endpoint: "http://scripted/".to_string(),
        status,
    }
}

#[async_trait]
impl RemoteDataGateway for ScriptedGateway {
    async fn fetch_sensor_snapshot(&self) -> Result<SensorSnapshot, GatewayError> {
        self.fetch_calls.fetch_add(1, Ordering::SeqCst);
        let step = self.snapshots.lock().expect("lock").pop_front();
        let (delay, result) = step.unwrap_or((Duration::ZERO, Ok(SensorSnapshot::default())));
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
        self.fetch_completions.fetch_add(1, Ordering::SeqCst);
        result.map_err(status_error)
    }

    async fn dispatch_action(&self, action: &str) -> Result<DispatchOutcome, GatewayError> {
        self.dispatch(action).await
    }

    async fn dispatch_custom_message(
        &self,
        text: &str,
    ) -> Result<DispatchOutcome, GatewayError> {
        self.dispatch(text).await
    }
}

impl ScriptedGateway {
    async fn dispatch(&self, payload: &str) -> Result<DispatchOutcome, GatewayError> {
        self.dispatched
            .lock()
            .expect("lock")
            .push(payload.to_string());
        let step = self.dispatches.lock().expect("lock").pop_front();
        let (delay, result) = step.unwrap_or((Duration::ZERO, Ok(DispatchOutcome::Accepted)));
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
        result.map_err(status_error)
    }
}
