use std::sync::Arc;

use chrono::Utc;
use serde::Serialize;
use serde_json::{Map, Value};
use shared::{
    domain::{CaregiverStatus, LightState},
    error::ApiError,
    protocol::{ActionRecord, CaregiverStatusRecord, CustomMessageRecord},
};
use tokio::sync::RwLock;
use tracing::info;

/// In-memory hub state. Every device and the caregiver app share one copy;
/// nothing survives a restart.
#[derive(Clone, Default)]
pub struct HubContext {
    inner: Arc<RwLock<HubData>>,
}

#[derive(Default)]
struct HubData {
    sensor: Map<String, Value>,
    light_state: LightState,
    last_action: ActionRecord,
    custom_message: CustomMessageRecord,
    caregiver: CaregiverStatusRecord,
}

/// `{"success": true, ...record}` as the devices expect it.
#[derive(Debug, Serialize)]
pub struct Accepted<T> {
    pub success: bool,
    #[serde(flatten)]
    pub record: T,
}

/// `{"ok": true, ...record}` for consume and status updates.
#[derive(Debug, Serialize)]
pub struct Acknowledged<T> {
    pub ok: bool,
    #[serde(flatten)]
    pub record: T,
}

/// Replaces the latest reading wholesale. A `light_state` field reported by
/// the sensor node becomes the shared light state.
pub async fn record_sensor_reading(ctx: &HubContext, reading: Value) -> Result<(), ApiError> {
    let Value::Object(reading) = reading else {
        return Err(ApiError::validation("sensor reading must be a JSON object"));
    };

    let reported_light = reading
        .get("light_state")
        .and_then(|v| serde_json::from_value::<LightState>(v.clone()).ok());

    let mut data = ctx.inner.write().await;
    if let Some(light_state) = reported_light {
        data.light_state = light_state;
    }
    info!(fields = reading.len(), "sensor reading received");
    data.sensor = reading;
    Ok(())
}

pub async fn latest_sensor_reading(ctx: &HubContext) -> Map<String, Value> {
    ctx.inner.read().await.sensor.clone()
}

pub async fn record_action(
    ctx: &HubContext,
    action: Option<String>,
) -> Result<ActionRecord, ApiError> {
    let action = non_empty(action).ok_or_else(|| ApiError::validation("No action provided"))?;
    let record = ActionRecord {
        action: Some(action),
        timestamp: Some(Utc::now()),
        consumed: false,
    };
    info!(action = ?record.action, "action received from app");
    ctx.inner.write().await.last_action = record.clone();
    Ok(record)
}

pub async fn last_action(ctx: &HubContext) -> ActionRecord {
    ctx.inner.read().await.last_action.clone()
}

pub async fn consume_action(ctx: &HubContext) -> ActionRecord {
    let mut data = ctx.inner.write().await;
    data.last_action.consumed = true;
    data.last_action.clone()
}

pub async fn record_custom_message(
    ctx: &HubContext,
    message: Option<String>,
) -> Result<CustomMessageRecord, ApiError> {
    let message = non_empty(message).ok_or_else(|| ApiError::validation("Empty message"))?;
    let record = CustomMessageRecord {
        message: Some(message),
        timestamp: Some(Utc::now()),
        consumed: false,
    };
    info!(message = ?record.message, "custom message received");
    ctx.inner.write().await.custom_message = record.clone();
    Ok(record)
}

pub async fn last_custom_message(ctx: &HubContext) -> CustomMessageRecord {
    ctx.inner.read().await.custom_message.clone()
}

pub async fn consume_custom_message(ctx: &HubContext) -> CustomMessageRecord {
    let mut data = ctx.inner.write().await;
    data.custom_message.consumed = true;
    data.custom_message.clone()
}

pub async fn set_caregiver_status(
    ctx: &HubContext,
    status: Option<&str>,
) -> Result<CaregiverStatusRecord, ApiError> {
    let status = parse_caregiver_status(status)?;
    let mut data = ctx.inner.write().await;
    data.caregiver = CaregiverStatusRecord {
        status,
        updated_at: Some(Utc::now()),
        consumed: false,
    };
    info!(?status, "caregiver status updated");
    Ok(data.caregiver.clone())
}

pub async fn caregiver_status(ctx: &HubContext) -> CaregiverStatusRecord {
    ctx.inner.read().await.caregiver.clone()
}

pub async fn consume_caregiver_status(ctx: &HubContext) -> CaregiverStatusRecord {
    let mut data = ctx.inner.write().await;
    data.caregiver.consumed = true;
    data.caregiver.clone()
}

pub async fn set_light_state(ctx: &HubContext, light_state: LightState) -> LightState {
    ctx.inner.write().await.light_state = light_state;
    info!(?light_state, "light state changed");
    light_state
}

pub async fn light_state(ctx: &HubContext) -> LightState {
    ctx.inner.read().await.light_state
}

fn parse_caregiver_status(raw: Option<&str>) -> Result<CaregiverStatus, ApiError> {
    match raw {
        Some("idle") => Ok(CaregiverStatus::Idle),
        Some("on_the_way") => Ok(CaregiverStatus::OnTheWay),
        _ => Err(ApiError::validation("Invalid status")),
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.is_empty())
}

#[cfg(test)]
#[path = "tests/mod_tests.rs"]
mod tests;
