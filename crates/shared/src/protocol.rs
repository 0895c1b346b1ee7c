use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::{is_fall_alert, CaregiverStatus, LightState};

/// Latest reading published by the sensor node at `GET /data`.
///
/// Missing or `null` fields decode to `None`. A field carrying the wrong JSON
/// type fails to decode; the gateway treats that as a transport-level fault
/// rather than silently blanking the reading.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SensorSnapshot {
    #[serde(default)]
    pub temperature: Option<f64>,
    #[serde(default)]
    pub humidity: Option<f64>,
    #[serde(default)]
    pub fall_detected: Option<String>,
}

impl SensorSnapshot {
    pub fn is_fall_alert(&self) -> bool {
        is_fall_alert(self.fall_detected.as_deref())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActionRequest {
    pub action: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CustomMessageRequest {
    pub message: String,
}

/// Body returned by both dispatch endpoints. The hub echoes the stored record
/// next to the flag; clients only look at `success`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DispatchResponse {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ChatReply {
    #[serde(default)]
    pub reply: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SensorAck {
    pub status: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ActionRecord {
    pub action: Option<String>,
    pub timestamp: Option<DateTime<Utc>>,
    pub consumed: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CustomMessageRecord {
    pub message: Option<String>,
    pub timestamp: Option<DateTime<Utc>>,
    pub consumed: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CaregiverStatusRecord {
    pub status: CaregiverStatus,
    pub updated_at: Option<DateTime<Utc>>,
    pub consumed: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CaregiverStatusRequest {
    #[serde(default)]
    pub status: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LightStateResponse {
    pub light_state: LightState,
}

#[cfg(test)]
#[path = "tests/protocol_tests.rs"]
mod tests;
