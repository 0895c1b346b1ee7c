//! Display model for the patient dashboard.

use shared::protocol::SensorSnapshot;

pub const PLACEHOLDER: &str = "--";
pub const LOADING_TEXT: &str = "Fetching data...";

/// State published by the poller on every change.
#[derive(Debug, Clone, PartialEq)]
pub struct DashboardState {
    pub snapshot: SensorSnapshot,
    pub is_loading: bool,
}

impl Default for DashboardState {
    fn default() -> Self {
        Self {
            snapshot: SensorSnapshot::default(),
            is_loading: true,
        }
    }
}

impl DashboardState {
    pub fn readout(&self) -> DashboardReadout {
        DashboardReadout::from(&self.snapshot)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FallIndicator {
    Alert,
    Normal,
}

impl FallIndicator {
    pub fn label(self) -> &'static str {
        match self {
            FallIndicator::Alert => "Fall Detected",
            FallIndicator::Normal => "No Fall",
        }
    }

    pub fn color(self) -> &'static str {
        match self {
            FallIndicator::Alert => "#ff0000",
            FallIndicator::Normal => "#00cc66",
        }
    }

    pub fn icon(self) -> &'static str {
        match self {
            FallIndicator::Alert => "alert-circle",
            FallIndicator::Normal => "checkmark-circle",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DashboardReadout {
    pub temperature_text: String,
    pub humidity_text: String,
    pub fall_indicator: FallIndicator,
}

impl From<&SensorSnapshot> for DashboardReadout {
    fn from(snapshot: &SensorSnapshot) -> Self {
        let fall_indicator = if snapshot.is_fall_alert() {
            FallIndicator::Alert
        } else {
            FallIndicator::Normal
        };
        Self {
            temperature_text: format!("{} °C", reading_text(snapshot.temperature)),
            humidity_text: format!("{} %", reading_text(snapshot.humidity)),
            fall_indicator,
        }
    }
}

fn reading_text(value: Option<f64>) -> String {
    match value {
        Some(v) if v.is_finite() => v.to_string(),
        _ => PLACEHOLDER.to_string(),
    }
}
