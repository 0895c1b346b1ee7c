use thiserror::Error;

/// Anything that keeps a well-formed answer from coming back from a remote
/// endpoint. Callers treat every variant alike: "failed to reach server".
#[derive(Debug, Error)]
pub enum GatewayError {
    #[error("request to {endpoint} failed: {source}")]
    Transport {
        endpoint: String,
        source: reqwest::Error,
    },
    #[error("{endpoint} answered with status {status}")]
    Status { endpoint: String, status: u16 },
    #[error("unexpected response shape from {endpoint}: {reason}")]
    Decode { endpoint: String, reason: String },
    #[error("cannot build url for route '{route}': {source}")]
    InvalidUrl {
        route: String,
        source: url::ParseError,
    },
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum NotificationCapabilityError {
    #[error("notification permission has not been granted")]
    PermissionDenied,
    #[error("no scheduled notification with id {0}")]
    UnknownNotification(String),
    #[error("failed to schedule notification: {0}")]
    Scheduling(String),
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ReminderError {
    #[error("invalid reminder time '{input}': {reason}")]
    InvalidTime { input: String, reason: String },
    #[error("no reminder with id {0}")]
    UnknownReminder(String),
    #[error(transparent)]
    Notification(#[from] NotificationCapabilityError),
}
