use std::sync::Arc;

pub mod chat;
pub mod config;
pub mod dashboard;
pub mod dispatch;
pub mod error;
pub mod gateway;
pub mod notifications;
pub mod poller;
pub mod reminders;

#[cfg(test)]
#[path = "tests/support.rs"]
pub(crate) mod test_support;

pub use chat::{ChatBackend, ChatMessage, ChatSender, ChatSession, HttpChatBackend};
pub use config::{load_client_config, ClientConfig, ConfigError};
pub use dashboard::{DashboardReadout, DashboardState, FallIndicator};
pub use dispatch::{ActionDispatcher, ActionFeedback, DispatchState, FeedbackKind, SendOutcome};
pub use error::{GatewayError, NotificationCapabilityError, ReminderError};
pub use gateway::{DispatchOutcome, HttpGateway, RemoteDataGateway};
pub use notifications::{
    DeliveredNotification, LocalNotificationCenter, NotificationCapability, NotificationContent,
    NotificationId,
};
pub use poller::SensorPoller;
pub use reminders::{ReminderEntry, ReminderScheduler};

/// Controllers owned by a mounted dashboard screen. Polling and dispatch share
/// the gateway but no state; dropping the session stops the poller and any
/// pending feedback timer.
pub struct DashboardSession {
    pub poller: SensorPoller,
    pub dispatcher: ActionDispatcher,
}

impl DashboardSession {
    pub fn mount(config: &ClientConfig, gateway: Arc<dyn RemoteDataGateway>) -> Self {
        Self {
            poller: SensorPoller::start(Arc::clone(&gateway), config.poll_interval),
            dispatcher: ActionDispatcher::new(gateway, config.feedback_ttl),
        }
    }
}

#[cfg(test)]
#[path = "tests/lib_tests.rs"]
mod tests;
