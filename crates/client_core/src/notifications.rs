//! Time-triggered local notifications.
//!
//! [`NotificationCapability`] is the seam to whatever the host platform offers.
//! [`LocalNotificationCenter`] implements it in-process with one tokio timer
//! per notification, which is what the command-line client uses.

use std::{
    collections::HashMap,
    fmt,
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc, Mutex, MutexGuard,
    },
    time::Duration,
};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::{sync::broadcast, task::JoinHandle};
use tracing::{debug, info};
use uuid::Uuid;

use crate::error::NotificationCapabilityError;

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct NotificationId(pub String);

impl fmt::Display for NotificationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NotificationContent {
    pub title: String,
    pub body: String,
    pub sound: bool,
    pub vibration_pattern_ms: Vec<u64>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeliveredNotification {
    pub id: NotificationId,
    pub content: NotificationContent,
    pub trigger_time: DateTime<Utc>,
}

#[async_trait]
pub trait NotificationCapability: Send + Sync {
    async fn request_permission(&self) -> Result<bool, NotificationCapabilityError>;
    async fn schedule(
        &self,
        content: NotificationContent,
        trigger_time: DateTime<Utc>,
    ) -> Result<NotificationId, NotificationCapabilityError>;
    async fn cancel(&self, id: &NotificationId) -> Result<(), NotificationCapabilityError>;
    /// Ids that are scheduled and have not fired yet.
    async fn pending(&self) -> Result<Vec<NotificationId>, NotificationCapabilityError>;
}

type TimerMap = HashMap<NotificationId, JoinHandle<()>>;
type ScheduledTimers = Arc<Mutex<TimerMap>>;

pub struct LocalNotificationCenter {
    grant_on_request: bool,
    permission_granted: AtomicBool,
    scheduled: ScheduledTimers,
    delivered: broadcast::Sender<DeliveredNotification>,
}

impl Default for LocalNotificationCenter {
    fn default() -> Self {
        Self::new()
    }
}

impl LocalNotificationCenter {
    pub fn new() -> Self {
        Self::with_permission(true)
    }

    /// A center whose permission prompt answers `grant_on_request`.
    pub fn with_permission(grant_on_request: bool) -> Self {
        let (delivered, _) = broadcast::channel(64);
        Self {
            grant_on_request,
            permission_granted: AtomicBool::new(false),
            scheduled: Arc::new(Mutex::new(HashMap::new())),
            delivered,
        }
    }

    pub fn subscribe_delivered(&self) -> broadcast::Receiver<DeliveredNotification> {
        self.delivered.subscribe()
    }
}

fn lock_timers(timers: &Mutex<TimerMap>) -> MutexGuard<'_, TimerMap> {
    match timers.lock() {
        Ok(guard) => guard,
        Err(poisoned) => poisoned.into_inner(),
    }
}

#[async_trait]
impl NotificationCapability for LocalNotificationCenter {
    async fn request_permission(&self) -> Result<bool, NotificationCapabilityError> {
        self.permission_granted
            .store(self.grant_on_request, Ordering::SeqCst);
        Ok(self.grant_on_request)
    }

    async fn schedule(
        &self,
        content: NotificationContent,
        trigger_time: DateTime<Utc>,
    ) -> Result<NotificationId, NotificationCapabilityError> {
        if !self.permission_granted.load(Ordering::SeqCst) {
            return Err(NotificationCapabilityError::PermissionDenied);
        }

        let id = NotificationId(Uuid::new_v4().to_string());
        // Past triggers fire right away.
        let delay = (trigger_time - Utc::now())
            .to_std()
            .unwrap_or(Duration::ZERO);

        // Hold the map while spawning so a zero-delay timer cannot try to
        // remove its entry before it has been inserted.
        let mut timers = lock_timers(&self.scheduled);
        let task = {
            let id = id.clone();
            let scheduled = Arc::clone(&self.scheduled);
            let delivered = self.delivered.clone();
            tokio::spawn(async move {
                tokio::time::sleep(delay).await;
                lock_timers(&scheduled).remove(&id);
                info!(%id, title = %content.title, "notification delivered");
                let _ = delivered.send(DeliveredNotification {
                    id,
                    content,
                    trigger_time,
                });
            })
        };
        timers.insert(id.clone(), task);
        debug!(%id, %trigger_time, ?delay, "notification scheduled");
        Ok(id)
    }

    async fn cancel(&self, id: &NotificationId) -> Result<(), NotificationCapabilityError> {
        let task = lock_timers(&self.scheduled).remove(id);
        match task {
            Some(task) => {
                task.abort();
                debug!(%id, "notification cancelled");
                Ok(())
            }
            None => Err(NotificationCapabilityError::UnknownNotification(
                id.to_string(),
            )),
        }
    }

    async fn pending(&self) -> Result<Vec<NotificationId>, NotificationCapabilityError> {
        Ok(lock_timers(&self.scheduled).keys().cloned().collect())
    }
}

impl Drop for LocalNotificationCenter {
    fn drop(&mut self) {
        for (_, task) in lock_timers(&self.scheduled).drain() {
            task.abort();
        }
    }
}

#[cfg(test)]
#[path = "tests/notifications_tests.rs"]
mod tests;
