use std::{collections::HashSet, sync::Arc};

use chrono::{DateTime, Local, NaiveDateTime, NaiveTime, TimeZone, Utc};
use tracing::{info, warn};

use crate::{
    error::ReminderError,
    notifications::{NotificationCapability, NotificationContent, NotificationId},
};

pub const NOTIFICATION_TITLE: &str = "💊 Medicine Reminder";
pub const NOTIFICATION_BODY: &str = "It’s time to take your medicine!";
pub const REMINDER_TITLE: &str = "Tablet Reminder";
pub const REMINDER_BODY: &str = "Take your medicine on time!";
const VIBRATION_PATTERN_MS: [u64; 4] = [500, 500, 500, 500];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReminderEntry {
    pub id: NotificationId,
    pub title: String,
    pub body: String,
    pub scheduled_time: DateTime<Utc>,
}

impl ReminderEntry {
    pub fn display_time(&self) -> String {
        self.scheduled_time
            .with_timezone(&Local)
            .format("%H:%M:%S")
            .to_string()
    }

    pub fn display_date(&self) -> String {
        self.scheduled_time
            .with_timezone(&Local)
            .format("%Y-%m-%d %H:%M:%S")
            .to_string()
    }
}

fn reminder_notification() -> NotificationContent {
    NotificationContent {
        title: NOTIFICATION_TITLE.to_string(),
        body: NOTIFICATION_BODY.to_string(),
        sound: true,
        vibration_pattern_ms: VIBRATION_PATTERN_MS.to_vec(),
    }
}

/// Medicine reminders scheduled during this session.
///
/// The list is kept in creation order, not trigger order. An entry exists
/// exactly as long as its notification is still scheduled: deleting cancels
/// the notification first, and [`ReminderScheduler::prune_fired`] drops
/// entries whose notification has already been delivered.
pub struct ReminderScheduler {
    notifications: Arc<dyn NotificationCapability>,
    reminders: Vec<ReminderEntry>,
}

impl ReminderScheduler {
    pub fn new(notifications: Arc<dyn NotificationCapability>) -> Self {
        Self {
            notifications,
            reminders: Vec::new(),
        }
    }

    pub fn reminders(&self) -> &[ReminderEntry] {
        &self.reminders
    }

    /// Asks for notification permission. A refusal is logged, not fatal.
    pub async fn activate(&self) -> bool {
        match self.notifications.request_permission().await {
            Ok(true) => true,
            Ok(false) => {
                warn!("notification permission refused; reminders will not be shown");
                false
            }
            Err(error) => {
                warn!(%error, "notification permission request failed");
                false
            }
        }
    }

    /// Schedules a reminder from user input: an RFC 3339 instant, a local
    /// `YYYY-MM-DD HH:MM[:SS]`, or a local `HH:MM[:SS]` meaning today.
    pub async fn schedule_reminder(&mut self, input: &str) -> Result<ReminderEntry, ReminderError> {
        let time = parse_reminder_time(input, Local::now())?;
        self.schedule_reminder_at(time).await
    }

    pub async fn schedule_reminder_at(
        &mut self,
        time: DateTime<Utc>,
    ) -> Result<ReminderEntry, ReminderError> {
        let id = self
            .notifications
            .schedule(reminder_notification(), time)
            .await?;

        let entry = ReminderEntry {
            id,
            title: REMINDER_TITLE.to_string(),
            body: REMINDER_BODY.to_string(),
            scheduled_time: time,
        };
        info!(id = %entry.id, at = %entry.display_date(), "reminder scheduled");
        self.reminders.push(entry.clone());
        Ok(entry)
    }

    pub async fn delete_reminder(&mut self, id: &NotificationId) -> Result<(), ReminderError> {
        if !self.reminders.iter().any(|entry| &entry.id == id) {
            return Err(ReminderError::UnknownReminder(id.to_string()));
        }

        self.notifications.cancel(id).await?;
        self.reminders.retain(|entry| &entry.id != id);
        info!(%id, "reminder deleted");
        Ok(())
    }

    /// Removes entries whose notification is no longer pending. Returns how
    /// many were dropped.
    pub async fn prune_fired(&mut self) -> Result<usize, ReminderError> {
        let pending: HashSet<NotificationId> =
            self.notifications.pending().await?.into_iter().collect();
        let before = self.reminders.len();
        self.reminders.retain(|entry| pending.contains(&entry.id));
        Ok(before - self.reminders.len())
    }
}

pub fn parse_reminder_time(
    input: &str,
    now: DateTime<Local>,
) -> Result<DateTime<Utc>, ReminderError> {
    let raw = input.trim();
    let invalid = |reason: &str| ReminderError::InvalidTime {
        input: input.to_string(),
        reason: reason.to_string(),
    };

    if raw.is_empty() {
        return Err(invalid("empty input"));
    }

    if let Ok(instant) = DateTime::parse_from_rfc3339(raw) {
        return Ok(instant.with_timezone(&Utc));
    }

    let naive = ["%Y-%m-%d %H:%M:%S", "%Y-%m-%d %H:%M"]
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(raw, fmt).ok())
        .or_else(|| {
            ["%H:%M:%S", "%H:%M"]
                .iter()
                .find_map(|fmt| NaiveTime::parse_from_str(raw, fmt).ok())
                .map(|time| now.date_naive().and_time(time))
        })
        .ok_or_else(|| invalid("expected RFC 3339, YYYY-MM-DD HH:MM[:SS] or HH:MM[:SS]"))?;

    Local
        .from_local_datetime(&naive)
        .earliest()
        .map(|local| local.with_timezone(&Utc))
        .ok_or_else(|| invalid("time does not exist in the local time zone"))
}

#[cfg(test)]
#[path = "tests/reminders_tests.rs"]
mod tests;
