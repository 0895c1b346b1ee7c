//! Caregiver-initiated sends and the transient feedback they leave behind.

use std::{
    sync::{Arc, Mutex},
    time::Duration,
};

use tokio::{sync::watch, task::JoinHandle};
use tracing::{info, warn};

use crate::{
    error::GatewayError,
    gateway::{DispatchOutcome, RemoteDataGateway},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FeedbackKind {
    Success,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActionFeedback {
    pub kind: FeedbackKind,
    pub message: String,
}

impl ActionFeedback {
    fn new(kind: FeedbackKind, message: &str) -> Self {
        Self {
            kind,
            message: message.to_string(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DispatchState {
    pub is_sending: bool,
    pub feedback: Option<ActionFeedback>,
    pub draft: String,
    feedback_generation: u64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SendOutcome {
    /// Another send was in progress or there was nothing to send.
    Skipped,
    Completed(ActionFeedback),
}

struct FeedbackTexts {
    accepted: &'static str,
    rejected: &'static str,
    unreachable: &'static str,
}

const ACTION_TEXTS: FeedbackTexts = FeedbackTexts {
    accepted: "Message sent successfully!",
    rejected: "Server rejected the request",
    unreachable: "Failed to reach server",
};

const CUSTOM_MESSAGE_TEXTS: FeedbackTexts = FeedbackTexts {
    accepted: "Message sent!",
    rejected: "Server rejected message",
    unreachable: "Failed to reach server",
};

impl FeedbackTexts {
    fn feedback_for(&self, result: &Result<DispatchOutcome, GatewayError>) -> ActionFeedback {
        let (kind, message) = match result {
            Ok(DispatchOutcome::Accepted) => (FeedbackKind::Success, self.accepted),
            Ok(DispatchOutcome::Rejected) => (FeedbackKind::Error, self.rejected),
            Err(_) => (FeedbackKind::Error, self.unreachable),
        };
        ActionFeedback::new(kind, message)
    }
}

/// Sends predefined actions and free-text messages, one at a time.
///
/// At most one feedback value is live. Each completed send stamps its
/// feedback with a fresh generation and arms a clear timer for that
/// generation only, so an older timer can never wipe newer feedback.
pub struct ActionDispatcher {
    gateway: Arc<dyn RemoteDataGateway>,
    feedback_ttl: Duration,
    state: Arc<watch::Sender<DispatchState>>,
    clear_timer: Mutex<Option<JoinHandle<()>>>,
}

impl ActionDispatcher {
    pub fn new(gateway: Arc<dyn RemoteDataGateway>, feedback_ttl: Duration) -> Self {
        let (state, _) = watch::channel(DispatchState::default());
        Self {
            gateway,
            feedback_ttl,
            state: Arc::new(state),
            clear_timer: Mutex::new(None),
        }
    }

    pub fn subscribe(&self) -> watch::Receiver<DispatchState> {
        self.state.subscribe()
    }

    pub fn state(&self) -> DispatchState {
        self.state.borrow().clone()
    }

    pub fn feedback(&self) -> Option<ActionFeedback> {
        self.state.borrow().feedback.clone()
    }

    pub fn is_sending(&self) -> bool {
        self.state.borrow().is_sending
    }

    pub fn draft(&self) -> String {
        self.state.borrow().draft.clone()
    }

    pub fn set_draft(&self, text: impl Into<String>) {
        let text = text.into();
        self.state.send_modify(|state| state.draft = text);
    }

    /// Whether the free-text send control should be enabled.
    pub fn can_send_custom_message(&self) -> bool {
        let state = self.state.borrow();
        !state.is_sending && !state.draft.trim().is_empty()
    }

    pub async fn send_action(&self, label: &str) -> SendOutcome {
        let acquired = self.state.send_if_modified(|state| {
            if state.is_sending {
                return false;
            }
            state.is_sending = true;
            state.feedback = None;
            true
        });
        if !acquired {
            warn!(action = label, "send already in progress; ignoring action");
            return SendOutcome::Skipped;
        }
        let _sending = SendingGuard(&self.state);

        let result = self.gateway.dispatch_action(label).await;
        log_result("action", &result);
        let feedback = ACTION_TEXTS.feedback_for(&result);
        self.finish_send(feedback.clone(), false);
        SendOutcome::Completed(feedback)
    }

    /// Sends the current draft. The draft is sent as typed and only cleared
    /// when the server accepts it.
    pub async fn send_custom_message(&self) -> SendOutcome {
        let mut message = None;
        self.state.send_if_modified(|state| {
            if state.is_sending || state.draft.trim().is_empty() {
                return false;
            }
            state.is_sending = true;
            state.feedback = None;
            message = Some(state.draft.clone());
            true
        });
        let Some(message) = message else {
            return SendOutcome::Skipped;
        };
        let _sending = SendingGuard(&self.state);

        let result = self.gateway.dispatch_custom_message(&message).await;
        log_result("custom message", &result);
        let feedback = CUSTOM_MESSAGE_TEXTS.feedback_for(&result);
        let accepted = matches!(result, Ok(DispatchOutcome::Accepted));
        self.finish_send(feedback.clone(), accepted);
        SendOutcome::Completed(feedback)
    }

    fn finish_send(&self, feedback: ActionFeedback, clear_draft: bool) {
        let mut generation = 0;
        self.state.send_modify(|state| {
            state.is_sending = false;
            state.feedback = Some(feedback);
            state.feedback_generation += 1;
            generation = state.feedback_generation;
            if clear_draft {
                state.draft.clear();
            }
        });

        let state = Arc::clone(&self.state);
        let ttl = self.feedback_ttl;
        let timer = tokio::spawn(async move {
            tokio::time::sleep(ttl).await;
            state.send_if_modified(|state| {
                if state.feedback_generation != generation {
                    return false;
                }
                state.feedback.take().is_some()
            });
        });

        let previous = match self.clear_timer.lock() {
            Ok(mut guard) => guard.replace(timer),
            Err(poisoned) => poisoned.into_inner().replace(timer),
        };
        if let Some(previous) = previous {
            previous.abort();
        }
    }
}

/// Releases `is_sending` when a send future is dropped before it completes.
struct SendingGuard<'a>(&'a watch::Sender<DispatchState>);

impl Drop for SendingGuard<'_> {
    fn drop(&mut self) {
        self.0
            .send_if_modified(|state| std::mem::replace(&mut state.is_sending, false));
    }
}

impl Drop for ActionDispatcher {
    fn drop(&mut self) {
        let timer = match self.clear_timer.get_mut() {
            Ok(slot) => slot.take(),
            Err(poisoned) => poisoned.into_inner().take(),
        };
        if let Some(timer) = timer {
            timer.abort();
        }
    }
}

fn log_result(kind: &str, result: &Result<DispatchOutcome, GatewayError>) {
    match result {
        Ok(DispatchOutcome::Accepted) => info!(kind, "dispatch accepted"),
        Ok(DispatchOutcome::Rejected) => warn!(kind, "dispatch rejected by server"),
        Err(error) => warn!(kind, %error, "dispatch failed"),
    }
}

#[cfg(test)]
#[path = "tests/dispatch_tests.rs"]
mod tests;
