//! Thin client for the conversational assistant.

use std::sync::{Arc, Mutex, MutexGuard};

use async_trait::async_trait;
use reqwest::Client;
use shared::protocol::ChatReply;
use tracing::warn;

use crate::{
    config::ClientConfig,
    error::GatewayError,
    gateway::{decode_json, transport_error},
};

pub const NO_REPLY_TEXT: &str = "⚠ No response from AI model.";
pub const UNREACHABLE_TEXT: &str = "⚠ Server not responding. Please try again later.";

#[async_trait]
pub trait ChatBackend: Send + Sync {
    async fn ask(&self, message: &str) -> Result<ChatReply, GatewayError>;
}

pub struct HttpChatBackend {
    http: Client,
    config: Arc<ClientConfig>,
}

impl HttpChatBackend {
    pub fn new(config: Arc<ClientConfig>) -> Self {
        Self {
            http: Client::new(),
            config,
        }
    }
}

#[async_trait]
impl ChatBackend for HttpChatBackend {
    async fn ask(&self, message: &str) -> Result<ChatReply, GatewayError> {
        let mut url = self.config.chat_url.clone();
        url.query_pairs_mut().clear().append_pair("message", message);

        let res = self
            .http
            .get(url.clone())
            .send()
            .await
            .map_err(|source| transport_error(&url, source))?;
        if !res.status().is_success() {
            return Err(GatewayError::Status {
                endpoint: url.to_string(),
                status: res.status().as_u16(),
            });
        }
        decode_json(&url, res).await
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChatSender {
    User,
    Bot,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatMessage {
    pub sender: ChatSender,
    pub text: String,
}

#[derive(Default)]
struct ChatState {
    messages: Vec<ChatMessage>,
    loading: bool,
}

pub struct ChatSession {
    backend: Arc<dyn ChatBackend>,
    state: Mutex<ChatState>,
}

impl ChatSession {
    pub fn new(backend: Arc<dyn ChatBackend>) -> Self {
        Self {
            backend,
            state: Mutex::new(ChatState::default()),
        }
    }

    fn lock(&self) -> MutexGuard<'_, ChatState> {
        match self.state.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    pub fn messages(&self) -> Vec<ChatMessage> {
        self.lock().messages.clone()
    }

    pub fn is_loading(&self) -> bool {
        self.lock().loading
    }

    /// Posts `input` and waits for the assistant. Returns the bot message, or
    /// `None` when the input is blank or a question is already pending.
    pub async fn send(&self, input: &str) -> Option<ChatMessage> {
        {
            let mut state = self.lock();
            if input.trim().is_empty() || state.loading {
                return None;
            }
            state.messages.push(ChatMessage {
                sender: ChatSender::User,
                text: input.to_string(),
            });
            state.loading = true;
        }
        let _loading = LoadingGuard(self);

        let text = match self.backend.ask(input).await {
            Ok(ChatReply {
                reply: Some(reply),
            }) if !reply.is_empty() => reply,
            Ok(_) => NO_REPLY_TEXT.to_string(),
            Err(error) => {
                warn!(%error, "chat backend unavailable");
                UNREACHABLE_TEXT.to_string()
            }
        };

        let reply = ChatMessage {
            sender: ChatSender::Bot,
            text,
        };
        self.lock().messages.push(reply.clone());
        Some(reply)
    }
}

/// Clears `loading` if a pending question is abandoned.
struct LoadingGuard<'a>(&'a ChatSession);

impl Drop for LoadingGuard<'_> {
    fn drop(&mut self) {
        self.0.lock().loading = false;
    }
}

#[cfg(test)]
#[path = "tests/chat_tests.rs"]
mod tests;
