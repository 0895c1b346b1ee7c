use super::*;
use anyhow::Result;
use axum::{extract::Query, routing::get, Json, Router};
use serde::Deserialize;
use std::{collections::HashMap, time::Duration};
use tokio::net::TcpListener;

#[derive(Debug, Deserialize)]
struct ChatQuery {
    message: String,
}

async fn spawn_chat_server(app: Router) -> Result<String> {
    std::env::set_var("NO_PROXY", "127.0.0.1,localhost");
    let listener = TcpListener::bind("127.0.0.1:0").await?;
    let addr = listener.local_addr()?;
    tokio::spawn(async move {
        let _ = axum::serve(listener, app).await;
    });
    Ok(format!("http://{addr}"))
}

fn session_for(chat_url: &str) -> ChatSession {
    let config = ClientConfig::default()
        .with_chat_url(chat_url)
        .expect("chat url");
    ChatSession::new(Arc::new(HttpChatBackend::new(Arc::new(config))))
}

#[tokio::test]
async fn question_is_url_encoded_and_reply_appended() {
    let app = Router::new().route(
        "/",
        get(|Query(q): Query<ChatQuery>| async move {
            Json(ChatReply {
                reply: Some(format!("echo: {}", q.message)),
            })
        }),
    );
    let url = spawn_chat_server(app).await.expect("spawn");
    let session = session_for(&url);

    let reply = session
        .send("Is 37.5 °C a fever? & what now")
        .await
        .expect("reply");
    assert_eq!(reply.sender, ChatSender::Bot);
    assert_eq!(reply.text, "echo: Is 37.5 °C a fever? & what now");

    let messages = session.messages();
    assert_eq!(messages.len(), 2);
    assert_eq!(messages[0].sender, ChatSender::User);
    assert!(!session.is_loading());
}

#[tokio::test]
async fn empty_reply_uses_fallback_text() {
    let app = Router::new().route(
        "/",
        get(|| async { Json(HashMap::<String, String>::new()) }),
    );
    let url = spawn_chat_server(app).await.expect("spawn");
    let session = session_for(&url);

    let reply = session.send("hello").await.expect("reply");
    assert_eq!(reply.text, NO_REPLY_TEXT);
}

#[tokio::test]
async fn unreachable_backend_reports_server_down() {
    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
    let addr = listener.local_addr().expect("addr");
    drop(listener);
    let session = session_for(&format!("http://{addr}"));

    let reply = session.send("hello").await.expect("reply");
    assert_eq!(reply.text, UNREACHABLE_TEXT);
    assert!(!session.is_loading());
}

#[tokio::test]
async fn blank_input_is_ignored() {
    let session = session_for("http://127.0.0.1:9");
    assert!(session.send("   ").await.is_none());
    assert!(session.messages().is_empty());
}

struct StalledBackend;

#[async_trait]
impl ChatBackend for StalledBackend {
    async fn ask(&self, message: &str) -> Result<ChatReply, GatewayError> {
        tokio::time::sleep(Duration::from_secs(10)).await;
        Ok(ChatReply {
            reply: Some(format!("late: {message}")),
        })
    }
}

#[tokio::test(start_paused = true)]
async fn abandoned_question_does_not_block_the_next_one() {
    let session = ChatSession::new(Arc::new(StalledBackend));

    let abandoned =
        tokio::time::timeout(Duration::from_millis(100), session.send("first")).await;
    assert!(abandoned.is_err());
    assert!(!session.is_loading());

    let reply = session.send("second").await.expect("reply");
    assert_eq!(reply.text, "late: second");
    assert_eq!(session.messages().len(), 3);
}
