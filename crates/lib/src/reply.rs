//! Reply delivery back to a conversation thread.
//!
//! Two interchangeable strategies behind one trait, selected by config: a
//! raw fire-and-forget RPC send, and the `Bot` abstraction that waits for
//! the worker's response.

use crate::bot::{Bot, ACTION_SEND_TEXT};
use crate::broker::{RpcClient, RpcRequest};
use crate::config::ReplyMode;
use async_trait::async_trait;
use std::sync::Arc;

/// Delivers a text reply to a conversation thread.
#[async_trait]
pub trait ReplySender: Send + Sync {
    /// Send `text` to `thread_id`.
    async fn send_text(&self, thread_id: &str, text: &str) -> Result<(), String>;
}

/// Fire-and-forget sendText RPC with the message wrapped as preformatted markup.
pub struct DirectReplySender {
    client: RpcClient,
}

impl DirectReplySender {
    pub fn new(client: RpcClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl ReplySender for DirectReplySender {
    async fn send_text(&self, thread_id: &str, text: &str) -> Result<(), String> {
        let request = RpcRequest {
            method: ACTION_SEND_TEXT.to_string(),
            args: vec![thread_id.to_string(), wrap_as_preformatted(text)],
        };
        self.client.send(&request).await.map_err(|e| e.to_string())
    }
}

/// Replies through the `Bot` abstraction and waits for the worker's response.
pub struct BotReplySender {
    bot: Bot,
}

impl BotReplySender {
    pub fn new(bot: Bot) -> Self {
        Self { bot }
    }
}

#[async_trait]
impl ReplySender for BotReplySender {
    async fn send_text(&self, thread_id: &str, text: &str) -> Result<(), String> {
        self.bot.send_text(thread_id, text).await.map(|_| ())
    }
}

/// Build the reply sender selected by config, bound to the given worker identity.
pub fn reply_sender(
    mode: ReplyMode,
    worker_id: &str,
    base_url: Option<String>,
) -> Arc<dyn ReplySender> {
    match mode {
        ReplyMode::Direct => Arc::new(DirectReplySender::new(RpcClient::new(worker_id, base_url))),
        ReplyMode::Bot => Arc::new(BotReplySender::new(Bot::new(worker_id, base_url))),
    }
}

/// Wrap text in the chat client's preformatted markup so command output
/// renders monospaced.
pub fn wrap_as_preformatted(message: &str) -> String {
    format!(
        "<pre raw_pre=\"{{code}}\" raw_post=\"{{code}}\">{}</pre>",
        message
    )
}
