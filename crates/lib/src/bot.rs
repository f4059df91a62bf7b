//! Bot abstraction over the broker RPC client.
//!
//! A `Bot` is bound to one worker identity and exposes named actions. Each
//! action is an RPC call that waits for the worker's response; a non-success
//! response becomes an error carrying the response's error text.

use crate::broker::{RpcClient, RpcRequest};

pub const ACTION_SEND_TEXT: &str = "sendText";
pub const ACTION_SEND_IMAGE: &str = "sendImage";

/// Messaging bot addressed by worker identity.
#[derive(Clone)]
pub struct Bot {
    client: RpcClient,
}

impl Bot {
    pub fn new(bot_id: impl Into<String>, base_url: Option<String>) -> Self {
        Self {
            client: RpcClient::new(bot_id, base_url),
        }
    }

    /// The bound worker identity.
    pub fn bot_id(&self) -> &str {
        self.client.worker_id()
    }

    /// Send a text message to a conversation thread.
    pub async fn send_text(&self, target: &str, message: &str) -> Result<serde_json::Value, String> {
        self.action(ACTION_SEND_TEXT, &[target, message]).await
    }

    /// Send an image by URL to a conversation thread.
    pub async fn send_image(
        &self,
        target: &str,
        image_url: &str,
    ) -> Result<serde_json::Value, String> {
        self.action(ACTION_SEND_IMAGE, &[target, image_url]).await
    }

    /// Issue a named action and wait for the worker's response.
    async fn action(&self, action: &str, args: &[&str]) -> Result<serde_json::Value, String> {
        let request = RpcRequest {
            method: action.to_string(),
            args: args.iter().map(|s| s.to_string()).collect(),
        };
        let received = self
            .client
            .send_and_receive(&request)
            .await
            .map_err(|e| e.to_string())?;
        if received.success {
            Ok(received.response)
        } else {
            Err(received.error)
        }
    }
}
