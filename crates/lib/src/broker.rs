//! Broker RPC client (HTTP transport).
//!
//! The broker is an external collaborator: a request carries a method name
//! and an ordered list of string arguments, addressed to a named worker; a
//! response carries a success flag, a payload, and an error string. Only the
//! client side lives here. Every call is attempted exactly once; there is no
//! retry policy.

use serde::{Deserialize, Serialize};

pub(crate) const DEFAULT_BASE_URL: &str = "http://127.0.0.1:7780";

/// Wire request: `{ "method", "args" }`, delivered to a worker identity.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RpcRequest {
    pub method: String,
    #[serde(default)]
    pub args: Vec<String>,
}

/// Wire response: `{ "success", "response", "error" }`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RpcResponse {
    pub success: bool,
    #[serde(default)]
    pub response: serde_json::Value,
    #[serde(default)]
    pub error: String,
}

#[derive(Debug, thiserror::Error)]
pub enum BrokerError {
    #[error("broker request failed: {0}")]
    Request(#[from] reqwest::Error),
    #[error("broker api error: {0}")]
    Api(String),
}

/// Client for the broker RPC endpoint, bound to one target worker identity.
#[derive(Clone)]
pub struct RpcClient {
    base_url: String,
    worker_id: String,
    client: reqwest::Client,
}

impl RpcClient {
    pub fn new(worker_id: impl Into<String>, base_url: Option<String>) -> Self {
        let base_url = base_url
            .map(|u| u.trim_end_matches('/').to_string())
            .unwrap_or_else(|| DEFAULT_BASE_URL.to_string());
        Self {
            base_url,
            worker_id: worker_id.into(),
            client: reqwest::Client::new(),
        }
    }

    /// The target worker identity this client delivers to.
    pub fn worker_id(&self) -> &str {
        &self.worker_id
    }

    /// POST /rpc/{worker} -- fire-and-forget send; the response body is ignored.
    pub async fn send(&self, request: &RpcRequest) -> Result<(), BrokerError> {
        let url = format!("{}/rpc/{}", self.base_url, self.worker_id);
        let res = self.client.post(&url).json(request).send().await?;
        if !res.status().is_success() {
            let status = res.status();
            let body = res.text().await.unwrap_or_default();
            return Err(BrokerError::Api(format!("{} {}", status, body)));
        }
        Ok(())
    }

    /// POST /rpc/{worker}?wait=true -- send and wait for the worker's response.
    pub async fn send_and_receive(&self, request: &RpcRequest) -> Result<RpcResponse, BrokerError> {
        let url = format!("{}/rpc/{}?wait=true", self.base_url, self.worker_id);
        let res = self.client.post(&url).json(request).send().await?;
        if !res.status().is_success() {
            let status = res.status();
            let body = res.text().await.unwrap_or_default();
            return Err(BrokerError::Api(format!("{} {}", status, body)));
        }
        let data: RpcResponse = res.json().await?;
        Ok(data)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rpc_request_serializes_method_and_args() {
        let request = RpcRequest {
            method: "sendText".to_string(),
            args: vec!["thread-1".to_string(), "hello".to_string()],
        };
        let json = serde_json::to_value(&request).expect("serialize");
        assert_eq!(
            json,
            serde_json::json!({ "method": "sendText", "args": ["thread-1", "hello"] })
        );
    }

    #[test]
    fn rpc_response_deserializes_with_defaults() {
        let response: RpcResponse =
            serde_json::from_str(r#"{ "success": true }"#).expect("parse");
        assert!(response.success);
        assert!(response.response.is_null());
        assert_eq!(response.error, "");

        let response: RpcResponse =
            serde_json::from_str(r#"{ "success": false, "error": "worker offline" }"#)
                .expect("parse");
        assert!(!response.success);
        assert_eq!(response.error, "worker offline");
    }
}
