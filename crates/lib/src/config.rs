//! Configuration types and loading.
//!
//! Config is loaded from `config.json` in the working directory. A missing or
//! malformed file is a startup error: the relay refuses to serve traffic
//! without an explicit manager list.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Top-level application config. Constructed once at startup and treated as
/// immutable for the process lifetime (no reload).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Config {
    /// Sender identities allowed to issue commands. Exact string match only.
    #[serde(default)]
    pub managers: Vec<String>,

    /// Reply delivery settings.
    #[serde(default)]
    pub reply: ReplyConfig,

    /// Event consumer identity and worker pool settings.
    #[serde(default)]
    pub consumer: ConsumerConfig,

    /// Broker endpoint settings.
    #[serde(default)]
    pub broker: BrokerConfig,
}

impl Config {
    /// True iff `identity` exactly equals one configured manager entry.
    /// No case folding, no pattern matching.
    pub fn is_manager(&self, identity: &str) -> bool {
        self.managers.iter().any(|m| m == identity)
    }
}

/// Reply delivery settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReplyConfig {
    /// "direct" = fire-and-forget sendText RPC. "bot" = Bot abstraction, waits for the worker's response.
    #[serde(default)]
    pub mode: ReplyMode,
}

/// Which reply strategy to use.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReplyMode {
    /// Fire-and-forget RPC send; command output is wrapped as preformatted markup.
    #[default]
    Direct,

    /// Send through the Bot abstraction and wait for the worker's response.
    Bot,
}

/// Event consumer identity and worker pool settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConsumerConfig {
    /// Worker identity: the RPC reply target and bound bot identity. Overridden by WORKER_ID env when set.
    pub worker_id: Option<String>,

    /// Consumer identity for the broker event queue. Overridden by CONSUMER_ID env when set.
    pub consumer_id: Option<String>,

    /// Maximum concurrently running commands (default 8).
    #[serde(default = "default_worker_count")]
    pub worker_count: usize,

    /// Service name used in log lines (default "cmd-exec").
    #[serde(default = "default_service_name")]
    pub service_name: String,
}

fn default_worker_count() -> usize {
    8
}

fn default_service_name() -> String {
    "cmd-exec".to_string()
}

impl Default for ConsumerConfig {
    fn default() -> Self {
        Self {
            worker_id: None,
            consumer_id: None,
            worker_count: default_worker_count(),
            service_name: default_service_name(),
        }
    }
}

/// Broker endpoint settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BrokerConfig {
    /// Base URL of the broker HTTP endpoint. Overridden by BROKER_URL env when set.
    pub url: Option<String>,
}

/// Resolve the worker identity: env WORKER_ID overrides config.
pub fn resolve_worker_id(config: &Config) -> Option<String> {
    std::env::var("WORKER_ID")
        .ok()
        .and_then(|s| {
            let t = s.trim();
            if t.is_empty() {
                None
            } else {
                Some(t.to_string())
            }
        })
        .or_else(|| {
            config
                .consumer
                .worker_id
                .as_ref()
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
        })
}

/// Resolve the consumer identity: env CONSUMER_ID overrides config.
pub fn resolve_consumer_id(config: &Config) -> Option<String> {
    std::env::var("CONSUMER_ID")
        .ok()
        .and_then(|s| {
            let t = s.trim();
            if t.is_empty() {
                None
            } else {
                Some(t.to_string())
            }
        })
        .or_else(|| {
            config
                .consumer
                .consumer_id
                .as_ref()
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
        })
}

/// Resolve the broker base URL: env BROKER_URL overrides config. None falls
/// back to the client default.
pub fn resolve_broker_url(config: &Config) -> Option<String> {
    std::env::var("BROKER_URL")
        .ok()
        .and_then(|s| {
            let t = s.trim();
            if t.is_empty() {
                None
            } else {
                Some(t.to_string())
            }
        })
        .or_else(|| {
            config
                .broker
                .url
                .as_ref()
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
        })
}

/// Default config path: `config.json` in the working directory.
pub fn default_config_path() -> PathBuf {
    std::env::current_dir()
        .map(|d| d.join("config.json"))
        .unwrap_or_else(|_| PathBuf::from("config.json"))
}

/// Load config from the given path (or the default). A missing or malformed
/// file is an error; the caller is expected to treat it as fatal.
/// Returns the config and the path that was used.
pub fn load_config(path: Option<PathBuf>) -> Result<(Config, PathBuf)> {
    let path = path.unwrap_or_else(default_config_path);
    let s = std::fs::read_to_string(&path)
        .with_context(|| format!("reading config from {}", path.display()))?;
    let config: Config = serde_json::from_str(&s)
        .with_context(|| format!("parsing config from {}", path.display()))?;
    Ok((config, path))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn is_manager_exact_match_only() {
        let config = Config {
            managers: vec!["alice@example.com".to_string(), "bob".to_string()],
            ..Default::default()
        };
        assert!(config.is_manager("alice@example.com"));
        assert!(config.is_manager("bob"));
        assert!(!config.is_manager("Alice@example.com"));
        assert!(!config.is_manager("bob "));
        assert!(!config.is_manager(""));
    }

    #[test]
    fn is_manager_empty_list() {
        let config = Config::default();
        assert!(!config.is_manager("anyone"));
    }

    #[test]
    fn parse_managers_and_defaults() {
        let config: Config =
            serde_json::from_str(r#"{ "managers": ["alice", "bob"] }"#).expect("parse");
        assert_eq!(config.managers, vec!["alice", "bob"]);
        assert_eq!(config.reply.mode, ReplyMode::Direct);
        assert_eq!(config.consumer.worker_count, 8);
        assert_eq!(config.consumer.service_name, "cmd-exec");
        assert!(config.broker.url.is_none());
    }

    #[test]
    fn parse_full_config() {
        let config: Config = serde_json::from_str(
            r#"{
                "managers": ["alice"],
                "reply": { "mode": "bot" },
                "consumer": { "workerId": "w-1", "consumerId": "c-1", "workerCount": 2 },
                "broker": { "url": "http://broker.local:7780" }
            }"#,
        )
        .expect("parse");
        assert_eq!(config.reply.mode, ReplyMode::Bot);
        assert_eq!(config.consumer.worker_id.as_deref(), Some("w-1"));
        assert_eq!(config.consumer.consumer_id.as_deref(), Some("c-1"));
        assert_eq!(config.consumer.worker_count, 2);
        assert_eq!(
            config.broker.url.as_deref(),
            Some("http://broker.local:7780")
        );
    }

    #[test]
    fn malformed_config_is_an_error() {
        assert!(serde_json::from_str::<Config>("{ not json").is_err());
    }

    #[test]
    fn load_config_missing_file_is_an_error() {
        let path = std::env::temp_dir().join("cmdrelay-no-such-config.json");
        assert!(load_config(Some(path)).is_err());
    }
}
