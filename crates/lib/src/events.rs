//! Event consumer: long-polls the broker for inbound message events and
//! forwards them to the relay dispatcher.

use crate::broker::DEFAULT_BASE_URL;
use serde::Deserialize;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

const LONG_POLL_TIMEOUT: u64 = 30;

/// Inbound message event from the broker: sender identity, conversation
/// thread identity, and text content. Not produced here, only read.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MessageEvent {
    pub from: String,
    pub thread_id: String,
    #[serde(default)]
    pub content: String,
}

impl MessageEvent {
    /// True when the event is a direct (private) message: sender and thread coincide.
    pub fn is_direct(&self) -> bool {
        self.from == self.thread_id
    }
}

/// Consumer identity and pool settings, resolved from config and env.
#[derive(Debug, Clone)]
pub struct EventConsumerConfig {
    pub worker_id: String,
    pub consumer_id: String,
    pub worker_count: usize,
    pub service_name: String,
}

/// Broker event connector: long-polls for message events and forwards them
/// to the dispatcher over an mpsc channel.
pub struct EventConsumer {
    config: EventConsumerConfig,
    base_url: String,
    running: AtomicBool,
    client: reqwest::Client,
}

impl EventConsumer {
    pub fn new(config: EventConsumerConfig, base_url: Option<String>) -> Self {
        let base_url = base_url
            .map(|u| u.trim_end_matches('/').to_string())
            .unwrap_or_else(|| DEFAULT_BASE_URL.to_string());
        Self {
            config,
            base_url,
            running: AtomicBool::new(false),
            client: reqwest::Client::new(),
        }
    }

    fn running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    /// Ask the long-poll loop to stop after its current iteration.
    pub fn stop(&self) {
        self.running.store(false, Ordering::SeqCst);
    }

    /// Start the long-poll loop and forward events. Returns a handle to await on shutdown.
    pub fn start_inbound(self: Arc<Self>, inbound_tx: mpsc::Sender<MessageEvent>) -> JoinHandle<()> {
        self.running.store(true, Ordering::SeqCst);
        log::info!(
            "{}: starting event long-poll loop for consumer {}",
            self.config.service_name,
            self.config.consumer_id
        );
        tokio::spawn(async move {
            run_event_loop(self, inbound_tx).await;
        })
    }

    /// GET /consumers/{consumer}/events (long poll).
    async fn poll_events(&self) -> Result<Vec<MessageEvent>, String> {
        let url = format!(
            "{}/consumers/{}/events?timeout={}",
            self.base_url, self.config.consumer_id, LONG_POLL_TIMEOUT
        );
        let res = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| e.to_string())?;
        if !res.status().is_success() {
            let status = res.status();
            let body = res.text().await.unwrap_or_default();
            return Err(format!("poll events failed: {} {}", status, body));
        }
        let events: Vec<MessageEvent> = res.json().await.map_err(|e| e.to_string())?;
        Ok(events)
    }
}

async fn run_event_loop(consumer: Arc<EventConsumer>, inbound_tx: mpsc::Sender<MessageEvent>) {
    while consumer.running() {
        match consumer.poll_events().await {
            Ok(events) => {
                for event in events {
                    if inbound_tx.send(event).await.is_err() {
                        log::debug!("event consumer: inbound channel closed, stopping loop");
                        return;
                    }
                }
            }
            Err(e) => {
                log::debug!("event poll error: {}", e);
                tokio::time::sleep(tokio::time::Duration::from_secs(2)).await;
            }
        }
    }
    log::info!("event consumer: long-poll loop stopped");
}
