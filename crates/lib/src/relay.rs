//! Relay dispatcher: consumes inbound message events, authorizes senders,
//! and runs their commands through a bounded worker pool.
//!
//! Only direct messages (sender == thread) from configured managers are
//! treated as commands; everything else is dropped without a reply.

use crate::config::{self, Config};
use crate::events::{EventConsumer, EventConsumerConfig, MessageEvent};
use crate::exec;
use crate::reply::{self, ReplySender};
use anyhow::{Context, Result};
use std::sync::Arc;
use tokio::sync::{mpsc, Semaphore};
use tokio::task::JoinSet;

const INBOUND_CHANNEL_SIZE: usize = 64;
const ACK_MESSAGE: &str = "Processing command...";

/// Shared state for the relay (config and reply path). Read-only after startup.
#[derive(Clone)]
pub struct RelayState {
    pub config: Arc<Config>,
    pub reply: Arc<dyn ReplySender>,
}

/// An inbound event is an authorized command iff it is a direct message
/// (sender == thread) from a configured manager.
pub fn is_authorized_command(config: &Config, event: &MessageEvent) -> bool {
    event.is_direct() && config.is_manager(&event.from)
}

/// Run one command end to end: acknowledge, execute, deliver the result.
/// An ack failure is logged and swallowed; a failed result send is logged as
/// a warning and otherwise dropped (best-effort delivery).
async fn process_command(state: RelayState, event: MessageEvent) {
    let thread_id = event.thread_id;
    if let Err(e) = state.reply.send_text(&thread_id, ACK_MESSAGE).await {
        log::warn!("relay: failed to send acknowledgment: {}", e);
    }
    let (command, output) = exec::execute(&event.content).await;
    let message = format!("Command: {}\nResult:\n{}", command, output);
    if let Err(e) = state.reply.send_text(&thread_id, &message).await {
        log::warn!("relay: failed to deliver command result: {}", e);
    }
}

/// Dispatcher loop: one worker per authorized command, bounded by a
/// semaphore of `max_in_flight` permits. Workers are unordered relative to
/// each other; within a worker the ack, execution, and result send are
/// serialized. Drains remaining workers when the inbound channel closes.
pub async fn run_dispatcher(
    state: RelayState,
    mut inbound_rx: mpsc::Receiver<MessageEvent>,
    max_in_flight: usize,
) {
    let semaphore = Arc::new(Semaphore::new(max_in_flight));
    let mut workers = JoinSet::new();

    while let Some(event) = inbound_rx.recv().await {
        if !is_authorized_command(&state.config, &event) {
            continue;
        }
        log::info!("executing command: {}", event.content);
        let permit = match Arc::clone(&semaphore).acquire_owned().await {
            Ok(permit) => permit,
            Err(_) => break,
        };
        let worker_state = state.clone();
        workers.spawn(async move {
            let _permit = permit;
            process_command(worker_state, event).await;
        });

        while let Some(result) = workers.try_join_next() {
            if let Err(e) = result {
                log::warn!("relay: command worker crashed: {}", e);
            }
        }
    }

    while let Some(result) = workers.join_next().await {
        if let Err(e) = result {
            log::warn!("relay: command worker crashed: {}", e);
        }
    }
}

/// Run the relay: start the event consumer, dispatch authorized commands,
/// and block until a shutdown signal arrives. On shutdown the consumer loop
/// is stopped and awaited; in-flight command workers are neither awaited nor
/// canceled, so the process may exit while a child process or reply send is
/// still outstanding.
pub async fn run_relay(config: Config) -> Result<()> {
    let worker_id = config::resolve_worker_id(&config)
        .context("worker identity missing (set WORKER_ID or consumer.workerId)")?;
    let consumer_id = config::resolve_consumer_id(&config)
        .unwrap_or_else(|| format!("{}-consumer", worker_id));
    let base_url = config::resolve_broker_url(&config);

    let consumer_config = EventConsumerConfig {
        worker_id: worker_id.clone(),
        consumer_id,
        worker_count: config.consumer.worker_count.max(1),
        service_name: config.consumer.service_name.clone(),
    };
    let max_in_flight = consumer_config.worker_count;

    let state = RelayState {
        reply: reply::reply_sender(config.reply.mode, &worker_id, base_url.clone()),
        config: Arc::new(config),
    };
    log::info!(
        "{}: relaying commands for {} manager(s) as worker {}",
        consumer_config.service_name,
        state.config.managers.len(),
        worker_id
    );

    let consumer = Arc::new(EventConsumer::new(consumer_config, base_url));
    let (inbound_tx, inbound_rx) = mpsc::channel::<MessageEvent>(INBOUND_CHANNEL_SIZE);
    let consumer_handle = consumer.clone().start_inbound(inbound_tx);

    {
        let state = state.clone();
        tokio::spawn(async move {
            run_dispatcher(state, inbound_rx, max_in_flight).await;
        });
    }

    shutdown_signal().await;
    log::info!("shutdown signal received, stopping event consumer");
    consumer.stop();
    let _ = consumer_handle.await;
    log::info!("relay stopped");
    Ok(())
}

/// Future that completes when the process should shut down (SIGINT or SIGTERM).
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
