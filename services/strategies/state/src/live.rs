//! WebSocket log subscription with reconnection
//!
//! Subscribes with `eth_subscribe("logs")` for the router's filter and feeds
//! every notification to the router in arrival order. A dropped connection
//! is retried with exponential backoff; every (re)subscription is followed by
//! a resync of all tracked pools at the current head block, since logs may
//! have been missed. Notifications buffered during the resync from blocks it
//! already covered are skipped by the synchronizers.

use crate::feed::{LogRouter, Routed};
use anyhow::{anyhow, Context, Result};
use chain_reader::RemoteReader;
use futures::{SinkExt, StreamExt};
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::Duration;
use tokio_tungstenite::{connect_async, tungstenite::Message};
use tracing::{debug, error, info, warn};
use web3::types::Log;

/// Reconnection policy
#[derive(Debug, Clone, Copy)]
pub struct Backoff {
    pub base_ms: u64,
    pub max_ms: u64,
    pub max_attempts: u32,
}

impl Default for Backoff {
    fn default() -> Self {
        Self {
            base_ms: 1000,
            max_ms: 30000,
            max_attempts: 10,
        }
    }
}

impl Backoff {
    /// Delay before reconnect attempt `attempt` (1-based)
    pub fn delay(&self, attempt: u32) -> Duration {
        let factor = 1u64.checked_shl(attempt.saturating_sub(1)).unwrap_or(u64::MAX);
        Duration::from_millis(self.base_ms.saturating_mul(factor).min(self.max_ms))
    }
}

pub struct LiveFeed {
    ws_url: String,
    router: Arc<LogRouter>,
    reader: Arc<dyn RemoteReader>,
    backoff: Backoff,
}

impl LiveFeed {
    pub fn new(
        ws_url: impl Into<String>,
        router: Arc<LogRouter>,
        reader: Arc<dyn RemoteReader>,
        backoff: Backoff,
    ) -> Self {
        Self {
            ws_url: ws_url.into(),
            router,
            reader,
            backoff,
        }
    }

    /// Run until the reconnect budget is exhausted
    pub async fn run(&self) -> Result<()> {
        let mut attempt = 0u32;

        loop {
            match self.stream_once().await {
                Ok(()) => {
                    warn!("Log subscription closed");
                    attempt = 0;
                }
                Err(e) => error!("Log subscription failed: {:#}", e),
            }

            attempt += 1;
            if attempt > self.backoff.max_attempts {
                return Err(anyhow!(
                    "giving up on {} after {} reconnect attempts",
                    self.ws_url,
                    self.backoff.max_attempts
                ));
            }

            let delay = self.backoff.delay(attempt);
            info!("Reconnecting in {:?} (attempt {})", delay, attempt);
            tokio::time::sleep(delay).await;
        }
    }

    /// One connection lifetime; errors only before the subscription is up
    async fn stream_once(&self) -> Result<()> {
        info!("🔗 Connecting to {}", self.ws_url);
        let (ws_stream, _) = connect_async(self.ws_url.as_str())
            .await
            .with_context(|| format!("failed to connect to {}", self.ws_url))?;
        let (mut ws_sender, mut ws_receiver) = ws_stream.split();

        let filter = serde_json::to_value(self.router.subscription_filter())?;
        let subscription = json!({
            "jsonrpc": "2.0",
            "id": 1,
            "method": "eth_subscribe",
            "params": ["logs", filter],
        });
        ws_sender
            .send(Message::Text(subscription.to_string()))
            .await
            .context("failed to send subscription")?;

        info!("✅ Subscribed to pool and factory logs");
        let head = self
            .reader
            .block_number()
            .await
            .context("failed to read head block for resync")?;
        self.router.resync_all(self.reader.as_ref(), Some(head)).await;

        while let Some(message) = ws_receiver.next().await {
            match message {
                Ok(Message::Text(text)) => match parse_notification(&text) {
                    Ok(Some(log)) => {
                        if let Routed::NewPool(pool) = self.router.route(&log) {
                            debug!("Registry extended with {:?}", pool.address);
                        }
                    }
                    Ok(None) => {}
                    Err(e) => warn!("Dropping unparsable notification: {}", e),
                },
                Ok(Message::Close(_)) => break,
                Err(e) => {
                    error!("WebSocket error: {}", e);
                    break;
                }
                _ => {}
            }
        }

        Ok(())
    }
}

/// Extract the log from an `eth_subscription` notification. Other messages
/// (such as the subscription id reply) yield `None`.
pub fn parse_notification(message: &str) -> Result<Option<Log>> {
    let value: Value = serde_json::from_str(message).context("invalid JSON")?;

    if value.get("method").and_then(Value::as_str) != Some("eth_subscription") {
        if let Some(error) = value.get("error") {
            return Err(anyhow!("subscription error: {}", error));
        }
        return Ok(None);
    }

    let result = value
        .get("params")
        .and_then(|params| params.get("result"))
        .cloned()
        .ok_or_else(|| anyhow!("notification without params.result"))?;

    let log = serde_json::from_value(result).context("notification result is not a log")?;
    Ok(Some(log))
}
