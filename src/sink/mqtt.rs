//! MQTT sink
//!
//! Publishes each message as JSON on one topic. rumqttc needs its event loop
//! polled for anything to reach the broker, so a background task drives it
//! for the lifetime of the sink.
//!
//! The client only drains its request queue while connected. Publishing
//! never waits for room in that queue: with the broker away, messages that
//! do not fit are dropped so the poll loop keeps its cadence.

use anyhow::{Context, Result};
use async_trait::async_trait;
use rumqttc::{AsyncClient, ClientError, Event, MqttOptions, Packet, QoS};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use super::SnapshotSink;
use crate::snapshot::JoyMessage;

/// Requests buffered between the sink and the rumqttc event loop
pub const REQUEST_CAPACITY: usize = 100;

/// Broker connection settings
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MqttSettings {
    pub client_id: String,
    pub host: String,
    pub port: u16,
    pub topic: String,
}

/// MqttSink publishes joy messages to a broker
pub struct MqttSink {
    client: AsyncClient,
    topic: String,
    published: AtomicU64,
    dropped: AtomicU64,
    /// Set while the request queue is full, so the drop is logged once
    overflowing: AtomicBool,
    event_loop: JoinHandle<()>,
}

impl MqttSink {
    /// Create the client and start driving its event loop
    pub fn connect(settings: &MqttSettings) -> Self {
        let mut options = MqttOptions::new(&settings.client_id, &settings.host, settings.port);
        options.set_keep_alive(Duration::from_secs(5));

        let (client, mut event_loop) = AsyncClient::new(options, REQUEST_CAPACITY);

        info!(
            "MQTT sink publishing to {}:{} on topic '{}'",
            settings.host, settings.port, settings.topic
        );

        let event_loop = tokio::spawn(async move {
            loop {
                match event_loop.poll().await {
                    Ok(Event::Incoming(Packet::ConnAck(_))) => info!("✅ MQTT broker connected"),
                    Ok(event) => debug!("MQTT event: {:?}", event),
                    Err(e) => {
                        warn!("MQTT connection error: {}", e);
                        tokio::time::sleep(Duration::from_secs(1)).await;
                    }
                }
            }
        });

        Self {
            client,
            topic: settings.topic.clone(),
            published: AtomicU64::new(0),
            dropped: AtomicU64::new(0),
            overflowing: AtomicBool::new(false),
            event_loop,
        }
    }

    pub fn topic(&self) -> &str {
        &self.topic
    }

    /// Messages handed to the client
    pub fn published(&self) -> u64 {
        self.published.load(Ordering::Relaxed)
    }

    /// Messages dropped because the request queue was full
    pub fn dropped(&self) -> u64 {
        self.dropped.load(Ordering::Relaxed)
    }
}

#[async_trait]
impl SnapshotSink for MqttSink {
    fn name(&self) -> &str {
        "mqtt"
    }

    async fn publish(&self, message: &JoyMessage<'_>) -> Result<()> {
        let payload = serde_json::to_vec(message).context("Failed to serialize joy message")?;

        match self.client.try_publish(&self.topic, QoS::AtMostOnce, false, payload) {
            Ok(()) => {
                self.published.fetch_add(1, Ordering::Relaxed);
                if self.overflowing.swap(false, Ordering::Relaxed) {
                    info!(
                        "MQTT queue drained, {} message(s) dropped so far",
                        self.dropped()
                    );
                }
                Ok(())
            }
            Err(ClientError::TryRequest(_)) if !self.event_loop.is_finished() => {
                self.dropped.fetch_add(1, Ordering::Relaxed);
                if !self.overflowing.swap(true, Ordering::Relaxed) {
                    warn!(
                        "MQTT queue full (broker unreachable?), dropping messages for '{}'",
                        self.topic
                    );
                }
                Ok(())
            }
            Err(e) => Err(e)
                .with_context(|| format!("Failed to publish to topic '{}'", self.topic)),
        }
    }

    async fn shutdown(&self) -> Result<()> {
        if let Err(e) = self.client.try_disconnect() {
            debug!("MQTT disconnect failed: {}", e);
        }
        self.event_loop.abort();
        info!(
            "MQTT sink stopped after {} message(s), {} dropped",
            self.published(),
            self.dropped()
        );
        Ok(())
    }
}
