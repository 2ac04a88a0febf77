//! Outbound publish/subscribe sinks
//!
//! The poll loop hands each emitted snapshot to exactly one sink. Sinks only
//! see a borrowed [`JoyMessage`]; they serialize it and move on.

use anyhow::Result;
use async_trait::async_trait;

use crate::snapshot::JoyMessage;

/// Sink trait - all bus integrations implement this
#[async_trait]
pub trait SnapshotSink: Send + Sync {
    /// Get the sink name (e.g., "console", "mqtt")
    fn name(&self) -> &str;

    /// Publish one message. An error is fatal for the bridge.
    async fn publish(&self, message: &JoyMessage<'_>) -> Result<()>;

    /// Flush and disconnect
    async fn shutdown(&self) -> Result<()> {
        Ok(())
    }
}

pub mod console;
pub mod mqtt;

pub use console::ConsoleSink;
pub use mqtt::MqttSink;
