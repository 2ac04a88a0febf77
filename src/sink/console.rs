//! Console sink - one JSON document per line on stdout

use anyhow::{Context, Result};
use async_trait::async_trait;
use std::io::Write;
use std::sync::atomic::{AtomicU64, Ordering};
use tracing::debug;

use super::SnapshotSink;
use crate::snapshot::JoyMessage;

/// ConsoleSink writes every message as a JSON line
///
/// Useful for piping into other tools or checking a surface without a broker.
pub struct ConsoleSink {
    name: String,
    /// Published message counter for debugging
    published: AtomicU64,
}

impl ConsoleSink {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            published: AtomicU64::new(0),
        }
    }

    pub fn published(&self) -> u64 {
        self.published.load(Ordering::Relaxed)
    }

    /// Render a message as a single line
    pub fn render(message: &JoyMessage<'_>) -> Result<String> {
        serde_json::to_string(message).context("Failed to serialize joy message")
    }
}

#[async_trait]
impl SnapshotSink for ConsoleSink {
    fn name(&self) -> &str {
        &self.name
    }

    async fn publish(&self, message: &JoyMessage<'_>) -> Result<()> {
        let line = Self::render(message)?;

        {
            let mut stdout = std::io::stdout().lock();
            writeln!(stdout, "{}", line).context("Failed to write to stdout")?;
        }

        let count = self.published.fetch_add(1, Ordering::Relaxed) + 1;
        debug!("📤 [{}] message #{} (seq {})", self.name, count, message.header.seq);
        Ok(())
    }

    async fn shutdown(&self) -> Result<()> {
        std::io::stdout().flush().context("Failed to flush stdout")?;
        debug!("ConsoleSink '{}' published {} message(s)", self.name, self.published());
        Ok(())
    }
}
