//! nanoKONTROL input connection
//!
//! midir delivers complete messages on its own thread. The callback only
//! queues the raw bytes; the poll loop drains the queue without blocking.

pub mod discovery;

use anyhow::{bail, Context, Result};
use midir::{Ignore, MidiInput, MidiInputConnection};
use tokio::sync::mpsc::{self, error::TryRecvError, error::TrySendError};
use tracing::{debug, info, warn};

use crate::midi::{format_hex, RawFrame};
use crate::profile::DeviceVariant;

/// Queue depth between the MIDI callback and the poll loop
pub const FRAME_QUEUE_CAPACITY: usize = 1000;

/// Source of raw MIDI frames for the poll loop
pub trait FrameSource {
    /// Every frame buffered since the previous call, oldest first.
    ///
    /// Must return promptly with an empty vector when nothing is pending.
    fn drain(&mut self) -> Result<Vec<RawFrame>>;
}

/// Frames received from a nanoKONTROL input port
pub struct MidiFrameSource {
    /// Kept alive for the lifetime of the source
    _connection: MidiInputConnection<QueueOverflow>,
    frame_rx: mpsc::Receiver<RawFrame>,
    port_name: String,
    variant: DeviceVariant,
}

impl MidiFrameSource {
    /// Open input port `index`
    pub fn open(index: usize, variant: DeviceVariant) -> Result<Self> {
        let mut midi_in = MidiInput::new("nanoKONTROL-Bridge-Input")
            .context("Failed to create MIDI input")?;
        // SysEx, timing and active sensing are decoded away later
        midi_in.ignore(Ignore::None);

        let port = midi_in
            .ports()
            .into_iter()
            .nth(index)
            .ok_or_else(|| anyhow::anyhow!("MIDI input port {} disappeared", index))?;
        let port_name = midi_in
            .port_name(&port)
            .with_context(|| format!("Failed to read name of MIDI input port {}", index))?;

        info!("Connecting to input port {}: {} ({})", index, port_name, variant);

        let (frame_tx, frame_rx) = mpsc::channel(FRAME_QUEUE_CAPACITY);

        let connection = midi_in
            .connect(
                &port,
                "nanoKONTROL-Bridge",
                move |_timestamp, data, overflow: &mut QueueOverflow| {
                    if data.is_empty() {
                        return;
                    }
                    match frame_tx.try_send(data.to_vec()) {
                        Ok(()) => {
                            if let Some(dropped) = overflow.delivered() {
                                warn!("Frame queue recovered after dropping {} frame(s)", dropped);
                            }
                        }
                        Err(TrySendError::Full(frame)) => {
                            if overflow.dropped() {
                                warn!("Frame queue full, dropping frames from {}", format_hex(&frame));
                            }
                        }
                        Err(TrySendError::Closed(_)) => {}
                    }
                },
                QueueOverflow::default(),
            )
            .map_err(|e| anyhow::anyhow!("{}", e))
            .with_context(|| format!("Failed to connect to input port {}", port_name))?;

        Ok(Self {
            _connection: connection,
            frame_rx,
            port_name,
            variant,
        })
    }

    pub fn port_name(&self) -> &str {
        &self.port_name
    }

    pub fn variant(&self) -> DeviceVariant {
        self.variant
    }
}

impl FrameSource for MidiFrameSource {
    fn drain(&mut self) -> Result<Vec<RawFrame>> {
        drain_channel(&mut self.frame_rx)
            .with_context(|| format!("MIDI input '{}' stopped delivering frames", self.port_name))
    }
}

/// Tracks one run of frames dropped on a full queue
#[derive(Debug, Default)]
struct QueueOverflow {
    dropped: u64,
}

impl QueueOverflow {
    /// Count a dropped frame; true for the first drop of a run
    fn dropped(&mut self) -> bool {
        self.dropped += 1;
        self.dropped == 1
    }

    /// A frame got through; ends the current run and returns its length
    fn delivered(&mut self) -> Option<u64> {
        match std::mem::take(&mut self.dropped) {
            0 => None,
            dropped => Some(dropped),
        }
    }
}

/// Empty `rx` without waiting
fn drain_channel(rx: &mut mpsc::Receiver<RawFrame>) -> Result<Vec<RawFrame>> {
    let mut frames = Vec::new();
    loop {
        match rx.try_recv() {
            Ok(frame) => frames.push(frame),
            Err(TryRecvError::Empty) => break,
            Err(TryRecvError::Disconnected) => {
                if frames.is_empty() {
                    bail!("frame channel closed");
                }
                break;
            }
        }
    }

    if !frames.is_empty() {
        debug!("Drained {} frame(s)", frames.len());
    }
    Ok(frames)
}
