//! MIDI frame decoding
//!
//! The nanoKONTROL surfaces report every slider, knob and button as a
//! Control Change on channel 1. Everything else arriving on the port
//! (SysEx scene dumps, clock, other channels) is noise for the bridge.

use std::fmt;

/// Status byte of a Control Change on channel 1
pub const CONTROL_CHANGE: u8 = 0xB0;

/// One raw read from the MIDI input
pub type RawFrame = Vec<u8>;

/// A decoded Control Change: status, controller number, 7-bit value
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ControlEvent {
    pub status: u8,
    pub control_id: u8,
    pub value: u8,
}

impl ControlEvent {
    /// Decode a single frame.
    ///
    /// Returns `None` unless the frame is exactly three bytes long and starts
    /// with [`CONTROL_CHANGE`]. Frames are never buffered between calls.
    pub fn decode(frame: &[u8]) -> Option<Self> {
        match *frame {
            [CONTROL_CHANGE, control_id, value] => Some(Self {
                status: CONTROL_CHANGE,
                control_id,
                value,
            }),
            _ => None,
        }
    }
}

impl fmt::Display for ControlEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "CC cc:{} v:{}", self.control_id, self.value)
    }
}

/// Decode every frame in `frames`, dropping the ones that are not Control Changes
pub fn decode_all<'a, I>(frames: I) -> impl Iterator<Item = ControlEvent> + 'a
where
    I: IntoIterator<Item = &'a RawFrame>,
    I::IntoIter: 'a,
{
    frames.into_iter().filter_map(|frame| {
        let event = ControlEvent::decode(frame);
        if event.is_none() {
            tracing::trace!("Ignoring frame: {}", format_hex(frame));
        }
        event
    })
}

/// Format MIDI bytes as hex string for debugging
pub fn format_hex(data: &[u8]) -> String {
    data.iter()
        .map(|b| format!("{:02X}", b))
        .collect::<Vec<_>>()
        .join(" ")
}
