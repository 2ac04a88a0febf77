//! Published input state
//!
//! The snapshot is sized once from the bound slot table and then only ever
//! written through slot indices. Emission borrows it as a [`JoyMessage`].

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::normalize::{normalize_axis, normalize_button, ScalingPolicy};
use crate::profile::{Slot, SlotTable};

/// Last known value of every mapped control
#[derive(Debug, Clone, PartialEq)]
pub struct Snapshot {
    axes: Vec<f32>,
    buttons: Vec<i32>,
    frame_id: &'static str,
}

impl Snapshot {
    /// All-zero snapshot shaped after `slots`
    pub fn for_slots(slots: &SlotTable) -> Self {
        Self {
            axes: vec![0.0; slots.axis_count()],
            buttons: vec![0; slots.button_count()],
            frame_id: slots.variant().canonical_name(),
        }
    }

    pub fn axes(&self) -> &[f32] {
        &self.axes
    }

    pub fn buttons(&self) -> &[i32] {
        &self.buttons
    }

    pub fn frame_id(&self) -> &'static str {
        self.frame_id
    }

    /// Write a raw controller value into `slot`.
    ///
    /// Returns false, leaving the snapshot untouched, when `slot` lies outside
    /// this snapshot (a slot table bound to another variant).
    pub fn apply(&mut self, slot: Slot, raw: u8, policy: ScalingPolicy) -> bool {
        match slot {
            Slot::Axis(index) => match self.axes.get_mut(index) {
                Some(axis) => *axis = normalize_axis(raw, policy),
                None => return false,
            },
            Slot::Button(index) => match self.buttons.get_mut(index) {
                Some(button) => *button = normalize_button(raw) as i32,
                None => return false,
            },
        }
        true
    }

    /// Borrow the snapshot as an outgoing message
    pub fn stamped(&self, seq: u64, stamp: DateTime<Utc>) -> JoyMessage<'_> {
        JoyMessage {
            header: Header {
                seq,
                stamp,
                frame_id: self.frame_id,
            },
            axes: &self.axes,
            buttons: &self.buttons,
        }
    }
}

/// Message header
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Header {
    pub seq: u64,
    pub stamp: DateTime<Utc>,
    pub frame_id: &'static str,
}

/// Joystick-style message handed to a sink at emission time
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct JoyMessage<'a> {
    pub header: Header,
    pub axes: &'a [f32],
    pub buttons: &'a [i32],
}
