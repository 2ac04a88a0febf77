//! Scaling of 7-bit controller values.
//!
//! # Axis Scaling
//!
//! A 7-bit controller has no exact midpoint: 63 and 64 sit on either side of
//! 63.5. Centered scaling keeps that asymmetry, so a slider parked in the
//! middle reads slightly below or slightly above zero, never exactly zero.
//!
//! # Key Functions
//!
//! - [`normalize_axis`]: slider/knob value to `[-1, 1]` or `[0, 1]`
//! - [`normalize_button`]: button value to pressed/released

/// Largest value of a 7-bit MIDI data byte
pub const MAX_7BIT: u8 = 127;

/// Center of the 7-bit range used by [`ScalingPolicy::Centered`]
const CENTER: f32 = 63.5;

/// Output range of axis slots, fixed at startup
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ScalingPolicy {
    /// `[-1.0, 1.0]`, 63.5 maps to 0.0
    #[default]
    Centered,
    /// `[0.0, 1.0]`
    Unipolar,
}

/// Normalize a slider or knob value.
///
/// Values above 127 are clamped before scaling.
///
/// # Example
/// ```
/// use nanokontrol_bridge::normalize::{normalize_axis, ScalingPolicy};
///
/// assert_eq!(normalize_axis(127, ScalingPolicy::Unipolar), 1.0);
/// assert_eq!(normalize_axis(0, ScalingPolicy::Centered), -1.0);
/// assert!(normalize_axis(63, ScalingPolicy::Centered) < 0.0);
/// ```
pub fn normalize_axis(raw: u8, policy: ScalingPolicy) -> f32 {
    let raw = raw.min(MAX_7BIT) as f32;
    match policy {
        ScalingPolicy::Centered => (raw - CENTER) / CENTER,
        ScalingPolicy::Unipolar => raw / MAX_7BIT as f32,
    }
}

/// A button reads as pressed for any non-zero value
pub fn normalize_button(raw: u8) -> bool {
    raw > 0
}
