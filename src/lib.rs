//! nanoKONTROL Bridge
//!
//! Reads control changes from a Korg nanoKONTROL or nanoKONTROL2 and
//! republishes them as normalized joystick-style messages at a fixed rate.

pub mod config;
pub mod device;
pub mod error;
pub mod midi;
pub mod normalize;
pub mod poll;
pub mod profile;
pub mod sink;
pub mod snapshot;

pub use error::{IdentifyError, ProfileError};
