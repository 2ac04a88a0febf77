//! Domain errors for device identification and profile binding

use thiserror::Error;

/// Failures while picking the MIDI input port
#[derive(Debug, Error, PartialEq, Eq)]
pub enum IdentifyError {
    /// No enumerated port advertises a nanoKONTROL name
    #[error("Cannot find nanoKONTROL or nanoKONTROL2 among {available} MIDI input port(s)")]
    NoDeviceFound { available: usize },

    /// The explicit port override does not name an enumerated port
    #[error("MIDI input port {index} does not exist ({available} port(s) available)")]
    PortOutOfRange { index: usize, available: usize },
}

/// A profile table that breaks the one-id-one-slot rule
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ProfileError {
    #[error("control {control_id} is listed twice among the {class} controls of {variant}")]
    DuplicateControl {
        variant: &'static str,
        class: &'static str,
        control_id: u8,
    },

    #[error("control {control_id} of {variant} is both an axis and a button")]
    SharedControl { variant: &'static str, control_id: u8 },
}
