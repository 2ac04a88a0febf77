//! Port discovery and device identification

use anyhow::{Context, Result};
use colored::*;
use midir::MidiInput;
use tracing::{debug, info};

use crate::error::IdentifyError;
use crate::profile::{DeviceVariant, FAMILY_FRAGMENT};

/// An enumerated MIDI input port
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PortDescriptor {
    pub index: usize,
    pub name: String,
}

impl PortDescriptor {
    pub fn new(index: usize, name: impl Into<String>) -> Self {
        Self {
            index,
            name: name.into(),
        }
    }

    /// Case-insensitive match on the family fragment
    fn is_family_member(&self) -> bool {
        self.name
            .to_lowercase()
            .contains(&FAMILY_FRAGMENT.to_lowercase())
    }
}

/// Enumerate the MIDI input ports in system order
pub fn enumerate_input_ports() -> Result<Vec<PortDescriptor>> {
    let midi_in = MidiInput::new("nanoKONTROL-Bridge-Discovery")
        .context("Failed to create MIDI input")?;

    let mut ports = Vec::new();
    for (index, port) in midi_in.ports().iter().enumerate() {
        match midi_in.port_name(port) {
            Ok(name) => ports.push(PortDescriptor { index, name }),
            Err(e) => debug!("Skipping port {} without a name: {}", index, e),
        }
    }

    Ok(ports)
}

/// Pick the input port and the hardware variant behind it.
///
/// An explicit `port_override` is taken verbatim and only its name is
/// inspected. Without one, the first port advertising a nanoKONTROL name is
/// used. Port names are compared ignoring case.
pub fn select(
    ports: &[PortDescriptor],
    port_override: Option<usize>,
) -> Result<(usize, DeviceVariant), IdentifyError> {
    let port = match port_override {
        Some(index) => {
            let port = ports
                .iter()
                .find(|p| p.index == index)
                .ok_or(IdentifyError::PortOutOfRange {
                    index,
                    available: ports.len(),
                })?;
            info!("Using port {}", port.index);
            port
        }
        None => {
            let port = ports
                .iter()
                .find(|p| p.is_family_member())
                .ok_or(IdentifyError::NoDeviceFound {
                    available: ports.len(),
                })?;
            info!("Defaulting to port {}", port.index);
            port
        }
    };

    Ok((port.index, DeviceVariant::from_port_name(&port.name)))
}

/// Log every port at startup
pub fn log_ports(ports: &[PortDescriptor]) {
    info!("There are {} MIDI devices.", ports.len());
    for port in ports {
        info!(" Port {}: {}", port.index, port.name);
    }
}

/// Print ports with the variant each one would be bound as
pub fn print_ports(ports: &[PortDescriptor]) {
    println!("\n{}", "=== MIDI Input Ports ===".bold().cyan());

    if ports.is_empty() {
        println!("  {}", "No input ports found".dimmed());
    }

    for port in ports {
        let marker = if port.is_family_member() {
            format!("[{}]", DeviceVariant::from_port_name(&port.name)).green()
        } else {
            "[OTHER]".dimmed()
        };
        println!("  {}: {} {}", port.index, marker, port.name);
    }

    match select(ports, None) {
        Ok((index, variant)) => {
            println!("\n{}", "Auto-detected:".bold().bright_green());
            println!("  Port {} as {}", index, variant.to_string().bright_white());
        }
        Err(e) => println!("\n{}", e.to_string().yellow()),
    }

    println!();
}
