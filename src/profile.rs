//! Device profiles for the supported nanoKONTROL hardware
//!
//! Each variant has a fixed pair of controller-number lists. The position of
//! a controller in its list is the slot it drives in the published snapshot,
//! so the tables below define the message layout and must never be reordered.

use std::collections::HashMap;
use std::fmt;

use crate::error::ProfileError;

/// Hardware revision of the attached surface
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DeviceVariant {
    /// First generation nanoKONTROL (base variant of the family)
    NanoKontrol,
    /// nanoKONTROL2
    NanoKontrol2,
}

/// Substring every supported port name carries
pub const FAMILY_FRAGMENT: &str = "nanoKONTROL";

impl DeviceVariant {
    /// All variants, most specific name fragment first
    pub const ALL: [DeviceVariant; 2] = [DeviceVariant::NanoKontrol2, DeviceVariant::NanoKontrol];

    /// Name used as the frame id of published messages
    pub fn canonical_name(self) -> &'static str {
        match self {
            DeviceVariant::NanoKontrol => "kontrol",
            DeviceVariant::NanoKontrol2 => "kontrol2",
        }
    }

    /// Substring identifying this variant in a MIDI port name
    pub fn name_fragment(self) -> &'static str {
        match self {
            DeviceVariant::NanoKontrol => FAMILY_FRAGMENT,
            DeviceVariant::NanoKontrol2 => "nanoKONTROL2",
        }
    }

    /// Derive the variant from an advertised port name.
    ///
    /// Matching ignores case, so "NANOKONTROL2" and "nanoKONTROL2" are the
    /// same device. The longest matching fragment wins; names matching
    /// nothing fall back to the base variant.
    pub fn from_port_name(name: &str) -> Self {
        let name = name.to_lowercase();
        Self::ALL
            .into_iter()
            .find(|variant| name.contains(&variant.name_fragment().to_lowercase()))
            .unwrap_or(DeviceVariant::NanoKontrol)
    }

    /// Controller layout of this variant
    pub fn mapping(self) -> &'static ControlMapping {
        lookup(self)
    }
}

impl fmt::Display for DeviceVariant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DeviceVariant::NanoKontrol => write!(f, "nanoKONTROL"),
            DeviceVariant::NanoKontrol2 => write!(f, "nanoKONTROL2"),
        }
    }
}

/// Ordered controller numbers of one variant, split by control class
#[derive(Debug, PartialEq, Eq)]
pub struct ControlMapping {
    pub variant: DeviceVariant,
    pub axes: &'static [u8],
    pub buttons: &'static [u8],
}

static NANO_KONTROL: ControlMapping = ControlMapping {
    variant: DeviceVariant::NanoKontrol,
    axes: &[2, 3, 4, 5, 6, 8, 9, 12, 13, 14, 15, 16, 17, 18, 19, 20, 21, 22],
    buttons: &[
        23, 33, 24, 34, 25, 35, 26, 36, 27, 37, 28, 38, 29, 39, 30, 40, 31, 41, // strip solo/mute
        47, 45, 48, 49, 46, 44, // transport
    ],
};

static NANO_KONTROL2: ControlMapping = ControlMapping {
    variant: DeviceVariant::NanoKontrol2,
    axes: &[
        0, 1, 2, 3, 4, 5, 6, 7, // sliders
        16, 17, 18, 19, 20, 21, 22, 23, // knobs
    ],
    buttons: &[
        32, 33, 34, 35, 36, 37, 38, 39, // S
        48, 49, 50, 51, 52, 53, 54, 55, // M
        64, 65, 66, 67, 68, 69, 70, 71, // R
        43, 44, 42, 41, 45, // transport
        58, 59, 60, 61, 62, 46, // track, cycle, marker
    ],
};

/// Registry lookup: the controller layout of `variant`
pub fn lookup(variant: DeviceVariant) -> &'static ControlMapping {
    match variant {
        DeviceVariant::NanoKontrol => &NANO_KONTROL,
        DeviceVariant::NanoKontrol2 => &NANO_KONTROL2,
    }
}

impl ControlMapping {
    /// Check that every controller number drives exactly one slot
    pub fn validate(&self) -> Result<(), ProfileError> {
        let variant = self.variant.canonical_name();

        for (class, ids) in [("axis", self.axes), ("button", self.buttons)] {
            if let Some(control_id) = first_duplicate(ids) {
                return Err(ProfileError::DuplicateControl {
                    variant,
                    class,
                    control_id,
                });
            }
        }

        if let Some(&control_id) = self.axes.iter().find(|id| self.buttons.contains(id)) {
            return Err(ProfileError::SharedControl { variant, control_id });
        }

        Ok(())
    }
}

fn first_duplicate(ids: &[u8]) -> Option<u8> {
    let mut seen = [false; 256];
    for &id in ids {
        if std::mem::replace(&mut seen[id as usize], true) {
            return Some(id);
        }
    }
    None
}

/// Snapshot slot addressed by a controller
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Slot {
    Axis(usize),
    Button(usize),
}

/// Controller number to slot index, bound once at startup
#[derive(Debug, Clone)]
pub struct SlotTable {
    variant: DeviceVariant,
    axes: HashMap<u8, usize>,
    buttons: HashMap<u8, usize>,
}

impl SlotTable {
    /// Bind a validated mapping
    pub fn bind(mapping: &ControlMapping) -> Result<Self, ProfileError> {
        mapping.validate()?;

        let index = |ids: &[u8]| -> HashMap<u8, usize> {
            ids.iter().enumerate().map(|(slot, &id)| (id, slot)).collect()
        };

        Ok(Self {
            variant: mapping.variant,
            axes: index(mapping.axes),
            buttons: index(mapping.buttons),
        })
    }

    pub fn variant(&self) -> DeviceVariant {
        self.variant
    }

    pub fn axis_count(&self) -> usize {
        self.axes.len()
    }

    pub fn button_count(&self) -> usize {
        self.buttons.len()
    }

    /// Resolve a controller number, axes first
    pub fn resolve(&self, control_id: u8) -> Option<Slot> {
        self.axes
            .get(&control_id)
            .map(|&slot| Slot::Axis(slot))
            .or_else(|| self.buttons.get(&control_id).map(|&slot| Slot::Button(slot)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_profile_is_valid() {
        for variant in DeviceVariant::ALL {
            let mapping = lookup(variant);
            assert_eq!(mapping.variant, variant);
            assert_eq!(mapping.validate(), Ok(()), "{} profile", variant);
        }
    }

    #[test]
    fn test_profile_sizes() {
        assert_eq!(lookup(DeviceVariant::NanoKontrol).axes.len(), 18);
        assert_eq!(lookup(DeviceVariant::NanoKontrol).buttons.len(), 24);
        assert_eq!(lookup(DeviceVariant::NanoKontrol2).axes.len(), 16);
        assert_eq!(lookup(DeviceVariant::NanoKontrol2).buttons.len(), 35);
    }

    #[test]
    fn test_variant_from_port_name() {
        assert_eq!(
            DeviceVariant::from_port_name("nanoKONTROL2 SLIDER/KNOB"),
            DeviceVariant::NanoKontrol2
        );
        assert_eq!(
            DeviceVariant::from_port_name("nanoKONTROL MIDI 1"),
            DeviceVariant::NanoKontrol
        );
        assert_eq!(
            DeviceVariant::from_port_name("Generic MIDI"),
            DeviceVariant::NanoKontrol
        );
        assert_eq!(
            DeviceVariant::from_port_name("NANOKONTROL2 28:0"),
            DeviceVariant::NanoKontrol2
        );
    }

    #[test]
    fn test_canonical_names() {
        assert_eq!(DeviceVariant::NanoKontrol.canonical_name(), "kontrol");
        assert_eq!(DeviceVariant::NanoKontrol2.canonical_name(), "kontrol2");
    }

    #[test]
    fn test_duplicate_rejected() {
        let mapping = ControlMapping {
            variant: DeviceVariant::NanoKontrol,
            axes: &[1, 2, 1],
            buttons: &[3],
        };
        assert_eq!(
            mapping.validate(),
            Err(ProfileError::DuplicateControl {
                variant: "kontrol",
                class: "axis",
                control_id: 1,
            })
        );
    }

    #[test]
    fn test_shared_control_rejected() {
        let mapping = ControlMapping {
            variant: DeviceVariant::NanoKontrol2,
            axes: &[1, 2],
            buttons: &[3, 2],
        };
        assert_eq!(
            mapping.validate(),
            Err(ProfileError::SharedControl {
                variant: "kontrol2",
                control_id: 2,
            })
        );
        assert!(SlotTable::bind(&mapping).is_err());
    }

    #[test]
    fn test_slot_resolution() {
        let table = SlotTable::bind(lookup(DeviceVariant::NanoKontrol)).unwrap();

        assert_eq!(table.resolve(23), Some(Slot::Button(0)));
        assert_eq!(table.resolve(33), Some(Slot::Button(1)));
        assert_eq!(table.resolve(44), Some(Slot::Button(23)));
        assert_eq!(table.resolve(2), Some(Slot::Axis(0)));
        assert_eq!(table.resolve(22), Some(Slot::Axis(17)));
        assert_eq!(table.resolve(7), None);
        assert_eq!(table.resolve(127), None);
        assert_eq!(table.axis_count(), 18);
        assert_eq!(table.button_count(), 24);
    }
}
