//! Static catalogue of supported Razer devices
//!
//! Wireless products usually appear under two product ids: one when plugged
//! in by cable and one when talking through the HyperSpeed dongle. Both are
//! listed; each carries the transaction tag its firmware expects.

/// Razer's USB vendor id.
pub const RAZER_VENDOR_ID: u16 = 0x1532;

/// Control-channel interface for keyboards.
const KEYBOARD_INTERFACE: u8 = 2;
/// Control-channel interface for mice.
const MOUSE_INTERFACE: u8 = 0;

/// How a device is queried and decoded.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum DeviceClass {
    Keyboard,
    Mouse,
}

impl DeviceClass {
    /// Interface that carries the feature reports.
    pub fn control_interface(self) -> u8 {
        match self {
            DeviceClass::Keyboard => KEYBOARD_INTERFACE,
            DeviceClass::Mouse => MOUSE_INTERFACE,
        }
    }
}

/// Hardware-specific deviations from the normal decode rules.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Quirks {
    /// Firmware answers with a failure status but still embeds a usable
    /// battery value somewhere in bytes 8..=15.
    pub status_fallback: bool,
}

impl Quirks {
    const NONE: Quirks = Quirks {
        status_fallback: false,
    };
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DeviceDescriptor {
    pub product_id: u16,
    pub display_name: &'static str,
    pub transaction_tag: u8,
    pub has_wireless: bool,
    pub class: DeviceClass,
    pub quirks: Quirks,
}

impl DeviceDescriptor {
    const fn mouse(product_id: u16, display_name: &'static str, tag: u8, wireless: bool) -> Self {
        Self {
            product_id,
            display_name,
            transaction_tag: tag,
            has_wireless: wireless,
            class: DeviceClass::Mouse,
            quirks: Quirks::NONE,
        }
    }

    const fn keyboard(
        product_id: u16,
        display_name: &'static str,
        tag: u8,
        wireless: bool,
    ) -> Self {
        Self {
            product_id,
            display_name,
            transaction_tag: tag,
            has_wireless: wireless,
            class: DeviceClass::Keyboard,
            quirks: Quirks::NONE,
        }
    }

    const fn with_status_fallback(mut self) -> Self {
        self.quirks.status_fallback = true;
        self
    }

    pub fn is_keyboard(&self) -> bool {
        self.class == DeviceClass::Keyboard
    }
}

static CATALOGUE: &[DeviceDescriptor] = &[
    // Mice
    DeviceDescriptor::mouse(0x0072, "Razer Mamba Wireless (Receiver)", 0x3F, true),
    DeviceDescriptor::mouse(0x0073, "Razer Mamba Wireless (Wired)", 0x3F, true),
    DeviceDescriptor::mouse(0x0078, "Razer Viper", 0x3F, false),
    DeviceDescriptor::mouse(0x007A, "Razer Viper Ultimate (Wired)", 0x3F, true)
        .with_status_fallback(),
    DeviceDescriptor::mouse(0x007B, "Razer Viper Ultimate (Wireless)", 0x3F, true),
    DeviceDescriptor::mouse(0x007C, "Razer DeathAdder V2 Pro (Wired)", 0x3F, true),
    DeviceDescriptor::mouse(0x007D, "Razer DeathAdder V2 Pro (Wireless)", 0x3F, true),
    DeviceDescriptor::mouse(0x0083, "Razer Basilisk X HyperSpeed", 0x1F, true),
    DeviceDescriptor::mouse(0x0084, "Razer DeathAdder V2", 0x3F, false),
    DeviceDescriptor::mouse(0x0086, "Razer Basilisk Ultimate (Wired)", 0x1F, true),
    DeviceDescriptor::mouse(0x0088, "Razer Basilisk Ultimate (Receiver)", 0x1F, true),
    DeviceDescriptor::mouse(0x008F, "Razer Naga Pro (Wired)", 0x1F, true),
    DeviceDescriptor::mouse(0x0090, "Razer Naga Pro (Wireless)", 0x1F, true),
    DeviceDescriptor::mouse(0x00A5, "Razer Viper V2 Pro (Wired)", 0x1F, true),
    DeviceDescriptor::mouse(0x00A6, "Razer Viper V2 Pro (Wireless)", 0x1F, true),
    DeviceDescriptor::mouse(0x00AA, "Razer Basilisk V3 Pro (Wired)", 0x1F, true),
    DeviceDescriptor::mouse(0x00AB, "Razer Basilisk V3 Pro (Wireless)", 0x1F, true),
    DeviceDescriptor::mouse(0x00B6, "Razer DeathAdder V3 Pro (Wired)", 0x1F, true),
    DeviceDescriptor::mouse(0x00B7, "Razer DeathAdder V3 Pro (Wireless)", 0x1F, true),
    DeviceDescriptor::mouse(0x00C0, "Razer Viper V3 Pro (Wired)", 0x1F, true),
    DeviceDescriptor::mouse(0x00C1, "Razer Viper V3 Pro (Wireless)", 0x1F, true),
    // Keyboards
    DeviceDescriptor::keyboard(0x0258, "Razer BlackWidow V3 Mini HyperSpeed (Wired)", 0x1F, true),
    DeviceDescriptor::keyboard(0x025A, "Razer BlackWidow V3 Pro (Wired)", 0x1F, true),
    DeviceDescriptor::keyboard(0x025C, "Razer BlackWidow V3 Pro (Wireless)", 0x1F, true),
    DeviceDescriptor::keyboard(0x0266, "Razer Huntsman V2", 0xFF, false),
    DeviceDescriptor::keyboard(0x0271, "Razer BlackWidow V3 Mini HyperSpeed (Wireless)", 0x1F, true),
];

/// Find the descriptor for a Razer product id.
pub fn lookup(product_id: u16) -> Option<&'static DeviceDescriptor> {
    CATALOGUE.iter().find(|d| d.product_id == product_id)
}

/// Every catalogued device, in table order.
pub fn all() -> &'static [DeviceDescriptor] {
    CATALOGUE
}

/// Product ids known to be one physical unit under two USB personalities.
const CONFIRMED_PAIRS: &[(u16, u16)] = &[(0x007A, 0x007B)];

/// Wired/wireless identity table, used to re-find a device that switched
/// mode between two scans.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct IdentityPairs {
    pairs: Vec<(u16, u16)>,
}

impl Default for IdentityPairs {
    fn default() -> Self {
        Self {
            pairs: CONFIRMED_PAIRS.to_vec(),
        }
    }
}

impl IdentityPairs {
    /// The confirmed pairs plus `extra`.
    pub fn with_extra(extra: &[[u16; 2]]) -> Self {
        let mut table = Self::default();
        for &[a, b] in extra {
            if a != b && table.partner(a).is_none() && table.partner(b).is_none() {
                table.pairs.push((a, b));
            }
        }
        table
    }

    /// The other identity of `product_id`, in either direction.
    pub fn partner(&self, product_id: u16) -> Option<u16> {
        self.pairs.iter().find_map(|&(a, b)| {
            if a == product_id {
                Some(b)
            } else if b == product_id {
                Some(a)
            } else {
                None
            }
        })
    }
}
