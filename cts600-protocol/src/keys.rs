//! Panel buttons
//!
//! The controller reads the six panel buttons as a bitmask written to the
//! key register. A zero mask is an idle poll: nothing pressed, but the
//! controller still answers with its latest display and LED state.

/// Physical panel buttons
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Key {
    /// Leave the current menu level
    Esc,
    /// Next value / previous menu entry
    Up,
    /// Previous value / next menu entry
    Down,
    /// Open or commit
    Enter,
    /// Stop the unit
    Off,
    /// Start the unit
    On,
}

// Wire format values
const KEY_ESC: u8 = 0x01;
const KEY_UP: u8 = 0x02;
const KEY_DOWN: u8 = 0x04;
const KEY_ENTER: u8 = 0x08;
const KEY_OFF: u8 = 0x10;
const KEY_ON: u8 = 0x20;

impl Key {
    /// All buttons in bit order
    pub const ALL: [Key; 6] = [Key::Esc, Key::Up, Key::Down, Key::Enter, Key::Off, Key::On];

    /// Bit for this button in the key register
    pub const fn mask(self) -> u8 {
        match self {
            Key::Esc => KEY_ESC,
            Key::Up => KEY_UP,
            Key::Down => KEY_DOWN,
            Key::Enter => KEY_ENTER,
            Key::Off => KEY_OFF,
            Key::On => KEY_ON,
        }
    }

    /// Parse a single-bit mask
    pub fn from_mask(mask: u8) -> Option<Self> {
        match mask {
            KEY_ESC => Some(Key::Esc),
            KEY_UP => Some(Key::Up),
            KEY_DOWN => Some(Key::Down),
            KEY_ENTER => Some(Key::Enter),
            KEY_OFF => Some(Key::Off),
            KEY_ON => Some(Key::On),
            _ => None,
        }
    }
}

/// Set of buttons held during one exchange
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Hash)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ButtonVector(u8);

impl ButtonVector {
    /// Nothing pressed
    pub const IDLE: ButtonVector = ButtonVector(0);

    /// Bits the controller knows about
    pub const VALID_BITS: u8 = 0x3f;

    /// A single button
    pub const fn single(key: Key) -> Self {
        Self(key.mask())
    }

    /// Build from a raw mask, dropping unknown bits
    pub const fn from_bits(bits: u8) -> Self {
        Self(bits & Self::VALID_BITS)
    }

    /// Raw mask as written to the key register
    pub const fn bits(self) -> u8 {
        self.0
    }

    /// Add a button
    #[must_use]
    pub const fn with(self, key: Key) -> Self {
        Self(self.0 | key.mask())
    }

    /// Whether `key` is held
    pub const fn contains(self, key: Key) -> bool {
        self.0 & key.mask() != 0
    }

    /// Whether this is an idle poll
    pub const fn is_idle(self) -> bool {
        self.0 == 0
    }

    /// Number of buttons held
    pub const fn count(self) -> u32 {
        self.0.count_ones()
    }

    /// The held button, if exactly one is held
    pub fn single_key(self) -> Option<Key> {
        Key::from_mask(self.0)
    }

    /// Iterate held buttons in bit order
    pub fn keys(self) -> impl Iterator<Item = Key> {
        Key::ALL.into_iter().filter(move |key| self.contains(*key))
    }
}

impl From<Key> for ButtonVector {
    fn from(key: Key) -> Self {
        Self::single(key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_masks() {
        assert_eq!(Key::Esc.mask(), 0x01);
        assert_eq!(Key::Up.mask(), 0x02);
        assert_eq!(Key::Down.mask(), 0x04);
        assert_eq!(Key::Enter.mask(), 0x08);
        assert_eq!(Key::Off.mask(), 0x10);
        assert_eq!(Key::On.mask(), 0x20);
    }

    #[test]
    fn test_key_roundtrip() {
        for key in Key::ALL {
            assert_eq!(Key::from_mask(key.mask()), Some(key));
        }
        assert_eq!(Key::from_mask(0), None);
        assert_eq!(Key::from_mask(0x03), None);
    }

    #[test]
    fn test_idle_vector() {
        let idle = ButtonVector::IDLE;
        assert!(idle.is_idle());
        assert_eq!(idle.count(), 0);
        assert_eq!(idle.single_key(), None);
        assert_eq!(idle.keys().count(), 0);
    }

    #[test]
    fn test_single_and_combo() {
        let up = ButtonVector::single(Key::Up);
        assert_eq!(up.single_key(), Some(Key::Up));
        assert!(up.contains(Key::Up));
        assert!(!up.contains(Key::Down));

        let combo = up.with(Key::Enter);
        assert_eq!(combo.bits(), 0x0a);
        assert_eq!(combo.count(), 2);
        assert_eq!(combo.single_key(), None);
        let mut keys = combo.keys();
        assert_eq!(keys.next(), Some(Key::Up));
        assert_eq!(keys.next(), Some(Key::Enter));
        assert_eq!(keys.next(), None);
    }

    #[test]
    fn test_from_bits_masks_unknown() {
        assert_eq!(ButtonVector::from_bits(0xff).bits(), 0x3f);
        assert!(ButtonVector::from_bits(0xc0).is_idle());
    }
}
