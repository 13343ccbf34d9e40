//! Configuration type definitions
//!
//! These types are filled by whoever embeds the emulator: a YAML/TOML
//! loader, a config-flow UI, or plain code. Nothing here is persisted.

use heapless::String;

use cts600_hal::UartConfig;
use cts600_protocol::DEFAULT_UNIT;

use crate::state::MIN_STUCK_THRESHOLD;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Maximum diagnostic name length
pub const MAX_NAME_LEN: usize = 32;

/// Maximum device path length
pub const MAX_DEVICE_LEN: usize = 64;

/// Panel link configuration
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct LinkConfig {
    /// Name used in diagnostics only
    pub name: String<MAX_NAME_LEN>,
    /// Serial device path
    pub device: String<MAX_DEVICE_LEN>,
    /// Controller bus address
    pub unit: u8,
    /// Attempts per exchange before it is reported as exhausted
    pub retries: u8,
    /// Cycles without display progress before resynchronizing
    ///
    /// Read through [`LinkConfig::stuck_threshold`].
    pub stuck_threshold: u8,
    /// Idle cycles between SHOW DATA scans, zero disables them
    pub scan_every: u16,
    /// Pause between cycles in milliseconds
    pub poll_interval_ms: u32,
    /// Serial line settings
    pub uart: UartConfig,
}

impl Default for LinkConfig {
    fn default() -> Self {
        let mut name = String::new();
        let _ = name.push_str("Nilan CTS600");
        let mut device = String::new();
        let _ = device.push_str("/dev/ttyUSB0");
        Self {
            name,
            device,
            unit: DEFAULT_UNIT,
            retries: 2,
            stuck_threshold: 6,
            scan_every: 200,
            poll_interval_ms: 250,
            uart: UartConfig::default(),
        }
    }
}

impl LinkConfig {
    /// Attempts per exchange; a budget of zero still sends once
    pub fn attempts(&self) -> u8 {
        self.retries.max(1)
    }

    /// Stall budget, never below the cycles a press needs to settle
    pub fn stuck_threshold(&self) -> u8 {
        self.stuck_threshold.max(MIN_STUCK_THRESHOLD)
    }
}
