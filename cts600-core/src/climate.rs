//! Climate values the caller can ask for
//!
//! The controller exposes three settings through its menus (thermostat,
//! operating mode, fan flow) plus on/off through dedicated keys. Targets
//! are kept per field: a field left as `None` is never touched.

use core::ops::RangeInclusive;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Accepted thermostat setpoints (°C)
pub const SETPOINT_RANGE: RangeInclusive<u8> = 5..=30;

/// Accepted fan flow levels
pub const FAN_RANGE: RangeInclusive<u8> = 1..=4;

/// Operating mode
///
/// `Auto`, `Cool` and `Heat` are picked in the mode menu, in that order
/// from top to bottom. `Off` is reached with the OFF key and shown by the
/// LED.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum Mode {
    Off,
    Auto,
    Cool,
    Heat,
}

impl Mode {
    /// Position in the mode menu, top is zero
    pub fn menu_index(self) -> Option<u8> {
        match self {
            Mode::Auto => Some(0),
            Mode::Cool => Some(1),
            Mode::Heat => Some(2),
            Mode::Off => None,
        }
    }

    /// Whether this mode needs the unit running
    pub fn is_on(self) -> bool {
        self != Mode::Off
    }
}

/// Rejected target values
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum TargetError {
    SetpointOutOfRange(u8),
    FanOutOfRange(u8),
}

/// A caller request; `None` leaves that field as it is
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct TargetUpdate {
    pub mode: Option<Mode>,
    pub setpoint: Option<u8>,
    pub fan: Option<u8>,
}

impl TargetUpdate {
    pub fn mode(mode: Mode) -> Self {
        Self {
            mode: Some(mode),
            ..Default::default()
        }
    }

    pub fn setpoint(celsius: u8) -> Self {
        Self {
            setpoint: Some(celsius),
            ..Default::default()
        }
    }

    pub fn fan(level: u8) -> Self {
        Self {
            fan: Some(level),
            ..Default::default()
        }
    }

    /// Check every present field against its range
    pub fn validate(&self) -> Result<(), TargetError> {
        if let Some(setpoint) = self.setpoint {
            if !SETPOINT_RANGE.contains(&setpoint) {
                return Err(TargetError::SetpointOutOfRange(setpoint));
            }
        }
        if let Some(fan) = self.fan {
            if !FAN_RANGE.contains(&fan) {
                return Err(TargetError::FanOutOfRange(fan));
            }
        }
        Ok(())
    }
}

/// Desired controller settings, kept until superseded
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct TargetConfiguration {
    pub mode: Option<Mode>,
    pub setpoint: Option<u8>,
    pub fan: Option<u8>,
}

impl TargetConfiguration {
    /// Fold an update in, field by field
    pub fn merge(&mut self, update: TargetUpdate) {
        if update.mode.is_some() {
            self.mode = update.mode;
        }
        if update.setpoint.is_some() {
            self.setpoint = update.setpoint;
        }
        if update.fan.is_some() {
            self.fan = update.fan;
        }
    }

    /// Whether nothing has been requested
    pub fn is_empty(&self) -> bool {
        self.mode.is_none() && self.setpoint.is_none() && self.fan.is_none()
    }
}
