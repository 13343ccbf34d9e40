//! Serial line abstractions
//!
//! The emulator never touches a serial device directly. Whoever embeds it
//! supplies a [`PortOpener`] that turns a device path and line settings into
//! a byte stream implementing [`embedded_io::Read`] and [`embedded_io::Write`].

use embedded_io::{ErrorKind, Read, Write};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Byte stream to the controller
///
/// Reads may be short. A read that times out either returns `Ok(0)` or an
/// error whose kind is [`ErrorKind::TimedOut`].
pub trait Transport: Read + Write {}

// Blanket implementation
impl<T: Read + Write> Transport for T {}

/// Opens the serial device for the lifetime of one emulator run
///
/// The returned port is owned by the exchange loop and dropped when the
/// loop returns, which releases the device.
pub trait PortOpener {
    /// Open port type
    type Port: Transport;

    /// Error type for open failures (device missing, permission denied)
    type Error: embedded_io::Error;

    /// Open `device` with the given line settings
    fn open(&mut self, device: &str, config: &UartConfig) -> Result<Self::Port, Self::Error>;
}

/// Whether a transport error is worth retrying
///
/// Timeouts and interrupted calls are part of normal operation on a
/// half-duplex line. Anything else means the device is gone.
pub fn is_transient(kind: ErrorKind) -> bool {
    matches!(kind, ErrorKind::TimedOut | ErrorKind::Interrupted)
}

/// UART configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct UartConfig {
    /// Baud rate in bits per second
    pub baudrate: u32,
    /// Number of data bits (typically 8)
    pub data_bits: DataBits,
    /// Parity mode
    pub parity: Parity,
    /// Number of stop bits
    pub stop_bits: StopBits,
    /// Upper bound for a single read call, in milliseconds
    pub read_timeout_ms: u32,
}

impl Default for UartConfig {
    /// The CTS600 panel bus runs 19200 8N2
    fn default() -> Self {
        Self {
            baudrate: 19200,
            data_bits: DataBits::Eight,
            parity: Parity::None,
            stop_bits: StopBits::Two,
            read_timeout_ms: 500,
        }
    }
}

/// Number of data bits per frame
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum DataBits {
    Seven,
    Eight,
}

/// Parity mode
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum Parity {
    None,
    Even,
    Odd,
}

/// Number of stop bits
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum StopBits {
    One,
    Two,
}
