//! Error types for the exchange loop

use embedded_io::ErrorKind;

/// Transient protocol fault, retried within an exchange
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ExchangeFault {
    /// Response CRC did not match
    Checksum,
    /// Response started but stopped short
    Incomplete,
    /// Nothing arrived before the read timeout
    Timeout,
    /// Unknown function code or oversized body
    Malformed,
}

/// Outcome of an exchange that produced no response
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ExchangeError {
    /// Every attempt hit a transient fault
    Exhausted {
        /// Attempts made
        attempts: u8,
        /// Fault of the final attempt
        last: ExchangeFault,
    },
    /// Transport failed for good (device gone, permission lost)
    Fatal(ErrorKind),
}

/// Errors that end the exchange loop
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum LinkError {
    /// Serial device could not be opened
    Open(ErrorKind),
    /// Serial device failed while running
    Transport(ErrorKind),
}
