//! CTS600 Hardware Abstraction Layer
//!
//! This crate defines the transport seam between the panel emulator and the
//! serial device it talks through. Platform code (a host serial port, a
//! USB-RS485 adapter on a microcontroller) implements [`PortOpener`]; the
//! emulator only ever sees [`embedded_io`] byte streams.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────┐
//! │  Application (home automation bridge)   │
//! └─────────────────────────────────────────┘
//!                     │
//!                     ▼
//! ┌─────────────────────────────────────────┐
//! │  cts600-core (emulator loop)            │
//! └─────────────────────────────────────────┘
//!                     │
//!                     ▼
//! ┌─────────────────────────────────────────┐
//! │  cts600-hal (this crate - traits)       │
//! └─────────────────────────────────────────┘
//!                     │
//!                     ▼
//!           serial port implementation
//! ```
//!
//! # Traits
//!
//! - [`uart::PortOpener`] - Opens the device with line settings
//! - [`uart::Transport`] - Blocking byte stream (`Read + Write`)

#![no_std]
#![deny(unsafe_code)]

pub mod uart;

// Re-export key items at crate root for convenience
pub use uart::{is_transient, DataBits, Parity, PortOpener, StopBits, Transport, UartConfig};
