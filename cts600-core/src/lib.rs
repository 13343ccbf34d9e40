//! Panel emulator core for the Nilan CTS600 ventilation controller
//!
//! The CTS600 only accepts commands from its front panel. This crate plays
//! that panel over the serial bus: it presses buttons, reads the display
//! back and walks the menus until the controller shows the requested
//! settings.
//!
//! - Display/status parser (screen templates, SHOW DATA readings)
//! - Menu navigator state machine
//! - Exchange scheduler and retry driver
//! - Shared handle for the caller
//! - Configuration type definitions
//!
//! ```text
//! caller ──► PanelHandle ──► PanelEmulator ──► Exchanger ──► port
//!               ▲                 │
//!               └── PanelState ◄──┴── Navigator ◄── classify ◄── PanelMirror
//! ```

#![no_std]
#![deny(unsafe_code)]

pub mod climate;
pub mod config;
pub mod error;
pub mod handle;
pub mod scheduler;
pub mod screen;
pub mod state;

pub use climate::{Mode, TargetConfiguration, TargetError, TargetUpdate};
pub use config::LinkConfig;
pub use error::{ExchangeError, ExchangeFault, LinkError};
pub use handle::{PanelHandle, PanelState};
pub use scheduler::{CycleReport, ExchangeStats, PanelEmulator};
pub use screen::{classify, Catalogue, Readings, Screen, ENGLISH};
pub use state::{Goal, InitPhase, NavEvent, NavState, Navigator, ScanPhase};
