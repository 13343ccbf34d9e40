//! CTS600 Panel Link Protocol
//!
//! This crate defines the serial protocol between a Nilan CTS600 controller
//! and its front panel (2 x 8 character display, LED, six buttons). The
//! panel is the bus master: it writes its button state and the controller
//! answers with the display and LED outputs that changed.
//!
//! # Protocol Overview
//!
//! Frames are modbus-RTU shaped:
//! ```text
//! ┌──────┬──────────┬──────────────┬────────────┐
//! │ UNIT │ FUNCTION │ BODY         │ CRC16 (LE) │
//! │ 1B   │ 1B       │ 0–264B       │ 2B         │
//! └──────┴──────────┴──────────────┴────────────┘
//! ```
//!
//! The panel is dumb: it shows whatever text the controller sends. All menu
//! logic lives in the controller, so driving it means pressing buttons and
//! reading the screen.

#![no_std]
#![deny(unsafe_code)]

pub mod display;
pub mod frame;
pub mod keys;
pub mod sensor;
pub mod slave_id;

pub use display::{DisplayCell, DisplayFrame, DisplayGeometry, DisplayLine, LedState, PanelMirror};
pub use frame::{FrameError, FunctionCode, Request, Response, DEFAULT_UNIT, MAX_FRAME_SIZE};
pub use keys::{ButtonVector, Key};
pub use sensor::SensorEncoding;
pub use slave_id::SlaveId;
