//! Display/status parser
//!
//! Turns a decoded display into a typed screen using a template
//! catalogue, and keeps the values read from the SHOW DATA screens.

pub mod catalogue;
pub mod classify;
pub mod readings;

pub use catalogue::{Catalogue, ScreenKind, Template, ENGLISH};
pub use classify::{classify, Screen};
pub use readings::{Flow, Label, Readings, Temperature};
