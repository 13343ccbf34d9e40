//! Exchange scheduler
//!
//! Drives the request/response cadence with the controller and retries
//! transient faults within a bounded budget.

pub mod cycle;
pub mod exchange;

pub use cycle::{CycleReport, PanelEmulator, PRESS_EXCHANGES};
pub use exchange::{ExchangeStats, Exchanger};
