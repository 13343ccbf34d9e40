//! Menu navigator
//!
//! Decides, one exchange at a time, which button the panel presses to
//! bring the controller's settings to the target, and when to read the
//! SHOW DATA menu.

pub mod events;
pub mod machine;
pub mod navigator;

pub use events::NavEvent;
pub use machine::{Goal, InitPhase, NavState, ScanPhase, LANGUAGE_MENU_DEPTH};
pub use navigator::{MenuState, Navigator, MIN_STUCK_THRESHOLD, SETTLE_CYCLES};
