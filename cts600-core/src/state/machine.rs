//! Navigator state machine
//!
//! Which buttons the panel presses is a function of the state, the
//! current screen and the target. This module holds only the states and
//! their transitions; the press policy lives in the navigator.

use super::events::NavEvent;

/// Presses spent walking down to the language entry from the top
pub const LANGUAGE_MENU_DEPTH: u8 = 8;

/// Navigator states
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum NavState {
    /// Switching the interface to English, once at startup
    Initializing(InitPhase),
    /// On the top screen, nothing to do
    Idle,
    /// Walking the menu to change one setting
    Navigating(Goal),
    /// Backing out to the top screen after losing track
    Resynchronizing,
    /// Reading the SHOW DATA menu
    Scanning(ScanPhase),
}

/// Steps of the language switch
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum InitPhase {
    /// ESC until the display stops changing
    ReturnToTop,
    /// DOWN presses left before the language entry
    Descend(u8),
    /// ENTER on the language entry
    OpenPrompt,
    /// UP through the options
    SearchUp,
    /// DOWN through the options, after UP ran out
    SearchDown,
    /// ENTER on English
    Commit,
}

/// Steps of a SHOW DATA scan
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ScanPhase {
    /// UP from the top screen, then ENTER on SHOW DATA
    Enter,
    /// DOWN through the values until the list ends
    Read,
    /// ESC back to the top screen
    Leave,
}

/// Setting being changed, in the order they are checked
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Goal {
    Power,
    Setpoint,
    Mode,
    Fan,
}

impl Goal {
    pub const ORDER: [Goal; 4] = [Goal::Power, Goal::Setpoint, Goal::Mode, Goal::Fan];
}

impl Default for NavState {
    fn default() -> Self {
        NavState::Initializing(InitPhase::ReturnToTop)
    }
}

impl NavState {
    pub fn is_initializing(&self) -> bool {
        matches!(self, NavState::Initializing(_))
    }

    /// Process an event and return the next state
    pub fn transition(self, event: NavEvent) -> Self {
        use NavEvent::*;
        use NavState::*;

        match (self, event) {
            // Startup
            (Initializing(_), InitComplete) => Idle,
            (Initializing(_), InitAbandoned) => Resynchronizing,
            (Initializing(_), NavigationStuck) => Resynchronizing,
            (Initializing(_), LinkRestored) => Initializing(InitPhase::ReturnToTop),

            // Targets
            (Idle, TargetDiverged(goal)) => Navigating(goal),
            (Navigating(_), TargetDiverged(goal)) => Navigating(goal),
            (Navigating(_), GoalReached(_)) => Idle,

            // Sensor data
            (Idle, ScanDue) => Scanning(ScanPhase::Enter),
            (Scanning(_), ScanFinished) => Idle,

            // Recovery
            (Idle | Navigating(_) | Scanning(_), NavigationStuck) => Resynchronizing,
            (Idle | Navigating(_) | Scanning(_), LostPosition) => Resynchronizing,
            (Idle | Navigating(_) | Scanning(_), LinkRestored) => Resynchronizing,
            (Resynchronizing, BaselineConfirmed) => Idle,

            // Default: stay in current state
            _ => self,
        }
    }
}
