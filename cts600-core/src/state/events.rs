//! Events that move the navigator between states

use super::machine::Goal;

/// Navigator events
///
/// Every state change is driven by one of these; they are also reported
/// to the caller in each cycle report.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum NavEvent {
    // Startup
    /// Interface language committed
    InitComplete,
    /// Language prompt unreachable or English not offered
    InitAbandoned,

    // Targets
    /// The top screen differs from the target in this setting
    TargetDiverged(Goal),
    /// The top screen confirms the setting
    GoalReached(Goal),

    // Sensor data
    /// Time to read the SHOW DATA menu again
    ScanDue,
    /// SHOW DATA read and the top screen reached again
    ScanFinished,

    // Recovery
    /// No display progress for longer than the threshold
    NavigationStuck,
    /// Target set or scan due, but the display is off the top screen
    LostPosition,
    /// First good read after an exhausted exchange
    LinkRestored,
    /// Top screen confirmed while resynchronizing
    BaselineConfirmed,
}

impl NavEvent {
    /// Whether this event signals trouble rather than progress
    pub fn is_warning(&self) -> bool {
        matches!(
            self,
            NavEvent::InitAbandoned | NavEvent::NavigationStuck | NavEvent::LostPosition
        )
    }
}
