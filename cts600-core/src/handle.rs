//! Shared handle between the caller and the exchange loop
//!
//! The loop owns the port, the mirror and the navigator. The only state it
//! shares is behind this handle: requests flow in (targets, temperature,
//! key presses, stop) and a snapshot flows out after every cycle.

use core::cell::RefCell;

use embassy_sync::blocking_mutex::raw::RawMutex;
use embassy_sync::blocking_mutex::Mutex;
use heapless::{Deque, String};

use cts600_protocol::display::{LedState, MAX_SUMMARY_BYTES};
use cts600_protocol::keys::Key;
use cts600_protocol::sensor::{self, SensorEncoding};
use cts600_protocol::slave_id::SlaveId;

use crate::climate::{Mode, TargetConfiguration, TargetError, TargetUpdate};
use crate::scheduler::ExchangeStats;
use crate::screen::Readings;
use crate::state::NavState;

/// Manual key presses waiting for the navigator
pub const KEY_QUEUE_LEN: usize = 8;

/// What the panel last knew about the controller
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct PanelState {
    /// `Off` whenever the LED says the unit is stopped
    pub mode: Option<Mode>,
    pub setpoint: Option<u8>,
    pub fan_speed: Option<u8>,
    /// Last cycle got its responses
    pub online: bool,
    pub led: LedState,
    /// T15 value being sent
    pub room_sensor: SensorEncoding,
    pub navigation: NavState,
    /// Identification from the startup handshake
    pub device: Option<SlaveId>,
    /// Display rows, trimmed and joined with `/`
    pub display: String<MAX_SUMMARY_BYTES>,
    /// Sensor values from SHOW DATA, empty until the first scan
    pub readings: Readings,
    pub stats: ExchangeStats,
}

impl Default for PanelState {
    fn default() -> Self {
        Self {
            mode: None,
            setpoint: None,
            fan_speed: None,
            online: false,
            led: LedState::Unknown,
            room_sensor: SensorEncoding::default(),
            navigation: NavState::default(),
            device: None,
            display: String::new(),
            readings: Readings::default(),
            stats: ExchangeStats::default(),
        }
    }
}

impl PanelState {
    /// Room temperature the controller is being told, in °C
    pub fn room_temperature(&self) -> f32 {
        sensor::decode(self.room_sensor)
    }
}

/// Inputs read once at the start of a cycle
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct CycleInputs {
    pub target: TargetConfiguration,
    /// New external reading, if one arrived since the last cycle
    pub external_celsius: Option<f32>,
    pub manual: Option<Key>,
}

#[derive(Debug, Default)]
struct Shared {
    target: TargetConfiguration,
    external: Option<f32>,
    keys: Deque<Key, KEY_QUEUE_LEN>,
    stop: bool,
    running: bool,
    state: PanelState,
}

/// Handle shared with the exchange loop
///
/// `M` picks the lock: `CriticalSectionRawMutex` across threads or
/// interrupts, `NoopRawMutex` when everything runs in one task.
pub struct PanelHandle<M: RawMutex> {
    shared: Mutex<M, RefCell<Shared>>,
}

impl<M: RawMutex> Default for PanelHandle<M> {
    fn default() -> Self {
        Self::new()
    }
}

impl<M: RawMutex> PanelHandle<M> {
    pub fn new() -> Self {
        Self {
            shared: Mutex::new(RefCell::new(Shared::default())),
        }
    }

    fn with<R>(&self, f: impl FnOnce(&mut Shared) -> R) -> R {
        self.shared.lock(|cell| f(&mut cell.borrow_mut()))
    }

    /// Merge a target update; out of range values are rejected whole
    pub fn set_target(&self, update: TargetUpdate) -> Result<(), TargetError> {
        update.validate()?;
        self.with(|s| s.target.merge(update));
        Ok(())
    }

    pub fn target(&self) -> TargetConfiguration {
        self.with(|s| s.target)
    }

    /// Latest snapshot
    pub fn current_state(&self) -> PanelState {
        self.with(|s| s.state.clone())
    }

    /// Room temperature to report to the controller, in °C
    pub fn set_external_temperature(&self, celsius: f32) {
        self.with(|s| s.external = Some(celsius));
    }

    /// Queue one key press; gives the key back if the queue is full
    pub fn press_key(&self, key: Key) -> Result<(), Key> {
        self.with(|s| s.keys.push_back(key))
    }

    /// Ask the loop to stop after the current exchange
    pub fn request_stop(&self) {
        self.with(|s| s.stop = true);
    }

    pub fn is_running(&self) -> bool {
        self.with(|s| s.running)
    }

    /// Take this cycle's inputs; a key is only dequeued if it can be sent
    pub(crate) fn begin_cycle(&self, accept_manual: bool) -> CycleInputs {
        self.with(|s| CycleInputs {
            target: s.target,
            external_celsius: s.external.take(),
            manual: if accept_manual { s.keys.pop_front() } else { None },
        })
    }

    pub(crate) fn stop_requested(&self) -> bool {
        self.with(|s| s.stop)
    }

    pub(crate) fn publish(&self, state: PanelState) {
        self.with(|s| s.state = state);
    }

    pub(crate) fn set_running(&self, running: bool) {
        self.with(|s| {
            s.running = running;
            if !running {
                s.stop = false;
                s.state.online = false;
            }
        });
    }
}
