//! Exchange loop
//!
//! One cycle: read the caller's inputs, send the room temperature if it is
//! pending, send the planned buttons, fold every response into the mirror,
//! classify the display and let the navigator see it. A snapshot is
//! published after each cycle, good or bad.

use embedded_hal::delay::DelayNs;
use embedded_io::Error as _;
use embassy_sync::blocking_mutex::raw::RawMutex;
use heapless::Vec;

use cts600_hal::uart::{PortOpener, Transport};
use cts600_protocol::display::PanelMirror;
use cts600_protocol::frame::{
    Request, Response, PANEL_STATUS_REGISTER, PANEL_VERSION_REGISTER, REMOTE_PANEL_VERSION,
};
use cts600_protocol::keys::{ButtonVector, Key};
use cts600_protocol::sensor::{self, SensorEncoding};
use cts600_protocol::slave_id::SlaveId;

use super::exchange::Exchanger;
use crate::climate::{Mode, TargetConfiguration};
use crate::config::LinkConfig;
use crate::error::{ExchangeError, ExchangeFault, LinkError};
use crate::handle::{PanelHandle, PanelState};
use crate::screen::{classify, Catalogue, Screen};
use crate::state::{NavEvent, NavState, Navigator};

/// Exchanges that carry a pressed button vector
///
/// The controller samples the key register on its own schedule, so a
/// press is written twice before the release poll.
pub const PRESS_EXCHANGES: usize = 2;

/// What happened in one cycle
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct CycleReport {
    /// Buttons sent, idle if the cycle ended before the key exchange
    pub buttons: ButtonVector,
    /// Classification of the display read back
    pub screen: Screen,
    /// Navigator state after the cycle
    pub state: NavState,
    /// Navigator events raised in this cycle
    pub events: Vec<NavEvent, 8>,
    /// Set when an exchange ran out of attempts
    pub exhausted: Option<ExchangeFault>,
}

/// Emulated remote panel
pub struct PanelEmulator<'a, M: RawMutex> {
    config: LinkConfig,
    handle: &'a PanelHandle<M>,
    catalogue: &'a Catalogue,
    mirror: PanelMirror,
    navigator: Navigator,
    exchanger: Exchanger,
    pending_sensor: Option<SensorEncoding>,
    room_sensor: SensorEncoding,
    online: bool,
    handshake_done: bool,
    device: Option<SlaveId>,
    last_top: Option<(Mode, u8, u8)>,
}

impl<'a, M: RawMutex> PanelEmulator<'a, M> {
    pub fn new(config: LinkConfig, handle: &'a PanelHandle<M>, catalogue: &'a Catalogue) -> Self {
        let navigator = Navigator::new(config.stuck_threshold(), catalogue.language)
            .with_data_scan(config.scan_every);
        let exchanger = Exchanger::new(config.unit, config.attempts());
        let room_sensor = SensorEncoding::default();
        Self {
            config,
            handle,
            catalogue,
            mirror: PanelMirror::new(),
            navigator,
            exchanger,
            // The controller gets a plausible room temperature from the start
            pending_sensor: Some(room_sensor),
            room_sensor,
            online: false,
            handshake_done: false,
            device: None,
            last_top: None,
        }
    }

    pub fn navigator(&self) -> &Navigator {
        &self.navigator
    }

    pub fn mirror(&self) -> &PanelMirror {
        &self.mirror
    }

    /// Open the port and run until stopped or the transport fails
    ///
    /// The port is dropped, and so released, on every return path.
    pub fn run<O, D>(&mut self, opener: &mut O, delay: &mut D) -> Result<(), LinkError>
    where
        O: PortOpener,
        D: DelayNs,
    {
        let mut port = opener
            .open(&self.config.device, &self.config.uart)
            .map_err(|e| LinkError::Open(e.kind()))?;

        #[cfg(feature = "defmt")]
        defmt::info!("{}: opened {}", self.config.name.as_str(), self.config.device.as_str());

        self.handle.set_running(true);
        let result = self.drive(&mut port, delay);
        self.online = false;
        self.handle.set_running(false);

        #[cfg(feature = "defmt")]
        if let Err(e) = &result {
            defmt::error!("{}: link failed: {}", self.config.name.as_str(), e);
        }

        result
    }

    /// Cycle until a stop is requested
    pub fn drive<P, D>(&mut self, port: &mut P, delay: &mut D) -> Result<(), LinkError>
    where
        P: Transport,
        D: DelayNs,
    {
        loop {
            if self.handle.stop_requested() {
                return Ok(());
            }
            self.cycle(port)?;
            delay.delay_ms(self.config.poll_interval_ms);
        }
    }

    /// Run one cycle
    pub fn cycle<P: Transport>(&mut self, port: &mut P) -> Result<CycleReport, LinkError> {
        let inputs = self.handle.begin_cycle(self.navigator.accepts_manual());
        if let Some(celsius) = inputs.external_celsius {
            let encoding = sensor::encode(celsius);
            if encoding != self.room_sensor {
                self.pending_sensor = Some(encoding);
            }
        }

        let mut report = CycleReport {
            buttons: ButtonVector::IDLE,
            screen: self.navigator.menu().screen,
            state: self.navigator.state(),
            events: Vec::new(),
            exhausted: None,
        };

        match self.run_cycle(port, &inputs.target, inputs.manual, &mut report) {
            Ok(()) => self.online = true,
            Err(ExchangeError::Exhausted { attempts, last }) => {
                #[cfg(feature = "defmt")]
                defmt::warn!("exchange failed after {} attempts: {}", attempts, last);
                #[cfg(not(feature = "defmt"))]
                let _ = attempts;
                self.online = false;
                self.navigator.link_lost();
                report.exhausted = Some(last);
            }
            Err(ExchangeError::Fatal(kind)) => {
                self.online = false;
                self.publish();
                return Err(LinkError::Transport(kind));
            }
        }

        report.state = self.navigator.state();
        report.events = self.navigator.take_events();
        self.publish();
        Ok(report)
    }

    fn run_cycle<P: Transport>(
        &mut self,
        port: &mut P,
        target: &TargetConfiguration,
        manual: Option<Key>,
        report: &mut CycleReport,
    ) -> Result<(), ExchangeError> {
        if !self.handshake_done && !self.handshake(port)? {
            return Ok(());
        }
        if self.handle.stop_requested() {
            return Ok(());
        }

        if let Some(encoding) = self.pending_sensor {
            let response = self
                .exchanger
                .exchange(port, &Request::room_temperature(encoding))?;
            self.mirror.apply(&response);
            self.room_sensor = encoding;
            self.pending_sensor = None;
        }

        if self.handle.stop_requested() {
            return Ok(());
        }

        let buttons = self.navigator.plan(target, manual);
        report.buttons = buttons;
        let sends = if buttons.is_idle() { 1 } else { PRESS_EXCHANGES };
        for sent in 0..sends {
            // The display already read back is still classified below
            if sent > 0 && self.handle.stop_requested() {
                break;
            }
            let response = self.exchanger.exchange(port, &Request::keys(buttons))?;
            self.mirror.apply(&response);
        }

        let frame = self.mirror.display_frame();
        let screen = classify(&frame, self.catalogue);
        if let Screen::TopStatus {
            mode,
            setpoint,
            fan,
        } = screen
        {
            self.last_top = Some((mode, setpoint, fan));
        }
        report.screen = screen;
        self.navigator.observe(frame, screen);
        Ok(())
    }

    /// Identify the controller and announce a remote panel
    ///
    /// Returns `false` when a stop request cut it short; it starts over on
    /// the next cycle.
    fn handshake<P: Transport>(&mut self, port: &mut P) -> Result<bool, ExchangeError> {
        if self.handle.stop_requested() {
            return Ok(false);
        }
        if let Response::SlaveId(record) = self.exchanger.exchange(port, &Request::ReportSlaveId)? {
            if let Some(id) = SlaveId::decode(&record) {
                if let Some(geometry) = id.display_geometry() {
                    self.mirror.set_geometry(geometry);
                }
                #[cfg(feature = "defmt")]
                defmt::info!("controller: {}", id);
                self.device = Some(id);
            }
        }
        if self.handle.stop_requested() {
            return Ok(false);
        }

        self.exchanger.exchange(
            port,
            &Request::ReadHoldingRegisters {
                address: PANEL_STATUS_REGISTER,
                count: 1,
            },
        )?;
        if self.handle.stop_requested() {
            return Ok(false);
        }

        let preset = Request::PresetSingleRegister {
            address: PANEL_VERSION_REGISTER,
            value: REMOTE_PANEL_VERSION,
        };
        let echo = self.exchanger.exchange(port, &preset)?;
        if echo
            != (Response::Preset {
                address: PANEL_VERSION_REGISTER,
                value: REMOTE_PANEL_VERSION,
            })
        {
            #[cfg(feature = "defmt")]
            defmt::warn!("panel version not acknowledged: {}", echo);
        }

        self.handshake_done = true;
        Ok(true)
    }

    fn snapshot(&self) -> PanelState {
        let led = self.mirror.led();
        let top = self.last_top;
        let mode = match led.is_powered() {
            Some(false) => Some(Mode::Off),
            _ => top.map(|(mode, _, _)| mode),
        };
        PanelState {
            mode,
            setpoint: top.map(|(_, setpoint, _)| setpoint),
            fan_speed: top.map(|(_, _, fan)| fan),
            online: self.online,
            led,
            room_sensor: self.room_sensor,
            navigation: self.navigator.state(),
            device: self.device.clone(),
            display: self.mirror.display_frame().summary(),
            readings: self.navigator.readings().clone(),
            stats: self.exchanger.stats(),
        }
    }

    fn publish(&self) {
        self.handle.publish(self.snapshot());
    }
}
