//! Simulated CTS600 controller
//!
//! Answers panel frames the way the controller does: a two row, eight
//! column display with blink attributes, the LED on output bit 0x100, and
//! only changed outputs in each reply. Starts in Danish so the panel has
//! to switch the language first.
//!
//! UP from the top screen reaches SHOW DATA, DOWN walks the menu list
//! with the language entry last.

use std::collections::VecDeque;

use cts600_hal::uart::{PortOpener, UartConfig};
use cts600_protocol::frame::{Data, FrameError, Request, Response, KEY_REGISTER, T15_REGISTER};
use cts600_protocol::keys::{ButtonVector, Key};
use cts600_protocol::sensor::{self, SensorEncoding};
use embedded_io::ErrorKind;

pub const ROWS: usize = 2;
pub const COLUMNS: usize = 8;
const STRIDE: usize = COLUMNS + COLUMNS / 4;
const DISPLAY_BYTES: usize = ROWS * STRIDE;

/// Language options in prompt order
pub const LANGUAGES: [&str; 3] = ["ENGLISH", "DANSK", "DEUTSCH"];
const ENGLISH: usize = 0;
const DANSK: usize = 1;

/// Menu list entries reached with DOWN from the top screen
const ITEMS_EN: [&str; 8] = [
    "ALARMS", "TIMER", "WEEKPROG", "CLOCK", "SERVICE", "FILTER", "DEFROST", "LANGUAGE",
];
const ITEMS_DA: [&str; 8] = [
    "ALARMER", "TIMER", "UGEPROG", "UR", "SERVICE", "FILTER", "AFRIMING", "SPROG",
];

/// Fixed SHOW DATA sensors after T15, as (title, sensor, °C)
const SENSORS: [(&str, u8, i8); 4] = [
    ("OUTDOOR", 2, -3),
    ("SUPPLY", 1, 16),
    ("CONDENS", 5, 4),
    ("EVAPOR", 6, 39),
];

/// SHOW DATA entries: status, T15, the fixed sensors, two flows, firmware
pub const DATA_ENTRIES: usize = 1 + 1 + SENSORS.len() + 2 + 1;

const MODES_EN: [&str; 3] = ["AUTO", "COOL", "HEAT"];
const MODES_DA: [&str; 3] = ["AUTO", "KØL", "VARME"];

/// Injected fault for the next reply
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Fault {
    /// Flip the last CRC byte
    Corrupt,
    /// Drop the last three bytes
    Truncate,
    /// Send nothing
    Silence,
    /// Fail the next read with a non-transient error
    Fatal,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Menu {
    Top,
    /// List entry, 1 based
    Item(usize),
    Setpoint(u8),
    Mode(usize),
    Flow(u8),
    Language(usize),
    /// SHOW DATA entry above the top screen
    ShowData,
    /// SHOW DATA value, 0 based
    Data(usize),
}

#[derive(Debug)]
pub struct SimError(pub ErrorKind);

impl embedded_io::Error for SimError {
    fn kind(&self) -> ErrorKind {
        self.0
    }
}

#[derive(Debug)]
pub struct Controller {
    pub menu: Menu,
    pub language: usize,
    pub setpoint: u8,
    /// Index into the mode list, AUTO first
    pub mode: usize,
    pub fan: u8,
    pub on: bool,
    /// Last T15 value written
    pub t15: Option<u16>,
    /// Keys acted on, in order
    pub presses: Vec<Key>,
    /// Request frames received, retries included
    pub requests: usize,
    pub faults: VecDeque<Fault>,
    last_keys: u8,
    sent_display: Option<[u8; DISPLAY_BYTES]>,
    sent_led: Option<u8>,
    rx: Vec<u8>,
    tx: VecDeque<u8>,
    fatal: bool,
}

impl Default for Controller {
    fn default() -> Self {
        Self::new()
    }
}

impl Controller {
    /// Cooling at 21 °C, fan 2, unit running, Danish menus
    pub fn new() -> Self {
        Self {
            menu: Menu::Top,
            language: DANSK,
            setpoint: 21,
            mode: 1,
            fan: 2,
            on: true,
            t15: None,
            presses: Vec::new(),
            requests: 0,
            faults: VecDeque::new(),
            last_keys: 0,
            sent_display: None,
            sent_led: None,
            rx: Vec::new(),
            tx: VecDeque::new(),
            fatal: false,
        }
    }

    pub fn english(mut self) -> Self {
        self.language = ENGLISH;
        self
    }

    pub fn inject(&mut self, fault: Fault, times: usize) {
        for _ in 0..times {
            self.faults.push_back(fault);
        }
    }

    pub fn language_name(&self) -> &'static str {
        LANGUAGES[self.language]
    }

    fn danish(&self) -> bool {
        self.language == DANSK
    }

    fn press(&mut self, key: Key) {
        self.presses.push(key);
        self.menu = match (self.menu, key) {
            (_, Key::Off) => {
                self.on = false;
                self.menu
            }
            (_, Key::On) => {
                self.on = true;
                self.menu
            }
            (Menu::Language(_), Key::Esc) => Menu::Item(8),
            (_, Key::Esc) => Menu::Top,

            (Menu::Top, Key::Up) => Menu::ShowData,
            (Menu::ShowData, Key::Down) => Menu::Top,
            (Menu::ShowData, Key::Enter) => Menu::Data(0),
            (Menu::Data(n), Key::Down) => Menu::Data((n + 1).min(DATA_ENTRIES - 1)),
            (Menu::Data(n), Key::Up) => Menu::Data(n.saturating_sub(1)),

            (Menu::Top, Key::Down) => Menu::Item(1),
            (Menu::Top, Key::Enter) => Menu::Setpoint(self.setpoint),
            (Menu::Item(1), Key::Up) => Menu::Top,
            (Menu::Item(n), Key::Up) => Menu::Item(n - 1),
            (Menu::Item(n), Key::Down) => Menu::Item((n + 1).min(8)),
            (Menu::Item(8), Key::Enter) => Menu::Language(self.language),

            (Menu::Setpoint(v), Key::Up) => Menu::Setpoint((v + 1).min(30)),
            (Menu::Setpoint(v), Key::Down) => Menu::Setpoint((v - 1).max(5)),
            (Menu::Setpoint(v), Key::Enter) => {
                self.setpoint = v;
                Menu::Mode(self.mode)
            }
            (Menu::Mode(m), Key::Up) => Menu::Mode(m.saturating_sub(1)),
            (Menu::Mode(m), Key::Down) => Menu::Mode((m + 1).min(2)),
            (Menu::Mode(m), Key::Enter) => {
                self.mode = m;
                Menu::Flow(self.fan)
            }
            (Menu::Flow(f), Key::Up) => Menu::Flow((f + 1).min(4)),
            (Menu::Flow(f), Key::Down) => Menu::Flow((f - 1).max(1)),
            (Menu::Flow(f), Key::Enter) => {
                self.fan = f;
                Menu::Top
            }
            (Menu::Language(l), Key::Up) => Menu::Language(l.saturating_sub(1)),
            (Menu::Language(l), Key::Down) => Menu::Language((l + 1).min(LANGUAGES.len() - 1)),
            (Menu::Language(l), Key::Enter) => {
                self.language = l;
                Menu::Item(8)
            }
            (menu, _) => menu,
        };
    }

    /// Rows as (text, blinking char range)
    fn rows(&self) -> [(String, std::ops::Range<usize>); ROWS] {
        let modes = if self.danish() { MODES_DA } else { MODES_EN };
        let items = if self.danish() { ITEMS_DA } else { ITEMS_EN };
        let plain = |s: &str| (s.to_string(), 0..0);
        match self.menu {
            Menu::Top => [
                plain(&format!(" {}", modes[self.mode])),
                plain(&format!(">{}< {:>2}°C", self.fan, self.setpoint)),
            ],
            Menu::Item(n) => [plain(items[n - 1]), plain("")],
            Menu::Setpoint(v) => {
                let title = if self.danish() { "TERMOST" } else { "THERMOST" };
                let digits = v.to_string().len();
                [plain(title), (format!("  {}°C", v), 2..2 + digits)]
            }
            Menu::Mode(m) => {
                let title = if self.danish() { "DRIFT" } else { "MODE" };
                let word = modes[m];
                [plain(title), (word.to_string(), 0..word.chars().count())]
            }
            Menu::Flow(f) => {
                let title = if self.danish() { "LUFT" } else { "FLOW" };
                [plain(title), (format!("  >{}<", f), 2..5)]
            }
            Menu::Language(l) => {
                let name = LANGUAGES[l];
                [plain(items[7]), (name.to_string(), 0..name.len())]
            }
            Menu::ShowData => {
                let title = if self.danish() { "VIS" } else { "SHOW" };
                [plain(title), plain("DATA")]
            }
            Menu::Data(n) => {
                let (title, value) = self.data_entry(n);
                [plain(&title), plain(&value)]
            }
        }
    }

    /// Room temperature as shown in SHOW DATA
    pub fn room_celsius(&self) -> i8 {
        self.t15
            .map(|raw| sensor::decode(SensorEncoding(raw)).round() as i8)
            .unwrap_or(23)
    }

    pub fn status_text(&self) -> &'static str {
        if !self.on {
            return "OFF";
        }
        ["AUTO", "COOLING", "HEATING"][self.mode]
    }

    fn data_entry(&self, n: usize) -> (String, String) {
        let temperature = |sensor: u8, celsius: i8| format!("T{:<2}{:>3}°C", sensor, celsius);
        let flow = format!("FLOW {:>3}", self.fan);
        match n {
            0 => ("STATUS".to_string(), self.status_text().to_string()),
            1 => ("ROOM".to_string(), temperature(15, self.room_celsius())),
            n if n < 2 + SENSORS.len() => {
                let (title, sensor, celsius) = SENSORS[n - 2];
                (title.to_string(), temperature(sensor, celsius))
            }
            n if n == 2 + SENSORS.len() => ("INLET".to_string(), flow),
            n if n == 3 + SENSORS.len() => ("EXHAUST".to_string(), flow),
            _ => ("SOFTWARE".to_string(), "V 1.31".to_string()),
        }
    }

    fn display(&self) -> [u8; DISPLAY_BYTES] {
        let mut bytes = [0u8; DISPLAY_BYTES];
        for (r, (text, blink)) in self.rows().iter().enumerate() {
            assert!(text.chars().count() <= COLUMNS, "row too wide: {:?}", text);
            let start = r * STRIDE;
            for i in 0..COLUMNS {
                bytes[start + i] = b' ';
            }
            for (i, ch) in text.chars().take(COLUMNS).enumerate() {
                bytes[start + i] = encode_char(ch);
                if blink.contains(&i) {
                    let bit = 2 * i;
                    bytes[start + COLUMNS + bit / 8] |= 0b10 << (bit % 8);
                }
            }
        }
        bytes
    }

    /// Reply with whatever output changed, LED first
    fn changed_outputs(&mut self) -> Response {
        let led = self.on as u8;
        if self.sent_led != Some(led) {
            self.sent_led = Some(led);
            return Response::OutputBits {
                address: 0x100,
                count: 1,
                data: data(&[led]),
            };
        }

        let display = self.display();
        if self.sent_display != Some(display) {
            self.sent_display = Some(display);
            return Response::OutputRegisters {
                address: 0x200,
                count: DISPLAY_BYTES as u16,
                data: data(&display),
            };
        }

        Response::OutputRegisters {
            address: 0x200,
            count: 0,
            data: Data::new(),
        }
    }

    fn handle(&mut self, request: Request) -> Response {
        match request {
            Request::ReportSlaveId => Response::SlaveId(data(&slave_id_record())),
            Request::ReadHoldingRegisters { count, .. } => {
                Response::HoldingRegisters(data(&vec![0u8; 2 * count as usize]))
            }
            Request::ReadInputRegisters { address, count } => {
                let mut bytes = vec![0u8; 2 * count as usize];
                if address == T15_REGISTER && count > 0 {
                    bytes[..2].copy_from_slice(&self.t15.unwrap_or(0).to_be_bytes());
                }
                Response::InputRegisters(data(&bytes))
            }
            Request::PresetSingleRegister { address, value } => Response::Preset { address, value },
            Request::WriteInput { address, value } => {
                if address == KEY_REGISTER {
                    let keys = value as u8;
                    let pressed = keys & !self.last_keys;
                    self.last_keys = keys;
                    for key in ButtonVector::from_bits(pressed).keys() {
                        self.press(key);
                    }
                } else if address == T15_REGISTER {
                    self.t15 = Some(value);
                }
                self.changed_outputs()
            }
        }
    }

    fn reply(&mut self, request: Request) {
        self.requests += 1;
        self.tx.clear();
        let response = self.handle(request);
        let mut bytes = response.encode_to_vec(3).unwrap().to_vec();
        match self.faults.pop_front() {
            None => {}
            Some(Fault::Corrupt) => {
                let last = bytes.len() - 1;
                bytes[last] ^= 0x5a;
            }
            Some(Fault::Truncate) => bytes.truncate(bytes.len() - 3),
            Some(Fault::Silence) => bytes.clear(),
            Some(Fault::Fatal) => self.fatal = true,
        }
        // A lost reply still counts as sent
        if bytes.len() != response.encode_to_vec(3).unwrap().len() {
            self.forget_sent(&response);
        }
        self.tx.extend(bytes);
    }

    /// Resend an output the panel never received
    fn forget_sent(&mut self, response: &Response) {
        match response {
            Response::OutputBits { .. } => self.sent_led = None,
            Response::OutputRegisters { count, .. } if *count > 0 => self.sent_display = None,
            _ => {}
        }
    }
}

fn encode_char(ch: char) -> u8 {
    match ch {
        'Æ' => 8,
        'Ø' => 9,
        'Å' => 10,
        '°' => 223,
        c => c as u8,
    }
}

fn data(bytes: &[u8]) -> Data {
    let mut data = Data::new();
    data.extend_from_slice(bytes).unwrap();
    data
}

/// Slave ID record for a two row, eight column display
pub fn slave_id_record() -> Vec<u8> {
    let mut v = vec![16, 1, 0, 1, 100];
    v.extend_from_slice(&131u16.to_be_bytes());
    v.extend_from_slice(&[0, 0, 0, 0]);
    v.extend_from_slice(b"6551720001");
    v.extend_from_slice(&[0; 14]);
    v.extend_from_slice(&0u16.to_be_bytes());
    v.extend_from_slice(&(ROWS as u16).to_be_bytes());
    v.extend_from_slice(&(COLUMNS as u16).to_be_bytes());
    v.extend_from_slice(&[1, 1]);
    v
}

impl embedded_io::ErrorType for Controller {
    type Error = SimError;
}

impl embedded_io::Write for Controller {
    fn write(&mut self, buf: &[u8]) -> Result<usize, SimError> {
        self.rx.extend_from_slice(buf);
        loop {
            match Request::parse(&self.rx) {
                Ok((request, _unit, used)) => {
                    self.rx = self.rx.split_off(used);
                    self.reply(request);
                }
                Err(FrameError::Incomplete) => break,
                Err(_) => {
                    self.rx.clear();
                    break;
                }
            }
        }
        Ok(buf.len())
    }

    fn flush(&mut self) -> Result<(), SimError> {
        Ok(())
    }
}

impl embedded_io::Read for Controller {
    fn read(&mut self, buf: &mut [u8]) -> Result<usize, SimError> {
        if self.fatal {
            return Err(SimError(ErrorKind::NotConnected));
        }
        // Short reads, like a UART FIFO
        let n = buf.len().min(self.tx.len()).min(7);
        for slot in buf.iter_mut().take(n) {
            *slot = self.tx.pop_front().unwrap();
        }
        Ok(n)
    }
}

/// Hands out one controller, then reports the device missing
pub struct SimOpener {
    pub controller: Option<Controller>,
    pub opened: Option<(String, UartConfig)>,
}

impl SimOpener {
    pub fn new(controller: Controller) -> Self {
        Self {
            controller: Some(controller),
            opened: None,
        }
    }

    pub fn missing() -> Self {
        Self {
            controller: None,
            opened: None,
        }
    }
}

impl PortOpener for SimOpener {
    type Port = Controller;
    type Error = SimError;

    fn open(&mut self, device: &str, config: &UartConfig) -> Result<Controller, SimError> {
        let controller = self.controller.take().ok_or(SimError(ErrorKind::NotFound))?;
        self.opened = Some((device.to_string(), *config));
        Ok(controller)
    }
}

/// Delay that returns at once
pub struct NoDelay;

impl embedded_hal::delay::DelayNs for NoDelay {
    fn delay_ns(&mut self, _ns: u32) {}
}

/// Delay backed by the thread scheduler
pub struct ThreadDelay;

impl embedded_hal::delay::DelayNs for ThreadDelay {
    fn delay_ns(&mut self, ns: u32) {
        std::thread::sleep(std::time::Duration::from_nanos(ns as u64));
    }
}
