//! SHOW DATA values
//!
//! The controller lists its sensors in a read-only menu, one value per
//! screen. Values collected from those screens are kept here between
//! scans; a later reading of the same sensor replaces the earlier one.

use heapless::{String, Vec};

use cts600_protocol::display::{DisplayCell, MAX_COLUMNS, MAX_LINE_BYTES};

use super::classify::Screen;

/// Temperature sensors kept
pub const MAX_TEMPERATURES: usize = 8;

/// Flow values kept
pub const MAX_FLOWS: usize = 4;

/// Display text captured by a template field
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Label {
    chars: [char; MAX_COLUMNS],
    len: u8,
}

impl Label {
    /// `None` if the text is empty or wider than a display row
    pub fn new(text: &str) -> Option<Self> {
        Self::from_chars(text.chars())
    }

    pub(crate) fn from_cells(cells: &[DisplayCell]) -> Option<Self> {
        Self::from_chars(cells.iter().map(|c| c.ch))
    }

    fn from_chars(chars: impl Iterator<Item = char>) -> Option<Self> {
        let mut label = Self {
            chars: [' '; MAX_COLUMNS],
            len: 0,
        };
        for ch in chars {
            let slot = label.chars.get_mut(label.len as usize)?;
            *slot = ch;
            label.len += 1;
        }
        (label.len > 0).then_some(label)
    }

    pub fn chars(&self) -> &[char] {
        &self.chars[..self.len as usize]
    }

    pub fn as_string(&self) -> String<MAX_LINE_BYTES> {
        let mut out = String::new();
        for ch in self.chars() {
            // A row of MAX_COLUMNS chars always fits MAX_LINE_BYTES
            let _ = out.push(*ch);
        }
        out
    }

    pub fn matches(&self, text: &str) -> bool {
        self.chars().iter().copied().eq(text.chars())
    }
}

#[cfg(feature = "defmt")]
impl defmt::Format for Label {
    fn format(&self, f: defmt::Formatter) {
        defmt::write!(f, "{=str}", self.as_string().as_str())
    }
}

/// One temperature sensor, e.g. T15
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Temperature {
    /// Number after the `T`
    pub sensor: u8,
    pub celsius: i8,
}

/// One air flow value, named by the screen title
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Flow {
    pub label: Label,
    pub level: u8,
}

/// Values read from the SHOW DATA menu
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Readings {
    /// Operating status text, e.g. `COOLING`
    pub status: Option<Label>,
    pub temperatures: Vec<Temperature, MAX_TEMPERATURES>,
    pub flows: Vec<Flow, MAX_FLOWS>,
    /// Completed scans
    pub scans: u32,
}

impl Readings {
    pub fn temperature(&self, sensor: u8) -> Option<i8> {
        self.temperatures
            .iter()
            .find(|t| t.sensor == sensor)
            .map(|t| t.celsius)
    }

    pub fn flow(&self, label: &str) -> Option<u8> {
        self.flows
            .iter()
            .find(|f| f.label.matches(label))
            .map(|f| f.level)
    }

    pub fn is_empty(&self) -> bool {
        self.status.is_none() && self.temperatures.is_empty() && self.flows.is_empty()
    }

    /// Keep the value a SHOW DATA screen shows; other screens are ignored
    pub fn record(&mut self, screen: &Screen) {
        match *screen {
            Screen::DataStatus(status) => self.status = Some(status),
            Screen::DataTemperature(reading) => self.set_temperature(reading),
            Screen::DataFlow(reading) => self.set_flow(reading),
            _ => {}
        }
    }

    /// Store a temperature; sensors past the capacity are dropped
    pub fn set_temperature(&mut self, reading: Temperature) {
        match self.temperatures.iter_mut().find(|t| t.sensor == reading.sensor) {
            Some(slot) => *slot = reading,
            None => {
                let _ = self.temperatures.push(reading);
            }
        }
    }

    /// Store a flow value; labels past the capacity are dropped
    pub fn set_flow(&mut self, reading: Flow) {
        match self.flows.iter_mut().find(|f| f.label == reading.label) {
            Some(slot) => *slot = reading,
            None => {
                let _ = self.flows.push(reading);
            }
        }
    }
}
