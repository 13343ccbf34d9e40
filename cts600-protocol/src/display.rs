//! Register mirror and display decoding
//!
//! The controller only reports outputs that changed, so the panel keeps a
//! mirror of every output register and bit it has been sent. The display
//! and the LED are read back from that mirror.
//!
//! Display layout, per row `r`:
//!
//! ```text
//! 0x200 + r * (columns + columns / 4)
//! ┌──────────────────────┬─────────────────────────┐
//! │ text, `columns` bytes │ attributes, columns / 4 │
//! └──────────────────────┴─────────────────────────┘
//! ```
//!
//! Attribute bytes hold two bits per character, least significant first.
//! `0b10` starts a blinking run and `0b00` ends it.

use heapless::{String, Vec};

use crate::frame::Response;

/// Number of mirrored output registers
pub const REGISTER_COUNT: usize = 0x300;

/// Number of mirrored output bits
pub const OUTPUT_BIT_COUNT: usize = 0x200;

/// First display register
pub const DISPLAY_BASE: usize = 0x200;

/// Output bit carrying the LED state
pub const LED_BIT: usize = 0x100;

/// Largest display we decode
pub const MAX_ROWS: usize = 4;
pub const MAX_COLUMNS: usize = 20;

/// Bytes needed to render one row as UTF-8 (Latin-1 is at most two bytes)
pub const MAX_LINE_BYTES: usize = MAX_COLUMNS * 2;

/// Bytes needed for [`DisplayFrame::summary`]
pub const MAX_SUMMARY_BYTES: usize = MAX_ROWS * (MAX_LINE_BYTES + 1);

/// Display size in characters
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct DisplayGeometry {
    pub rows: u8,
    pub columns: u8,
}

impl Default for DisplayGeometry {
    /// The CTS600 panel is 2 x 8 unless the slave ID says otherwise
    fn default() -> Self {
        Self { rows: 2, columns: 8 }
    }
}

impl DisplayGeometry {
    /// Geometry limited to what fits the decoder, or `None` if empty
    pub fn new(rows: u16, columns: u16) -> Option<Self> {
        if rows == 0 || columns == 0 {
            return None;
        }
        Some(Self {
            rows: rows.min(MAX_ROWS as u16) as u8,
            columns: columns.min(MAX_COLUMNS as u16) as u8,
        })
    }

    /// Registers per row: text plus attributes
    pub fn row_stride(&self) -> usize {
        let columns = self.columns as usize;
        columns + columns / 4
    }

    /// First register of `row`
    pub fn row_start(&self, row: usize) -> usize {
        DISPLAY_BASE + row * self.row_stride()
    }
}

/// Front panel LED
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum LedState {
    #[default]
    Off,
    On,
    Unknown,
    Blink,
}

impl LedState {
    /// Decode the low two bits of the LED output
    pub fn from_bits(bits: u8) -> Self {
        match bits & 0b11 {
            0 => LedState::Off,
            1 => LedState::On,
            2 => LedState::Unknown,
            _ => LedState::Blink,
        }
    }

    /// Whether the unit is running, if the LED tells
    pub fn is_powered(self) -> Option<bool> {
        match self {
            LedState::Off => Some(false),
            LedState::On | LedState::Blink => Some(true),
            LedState::Unknown => None,
        }
    }
}

/// Map one display byte through the controller code page
///
/// The controller puts the Nordic letters in the control range; everything
/// else is Latin-1.
pub fn decode_char(byte: u8) -> char {
    match byte {
        8 => 'Æ',
        9 => 'Ø',
        10 => 'Å',
        11 => 'Ä',
        12 => 'Ö',
        13 => 'Ú',
        223 => '°',
        b => char::from(b),
    }
}

/// One displayed character
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct DisplayCell {
    pub ch: char,
    pub blink: bool,
}

/// One decoded display row
#[derive(Debug, Clone, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct DisplayLine {
    cells: Vec<DisplayCell, MAX_COLUMNS>,
}

impl DisplayLine {
    /// Build a line from cells, keeping at most [`MAX_COLUMNS`]
    pub fn from_cells(cells: impl IntoIterator<Item = DisplayCell>) -> Self {
        let mut line = Self::default();
        for cell in cells.into_iter().take(MAX_COLUMNS) {
            let _ = line.cells.push(cell);
        }
        line
    }

    /// Characters with their blink attribute
    pub fn cells(&self) -> &[DisplayCell] {
        &self.cells
    }

    /// Row text as shown, padding included
    pub fn text(&self) -> String<MAX_LINE_BYTES> {
        let mut text = String::new();
        for cell in &self.cells {
            // Capacity covers MAX_COLUMNS two-byte characters
            let _ = text.push(cell.ch);
        }
        text
    }

    /// Blinking characters, trimmed
    pub fn blink_text(&self) -> String<MAX_LINE_BYTES> {
        let mut text: String<MAX_LINE_BYTES> = String::new();
        for cell in self.cells.iter().filter(|c| c.blink) {
            let _ = text.push(cell.ch);
        }
        let trimmed = text.trim();
        let mut out = String::new();
        let _ = out.push_str(trimmed);
        out
    }

    /// Whether any character blinks
    pub fn has_blink(&self) -> bool {
        self.cells.iter().any(|c| c.blink)
    }
}

/// Decoded display plus LED, one per successful exchange
#[derive(Debug, Clone, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct DisplayFrame {
    lines: Vec<DisplayLine, MAX_ROWS>,
    pub led: LedState,
}

impl DisplayFrame {
    /// Build a frame from decoded lines
    pub fn new(lines: impl IntoIterator<Item = DisplayLine>, led: LedState) -> Self {
        let mut frame = Self {
            lines: Vec::new(),
            led,
        };
        for line in lines.into_iter().take(MAX_ROWS) {
            let _ = frame.lines.push(line);
        }
        frame
    }

    /// Build an unattributed frame from plain text rows
    pub fn from_text(rows: &[&str], led: LedState) -> Self {
        Self::new(
            rows.iter().map(|row| {
                DisplayLine::from_cells(row.chars().map(|ch| DisplayCell { ch, blink: false }))
            }),
            led,
        )
    }

    pub fn lines(&self) -> &[DisplayLine] {
        &self.lines
    }

    pub fn line(&self, row: usize) -> Option<&DisplayLine> {
        self.lines.get(row)
    }

    /// Whether the display shows nothing but blanks
    pub fn is_blank(&self) -> bool {
        self.lines
            .iter()
            .all(|line| line.cells().iter().all(|c| c.ch.is_whitespace()))
    }

    /// Rows trimmed and joined with `/`
    pub fn summary(&self) -> String<MAX_SUMMARY_BYTES> {
        let mut out = String::new();
        for (i, line) in self.lines.iter().enumerate() {
            if i > 0 {
                let _ = out.push('/');
            }
            let _ = out.push_str(line.text().trim());
        }
        out
    }
}

/// Panel-side copy of the controller outputs
#[derive(Debug, Clone)]
pub struct PanelMirror {
    registers: [u8; REGISTER_COUNT],
    bits: [u8; OUTPUT_BIT_COUNT],
    geometry: DisplayGeometry,
}

impl Default for PanelMirror {
    fn default() -> Self {
        Self::new()
    }
}

impl PanelMirror {
    /// Empty mirror with the default geometry
    pub fn new() -> Self {
        Self {
            registers: [0; REGISTER_COUNT],
            bits: [0; OUTPUT_BIT_COUNT],
            geometry: DisplayGeometry::default(),
        }
    }

    pub fn geometry(&self) -> DisplayGeometry {
        self.geometry
    }

    pub fn set_geometry(&mut self, geometry: DisplayGeometry) {
        self.geometry = geometry;
    }

    /// Mirrored output register, zero if never reported
    pub fn register(&self, address: usize) -> u8 {
        self.registers.get(address).copied().unwrap_or(0)
    }

    /// Mirrored output bit, zero if never reported
    pub fn bit(&self, address: usize) -> u8 {
        self.bits.get(address).copied().unwrap_or(0)
    }

    /// Fold a response into the mirror
    ///
    /// Only output register and output bit updates touch the mirror. Data
    /// beyond the mirrored range is dropped.
    pub fn apply(&mut self, response: &Response) {
        match response {
            Response::OutputRegisters { address, data, .. } => {
                store(&mut self.registers, *address as usize, data);
            }
            Response::OutputBits { address, data, .. } => {
                store(&mut self.bits, *address as usize, data);
            }
            _ => {}
        }
    }

    /// LED state from the mirrored output bit
    pub fn led(&self) -> LedState {
        LedState::from_bits(self.bits[LED_BIT])
    }

    /// Decode the current display
    pub fn display_frame(&self) -> DisplayFrame {
        let columns = self.geometry.columns as usize;
        let lines = (0..self.geometry.rows as usize).map(|row| {
            let start = self.geometry.row_start(row);
            let text = &self.registers[start..start + columns];
            let attributes = &self.registers[start + columns..start + self.geometry.row_stride()];
            decode_row(text, attributes)
        });
        DisplayFrame::new(lines, self.led())
    }
}

fn store(target: &mut [u8], address: usize, data: &[u8]) {
    if address >= target.len() {
        return;
    }
    let len = data.len().min(target.len() - address);
    target[address..address + len].copy_from_slice(&data[..len]);
}

fn decode_row(text: &[u8], attributes: &[u8]) -> DisplayLine {
    let mut blink = false;
    let cells = text.iter().enumerate().filter_map(move |(i, &byte)| {
        let bit = 2 * i;
        let mode = attributes
            .get(bit / 8)
            .map(|a| (a >> (bit & 7)) & 0b11)
            .unwrap_or(0);
        match mode {
            0b10 => blink = true,
            0b00 => blink = false,
            _ => {}
        }
        // NUL bytes are not displayed
        (byte != 0).then(|| DisplayCell {
            ch: decode_char(byte),
            blink,
        })
    });
    DisplayLine::from_cells(cells)
}
