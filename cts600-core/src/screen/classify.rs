//! Display classification
//!
//! Matches a decoded display against the catalogue. Rows are compared with
//! leading and trailing blanks removed and inner runs of blanks collapsed,
//! so fixed-width padding does not matter. Anything that does not match a
//! template exactly, including a number out of range, is `Unrecognized`.

use heapless::{String, Vec};

use cts600_protocol::display::{DisplayCell, DisplayFrame, DisplayLine, MAX_COLUMNS, MAX_LINE_BYTES};

use super::catalogue::{Catalogue, ScreenKind, Template};
use super::readings::{Flow, Label, Temperature};
use crate::climate::{Mode, FAN_RANGE, SETPOINT_RANGE};

/// What the display shows
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Screen {
    TopStatus { mode: Mode, setpoint: u8, fan: u8 },
    SetpointMenu(u8),
    ModeMenu(Mode),
    FanMenu(u8),
    LanguagePrompt(&'static str),
    ShowDataEntry,
    DataStatus(Label),
    DataTemperature(Temperature),
    DataFlow(Flow),
    Unrecognized,
}

impl Screen {
    pub fn kind(&self) -> Option<ScreenKind> {
        match self {
            Screen::TopStatus { .. } => Some(ScreenKind::TopStatus),
            Screen::SetpointMenu(_) => Some(ScreenKind::SetpointMenu),
            Screen::ModeMenu(_) => Some(ScreenKind::ModeMenu),
            Screen::FanMenu(_) => Some(ScreenKind::FanMenu),
            Screen::LanguagePrompt(_) => Some(ScreenKind::LanguagePrompt),
            Screen::ShowDataEntry => Some(ScreenKind::ShowDataEntry),
            Screen::DataStatus(_) => Some(ScreenKind::DataStatus),
            Screen::DataTemperature(_) => Some(ScreenKind::DataTemperature),
            Screen::DataFlow(_) => Some(ScreenKind::DataFlow),
            Screen::Unrecognized => None,
        }
    }

    pub fn is_top(&self) -> bool {
        matches!(self, Screen::TopStatus { .. })
    }

    /// One of the value screens inside SHOW DATA
    pub fn is_data(&self) -> bool {
        matches!(
            self,
            Screen::DataStatus(_) | Screen::DataTemperature(_) | Screen::DataFlow(_)
        )
    }
}

/// Classify a display frame
pub fn classify(frame: &DisplayFrame, catalogue: &Catalogue) -> Screen {
    catalogue
        .templates
        .iter()
        .find_map(|template| match_template(template, frame, catalogue))
        .unwrap_or(Screen::Unrecognized)
}

/// Values captured while matching one template
#[derive(Default)]
struct Fields {
    mode: Option<Mode>,
    setpoint: Option<u8>,
    fan: Option<u8>,
    language: Option<&'static str>,
    status: Option<Label>,
    sensor: Option<u8>,
    celsius: Option<i8>,
    label: Option<Label>,
    level: Option<u8>,
}

impl Fields {
    fn capture(&mut self, name: &str, value: &[DisplayCell], catalogue: &Catalogue) -> bool {
        let mut text: String<MAX_LINE_BYTES> = String::new();
        for cell in value {
            if text.push(cell.ch).is_err() {
                return false;
            }
        }

        match name {
            "mode" => store(&mut self.mode, catalogue.lookup_mode(&text)),
            "setpoint" => store(
                &mut self.setpoint,
                parse_number(&text).filter(|v| SETPOINT_RANGE.contains(v)),
            ),
            "fan" => store(
                &mut self.fan,
                parse_number(&text).filter(|v| FAN_RANGE.contains(v)),
            ),
            "language" => store(&mut self.language, catalogue.lookup_language(&text)),
            "status" => store(&mut self.status, Label::from_cells(value)),
            "sensor" => store(&mut self.sensor, parse_number(&text)),
            "celsius" => store(&mut self.celsius, parse_signed(&text)),
            "label" => store(&mut self.label, Label::from_cells(value)),
            "level" => store(&mut self.level, parse_number(&text)),
            _ => false,
        }
    }

    fn into_screen(self, kind: ScreenKind) -> Option<Screen> {
        Some(match kind {
            ScreenKind::TopStatus => Screen::TopStatus {
                mode: self.mode?,
                setpoint: self.setpoint?,
                fan: self.fan?,
            },
            ScreenKind::SetpointMenu => Screen::SetpointMenu(self.setpoint?),
            ScreenKind::ModeMenu => Screen::ModeMenu(self.mode?),
            ScreenKind::FanMenu => Screen::FanMenu(self.fan?),
            ScreenKind::LanguagePrompt => Screen::LanguagePrompt(self.language?),
            ScreenKind::ShowDataEntry => Screen::ShowDataEntry,
            ScreenKind::DataStatus => Screen::DataStatus(self.status?),
            ScreenKind::DataTemperature => Screen::DataTemperature(Temperature {
                sensor: self.sensor?,
                celsius: self.celsius?,
            }),
            ScreenKind::DataFlow => Screen::DataFlow(Flow {
                label: self.label?,
                level: self.level?,
            }),
        })
    }
}

fn store<T>(slot: &mut Option<T>, value: Option<T>) -> bool {
    match value {
        Some(v) => {
            *slot = Some(v);
            true
        }
        None => false,
    }
}

/// Digits only, no sign, no padding
fn parse_number(text: &str) -> Option<u8> {
    if text.is_empty() || text.len() > 3 || !text.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    let value = text
        .bytes()
        .fold(0u16, |acc, b| acc * 10 + (b - b'0') as u16);
    u8::try_from(value).ok()
}

/// Digits with an optional leading minus
fn parse_signed(text: &str) -> Option<i8> {
    match text.strip_prefix('-') {
        Some(digits) => i8::try_from(-i16::from(parse_number(digits)?)).ok(),
        None => i8::try_from(parse_number(text)?).ok(),
    }
}

fn match_template(template: &Template, frame: &DisplayFrame, catalogue: &Catalogue) -> Option<Screen> {
    let mut fields = Fields::default();
    for (row, pattern) in template.rows.iter().enumerate() {
        if *pattern == "*" {
            continue;
        }
        let line = normalize(frame.line(row)?);
        if !match_row(pattern, &line, &mut fields, catalogue) {
            return None;
        }
    }
    fields.into_screen(template.kind)
}

/// Trim and collapse blanks
fn normalize(line: &DisplayLine) -> Vec<DisplayCell, MAX_COLUMNS> {
    let mut out: Vec<DisplayCell, MAX_COLUMNS> = Vec::new();
    let mut gap: Option<DisplayCell> = None;
    for cell in line.cells() {
        if cell.ch.is_whitespace() {
            if !out.is_empty() && gap.is_none() {
                gap = Some(DisplayCell {
                    ch: ' ',
                    blink: cell.blink,
                });
            }
        } else {
            if let Some(space) = gap.take() {
                let _ = out.push(space);
            }
            let _ = out.push(*cell);
        }
    }
    out
}

fn match_row(pattern: &str, line: &[DisplayCell], fields: &mut Fields, catalogue: &Catalogue) -> bool {
    let mut rest = pattern;
    let mut pos = 0;

    while let Some(tc) = rest.chars().next() {
        if tc == '{' || tc == '[' {
            let close = if tc == '{' { '}' } else { ']' };
            let body = &rest[1..];
            let Some(end) = body.find(close) else {
                return false;
            };
            let name = &body[..end];
            rest = &body[end + 1..];

            // The field ends where the next literal begins
            let stop = rest.chars().next();
            let start = pos;
            while pos < line.len() && Some(line[pos].ch) != stop {
                pos += 1;
            }
            let value = &line[start..pos];
            if value.is_empty() {
                return false;
            }
            if close == ']' && !value.iter().all(|c| c.blink) {
                return false;
            }
            if !fields.capture(name, value, catalogue) {
                return false;
            }
        } else {
            if line.get(pos).map(|c| c.ch) != Some(tc) {
                return false;
            }
            pos += 1;
            rest = &rest[tc.len_utf8()..];
        }
    }

    pos == line.len()
}
