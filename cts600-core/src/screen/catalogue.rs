//! Screen templates
//!
//! The controller's menus differ between firmware versions and languages,
//! so the layouts are data. A template row is matched against one trimmed
//! display row:
//!
//! - `{field}` captures a field; `[field]` captures a field that must blink
//! - a row that is exactly `*` matches anything
//! - every other character must match literally
//!
//! A field runs up to the next literal character of the template, or to
//! the end of the row. Known fields: `mode`, `setpoint`, `fan`, `language`,
//! and on the SHOW DATA screens `status`, `sensor`, `celsius`, `label`,
//! `level`.
//!
//! The panel display is two rows of eight characters, so every template
//! row has to fit in eight cells once its fields are filled in.

use crate::climate::Mode;

/// Recognized screens
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ScreenKind {
    /// Resting screen: mode, setpoint and fan level
    TopStatus,
    /// Thermostat entry with the setpoint blinking
    SetpointMenu,
    /// Mode entry with the mode blinking
    ModeMenu,
    /// Fan flow entry with the level blinking
    FanMenu,
    /// Display language entry with the language blinking
    LanguagePrompt,
    /// SHOW DATA menu entry, one UP from the top screen
    ShowDataEntry,
    /// Operating status inside SHOW DATA
    DataStatus,
    /// One temperature sensor inside SHOW DATA
    DataTemperature,
    /// One air flow value inside SHOW DATA
    DataFlow,
}

/// One screen layout, row by row
#[derive(Debug, Clone, Copy)]
pub struct Template {
    pub kind: ScreenKind,
    pub rows: &'static [&'static str],
}

/// Templates plus the words they can capture
#[derive(Debug, Clone, Copy)]
pub struct Catalogue {
    /// Tried in order, first match wins
    pub templates: &'static [Template],
    /// Words shown for each mode
    pub modes: &'static [(&'static str, Mode)],
    /// Language names as shown in the language prompt
    pub languages: &'static [&'static str],
    /// Language the templates are written in
    pub language: &'static str,
}

impl Catalogue {
    pub fn lookup_mode(&self, word: &str) -> Option<Mode> {
        self.modes
            .iter()
            .find(|(text, _)| *text == word)
            .map(|(_, mode)| *mode)
    }

    pub fn lookup_language(&self, word: &str) -> Option<&'static str> {
        self.languages.iter().copied().find(|name| *name == word)
    }
}

/// English menu set
pub static ENGLISH: Catalogue = Catalogue {
    templates: &[
        // Mode on the first row, flow and thermostat on the second
        Template {
            kind: ScreenKind::TopStatus,
            rows: &["{mode}", ">{fan}< {setpoint}°C"],
        },
        Template {
            kind: ScreenKind::ShowDataEntry,
            rows: &["SHOW", "DATA"],
        },
        Template {
            kind: ScreenKind::DataStatus,
            rows: &["STATUS", "{status}"],
        },
        Template {
            kind: ScreenKind::DataTemperature,
            rows: &["*", "T{sensor} {celsius}°C"],
        },
        Template {
            kind: ScreenKind::DataFlow,
            rows: &["{label}", "FLOW {level}"],
        },
        // The title does not fit next to the value; the blinking digits do
        Template {
            kind: ScreenKind::SetpointMenu,
            rows: &["*", "[setpoint]°C"],
        },
        Template {
            kind: ScreenKind::ModeMenu,
            rows: &["MODE", "[mode]"],
        },
        Template {
            kind: ScreenKind::FanMenu,
            rows: &["FLOW", ">[fan]<"],
        },
        // The prompt title follows the current language, the options do not
        Template {
            kind: ScreenKind::LanguagePrompt,
            rows: &["*", "[language]"],
        },
    ],
    modes: &[
        ("AUTO", Mode::Auto),
        ("COOL", Mode::Cool),
        ("HEAT", Mode::Heat),
        ("OFF", Mode::Off),
    ],
    languages: &[
        "ENGLISH", "DANSK", "DEUTSCH", "SVENSKA", "NORSK", "SUOMI", "FRANCAIS", "POLSKI",
    ],
    language: "ENGLISH",
};
