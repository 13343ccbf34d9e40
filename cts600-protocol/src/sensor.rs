//! T15 room sensor codec
//!
//! The controller normally reads its room temperature (T15) from an NTC
//! divider on an AD input. The panel link lets us overwrite that reading,
//! so an external thermometer can stand in for the built-in sensor.
//!
//! The conversion is a straight line fitted to two points observed on a
//! real unit (12 °C ↔ 328, 34 °C ↔ 168). The real divider is not linear, so
//! the error grows toward the ends of the range, most noticeably below
//! about 10 °C. As with the divider, the raw value falls as the
//! temperature rises.

/// Temperature at raw value zero (°C)
const OFFSET_C: f32 = 56.25;

/// Degrees per raw step
const SLOPE_C: f32 = (34.0 - 12.0) / (328.0 - 168.0);

/// Room temperature used until an external reading arrives (°C)
pub const DEFAULT_ROOM_CELSIUS: f32 = 21.0;

/// Raw 16-bit T15 value as written to the sensor register
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct SensorEncoding(pub u16);

impl SensorEncoding {
    /// Raw register value
    pub const fn raw(self) -> u16 {
        self.0
    }
}

impl Default for SensorEncoding {
    fn default() -> Self {
        encode(DEFAULT_ROOM_CELSIUS)
    }
}

/// Convert degrees Celsius to the controller's raw T15 value
///
/// Never fails: values outside the representable range are clamped, and
/// NaN or infinities fall back to [`DEFAULT_ROOM_CELSIUS`].
pub fn encode(celsius: f32) -> SensorEncoding {
    let celsius = if celsius.is_finite() {
        celsius
    } else {
        DEFAULT_ROOM_CELSIUS
    };

    let raw = (OFFSET_C - celsius) / SLOPE_C;
    if raw <= 0.0 {
        SensorEncoding(0)
    } else if raw >= u16::MAX as f32 {
        SensorEncoding(u16::MAX)
    } else {
        // Round half away from zero; raw is positive here
        SensorEncoding((raw + 0.5) as u16)
    }
}

/// Convert a raw T15 value back to degrees Celsius (diagnostics only)
pub fn decode(encoding: SensorEncoding) -> f32 {
    OFFSET_C - encoding.0 as f32 * SLOPE_C
}
