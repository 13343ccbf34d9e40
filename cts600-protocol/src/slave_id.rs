//! Slave ID record
//!
//! Answer to `REPORT_SLAVE_ID`. A big-endian packed record; older firmware
//! sends a shorter one, so every field past the first is optional and
//! decoding stops at the first field that does not fit.

use heapless::String;

use crate::display::DisplayGeometry;

/// Length of the product code field
pub const PRODUCT_LEN: usize = 10;

/// Decoded device identification
#[derive(Debug, Clone, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct SlaveId {
    pub slave_id: u8,
    pub run_status: Option<u8>,
    pub error_status: Option<u8>,
    pub reset_status: Option<u8>,
    pub protocol_version: Option<u8>,
    pub software_version: Option<u16>,
    pub software_date: Option<u16>,
    pub software_time: Option<u16>,
    /// Product code, e.g. `6551720001`
    pub product: Option<String<PRODUCT_LEN>>,
    pub output_bits: Option<u16>,
    pub leds: Option<u16>,
    pub input_bits: Option<u16>,
    pub keys: Option<u16>,
    pub output_registers: Option<u16>,
    pub input_registers: Option<u16>,
    pub actions: Option<u16>,
    pub display_rows: Option<u16>,
    pub display_columns: Option<u16>,
    pub display_type: Option<u8>,
    pub display_data_type: Option<u8>,
}

struct Reader<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> Reader<'a> {
    fn take(&mut self, len: usize) -> Option<&'a [u8]> {
        let bytes = self.data.get(self.pos..self.pos + len)?;
        self.pos += len;
        Some(bytes)
    }

    fn u8(&mut self) -> Option<u8> {
        self.take(1).map(|b| b[0])
    }

    fn u16(&mut self) -> Option<u16> {
        self.take(2).map(|b| u16::from_be_bytes([b[0], b[1]]))
    }
}

impl SlaveId {
    /// Decode as much of the record as `data` holds
    ///
    /// Returns `None` only for an empty record.
    pub fn decode(data: &[u8]) -> Option<Self> {
        let mut r = Reader { data, pos: 0 };
        let mut id = SlaveId {
            slave_id: r.u8()?,
            ..Default::default()
        };

        // Each step stops decoding once the record runs out
        let _ = (|| -> Option<()> {
            id.run_status = Some(r.u8()?);
            id.error_status = Some(r.u8()?);
            id.reset_status = Some(r.u8()?);
            id.protocol_version = Some(r.u8()?);
            id.software_version = Some(r.u16()?);
            id.software_date = Some(r.u16()?);
            id.software_time = Some(r.u16()?);
            id.product = Some(product(r.take(PRODUCT_LEN)?));
            id.output_bits = Some(r.u16()?);
            id.leds = Some(r.u16()?);
            id.input_bits = Some(r.u16()?);
            id.keys = Some(r.u16()?);
            id.output_registers = Some(r.u16()?);
            id.input_registers = Some(r.u16()?);
            r.take(2)?; // reserved
            id.actions = Some(r.u16()?);
            id.display_rows = Some(r.u16()?);
            id.display_columns = Some(r.u16()?);
            id.display_type = Some(r.u8()?);
            id.display_data_type = Some(r.u8()?);
            Some(())
        })();

        Some(id)
    }

    /// Display size reported by the controller
    pub fn display_geometry(&self) -> Option<DisplayGeometry> {
        DisplayGeometry::new(self.display_rows?, self.display_columns?)
    }
}

fn product(bytes: &[u8]) -> String<PRODUCT_LEN> {
    let mut out = String::new();
    for &b in bytes.iter().filter(|b| b.is_ascii_graphic()) {
        let _ = out.push(char::from(b));
    }
    out
}
