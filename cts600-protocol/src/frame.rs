//! Frame encoding and decoding for the CTS600 panel link.
//!
//! Frame format (requests and responses):
//! - UNIT (1 byte): bus address of the controller, 3 on every unit seen so far
//! - FUNCTION (1 byte): modbus-style function code
//! - BODY (variable): function-specific, multi-byte fields big-endian
//! - CRC (2 bytes): CRC-16/MODBUS over UNIT..BODY, little-endian
//!
//! Besides a handful of standard modbus codes, the panel uses two custom
//! "write inputs, read outputs" codes. The panel writes an input register
//! (the key bitmask, the T15 reading) and the controller answers with
//! whatever output registers or bits changed since the last exchange.
//!
//! [`Request::encode`] and [`Response::parse`] are the panel side.
//! [`Request::parse`] and [`Response::encode`] are the controller side;
//! only simulated controllers and bus monitors need them.

use crc::{Crc, CRC_16_MODBUS};
use heapless::Vec;

use crate::keys::ButtonVector;
use crate::sensor::SensorEncoding;

/// Default bus address of the controller
pub const DEFAULT_UNIT: u8 = 3;

/// Input register holding the panel button bitmask
pub const KEY_REGISTER: u16 = 0x100;

/// Input register holding the T15 room sensor reading
pub const T15_REGISTER: u16 = 0x2a;

/// Holding register polled during the startup handshake
pub const PANEL_STATUS_REGISTER: u16 = 0x102;

/// Holding register announcing the panel firmware version
pub const PANEL_VERSION_REGISTER: u16 = 0x104;

/// Panel firmware version we announce (remote panel)
pub const REMOTE_PANEL_VERSION: u16 = 0x5c;

/// Maximum data bytes accepted in a response body
pub const MAX_DATA_SIZE: usize = 256;

/// Largest response header (UNIT + FUNCTION + address + count + size)
const MAX_HEADER_SIZE: usize = 8;

/// Maximum complete frame size
pub const MAX_FRAME_SIZE: usize = MAX_HEADER_SIZE + MAX_DATA_SIZE + 2;

/// Maximum encoded request size
pub const MAX_REQUEST_SIZE: usize = 12;

const CRC16: Crc<u16> = Crc::<u16>::new(&CRC_16_MODBUS);

/// Errors that can occur during frame parsing or encoding
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum FrameError {
    /// Frame is incomplete (need more bytes)
    Incomplete,
    /// CRC mismatch
    Checksum {
        /// CRC computed over the received bytes
        computed: u16,
        /// CRC carried by the frame
        received: u16,
    },
    /// Function code this codec does not know
    UnknownFunction(u8),
    /// Declared data size exceeds what we accept
    PayloadTooLarge,
    /// Buffer too small for encoding
    BufferTooSmall,
}

/// Function codes used on the panel link
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum FunctionCode {
    ReadDiscreteInputs,
    ReadHoldingRegisters,
    ReadInputRegisters,
    PresetSingleRegister,
    ReportSlaveId,
    /// Write inputs, read output bits
    WiRoBits,
    /// Write inputs, read output registers
    WiRoRegs,
}

impl FunctionCode {
    /// Parse a function code from its wire byte
    pub fn from_byte(byte: u8) -> Option<Self> {
        match byte {
            2 => Some(FunctionCode::ReadDiscreteInputs),
            3 => Some(FunctionCode::ReadHoldingRegisters),
            4 => Some(FunctionCode::ReadInputRegisters),
            6 => Some(FunctionCode::PresetSingleRegister),
            17 => Some(FunctionCode::ReportSlaveId),
            65 => Some(FunctionCode::WiRoBits),
            66 => Some(FunctionCode::WiRoRegs),
            _ => None,
        }
    }

    /// Convert to wire byte
    pub fn to_byte(self) -> u8 {
        match self {
            FunctionCode::ReadDiscreteInputs => 2,
            FunctionCode::ReadHoldingRegisters => 3,
            FunctionCode::ReadInputRegisters => 4,
            FunctionCode::PresetSingleRegister => 6,
            FunctionCode::ReportSlaveId => 17,
            FunctionCode::WiRoBits => 65,
            FunctionCode::WiRoRegs => 66,
        }
    }
}

/// CRC-16/MODBUS of `bytes`
pub fn checksum(bytes: &[u8]) -> u16 {
    CRC16.checksum(bytes)
}

/// Requests sent by the panel
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Request {
    /// Ask for device identification and display geometry
    ReportSlaveId,
    /// Read `count` holding registers starting at `address`
    ReadHoldingRegisters { address: u16, count: u16 },
    /// Read `count` input registers starting at `address`
    ///
    /// The panel never sends this during normal operation. It is kept so
    /// bus monitors and simulated controllers can decode every request a
    /// CTS600 accepts.
    ReadInputRegisters { address: u16, count: u16 },
    /// Write one holding register
    PresetSingleRegister { address: u16, value: u16 },
    /// Write one input register and collect changed outputs
    WriteInput { address: u16, value: u16 },
}

impl Request {
    /// Button state for this exchange
    pub fn keys(buttons: ButtonVector) -> Self {
        Request::WriteInput {
            address: KEY_REGISTER,
            value: buttons.bits() as u16,
        }
    }

    /// Simulated room temperature
    pub fn room_temperature(sensor: SensorEncoding) -> Self {
        Request::WriteInput {
            address: T15_REGISTER,
            value: sensor.raw(),
        }
    }

    /// Function code of this request
    pub fn function(&self) -> FunctionCode {
        match self {
            Request::ReportSlaveId => FunctionCode::ReportSlaveId,
            Request::ReadHoldingRegisters { .. } => FunctionCode::ReadHoldingRegisters,
            Request::ReadInputRegisters { .. } => FunctionCode::ReadInputRegisters,
            Request::PresetSingleRegister { .. } => FunctionCode::PresetSingleRegister,
            Request::WriteInput { .. } => FunctionCode::WiRoRegs,
        }
    }

    /// Encode this request for `unit` into a byte buffer
    ///
    /// Returns the number of bytes written
    pub fn encode(&self, unit: u8, buffer: &mut [u8]) -> Result<usize, FrameError> {
        let mut w = Writer::new(buffer);
        w.put(&[unit, self.function().to_byte()])?;
        match *self {
            Request::ReportSlaveId => {}
            Request::ReadHoldingRegisters { address, count }
            | Request::ReadInputRegisters { address, count } => {
                w.put16(address)?;
                w.put16(count)?;
            }
            Request::PresetSingleRegister { address, value } => {
                w.put16(address)?;
                w.put16(value)?;
            }
            Request::WriteInput { address, value } => {
                // address, register count, byte count, values
                w.put16(address)?;
                w.put16(1)?;
                w.put16(2)?;
                w.put16(value)?;
            }
        }
        w.seal()
    }

    /// Encode this request into a heapless Vec
    pub fn encode_to_vec(&self, unit: u8) -> Result<Vec<u8, MAX_REQUEST_SIZE>, FrameError> {
        let mut buffer = [0u8; MAX_REQUEST_SIZE];
        let len = self.encode(unit, &mut buffer)?;
        let mut vec = Vec::new();
        vec.extend_from_slice(&buffer[..len])
            .map_err(|_| FrameError::BufferTooSmall)?;
        Ok(vec)
    }

    /// Parse a request frame
    ///
    /// This is the controller side of the link. The emulator itself never
    /// calls it; simulated controllers and bus monitors do.
    ///
    /// Returns the request, the unit it was addressed to, and the number of
    /// bytes consumed.
    pub fn parse(bytes: &[u8]) -> Result<(Request, u8, usize), FrameError> {
        need(bytes, 2)?;
        let function =
            FunctionCode::from_byte(bytes[1]).ok_or(FrameError::UnknownFunction(bytes[1]))?;
        let total = match function {
            FunctionCode::ReportSlaveId => 4,
            FunctionCode::ReadHoldingRegisters
            | FunctionCode::ReadInputRegisters
            | FunctionCode::PresetSingleRegister => 8,
            FunctionCode::WiRoRegs => {
                need(bytes, 8)?;
                let size = be16(bytes, 6) as usize;
                if size != 2 {
                    return Err(FrameError::PayloadTooLarge);
                }
                8 + size + 2
            }
            other => return Err(FrameError::UnknownFunction(other.to_byte())),
        };
        need(bytes, total)?;
        verify(&bytes[..total])?;

        let request = match function {
            FunctionCode::ReportSlaveId => Request::ReportSlaveId,
            FunctionCode::ReadHoldingRegisters => Request::ReadHoldingRegisters {
                address: be16(bytes, 2),
                count: be16(bytes, 4),
            },
            FunctionCode::ReadInputRegisters => Request::ReadInputRegisters {
                address: be16(bytes, 2),
                count: be16(bytes, 4),
            },
            FunctionCode::PresetSingleRegister => Request::PresetSingleRegister {
                address: be16(bytes, 2),
                value: be16(bytes, 4),
            },
            _ => Request::WriteInput {
                address: be16(bytes, 2),
                value: be16(bytes, 8),
            },
        };
        Ok((request, bytes[0], total))
    }
}

/// Response data bytes
pub type Data = Vec<u8, MAX_DATA_SIZE>;

/// Responses sent by the controller
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Response {
    /// Raw slave ID record
    SlaveId(Data),
    /// Holding register contents, two bytes per register
    HoldingRegisters(Data),
    /// Input register contents, two bytes per register
    InputRegisters(Data),
    /// Packed discrete inputs
    DiscreteInputs(Data),
    /// Echo of a preset single register
    Preset { address: u16, value: u16 },
    /// Output registers starting at `address`, one byte each
    OutputRegisters { address: u16, count: u16, data: Data },
    /// Output bits starting at `address`, one byte each
    OutputBits { address: u16, count: u16, data: Data },
}

impl Response {
    /// Function code of this response
    pub fn function(&self) -> FunctionCode {
        match self {
            Response::SlaveId(_) => FunctionCode::ReportSlaveId,
            Response::HoldingRegisters(_) => FunctionCode::ReadHoldingRegisters,
            Response::InputRegisters(_) => FunctionCode::ReadInputRegisters,
            Response::DiscreteInputs(_) => FunctionCode::ReadDiscreteInputs,
            Response::Preset { .. } => FunctionCode::PresetSingleRegister,
            Response::OutputRegisters { .. } => FunctionCode::WiRoRegs,
            Response::OutputBits { .. } => FunctionCode::WiRoBits,
        }
    }

    /// Parse one response from the start of `bytes`
    ///
    /// Returns the response and the number of bytes consumed. On a stream
    /// transport, `Incomplete` means read more bytes and try again. The
    /// unit byte is not checked; only one controller sits on the bus.
    pub fn parse(bytes: &[u8]) -> Result<(Response, usize), FrameError> {
        need(bytes, 2)?;
        let function =
            FunctionCode::from_byte(bytes[1]).ok_or(FrameError::UnknownFunction(bytes[1]))?;

        let (header, size) = match function {
            FunctionCode::ReportSlaveId
            | FunctionCode::ReadHoldingRegisters
            | FunctionCode::ReadInputRegisters
            | FunctionCode::ReadDiscreteInputs => {
                need(bytes, 3)?;
                (3, bytes[2] as usize)
            }
            FunctionCode::WiRoRegs | FunctionCode::WiRoBits => {
                need(bytes, 8)?;
                (8, be16(bytes, 6) as usize)
            }
            FunctionCode::PresetSingleRegister => (6, 0),
        };
        if size > MAX_DATA_SIZE {
            return Err(FrameError::PayloadTooLarge);
        }

        let total = header + size + 2;
        need(bytes, total)?;
        verify(&bytes[..total])?;

        let mut data = Data::new();
        data.extend_from_slice(&bytes[header..header + size])
            .map_err(|_| FrameError::PayloadTooLarge)?;

        let response = match function {
            FunctionCode::ReportSlaveId => Response::SlaveId(data),
            FunctionCode::ReadHoldingRegisters => Response::HoldingRegisters(data),
            FunctionCode::ReadInputRegisters => Response::InputRegisters(data),
            FunctionCode::ReadDiscreteInputs => Response::DiscreteInputs(data),
            FunctionCode::PresetSingleRegister => Response::Preset {
                address: be16(bytes, 2),
                value: be16(bytes, 4),
            },
            FunctionCode::WiRoRegs => Response::OutputRegisters {
                address: be16(bytes, 2),
                count: be16(bytes, 4),
                data,
            },
            FunctionCode::WiRoBits => Response::OutputBits {
                address: be16(bytes, 2),
                count: be16(bytes, 4),
                data,
            },
        };
        Ok((response, total))
    }

    /// Encode this response for `unit`
    ///
    /// Controller side of the link, like [`Request::parse`]. Simulated
    /// controllers answer the emulator with it.
    ///
    /// Returns the number of bytes written
    pub fn encode(&self, unit: u8, buffer: &mut [u8]) -> Result<usize, FrameError> {
        let mut w = Writer::new(buffer);
        w.put(&[unit, self.function().to_byte()])?;
        match self {
            Response::SlaveId(data)
            | Response::HoldingRegisters(data)
            | Response::InputRegisters(data)
            | Response::DiscreteInputs(data) => {
                let size = u8::try_from(data.len()).map_err(|_| FrameError::PayloadTooLarge)?;
                w.put(&[size])?;
                w.put(data)?;
            }
            Response::Preset { address, value } => {
                w.put16(*address)?;
                w.put16(*value)?;
            }
            Response::OutputRegisters {
                address,
                count,
                data,
            }
            | Response::OutputBits {
                address,
                count,
                data,
            } => {
                w.put16(*address)?;
                w.put16(*count)?;
                w.put16(data.len() as u16)?;
                w.put(data)?;
            }
        }
        w.seal()
    }

    /// Encode this response into a heapless Vec
    pub fn encode_to_vec(&self, unit: u8) -> Result<Vec<u8, MAX_FRAME_SIZE>, FrameError> {
        let mut buffer = [0u8; MAX_FRAME_SIZE];
        let len = self.encode(unit, &mut buffer)?;
        let mut vec = Vec::new();
        vec.extend_from_slice(&buffer[..len])
            .map_err(|_| FrameError::BufferTooSmall)?;
        Ok(vec)
    }
}

/// Sequential frame writer over a caller buffer
struct Writer<'a> {
    buffer: &'a mut [u8],
    len: usize,
}

impl<'a> Writer<'a> {
    fn new(buffer: &'a mut [u8]) -> Self {
        Self { buffer, len: 0 }
    }

    fn put(&mut self, bytes: &[u8]) -> Result<(), FrameError> {
        let end = self.len + bytes.len();
        if end > self.buffer.len() {
            return Err(FrameError::BufferTooSmall);
        }
        self.buffer[self.len..end].copy_from_slice(bytes);
        self.len = end;
        Ok(())
    }

    fn put16(&mut self, value: u16) -> Result<(), FrameError> {
        self.put(&value.to_be_bytes())
    }

    /// Append the CRC and return the frame length
    fn seal(mut self) -> Result<usize, FrameError> {
        let crc = checksum(&self.buffer[..self.len]);
        self.put(&crc.to_le_bytes())?;
        Ok(self.len)
    }
}

fn need(bytes: &[u8], len: usize) -> Result<(), FrameError> {
    if bytes.len() < len {
        Err(FrameError::Incomplete)
    } else {
        Ok(())
    }
}

fn be16(bytes: &[u8], at: usize) -> u16 {
    u16::from_be_bytes([bytes[at], bytes[at + 1]])
}

/// Check the trailing CRC of a complete frame
fn verify(frame: &[u8]) -> Result<(), FrameError> {
    let body = frame.len() - 2;
    let computed = checksum(&frame[..body]);
    let received = u16::from_le_bytes([frame[body], frame[body + 1]]);
    if computed != received {
        return Err(FrameError::Checksum { computed, received });
    }
    Ok(())
}
