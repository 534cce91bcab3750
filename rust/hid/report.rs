//! Razer battery report framing
//!
//! Requests are 90-byte feature reports:
//!   0      - Status (0x00 for requests)
//!   1      - Transaction tag (per device model)
//!   2-4    - Reserved (0x00)
//!   5      - Data size (0x02)
//!   6      - Command class (0x07, power)
//!   7      - Command ID
//!   8-87   - Argument data (zero for battery queries)
//!   88     - CRC (XOR of bytes 2-87)
//!   89     - Reserved (0x00)
//!
//! Responses echo the layout with the status in byte 0 and the value of
//! interest in byte 9.

use crate::crc::report_crc;
use crate::hid::{HidError, Result};

pub const REPORT_SIZE: usize = 90;

/// Shortest response that still carries a value byte.
pub const MIN_RESPONSE_SIZE: usize = 10;

const DATA_SIZE_BYTE: u8 = 0x02;
const COMMAND_CLASS_POWER: u8 = 0x07;
const REPORT_CRC_OFFSET: usize = 88;
const VALUE_OFFSET: usize = 9;

/// Status codes returned by Razer devices.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Status {
    Unknown = 0x00,
    Busy = 0x01,
    Ok = 0x02,
    Fail = 0x03,
    Timeout = 0x04,
    Unsupported = 0x05,
}

impl From<u8> for Status {
    fn from(v: u8) -> Self {
        match v {
            0x01 => Status::Busy,
            0x02 => Status::Ok,
            0x03 => Status::Fail,
            0x04 => Status::Timeout,
            0x05 => Status::Unsupported,
            _ => Status::Unknown,
        }
    }
}

/// Power-class commands understood by the battery firmware.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Command {
    BatteryLevel = 0x80,
    /// Mice only.
    ChargingStatus = 0x84,
}

/// Build a request frame.
///
/// The output depends only on `(transaction_tag, command)`.
pub fn encode_request(transaction_tag: u8, command: Command) -> [u8; REPORT_SIZE] {
    let mut buf = [0u8; REPORT_SIZE];
    buf[1] = transaction_tag;
    buf[5] = DATA_SIZE_BYTE;
    buf[6] = COMMAND_CLASS_POWER;
    buf[7] = command as u8;
    buf[REPORT_CRC_OFFSET] = report_crc(&buf);
    buf
}

/// A response frame read back from the device.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Response {
    raw: Vec<u8>,
}

impl Response {
    /// Wrap a raw read, rejecting anything too short to hold a value.
    pub fn parse(raw: Vec<u8>) -> Result<Self> {
        if raw.len() < MIN_RESPONSE_SIZE {
            return Err(HidError::Malformed {
                expected: MIN_RESPONSE_SIZE,
                actual: raw.len(),
            });
        }
        Ok(Self { raw })
    }

    /// Byte 0 as received.
    pub fn status_byte(&self) -> u8 {
        self.raw[0]
    }

    pub fn status(&self) -> Status {
        Status::from(self.status_byte())
    }

    /// Byte 9, where battery level and charging flag live.
    pub fn value(&self) -> u8 {
        self.raw[VALUE_OFFSET]
    }

    /// Bytes 8..=15, or as many of them as the response holds.
    pub fn argument_window(&self) -> &[u8] {
        let end = self.raw.len().min(16);
        &self.raw[8..end]
    }
}
