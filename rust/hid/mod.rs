//! USB HID transport via nusb
//!
//! Feature report framing, the transport traits the query engine is written
//! against, and the nusb implementation of them.

pub mod device;
pub mod error;
#[cfg(test)]
pub mod mock;
pub mod report;
pub mod transport;

pub use device::{UsbBackend, UsbSession};
pub use error::{HidError, Result};
pub use report::{encode_request, Command, Response, Status, REPORT_SIZE};
pub use transport::{Backend, Session, UsbEntry};
