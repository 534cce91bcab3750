//! Error types for HID operations

use crate::hid::Status;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum HidError {
    /// The handle no longer refers to an attached device.
    #[error("Device disconnected")]
    NoDevice,

    #[error("Interface {0} not found")]
    NotFound(u8),

    #[error("Failed to open device: {0}")]
    Open(String),

    #[error("Transfer timed out")]
    Timeout,

    #[error("Malformed response: expected at least {expected} bytes, got {actual}")]
    Malformed { expected: usize, actual: usize },

    #[error("Transfer error: {0}")]
    Transfer(String),

    #[error("Device returned status {0:?}")]
    Status(Status),

    #[error("USB error: {0}")]
    Usb(#[from] nusb::Error),
}

impl HidError {
    /// Whether the failure suggests a stale device list, so the query is
    /// worth repeating against a fresh enumeration.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            HidError::NoDevice | HidError::NotFound(_) | HidError::Open(_) | HidError::Timeout
        )
    }
}

impl From<nusb::transfer::TransferError> for HidError {
    fn from(err: nusb::transfer::TransferError) -> Self {
        use nusb::transfer::TransferError;

        match err {
            TransferError::Disconnected => HidError::NoDevice,
            // nusb reports an expired control timeout as a cancellation
            TransferError::Cancelled => HidError::Timeout,
            other => HidError::Transfer(other.to_string()),
        }
    }
}

impl From<tokio::time::error::Elapsed> for HidError {
    fn from(_: tokio::time::error::Elapsed) -> Self {
        HidError::Timeout
    }
}

pub type Result<T> = std::result::Result<T, HidError>;
