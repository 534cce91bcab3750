//! Transport seam between the query engine and the USB stack.
//!
//! [`Backend`] enumerates and opens devices; [`Session`] carries one claimed
//! interface for the duration of a single query. Releasing happens on drop,
//! so a session abandoned by a timeout or an early `?` still gives the
//! interface back.

use crate::hid::Result;
use std::fmt::Debug;
use std::future::Future;

/// A USB device as seen during enumeration, before catalogue lookup.
#[derive(Clone, Debug)]
pub struct UsbEntry<H> {
    pub vendor_id: u16,
    pub product_id: u16,
    pub handle: H,
}

/// Source of devices and sessions.
pub trait Backend: Send + Sync + 'static {
    /// Opaque reference to an enumerated device.
    type Handle: Clone + Debug + Send + Sync + 'static;
    type Session: Session;

    /// List every attached USB device.
    fn scan(&self) -> impl Future<Output = Result<Vec<UsbEntry<Self::Handle>>>> + Send;

    /// Open the device and claim `interface`.
    fn open(
        &self,
        handle: &Self::Handle,
        interface: u8,
    ) -> impl Future<Output = Result<Self::Session>> + Send;
}

/// An exclusively claimed interface.
pub trait Session: Send {
    /// HID SET_REPORT, feature report 0.
    fn write_feature_report(&mut self, frame: &[u8]) -> impl Future<Output = Result<()>> + Send;

    /// HID GET_REPORT, feature report 0.
    fn read_feature_report(&mut self, length: usize) -> impl Future<Output = Result<Vec<u8>>> + Send;

    /// Release the interface and close the device.
    fn close(self)
    where
        Self: Sized,
    {
        drop(self);
    }
}
