//! nusb-backed transport for feature report communication

use crate::hid::{Backend, HidError, Result, Session, UsbEntry};
use nusb::transfer::{ControlIn, ControlOut, ControlType, Recipient};
use std::time::Duration;
use tracing::{debug, trace};

// HID class requests
const HID_GET_REPORT: u8 = 0x01;
const HID_SET_REPORT: u8 = 0x09;

// Report types (in high byte of wValue)
const HID_REPORT_TYPE_FEATURE: u16 = 0x03;

const REPORT_ID: u8 = 0x00;

/// Default timeout for USB transfers
pub const DEFAULT_TIMEOUT: Duration = Duration::from_millis(1000);

/// Live USB access through nusb.
#[derive(Clone, Debug)]
pub struct UsbBackend {
    transfer_timeout: Duration,
}

impl UsbBackend {
    pub fn new(transfer_timeout: Duration) -> Self {
        Self { transfer_timeout }
    }
}

impl Default for UsbBackend {
    fn default() -> Self {
        Self::new(DEFAULT_TIMEOUT)
    }
}

impl Backend for UsbBackend {
    type Handle = nusb::DeviceInfo;
    type Session = UsbSession;

    async fn scan(&self) -> Result<Vec<UsbEntry<nusb::DeviceInfo>>> {
        let entries = nusb::list_devices()
            .await?
            .map(|dev_info| UsbEntry {
                vendor_id: dev_info.vendor_id(),
                product_id: dev_info.product_id(),
                handle: dev_info,
            })
            .collect();
        Ok(entries)
    }

    async fn open(&self, handle: &nusb::DeviceInfo, interface: u8) -> Result<UsbSession> {
        let device = handle
            .open()
            .await
            .map_err(|e| HidError::Open(e.to_string()))?;

        // A re-enumerated device may come back with a different layout
        let has_interface = {
            let config = device
                .active_configuration()
                .map_err(|e| HidError::Open(e.to_string()))?;
            config
                .interfaces()
                .any(|iface| iface.interface_number() == interface)
        };
        if !has_interface {
            return Err(HidError::NotFound(interface));
        }

        // On Linux, detach kernel driver before claiming (e.g., hid-generic)
        #[cfg(target_os = "linux")]
        let claimed = device.detach_and_claim_interface(interface).await;
        #[cfg(not(target_os = "linux"))]
        let claimed = device.claim_interface(interface).await;
        let claimed = claimed.map_err(|e| HidError::Open(e.to_string()))?;

        debug!(
            product_id = format_args!("0x{:04x}", handle.product_id()),
            interface, "claimed interface"
        );

        Ok(UsbSession {
            interface: Some(claimed),
            _device: device,
            interface_number: interface,
            timeout: self.transfer_timeout,
        })
    }
}

/// A claimed HID interface. Dropping it releases the interface, then the
/// device handle.
pub struct UsbSession {
    // Field order matters: the interface must go before the device.
    interface: Option<nusb::Interface>,
    _device: nusb::Device,
    interface_number: u8,
    timeout: Duration,
}

impl UsbSession {
    fn interface(&self) -> Result<&nusb::Interface> {
        self.interface.as_ref().ok_or(HidError::NoDevice)
    }

    fn report_value() -> u16 {
        (HID_REPORT_TYPE_FEATURE << 8) | (REPORT_ID as u16)
    }
}

impl Session for UsbSession {
    async fn write_feature_report(&mut self, frame: &[u8]) -> Result<()> {
        let iface = self.interface()?;

        // SET_REPORT: bmRequestType=0x21, bRequest=0x09
        // wValue = (report_type << 8) | report_id
        // wIndex = interface number
        iface
            .control_out(
                ControlOut {
                    control_type: ControlType::Class,
                    recipient: Recipient::Interface,
                    request: HID_SET_REPORT,
                    value: Self::report_value(),
                    index: self.interface_number as u16,
                    data: frame,
                },
                self.timeout,
            )
            .await?;

        Ok(())
    }

    async fn read_feature_report(&mut self, length: usize) -> Result<Vec<u8>> {
        let iface = self.interface()?;

        // GET_REPORT: bmRequestType=0xA1, bRequest=0x01
        let data = iface
            .control_in(
                ControlIn {
                    control_type: ControlType::Class,
                    recipient: Recipient::Interface,
                    request: HID_GET_REPORT,
                    value: Self::report_value(),
                    index: self.interface_number as u16,
                    length: length as u16,
                },
                self.timeout,
            )
            .await?;

        Ok(data)
    }
}

impl Drop for UsbSession {
    fn drop(&mut self) {
        if self.interface.take().is_some() {
            trace!(interface = self.interface_number, "released interface");
        }
    }
}
