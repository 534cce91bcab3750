//! Battery polling for Razer wireless mice and keyboards
//!
//! Talks the vendor feature-report protocol over USB control transfers:
//! - Device catalogue (product id, transaction tag, class)
//! - Report framing and checksum
//! - Mouse/keyboard decode rules
//! - Cached, single-flight device enumeration
//! - Query orchestration with one bounded retry on stale devices
//!
//! Hosts use [`BatteryService`]; the `python` feature exposes it as a Python
//! extension module.

pub mod cache;
pub mod catalogue;
pub mod codec;
pub mod config;
pub mod crc;
pub mod hid;
pub mod logging;
pub mod query;

#[cfg(feature = "python")]
mod python;

pub use catalogue::{DeviceClass, DeviceDescriptor, IdentityPairs, RAZER_VENDOR_ID};
pub use codec::BatteryReading;
pub use config::{Config, ConfigError, Timing};
pub use hid::HidError;
pub use query::{BatteryService, DeviceSummary, Selector};
