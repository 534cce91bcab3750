//! Battery query orchestration
//!
//! [`BatteryService`] is the only type a host needs. It picks a device,
//! runs one exchange, and on failures that smell like a stale device list
//! rescans and tries exactly once more. Every failure ends as `None`.

use crate::cache::{DeviceCache, DiscoveredDevice, Snapshot};
use crate::catalogue::{DeviceClass, IdentityPairs};
use crate::codec::{self, BatteryReading};
use crate::config::{Config, Timing};
use crate::hid::{Backend, HidError, Result, Session, UsbBackend};
use serde::Serialize;
use std::sync::Arc;
use tokio::sync::Mutex;
use tokio::time::timeout;
use tracing::{debug, info, warn};

/// Which device a query targets.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Selector {
    /// Exactly this product id (or its paired identity after a mode switch).
    Product(u16),
    /// The first responsive wireless device of this class.
    Class(DeviceClass),
}

/// Device list entry for hosts.
#[cfg_attr(feature = "python", pyo3::pyclass(get_all, frozen))]
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct DeviceSummary {
    pub product_id: u16,
    pub display_name: String,
    pub has_wireless: bool,
    pub is_keyboard: bool,
}

impl<H> From<&DiscoveredDevice<H>> for DeviceSummary {
    fn from(device: &DiscoveredDevice<H>) -> Self {
        let desc = device.descriptor;
        Self {
            product_id: desc.product_id,
            display_name: desc.display_name.to_string(),
            has_wireless: desc.has_wireless,
            is_keyboard: desc.is_keyboard(),
        }
    }
}

pub struct BatteryService<B: Backend> {
    backend: Arc<B>,
    cache: DeviceCache<B>,
    pairs: IdentityPairs,
    timing: Timing,
    // One exchange on the bus at a time
    exchange: Mutex<()>,
}

impl BatteryService<UsbBackend> {
    /// Service over the real USB bus.
    pub fn usb(config: &Config) -> Self {
        Self::new(UsbBackend::new(config.timing.transfer_timeout()), config)
    }
}

impl<B: Backend> BatteryService<B> {
    pub fn new(backend: B, config: &Config) -> Self {
        let backend = Arc::new(backend);
        Self {
            cache: DeviceCache::new(Arc::clone(&backend), config.vendor_id),
            backend,
            pairs: IdentityPairs::with_extra(&config.identity_pairs),
            timing: config.timing,
            exchange: Mutex::new(()),
        }
    }

    pub fn cache(&self) -> &DeviceCache<B> {
        &self.cache
    }

    /// Every catalogued device currently attached.
    pub async fn list_devices(&self) -> Vec<DeviceSummary> {
        match self.cache.get_devices().await {
            Ok(snapshot) => snapshot.devices.iter().map(DeviceSummary::from).collect(),
            Err(e) => {
                warn!("device scan failed: {}", e);
                Vec::new()
            }
        }
    }

    /// Battery state of the selected device, or `None` when nothing answered.
    pub async fn query_battery(
        &self,
        selector: Selector,
        force_refresh: bool,
    ) -> Option<BatteryReading> {
        if force_refresh {
            self.cache.invalidate();
        }

        let reading = match selector {
            Selector::Product(product_id) => self.query_product(product_id).await,
            Selector::Class(class) => self.query_class(class).await,
        };

        if reading.is_none() {
            debug!(?selector, "no battery data");
        }
        reading
    }

    pub fn invalidate_cache(&self) {
        self.cache.invalidate();
    }

    /// Drop cached state. Sessions never outlive a query, so there is
    /// nothing else to release.
    pub fn shutdown(&self) {
        self.cache.invalidate();
        info!("battery service shut down");
    }

    async fn query_product(&self, product_id: u16) -> Option<BatteryReading> {
        let baseline = self.cache.scans_started();
        let mut seen: Option<Arc<Snapshot<B::Handle>>> = None;

        for attempt in 0..2 {
            if let Some(stale) = &seen {
                self.cache.retire(stale);
            }

            let snapshot = match self.cache.get_devices().await {
                Ok(snapshot) => snapshot,
                Err(e) => {
                    warn!("device scan failed: {}", e);
                    continue;
                }
            };
            seen = Some(Arc::clone(&snapshot));
            let fresh = snapshot.scan_id > baseline;

            let Some(device) = self.resolve(&snapshot, product_id, fresh) else {
                if fresh {
                    // Nothing to find on a bus we just scanned
                    break;
                }
                debug!(
                    product_id = format_args!("0x{:04x}", product_id),
                    "not in cached device list, rescanning"
                );
                continue;
            };

            match self.query_device(device).await {
                Ok(reading) => return Some(reading),
                Err(e) if e.is_retryable() => {
                    info!(
                        product_id = format_args!("0x{:04x}", device.product_id()),
                        attempt, "query failed, device list may be stale: {}", e
                    );
                }
                Err(e) => {
                    warn!(
                        product_id = format_args!("0x{:04x}", device.product_id()),
                        "query failed: {}", e
                    );
                    return None;
                }
            }
        }

        if let Some(stale) = &seen {
            self.cache.retire(stale);
        }
        None
    }

    /// Look up `product_id`, or on a fresh scan its paired identity.
    fn resolve<'a>(
        &self,
        snapshot: &'a Snapshot<B::Handle>,
        product_id: u16,
        fresh: bool,
    ) -> Option<&'a DiscoveredDevice<B::Handle>> {
        if let Some(device) = snapshot.find(product_id) {
            return Some(device);
        }
        if !fresh {
            return None;
        }

        let partner = self.pairs.partner(product_id)?;
        let device = snapshot.find(partner)?;
        info!(
            product_id = format_args!("0x{:04x}", product_id),
            partner = format_args!("0x{:04x}", partner),
            "device switched mode, using paired identity"
        );
        Some(device)
    }

    async fn query_class(&self, class: DeviceClass) -> Option<BatteryReading> {
        let baseline = self.cache.scans_started();
        let mut seen: Option<Arc<Snapshot<B::Handle>>> = None;
        let mut stale = false;

        for attempt in 0..2 {
            if let Some(previous) = &seen {
                self.cache.retire(previous);
            }

            let snapshot = match self.cache.get_devices().await {
                Ok(snapshot) => snapshot,
                Err(e) => {
                    warn!("device scan failed: {}", e);
                    stale = true;
                    continue;
                }
            };
            seen = Some(Arc::clone(&snapshot));
            let fresh = snapshot.scan_id > baseline;

            let mut candidates = snapshot.battery_candidates(class).peekable();
            if candidates.peek().is_none() {
                stale = true;
                if fresh {
                    break;
                }
                continue;
            }

            stale = false;
            let mut restart = false;
            for device in candidates {
                match self.query_device(device).await {
                    Ok(reading) => return Some(reading),
                    Err(e) if e.is_retryable() => {
                        info!(
                            product_id = format_args!("0x{:04x}", device.product_id()),
                            attempt, "query failed, device list may be stale: {}", e
                        );
                        stale = true;
                        if attempt == 0 {
                            restart = true;
                            break;
                        }
                    }
                    Err(e) => {
                        debug!(
                            product_id = format_args!("0x{:04x}", device.product_id()),
                            "query failed, trying next device: {}", e
                        );
                    }
                }
            }

            if !restart {
                break;
            }
        }

        if let Some(last) = seen.as_ref().filter(|_| stale) {
            self.cache.retire(last);
        }
        None
    }

    /// Open, exchange, close, all under the query timeout.
    async fn query_device(&self, device: &DiscoveredDevice<B::Handle>) -> Result<BatteryReading> {
        let _exclusive = self.exchange.lock().await;
        let descriptor = device.descriptor;

        let exchange = async {
            let mut session = self
                .backend
                .open(&device.handle, descriptor.class.control_interface())
                .await?;
            let result = codec::read_battery(&mut session, descriptor, &self.timing).await;
            session.close();
            result
        };

        timeout(self.timing.query_timeout(), exchange)
            .await
            .map_err(HidError::from)?
    }
}
