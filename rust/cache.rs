//! Device enumeration and caching
//!
//! The cache holds one generation at a time: an empty `OnceCell` that the
//! first caller fills by scanning the bus. Every caller that arrives while
//! the scan runs waits on the same cell, so a burst of requests costs one
//! scan. A failed scan is shared the same way, then the generation is
//! retired so the next caller rescans. Invalidation swaps in a fresh cell;
//! a scan still running against the old cell completes into a generation
//! nobody looks at.

use crate::catalogue::{self, DeviceClass, DeviceDescriptor};
use crate::hid::{Backend, HidError};
use std::collections::HashSet;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Instant;
use tokio::sync::OnceCell;
use tracing::{debug, info, warn};

/// A catalogued device found on the bus.
#[derive(Clone, Debug)]
pub struct DiscoveredDevice<H> {
    pub descriptor: &'static DeviceDescriptor,
    pub handle: H,
}

impl<H> DiscoveredDevice<H> {
    pub fn product_id(&self) -> u16 {
        self.descriptor.product_id
    }
}

/// Result of one complete scan.
#[derive(Debug)]
pub struct Snapshot<H> {
    pub devices: Vec<DiscoveredDevice<H>>,
    /// Sequence number of the scan, counted from 1.
    pub scan_id: u64,
    pub populated_at: Instant,
}

impl<H> Snapshot<H> {
    pub fn find(&self, product_id: u16) -> Option<&DiscoveredDevice<H>> {
        self.devices.iter().find(|d| d.product_id() == product_id)
    }

    /// Wireless-capable devices of `class`, in enumeration order.
    pub fn battery_candidates(
        &self,
        class: DeviceClass,
    ) -> impl Iterator<Item = &DiscoveredDevice<H>> {
        self.devices
            .iter()
            .filter(move |d| d.descriptor.class == class && d.descriptor.has_wireless)
    }
}

/// What every caller of one generation receives.
pub type ScanOutcome<H> = std::result::Result<Arc<Snapshot<H>>, Arc<HidError>>;

type Generation<H> = Arc<OnceCell<ScanOutcome<H>>>;

pub struct DeviceCache<B: Backend> {
    backend: Arc<B>,
    vendor_id: u16,
    current: Mutex<Generation<B::Handle>>,
    scans_started: AtomicU64,
    reported_unknown: Mutex<HashSet<u16>>,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

impl<B: Backend> DeviceCache<B> {
    pub fn new(backend: Arc<B>, vendor_id: u16) -> Self {
        Self {
            backend,
            vendor_id,
            current: Mutex::new(Arc::new(OnceCell::new())),
            scans_started: AtomicU64::new(0),
            reported_unknown: Mutex::new(HashSet::new()),
        }
    }

    /// The cached device list, scanning first if the cache is empty.
    pub async fn get_devices(&self) -> ScanOutcome<B::Handle> {
        let generation = Arc::clone(&lock(&self.current));
        let outcome = generation
            .get_or_init(|| async { self.scan().await.map_err(Arc::new) })
            .await
            .clone();

        if outcome.is_err() {
            let mut current = lock(&self.current);
            if Arc::ptr_eq(&*current, &generation) {
                *current = Arc::new(OnceCell::new());
            }
        }
        outcome
    }

    /// Forget the cached list. Safe to call at any time, any number of times.
    pub fn invalidate(&self) {
        let mut current = lock(&self.current);
        if current.initialized() {
            debug!("device cache invalidated");
        }
        *current = Arc::new(OnceCell::new());
    }

    /// Forget `snapshot` if it is still the cached list. Callers that saw
    /// the same stale list share one rescan instead of each forcing their own.
    pub fn retire(&self, snapshot: &Arc<Snapshot<B::Handle>>) {
        let mut current = lock(&self.current);
        let cached = matches!(current.get(), Some(Ok(s)) if Arc::ptr_eq(s, snapshot));
        if cached {
            debug!(scan_id = snapshot.scan_id, "device list retired");
            *current = Arc::new(OnceCell::new());
        }
    }

    pub fn is_populated(&self) -> bool {
        lock(&self.current).get().is_some_and(Result::is_ok)
    }

    /// When the current list was scanned, if there is one.
    pub fn populated_at(&self) -> Option<Instant> {
        lock(&self.current)
            .get()
            .and_then(|outcome| outcome.as_ref().ok())
            .map(|s| s.populated_at)
    }

    /// Number of scans started so far. A snapshot whose `scan_id` is above
    /// a value read earlier was scanned after that read.
    pub fn scans_started(&self) -> u64 {
        self.scans_started.load(Ordering::Relaxed)
    }

    async fn scan(&self) -> crate::hid::Result<Arc<Snapshot<B::Handle>>> {
        let scan_id = self.scans_started.fetch_add(1, Ordering::Relaxed) + 1;
        debug!(
            vendor_id = format_args!("0x{:04x}", self.vendor_id),
            "scanning USB bus"
        );
        let entries = self.backend.scan().await?;

        let mut devices = Vec::new();
        for entry in entries {
            if entry.vendor_id != self.vendor_id {
                continue;
            }
            match catalogue::lookup(entry.product_id) {
                Some(descriptor) => devices.push(DiscoveredDevice {
                    descriptor,
                    handle: entry.handle,
                }),
                None => self.report_unknown(entry.product_id),
            }
        }

        info!(count = devices.len(), "device scan complete");
        Ok(Arc::new(Snapshot {
            devices,
            scan_id,
            populated_at: Instant::now(),
        }))
    }

    fn report_unknown(&self, product_id: u16) {
        if lock(&self.reported_unknown).insert(product_id) {
            warn!(
                product_id = format_args!("0x{:04x}", product_id),
                "unknown device, not in catalogue"
            );
        }
    }
}
