//! Scripted in-memory transport for tests.

use crate::catalogue::RAZER_VENDOR_ID;
use crate::hid::{Backend, HidError, Result, Session, UsbEntry, REPORT_SIZE};
use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MockHandle {
    pub product_id: u16,
}

/// Failure to inject on scan, open or read.
#[derive(Clone, Copy, Debug)]
pub enum Failure {
    NoDevice,
    NotFound,
    Open,
    Stall,
}

impl Failure {
    fn into_error(self, interface: u8) -> HidError {
        match self {
            Failure::NoDevice => HidError::NoDevice,
            Failure::NotFound => HidError::NotFound(interface),
            Failure::Open => HidError::Open("claim failed".into()),
            Failure::Stall => HidError::Transfer("endpoint stalled".into()),
        }
    }
}

#[derive(Default)]
struct State {
    attached: Vec<(u16, u16)>,
    scans: usize,
    opens: Vec<(u16, u8)>,
    closes: usize,
    written: Vec<(u16, Vec<u8>)>,
    open_failures: HashMap<u16, VecDeque<Failure>>,
    responses: HashMap<u16, VecDeque<std::result::Result<Vec<u8>, Failure>>>,
    scan_failure: Option<Failure>,
    scan_delay: Duration,
    open_delay: Duration,
}

#[derive(Clone, Default)]
pub struct MockBackend {
    state: Arc<Mutex<State>>,
}

impl MockBackend {
    pub fn new() -> Self {
        Self::default()
    }

    fn state(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap()
    }

    /// Plug in a Razer device.
    pub fn attach(&self, product_id: u16) {
        self.attach_vendor(RAZER_VENDOR_ID, product_id);
    }

    pub fn attach_vendor(&self, vendor_id: u16, product_id: u16) {
        self.state().attached.push((vendor_id, product_id));
    }

    pub fn detach(&self, product_id: u16) {
        self.state().attached.retain(|&(_, pid)| pid != product_id);
    }

    /// Queue a failure for the next open of `product_id`.
    pub fn fail_open(&self, product_id: u16, failure: Failure) {
        self.state()
            .open_failures
            .entry(product_id)
            .or_default()
            .push_back(failure);
    }

    /// Queue a raw response for the next read from `product_id`.
    pub fn respond(&self, product_id: u16, raw: Vec<u8>) {
        self.state()
            .responses
            .entry(product_id)
            .or_default()
            .push_back(Ok(raw));
    }

    /// Queue a failure for the next read from `product_id`.
    pub fn fail_read(&self, product_id: u16, failure: Failure) {
        self.state()
            .responses
            .entry(product_id)
            .or_default()
            .push_back(Err(failure));
    }

    /// Fail every scan with `failure` until cleared with `None`.
    pub fn set_scan_failure(&self, failure: Option<Failure>) {
        self.state().scan_failure = failure;
    }

    pub fn set_scan_delay(&self, delay: Duration) {
        self.state().scan_delay = delay;
    }

    pub fn set_open_delay(&self, delay: Duration) {
        self.state().open_delay = delay;
    }

    pub fn scans(&self) -> usize {
        self.state().scans
    }

    /// `(product_id, interface)` for every open attempt.
    pub fn opens(&self) -> Vec<(u16, u8)> {
        self.state().opens.clone()
    }

    pub fn closes(&self) -> usize {
        self.state().closes
    }

    /// Frames written to `product_id`, in order.
    pub fn written(&self, product_id: u16) -> Vec<Vec<u8>> {
        self.state()
            .written
            .iter()
            .filter(|(pid, _)| *pid == product_id)
            .map(|(_, frame)| frame.clone())
            .collect()
    }
}

impl Backend for MockBackend {
    type Handle = MockHandle;
    type Session = MockSession;

    async fn scan(&self) -> Result<Vec<UsbEntry<MockHandle>>> {
        let delay = {
            let mut state = self.state();
            state.scans += 1;
            state.scan_delay
        };
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }

        let state = self.state();
        if let Some(failure) = state.scan_failure {
            return Err(failure.into_error(0));
        }
        Ok(state
            .attached
            .iter()
            .map(|&(vendor_id, product_id)| UsbEntry {
                vendor_id,
                product_id,
                handle: MockHandle { product_id },
            })
            .collect())
    }

    async fn open(&self, handle: &MockHandle, interface: u8) -> Result<MockSession> {
        let (delay, failure, present) = {
            let mut state = self.state();
            state.opens.push((handle.product_id, interface));
            let failure = state
                .open_failures
                .get_mut(&handle.product_id)
                .and_then(VecDeque::pop_front);
            let present = state
                .attached
                .iter()
                .any(|&(_, pid)| pid == handle.product_id);
            (state.open_delay, failure, present)
        };
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }

        if let Some(failure) = failure {
            return Err(failure.into_error(interface));
        }
        if !present {
            return Err(HidError::NoDevice);
        }
        Ok(MockSession {
            state: Arc::clone(&self.state),
            product_id: handle.product_id,
            interface,
        })
    }
}

pub struct MockSession {
    state: Arc<Mutex<State>>,
    product_id: u16,
    interface: u8,
}

impl Session for MockSession {
    async fn write_feature_report(&mut self, frame: &[u8]) -> Result<()> {
        let mut state = self.state.lock().unwrap();
        state.written.push((self.product_id, frame.to_vec()));
        Ok(())
    }

    async fn read_feature_report(&mut self, length: usize) -> Result<Vec<u8>> {
        let next = self
            .state
            .lock()
            .unwrap()
            .responses
            .get_mut(&self.product_id)
            .and_then(VecDeque::pop_front);
        match next {
            Some(Ok(mut raw)) => {
                raw.truncate(length);
                Ok(raw)
            }
            Some(Err(failure)) => Err(failure.into_error(self.interface)),
            None => Ok(Vec::new()),
        }
    }
}

impl Drop for MockSession {
    fn drop(&mut self) {
        if let Ok(mut state) = self.state.lock() {
            state.closes += 1;
        }
    }
}

/// A full-size response with `status` in byte 0 and `value` in byte 9.
pub fn response(status: u8, value: u8) -> Vec<u8> {
    let mut raw = vec![0u8; REPORT_SIZE];
    raw[0] = status;
    raw[9] = value;
    raw
}
