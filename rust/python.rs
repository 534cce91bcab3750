//! Python bindings
//!
//! Async methods return awaitables driven by the pyo3-async-runtimes tokio
//! runtime.

use crate::catalogue::{DeviceClass, RAZER_VENDOR_ID};
use crate::codec::BatteryReading;
use crate::config::{Config, ConfigError};
use crate::hid::UsbBackend;
use crate::query::{BatteryService, DeviceSummary, Selector};
use pyo3::exceptions::{PyOSError, PyValueError};
use pyo3::prelude::*;
use pyo3_async_runtimes::tokio::future_into_py;
use std::path::PathBuf;
use std::sync::Arc;

impl From<ConfigError> for PyErr {
    fn from(err: ConfigError) -> PyErr {
        PyOSError::new_err(err.to_string())
    }
}

/// Battery monitor over the local USB bus.
#[pyclass]
pub struct BatteryMonitor {
    service: Arc<BatteryService<UsbBackend>>,
}

fn selector(product_id: Option<u16>, device_class: Option<&str>) -> PyResult<Selector> {
    match (product_id, device_class) {
        (Some(pid), None) => Ok(Selector::Product(pid)),
        (None, Some("keyboard")) => Ok(Selector::Class(DeviceClass::Keyboard)),
        (None, Some("mouse")) => Ok(Selector::Class(DeviceClass::Mouse)),
        (None, Some(other)) => Err(PyValueError::new_err(format!(
            "Unknown device class: {other}"
        ))),
        _ => Err(PyValueError::new_err(
            "Pass exactly one of product_id or device_class",
        )),
    }
}

#[pymethods]
impl BatteryMonitor {
    /// Create a monitor, optionally reading a TOML config file.
    #[new]
    #[pyo3(signature = (config_path=None))]
    fn new(config_path: Option<PathBuf>) -> PyResult<Self> {
        let config = match config_path {
            Some(path) => Config::load(path)?,
            None => Config::default(),
        };
        Ok(Self {
            service: Arc::new(BatteryService::usb(&config)),
        })
    }

    /// List attached catalogued devices (async).
    fn list_devices_async<'py>(&self, py: Python<'py>) -> PyResult<Bound<'py, PyAny>> {
        let service = Arc::clone(&self.service);
        future_into_py(py, async move { Ok(service.list_devices().await) })
    }

    /// Query battery state (async). Resolves to a BatteryReading or None.
    ///
    /// Args:
    ///     product_id: Exact USB product id
    ///     device_class: "mouse" or "keyboard"
    ///     force_refresh: Rescan the bus before querying
    #[pyo3(signature = (product_id=None, device_class=None, force_refresh=false))]
    fn query_battery_async<'py>(
        &self,
        py: Python<'py>,
        product_id: Option<u16>,
        device_class: Option<&str>,
        force_refresh: bool,
    ) -> PyResult<Bound<'py, PyAny>> {
        let selector = selector(product_id, device_class)?;
        let service = Arc::clone(&self.service);
        future_into_py(py, async move {
            Ok(service.query_battery(selector, force_refresh).await)
        })
    }

    fn invalidate_cache(&self) {
        self.service.invalidate_cache();
    }

    fn shutdown(&self) {
        self.service.shutdown();
    }
}

/// Route tracing output to stderr.
#[pyfunction]
#[pyo3(signature = (level="info"))]
fn init_logging(level: &str) -> PyResult<()> {
    crate::logging::init_logging(level)?;
    Ok(())
}

#[pymodule(name = "_native")]
fn _native(m: &Bound<'_, PyModule>) -> PyResult<()> {
    m.add_class::<BatteryMonitor>()?;
    m.add_class::<BatteryReading>()?;
    m.add_class::<DeviceSummary>()?;
    m.add_function(wrap_pyfunction!(init_logging, m)?)?;
    m.add("RAZER_VENDOR_ID", RAZER_VENDOR_ID)?;
    Ok(())
}
