//! Battery query exchange and response decoding
//!
//! Mice and keyboards speak the same frame format but disagree on what the
//! response means:
//!
//! - Mice answer with a status byte (`0x02` on success) and need a second
//!   request (`0x84`) for the charging flag.
//! - Keyboards answer a single `0x80` request; a leading `0x04` means the
//!   keyboard is charging and the level byte is garbage.

use crate::catalogue::{DeviceClass, DeviceDescriptor};
use crate::config::Timing;
use crate::hid::{
    encode_request, Command, HidError, Response, Result, Session, Status, REPORT_SIZE,
};
use serde::Serialize;
use tokio::time::sleep;
use tracing::{debug, trace, warn};

/// Keyboard format byte: charging, level unreliable.
const KEYBOARD_CHARGING: u8 = 0x04;

/// Battery state of one device.
///
/// `battery_level` is `None` when the device reports that it is charging
/// but withholds a trustworthy percentage.
#[cfg_attr(feature = "python", pyo3::pyclass(get_all, frozen))]
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct BatteryReading {
    pub battery_level: Option<f32>,
    pub is_charging: bool,
    pub device_name: String,
    pub product_id: u16,
}

/// Scale a raw 0-255 level to a percentage with one decimal.
pub fn scale_level(raw: u8) -> f32 {
    (raw as f32 / 255.0 * 1000.0).round() / 10.0
}

/// Mouse battery response: level on success, otherwise the status.
pub fn decode_mouse_level(resp: &Response) -> std::result::Result<f32, Status> {
    match resp.status() {
        Status::Ok => Ok(scale_level(resp.value())),
        other => Err(other),
    }
}

/// Mouse charging response. Anything but a successful `1` counts as not
/// charging.
pub fn decode_charging(resp: &Response) -> bool {
    resp.status() == Status::Ok && resp.value() == 1
}

/// Keyboard battery response as `(level, charging)`.
pub fn decode_keyboard(resp: &Response) -> (Option<f32>, bool) {
    if resp.status_byte() == KEYBOARD_CHARGING {
        (None, true)
    } else {
        (Some(scale_level(resp.value())), false)
    }
}

/// Best-effort level from a failed response: the first nonzero byte in
/// 8..=15, read as a percentage when it fits, otherwise as a raw level.
pub fn fallback_level(resp: &Response) -> Option<f32> {
    let raw = resp.argument_window().iter().copied().find(|&b| b != 0)?;
    if raw <= 100 {
        Some(raw as f32)
    } else {
        Some(scale_level(raw))
    }
}

/// One request/response round trip.
pub async fn transact<S: Session>(
    session: &mut S,
    transaction_tag: u8,
    command: Command,
    timing: &Timing,
) -> Result<Response> {
    let frame = encode_request(transaction_tag, command);
    session.write_feature_report(&frame).await?;
    sleep(timing.write_read_delay()).await;
    let raw = session.read_feature_report(REPORT_SIZE).await?;
    trace!(command = ?command, status = ?raw.first(), "response");
    Response::parse(raw)
}

/// Like [`transact`], repeating once if the firmware answers BUSY.
async fn transact_patiently<S: Session>(
    session: &mut S,
    transaction_tag: u8,
    command: Command,
    timing: &Timing,
) -> Result<Response> {
    let resp = transact(session, transaction_tag, command, timing).await?;
    if resp.status() != Status::Busy {
        return Ok(resp);
    }

    debug!(command = ?command, "device busy, retrying");
    sleep(timing.busy_retry_delay()).await;
    transact(session, transaction_tag, command, timing).await
}

/// Run the battery exchange appropriate for `descriptor` on an open session.
pub async fn read_battery<S: Session>(
    session: &mut S,
    descriptor: &DeviceDescriptor,
    timing: &Timing,
) -> Result<BatteryReading> {
    let (battery_level, is_charging) = match descriptor.class {
        DeviceClass::Keyboard => {
            let resp = transact(
                session,
                descriptor.transaction_tag,
                Command::BatteryLevel,
                timing,
            )
            .await?;
            decode_keyboard(&resp)
        }
        DeviceClass::Mouse => read_mouse(session, descriptor, timing).await?,
    };

    Ok(BatteryReading {
        battery_level,
        is_charging,
        device_name: descriptor.display_name.to_string(),
        product_id: descriptor.product_id,
    })
}

async fn read_mouse<S: Session>(
    session: &mut S,
    descriptor: &DeviceDescriptor,
    timing: &Timing,
) -> Result<(Option<f32>, bool)> {
    let tag = descriptor.transaction_tag;

    let resp = transact_patiently(session, tag, Command::BatteryLevel, timing).await?;
    let level = match decode_mouse_level(&resp) {
        Ok(level) => level,
        Err(status) => {
            if descriptor.quirks.status_fallback {
                if let Some(level) = fallback_level(&resp) {
                    debug!(
                        product_id = format_args!("0x{:04x}", descriptor.product_id),
                        level, "using embedded level from failed response"
                    );
                    return Ok((Some(level), true));
                }
            }
            return Err(HidError::Status(status));
        }
    };

    let is_charging = match transact_patiently(session, tag, Command::ChargingStatus, timing).await
    {
        Ok(resp) => decode_charging(&resp),
        Err(e) => {
            warn!(
                product_id = format_args!("0x{:04x}", descriptor.product_id),
                "charging status unavailable: {}", e
            );
            false
        }
    };

    Ok((Some(level), is_charging))
}
