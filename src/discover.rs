//! Device discovery. Supplies `{name, address}` pairs; which one to
//! pick is the caller's policy, not ours.

use std::time::Duration;

use btleplug::api::{Central, Manager as _, Peripheral, ScanFilter};
use btleplug::platform::{Adapter, Manager};
use tracing::debug;

use crate::error::TransportError;

/// One named peripheral seen during a scan.
#[derive(Debug, Clone)]
pub struct DiscoveredDevice {
    pub name: String,
    pub address: String,
}

/// Grabs the first Bluetooth adapter on the host.
pub async fn first_adapter() -> Result<Adapter, TransportError> {
    let manager = Manager::new().await.map_err(|err| TransportError::Scan {
        reason: err.to_string(),
    })?;
    let adapters = manager.adapters().await.map_err(|err| TransportError::Scan {
        reason: err.to_string(),
    })?;
    adapters.into_iter().next().ok_or(TransportError::NoAdapter)
}

/// Scans for `scan_window` and reports every peripheral that advertised
/// a name. Unnamed peripherals are skipped; they cannot be matched by
/// any name-based policy anyway.
pub async fn discover_devices(
    adapter: &Adapter,
    scan_window: Duration,
) -> Result<Vec<DiscoveredDevice>, TransportError> {
    let scan_err = |err: btleplug::Error| TransportError::Scan {
        reason: err.to_string(),
    };

    adapter
        .start_scan(ScanFilter::default())
        .await
        .map_err(scan_err)?;
    tokio::time::sleep(scan_window).await;
    adapter.stop_scan().await.map_err(scan_err)?;

    let mut devices = Vec::new();
    for peripheral in adapter.peripherals().await.map_err(scan_err)? {
        let Ok(Some(properties)) = peripheral.properties().await else {
            continue;
        };
        let Some(name) = properties.local_name else {
            debug!(address = %properties.address, "skipping unnamed peripheral");
            continue;
        };
        devices.push(DiscoveredDevice {
            name,
            address: properties.address.to_string(),
        });
    }
    Ok(devices)
}
