use std::env;
use std::time::Duration;

use anyhow::{bail, Result};
use tracing::info;
use tracing_subscriber::EnvFilter;
use uuid::Uuid;

use btvitals::alert::ConsoleSink;
use btvitals::discover;
use btvitals::fake::{self, FakeTransport};
use btvitals::session::{SessionConfig, SessionController, SessionOutcome};
use btvitals::threshold::Thresholds;
use btvitals::transport::BleTransport;

const DEVICE_NAME: &str = "WearableDevice";

const HEART_RATE_CHAR_UUID: Uuid = Uuid::from_u128(0x00002a37_0000_1000_8000_00805f9b34fb);
const OXYGEN_CHAR_UUID: Uuid = Uuid::from_u128(0x00002a38_0000_1000_8000_00805f9b34fb);

const HEART_RATE_MAX: u8 = 100;
const HEART_RATE_MIN: u8 = 60;
const OXYGEN_MIN: u8 = 90;

const SCAN_WINDOW: Duration = Duration::from_secs(5);
const MONITOR_WINDOW: Duration = Duration::from_secs(60);

fn session_config() -> SessionConfig {
    SessionConfig {
        thresholds: Thresholds {
            heart_rate_min: HEART_RATE_MIN,
            heart_rate_max: HEART_RATE_MAX,
            oxygen_min: OXYGEN_MIN,
        },
        channels: vec![HEART_RATE_CHAR_UUID, OXYGEN_CHAR_UUID],
        window: MONITOR_WINDOW,
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    if env::args().any(|arg| arg == "--demo") {
        return run_demo().await;
    }

    let adapter = discover::first_adapter().await?;
    info!("scanning for BLE devices...");
    let devices = discover::discover_devices(&adapter, SCAN_WINDOW).await?;
    for device in &devices {
        info!(name = %device.name, address = %device.address, "device found");
    }

    // First named match wins; picking smarter is policy, not core.
    let Some(target) = devices.iter().find(|d| d.name.contains(DEVICE_NAME)) else {
        bail!("no device matching {DEVICE_NAME:?} found");
    };
    info!(name = %target.name, address = %target.address, "connecting");

    let transport = BleTransport::new(adapter);
    let mut controller = SessionController::new(transport, ConsoleSink, session_config());
    match controller.run(&target.address).await? {
        SessionOutcome::Completed => info!("monitoring window complete"),
        SessionOutcome::ConnectionLost => bail!("connection to {} lost mid-session", target.name),
    }
    Ok(())
}

/// Runs the full pipeline against the fake transport, no radio needed.
async fn run_demo() -> Result<()> {
    info!("demo mode: simulated wearable");
    let pace = Duration::from_millis(800);
    let script = fake::random_vitals_script(HEART_RATE_CHAR_UUID, 32, pace);
    let transport = FakeTransport::new(script);

    let mut config = session_config();
    config.window = Duration::from_secs(20);

    let mut controller = SessionController::new(transport, ConsoleSink, config);
    match controller.run("demo-device").await? {
        SessionOutcome::Completed => info!("demo window complete"),
        SessionOutcome::ConnectionLost => bail!("demo link dropped unexpectedly"),
    }
    Ok(())
}
