//! Alerts and the sink collaborator they are handed to.

use crate::error::SinkError;

/// Which threshold rule fired.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AlertKind {
    HighHeartRate,
    LowHeartRate,
    LowOxygen,
}

/// One threshold violation for one sample.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Alert {
    pub kind: AlertKind,
    pub value: u8,
    pub message: String,
}

impl Alert {
    pub fn high_heart_rate(bpm: u8) -> Self {
        Alert {
            kind: AlertKind::HighHeartRate,
            value: bpm,
            message: format!("High heart rate detected: {bpm} BPM"),
        }
    }

    pub fn low_heart_rate(bpm: u8) -> Self {
        Alert {
            kind: AlertKind::LowHeartRate,
            value: bpm,
            message: format!("Low heart rate detected: {bpm} BPM"),
        }
    }

    pub fn low_oxygen(pct: u8) -> Self {
        Alert {
            kind: AlertKind::LowOxygen,
            value: pct,
            message: format!("Low oxygen level detected: {pct}%"),
        }
    }
}

/// Consumes alerts in generation order, at most once each. A failed
/// delivery is reported back but must not stop later deliveries.
pub trait AlertSink {
    fn deliver(&mut self, alert: &Alert) -> Result<(), SinkError>;
}

/// Prints alerts to stdout.
pub struct ConsoleSink;

impl AlertSink for ConsoleSink {
    fn deliver(&mut self, alert: &Alert) -> Result<(), SinkError> {
        println!("ALERT: {}", alert.message);
        Ok(())
    }
}
