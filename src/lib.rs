// Vitals stream processing over BLE-style notification transports.

pub mod alert;
pub mod discover;
pub mod error;
pub mod fake;
pub mod frame;
pub mod session;
pub mod signal;
pub mod threshold;
pub mod transport;
