//! In-memory transport for tests and hardware-free demo runs.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use rand::Rng;
use tokio::sync::mpsc;
use uuid::Uuid;

use crate::error::TransportError;
use crate::signal::TransportEvent;
use crate::transport::Transport;

/// Steps a [`FakeTransport`] replays after a successful connect.
#[derive(Debug, Clone)]
pub enum FakeStep {
    Notify { channel: Uuid, payload: Vec<u8> },
    Wait(Duration),
    DropLink,
}

/// What the session asked the transport to do, in call order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FakeCall {
    Connect(String),
    Subscribe(Uuid),
    Unsubscribe(Uuid),
    Disconnect,
}

pub struct FakeTransport {
    script: Vec<FakeStep>,
    calls: Arc<Mutex<Vec<FakeCall>>>,
    fail_connect: bool,
    fail_subscribe_on: Option<Uuid>,
}

impl FakeTransport {
    pub fn new(script: Vec<FakeStep>) -> Self {
        FakeTransport {
            script,
            calls: Arc::new(Mutex::new(Vec::new())),
            fail_connect: false,
            fail_subscribe_on: None,
        }
    }

    /// A transport whose connect always fails.
    pub fn failing_connect() -> Self {
        let mut transport = FakeTransport::new(Vec::new());
        transport.fail_connect = true;
        transport
    }

    /// A transport that rejects subscription to `channel`.
    pub fn failing_subscribe(script: Vec<FakeStep>, channel: Uuid) -> Self {
        let mut transport = FakeTransport::new(script);
        transport.fail_subscribe_on = Some(channel);
        transport
    }

    /// Handle to the recorded calls; stays valid after a controller
    /// takes ownership of the transport.
    pub fn call_log(&self) -> Arc<Mutex<Vec<FakeCall>>> {
        Arc::clone(&self.calls)
    }

    fn record(&self, call: FakeCall) {
        self.calls.lock().unwrap().push(call);
    }
}

impl Transport for FakeTransport {
    async fn connect(
        &mut self,
        address: &str,
    ) -> Result<mpsc::Receiver<TransportEvent>, TransportError> {
        self.record(FakeCall::Connect(address.to_owned()));
        if self.fail_connect {
            return Err(TransportError::Connect {
                address: address.to_owned(),
                reason: "scripted connect failure".to_owned(),
            });
        }

        let (tx, rx) = mpsc::channel(64);
        let script = std::mem::take(&mut self.script);
        tokio::spawn(async move {
            for step in script {
                match step {
                    FakeStep::Notify { channel, payload } => {
                        let event = TransportEvent::Notification { channel, payload };
                        if tx.send(event).await.is_err() {
                            return;
                        }
                    }
                    FakeStep::Wait(pause) => tokio::time::sleep(pause).await,
                    FakeStep::DropLink => {
                        let _ = tx.send(TransportEvent::LinkLost).await;
                        return;
                    }
                }
            }
            // Script exhausted without a drop: keep the link up until
            // the session lets go of the receiver.
            tx.closed().await;
        });
        Ok(rx)
    }

    async fn subscribe(&mut self, channel: Uuid) -> Result<(), TransportError> {
        self.record(FakeCall::Subscribe(channel));
        if self.fail_subscribe_on == Some(channel) {
            return Err(TransportError::Subscribe {
                channel,
                reason: "scripted subscribe failure".to_owned(),
            });
        }
        Ok(())
    }

    async fn unsubscribe(&mut self, channel: Uuid) -> Result<(), TransportError> {
        self.record(FakeCall::Unsubscribe(channel));
        Ok(())
    }

    async fn disconnect(&mut self) -> Result<(), TransportError> {
        self.record(FakeCall::Disconnect);
        Ok(())
    }
}

/// A plausible random vitals script, paced like a real wearable. Used
/// by the demo mode to exercise the whole pipeline without hardware.
pub fn random_vitals_script(channel: Uuid, samples: usize, pace: Duration) -> Vec<FakeStep> {
    let mut rng = rand::thread_rng();
    let mut script = Vec::with_capacity(samples * 2);
    for _ in 0..samples {
        let heart_rate = rng.gen_range(50..115);
        let oxygen = rng.gen_range(85..100);
        script.push(FakeStep::Notify {
            channel,
            payload: vec![heart_rate, oxygen],
        });
        script.push(FakeStep::Wait(pace));
    }
    script
}
