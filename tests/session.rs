//! Session controller behavior against the scripted fake transport.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use assert_matches::assert_matches;
use uuid::Uuid;

use btvitals::alert::{Alert, AlertKind, AlertSink};
use btvitals::error::{SessionError, SinkError};
use btvitals::fake::{FakeCall, FakeStep, FakeTransport};
use btvitals::session::{SessionConfig, SessionController, SessionOutcome};
use btvitals::threshold::Thresholds;

const HEART_RATE_CHANNEL: Uuid = Uuid::from_u128(0x00002a37_0000_1000_8000_00805f9b34fb);
const OXYGEN_CHANNEL: Uuid = Uuid::from_u128(0x00002a38_0000_1000_8000_00805f9b34fb);

fn config(window: Duration) -> SessionConfig {
    SessionConfig {
        thresholds: Thresholds {
            heart_rate_min: 60,
            heart_rate_max: 100,
            oxygen_min: 90,
        },
        channels: vec![HEART_RATE_CHANNEL, OXYGEN_CHANNEL],
        window,
    }
}

/// Records every delivered alert behind a shared handle.
#[derive(Clone, Default)]
struct RecordingSink {
    alerts: Arc<Mutex<Vec<Alert>>>,
}

impl RecordingSink {
    fn kinds(&self) -> Vec<AlertKind> {
        self.alerts.lock().unwrap().iter().map(|a| a.kind).collect()
    }
}

impl AlertSink for RecordingSink {
    fn deliver(&mut self, alert: &Alert) -> Result<(), SinkError> {
        self.alerts.lock().unwrap().push(alert.clone());
        Ok(())
    }
}

/// Rejects every delivery, counting attempts.
#[derive(Clone, Default)]
struct FailingSink {
    attempts: Arc<Mutex<usize>>,
}

impl AlertSink for FailingSink {
    fn deliver(&mut self, _alert: &Alert) -> Result<(), SinkError> {
        *self.attempts.lock().unwrap() += 1;
        Err(SinkError {
            reason: "scripted sink failure".to_owned(),
        })
    }
}

fn notify(channel: Uuid, payload: &[u8]) -> FakeStep {
    FakeStep::Notify {
        channel,
        payload: payload.to_vec(),
    }
}

#[tokio::test]
async fn link_loss_mid_window_tears_down_and_reports_loss() {
    let transport = FakeTransport::new(vec![
        notify(HEART_RATE_CHANNEL, &[72, 98]),
        FakeStep::DropLink,
    ]);
    let calls = transport.call_log();
    let sink = RecordingSink::default();

    let mut controller = SessionController::new(transport, sink.clone(), config(Duration::from_secs(30)));
    let outcome = controller.run("aa:bb:cc:dd:ee:ff").await.unwrap();

    // Link loss mid-window, never a timeout outcome.
    assert_eq!(outcome, SessionOutcome::ConnectionLost);
    assert!(sink.kinds().is_empty());

    let calls = calls.lock().unwrap();
    assert_eq!(
        *calls,
        vec![
            FakeCall::Connect("aa:bb:cc:dd:ee:ff".to_owned()),
            FakeCall::Subscribe(HEART_RATE_CHANNEL),
            FakeCall::Subscribe(OXYGEN_CHANNEL),
            FakeCall::Unsubscribe(HEART_RATE_CHANNEL),
            FakeCall::Unsubscribe(OXYGEN_CHANNEL),
            FakeCall::Disconnect,
        ]
    );
}

#[tokio::test]
async fn malformed_frame_does_not_abort_session() {
    let transport = FakeTransport::new(vec![
        notify(HEART_RATE_CHANNEL, &[120, 95]),
        notify(HEART_RATE_CHANNEL, &[7]), // too short, dropped
        notify(OXYGEN_CHANNEL, &[50, 85]),
        FakeStep::DropLink,
    ]);
    let sink = RecordingSink::default();

    let mut controller = SessionController::new(transport, sink.clone(), config(Duration::from_secs(30)));
    let outcome = controller.run("aa:bb:cc:dd:ee:ff").await.unwrap();

    assert_eq!(outcome, SessionOutcome::ConnectionLost);
    // Both valid frames around the malformed one were processed.
    assert_eq!(
        sink.kinds(),
        vec![
            AlertKind::HighHeartRate,
            AlertKind::LowHeartRate,
            AlertKind::LowOxygen,
        ]
    );
}

#[tokio::test]
async fn zero_window_completes_with_zero_samples() {
    let transport = FakeTransport::new(vec![notify(HEART_RATE_CHANNEL, &[200, 80])]);
    let calls = transport.call_log();
    let sink = RecordingSink::default();

    let mut controller = SessionController::new(transport, sink.clone(), config(Duration::ZERO));
    let outcome = controller.run("aa:bb:cc:dd:ee:ff").await.unwrap();

    assert_eq!(outcome, SessionOutcome::Completed);
    assert!(sink.kinds().is_empty());

    let calls = calls.lock().unwrap();
    assert_eq!(
        *calls,
        vec![
            FakeCall::Connect("aa:bb:cc:dd:ee:ff".to_owned()),
            FakeCall::Subscribe(HEART_RATE_CHANNEL),
            FakeCall::Subscribe(OXYGEN_CHANNEL),
            FakeCall::Unsubscribe(HEART_RATE_CHANNEL),
            FakeCall::Unsubscribe(OXYGEN_CHANNEL),
            FakeCall::Disconnect,
        ]
    );
}

#[tokio::test]
async fn window_elapse_completes_session() {
    let transport = FakeTransport::new(vec![notify(HEART_RATE_CHANNEL, &[50, 99])]);
    let sink = RecordingSink::default();

    let mut controller = SessionController::new(transport, sink.clone(), config(Duration::from_millis(200)));
    let outcome = controller.run("aa:bb:cc:dd:ee:ff").await.unwrap();

    assert_eq!(outcome, SessionOutcome::Completed);
    assert_eq!(sink.kinds(), vec![AlertKind::LowHeartRate]);
}

#[tokio::test]
async fn connect_failure_aborts_without_teardown() {
    let transport = FakeTransport::failing_connect();
    let calls = transport.call_log();

    let mut controller = SessionController::new(transport, RecordingSink::default(), config(Duration::from_secs(30)));
    let err = controller.run("aa:bb:cc:dd:ee:ff").await.unwrap_err();

    assert_matches!(err, SessionError::Connect(_));
    // Nothing was opened, so nothing gets torn down.
    let calls = calls.lock().unwrap();
    assert_eq!(*calls, vec![FakeCall::Connect("aa:bb:cc:dd:ee:ff".to_owned())]);
}

#[tokio::test]
async fn subscribe_failure_unsubscribes_earlier_channels() {
    let transport = FakeTransport::failing_subscribe(Vec::new(), OXYGEN_CHANNEL);
    let calls = transport.call_log();

    let mut controller = SessionController::new(transport, RecordingSink::default(), config(Duration::from_secs(30)));
    let err = controller.run("aa:bb:cc:dd:ee:ff").await.unwrap_err();

    assert_matches!(err, SessionError::Subscribe(_));
    let calls = calls.lock().unwrap();
    assert_eq!(
        *calls,
        vec![
            FakeCall::Connect("aa:bb:cc:dd:ee:ff".to_owned()),
            FakeCall::Subscribe(HEART_RATE_CHANNEL),
            FakeCall::Subscribe(OXYGEN_CHANNEL),
            FakeCall::Unsubscribe(HEART_RATE_CHANNEL),
            FakeCall::Disconnect,
        ]
    );
}

#[tokio::test]
async fn failing_sink_does_not_stop_the_session() {
    let transport = FakeTransport::new(vec![
        notify(HEART_RATE_CHANNEL, &[150, 99]),
        notify(HEART_RATE_CHANNEL, &[40, 99]),
        FakeStep::DropLink,
    ]);
    let sink = FailingSink::default();
    let attempts = Arc::clone(&sink.attempts);

    let mut controller = SessionController::new(transport, sink, config(Duration::from_secs(30)));
    let outcome = controller.run("aa:bb:cc:dd:ee:ff").await.unwrap();

    assert_eq!(outcome, SessionOutcome::ConnectionLost);
    // Both samples still reached the sink despite every delivery failing.
    assert_eq!(*attempts.lock().unwrap(), 2);
}
