//! The session controller: one connection, one bounded monitoring
//! window, decode -> evaluate -> deliver per notification.

use std::time::Duration;

use tokio::time::sleep;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::alert::AlertSink;
use crate::error::SessionError;
use crate::frame;
use crate::signal::TransportEvent;
use crate::threshold::{self, Thresholds};
use crate::transport::Transport;

/// How a monitoring window ended. Link loss is an outcome, not an
/// error; whether to reconnect is the caller's decision.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionOutcome {
    /// The window ran to completion.
    Completed,
    /// The peripheral dropped the link mid-window.
    ConnectionLost,
}

/// Immutable per-session configuration.
#[derive(Debug, Clone)]
pub struct SessionConfig {
    pub thresholds: Thresholds,
    pub channels: Vec<Uuid>,
    pub window: Duration,
}

/// Owns exactly one connection for the duration of one window.
pub struct SessionController<T, S> {
    transport: T,
    sink: S,
    config: SessionConfig,
}

impl<T: Transport, S: AlertSink> SessionController<T, S> {
    pub fn new(transport: T, sink: S, config: SessionConfig) -> Self {
        SessionController {
            transport,
            sink,
            config,
        }
    }

    /// Runs one bounded monitoring window against `address`.
    ///
    /// Every exit path, timeout, link loss or subscribe failure, leaves
    /// the transport unsubscribed and disconnected.
    pub async fn run(&mut self, address: &str) -> Result<SessionOutcome, SessionError> {
        let mut events = self
            .transport
            .connect(address)
            .await
            .map_err(SessionError::Connect)?;

        let channels = self.config.channels.clone();
        for (idx, &channel) in channels.iter().enumerate() {
            if let Err(err) = self.transport.subscribe(channel).await {
                self.teardown(&channels[..idx]).await;
                return Err(SessionError::Subscribe(err));
            }
        }
        debug!(channels = channels.len(), "subscribed, window open");

        let deadline = sleep(self.config.window);
        tokio::pin!(deadline);

        // Biased so an elapsed window wins over queued notifications; a
        // zero-length window must process zero samples.
        let outcome = loop {
            tokio::select! {
                biased;
                _ = &mut deadline => break SessionOutcome::Completed,
                event = events.recv() => match event {
                    Some(TransportEvent::Notification { channel, payload }) => {
                        self.process_notification(channel, &payload);
                    }
                    Some(TransportEvent::LinkLost) | None => {
                        break SessionOutcome::ConnectionLost;
                    }
                },
            }
        };

        self.teardown(&channels).await;
        Ok(outcome)
    }

    fn process_notification(&mut self, channel: Uuid, payload: &[u8]) {
        let sample = match frame::decode(payload) {
            Ok(sample) => sample,
            Err(err) => {
                warn!(%channel, error = %err, "dropping malformed frame");
                return;
            }
        };
        info!(
            heart_rate_bpm = sample.heart_rate_bpm,
            oxygen_pct = sample.oxygen_pct,
            "vitals sample"
        );
        for alert in threshold::evaluate(&sample, &self.config.thresholds) {
            if let Err(err) = self.sink.deliver(&alert) {
                warn!(error = %err, "alert delivery failed");
            }
        }
    }

    /// Unsubscribes `channels` and disconnects. Unconditional: failures
    /// here are logged, never propagated.
    async fn teardown(&mut self, channels: &[Uuid]) {
        for &channel in channels {
            if let Err(err) = self.transport.unsubscribe(channel).await {
                warn!(%channel, error = %err, "unsubscribe failed during teardown");
            }
        }
        if let Err(err) = self.transport.disconnect().await {
            warn!(error = %err, "disconnect failed during teardown");
        }
        debug!("session torn down");
    }
}
