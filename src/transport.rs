//! The notification transport and its btleplug implementation.

use btleplug::api::{Central, CentralEvent, CharPropFlags, Characteristic, Peripheral};
use btleplug::platform::{Adapter, Peripheral as PlatformPeripheral};
use futures::StreamExt;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use crate::error::TransportError;
use crate::signal::TransportEvent;

const EVENT_CHANNEL_CAPACITY: usize = 128;

/// Link lifecycle: `Disconnected -> Connecting -> Connected ->
/// Subscribed`. Any state falls back to `Disconnected` on link loss.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkState {
    Disconnected,
    Connecting,
    Connected,
    Subscribed,
}

/// A notification-emitting link to one remote peripheral.
///
/// `connect` fails fast when the peripheral does not answer; no retry
/// happens inside the transport. Events for the link, notification
/// payloads and link loss alike, arrive on the receiver `connect`
/// returns, in per-channel arrival order.
#[allow(async_fn_in_trait)]
pub trait Transport {
    async fn connect(
        &mut self,
        address: &str,
    ) -> Result<mpsc::Receiver<TransportEvent>, TransportError>;

    async fn subscribe(&mut self, channel: Uuid) -> Result<(), TransportError>;

    async fn unsubscribe(&mut self, channel: Uuid) -> Result<(), TransportError>;

    async fn disconnect(&mut self) -> Result<(), TransportError>;
}

/// Production transport over a btleplug adapter.
pub struct BleTransport {
    adapter: Adapter,
    peripheral: Option<PlatformPeripheral>,
    subscribed: Vec<Uuid>,
    state: LinkState,
    forwarder_stop: CancellationToken,
}

impl BleTransport {
    pub fn new(adapter: Adapter) -> Self {
        BleTransport {
            adapter,
            peripheral: None,
            subscribed: Vec::new(),
            state: LinkState::Disconnected,
            forwarder_stop: CancellationToken::new(),
        }
    }

    pub fn state(&self) -> LinkState {
        self.state
    }

    fn peripheral(&self) -> Result<&PlatformPeripheral, TransportError> {
        self.peripheral.as_ref().ok_or(TransportError::NotConnected)
    }

    fn notify_characteristic(&self, channel: Uuid) -> Result<Characteristic, TransportError> {
        self.peripheral()?
            .characteristics()
            .into_iter()
            .find(|c| c.uuid == channel && c.properties.contains(CharPropFlags::NOTIFY))
            .ok_or(TransportError::ChannelNotFound { channel })
    }

    async fn connect_inner(
        &mut self,
        address: &str,
    ) -> Result<mpsc::Receiver<TransportEvent>, TransportError> {
        let connect_err = |reason: String| TransportError::Connect {
            address: address.to_owned(),
            reason,
        };

        let peripherals = self
            .adapter
            .peripherals()
            .await
            .map_err(|err| connect_err(err.to_string()))?;

        let mut target = None;
        for peripheral in peripherals {
            let Ok(Some(properties)) = peripheral.properties().await else {
                continue;
            };
            if properties.address.to_string() == address {
                target = Some(peripheral);
                break;
            }
        }
        let peripheral =
            target.ok_or_else(|| connect_err("peripheral not in scan results".to_owned()))?;

        if !peripheral.is_connected().await.unwrap_or(false) {
            peripheral
                .connect()
                .await
                .map_err(|err| connect_err(err.to_string()))?;
        }
        peripheral
            .discover_services()
            .await
            .map_err(|err| connect_err(err.to_string()))?;

        let (tx, rx) = mpsc::channel(EVENT_CHANNEL_CAPACITY);
        let stop = CancellationToken::new();

        // Forward notifications until the stream ends or we are told to
        // stop. A stream ending without a disconnect event still means
        // the link is gone.
        let mut notifications = peripheral
            .notifications()
            .await
            .map_err(|err| connect_err(err.to_string()))?;
        let notification_tx = tx.clone();
        let notification_stop = stop.clone();
        tokio::spawn(async move {
            loop {
                tokio::select! {
                    _ = notification_stop.cancelled() => break,
                    next = notifications.next() => match next {
                        Some(data) => {
                            let event = TransportEvent::Notification {
                                channel: data.uuid,
                                payload: data.value,
                            };
                            if notification_tx.send(event).await.is_err() {
                                break;
                            }
                        }
                        None => {
                            let _ = notification_tx.send(TransportEvent::LinkLost).await;
                            break;
                        }
                    },
                }
            }
        });

        // Watch the adapter event stream for a disconnect of our
        // peripheral, from any link state.
        let peripheral_id = peripheral.id();
        let mut central_events = self
            .adapter
            .events()
            .await
            .map_err(|err| connect_err(err.to_string()))?;
        let loss_stop = stop.clone();
        tokio::spawn(async move {
            loop {
                tokio::select! {
                    _ = loss_stop.cancelled() => break,
                    event = central_events.next() => match event {
                        Some(CentralEvent::DeviceDisconnected(id)) if id == peripheral_id => {
                            let _ = tx.send(TransportEvent::LinkLost).await;
                            break;
                        }
                        Some(_) => {}
                        None => break,
                    },
                }
            }
        });

        self.peripheral = Some(peripheral);
        self.forwarder_stop = stop;
        Ok(rx)
    }
}

impl Transport for BleTransport {
    async fn connect(
        &mut self,
        address: &str,
    ) -> Result<mpsc::Receiver<TransportEvent>, TransportError> {
        self.state = LinkState::Connecting;
        match self.connect_inner(address).await {
            Ok(events) => {
                self.state = LinkState::Connected;
                Ok(events)
            }
            Err(err) => {
                self.peripheral = None;
                self.state = LinkState::Disconnected;
                Err(err)
            }
        }
    }

    async fn subscribe(&mut self, channel: Uuid) -> Result<(), TransportError> {
        let characteristic = self.notify_characteristic(channel)?;
        self.peripheral()?
            .subscribe(&characteristic)
            .await
            .map_err(|err| TransportError::Subscribe {
                channel,
                reason: err.to_string(),
            })?;
        self.subscribed.push(channel);
        self.state = LinkState::Subscribed;
        Ok(())
    }

    async fn unsubscribe(&mut self, channel: Uuid) -> Result<(), TransportError> {
        let characteristic = self.notify_characteristic(channel)?;
        self.peripheral()?
            .unsubscribe(&characteristic)
            .await
            .map_err(|err| TransportError::Unsubscribe {
                channel,
                reason: err.to_string(),
            })?;
        self.subscribed.retain(|&c| c != channel);
        if self.subscribed.is_empty() {
            self.state = LinkState::Connected;
        }
        Ok(())
    }

    async fn disconnect(&mut self) -> Result<(), TransportError> {
        self.forwarder_stop.cancel();
        self.subscribed.clear();
        self.state = LinkState::Disconnected;
        if let Some(peripheral) = self.peripheral.take() {
            if peripheral.is_connected().await.unwrap_or(false) {
                peripheral
                    .disconnect()
                    .await
                    .map_err(|err| TransportError::Disconnect {
                        reason: err.to_string(),
                    })?;
            }
        }
        Ok(())
    }
}
