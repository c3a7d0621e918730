use uuid::Uuid;

/// Events a transport pushes to the session that owns the link.
///
/// Per-channel ordering matches arrival order; there is no ordering
/// guarantee across channels.
#[derive(Debug, Clone)]
pub enum TransportEvent {
    /// The peripheral emitted a notification on a subscribed channel.
    Notification { channel: Uuid, payload: Vec<u8> },
    /// The link dropped. Can arrive in any state.
    LinkLost,
}
