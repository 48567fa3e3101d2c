//! Boundary with the raw, identity-addressed messaging primitive.

mod session_status;

pub use session_status::{ConnectionState, SessionStatus};

use lobbylink_shared::{Delivery, RemoteIdentity, SendFlags};

/// The transport refused or failed to send a message
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SendError;

/// A message pulled off the transport
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReceivedMessage {
    pub sender: RemoteIdentity,
    pub payload: Box<[u8]>,
    pub delivery: Delivery,
}

impl ReceivedMessage {
    pub fn new(sender: RemoteIdentity, payload: &[u8], delivery: Delivery) -> Self {
        Self {
            sender,
            payload: payload.into(),
            delivery,
        }
    }
}

/// Session-oriented point-to-point messaging, addressed by remote identity.
///
/// Implementations deliver byte messages on numbered channels and handle
/// encryption and relaying themselves. Nothing here blocks.
pub trait MessageTransport {
    /// Identity of the local endpoint
    fn local_identity(&self) -> RemoteIdentity;

    /// Sends one message, opening a session with `identity` if needed
    fn send_to_identity(
        &mut self,
        identity: &RemoteIdentity,
        payload: &[u8],
        delivery: Delivery,
        flags: SendFlags,
        channel: u32,
    ) -> Result<(), SendError>;

    /// Closes the session with `identity`, discarding anything in flight
    fn close_session(&mut self, identity: &RemoteIdentity);

    /// Accepts a session requested by `identity`. Returns whether it worked.
    fn accept_session(&mut self, identity: &RemoteIdentity) -> bool;

    /// Pops up to `max_count` messages waiting on `channel`
    fn receive_batch(&mut self, channel: u32, max_count: usize) -> Vec<ReceivedMessage>;

    /// Current transport-level statistics of the session with `identity`
    fn session_status(&self, identity: &RemoteIdentity) -> SessionStatus;
}
