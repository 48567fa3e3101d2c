use std::time::{Duration, Instant};

use log::info;

use lobbylink_shared::{Packet, PeerId, PingPayload, RemoteIdentity, SendFlags, PING_PAYLOAD_SIZE};

use crate::{
    connection::retry_queue::{FlushStats, RetryQueue},
    transport::{MessageTransport, SessionStatus},
    ConnectionError,
};

/// Read-only view of one connection, for diagnostics
#[derive(Clone, Debug, PartialEq)]
pub struct ConnectionSnapshot {
    pub identity: RemoteIdentity,
    pub peer_id: Option<PeerId>,
    pub pending_packet_count: usize,
    pub status: SessionStatus,
}

/// State kept for one remote identity for as long as it shares a group with us
#[derive(Debug)]
pub struct PeerConnection {
    identity: RemoteIdentity,
    peer_id: Option<PeerId>,
    last_activity: Instant,
    retry_queue: RetryQueue,
}

impl PeerConnection {
    pub fn new(identity: RemoteIdentity, now: Instant) -> Self {
        Self {
            identity,
            peer_id: None,
            last_activity: now,
            retry_queue: RetryQueue::new(),
        }
    }

    pub fn identity(&self) -> RemoteIdentity {
        self.identity
    }

    /// `None` until the remote has announced its peer id
    pub fn peer_id(&self) -> Option<PeerId> {
        self.peer_id
    }

    pub(crate) fn set_peer_id(&mut self, peer_id: PeerId) {
        self.peer_id = Some(peer_id);
    }

    pub fn is_established(&self) -> bool {
        self.peer_id.is_some()
    }

    pub fn last_activity(&self) -> Instant {
        self.last_activity
    }

    /// Records that something arrived from the remote
    pub fn mark_activity(&mut self, now: Instant) {
        self.last_activity = now;
    }

    pub fn pending_packet_count(&self) -> usize {
        self.retry_queue.len()
    }

    pub fn retry_queue(&self) -> &RetryQueue {
        &self.retry_queue
    }

    /// Whether a control-channel packet is still waiting in the retry queue
    pub fn has_pending_ping(&self) -> bool {
        self.retry_queue.iter().any(Packet::is_control)
    }

    // Sending

    /// Queues `packet` behind anything still pending, then flushes.
    ///
    /// A control-channel packet that is not exactly one ping record is
    /// rejected before it reaches the queue.
    pub fn send(
        &mut self,
        packet: Packet,
        transport: &mut dyn MessageTransport,
        flags: SendFlags,
    ) -> Result<FlushStats, ConnectionError> {
        if !packet.is_well_formed() {
            return Err(ConnectionError::MalformedControlPayload {
                size: packet.len(),
                expected: PING_PAYLOAD_SIZE,
            });
        }

        self.retry_queue.enqueue(packet);
        Ok(self.flush(transport, flags))
    }

    /// Retries whatever is pending
    pub fn flush(&mut self, transport: &mut dyn MessageTransport, flags: SendFlags) -> FlushStats {
        self.retry_queue.flush(&self.identity, transport, flags)
    }

    /// Sends a ping record reliably on the control channel
    pub fn ping(
        &mut self,
        payload: &PingPayload,
        transport: &mut dyn MessageTransport,
        flags: SendFlags,
    ) -> Result<FlushStats, ConnectionError> {
        let packet = Packet::ping(payload);
        self.send(packet, transport, flags)
    }

    /// Whether the remote is still unassigned, or silent for longer than
    /// `threshold`
    pub fn is_stale(&self, now: Instant, threshold: Duration) -> bool {
        self.peer_id.is_none() || now.saturating_duration_since(self.last_activity) > threshold
    }

    /// Pings when [`is_stale`](Self::is_stale), unless an earlier ping is
    /// still queued. The activity timestamp only moves when something comes
    /// back. Returns whether a ping was queued.
    pub fn ping_if_stale(
        &mut self,
        now: Instant,
        threshold: Duration,
        payload: &PingPayload,
        transport: &mut dyn MessageTransport,
        flags: SendFlags,
    ) -> Result<bool, ConnectionError> {
        if !self.is_stale(now, threshold) || self.has_pending_ping() {
            return Ok(false);
        }
        self.ping(payload, transport, flags)?;
        Ok(true)
    }

    // Diagnostics

    pub fn snapshot(&self, transport: &dyn MessageTransport) -> ConnectionSnapshot {
        ConnectionSnapshot {
            identity: self.identity,
            peer_id: self.peer_id,
            pending_packet_count: self.retry_queue.len(),
            status: transport.session_status(&self.identity),
        }
    }

    // Teardown

    /// Closes the transport session and discards every queued packet unsent
    pub fn close(mut self, transport: &mut dyn MessageTransport) {
        if !self.retry_queue.is_empty() {
            info!(
                "discarding {} unsent packets to {}",
                self.retry_queue.len(),
                self.identity
            );
        }
        self.retry_queue.clear();
        transport.close_session(&self.identity);
    }
}

impl PartialEq for PeerConnection {
    fn eq(&self, other: &Self) -> bool {
        self.identity == other.identity
    }
}

impl Eq for PeerConnection {}
