use lobbylink_shared::{GroupId, PeerId, RemoteIdentity, SendFlags};

use crate::{connection::peer_connection::ConnectionSnapshot, SessionState};

/// Read-only view of the whole session, for diagnostics
#[derive(Clone, Debug, PartialEq)]
pub struct SessionSnapshot {
    pub state: SessionState,
    pub group_id: Option<GroupId>,
    pub owner: Option<RemoteIdentity>,
    pub local_identity: RemoteIdentity,
    pub local_peer_id: Option<PeerId>,
    pub send_flags: SendFlags,
    /// Received packets not yet taken by the application
    pub inbound_packet_count: usize,
    /// One entry per connection, ordered by identity
    pub connections: Vec<ConnectionSnapshot>,
}

impl SessionSnapshot {
    /// Sum of packets waiting in every connection's retry queue
    pub fn pending_packet_count(&self) -> usize {
        self.connections
            .iter()
            .map(|connection| connection.pending_packet_count)
            .sum()
    }

    pub fn established_count(&self) -> usize {
        self.connections
            .iter()
            .filter(|connection| connection.peer_id.is_some())
            .count()
    }
}
