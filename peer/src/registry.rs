use std::{
    collections::{hash_map, HashMap},
    time::Instant,
};

use log::{info, warn};

use lobbylink_shared::{PeerId, RemoteIdentity};

use crate::{
    connection::peer_connection::PeerConnection, events::PeerEvents,
    transport::MessageTransport, RegistryError,
};

/// Result of a successful [`IdentityRegistry::bind_peer_id`]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BindOutcome {
    /// The connection was unassigned and now carries the peer id
    Bound,
    /// The connection already carried this peer id
    AlreadyBound,
}

/// Owns every [`PeerConnection`] of the session, keyed by identity, and keeps
/// the peer id index in step with it.
#[derive(Debug, Default)]
pub struct IdentityRegistry {
    connections: HashMap<RemoteIdentity, PeerConnection>,
    peer_ids: HashMap<PeerId, RemoteIdentity>,
}

impl IdentityRegistry {
    pub fn new() -> Self {
        Self {
            connections: HashMap::new(),
            peer_ids: HashMap::new(),
        }
    }

    /// Creates an unassigned connection for `identity`
    pub fn register(
        &mut self,
        identity: RemoteIdentity,
        now: Instant,
    ) -> Result<&mut PeerConnection, RegistryError> {
        match self.connections.entry(identity) {
            hash_map::Entry::Occupied(_) => Err(RegistryError::AlreadyExists { identity }),
            hash_map::Entry::Vacant(entry) => {
                info!("adding pending connection to {}", identity);
                Ok(entry.insert(PeerConnection::new(identity, now)))
            }
        }
    }

    /// Assigns `peer_id` to the connection of `identity`. The first
    /// assignment wins: later, different announcements are reported and
    /// ignored. A peer id already held by someone else (including us, as
    /// `local_peer_id`) is refused.
    pub fn bind_peer_id(
        &mut self,
        identity: &RemoteIdentity,
        peer_id: PeerId,
        local_peer_id: Option<PeerId>,
        events: &mut PeerEvents,
    ) -> Result<BindOutcome, RegistryError> {
        let Some(connection) = self.connections.get_mut(identity) else {
            return Err(RegistryError::UnknownIdentity {
                identity: *identity,
            });
        };

        match connection.peer_id() {
            Some(current) if current == peer_id => return Ok(BindOutcome::AlreadyBound),
            Some(current) => {
                warn!(
                    "identity {} got wrong peer id: was {}, trying to set as {}",
                    identity, current, peer_id
                );
                return Err(RegistryError::PeerIdMismatch {
                    identity: *identity,
                    current,
                    requested: peer_id,
                });
            }
            None => {}
        }

        if local_peer_id == Some(peer_id) {
            warn!("identity {} announced our own peer id {}", identity, peer_id);
            return Err(RegistryError::LocalPeerIdCollision {
                identity: *identity,
                peer_id,
            });
        }
        if let Some(holder) = self.peer_ids.get(&peer_id) {
            warn!(
                "identity {} announced peer id {}, already held by {}",
                identity, peer_id, holder
            );
            return Err(RegistryError::PeerIdCollision {
                identity: *identity,
                peer_id,
                holder: *holder,
            });
        }

        connection.set_peer_id(peer_id);
        self.peer_ids.insert(peer_id, *identity);
        info!("identity {} connected as peer {}", identity, peer_id);
        events.push_connection(peer_id);

        Ok(BindOutcome::Bound)
    }

    /// Removes and tears down the connection of `identity`. Returns the peer
    /// id it held, if any.
    pub fn unregister(
        &mut self,
        identity: &RemoteIdentity,
        transport: &mut dyn MessageTransport,
        events: &mut PeerEvents,
    ) -> Result<Option<PeerId>, RegistryError> {
        let Some(connection) = self.connections.remove(identity) else {
            return Err(RegistryError::UnknownIdentity {
                identity: *identity,
            });
        };

        let peer_id = connection.peer_id();
        if let Some(peer_id) = peer_id {
            self.peer_ids.remove(&peer_id);
            info!("peer {} ({}) disconnected", peer_id, identity);
            events.push_disconnection(peer_id, *identity);
        } else {
            info!("pending connection to {} removed", identity);
        }

        connection.close(transport);

        Ok(peer_id)
    }

    /// Tears down every connection without emitting events
    pub fn clear(&mut self, transport: &mut dyn MessageTransport) {
        self.peer_ids.clear();
        for (_, connection) in self.connections.drain() {
            connection.close(transport);
        }
    }

    // Lookups

    pub fn lookup_by_identity(&self, identity: &RemoteIdentity) -> Option<&PeerConnection> {
        self.connections.get(identity)
    }

    pub fn lookup_by_identity_mut(
        &mut self,
        identity: &RemoteIdentity,
    ) -> Option<&mut PeerConnection> {
        self.connections.get_mut(identity)
    }

    pub fn lookup_by_peer_id(&self, peer_id: &PeerId) -> Option<&PeerConnection> {
        let identity = self.peer_ids.get(peer_id)?;
        self.connections.get(identity)
    }

    pub fn lookup_by_peer_id_mut(&mut self, peer_id: &PeerId) -> Option<&mut PeerConnection> {
        let identity = self.peer_ids.get(peer_id)?;
        self.connections.get_mut(identity)
    }

    pub fn contains(&self, identity: &RemoteIdentity) -> bool {
        self.connections.contains_key(identity)
    }

    pub fn len(&self) -> usize {
        self.connections.len()
    }

    pub fn is_empty(&self) -> bool {
        self.connections.is_empty()
    }

    /// Number of connections that finished the id handshake
    pub fn established_count(&self) -> usize {
        self.peer_ids.len()
    }

    pub fn iter(&self) -> hash_map::Values<'_, RemoteIdentity, PeerConnection> {
        self.connections.values()
    }

    pub fn iter_mut(&mut self) -> hash_map::ValuesMut<'_, RemoteIdentity, PeerConnection> {
        self.connections.values_mut()
    }

    /// Every negotiated `(peer id, identity)` pair, ordered by peer id
    pub fn peer_map(&self) -> Vec<(PeerId, RemoteIdentity)> {
        let mut output: Vec<(PeerId, RemoteIdentity)> = self
            .peer_ids
            .iter()
            .map(|(peer_id, identity)| (*peer_id, *identity))
            .collect();
        output.sort();
        output
    }
}
