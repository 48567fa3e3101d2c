use std::{mem, vec::IntoIter};

use lobbylink_shared::{GroupId, PeerId, RemoteIdentity};

use crate::PeerError;

/// Everything that happened since the previous poll
#[derive(Debug)]
pub struct PeerEvents {
    connections: Vec<PeerId>,
    disconnections: Vec<(PeerId, RemoteIdentity)>,
    groups_created: Vec<GroupId>,
    groups_joined: Vec<GroupId>,
    group_messages: Vec<(RemoteIdentity, Box<[u8]>)>,
    errors: Vec<PeerError>,

    empty: bool,
}

impl PeerEvents {
    pub fn new() -> Self {
        Self {
            connections: Vec::new(),
            disconnections: Vec::new(),
            groups_created: Vec::new(),
            groups_joined: Vec::new(),
            group_messages: Vec::new(),
            errors: Vec::new(),

            empty: true,
        }
    }

    // Public

    pub fn is_empty(&self) -> bool {
        self.empty
    }

    pub fn read<V: PeerEvent>(&mut self) -> V::Iter {
        V::iter(self)
    }

    pub fn has<V: PeerEvent>(&self) -> bool {
        V::has(self)
    }

    // Crate-public

    pub(crate) fn push_connection(&mut self, peer_id: PeerId) {
        self.connections.push(peer_id);
        self.empty = false;
    }

    pub(crate) fn push_disconnection(&mut self, peer_id: PeerId, identity: RemoteIdentity) {
        self.disconnections.push((peer_id, identity));
        self.empty = false;
    }

    pub(crate) fn push_group_created(&mut self, group_id: GroupId) {
        self.groups_created.push(group_id);
        self.empty = false;
    }

    pub(crate) fn push_group_joined(&mut self, group_id: GroupId) {
        self.groups_joined.push(group_id);
        self.empty = false;
    }

    pub(crate) fn push_group_message(&mut self, sender: RemoteIdentity, payload: Box<[u8]>) {
        self.group_messages.push((sender, payload));
        self.empty = false;
    }

    pub(crate) fn push_error<E: Into<PeerError>>(&mut self, error: E) {
        self.errors.push(error.into());
        self.empty = false;
    }
}

impl Default for PeerEvents {
    fn default() -> Self {
        Self::new()
    }
}

// Event Trait
pub trait PeerEvent {
    type Iter;

    fn iter(events: &mut PeerEvents) -> Self::Iter;

    fn has(events: &PeerEvents) -> bool;
}

// ConnectEvent
/// A peer finished the id handshake and can receive application packets
pub struct ConnectEvent;
impl PeerEvent for ConnectEvent {
    type Iter = IntoIter<PeerId>;

    fn iter(events: &mut PeerEvents) -> Self::Iter {
        mem::take(&mut events.connections).into_iter()
    }

    fn has(events: &PeerEvents) -> bool {
        !events.connections.is_empty()
    }
}

// DisconnectEvent
pub struct DisconnectEvent;
impl PeerEvent for DisconnectEvent {
    type Iter = IntoIter<(PeerId, RemoteIdentity)>;

    fn iter(events: &mut PeerEvents) -> Self::Iter {
        mem::take(&mut events.disconnections).into_iter()
    }

    fn has(events: &PeerEvents) -> bool {
        !events.disconnections.is_empty()
    }
}

// GroupCreatedEvent
pub struct GroupCreatedEvent;
impl PeerEvent for GroupCreatedEvent {
    type Iter = IntoIter<GroupId>;

    fn iter(events: &mut PeerEvents) -> Self::Iter {
        mem::take(&mut events.groups_created).into_iter()
    }

    fn has(events: &PeerEvents) -> bool {
        !events.groups_created.is_empty()
    }
}

// GroupJoinedEvent
pub struct GroupJoinedEvent;
impl PeerEvent for GroupJoinedEvent {
    type Iter = IntoIter<GroupId>;

    fn iter(events: &mut PeerEvents) -> Self::Iter {
        mem::take(&mut events.groups_joined).into_iter()
    }

    fn has(events: &PeerEvents) -> bool {
        !events.groups_joined.is_empty()
    }
}

// GroupMessageEvent
pub struct GroupMessageEvent;
impl PeerEvent for GroupMessageEvent {
    type Iter = IntoIter<(RemoteIdentity, Box<[u8]>)>;

    fn iter(events: &mut PeerEvents) -> Self::Iter {
        mem::take(&mut events.group_messages).into_iter()
    }

    fn has(events: &PeerEvents) -> bool {
        !events.group_messages.is_empty()
    }
}

// ErrorEvent
/// Diagnostics: protocol inconsistencies and failed session attempts
pub struct ErrorEvent;
impl PeerEvent for ErrorEvent {
    type Iter = IntoIter<PeerError>;

    fn iter(events: &mut PeerEvents) -> Self::Iter {
        mem::take(&mut events.errors).into_iter()
    }

    fn has(events: &PeerEvents) -> bool {
        !events.errors.is_empty()
    }
}
