use thiserror::Error;

use lobbylink_shared::{GroupId, PacketError, PeerId, PingError, RemoteIdentity};

use crate::{
    group::{EnterResponse, GroupCreateFailure, GroupServiceError},
    session::SessionState,
};

/// Errors that can occur when handing a packet to a peer connection
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConnectionError {
    /// Control-channel packet does not carry exactly one ping record
    #[error("Control-channel packet of {size} bytes rejected: ping records are exactly {expected} bytes")]
    MalformedControlPayload {
        size: usize,
        expected: usize,
    },
}

/// Errors that can occur during identity registry operations
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegistryError {
    /// A connection for this identity is already registered
    #[error("A connection to identity {identity} already exists")]
    AlreadyExists {
        identity: RemoteIdentity,
    },

    /// No connection is registered for this identity
    #[error("No connection to identity {identity} is registered")]
    UnknownIdentity {
        identity: RemoteIdentity,
    },

    /// Identity announced a peer id different from the one it already holds
    #[error("Identity {identity} already holds peer id {current}; ignoring announcement of peer id {requested}")]
    PeerIdMismatch {
        identity: RemoteIdentity,
        current: PeerId,
        requested: PeerId,
    },

    /// Identity announced a peer id that is already in use in this session
    #[error("Identity {identity} announced peer id {peer_id}, which is already held by {holder}")]
    PeerIdCollision {
        identity: RemoteIdentity,
        peer_id: PeerId,
        holder: RemoteIdentity,
    },

    /// Identity announced the peer id the local peer is using
    #[error("Identity {identity} announced peer id {peer_id}, which is the local peer's own id")]
    LocalPeerIdCollision {
        identity: RemoteIdentity,
        peer_id: PeerId,
    },
}

/// Protocol inconsistencies reported by remote peers. Never fatal to the session.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProtocolError {
    /// Malformed ping record on the control channel
    #[error("Malformed ping record from {sender}: {error}")]
    Ping {
        sender: RemoteIdentity,
        error: PingError,
    },

    /// Peer id binding or membership bookkeeping was inconsistent
    #[error("Registry inconsistency: {0}")]
    Registry(#[from] RegistryError),

    /// Ping request received from an identity without a connection
    #[error("Ping request from {sender}, which has no connection in this session")]
    UnknownSender {
        sender: RemoteIdentity,
    },
}

/// Errors that can occur while creating, joining or running a group session
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SessionError {
    /// Group create/join requested while another session is in progress
    #[error("Cannot create or join a group while in state {state:?}. Close the current session first")]
    AlreadyInSession {
        state: SessionState,
    },

    /// Operation needs a tracked group
    #[error("Not in a group. Create or join a group first")]
    NotInGroup,

    /// The group-membership service could not create the group
    #[error("Group creation failed: {reason}. Call create_group again to retry")]
    CreateFailed {
        reason: GroupCreateFailure,
    },

    /// The group-membership service refused to let us enter the group
    #[error("Joining group {group_id} failed: {response:?}. Call join_group again to retry")]
    JoinFailed {
        group_id: GroupId,
        response: EnterResponse,
    },

    /// The group-membership service refused the request outright
    #[error("Group service error: {0}")]
    GroupService(#[from] GroupServiceError),

    /// A transport session was requested by an identity outside the group
    #[error("Session requested by {identity}, which is not a member of the current group")]
    SessionRequestFromNonMember {
        identity: RemoteIdentity,
    },

    /// The transport reported that a session failed
    #[error("Transport session with {identity} failed (reason code {reason})")]
    SessionFailed {
        identity: RemoteIdentity,
        reason: u32,
    },
}

/// Top-level error type of the lobbylink peer
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PeerError {
    /// No group session is active
    #[error("The peer is not in an active group session")]
    NotActive,

    /// The inbound queue is empty
    #[error("No incoming packets available")]
    NoPacketAvailable,

    /// No established connection carries this peer id
    #[error("No connected peer with id {peer_id}")]
    UnknownPeer {
        peer_id: PeerId,
    },

    /// Application channel outside the configured range
    #[error("Channel {channel} is out of range: {channels} application channels are configured")]
    InvalidChannel {
        channel: u32,
        channels: u32,
    },

    #[error("Packet error: {0}")]
    Packet(#[from] PacketError),

    #[error("Connection error: {0}")]
    Connection(#[from] ConnectionError),

    #[error("Protocol error: {0}")]
    Protocol(#[from] ProtocolError),

    #[error("Session error: {0}")]
    Session(#[from] SessionError),
}

impl From<RegistryError> for PeerError {
    fn from(error: RegistryError) -> Self {
        PeerError::Protocol(ProtocolError::Registry(error))
    }
}
