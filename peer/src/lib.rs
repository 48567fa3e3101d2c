//! # Lobbylink
//! A peer-to-peer transport that presents numbered peers, multiple channels
//! and reliable/unreliable delivery on top of an identity-addressed messaging
//! service, using a group-membership (lobby) service to discover who is in
//! the session.

#![deny(
    trivial_casts,
    trivial_numeric_casts,
    unstable_features,
    unused_import_braces
)]

pub mod connection;
pub mod group;
pub mod registry;
pub mod transport;

mod error;
mod events;
mod session;

pub use lobbylink_shared::{
    Delivery, GroupId, Packet, PacketError, PeerId, PingError, PingPayload, RemoteIdentity,
    SendFlags, TransferMode, CHANNEL_OFFSET, DEFAULT_MAX_PACKET_SIZE, PING_CHANNEL,
    PING_PAYLOAD_SIZE, UNASSIGNED_PEER_ID,
};

pub use connection::{
    inbound_queue::{InboundPacket, InboundQueue},
    peer_connection::{ConnectionSnapshot, PeerConnection},
    retry_queue::{FlushStats, RetryQueue},
};
pub use error::{ConnectionError, PeerError, ProtocolError, RegistryError, SessionError};
pub use events::{
    ConnectEvent, DisconnectEvent, ErrorEvent, GroupCreatedEvent, GroupJoinedEvent,
    GroupMessageEvent, PeerEvent, PeerEvents,
};
pub use group::{
    EnterResponse, GroupCreateFailure, GroupEvent, GroupEventSender, GroupService,
    GroupServiceError, GroupVisibility, MemberChange,
};
pub use registry::{BindOutcome, IdentityRegistry};
pub use session::{
    ConnectionStatus, GroupPeer, PeerConfig, SessionSnapshot, SessionState, Target,
};
pub use transport::{
    ConnectionState, MessageTransport, ReceivedMessage, SendError, SessionStatus,
};
