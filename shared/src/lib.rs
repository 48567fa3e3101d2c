//! # Lobbylink Shared
//! Wire-level types shared between the lobbylink core and the adapters that
//! plug it into a concrete messaging transport or group-membership service.

#![deny(trivial_numeric_casts, unstable_features, unused_import_braces)]

mod constants;
mod error;
mod packet;
mod ping;
mod types;

pub use constants::{
    CHANNEL_OFFSET, DEFAULT_MAX_PACKET_SIZE, PING_CHANNEL, PING_PAYLOAD_SIZE, UNASSIGNED_PEER_ID,
};
pub use error::{PacketError, PingError};
pub use packet::{Delivery, Packet, SendFlags, TransferMode};
pub use ping::PingPayload;
pub use types::{GroupId, PeerId, RemoteIdentity};
