use crate::{
    constants::{PING_PAYLOAD_SIZE, UNASSIGNED_PEER_ID},
    error::PingError,
    types::{PeerId, RemoteIdentity},
};

/// Identity-announcement record exchanged on the control channel.
///
/// A record without a peer id is a request: the receiver answers with its own
/// `{peer id, identity}`. A record with a peer id is that answer.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PingPayload {
    pub peer_id: Option<PeerId>,
    pub identity: RemoteIdentity,
}

impl PingPayload {
    pub fn request(identity: RemoteIdentity) -> Self {
        Self {
            peer_id: None,
            identity,
        }
    }

    pub fn reply(peer_id: PeerId, identity: RemoteIdentity) -> Self {
        Self {
            peer_id: Some(peer_id),
            identity,
        }
    }

    pub fn is_request(&self) -> bool {
        self.peer_id.is_none()
    }

    pub fn to_bytes(&self) -> [u8; PING_PAYLOAD_SIZE] {
        let raw_peer_id = match self.peer_id {
            Some(peer_id) => peer_id.get(),
            None => UNASSIGNED_PEER_ID,
        };

        let mut bytes = [0u8; PING_PAYLOAD_SIZE];
        bytes[..4].copy_from_slice(&raw_peer_id.to_le_bytes());
        bytes[4..].copy_from_slice(&self.identity.to_u64().to_le_bytes());
        bytes
    }

    /// Decodes a record received from the network.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, PingError> {
        let Ok(bytes) = <[u8; PING_PAYLOAD_SIZE]>::try_from(bytes) else {
            return Err(PingError::WrongSize {
                size: bytes.len(),
                expected: PING_PAYLOAD_SIZE,
            });
        };

        let mut raw_peer_id = [0u8; 4];
        raw_peer_id.copy_from_slice(&bytes[..4]);
        let raw_peer_id = i32::from_le_bytes(raw_peer_id);

        let mut raw_identity = [0u8; 8];
        raw_identity.copy_from_slice(&bytes[4..]);
        let identity = RemoteIdentity::new(u64::from_le_bytes(raw_identity));

        let peer_id = if raw_peer_id == UNASSIGNED_PEER_ID {
            None
        } else {
            match PeerId::new(raw_peer_id) {
                Some(peer_id) => Some(peer_id),
                None => return Err(PingError::InvalidPeerId { value: raw_peer_id }),
            }
        };

        Ok(Self { peer_id, identity })
    }
}
