use crate::{
    constants::{PING_CHANNEL, PING_PAYLOAD_SIZE},
    error::PacketError,
    ping::PingPayload,
    types::RemoteIdentity,
};

/// Delivery guarantee requested by the application for a packet
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum TransferMode {
    Reliable,
    Unreliable,
    /// Accepted for API compatibility. The transport has no unreliable-ordered
    /// mode, so these packets are delivered reliably (see [`TransferMode::delivery`]).
    UnreliableOrdered,
}

impl TransferMode {
    /// Resolves the mode the transport will actually be asked for.
    ///
    /// `UnreliableOrdered` resolves to `Delivery::Reliable`: ordering is kept
    /// and nothing is dropped, at the cost of retries.
    pub fn delivery(&self) -> Delivery {
        match self {
            TransferMode::Reliable | TransferMode::UnreliableOrdered => Delivery::Reliable,
            TransferMode::Unreliable => Delivery::Unreliable,
        }
    }

    pub fn is_reliable(&self) -> bool {
        self.delivery() == Delivery::Reliable
    }
}

impl From<Delivery> for TransferMode {
    fn from(delivery: Delivery) -> Self {
        match delivery {
            Delivery::Reliable => TransferMode::Reliable,
            Delivery::Unreliable => TransferMode::Unreliable,
        }
    }
}

/// Delivery mode understood by the raw messaging transport
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Delivery {
    Reliable,
    Unreliable,
}

/// Per-send hints forwarded untouched to the raw messaging transport
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct SendFlags {
    /// Send immediately instead of coalescing small messages
    pub no_nagle: bool,
    /// Drop rather than queue when the transport is not ready to send
    pub no_delay: bool,
}

/// A single message travelling between the application and the transport
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Packet {
    payload: Box<[u8]>,
    channel: u32,
    transfer_mode: TransferMode,
    sender: Option<RemoteIdentity>,
}

impl Packet {
    /// Builds an outbound packet, rejecting payloads larger than `max_size`
    pub fn new(
        payload: &[u8],
        transfer_mode: TransferMode,
        channel: u32,
        max_size: usize,
    ) -> Result<Self, PacketError> {
        if payload.len() > max_size {
            return Err(PacketError::PayloadTooLarge {
                size: payload.len(),
                max: max_size,
            });
        }
        Ok(Self {
            payload: payload.into(),
            channel,
            transfer_mode,
            sender: None,
        })
    }

    /// Builds the reliable control-channel packet carrying one ping record
    pub fn ping(payload: &PingPayload) -> Self {
        Self {
            payload: Box::new(payload.to_bytes()),
            channel: PING_CHANNEL,
            transfer_mode: TransferMode::Reliable,
            sender: None,
        }
    }

    /// Builds a packet that arrived from `sender`
    pub fn received(
        payload: Box<[u8]>,
        sender: RemoteIdentity,
        channel: u32,
        delivery: Delivery,
    ) -> Self {
        Self {
            payload,
            channel,
            transfer_mode: delivery.into(),
            sender: Some(sender),
        }
    }

    pub fn payload(&self) -> &[u8] {
        &self.payload
    }

    pub fn into_payload(self) -> Box<[u8]> {
        self.payload
    }

    pub fn len(&self) -> usize {
        self.payload.len()
    }

    pub fn is_empty(&self) -> bool {
        self.payload.is_empty()
    }

    pub fn channel(&self) -> u32 {
        self.channel
    }

    pub fn transfer_mode(&self) -> TransferMode {
        self.transfer_mode
    }

    pub fn delivery(&self) -> Delivery {
        self.transfer_mode.delivery()
    }

    pub fn sender(&self) -> Option<RemoteIdentity> {
        self.sender
    }

    /// Whether this packet travels on the reserved control channel
    pub fn is_control(&self) -> bool {
        self.channel == PING_CHANNEL
    }

    /// A control packet must carry exactly one ping record. Application
    /// packets are always well formed.
    pub fn is_well_formed(&self) -> bool {
        !self.is_control() || self.payload.len() == PING_PAYLOAD_SIZE
    }
}
