use thiserror::Error;

/// Errors that can occur while building a packet
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PacketError {
    /// Payload does not fit into a single transport message
    #[error("Payload of {size} bytes exceeds the maximum message size of {max} bytes")]
    PayloadTooLarge {
        size: usize,
        max: usize,
    },
}

/// Errors that can occur while decoding a ping record from the control channel
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PingError {
    /// Control-channel payload is not a ping record
    #[error("Control payload of {size} bytes does not match the ping record size of {expected} bytes")]
    WrongSize {
        size: usize,
        expected: usize,
    },

    /// Ping record carries a peer id that is neither unassigned nor valid
    #[error("Ping record carries invalid peer id {value}. Peer ids must be positive, or -1 when unassigned")]
    InvalidPeerId {
        value: i32,
    },
}
