// Channel layout

/// Internal channel reserved for identity-announcement records. Never carries
/// application data.
pub const PING_CHANNEL: u32 = 0;

/// Application channel `n` travels on internal channel `n + CHANNEL_OFFSET`,
/// keeping public channel 0 above the reserved control channel.
pub const CHANNEL_OFFSET: u32 = PING_CHANNEL + 1;

// Ping record

/// Encoded size of a [`PingPayload`](crate::PingPayload): an `i32` peer id
/// followed by a `u64` identity, little endian.
pub const PING_PAYLOAD_SIZE: usize = 4 + 8;

/// Wire value of a peer id that has not been assigned yet. A ping record
/// carrying it is an identity-announcement request.
pub const UNASSIGNED_PEER_ID: i32 = -1;

// Packet size

/// Largest message the underlying transport accepts by default (512 KiB).
pub const DEFAULT_MAX_PACKET_SIZE: usize = 512 * 1024;
