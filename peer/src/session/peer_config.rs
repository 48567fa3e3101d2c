use std::{default::Default, time::Duration};

use lobbylink_shared::{SendFlags, DEFAULT_MAX_PACKET_SIZE};

/// Contains Config properties which will be used by a [`GroupPeer`]
///
/// [`GroupPeer`]: crate::GroupPeer
#[derive(Clone, Debug)]
pub struct PeerConfig {
    /// Largest application payload accepted by `put_packet`, in bytes
    pub max_packet_size: usize,
    /// How long a connection may stay silent before it is pinged again
    pub staleness_threshold: Duration,
    /// Upper bound on messages taken from the transport per channel per poll
    pub receive_batch_size: usize,
    /// Number of application channels, numbered from 0
    pub application_channels: u32,
    /// Hints forwarded to every raw send
    pub send_flags: SendFlags,
    /// Whether the host may relay traffic between clients
    pub relay_supported: bool,
    /// Seed for local peer id generation. `None` seeds from entropy.
    pub peer_id_seed: Option<u64>,
}

impl Default for PeerConfig {
    fn default() -> Self {
        Self {
            max_packet_size: DEFAULT_MAX_PACKET_SIZE,
            staleness_threshold: Duration::from_millis(1000),
            receive_batch_size: 255,
            application_channels: 8,
            send_flags: SendFlags::default(),
            relay_supported: false,
            peer_id_seed: None,
        }
    }
}
