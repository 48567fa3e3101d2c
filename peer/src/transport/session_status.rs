/// Lifecycle of a transport session, as reported by the transport
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum ConnectionState {
    #[default]
    None,
    Connecting,
    FindingRoute,
    Connected,
    ClosedByPeer,
    ProblemDetectedLocally,
}

/// Real-time statistics of one transport session. Purely observational.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct SessionStatus {
    pub state: ConnectionState,
    /// Estimated round-trip time in milliseconds
    pub ping_ms: u32,
    /// Fraction of packets delivered end to end, measured locally (0..1)
    pub quality_local: f32,
    /// Same, as measured by the remote end
    pub quality_remote: f32,
    pub out_packets_per_sec: f32,
    pub out_bytes_per_sec: f32,
    pub in_packets_per_sec: f32,
    pub in_bytes_per_sec: f32,
    pub send_rate_bytes_per_sec: u32,
    pub pending_unreliable_bytes: u32,
    pub pending_reliable_bytes: u32,
    pub sent_unacked_reliable_bytes: u32,
    /// Time a message would spend queued before going out, in microseconds
    pub queue_time_usec: u64,
}
