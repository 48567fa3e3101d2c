mod group_peer;
mod peer_config;
mod ping_protocol;
mod session_state;
mod snapshot;

pub use group_peer::{GroupPeer, Target};
pub use peer_config::PeerConfig;
pub use session_state::{ConnectionStatus, SessionState};
pub use snapshot::SessionSnapshot;
