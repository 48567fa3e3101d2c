pub mod inbound_queue;
pub mod peer_connection;
pub mod retry_queue;
