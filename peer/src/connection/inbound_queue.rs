use std::collections::VecDeque;

use lobbylink_shared::{Packet, PeerId, RemoteIdentity, TransferMode};

/// A received application packet, as handed to the caller
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct InboundPacket {
    pub payload: Box<[u8]>,
    pub sender: RemoteIdentity,
    /// Peer id of the sender at the time the packet was taken, if negotiated
    pub peer_id: Option<PeerId>,
    /// Public (application) channel
    pub channel: u32,
    pub transfer_mode: TransferMode,
}

/// FIFO of received application packets waiting for the caller
#[derive(Debug, Default)]
pub struct InboundQueue {
    packets: VecDeque<Packet>,
}

impl InboundQueue {
    pub fn new() -> Self {
        Self {
            packets: VecDeque::new(),
        }
    }

    pub fn push(&mut self, packet: Packet) {
        self.packets.push_back(packet);
    }

    pub fn front(&self) -> Option<&Packet> {
        self.packets.front()
    }

    pub fn pop(&mut self) -> Option<Packet> {
        self.packets.pop_front()
    }

    pub fn len(&self) -> usize {
        self.packets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.packets.is_empty()
    }

    pub fn clear(&mut self) {
        self.packets.clear();
    }
}
