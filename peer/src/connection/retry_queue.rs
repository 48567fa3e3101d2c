use std::collections::{vec_deque::Iter, VecDeque};

use log::warn;

use lobbylink_shared::{Packet, RemoteIdentity, SendFlags, PING_PAYLOAD_SIZE};

use crate::transport::MessageTransport;

/// Outcome of one [`RetryQueue::flush`] pass
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct FlushStats {
    /// Packets handed to the transport successfully
    pub sent: usize,
    /// Unreliable or malformed packets discarded after failing
    pub dropped: usize,
    /// Packets still queued behind a reliable packet that could not be sent
    pub remaining: usize,
}

impl FlushStats {
    /// Whether a reliable packet is holding back the queue
    pub fn is_blocked(&self) -> bool {
        self.remaining > 0
    }
}

/// Ordered buffer of outbound packets that have not been accepted by the
/// transport yet.
///
/// Packets go out strictly in insertion order. A reliable packet the
/// transport refuses stays at the head and blocks everything behind it until
/// a later flush succeeds. An unreliable packet the transport refuses is
/// dropped on the spot.
#[derive(Debug, Default)]
pub struct RetryQueue {
    packets: VecDeque<Packet>,
}

impl RetryQueue {
    pub fn new() -> Self {
        Self {
            packets: VecDeque::new(),
        }
    }

    /// Appends a packet to the tail
    pub fn enqueue(&mut self, packet: Packet) {
        self.packets.push_back(packet);
    }

    /// Sends from the head until the queue is empty or a reliable packet
    /// fails. Safe to call any number of times.
    pub fn flush(
        &mut self,
        identity: &RemoteIdentity,
        transport: &mut dyn MessageTransport,
        flags: SendFlags,
    ) -> FlushStats {
        let mut stats = FlushStats::default();

        while let Some(packet) = self.packets.front() {
            if !packet.is_well_formed() {
                warn!(
                    "Send Error! Control packet of {} bytes to {} is not a {} byte ping record, discarding",
                    packet.len(),
                    identity,
                    PING_PAYLOAD_SIZE
                );
                self.packets.pop_front();
                stats.dropped += 1;
                continue;
            }

            let result = transport.send_to_identity(
                identity,
                packet.payload(),
                packet.delivery(),
                flags,
                packet.channel(),
            );

            match result {
                Ok(()) => {
                    self.packets.pop_front();
                    stats.sent += 1;
                }
                Err(_) if packet.transfer_mode().is_reliable() => {
                    warn!(
                        "Send Error to {} on channel {} (reliable: will retry)",
                        identity,
                        packet.channel()
                    );
                    break;
                }
                Err(_) => {
                    warn!(
                        "Send Error to {} on channel {} (unreliable: won't retry)",
                        identity,
                        packet.channel()
                    );
                    self.packets.pop_front();
                    stats.dropped += 1;
                }
            }
        }

        stats.remaining = self.packets.len();
        stats
    }

    pub fn len(&self) -> usize {
        self.packets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.packets.is_empty()
    }

    pub fn iter(&self) -> Iter<'_, Packet> {
        self.packets.iter()
    }

    /// Discards every queued packet without sending it
    pub fn clear(&mut self) {
        self.packets.clear();
    }
}
