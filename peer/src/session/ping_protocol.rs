use std::time::Instant;

use log::warn;

use lobbylink_shared::{PeerId, PingPayload, RemoteIdentity};

use crate::{transport::ReceivedMessage, GroupPeer, ProtocolError};

impl GroupPeer {
    /// Handles one message received on the control channel.
    ///
    /// A request is answered with our own `{peer id, identity}`. A reply binds
    /// the announced peer id to the announcing identity.
    pub(crate) fn process_ping(&mut self, message: ReceivedMessage, now: Instant) {
        let sender = message.sender;
        if let Some(connection) = self.registry.lookup_by_identity_mut(&sender) {
            connection.mark_activity(now);
        }

        let payload = match PingPayload::from_bytes(&message.payload) {
            Ok(payload) => payload,
            Err(error) => {
                warn!("discarding control packet from {}: {}", sender, error);
                self.incoming_events
                    .push_error(ProtocolError::Ping { sender, error });
                return;
            }
        };

        match payload.peer_id {
            None => self.answer_ping(sender),
            Some(peer_id) => self.accept_ping_reply(payload.identity, peer_id),
        }
    }

    fn answer_ping(&mut self, sender: RemoteIdentity) {
        let Some(local_peer_id) = self.local_peer_id else {
            return;
        };
        let Some(connection) = self.registry.lookup_by_identity_mut(&sender) else {
            warn!("ping request from {}, which has no connection", sender);
            self.incoming_events
                .push_error(ProtocolError::UnknownSender { sender });
            return;
        };

        let reply = PingPayload::reply(local_peer_id, self.local_identity);
        if let Err(error) = connection.ping(&reply, self.transport.as_mut(), self.send_flags) {
            self.incoming_events.push_error(error);
        }
    }

    fn accept_ping_reply(&mut self, identity: RemoteIdentity, peer_id: PeerId) {
        if let Err(error) = self.registry.bind_peer_id(
            &identity,
            peer_id,
            self.local_peer_id,
            &mut self.incoming_events,
        ) {
            self.incoming_events.push_error(error);
        }
    }
}
