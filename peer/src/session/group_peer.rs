use std::{mem, time::Instant};

use log::{debug, info, warn};

use lobbylink_shared::{
    GroupId, Packet, PeerId, PingPayload, RemoteIdentity, SendFlags, TransferMode,
    CHANNEL_OFFSET, PING_CHANNEL,
};

use crate::{
    connection::{
        inbound_queue::{InboundPacket, InboundQueue},
        peer_connection::ConnectionSnapshot,
    },
    events::PeerEvents,
    group::{
        group_event_channel, EnterResponse, GroupCreateFailure, GroupEvent, GroupEventReceiver,
        GroupEventSender, GroupService, GroupVisibility, MemberChange,
    },
    registry::IdentityRegistry,
    transport::MessageTransport,
    ConnectionStatus, PeerConfig, PeerError, SessionError, SessionSnapshot, SessionState,
};

/// Addressee of an outgoing application packet
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Target {
    /// Every peer that finished the id handshake
    Broadcast,
    Peer(PeerId),
    /// Every established peer but one
    AllExcept(PeerId),
}

/// A peer in a group session. Presents numbered peers, channels and
/// reliable/unreliable delivery on top of an identity-addressed messaging
/// transport and a group-membership service.
///
/// Nothing happens in the background: the application must call
/// [`poll`](Self::poll) regularly.
pub struct GroupPeer {
    // Config
    config: PeerConfig,
    pub(super) send_flags: SendFlags,
    // Collaborators
    pub(super) transport: Box<dyn MessageTransport>,
    group_service: Box<dyn GroupService>,
    // Session
    state: SessionState,
    group_id: Option<GroupId>,
    owner: Option<RemoteIdentity>,
    pub(super) local_identity: RemoteIdentity,
    pub(super) local_peer_id: Option<PeerId>,
    rng: fastrand::Rng,
    // Connections
    pub(super) registry: IdentityRegistry,
    inbound: InboundQueue,
    // Events
    group_event_sender: GroupEventSender,
    group_event_receiver: GroupEventReceiver,
    pub(super) incoming_events: PeerEvents,
}

impl GroupPeer {
    /// Create a new GroupPeer
    pub fn new(
        config: PeerConfig,
        transport: Box<dyn MessageTransport>,
        group_service: Box<dyn GroupService>,
    ) -> Self {
        let local_identity = transport.local_identity();
        let rng = match config.peer_id_seed {
            Some(seed) => fastrand::Rng::with_seed(seed),
            None => fastrand::Rng::new(),
        };
        let (group_event_sender, group_event_receiver) = group_event_channel();

        Self {
            send_flags: config.send_flags,
            config,
            // Collaborators
            transport,
            group_service,
            // Session
            state: SessionState::NotConnected,
            group_id: None,
            owner: None,
            local_identity,
            local_peer_id: None,
            rng,
            // Connections
            registry: IdentityRegistry::new(),
            inbound: InboundQueue::new(),
            // Events
            group_event_sender,
            group_event_receiver,
            incoming_events: PeerEvents::new(),
        }
    }

    /// Handle through which the host delivers group-service notifications.
    /// Notifications are only acted upon inside [`poll`](Self::poll).
    pub fn event_sender(&self) -> GroupEventSender {
        self.group_event_sender.clone()
    }

    // Session lifecycle

    /// Asks the group service for a new group, hosted by us
    pub fn create_group(
        &mut self,
        visibility: GroupVisibility,
        max_members: u32,
    ) -> Result<(), PeerError> {
        if self.state != SessionState::NotConnected {
            return Err(SessionError::AlreadyInSession { state: self.state }.into());
        }

        self.group_service
            .create_group(visibility, max_members)
            .map_err(SessionError::from)?;

        info!(
            "creating {:?} group for up to {} members",
            visibility, max_members
        );
        self.state = SessionState::HostPending;
        self.local_peer_id = Some(PeerId::HOST);

        Ok(())
    }

    /// Asks the group service to let us into `group_id`
    pub fn join_group(&mut self, group_id: GroupId) -> Result<(), PeerError> {
        if self.state != SessionState::NotConnected {
            return Err(SessionError::AlreadyInSession { state: self.state }.into());
        }

        self.group_service
            .join_group(group_id)
            .map_err(SessionError::from)?;

        let local_peer_id = self.generate_peer_id();
        info!("joining group {} as peer {}", group_id, local_peer_id);
        self.state = SessionState::ClientPending;
        self.group_id = Some(group_id);
        self.local_peer_id = Some(local_peer_id);

        Ok(())
    }

    /// Leaves the group and tears down every connection. Queued packets are
    /// discarded unsent. Does nothing when not in a session.
    pub fn close(&mut self) {
        if self.state == SessionState::NotConnected {
            return;
        }

        if let Some(group_id) = self.group_id {
            self.group_service.leave_group(group_id);
        }
        info!("closing session ({:?})", self.state);
        self.reset_session();
    }

    fn reset_session(&mut self) {
        self.registry.clear(self.transport.as_mut());
        self.inbound.clear();

        self.state = SessionState::NotConnected;
        self.group_id = None;
        self.owner = None;
        self.local_peer_id = None;
    }

    fn generate_peer_id(&mut self) -> PeerId {
        // 1 belongs to the host
        loop {
            if let Some(peer_id) = PeerId::new(self.rng.i32(2..=i32::MAX)) {
                return peer_id;
            }
        }
    }

    // Polling

    /// Must be called regularly. Runs the session state machine, receives
    /// packets, keeps connections alive and returns what happened since the
    /// previous call.
    pub fn poll(&mut self) -> PeerEvents {
        self.poll_at(Instant::now())
    }

    /// [`poll`](Self::poll) with an explicit clock
    pub fn poll_at(&mut self, now: Instant) -> PeerEvents {
        for event in self.group_event_receiver.drain() {
            self.process_group_event(event, now);
        }

        if self.state != SessionState::NotConnected {
            self.receive_application_packets(now);
            self.maintain_connections(now);
            self.receive_control_packets(now);
        }

        mem::replace(&mut self.incoming_events, PeerEvents::new())
    }

    fn receive_application_packets(&mut self, now: Instant) {
        for channel in 0..self.config.application_channels {
            let messages = self
                .transport
                .receive_batch(channel + CHANNEL_OFFSET, self.config.receive_batch_size);

            for message in messages {
                let Some(connection) = self.registry.lookup_by_identity_mut(&message.sender)
                else {
                    debug!(
                        "dropping packet on channel {} from {}, which has no connection",
                        channel, message.sender
                    );
                    continue;
                };
                connection.mark_activity(now);

                self.inbound.push(Packet::received(
                    message.payload,
                    message.sender,
                    channel,
                    message.delivery,
                ));
            }
        }
    }

    fn maintain_connections(&mut self, now: Instant) {
        let request = PingPayload::request(self.local_identity);
        let threshold = self.config.staleness_threshold;

        for connection in self.registry.iter_mut() {
            match connection.ping_if_stale(
                now,
                threshold,
                &request,
                self.transport.as_mut(),
                self.send_flags,
            ) {
                Ok(true) => {}
                Ok(false) => {
                    connection.flush(self.transport.as_mut(), self.send_flags);
                }
                Err(error) => self.incoming_events.push_error(error),
            }
        }
    }

    fn receive_control_packets(&mut self, now: Instant) {
        let messages = self
            .transport
            .receive_batch(PING_CHANNEL, self.config.receive_batch_size);

        for message in messages {
            self.process_ping(message, now);
        }
    }

    // Group events

    fn process_group_event(&mut self, event: GroupEvent, now: Instant) {
        match event {
            GroupEvent::Created(result) => self.on_group_created(result),
            GroupEvent::Entered { group_id, response } => {
                self.on_group_entered(group_id, response, now)
            }
            GroupEvent::MemberChanged {
                group_id,
                identity,
                change,
            } => {
                if !self.is_tracked_group(group_id) {
                    debug!("ignoring membership change in group {}", group_id);
                    return;
                }
                if identity == self.local_identity {
                    return;
                }
                match change {
                    MemberChange::Entered => self.member_entered(identity, now),
                    change if change.is_departure() => self.member_left(identity),
                    _ => {}
                }
            }
            GroupEvent::SessionRequest { identity } => self.on_session_request(identity),
            GroupEvent::SessionFailed { identity, reason } => {
                warn!(
                    "transport session with {} failed (reason code {})",
                    identity, reason
                );
                self.incoming_events
                    .push_error(SessionError::SessionFailed { identity, reason });
            }
            GroupEvent::Message {
                group_id,
                sender,
                payload,
            } => {
                if !self.is_tracked_group(group_id) || sender == self.local_identity {
                    return;
                }
                self.incoming_events.push_group_message(sender, payload);
            }
        }
    }

    fn on_group_created(&mut self, result: Result<GroupId, GroupCreateFailure>) {
        if self.state != SessionState::HostPending {
            // Closed before the confirmation arrived
            if let Ok(group_id) = result {
                info!("leaving group {}, created after the session closed", group_id);
                self.group_service.leave_group(group_id);
            }
            return;
        }

        match result {
            Ok(group_id) => {
                info!("hosting group {}", group_id);
                self.state = SessionState::Hosting;
                self.group_id = Some(group_id);
                self.owner = Some(self.local_identity);
                self.incoming_events.push_group_created(group_id);
            }
            Err(reason) => {
                warn!("group creation failed: {}", reason);
                self.reset_session();
                self.incoming_events
                    .push_error(SessionError::CreateFailed { reason });
            }
        }
    }

    fn on_group_entered(&mut self, group_id: GroupId, response: EnterResponse, now: Instant) {
        if self.group_id != Some(group_id) {
            debug!("ignoring enter confirmation for group {}", group_id);
            return;
        }

        match self.state {
            SessionState::Hosting => {
                if response.is_success() {
                    self.owner = self.group_service.owner(group_id);
                }
            }
            SessionState::ClientPending => {
                if !response.is_success() {
                    warn!("joining group {} failed: {:?}", group_id, response);
                    self.reset_session();
                    self.incoming_events
                        .push_error(SessionError::JoinFailed { group_id, response });
                    return;
                }

                let owner = self.group_service.owner(group_id);
                info!("joined group {}", group_id);
                self.state = SessionState::Client;
                self.owner = owner;
                self.incoming_events.push_group_joined(group_id);

                // The owner is connected before anyone else
                if let Some(owner) = owner {
                    if owner != self.local_identity {
                        self.member_entered(owner, now);
                    }
                }
                for member in self.group_service.members(group_id) {
                    if member == self.local_identity || Some(member) == owner {
                        continue;
                    }
                    self.member_entered(member, now);
                }
            }
            state => debug!(
                "ignoring enter confirmation for group {} in state {:?}",
                group_id, state
            ),
        }
    }

    fn on_session_request(&mut self, identity: RemoteIdentity) {
        let Some(group_id) = self.group_id.filter(|_| self.state != SessionState::NotConnected)
        else {
            info!("ignoring session request from {} outside a session", identity);
            return;
        };
        if self.state.is_pending() {
            debug!(
                "session request from {} while {:?}, checking membership anyway",
                identity, self.state
            );
        }

        if !self.group_service.members(group_id).contains(&identity) {
            warn!(
                "refusing session request from {}, which is not in group {}",
                identity, group_id
            );
            self.incoming_events
                .push_error(SessionError::SessionRequestFromNonMember { identity });
            return;
        }

        if !self.transport.accept_session(&identity) {
            warn!("transport could not accept session with {}", identity);
        }
    }

    fn member_entered(&mut self, identity: RemoteIdentity, now: Instant) {
        let request = PingPayload::request(self.local_identity);
        match self.registry.register(identity, now) {
            Ok(connection) => {
                if let Err(error) =
                    connection.ping(&request, self.transport.as_mut(), self.send_flags)
                {
                    self.incoming_events.push_error(error);
                }
            }
            Err(error) => {
                warn!("{}", error);
                self.incoming_events.push_error(error);
            }
        }
    }

    fn member_left(&mut self, identity: RemoteIdentity) {
        if let Err(error) = self.registry.unregister(
            &identity,
            self.transport.as_mut(),
            &mut self.incoming_events,
        ) {
            warn!("{}", error);
            self.incoming_events.push_error(error);
        }
    }

    fn is_tracked_group(&self, group_id: GroupId) -> bool {
        self.state.is_active() && self.group_id == Some(group_id)
    }

    // Packets

    /// Queues `payload` for `target` on application channel `channel`
    pub fn put_packet(
        &mut self,
        payload: &[u8],
        target: Target,
        transfer_mode: TransferMode,
        channel: u32,
    ) -> Result<(), PeerError> {
        if !self.state.is_active() {
            return Err(PeerError::NotActive);
        }
        if channel >= self.config.application_channels {
            return Err(PeerError::InvalidChannel {
                channel,
                channels: self.config.application_channels,
            });
        }

        let packet = Packet::new(
            payload,
            transfer_mode,
            channel + CHANNEL_OFFSET,
            self.config.max_packet_size,
        )?;

        match target {
            Target::Peer(peer_id) => {
                let Some(connection) = self.registry.lookup_by_peer_id_mut(&peer_id) else {
                    return Err(PeerError::UnknownPeer { peer_id });
                };
                connection.send(packet, self.transport.as_mut(), self.send_flags)?;
            }
            Target::Broadcast | Target::AllExcept(_) => {
                let excluded = match target {
                    Target::AllExcept(peer_id) => Some(peer_id),
                    _ => None,
                };
                for connection in self.registry.iter_mut() {
                    let Some(peer_id) = connection.peer_id() else {
                        continue;
                    };
                    if Some(peer_id) == excluded {
                        continue;
                    }
                    connection.send(packet.clone(), self.transport.as_mut(), self.send_flags)?;
                }
            }
        }

        Ok(())
    }

    pub fn available_packet_count(&self) -> usize {
        self.inbound.len()
    }

    /// Takes the oldest received packet
    pub fn next_packet(&mut self) -> Result<InboundPacket, PeerError> {
        let packet = self.inbound.pop().ok_or(PeerError::NoPacketAvailable)?;
        Ok(self.to_inbound(packet))
    }

    /// The packet [`next_packet`](Self::next_packet) would return, left queued
    pub fn peek_packet(&self) -> Option<InboundPacket> {
        self.inbound
            .front()
            .map(|packet| self.to_inbound(packet.clone()))
    }

    fn to_inbound(&self, packet: Packet) -> InboundPacket {
        let sender = packet.sender().unwrap_or(RemoteIdentity::NIL);
        let peer_id = self
            .registry
            .lookup_by_identity(&sender)
            .and_then(|connection| connection.peer_id());
        let channel = packet.channel();
        let transfer_mode = packet.transfer_mode();

        InboundPacket {
            payload: packet.into_payload(),
            sender,
            peer_id,
            channel,
            transfer_mode,
        }
    }

    // Session info

    /// Our own peer id. Known as soon as a create or join was requested.
    pub fn unique_id(&self) -> Result<PeerId, PeerError> {
        self.local_peer_id.ok_or(PeerError::NotActive)
    }

    pub fn is_server(&self) -> bool {
        self.local_peer_id.is_some_and(|peer_id| peer_id.is_host())
    }

    pub fn connection_status(&self) -> ConnectionStatus {
        self.state.into()
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn group_id(&self) -> Option<GroupId> {
        self.group_id
    }

    pub fn owner(&self) -> Option<RemoteIdentity> {
        self.owner
    }

    pub fn local_identity(&self) -> RemoteIdentity {
        self.local_identity
    }

    pub fn max_packet_size(&self) -> usize {
        self.config.max_packet_size
    }

    pub fn is_server_relay_supported(&self) -> bool {
        self.config.relay_supported
    }

    pub fn send_flags(&self) -> SendFlags {
        self.send_flags
    }

    pub fn set_send_flags(&mut self, send_flags: SendFlags) {
        self.send_flags = send_flags;
    }

    // Peers

    /// Every negotiated `(peer id, identity)` pair, ordered by peer id
    pub fn peer_map(&self) -> Vec<(PeerId, RemoteIdentity)> {
        self.registry.peer_map()
    }

    pub fn peer_id_for_identity(&self, identity: &RemoteIdentity) -> Option<PeerId> {
        if *identity == self.local_identity {
            return self.local_peer_id;
        }
        self.registry
            .lookup_by_identity(identity)
            .and_then(|connection| connection.peer_id())
    }

    pub fn identity_for_peer(&self, peer_id: &PeerId) -> Option<RemoteIdentity> {
        if self.local_peer_id == Some(*peer_id) {
            return Some(self.local_identity);
        }
        self.registry
            .lookup_by_peer_id(peer_id)
            .map(|connection| connection.identity())
    }

    pub fn peer_info(&self, peer_id: &PeerId) -> Option<ConnectionSnapshot> {
        self.registry
            .lookup_by_peer_id(peer_id)
            .map(|connection| connection.snapshot(self.transport.as_ref()))
    }

    pub fn debug_snapshot(&self) -> SessionSnapshot {
        let mut connections: Vec<ConnectionSnapshot> = self
            .registry
            .iter()
            .map(|connection| connection.snapshot(self.transport.as_ref()))
            .collect();
        connections.sort_by_key(|connection| connection.identity);

        SessionSnapshot {
            state: self.state,
            group_id: self.group_id,
            owner: self.owner,
            local_identity: self.local_identity,
            local_peer_id: self.local_peer_id,
            send_flags: self.send_flags,
            inbound_packet_count: self.inbound.len(),
            connections,
        }
    }

    // Group metadata & chat

    fn tracked_group(&self) -> Result<GroupId, PeerError> {
        self.group_id
            .ok_or_else(|| SessionError::NotInGroup.into())
    }

    pub fn group_members(&self) -> Result<Vec<RemoteIdentity>, PeerError> {
        let group_id = self.tracked_group()?;
        Ok(self.group_service.members(group_id))
    }

    pub fn group_data(&self, key: &str) -> Result<Option<String>, PeerError> {
        let group_id = self.tracked_group()?;
        Ok(self.group_service.data(group_id, key))
    }

    pub fn set_group_data(&mut self, key: &str, value: &str) -> Result<bool, PeerError> {
        let group_id = self.tracked_group()?;
        Ok(self.group_service.set_data(group_id, key, value))
    }

    pub fn all_group_data(&self) -> Result<Vec<(String, String)>, PeerError> {
        let group_id = self.tracked_group()?;
        Ok(self.group_service.all_data(group_id))
    }

    pub fn set_group_joinable(&mut self, joinable: bool) -> Result<bool, PeerError> {
        let group_id = self.tracked_group()?;
        Ok(self.group_service.set_joinable(group_id, joinable))
    }

    /// Sends a chat message to every member through the group service
    pub fn send_group_message(&mut self, payload: &[u8]) -> Result<bool, PeerError> {
        let group_id = self.tracked_group()?;
        Ok(self.group_service.send_message(group_id, payload))
    }
}

impl Drop for GroupPeer {
    fn drop(&mut self) {
        self.close();
    }
}
