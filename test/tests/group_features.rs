/// Tests for group chat, group metadata and per-peer information
/// These go through the group-membership service rather than the transport

use std::time::Instant;

use lobbylink::{
    ConnectionState, EnterResponse, GroupVisibility, PeerConfig, PeerError, PeerId,
    RemoteIdentity, SendFlags, SessionError, SessionState, SessionStatus, Target, TransferMode,
};
use lobbylink_test::{
    assert_no_errors, assert_session_state, exchange_packets_n_times, inject_ping_reply,
    LocalSession, TestPeer,
};

const HOST: u64 = 0xA1;
const ALICE: u64 = 0xB2;
const REMOTE: RemoteIdentity = RemoteIdentity::new(0x7373);

fn connected_pair(session: &LocalSession) -> (TestPeer, TestPeer) {
    let mut host = session.peer(HOST);
    host.peer
        .create_group(GroupVisibility::Public, 8)
        .unwrap();
    host.poll();
    let group_id = host.peer.group_id().unwrap();

    let mut client = session.peer(ALICE);
    client.peer.join_group(group_id).unwrap();
    exchange_packets_n_times(&mut [&mut host, &mut client], Instant::now(), 4);

    host.clear_events();
    client.clear_events();
    (host, client)
}

// ========== Chat ==========

#[test]
fn group_message_reaches_other_members_only() {
    let session = LocalSession::new();
    let (mut host, mut client) = connected_pair(&session);

    let sent = host.peer.send_group_message(b"gl hf").unwrap();
    host.poll();
    client.poll();

    assert!(sent);
    assert!(host.group_messages.is_empty());
    assert_eq!(client.group_messages.len(), 1);
    let (sender, payload) = &client.group_messages[0];
    assert_eq!(*sender, host.identity);
    assert_eq!(&**payload, b"gl hf");
}

#[test]
fn group_message_without_group_is_refused() {
    let session = LocalSession::new();
    let mut peer = session.peer(HOST);

    let result = peer.peer.send_group_message(b"anyone?");

    assert_eq!(result, Err(PeerError::Session(SessionError::NotInGroup)));
}

// ========== Metadata ==========

#[test]
fn owner_sets_metadata_that_members_can_read() {
    let session = LocalSession::new();
    let (mut host, mut client) = connected_pair(&session);

    assert_eq!(host.peer.set_group_data("map", "dunes"), Ok(true));
    assert_eq!(host.peer.set_group_data("mode", "ctf"), Ok(true));

    assert_eq!(
        client.peer.group_data("map"),
        Ok(Some("dunes".to_string()))
    );
    assert_eq!(client.peer.group_data("missing"), Ok(None));
    assert_eq!(
        client.peer.all_group_data(),
        Ok(vec![
            ("map".to_string(), "dunes".to_string()),
            ("mode".to_string(), "ctf".to_string()),
        ])
    );

    // Only the owner may write
    assert_eq!(client.peer.set_group_data("map", "canyon"), Ok(false));
    assert_eq!(host.peer.group_data("map"), Ok(Some("dunes".to_string())));

    host.poll();
    client.poll();
    assert_no_errors!(host);
    assert_no_errors!(client);
}

#[test]
fn metadata_without_group_is_refused() {
    let session = LocalSession::new();
    let mut peer = session.peer(HOST);

    assert_eq!(
        peer.peer.group_data("map"),
        Err(PeerError::Session(SessionError::NotInGroup))
    );
    assert_eq!(
        peer.peer.set_group_data("map", "dunes"),
        Err(PeerError::Session(SessionError::NotInGroup))
    );
    assert_eq!(
        peer.peer.all_group_data(),
        Err(PeerError::Session(SessionError::NotInGroup))
    );
    assert_eq!(
        peer.peer.group_members(),
        Err(PeerError::Session(SessionError::NotInGroup))
    );
    assert_eq!(
        peer.peer.set_group_joinable(false),
        Err(PeerError::Session(SessionError::NotInGroup))
    );
}

#[test]
fn members_are_listed_by_the_service() {
    let session = LocalSession::new();
    let (host, client) = connected_pair(&session);

    let members = host.peer.group_members().unwrap();

    assert_eq!(members, vec![host.identity, client.identity]);
    assert_eq!(client.peer.owner(), Some(host.identity));
}

#[test]
fn closed_group_refuses_new_members() {
    let session = LocalSession::new();
    let mut host = session.peer(HOST);
    host.peer
        .create_group(GroupVisibility::FriendsOnly, 8)
        .unwrap();
    host.poll();
    let group_id = host.peer.group_id().unwrap();

    assert_eq!(host.peer.set_group_joinable(false), Ok(true));

    let mut client = session.peer(ALICE);
    client.peer.join_group(group_id).unwrap();
    client.poll();

    assert_eq!(
        client.errors,
        vec![PeerError::Session(SessionError::JoinFailed {
            group_id,
            response: EnterResponse::NotAllowed,
        })]
    );
    assert_session_state!(client, SessionState::NotConnected);
    assert_eq!(session.lobbies.members(group_id), vec![host.identity]);
}

// ========== Peer info ==========

#[test]
fn local_identity_and_id_are_resolvable() {
    let session = LocalSession::new();
    let (host, client) = connected_pair(&session);

    let client_id = client.unique_id();
    assert_eq!(
        client.peer.peer_id_for_identity(&client.identity),
        Some(client_id)
    );
    assert_eq!(client.peer.identity_for_peer(&client_id), Some(client.identity));
    assert_eq!(
        host.peer.peer_id_for_identity(&host.identity),
        Some(PeerId::HOST)
    );
    assert_eq!(host.peer.identity_for_peer(&client_id), Some(client.identity));
    assert_eq!(host.peer.peer_map(), vec![(client_id, client.identity)]);
    assert!(host.peer.is_server());
}

#[test]
fn peer_info_reports_transport_session_status() {
    let session = LocalSession::new();
    let mut host = session.peer(HOST);
    host.peer
        .create_group(GroupVisibility::Public, 8)
        .unwrap();
    host.poll();
    session
        .lobbies
        .enter(host.peer.group_id().unwrap(), REMOTE);
    host.poll();
    inject_ping_reply(&session.network, REMOTE, host.identity, 6);
    host.poll();
    let remote_id = PeerId::new(6).unwrap();

    session.network.set_session_status(
        REMOTE,
        SessionStatus {
            state: ConnectionState::Connected,
            ping_ms: 45,
            quality_local: 0.98,
            ..SessionStatus::default()
        },
    );

    let info = host.peer.peer_info(&remote_id).unwrap();
    assert_eq!(info.identity, REMOTE);
    assert_eq!(info.peer_id, Some(remote_id));
    assert_eq!(info.pending_packet_count, 0);
    assert_eq!(info.status.state, ConnectionState::Connected);
    assert_eq!(info.status.ping_ms, 45);

    assert!(host.peer.peer_info(&PeerId::new(99).unwrap()).is_none());
}

#[test]
fn debug_snapshot_lists_connections() {
    let session = LocalSession::new();
    let (host, client) = connected_pair(&session);

    let snapshot = host.peer.debug_snapshot();

    assert_eq!(snapshot.state, SessionState::Hosting);
    assert_eq!(snapshot.local_peer_id, Some(PeerId::HOST));
    assert_eq!(snapshot.owner, Some(host.identity));
    assert_eq!(snapshot.established_count(), 1);
    assert_eq!(snapshot.pending_packet_count(), 0);
    assert_eq!(snapshot.connections[0].identity, client.identity);
}

// ========== Send flags & relay ==========

#[test]
fn send_flags_come_from_config_and_can_be_changed() {
    let session = LocalSession::new();
    let flags = SendFlags {
        no_nagle: true,
        no_delay: false,
    };
    let config = PeerConfig {
        send_flags: flags,
        ..PeerConfig::default()
    };
    let mut host = session.peer_with_config(HOST, config);
    host.peer
        .create_group(GroupVisibility::Public, 8)
        .unwrap();
    host.poll();
    session
        .lobbies
        .enter(host.peer.group_id().unwrap(), REMOTE);
    host.poll();
    inject_ping_reply(&session.network, REMOTE, host.identity, 6);
    host.poll();
    session.network.clear_sent();
    let remote_id = PeerId::new(6).unwrap();

    assert_eq!(host.peer.send_flags(), flags);
    host.peer
        .put_packet(b"one", Target::Peer(remote_id), TransferMode::Reliable, 0)
        .unwrap();
    host.poll();

    let changed = SendFlags {
        no_nagle: false,
        no_delay: true,
    };
    host.peer.set_send_flags(changed);
    host.peer
        .put_packet(b"two", Target::Peer(remote_id), TransferMode::Reliable, 0)
        .unwrap();
    host.poll();

    let sent: Vec<SendFlags> = session
        .network
        .sent_from(host.identity)
        .iter()
        .filter(|message| message.channel != lobbylink::PING_CHANNEL)
        .map(|message| message.flags)
        .collect();
    assert_eq!(sent, vec![flags, changed]);
}

#[test]
fn relay_support_follows_config() {
    let session = LocalSession::new();
    let default_peer = session.peer(HOST);
    let relay_peer = session.peer_with_config(
        ALICE,
        PeerConfig {
            relay_supported: true,
            ..PeerConfig::default()
        },
    );

    assert!(!default_peer.peer.is_server_relay_supported());
    assert!(relay_peer.peer.is_server_relay_supported());
}
