/// Integration tests for the group session state machine
/// These tests drive real peers through create, join, membership changes and
/// close, using in-memory lobbies and transport

use std::time::Instant;

use lobbylink::{
    ConnectionStatus, EnterResponse, GroupCreateFailure, GroupEvent, GroupId, GroupServiceError,
    GroupVisibility, MemberChange, PeerError, PeerId, ProtocolError, RegistryError,
    RemoteIdentity, SessionError, SessionState, TransferMode, Target, CHANNEL_OFFSET,
    PING_CHANNEL,
};
use lobbylink_test::{
    assert_established, assert_no_errors, assert_session_state, exchange_packets_n_times,
    inject_ping_reply, LocalSession, TestPeer,
};

const HOST: u64 = 0xA1;
const ALICE: u64 = 0xB2;
const BOB: u64 = 0xC3;

fn hosting(session: &LocalSession) -> (TestPeer, GroupId) {
    let mut host = session.peer(HOST);
    host.peer
        .create_group(GroupVisibility::Public, 8)
        .unwrap();
    host.poll();
    let group_id = host.peer.group_id().unwrap();
    (host, group_id)
}

// ========== Host flow ==========

#[test]
fn create_group_makes_us_host() {
    let session = LocalSession::new();
    let mut host = session.peer(HOST);

    host.peer
        .create_group(GroupVisibility::FriendsOnly, 4)
        .unwrap();

    assert_session_state!(host, SessionState::HostPending);
    assert_eq!(host.peer.unique_id(), Ok(PeerId::HOST));
    assert_eq!(host.peer.connection_status(), ConnectionStatus::Connecting);

    host.poll();

    assert_session_state!(host, SessionState::Hosting);
    assert_eq!(host.peer.unique_id(), Ok(PeerId::HOST));
    assert!(host.peer.is_server());
    assert_eq!(host.peer.connection_status(), ConnectionStatus::Connected);
    assert_eq!(host.groups_created, vec![host.peer.group_id().unwrap()]);
    assert_eq!(host.peer.owner(), Some(host.identity));
    assert_no_errors!(host);
}

#[test]
fn create_while_in_session_is_refused() {
    let session = LocalSession::new();
    let mut host = session.peer(HOST);
    host.peer
        .create_group(GroupVisibility::Public, 4)
        .unwrap();

    let result = host.peer.create_group(GroupVisibility::Public, 4);

    assert_eq!(
        result,
        Err(PeerError::Session(SessionError::AlreadyInSession {
            state: SessionState::HostPending
        }))
    );

    host.poll();
    let result = host.peer.join_group(GroupId::new(1));
    assert_eq!(
        result,
        Err(PeerError::Session(SessionError::AlreadyInSession {
            state: SessionState::Hosting
        }))
    );
}

#[test]
fn failed_create_reverts_to_not_connected() {
    let session = LocalSession::new();
    let mut host = session.peer(HOST);
    session.lobbies.fail_next_create(GroupCreateFailure::IoFailure);

    host.peer
        .create_group(GroupVisibility::Public, 4)
        .unwrap();
    host.poll();

    assert_session_state!(host, SessionState::NotConnected);
    assert_eq!(
        host.errors,
        vec![PeerError::Session(SessionError::CreateFailed {
            reason: GroupCreateFailure::IoFailure
        })]
    );
    assert_eq!(host.peer.unique_id(), Err(PeerError::NotActive));

    // Retrying from scratch works
    host.peer
        .create_group(GroupVisibility::Public, 4)
        .unwrap();
    host.poll();
    assert_session_state!(host, SessionState::Hosting);
}

#[test]
fn service_refusal_is_returned_without_state_change() {
    let session = LocalSession::new();
    let mut host = session.peer(HOST);
    session.lobbies.set_unavailable(true);

    let result = host.peer.create_group(GroupVisibility::Public, 4);

    assert_eq!(
        result,
        Err(PeerError::Session(SessionError::GroupService(
            GroupServiceError::Unavailable
        )))
    );
    assert_session_state!(host, SessionState::NotConnected);
    assert_eq!(host.peer.unique_id(), Err(PeerError::NotActive));
}

// ========== Join flow ==========

#[test]
fn join_connects_owner_first_then_other_members() {
    let session = LocalSession::new();
    let owner = RemoteIdentity::new(0xAAAA);
    let member = RemoteIdentity::new(0xBBBB);
    let group_id = session.lobbies.create_lobby(owner, &[member]);
    let mut client = session.peer(ALICE);

    client.peer.join_group(group_id).unwrap();
    assert_session_state!(client, SessionState::ClientPending);
    let local_peer_id = client.unique_id();
    assert!(!local_peer_id.is_host());

    let now = Instant::now();
    client.poll_at(now);

    assert_session_state!(client, SessionState::Client);
    assert_eq!(client.groups_joined, vec![group_id]);
    assert_eq!(client.peer.owner(), Some(owner));

    let pings = session.network.sent_from(client.identity);
    assert_eq!(pings[0].to, owner);
    assert_eq!(pings[1].to, member);
    assert!(pings.iter().all(|message| message.channel == PING_CHANNEL));

    let snapshot = client.peer.debug_snapshot();
    assert_eq!(snapshot.connections.len(), 2);
    assert_eq!(snapshot.established_count(), 0);

    inject_ping_reply(&session.network, owner, client.identity, 7);
    inject_ping_reply(&session.network, member, client.identity, 9);
    client.poll_at(now);

    assert_eq!(
        client.connected,
        vec![PeerId::new(7).unwrap(), PeerId::new(9).unwrap()]
    );
    assert_eq!(client.peer.peer_id_for_identity(&owner), PeerId::new(7));
    assert_eq!(client.peer.peer_id_for_identity(&member), PeerId::new(9));
    assert_ne!(Some(local_peer_id), PeerId::new(7));
    assert_ne!(Some(local_peer_id), PeerId::new(9));
    assert_no_errors!(client);
}

#[test]
fn host_and_client_converge_on_peer_ids() {
    let session = LocalSession::new();
    let (mut host, group_id) = hosting(&session);
    let mut client = session.peer(ALICE);

    client.peer.join_group(group_id).unwrap();
    exchange_packets_n_times(&mut [&mut host, &mut client], Instant::now(), 4);

    let client_id = client.unique_id();
    assert_ne!(client_id, PeerId::HOST);
    assert_eq!(host.connected, vec![client_id]);
    assert_eq!(client.connected, vec![PeerId::HOST]);
    assert!(client.peer.identity_for_peer(&PeerId::HOST) == Some(host.identity));
    assert!(!client.peer.is_server());
    assert_established!(host, client.identity);
    assert_no_errors!(host);
    assert_no_errors!(client);
}

#[test]
fn three_peers_all_get_distinct_ids() {
    let session = LocalSession::new();
    let (mut host, group_id) = hosting(&session);
    let mut alice = session.peer(ALICE);
    let mut bob = session.peer(BOB);
    let now = Instant::now();

    alice.peer.join_group(group_id).unwrap();
    exchange_packets_n_times(&mut [&mut host, &mut alice], now, 3);
    bob.peer.join_group(group_id).unwrap();
    exchange_packets_n_times(&mut [&mut host, &mut alice, &mut bob], now, 4);

    let alice_id = alice.unique_id();
    let bob_id = bob.unique_id();
    assert_ne!(alice_id, bob_id);
    assert_eq!(host.peer.peer_map().len(), 2);
    assert_eq!(alice.peer.peer_id_for_identity(&bob.identity), Some(bob_id));
    assert_eq!(bob.peer.peer_id_for_identity(&alice.identity), Some(alice_id));
    assert_eq!(bob.peer.peer_id_for_identity(&host.identity), Some(PeerId::HOST));
    assert_no_errors!(host);
    assert_no_errors!(alice);
    assert_no_errors!(bob);
}

#[test]
fn failed_join_reverts_to_not_connected() {
    let session = LocalSession::new();
    let mut client = session.peer(ALICE);
    let missing = GroupId::new(999);

    client.peer.join_group(missing).unwrap();
    client.poll();

    assert_session_state!(client, SessionState::NotConnected);
    assert_eq!(
        client.errors,
        vec![PeerError::Session(SessionError::JoinFailed {
            group_id: missing,
            response: EnterResponse::DoesNotExist
        })]
    );
    assert_eq!(client.peer.group_id(), None);
    assert_eq!(client.peer.connection_status(), ConnectionStatus::Disconnected);
}

#[test]
fn joining_a_full_group_fails() {
    let session = LocalSession::new();
    let mut host = session.peer(HOST);
    host.peer
        .create_group(GroupVisibility::Public, 1)
        .unwrap();
    host.poll();
    let mut client = session.peer(ALICE);

    client.peer.join_group(host.peer.group_id().unwrap()).unwrap();
    client.poll();

    assert!(matches!(
        client.errors.as_slice(),
        [PeerError::Session(SessionError::JoinFailed {
            response: EnterResponse::Full,
            ..
        })]
    ));
    assert_session_state!(client, SessionState::NotConnected);
}

// ========== Membership changes ==========

#[test]
fn member_entering_and_leaving_round_trips() {
    let session = LocalSession::new();
    let (mut host, group_id) = hosting(&session);
    let remote = RemoteIdentity::new(0xDEAD);
    let now = Instant::now();

    session.lobbies.enter(group_id, remote);
    host.poll_at(now);

    assert!(host.connected.is_empty());
    assert_eq!(host.peer.debug_snapshot().connections.len(), 1);

    inject_ping_reply(&session.network, remote, host.identity, 5);
    host.poll_at(now);
    assert_eq!(host.connected, vec![PeerId::new(5).unwrap()]);

    session
        .lobbies
        .depart(group_id, remote, MemberChange::Kicked);
    host.poll_at(now);

    assert_eq!(host.disconnected, vec![(PeerId::new(5).unwrap(), remote)]);
    assert!(host.peer.peer_map().is_empty());
    assert!(host.peer.debug_snapshot().connections.is_empty());
    assert!(session
        .network
        .closed_sessions()
        .contains(&(host.identity, remote)));
    assert_no_errors!(host);
}

#[test]
fn unassigned_member_leaving_emits_no_disconnect() {
    let session = LocalSession::new();
    let (mut host, group_id) = hosting(&session);
    let remote = RemoteIdentity::new(0xDEAD);

    session.lobbies.enter(group_id, remote);
    host.poll();
    session
        .lobbies
        .depart(group_id, remote, MemberChange::Disconnected);
    host.poll();

    assert!(host.disconnected.is_empty());
    assert!(host.peer.debug_snapshot().connections.is_empty());
}

#[test]
fn inconsistent_membership_notifications_are_reported() {
    let session = LocalSession::new();
    let (mut host, group_id) = hosting(&session);
    let remote = RemoteIdentity::new(0xDEAD);
    let stranger = RemoteIdentity::new(0xBEEF);

    session.lobbies.enter(group_id, remote);
    session.lobbies.notify(
        host.identity,
        GroupEvent::MemberChanged {
            group_id,
            identity: remote,
            change: MemberChange::Entered,
        },
    );
    session.lobbies.notify(
        host.identity,
        GroupEvent::MemberChanged {
            group_id,
            identity: stranger,
            change: MemberChange::Left,
        },
    );
    host.poll();

    assert_eq!(
        host.errors,
        vec![
            PeerError::Protocol(ProtocolError::Registry(RegistryError::AlreadyExists {
                identity: remote
            })),
            PeerError::Protocol(ProtocolError::Registry(RegistryError::UnknownIdentity {
                identity: stranger
            })),
        ]
    );
    assert_eq!(host.peer.debug_snapshot().connections.len(), 1);
}

#[test]
fn events_about_self_or_other_groups_are_ignored() {
    let session = LocalSession::new();
    let (mut host, group_id) = hosting(&session);

    session.lobbies.notify(
        host.identity,
        GroupEvent::MemberChanged {
            group_id,
            identity: host.identity,
            change: MemberChange::Entered,
        },
    );
    session.lobbies.notify(
        host.identity,
        GroupEvent::MemberChanged {
            group_id: GroupId::new(7777),
            identity: RemoteIdentity::new(0xDEAD),
            change: MemberChange::Entered,
        },
    );
    host.poll();

    assert!(host.peer.debug_snapshot().connections.is_empty());
    assert_no_errors!(host);
}

// ========== Session requests ==========

#[test]
fn session_request_from_member_is_accepted() {
    let session = LocalSession::new();
    let (mut host, group_id) = hosting(&session);
    let remote = RemoteIdentity::new(0xDEAD);
    session.lobbies.enter(group_id, remote);

    session
        .lobbies
        .notify(host.identity, GroupEvent::SessionRequest { identity: remote });
    host.poll();

    assert_eq!(
        session.network.accepted_sessions(),
        vec![(host.identity, remote)]
    );
    assert_no_errors!(host);
}

#[test]
fn session_request_from_non_member_is_refused() {
    let session = LocalSession::new();
    let (mut host, _) = hosting(&session);
    let stranger = RemoteIdentity::new(0xBEEF);

    session
        .lobbies
        .notify(host.identity, GroupEvent::SessionRequest { identity: stranger });
    host.poll();

    assert!(session.network.accepted_sessions().is_empty());
    assert_eq!(
        host.errors,
        vec![PeerError::Session(SessionError::SessionRequestFromNonMember {
            identity: stranger
        })]
    );
}

#[test]
fn session_request_while_joining_is_checked_against_members() {
    let session = LocalSession::new();
    let owner = RemoteIdentity::new(0xDEAD);
    let stranger = RemoteIdentity::new(0xBEEF);
    let group_id = session.lobbies.create_lobby(owner, &[]);
    let mut client = session.peer(ALICE);

    // Queued ahead of the join confirmation
    session
        .lobbies
        .notify(client.identity, GroupEvent::SessionRequest { identity: owner });
    session
        .lobbies
        .notify(client.identity, GroupEvent::SessionRequest { identity: stranger });
    client.peer.join_group(group_id).unwrap();
    assert!(client.peer.state().is_pending());
    client.poll();

    assert_session_state!(client, SessionState::Client);
    assert_eq!(
        session.network.accepted_sessions(),
        vec![(client.identity, owner)]
    );
    assert_eq!(
        client.errors,
        vec![PeerError::Session(SessionError::SessionRequestFromNonMember {
            identity: stranger
        })]
    );
}

#[test]
fn session_request_outside_a_session_is_ignored() {
    let session = LocalSession::new();
    let mut peer = session.peer(ALICE);
    let remote = RemoteIdentity::new(0xDEAD);

    session
        .lobbies
        .notify(peer.identity, GroupEvent::SessionRequest { identity: remote });
    peer.poll();

    assert!(!peer.peer.state().is_pending());
    assert!(session.network.accepted_sessions().is_empty());
    assert_no_errors!(peer);
}

#[test]
fn session_failure_is_reported() {
    let session = LocalSession::new();
    let (mut host, _) = hosting(&session);
    let remote = RemoteIdentity::new(0xDEAD);

    session.lobbies.notify(
        host.identity,
        GroupEvent::SessionFailed {
            identity: remote,
            reason: 4,
        },
    );
    host.poll();

    assert_eq!(
        host.errors,
        vec![PeerError::Session(SessionError::SessionFailed {
            identity: remote,
            reason: 4
        })]
    );
    assert_session_state!(host, SessionState::Hosting);
}

// ========== Close ==========

#[test]
fn close_tears_down_sessions_and_discards_queued_packets() {
    let session = LocalSession::new();
    let (mut host, group_id) = hosting(&session);
    let mut client = session.peer(ALICE);
    let now = Instant::now();
    client.peer.join_group(group_id).unwrap();
    exchange_packets_n_times(&mut [&mut host, &mut client], now, 4);
    let client_id = client.unique_id();

    session.network.fail_sends_to(host.identity);
    client
        .peer
        .put_packet(b"never", Target::Peer(PeerId::HOST), TransferMode::Reliable, 0)
        .unwrap();
    let info = client.peer.peer_info(&PeerId::HOST).unwrap();
    assert_eq!(info.pending_packet_count, 1);

    client.peer.close();
    session.network.restore_sends_to(host.identity);

    assert_session_state!(client, SessionState::NotConnected);
    assert_eq!(client.peer.unique_id(), Err(PeerError::NotActive));
    assert!(client.peer.debug_snapshot().connections.is_empty());
    assert!(session
        .network
        .closed_sessions()
        .contains(&(client.identity, host.identity)));
    assert_eq!(session.lobbies.members(group_id), vec![host.identity]);

    client.poll_at(now);
    host.poll_at(now);

    assert!(client.disconnected.is_empty());
    assert!(session
        .network
        .sent_between(client.identity, host.identity, CHANNEL_OFFSET)
        .is_empty());
    assert_eq!(host.disconnected, vec![(client_id, client.identity)]);
}

#[test]
fn close_when_not_connected_is_a_no_op() {
    let session = LocalSession::new();
    let mut peer = session.peer(ALICE);

    peer.peer.close();
    peer.poll();

    assert_session_state!(peer, SessionState::NotConnected);
    assert!(session.network.closed_sessions().is_empty());
}

#[test]
fn create_confirmed_after_close_leaves_the_group() {
    let session = LocalSession::new();
    let mut host = session.peer(HOST);

    host.peer
        .create_group(GroupVisibility::Public, 4)
        .unwrap();
    host.peer.close();
    host.poll();

    assert_session_state!(host, SessionState::NotConnected);
    assert!(host.groups_created.is_empty());
    assert!(session.lobbies.group_ids().is_empty());
}

#[test]
fn close_during_join_leaves_the_group() {
    let session = LocalSession::new();
    let (mut host, group_id) = hosting(&session);
    let mut client = session.peer(ALICE);

    client.peer.join_group(group_id).unwrap();
    client.peer.close();
    client.poll();
    host.poll();

    assert_session_state!(client, SessionState::NotConnected);
    assert!(client.groups_joined.is_empty());
    assert_eq!(session.lobbies.members(group_id), vec![host.identity]);
}
