use std::fmt;

use crossbeam_channel::{unbounded, Receiver, Sender};

use lobbylink_shared::{GroupId, RemoteIdentity};

/// Notifications pushed by the host into the peer. They are consumed during
/// the next poll, never while they are being pushed.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum GroupEvent {
    /// Outcome of an earlier `create_group` request
    Created(Result<GroupId, GroupCreateFailure>),
    /// Outcome of entering a group. Also sent to the creator of a group.
    Entered {
        group_id: GroupId,
        response: EnterResponse,
    },
    /// Someone entered or left a group we are in
    MemberChanged {
        group_id: GroupId,
        identity: RemoteIdentity,
        change: MemberChange,
    },
    /// A remote identity wants to open a transport session with us
    SessionRequest {
        identity: RemoteIdentity,
    },
    /// The transport gave up on a session
    SessionFailed {
        identity: RemoteIdentity,
        reason: u32,
    },
    /// Chat message relayed by the group service
    Message {
        group_id: GroupId,
        sender: RemoteIdentity,
        payload: Box<[u8]>,
    },
}

/// Reason a group could not be created
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum GroupCreateFailure {
    /// The request never completed
    IoFailure,
    /// The service answered, refusing the request
    Rejected,
}

impl fmt::Display for GroupCreateFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GroupCreateFailure::IoFailure => write!(f, "request did not complete"),
            GroupCreateFailure::Rejected => write!(f, "request rejected by the service"),
        }
    }
}

/// Answer of the group service to an attempt to enter a group
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum EnterResponse {
    Success,
    DoesNotExist,
    NotAllowed,
    Full,
    Error,
    Banned,
    Limited,
    ClanDisabled,
    CommunityBan,
    MemberBlockedYou,
    YouBlockedMember,
    RateLimitExceeded,
}

impl EnterResponse {
    pub fn is_success(&self) -> bool {
        *self == EnterResponse::Success
    }
}

/// How a member's presence in a group changed
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum MemberChange {
    Entered,
    Left,
    Disconnected,
    Kicked,
    Banned,
}

impl MemberChange {
    pub fn is_departure(&self) -> bool {
        !matches!(self, MemberChange::Entered)
    }
}

/// Handle the host uses to push [`GroupEvent`]s into a peer. Cheap to clone.
#[derive(Clone, Debug)]
pub struct GroupEventSender(Sender<GroupEvent>);

impl GroupEventSender {
    /// Queues an event for the next poll. Returns `false` once the peer is gone.
    pub fn send(&self, event: GroupEvent) -> bool {
        self.0.send(event).is_ok()
    }
}

pub(crate) struct GroupEventReceiver(Receiver<GroupEvent>);

impl GroupEventReceiver {
    pub(crate) fn drain(&self) -> Vec<GroupEvent> {
        self.0.try_iter().collect()
    }
}

pub(crate) fn group_event_channel() -> (GroupEventSender, GroupEventReceiver) {
    let (sender, receiver) = unbounded();
    (GroupEventSender(sender), GroupEventReceiver(receiver))
}
