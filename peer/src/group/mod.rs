//! Boundary with the group-membership service (lobbies).

mod group_event;

pub use group_event::{
    EnterResponse, GroupCreateFailure, GroupEvent, GroupEventSender, MemberChange,
};
pub(crate) use group_event::{group_event_channel, GroupEventReceiver};

use thiserror::Error;

use lobbylink_shared::{GroupId, RemoteIdentity};

/// Who may discover and join a newly created group
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum GroupVisibility {
    Private,
    FriendsOnly,
    #[default]
    Public,
    Invisible,
}

/// Errors returned synchronously by a group-membership service
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GroupServiceError {
    /// The service is not initialised or not reachable
    #[error("Group-membership service is unavailable")]
    Unavailable,

    /// The service refused to issue the request
    #[error("Group-membership service rejected the request: {reason}")]
    Rejected {
        reason: String,
    },
}

/// Creates, joins and enumerates groups.
///
/// Create and join are asynchronous: a successful return only means the
/// request went out. The outcome, and every later membership change, is
/// delivered as a [`GroupEvent`] through the [`GroupEventSender`] handed out
/// by the peer.
pub trait GroupService {
    fn create_group(
        &mut self,
        visibility: GroupVisibility,
        max_members: u32,
    ) -> Result<(), GroupServiceError>;

    fn join_group(&mut self, group_id: GroupId) -> Result<(), GroupServiceError>;

    fn leave_group(&mut self, group_id: GroupId);

    /// Current members, in the service's enumeration order
    fn members(&self, group_id: GroupId) -> Vec<RemoteIdentity>;

    fn owner(&self, group_id: GroupId) -> Option<RemoteIdentity>;

    // Metadata

    fn data(&self, group_id: GroupId, key: &str) -> Option<String>;

    fn set_data(&mut self, group_id: GroupId, key: &str, value: &str) -> bool;

    fn all_data(&self, group_id: GroupId) -> Vec<(String, String)>;

    fn set_joinable(&mut self, group_id: GroupId, joinable: bool) -> bool;

    /// Broadcasts a chat message to every member through the service itself
    fn send_message(&mut self, group_id: GroupId, payload: &[u8]) -> bool;
}
