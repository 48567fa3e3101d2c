use std::fmt;

/// Opaque, globally unique handle of a remote endpoint, as minted by the
/// messaging transport (an account id, a device key, ...).
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct RemoteIdentity(u64);

impl RemoteIdentity {
    /// The "no identity" value. Never addresses a real endpoint.
    pub const NIL: RemoteIdentity = RemoteIdentity(0);

    pub const fn new(value: u64) -> Self {
        Self(value)
    }

    pub fn to_u64(&self) -> u64 {
        self.0
    }

    pub fn is_nil(&self) -> bool {
        self.0 == 0
    }
}

impl From<u64> for RemoteIdentity {
    fn from(value: u64) -> Self {
        Self(value)
    }
}

impl fmt::Display for RemoteIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:#018x}", self.0)
    }
}

/// Small integer used by the application layer to address a participant.
///
/// Valid ids are `1..=i32::MAX`; `1` is reserved for the session host.
/// An id that has not been negotiated yet is represented as `None` wherever
/// an `Option<PeerId>` appears, and as [`UNASSIGNED_PEER_ID`] on the wire.
///
/// [`UNASSIGNED_PEER_ID`]: crate::UNASSIGNED_PEER_ID
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct PeerId(i32);

impl PeerId {
    /// The id every session host assigns itself.
    pub const HOST: PeerId = PeerId(1);

    /// Returns `None` for values outside `1..=i32::MAX`.
    pub fn new(value: i32) -> Option<Self> {
        if value >= 1 {
            Some(Self(value))
        } else {
            None
        }
    }

    pub fn get(&self) -> i32 {
        self.0
    }

    pub fn is_host(&self) -> bool {
        *self == Self::HOST
    }
}

impl fmt::Display for PeerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Opaque handle of a joinable group, as minted by the group-membership
/// service.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct GroupId(u64);

impl GroupId {
    pub const fn new(value: u64) -> Self {
        Self(value)
    }

    pub fn to_u64(&self) -> u64 {
        self.0
    }
}

impl From<u64> for GroupId {
    fn from(value: u64) -> Self {
        Self(value)
    }
}

impl fmt::Display for GroupId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
