/// Lifecycle of the local peer's group session
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum SessionState {
    #[default]
    NotConnected,
    /// Group creation requested, awaiting confirmation
    HostPending,
    Hosting,
    /// Join requested, awaiting confirmation
    ClientPending,
    Client,
}

impl SessionState {
    /// Whether application traffic can flow
    pub fn is_active(&self) -> bool {
        matches!(self, SessionState::Hosting | SessionState::Client)
    }

    pub fn is_pending(&self) -> bool {
        matches!(self, SessionState::HostPending | SessionState::ClientPending)
    }
}

/// Coarse connection status reported to the application
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ConnectionStatus {
    Disconnected,
    Connecting,
    Connected,
}

impl From<SessionState> for ConnectionStatus {
    fn from(state: SessionState) -> Self {
        match state {
            SessionState::NotConnected => ConnectionStatus::Disconnected,
            SessionState::HostPending | SessionState::ClientPending => {
                ConnectionStatus::Connecting
            }
            SessionState::Hosting | SessionState::Client => ConnectionStatus::Connected,
        }
    }
}
