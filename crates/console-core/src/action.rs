use serde::{Deserialize, Serialize};

/// The seven modes the server-management page can be rendered in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ServerAction {
    AddServers,
    RemoveServers,
    AddMonitors,
    RemoveMonitors,
    StartServers,
    StopServers,
    CephUpgrade,
}

/// Record shape a mode posts. Monitor modes share the server shapes; the
/// monitor/storage split travels inside each record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PayloadShape {
    Add,
    Remove,
    Start,
    CephUpgrade,
}

impl ServerAction {
    pub const ALL: [ServerAction; 7] = [
        ServerAction::AddServers,
        ServerAction::RemoveServers,
        ServerAction::AddMonitors,
        ServerAction::RemoveMonitors,
        ServerAction::StartServers,
        ServerAction::StopServers,
        ServerAction::CephUpgrade,
    ];

    pub fn from_label(label: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|action| action.label() == label)
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::AddServers => "Add Servers",
            Self::RemoveServers => "Remove Servers",
            Self::AddMonitors => "Add Monitors",
            Self::RemoveMonitors => "Remove Monitors",
            Self::StartServers => "Start Servers",
            Self::StopServers => "Stop Servers",
            Self::CephUpgrade => "Ceph Upgrade",
        }
    }

    pub fn index(self) -> u8 {
        match self {
            Self::AddServers => 1,
            Self::RemoveServers => 2,
            Self::AddMonitors => 3,
            Self::RemoveMonitors => 4,
            Self::StartServers => 5,
            Self::StopServers => 6,
            Self::CephUpgrade => 7,
        }
    }

    /// Endpoint token appended to `servers/`.
    pub fn verb(self) -> &'static str {
        match self {
            Self::AddServers | Self::AddMonitors => "add",
            Self::RemoveServers | Self::RemoveMonitors => "remove",
            Self::StartServers => "start",
            Self::StopServers => "stop",
            Self::CephUpgrade => "ceph_upgrade",
        }
    }

    pub fn payload_shape(self) -> PayloadShape {
        match self {
            Self::AddServers | Self::AddMonitors => PayloadShape::Add,
            // stop posts remove-shaped records built by the remove builder
            Self::RemoveServers | Self::RemoveMonitors | Self::StopServers => {
                PayloadShape::Remove
            }
            Self::StartServers => PayloadShape::Start,
            Self::CephUpgrade => PayloadShape::CephUpgrade,
        }
    }

    pub fn requires_selection(self) -> bool {
        self != Self::CephUpgrade
    }
}

pub const NULL_ACTION: &str = "null";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActionDescriptor {
    pub index: u8,
    pub action: String,
}

impl ActionDescriptor {
    pub fn none() -> Self {
        Self {
            index: 0,
            action: NULL_ACTION.to_string(),
        }
    }

    pub fn is_none(&self) -> bool {
        self.index == 0
    }

    pub fn server_action(&self) -> Option<ServerAction> {
        ServerAction::ALL
            .into_iter()
            .find(|action| action.index() == self.index)
    }
}

impl From<ServerAction> for ActionDescriptor {
    fn from(action: ServerAction) -> Self {
        Self {
            index: action.index(),
            action: action.verb().to_string(),
        }
    }
}

/// Maps a page heading to its descriptor; anything unrecognized is the no-op
/// descriptor (index 0).
pub fn resolve_action(label: &str) -> ActionDescriptor {
    ServerAction::from_label(label)
        .map(ActionDescriptor::from)
        .unwrap_or_else(ActionDescriptor::none)
}
