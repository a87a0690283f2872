use serde::{Deserialize, Serialize};

pub type ServerId = String;

pub const CSRF_HEADER: &str = "X-CSRFToken";

pub const POOLS_LISTING_PATH: &str = "/dashboard/vsm/poolsmanagement/";
pub const RENAME_POOL_PATH: &str = "/dashboard/vsm/poolsmanagement/rename_pool_action/";
pub const SERVERS_LISTING_PATH: &str = "/dashboard/vsm/storageservermgmt/";
pub const INSTALL_SERVER_PATH: &str = "/dashboard/vsm/storageservermgmt/install_server/";

pub fn server_action_path(verb: &str) -> String {
    format!("{SERVERS_LISTING_PATH}servers/{verb}")
}

/// Prefix of the reset endpoint; the server id is appended as one escaped path segment.
pub const RESET_STATUS_PATH: &str = "/dashboard/vsm/storageservermgmt/reset_status/";

/// Detail view the "Add Servers" table links to; `id_list` is comma-terminated.
pub fn add_server_detail_path(id_list: &str) -> String {
    format!("{SERVERS_LISTING_PATH}addserverdetailview/?id={id_list}")
}

/// Token copied from the page's `csrfmiddlewaretoken` hidden field.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(transparent)]
pub struct CsrfToken(pub String);

impl CsrfToken {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PoolRename {
    pub pool_id: String,
    pub name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct RenamePoolRequest {
    pub pool: PoolRename,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct RenamePoolReply {
    pub status: String,
    #[serde(default)]
    pub message: String,
}

impl RenamePoolReply {
    pub fn is_ok(&self) -> bool {
        self.status == "OK"
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct AddServerRecord {
    pub id: ServerId,
    pub is_monitor: bool,
    pub is_storage: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub zone_id: Option<String>,
}

/// Shared by the remove and stop actions.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct RemoveServerRecord {
    pub id: ServerId,
    pub remove_monitor: bool,
    pub remove_storage: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct StartServerRecord {
    pub id: ServerId,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CephUpgradeRecord {
    pub pkg_url: String,
    pub key_url: String,
}

/// Body posted to `servers/{verb}`. Every variant serializes as a bare JSON array.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(untagged)]
pub enum ServerActionPayload {
    Add(Vec<AddServerRecord>),
    Remove(Vec<RemoveServerRecord>),
    Start(Vec<StartServerRecord>),
    CephUpgrade(Vec<CephUpgradeRecord>),
}

impl ServerActionPayload {
    pub fn len(&self) -> usize {
        match self {
            Self::Add(records) => records.len(),
            Self::Remove(records) => records.len(),
            Self::Start(records) => records.len(),
            Self::CephUpgrade(records) => records.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct InstallServerRequest {
    #[serde(rename = "serverIp")]
    pub server_ip: String,
    #[serde(rename = "sshUserName")]
    pub ssh_user_name: String,
}
