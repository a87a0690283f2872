use common::{CsrfToken, InstallServerRequest, ServerId};
use serde::{Deserialize, Serialize};

use crate::action::{ActionDescriptor, ServerAction, resolve_action};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TipLevel {
    Error,
    Warning,
}

/// Raised before any request is built; the request is never sent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    FieldRequired,
    NoServersSelected,
    MissingCell { row_id: String, cell: &'static str },
}

impl ValidationError {
    pub fn tip_level(&self) -> TipLevel {
        match self {
            Self::NoServersSelected => TipLevel::Warning,
            Self::FieldRequired | Self::MissingCell { .. } => TipLevel::Error,
        }
    }
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::FieldRequired => write!(f, "The field marked as '*' should not be empty"),
            Self::NoServersSelected => write!(f, "Please select at least one server"),
            Self::MissingCell { row_id, cell } => {
                write!(f, "row {row_id} has no {cell} input")
            }
        }
    }
}

impl std::error::Error for ValidationError {}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RenameForm {
    pub pool_id: String,
    pub new_name: String,
    #[serde(default)]
    pub csrf_token: CsrfToken,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct InstallServerForm {
    pub server_ip: String,
    pub ssh_user_name: String,
    #[serde(default)]
    pub csrf_token: CsrfToken,
}

impl InstallServerForm {
    pub fn to_request(&self) -> InstallServerRequest {
        InstallServerRequest {
            server_ip: self.server_ip.clone(),
            ssh_user_name: self.ssh_user_name.clone(),
        }
    }
}

/// One row of the server table as rendered at submit time.
///
/// Optional cells mirror columns that only some page modes render.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServerRow {
    pub row_id: String,
    /// Value of the row's multi-select checkbox.
    pub id: ServerId,
    #[serde(default)]
    pub selected: bool,
    #[serde(default)]
    pub server_id: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub zone: Option<String>,
    #[serde(default)]
    pub monitor: Option<bool>,
    #[serde(default)]
    pub storage: Option<bool>,
    #[serde(default)]
    pub monitor_tag: Option<String>,
    #[serde(default)]
    pub remove_storage: Option<bool>,
    #[serde(default)]
    pub remove_monitor: Option<bool>,
}

impl ServerRow {
    pub fn new(row_id: impl Into<String>, id: impl Into<String>) -> Self {
        Self {
            row_id: row_id.into(),
            id: id.into(),
            ..Self::default()
        }
    }

    pub fn checked(mut self) -> Self {
        self.selected = true;
        self
    }

    /// Server id shown in the row's id column, falling back to the checkbox value.
    pub fn display_server_id(&self) -> &str {
        self.server_id.as_deref().unwrap_or(&self.id)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServerPage {
    /// Heading text; only consulted when `mode` is absent.
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub mode: Option<ServerAction>,
    #[serde(default)]
    pub csrf_token: CsrfToken,
    #[serde(default)]
    pub rows: Vec<ServerRow>,
    #[serde(default)]
    pub package_url: String,
    #[serde(default)]
    pub key_url: String,
}

impl ServerPage {
    pub fn action(&self) -> ActionDescriptor {
        match self.mode {
            Some(mode) => ActionDescriptor::from(mode),
            None => resolve_action(&self.title),
        }
    }

    pub fn selection(&self) -> SelectionSet {
        SelectionSet::from_rows(&self.rows)
    }
}

/// Ids of the rows checked at the time it was taken.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SelectionSet {
    ids: Vec<ServerId>,
}

impl SelectionSet {
    pub fn from_rows(rows: &[ServerRow]) -> Self {
        Self {
            ids: rows
                .iter()
                .filter(|row| row.selected)
                .map(|row| row.id.clone())
                .collect(),
        }
    }

    pub fn ids(&self) -> &[ServerId] {
        &self.ids
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    pub fn contains(&self, id: &str) -> bool {
        self.ids.iter().any(|candidate| candidate == id)
    }
}

/// Whether the table offers the reset-status action for a row in `status`.
pub fn reset_status_allowed(status: &str) -> bool {
    matches!(
        status,
        "running" | "stopping" | "removing" | "adding" | "starting"
    ) || status.contains("ERROR")
}
