use common::{POOLS_LISTING_PATH, PoolRename, RenamePoolReply, RenamePoolRequest};
use serde::{Deserialize, Serialize};

use crate::page::{RenameForm, TipLevel, ValidationError};

pub const INTERNAL_SERVER_ERROR_TIP: &str = "INTERNAL SERVER ERROR";

/// What the page should do once a controller has finished.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "effect", rename_all = "snake_case")]
pub enum UiEffect {
    Navigate { url: String },
    ShowTip { level: TipLevel, message: String },
    None,
}

impl UiEffect {
    pub fn navigate(url: impl Into<String>) -> Self {
        Self::Navigate { url: url.into() }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self::ShowTip {
            level: TipLevel::Error,
            message: message.into(),
        }
    }

    pub fn is_error(&self) -> bool {
        matches!(
            self,
            Self::ShowTip {
                level: TipLevel::Error,
                ..
            }
        )
    }
}

impl From<ValidationError> for UiEffect {
    fn from(err: ValidationError) -> Self {
        Self::ShowTip {
            level: err.tip_level(),
            message: err.to_string(),
        }
    }
}

pub fn prepare_rename(form: &RenameForm) -> Result<RenamePoolRequest, ValidationError> {
    if form.new_name.is_empty() {
        return Err(ValidationError::FieldRequired);
    }

    Ok(RenamePoolRequest {
        pool: PoolRename {
            pool_id: form.pool_id.clone(),
            name: form.new_name.clone(),
        },
    })
}

pub fn rename_effect(reply: &RenamePoolReply) -> UiEffect {
    if reply.is_ok() {
        UiEffect::navigate(POOLS_LISTING_PATH)
    } else {
        UiEffect::error(reply.message.clone())
    }
}
