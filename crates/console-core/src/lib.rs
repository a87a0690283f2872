mod action;
mod effect;
mod page;
mod payload;

pub use action::{ActionDescriptor, NULL_ACTION, PayloadShape, ServerAction, resolve_action};
pub use effect::{INTERNAL_SERVER_ERROR_TIP, UiEffect, prepare_rename, rename_effect};
pub use page::{
    InstallServerForm, RenameForm, SelectionSet, ServerPage, ServerRow, TipLevel, ValidationError,
    reset_status_allowed,
};
pub use payload::{
    build_add_payload, build_ceph_upgrade_payload, build_remove_payload, build_start_payload,
    build_stop_payload, for_each_selected, prepare_server_action, server_id_list,
};
