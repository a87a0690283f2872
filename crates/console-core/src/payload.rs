use common::{
    AddServerRecord, CephUpgradeRecord, RemoveServerRecord, ServerActionPayload,
    StartServerRecord,
};

use crate::action::{ActionDescriptor, PayloadShape};
use crate::page::{ServerPage, ServerRow, ValidationError};

/// Visits checked rows in table order and extracts one record from each.
pub fn for_each_selected<T, F>(rows: &[ServerRow], extract: F) -> Result<Vec<T>, ValidationError>
where
    F: FnMut(&ServerRow) -> Result<T, ValidationError>,
{
    rows.iter()
        .filter(|row| row.selected)
        .map(extract)
        .collect()
}

pub fn build_add_payload(rows: &[ServerRow]) -> Result<Vec<AddServerRecord>, ValidationError> {
    for_each_selected(rows, |row| {
        let is_monitor = row.monitor.ok_or_else(|| ValidationError::MissingCell {
            row_id: row.row_id.clone(),
            cell: "monitor",
        })?;

        Ok(AddServerRecord {
            id: row.id.clone(),
            is_monitor,
            is_storage: row.storage.unwrap_or(false),
            zone_id: row.zone.clone(),
        })
    })
}

pub fn build_remove_payload(
    rows: &[ServerRow],
) -> Result<Vec<RemoveServerRecord>, ValidationError> {
    for_each_selected(rows, |row| {
        Ok(RemoveServerRecord {
            id: row.id.clone(),
            remove_monitor: monitor_tagged(row),
            remove_storage: row.remove_storage.unwrap_or(false),
        })
    })
}

pub fn build_start_payload(rows: &[ServerRow]) -> Result<Vec<StartServerRecord>, ValidationError> {
    for_each_selected(rows, |row| Ok(StartServerRecord { id: row.id.clone() }))
}

/// Stop-shaped records reading the remove-monitor checkbox as the storage flag.
///
/// Dispatch sends stop through [`build_remove_payload`], which reads the
/// remove-storage checkbox instead. Both stay until the intended column is
/// confirmed.
pub fn build_stop_payload(rows: &[ServerRow]) -> Result<Vec<RemoveServerRecord>, ValidationError> {
    for_each_selected(rows, |row| {
        Ok(RemoveServerRecord {
            id: row.id.clone(),
            remove_monitor: monitor_tagged(row),
            remove_storage: row.remove_monitor.unwrap_or(false),
        })
    })
}

pub fn build_ceph_upgrade_payload(
    package_url: impl Into<String>,
    key_url: impl Into<String>,
) -> Vec<CephUpgradeRecord> {
    vec![CephUpgradeRecord {
        pkg_url: package_url.into(),
        key_url: key_url.into(),
    }]
}

/// Comma-terminated ids of the checked rows, e.g. `"1,3,"`.
pub fn server_id_list(rows: &[ServerRow]) -> String {
    rows.iter()
        .filter(|row| row.selected)
        .map(|row| format!("{},", row.id))
        .collect()
}

/// Builds the request for the page's current mode.
///
/// `Ok(None)` means the mode is unknown and nothing must be sent.
pub fn prepare_server_action(
    page: &ServerPage,
) -> Result<Option<(ActionDescriptor, ServerActionPayload)>, ValidationError> {
    let descriptor = page.action();
    let Some(action) = descriptor.server_action() else {
        return Ok(None);
    };

    if action.requires_selection() && page.selection().is_empty() {
        return Err(ValidationError::NoServersSelected);
    }

    let payload = match action.payload_shape() {
        PayloadShape::Add => ServerActionPayload::Add(build_add_payload(&page.rows)?),
        PayloadShape::Remove => ServerActionPayload::Remove(build_remove_payload(&page.rows)?),
        PayloadShape::Start => ServerActionPayload::Start(build_start_payload(&page.rows)?),
        PayloadShape::CephUpgrade => ServerActionPayload::CephUpgrade(build_ceph_upgrade_payload(
            page.package_url.clone(),
            page.key_url.clone(),
        )),
    };

    Ok(Some((descriptor, payload)))
}

fn monitor_tagged(row: &ServerRow) -> bool {
    row.monitor_tag.as_deref() == Some("yes")
}
