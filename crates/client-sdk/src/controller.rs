use common::{CsrfToken, SERVERS_LISTING_PATH, ServerActionPayload};
use console_core::{
    ActionDescriptor, INTERNAL_SERVER_ERROR_TIP, InstallServerForm, RenameForm, ServerAction,
    ServerPage, ServerRow, UiEffect, build_ceph_upgrade_payload, prepare_rename,
    prepare_server_action, rename_effect,
};
use tracing::{error, info, warn};

use crate::{ApiError, DashboardApi};

/// Turns a failed call into the tip the page shows.
fn failure_effect(operation: &str, err: ApiError) -> UiEffect {
    match err {
        ApiError::ServerFault => {
            error!(operation, "dashboard reported an internal server error");
            UiEffect::error(INTERNAL_SERVER_ERROR_TIP)
        }
        other => {
            warn!(operation, error = %other, "dashboard request failed");
            UiEffect::error(other.to_string())
        }
    }
}

#[derive(Clone)]
pub struct RenameController<A> {
    api: A,
}

impl<A: DashboardApi> RenameController<A> {
    pub fn new(api: A) -> Self {
        Self { api }
    }

    pub async fn submit(&self, form: &RenameForm) -> UiEffect {
        let request = match prepare_rename(form) {
            Ok(request) => request,
            Err(err) => return err.into(),
        };

        match self.api.rename_pool(&form.csrf_token, &request).await {
            Ok(reply) => rename_effect(&reply),
            Err(err) => failure_effect("rename_pool", err),
        }
    }
}

#[derive(Clone)]
pub struct ServerActionController<A> {
    api: A,
}

impl<A: DashboardApi> ServerActionController<A> {
    pub fn new(api: A) -> Self {
        Self { api }
    }

    /// Submit button of the server-management page.
    pub async fn submit(&self, page: &ServerPage) -> UiEffect {
        match prepare_server_action(page) {
            Ok(Some((descriptor, payload))) => {
                self.submit_action(&page.csrf_token, &descriptor, &payload)
                    .await
            }
            Ok(None) => {
                info!(title = %page.title, "page mode has no server action, nothing sent");
                UiEffect::None
            }
            Err(err) => err.into(),
        }
    }

    /// Upgrade button; posts the two URL fields whatever the page mode is.
    pub async fn ceph_upgrade(&self, page: &ServerPage) -> UiEffect {
        let descriptor = ActionDescriptor::from(ServerAction::CephUpgrade);
        let payload = ServerActionPayload::CephUpgrade(build_ceph_upgrade_payload(
            page.package_url.clone(),
            page.key_url.clone(),
        ));

        self.submit_action(&page.csrf_token, &descriptor, &payload)
            .await
    }

    pub async fn submit_action(
        &self,
        token: &CsrfToken,
        descriptor: &ActionDescriptor,
        payload: &ServerActionPayload,
    ) -> UiEffect {
        if descriptor.is_none() {
            return UiEffect::None;
        }

        match self
            .api
            .submit_server_action(token, &descriptor.action, payload)
            .await
        {
            Ok(response) => {
                info!(action = %descriptor.action, %response, "server action done");
                UiEffect::navigate(SERVERS_LISTING_PATH)
            }
            Err(err) => failure_effect(&descriptor.action, err),
        }
    }

    /// Per-row reset control. The outcome is only logged.
    pub async fn reset_status(&self, token: &CsrfToken, row: &ServerRow) -> UiEffect {
        let server_id = row.display_server_id();
        match self.api.reset_status(token, server_id).await {
            Ok(body) => info!(server_id, %body, "reset status answered"),
            Err(err) => warn!(server_id, error = %err, "reset status failed"),
        }
        UiEffect::None
    }

    pub async fn install_server(&self, form: &InstallServerForm) -> UiEffect {
        match self
            .api
            .install_server(&form.csrf_token, &form.to_request())
            .await
        {
            Ok(response) => {
                info!(%response, "install server done");
                UiEffect::navigate(SERVERS_LISTING_PATH)
            }
            Err(err) => failure_effect("install_server", err),
        }
    }
}
