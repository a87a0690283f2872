use std::future::Future;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use common::{
    CSRF_HEADER, CsrfToken, INSTALL_SERVER_PATH, InstallServerRequest, RENAME_POOL_PATH,
    RESET_STATUS_PATH, RenamePoolReply, RenamePoolRequest, ServerActionPayload,
    server_action_path,
};
use reqwest::{Client, Response, StatusCode, Url};
use serde::Serialize;
use tracing::{debug, info};

mod controller;

pub use controller::{RenameController, ServerActionController};

#[derive(Debug)]
pub enum ApiError {
    /// HTTP 500 from the dashboard.
    ServerFault,
    UnexpectedStatus(StatusCode),
    Transport(reqwest::Error),
    Decode(reqwest::Error),
    /// Empty, `.` or `..` ids cannot name a single reset path segment.
    InvalidServerId(String),
    InvalidUrl(String),
}

impl std::fmt::Display for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::ServerFault => write!(f, "dashboard returned an internal server error"),
            Self::UnexpectedStatus(status) => write!(f, "dashboard returned status {status}"),
            Self::Transport(err) => write!(f, "failed to reach dashboard: {err}"),
            Self::Decode(err) => write!(f, "failed to decode dashboard response: {err}"),
            Self::InvalidServerId(id) => write!(f, "invalid server id '{id}'"),
            Self::InvalidUrl(url) => write!(f, "invalid dashboard url '{url}'"),
        }
    }
}

impl std::error::Error for ApiError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Transport(err) | Self::Decode(err) => Some(err),
            Self::ServerFault
            | Self::UnexpectedStatus(_)
            | Self::InvalidServerId(_)
            | Self::InvalidUrl(_) => None,
        }
    }
}

/// Page-wide "request in flight" flag shared by every clone of a client.
///
/// Cosmetic only: it never blocks a second request.
#[derive(Debug, Clone, Default)]
pub struct BusyIndicator {
    in_flight: Arc<AtomicUsize>,
}

impl BusyIndicator {
    pub fn is_busy(&self) -> bool {
        self.in_flight() > 0
    }

    pub fn in_flight(&self) -> usize {
        self.in_flight.load(Ordering::Acquire)
    }

    pub fn begin(&self) -> BusyGuard {
        if self.in_flight.fetch_add(1, Ordering::AcqRel) == 0 {
            debug!("request started, showing busy indicator");
        }
        BusyGuard {
            in_flight: self.in_flight.clone(),
        }
    }
}

#[derive(Debug)]
pub struct BusyGuard {
    in_flight: Arc<AtomicUsize>,
}

impl Drop for BusyGuard {
    fn drop(&mut self) {
        if self.in_flight.fetch_sub(1, Ordering::AcqRel) == 1 {
            debug!("no requests in flight, hiding busy indicator");
        }
    }
}

/// Calls the dashboard makes on behalf of the page controllers.
pub trait DashboardApi: Send + Sync {
    fn rename_pool(
        &self,
        token: &CsrfToken,
        request: &RenamePoolRequest,
    ) -> impl Future<Output = Result<RenamePoolReply, ApiError>> + Send;

    fn submit_server_action(
        &self,
        token: &CsrfToken,
        verb: &str,
        payload: &ServerActionPayload,
    ) -> impl Future<Output = Result<serde_json::Value, ApiError>> + Send;

    fn reset_status(
        &self,
        token: &CsrfToken,
        server_id: &str,
    ) -> impl Future<Output = Result<String, ApiError>> + Send;

    fn install_server(
        &self,
        token: &CsrfToken,
        request: &InstallServerRequest,
    ) -> impl Future<Output = Result<serde_json::Value, ApiError>> + Send;
}

#[derive(Clone)]
pub struct DashboardClient {
    http: Client,
    base_url: String,
    busy: BusyIndicator,
}

impl DashboardClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self::with_http(Client::new(), base_url)
    }

    pub fn with_http(http: Client, base_url: impl Into<String>) -> Self {
        Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            busy: BusyIndicator::default(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn busy(&self) -> &BusyIndicator {
        &self.busy
    }

    pub fn url_for(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Reset endpoint for one server. The id is percent-encoded as a single
    /// path segment, so `/`, `?` and `#` stay inside it.
    pub fn reset_status_url(&self, server_id: &str) -> Result<Url, ApiError> {
        if matches!(server_id, "" | "." | "..") {
            return Err(ApiError::InvalidServerId(server_id.to_string()));
        }

        let prefix = self.url_for(RESET_STATUS_PATH);
        let mut url = Url::parse(&prefix).map_err(|_| ApiError::InvalidUrl(prefix.clone()))?;
        url.path_segments_mut()
            .map_err(|_| ApiError::InvalidUrl(prefix))?
            .pop_if_empty()
            .push(server_id);
        Ok(url)
    }

    async fn post<B: Serialize + ?Sized>(
        &self,
        token: &CsrfToken,
        url: &str,
        body: Option<&B>,
    ) -> Result<Response, ApiError> {
        let mut request = self.http.post(url).header(CSRF_HEADER, token.as_str());
        request = match body {
            Some(body) => request.json(body),
            None => request.body(""),
        };

        debug!(%url, "posting to dashboard");
        let response = request.send().await.map_err(ApiError::Transport)?;

        match response.status() {
            StatusCode::INTERNAL_SERVER_ERROR => Err(ApiError::ServerFault),
            status if !status.is_success() => Err(ApiError::UnexpectedStatus(status)),
            _ => Ok(response),
        }
    }
}

impl DashboardApi for DashboardClient {
    async fn rename_pool(
        &self,
        token: &CsrfToken,
        request: &RenamePoolRequest,
    ) -> Result<RenamePoolReply, ApiError> {
        let _busy = self.busy.begin();
        let reply = self
            .post(token, &self.url_for(RENAME_POOL_PATH), Some(request))
            .await?
            .json::<RenamePoolReply>()
            .await
            .map_err(ApiError::Decode)?;

        info!(
            pool_id = %request.pool.pool_id,
            status = %reply.status,
            "rename pool answered"
        );
        Ok(reply)
    }

    async fn submit_server_action(
        &self,
        token: &CsrfToken,
        verb: &str,
        payload: &ServerActionPayload,
    ) -> Result<serde_json::Value, ApiError> {
        let _busy = self.busy.begin();
        let value = self
            .post(token, &self.url_for(&server_action_path(verb)), Some(payload))
            .await?
            .json::<serde_json::Value>()
            .await
            .map_err(ApiError::Decode)?;

        info!(verb, records = payload.len(), "server action accepted");
        Ok(value)
    }

    async fn reset_status(
        &self,
        token: &CsrfToken,
        server_id: &str,
    ) -> Result<String, ApiError> {
        let url = self.reset_status_url(server_id)?;
        let _busy = self.busy.begin();
        self.post::<()>(token, url.as_str(), None)
            .await?
            .text()
            .await
            .map_err(ApiError::Decode)
    }

    async fn install_server(
        &self,
        token: &CsrfToken,
        request: &InstallServerRequest,
    ) -> Result<serde_json::Value, ApiError> {
        let _busy = self.busy.begin();
        let value = self
            .post(token, &self.url_for(INSTALL_SERVER_PATH), Some(request))
            .await?
            .json::<serde_json::Value>()
            .await
            .map_err(ApiError::Decode)?;

        info!(server_ip = %request.server_ip, "install server accepted");
        Ok(value)
    }
}
