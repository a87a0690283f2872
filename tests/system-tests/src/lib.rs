#[cfg(test)]
mod tests {
    use std::ffi::OsString;
    use std::fs;
    use std::net::SocketAddr;
    use std::path::PathBuf;
    use std::process::Stdio;
    use std::sync::{Arc, Mutex, OnceLock};
    use std::time::{Duration, SystemTime};

    use anyhow::{Context, Result, bail};
    use axum::Router;
    use axum::body::Bytes;
    use axum::extract::State;
    use axum::http::{HeaderMap, StatusCode, Uri};
    use axum::response::{IntoResponse, Response};
    use client_sdk::{
        ApiError, DashboardApi, DashboardClient, RenameController, ServerActionController,
    };
    use common::{CsrfToken, InstallServerRequest};
    use console_core::{RenameForm, ServerAction, ServerPage, ServerRow, UiEffect};
    use tokio::process::{Child, Command};
    use tokio::time::sleep;

    #[derive(Debug, Clone)]
    struct Recorded {
        path: String,
        csrf: Option<String>,
        body: String,
    }

    #[derive(Clone, Default)]
    struct MockDashboard {
        requests: Arc<Mutex<Vec<Recorded>>>,
    }

    impl MockDashboard {
        fn requests(&self) -> Vec<Recorded> {
            self.requests.lock().unwrap().clone()
        }
    }

    async fn mock_handler(
        State(mock): State<MockDashboard>,
        uri: Uri,
        headers: HeaderMap,
        body: Bytes,
    ) -> Response {
        let path = uri.path().to_string();
        let body = String::from_utf8_lossy(&body).to_string();
        mock.requests.lock().unwrap().push(Recorded {
            path: path.clone(),
            csrf: headers
                .get("x-csrftoken")
                .and_then(|value| value.to_str().ok())
                .map(ToString::to_string),
            body: body.clone(),
        });

        if path == "/dashboard/vsm/poolsmanagement/rename_pool_action/" {
            if body.contains("\"boom\"") {
                return StatusCode::INTERNAL_SERVER_ERROR.into_response();
            }
            if body.contains("\"taken\"") {
                return axum::Json(serde_json::json!({
                    "status": "Failed",
                    "message": "pool taken already exists"
                }))
                .into_response();
            }
            return axum::Json(serde_json::json!({
                "status": "OK",
                "message": "pool 3 renamed"
            }))
            .into_response();
        }

        if path.ends_with("/reset_status/slow") {
            sleep(Duration::from_millis(300)).await;
        }

        if body.contains("forbidden") {
            return StatusCode::FORBIDDEN.into_response();
        }

        axum::Json(serde_json::json!({})).into_response()
    }

    async fn start_mock_dashboard() -> Result<(MockDashboard, String)> {
        let mock = MockDashboard::default();
        let app = Router::new()
            .fallback(mock_handler)
            .with_state(mock.clone());

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .context("failed to bind mock dashboard")?;
        let addr: SocketAddr = listener.local_addr()?;
        tokio::spawn(async move {
            let _ = axum::serve(listener, app).await;
        });

        Ok((mock, format!("http://{addr}")))
    }

    fn remove_page() -> ServerPage {
        ServerPage {
            title: "Remove Servers".to_string(),
            csrf_token: CsrfToken::new("tok-123"),
            rows: vec![
                ServerRow {
                    monitor_tag: Some("yes".to_string()),
                    remove_storage: Some(false),
                    ..ServerRow::new("server_list__row__1", "1").checked()
                },
                ServerRow {
                    monitor_tag: Some("yes".to_string()),
                    ..ServerRow::new("server_list__row__2", "2")
                },
                ServerRow {
                    monitor_tag: Some("no".to_string()),
                    remove_storage: Some(true),
                    ..ServerRow::new("server_list__row__3", "3").checked()
                },
            ],
            ..ServerPage::default()
        }
    }

    #[tokio::test]
    async fn rename_posts_wrapped_pool_with_csrf_header() -> Result<()> {
        let (mock, base_url) = start_mock_dashboard().await?;
        let controller = RenameController::new(DashboardClient::new(&base_url));

        let effect = controller
            .submit(&RenameForm {
                pool_id: "3".to_string(),
                new_name: "gold".to_string(),
                csrf_token: CsrfToken::new("tok-123"),
            })
            .await;

        assert_eq!(effect, UiEffect::navigate("/dashboard/vsm/poolsmanagement/"));
        let requests = mock.requests();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].csrf.as_deref(), Some("tok-123"));
        let body: serde_json::Value = serde_json::from_str(&requests[0].body)?;
        assert_eq!(
            body,
            serde_json::json!({ "pool": { "pool_id": "3", "name": "gold" } })
        );
        Ok(())
    }

    #[tokio::test]
    async fn rename_maps_rejection_and_fault_to_tips() -> Result<()> {
        let (_mock, base_url) = start_mock_dashboard().await?;
        let controller = RenameController::new(DashboardClient::new(&base_url));
        let form = |name: &str| RenameForm {
            pool_id: "3".to_string(),
            new_name: name.to_string(),
            csrf_token: CsrfToken::new("tok-123"),
        };

        assert_eq!(
            controller.submit(&form("taken")).await,
            UiEffect::error("pool taken already exists")
        );
        assert_eq!(
            controller.submit(&form("boom")).await,
            UiEffect::error("INTERNAL SERVER ERROR")
        );
        Ok(())
    }

    #[tokio::test]
    async fn remove_servers_posts_only_checked_rows() -> Result<()> {
        let (mock, base_url) = start_mock_dashboard().await?;
        let controller = ServerActionController::new(DashboardClient::new(&base_url));

        let effect = controller.submit(&remove_page()).await;

        assert_eq!(effect, UiEffect::navigate("/dashboard/vsm/storageservermgmt/"));
        let requests = mock.requests();
        assert_eq!(requests.len(), 1);
        assert_eq!(
            requests[0].path,
            "/dashboard/vsm/storageservermgmt/servers/remove"
        );
        let body: serde_json::Value = serde_json::from_str(&requests[0].body)?;
        assert_eq!(
            body,
            serde_json::json!([
                { "id": "1", "remove_monitor": true, "remove_storage": false },
                { "id": "3", "remove_monitor": false, "remove_storage": true }
            ])
        );
        Ok(())
    }

    #[tokio::test]
    async fn unknown_title_reaches_no_endpoint() -> Result<()> {
        let (mock, base_url) = start_mock_dashboard().await?;
        let controller = ServerActionController::new(DashboardClient::new(&base_url));
        let mut page = remove_page();
        page.title = "Cluster Server List".to_string();

        assert_eq!(controller.submit(&page).await, UiEffect::None);
        assert!(mock.requests().is_empty());
        Ok(())
    }

    #[tokio::test]
    async fn reset_status_posts_empty_body() -> Result<()> {
        let (mock, base_url) = start_mock_dashboard().await?;
        let client = DashboardClient::new(&base_url);

        client.reset_status(&CsrfToken::new("tok-123"), "12").await?;

        let requests = mock.requests();
        assert_eq!(
            requests[0].path,
            "/dashboard/vsm/storageservermgmt/reset_status/12"
        );
        assert!(requests[0].body.is_empty());
        assert_eq!(requests[0].csrf.as_deref(), Some("tok-123"));
        Ok(())
    }

    #[tokio::test]
    async fn reset_status_keeps_server_id_inside_reset_path() -> Result<()> {
        let (mock, base_url) = start_mock_dashboard().await?;
        let client = DashboardClient::new(&base_url);
        let token = CsrfToken::new("tok-123");

        client
            .reset_status(&token, "../../poolsmanagement/rename_pool_action/")
            .await?;
        client.reset_status(&token, "7?x=1").await?;

        let paths: Vec<String> = mock
            .requests()
            .into_iter()
            .map(|request| request.path)
            .collect();
        assert_eq!(
            paths,
            [
                "/dashboard/vsm/storageservermgmt/reset_status/\
                 ..%2F..%2Fpoolsmanagement%2Frename_pool_action%2F",
                "/dashboard/vsm/storageservermgmt/reset_status/7%3Fx=1",
            ]
        );
        Ok(())
    }

    #[tokio::test]
    async fn reset_status_refuses_dot_segment_ids() -> Result<()> {
        let (mock, base_url) = start_mock_dashboard().await?;
        let client = DashboardClient::new(&base_url);

        for id in ["", ".", ".."] {
            let err = client
                .reset_status(&CsrfToken::new("tok-123"), id)
                .await
                .unwrap_err();
            assert!(matches!(err, ApiError::InvalidServerId(_)), "{err}");
        }

        assert!(mock.requests().is_empty());
        assert!(!client.busy().is_busy());
        Ok(())
    }

    #[tokio::test]
    async fn busy_indicator_covers_outstanding_request() -> Result<()> {
        let (_mock, base_url) = start_mock_dashboard().await?;
        let client = DashboardClient::new(&base_url);
        let background = client.clone();

        let pending = tokio::spawn(async move {
            background
                .reset_status(&CsrfToken::new("tok-123"), "slow")
                .await
        });

        sleep(Duration::from_millis(100)).await;
        assert!(client.busy().is_busy());

        pending.await??;
        assert!(!client.busy().is_busy());
        Ok(())
    }

    #[tokio::test]
    async fn install_server_surfaces_unhandled_status() -> Result<()> {
        let (mock, base_url) = start_mock_dashboard().await?;
        let client = DashboardClient::new(&base_url);

        let result = client
            .install_server(
                &CsrfToken::new("tok-123"),
                &InstallServerRequest {
                    server_ip: "forbidden".to_string(),
                    ssh_user_name: "ceph".to_string(),
                },
            )
            .await;

        match result {
            Err(ApiError::UnexpectedStatus(status)) => {
                assert_eq!(status, reqwest::StatusCode::FORBIDDEN)
            }
            other => bail!("expected forbidden status, got {other:?}"),
        }
        let body: serde_json::Value = serde_json::from_str(&mock.requests()[0].body)?;
        assert_eq!(
            body,
            serde_json::json!({ "serverIp": "forbidden", "sshUserName": "ceph" })
        );
        Ok(())
    }

    #[tokio::test]
    async fn cli_servers_submits_page_file() -> Result<()> {
        let (mock, base_url) = start_mock_dashboard().await?;
        let page_file = fresh_temp_file("remove-page.json");
        fs::write(&page_file, serde_json::to_string(&remove_page())?)?;

        let output = run_cli(&[
            "--dashboard-url",
            &base_url,
            "servers",
            "--page-file",
            page_file.to_str().context("temp path is not utf-8")?,
            "--mode",
            "stop_servers",
        ])
        .await?;

        assert!(output.contains("/dashboard/vsm/storageservermgmt/"));
        let requests = mock.requests();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].path, "/dashboard/vsm/storageservermgmt/servers/stop");
        assert_eq!(requests[0].csrf.as_deref(), Some("tok-123"));
        Ok(())
    }

    #[tokio::test]
    async fn cli_ceph_upgrade_sends_single_record() -> Result<()> {
        let (mock, base_url) = start_mock_dashboard().await?;

        run_cli(&[
            "--dashboard-url",
            &base_url,
            "--csrf-token",
            "tok-cli",
            "ceph-upgrade",
            "--package-url",
            "http://mirror/ceph",
            "--key-url",
            "http://mirror/release.asc",
        ])
        .await?;

        let requests = mock.requests();
        assert_eq!(
            requests[0].path,
            "/dashboard/vsm/storageservermgmt/servers/ceph_upgrade"
        );
        assert_eq!(requests[0].csrf.as_deref(), Some("tok-cli"));
        let body: serde_json::Value = serde_json::from_str(&requests[0].body)?;
        assert_eq!(
            body,
            serde_json::json!([
                { "pkg_url": "http://mirror/ceph", "key_url": "http://mirror/release.asc" }
            ])
        );
        Ok(())
    }

    #[tokio::test]
    async fn cli_web_console_proxies_server_submit() -> Result<()> {
        let (mock, base_url) = start_mock_dashboard().await?;
        let bind = "127.0.0.1:19181";
        let mut cli_web = start_cli_web(bind, &base_url).await?;

        let mut page = remove_page();
        page.title = String::new();
        page.mode = Some(ServerAction::StartServers);

        let effect = reqwest::Client::new()
            .post(format!("http://{bind}/api/servers/submit"))
            .json(&page)
            .send()
            .await
            .context("failed to call web console")?
            .error_for_status()
            .context("web console returned error status")?
            .json::<UiEffect>()
            .await
            .context("failed to decode web console effect")?;

        stop_child(&mut cli_web).await;

        assert_eq!(
            effect,
            UiEffect::navigate(format!("{base_url}/dashboard/vsm/storageservermgmt/"))
        );
        let requests = mock.requests();
        assert_eq!(requests[0].path, "/dashboard/vsm/storageservermgmt/servers/start");
        let body: serde_json::Value = serde_json::from_str(&requests[0].body)?;
        assert_eq!(body, serde_json::json!([{ "id": "1" }, { "id": "3" }]));
        Ok(())
    }

    #[tokio::test]
    async fn cli_web_console_reports_busy_and_escapes_reset_id() -> Result<()> {
        let (mock, base_url) = start_mock_dashboard().await?;
        let bind = "127.0.0.1:19182";
        let mut cli_web = start_cli_web(bind, &base_url).await?;
        let http = reqwest::Client::new();

        let busy = http
            .get(format!("http://{bind}/api/busy"))
            .send()
            .await
            .context("failed to call web console")?
            .error_for_status()?
            .json::<serde_json::Value>()
            .await?;

        let escaped_id = "..%2F..%2Fpoolsmanagement%2Frename_pool_action%2F";
        let effect = http
            .post(format!("http://{bind}/api/servers/reset-status/{escaped_id}"))
            .json(&serde_json::json!({ "csrf_token": "tok-123" }))
            .send()
            .await
            .context("failed to call web console")?
            .error_for_status()?
            .json::<UiEffect>()
            .await?;

        stop_child(&mut cli_web).await;

        assert_eq!(busy, serde_json::json!({ "busy": false, "in_flight": 0 }));
        assert_eq!(effect, UiEffect::None);
        let requests = mock.requests();
        assert_eq!(requests.len(), 1);
        assert_eq!(
            requests[0].path,
            format!("/dashboard/vsm/storageservermgmt/reset_status/{escaped_id}")
        );
        assert_eq!(requests[0].csrf.as_deref(), Some("tok-123"));
        Ok(())
    }

    async fn run_cli(args: &[&str]) -> Result<String> {
        let cli_bin = binary_path("vsm-console")?;
        let output = Command::new(cli_bin)
            .args(args)
            .env_remove("VSM_CSRF_TOKEN")
            .env_remove("VSM_DASHBOARD_URL")
            .output()
            .await
            .context("failed to execute vsm-console")?;

        if !output.status.success() {
            bail!(
                "vsm-console failed: {}",
                String::from_utf8_lossy(&output.stderr)
            );
        }

        Ok(String::from_utf8_lossy(&output.stdout).to_string())
    }

    async fn start_cli_web(bind: &str, dashboard_url: &str) -> Result<Child> {
        let cli_bin = binary_path("vsm-console")?;

        let child = Command::new(cli_bin)
            .arg("--dashboard-url")
            .arg(dashboard_url)
            .arg("serve-web")
            .arg("--bind")
            .arg(bind)
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .kill_on_drop(true)
            .spawn()
            .context("failed to spawn vsm-console serve-web")?;

        wait_for_url_status(&format!("http://{bind}/api/ping"), StatusCode::OK, 40).await?;
        Ok(child)
    }

    async fn wait_for_url_status(url: &str, expected: StatusCode, retries: usize) -> Result<()> {
        let http = reqwest::Client::new();

        for _ in 0..retries {
            if let Ok(resp) = http.get(url).send().await
                && resp.status().as_u16() == expected.as_u16()
            {
                return Ok(());
            }
            sleep(Duration::from_millis(100)).await;
        }

        bail!("service did not return {expected} at {url}");
    }

    async fn stop_child(child: &mut Child) {
        let _ = child.kill().await;
        let _ = child.wait().await;
    }

    fn binary_path(name: &str) -> Result<PathBuf> {
        let workspace_root = workspace_root()?;
        ensure_binaries_built(&workspace_root)?;
        let mut path = workspace_root.join("target").join("debug").join(name);

        if let Some(suffix) = std::env::consts::EXE_SUFFIX.strip_prefix('.') {
            let mut filename = OsString::from(name);
            filename.push(".");
            filename.push(suffix);
            path = workspace_root.join("target").join("debug").join(filename);
        }

        if !path.exists() {
            bail!("expected binary does not exist: {}", path.display());
        }

        Ok(path)
    }

    fn workspace_root() -> Result<PathBuf> {
        let crate_dir = PathBuf::from(env!("CARGO_MANIFEST_DIR"));
        crate_dir
            .parent()
            .and_then(|p| p.parent())
            .map(PathBuf::from)
            .context("failed to resolve workspace root")
    }

    fn ensure_binaries_built(workspace_root: &PathBuf) -> Result<()> {
        static BUILD_RESULT: OnceLock<std::result::Result<(), String>> = OnceLock::new();

        let result = BUILD_RESULT.get_or_init(|| {
            let status = std::process::Command::new("cargo")
                .arg("build")
                .arg("-p")
                .arg("cli-client")
                .current_dir(workspace_root)
                .status()
                .map_err(|err| format!("failed to run cargo build: {err}"))?;

            if status.success() {
                Ok(())
            } else {
                Err("cargo build -p cli-client failed".to_string())
            }
        });

        if let Err(message) = result {
            bail!("failed to build required binaries: {message}");
        }

        Ok(())
    }

    fn fresh_temp_file(name: &str) -> PathBuf {
        let unique = SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .map(|d| d.as_nanos())
            .unwrap_or(0);
        std::env::temp_dir().join(format!("vsm-console-{unique}-{name}"))
    }
}
