use std::fs;
use std::net::SocketAddr;
use std::path::{Path as FsPath, PathBuf};

use anyhow::{Context, Result, bail};
use axum::extract::{Path, State};
use axum::response::{Html, IntoResponse};
use axum::routing::{get, post};
use axum::{Json, Router};
use clap::{Parser, Subcommand};
use client_sdk::{DashboardClient, RenameController, ServerActionController};
use common::{CsrfToken, add_server_detail_path};
use console_core::{
    ActionDescriptor, InstallServerForm, RenameForm, ServerAction, ServerPage, ServerRow,
    TipLevel, UiEffect, resolve_action, server_id_list,
};
use serde::Deserialize;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Clone)]
struct WebState {
    csrf_token: CsrfToken,
    client: DashboardClient,
}

impl WebState {
    fn token_or_default(&self, token: &CsrfToken) -> CsrfToken {
        if token.as_str().is_empty() {
            self.csrf_token.clone()
        } else {
            token.clone()
        }
    }
}

#[derive(Debug, Parser)]
#[command(name = "vsm-console")]
#[command(about = "Console for the VSM storage cluster dashboard")]
struct Cli {
    #[arg(long, env = "VSM_DASHBOARD_URL", default_value = "http://127.0.0.1:8080")]
    dashboard_url: String,
    /// Value of the dashboard's `csrfmiddlewaretoken` field.
    #[arg(long, env = "VSM_CSRF_TOKEN", default_value = "")]
    csrf_token: String,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Print the action a page heading maps to.
    ResolveAction {
        label: String,
    },
    RenamePool {
        #[arg(long)]
        pool_id: String,
        #[arg(long)]
        name: String,
    },
    /// Submit a server-management page snapshot (JSON) in its current mode.
    Servers {
        #[arg(long)]
        page_file: PathBuf,
        #[arg(long, value_parser = parse_mode)]
        mode: Option<ServerAction>,
    },
    /// Print the selection of a page snapshot and its add-server detail link.
    Selection {
        #[arg(long)]
        page_file: PathBuf,
    },
    CephUpgrade {
        #[arg(long)]
        package_url: String,
        #[arg(long)]
        key_url: String,
    },
    ResetStatus {
        server_id: String,
    },
    InstallServer {
        #[arg(long)]
        server_ip: String,
        #[arg(long)]
        ssh_user_name: String,
    },
    ServeWeb {
        #[arg(long, default_value = "127.0.0.1:8081")]
        bind: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .with_target(false)
        .compact()
        .init();

    let cli = Cli::parse();
    let client = DashboardClient::new(&cli.dashboard_url);
    let csrf_token = CsrfToken::new(cli.csrf_token.clone());

    match cli.command {
        Commands::ResolveAction { label } => {
            let descriptor = resolve_action(&label);
            println!("{}", serde_json::to_string_pretty(&descriptor)?);
        }
        Commands::RenamePool { pool_id, name } => {
            let form = RenameForm {
                pool_id,
                new_name: name,
                csrf_token,
            };
            let effect = RenameController::new(client.clone()).submit(&form).await;
            report(&client, &effect)?;
        }
        Commands::Servers { page_file, mode } => {
            let mut page = load_page(&page_file)?;
            if mode.is_some() {
                page.mode = mode;
            }
            if page.csrf_token.as_str().is_empty() {
                page.csrf_token = csrf_token;
            }
            let effect = ServerActionController::new(client.clone())
                .submit(&page)
                .await;
            report(&client, &effect)?;
        }
        Commands::Selection { page_file } => {
            let page = load_page(&page_file)?;
            let ids = server_id_list(&page.rows);
            if ids.is_empty() {
                bail!("no servers selected in {}", page_file.display());
            }
            println!("selected: {ids}");
            println!("{}", client.url_for(&add_server_detail_path(&ids)));
        }
        Commands::CephUpgrade {
            package_url,
            key_url,
        } => {
            let page = ServerPage {
                csrf_token,
                package_url,
                key_url,
                ..ServerPage::default()
            };
            let effect = ServerActionController::new(client.clone())
                .ceph_upgrade(&page)
                .await;
            report(&client, &effect)?;
        }
        Commands::ResetStatus { server_id } => {
            let row = server_row(&server_id);
            ServerActionController::new(client.clone())
                .reset_status(&csrf_token, &row)
                .await;
        }
        Commands::InstallServer {
            server_ip,
            ssh_user_name,
        } => {
            let form = InstallServerForm {
                server_ip,
                ssh_user_name,
                csrf_token,
            };
            let effect = ServerActionController::new(client.clone())
                .install_server(&form)
                .await;
            report(&client, &effect)?;
        }
        Commands::ServeWeb { bind } => {
            let bind_addr: SocketAddr = bind.parse()?;
            let state = WebState { csrf_token, client };

            let app = Router::new()
                .route("/", get(|| async { Html(web_ui::app_html()) }))
                .route("/api/busy", get(web_busy))
                .route("/api/actions/resolve", post(web_resolve))
                .route("/api/pools/rename", post(web_rename))
                .route("/api/servers/submit", post(web_servers_submit))
                .route("/api/servers/ceph-upgrade", post(web_ceph_upgrade))
                .route(
                    "/api/servers/reset-status/{server_id}",
                    post(web_reset_status),
                )
                .route("/api/servers/install", post(web_install))
                .route(
                    "/api/ping",
                    get(|| async {
                        Json(serde_json::json!({
                            "ok": true,
                            "service": "vsm-console-web"
                        }))
                    }),
                )
                .with_state(state);

            info!(%bind_addr, "web console listening");
            let listener = tokio::net::TcpListener::bind(bind_addr).await?;
            axum::serve(listener, app).await?;
        }
    }

    Ok(())
}

fn parse_mode(raw: &str) -> Result<ServerAction, String> {
    serde_json::from_value(serde_json::Value::String(raw.to_string())).map_err(|_| {
        let known = ServerAction::ALL
            .iter()
            .map(|action| serde_json::to_string(action).unwrap_or_default())
            .collect::<Vec<_>>()
            .join(", ");
        format!("unknown mode '{raw}', expected one of {known}")
    })
}

fn load_page(path: &FsPath) -> Result<ServerPage> {
    let json = fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    serde_json::from_str(&json).with_context(|| format!("failed to parse {}", path.display()))
}

fn server_row(server_id: &str) -> ServerRow {
    ServerRow {
        server_id: Some(server_id.to_string()),
        ..ServerRow::new(server_id, server_id)
    }
}

/// Rewrites navigation targets to absolute dashboard URLs.
fn absolute(client: &DashboardClient, effect: UiEffect) -> UiEffect {
    match effect {
        UiEffect::Navigate { url } => UiEffect::navigate(client.url_for(&url)),
        other => other,
    }
}

fn report(client: &DashboardClient, effect: &UiEffect) -> Result<()> {
    match absolute(client, effect.clone()) {
        UiEffect::Navigate { url } => println!("done, continue at {url}"),
        UiEffect::ShowTip {
            level: TipLevel::Warning,
            message,
        } => println!("warning: {message}"),
        UiEffect::ShowTip {
            level: TipLevel::Error,
            message,
        } => bail!("{message}"),
        UiEffect::None => println!("nothing to do"),
    }
    Ok(())
}

#[derive(Debug, Deserialize)]
struct WebResolveRequest {
    label: String,
}

#[derive(Debug, Default, Deserialize)]
struct WebResetRequest {
    #[serde(default)]
    csrf_token: CsrfToken,
}

async fn web_busy(State(state): State<WebState>) -> impl IntoResponse {
    let busy = state.client.busy();
    Json(serde_json::json!({
        "busy": busy.is_busy(),
        "in_flight": busy.in_flight()
    }))
}

async fn web_resolve(Json(request): Json<WebResolveRequest>) -> Json<ActionDescriptor> {
    Json(resolve_action(&request.label))
}

async fn web_rename(
    State(state): State<WebState>,
    Json(mut form): Json<RenameForm>,
) -> Json<UiEffect> {
    form.csrf_token = state.token_or_default(&form.csrf_token);
    let effect = RenameController::new(state.client.clone())
        .submit(&form)
        .await;
    Json(absolute(&state.client, effect))
}

async fn web_servers_submit(
    State(state): State<WebState>,
    Json(mut page): Json<ServerPage>,
) -> Json<UiEffect> {
    page.csrf_token = state.token_or_default(&page.csrf_token);
    let effect = ServerActionController::new(state.client.clone())
        .submit(&page)
        .await;
    Json(absolute(&state.client, effect))
}

async fn web_ceph_upgrade(
    State(state): State<WebState>,
    Json(mut page): Json<ServerPage>,
) -> Json<UiEffect> {
    page.csrf_token = state.token_or_default(&page.csrf_token);
    let effect = ServerActionController::new(state.client.clone())
        .ceph_upgrade(&page)
        .await;
    Json(absolute(&state.client, effect))
}

async fn web_reset_status(
    State(state): State<WebState>,
    Path(server_id): Path<String>,
    Json(request): Json<WebResetRequest>,
) -> Json<UiEffect> {
    let token = state.token_or_default(&request.csrf_token);
    let effect = ServerActionController::new(state.client.clone())
        .reset_status(&token, &server_row(&server_id))
        .await;
    Json(effect)
}

async fn web_install(
    State(state): State<WebState>,
    Json(mut form): Json<InstallServerForm>,
) -> Json<UiEffect> {
    form.csrf_token = state.token_or_default(&form.csrf_token);
    let effect = ServerActionController::new(state.client.clone())
        .install_server(&form)
        .await;
    Json(absolute(&state.client, effect))
}
