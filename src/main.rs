//! gacha-tally binary entrypoint wiring the CLI, file store, and HTTP API.

use std::{env, net::SocketAddr, process::Stdio, time::Duration};

use anyhow::Context;
use axum::Router;
use clap::Parser;
use tokio::net::TcpListener;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use gacha_tally::{
    cli::{Cli, Command},
    config::{self, EnvConfig, Settings},
    dao::{Workspace, message_map::FileMessageIdStore},
    services::tally_service,
    state::AppState,
};

/// How long the auto-serve probe waits for an existing server to answer.
const HEALTH_PROBE_TIMEOUT: Duration = Duration::from_millis(800);

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();

    let workspace = Workspace::discover();
    workspace
        .ensure_dirs()
        .context("creating workspace directories")?;

    if let Err(err) = config::ensure_settings(&workspace) {
        warn!(error = %err, "could not materialize setting.json");
    }
    if let Err(err) = FileMessageIdStore::new(workspace.message_map_path()).ensure_exists() {
        warn!(error = %err, "could not materialize the Discord message map");
    }

    let env_config = EnvConfig::load(&workspace);
    let settings = Settings::load(&workspace);
    let cli = Cli::parse();

    if !matches!(cli.command, Some(Command::Serve { .. })) {
        ensure_server_running(&settings).await;
    }

    match cli.command {
        Some(Command::Reset) => {
            tally_service::reset(&workspace, &env_config).await?;
            println!("reset: completed");
        }
        Some(Command::GenDatajs) => {
            tally_service::regenerate_export(&workspace)?;
            println!("gen-datajs: completed");
        }
        Some(Command::Backup) => {
            let path = tally_service::backup(&workspace)?;
            println!("backup: completed ({})", path.display());
        }
        Some(Command::Restore { name }) => {
            tally_service::restore(&workspace, &name)?;
            println!("restore: completed");
        }
        Some(Command::GenBackupIndex) => {
            tally_service::regenerate_backup_index(&workspace)?;
            println!("gen-backup-index: completed");
        }
        Some(Command::Serve { port }) => {
            let port = port.unwrap_or(settings.server_port);
            serve(workspace, env_config, port).await?;
        }
        None => match (cli.winner, cli.flag) {
            (Some(winner), Some(flag)) => {
                tally_service::record_win(&workspace, &env_config, &winner, &flag).await?;
                println!("update: completed");
            }
            _ => {
                use clap::CommandFactory;

                Cli::command().print_help().context("printing help")?;
                std::process::exit(2);
            }
        },
    }

    Ok(())
}

/// Probe the configured port and spawn a detached `serve` process when no
/// server answers. Failures here never block the tally operation itself.
async fn ensure_server_running(settings: &Settings) {
    if !settings.auto_serve {
        return;
    }

    let port = settings.server_port;
    let url = format!("http://127.0.0.1:{port}/api/health");
    let probe = reqwest::Client::builder()
        .timeout(HEALTH_PROBE_TIMEOUT)
        .build();
    if let Ok(client) = probe
        && let Ok(response) = client.get(&url).send().await
        && response.status().is_success()
    {
        return;
    }

    let exe = match env::current_exe() {
        Ok(exe) => exe,
        Err(err) => {
            warn!(error = %err, "cannot resolve the current executable for auto-serve");
            return;
        }
    };

    match std::process::Command::new(exe)
        .arg("serve")
        .arg(port.to_string())
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .spawn()
    {
        Ok(child) => info!(port, pid = child.id(), "spawned a background server"),
        Err(err) => warn!(error = %err, "failed to spawn the background server"),
    }
}

/// Run the HTTP API until interrupted.
async fn serve(workspace: Workspace, env_config: EnvConfig, port: u16) -> anyhow::Result<()> {
    let app_state = AppState::new(workspace, env_config);
    let app = build_router(app_state);

    let addr = SocketAddr::from(([127, 0, 0, 1], port));
    info!(%addr, "starting server");

    let listener = TcpListener::bind(addr).await.context("binding server")?;
    axum::serve(listener, app.into_make_service())
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("serving axum")?;

    Ok(())
}

/// Build the top-level router and attach cross-cutting middleware layers.
fn build_router(state: gacha_tally::state::SharedState) -> Router<()> {
    gacha_tally::routes::router(state)
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
}

/// Configure tracing subscribers so logs include spans by default.
fn init_tracing() {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "info,tower_http=debug".into());
    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer())
        .init();
}

/// Wait for Ctrl+C or SIGTERM and shut the server down gracefully.
async fn shutdown_signal() {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{SignalKind, signal};

        let mut term = signal(SignalKind::terminate()).expect("install SIGTERM handler");
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {},
            _ = term.recv() => {},
        }
    }

    #[cfg(not(unix))]
    {
        let _ = tokio::signal::ctrl_c().await;
    }
}
