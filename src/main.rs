use anyhow::Context;
use clap::{Parser, Subcommand};
use keyhub::config::Settings;
use keyhub::store::{MemoryStore, PostgresStore, Store};
use keyhub::{create_app, db, AppState};
use std::sync::Arc;
use tracing::{info, warn};

/// KeyHub - API key and device authorization service
#[derive(Parser)]
#[command(name = "keyhub")]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Run the HTTP server (default)
    Serve {
        /// Keep all data in process memory instead of PostgreSQL
        #[arg(long)]
        ephemeral: bool,
    },
    /// Apply database migrations and exit
    Migrate,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "keyhub=info,tower_http=debug".into()),
        )
        .finish();
    tracing::subscriber::set_global_default(subscriber)
        .context("Failed to set tracing subscriber")?;

    let cli = Cli::parse();
    let settings = Settings::load().context("Failed to load application settings")?;

    match cli.command.unwrap_or(Command::Serve { ephemeral: false }) {
        Command::Serve { ephemeral } => serve(settings, ephemeral).await,
        Command::Migrate => {
            let pool = db::connect(&settings).await?;
            db::run_migrations(&pool).await
        }
    }
}

async fn serve(settings: Settings, ephemeral: bool) -> anyhow::Result<()> {
    let store: Arc<dyn Store> = if ephemeral {
        warn!("Running with the in-memory store; data is lost on exit");
        Arc::new(MemoryStore::new())
    } else {
        let pool = db::create_pool(&settings).await?;
        info!(
            max_connections = settings.database_max_connections,
            "Database pool established"
        );
        Arc::new(PostgresStore::new(pool))
    };

    let addr = settings.socket_addr()?;
    let state = AppState::new(store, settings);
    let app = create_app(state).await;

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind to {}", addr))?;
    info!("Listening on {}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    info!("Shutdown completed");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                warn!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, starting graceful shutdown");
        },
        _ = terminate => {
            info!("Received terminate signal, starting graceful shutdown");
        },
    }
}
