use anyhow::{Context, Result};
use clap::Parser;
use lazarus_api::{ApiServer, ServerConfig};
use lazarus_core::{
    config::{DEFAULT_ENGINE_ENDPOINT, DEFAULT_STATE_DIR},
    Config, ConfigStore, DirPersister, DockerClient, Engine, NullPersister, Persister,
    Supervisor,
};
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::signal;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Debug, Parser)]
#[command(name = "lazarusd")]
#[command(author, version, about = "Recreates supervised containers when they die", long_about = None)]
struct DaemonArgs {
    /// Container engine endpoint (unix:// or tcp://).
    #[arg(long, env = "LAZARUS_ENGINE", default_value = DEFAULT_ENGINE_ENDPOINT)]
    engine: String,

    /// Directory for persisted configurations. If it does not exist,
    /// supervision runs memory-only.
    #[arg(long, env = "LAZARUS_STATE_DIR", default_value = DEFAULT_STATE_DIR)]
    state_dir: PathBuf,

    /// Listen address for the registration API.
    #[arg(long, env = "LAZARUS_LISTEN", default_value = "0.0.0.0:8080")]
    listen: SocketAddr,
}

impl From<&DaemonArgs> for Config {
    fn from(args: &DaemonArgs) -> Self {
        Self {
            engine_endpoint: args.engine.clone(),
            state_dir: Some(args.state_dir.clone()),
            listen_addr: args.listen,
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "lazarus=info,lazarusd=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_target(false))
        .init();

    run(DaemonArgs::parse()).await
}

async fn run(args: DaemonArgs) -> Result<()> {
    info!("Starting lazarusd...");
    let config = Config::from(&args);

    let client =
        DockerClient::new(&config.engine_endpoint).context("Failed to create engine client")?;
    let engine: Arc<dyn Engine> = Arc::new(client);

    let persister: Box<dyn Persister> = match config.state_dir.as_deref() {
        Some(dir) if dir.is_dir() => Box::new(DirPersister::new(dir)),
        Some(dir) => {
            warn!(
                dir = %dir.display(),
                "state directory does not exist, running memory-only"
            );
            Box::new(NullPersister)
        }
        None => Box::new(NullPersister),
    };

    let store = Arc::new(ConfigStore::new(persister));
    if let Err(e) = store.load() {
        warn!(error = %e, "failed to load persisted configurations");
    }

    let shutdown = CancellationToken::new();

    let supervisor = Supervisor::new(Arc::clone(&engine), Arc::clone(&store));
    let supervisor_token = shutdown.clone();
    let mut supervisor_handle =
        tokio::spawn(async move { supervisor.run(supervisor_token).await });

    let server = ApiServer::new(
        ServerConfig {
            listen_addr: config.listen_addr,
        },
        Arc::clone(&store),
        Arc::clone(&engine),
    );
    let mut api_handle = tokio::spawn(async move { server.run().await });

    info!(
        engine = %config.engine_endpoint,
        listen = %config.listen_addr,
        "lazarusd started"
    );

    let exit = tokio::select! {
        result = &mut supervisor_handle => Exit::Supervisor(result),
        result = &mut api_handle => Exit::Api(result),
        () = shutdown_signal() => Exit::Signal,
    };

    match exit {
        // Losing the feed means no supervision guarantee at all.
        Exit::Supervisor(result) => {
            api_handle.abort();
            match result {
                Ok(Ok(())) => Ok(()),
                Ok(Err(e)) => Err(e).context("Supervisor terminated"),
                Err(e) => Err(e).context("Supervisor task panicked"),
            }
        }
        Exit::Api(result) => {
            shutdown.cancel();
            match result {
                Ok(Ok(())) => Ok(()),
                Ok(Err(e)) => Err(e).context("Registration API terminated"),
                Err(e) => Err(e).context("Registration API task panicked"),
            }
        }
        Exit::Signal => {
            info!("Shutdown signal received");
            shutdown.cancel();
            api_handle.abort();
            if let Ok(Err(e)) = supervisor_handle.await {
                warn!(error = %e, "supervisor exited with error during shutdown");
            }
            info!("lazarusd stopped");
            Ok(())
        }
    }
}

enum Exit {
    Supervisor(std::result::Result<lazarus_core::Result<()>, tokio::task::JoinError>),
    Api(std::result::Result<lazarus_api::Result<()>, tokio::task::JoinError>),
    Signal,
}

async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
