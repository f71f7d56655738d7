use ayurvati::{bus, config, history, identity, interface, session, transport};
use std::sync::Arc;
use tracing::{error, info};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env file
    if let Err(e) = dotenvy::dotenv() {
        // It's not fatal if .env doesn't exist, but good to know
        info!("No .env file found or failed to load: {}", e);
    }

    // Log to stderr so the conversation owns stdout
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let config = config::Config::from_env()?;
    info!("Ayurvati client starting against {}", config.backend_url);

    let bus = Arc::new(bus::EventBus::new());
    let identity: Arc<dyn identity::IdentityProvider> =
        Arc::new(identity::LocalIdentityProvider::from_config(&config));
    let transport = Arc::new(transport::HttpTransport::new(config.backend_url.clone())?);

    let session = Arc::new(session::SessionStore::new(
        transport.clone(),
        identity.clone(),
        bus.clone(),
    ));
    let history = Arc::new(history::HistoryLoader::new(
        transport.clone(),
        identity.clone(),
        bus.clone(),
    ));
    let history_watcher = history.watch_identity();

    let terminal = interface::terminal::TerminalInterface::new(
        bus,
        session,
        history,
        identity,
        transport,
        config.log_chat,
    );

    tokio::select! {
        _ = tokio::signal::ctrl_c() => {
            info!("Received Ctrl+C, shutting down...");
        }
        res = terminal.run() => {
            if let Err(e) = res {
                error!("Terminal stopped with error: {}", e);
            }
        }
    }

    history_watcher.abort();
    Ok(())
}
