/// Chatlog API Server
///
/// Serves the chat history page and the endpoints behind its controls:
/// start/abort a fetch, poll progress, search, and download `messages.txt`.
mod routes;

use std::sync::Arc;

use tracing::info;

use chatlog_fetcher::FetchService;
use chatlog_shared::config::Config;

/// Shared application state for all API handlers.
pub struct AppState {
    pub service: FetchService,
    pub config: Config,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env
    dotenvy::dotenv().ok();

    // Init tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                "chatlog_api=info,chatlog_fetcher=info,tower_http=info".into()
            }),
        )
        .init();

    let config = Config::from_env()?;
    info!(
        "Kick API: {} (step delay {:?}, excluded sender {:?})",
        config.api_base, config.step_delay, config.excluded_sender
    );

    let service = FetchService::new(&config)?;
    let addr = config.bind_addr();
    let state = Arc::new(AppState { service, config });

    let app = routes::router(state);

    info!("Chatlog listening on {}", addr);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
