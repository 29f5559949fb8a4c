mod compose;
mod config;
mod errors;
mod events;
mod llm_client;
mod remind;
mod routes;
mod scrape;
mod sms;
mod state;

use anyhow::Result;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::sync::Mutex;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::compose::Summarizer;
use crate::config::Config;
use crate::events::service::EventService;
use crate::remind::tracker::ReminderTracker;
use crate::routes::build_router;
use crate::sms::{SmsTransport, TextBeltClient};
use crate::state::AppState;

#[tokio::main]
async fn main() -> Result<()> {
    let config = Config::from_env()?;

    // Initialize structured logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!("{}={}", env!("CARGO_PKG_NAME"), &config.rust_log))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting Calendar Agent API v{}", env!("CARGO_PKG_VERSION"));

    if config.textbelt_api_key.is_none() {
        warn!("TEXTBELT_API_KEY not set — SMS sends will fail with a structured error");
    }
    if config.openai_api_key.is_none() {
        info!("OPENAI_API_KEY not set — messages will use deterministic templates");
    }

    let events = Arc::new(EventService::new(config.luma_url.clone()));
    info!("Event service initialized (source: {})", config.luma_url);

    let tracker = Arc::new(Mutex::new(ReminderTracker::load(
        config.tracking_file.clone(),
    )));
    info!(
        "Reminder tracker initialized (store: {})",
        config.tracking_file.display()
    );

    let summarizer = Arc::new(Summarizer::new(
        config.openai_api_key.clone(),
        config.openai_model.clone(),
    ));

    let sms: Arc<dyn SmsTransport> = Arc::new(TextBeltClient::new(
        config.textbelt_api_key.clone(),
        config.sms_to_number.clone(),
    ));

    // Build app state
    let state = AppState {
        config: config.clone(),
        events,
        tracker,
        summarizer,
        sms,
    };

    // Build router
    let app = build_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive());

    let addr: SocketAddr = format!("0.0.0.0:{}", config.port).parse()?;
    info!("Listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
