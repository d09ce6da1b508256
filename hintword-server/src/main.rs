use std::sync::Arc;

use anyhow::Context;
use chrono::Utc;
use tokio::signal;
use tokio::sync::broadcast::error::RecvError;
use tracing::{debug, info, warn};
use tracing_subscriber::EnvFilter;

use hintword_core::CardCatalog;
use hintword_server::{
    config::Config, identity::InMemoryIdentity, store::MemoryStore,
    suggestions::HttpSuggestions, LobbyManager,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    info!("Starting hintword server...");

    let config = Config::new();

    info!("Loading cards from directory: {}", config.cards_directory);
    let catalog = CardCatalog::load_directory(&config.cards_directory).with_context(|| {
        format!(
            "failed to load cards from '{}', set CARDS_DIRECTORY to a directory of <language>.txt card files",
            config.cards_directory
        )
    })?;
    info!("Loaded {} cards", catalog.total_cards());

    let suggestions = HttpSuggestions::new(config.suggestions.clone(), config.suggestion_timeout())
        .context("failed to build the suggestion client")?;
    let manager = Arc::new(LobbyManager::new(
        &config,
        catalog,
        Arc::new(InMemoryIdentity::new()),
        Arc::new(MemoryStore::new()),
        Arc::new(suggestions),
    ));

    // Relay point for the transport layer
    let mut events = manager.subscribe();
    tokio::spawn(async move {
        loop {
            match events.recv().await {
                Ok(event) => match serde_json::to_string(&event) {
                    Ok(payload) => debug!("Lobby {} event: {}", event.lobby_id(), payload),
                    Err(e) => warn!("Failed to encode event for lobby {}: {}", event.lobby_id(), e),
                },
                Err(RecvError::Lagged(missed)) => warn!("Event relay lagged, {} events dropped", missed),
                Err(RecvError::Closed) => break,
            }
        }
    });

    // Start cleanup task
    let cleanup_manager = manager.clone();
    let cleanup_interval = config.cleanup_interval();
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(cleanup_interval);
        loop {
            interval.tick().await;
            cleanup_manager.cleanup_lobbies(Utc::now()).await;
        }
    });

    info!("Server ready. Press Ctrl+C to stop.");
    wait_for_shutdown().await?;
    info!(
        "Shutting down with {} active lobbies",
        manager.active_lobbies()
    );
    Ok(())
}

/// Wait for SIGINT (Ctrl+C) or SIGTERM.
async fn wait_for_shutdown() -> anyhow::Result<()> {
    #[cfg(unix)]
    {
        let mut sigint = signal::unix::signal(signal::unix::SignalKind::interrupt())?;
        let mut sigterm = signal::unix::signal(signal::unix::SignalKind::terminate())?;

        tokio::select! {
            _ = sigint.recv() => {
                info!("Received SIGINT, shutting down gracefully...");
            }
            _ = sigterm.recv() => {
                info!("Received SIGTERM, shutting down gracefully...");
            }
        }
    }

    #[cfg(not(unix))]
    {
        signal::ctrl_c().await?;
        info!("Received Ctrl+C, shutting down gracefully...");
    }

    Ok(())
}
