// SPDX-License-Identifier: BSD-3-Clause
// Copyright (c) 2026 Aleksandr Ptakhin

use anyhow::{Context, Result};
use clap::Parser;
use collection_search::app::{create_router, AppState, VERSION};
use collection_search::models::settings::SearchSettings;
use collection_search::services::engine::IndexDirectory;
use collection_search::services::logging::init_logging;
use collection_search::services::search::{MeilisearchConfig, MeilisearchEngine};
use std::net::SocketAddr;
use std::sync::Arc;
use tracing::info;

#[derive(Debug, Parser)]
#[command(name = "collection-search", version = VERSION, about = "Multi-collection document search API")]
struct Cli {
    /// Address to listen on
    #[arg(long, env = "LISTEN_ADDR", default_value = "0.0.0.0:3000")]
    listen: SocketAddr,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging();

    let settings = SearchSettings::from_env();
    let meilisearch_config = MeilisearchConfig::from_env()?;

    let engine = Arc::new(MeilisearchEngine::new(&meilisearch_config)?);
    let directory = Arc::new(IndexDirectory::new(
        engine.clone(),
        meilisearch_config.index_prefix.clone(),
    ));

    let state = AppState::new(engine, directory, settings);
    let app = create_router(state);

    let listener = tokio::net::TcpListener::bind(cli.listen)
        .await
        .with_context(|| format!("Failed to bind {}", cli.listen))?;

    info!(version = VERSION, addr = %cli.listen, "collection-search listening");

    axum::serve(listener, app).await?;
    Ok(())
}
