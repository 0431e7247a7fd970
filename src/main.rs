mod config;
mod db;
mod entities;
mod error;
mod images;
mod models;
mod routes;
mod slug;
mod store;
mod sync;
mod templates;
#[cfg(test)]
mod test_utils;
mod tmdb;

use std::{sync::Arc, time::Duration};

use clap::{Parser, Subcommand};

use crate::{
    config::Config, images::ImageStore, store::Store, sync::Synchronizer, tmdb::TmdbClient,
};

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub store: Store,
    pub tmdb: Arc<TmdbClient>,
    pub images: ImageStore,
}

#[derive(Parser, Debug)]
#[command(author, version, about = "Movies, ratings and watch providers from TMDB", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug, Default)]
enum Command {
    /// Serve the web interface (default)
    #[default]
    Serve,
    /// Import the current popular movies from TMDB, with their similar
    /// movies and watch providers
    GetPopularMovies,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            std::env::var("RUST_LOG")
                .unwrap_or_else(|_| "info,movie_ratings=debug,sqlx=warn".to_string()),
        )
        .init();

    let cli = Cli::parse();
    let config = Arc::new(Config::from_env()?);

    let http = reqwest::Client::builder()
        .user_agent("movie-ratings/0.1")
        .timeout(Duration::from_secs(30))
        .build()?;

    let db = db::connect_and_migrate(&config.database_url).await?;
    let store = Store::new(db);
    let images = ImageStore::open(config.image_dir.clone()).await?;

    let tmdb = TmdbClient::new(
        http,
        config.tmdb_api_key.clone(),
        config.tmdb_base_url.clone(),
        config.tmdb_image_url.clone(),
        config.tmdb_rps,
    );

    match cli.command.unwrap_or_default() {
        Command::GetPopularMovies => {
            anyhow::ensure!(tmdb.has_api_key(), "TMDB_API_KEY is required to import movies");
            let sync = Synchronizer::new(&store, &tmdb, &images);
            let total = sync.ingest_popular(config.popular_pages).await?;
            tracing::info!(movies = total, pages = config.popular_pages, "popular movies imported");
        },
        Command::Serve => {
            let state =
                Arc::new(AppState { config: config.clone(), store, tmdb: Arc::new(tmdb), images });
            let app = routes::router(state);

            let listener = tokio::net::TcpListener::bind(config.addr).await?;
            tracing::info!(addr = %config.addr, "listening");
            axum::serve(listener, app).await?;
        },
    }

    Ok(())
}
