use std::{net::SocketAddr, path::PathBuf};

use anyhow::Context;

#[derive(Clone, Debug)]
pub struct Config {
    pub addr: SocketAddr,
    pub tmdb_api_key: String,
    pub tmdb_base_url: String,
    pub tmdb_image_url: String,
    pub database_url: String,
    pub image_dir: PathBuf,
    pub tmdb_rps: u32,
    pub popular_pages: u32,
    pub refresh_similar_on_view: bool,
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();

        let host = std::env::var("HOST").unwrap_or_else(|_| "0.0.0.0".to_string());
        let port: u16 =
            std::env::var("PORT").unwrap_or_else(|_| "8000".to_string()).parse().context("PORT")?;

        let tmdb_api_key = std::env::var("TMDB_API_KEY").unwrap_or_default();
        let tmdb_base_url = std::env::var("TMDB_BASE_URL")
            .unwrap_or_else(|_| "https://api.themoviedb.org/3".to_string());
        let tmdb_image_url = std::env::var("TMDB_IMAGE_URL")
            .unwrap_or_else(|_| "https://image.tmdb.org/t/p/w500".to_string());

        let database_url = std::env::var("DATABASE_URL")
            .unwrap_or_else(|_| "sqlite://movie_ratings.db?mode=rwc".to_string());

        let image_dir: PathBuf =
            std::env::var("IMAGE_DIR").unwrap_or_else(|_| "media/images".to_string()).into();

        let tmdb_rps: u32 =
            std::env::var("TMDB_RPS").ok().and_then(|s| s.parse().ok()).unwrap_or(4);

        let popular_pages: u32 =
            std::env::var("POPULAR_PAGES").ok().and_then(|s| s.parse().ok()).unwrap_or(10);

        let refresh_similar_on_view = std::env::var("REFRESH_SIMILAR_ON_VIEW")
            .ok()
            .map(|s| !matches!(s.trim().to_ascii_lowercase().as_str(), "0" | "false" | "no" | "off"))
            .unwrap_or(true);

        Ok(Self {
            addr: format!("{host}:{port}").parse().context("HOST/PORT")?,
            tmdb_api_key,
            tmdb_base_url,
            tmdb_image_url,
            database_url,
            image_dir,
            tmdb_rps,
            popular_pages,
            refresh_similar_on_view,
        })
    }
}
