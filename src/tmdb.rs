use std::{collections::HashMap, num::NonZeroU32, sync::Arc};

use governor::{
    Quota, RateLimiter,
    clock::DefaultClock,
    state::{InMemoryState, NotKeyed},
};
use reqwest::StatusCode;
use serde::{Deserialize, de::DeserializeOwned};
use tracing::debug;

use crate::{error::AppResult, models::ProviderCategory};

#[derive(Debug, thiserror::Error)]
pub enum TmdbError {
    #[error("TMDB returned {status} for {endpoint}")]
    UnexpectedStatus { endpoint: String, status: StatusCode },
    #[error("TMDB request to {endpoint} failed: {source}")]
    Request {
        endpoint: String,
        #[source]
        source: reqwest::Error,
    },
}

pub struct TmdbClient {
    client: reqwest::Client,
    api_key: String,
    base_url: String,
    image_url: String,
    limiter: Arc<RateLimiter<NotKeyed, InMemoryState, DefaultClock>>,
}

impl TmdbClient {
    pub fn new(
        client: reqwest::Client,
        api_key: String,
        base_url: String,
        image_url: String,
        rps: u32,
    ) -> Self {
        if api_key.trim().is_empty() {
            tracing::warn!("no TMDB_API_KEY provided, TMDB requests will be rejected");
        }

        let rps = NonZeroU32::new(rps).unwrap_or(NonZeroU32::MIN);
        let limiter = Arc::new(RateLimiter::direct(Quota::per_second(rps)));
        Self { client, api_key, base_url, image_url, limiter }
    }

    pub fn has_api_key(&self) -> bool {
        !self.api_key.trim().is_empty()
    }

    /// Authenticated, paginated GET of `path` relative to the API base URL.
    /// Anything but `200 OK` is an error.
    pub async fn get_page<T: DeserializeOwned>(&self, path: &str, page: u32) -> AppResult<T> {
        self.limiter.until_ready().await;

        let endpoint = format!("{}/{}", self.base_url.trim_end_matches('/'), path);
        debug!(endpoint = %endpoint, page = page, "requesting TMDB");

        let request_failed =
            |source| TmdbError::Request { endpoint: endpoint.clone(), source };

        let resp = self
            .client
            .get(&endpoint)
            .query(&[("api_key", self.api_key.as_str())])
            .query(&[("page", page)])
            .send()
            .await
            .map_err(request_failed)?;

        let status = resp.status();
        if status != StatusCode::OK {
            return Err(TmdbError::UnexpectedStatus { endpoint: endpoint.clone(), status }.into());
        }

        Ok(resp.json().await.map_err(request_failed)?)
    }

    pub async fn popular_movies(&self, page: u32) -> AppResult<Page<TmdbMovie>> {
        self.get_page("movie/popular", page).await
    }

    pub async fn similar_movies(&self, movie_id: i32) -> AppResult<Vec<TmdbMovie>> {
        let page: Page<TmdbMovie> =
            self.get_page(&format!("movie/{movie_id}/similar"), 1).await?;
        Ok(page.results)
    }

    /// Provider listings for one region, restricted to the categories in
    /// [`ProviderCategory`]. Missing regions and malformed entries are
    /// skipped.
    pub async fn watch_providers(
        &self,
        movie_id: i32,
        region: &str,
    ) -> AppResult<Vec<(ProviderCategory, WatchProvider)>> {
        let resp: WatchProvidersResponse =
            self.get_page(&format!("movie/{movie_id}/watch/providers"), 1).await?;
        Ok(resp.region_offers(region))
    }

    /// Downloads an image by poster id. `None` when TMDB does not answer
    /// with `200 OK`.
    pub async fn fetch_image(&self, poster_id: &str) -> AppResult<Option<Vec<u8>>> {
        let url = format!("{}/{}", self.image_url.trim_end_matches('/'), poster_id);
        debug!(url = %url, "downloading image");

        let resp = self.client.get(&url).send().await?;
        if resp.status() != StatusCode::OK {
            debug!(url = %url, status = %resp.status(), "image not available");
            return Ok(None);
        }

        Ok(Some(resp.bytes().await?.to_vec()))
    }
}

#[derive(Debug, Deserialize)]
pub struct Page<T> {
    pub results: Vec<T>,
    #[serde(default)]
    pub total_pages: u32,
}

/// One movie record as returned by list endpoints (`popular`, `similar`).
#[derive(Clone, Debug, Deserialize)]
pub struct TmdbMovie {
    pub id: i32,
    pub title: String,
    #[serde(default)]
    pub original_language: String,
    #[serde(default)]
    pub overview: String,
    #[serde(default)]
    pub popularity: f64,
    #[serde(default)]
    pub release_date: Option<String>,
    #[serde(default)]
    pub adult: bool,
    #[serde(default)]
    pub poster_path: Option<String>,
    #[serde(default)]
    pub vote_average: f64,
}

#[derive(Clone, Debug, Deserialize)]
pub struct WatchProvider {
    pub provider_name: String,
    #[serde(default)]
    pub logo_path: Option<String>,
}

#[derive(Debug, Deserialize)]
struct WatchProvidersResponse {
    #[serde(default)]
    results: HashMap<String, serde_json::Value>,
}

impl WatchProvidersResponse {
    fn region_offers(mut self, region: &str) -> Vec<(ProviderCategory, WatchProvider)> {
        let Some(mut offers) = self
            .results
            .remove(region)
            .and_then(|v| serde_json::from_value::<HashMap<String, serde_json::Value>>(v).ok())
        else {
            return Vec::new();
        };

        let mut out = Vec::new();
        for category in ProviderCategory::ALL {
            let Some(list) = offers.remove(category.as_tmdb_key()) else {
                continue;
            };
            let Ok(entries) = serde_json::from_value::<Vec<serde_json::Value>>(list) else {
                continue;
            };
            for entry in entries {
                if let Ok(provider) = serde_json::from_value::<WatchProvider>(entry) {
                    out.push((category, provider));
                }
            }
        }
        out
    }
}
