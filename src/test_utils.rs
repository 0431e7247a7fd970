use std::{
    collections::{HashMap, HashSet},
    sync::{Arc, Mutex},
};

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::{StatusCode, Uri},
    response::{IntoResponse, Response},
    routing::get,
};
use sea_orm::DatabaseConnection;
use serde_json::{Value, json};
use tempfile::TempDir;

use crate::{
    AppState, config::Config, db, images::ImageStore, store::Store, sync::Synchronizer,
    tmdb::TmdbClient,
};

pub async fn test_db() -> DatabaseConnection {
    db::connect_and_migrate("sqlite::memory:").await.unwrap()
}

/// Canned TMDB API served over real HTTP. Every request path is recorded.
#[derive(Clone, Default)]
pub struct FakeTmdb {
    popular: Vec<Vec<Value>>,
    similar: HashMap<i32, Vec<Value>>,
    providers: HashMap<i32, Value>,
    failing: HashSet<i32>,
    hits: Arc<Mutex<Vec<String>>>,
}

impl FakeTmdb {
    pub fn with_popular(mut self, pages: Vec<Vec<Value>>) -> Self {
        self.popular = pages;
        self
    }

    pub fn with_similar(mut self, movie_id: i32, results: Vec<Value>) -> Self {
        self.similar.insert(movie_id, results);
        self
    }

    pub fn with_providers(mut self, movie_id: i32, body: Value) -> Self {
        self.providers.insert(movie_id, body);
        self
    }

    /// Every per-movie endpoint for `movie_id` answers 500.
    pub fn failing(mut self, movie_id: i32) -> Self {
        self.failing.insert(movie_id);
        self
    }

    pub fn count(&self, path: &str) -> usize {
        self.hits.lock().unwrap().iter().filter(|p| *p == path).count()
    }

    pub fn requested(&self, path: &str) -> bool {
        self.count(path) > 0
    }

    fn hit(&self, uri: &Uri) {
        self.hits.lock().unwrap().push(uri.path().to_string());
    }

    async fn serve(self) -> String {
        let app = Router::new()
            .route("/movie/popular", get(popular))
            .route("/movie/{id}/similar", get(similar))
            .route("/movie/{id}/watch/providers", get(providers))
            .route("/images/{file}", get(image))
            .with_state(self);

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        format!("http://{addr}")
    }
}

type Params = Query<HashMap<String, String>>;

fn authorized(params: &HashMap<String, String>) -> bool {
    params.get("api_key").is_some_and(|k| !k.is_empty())
}

async fn popular(State(fake): State<FakeTmdb>, uri: Uri, Query(params): Params) -> Response {
    fake.hit(&uri);
    if !authorized(&params) {
        return StatusCode::UNAUTHORIZED.into_response();
    }
    let page: usize = params.get("page").and_then(|p| p.parse().ok()).unwrap_or(1);
    let results = fake.popular.get(page.saturating_sub(1)).cloned().unwrap_or_default();
    Json(json!({ "page": page, "results": results, "total_pages": fake.popular.len() }))
        .into_response()
}

async fn similar(
    State(fake): State<FakeTmdb>,
    uri: Uri,
    Path(id): Path<i32>,
    Query(params): Params,
) -> Response {
    fake.hit(&uri);
    if !authorized(&params) {
        return StatusCode::UNAUTHORIZED.into_response();
    }
    if fake.failing.contains(&id) {
        return StatusCode::INTERNAL_SERVER_ERROR.into_response();
    }
    let results = fake.similar.get(&id).cloned().unwrap_or_default();
    Json(json!({ "page": 1, "results": results, "total_pages": 1 })).into_response()
}

async fn providers(
    State(fake): State<FakeTmdb>,
    uri: Uri,
    Path(id): Path<i32>,
    Query(params): Params,
) -> Response {
    fake.hit(&uri);
    if !authorized(&params) {
        return StatusCode::UNAUTHORIZED.into_response();
    }
    if fake.failing.contains(&id) {
        return StatusCode::INTERNAL_SERVER_ERROR.into_response();
    }
    let body = fake.providers.get(&id).cloned().unwrap_or_else(|| json!({ "id": id, "results": {} }));
    Json(body).into_response()
}

async fn image(State(fake): State<FakeTmdb>, uri: Uri, Path(file): Path<String>) -> Response {
    fake.hit(&uri);
    if file.starts_with("missing") {
        return StatusCode::NOT_FOUND.into_response();
    }
    format!("image:{file}").into_response()
}

/// Database, image directory and TMDB client wired to a [`FakeTmdb`].
pub struct TestEnv {
    pub fake: FakeTmdb,
    pub store: Store,
    pub tmdb: Arc<TmdbClient>,
    pub images: ImageStore,
    base_url: String,
    _tmp: TempDir,
}

impl TestEnv {
    pub async fn start(fake: FakeTmdb) -> Self {
        let base_url = fake.clone().serve().await;
        let tmp = tempfile::tempdir().unwrap();
        let images = ImageStore::open(tmp.path().join("images")).await.unwrap();
        let tmdb = TmdbClient::new(
            reqwest::Client::new(),
            "test-key".to_string(),
            base_url.clone(),
            format!("{base_url}/images"),
            1000,
        );

        Self {
            fake,
            store: Store::new(test_db().await),
            tmdb: Arc::new(tmdb),
            images,
            base_url,
            _tmp: tmp,
        }
    }

    pub fn synchronizer(&self) -> Synchronizer<'_> {
        Synchronizer::new(&self.store, &self.tmdb, &self.images)
    }

    pub fn state(&self, refresh_similar_on_view: bool) -> Arc<AppState> {
        let config = Config {
            addr: "127.0.0.1:0".parse().unwrap(),
            tmdb_api_key: "test-key".to_string(),
            tmdb_base_url: self.base_url.clone(),
            tmdb_image_url: format!("{}/images", self.base_url),
            database_url: "sqlite::memory:".to_string(),
            image_dir: self.images.dir().to_path_buf(),
            tmdb_rps: 1000,
            popular_pages: 1,
            refresh_similar_on_view,
        };

        Arc::new(AppState {
            config: Arc::new(config),
            store: self.store.clone(),
            tmdb: self.tmdb.clone(),
            images: self.images.clone(),
        })
    }
}
