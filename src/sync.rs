use futures::{FutureExt, future::BoxFuture};
use tracing::{debug, info};

use crate::{
    entities::{movie, rating::TMDB_SERVICE},
    error::AppResult,
    images::ImageStore,
    models::poster_id_from_path,
    store::Store,
    tmdb::{TmdbClient, TmdbMovie},
};

/// Watch providers are only imported for this region.
pub const PROVIDER_REGION: &str = "US";

/// Reconciles TMDB payloads with the local database.
pub struct Synchronizer<'a> {
    store: &'a Store,
    tmdb: &'a TmdbClient,
    images: &'a ImageStore,
}

impl<'a> Synchronizer<'a> {
    pub fn new(store: &'a Store, tmdb: &'a TmdbClient, images: &'a ImageStore) -> Self {
        Self { store, tmdb, images }
    }

    /// Upserts every record and links it up.
    ///
    /// Without an `origin` each movie's similar list and US watch providers
    /// are fetched as well, the similar movies being processed with the
    /// movie as their origin. With an `origin` the movie is only linked as
    /// similar to it, so the expansion stops after one level.
    pub fn process_new_movies<'s>(
        &'s self,
        records: &'s [TmdbMovie],
        origin: Option<&'s movie::Model>,
    ) -> BoxFuture<'s, AppResult<Vec<movie::Model>>> {
        async move {
            let mut saved = Vec::with_capacity(records.len());

            for record in records {
                let movie = self.store.upsert_movie(record).await?;
                self.store.ensure_rating(&movie, TMDB_SERVICE, record.vote_average).await?;

                if let Some(poster_id) = &movie.poster_id {
                    self.images.ensure(self.tmdb, poster_id).await?;
                }

                match origin {
                    None => {
                        let similar = self.tmdb.similar_movies(movie.movie_id).await?;
                        debug!(movie_id = movie.movie_id, similar = similar.len(), "expanding similar movies");
                        self.process_new_movies(&similar, Some(&movie)).await?;
                        self.sync_providers(&movie).await?;
                    },
                    Some(origin) => {
                        self.store.link_similar(movie.id, origin.id).await?;
                    },
                }

                saved.push(movie);
            }

            Ok(saved)
        }
        .boxed()
    }

    async fn sync_providers(&self, movie: &movie::Model) -> AppResult<()> {
        let offers = self.tmdb.watch_providers(movie.movie_id, PROVIDER_REGION).await?;
        debug!(movie_id = movie.movie_id, offers = offers.len(), "linking watch providers");

        for (category, offer) in offers {
            let poster_id = offer.logo_path.as_deref().and_then(poster_id_from_path);
            let provider = self.store.upsert_provider(&offer.provider_name, poster_id).await?;
            self.store.link_provider(movie.id, provider.id).await?;

            debug!(
                movie_id = movie.movie_id,
                provider = %provider.name,
                category = category.as_tmdb_key(),
                "linked provider"
            );

            if let Some(poster_id) = &provider.poster_id {
                self.images.ensure(self.tmdb, poster_id).await?;
            }
        }

        Ok(())
    }

    /// Fetches the movie's similar list and links the results to it.
    pub async fn refresh_similar(&self, movie: &movie::Model) -> AppResult<Vec<movie::Model>> {
        let similar = self.tmdb.similar_movies(movie.movie_id).await?;
        self.process_new_movies(&similar, Some(movie)).await
    }

    /// Runs pages `1..=pages` of `movie/popular` through
    /// [`Self::process_new_movies`]. Returns the number of movies processed
    /// at the top level.
    pub async fn ingest_popular(&self, pages: u32) -> AppResult<usize> {
        let mut total = 0;

        for page in 1..=pages {
            let resp = self.tmdb.popular_movies(page).await?;
            let synced = self.process_new_movies(&resp.results, None).await?;
            total += synced.len();
            info!(page = page, movies = synced.len(), "synchronized popular movies page");

            if resp.total_pages != 0 && page >= resp.total_pages {
                debug!(total_pages = resp.total_pages, "reached last page");
                break;
            }
        }

        Ok(total)
    }
}

#[cfg(test)]
mod tests {
    use sea_orm::{EntityTrait, ModelTrait, PaginatorTrait};
    use serde_json::json;

    use super::*;
    use crate::{
        entities::{movie_provider, movie_similar, provider, rating},
        test_utils::{FakeTmdb, TestEnv},
    };

    fn record(id: i32, title: &str) -> serde_json::Value {
        json!({
            "id": id,
            "title": title,
            "original_language": "en",
            "overview": format!("{title} overview"),
            "popularity": 10.0 + id as f64,
            "release_date": "2021-10-22",
            "adult": false,
            "poster_path": format!("/poster{id}.jpg"),
            "vote_average": 7.5
        })
    }

    fn records(values: Vec<serde_json::Value>) -> Vec<TmdbMovie> {
        values.into_iter().map(|v| serde_json::from_value(v).unwrap()).collect()
    }

    #[tokio::test]
    async fn new_record_creates_one_movie() {
        let env = TestEnv::start(FakeTmdb::default()).await;
        let sync = env.synchronizer();

        let synced = sync.process_new_movies(&records(vec![record(438631, "Dune")]), None).await.unwrap();

        assert_eq!(synced.len(), 1);
        let rows = movie::Entity::find().all(env.store.db()).await.unwrap();
        assert_eq!(rows.len(), 1);
        let dune = &rows[0];
        assert_eq!(dune.name, "Dune");
        assert_eq!(dune.movie_id, 438631);
        assert_eq!(dune.language, "en");
        assert_eq!(dune.description, "Dune overview");
        assert_eq!(dune.release_date.as_deref(), Some("2021-10-22"));
        assert_eq!(dune.poster_id.as_deref(), Some("poster438631.jpg"));
        assert_eq!(dune.slug, "dune");
        assert!(!dune.adult);
    }

    #[tokio::test]
    async fn existing_record_is_updated_in_place() {
        let env = TestEnv::start(FakeTmdb::default()).await;
        let sync = env.synchronizer();

        let first = sync.process_new_movies(&records(vec![record(1, "Heat")]), None).await.unwrap();

        let mut changed = record(1, "Heat (Director's Cut)");
        changed["popularity"] = json!(99.5);
        let second = sync.process_new_movies(&records(vec![changed]), None).await.unwrap();

        assert_eq!(movie::Entity::find().count(env.store.db()).await.unwrap(), 1);
        assert_eq!(first[0].id, second[0].id);
        assert_eq!(second[0].name, "Heat (Director's Cut)");
        assert_eq!(second[0].popularity, 99.5);
        assert_eq!(second[0].slug, "heat");
    }

    #[tokio::test]
    async fn missing_release_date_keeps_stored_value() {
        let env = TestEnv::start(FakeTmdb::default()).await;
        let sync = env.synchronizer();

        sync.process_new_movies(&records(vec![record(5, "Arrival")]), None).await.unwrap();

        let mut without_date = record(5, "Arrival");
        without_date.as_object_mut().unwrap().remove("release_date");
        let mut empty_date = record(5, "Arrival");
        empty_date["release_date"] = json!("");
        let mut null_poster = record(5, "Arrival");
        null_poster["poster_path"] = json!(null);

        for payload in [without_date, empty_date, null_poster] {
            let synced = sync.process_new_movies(&records(vec![payload]), None).await.unwrap();
            assert_eq!(synced[0].release_date.as_deref(), Some("2021-10-22"));
            assert_eq!(synced[0].poster_id.as_deref(), Some("poster5.jpg"));
        }
    }

    #[tokio::test]
    async fn malformed_release_date_and_bare_slash_poster_keep_stored_values() {
        let env = TestEnv::start(FakeTmdb::default()).await;
        let sync = env.synchronizer();

        sync.process_new_movies(&records(vec![record(6, "Dunkirk")]), None).await.unwrap();

        let mut bad_date = record(6, "Dunkirk");
        bad_date["release_date"] = json!("2021-13-45");
        let mut slash_poster = record(6, "Dunkirk");
        slash_poster["poster_path"] = json!("/");

        for payload in [bad_date, slash_poster] {
            let synced = sync.process_new_movies(&records(vec![payload]), None).await.unwrap();
            assert_eq!(synced[0].release_date.as_deref(), Some("2021-10-22"));
            assert_eq!(synced[0].poster_id.as_deref(), Some("poster6.jpg"));
        }
        assert_eq!(env.fake.count("/images/poster6.jpg"), 1);
    }

    #[tokio::test]
    async fn unavailable_poster_is_skipped() {
        let env = TestEnv::start(FakeTmdb::default()).await;
        let sync = env.synchronizer();

        let mut payload = record(12, "Twelve");
        payload["poster_path"] = json!("/missing12.jpg");
        let synced = sync.process_new_movies(&records(vec![payload]), None).await.unwrap();

        assert_eq!(synced[0].poster_id.as_deref(), Some("missing12.jpg"));
        assert!(env.fake.requested("/images/missing12.jpg"));
        assert!(!env.images.contains("missing12.jpg").await.unwrap());
    }

    #[tokio::test]
    async fn same_title_gets_distinct_slugs() {
        let env = TestEnv::start(FakeTmdb::default()).await;
        let sync = env.synchronizer();

        let synced = sync
            .process_new_movies(&records(vec![record(10, "Solaris"), record(11, "Solaris")]), None)
            .await
            .unwrap();

        assert_eq!(synced[0].slug, "solaris");
        assert_eq!(synced[1].slug, "solaris-1");
    }

    #[tokio::test]
    async fn rating_is_single_and_refreshed() {
        let env = TestEnv::start(FakeTmdb::default()).await;
        let sync = env.synchronizer();

        sync.process_new_movies(&records(vec![record(3, "Up")]), None).await.unwrap();
        let mut rescored = record(3, "Up");
        rescored["vote_average"] = json!(8.1);
        let synced = sync.process_new_movies(&records(vec![rescored]), None).await.unwrap();

        let ratings = synced[0].find_related(rating::Entity).all(env.store.db()).await.unwrap();
        assert_eq!(ratings.len(), 1);
        assert_eq!(ratings[0].service, "Tmdb");
        assert_eq!(ratings[0].score, 8.1);
        assert_eq!(rating::Entity::find().count(env.store.db()).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn similar_movies_are_linked_both_ways_without_recursing() {
        let fake = FakeTmdb::default()
            .with_similar(1, vec![record(2, "Two"), record(3, "Three")])
            // Never requested: similar movies are not expanded again.
            .with_similar(2, vec![record(4, "Four")]);
        let env = TestEnv::start(fake).await;
        let sync = env.synchronizer();

        sync.process_new_movies(&records(vec![record(1, "One")]), None).await.unwrap();

        let one = env.store.movie_by_tmdb_id(1).await.unwrap().unwrap();
        let detail = env.store.movie_detail(one).await.unwrap();
        let mut similar: Vec<_> = detail.similar.iter().map(|m| m.movie_id).collect();
        similar.sort();
        assert_eq!(similar, vec![2, 3]);

        let two = env.store.movie_by_tmdb_id(2).await.unwrap().unwrap();
        let back = env.store.movie_detail(two).await.unwrap();
        assert_eq!(back.similar.iter().map(|m| m.movie_id).collect::<Vec<_>>(), vec![1]);

        assert!(env.store.movie_by_tmdb_id(4).await.unwrap().is_none());
        assert_eq!(movie_similar::Entity::find().count(env.store.db()).await.unwrap(), 4);
        assert!(!env.fake.requested("/movie/2/similar"));
        assert!(!env.fake.requested("/movie/2/watch/providers"));
    }

    #[tokio::test]
    async fn providers_limited_to_us_rent_buy_flatrate() {
        let fake = FakeTmdb::default().with_providers(
            7,
            json!({
                "id": 7,
                "results": {
                    "US": {
                        "link": "https://www.themoviedb.org/movie/7/watch?locale=US",
                        "flatrate": [{ "provider_name": "Netflix", "logo_path": "/netflix.jpg" }],
                        "rent": [{ "provider_name": "Apple TV", "logo_path": "/apple.jpg" }],
                        "buy": [{ "provider_name": "Apple TV", "logo_path": "/apple.jpg" }],
                        "ads": [{ "provider_name": "Tubi", "logo_path": "/tubi.jpg" }],
                        "free": [{ "provider_name": "Pluto TV", "logo_path": "/pluto.jpg" }]
                    },
                    "GB": {
                        "flatrate": [{ "provider_name": "BBC iPlayer", "logo_path": "/bbc.jpg" }]
                    }
                }
            }),
        );
        let env = TestEnv::start(fake).await;
        let sync = env.synchronizer();

        let synced = sync.process_new_movies(&records(vec![record(7, "Seven")]), None).await.unwrap();

        let providers =
            synced[0].find_related(provider::Entity).all(env.store.db()).await.unwrap();
        let mut names: Vec<_> = providers.iter().map(|p| p.name.as_str()).collect();
        names.sort();
        assert_eq!(names, vec!["Apple TV", "Netflix"]);

        assert_eq!(provider::Entity::find().count(env.store.db()).await.unwrap(), 2);
        assert_eq!(movie_provider::Entity::find().count(env.store.db()).await.unwrap(), 2);

        let apple = providers.iter().find(|p| p.name == "Apple TV").unwrap();
        assert_eq!(apple.poster_id.as_deref(), Some("apple.jpg"));
        assert_eq!(apple.slug, "apple-tv");
        assert!(env.images.contains("apple.jpg").await.unwrap());
        assert!(!env.images.contains("tubi.jpg").await.unwrap());
    }

    #[tokio::test]
    async fn images_are_downloaded_once() {
        let env = TestEnv::start(FakeTmdb::default()).await;
        let sync = env.synchronizer();

        sync.process_new_movies(&records(vec![record(9, "Nine")]), None).await.unwrap();
        assert!(env.images.contains("poster9.jpg").await.unwrap());
        assert_eq!(env.fake.count("/images/poster9.jpg"), 1);

        sync.process_new_movies(&records(vec![record(9, "Nine")]), None).await.unwrap();
        assert_eq!(env.fake.count("/images/poster9.jpg"), 1);
    }

    #[tokio::test]
    async fn unexpected_status_aborts() {
        let fake = FakeTmdb::default().failing(13);
        let env = TestEnv::start(fake).await;
        let sync = env.synchronizer();

        let err = sync
            .process_new_movies(&records(vec![record(13, "Thirteen")]), None)
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            crate::error::AppError::Tmdb(crate::tmdb::TmdbError::UnexpectedStatus { .. })
        ));
    }

    #[tokio::test]
    async fn popular_page_attaches_tmdb_rating() {
        let fake = FakeTmdb::default().with_popular(vec![vec![record(550, "Fight Club")]]);
        let env = TestEnv::start(fake).await;
        let sync = env.synchronizer();

        let total = sync.ingest_popular(10).await.unwrap();

        assert_eq!(total, 1);
        let movie = env.store.movie_by_tmdb_id(550).await.unwrap().unwrap();
        let ratings = movie.find_related(rating::Entity).all(env.store.db()).await.unwrap();
        assert_eq!(ratings.len(), 1);
        assert_eq!(ratings[0].score, 7.5);
        assert_eq!(ratings[0].service, "Tmdb");
        // Single page reported by the API, so page 2 is never requested.
        assert_eq!(env.fake.count("/movie/popular"), 1);
    }

    #[tokio::test]
    async fn popular_ingest_walks_every_page() {
        let fake = FakeTmdb::default().with_popular(vec![
            vec![record(1, "One"), record(2, "Two")],
            vec![record(3, "Three")],
            vec![record(4, "Four")],
        ]);
        let env = TestEnv::start(fake).await;
        let sync = env.synchronizer();

        let total = sync.ingest_popular(2).await.unwrap();

        assert_eq!(total, 3);
        assert_eq!(movie::Entity::find().count(env.store.db()).await.unwrap(), 3);
        assert!(env.store.movie_by_tmdb_id(4).await.unwrap().is_none());
    }
}
