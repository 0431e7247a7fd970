use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait,
    IntoActiveModel, Iterable, JoinType, ModelTrait, PaginatorTrait, PrimaryKeyToColumn,
    QueryFilter, QueryOrder, QuerySelect, RelationTrait, Set, TransactionTrait,
    sea_query::OnConflict,
};
use tracing::debug;

use crate::{
    entities::{
        movie, movie_actor, movie_director, movie_provider, movie_rating, movie_similar, person,
        provider, rating,
    },
    error::AppResult,
    models::{AdminOverview, MovieDetail, NewMovie, poster_id_from_path},
    tmdb::TmdbMovie,
};

#[derive(Clone)]
pub struct Store {
    db: DatabaseConnection,
}

impl Store {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    pub fn db(&self) -> &DatabaseConnection {
        &self.db
    }

    pub async fn movie_by_tmdb_id(&self, tmdb_id: i32) -> AppResult<Option<movie::Model>> {
        Ok(movie::Entity::find().filter(movie::Column::MovieId.eq(tmdb_id)).one(&self.db).await?)
    }

    /// Inserts or updates the movie whose TMDB id matches `record.id`.
    /// `release_date` and `poster_id` are only overwritten when the record
    /// carries a usable value.
    pub async fn upsert_movie(&self, record: &TmdbMovie) -> AppResult<movie::Model> {
        let existing = self.movie_by_tmdb_id(record.id).await?;
        let is_new = existing.is_none();

        let mut active = match existing {
            Some(model) => model.into_active_model(),
            None => <movie::ActiveModel as Default>::default(),
        };

        active.name = Set(record.title.clone());
        active.movie_id = Set(record.id);
        active.language = Set(record.original_language.clone());
        active.description = Set(record.overview.clone());
        active.popularity = Set(record.popularity);
        active.adult = Set(record.adult);

        match record.release_date.as_deref().map(str::trim) {
            Some("") | None => {},
            Some(raw) => match raw.parse::<jiff::civil::Date>() {
                Ok(date) => active.release_date = Set(Some(date.to_string())),
                Err(err) => {
                    debug!(
                        movie_id = record.id,
                        release_date = %raw,
                        error = %err,
                        "ignoring malformed release date"
                    );
                },
            },
        }

        if let Some(poster_id) = record.poster_path.as_deref().and_then(poster_id_from_path) {
            active.poster_id = Set(Some(poster_id));
        }

        let saved = if is_new {
            active.insert(&self.db).await?
        } else {
            active.update(&self.db).await?
        };
        debug!(movie_id = saved.movie_id, id = saved.id, created = is_new, "saved movie");
        Ok(saved)
    }

    /// Makes sure `movie` has exactly one rating for `service`, carrying
    /// `score`.
    pub async fn ensure_rating(
        &self,
        movie: &movie::Model,
        service: &str,
        score: f64,
    ) -> AppResult<rating::Model> {
        let existing = movie
            .find_related(rating::Entity)
            .filter(rating::Column::Service.eq(service))
            .one(&self.db)
            .await?;

        if let Some(existing) = existing {
            if existing.score == score {
                return Ok(existing);
            }
            let mut active = existing.into_active_model();
            active.score = Set(score);
            return Ok(active.update(&self.db).await?);
        }

        let txn = self.db.begin().await?;
        let created = rating::ActiveModel {
            score: Set(score),
            service: Set(service.to_string()),
            ..Default::default()
        }
        .insert(&txn)
        .await?;
        link(&txn, movie_rating::ActiveModel {
            movie_id: Set(movie.id),
            rating_id: Set(created.id),
        })
        .await?;
        txn.commit().await?;

        Ok(created)
    }

    /// Links two movies as similar in both directions.
    pub async fn link_similar(&self, a: i32, b: i32) -> AppResult<()> {
        if a == b {
            return Ok(());
        }
        for (movie_id, similar_id) in [(a, b), (b, a)] {
            link(&self.db, movie_similar::ActiveModel {
                movie_id: Set(movie_id),
                similar_id: Set(similar_id),
            })
            .await?;
        }
        Ok(())
    }

    /// Finds a provider by name or creates it, refreshing its poster id.
    pub async fn upsert_provider(
        &self,
        name: &str,
        poster_id: Option<String>,
    ) -> AppResult<provider::Model> {
        let existing =
            provider::Entity::find().filter(provider::Column::Name.eq(name)).one(&self.db).await?;

        match existing {
            Some(model) if model.poster_id == poster_id || poster_id.is_none() => Ok(model),
            Some(model) => {
                let mut active = model.into_active_model();
                active.poster_id = Set(poster_id);
                Ok(active.update(&self.db).await?)
            },
            None => Ok(provider::ActiveModel {
                name: Set(name.to_string()),
                poster_id: Set(poster_id),
                ..Default::default()
            }
            .insert(&self.db)
            .await?),
        }
    }

    pub async fn link_provider(&self, movie_id: i32, provider_id: i32) -> AppResult<()> {
        link(&self.db, movie_provider::ActiveModel {
            movie_id: Set(movie_id),
            provider_id: Set(provider_id),
        })
        .await
    }

    pub async fn list_movies(&self) -> AppResult<Vec<movie::Model>> {
        Ok(movie::Entity::find()
            .order_by_desc(movie::Column::Popularity)
            .order_by_asc(movie::Column::Name)
            .all(&self.db)
            .await?)
    }

    /// Looks a movie up by slug, then by numeric primary key.
    pub async fn find_movie(&self, key: &str) -> AppResult<Option<movie::Model>> {
        if let Some(found) =
            movie::Entity::find().filter(movie::Column::Slug.eq(key)).one(&self.db).await?
        {
            return Ok(Some(found));
        }
        match key.parse::<i32>() {
            Ok(id) => Ok(movie::Entity::find_by_id(id).one(&self.db).await?),
            Err(_) => Ok(None),
        }
    }

    pub async fn movie_detail(&self, movie: movie::Model) -> AppResult<MovieDetail> {
        let ratings = movie
            .find_related(rating::Entity)
            .order_by_asc(rating::Column::Service)
            .all(&self.db)
            .await?;

        let directors = person::Entity::find()
            .join(JoinType::InnerJoin, movie_director::Relation::Person.def().rev())
            .filter(movie_director::Column::MovieId.eq(movie.id))
            .order_by_asc(person::Column::Name)
            .all(&self.db)
            .await?;

        let actors = person::Entity::find()
            .join(JoinType::InnerJoin, movie_actor::Relation::Person.def().rev())
            .filter(movie_actor::Column::MovieId.eq(movie.id))
            .order_by_asc(person::Column::Name)
            .all(&self.db)
            .await?;

        let similar = movie::Entity::find()
            .join(JoinType::InnerJoin, movie_similar::Relation::Similar.def().rev())
            .filter(movie_similar::Column::MovieId.eq(movie.id))
            .order_by_desc(movie::Column::Popularity)
            .all(&self.db)
            .await?;

        let providers = movie
            .find_related(provider::Entity)
            .order_by_asc(provider::Column::Name)
            .all(&self.db)
            .await?;

        Ok(MovieDetail { movie, ratings, directors, actors, similar, providers })
    }

    pub async fn tmdb_id_taken(&self, tmdb_id: i32) -> AppResult<bool> {
        Ok(movie::Entity::find()
            .filter(movie::Column::MovieId.eq(tmdb_id))
            .count(&self.db)
            .await?
            > 0)
    }

    /// Inserts a movie entered through the create form together with its
    /// directors and actors.
    pub async fn create_movie(&self, new: NewMovie) -> AppResult<movie::Model> {
        let txn = self.db.begin().await?;

        let created = movie::ActiveModel {
            name: Set(new.name),
            description: Set(new.description),
            language: Set(new.language),
            release_date: Set(new.release_date.map(|d| d.to_string())),
            adult: Set(new.adult),
            movie_id: Set(new.movie_id),
            popularity: Set(new.popularity),
            poster_id: Set(new.poster_id),
            ..Default::default()
        }
        .insert(&txn)
        .await?;

        for person_id in new.directors {
            link(&txn, movie_director::ActiveModel {
                movie_id: Set(created.id),
                person_id: Set(person_id),
            })
            .await?;
        }
        for person_id in new.actors {
            link(&txn, movie_actor::ActiveModel {
                movie_id: Set(created.id),
                person_id: Set(person_id),
            })
            .await?;
        }

        txn.commit().await?;
        Ok(created)
    }

    /// Ids from `ids` with no matching person row.
    pub async fn unknown_people(&self, ids: &[i32]) -> AppResult<Vec<i32>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        let known: Vec<i32> = person::Entity::find()
            .select_only()
            .column(person::Column::Id)
            .filter(person::Column::Id.is_in(ids.iter().copied()))
            .into_tuple()
            .all(&self.db)
            .await?;

        let mut unknown: Vec<i32> = ids.iter().copied().filter(|id| !known.contains(id)).collect();
        unknown.sort_unstable();
        unknown.dedup();
        Ok(unknown)
    }

    pub async fn list_people(&self) -> AppResult<Vec<person::Model>> {
        Ok(person::Entity::find().order_by_asc(person::Column::Name).all(&self.db).await?)
    }

    pub async fn create_person(&self, name: String, role: String) -> AppResult<person::Model> {
        Ok(person::ActiveModel { name: Set(name), role: Set(role), ..Default::default() }
            .insert(&self.db)
            .await?)
    }

    pub async fn admin_overview(&self) -> AppResult<AdminOverview> {
        Ok(AdminOverview {
            movies: movie::Entity::find().order_by_asc(movie::Column::Name).all(&self.db).await?,
            ratings: rating::Entity::find().order_by_asc(rating::Column::Id).all(&self.db).await?,
            people: self.list_people().await?,
            providers: provider::Entity::find()
                .order_by_asc(provider::Column::Name)
                .all(&self.db)
                .await?,
        })
    }
}

/// Inserts a junction row, ignoring it when the pair is already linked.
async fn link<A, C>(db: &C, row: A) -> AppResult<()>
where
    A: ActiveModelTrait + Send,
    <A::Entity as EntityTrait>::Model: IntoActiveModel<A>,
    C: ConnectionTrait,
{
    let pk: Vec<_> = <A::Entity as EntityTrait>::PrimaryKey::iter()
        .map(|key| key.into_column())
        .collect();

    <A::Entity as EntityTrait>::insert(row)
        .on_conflict(OnConflict::columns(pk).do_nothing().to_owned())
        .exec_without_returning(db)
        .await?;
    Ok(())
}
