use std::sync::Arc;

use axum::{
    Router,
    extract::{Path, State},
    response::{Html, IntoResponse, Redirect, Response},
    routing::get,
};
use axum_extra::extract::Form;
use tower_http::{
    cors::{Any, CorsLayer},
    services::ServeDir,
    trace::TraceLayer,
};
use tracing::warn;

use crate::{
    AppState,
    error::{AppError, AppResult},
    models::{MovieForm, PersonForm},
    sync::Synchronizer,
    templates,
};

pub fn router(state: Arc<AppState>) -> Router {
    let images = ServeDir::new(state.images.dir());

    Router::new()
        .route("/", get(movie_list))
        .route("/movies/", get(movie_list))
        .route("/movies/add/", get(movie_create_form).post(movie_create))
        .route("/movies/{key}/", get(movie_detail))
        .route("/admin/", get(admin))
        .route("/admin/people/add/", get(person_create_form).post(person_create))
        .nest_service("/images", images)
        .with_state(state)
        .layer(CorsLayer::new().allow_origin(Any).allow_headers(Any))
        .layer(TraceLayer::new_for_http())
}

pub async fn movie_list(State(state): State<Arc<AppState>>) -> AppResult<Html<String>> {
    let movies = state.store.list_movies().await?;
    Ok(Html(templates::movie_list_page(&movies)))
}

pub async fn movie_detail(
    State(state): State<Arc<AppState>>,
    Path(key): Path<String>,
) -> AppResult<Html<String>> {
    let movie = state
        .store
        .find_movie(&key)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Movie {key:?}")))?;

    if state.config.refresh_similar_on_view && state.tmdb.has_api_key() {
        let sync = Synchronizer::new(&state.store, &state.tmdb, &state.images);
        if let Err(err) = sync.refresh_similar(&movie).await {
            warn!(movie_id = movie.movie_id, error = %err, "failed to refresh similar movies");
        }
    }

    let detail = state.store.movie_detail(movie).await?;
    Ok(Html(templates::movie_detail_page(&detail)))
}

pub async fn movie_create_form(State(state): State<Arc<AppState>>) -> AppResult<Html<String>> {
    let people = state.store.list_people().await?;
    Ok(Html(templates::movie_form_page(&MovieForm::default(), &[], &people)))
}

pub async fn movie_create(
    State(state): State<Arc<AppState>>,
    Form(form): Form<MovieForm>,
) -> AppResult<Response> {
    let mut errors = Vec::new();

    match form.validate() {
        Ok(new) => {
            let people: Vec<i32> = new.directors.iter().chain(&new.actors).copied().collect();
            for id in state.store.unknown_people(&people).await? {
                errors.push(format!("Select a valid person: {id} is not one of the choices."));
            }
            if state.store.tmdb_id_taken(new.movie_id).await? {
                errors.push(format!("A movie with id {} already exists.", new.movie_id));
            }
            if errors.is_empty() {
                let movie = state.store.create_movie(new).await?;
                return Ok(Redirect::to(&templates::movie_url(&movie)).into_response());
            }
        },
        Err(mut problems) => errors.append(&mut problems),
    }

    let people = state.store.list_people().await?;
    Ok(Html(templates::movie_form_page(&form, &errors, &people)).into_response())
}

pub async fn admin(State(state): State<Arc<AppState>>) -> AppResult<Html<String>> {
    let overview = state.store.admin_overview().await?;
    Ok(Html(templates::admin_page(&overview)))
}

pub async fn person_create_form() -> Html<String> {
    Html(templates::person_form_page(&PersonForm::default(), &[]))
}

pub async fn person_create(
    State(state): State<Arc<AppState>>,
    Form(form): Form<PersonForm>,
) -> AppResult<Response> {
    match form.validate() {
        Ok((name, role)) => {
            state.store.create_person(name, role).await?;
            Ok(Redirect::to("/admin/").into_response())
        },
        Err(errors) => Ok(Html(templates::person_form_page(&form, &errors)).into_response()),
    }
}
