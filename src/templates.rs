use maud::{DOCTYPE, Markup, html};

use crate::{
    entities::{movie, person},
    models::{AdminOverview, MovieDetail, MovieForm, PersonForm},
};

const TAILWIND_CDN: &str = "https://cdn.tailwindcss.com";

pub fn movie_list_page(movies: &[movie::Model]) -> String {
    page(
        "Movies",
        html! {
            div class="max-w-5xl mx-auto px-6 py-10" {
                div class="flex items-start justify-between gap-6" {
                    div {
                        h1 class="text-3xl font-bold text-gray-900" { "Popular movies" }
                        p class="mt-2 text-gray-600" { (movies.len()) " movies, most popular first." }
                    }
                    a class="rounded-md bg-blue-600 px-4 py-2 text-sm font-semibold text-white hover:bg-blue-700" href="/movies/add/" { "Add movie" }
                }

                @if movies.is_empty() {
                    div class="mt-10 bg-white shadow rounded-lg p-8" {
                        p class="text-gray-600" { "No movies yet. Run the popular movies import to fill the catalogue." }
                    }
                } @else {
                    ul class="mt-10 grid gap-6 sm:grid-cols-2 md:grid-cols-3" {
                        @for movie in movies {
                            li { (movie_card(movie)) }
                        }
                    }
                }
            }
        },
    )
}

pub fn movie_detail_page(detail: &MovieDetail) -> String {
    let movie = &detail.movie;

    page(
        &movie.name,
        html! {
            div class="max-w-4xl mx-auto px-6 py-10" {
                a class="text-sm text-blue-600 hover:text-blue-800" href="/movies/" { "← All movies" }

                div class="mt-6 bg-white shadow rounded-lg p-8 flex gap-8" {
                    @if let Some(poster) = &movie.poster_id {
                        img class="w-48 rounded" src=(image_url(poster)) alt=(movie.name);
                    }
                    div class="flex-1" {
                        h1 class="text-3xl font-bold text-gray-900" {
                            (movie.name)
                            @if movie.adult {
                                span class="ml-3 rounded bg-red-100 px-2 py-1 align-middle text-xs font-semibold text-red-700" { "18+" }
                            }
                        }
                        dl class="mt-4 grid grid-cols-2 gap-2 text-sm text-gray-700" {
                            dt class="font-medium" { "Release date" }
                            dd { (movie.release_date.as_deref().unwrap_or("Unknown")) }
                            dt class="font-medium" { "Language" }
                            dd { (movie.language) }
                            dt class="font-medium" { "Popularity" }
                            dd { (format!("{:.1}", movie.popularity)) }
                            dt class="font-medium" { "TMDB" }
                            dd {
                                a class="text-blue-600 hover:text-blue-800" href=(format!("https://www.themoviedb.org/movie/{}", movie.movie_id)) target="_blank" rel="noopener noreferrer" { (movie.movie_id) }
                            }
                        }
                        p class="mt-6 text-gray-700" { (movie.description) }

                        @if !detail.ratings.is_empty() {
                            ul class="mt-6 flex gap-3" {
                                @for rating in &detail.ratings {
                                    li class="rounded-md bg-yellow-100 px-3 py-1 text-sm text-yellow-900" {
                                        (rating.service) " " (format!("{:.1}", rating.score))
                                    }
                                }
                            }
                        }
                    }
                }

                @if !detail.directors.is_empty() || !detail.actors.is_empty() {
                    div class="mt-6 grid gap-4 md:grid-cols-2" {
                        (people_list("Directors", &detail.directors))
                        (people_list("Actors", &detail.actors))
                    }
                }

                @if !detail.providers.is_empty() {
                    div class="mt-8" {
                        h2 class="text-xl font-semibold text-gray-900" { "Where to watch" }
                        ul class="mt-4 flex flex-wrap gap-4" {
                            @for provider in &detail.providers {
                                li class="flex items-center gap-2 text-sm text-gray-700" {
                                    @if let Some(logo) = &provider.poster_id {
                                        img class="h-8 w-8 rounded" src=(image_url(logo)) alt=(provider.name);
                                    }
                                    (provider.name)
                                }
                            }
                        }
                    }
                }

                @if !detail.similar.is_empty() {
                    div class="mt-8" {
                        h2 class="text-xl font-semibold text-gray-900" { "Similar movies" }
                        ul class="mt-4 grid gap-6 sm:grid-cols-2 md:grid-cols-4" {
                            @for similar in &detail.similar {
                                li { (movie_card(similar)) }
                            }
                        }
                    }
                }
            }
        },
    )
}

pub fn movie_form_page(form: &MovieForm, errors: &[String], people: &[person::Model]) -> String {
    page(
        "Add movie",
        html! {
            div class="max-w-2xl mx-auto px-6 py-12" {
                div class="bg-white shadow rounded-lg p-8" {
                    h1 class="text-3xl font-bold text-gray-900" { "Add movie" }
                    (error_list(errors))

                    form class="mt-8 space-y-6" method="post" action="/movies/add/" {
                        (text_input("name", "Name", &form.name, true))
                        div {
                            label class=(LABEL) for="description" { "Description" }
                            textarea class=(INPUT) name="description" id="description" rows="4" { (form.description) }
                        }
                        (text_input("language", "Language", &form.language, true))
                        div {
                            label class=(LABEL) for="release_date" { "Release date" }
                            input class=(INPUT) type="date" name="release_date" id="release_date" value=(form.release_date);
                        }
                        div class="flex items-center gap-2" {
                            input type="checkbox" name="adult" id="adult" checked[form.adult.is_some()];
                            label class="text-sm font-medium text-gray-700" for="adult" { "Adult" }
                        }
                        (text_input("movie_id", "Movie id", &form.movie_id, true))
                        (text_input("popularity", "Popularity", &form.popularity, false))
                        (text_input("poster_id", "Poster id", &form.poster_id, false))
                        (people_select("directors", "Directors", people, &form.directors))
                        (people_select("actors", "Actors", people, &form.actors))

                        button class="w-full rounded-md bg-blue-600 px-4 py-2 font-semibold text-white hover:bg-blue-700" type="submit" { "Save" }
                    }
                }
            }
        },
    )
}

pub fn admin_page(overview: &AdminOverview) -> String {
    page(
        "Administration",
        html! {
            div class="max-w-5xl mx-auto px-6 py-10 space-y-10" {
                div class="flex items-start justify-between" {
                    h1 class="text-3xl font-bold text-gray-900" { "Administration" }
                    div class="flex gap-4 text-sm" {
                        a class="text-blue-600 hover:text-blue-800" href="/movies/add/" { "Add movie" }
                        a class="text-blue-600 hover:text-blue-800" href="/admin/people/add/" { "Add person" }
                    }
                }

                section {
                    h2 class=(SECTION) { "Movies (" (overview.movies.len()) ")" }
                    table class=(TABLE) {
                        tr { th { "Name" } th { "Slug" } th { "TMDB id" } th { "Popularity" } }
                        @for movie in &overview.movies {
                            tr {
                                td { a class="text-blue-600" href=(movie_url(movie)) { (movie.name) } }
                                td { (movie.slug) }
                                td { (movie.movie_id) }
                                td { (format!("{:.1}", movie.popularity)) }
                            }
                        }
                    }
                }

                section {
                    h2 class=(SECTION) { "Ratings (" (overview.ratings.len()) ")" }
                    table class=(TABLE) {
                        tr { th { "Id" } th { "Service" } th { "Score" } }
                        @for rating in &overview.ratings {
                            tr { td { (rating.id) } td { (rating.service) } td { (format!("{:.1}", rating.score)) } }
                        }
                    }
                }

                section {
                    h2 class=(SECTION) { "People (" (overview.people.len()) ")" }
                    table class=(TABLE) {
                        tr { th { "Name" } th { "Role" } }
                        @for person in &overview.people {
                            tr { td { (person.name) } td { (person.role) } }
                        }
                    }
                }

                section {
                    h2 class=(SECTION) { "Providers (" (overview.providers.len()) ")" }
                    table class=(TABLE) {
                        tr { th { "Name" } th { "Slug" } th { "Logo" } }
                        @for provider in &overview.providers {
                            tr {
                                td { (provider.name) }
                                td { (provider.slug) }
                                td { (provider.poster_id.as_deref().unwrap_or("")) }
                            }
                        }
                    }
                }
            }
        },
    )
}

pub fn person_form_page(form: &PersonForm, errors: &[String]) -> String {
    page(
        "Add person",
        html! {
            div class="max-w-2xl mx-auto px-6 py-12" {
                div class="bg-white shadow rounded-lg p-8" {
                    h1 class="text-3xl font-bold text-gray-900" { "Add person" }
                    (error_list(errors))
                    form class="mt-8 space-y-6" method="post" action="/admin/people/add/" {
                        (text_input("name", "Name", &form.name, true))
                        (text_input("role", "Role", &form.role, true))
                        button class="w-full rounded-md bg-blue-600 px-4 py-2 font-semibold text-white hover:bg-blue-700" type="submit" { "Save" }
                    }
                }
            }
        },
    )
}

pub fn error_page(message: String) -> String {
    page(
        "Error",
        html! {
            div class="min-h-screen bg-gray-50 flex items-center justify-center" {
                div class="max-w-xl w-full px-6" {
                    div class="bg-white shadow rounded-lg p-8" {
                        h1 class="text-2xl font-bold text-gray-900" { "Error" }
                        p class="mt-4 text-gray-700" { (message) }
                        a class="mt-6 inline-block text-blue-600 hover:text-blue-800" href="/" { "Back" }
                    }
                }
            }
        },
    )
}

pub fn movie_url(movie: &movie::Model) -> String {
    format!("/movies/{}/", movie.slug)
}

const LABEL: &str = "block text-sm font-medium text-gray-700";
const INPUT: &str = "mt-2 w-full rounded-md border border-gray-300 px-3 py-2 focus:border-blue-500 focus:outline-none focus:ring-1 focus:ring-blue-500";
const SECTION: &str = "text-xl font-semibold text-gray-900";
const TABLE: &str = "mt-4 w-full text-left text-sm text-gray-700";

fn page(title: &str, body: Markup) -> String {
    html! {
        (DOCTYPE)
        html lang="en" {
            head {
                meta charset="utf-8";
                meta name="viewport" content="width=device-width, initial-scale=1";
                title { (title) }
                script src=(TAILWIND_CDN) {}
            }
            body class="bg-gray-50" { (body) }
        }
    }
    .into_string()
}

fn image_url(poster_id: &str) -> String {
    format!("/images/{}", urlencoding::encode(poster_id))
}

fn movie_card(movie: &movie::Model) -> Markup {
    html! {
        a class="block bg-white shadow rounded-lg overflow-hidden hover:shadow-md" href=(movie_url(movie)) {
            @if let Some(poster) = &movie.poster_id {
                img class="w-full" src=(image_url(poster)) alt=(movie.name) loading="lazy";
            }
            div class="p-4" {
                h2 class="font-semibold text-gray-900" { (movie.name) }
                p class="mt-1 text-sm text-gray-500" {
                    (movie.release_date.as_deref().unwrap_or("Unknown"))
                    " · "
                    (format!("{:.1}", movie.popularity))
                }
            }
        }
    }
}

fn people_list(label: &str, people: &[person::Model]) -> Markup {
    html! {
        div class="bg-white shadow rounded-lg p-6" {
            h3 class="text-sm font-semibold text-gray-700" { (label) }
            @if people.is_empty() {
                p class="mt-2 text-sm text-gray-500" { "None listed" }
            } @else {
                ul class="mt-2 space-y-1" {
                    @for person in people {
                        li class="text-sm text-gray-700" { (person.name) span class="text-gray-500" { " · " (person.role) } }
                    }
                }
            }
        }
    }
}

fn error_list(errors: &[String]) -> Markup {
    html! {
        @if !errors.is_empty() {
            ul class="mt-6 rounded-md bg-red-50 p-4 text-sm text-red-700 space-y-1" {
                @for error in errors {
                    li { (error) }
                }
            }
        }
    }
}

fn text_input(name: &str, label: &str, value: &str, required: bool) -> Markup {
    html! {
        div {
            label class=(LABEL) for=(name) { (label) }
            input class=(INPUT) name=(name) id=(name) value=(value) required[required];
        }
    }
}

fn people_select(name: &str, label: &str, people: &[person::Model], selected: &[i32]) -> Markup {
    html! {
        div {
            label class=(LABEL) for=(name) { (label) }
            select class=(INPUT) name=(name) id=(name) multiple {
                @for person in people {
                    option value=(person.id) selected[selected.contains(&person.id)] {
                        (person.name) " (" (person.role) ")"
                    }
                }
            }
        }
    }
}
