use jiff::civil::Date;
use serde::Deserialize;

use crate::entities::{movie, person, provider, rating};

/// Watch-provider offer categories that get linked to movies.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ProviderCategory {
    Rent,
    Buy,
    Flatrate,
}

impl ProviderCategory {
    pub const ALL: [ProviderCategory; 3] =
        [ProviderCategory::Rent, ProviderCategory::Buy, ProviderCategory::Flatrate];

    pub fn as_tmdb_key(self) -> &'static str {
        match self {
            ProviderCategory::Rent => "rent",
            ProviderCategory::Buy => "buy",
            ProviderCategory::Flatrate => "flatrate",
        }
    }
}

/// Strips every `/` from a TMDB image path. Empty results are treated as
/// absent.
pub fn poster_id_from_path(path: &str) -> Option<String> {
    let id = path.replace('/', "");
    (!id.is_empty()).then_some(id)
}

/// A movie with everything the detail page shows.
#[derive(Clone, Debug)]
pub struct MovieDetail {
    pub movie: movie::Model,
    pub ratings: Vec<rating::Model>,
    pub directors: Vec<person::Model>,
    pub actors: Vec<person::Model>,
    pub similar: Vec<movie::Model>,
    pub providers: Vec<provider::Model>,
}

#[derive(Clone, Debug, Default)]
pub struct AdminOverview {
    pub movies: Vec<movie::Model>,
    pub ratings: Vec<rating::Model>,
    pub people: Vec<person::Model>,
    pub providers: Vec<provider::Model>,
}

/// Raw create-movie form. Every field arrives as text; `directors` and
/// `actors` are repeated keys from multi-selects.
#[derive(Clone, Debug, Default, Deserialize)]
pub struct MovieForm {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub language: String,
    #[serde(default)]
    pub release_date: String,
    #[serde(default)]
    pub adult: Option<String>,
    #[serde(default)]
    pub movie_id: String,
    #[serde(default)]
    pub popularity: String,
    #[serde(default)]
    pub poster_id: String,
    #[serde(default)]
    pub directors: Vec<i32>,
    #[serde(default)]
    pub actors: Vec<i32>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct NewMovie {
    pub name: String,
    pub description: String,
    pub language: String,
    pub release_date: Option<Date>,
    pub adult: bool,
    pub movie_id: i32,
    pub popularity: f64,
    pub poster_id: Option<String>,
    pub directors: Vec<i32>,
    pub actors: Vec<i32>,
}

const MAX_CHARS: usize = 200;

impl MovieForm {
    pub fn validate(&self) -> Result<NewMovie, Vec<String>> {
        let mut errors = Vec::new();

        let name = required(&self.name, "Name", &mut errors);
        let description = self.description.trim().to_string();
        let language = required(&self.language, "Language", &mut errors);

        let release_date = match self.release_date.trim() {
            "" => None,
            s => match s.parse::<Date>() {
                Ok(d) => Some(d),
                Err(_) => {
                    errors.push("Release date must be a valid YYYY-MM-DD date.".to_string());
                    None
                },
            },
        };

        let movie_id = match self.movie_id.trim().parse::<i32>() {
            Ok(id) => id,
            Err(_) => {
                errors.push("Movie id must be a whole number.".to_string());
                0
            },
        };

        let popularity = match self.popularity.trim() {
            "" => 0.0,
            s => match s.parse::<f64>() {
                Ok(p) if p.is_finite() => p,
                _ => {
                    errors.push("Popularity must be a number.".to_string());
                    0.0
                },
            },
        };

        if !errors.is_empty() {
            return Err(errors);
        }

        Ok(NewMovie {
            name,
            description,
            language,
            release_date,
            adult: self.adult.is_some(),
            movie_id,
            popularity,
            poster_id: poster_id_from_path(self.poster_id.trim()),
            directors: self.directors.clone(),
            actors: self.actors.clone(),
        })
    }
}

#[derive(Clone, Debug, Default, Deserialize)]
pub struct PersonForm {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub role: String,
}

impl PersonForm {
    pub fn validate(&self) -> Result<(String, String), Vec<String>> {
        let mut errors = Vec::new();
        let name = required(&self.name, "Name", &mut errors);
        let role = required(&self.role, "Role", &mut errors);
        if errors.is_empty() { Ok((name, role)) } else { Err(errors) }
    }
}

fn required(value: &str, label: &str, errors: &mut Vec<String>) -> String {
    let value = value.trim();
    if value.is_empty() {
        errors.push(format!("{label} is required."));
    } else if value.chars().count() > MAX_CHARS {
        errors.push(format!("{label} must be at most {MAX_CHARS} characters."));
    }
    value.to_string()
}
