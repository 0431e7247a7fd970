pub mod movie;
pub mod movie_actor;
pub mod movie_director;
pub mod movie_provider;
pub mod movie_rating;
pub mod movie_similar;
pub mod person;
pub mod provider;
pub mod rating;

pub(crate) fn now_sec() -> i64 {
    jiff::Timestamp::now().as_second()
}
