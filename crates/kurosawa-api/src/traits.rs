//! Trait definitions for external movie-database services.
//!
//! All provider clients implement [`MovieSearchProvider`], keeping the
//! linker and the detail fetchers service-agnostic.

use std::future::Future;

/// A search candidate from the external movie database.
///
/// Ephemeral: consumed during linking, never persisted.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct MovieSearchResult {
    /// Identifier within the external database.
    pub external_id: u64,
    pub title: String,
    pub original_title: Option<String>,
    /// Release year, when the external record carries a date.
    pub release_date: Option<i32>,
}

/// A genre record from the external database.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct MovieGenreResult {
    pub external_id: u64,
    pub name: String,
}

/// A cast-member or director record from the external database.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct MoviePersonResult {
    pub external_id: u64,
    pub name: String,
}

/// A unified external movie-database interface.
pub trait MovieSearchProvider: Send + Sync {
    type Error: std::error::Error + Send + Sync + 'static;

    /// Search for movies by title. May return an empty list.
    fn search_movie(
        &self,
        title: &str,
    ) -> impl Future<Output = Result<Vec<MovieSearchResult>, Self::Error>> + Send;

    /// Fetch the record for a specific external id, `None` if it does not
    /// exist.
    fn find_by_external_id(
        &self,
        external_id: u64,
    ) -> impl Future<Output = Result<Option<MovieSearchResult>, Self::Error>> + Send;

    /// Genres of a movie.
    fn movie_genres(
        &self,
        external_id: u64,
    ) -> impl Future<Output = Result<Vec<MovieGenreResult>, Self::Error>> + Send;

    /// Billed cast of a movie.
    fn movie_cast(
        &self,
        external_id: u64,
    ) -> impl Future<Output = Result<Vec<MoviePersonResult>, Self::Error>> + Send;

    /// Directors of a movie.
    fn movie_directors(
        &self,
        external_id: u64,
    ) -> impl Future<Output = Result<Vec<MoviePersonResult>, Self::Error>> + Send;

    /// Keyword tags of a movie.
    fn movie_keywords(
        &self,
        external_id: u64,
    ) -> impl Future<Output = Result<Vec<String>, Self::Error>> + Send;

    /// IMDB identifier of a movie, when the external database knows it.
    fn movie_imdb_id(
        &self,
        external_id: u64,
    ) -> impl Future<Output = Result<Option<String>, Self::Error>> + Send;
}
