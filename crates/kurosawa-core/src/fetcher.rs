//! Movie detail fetchers.
//!
//! Enrich movies that are missing genres, cast, directors, keywords or
//! an IMDB id by querying the provider per external id. Detail entities
//! are shared: an existing genre/person is reused by external id, never
//! duplicated.

use kurosawa_api::traits::MovieSearchProvider;

use crate::error::KurosawaError;
use crate::storage::Storage;

/// Summary of one fetch run.
#[derive(Debug, Clone, Copy, Default)]
pub struct FetchSummary {
    pub movies_processed: u32,
    pub details_attached: u32,
}

/// Fetch and attach genres for movies that have none.
pub async fn populate_genres<P: MovieSearchProvider>(
    storage: &Storage,
    provider: &P,
) -> Result<FetchSummary, KurosawaError> {
    let mut summary = FetchSummary::default();

    for movie in storage.movies_without_genres()? {
        let genres = provider
            .movie_genres(movie.external_id)
            .await
            .map_err(|e| KurosawaError::Api(e.to_string()))?;
        for genre in genres {
            let genre_id = match storage.find_genre_by_external_id(genre.external_id)? {
                Some(existing) => existing.id,
                None => storage.insert_genre(genre.external_id, &genre.name)?,
            };
            storage.attach_genre(movie.id, genre_id)?;
            summary.details_attached += 1;
        }
        summary.movies_processed += 1;
    }

    tracing::info!(
        movies = summary.movies_processed,
        attached = summary.details_attached,
        "Fetched genres"
    );
    Ok(summary)
}

/// Fetch and attach cast members for movies that have none.
pub async fn populate_cast<P: MovieSearchProvider>(
    storage: &Storage,
    provider: &P,
) -> Result<FetchSummary, KurosawaError> {
    let mut summary = FetchSummary::default();

    for movie in storage.movies_without_cast()? {
        let cast = provider
            .movie_cast(movie.external_id)
            .await
            .map_err(|e| KurosawaError::Api(e.to_string()))?;
        for member in cast {
            let member_id = match storage.find_cast_member_by_external_id(member.external_id)? {
                Some(existing) => existing.id,
                None => storage.insert_cast_member(member.external_id, &member.name)?,
            };
            storage.attach_cast_member(movie.id, member_id)?;
            summary.details_attached += 1;
        }
        summary.movies_processed += 1;
    }

    tracing::info!(
        movies = summary.movies_processed,
        attached = summary.details_attached,
        "Fetched cast"
    );
    Ok(summary)
}

/// Fetch and attach directors for movies that have none.
pub async fn populate_directors<P: MovieSearchProvider>(
    storage: &Storage,
    provider: &P,
) -> Result<FetchSummary, KurosawaError> {
    let mut summary = FetchSummary::default();

    for movie in storage.movies_without_directors()? {
        let directors = provider
            .movie_directors(movie.external_id)
            .await
            .map_err(|e| KurosawaError::Api(e.to_string()))?;
        for director in directors {
            let director_id = match storage.find_director_by_external_id(director.external_id)? {
                Some(existing) => existing.id,
                None => storage.insert_director(director.external_id, &director.name)?,
            };
            storage.attach_director(movie.id, director_id)?;
            summary.details_attached += 1;
        }
        summary.movies_processed += 1;
    }

    tracing::info!(
        movies = summary.movies_processed,
        attached = summary.details_attached,
        "Fetched directors"
    );
    Ok(summary)
}

/// Fetch keyword lists for movies that never had one fetched.
pub async fn populate_keywords<P: MovieSearchProvider>(
    storage: &Storage,
    provider: &P,
) -> Result<FetchSummary, KurosawaError> {
    let mut summary = FetchSummary::default();

    for movie in storage.movies_without_keywords()? {
        let keywords = provider
            .movie_keywords(movie.external_id)
            .await
            .map_err(|e| KurosawaError::Api(e.to_string()))?;
        summary.details_attached += keywords.len() as u32;
        storage.set_movie_keywords(movie.id, &keywords)?;
        summary.movies_processed += 1;
    }

    tracing::info!(movies = summary.movies_processed, "Fetched keywords");
    Ok(summary)
}

/// Fetch IMDB ids for movies missing one.
pub async fn populate_imdb_ids<P: MovieSearchProvider>(
    storage: &Storage,
    provider: &P,
) -> Result<FetchSummary, KurosawaError> {
    let mut summary = FetchSummary::default();

    for movie in storage.movies_without_imdb_id()? {
        let imdb_id = provider
            .movie_imdb_id(movie.external_id)
            .await
            .map_err(|e| KurosawaError::Api(e.to_string()))?;
        if let Some(imdb_id) = imdb_id {
            storage.set_movie_imdb_id(movie.id, &imdb_id)?;
            summary.details_attached += 1;
        }
        summary.movies_processed += 1;
    }

    tracing::info!(movies = summary.movies_processed, "Fetched IMDB ids");
    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Movie;
    use kurosawa_api::traits::{MovieGenreResult, MoviePersonResult, MovieSearchResult};
    use std::collections::HashMap;

    #[derive(Debug, Default)]
    struct FakeDetails {
        genres: HashMap<u64, Vec<MovieGenreResult>>,
        directors: HashMap<u64, Vec<MoviePersonResult>>,
        keywords: HashMap<u64, Vec<String>>,
        imdb_ids: HashMap<u64, String>,
    }

    #[derive(Debug, thiserror::Error)]
    #[error("transport down")]
    struct FakeError;

    impl MovieSearchProvider for FakeDetails {
        type Error = FakeError;

        async fn search_movie(&self, _title: &str) -> Result<Vec<MovieSearchResult>, FakeError> {
            Ok(Vec::new())
        }

        async fn find_by_external_id(
            &self,
            _external_id: u64,
        ) -> Result<Option<MovieSearchResult>, FakeError> {
            Ok(None)
        }

        async fn movie_genres(
            &self,
            external_id: u64,
        ) -> Result<Vec<MovieGenreResult>, FakeError> {
            Ok(self.genres.get(&external_id).cloned().unwrap_or_default())
        }

        async fn movie_cast(
            &self,
            _external_id: u64,
        ) -> Result<Vec<MoviePersonResult>, FakeError> {
            Ok(Vec::new())
        }

        async fn movie_directors(
            &self,
            external_id: u64,
        ) -> Result<Vec<MoviePersonResult>, FakeError> {
            Ok(self.directors.get(&external_id).cloned().unwrap_or_default())
        }

        async fn movie_keywords(&self, external_id: u64) -> Result<Vec<String>, FakeError> {
            Ok(self.keywords.get(&external_id).cloned().unwrap_or_default())
        }

        async fn movie_imdb_id(&self, external_id: u64) -> Result<Option<String>, FakeError> {
            Ok(self.imdb_ids.get(&external_id).cloned())
        }
    }

    fn movie(external_id: u64, title: &str, year: i32) -> Movie {
        Movie {
            id: 0,
            external_id,
            title: title.into(),
            original_title: None,
            release_date: year,
            imdb_id: None,
            keywords: None,
            genres: vec![],
            cast_members: vec![],
            directors: vec![],
        }
    }

    #[tokio::test]
    async fn genres_are_fetched_and_shared_across_movies() {
        let storage = Storage::open_memory().unwrap();
        let fly = storage.insert_movie(&movie(551, "The Fly", 1986)).unwrap();
        let gummo = storage.insert_movie(&movie(9347, "Gummo", 1997)).unwrap();

        let drama = MovieGenreResult {
            external_id: 18,
            name: "drama".into(),
        };
        let provider = FakeDetails {
            genres: HashMap::from([
                (
                    551,
                    vec![
                        drama.clone(),
                        MovieGenreResult {
                            external_id: 27,
                            name: "horror".into(),
                        },
                    ],
                ),
                (9347, vec![drama]),
            ]),
            ..Default::default()
        };

        let summary = populate_genres(&storage, &provider).await.unwrap();
        assert_eq!(summary.movies_processed, 2);
        assert_eq!(summary.details_attached, 3);

        // "drama" exists once and is shared by both movies.
        assert_eq!(storage.all_genres().unwrap().len(), 2);
        assert_eq!(storage.get_movie(fly).unwrap().unwrap().genres.len(), 2);
        assert_eq!(storage.get_movie(gummo).unwrap().unwrap().genres.len(), 1);

        // A second run has nothing left to do.
        let summary = populate_genres(&storage, &provider).await.unwrap();
        assert_eq!(summary.movies_processed, 0);
    }

    #[tokio::test]
    async fn directors_are_fetched_for_movies_missing_them() {
        let storage = Storage::open_memory().unwrap();
        let gems = storage
            .insert_movie(&movie(473033, "Uncut Gems", 2019))
            .unwrap();

        let provider = FakeDetails {
            directors: HashMap::from([(
                473033,
                vec![
                    MoviePersonResult {
                        external_id: 64949,
                        name: "Benny Safdie".into(),
                    },
                    MoviePersonResult {
                        external_id: 64950,
                        name: "Josh Safdie".into(),
                    },
                ],
            )]),
            ..Default::default()
        };

        populate_directors(&storage, &provider).await.unwrap();
        let fetched = storage.get_movie(gems).unwrap().unwrap();
        assert_eq!(fetched.directors.len(), 2);
    }

    #[tokio::test]
    async fn keywords_and_imdb_ids_are_populated() {
        let storage = Storage::open_memory().unwrap();
        let fly = storage.insert_movie(&movie(551, "The Fly", 1986)).unwrap();

        let provider = FakeDetails {
            keywords: HashMap::from([(551, vec!["mutation".to_string()])]),
            imdb_ids: HashMap::from([(551, "tt0091064".to_string())]),
            ..Default::default()
        };

        populate_keywords(&storage, &provider).await.unwrap();
        populate_imdb_ids(&storage, &provider).await.unwrap();

        let fetched = storage.get_movie(fly).unwrap().unwrap();
        assert_eq!(fetched.keywords, Some(vec!["mutation".to_string()]));
        assert_eq!(fetched.imdb_id.as_deref(), Some("tt0091064"));
    }
}
