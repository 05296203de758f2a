//! Movie-level reporting over warehouse visits: visit diffs, entity
//! filters, flattened counts and title search.
//!
//! All operations are pure computations over already-loaded snapshot
//! data; the distinct linked movies of a visit are the unit of
//! comparison throughout.

use std::collections::{HashMap, HashSet};

use chrono::{DateTime, Utc};

use crate::error::KurosawaError;
use crate::models::{CastMember, Director, Genre, Movie, Visit};
use crate::normalize;
use crate::storage::Storage;

/// Movie-level reports computed from visit snapshots.
pub struct ScanMoviesManager<'a> {
    storage: &'a Storage,
}

impl<'a> ScanMoviesManager<'a> {
    pub fn new(storage: &'a Storage) -> Self {
        Self { storage }
    }

    /// Dates of every registered visit, in chronological order.
    pub fn list_visit_dates(&self) -> Result<Vec<DateTime<Utc>>, KurosawaError> {
        Ok(self
            .storage
            .all_visits()?
            .into_iter()
            .map(|visit| visit.visit_date_time)
            .collect())
    }

    /// The most recent visit.
    pub fn closest_visit(&self) -> Result<Option<Visit>, KurosawaError> {
        self.storage.closest_visit()
    }

    /// The most recent visit at or before the given date.
    pub fn closest_visit_to(
        &self,
        date: DateTime<Utc>,
    ) -> Result<Option<Visit>, KurosawaError> {
        self.storage.closest_visit_to(date)
    }

    /// Diff of the distinct movies between two visits.
    ///
    /// `left` must be strictly older than `right`; violating the order is
    /// a contract error. With no left visit, nothing counts as removed
    /// and every movie of `right` counts as added. Movies present in
    /// both are excluded from both sides. Keys are `"added"` and
    /// `"removed"`; values are movie display strings.
    pub fn visit_diff(
        &self,
        left: Option<&Visit>,
        right: &Visit,
    ) -> Result<HashMap<String, HashSet<String>>, KurosawaError> {
        if let Some(left) = left {
            if left.visit_date_time >= right.visit_date_time {
                return Err(KurosawaError::VisitOrder {
                    left: left.visit_date_time,
                    right: right.visit_date_time,
                });
            }
        }

        let right_movies: HashSet<String> = self
            .storage
            .movies_in_visit(right)?
            .iter()
            .map(Movie::to_string)
            .collect();
        let left_movies: HashSet<String> = match left {
            Some(visit) => self
                .storage
                .movies_in_visit(visit)?
                .iter()
                .map(Movie::to_string)
                .collect(),
            None => HashSet::new(),
        };

        let added = right_movies.difference(&left_movies).cloned().collect();
        let removed = left_movies.difference(&right_movies).cloned().collect();

        Ok(HashMap::from([
            ("added".to_string(), added),
            ("removed".to_string(), removed),
        ]))
    }

    /// Movies of a visit having at least one of the given genres.
    pub fn movies_with_genres(
        &self,
        visit: &Visit,
        genres: &[Genre],
    ) -> Result<Vec<Movie>, KurosawaError> {
        let wanted: HashSet<u64> = genres.iter().map(|g| g.external_id).collect();
        Ok(self
            .storage
            .movies_in_visit(visit)?
            .into_iter()
            .filter(|movie| movie.genres.iter().any(|g| wanted.contains(&g.external_id)))
            .collect())
    }

    /// Movies of a visit having at least one of the given cast members.
    pub fn movies_with_cast(
        &self,
        visit: &Visit,
        cast: &[CastMember],
    ) -> Result<Vec<Movie>, KurosawaError> {
        let wanted: HashSet<u64> = cast.iter().map(|c| c.external_id).collect();
        Ok(self
            .storage
            .movies_in_visit(visit)?
            .into_iter()
            .filter(|movie| {
                movie
                    .cast_members
                    .iter()
                    .any(|c| wanted.contains(&c.external_id))
            })
            .collect())
    }

    /// Movies of a visit having at least one of the given directors.
    pub fn movies_with_directors(
        &self,
        visit: &Visit,
        directors: &[Director],
    ) -> Result<Vec<Movie>, KurosawaError> {
        let wanted: HashSet<u64> = directors.iter().map(|d| d.external_id).collect();
        Ok(self
            .storage
            .movies_in_visit(visit)?
            .into_iter()
            .filter(|movie| {
                movie
                    .directors
                    .iter()
                    .any(|d| wanted.contains(&d.external_id))
            })
            .collect())
    }

    /// Movies of a visit released in any of the given years.
    pub fn movies_with_release_dates(
        &self,
        visit: &Visit,
        years: &[i32],
    ) -> Result<Vec<Movie>, KurosawaError> {
        Ok(self
            .storage
            .movies_in_visit(visit)?
            .into_iter()
            .filter(|movie| years.contains(&movie.release_date))
            .collect())
    }

    /// Movie count per genre over a visit, in first-discovery order.
    pub fn count_by_genre(&self, visit: &Visit) -> Result<Vec<(Genre, usize)>, KurosawaError> {
        let mut counts: Vec<(Genre, usize)> = Vec::new();
        for movie in self.storage.movies_in_visit(visit)? {
            for genre in movie.genres {
                match counts
                    .iter_mut()
                    .find(|(g, _)| g.external_id == genre.external_id)
                {
                    Some((_, n)) => *n += 1,
                    None => counts.push((genre, 1)),
                }
            }
        }
        Ok(counts)
    }

    /// Movie count per cast member over a visit, in first-discovery order.
    pub fn count_by_cast_member(
        &self,
        visit: &Visit,
    ) -> Result<Vec<(CastMember, usize)>, KurosawaError> {
        let mut counts: Vec<(CastMember, usize)> = Vec::new();
        for movie in self.storage.movies_in_visit(visit)? {
            for member in movie.cast_members {
                match counts
                    .iter_mut()
                    .find(|(c, _)| c.external_id == member.external_id)
                {
                    Some((_, n)) => *n += 1,
                    None => counts.push((member, 1)),
                }
            }
        }
        Ok(counts)
    }

    /// Movie count per director over a visit, in first-discovery order.
    pub fn count_by_director(
        &self,
        visit: &Visit,
    ) -> Result<Vec<(Director, usize)>, KurosawaError> {
        let mut counts: Vec<(Director, usize)> = Vec::new();
        for movie in self.storage.movies_in_visit(visit)? {
            for director in movie.directors {
                match counts
                    .iter_mut()
                    .find(|(d, _)| d.external_id == director.external_id)
                {
                    Some((_, n)) => *n += 1,
                    None => counts.push((director, 1)),
                }
            }
        }
        Ok(counts)
    }

    /// Search a visit's movies by title.
    ///
    /// Token-set containment: every query token must appear among the
    /// movie's title tokens, in any order, case- and
    /// diacritic-insensitively. Year tokens in the query are ignored, so
    /// `"licorice pizza (2021)"` still finds "Licorice Pizza".
    pub fn search_movies_by_title(
        &self,
        visit: &Visit,
        query: &str,
    ) -> Result<Vec<Movie>, KurosawaError> {
        let query_tokens: Vec<String> = normalize::normalize_tokens(query)
            .into_iter()
            .filter(|token| !is_year_token(token))
            .collect();
        if query_tokens.is_empty() {
            return Ok(Vec::new());
        }

        Ok(self
            .storage
            .movies_in_visit(visit)?
            .into_iter()
            .filter(|movie| {
                let title_tokens = normalize::normalize_tokens(&movie.title);
                query_tokens.iter().all(|q| title_tokens.contains(q))
            })
            .collect())
    }

    /// Genres whose name contains every token of the given name.
    pub fn genres_from_name(&self, name: &str) -> Result<Vec<Genre>, KurosawaError> {
        let query_tokens = normalize::normalize_tokens(name);
        Ok(self
            .storage
            .all_genres()?
            .into_iter()
            .filter(|genre| contains_all_tokens(&genre.name, &query_tokens))
            .collect())
    }

    /// Cast members whose name contains every token of the given name.
    pub fn cast_members_from_name(
        &self,
        name: &str,
    ) -> Result<Vec<CastMember>, KurosawaError> {
        let query_tokens = normalize::normalize_tokens(name);
        Ok(self
            .storage
            .all_cast_members()?
            .into_iter()
            .filter(|member| contains_all_tokens(&member.name, &query_tokens))
            .collect())
    }

    /// Directors whose name contains every token of the given name.
    pub fn directors_from_name(&self, name: &str) -> Result<Vec<Director>, KurosawaError> {
        let query_tokens = normalize::normalize_tokens(name);
        Ok(self
            .storage
            .all_directors()?
            .into_iter()
            .filter(|director| contains_all_tokens(&director.name, &query_tokens))
            .collect())
    }
}

/// A 4-digit token in the 1900–2099 range.
fn is_year_token(token: &str) -> bool {
    token.len() == 4
        && token.chars().all(|c| c.is_ascii_digit())
        && (token.starts_with("19") || token.starts_with("20"))
}

fn contains_all_tokens(candidate: &str, query_tokens: &[String]) -> bool {
    if query_tokens.is_empty() {
        return false;
    }
    let tokens = normalize::normalize_tokens(candidate);
    query_tokens.iter().all(|q| tokens.contains(q))
}
