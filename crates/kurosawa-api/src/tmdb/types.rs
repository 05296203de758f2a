use serde::Deserialize;

use crate::traits::{MovieGenreResult, MoviePersonResult, MovieSearchResult};

// ── Search responses ────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct TmdbSearchResponse {
    pub results: Vec<TmdbMovieNode>,
}

#[derive(Debug, Deserialize)]
pub struct TmdbMovieNode {
    pub id: u64,
    pub title: String,
    pub original_title: Option<String>,
    /// Full date string, e.g. "2021-11-26". Sometimes empty.
    pub release_date: Option<String>,
}

// ── Movie detail responses ──────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct TmdbMovieDetails {
    pub id: u64,
    pub title: String,
    pub original_title: Option<String>,
    pub release_date: Option<String>,
    #[serde(default)]
    pub genres: Vec<TmdbGenre>,
    pub imdb_id: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct TmdbGenre {
    pub id: u64,
    pub name: String,
}

#[derive(Debug, Deserialize)]
pub struct TmdbCreditsResponse {
    #[serde(default)]
    pub cast: Vec<TmdbPerson>,
    #[serde(default)]
    pub crew: Vec<TmdbCrewMember>,
}

#[derive(Debug, Deserialize)]
pub struct TmdbPerson {
    pub id: u64,
    pub name: String,
}

#[derive(Debug, Deserialize)]
pub struct TmdbCrewMember {
    pub id: u64,
    pub name: String,
    pub job: String,
}

#[derive(Debug, Deserialize)]
pub struct TmdbKeywordsResponse {
    #[serde(default)]
    pub keywords: Vec<TmdbKeyword>,
}

#[derive(Debug, Deserialize)]
pub struct TmdbKeyword {
    pub name: String,
}

// ── Conversions to shared trait types ───────────────────────────

/// Extract the 4-digit year from a TMDB date string ("2021-11-26").
fn release_year(date: Option<&str>) -> Option<i32> {
    date.and_then(|d| d.get(..4)).and_then(|y| y.parse().ok())
}

impl TmdbMovieNode {
    pub fn into_search_result(self) -> MovieSearchResult {
        let release_date = release_year(self.release_date.as_deref());
        MovieSearchResult {
            external_id: self.id,
            title: self.title,
            original_title: self.original_title,
            release_date,
        }
    }
}

impl TmdbMovieDetails {
    pub fn into_search_result(self) -> MovieSearchResult {
        let release_date = release_year(self.release_date.as_deref());
        MovieSearchResult {
            external_id: self.id,
            title: self.title,
            original_title: self.original_title,
            release_date,
        }
    }
}

impl From<TmdbGenre> for MovieGenreResult {
    fn from(genre: TmdbGenre) -> Self {
        Self {
            external_id: genre.id,
            name: genre.name,
        }
    }
}

impl From<TmdbPerson> for MoviePersonResult {
    fn from(person: TmdbPerson) -> Self {
        Self {
            external_id: person.id,
            name: person.name,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn release_year_from_full_date() {
        assert_eq!(release_year(Some("2021-11-26")), Some(2021));
    }

    #[test]
    fn release_year_from_empty_or_missing_date() {
        assert_eq!(release_year(Some("")), None);
        assert_eq!(release_year(None), None);
    }

    #[test]
    fn search_node_deserializes_and_converts() {
        let json = r#"{
            "id": 774825,
            "title": "Licorice Pizza",
            "original_title": "Licorice Pizza",
            "release_date": "2021-11-26"
        }"#;
        let node: TmdbMovieNode = serde_json::from_str(json).unwrap();
        let result = node.into_search_result();
        assert_eq!(result.external_id, 774825);
        assert_eq!(result.title, "Licorice Pizza");
        assert_eq!(result.release_date, Some(2021));
    }
}
