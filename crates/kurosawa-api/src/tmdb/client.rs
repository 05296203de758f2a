use reqwest::Client;

use super::error::TmdbError;
use super::types::{
    TmdbCreditsResponse, TmdbKeywordsResponse, TmdbMovieDetails, TmdbSearchResponse,
};
use crate::traits::{MovieGenreResult, MoviePersonResult, MovieSearchProvider, MovieSearchResult};

const BASE_URL: &str = "https://api.themoviedb.org/3";

/// The Movie Database v3 API client, authenticated by query-string API key.
pub struct TmdbClient {
    api_key: String,
    http: Client,
}

impl TmdbClient {
    pub fn new(api_key: String) -> Self {
        Self {
            api_key,
            http: Client::new(),
        }
    }

    /// Check the HTTP response for errors and return the body text on failure.
    async fn check_response(resp: reqwest::Response) -> Result<reqwest::Response, TmdbError> {
        if resp.status().is_success() {
            Ok(resp)
        } else {
            let status = resp.status().as_u16();
            let body = resp.text().await.unwrap_or_default();
            tracing::warn!(status, "TMDB API error");
            Err(TmdbError::Api {
                status,
                message: body,
            })
        }
    }

    async fn credits(&self, external_id: u64) -> Result<TmdbCreditsResponse, TmdbError> {
        let resp = self
            .http
            .get(format!("{BASE_URL}/movie/{external_id}/credits"))
            .query(&[("api_key", self.api_key.as_str())])
            .send()
            .await?;

        let resp = Self::check_response(resp).await?;
        resp.json()
            .await
            .map_err(|e| TmdbError::Parse(e.to_string()))
    }

    /// Fetch the full detail record for an external id; `None` on 404.
    async fn movie_details(&self, external_id: u64) -> Result<Option<TmdbMovieDetails>, TmdbError> {
        let resp = self
            .http
            .get(format!("{BASE_URL}/movie/{external_id}"))
            .query(&[("api_key", self.api_key.as_str())])
            .send()
            .await?;

        match Self::check_response(resp).await {
            Ok(resp) => {
                let details: TmdbMovieDetails = resp
                    .json()
                    .await
                    .map_err(|e| TmdbError::Parse(e.to_string()))?;
                Ok(Some(details))
            }
            Err(TmdbError::Api { status: 404, .. }) => Ok(None),
            Err(e) => Err(e),
        }
    }
}

/// Build the search query from a title: lowercase words with punctuation
/// stripped from their edges, mirroring how titles are compared elsewhere.
fn search_query(title: &str) -> String {
    title
        .trim()
        .to_lowercase()
        .split_whitespace()
        .map(|word| word.trim_matches(|c: char| !c.is_alphanumeric()))
        .filter(|word| !word.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

impl MovieSearchProvider for TmdbClient {
    type Error = TmdbError;

    async fn search_movie(&self, title: &str) -> Result<Vec<MovieSearchResult>, TmdbError> {
        let query = search_query(title);
        let resp = self
            .http
            .get(format!("{BASE_URL}/search/movie"))
            .query(&[
                ("api_key", self.api_key.as_str()),
                ("query", query.as_str()),
                ("page", "1"),
            ])
            .send()
            .await?;

        let resp = Self::check_response(resp).await?;
        let search: TmdbSearchResponse = resp
            .json()
            .await
            .map_err(|e| TmdbError::Parse(e.to_string()))?;

        Ok(search
            .results
            .into_iter()
            .map(|node| node.into_search_result())
            .collect())
    }

    async fn find_by_external_id(
        &self,
        external_id: u64,
    ) -> Result<Option<MovieSearchResult>, TmdbError> {
        Ok(self
            .movie_details(external_id)
            .await?
            .map(|details| details.into_search_result()))
    }

    async fn movie_genres(&self, external_id: u64) -> Result<Vec<MovieGenreResult>, TmdbError> {
        let details = self.movie_details(external_id).await?;
        Ok(details
            .map(|d| d.genres.into_iter().map(Into::into).collect())
            .unwrap_or_default())
    }

    async fn movie_cast(&self, external_id: u64) -> Result<Vec<MoviePersonResult>, TmdbError> {
        let credits = self.credits(external_id).await?;
        Ok(credits.cast.into_iter().map(Into::into).collect())
    }

    async fn movie_directors(&self, external_id: u64) -> Result<Vec<MoviePersonResult>, TmdbError> {
        let credits = self.credits(external_id).await?;
        Ok(credits
            .crew
            .into_iter()
            .filter(|member| member.job == "Director")
            .map(|member| MoviePersonResult {
                external_id: member.id,
                name: member.name,
            })
            .collect())
    }

    async fn movie_keywords(&self, external_id: u64) -> Result<Vec<String>, TmdbError> {
        let resp = self
            .http
            .get(format!("{BASE_URL}/movie/{external_id}/keywords"))
            .query(&[("api_key", self.api_key.as_str())])
            .send()
            .await?;

        let resp = Self::check_response(resp).await?;
        let keywords: TmdbKeywordsResponse = resp
            .json()
            .await
            .map_err(|e| TmdbError::Parse(e.to_string()))?;

        Ok(keywords.keywords.into_iter().map(|k| k.name).collect())
    }

    async fn movie_imdb_id(&self, external_id: u64) -> Result<Option<String>, TmdbError> {
        let details = self.movie_details(external_id).await?;
        Ok(details.and_then(|d| d.imdb_id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn search_query_strips_punctuation_and_case() {
        assert_eq!(search_query("Where, Art Thou!"), "where art thou");
        assert_eq!(search_query("  The Fly  "), "the fly");
        assert_eq!(search_query("co-op"), "co-op");
    }
}
