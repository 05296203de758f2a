//! Rip-to-movie linking.
//!
//! Resolves unlinked rips against the external movie database: search by
//! parsed title, disambiguate, then attach the canonical movie record.
//! Per-rip ambiguity is reported, never guessed; a transport failure
//! aborts the whole batch.

use std::collections::HashMap;
use std::sync::Mutex;

use futures::stream::{self, StreamExt, TryStreamExt};

use kurosawa_api::traits::{MovieSearchProvider, MovieSearchResult};

use crate::error::KurosawaError;
use crate::models::{Movie, MovieRip};
use crate::normalize;
use crate::storage::Storage;

/// How many rips resolve against the provider concurrently.
const LINK_CONCURRENCY: usize = 8;

/// Tolerance, in years, when disambiguating by parsed release date.
const RELEASE_DATE_TOLERANCE: i32 = 1;

/// Why a rip could not be linked. Recoverable and per-rip: the rip stays
/// unlinked and the condition is reported.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkFailure {
    /// The search returned nothing.
    NoSearchResults,
    /// The search returned several candidates and no disambiguation rule
    /// picked exactly one.
    MultipleSearchResults,
}

/// Aggregated outcome of one linking run.
#[derive(Debug, Default)]
pub struct LinkReport {
    pub linked: Vec<String>,
    pub no_search_results: Vec<String>,
    pub multiple_search_results: Vec<String>,
}

/// Validation result for one manually supplied external id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ManualIdValidation {
    pub external_id: u64,
    pub valid: bool,
}

/// Pick a single candidate from search results, or refuse.
///
/// One result is accepted as-is. Among several: first a unique candidate
/// within ±1 year of the parsed date wins; failing that, a unique
/// candidate whose title or original title token-equals the parsed title
/// wins; anything else is an unresolved ambiguity.
pub fn pick_from_results(
    results: &[MovieSearchResult],
    parsed_title: &str,
    parsed_date: Option<&str>,
) -> Result<MovieSearchResult, LinkFailure> {
    match results {
        [] => Err(LinkFailure::NoSearchResults),
        [only] => Ok(only.clone()),
        _ => {
            if let Some(year) = parsed_date.and_then(|d| d.parse::<i32>().ok()) {
                let within: Vec<&MovieSearchResult> = results
                    .iter()
                    .filter(|r| {
                        r.release_date
                            .is_some_and(|y| (y - year).abs() <= RELEASE_DATE_TOLERANCE)
                    })
                    .collect();
                if let [only] = within[..] {
                    return Ok(only.clone());
                }
            }

            let title_tokens = normalize::normalize_tokens(parsed_title);
            let exact: Vec<&MovieSearchResult> = results
                .iter()
                .filter(|r| {
                    normalize::normalize_tokens(&r.title) == title_tokens
                        || r.original_title
                            .as_deref()
                            .is_some_and(|t| normalize::normalize_tokens(t) == title_tokens)
                })
                .collect();
            if let [only] = exact[..] {
                return Ok(only.clone());
            }

            Err(LinkFailure::MultipleSearchResults)
        }
    }
}

/// Per-rip result of the concurrent resolution phase.
enum RipOutcome {
    Picked(u64),
    Failed(LinkFailure),
}

/// Search and link every unlinked rip that has a parsed title.
///
/// Resolution runs concurrently; the first resolution of each external id
/// wins and later rips in the batch reuse it. Successful links commit
/// together once the whole batch has resolved, so a transport error
/// leaves nothing half-linked.
pub async fn search_and_link<P: MovieSearchProvider>(
    storage: &Storage,
    provider: &P,
) -> Result<LinkReport, KurosawaError> {
    let unlinked: Vec<MovieRip> = storage
        .unlinked_rips()?
        .into_iter()
        .filter(|rip| rip.parsed_title.is_some())
        .collect();
    tracing::info!(count = unlinked.len(), "Linking unlinked rips");

    // First resolution of an external id wins; guarded because rips
    // resolve concurrently.
    let pending: Mutex<HashMap<u64, MovieSearchResult>> = Mutex::new(HashMap::new());

    let outcomes: Vec<(MovieRip, RipOutcome)> = stream::iter(unlinked)
        .map(|rip| {
            let pending = &pending;
            async move {
                let title = rip.parsed_title.clone().unwrap_or_default();
                let results = provider
                    .search_movie(&title)
                    .await
                    .map_err(|e| KurosawaError::Api(e.to_string()))?;

                match pick_from_results(&results, &title, rip.parsed_release_date.as_deref()) {
                    Ok(picked) => {
                        let external_id = picked.external_id;
                        pending
                            .lock()
                            .expect("pending-movie lock poisoned")
                            .entry(external_id)
                            .or_insert(picked);
                        Ok::<_, KurosawaError>((rip, RipOutcome::Picked(external_id)))
                    }
                    Err(failure) => Ok((rip, RipOutcome::Failed(failure))),
                }
            }
        })
        .buffer_unordered(LINK_CONCURRENCY)
        .try_collect()
        .await?;

    let pending = pending.into_inner().expect("pending-movie lock poisoned");
    let mut movie_ids: HashMap<u64, i64> = HashMap::new();
    let mut report = LinkReport::default();

    for (rip, outcome) in outcomes {
        match outcome {
            RipOutcome::Picked(external_id) => {
                let movie_id = match movie_ids.get(&external_id) {
                    Some(&id) => id,
                    None => {
                        let id = match storage.find_movie_by_external_id(external_id)? {
                            Some(existing) => existing.id,
                            None => {
                                let Some(picked) = pending.get(&external_id) else {
                                    continue;
                                };
                                storage.insert_movie(&movie_from_result(picked))?
                            }
                        };
                        movie_ids.insert(external_id, id);
                        id
                    }
                };
                storage.link_rip_to_movie(rip.id, movie_id)?;
                tracing::info!(file_name = %rip.file_name, external_id, "Linked rip");
                report.linked.push(rip.file_name);
            }
            RipOutcome::Failed(LinkFailure::NoSearchResults) => {
                tracing::warn!(file_name = %rip.file_name, "No search results");
                report.no_search_results.push(rip.file_name);
            }
            RipOutcome::Failed(LinkFailure::MultipleSearchResults) => {
                tracing::warn!(file_name = %rip.file_name, "Multiple unresolved search results");
                report.multiple_search_results.push(rip.file_name);
            }
        }
    }

    Ok(report)
}

/// Link rips from operator-provided `file name -> external id` overrides,
/// bypassing search entirely.
pub async fn link_from_manual_ids<P: MovieSearchProvider>(
    storage: &Storage,
    provider: &P,
    overrides: &HashMap<String, u64>,
) -> Result<LinkReport, KurosawaError> {
    let mut movie_ids: HashMap<u64, i64> = HashMap::new();
    let mut report = LinkReport::default();

    for (file_name, &external_id) in overrides {
        let Some(rip) = storage.find_rip_by_file_name(file_name)? else {
            tracing::warn!(file_name = %file_name, "Manual external id for unknown rip");
            continue;
        };
        if rip.movie_id.is_some() {
            continue;
        }

        let movie_id = match movie_ids.get(&external_id) {
            Some(&id) => id,
            None => {
                let id = match storage.find_movie_by_external_id(external_id)? {
                    Some(existing) => existing.id,
                    None => {
                        let fetched = provider
                            .find_by_external_id(external_id)
                            .await
                            .map_err(|e| KurosawaError::Api(e.to_string()))?;
                        let Some(result) = fetched else {
                            tracing::warn!(file_name = %file_name, external_id, "Manual external id not found");
                            report.no_search_results.push(rip.file_name);
                            continue;
                        };
                        storage.insert_movie(&movie_from_result(&result))?
                    }
                };
                movie_ids.insert(external_id, id);
                id
            }
        };

        storage.link_rip_to_movie(rip.id, movie_id)?;
        tracing::info!(file_name = %rip.file_name, external_id, "Linked rip from manual id");
        report.linked.push(rip.file_name);
    }

    Ok(report)
}

/// Re-check operator-provided external ids without mutating state.
///
/// An id passes when it still resolves and the returned title (or
/// original title) token-equals the rip's parsed title.
pub async fn validate_manual_ids<P: MovieSearchProvider>(
    storage: &Storage,
    provider: &P,
    overrides: &HashMap<String, u64>,
) -> Result<HashMap<String, ManualIdValidation>, KurosawaError> {
    let mut validations = HashMap::new();

    for (file_name, &external_id) in overrides {
        let parsed_title = storage
            .find_rip_by_file_name(file_name)?
            .and_then(|rip| rip.parsed_title);
        let fetched = provider
            .find_by_external_id(external_id)
            .await
            .map_err(|e| KurosawaError::Api(e.to_string()))?;

        let valid = match (&fetched, &parsed_title) {
            (Some(result), Some(title)) => {
                normalize::tokens_equal(&result.title, title)
                    || result
                        .original_title
                        .as_deref()
                        .is_some_and(|t| normalize::tokens_equal(t, title))
            }
            _ => false,
        };

        validations.insert(
            file_name.clone(),
            ManualIdValidation { external_id, valid },
        );
    }

    Ok(validations)
}

/// File names of all rips without a linked movie.
pub fn unlinked_rip_file_names(storage: &Storage) -> Result<Vec<String>, KurosawaError> {
    Ok(storage
        .unlinked_rips()?
        .into_iter()
        .map(|rip| rip.file_name)
        .collect())
}

fn movie_from_result(result: &MovieSearchResult) -> Movie {
    Movie {
        id: 0,
        external_id: result.external_id,
        title: result.title.clone(),
        original_title: result.original_title.clone(),
        release_date: result.release_date.unwrap_or(0),
        imdb_id: None,
        keywords: None,
        genres: Vec::new(),
        cast_members: Vec::new(),
        directors: Vec::new(),
    }
}
