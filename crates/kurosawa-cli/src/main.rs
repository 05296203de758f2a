//! Command-line surface for the warehouse cataloguer.

use std::path::{Path, PathBuf};

use chrono::{DateTime, NaiveDate, Utc};
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use kurosawa_api::tmdb::TmdbClient;
use kurosawa_core::config::AppConfig;
use kurosawa_core::error::KurosawaError;
use kurosawa_core::models::Visit;
use kurosawa_core::scan_movies::ScanMoviesManager;
use kurosawa_core::scan_rips::ScanRipsManager;
use kurosawa_core::storage::Storage;
use kurosawa_core::{fetcher, linker, warehouse};

#[derive(Debug, Parser)]
#[command(name = "kurosawa", about = "Movie warehouse cataloguer", version)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Enumerate the warehouse or register a visit from a dump file.
    Visit {
        /// Write the warehouse contents to a dated dump file.
        #[arg(long)]
        list_contents: bool,
        /// Register a visit from a previously written dump file.
        #[arg(long, value_name = "DUMP_FILE")]
        persist: Option<PathBuf>,
    },
    /// Rip-level reports over the registered visits.
    ScanRips {
        /// Rip count of the latest visit, grouped by parsed release year.
        #[arg(long)]
        count_by_release_date: bool,
        /// File names of the latest visit's rips with this parsed year.
        #[arg(long, value_name = "YEAR")]
        with_release_date: Option<String>,
        /// Rip count per visit.
        #[arg(long)]
        count_by_visit: bool,
        /// File-name diff of the last two visits.
        #[arg(long)]
        last_visit_diff: bool,
    },
    /// Movie-level reports over a visit.
    ScanMovies {
        /// List the dates of all registered visits.
        #[arg(long)]
        list_visits: bool,
        /// Visit to report on (YYYYMMDD); the latest when omitted.
        #[arg(long, value_name = "DATE")]
        visit: Option<String>,
        /// Movies having any of these genres.
        #[arg(long, value_name = "NAME")]
        with_genres: Vec<String>,
        /// Movies having any of these cast members.
        #[arg(long, value_name = "NAME")]
        with_cast: Vec<String>,
        /// Movies having any of these directors.
        #[arg(long, value_name = "NAME")]
        with_directors: Vec<String>,
        /// Movie count by genre.
        #[arg(long)]
        by_genre: bool,
        /// Movie count by cast member.
        #[arg(long)]
        by_cast: bool,
        /// Movie count by director.
        #[arg(long)]
        by_director: bool,
        /// Search the visit's movies by title.
        #[arg(long, value_name = "QUERY")]
        search_title: Option<String>,
        /// Only print the top N rows of a count report.
        #[arg(long, value_name = "N")]
        top: Option<usize>,
    },
    /// Link rips to canonical movies.
    Link {
        /// Search the external database and link unlinked rips.
        #[arg(long)]
        search: bool,
        /// Link from the configured manual external ids.
        #[arg(long)]
        from_manual_ids: bool,
        /// Validate the configured manual external ids.
        #[arg(long)]
        validate_manual_ids: bool,
        /// List rips without a linked movie.
        #[arg(long)]
        unlinked: bool,
    },
    /// Fetch movie details from the external database.
    Fetch {
        #[arg(long)]
        genres: bool,
        #[arg(long)]
        cast: bool,
        #[arg(long)]
        directors: bool,
        #[arg(long)]
        keywords: bool,
        #[arg(long)]
        imdb_ids: bool,
    },
}

#[tokio::main]
async fn main() -> Result<(), KurosawaError> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();
    let config = AppConfig::load()?;
    let storage = Storage::open(&AppConfig::ensure_db_path()?)?;
    let provider = TmdbClient::new(config.tmdb.api_key.clone());

    match cli.command {
        Command::Visit {
            list_contents,
            persist,
        } => handle_visit(&config, &storage, list_contents, persist),
        Command::ScanRips {
            count_by_release_date,
            with_release_date,
            count_by_visit,
            last_visit_diff,
        } => handle_scan_rips(
            &storage,
            count_by_release_date,
            with_release_date,
            count_by_visit,
            last_visit_diff,
        ),
        Command::ScanMovies {
            list_visits,
            visit,
            with_genres,
            with_cast,
            with_directors,
            by_genre,
            by_cast,
            by_director,
            search_title,
            top,
        } => handle_scan_movies(
            &storage,
            list_visits,
            visit,
            with_genres,
            with_cast,
            with_directors,
            by_genre,
            by_cast,
            by_director,
            search_title,
            top,
        ),
        Command::Link {
            search,
            from_manual_ids,
            validate_manual_ids,
            unlinked,
        } => {
            handle_link(
                &config,
                &storage,
                &provider,
                search,
                from_manual_ids,
                validate_manual_ids,
                unlinked,
            )
            .await
        }
        Command::Fetch {
            genres,
            cast,
            directors,
            keywords,
            imdb_ids,
        } => {
            handle_fetch(
                &storage, &provider, genres, cast, directors, keywords, imdb_ids,
            )
            .await
        }
    }
}

fn handle_visit(
    config: &AppConfig,
    storage: &Storage,
    list_contents: bool,
    persist: Option<PathBuf>,
) -> Result<(), KurosawaError> {
    if list_contents {
        let dump_path = warehouse::dump_warehouse_contents(
            Path::new(&config.warehouse.directory),
            Path::new(&config.warehouse.dump_directory),
            Utc::now().date_naive(),
        )?;
        println!("Wrote warehouse dump: {}", dump_path.display());
    } else if let Some(dump_path) = persist {
        let file_name = dump_path
            .file_name()
            .and_then(|name| name.to_str())
            .unwrap_or_default();
        let date = warehouse::dump_file_date(file_name).ok_or_else(|| {
            KurosawaError::Config(format!(
                "cannot read a visit date from dump file name '{file_name}'"
            ))
        })?;
        let entries = warehouse::read_dump(&dump_path)?;
        let visit_date_time = date
            .and_hms_opt(0, 0, 0)
            .map(|naive| naive.and_utc())
            .unwrap_or_else(Utc::now);

        let registration = warehouse::register_visit(storage, &entries, visit_date_time)?;
        println!(
            "Registered visit {}: {} entries ({} new, {} reused, {} parse failures)",
            date.format("%Y%m%d"),
            registration.entries_total,
            registration.rips_new,
            registration.rips_reused,
            registration.parse_failures,
        );
    } else {
        println!("No action requested...");
    }
    Ok(())
}

fn handle_scan_rips(
    storage: &Storage,
    count_by_release_date: bool,
    with_release_date: Option<String>,
    count_by_visit: bool,
    last_visit_diff: bool,
) -> Result<(), KurosawaError> {
    let manager = ScanRipsManager::new(storage);

    if count_by_release_date {
        println!("Rip count by release date:\n");
        let counts = manager.rip_count_by_release_date()?;
        let mut rows: Vec<_> = counts.into_iter().collect();
        rows.sort();
        for (year, count) in rows {
            println!("{year}: {count}");
        }
    } else if let Some(year) = with_release_date {
        let mut names = manager.rips_with_release_date(&year)?;
        names.sort();
        println!("Rips with release date {year}: {}\n", names.len());
        for name in names {
            println!("{name}");
        }
    } else if count_by_visit {
        println!("Rip count by visit:\n");
        for (date, count) in manager.rip_count_by_visit()? {
            println!("{} : {count}", date.format("%Y%m%d"));
        }
    } else if last_visit_diff {
        println!("Diff of the last two visits:");
        let diff = manager.last_visit_diff()?;
        let mut sections: Vec<_> = diff.into_iter().collect();
        sections.sort();
        for (section, mut names) in sections {
            names.sort();
            println!("\n----------");
            println!("{section}\n");
            println!("{}", names.join("\n"));
        }
    } else {
        println!("No action requested...");
    }
    Ok(())
}

#[allow(clippy::too_many_arguments)]
fn handle_scan_movies(
    storage: &Storage,
    list_visits: bool,
    visit: Option<String>,
    with_genres: Vec<String>,
    with_cast: Vec<String>,
    with_directors: Vec<String>,
    by_genre: bool,
    by_cast: bool,
    by_director: bool,
    search_title: Option<String>,
    top: Option<usize>,
) -> Result<(), KurosawaError> {
    let manager = ScanMoviesManager::new(storage);

    if list_visits {
        println!("Dates for all warehouse visits:");
        let mut dates = manager.list_visit_dates()?;
        dates.reverse();
        for date in dates {
            println!("{}", date.format("%Y%m%d"));
        }
        return Ok(());
    }

    let visit = resolve_visit(&manager, visit.as_deref())?;
    println!("Visit: {}", visit.visit_date_time.format("%B %d %Y"));

    if !with_genres.is_empty() {
        let genres: Vec<_> = with_genres
            .iter()
            .map(|name| manager.genres_from_name(name))
            .collect::<Result<Vec<_>, _>>()?
            .into_iter()
            .flatten()
            .collect();
        let names: Vec<&str> = genres.iter().map(|g| g.name.as_str()).collect();
        println!("Movies with genres: {}\n", names.join(" | "));
        for movie in manager.movies_with_genres(&visit, &genres)? {
            println!("{movie}");
        }
    } else if !with_cast.is_empty() {
        let cast: Vec<_> = with_cast
            .iter()
            .map(|name| manager.cast_members_from_name(name))
            .collect::<Result<Vec<_>, _>>()?
            .into_iter()
            .flatten()
            .collect();
        let names: Vec<&str> = cast.iter().map(|c| c.name.as_str()).collect();
        println!("Movies with cast members: {}\n", names.join(" | "));
        for movie in manager.movies_with_cast(&visit, &cast)? {
            println!("{movie}");
        }
    } else if !with_directors.is_empty() {
        let directors: Vec<_> = with_directors
            .iter()
            .map(|name| manager.directors_from_name(name))
            .collect::<Result<Vec<_>, _>>()?
            .into_iter()
            .flatten()
            .collect();
        let names: Vec<&str> = directors.iter().map(|d| d.name.as_str()).collect();
        println!("Movies with directors: {}\n", names.join(" | "));
        for movie in manager.movies_with_directors(&visit, &directors)? {
            println!("{movie}");
        }
    } else if by_genre {
        println!("Count by genre:\n");
        let counts = manager.count_by_genre(&visit)?;
        for (genre, count) in top_rows(counts, top, |genre| genre.name.clone()) {
            println!("{}: {count}", genre.name);
        }
    } else if by_cast {
        println!("Count by cast member:\n");
        let counts = manager.count_by_cast_member(&visit)?;
        for (member, count) in top_rows(counts, top, |member| member.name.clone()) {
            println!("{}: {count}", member.name);
        }
    } else if by_director {
        println!("Count by director:\n");
        let counts = manager.count_by_director(&visit)?;
        for (director, count) in top_rows(counts, top, |director| director.name.clone()) {
            println!("{}: {count}", director.name);
        }
    } else if let Some(query) = search_title {
        println!("Movies matching '{query}':\n");
        for movie in manager.search_movies_by_title(&visit, &query)? {
            println!("{movie}");
        }
    } else {
        println!("No action requested...");
    }
    Ok(())
}

async fn handle_link(
    config: &AppConfig,
    storage: &Storage,
    provider: &TmdbClient,
    search: bool,
    from_manual_ids: bool,
    validate_manual_ids: bool,
    unlinked: bool,
) -> Result<(), KurosawaError> {
    if search {
        println!("Linking rips...");
        let report = linker::search_and_link(storage, provider).await?;
        print_link_report(&report);
    } else if from_manual_ids {
        println!("Linking rips from manual external ids...");
        let report =
            linker::link_from_manual_ids(storage, provider, &config.manual_external_ids).await?;
        print_link_report(&report);
    } else if validate_manual_ids {
        println!("Validating manual external ids:\n");
        let validations =
            linker::validate_manual_ids(storage, provider, &config.manual_external_ids).await?;
        let mut rows: Vec<_> = validations.into_iter().collect();
        rows.sort_by(|a, b| a.0.cmp(&b.0));
        for (file_name, validation) in rows {
            let status = if validation.valid { "ok" } else { "FAILED" };
            println!("{file_name}");
            println!("{} : {status}\n", validation.external_id);
        }
    } else if unlinked {
        println!("Unlinked rips:\n");
        for file_name in linker::unlinked_rip_file_names(storage)? {
            println!("{file_name}");
        }
    } else {
        println!("No action requested...");
    }
    Ok(())
}

async fn handle_fetch(
    storage: &Storage,
    provider: &TmdbClient,
    genres: bool,
    cast: bool,
    directors: bool,
    keywords: bool,
    imdb_ids: bool,
) -> Result<(), KurosawaError> {
    if genres {
        println!("Fetching genres for movies...");
        let summary = fetcher::populate_genres(storage, provider).await?;
        print_fetch_summary(&summary);
    } else if cast {
        println!("Fetching cast for movies...");
        let summary = fetcher::populate_cast(storage, provider).await?;
        print_fetch_summary(&summary);
    } else if directors {
        println!("Fetching directors for movies...");
        let summary = fetcher::populate_directors(storage, provider).await?;
        print_fetch_summary(&summary);
    } else if keywords {
        println!("Fetching keywords for movies...");
        let summary = fetcher::populate_keywords(storage, provider).await?;
        print_fetch_summary(&summary);
    } else if imdb_ids {
        println!("Fetching IMDB ids for movies...");
        let summary = fetcher::populate_imdb_ids(storage, provider).await?;
        print_fetch_summary(&summary);
    } else {
        println!("No fetch requested...");
    }
    Ok(())
}

/// Resolve the visit to report on: the one closest to the given YYYYMMDD
/// date, or the latest when none is given.
fn resolve_visit(
    manager: &ScanMoviesManager<'_>,
    date: Option<&str>,
) -> Result<Visit, KurosawaError> {
    let visit = match date {
        Some(date) => {
            let parsed = parse_visit_date(date)?;
            manager.closest_visit_to(parsed)?
        }
        None => manager.closest_visit()?,
    };
    visit.ok_or(KurosawaError::NoVisits)
}

fn parse_visit_date(date: &str) -> Result<DateTime<Utc>, KurosawaError> {
    NaiveDate::parse_from_str(date, "%Y%m%d")
        .ok()
        .and_then(|naive| naive.and_hms_opt(23, 59, 59))
        .map(|naive| naive.and_utc())
        .ok_or_else(|| {
            KurosawaError::Config(format!("invalid visit date '{date}': expected YYYYMMDD"))
        })
}

fn print_link_report(report: &linker::LinkReport) {
    println!("Linked: {}", report.linked.len());
    if !report.no_search_results.is_empty() {
        println!("\nNo search results:");
        for file_name in &report.no_search_results {
            println!("{file_name}");
        }
    }
    if !report.multiple_search_results.is_empty() {
        println!("\nMultiple unresolved search results:");
        for file_name in &report.multiple_search_results {
            println!("{file_name}");
        }
    }
}

fn print_fetch_summary(summary: &fetcher::FetchSummary) {
    println!(
        "Processed {} movies, attached {} details",
        summary.movies_processed, summary.details_attached
    );
}

/// Order count rows by descending count, then name, keeping the top N.
fn top_rows<T>(
    counts: Vec<(T, usize)>,
    top: Option<usize>,
    name: impl Fn(&T) -> String,
) -> Vec<(T, usize)> {
    let mut rows = counts;
    rows.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| name(&a.0).cmp(&name(&b.0))));
    match top {
        Some(n) => rows.into_iter().take(n).collect(),
        None => rows,
    }
}
