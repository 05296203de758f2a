use std::path::Path;

use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension};

use crate::error::KurosawaError;
use crate::models::{CastMember, Director, Genre, Movie, MovieRip, Visit};

const SCHEMA_V1: &str = include_str!("../../../migrations/001_initial.sql");

const MOVIE_COLUMNS: &str = "id, external_id, title, original_title, release_date, imdb_id, keywords";
const RIP_COLUMNS: &str = "id, file_name, parsed_title, parsed_release_date, parsed_rip_quality, \
                           parsed_rip_info, parsed_rip_group, movie_id";

/// SQLite-backed storage for the warehouse catalogue.
pub struct Storage {
    conn: Connection,
}

impl Storage {
    /// Open (or create) the database at the given path and run migrations.
    pub fn open(path: &Path) -> Result<Self, KurosawaError> {
        let conn = Connection::open(path)?;
        conn.execute_batch("PRAGMA journal_mode=WAL; PRAGMA foreign_keys=ON;")?;
        run_migrations(&conn)?;
        Ok(Self { conn })
    }

    /// Open an in-memory database (for tests).
    pub fn open_memory() -> Result<Self, KurosawaError> {
        let conn = Connection::open_in_memory()?;
        conn.execute_batch("PRAGMA foreign_keys=ON;")?;
        run_migrations(&conn)?;
        Ok(Self { conn })
    }

    // ── Movies ──────────────────────────────────────────────────

    /// Insert a new movie, returning its auto-generated ID.
    ///
    /// `external_id` is unique; inserting a duplicate is a constraint
    /// error. Look up with [`Storage::find_movie_by_external_id`] first.
    pub fn insert_movie(&self, movie: &Movie) -> Result<i64, KurosawaError> {
        let keywords_json = movie
            .keywords
            .as_ref()
            .map(|k| serde_json::to_string(k).unwrap_or_default());
        self.conn.execute(
            "INSERT INTO movie (external_id, title, original_title, release_date, imdb_id, keywords)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                movie.external_id as i64,
                movie.title,
                movie.original_title,
                movie.release_date,
                movie.imdb_id,
                keywords_json,
            ],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    /// Get a movie by its local database ID, relations included.
    pub fn get_movie(&self, id: i64) -> Result<Option<Movie>, KurosawaError> {
        let movie = self
            .conn
            .query_row(
                &format!("SELECT {MOVIE_COLUMNS} FROM movie WHERE id = ?1"),
                params![id],
                |row| Ok(row_to_movie(row)),
            )
            .optional()?;
        self.with_relations(movie)
    }

    /// Look up a movie by its external database id.
    pub fn find_movie_by_external_id(
        &self,
        external_id: u64,
    ) -> Result<Option<Movie>, KurosawaError> {
        let movie = self
            .conn
            .query_row(
                &format!("SELECT {MOVIE_COLUMNS} FROM movie WHERE external_id = ?1"),
                params![external_id as i64],
                |row| Ok(row_to_movie(row)),
            )
            .optional()?;
        self.with_relations(movie)
    }

    /// Get all movies, relations included.
    pub fn all_movies(&self) -> Result<Vec<Movie>, KurosawaError> {
        self.movie_query(
            &format!("SELECT {MOVIE_COLUMNS} FROM movie ORDER BY title"),
            params![],
        )
    }

    /// Movies with no genre rows attached yet.
    pub fn movies_without_genres(&self) -> Result<Vec<Movie>, KurosawaError> {
        self.movie_query(
            &format!(
                "SELECT {MOVIE_COLUMNS} FROM movie m
                 WHERE NOT EXISTS (SELECT 1 FROM movie_genre mg WHERE mg.movie_id = m.id)
                 ORDER BY m.id"
            ),
            params![],
        )
    }

    /// Movies with no cast rows attached yet.
    pub fn movies_without_cast(&self) -> Result<Vec<Movie>, KurosawaError> {
        self.movie_query(
            &format!(
                "SELECT {MOVIE_COLUMNS} FROM movie m
                 WHERE NOT EXISTS (SELECT 1 FROM movie_cast_member mc WHERE mc.movie_id = m.id)
                 ORDER BY m.id"
            ),
            params![],
        )
    }

    /// Movies with no director rows attached yet.
    pub fn movies_without_directors(&self) -> Result<Vec<Movie>, KurosawaError> {
        self.movie_query(
            &format!(
                "SELECT {MOVIE_COLUMNS} FROM movie m
                 WHERE NOT EXISTS (SELECT 1 FROM movie_director md WHERE md.movie_id = m.id)
                 ORDER BY m.id"
            ),
            params![],
        )
    }

    /// Movies whose keyword list was never fetched.
    pub fn movies_without_keywords(&self) -> Result<Vec<Movie>, KurosawaError> {
        self.movie_query(
            &format!("SELECT {MOVIE_COLUMNS} FROM movie WHERE keywords IS NULL ORDER BY id"),
            params![],
        )
    }

    /// Movies without an IMDB id.
    pub fn movies_without_imdb_id(&self) -> Result<Vec<Movie>, KurosawaError> {
        self.movie_query(
            &format!("SELECT {MOVIE_COLUMNS} FROM movie WHERE imdb_id IS NULL ORDER BY id"),
            params![],
        )
    }

    /// Distinct movies linked from the rips of a visit, relations included.
    pub fn movies_in_visit(&self, visit: &Visit) -> Result<Vec<Movie>, KurosawaError> {
        self.movie_query(
            &format!(
                "SELECT DISTINCT m.id, m.external_id, m.title, m.original_title, m.release_date,
                        m.imdb_id, m.keywords
                 FROM movie m
                 JOIN movie_rip r ON r.movie_id = m.id
                 JOIN visit_rip vr ON vr.rip_id = r.id
                 WHERE vr.visit_id = ?1
                 ORDER BY m.id"
            ),
            params![visit.id],
        )
    }

    /// Set the keyword list for a movie.
    pub fn set_movie_keywords(
        &self,
        movie_id: i64,
        keywords: &[String],
    ) -> Result<(), KurosawaError> {
        let json = serde_json::to_string(keywords).unwrap_or_default();
        self.conn.execute(
            "UPDATE movie SET keywords = ?1 WHERE id = ?2",
            params![json, movie_id],
        )?;
        Ok(())
    }

    /// Set the IMDB id for a movie.
    pub fn set_movie_imdb_id(&self, movie_id: i64, imdb_id: &str) -> Result<(), KurosawaError> {
        self.conn.execute(
            "UPDATE movie SET imdb_id = ?1 WHERE id = ?2",
            params![imdb_id, movie_id],
        )?;
        Ok(())
    }

    fn movie_query(
        &self,
        sql: &str,
        args: &[&dyn rusqlite::ToSql],
    ) -> Result<Vec<Movie>, KurosawaError> {
        let mut stmt = self.conn.prepare(sql)?;
        let mut movies: Vec<Movie> = stmt
            .query_map(args, |row| Ok(row_to_movie(row)))?
            .filter_map(|r| r.ok())
            .collect();
        for movie in &mut movies {
            self.load_relations(movie)?;
        }
        Ok(movies)
    }

    fn with_relations(&self, movie: Option<Movie>) -> Result<Option<Movie>, KurosawaError> {
        match movie {
            Some(mut movie) => {
                self.load_relations(&mut movie)?;
                Ok(Some(movie))
            }
            None => Ok(None),
        }
    }

    fn load_relations(&self, movie: &mut Movie) -> Result<(), KurosawaError> {
        movie.genres = self.genres_for_movie(movie.id)?;
        movie.cast_members = self.cast_for_movie(movie.id)?;
        movie.directors = self.directors_for_movie(movie.id)?;
        Ok(())
    }

    // ── Rips ────────────────────────────────────────────────────

    /// Insert a new rip, returning its auto-generated ID.
    pub fn insert_rip(&self, rip: &MovieRip) -> Result<i64, KurosawaError> {
        self.conn.execute(
            "INSERT INTO movie_rip (file_name, parsed_title, parsed_release_date,
             parsed_rip_quality, parsed_rip_info, parsed_rip_group, movie_id)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            params![
                rip.file_name,
                rip.parsed_title,
                rip.parsed_release_date,
                rip.parsed_rip_quality,
                rip.parsed_rip_info,
                rip.parsed_rip_group,
                rip.movie_id,
            ],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    /// Look up a rip by its file name.
    pub fn find_rip_by_file_name(&self, file_name: &str) -> Result<Option<MovieRip>, KurosawaError> {
        self.conn
            .query_row(
                &format!("SELECT {RIP_COLUMNS} FROM movie_rip WHERE file_name = ?1"),
                params![file_name],
                |row| Ok(row_to_rip(row)),
            )
            .optional()
            .map_err(Into::into)
    }

    /// All rips not yet linked to a movie.
    pub fn unlinked_rips(&self) -> Result<Vec<MovieRip>, KurosawaError> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {RIP_COLUMNS} FROM movie_rip WHERE movie_id IS NULL ORDER BY file_name"
        ))?;
        let rips = stmt
            .query_map([], |row| Ok(row_to_rip(row)))?
            .filter_map(|r| r.ok())
            .collect();
        Ok(rips)
    }

    /// Link a rip to its canonical movie.
    pub fn link_rip_to_movie(&self, rip_id: i64, movie_id: i64) -> Result<(), KurosawaError> {
        self.conn.execute(
            "UPDATE movie_rip SET movie_id = ?1 WHERE id = ?2",
            params![movie_id, rip_id],
        )?;
        Ok(())
    }

    /// All rips present in a visit.
    pub fn rips_in_visit(&self, visit: &Visit) -> Result<Vec<MovieRip>, KurosawaError> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT r.id, r.file_name, r.parsed_title, r.parsed_release_date,
                    r.parsed_rip_quality, r.parsed_rip_info, r.parsed_rip_group, r.movie_id
             FROM movie_rip r
             JOIN visit_rip vr ON vr.rip_id = r.id
             WHERE vr.visit_id = ?1
             ORDER BY r.file_name"
        ))?;
        let rips = stmt
            .query_map(params![visit.id], |row| Ok(row_to_rip(row)))?
            .filter_map(|r| r.ok())
            .collect();
        Ok(rips)
    }

    // ── Visits ──────────────────────────────────────────────────

    /// Register a new visit. The timestamp is unique; registering two
    /// visits with the same one is a constraint error.
    pub fn insert_visit(&self, visit_date_time: DateTime<Utc>) -> Result<i64, KurosawaError> {
        self.conn.execute(
            "INSERT INTO warehouse_visit (visit_date_time) VALUES (?1)",
            params![visit_date_time.to_rfc3339()],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    /// Add a rip to a visit's snapshot.
    pub fn add_rip_to_visit(&self, visit_id: i64, rip_id: i64) -> Result<(), KurosawaError> {
        self.conn.execute(
            "INSERT OR IGNORE INTO visit_rip (visit_id, rip_id) VALUES (?1, ?2)",
            params![visit_id, rip_id],
        )?;
        Ok(())
    }

    /// All visits in chronological order.
    pub fn all_visits(&self) -> Result<Vec<Visit>, KurosawaError> {
        let mut stmt = self.conn.prepare(
            "SELECT id, visit_date_time FROM warehouse_visit ORDER BY visit_date_time",
        )?;
        let visits = stmt
            .query_map([], |row| Ok(row_to_visit(row)))?
            .filter_map(|r| r.ok())
            .collect();
        Ok(visits)
    }

    /// The most recent visit.
    pub fn closest_visit(&self) -> Result<Option<Visit>, KurosawaError> {
        self.conn
            .query_row(
                "SELECT id, visit_date_time FROM warehouse_visit
                 ORDER BY visit_date_time DESC LIMIT 1",
                [],
                |row| Ok(row_to_visit(row)),
            )
            .optional()
            .map_err(Into::into)
    }

    /// The most recent visit at or before the given date.
    pub fn closest_visit_to(
        &self,
        date: DateTime<Utc>,
    ) -> Result<Option<Visit>, KurosawaError> {
        self.conn
            .query_row(
                "SELECT id, visit_date_time FROM warehouse_visit
                 WHERE visit_date_time <= ?1
                 ORDER BY visit_date_time DESC LIMIT 1",
                params![date.to_rfc3339()],
                |row| Ok(row_to_visit(row)),
            )
            .optional()
            .map_err(Into::into)
    }

    // ── Genres / cast / directors ───────────────────────────────

    pub fn insert_genre(&self, external_id: u64, name: &str) -> Result<i64, KurosawaError> {
        self.conn.execute(
            "INSERT INTO genre (external_id, name) VALUES (?1, ?2)",
            params![external_id as i64, name],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    pub fn find_genre_by_external_id(
        &self,
        external_id: u64,
    ) -> Result<Option<Genre>, KurosawaError> {
        self.conn
            .query_row(
                "SELECT id, external_id, name FROM genre WHERE external_id = ?1",
                params![external_id as i64],
                |row| Ok(row_to_genre(row)),
            )
            .optional()
            .map_err(Into::into)
    }

    pub fn all_genres(&self) -> Result<Vec<Genre>, KurosawaError> {
        let mut stmt = self
            .conn
            .prepare("SELECT id, external_id, name FROM genre ORDER BY name")?;
        let genres = stmt
            .query_map([], |row| Ok(row_to_genre(row)))?
            .filter_map(|r| r.ok())
            .collect();
        Ok(genres)
    }

    pub fn attach_genre(&self, movie_id: i64, genre_id: i64) -> Result<(), KurosawaError> {
        self.conn.execute(
            "INSERT OR IGNORE INTO movie_genre (movie_id, genre_id) VALUES (?1, ?2)",
            params![movie_id, genre_id],
        )?;
        Ok(())
    }

    fn genres_for_movie(&self, movie_id: i64) -> Result<Vec<Genre>, KurosawaError> {
        let mut stmt = self.conn.prepare(
            "SELECT g.id, g.external_id, g.name FROM genre g
             JOIN movie_genre mg ON mg.genre_id = g.id
             WHERE mg.movie_id = ?1
             ORDER BY g.id",
        )?;
        let genres = stmt
            .query_map(params![movie_id], |row| Ok(row_to_genre(row)))?
            .filter_map(|r| r.ok())
            .collect();
        Ok(genres)
    }

    pub fn insert_cast_member(&self, external_id: u64, name: &str) -> Result<i64, KurosawaError> {
        self.conn.execute(
            "INSERT INTO cast_member (external_id, name) VALUES (?1, ?2)",
            params![external_id as i64, name],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    pub fn find_cast_member_by_external_id(
        &self,
        external_id: u64,
    ) -> Result<Option<CastMember>, KurosawaError> {
        self.conn
            .query_row(
                "SELECT id, external_id, name FROM cast_member WHERE external_id = ?1",
                params![external_id as i64],
                |row| Ok(row_to_cast_member(row)),
            )
            .optional()
            .map_err(Into::into)
    }

    pub fn all_cast_members(&self) -> Result<Vec<CastMember>, KurosawaError> {
        let mut stmt = self
            .conn
            .prepare("SELECT id, external_id, name FROM cast_member ORDER BY name")?;
        let members = stmt
            .query_map([], |row| Ok(row_to_cast_member(row)))?
            .filter_map(|r| r.ok())
            .collect();
        Ok(members)
    }

    pub fn attach_cast_member(
        &self,
        movie_id: i64,
        cast_member_id: i64,
    ) -> Result<(), KurosawaError> {
        self.conn.execute(
            "INSERT OR IGNORE INTO movie_cast_member (movie_id, cast_member_id) VALUES (?1, ?2)",
            params![movie_id, cast_member_id],
        )?;
        Ok(())
    }

    fn cast_for_movie(&self, movie_id: i64) -> Result<Vec<CastMember>, KurosawaError> {
        let mut stmt = self.conn.prepare(
            "SELECT c.id, c.external_id, c.name FROM cast_member c
             JOIN movie_cast_member mc ON mc.cast_member_id = c.id
             WHERE mc.movie_id = ?1
             ORDER BY c.id",
        )?;
        let members = stmt
            .query_map(params![movie_id], |row| Ok(row_to_cast_member(row)))?
            .filter_map(|r| r.ok())
            .collect();
        Ok(members)
    }

    pub fn insert_director(&self, external_id: u64, name: &str) -> Result<i64, KurosawaError> {
        self.conn.execute(
            "INSERT INTO director (external_id, name) VALUES (?1, ?2)",
            params![external_id as i64, name],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    pub fn find_director_by_external_id(
        &self,
        external_id: u64,
    ) -> Result<Option<Director>, KurosawaError> {
        self.conn
            .query_row(
                "SELECT id, external_id, name FROM director WHERE external_id = ?1",
                params![external_id as i64],
                |row| Ok(row_to_director(row)),
            )
            .optional()
            .map_err(Into::into)
    }

    pub fn all_directors(&self) -> Result<Vec<Director>, KurosawaError> {
        let mut stmt = self
            .conn
            .prepare("SELECT id, external_id, name FROM director ORDER BY name")?;
        let directors = stmt
            .query_map([], |row| Ok(row_to_director(row)))?
            .filter_map(|r| r.ok())
            .collect();
        Ok(directors)
    }

    pub fn attach_director(&self, movie_id: i64, director_id: i64) -> Result<(), KurosawaError> {
        self.conn.execute(
            "INSERT OR IGNORE INTO movie_director (movie_id, director_id) VALUES (?1, ?2)",
            params![movie_id, director_id],
        )?;
        Ok(())
    }

    fn directors_for_movie(&self, movie_id: i64) -> Result<Vec<Director>, KurosawaError> {
        let mut stmt = self.conn.prepare(
            "SELECT d.id, d.external_id, d.name FROM director d
             JOIN movie_director md ON md.director_id = d.id
             WHERE md.movie_id = ?1
             ORDER BY d.id",
        )?;
        let directors = stmt
            .query_map(params![movie_id], |row| Ok(row_to_director(row)))?
            .filter_map(|r| r.ok())
            .collect();
        Ok(directors)
    }
}

// ── Migrations ──────────────────────────────────────────────────

/// Run schema migrations using `PRAGMA user_version` for version tracking.
fn run_migrations(conn: &Connection) -> Result<(), KurosawaError> {
    let version: i32 = conn
        .pragma_query_value(None, "user_version", |row| row.get(0))
        .unwrap_or(0);

    if version < 1 {
        conn.execute_batch(SCHEMA_V1)?;
        conn.pragma_update(None, "user_version", 1)?;
    }
    Ok(())
}

// ── Helpers ─────────────────────────────────────────────────────

/// Parse a datetime string from SQLite (either RFC 3339 or SQLite's
/// `datetime('now')` format).
fn parse_datetime(s: &str) -> DateTime<Utc> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return dt.with_timezone(&Utc);
    }
    if let Ok(naive) = chrono::NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S") {
        return naive.and_utc();
    }
    DateTime::default()
}

// ── Row mapping helpers ─────────────────────────────────────────

fn row_to_movie(row: &rusqlite::Row<'_>) -> Movie {
    let keywords_str: Option<String> = row.get(6).unwrap_or(None);
    let keywords = keywords_str.map(|s| serde_json::from_str(&s).unwrap_or_default());

    Movie {
        id: row.get(0).unwrap_or(0),
        external_id: row.get::<_, i64>(1).unwrap_or(0) as u64,
        title: row.get(2).unwrap_or_default(),
        original_title: row.get(3).unwrap_or(None),
        release_date: row.get(4).unwrap_or(0),
        imdb_id: row.get(5).unwrap_or(None),
        keywords,
        genres: Vec::new(),
        cast_members: Vec::new(),
        directors: Vec::new(),
    }
}

fn row_to_rip(row: &rusqlite::Row<'_>) -> MovieRip {
    MovieRip {
        id: row.get(0).unwrap_or(0),
        file_name: row.get(1).unwrap_or_default(),
        parsed_title: row.get(2).unwrap_or(None),
        parsed_release_date: row.get(3).unwrap_or(None),
        parsed_rip_quality: row.get(4).unwrap_or(None),
        parsed_rip_info: row.get(5).unwrap_or(None),
        parsed_rip_group: row.get(6).unwrap_or(None),
        movie_id: row.get(7).unwrap_or(None),
    }
}

fn row_to_visit(row: &rusqlite::Row<'_>) -> Visit {
    let date_str: String = row.get(1).unwrap_or_default();
    Visit {
        id: row.get(0).unwrap_or(0),
        visit_date_time: parse_datetime(&date_str),
    }
}

fn row_to_genre(row: &rusqlite::Row<'_>) -> Genre {
    Genre {
        id: row.get(0).unwrap_or(0),
        external_id: row.get::<_, i64>(1).unwrap_or(0) as u64,
        name: row.get(2).unwrap_or_default(),
    }
}

fn row_to_cast_member(row: &rusqlite::Row<'_>) -> CastMember {
    CastMember {
        id: row.get(0).unwrap_or(0),
        external_id: row.get::<_, i64>(1).unwrap_or(0) as u64,
        name: row.get(2).unwrap_or_default(),
    }
}

fn row_to_director(row: &rusqlite::Row<'_>) -> Director {
    Director {
        id: row.get(0).unwrap_or(0),
        external_id: row.get::<_, i64>(1).unwrap_or(0) as u64,
        name: row.get(2).unwrap_or_default(),
    }
}
