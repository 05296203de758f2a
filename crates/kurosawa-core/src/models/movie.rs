use serde::{Deserialize, Serialize};

/// Canonical movie record, deduplicated by its external database id.
///
/// Created exactly once per distinct `external_id`; many rips may share
/// one movie (several encodes of the same film). Genres, cast and
/// directors are attached later by the detail fetchers and imply no
/// ownership in either direction.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Movie {
    /// Local database id.
    pub id: i64,
    /// Identifier within the external movie database (alternate key).
    pub external_id: u64,
    pub title: String,
    pub original_title: Option<String>,
    /// Release year.
    pub release_date: i32,
    pub imdb_id: Option<String>,
    pub keywords: Option<Vec<String>>,
    pub genres: Vec<Genre>,
    pub cast_members: Vec<CastMember>,
    pub directors: Vec<Director>,
}

impl std::fmt::Display for Movie {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({})", self.title, self.release_date)
    }
}

/// A film genre shared across movies.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Genre {
    pub id: i64,
    pub external_id: u64,
    pub name: String,
}

/// A billed cast member.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CastMember {
    pub id: i64,
    pub external_id: u64,
    pub name: String,
}

/// A film director.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Director {
    pub id: i64,
    pub external_id: u64,
    pub name: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_renders_title_and_year() {
        let movie = Movie {
            id: 1,
            external_id: 587,
            title: "Wake In Fright".into(),
            original_title: None,
            release_date: 1971,
            imdb_id: None,
            keywords: None,
            genres: vec![],
            cast_members: vec![],
            directors: vec![],
        };
        assert_eq!(movie.to_string(), "Wake In Fright (1971)");
    }
}
